//! Driving a mode over a block of text.

use maud::{Markup, PreEscaped, Render, html};

use super::{Mode, ModeConfig, ModeRegistry, ModeSpec, ModeState, ScanCursor};
use crate::error::{ModeError, Result};

/// Prefix turning a style tag into a CSS class.
const CLASS_PREFIX: &str = "cm-";

/// Maps space separated style tags to prefixed class names.
///
/// `"keyword def"` becomes `"cm-keyword cm-def"`.
pub fn style_classes(style: &str) -> String {
    style
        .split(' ')
        .filter(|tag| !tag.is_empty())
        .map(|tag| format!("{CLASS_PREFIX}{tag}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// One emitted token handed to a callback.
#[derive(Debug)]
pub struct Token<'t> {
    pub text: &'t str,
    pub style: Option<&'t str>,
    /// Zero based line index.
    pub line: usize,
    /// Characters between the line start and the token start.
    pub column: usize,
    /// Mode state right after the token was produced.
    pub state: &'t ModeState,
}

/// Run of text with its style tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledFragment {
    pub text: String,
    pub style: Option<String>,
}

impl StyledFragment {
    /// CSS classes for this fragment, `None` when unstyled.
    pub fn class_names(&self) -> Option<String> {
        self.style
            .as_deref()
            .map(style_classes)
            .filter(|classes| !classes.is_empty())
    }
}

/// Highlighted text grouped by line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentTree {
    lines: Vec<Vec<StyledFragment>>,
}

impl FragmentTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[Vec<StyledFragment>] {
        &self.lines
    }

    /// Plain text of the tree, lines joined by newlines.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.iter().map(|f| f.text.as_str()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn push_line(&mut self, fragments: Vec<StyledFragment>) {
        self.lines.push(fragments);
    }
}

impl Render for FragmentTree {
    fn render(&self) -> Markup {
        let last = self.lines.len().saturating_sub(1);
        html! {
            @for (index, line) in self.lines.iter().enumerate() {
                span class="line" {
                    @for fragment in line {
                        span class=[fragment.class_names()] { (fragment.text) }
                    }
                }
                @if index < last {
                    (PreEscaped("\n"))
                }
            }
        }
    }
}

/// Where a run sends its fragments.
pub enum RunTarget<'t> {
    Callback(&'t mut dyn FnMut(Token<'_>)),
    Tree(&'t mut FragmentTree),
}

/// Mode to run: looked up by spec, or supplied directly.
pub enum ModeSource<'m> {
    Spec(ModeSpec),
    Mode(&'m dyn Mode),
}

impl From<&str> for ModeSource<'_> {
    fn from(name: &str) -> Self {
        ModeSource::Spec(name.into())
    }
}

impl From<ModeSpec> for ModeSource<'_> {
    fn from(spec: ModeSpec) -> Self {
        ModeSource::Spec(spec)
    }
}

impl<'m> From<&'m dyn Mode> for ModeSource<'m> {
    fn from(mode: &'m dyn Mode) -> Self {
        ModeSource::Mode(mode)
    }
}

/// Splits text into lines and feeds each through a mode.
pub struct ModeRunner<'r> {
    registry: &'r ModeRegistry,
    config: ModeConfig,
}

impl<'r> ModeRunner<'r> {
    pub fn new(registry: &'r ModeRegistry) -> Self {
        Self::with_config(registry, ModeConfig::default())
    }

    pub fn with_config(registry: &'r ModeRegistry, config: ModeConfig) -> Self {
        Self { registry, config }
    }

    /// Tokenizes `text` and delivers every fragment to `target`.
    ///
    /// Lines are split on `\n` only, so text ending in a newline has an
    /// empty last line. State is created once and carried across lines;
    /// empty lines go to [`Mode::blank_line`].
    ///
    /// # Arguments
    ///
    /// * `text`: Text to tokenize
    /// * `source`: Mode name, MIME type or [`ModeSpec`] resolved through the
    ///   registry, or a mode supplied directly
    /// * `target`: Callback receiving each [`Token`], or a [`FragmentTree`]
    ///   collecting fragments per line
    ///
    /// # Errors
    ///
    /// Returns `ModeError::NonProgress` when a token step consumes nothing.
    /// Errors raised by the mode, such as `ModeError::MalformedPattern`,
    /// are returned unchanged and stop the run at the failing line.
    pub fn run<'m>(
        &self,
        text: &str,
        source: impl Into<ModeSource<'m>>,
        mut target: RunTarget<'_>,
    ) -> Result<()> {
        let resolved;
        let mode: &dyn Mode = match source.into() {
            ModeSource::Mode(mode) => mode,
            ModeSource::Spec(spec) => {
                resolved = self.registry.resolve(&self.config, &spec);
                &*resolved
            }
        };

        let mut state = mode.start_state();
        for (index, line) in text.split('\n').enumerate() {
            let mut cursor = ScanCursor::new(line, self.config.tab_size);
            let mut fragments = Vec::new();
            let mut column = 0;

            if line.is_empty() {
                mode.blank_line(&mut state)?;
            }

            while !cursor.at_end() {
                let style = mode.token(&mut cursor, &mut state)?;
                if cursor.position() <= cursor.token_start() {
                    return Err(ModeError::NonProgress {
                        mode: mode.name().to_string(),
                        line: index,
                        column,
                    });
                }

                let fragment = cursor.current();
                match &mut target {
                    RunTarget::Callback(callback) => (**callback)(Token {
                        text: fragment,
                        style: style.as_deref(),
                        line: index,
                        column,
                        state: &state,
                    }),
                    RunTarget::Tree(_) => fragments.push(StyledFragment {
                        text: fragment.to_string(),
                        style,
                    }),
                }

                column += fragment.chars().count();
                cursor.begin_token();
            }

            if let RunTarget::Tree(tree) = &mut target {
                tree.push_line(fragments);
            }
        }

        Ok(())
    }

    /// Runs with a closure receiving each token.
    pub fn run_with<'m, F>(
        &self,
        text: &str,
        source: impl Into<ModeSource<'m>>,
        mut callback: F,
    ) -> Result<()>
    where
        F: FnMut(Token<'_>),
    {
        self.run(text, source, RunTarget::Callback(&mut callback))
    }

    /// Runs and collects the fragments into a tree.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run); no partial tree is returned.
    pub fn run_to_tree<'m>(
        &self,
        text: &str,
        source: impl Into<ModeSource<'m>>,
    ) -> Result<FragmentTree> {
        let mut tree = FragmentTree::new();
        self.run(text, source, RunTarget::Tree(&mut tree))?;
        Ok(tree)
    }
}
