//! Code highlighting through the mode registry.
//!
//! Every syntect grammar is exposed as a mode, so fenced code blocks go
//! through the same registry, runner and `cm-*` classes as hand written
//! modes.

use anyhow::{Context, Result};
use maud::Render;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use syntect::parsing::{ParseState, ScopeStack, SyntaxReference, SyntaxSet};

use crate::error;
use crate::mode::{
    MathMode, Mode, ModeConfig, ModeFactory, ModeRegistry, ModeRunner, ModeSpec, NullMode,
    Overlay, ScanCursor, Tokenizer,
};

/// Language tags mapped onto the syntect token that grammars answer to.
///
/// Tags the bundled grammars do not know fall back to a close relative.
const LANGUAGE_ALIASES: &[(&str, &str)] = &[
    ("javascript", "js"),
    ("typescript", "js"),
    ("ts", "js"),
    ("tsx", "js"),
    ("jsx", "js"),
    ("python", "py"),
    ("csharp", "cs"),
    ("cpp", "cpp"),
    ("c++", "cpp"),
    ("ruby", "rb"),
    ("rust", "rs"),
    ("shell", "sh"),
    ("bash", "sh"),
    ("zsh", "sh"),
    ("console", "sh"),
    ("yml", "yaml"),
    ("html", "html"),
    ("xml", "xml"),
    ("markdown", "md"),
    ("golang", "go"),
    ("scss", "css"),
    ("tex", "tex"),
    ("latex", "tex"),
];

/// MIME types registered on top of the mode names.
const MIME_TYPES: &[(&str, &str)] = &[
    ("text/plain", "null"),
    ("text/x-rustsrc", "rust"),
    ("text/javascript", "javascript"),
    ("application/json", "json"),
    ("text/x-python", "python"),
    ("text/x-csrc", "c"),
    ("text/x-c++src", "cpp"),
    ("text/x-java", "java"),
    ("text/x-go", "go"),
    ("text/x-sh", "shell"),
    ("text/x-yaml", "yaml"),
    ("text/html", "html"),
    ("text/css", "css"),
    ("text/x-markdown", "markdown"),
    ("text/x-gfm", "gfm"),
    ("text/x-latex", "latex"),
];

/// Scope prefixes and the style tag they map to, most specific first.
const SCOPE_STYLES: &[(&str, &str)] = &[
    ("comment", "comment"),
    ("string.regexp", "string-2"),
    ("string", "string"),
    ("constant.numeric", "number"),
    ("constant.character.escape", "string-2"),
    ("constant", "atom"),
    ("keyword.operator", "operator"),
    ("keyword", "keyword"),
    ("storage", "keyword"),
    ("entity.name.function", "def"),
    ("entity.name.tag", "tag"),
    ("entity.other.attribute-name", "attribute"),
    ("entity.name", "def"),
    ("support.function", "builtin"),
    ("support", "builtin"),
    ("variable.parameter", "variable-2"),
    ("variable.language", "builtin"),
    ("variable", "variable"),
    ("markup.heading", "header"),
    ("markup.bold", "strong"),
    ("markup.italic", "em"),
    ("markup.underline.link", "link"),
    ("markup.quote", "quote"),
    ("markup.raw", "comment"),
    ("markup.list", "variable-2"),
    ("invalid", "error"),
];

/// Style tag for a scope stack, innermost scope first.
fn scope_style(stack: &ScopeStack) -> Option<&'static str> {
    stack.as_slice().iter().rev().find_map(|scope| {
        let name = scope.build_string();
        SCOPE_STYLES
            .iter()
            .find(|(prefix, _)| {
                name == *prefix
                    || name
                        .strip_prefix(prefix)
                        .is_some_and(|rest| rest.starts_with('.'))
            })
            .map(|(_, style)| *style)
    })
}

/// Mode backed by a syntect grammar.
///
/// The grammar parses a whole line at its first token; later calls walk the
/// resulting segments.
pub struct SyntectMode {
    syntaxes: Arc<SyntaxSet>,
    syntax: String,
}

/// Parser state of a [`SyntectMode`] plus the segments of the current line.
#[derive(Clone)]
pub struct SyntectState {
    parse: ParseState,
    stack: ScopeStack,
    segments: Vec<(usize, Option<&'static str>)>,
}

impl fmt::Debug for SyntectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntectState")
            .field("stack", &self.stack)
            .field("segments", &self.segments)
            .finish()
    }
}

impl SyntectMode {
    pub fn new(syntaxes: Arc<SyntaxSet>, syntax: &SyntaxReference) -> Self {
        Self {
            syntaxes,
            syntax: syntax.name.clone(),
        }
    }

    fn syntax(&self) -> &SyntaxReference {
        self.syntaxes
            .find_syntax_by_name(&self.syntax)
            .unwrap_or_else(|| self.syntaxes.find_syntax_plain_text())
    }

    /// Parses `line` and records where each differently styled run ends.
    fn parse_line(&self, line: &str, state: &mut SyntectState) -> error::Result<()> {
        let with_newline = format!("{line}\n");
        let ops = state.parse.parse_line(&with_newline, &self.syntaxes)?;

        state.segments.clear();
        let mut style = scope_style(&state.stack);
        for (offset, op) in ops {
            let offset = offset.min(line.len());
            Self::push_segment(&mut state.segments, offset, style);
            state.stack.apply(&op)?;
            style = scope_style(&state.stack);
        }
        Self::push_segment(&mut state.segments, line.len(), style);
        Ok(())
    }

    fn push_segment(
        segments: &mut Vec<(usize, Option<&'static str>)>,
        end: usize,
        style: Option<&'static str>,
    ) {
        let start = segments.last().map_or(0, |(end, _)| *end);
        if end <= start {
            return;
        }
        match segments.last_mut() {
            Some((last_end, last_style)) if *last_style == style => *last_end = end,
            _ => segments.push((end, style)),
        }
    }
}

impl Tokenizer for SyntectMode {
    type State = SyntectState;

    fn name(&self) -> &str {
        &self.syntax
    }

    fn start_state(&self) -> SyntectState {
        SyntectState {
            parse: ParseState::new(self.syntax()),
            stack: ScopeStack::new(),
            segments: Vec::new(),
        }
    }

    fn blank_line(&self, state: &mut SyntectState) -> error::Result<()> {
        self.parse_line("", state)
    }

    fn token(
        &self,
        cursor: &mut ScanCursor<'_>,
        state: &mut SyntectState,
    ) -> error::Result<Option<String>> {
        if cursor.token_start() == 0 && cursor.at_line_start() {
            self.parse_line(cursor.text(), state)?;
        }

        let position = cursor.position();
        let segment = state
            .segments
            .iter()
            .find(|(end, _)| *end > position)
            .copied();

        match segment {
            Some((end, style)) => {
                cursor.set_position(end);
                Ok(style.map(str::to_string))
            }
            None => {
                cursor.skip_to_end();
                Ok(None)
            }
        }
    }
}

fn syntect_factory(syntaxes: &Arc<SyntaxSet>, syntax: &SyntaxReference) -> ModeFactory {
    let syntaxes = Arc::clone(syntaxes);
    let name = syntax.name.clone();
    Arc::new(move |_: &ModeConfig, _: &ModeSpec| -> Box<dyn Mode> {
        Box::new(SyntectMode {
            syntaxes: Arc::clone(&syntaxes),
            syntax: name.clone(),
        })
    })
}

/// Registers every grammar in `syntaxes` under its lower cased name and
/// each of its file extensions, then the language aliases.
pub fn register_syntect_modes(registry: &mut ModeRegistry, syntaxes: &Arc<SyntaxSet>) {
    for syntax in syntaxes.syntaxes() {
        let factory = syntect_factory(syntaxes, syntax);
        for extension in &syntax.file_extensions {
            registry.register_factory(extension.to_lowercase(), Arc::clone(&factory));
        }
    }
    // Names last so they win over colliding extensions.
    for syntax in syntaxes.syntaxes() {
        registry.register_factory(syntax.name.to_lowercase(), syntect_factory(syntaxes, syntax));
    }

    for (alias, token) in LANGUAGE_ALIASES {
        if let Some(syntax) = syntaxes.find_syntax_by_token(token) {
            registry.register_factory(*alias, syntect_factory(syntaxes, syntax));
        }
    }
}

/// Registers the modes this crate defines itself: `math` and `gfm`, the
/// markdown grammar with math layered on top.
pub fn register_builtin_modes(registry: &mut ModeRegistry, syntaxes: &Arc<SyntaxSet>) {
    registry.register_mode("math", |_, _| Box::new(MathMode));

    let syntaxes = Arc::clone(syntaxes);
    registry.register_mode("gfm", move |_, _| {
        let markdown: Box<dyn Mode> = match syntaxes.find_syntax_by_token("md") {
            Some(syntax) => Box::new(SyntectMode::new(Arc::clone(&syntaxes), syntax)),
            None => Box::new(NullMode),
        };
        Box::new(Overlay::new(markdown, Box::new(MathMode)))
    });

    for (mime, mode) in MIME_TYPES {
        registry.register_mime_type(*mime, *mode);
    }
}

type SetupHook = Box<dyn Fn(&mut ModeRegistry) + Send + Sync>;

/// Lazily initialized registry of every available mode.
///
/// Grammar loading happens once, on first use, no matter how many times
/// [`Highlighter::initialize`] is called.
pub struct Highlighter {
    config: ModeConfig,
    registry: OnceLock<ModeRegistry>,
    setup: Option<SetupHook>,
    setup_runs: AtomicUsize,
}

impl Highlighter {
    pub fn new() -> Self {
        Self::with_config(ModeConfig::default())
    }

    pub fn with_config(config: ModeConfig) -> Self {
        Self {
            config,
            registry: OnceLock::new(),
            setup: None,
            setup_runs: AtomicUsize::new(0),
        }
    }

    /// Adds a hook that registers extra modes during initialization.
    pub fn with_setup<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut ModeRegistry) + Send + Sync + 'static,
    {
        self.setup = Some(Box::new(hook));
        self
    }

    /// Loads grammars and builds the registry on the first call.
    ///
    /// Later calls return the same registry without redoing any work.
    pub fn initialize(&self) -> &ModeRegistry {
        self.registry.get_or_init(|| {
            self.setup_runs.fetch_add(1, Ordering::SeqCst);

            let syntaxes = Arc::new(SyntaxSet::load_defaults_newlines());
            let mut registry = ModeRegistry::new();
            register_syntect_modes(&mut registry, &syntaxes);
            register_builtin_modes(&mut registry, &syntaxes);
            if let Some(hook) = &self.setup {
                hook(&mut registry);
            }

            tracing::info!(
                "Loaded {} highlighting modes",
                registry.mode_names().len()
            );
            registry
        })
    }

    /// Number of times initialization actually ran.
    pub fn setup_runs(&self) -> usize {
        self.setup_runs.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &ModeConfig {
        &self.config
    }

    /// Highlights `code` written in `language`.
    ///
    /// The language tag is matched case insensitively; unknown languages
    /// produce unstyled but escaped markup.
    ///
    /// # Errors
    ///
    /// Returns error if the mode fails while tokenizing.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use markmode::Highlighter;
    ///
    /// let highlighter = Highlighter::new();
    /// let html = highlighter.highlight("fn main() {}", "rust")?;
    /// assert!(html.contains("cm-keyword"));
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn highlight(&self, code: &str, language: &str) -> Result<String> {
        if code.is_empty() {
            return Ok(String::new());
        }

        let registry = self.initialize();
        let runner = ModeRunner::with_config(registry, self.config.clone());
        let language = language.trim().to_lowercase();
        let tree = runner
            .run_to_tree(code, language.as_str())
            .with_context(|| format!("Failed to highlight {} code", language))?;

        Ok(tree.render().into_string())
    }

    /// Highlights `code`, falling back to escaped plain text on failure.
    pub fn highlight_or_escape(&self, code: &str, language: &str) -> String {
        match self.highlight(code, language) {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("Highlighting failed, using plain text: {:#}", e);
                escape_html(code)
            }
        }
    }
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

/// Escapes HTML special characters.
pub(crate) fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
