//! Markdown rendering with GitHub Flavored Markdown support.

use anyhow::{Context, Result};
use comrak::Options;
use std::path::Path;

use crate::highlight::Highlighter;

/// Opening of a fenced code block with a language tag in comrak output.
const CODE_OPEN: &str = "<code class=\"language-";
const CODE_CLOSE: &str = "</code>";
/// Attribute comrak puts on math spans and `math` fences.
const MATH_ATTR: &str = "data-math-style";

/// Optional markdown extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// `$...$` and `$$...$$` math spans for client side KaTeX.
    pub math: bool,
    /// `:shortcode:` emoji substitution.
    pub emoji: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            math: true,
            emoji: true,
        }
    }
}

/// Renders markdown to HTML with GitHub Flavored Markdown extensions.
///
/// Provides GFM extensions including tables, strikethrough, autolinks,
/// task lists and footnotes, plus math spans and emoji shortcodes. Fenced
/// code blocks with a language tag are highlighted through the mode
/// registry of a [`Highlighter`].
pub struct MarkdownRenderer<'a> {
    options: Options<'a>,
    highlighter: Highlighter,
}

impl<'a> MarkdownRenderer<'a> {
    /// Creates renderer with every extension enabled.
    pub fn new() -> Self {
        Self::with_options(RenderOptions::default(), Highlighter::new())
    }

    /// Creates renderer with chosen extensions and highlighter.
    ///
    /// Configures GFM extensions and rendering settings:
    /// - Tables, strikethrough, autolinks, task lists, footnotes
    /// - Math spans and emoji shortcodes as requested
    /// - Raw HTML passes through (content is trusted)
    pub fn with_options(render: RenderOptions, highlighter: Highlighter) -> Self {
        let mut options = Options::default();

        // Extension options (GFM features)
        options.extension.strikethrough = true;
        options.extension.table = true;
        options.extension.autolink = true;
        options.extension.tasklist = true;
        options.extension.footnotes = true;

        options.extension.math_dollars = render.math;
        options.extension.shortcodes = render.emoji;

        // Render options (security: we trust)
        options.render.unsafe_ = true;

        Self {
            options,
            highlighter,
        }
    }

    pub fn highlighter(&self) -> &Highlighter {
        &self.highlighter
    }

    /// Renders markdown content to HTML string.
    ///
    /// Parses markdown into AST and renders to HTML with GFM extensions.
    /// Math is left in `data-math-style` spans for KaTeX to typeset in the
    /// browser. Code blocks are highlighted with `cm-*` class names.
    ///
    /// # Errors
    ///
    /// Returns error if the rendered HTML is malformed around a code block
    pub fn render(&self, content: &str) -> Result<String> {
        let html = comrak::markdown_to_html(content, &self.options);

        self.highlight_code_blocks(&html)
            .context("Failed to highlight code blocks")
    }

    /// Renders markdown file at given path.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or rendering fails
    pub fn render_file(&self, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read markdown file {}", path.display()))?;
        self.render(&content)
    }

    /// Replaces the content of `<code class="language-X">` blocks with
    /// highlighted markup, keeping the opening tag as comrak wrote it.
    /// Blocks carrying `data-math-style` are left untouched.
    fn highlight_code_blocks(&self, html: &str) -> Result<String> {
        let mut result = String::with_capacity(html.len());
        let mut last_end = 0;
        let mut search_pos = 0;

        while let Some(found) = html[search_pos..].find(CODE_OPEN) {
            let code_start = search_pos + found;
            let lang_start = code_start + CODE_OPEN.len();

            let Some(lang_len) = html[lang_start..].find('"') else {
                anyhow::bail!("Unterminated language class at byte {}", lang_start);
            };
            let lang_end = lang_start + lang_len;
            let language = &html[lang_start..lang_end];

            let Some(tag_len) = html[lang_end..].find('>') else {
                anyhow::bail!("Unterminated code tag at byte {}", code_start);
            };
            let content_start = lang_end + tag_len + 1;

            let Some(content_len) = html[content_start..].find(CODE_CLOSE) else {
                anyhow::bail!("Missing </code> for {} block", language);
            };
            let content_end = content_start + content_len;

            // Math fences stay raw TeX for KaTeX.
            if html[code_start..content_start].contains(MATH_ATTR) {
                search_pos = content_end + CODE_CLOSE.len();
                continue;
            }

            let code = Self::html_decode(&html[content_start..content_end]);

            result.push_str(&html[last_end..content_start]);
            result.push_str(&self.highlighter.highlight_or_escape(&code, language));
            result.push_str(CODE_CLOSE);

            last_end = content_end + CODE_CLOSE.len();
            search_pos = last_end;
        }

        result.push_str(&html[last_end..]);
        Ok(result)
    }

    /// Decodes the entities comrak writes inside code blocks.
    fn html_decode(html: &str) -> String {
        html.replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'")
            .replace("&amp;", "&")
    }
}

impl<'a> Default for MarkdownRenderer<'a> {
    fn default() -> Self {
        Self::new()
    }
}
