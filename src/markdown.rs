//! Markdown rendering with GitHub Flavored Markdown support.
//!
//! This module provides markdown rendering using comrak with GFM extensions
//! (tables, strikethrough, autolinks, task lists), `$` math spans for
//! KaTeX, emoji shortcodes and mode based highlighting of fenced code.

mod renderer;

pub use renderer::{MarkdownRenderer, RenderOptions};
