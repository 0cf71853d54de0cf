//! GitHub flavored markdown rendering with mode based code highlighting.
//!
//! The core is a small line tokenizer framework: a [`ScanCursor`] over one
//! line, [`Mode`]s that turn cursor positions into styled tokens, a
//! [`ModeRegistry`] resolving names and MIME types to modes, a
//! [`ModeRunner`] driving a mode over whole texts, and an [`Overlay`]
//! layering one mode over another. [`Highlighter`] and
//! [`MarkdownRenderer`] put it to work on markdown documents.

mod config;
mod error;
mod highlight;
mod markdown;
pub mod mode;
mod page;

pub use config::Config;
pub use error::{ModeError, Result};
pub use highlight::{Highlighter, SyntectMode, register_builtin_modes, register_syntect_modes};
pub use markdown::{MarkdownRenderer, RenderOptions};
pub use mode::{
    FragmentTree, MathMode, Mode, ModeConfig, ModeRegistry, ModeRunner, ModeSpec, ModeState,
    NullMode, Overlay, ScanCursor, StyledFragment, Token, Tokenizer,
};
pub use page::standalone_page;
