//! Modes that ship with every registry.

use super::{ScanCursor, Tokenizer};
use crate::error::Result;

/// Fallback mode: the whole line is one unstyled token.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMode;

impl Tokenizer for NullMode {
    type State = ();

    fn name(&self) -> &str {
        "null"
    }

    fn start_state(&self) {}

    fn token(&self, cursor: &mut ScanCursor<'_>, _state: &mut ()) -> Result<Option<String>> {
        cursor.skip_to_end();
        Ok(None)
    }
}

/// Style tag given to math spans.
const MATH_STYLE: &str = "math";

/// TeX math spans inside markdown prose.
///
/// `$...$` is inline math, `$$...$$` display math which may continue on the
/// following lines. `\$` is a literal dollar. A `$` without a closing partner
/// on the same line is plain text. Meant to be layered over a markdown mode
/// with [`Overlay`](super::Overlay).
#[derive(Debug, Clone, Copy, Default)]
pub struct MathMode;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MathState {
    in_display: bool,
}

impl MathState {
    /// True while inside a `$$` block that has not been closed yet.
    pub fn in_display(&self) -> bool {
        self.in_display
    }
}

impl MathMode {
    /// Consumes up to and including the closing `$$`, or the rest of the line.
    fn finish_display(cursor: &mut ScanCursor<'_>, state: &mut MathState) {
        loop {
            if !cursor.skip_to_char('$') {
                cursor.skip_to_end();
                return;
            }
            if cursor.matches("$$").is_some() {
                state.in_display = false;
                return;
            }
            cursor.advance();
        }
    }

    /// Finds the closing `$` of an inline span, skipping escaped dollars.
    fn close_inline(cursor: &mut ScanCursor<'_>) -> bool {
        let start = cursor.position();
        let mut escaped = false;
        for (offset, ch) in cursor.text()[start..].char_indices() {
            if escaped {
                escaped = false;
                continue;
            }
            match ch {
                '\\' => escaped = true,
                '$' => {
                    cursor.set_position(start + offset + 1);
                    return true;
                }
                _ => {}
            }
        }
        false
    }
}

impl Tokenizer for MathMode {
    type State = MathState;

    fn name(&self) -> &str {
        MATH_STYLE
    }

    fn start_state(&self) -> MathState {
        MathState::default()
    }

    fn token(&self, cursor: &mut ScanCursor<'_>, state: &mut MathState) -> Result<Option<String>> {
        if state.in_display {
            Self::finish_display(cursor, state);
            return Ok(Some(MATH_STYLE.to_string()));
        }

        if cursor.matches("$$").is_some() {
            state.in_display = true;
            Self::finish_display(cursor, state);
            return Ok(Some(MATH_STYLE.to_string()));
        }

        if cursor.eat('$').is_some() {
            if Self::close_inline(cursor) {
                return Ok(Some(MATH_STYLE.to_string()));
            }
            return Ok(None);
        }

        if cursor.eat('\\').is_some() {
            cursor.advance();
            return Ok(None);
        }

        cursor.eat_while(|c: char| c != '$' && c != '\\');
        Ok(None)
    }
}
