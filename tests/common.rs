//! Shared test utilities for integration tests.

use markmode::{FragmentTree, ScanCursor, Tokenizer};

/// Flattens a tree into `(text, style)` pairs, line breaks dropped.
pub fn flatten(tree: &FragmentTree) -> Vec<(String, Option<String>)> {
    tree.lines()
        .iter()
        .flatten()
        .map(|fragment| (fragment.text.clone(), fragment.style.clone()))
        .collect()
}

/// Styles every line as one `base` token.
pub struct BaseEverything;

impl Tokenizer for BaseEverything {
    type State = ();

    fn name(&self) -> &str {
        "base-everything"
    }

    fn start_state(&self) {}

    fn token(&self, cursor: &mut ScanCursor<'_>, _state: &mut ()) -> markmode::Result<Option<String>> {
        cursor.skip_to_end();
        Ok(Some("base".to_string()))
    }
}

/// Styles only `X` characters as `overlay`.
pub struct OverlayX;

impl Tokenizer for OverlayX {
    type State = ();

    fn name(&self) -> &str {
        "overlay-x"
    }

    fn start_state(&self) {}

    fn token(&self, cursor: &mut ScanCursor<'_>, _state: &mut ()) -> markmode::Result<Option<String>> {
        if cursor.eat('X').is_some() {
            return Ok(Some("overlay".to_string()));
        }
        cursor.eat_while(|c: char| c != 'X');
        Ok(None)
    }
}
