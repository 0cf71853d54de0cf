//! Layering one mode on top of another.

use super::{Mode, ModeState, ScanCursor, Tokenizer};
use crate::error::Result;

/// Runs an overlay mode on top of a base mode over the same cursor.
///
/// Both modes tokenize the line independently, and a side is only asked for
/// a new token once the emitted text reaches the end of its previous one.
/// A token the overlay styles is emitted whole and its style wins, even
/// where it spans several base tokens; the base picks up again where it
/// ends. Elsewhere each emitted token ends at whichever pending token ends
/// first and carries the base style.
pub struct Overlay {
    name: String,
    base: Box<dyn Mode>,
    overlay: Box<dyn Mode>,
    combine: bool,
}

/// Composite state of an [`Overlay`].
#[derive(Debug, Clone)]
pub struct OverlayState {
    base: ModeState,
    overlay: ModeState,
    base_end: usize,
    base_style: Option<String>,
    overlay_end: usize,
    overlay_style: Option<String>,
}

impl OverlayState {
    pub fn base(&self) -> &ModeState {
        &self.base
    }

    pub fn overlay(&self) -> &ModeState {
        &self.overlay
    }
}

impl Overlay {
    pub fn new(base: Box<dyn Mode>, overlay: Box<dyn Mode>) -> Self {
        Self {
            name: format!("{}+{}", base.name(), overlay.name()),
            base,
            overlay,
            combine: false,
        }
    }

    /// Emits `"base overlay"` instead of letting the overlay style replace
    /// the base style.
    pub fn combine_tokens(mut self, combine: bool) -> Self {
        self.combine = combine;
        self
    }
}

impl Tokenizer for Overlay {
    type State = OverlayState;

    fn name(&self) -> &str {
        &self.name
    }

    fn start_state(&self) -> OverlayState {
        OverlayState {
            base: self.base.start_state(),
            overlay: self.overlay.start_state(),
            base_end: 0,
            base_style: None,
            overlay_end: 0,
            overlay_style: None,
        }
    }

    fn blank_line(&self, state: &mut OverlayState) -> Result<()> {
        self.base.blank_line(&mut state.base)?;
        self.overlay.blank_line(&mut state.overlay)
    }

    fn token(
        &self,
        cursor: &mut ScanCursor<'_>,
        state: &mut OverlayState,
    ) -> Result<Option<String>> {
        let start = cursor.token_start();

        // First token of a line, or ends left over from an earlier line.
        if start == 0 || state.base_end.min(state.overlay_end) < start {
            state.base_end = start;
            state.overlay_end = start;
        }

        if start == state.base_end {
            cursor.set_position(start);
            state.base_style = self.base.token(cursor, &mut state.base)?;
            state.base_end = cursor.position();
        }

        if start == state.overlay_end {
            cursor.set_position(start);
            state.overlay_style = self.overlay.token(cursor, &mut state.overlay)?;
            state.overlay_end = cursor.position();

            // A stalled overlay sits out until the base token ends.
            if state.overlay_end == start {
                state.overlay_style = None;
                state.overlay_end = state.base_end;
            }
        }

        let Some(overlay) = &state.overlay_style else {
            cursor.set_position(state.base_end.min(state.overlay_end));
            return Ok(state.base_style.clone());
        };

        // A styled overlay token is emitted whole; the base resumes after it.
        cursor.set_position(state.overlay_end);
        state.base_end = state.base_end.max(state.overlay_end);

        Ok(match &state.base_style {
            Some(base) if self.combine => Some(format!("{base} {overlay}")),
            _ => Some(overlay.clone()),
        })
    }
}
