//! Tokenizer modes driven over text one line at a time.
//!
//! A mode consumes characters from a [`ScanCursor`] and reports an optional
//! style tag for each token. Modes are looked up by name in a
//! [`ModeRegistry`], composed with [`Overlay`], and driven by a
//! [`ModeRunner`] that produces callbacks or a [`FragmentTree`].

mod builtin;
mod cursor;
mod overlay;
mod registry;
mod runner;

use std::any::Any;
use std::fmt;

use crate::error::{ModeError, Result};

pub use builtin::{MathMode, MathState, NullMode};
pub use cursor::{CharMatcher, DEFAULT_TAB_SIZE, Match, Pattern, ScanCursor, compile_pattern};
pub use overlay::{Overlay, OverlayState};
pub use registry::{ModeFactory, ModeRegistry, ModeSpec};
pub use runner::{FragmentTree, ModeRunner, ModeSource, RunTarget, StyledFragment, Token, style_classes};

/// Settings handed to mode factories and used for every cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeConfig {
    pub tab_size: usize,
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self {
            tab_size: DEFAULT_TAB_SIZE,
        }
    }
}

/// Object safe tokenizer.
///
/// Every call to [`Mode::token`] must consume at least one character. The
/// state is opaque to callers: only the mode that created it knows its
/// concrete type.
pub trait Mode: Send + Sync {
    fn name(&self) -> &str;

    fn start_state(&self) -> ModeState;

    /// Duplicates `state` so the copy and the original evolve independently.
    fn copy_state(&self, state: &ModeState) -> ModeState {
        state.clone()
    }

    /// Called for lines with no characters, which never reach `token`.
    fn blank_line(&self, _state: &mut ModeState) -> Result<()> {
        Ok(())
    }

    /// Consumes one token and returns its space separated style tags.
    fn token(&self, cursor: &mut ScanCursor<'_>, state: &mut ModeState) -> Result<Option<String>>;
}

/// Tokenizer with a concrete state type.
///
/// Implementors get [`Mode`] for free; the blanket impl takes care of
/// erasing and recovering the state.
pub trait Tokenizer: Send + Sync {
    type State: Clone + 'static;

    fn name(&self) -> &str;

    fn start_state(&self) -> Self::State;

    fn blank_line(&self, _state: &mut Self::State) -> Result<()> {
        Ok(())
    }

    fn token(
        &self,
        cursor: &mut ScanCursor<'_>,
        state: &mut Self::State,
    ) -> Result<Option<String>>;
}

impl<T: Tokenizer> Mode for T {
    fn name(&self) -> &str {
        Tokenizer::name(self)
    }

    fn start_state(&self) -> ModeState {
        ModeState::new(Tokenizer::start_state(self))
    }

    fn blank_line(&self, state: &mut ModeState) -> Result<()> {
        let state = typed_state::<T>(self, state)?;
        Tokenizer::blank_line(self, state)
    }

    fn token(&self, cursor: &mut ScanCursor<'_>, state: &mut ModeState) -> Result<Option<String>> {
        let state = typed_state::<T>(self, state)?;
        Tokenizer::token(self, cursor, state)
    }
}

fn typed_state<'s, T: Tokenizer>(mode: &T, state: &'s mut ModeState) -> Result<&'s mut T::State> {
    state
        .downcast_mut::<T::State>()
        .ok_or_else(|| ModeError::StateMismatch(Tokenizer::name(mode).to_string()))
}

trait StateData: Any {
    fn clone_box(&self) -> Box<dyn StateData>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any + Clone> StateData for T {
    fn clone_box(&self) -> Box<dyn StateData> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Type erased tokenizer state.
///
/// Cloning produces a deep, independent copy.
pub struct ModeState(Box<dyn StateData>);

impl ModeState {
    pub fn new<T: Any + Clone>(state: T) -> Self {
        Self(Box::new(state))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.0).as_any().downcast_ref()
    }

    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        (*self.0).as_any_mut().downcast_mut()
    }
}

impl Clone for ModeState {
    fn clone(&self) -> Self {
        Self((*self.0).clone_box())
    }
}

impl fmt::Debug for ModeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ModeState(..)")
    }
}
