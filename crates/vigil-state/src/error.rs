// error.rs - Error types for unit state classification.

use thiserror::Error;

use crate::state::{Input, UnitState};

/// Errors raised while turning a raw state report into a transition.
///
/// Neither variant is fatal to the process: the affected delivery is
/// dropped and the unit keeps its previous state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// The bus reported a state token outside the known set.
    #[error("unknown raw state '{raw}'")]
    UnknownRawState { raw: String },

    /// The transition table has no row for this (state, input) pair.
    #[error("invalid transition: {input} is not accepted in state {from}")]
    InvalidTransition { from: UnitState, input: Input },
}
