//! # vigil-state
//!
//! Unit state model and lifecycle classification for vigil.
//!
//! systemd reports a unit's `ActiveState` as a bare token (`active`, `failed`
//! and so on). On its own a token says nothing about *why* the unit got
//! there: `active` after `activating` is a normal start, `active` after
//! `failed` is a recovery. This crate turns raw transitions into those
//! semantic [`LifecycleEvent`]s.
//!
//! ## Key components
//!
//! - [`UnitState`]: the seven states a unit can be in (starting at `unknown`)
//! - [`Input`]: the seven `become_*` inputs, parsed from raw state tokens
//! - [`LifecycleEvent`]: what a transition *means* to an operator
//! - [`TRANSITIONS`]: the static `(state, input) → (state, event?)` table
//! - [`classify`] / [`UnitState::apply`]: table lookup, strict about
//!   undefined transitions

pub mod error;
pub mod event;
pub mod state;
pub mod transition;

pub use error::StateError;
pub use event::LifecycleEvent;
pub use state::{Input, UnitState};
pub use transition::{classify, lookup, Outcome, Transition, TRANSITIONS};
