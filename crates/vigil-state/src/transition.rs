// transition.rs - The static transition table and its lookup.
//
// The table is plain data: one row per accepted (state, input) pair. Rows
// not present are *undefined* and rejected with `InvalidTransition`; the
// caller's state is never touched in that case.
//
// The tie-break rules that matter for alerting:
//   - anything out of `unknown` is `change_from_unknown`, never a failure
//     or a start, since nothing is known about the previous state
//   - `failed + become_failed` repeats `ongoing_failure` every time
//   - `active + become_active` is a silent self-loop
//   - only `activating → active` is a normal start and only
//     `deactivating → inactive` is a normal stop

use crate::error::StateError;
use crate::event::LifecycleEvent;
use crate::state::{Input, UnitState};

/// One accepted row of the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: UnitState,
    pub input: Input,
    pub to: UnitState,
    pub event: Option<LifecycleEvent>,
}

/// The result of classifying an accepted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub next: UnitState,
    pub event: Option<LifecycleEvent>,
}

// Every input moves the unit into the state it names, so the target state
// is derived rather than written out per row.
const fn row(from: UnitState, input: Input, event: Option<LifecycleEvent>) -> Transition {
    Transition {
        from,
        input,
        to: input.target(),
        event,
    }
}

use Input as I;
use LifecycleEvent as E;
use UnitState as S;

/// The authoritative transition table.
pub const TRANSITIONS: &[Transition] = &[
    // unknown: every input is accepted and reported as a change from unknown.
    row(S::Unknown, I::BecomeUnknown, Some(E::ChangeFromUnknown)),
    row(S::Unknown, I::BecomeActive, Some(E::ChangeFromUnknown)),
    row(S::Unknown, I::BecomeReloading, Some(E::ChangeFromUnknown)),
    row(S::Unknown, I::BecomeInactive, Some(E::ChangeFromUnknown)),
    row(S::Unknown, I::BecomeFailed, Some(E::ChangeFromUnknown)),
    row(S::Unknown, I::BecomeActivating, Some(E::ChangeFromUnknown)),
    row(S::Unknown, I::BecomeDeactivating, Some(E::ChangeFromUnknown)),
    // active
    row(S::Active, I::BecomeActive, None),
    row(S::Active, I::BecomeActivating, None),
    row(S::Active, I::BecomeDeactivating, None),
    row(S::Active, I::BecomeInactive, None),
    row(S::Active, I::BecomeReloading, None),
    row(S::Active, I::BecomeFailed, Some(E::Failure)),
    // inactive
    row(S::Inactive, I::BecomeActive, None),
    row(S::Inactive, I::BecomeFailed, Some(E::Failure)),
    row(S::Inactive, I::BecomeReloading, None),
    row(S::Inactive, I::BecomeActivating, None),
    // failed
    row(S::Failed, I::BecomeActive, Some(E::Recovery)),
    row(S::Failed, I::BecomeFailed, Some(E::OngoingFailure)),
    row(S::Failed, I::BecomeInactive, None),
    row(S::Failed, I::BecomeReloading, None),
    row(S::Failed, I::BecomeActivating, None),
    row(S::Failed, I::BecomeDeactivating, None),
    // reloading
    row(S::Reloading, I::BecomeActive, None),
    row(S::Reloading, I::BecomeInactive, None),
    row(S::Reloading, I::BecomeFailed, None),
    row(S::Reloading, I::BecomeReloading, None),
    row(S::Reloading, I::BecomeActivating, None),
    row(S::Reloading, I::BecomeDeactivating, None),
    // activating
    row(S::Activating, I::BecomeActive, Some(E::NormalStart)),
    row(S::Activating, I::BecomeActivating, None),
    row(S::Activating, I::BecomeInactive, None),
    row(S::Activating, I::BecomeReloading, None),
    row(S::Activating, I::BecomeDeactivating, None),
    row(S::Activating, I::BecomeFailed, Some(E::Failure)),
    // deactivating
    row(S::Deactivating, I::BecomeInactive, Some(E::NormalStop)),
    row(S::Deactivating, I::BecomeActive, None),
    row(S::Deactivating, I::BecomeReloading, None),
    row(S::Deactivating, I::BecomeActivating, None),
    row(S::Deactivating, I::BecomeDeactivating, None),
    row(S::Deactivating, I::BecomeFailed, Some(E::Failure)),
];

/// Find the table row for `(from, input)`, if one exists.
pub fn lookup(from: UnitState, input: Input) -> Option<&'static Transition> {
    TRANSITIONS
        .iter()
        .find(|row| row.from == from && row.input == input)
}

/// Classify `input` against `from`. Undefined pairs are an error.
pub fn classify(from: UnitState, input: Input) -> Result<Outcome, StateError> {
    lookup(from, input)
        .map(|row| Outcome {
            next: row.to,
            event: row.event,
        })
        .ok_or(StateError::InvalidTransition { from, input })
}

impl UnitState {
    /// Apply `input` to this state in place.
    ///
    /// On success the state is updated and the produced event (if any) is
    /// returned. On error the state is left untouched.
    pub fn apply(&mut self, input: Input) -> Result<Option<LifecycleEvent>, StateError> {
        let outcome = classify(*self, input)?;
        *self = outcome.next;
        Ok(outcome.event)
    }
}
