// event.rs - Lifecycle events: what a state transition means to an operator.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The semantic classification of an accepted transition.
///
/// At most one event is produced per raw report; most transitions
/// (e.g. `active → reloading`) produce none at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// `activating → active`.
    NormalStart,
    /// `deactivating → inactive`.
    NormalStop,
    /// Entered `failed` from a non-failed state.
    Failure,
    /// Reported `failed` again while already failed.
    OngoingFailure,
    /// `failed → active`.
    Recovery,
    /// First report for a unit whose state was unknown.
    ChangeFromUnknown,
}

impl LifecycleEvent {
    pub const ALL: [LifecycleEvent; 6] = [
        LifecycleEvent::NormalStart,
        LifecycleEvent::NormalStop,
        LifecycleEvent::Failure,
        LifecycleEvent::OngoingFailure,
        LifecycleEvent::Recovery,
        LifecycleEvent::ChangeFromUnknown,
    ];

    /// Get the event type name as a string.
    pub fn event_type(&self) -> &'static str {
        match self {
            LifecycleEvent::NormalStart => "normal_start",
            LifecycleEvent::NormalStop => "normal_stop",
            LifecycleEvent::Failure => "failure",
            LifecycleEvent::OngoingFailure => "ongoing_failure",
            LifecycleEvent::Recovery => "recovery",
            LifecycleEvent::ChangeFromUnknown => "change_from_unknown",
        }
    }

    /// Whether the event is about a unit being (or having been) broken.
    pub fn is_failure_related(&self) -> bool {
        matches!(
            self,
            LifecycleEvent::Failure | LifecycleEvent::OngoingFailure | LifecycleEvent::Recovery
        )
    }

    /// One-line human-readable text for chat and mail notifications.
    pub fn summary(&self, unit: &str) -> String {
        match self {
            LifecycleEvent::NormalStart => format!("{} started normally.", unit),
            LifecycleEvent::NormalStop => format!("{} stopped normally.", unit),
            LifecycleEvent::Failure => format!("{} entered failed state.", unit),
            LifecycleEvent::OngoingFailure => format!("{} is still failing.", unit),
            LifecycleEvent::Recovery => format!("{} recovered.", unit),
            LifecycleEvent::ChangeFromUnknown => format!("{} is now being monitored.", unit),
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_type())
    }
}
