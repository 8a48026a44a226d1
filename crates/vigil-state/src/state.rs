// state.rs - Unit states and the inputs that move between them.
//
// `UnitState` mirrors systemd's ActiveState values plus `Unknown`, which is
// where every unit starts: vigil keeps no history across restarts, so the
// first report for a unit is always a change *from unknown*.
//
// `Input` is the raw report expressed as an instruction ("become failed").
// Keeping inputs separate from states lets the transition table say
// "failed + become_failed" without confusing the two sides.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StateError;

/// The state a monitored unit is believed to be in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitState {
    /// No report received yet.
    #[default]
    Unknown,
    Active,
    Reloading,
    Inactive,
    Failed,
    Activating,
    Deactivating,
}

impl UnitState {
    /// Every state, in a stable order (useful for exhaustive iteration).
    pub const ALL: [UnitState; 7] = [
        UnitState::Unknown,
        UnitState::Active,
        UnitState::Reloading,
        UnitState::Inactive,
        UnitState::Failed,
        UnitState::Activating,
        UnitState::Deactivating,
    ];

    /// The snake_case name used on the bus and in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitState::Unknown => "unknown",
            UnitState::Active => "active",
            UnitState::Reloading => "reloading",
            UnitState::Inactive => "inactive",
            UnitState::Failed => "failed",
            UnitState::Activating => "activating",
            UnitState::Deactivating => "deactivating",
        }
    }
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitState {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Input::from_raw(s).map(|input| input.target())
    }
}

/// An instruction to move a unit into a state, derived from a raw report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Input {
    BecomeUnknown,
    BecomeActive,
    BecomeReloading,
    BecomeInactive,
    BecomeFailed,
    BecomeActivating,
    BecomeDeactivating,
}

impl Input {
    /// Every input, in the same order as [`UnitState::ALL`].
    pub const ALL: [Input; 7] = [
        Input::BecomeUnknown,
        Input::BecomeActive,
        Input::BecomeReloading,
        Input::BecomeInactive,
        Input::BecomeFailed,
        Input::BecomeActivating,
        Input::BecomeDeactivating,
    ];

    /// Parse a raw state token as reported by systemd (`"failed"` →
    /// `BecomeFailed`). Matching is exact; systemd always sends lowercase.
    pub fn from_raw(raw: &str) -> Result<Self, StateError> {
        match raw {
            "unknown" => Ok(Input::BecomeUnknown),
            "active" => Ok(Input::BecomeActive),
            "reloading" => Ok(Input::BecomeReloading),
            "inactive" => Ok(Input::BecomeInactive),
            "failed" => Ok(Input::BecomeFailed),
            "activating" => Ok(Input::BecomeActivating),
            "deactivating" => Ok(Input::BecomeDeactivating),
            _ => Err(StateError::UnknownRawState {
                raw: raw.to_string(),
            }),
        }
    }

    /// The state this input asks the unit to enter.
    pub const fn target(&self) -> UnitState {
        match self {
            Input::BecomeUnknown => UnitState::Unknown,
            Input::BecomeActive => UnitState::Active,
            Input::BecomeReloading => UnitState::Reloading,
            Input::BecomeInactive => UnitState::Inactive,
            Input::BecomeFailed => UnitState::Failed,
            Input::BecomeActivating => UnitState::Activating,
            Input::BecomeDeactivating => UnitState::Deactivating,
        }
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "become_{}", self.target())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_unknown() {
        assert_eq!(UnitState::default(), UnitState::Unknown);
    }

    #[test]
    fn every_state_name_parses_back_to_its_input() {
        for state in UnitState::ALL {
            let input = Input::from_raw(state.as_str()).unwrap();
            assert_eq!(input.target(), state);
        }
    }

    #[test]
    fn unrecognized_raw_state_is_rejected() {
        let err = Input::from_raw("maintenance").unwrap_err();
        assert_eq!(
            err,
            StateError::UnknownRawState {
                raw: "maintenance".to_string()
            }
        );
        // Case matters: systemd never sends capitalised tokens.
        assert!(Input::from_raw("Active").is_err());
        assert!(Input::from_raw("").is_err());
    }

    #[test]
    fn input_display_uses_become_prefix() {
        assert_eq!(Input::BecomeFailed.to_string(), "become_failed");
        assert_eq!(Input::BecomeUnknown.to_string(), "become_unknown");
    }

    #[test]
    fn state_parses_from_str() {
        assert_eq!("reloading".parse::<UnitState>().unwrap(), UnitState::Reloading);
        assert!("bogus".parse::<UnitState>().is_err());
    }

    #[test]
    fn state_serializes_as_snake_case() {
        let json = serde_json::to_string(&UnitState::Deactivating).unwrap();
        assert_eq!(json, "\"deactivating\"");
        let input: Input = serde_json::from_str("\"become_active\"").unwrap();
        assert_eq!(input, Input::BecomeActive);
    }
}
