// error.rs - Error types for the bus connector and the monitor loop.

use thiserror::Error;
use vigil_state::StateError;

use crate::bus::BusKind;

/// Errors talking to the service manager's bus.
#[derive(Debug, Error)]
pub enum BusError {
    /// The bus could not be reached.
    #[error("failed to connect to the {bus} bus: {source}")]
    Connect {
        bus: BusKind,
        #[source]
        source: zbus::Error,
    },

    /// A call to the service manager failed.
    #[error("{method} call failed: {source}")]
    Call {
        method: &'static str,
        #[source]
        source: zbus::Error,
    },

    /// Reading from the signal stream failed.
    #[error("bus stream failed: {0}")]
    Stream(#[source] zbus::Error),

    /// A message could not be understood.
    #[error("could not parse bus message: {0}")]
    Parse(String),
}

/// Errors raised by [`Monitor`](crate::Monitor).
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Bus(#[from] BusError),

    /// A raw delivery was rejected by the unit's state table.
    #[error("unit {unit}: {source}")]
    State {
        unit: String,
        #[source]
        source: StateError,
    },

    /// A delivery named a unit that is not being monitored.
    #[error("unit {0} is not monitored")]
    UnknownUnit(String),
}
