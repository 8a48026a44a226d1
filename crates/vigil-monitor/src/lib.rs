//! # vigil-monitor
//!
//! Connects units on the service manager's bus to the notifier registry.
//!
//! A [`Monitor`] owns one [`Unit`] per watched object path. It pulls
//! [`StateChange`]s from a [`BusConnector`] and hands each one to its unit,
//! which classifies the raw `ActiveState` through the transition table and
//! dispatches the resulting lifecycle event.
//!
//! ## Key components
//!
//! - [`UnitIdentity`]: escaped bus object path of a unit
//! - [`Unit`]: state holder for one unit
//! - [`BusConnector`]: enumeration and change stream (trait)
//! - [`DbusConnector`]: subscribed D-Bus connection to systemd
//! - [`Monitor`]: the single-threaded routing loop

pub mod bus;
pub mod dbus;
pub mod error;
pub mod identity;
pub mod monitor;
pub mod unit;

pub use bus::{BusConnector, BusKind, StateChange};
pub use dbus::DbusConnector;
pub use error::{BusError, MonitorError};
pub use identity::{escape_unit_name, UnitIdentity, UNIT_PATH_ROOT};
pub use monitor::{Monitor, RunSummary};
pub use unit::{Unit, UNIT_INTERFACE};
