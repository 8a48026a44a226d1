// identity.rs - Bus object paths for monitored units.
//
// systemd exposes each unit at `/org/freedesktop/systemd1/unit/<escaped>`.
// Names given on the command line ("sshd.service") are escaped here; paths
// discovered on the bus are already escaped and are used as they come.

use std::borrow::Borrow;
use std::fmt;

/// Object path prefix shared by every unit.
pub const UNIT_PATH_ROOT: &str = "/org/freedesktop/systemd1/unit/";

/// Escape a unit name for use in an object path.
///
/// Replaces `.`, `-` and `/` with `_2e`, `_2d` and `_2f`. Each character is
/// mapped once, so an existing `_2e` in the name stays as it is.
pub fn escape_unit_name(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len() * 2);
    for c in name.chars() {
        match c {
            '.' => escaped.push_str("_2e"),
            '-' => escaped.push_str("_2d"),
            '/' => escaped.push_str("_2f"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// The normalized identity of a unit: its bus object path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitIdentity(String);

impl UnitIdentity {
    /// Identity for a human-supplied unit name.
    pub fn from_unit_name(name: &str) -> Self {
        Self(format!("{}{}", UNIT_PATH_ROOT, escape_unit_name(name)))
    }

    /// Identity for a path reported by the bus, taken verbatim.
    pub fn from_object_path(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this path lives under [`UNIT_PATH_ROOT`].
    pub fn is_unit_path(&self) -> bool {
        self.0.starts_with(UNIT_PATH_ROOT) && self.0.len() > UNIT_PATH_ROOT.len()
    }
}

impl fmt::Display for UnitIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UnitIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for UnitIdentity {
    fn borrow(&self) -> &str {
        &self.0
    }
}
