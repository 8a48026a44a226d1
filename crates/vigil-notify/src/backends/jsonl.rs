// jsonl.rs - Structured event log: one JSON object per line.
//
// Each record is appended with a fresh file handle, so the file can be
// rotated underneath a running daemon.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vigil_state::LifecycleEvent;

use crate::error::NotifyError;
use crate::notifier::Notifier;

/// One line of the event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_id: Uuid,
    pub event_type: LifecycleEvent,
    pub unit: String,
    pub summary: String,
    pub timestamp: DateTime<Utc>,
}

impl EventRecord {
    pub fn new(unit: &str, event: LifecycleEvent) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type: event,
            unit: unit.to_string(),
            summary: event.summary(unit),
            timestamp: Utc::now(),
        }
    }
}

/// Appends every lifecycle event to a JSONL file.
pub struct JsonlNotifier {
    path: PathBuf,
}

impl JsonlNotifier {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn append(&self, unit: &str, event: LifecycleEvent) -> Result<(), NotifyError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| NotifyError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| NotifyError::Io {
                path: self.path.display().to_string(),
                source,
            })?;

        let json = serde_json::to_string(&EventRecord::new(unit, event))?;
        writeln!(file, "{}", json).map_err(|source| NotifyError::Io {
            path: self.path.display().to_string(),
            source,
        })?;

        Ok(())
    }
}

impl Notifier for JsonlNotifier {
    fn name(&self) -> &str {
        "jsonl"
    }

    fn normal_start(&self, unit: &str) -> Result<(), NotifyError> {
        self.append(unit, LifecycleEvent::NormalStart)
    }

    fn normal_stop(&self, unit: &str) -> Result<(), NotifyError> {
        self.append(unit, LifecycleEvent::NormalStop)
    }

    fn failure(&self, unit: &str) -> Result<(), NotifyError> {
        self.append(unit, LifecycleEvent::Failure)
    }

    fn ongoing_failure(&self, unit: &str) -> Result<(), NotifyError> {
        self.append(unit, LifecycleEvent::OngoingFailure)
    }

    fn recovery(&self, unit: &str) -> Result<(), NotifyError> {
        self.append(unit, LifecycleEvent::Recovery)
    }

    fn change_from_unknown(&self, unit: &str) -> Result<(), NotifyError> {
        self.append(unit, LifecycleEvent::ChangeFromUnknown)
    }
}
