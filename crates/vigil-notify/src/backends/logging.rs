// logging.rs - Notifier that reports events through `tracing`.

use std::fmt;
use std::str::FromStr;

use vigil_state::LifecycleEvent;

use crate::config::LoggingSettings;
use crate::error::NotifyError;
use crate::notifier::Notifier;

/// Level the logging notifier emits events at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "CRITICAL" and "WARNING" are accepted as aliases.
        match s.to_lowercase().as_str() {
            "critical" | "error" => Ok(LogLevel::Error),
            "warning" | "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(format!(
                "'{}' is not a log level (expected error, warn, info, debug or trace)",
                s
            )),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

/// Logs every lifecycle event under the `vigil::events` target.
pub struct LoggingNotifier {
    level: LogLevel,
}

impl LoggingNotifier {
    pub fn new(level: LogLevel) -> Self {
        Self { level }
    }

    pub fn from_settings(settings: &LoggingSettings) -> Result<Self, NotifyError> {
        let level = settings
            .level
            .parse()
            .map_err(|details| NotifyError::InvalidSetting {
                notifier: "logging",
                setting: "level",
                details,
            })?;
        Ok(Self::new(level))
    }

    fn emit(&self, unit: &str, event: LifecycleEvent) -> Result<(), NotifyError> {
        let summary = event.summary(unit);
        // tracing needs the level at compile time, hence one call per arm.
        match self.level {
            LogLevel::Error => {
                tracing::error!(target: "vigil::events", unit, event = %event, "{}", summary)
            }
            LogLevel::Warn => {
                tracing::warn!(target: "vigil::events", unit, event = %event, "{}", summary)
            }
            LogLevel::Info => {
                tracing::info!(target: "vigil::events", unit, event = %event, "{}", summary)
            }
            LogLevel::Debug => {
                tracing::debug!(target: "vigil::events", unit, event = %event, "{}", summary)
            }
            LogLevel::Trace => {
                tracing::trace!(target: "vigil::events", unit, event = %event, "{}", summary)
            }
        }
        Ok(())
    }
}

impl Notifier for LoggingNotifier {
    fn name(&self) -> &str {
        "logging"
    }

    fn normal_start(&self, unit: &str) -> Result<(), NotifyError> {
        self.emit(unit, LifecycleEvent::NormalStart)
    }

    fn normal_stop(&self, unit: &str) -> Result<(), NotifyError> {
        self.emit(unit, LifecycleEvent::NormalStop)
    }

    fn failure(&self, unit: &str) -> Result<(), NotifyError> {
        self.emit(unit, LifecycleEvent::Failure)
    }

    fn ongoing_failure(&self, unit: &str) -> Result<(), NotifyError> {
        self.emit(unit, LifecycleEvent::OngoingFailure)
    }

    fn recovery(&self, unit: &str) -> Result<(), NotifyError> {
        self.emit(unit, LifecycleEvent::Recovery)
    }

    fn change_from_unknown(&self, unit: &str) -> Result<(), NotifyError> {
        self.emit(unit, LifecycleEvent::ChangeFromUnknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_parsing_is_case_insensitive() {
        assert_eq!("INFO".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("Debug".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("CRITICAL".parse::<LogLevel>().unwrap(), LogLevel::Error);
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn from_settings_rejects_bad_level() {
        let settings = LoggingSettings {
            level: "loud".into(),
        };
        let err = LoggingNotifier::from_settings(&settings).err().unwrap();
        assert!(err.to_string().contains("'loud' is not a log level"));
    }

    #[test]
    fn every_event_is_handled() {
        let notifier = LoggingNotifier::new(LogLevel::Trace);
        for event in LifecycleEvent::ALL {
            crate::notifier::invoke(&notifier, "/unit/x", event).unwrap();
        }
    }

    #[test]
    fn level_display_round_trips() {
        for level in [
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ] {
            assert_eq!(level.to_string().parse::<LogLevel>().unwrap(), level);
        }
    }
}
