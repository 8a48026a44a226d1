//! Built-in notifier back ends.
//!
//! `logging` and `jsonl` deliver synchronously (local only). `irc`, `smtp`
//! and `esmtp` hand each message to a background tokio task and return
//! immediately.

pub mod irc;
pub mod jsonl;
pub mod logging;
pub mod mail;

pub use irc::IrcNotifier;
pub use jsonl::{EventRecord, JsonlNotifier};
pub use logging::{LogLevel, LoggingNotifier};
pub use mail::MailNotifier;

use crate::error::NotifyError;

/// Handle to the current tokio runtime, for back ends that spawn sends.
pub(crate) fn runtime_handle(notifier: &'static str) -> Result<tokio::runtime::Handle, NotifyError> {
    tokio::runtime::Handle::try_current().map_err(|_| NotifyError::NoRuntime { notifier })
}

/// A non-blank string setting, trimmed.
pub(crate) fn required(
    notifier: &'static str,
    value: &Option<String>,
    setting: &'static str,
) -> Result<String, NotifyError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(NotifyError::MissingSetting { notifier, setting })
}
