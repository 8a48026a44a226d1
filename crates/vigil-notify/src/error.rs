// error.rs - Error types for notifiers and the notifier registry.

use thiserror::Error;

/// Errors raised by an individual notifier back end.
///
/// During dispatch these are logged and swallowed by the registry. During
/// construction they abort startup.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// A required setting was not provided.
    #[error("{notifier}: missing required setting '{setting}'")]
    MissingSetting {
        notifier: &'static str,
        setting: &'static str,
    },

    /// A setting was provided but could not be used.
    #[error("{notifier}: invalid setting '{setting}': {details}")]
    InvalidSetting {
        notifier: &'static str,
        setting: &'static str,
        details: String,
    },

    /// The back end needs a tokio runtime to schedule its sends.
    #[error("{notifier}: no tokio runtime available to schedule deliveries")]
    NoRuntime { notifier: &'static str },

    /// The background delivery task has gone away.
    #[error("{notifier}: delivery channel closed")]
    ChannelClosed { notifier: &'static str },

    /// A file I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// Failed to serialize an event record.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Building or sending a message failed.
    #[error("{notifier}: delivery failed: {details}")]
    Delivery {
        notifier: &'static str,
        details: String,
    },
}

/// Errors raised while building the [`NotifierRegistry`](crate::NotifierRegistry).
///
/// Both are fatal: monitoring must not start with a half-configured set of
/// notifiers.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// An enabled name has no implementation in the catalog.
    #[error("unknown notifier '{name}' (available: {available})")]
    UnknownNotifier { name: String, available: String },

    /// The notifier exists but its constructor failed.
    #[error("failed to set up notifier '{name}': {source}")]
    Build {
        name: String,
        #[source]
        source: NotifyError,
    },
}
