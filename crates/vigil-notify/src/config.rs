// config.rs - Per-back-end notifier settings.
//
// Lives under `[notifier.<name>]` in vigil.toml. Every field has a serde
// default so a config file only needs to mention what it changes; whether a
// setting is *required* is decided by the back end when it is built, since
// only enabled notifiers need to be fully configured.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Settings for all built-in notifiers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifierSettings {
    #[serde(default)]
    pub logging: LoggingSettings,

    #[serde(default)]
    pub jsonl: JsonlSettings,

    #[serde(default)]
    pub irc: IrcSettings,

    /// Plain SMTP.
    #[serde(default)]
    pub smtp: MailSettings,

    /// SMTP with STARTTLS and authentication.
    #[serde(default)]
    pub esmtp: MailSettings,
}

/// `logging` notifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Level to log events at: error, warn, info, debug or trace.
    #[serde(default = "default_logging_level")]
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_logging_level(),
        }
    }
}

/// `jsonl` notifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonlSettings {
    /// File the event records are appended to.
    #[serde(default = "default_jsonl_path")]
    pub path: PathBuf,
}

impl Default for JsonlSettings {
    fn default() -> Self {
        Self {
            path: default_jsonl_path(),
        }
    }
}

/// `irc` notifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrcSettings {
    /// Server host name. Required when the notifier is enabled.
    #[serde(default)]
    pub server: Option<String>,

    #[serde(default = "default_irc_port")]
    pub port: u16,

    #[serde(default = "default_irc_nick")]
    pub nick: String,

    /// Channel to join, including the leading `#`. Required when enabled.
    #[serde(default)]
    pub channel: Option<String>,
}

impl Default for IrcSettings {
    fn default() -> Self {
        Self {
            server: None,
            port: default_irc_port(),
            nick: default_irc_nick(),
            channel: None,
        }
    }
}

/// `smtp` / `esmtp` notifier configuration.
///
/// `user` and `password` are only used (and then required) by `esmtp`.
/// When `port` is unset the back end picks 25 (smtp) or 587 (esmtp).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MailSettings {
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub from: Option<String>,

    #[serde(default)]
    pub to: Option<String>,

    #[serde(default)]
    pub user: Option<String>,

    #[serde(default, skip_serializing)]
    pub password: Option<String>,
}

// Serde default functions
fn default_logging_level() -> String {
    "info".to_string()
}

fn default_jsonl_path() -> PathBuf {
    PathBuf::from("/var/log/vigil/events.jsonl")
}

fn default_irc_port() -> u16 {
    6667
}

fn default_irc_nick() -> String {
    "vigil".to_string()
}
