//! # vigil-notify
//!
//! Notification fan-out for vigil.
//!
//! Every classified [`LifecycleEvent`](vigil_state::LifecycleEvent) is handed
//! to a [`NotifierRegistry`], which calls the matching method on each enabled
//! [`Notifier`] in configuration order. A notifier that fails (or panics) is
//! logged and skipped; the rest still receive the event.
//!
//! ## Key components
//!
//! - [`Notifier`]: the six-method capability every back end implements
//! - [`NotifierRegistry`]: immutable, ordered set of enabled notifiers
//! - [`Catalog`]: static name → constructor table of the built-in back ends
//! - [`NotifierSettings`]: per-back-end configuration (TOML `[notifier.*]`)
//!
//! ## Built-in back ends
//!
//! | name      | delivers to                         |
//! |-----------|-------------------------------------|
//! | `logging` | `tracing` at a configurable level   |
//! | `jsonl`   | an append-only JSON Lines file      |
//! | `irc`     | an IRC channel                      |
//! | `smtp`    | plain SMTP e-mail                   |
//! | `esmtp`   | authenticated SMTP with STARTTLS    |

pub mod backends;
pub mod catalog;
pub mod config;
pub mod error;
pub mod notifier;
pub mod registry;

pub use catalog::{Catalog, NotifierSpec};
pub use config::{IrcSettings, JsonlSettings, LoggingSettings, MailSettings, NotifierSettings};
pub use error::{NotifyError, RegistryError};
pub use notifier::Notifier;
pub use registry::{DispatchReport, NotifierRegistry};
