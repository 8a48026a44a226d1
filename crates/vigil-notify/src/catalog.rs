// catalog.rs - Static table of available notifier implementations.
//
// Maps a configuration name ("irc", "smtp", ...) to a constructor. The
// table is assembled at compile time; there is no runtime plugin discovery.

use crate::backends::{IrcNotifier, JsonlNotifier, LoggingNotifier, MailNotifier};
use crate::config::NotifierSettings;
use crate::error::NotifyError;
use crate::notifier::Notifier;

/// Constructor for one notifier back end.
pub type BuildFn = fn(&NotifierSettings) -> Result<Box<dyn Notifier>, NotifyError>;

/// One entry of the catalog.
#[derive(Clone, Copy)]
pub struct NotifierSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub build: BuildFn,
}

impl std::fmt::Debug for NotifierSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifierSpec")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}

const BUILTIN: &[NotifierSpec] = &[
    NotifierSpec {
        name: "logging",
        description: "Log events through the process log",
        build: build_logging,
    },
    NotifierSpec {
        name: "jsonl",
        description: "Append events as JSON lines to a file",
        build: build_jsonl,
    },
    NotifierSpec {
        name: "irc",
        description: "Post events to an IRC channel",
        build: build_irc,
    },
    NotifierSpec {
        name: "smtp",
        description: "Send notification emails via SMTP",
        build: build_smtp,
    },
    NotifierSpec {
        name: "esmtp",
        description: "Send notification emails via authenticated SMTP with STARTTLS",
        build: build_esmtp,
    },
];

/// The set of notifier implementations a registry can be built from.
#[derive(Debug, Clone)]
pub struct Catalog {
    specs: Vec<NotifierSpec>,
}

impl Catalog {
    /// The built-in back ends.
    pub fn builtin() -> Self {
        Self::new(BUILTIN.to_vec())
    }

    pub fn new(specs: Vec<NotifierSpec>) -> Self {
        Self { specs }
    }

    pub fn get(&self, name: &str) -> Option<&NotifierSpec> {
        self.specs.iter().find(|spec| spec.name == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.specs.iter().map(|spec| spec.name).collect()
    }

    pub fn specs(&self) -> &[NotifierSpec] {
        &self.specs
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn build_logging(settings: &NotifierSettings) -> Result<Box<dyn Notifier>, NotifyError> {
    Ok(Box::new(LoggingNotifier::from_settings(&settings.logging)?))
}

fn build_jsonl(settings: &NotifierSettings) -> Result<Box<dyn Notifier>, NotifyError> {
    Ok(Box::new(JsonlNotifier::new(&settings.jsonl.path)))
}

fn build_irc(settings: &NotifierSettings) -> Result<Box<dyn Notifier>, NotifyError> {
    Ok(Box::new(IrcNotifier::from_settings(&settings.irc)?))
}

fn build_smtp(settings: &NotifierSettings) -> Result<Box<dyn Notifier>, NotifyError> {
    Ok(Box::new(MailNotifier::smtp(&settings.smtp)?))
}

fn build_esmtp(settings: &NotifierSettings) -> Result<Box<dyn Notifier>, NotifyError> {
    Ok(Box::new(MailNotifier::esmtp(&settings.esmtp)?))
}
