// mod.rs - Subcommand implementations.

pub mod notifiers;
pub mod watch;

use anyhow::Context;
use vigil_notify::{Catalog, NotifierRegistry};

use crate::config::DaemonConfig;

/// Build the registry for the configured notifiers. Fatal on any error.
pub(crate) fn build_registry(config: &DaemonConfig) -> anyhow::Result<NotifierRegistry> {
    let registry =
        NotifierRegistry::from_enabled(&config.notifiers, &Catalog::builtin(), &config.notifier)
            .context("failed to set up notifiers")?;
    if registry.is_empty() {
        tracing::warn!("no notifiers enabled; lifecycle events will only appear in debug logs");
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_notifier_is_fatal() {
        let config = DaemonConfig {
            notifiers: vec!["logging".into(), "pager".into()],
            ..DaemonConfig::default()
        };
        let err = build_registry(&config).unwrap_err();
        let chain = format!("{:#}", err);
        assert!(chain.contains("failed to set up notifiers"));
        assert!(chain.contains("unknown notifier 'pager'"));
        assert!(chain.contains("logging, jsonl, irc, smtp, esmtp"));
    }

    #[test]
    fn empty_list_is_allowed() {
        let registry = build_registry(&DaemonConfig::default()).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn configured_order_is_kept() {
        let config = DaemonConfig {
            notifiers: vec!["jsonl".into(), "logging".into(), "jsonl".into()],
            ..DaemonConfig::default()
        };
        let registry = build_registry(&config).unwrap();
        assert_eq!(registry.names(), vec!["jsonl", "logging"]);
    }
}
