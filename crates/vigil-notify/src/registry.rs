// registry.rs - The immutable, ordered set of enabled notifiers.
//
// Built once at startup from the enabled-name list and never changed
// afterwards, so it can be shared (behind an `Arc`) by every monitored unit.
// Dispatch order is registration order, i.e. the order of the configured
// list.

use std::panic::{self, AssertUnwindSafe};

use vigil_state::LifecycleEvent;

use crate::catalog::{Catalog, NotifierSpec};
use crate::config::NotifierSettings;
use crate::error::RegistryError;
use crate::notifier::{invoke, Notifier};

/// Summary of one dispatch: how many notifiers handled the event and which
/// ones failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: Vec<String>,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Dispatches lifecycle events to every enabled notifier.
pub struct NotifierRegistry {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierRegistry {
    /// A registry with no notifiers. Events are accepted and dropped.
    pub fn empty() -> Self {
        Self {
            notifiers: Vec::new(),
        }
    }

    /// Build a registry from ready-made notifier instances.
    ///
    /// Order is preserved. If two instances share a name, only the first is
    /// kept.
    pub fn from_notifiers(notifiers: Vec<Box<dyn Notifier>>) -> Self {
        let mut kept: Vec<Box<dyn Notifier>> = Vec::with_capacity(notifiers.len());
        for notifier in notifiers {
            if kept.iter().any(|n| n.name() == notifier.name()) {
                tracing::debug!(notifier = notifier.name(), "duplicate notifier ignored");
                continue;
            }
            kept.push(notifier);
        }
        Self { notifiers: kept }
    }

    /// Resolve `enabled` against `catalog` and construct each notifier.
    ///
    /// Every name is checked before anything is built, so an unknown name
    /// fails fast without starting any back end.
    pub fn from_enabled(
        enabled: &[String],
        catalog: &Catalog,
        settings: &NotifierSettings,
    ) -> Result<Self, RegistryError> {
        let mut specs: Vec<&NotifierSpec> = Vec::with_capacity(enabled.len());
        for name in enabled {
            let spec = catalog
                .get(name)
                .ok_or_else(|| RegistryError::UnknownNotifier {
                    name: name.clone(),
                    available: catalog.names().join(", "),
                })?;
            if !specs.iter().any(|s| s.name == spec.name) {
                specs.push(spec);
            }
        }

        let mut notifiers = Vec::with_capacity(specs.len());
        for spec in specs {
            let notifier = (spec.build)(settings).map_err(|source| RegistryError::Build {
                name: spec.name.to_string(),
                source,
            })?;
            tracing::info!(notifier = spec.name, "notifier enabled");
            notifiers.push(notifier);
        }
        Ok(Self { notifiers })
    }

    /// Deliver `event` for `unit` to every notifier, in order.
    ///
    /// A notifier returning an error or panicking is logged and skipped; it
    /// never prevents delivery to the notifiers after it.
    pub fn dispatch(&self, unit: &str, event: LifecycleEvent) -> DispatchReport {
        let mut report = DispatchReport::default();
        for notifier in &self.notifiers {
            let name = notifier.name();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                invoke(notifier.as_ref(), unit, event)
            }));
            match outcome {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(e)) => {
                    tracing::warn!(notifier = name, unit, event = %event, error = %e, "notifier failed");
                    report.failed.push(name.to_string());
                }
                Err(payload) => {
                    tracing::warn!(
                        notifier = name,
                        unit,
                        event = %event,
                        panic = panic_message(payload.as_ref()),
                        "notifier panicked"
                    );
                    report.failed.push(name.to_string());
                }
            }
        }
        report
    }

    /// Names of the registered notifiers, in dispatch order.
    pub fn names(&self) -> Vec<&str> {
        self.notifiers.iter().map(|n| n.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

impl Default for NotifierRegistry {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for NotifierRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifierRegistry")
            .field("notifiers", &self.names())
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
