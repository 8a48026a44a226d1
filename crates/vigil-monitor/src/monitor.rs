// monitor.rs - Routes bus changes to the units being watched.
//
// The monitor owns every `Unit` and pulls changes from a `BusConnector` one
// at a time. Each change is classified, applied and dispatched before the
// next one is awaited, so no two deliveries ever overlap.

use std::collections::HashMap;
use std::sync::Arc;

use vigil_notify::NotifierRegistry;
use vigil_state::{Input, LifecycleEvent};

use crate::bus::{BusConnector, StateChange};
use crate::error::MonitorError;
use crate::identity::UnitIdentity;
use crate::unit::Unit;

/// Counters for one [`Monitor::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Changes received from the bus.
    pub changes: usize,
    /// Lifecycle events dispatched.
    pub events: usize,
    /// Deliveries rejected (unknown raw state or invalid transition).
    pub rejected: usize,
}

pub struct Monitor {
    units: HashMap<UnitIdentity, Unit>,
    registry: Arc<NotifierRegistry>,
    follow_new_units: bool,
}

impl Monitor {
    pub fn new(registry: Arc<NotifierRegistry>) -> Self {
        Self {
            units: HashMap::new(),
            registry,
            follow_new_units: false,
        }
    }

    /// Start watching units that first appear after startup.
    ///
    /// Used when monitoring every unit: a change for an unwatched unit path
    /// creates the unit (in state `unknown`) before it is delivered.
    pub fn follow_new_units(mut self, follow: bool) -> Self {
        self.follow_new_units = follow;
        self
    }

    /// Watch `identity`. Returns `false` if it was already watched.
    pub fn watch(&mut self, identity: UnitIdentity) -> bool {
        if self.units.contains_key(&identity) {
            return false;
        }
        tracing::debug!(unit = %identity, "watching unit");
        let unit = Unit::new(identity.clone(), Arc::clone(&self.registry));
        self.units.insert(identity, unit);
        true
    }

    /// Watch the named units (escaped into object paths).
    pub fn watch_names<S: AsRef<str>>(&mut self, names: &[S]) -> usize {
        names
            .iter()
            .filter(|name| self.watch(UnitIdentity::from_unit_name(name.as_ref())))
            .count()
    }

    /// Watch every unit the bus currently knows about.
    pub async fn watch_all<C>(&mut self, bus: &mut C) -> Result<usize, MonitorError>
    where
        C: BusConnector + ?Sized,
    {
        let paths = bus.list_unit_paths().await?;
        let added = paths
            .into_iter()
            .filter(|path| self.watch(UnitIdentity::from_object_path(path.as_str())))
            .count();
        tracing::info!(units = added, "discovered units on the bus");
        Ok(added)
    }

    pub fn unit(&self, identity: &str) -> Option<&Unit> {
        self.units.get(identity)
    }

    /// Watched identities, sorted.
    pub fn identities(&self) -> Vec<&UnitIdentity> {
        let mut ids: Vec<&UnitIdentity> = self.units.keys().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn registry(&self) -> &NotifierRegistry {
        &self.registry
    }

    /// Route one bus change to its unit.
    ///
    /// Changes for unwatched paths are ignored unless new units are followed.
    pub fn handle_change(
        &mut self,
        change: &StateChange,
    ) -> Result<Option<LifecycleEvent>, MonitorError> {
        if !self.units.contains_key(change.path.as_str()) {
            let identity = UnitIdentity::from_object_path(change.path.as_str());
            if !(self.follow_new_units && identity.is_unit_path()) {
                tracing::trace!(path = %change.path, "ignoring change for unwatched path");
                return Ok(None);
            }
            self.watch(identity);
        }

        let Some(unit) = self.units.get_mut(change.path.as_str()) else {
            return Ok(None);
        };
        unit.on_properties_changed(&change.interface, change.active_state.as_deref())
            .map_err(|source| MonitorError::State {
                unit: change.path.clone(),
                source,
            })
    }

    /// Deliver a raw state token to a watched unit.
    pub fn deliver(
        &mut self,
        identity: &str,
        raw: &str,
    ) -> Result<Option<LifecycleEvent>, MonitorError> {
        let unit = self.unit_mut(identity)?;
        unit.deliver_raw(raw).map_err(|source| MonitorError::State {
            unit: identity.to_string(),
            source,
        })
    }

    /// Move a watched unit along the table without notifying anyone.
    pub fn prime(&mut self, identity: &str, input: Input) -> Result<(), MonitorError> {
        let unit = self.unit_mut(identity)?;
        unit.prime(input).map_err(|source| MonitorError::State {
            unit: identity.to_string(),
            source,
        })
    }

    fn unit_mut(&mut self, identity: &str) -> Result<&mut Unit, MonitorError> {
        self.units
            .get_mut(identity)
            .ok_or_else(|| MonitorError::UnknownUnit(identity.to_string()))
    }

    /// Process changes until the bus stream ends.
    ///
    /// Rejected deliveries are logged by the unit and counted; they never
    /// stop the loop. A bus error does.
    pub async fn run<C>(&mut self, bus: &mut C) -> Result<RunSummary, MonitorError>
    where
        C: BusConnector + ?Sized,
    {
        let mut summary = RunSummary::default();
        while let Some(change) = bus.next_change().await? {
            summary.changes += 1;
            match self.handle_change(&change) {
                Ok(Some(_)) => summary.events += 1,
                Ok(None) => {}
                Err(_) => summary.rejected += 1,
            }
        }
        tracing::info!(
            changes = summary.changes,
            events = summary.events,
            rejected = summary.rejected,
            "bus stream ended"
        );
        Ok(summary)
    }
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("units", &self.units.len())
            .field("registry", &self.registry)
            .field("follow_new_units", &self.follow_new_units)
            .finish()
    }
}
