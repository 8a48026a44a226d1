// unit.rs - One monitored unit: its identity, current state and the
// registry its events go to.
//
// A unit is only ever touched by the monitor loop, one delivery at a time,
// so its state needs no locking. Each delivery runs classify → update →
// dispatch to completion before returning.

use std::sync::Arc;

use vigil_notify::NotifierRegistry;
use vigil_state::{Input, LifecycleEvent, StateError, UnitState};

use crate::identity::UnitIdentity;

/// D-Bus interface whose property changes carry unit state.
pub const UNIT_INTERFACE: &str = "org.freedesktop.systemd1.Unit";

pub struct Unit {
    identity: UnitIdentity,
    state: UnitState,
    registry: Arc<NotifierRegistry>,
}

impl Unit {
    /// A unit in state `unknown`.
    pub fn new(identity: UnitIdentity, registry: Arc<NotifierRegistry>) -> Self {
        Self {
            identity,
            state: UnitState::Unknown,
            registry,
        }
    }

    pub fn identity(&self) -> &UnitIdentity {
        &self.identity
    }

    pub fn state(&self) -> UnitState {
        self.state
    }

    /// Handle one `PropertiesChanged` set for this unit.
    ///
    /// Changes on other interfaces, and change sets without `ActiveState`,
    /// are ignored.
    pub fn on_properties_changed(
        &mut self,
        interface: &str,
        active_state: Option<&str>,
    ) -> Result<Option<LifecycleEvent>, StateError> {
        if interface != UNIT_INTERFACE {
            return Ok(None);
        }
        match active_state {
            Some(raw) => self.deliver_raw(raw),
            None => Ok(None),
        }
    }

    /// Feed one raw `ActiveState` token.
    ///
    /// An unrecognized token is logged and dropped; the state is unchanged
    /// and the error is returned to the caller.
    pub fn deliver_raw(&mut self, raw: &str) -> Result<Option<LifecycleEvent>, StateError> {
        let input = Input::from_raw(raw).inspect_err(|_| {
            tracing::warn!(
                unit = %self.identity,
                raw,
                state = %self.state,
                "dropping unknown raw state"
            );
        })?;
        self.deliver(input)
    }

    /// Apply `input` and dispatch the resulting event, if any.
    pub fn deliver(&mut self, input: Input) -> Result<Option<LifecycleEvent>, StateError> {
        let from = self.state;
        match self.state.apply(input) {
            Ok(event) => {
                tracing::debug!(
                    unit = %self.identity,
                    from = %from,
                    to = %self.state,
                    event = ?event,
                    "state changed"
                );
                if let Some(event) = event {
                    let report = self.registry.dispatch(self.identity.as_str(), event);
                    if !report.is_clean() {
                        tracing::warn!(
                            unit = %self.identity,
                            event = %event,
                            delivered = report.delivered,
                            failed = ?report.failed,
                            "event not delivered to every notifier"
                        );
                    }
                }
                Ok(event)
            }
            Err(e) => {
                tracing::error!(
                    unit = %self.identity,
                    state = %from,
                    input = %input,
                    "invalid transition"
                );
                Err(e)
            }
        }
    }

    /// Move the unit along the table without notifying anyone.
    pub fn prime(&mut self, input: Input) -> Result<(), StateError> {
        self.state.apply(input).map(|_| ())
    }
}

impl std::fmt::Debug for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Unit")
            .field("identity", &self.identity)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use vigil_notify::{Notifier, NotifyError};

    type Journal = Arc<Mutex<Vec<(String, LifecycleEvent)>>>;

    struct Recorder(Journal);

    impl Recorder {
        fn record(&self, unit: &str, event: LifecycleEvent) -> Result<(), NotifyError> {
            self.0.lock().unwrap().push((unit.to_string(), event));
            Ok(())
        }
    }

    impl Notifier for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }
        fn normal_start(&self, unit: &str) -> Result<(), NotifyError> {
            self.record(unit, LifecycleEvent::NormalStart)
        }
        fn normal_stop(&self, unit: &str) -> Result<(), NotifyError> {
            self.record(unit, LifecycleEvent::NormalStop)
        }
        fn failure(&self, unit: &str) -> Result<(), NotifyError> {
            self.record(unit, LifecycleEvent::Failure)
        }
        fn ongoing_failure(&self, unit: &str) -> Result<(), NotifyError> {
            self.record(unit, LifecycleEvent::OngoingFailure)
        }
        fn recovery(&self, unit: &str) -> Result<(), NotifyError> {
            self.record(unit, LifecycleEvent::Recovery)
        }
        fn change_from_unknown(&self, unit: &str) -> Result<(), NotifyError> {
            self.record(unit, LifecycleEvent::ChangeFromUnknown)
        }
    }

    fn unit_with_journal(name: &str) -> (Unit, Journal) {
        let journal = Journal::default();
        let registry = NotifierRegistry::from_notifiers(vec![Box::new(Recorder(journal.clone()))]);
        let unit = Unit::new(UnitIdentity::from_unit_name(name), Arc::new(registry));
        (unit, journal)
    }

    #[test]
    fn first_report_is_a_change_from_unknown() {
        let (mut unit, journal) = unit_with_journal("sshd.service");
        assert_eq!(unit.state(), UnitState::Unknown);

        let event = unit.deliver_raw("active").unwrap();

        assert_eq!(event, Some(LifecycleEvent::ChangeFromUnknown));
        assert_eq!(unit.state(), UnitState::Active);
        assert_eq!(
            *journal.lock().unwrap(),
            vec![(
                "/org/freedesktop/systemd1/unit/sshd_2eservice".to_string(),
                LifecycleEvent::ChangeFromUnknown
            )]
        );
    }

    struct Broken;

    impl Notifier for Broken {
        fn name(&self) -> &str {
            "broken"
        }
        fn failure(&self, _unit: &str) -> Result<(), NotifyError> {
            Err(NotifyError::Delivery {
                notifier: "broken",
                details: "relay refused".into(),
            })
        }
    }

    #[test]
    fn notifier_failure_does_not_affect_the_unit() {
        let journal = Journal::default();
        let registry = NotifierRegistry::from_notifiers(vec![
            Box::new(Broken),
            Box::new(Recorder(journal.clone())),
        ]);
        let mut unit = Unit::new(
            UnitIdentity::from_unit_name("a.service"),
            Arc::new(registry),
        );
        unit.prime(Input::BecomeActive).unwrap();

        let event = unit.deliver_raw("failed").unwrap();

        assert_eq!(event, Some(LifecycleEvent::Failure));
        assert_eq!(unit.state(), UnitState::Failed);
        assert_eq!(journal.lock().unwrap().len(), 1);
    }

    #[test]
    fn unknown_raw_state_is_dropped() {
        let (mut unit, journal) = unit_with_journal("a.service");
        unit.deliver_raw("failed").unwrap();
        journal.lock().unwrap().clear();

        let err = unit.deliver_raw("maintenance").unwrap_err();

        assert_eq!(
            err,
            StateError::UnknownRawState {
                raw: "maintenance".into()
            }
        );
        assert_eq!(unit.state(), UnitState::Failed);
        assert!(journal.lock().unwrap().is_empty());
    }

    #[test]
    fn invalid_transition_keeps_state_and_stays_quiet() {
        let (mut unit, journal) = unit_with_journal("a.service");
        unit.deliver_raw("inactive").unwrap();
        journal.lock().unwrap().clear();

        let err = unit.deliver_raw("deactivating").unwrap_err();

        assert!(matches!(err, StateError::InvalidTransition { .. }));
        assert_eq!(unit.state(), UnitState::Inactive);
        assert!(journal.lock().unwrap().is_empty());

        // The unit keeps working afterwards.
        assert_eq!(
            unit.deliver_raw("failed").unwrap(),
            Some(LifecycleEvent::Failure)
        );
    }

    #[test]
    fn properties_on_other_interfaces_are_ignored() {
        let (mut unit, journal) = unit_with_journal("a.service");
        let event = unit
            .on_properties_changed("org.freedesktop.systemd1.Service", Some("active"))
            .unwrap();
        assert_eq!(event, None);
        assert_eq!(unit.state(), UnitState::Unknown);

        let event = unit.on_properties_changed(UNIT_INTERFACE, None).unwrap();
        assert_eq!(event, None);
        assert!(journal.lock().unwrap().is_empty());
    }

    #[test]
    fn silent_transitions_do_not_dispatch() {
        let (mut unit, journal) = unit_with_journal("a.service");
        unit.deliver_raw("active").unwrap();
        for _ in 0..5 {
            assert_eq!(unit.deliver_raw("active").unwrap(), None);
        }
        assert_eq!(journal.lock().unwrap().len(), 1);
    }

    #[test]
    fn prime_moves_state_without_dispatch() {
        let (mut unit, journal) = unit_with_journal("a.service");
        unit.prime(Input::BecomeFailed).unwrap();
        assert_eq!(unit.state(), UnitState::Failed);
        assert!(journal.lock().unwrap().is_empty());

        assert_eq!(
            unit.deliver_raw("active").unwrap(),
            Some(LifecycleEvent::Recovery)
        );
        assert_eq!(journal.lock().unwrap().len(), 1);
    }
}
