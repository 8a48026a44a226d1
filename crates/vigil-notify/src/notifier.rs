// notifier.rs - The capability every notification back end implements.
//
// One method per lifecycle event, each taking the unit's normalized
// identity. Every method defaults to a no-op so a back end only overrides
// the events it cares about (the mail notifiers, for example, only report
// failures and recoveries).
//
// Back ends that talk to the network must not block here: queue or spawn
// the send and return. "Dispatched" means "handler invoked", not
// "message delivered".

use vigil_state::LifecycleEvent;

use crate::error::NotifyError;

/// A notification back end.
pub trait Notifier: Send + Sync {
    /// Catalog name of this notifier (e.g. `"irc"`), used in logs.
    fn name(&self) -> &str;

    /// The unit went `activating → active`.
    fn normal_start(&self, _unit: &str) -> Result<(), NotifyError> {
        Ok(())
    }

    /// The unit went `deactivating → inactive`.
    fn normal_stop(&self, _unit: &str) -> Result<(), NotifyError> {
        Ok(())
    }

    /// The unit entered `failed`.
    fn failure(&self, _unit: &str) -> Result<(), NotifyError> {
        Ok(())
    }

    /// The unit reported `failed` again while already failed.
    fn ongoing_failure(&self, _unit: &str) -> Result<(), NotifyError> {
        Ok(())
    }

    /// The unit went `failed → active`.
    fn recovery(&self, _unit: &str) -> Result<(), NotifyError> {
        Ok(())
    }

    /// First state report for a unit whose state was unknown.
    fn change_from_unknown(&self, _unit: &str) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Invoke the method of `notifier` named by `event`.
pub fn invoke(
    notifier: &dyn Notifier,
    unit: &str,
    event: LifecycleEvent,
) -> Result<(), NotifyError> {
    match event {
        LifecycleEvent::NormalStart => notifier.normal_start(unit),
        LifecycleEvent::NormalStop => notifier.normal_stop(unit),
        LifecycleEvent::Failure => notifier.failure(unit),
        LifecycleEvent::OngoingFailure => notifier.ongoing_failure(unit),
        LifecycleEvent::Recovery => notifier.recovery(unit),
        LifecycleEvent::ChangeFromUnknown => notifier.change_from_unknown(unit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn record(&self, method: &str, unit: &str) -> Result<(), NotifyError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{}({})", method, unit));
            Ok(())
        }
    }

    impl Notifier for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }
        fn normal_start(&self, unit: &str) -> Result<(), NotifyError> {
            self.record("normal_start", unit)
        }
        fn normal_stop(&self, unit: &str) -> Result<(), NotifyError> {
            self.record("normal_stop", unit)
        }
        fn failure(&self, unit: &str) -> Result<(), NotifyError> {
            self.record("failure", unit)
        }
        fn ongoing_failure(&self, unit: &str) -> Result<(), NotifyError> {
            self.record("ongoing_failure", unit)
        }
        fn recovery(&self, unit: &str) -> Result<(), NotifyError> {
            self.record("recovery", unit)
        }
        fn change_from_unknown(&self, unit: &str) -> Result<(), NotifyError> {
            self.record("change_from_unknown", unit)
        }
    }

    #[test]
    fn invoke_calls_the_method_named_by_the_event() {
        let recorder = Recorder::default();
        for event in LifecycleEvent::ALL {
            invoke(&recorder, "u", event).unwrap();
        }
        let calls = recorder.calls.lock().unwrap();
        let expected: Vec<String> = LifecycleEvent::ALL
            .iter()
            .map(|e| format!("{}(u)", e.event_type()))
            .collect();
        assert_eq!(*calls, expected);
    }

    #[test]
    fn default_methods_are_no_ops() {
        struct Quiet;
        impl Notifier for Quiet {
            fn name(&self) -> &str {
                "quiet"
            }
        }
        for event in LifecycleEvent::ALL {
            assert!(invoke(&Quiet, "u", event).is_ok());
        }
    }
}
