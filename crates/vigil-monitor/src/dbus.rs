// dbus.rs - BusConnector speaking D-Bus to systemd's manager.
//
// One connection serves the whole run. It carries the PropertiesChanged
// match, the Manager.Subscribe call and the ListUnits enumeration. systemd
// tracks subscriptions per connection and drops them when the connection
// closes, so the connection must outlive monitoring.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio_stream::StreamExt;
use zbus::message::Type as MessageType;
use zbus::zvariant::{OwnedObjectPath, OwnedValue, Value};
use zbus::{Connection, MatchRule, Message, MessageStream};

use crate::bus::{BusConnector, BusKind, StateChange};
use crate::error::BusError;

const DESTINATION: &str = "org.freedesktop.systemd1";
const MANAGER_PATH: &str = "/org/freedesktop/systemd1";
const MANAGER_INTERFACE: &str = "org.freedesktop.systemd1.Manager";
const PROPERTIES_INTERFACE: &str = "org.freedesktop.DBus.Properties";

/// One `ListUnits` record: `(ssssssouso)`.
pub type UnitRecord = (
    String,
    String,
    String,
    String,
    String,
    String,
    OwnedObjectPath,
    u32,
    String,
    OwnedObjectPath,
);

/// Body of a `PropertiesChanged` signal: `(sa{sv}as)`.
type PropertiesChanged = (String, HashMap<String, OwnedValue>, Vec<String>);

/// Connector holding a subscribed connection to the service manager.
pub struct DbusConnector {
    connection: Connection,
    stream: MessageStream,
}

impl DbusConnector {
    /// Connect to `bus`, install the signal match and subscribe.
    ///
    /// The match is added before `Subscribe` so no change emitted in
    /// between is lost.
    pub async fn connect(bus: BusKind) -> Result<Self, BusError> {
        let connection = match bus {
            BusKind::System => Connection::system().await,
            BusKind::User => Connection::session().await,
        }
        .map_err(|source| BusError::Connect { bus, source })?;

        let rule = MatchRule::builder()
            .msg_type(MessageType::Signal)
            .interface(PROPERTIES_INTERFACE)
            .and_then(|b| b.member("PropertiesChanged"))
            .and_then(|b| b.path_namespace(MANAGER_PATH))
            .map_err(|source| BusError::Call {
                method: "AddMatch",
                source,
            })?
            .build();
        let stream = MessageStream::for_match_rule(rule, &connection, None)
            .await
            .map_err(|source| BusError::Call {
                method: "AddMatch",
                source,
            })?;

        let connector = Self { connection, stream };
        connector.call_manager("Subscribe").await?;
        tracing::info!(bus = %bus, "subscribed to unit property changes");
        Ok(connector)
    }

    async fn call_manager(&self, method: &'static str) -> Result<Message, BusError> {
        self.connection
            .call_method(
                Some(DESTINATION),
                MANAGER_PATH,
                Some(MANAGER_INTERFACE),
                method,
                &(),
            )
            .await
            .map_err(|source| BusError::Call { method, source })
    }
}

#[async_trait]
impl BusConnector for DbusConnector {
    async fn list_unit_paths(&mut self) -> Result<Vec<String>, BusError> {
        let reply = self.call_manager("ListUnits").await?;
        let records: Vec<UnitRecord> = reply
            .body()
            .deserialize()
            .map_err(|e| BusError::Parse(format!("ListUnits: {}", e)))?;
        Ok(unit_paths(records))
    }

    async fn next_change(&mut self) -> Result<Option<StateChange>, BusError> {
        while let Some(message) = self.stream.next().await {
            let message = message.map_err(BusError::Stream)?;
            match state_change(&message) {
                Ok(Some(change)) => return Ok(Some(change)),
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping malformed bus message");
                    continue;
                }
            }
        }
        tracing::info!("bus connection closed");
        Ok(None)
    }
}

/// Object paths of `ListUnits` records, used verbatim.
pub fn unit_paths(records: Vec<UnitRecord>) -> Vec<String> {
    records
        .into_iter()
        .map(|record| record.6.as_str().to_string())
        .collect()
}

fn state_change(message: &Message) -> Result<Option<StateChange>, BusError> {
    let header = message.header();
    let Some(path) = header.path() else {
        return Ok(None);
    };
    let (interface, changed, _invalidated): PropertiesChanged = message
        .body()
        .deserialize()
        .map_err(|e| BusError::Parse(format!("PropertiesChanged on {}: {}", path, e)))?;
    Ok(Some(StateChange {
        path: path.as_str().to_string(),
        active_state: active_state(&changed),
        interface,
    }))
}

/// The `ActiveState` carried by a change set, if any.
pub fn active_state(changed: &HashMap<String, OwnedValue>) -> Option<String> {
    match changed.get("ActiveState").map(|v| &**v) {
        Some(Value::Str(state)) => Some(state.as_str().to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, path: &str) -> UnitRecord {
        (
            name.to_string(),
            String::new(),
            "loaded".to_string(),
            "active".to_string(),
            "running".to_string(),
            String::new(),
            OwnedObjectPath::try_from(path).unwrap(),
            0,
            String::new(),
            OwnedObjectPath::try_from("/").unwrap(),
        )
    }

    fn value(v: Value<'_>) -> OwnedValue {
        OwnedValue::try_from(v).unwrap()
    }

    #[test]
    fn list_units_yields_object_paths_verbatim() {
        let paths = unit_paths(vec![
            record("sshd.service", "/org/freedesktop/systemd1/unit/sshd_2eservice"),
            record("dbus.socket", "/org/freedesktop/systemd1/unit/dbus_2esocket"),
        ]);
        assert_eq!(
            paths,
            vec![
                "/org/freedesktop/systemd1/unit/sshd_2eservice",
                "/org/freedesktop/systemd1/unit/dbus_2esocket",
            ]
        );
        assert!(unit_paths(Vec::new()).is_empty());
    }

    #[test]
    fn active_state_is_read_from_the_change_set() {
        let mut changed = HashMap::new();
        changed.insert("ActiveState".to_string(), value(Value::from("deactivating")));
        changed.insert("SubState".to_string(), value(Value::from("stop-sigterm")));
        assert_eq!(active_state(&changed).as_deref(), Some("deactivating"));
    }

    #[test]
    fn change_sets_without_active_state() {
        let mut changed = HashMap::new();
        changed.insert("MainPID".to_string(), value(Value::from(42u32)));
        assert_eq!(active_state(&changed), None);

        changed.insert("ActiveState".to_string(), value(Value::from(1u32)));
        assert_eq!(active_state(&changed), None);
    }
}
