//! Action log and the relay that drains it into a monitor connection

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use super::{ConnectOptions, Connection, DevtoolsError, DevtoolsExtension};
use crate::action::Action;

/// One dispatched action and the state it produced
#[derive(Debug, Clone)]
pub struct LogEntry<A, S> {
    pub action: A,
    pub state: Arc<S>,
}

/// FIFO of dispatched actions waiting to be flushed
///
/// Records nothing until tagged with an instance id. Once tagged it is
/// appended on every successful dispatch whether or not a monitor is
/// connected, and drained once per commit.
#[derive(Debug, Clone)]
pub struct ActionLog<A, S> {
    instance_id: Option<u32>,
    entries: VecDeque<LogEntry<A, S>>,
}

impl<A, S> Default for ActionLog<A, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, S> ActionLog<A, S> {
    /// Create an empty, untagged log that records nothing
    pub fn new() -> Self {
        Self {
            instance_id: None,
            entries: VecDeque::new(),
        }
    }

    /// Tag the log with the instance id of its mounted usage and start
    /// recording
    pub fn tag(&mut self, instance_id: u32) {
        self.instance_id = Some(instance_id);
    }

    /// Instance id this log belongs to
    pub fn instance_id(&self) -> Option<u32> {
        self.instance_id
    }

    /// Whether pushed entries are kept
    pub fn is_recording(&self) -> bool {
        self.instance_id.is_some()
    }

    /// Append an entry; dropped while untagged
    pub fn push(&mut self, action: A, state: Arc<S>) {
        if !self.is_recording() {
            return;
        }
        self.entries.push_back(LogEntry { action, state });
    }

    /// Remove and return every entry, oldest first
    pub fn drain(&mut self) -> Vec<LogEntry<A, S>> {
        self.entries.drain(..).collect()
    }

    /// Number of entries waiting
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Serialize an action into the shape monitors expect: an object carrying
/// a `"type"` field.
///
/// Object payloads get `type` injected unless they already have one. A bare
/// string can only come from a unit variant and becomes `{"type": name}`,
/// whatever the variant serializes as. Anything else is wrapped as
/// `{"type": name, "payload": value}`.
pub fn action_to_value<A: Action + Serialize>(action: &A) -> Result<Value, DevtoolsError> {
    let name = action.name();
    let value = serde_json::to_value(action)?;

    let object = match value {
        Value::Object(mut map) => {
            map.entry("type")
                .or_insert_with(|| Value::String(name.to_string()));
            map
        }
        Value::String(_) => {
            let mut map = Map::new();
            map.insert("type".into(), Value::String(name.to_string()));
            map
        }
        other => {
            let mut map = Map::new();
            map.insert("type".into(), Value::String(name.to_string()));
            map.insert("payload".into(), other);
            map
        }
    };
    Ok(Value::Object(object))
}

/// Whether the relay has a live monitor connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    /// No monitor; every operation is a no-op
    Idle,
    /// Connected and seeded with the initial state
    Connected,
}

/// Forwards drained log entries to a monitor connection
///
/// Delivery is best effort: failures are logged and dropped, never retried,
/// never returned.
pub struct DevtoolsRelay {
    instance_id: u32,
    connection: Option<Box<dyn Connection>>,
    sent: u64,
    dropped: u64,
}

impl fmt::Debug for DevtoolsRelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DevtoolsRelay")
            .field("instance_id", &self.instance_id)
            .field("state", &self.state())
            .field("sent", &self.sent)
            .field("dropped", &self.dropped)
            .finish()
    }
}

impl DevtoolsRelay {
    /// A relay with no monitor
    pub fn idle(instance_id: u32) -> Self {
        Self {
            instance_id,
            connection: None,
            sent: 0,
            dropped: 0,
        }
    }

    /// Connect to `extension` and seed it with `initial_state`.
    ///
    /// Falls back to an idle relay if connecting, serializing or seeding
    /// fails.
    pub fn connect<S: Serialize>(
        extension: &dyn DevtoolsExtension,
        options: &ConnectOptions,
        initial_state: &S,
    ) -> Self {
        let instance_id = options.instance_id;
        let connection = extension.connect(options).and_then(|mut connection| {
            let state = serde_json::to_value(initial_state)?;
            connection.init(&state)?;
            Ok(connection)
        });

        match connection {
            Ok(connection) => {
                tracing::debug!(instance_id, name = %options.name, "Devtools connected");
                Self {
                    connection: Some(connection),
                    ..Self::idle(instance_id)
                }
            }
            Err(error) => {
                tracing::warn!(instance_id, %error, "Devtools unavailable, staying idle");
                Self::idle(instance_id)
            }
        }
    }

    /// Current relay state
    pub fn state(&self) -> RelayState {
        if self.connection.is_some() {
            RelayState::Connected
        } else {
            RelayState::Idle
        }
    }

    /// Instance id this relay reports under
    pub fn instance_id(&self) -> u32 {
        self.instance_id
    }

    /// Entries delivered so far
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Entries that failed to deliver and were dropped
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Send every entry in order, one `send` per entry.
    ///
    /// Consumes all entries even when idle or when sends fail. Returns the
    /// number delivered.
    pub fn flush<A, S>(&mut self, entries: impl IntoIterator<Item = LogEntry<A, S>>) -> usize
    where
        A: Action + Serialize,
        S: Serialize,
    {
        let Some(connection) = self.connection.as_mut() else {
            entries.into_iter().for_each(drop);
            return 0;
        };

        let mut delivered = 0;
        for entry in entries {
            let result = action_to_value(&entry.action).and_then(|action| {
                let state = serde_json::to_value(&*entry.state)?;
                connection.send(&action, &state)
            });
            match result {
                Ok(()) => delivered += 1,
                Err(error) => {
                    self.dropped += 1;
                    tracing::warn!(
                        instance_id = self.instance_id,
                        action = %entry.action.name(),
                        %error,
                        "Devtools send failed, dropping entry"
                    );
                }
            }
        }

        self.sent += delivered as u64;
        tracing::trace!(instance_id = self.instance_id, delivered, "Devtools flush");
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Clone, Debug, Serialize)]
    enum TestAction {
        Reset,
        Add(i32),
        Rename { name: String },
    }

    impl Action for TestAction {
        fn name(&self) -> &'static str {
            match self {
                TestAction::Reset => "Reset",
                TestAction::Add(_) => "Add",
                TestAction::Rename { .. } => "Rename",
            }
        }
    }

    #[derive(Clone, Debug, Serialize)]
    #[serde(tag = "type")]
    enum TaggedAction {
        #[serde(rename = "todos/added")]
        Added { text: String },
    }

    impl Action for TaggedAction {
        fn name(&self) -> &'static str {
            "Added"
        }
    }

    type Sent = Arc<Mutex<Vec<(Value, Value)>>>;

    struct FakeConnection {
        sent: Sent,
        fail_on: Option<usize>,
    }

    impl Connection for FakeConnection {
        fn init(&mut self, _state: &Value) -> Result<(), DevtoolsError> {
            Ok(())
        }

        fn send(&mut self, action: &Value, state: &Value) -> Result<(), DevtoolsError> {
            let mut sent = self.sent.lock().unwrap();
            if self.fail_on == Some(sent.len()) {
                self.fail_on = None;
                return Err(DevtoolsError::Closed);
            }
            sent.push((action.clone(), state.clone()));
            Ok(())
        }
    }

    struct FakeExtension {
        sent: Sent,
        fail_on: Option<usize>,
        refuse: bool,
    }

    impl DevtoolsExtension for FakeExtension {
        fn connect(&self, _options: &ConnectOptions) -> Result<Box<dyn Connection>, DevtoolsError> {
            if self.refuse {
                return Err(DevtoolsError::Connect("refused".into()));
            }
            Ok(Box::new(FakeConnection {
                sent: Arc::clone(&self.sent),
                fail_on: self.fail_on,
            }))
        }
    }

    fn options(instance_id: u32) -> ConnectOptions {
        ConnectOptions {
            name: "use_slice(test)".into(),
            instance_id,
            action_creators: vec![],
            features: Map::new(),
        }
    }

    fn entries(actions: &[(TestAction, i32)]) -> Vec<LogEntry<TestAction, i32>> {
        actions
            .iter()
            .map(|(action, state)| LogEntry {
                action: action.clone(),
                state: Arc::new(*state),
            })
            .collect()
    }

    #[test]
    fn test_action_to_value_shapes() {
        assert_eq!(action_to_value(&TestAction::Reset).unwrap(), json!({"type": "Reset"}));
        assert_eq!(
            action_to_value(&TestAction::Add(3)).unwrap(),
            json!({"type": "Add", "Add": 3})
        );
        assert_eq!(
            action_to_value(&TaggedAction::Added { text: "x".into() }).unwrap(),
            json!({"type": "todos/added", "text": "x"})
        );
    }

    #[derive(Clone, Debug, Serialize)]
    enum RenamedAction {
        Reset,
    }

    impl Action for RenamedAction {
        fn name(&self) -> &'static str {
            "counter/reset"
        }
    }

    #[test]
    fn test_renamed_unit_variant_has_no_payload() {
        assert_eq!(
            action_to_value(&RenamedAction::Reset).unwrap(),
            json!({"type": "counter/reset"})
        );
    }

    #[test]
    fn test_untagged_log_records_nothing() {
        let mut log: ActionLog<TestAction, i32> = ActionLog::new();
        log.push(TestAction::Add(1), Arc::new(1));

        assert!(!log.is_recording());
        assert!(log.is_empty());
    }

    #[test]
    fn test_action_log_fifo() {
        let mut log: ActionLog<TestAction, i32> = ActionLog::new();
        log.tag(5001);
        log.push(TestAction::Add(1), Arc::new(1));
        log.push(TestAction::Reset, Arc::new(0));

        assert_eq!(log.instance_id(), Some(5001));
        let drained: Vec<_> = log.drain().into_iter().map(|e| e.action.name()).collect();
        assert_eq!(drained, vec!["Add", "Reset"]);
        assert!(log.is_empty());
    }

    #[test]
    fn test_idle_flush_is_noop() {
        let mut relay = DevtoolsRelay::idle(1);
        assert_eq!(relay.state(), RelayState::Idle);
        assert_eq!(relay.flush(entries(&[(TestAction::Add(1), 1)])), 0);
        assert_eq!(relay.sent(), 0);
    }

    #[test]
    fn test_connected_flush_preserves_order() {
        let sent = Sent::default();
        let extension = FakeExtension {
            sent: Arc::clone(&sent),
            fail_on: None,
            refuse: false,
        };
        let mut relay = DevtoolsRelay::connect(&extension, &options(9), &0);
        assert_eq!(relay.state(), RelayState::Connected);

        let delivered = relay.flush(entries(&[
            (TestAction::Add(2), 2),
            (TestAction::Rename { name: "n".into() }, 2),
            (TestAction::Reset, 0),
        ]));

        assert_eq!(delivered, 3);
        let types: Vec<_> = sent.lock().unwrap().iter().map(|(a, _)| a["type"].clone()).collect();
        assert_eq!(types, vec![json!("Add"), json!("Rename"), json!("Reset")]);
        assert_eq!(sent.lock().unwrap()[0].1, json!(2));
    }

    #[test]
    fn test_send_failure_is_dropped() {
        let sent = Sent::default();
        let extension = FakeExtension {
            sent: Arc::clone(&sent),
            fail_on: Some(0),
            refuse: false,
        };
        let mut relay = DevtoolsRelay::connect(&extension, &options(9), &0);

        let delivered = relay.flush(entries(&[(TestAction::Add(1), 1), (TestAction::Add(1), 2)]));

        assert_eq!(delivered, 1);
        assert_eq!(relay.dropped(), 1);
        assert_eq!(sent.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_refused_connection_degrades_to_idle() {
        let extension = FakeExtension {
            sent: Sent::default(),
            fail_on: None,
            refuse: true,
        };
        let relay = DevtoolsRelay::connect(&extension, &options(3), &0);
        assert_eq!(relay.state(), RelayState::Idle);
        assert_eq!(relay.instance_id(), 3);
    }
}
