//! A monitor that writes one JSON message per line
//!
//! Useful for piping dispatch history into a file or another process:
//!
//! ```text
//! {"type":"INIT","instanceId":5000,"name":"use_slice(counter)","actionCreators":["decrement","increment"],"state":0}
//! {"type":"ACTION","instanceId":5000,"action":{"type":"Increment"},"state":1}
//! ```

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use serde_json::Value;

use super::{ConnectOptions, Connection, DevtoolsError, DevtoolsExtension};

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
enum Message<'a> {
    #[serde(rename_all = "camelCase")]
    Init {
        instance_id: u32,
        name: &'a str,
        action_creators: &'a [String],
        state: &'a Value,
    },
    #[serde(rename_all = "camelCase")]
    Action {
        instance_id: u32,
        action: &'a Value,
        state: &'a Value,
    },
}

/// Monitor writing JSON lines to a shared writer
///
/// All connections opened from one extension share its writer, so several
/// mounted slices interleave in one stream, told apart by `instanceId`.
pub struct JsonLinesExtension<W> {
    writer: Arc<Mutex<W>>,
}

impl<W> Clone for JsonLinesExtension<W> {
    fn clone(&self) -> Self {
        Self {
            writer: Arc::clone(&self.writer),
        }
    }
}

impl<W: Write + Send + 'static> JsonLinesExtension<W> {
    /// Write messages to `writer`
    pub fn new(writer: W) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    /// Run `f` with the underlying writer
    pub fn with_writer<T>(&self, f: impl FnOnce(&mut W) -> T) -> T {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut writer)
    }
}

impl<W: Write + Send + 'static> DevtoolsExtension for JsonLinesExtension<W> {
    fn connect(&self, options: &ConnectOptions) -> Result<Box<dyn Connection>, DevtoolsError> {
        Ok(Box::new(JsonLinesConnection {
            writer: Arc::clone(&self.writer),
            options: options.clone(),
        }))
    }
}

/// Connection opened by [`JsonLinesExtension`]
pub struct JsonLinesConnection<W> {
    writer: Arc<Mutex<W>>,
    options: ConnectOptions,
}

impl<W: Write> JsonLinesConnection<W> {
    fn write(&self, message: &Message<'_>) -> Result<(), DevtoolsError> {
        let mut line = serde_json::to_vec(message)?;
        line.push(b'\n');

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(&line)?;
        writer.flush()?;
        Ok(())
    }
}

impl<W: Write + Send> Connection for JsonLinesConnection<W> {
    fn init(&mut self, state: &Value) -> Result<(), DevtoolsError> {
        self.write(&Message::Init {
            instance_id: self.options.instance_id,
            name: &self.options.name,
            action_creators: &self.options.action_creators,
            state,
        })
    }

    fn send(&mut self, action: &Value, state: &Value) -> Result<(), DevtoolsError> {
        self.write(&Message::Action {
            instance_id: self.options.instance_id,
            action,
            state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn options() -> ConnectOptions {
        ConnectOptions {
            name: "use_slice(counter)".into(),
            instance_id: 5000,
            action_creators: vec!["decrement".into(), "increment".into()],
            features: Map::new(),
        }
    }

    fn lines(extension: &JsonLinesExtension<Vec<u8>>) -> Vec<Value> {
        extension.with_writer(|buf| {
            String::from_utf8(buf.clone())
                .unwrap()
                .lines()
                .map(|line| serde_json::from_str(line).unwrap())
                .collect()
        })
    }

    #[test]
    fn test_writes_init_and_actions() {
        let extension = JsonLinesExtension::new(Vec::new());
        let mut connection = extension.connect(&options()).unwrap();

        connection.init(&json!(0)).unwrap();
        connection
            .send(&json!({"type": "Increment"}), &json!(1))
            .unwrap();

        assert_eq!(
            lines(&extension),
            vec![
                json!({
                    "type": "INIT",
                    "instanceId": 5000,
                    "name": "use_slice(counter)",
                    "actionCreators": ["decrement", "increment"],
                    "state": 0
                }),
                json!({
                    "type": "ACTION",
                    "instanceId": 5000,
                    "action": {"type": "Increment"},
                    "state": 1
                }),
            ]
        );
    }

    #[test]
    fn test_connections_share_writer() {
        let extension = JsonLinesExtension::new(Vec::new());
        let mut first = extension.connect(&options()).unwrap();
        let mut second = extension
            .connect(&ConnectOptions {
                instance_id: 5001,
                ..options()
            })
            .unwrap();

        first.send(&json!({"type": "A"}), &json!(1)).unwrap();
        second.send(&json!({"type": "B"}), &json!(2)).unwrap();

        let ids: Vec<_> = lines(&extension)
            .iter()
            .map(|line| line["instanceId"].clone())
            .collect();
        assert_eq!(ids, vec![json!(5000), json!(5001)]);
    }
}
