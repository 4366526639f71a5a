//! Time-travel debugger integration
//!
//! Mirrors the dispatch history of a mounted slice to an external monitor:
//!
//! - [`DevtoolsExtension`]: the monitor entry point, `connect(options)`
//! - [`Connection`]: `init(state)` once, then `send(action, state)` per entry
//! - [`DevtoolsRelay`]: queues nothing itself; flushes drained store log
//!   entries to the connection once per render commit
//! - [`InstanceRegistry`]: hands out instance ids so simultaneous mounts
//!   stay apart in the monitor's instance list
//!
//! # Discovery
//!
//! A monitor is found either on the hook's [`DevtoolsConfig`] or, failing
//! that, in the process-wide slot filled by [`install_extension`]. With
//! neither present the relay stays idle and every operation is a no-op.
//!
//! ```ignore
//! use slice_dispatch::devtools::{install_extension, JsonLinesExtension};
//!
//! let file = std::fs::File::create("devtools.jsonl")?;
//! install_extension(Arc::new(JsonLinesExtension::new(file)));
//! ```

mod instance;
mod json_lines;
mod relay;

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub use instance::{InstanceRegistry, DEFAULT_FIRST_INSTANCE_ID};
pub use json_lines::{JsonLinesConnection, JsonLinesExtension};
pub use relay::{action_to_value, ActionLog, DevtoolsRelay, LogEntry, RelayState};

/// Errors raised while talking to a monitor
///
/// These never reach dispatch or render callers; the relay logs and drops
/// them.
#[derive(Error, Debug)]
pub enum DevtoolsError {
    /// The monitor refused the connection
    #[error("monitor refused connection: {0}")]
    Connect(String),

    /// An action or state could not be serialized
    #[error("failed to serialize devtools payload: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Writing to the monitor failed
    #[error("monitor i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The monitor went away
    #[error("monitor connection closed")]
    Closed,
}

/// Options handed to [`DevtoolsExtension::connect`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectOptions {
    /// Display name of the instance
    pub name: String,
    /// Instance id, unique per mounted usage
    pub instance_id: u32,
    /// Names of the slice's action creators, for the monitor's dispatch menu
    pub action_creators: Vec<String>,
    /// Extra monitor-specific options
    pub features: Map<String, Value>,
}

/// A monitor that can open connections
pub trait DevtoolsExtension: Send + Sync {
    /// Open a connection for one mounted usage
    fn connect(&self, options: &ConnectOptions) -> Result<Box<dyn Connection>, DevtoolsError>;
}

/// One open monitor connection
pub trait Connection: Send {
    /// Seed the monitor with the initial state
    fn init(&mut self, state: &Value) -> Result<(), DevtoolsError>;

    /// Record an action together with the state it produced
    fn send(&mut self, action: &Value, state: &Value) -> Result<(), DevtoolsError>;
}

static EXTENSION: RwLock<Option<Arc<dyn DevtoolsExtension>>> = RwLock::new(None);

/// Install the process-wide monitor, returning the previous one
pub fn install_extension(extension: Arc<dyn DevtoolsExtension>) -> Option<Arc<dyn DevtoolsExtension>> {
    EXTENSION
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .replace(extension)
}

/// Remove the process-wide monitor
pub fn uninstall_extension() -> Option<Arc<dyn DevtoolsExtension>> {
    EXTENSION
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .take()
}

/// The process-wide monitor, if one is installed
pub fn installed_extension() -> Option<Arc<dyn DevtoolsExtension>> {
    EXTENSION
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Devtools settings for one mounted usage
///
/// # Example
///
/// ```ignore
/// let config = DevtoolsConfig::default()
///     .instance_id(42)
///     .name("todos (sidebar)")
///     .action_creators(["todos/cleared"])
///     .extension(recorder.clone());
/// ```
#[derive(Clone)]
pub struct DevtoolsConfig {
    /// Connect to a monitor at all
    pub enabled: bool,
    /// Fixed instance id; drawn from the registry when `None`
    pub instance_id: Option<u32>,
    /// Display name; defaults to `use_slice(<slice name>)`
    pub name: Option<String>,
    /// Monitor to use instead of the installed one
    pub extension: Option<Arc<dyn DevtoolsExtension>>,
    /// Registry to draw instance ids from instead of the global one
    pub registry: Option<Arc<InstanceRegistry>>,
    /// Creator names offered for replay on top of the slice's own
    pub action_creators: Vec<String>,
    /// Extra options forwarded in [`ConnectOptions::features`]
    pub features: Map<String, Value>,
}

impl Default for DevtoolsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            instance_id: None,
            name: None,
            extension: None,
            registry: None,
            action_creators: Vec::new(),
            features: Map::new(),
        }
    }
}

impl fmt::Debug for DevtoolsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DevtoolsConfig")
            .field("enabled", &self.enabled)
            .field("instance_id", &self.instance_id)
            .field("name", &self.name)
            .field("extension", &self.extension.is_some())
            .field("registry", &self.registry.is_some())
            .field("action_creators", &self.action_creators)
            .field("features", &self.features)
            .finish()
    }
}

impl DevtoolsConfig {
    /// A config that never connects
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Use a fixed instance id
    pub fn instance_id(mut self, id: u32) -> Self {
        self.instance_id = Some(id);
        self
    }

    /// Override the display name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Connect to this monitor instead of the installed one
    pub fn extension(mut self, extension: Arc<dyn DevtoolsExtension>) -> Self {
        self.extension = Some(extension);
        self
    }

    /// Draw instance ids from this registry
    pub fn registry(mut self, registry: Arc<InstanceRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Offer these creator names for replay alongside the slice's own
    pub fn action_creators<I>(mut self, names: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.action_creators.extend(names.into_iter().map(Into::into));
        self
    }

    /// Creator names reported to the monitor: `own` first, then the extra
    /// ones, without duplicates
    pub fn replay_creators<'a>(&self, own: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for name in own
            .into_iter()
            .map(|name| -> &str { name })
            .chain(self.action_creators.iter().map(String::as_str))
        {
            if !names.iter().any(|known| known == name) {
                names.push(name.to_string());
            }
        }
        names
    }

    /// Add a monitor-specific option
    pub fn feature(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.features.insert(key.into(), value.into());
        self
    }

    /// Resolve the instance id for a new mount
    pub fn assign_instance_id(&self) -> u32 {
        match &self.registry {
            Some(registry) => registry.assign(self.instance_id),
            None => InstanceRegistry::global().assign(self.instance_id),
        }
    }

    /// The monitor to connect to: the configured one, else the installed one
    pub fn resolve_extension(&self) -> Option<Arc<dyn DevtoolsExtension>> {
        if !self.enabled {
            return None;
        }
        self.extension.clone().or_else(installed_extension)
    }
}
