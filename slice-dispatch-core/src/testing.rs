//! Test utilities for slice-dispatch applications
//!
//! - [`RecordingExtension`]: an in-memory devtools monitor that records
//!   every connect, init and send
//! - [`HookHarness`]: drives a [`SliceHook`] through render/commit cycles
//!   the way a host render loop would
//!
//! # Example
//!
//! ```ignore
//! use slice_dispatch::testing::HookHarness;
//!
//! let mut harness = HookHarness::mount(Arc::new(todo_slice()), UseSliceOptions::default())?;
//!
//! harness.act(|r| r.dispatch.call("add_todo", "buy milk".to_string()))?;
//!
//! assert_eq!(harness.current().selectors.select::<usize>("select_total")?, 1);
//! assert_eq!(harness.recorder().sent_types(5000), vec!["AddTodo"]);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use serde_json::Value;

use crate::devtools::{
    ConnectOptions, Connection, DevtoolsError, DevtoolsExtension, InstanceRegistry,
};
use crate::error::Result;
use crate::hook::{Rendered, SliceHook, UseSliceOptions};
use crate::slice::Slice;

/// Everything a [`RecordingExtension`] observed
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// A connection was opened
    Connect(ConnectOptions),
    /// A connection was seeded with its initial state
    Init { instance_id: u32, state: Value },
    /// An action was relayed
    Send {
        instance_id: u32,
        action: Value,
        state: Value,
    },
}

#[derive(Default)]
struct Shared {
    messages: Mutex<Vec<Message>>,
    fail_sends: AtomicBool,
}

impl Shared {
    fn record(&self, message: Message) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
    }
}

/// In-memory devtools monitor
///
/// Clones share one message list, so a test can keep a handle while the
/// hook owns the connection.
#[derive(Clone, Default)]
pub struct RecordingExtension {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for RecordingExtension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingExtension")
            .field("messages", &self.messages().len())
            .finish()
    }
}

impl RecordingExtension {
    pub fn new() -> Self {
        Self::default()
    }

    /// This recorder as a shareable extension handle
    pub fn as_extension(&self) -> Arc<dyn DevtoolsExtension> {
        Arc::new(self.clone())
    }

    /// Every message so far, in order
    pub fn messages(&self) -> Vec<Message> {
        self.shared
            .messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Connect options of every connection, in order
    pub fn connections(&self) -> Vec<ConnectOptions> {
        self.messages()
            .into_iter()
            .filter_map(|message| match message {
                Message::Connect(options) => Some(options),
                _ => None,
            })
            .collect()
    }

    /// Instance ids of every connection, in order
    pub fn instance_ids(&self) -> Vec<u32> {
        self.connections()
            .into_iter()
            .map(|options| options.instance_id)
            .collect()
    }

    /// Initial state sent for `instance_id`
    pub fn init_state(&self, instance_id: u32) -> Option<Value> {
        self.messages().into_iter().find_map(|message| match message {
            Message::Init {
                instance_id: id,
                state,
            } if id == instance_id => Some(state),
            _ => None,
        })
    }

    /// `(action, state)` pairs relayed for `instance_id`
    pub fn sent(&self, instance_id: u32) -> Vec<(Value, Value)> {
        self.messages()
            .into_iter()
            .filter_map(|message| match message {
                Message::Send {
                    instance_id: id,
                    action,
                    state,
                } if id == instance_id => Some((action, state)),
                _ => None,
            })
            .collect()
    }

    /// `type` fields of the actions relayed for `instance_id`
    pub fn sent_types(&self, instance_id: u32) -> Vec<String> {
        self.sent(instance_id)
            .into_iter()
            .filter_map(|(action, _)| action.get("type").and_then(Value::as_str).map(String::from))
            .collect()
    }

    /// Make every following `send` fail
    pub fn fail_sends(&self, fail: bool) {
        self.shared.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Forget everything recorded
    pub fn clear(&self) {
        self.shared
            .messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl DevtoolsExtension for RecordingExtension {
    fn connect(&self, options: &ConnectOptions) -> std::result::Result<Box<dyn Connection>, DevtoolsError> {
        self.shared.record(Message::Connect(options.clone()));
        Ok(Box::new(RecordingConnection {
            instance_id: options.instance_id,
            shared: Arc::clone(&self.shared),
        }))
    }
}

struct RecordingConnection {
    instance_id: u32,
    shared: Arc<Shared>,
}

impl Connection for RecordingConnection {
    fn init(&mut self, state: &Value) -> std::result::Result<(), DevtoolsError> {
        self.shared.record(Message::Init {
            instance_id: self.instance_id,
            state: state.clone(),
        });
        Ok(())
    }

    fn send(&mut self, action: &Value, state: &Value) -> std::result::Result<(), DevtoolsError> {
        if self.shared.fail_sends.load(Ordering::SeqCst) {
            return Err(DevtoolsError::Closed);
        }
        self.shared.record(Message::Send {
            instance_id: self.instance_id,
            action: action.clone(),
            state: state.clone(),
        });
        Ok(())
    }
}

/// Drives a mounted slice like a host render loop
///
/// Mounting attaches a [`RecordingExtension`] (unless the options name an
/// extension) and a private [`InstanceRegistry`] (unless the options name a
/// registry), so instance ids start at 5000 in every test.
pub struct HookHarness<Sl: Slice> {
    hook: SliceHook<Sl>,
    recorder: RecordingExtension,
    current: Rendered<Sl>,
    renders: usize,
}

impl<Sl> HookHarness<Sl>
where
    Sl: Slice,
    Sl::State: Serialize,
    Sl::Action: Serialize,
{
    /// Mount, render and commit once
    pub fn mount(slice: Arc<Sl>, mut options: UseSliceOptions<Sl>) -> Result<Self> {
        let recorder = RecordingExtension::new();
        if options.devtools.extension.is_none() {
            options.devtools.extension = Some(recorder.as_extension());
        }
        if options.devtools.registry.is_none() {
            options.devtools.registry = Some(Arc::new(InstanceRegistry::default()));
        }

        let mut hook = SliceHook::mount(slice, options)?;
        let current = hook.render();
        hook.commit();

        Ok(Self {
            hook,
            recorder,
            current,
            renders: 1,
        })
    }

    /// Output of the latest render
    pub fn current(&self) -> &Rendered<Sl> {
        &self.current
    }

    /// Run `f` against the latest render, then settle
    pub fn act<T>(&mut self, f: impl FnOnce(&Rendered<Sl>) -> T) -> T {
        let out = f(&self.current);
        self.settle();
        out
    }

    /// Render if state changed, then commit
    ///
    /// Returns whether a render happened.
    pub fn settle(&mut self) -> bool {
        let rendered = self.hook.needs_render();
        if rendered {
            self.render();
        }
        self.hook.commit();
        rendered
    }

    /// Render and commit unconditionally, as a parent re-render would
    pub fn rerender(&mut self) -> &Rendered<Sl> {
        self.render();
        self.hook.commit();
        &self.current
    }

    /// Swap the descriptor and re-render
    pub fn rerender_with(&mut self, slice: Arc<Sl>) -> &Rendered<Sl> {
        self.hook.set_slice(slice);
        self.rerender()
    }

    /// The recorder attached at mount
    pub fn recorder(&self) -> &RecordingExtension {
        &self.recorder
    }

    pub fn hook(&self) -> &SliceHook<Sl> {
        &self.hook
    }

    pub fn hook_mut(&mut self) -> &mut SliceHook<Sl> {
        &mut self.hook
    }

    /// Renders so far, including the mount render
    pub fn renders(&self) -> usize {
        self.renders
    }

    fn render(&mut self) {
        self.current = self.hook.render();
        self.renders += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind::{ActionCreators, Selectors};
    use crate::devtools::DevtoolsConfig;
    use crate::slice::SliceDef;
    use crate::Action;
    use serde_json::json;

    #[derive(Clone, Debug, PartialEq, Serialize)]
    enum FlagAction {
        Toggle,
    }

    impl Action for FlagAction {
        fn name(&self) -> &'static str {
            "Toggle"
        }
    }

    fn flag() -> Arc<SliceDef<bool, FlagAction>> {
        Arc::new(
            SliceDef::new("flag", || false, |on: &bool, _: &FlagAction| Ok(!on))
                .with_actions(ActionCreators::new().action("toggle", |(): ()| FlagAction::Toggle))
                .with_selectors(Selectors::new().selector("select_on", |on: &bool| *on)),
        )
    }

    #[test]
    fn test_harness_mount_connects_recorder() {
        let harness = HookHarness::mount(flag(), UseSliceOptions::default()).unwrap();

        assert_eq!(harness.renders(), 1);
        assert_eq!(harness.recorder().instance_ids(), vec![5000]);
        assert_eq!(harness.recorder().init_state(5000), Some(json!(false)));
        assert_eq!(
            harness.recorder().connections()[0].name,
            "use_slice(flag)".to_string()
        );
        assert_eq!(
            harness.recorder().connections()[0].action_creators,
            vec!["toggle".to_string()]
        );
    }

    #[test]
    fn test_act_renders_and_commits() {
        let mut harness = HookHarness::mount(flag(), UseSliceOptions::default()).unwrap();

        harness.act(|r| r.dispatch.call("toggle", ())).unwrap();

        assert_eq!(harness.renders(), 2);
        assert!(harness.current().selectors.select::<bool>("select_on").unwrap());
        assert_eq!(harness.recorder().sent_types(5000), vec!["Toggle"]);
        assert_eq!(harness.recorder().sent(5000)[0].1, json!(true));
    }

    #[test]
    fn test_settle_without_changes_skips_render() {
        let mut harness = HookHarness::mount(flag(), UseSliceOptions::default()).unwrap();
        assert!(!harness.settle());
        assert_eq!(harness.renders(), 1);

        harness.rerender();
        assert_eq!(harness.renders(), 2);
    }

    #[test]
    fn test_failing_sends_do_not_surface() {
        let mut harness = HookHarness::mount(flag(), UseSliceOptions::default()).unwrap();
        harness.recorder().fail_sends(true);

        harness.act(|r| r.dispatch.call("toggle", ())).unwrap();

        assert!(harness.recorder().sent(5000).is_empty());
        assert!(*harness.current().state);
    }

    #[test]
    fn test_disabled_devtools_records_nothing() {
        let options = UseSliceOptions::default().with_devtools(DevtoolsConfig::disabled());
        let mut harness = HookHarness::mount(flag(), options).unwrap();
        harness.act(|r| r.dispatch.call("toggle", ())).unwrap();

        assert!(harness.recorder().messages().is_empty());
        assert_eq!(harness.hook().instance_id(), 5000);
    }
}
