//! Mounting a slice on a host render loop
//!
//! [`SliceHook`] is one mounted usage of a slice. The host drives it:
//!
//! 1. `mount` once: computes the initial state, assigns a devtools
//!    instance id, connects the relay
//! 2. `render` whenever it draws: returns bound selectors, the bound
//!    dispatcher and the state snapshot for this frame
//! 3. `commit` after the frame is on screen: flushes the devtools log
//!
//! Dispatches between two renders are batched; `needs_render` tells the host
//! whether another frame is due.
//!
//! ```ignore
//! let mut hook = SliceHook::mount(Arc::new(todo_slice()), UseSliceOptions::default())?;
//!
//! loop {
//!     if hook.needs_render() {
//!         let Rendered { selectors, dispatch, .. } = hook.render();
//!         draw(&selectors);
//!         hook.commit();
//!     }
//!     handle_input(&dispatch)?;
//! }
//! ```

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use serde::Serialize;

use crate::action::DispatchAction;
use crate::bind::{BoundAction, BoundActions, BoundSelectors};
use crate::devtools::{ConnectOptions, DevtoolsConfig, DevtoolsRelay, RelayState};
use crate::error::Result;
use crate::slice::{reducer_of, Slice};
use crate::store::{Dispatch, SliceStore};

/// Options accepted when mounting a slice
pub struct UseSliceOptions<Sl: Slice> {
    /// Overrides [`Slice::initial_state`]
    pub initial_state: Option<Sl::State>,
    /// Folded into the initial state before the first render; never logged
    pub initial_actions: Vec<Sl::Action>,
    /// Devtools settings
    pub devtools: DevtoolsConfig,
}

impl<Sl: Slice> Default for UseSliceOptions<Sl> {
    fn default() -> Self {
        Self {
            initial_state: None,
            initial_actions: Vec::new(),
            devtools: DevtoolsConfig::default(),
        }
    }
}

impl<Sl: Slice> fmt::Debug for UseSliceOptions<Sl> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UseSliceOptions")
            .field("initial_state", &self.initial_state.is_some())
            .field("initial_actions", &self.initial_actions)
            .field("devtools", &self.devtools)
            .finish()
    }
}

impl<Sl: Slice> UseSliceOptions<Sl> {
    /// Start from this state instead of the slice default
    pub fn with_initial_state(mut self, state: Sl::State) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Fold these actions into the initial state
    pub fn with_initial_actions(mut self, actions: impl IntoIterator<Item = Sl::Action>) -> Self {
        self.initial_actions = actions.into_iter().collect();
        self
    }

    /// Use these devtools settings
    pub fn with_devtools(mut self, devtools: DevtoolsConfig) -> Self {
        self.devtools = devtools;
        self
    }
}

/// The dispatcher handed out by a render
///
/// Derefs to [`Dispatch`] for raw actions and thunks, and adds the slice's
/// creators by name.
pub struct BoundDispatch<S, A> {
    actions: Arc<BoundActions<S, A>>,
}

impl<S, A> Clone for BoundDispatch<S, A> {
    fn clone(&self) -> Self {
        Self {
            actions: Arc::clone(&self.actions),
        }
    }
}

impl<S, A> fmt::Debug for BoundDispatch<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BoundDispatch").field(&self.actions).finish()
    }
}

impl<S, A> Deref for BoundDispatch<S, A>
where
    S: Send + Sync + 'static,
    A: crate::Action,
{
    type Target = Dispatch<S, A>;

    fn deref(&self) -> &Dispatch<S, A> {
        self.actions.dispatcher()
    }
}

impl<S, A> BoundDispatch<S, A>
where
    S: Send + Sync + 'static,
    A: crate::Action,
{
    /// The bound creator table
    pub fn actions(&self) -> &BoundActions<S, A> {
        &self.actions
    }

    /// Bound creator names, sorted
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.actions.names()
    }

    /// Typed handle to a bound creator
    pub fn get<P: 'static, Out: 'static>(&self, name: &str) -> Result<BoundAction<P, Out>> {
        self.actions.get(name)
    }

    /// Call a plain creator by name and return the dispatched action
    pub fn call<P: 'static>(&self, name: &str, payload: P) -> Result<A> {
        self.actions.call(name, payload)
    }

    /// Call a thunk creator by name and return the thunk's result
    pub fn call_thunk<P: 'static, R: 'static>(&self, name: &str, payload: P) -> Result<R> {
        self.actions.call_thunk(name, payload)
    }

    /// Whether both dispatchers share one binding of the creator table
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.actions, &other.actions)
    }
}

impl<S, A> DispatchAction<A> for BoundDispatch<S, A>
where
    S: Send + Sync + 'static,
    A: crate::Action,
{
    fn dispatch_action(&self, action: A) -> Result<A> {
        self.dispatch(action)
    }
}

/// What one render hands to the host
pub struct Rendered<Sl: Slice> {
    /// Selectors closed over `state`
    pub selectors: BoundSelectors<Sl::State>,
    /// Dispatcher with the slice's creators bound
    pub dispatch: BoundDispatch<Sl::State, Sl::Action>,
    /// State snapshot of this render
    pub state: Arc<Sl::State>,
}

impl<Sl: Slice> Clone for Rendered<Sl> {
    fn clone(&self) -> Self {
        Self {
            selectors: self.selectors.clone(),
            dispatch: self.dispatch.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl<Sl: Slice> fmt::Debug for Rendered<Sl> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rendered")
            .field("selectors", &self.selectors)
            .field("dispatch", &self.dispatch)
            .finish_non_exhaustive()
    }
}

impl<Sl: Slice> Rendered<Sl> {
    /// `(selectors, dispatch, state)`
    #[allow(clippy::type_complexity)]
    pub fn into_parts(
        self,
    ) -> (
        BoundSelectors<Sl::State>,
        BoundDispatch<Sl::State, Sl::Action>,
        Arc<Sl::State>,
    ) {
        (self.selectors, self.dispatch, self.state)
    }
}

/// One mounted usage of a slice
pub struct SliceHook<Sl: Slice> {
    slice: Arc<Sl>,
    store: SliceStore<Sl::State, Sl::Action>,
    relay: DevtoolsRelay,
    bound_actions: Arc<BoundActions<Sl::State, Sl::Action>>,
    actions_for: Arc<Sl>,
    bound_selectors: BoundSelectors<Sl::State>,
    selectors_for: (Arc<Sl>, u64),
    rendered_version: Option<u64>,
}

impl<Sl: Slice> fmt::Debug for SliceHook<Sl> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SliceHook")
            .field("slice", &self.slice.name())
            .field("store", &self.store)
            .field("relay", &self.relay)
            .field("rendered_version", &self.rendered_version)
            .finish()
    }
}

impl<Sl> SliceHook<Sl>
where
    Sl: Slice,
    Sl::State: Serialize,
    Sl::Action: Serialize,
{
    /// Mount `slice`
    ///
    /// Fails only if the reducer rejects one of the initial actions. A
    /// missing or failing devtools monitor leaves the relay idle.
    pub fn mount(slice: Arc<Sl>, options: UseSliceOptions<Sl>) -> Result<Self> {
        let UseSliceOptions {
            initial_state,
            initial_actions,
            devtools,
        } = options;

        let seed = initial_state.unwrap_or_else(|| slice.initial_state());
        let store = SliceStore::new(seed, reducer_of(&slice), initial_actions)?;

        let instance_id = devtools.assign_instance_id();
        store.tag_log(instance_id);

        let relay = match devtools.resolve_extension() {
            Some(extension) => {
                let options = ConnectOptions {
                    name: devtools
                        .name
                        .clone()
                        .unwrap_or_else(|| format!("use_slice({})", slice.name())),
                    instance_id,
                    action_creators: devtools.replay_creators(slice.actions().names()),
                    features: devtools.features.clone(),
                };
                DevtoolsRelay::connect(extension.as_ref(), &options, &*store.state())
            }
            None => DevtoolsRelay::idle(instance_id),
        };

        let (state, version) = store.snapshot();
        let bound_actions = Arc::new(slice.actions().bind(&store.dispatcher()));
        let bound_selectors = slice.selectors().bind(state);

        tracing::debug!(
            slice = slice.name(),
            instance_id,
            devtools = ?relay.state(),
            "Slice mounted"
        );

        Ok(Self {
            actions_for: Arc::clone(&slice),
            selectors_for: (Arc::clone(&slice), version),
            slice,
            store,
            relay,
            bound_actions,
            bound_selectors,
            rendered_version: None,
        })
    }

    /// Produce the tables and snapshot for one frame
    ///
    /// The creator binding is reused until the descriptor changes; the
    /// selector binding until the descriptor or the state changes.
    pub fn render(&mut self) -> Rendered<Sl> {
        let (state, version) = self.store.snapshot();

        if !Arc::ptr_eq(&self.actions_for, &self.slice) {
            self.bound_actions = Arc::new(self.slice.actions().bind(&self.store.dispatcher()));
            self.actions_for = Arc::clone(&self.slice);
            tracing::trace!(slice = self.slice.name(), "Action creators rebound");
        }

        let (selectors_slice, selectors_version) = &self.selectors_for;
        if !Arc::ptr_eq(selectors_slice, &self.slice) || *selectors_version != version {
            self.bound_selectors = self.slice.selectors().bind(Arc::clone(&state));
            self.selectors_for = (Arc::clone(&self.slice), version);
        }

        self.rendered_version = Some(version);
        tracing::trace!(
            slice = self.slice.name(),
            instance_id = self.relay.instance_id(),
            version,
            "Render"
        );

        Rendered {
            selectors: self.bound_selectors.clone(),
            dispatch: BoundDispatch {
                actions: Arc::clone(&self.bound_actions),
            },
            state,
        }
    }

    /// Post-render effect: flush queued dispatches to the devtools monitor
    ///
    /// Returns how many entries were delivered.
    pub fn commit(&mut self) -> usize {
        let entries = self.store.drain_log();
        self.relay.flush(entries)
    }

    /// Whether state changed since the last render
    pub fn needs_render(&self) -> bool {
        self.rendered_version != Some(self.store.version())
    }

    /// Supply the descriptor for the next render
    ///
    /// Passing the same `Arc` is a no-op. A different one swaps the reducer
    /// immediately and rebinds on the next render.
    pub fn set_slice(&mut self, slice: Arc<Sl>) {
        if Arc::ptr_eq(&self.slice, &slice) {
            return;
        }
        self.store.replace_reducer(reducer_of(&slice));
        self.slice = slice;
    }

    /// Current descriptor
    pub fn slice(&self) -> &Arc<Sl> {
        &self.slice
    }

    /// Latest state, which may be newer than the last render
    pub fn state(&self) -> Arc<Sl::State> {
        self.store.state()
    }

    /// Raw dispatch handle
    pub fn dispatcher(&self) -> Dispatch<Sl::State, Sl::Action> {
        self.store.dispatcher()
    }

    /// Dispatches not yet flushed by a commit
    pub fn pending_log_len(&self) -> usize {
        self.store.pending_log_len()
    }

    /// Devtools instance id of this mount
    pub fn instance_id(&self) -> u32 {
        self.relay.instance_id()
    }

    /// Whether a devtools monitor is connected
    pub fn relay_state(&self) -> RelayState {
        self.relay.state()
    }
}
