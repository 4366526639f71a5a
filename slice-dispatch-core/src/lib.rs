//! Core traits and types for slice-dispatch
//!
//! This crate turns a Redux-style *slice* (a reducer, an initial state,
//! named action creators and named selectors) into a mounted, stateful
//! usage driven by a host render loop.
//!
//! # Core Concepts
//!
//! - **Slice**: descriptor bundling reducer, initial state, creators and selectors
//! - **SliceStore**: state container applying the reducer to dispatched actions
//! - **Thunk**: deferred computation receiving `dispatch` and `get_state`
//! - **Bound tables**: creators bound to a dispatcher, selectors bound to a state
//! - **SliceHook**: one mounted usage, rendered and committed by the host
//! - **Devtools**: relays every dispatch to an external time-travel monitor
//!
//! # Basic Example
//!
//! ```ignore
//! use slice_dispatch_core::prelude::*;
//!
//! #[derive(Clone, Debug, Serialize)]
//! enum CounterAction {
//!     Increment,
//! }
//!
//! let counter = SliceDef::new("counter", || 0i64, |count: &i64, action: &CounterAction| {
//!     Ok(match action {
//!         CounterAction::Increment => count + 1,
//!     })
//! })
//! .with_actions(ActionCreators::new().action("increment", |(): ()| CounterAction::Increment))
//! .with_selectors(Selectors::new().selector("select_count", |count: &i64| *count));
//!
//! let mut hook = SliceHook::mount(Arc::new(counter), UseSliceOptions::default())?;
//! let Rendered { selectors, dispatch, .. } = hook.render();
//! dispatch.call("increment", ())?;
//! hook.commit();
//! ```
//!
//! # Async Thunk Pattern
//!
//! A thunk body runs synchronously inside the dispatch call. To do async
//! work, return a future from the body; the caller awaits it, and the
//! future dispatches follow-up actions through its own clone of the
//! dispatcher:
//!
//! ```ignore
//! let creators = ActionCreators::new().thunk("fetch_user", |id: u64| {
//!     Thunk::new(move |dispatch: &Dispatch<UserState, UserAction>, _get_state| {
//!         let _ = dispatch.dispatch(UserAction::Loading(true));
//!         let dispatch = dispatch.clone();
//!         Box::pin(async move {
//!             let user = api::fetch_user(id).await;
//!             dispatch.dispatch(UserAction::Loaded(user))?;
//!             dispatch.dispatch(UserAction::Loading(false))
//!         }) as ThunkFuture<Result<UserAction>>
//!     })
//! });
//! ```

pub mod action;
pub mod bind;
pub mod devtools;
pub mod error;
pub mod hook;
pub mod slice;
pub mod store;
pub mod testing;
pub mod thunk;

// Core trait exports
pub use action::{Action, DispatchAction};
pub use slice::{reducer_of, Slice, SliceDef};

// Error exports
pub use error::{Error, ReduceError, Result};

// Store exports
pub use store::{Dispatch, GetState, Reducer, SliceStore};
pub use thunk::{Dispatchable, Dispatched, Thunk, ThunkFuture};

// Binding exports
pub use bind::{
    ActionCreators, BoundAction, BoundActions, BoundSelector, BoundSelectors, CreatorKind,
    Selectors,
};

// Hook exports
pub use hook::{BoundDispatch, Rendered, SliceHook, UseSliceOptions};

// Devtools exports
pub use devtools::{DevtoolsConfig, DevtoolsExtension, DevtoolsRelay, RelayState};

// Testing exports
pub use testing::{HookHarness, RecordingExtension};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::action::{Action, DispatchAction};
    pub use crate::bind::{ActionCreators, BoundActions, BoundSelectors, Selectors};
    pub use crate::devtools::{DevtoolsConfig, JsonLinesExtension, RelayState};
    pub use crate::error::{Error, ReduceError, Result};
    pub use crate::hook::{BoundDispatch, Rendered, SliceHook, UseSliceOptions};
    pub use crate::slice::{Slice, SliceDef};
    pub use crate::store::{Dispatch, GetState};
    pub use crate::thunk::{Dispatchable, Dispatched, Thunk, ThunkFuture};
}
