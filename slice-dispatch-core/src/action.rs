//! Action trait for type-safe state transitions

use std::fmt::Debug;

use crate::error::Result;

/// Marker trait for actions that can be dispatched to a slice store
///
/// Actions represent intents to change state. They should be:
/// - Clone: Actions are recorded alongside the resulting state for devtools
/// - Debug: For debugging and logging
/// - Send + 'static: So dispatch handles can move into async thunk tails
///
/// Use `#[derive(Action)]` from `slice-dispatch-macros` to auto-implement this trait.
pub trait Action: Clone + Debug + Send + 'static {
    /// The action's type tag, used for logging and as the devtools `type` field
    fn name(&self) -> &'static str;
}

/// Anything that can accept a plain action and hand it back once applied.
///
/// Implemented by [`Dispatch`](crate::Dispatch) and
/// [`BoundDispatch`](crate::BoundDispatch). The `#[action(creators)]` derive
/// generates its per-variant methods on top of this trait.
pub trait DispatchAction<A: Action> {
    /// Apply `action` and return it.
    fn dispatch_action(&self, action: A) -> Result<A>;
}
