//! The slice descriptor contract
//!
//! A slice bundles a reducer, an initial-state factory, named action
//! creators and named selectors. Any type implementing [`Slice`] can be
//! mounted; [`SliceDef`] covers the common case of assembling one from
//! closures.

use std::fmt;
use std::sync::Arc;

use crate::action::Action;
use crate::bind::{ActionCreators, Selectors};
use crate::error::ReduceError;
use crate::store::Reducer;

/// A named state-management unit
///
/// # Example
///
/// ```ignore
/// struct CounterSlice {
///     actions: ActionCreators<i32, CounterAction>,
///     selectors: Selectors<i32>,
/// }
///
/// impl Slice for CounterSlice {
///     type State = i32;
///     type Action = CounterAction;
///
///     fn name(&self) -> &str { "counter" }
///     fn initial_state(&self) -> i32 { 0 }
///     fn reduce(&self, count: &i32, action: &CounterAction) -> Result<i32, ReduceError> {
///         Ok(match action {
///             CounterAction::Increment => count + 1,
///             CounterAction::Decrement => count - 1,
///         })
///     }
///     fn actions(&self) -> &ActionCreators<i32, CounterAction> { &self.actions }
///     fn selectors(&self) -> &Selectors<i32> { &self.selectors }
/// }
/// ```
pub trait Slice: Send + Sync + 'static {
    /// Session state
    type State: Send + Sync + 'static;
    /// Plain action type the reducer understands
    type Action: Action;

    /// Slice name, used for the default devtools instance name
    fn name(&self) -> &str;

    /// Fresh default state
    fn initial_state(&self) -> Self::State;

    /// Compute the next state; must not have side effects
    fn reduce(
        &self,
        state: &Self::State,
        action: &Self::Action,
    ) -> Result<Self::State, ReduceError>;

    /// Named action creators
    fn actions(&self) -> &ActionCreators<Self::State, Self::Action>;

    /// Named selectors
    fn selectors(&self) -> &Selectors<Self::State>;
}

/// The reducer of `slice` as a store reducer
pub fn reducer_of<Sl: Slice>(slice: &Arc<Sl>) -> Reducer<Sl::State, Sl::Action> {
    let slice = Arc::clone(slice);
    Arc::new(move |state: &Sl::State, action: &Sl::Action| slice.reduce(state, action))
}

type InitialState<S> = Arc<dyn Fn() -> S + Send + Sync>;

/// A slice assembled from closures
///
/// # Example
///
/// ```ignore
/// let counter = SliceDef::new("counter", || 0, |count: &i32, action: &CounterAction| {
///     Ok(match action {
///         CounterAction::Increment => count + 1,
///     })
/// })
/// .with_actions(ActionCreators::new().action("increment", |(): ()| CounterAction::Increment))
/// .with_selectors(Selectors::new().selector("select_count", |count: &i32| *count));
/// ```
pub struct SliceDef<S, A> {
    name: String,
    initial_state: InitialState<S>,
    reducer: Reducer<S, A>,
    actions: ActionCreators<S, A>,
    selectors: Selectors<S>,
}

impl<S, A> fmt::Debug for SliceDef<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SliceDef")
            .field("name", &self.name)
            .field("actions", &self.actions)
            .field("selectors", &self.selectors)
            .finish_non_exhaustive()
    }
}

impl<S, A> SliceDef<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    /// A slice with no creators or selectors yet
    pub fn new<I, R>(name: impl Into<String>, initial_state: I, reducer: R) -> Self
    where
        I: Fn() -> S + Send + Sync + 'static,
        R: Fn(&S, &A) -> Result<S, ReduceError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            initial_state: Arc::new(initial_state),
            reducer: Arc::new(reducer),
            actions: ActionCreators::new(),
            selectors: Selectors::new(),
        }
    }

    /// Replace the action creators
    pub fn with_actions(mut self, actions: ActionCreators<S, A>) -> Self {
        self.actions = actions;
        self
    }

    /// Replace the selectors
    pub fn with_selectors(mut self, selectors: Selectors<S>) -> Self {
        self.selectors = selectors;
        self
    }
}

impl<S, A> Slice for SliceDef<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    type State = S;
    type Action = A;

    fn name(&self) -> &str {
        &self.name
    }

    fn initial_state(&self) -> S {
        (self.initial_state)()
    }

    fn reduce(&self, state: &S, action: &A) -> Result<S, ReduceError> {
        (self.reducer)(state, action)
    }

    fn actions(&self) -> &ActionCreators<S, A> {
        &self.actions
    }

    fn selectors(&self) -> &Selectors<S> {
        &self.selectors
    }
}
