//! Reducer-driven state container
//!
//! [`SliceStore`] owns the session state of one mounted slice. State is held
//! behind an `Arc` and replaced, never mutated, on each successful dispatch.
//! Once the log is tagged with a devtools instance id, every applied action
//! is recorded with the state it produced so the relay can forward the
//! history after the next render commit. An untagged store keeps no history.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::action::{Action, DispatchAction};
use crate::devtools::{ActionLog, LogEntry};
use crate::error::{Error, ReduceError, Result};
use crate::thunk::{Dispatchable, Dispatched, Thunk};

/// A reducer mapping the current state and an action to the next state
///
/// Returning `Err` rejects the action; the store keeps the prior state.
pub type Reducer<S, A> =
    Arc<dyn Fn(&S, &A) -> std::result::Result<S, ReduceError> + Send + Sync>;

struct Inner<S, A> {
    state: Arc<S>,
    version: u64,
    reducer: Reducer<S, A>,
    log: ActionLog<A, S>,
}

impl<S, A: Action> Inner<S, A> {
    fn apply(&mut self, action: &A) -> Result<()> {
        let next = (self.reducer)(&self.state, action).map_err(|source| Error::Reduce {
            action: action.name(),
            source,
        })?;
        let next = Arc::new(next);
        self.state = Arc::clone(&next);
        self.version += 1;
        self.log.push(action.clone(), next);
        Ok(())
    }
}

fn lock<S, A>(inner: &Mutex<Inner<S, A>>) -> MutexGuard<'_, Inner<S, A>> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State container for one mounted slice
///
/// # Example
/// ```ignore
/// let reducer: Reducer<i32, CounterAction> = Arc::new(|count, action| match action {
///     CounterAction::Increment => Ok(count + 1),
/// });
///
/// let store = SliceStore::new(0, reducer, [CounterAction::Increment])?;
/// assert_eq!(*store.state(), 1);
///
/// store.dispatcher().dispatch(CounterAction::Increment)?;
/// assert_eq!(*store.state(), 2);
/// ```
pub struct SliceStore<S, A> {
    inner: Arc<Mutex<Inner<S, A>>>,
}

impl<S, A> SliceStore<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    /// Create a store, folding `pre_actions` into `seed` before anything can
    /// observe the state.
    ///
    /// Pre-seed actions are not recorded in the action log. The first
    /// reducer failure aborts construction.
    pub fn new(
        seed: S,
        reducer: Reducer<S, A>,
        pre_actions: impl IntoIterator<Item = A>,
    ) -> Result<Self> {
        let mut state = seed;
        for action in pre_actions {
            state = reducer(&state, &action).map_err(|source| Error::Reduce {
                action: action.name(),
                source,
            })?;
        }

        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                state: Arc::new(state),
                version: 0,
                reducer,
                log: ActionLog::new(),
            })),
        })
    }

    /// Current state
    pub fn state(&self) -> Arc<S> {
        Arc::clone(&lock(&self.inner).state)
    }

    /// Number of state replacements since construction
    pub fn version(&self) -> u64 {
        lock(&self.inner).version
    }

    /// Current state and version, read together
    pub fn snapshot(&self) -> (Arc<S>, u64) {
        let inner = lock(&self.inner);
        (Arc::clone(&inner.state), inner.version)
    }

    /// A cloneable handle for dispatching into this store
    pub fn dispatcher(&self) -> Dispatch<S, A> {
        Dispatch {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Swap the reducer used for subsequent dispatches
    pub fn replace_reducer(&self, reducer: Reducer<S, A>) {
        lock(&self.inner).reducer = reducer;
    }

    /// Tag the action log with a devtools instance id and start recording
    /// dispatches into it
    pub fn tag_log(&self, instance_id: u32) {
        lock(&self.inner).log.tag(instance_id);
    }

    /// Take every recorded (action, state) pair, oldest first
    pub fn drain_log(&self) -> Vec<LogEntry<A, S>> {
        lock(&self.inner).log.drain()
    }

    /// Number of recorded entries waiting to be drained
    pub fn pending_log_len(&self) -> usize {
        lock(&self.inner).log.len()
    }
}

impl<S, A> fmt::Debug for SliceStore<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = lock(&self.inner);
        f.debug_struct("SliceStore")
            .field("version", &inner.version)
            .field("pending_log", &inner.log.len())
            .finish()
    }
}

/// Dispatch handle into a [`SliceStore`]
///
/// Cheap to clone. The store lock is only held while the reducer runs, so
/// thunk bodies may dispatch re-entrantly.
pub struct Dispatch<S, A> {
    inner: Arc<Mutex<Inner<S, A>>>,
}

impl<S, A> Clone for Dispatch<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, A> fmt::Debug for Dispatch<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch").finish_non_exhaustive()
    }
}

impl<S, A> Dispatch<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    /// Apply a plain action and return it
    ///
    /// On reducer failure the error is returned and the state is unchanged.
    pub fn dispatch(&self, action: A) -> Result<A> {
        let mut inner = lock(&self.inner);
        inner.apply(&action)?;
        tracing::debug!(action = %action.name(), version = inner.version, "Action dispatched");
        Ok(action)
    }

    /// Run a thunk with this handle and a live state accessor, returning
    /// whatever the thunk returns
    pub fn run<R>(&self, thunk: Thunk<S, A, R>) -> R {
        tracing::trace!("Running thunk");
        thunk.call(self, &self.get_state())
    }

    /// Dispatch either a plain action or a thunk
    pub fn apply<R>(&self, dispatchable: Dispatchable<S, A, R>) -> Result<Dispatched<A, R>> {
        match dispatchable {
            Dispatchable::Plain(action) => self.dispatch(action).map(Dispatched::Action),
            Dispatchable::Deferred(thunk) => Ok(Dispatched::Returned(self.run(thunk))),
        }
    }

    /// Accessor that always reads the latest state
    pub fn get_state(&self) -> GetState<S> {
        let inner = Arc::clone(&self.inner);
        GetState {
            read: Arc::new(move || Arc::clone(&lock(&inner).state)),
        }
    }
}

impl<S, A> DispatchAction<A> for Dispatch<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    fn dispatch_action(&self, action: A) -> Result<A> {
        self.dispatch(action)
    }
}

/// Reads the latest state of a store, not a snapshot taken at creation
pub struct GetState<S> {
    read: Arc<dyn Fn() -> Arc<S> + Send + Sync>,
}

impl<S> GetState<S> {
    /// Latest state
    pub fn get(&self) -> Arc<S> {
        (self.read)()
    }
}

impl<S> Clone for GetState<S> {
    fn clone(&self) -> Self {
        Self {
            read: Arc::clone(&self.read),
        }
    }
}

impl<S> fmt::Debug for GetState<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GetState").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    enum TestAction {
        Increment,
        Add(i32),
        Fail,
    }

    impl Action for TestAction {
        fn name(&self) -> &'static str {
            match self {
                TestAction::Increment => "Increment",
                TestAction::Add(_) => "Add",
                TestAction::Fail => "Fail",
            }
        }
    }

    fn test_reducer() -> Reducer<i32, TestAction> {
        Arc::new(|count: &i32, action: &TestAction| match action {
            TestAction::Increment => Ok(count + 1),
            TestAction::Add(n) => Ok(count + n),
            TestAction::Fail => Err(ReduceError::new("refused")),
        })
    }

    #[test]
    fn test_store_dispatch_folds_in_order() {
        let store = SliceStore::new(0, test_reducer(), []).unwrap();
        let dispatch = store.dispatcher();

        let actions = [TestAction::Add(3), TestAction::Increment, TestAction::Add(-10)];
        for action in actions.clone() {
            assert_eq!(dispatch.dispatch(action.clone()).unwrap(), action);
        }

        let expected = actions.iter().fold(0, |state, action| {
            (test_reducer())(&state, action).unwrap()
        });
        assert_eq!(*store.state(), expected);
        assert_eq!(store.version(), 3);
    }

    #[test]
    fn test_pre_actions_fold_into_seed_without_logging() {
        let store =
            SliceStore::new(10, test_reducer(), [TestAction::Increment, TestAction::Add(5)])
                .unwrap();

        assert_eq!(*store.state(), 16);
        assert_eq!(store.version(), 0);
        assert!(store.drain_log().is_empty());
    }

    #[test]
    fn test_pre_action_failure_aborts_construction() {
        let result = SliceStore::new(0, test_reducer(), [TestAction::Fail]);
        assert!(matches!(result, Err(Error::Reduce { action: "Fail", .. })));
    }

    #[test]
    fn test_standalone_store_keeps_no_history() {
        let store = SliceStore::new(0, test_reducer(), []).unwrap();
        let dispatch = store.dispatcher();
        for _ in 0..1_000 {
            dispatch.dispatch(TestAction::Increment).unwrap();
        }

        assert_eq!(*store.state(), 1_000);
        assert_eq!(store.pending_log_len(), 0);
        assert!(store.drain_log().is_empty());
    }

    #[test]
    fn test_reducer_failure_leaves_state_and_log_untouched() {
        let store = SliceStore::new(0, test_reducer(), []).unwrap();
        store.tag_log(5000);
        let dispatch = store.dispatcher();
        dispatch.dispatch(TestAction::Increment).unwrap();

        let err = dispatch.dispatch(TestAction::Fail).unwrap_err();
        assert!(matches!(err, Error::Reduce { action: "Fail", .. }));
        assert_eq!(*store.state(), 1);
        assert_eq!(store.version(), 1);
        assert_eq!(store.pending_log_len(), 1);
    }

    #[test]
    fn test_log_records_resulting_state() {
        let store = SliceStore::new(0, test_reducer(), []).unwrap();
        store.tag_log(5000);
        let dispatch = store.dispatcher();
        dispatch.dispatch(TestAction::Add(2)).unwrap();
        dispatch.dispatch(TestAction::Add(3)).unwrap();

        let entries = store.drain_log();
        let pairs: Vec<_> = entries.iter().map(|e| (e.action.clone(), *e.state)).collect();
        assert_eq!(pairs, vec![(TestAction::Add(2), 2), (TestAction::Add(3), 5)]);
        assert_eq!(store.pending_log_len(), 0);
    }

    #[test]
    fn test_thunk_sees_latest_state_and_dispatches_nested() {
        let store = SliceStore::new(0, test_reducer(), []).unwrap();
        store.tag_log(5000);
        let dispatch = store.dispatcher();

        let observed = dispatch.run(Thunk::new(
            |dispatch: &Dispatch<i32, TestAction>, get_state: &GetState<i32>| {
                let before = *get_state.get();
                dispatch.dispatch(TestAction::Add(4)).unwrap();
                let nested = dispatch.run(Thunk::new(
                    |dispatch: &Dispatch<i32, TestAction>, get_state: &GetState<i32>| {
                        dispatch.dispatch(TestAction::Increment).unwrap();
                        *get_state.get()
                    },
                ));
                (before, nested, *get_state.get())
            },
        ));

        assert_eq!(observed, (0, 5, 5));
        let names: Vec<_> = store.drain_log().iter().map(|e| e.action.name()).collect();
        assert_eq!(names, vec!["Add", "Increment"]);
    }

    #[test]
    fn test_apply_branches_on_dispatchable() {
        let store = SliceStore::new(0, test_reducer(), []).unwrap();
        let dispatch = store.dispatcher();

        let plain = dispatch
            .apply::<&str>(Dispatchable::Plain(TestAction::Increment))
            .unwrap();
        assert_eq!(plain, Dispatched::Action(TestAction::Increment));

        let deferred = dispatch
            .apply(Dispatchable::Deferred(Thunk::new(
                |_: &Dispatch<i32, TestAction>, _: &GetState<i32>| "done",
            )))
            .unwrap();
        assert_eq!(deferred.into_returned(), Some("done"));
        assert_eq!(*store.state(), 1);
    }

    #[test]
    fn test_replace_reducer() {
        let store = SliceStore::new(0, test_reducer(), []).unwrap();
        store.replace_reducer(Arc::new(
            |count: &i32, _action: &TestAction| -> std::result::Result<i32, ReduceError> {
                Ok(count * 10 + 1)
            },
        ));

        store.dispatcher().dispatch(TestAction::Increment).unwrap();
        assert_eq!(*store.state(), 1);
    }
}
