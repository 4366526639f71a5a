//! Deferred computations ("thunks") and the plain/deferred dispatch union
//!
//! A thunk receives the dispatch handle and a live state accessor. Its body
//! runs synchronously at dispatch time, so everything it dispatches before
//! returning is applied in order. Async work is expressed by returning a
//! future; dispatch hands that future back without driving it.
//!
//! ```ignore
//! let load = Thunk::new(|dispatch: &Dispatch<TodoState, TodoAction>, _get_state| {
//!     let _ = dispatch.dispatch(TodoAction::LoadingStarted);
//!     let dispatch = dispatch.clone();
//!     async move {
//!         tokio::time::sleep(Duration::from_millis(250)).await;
//!         dispatch.dispatch(TodoAction::Loaded(todo))
//!     }
//! });
//! let pending = dispatch.run(load);
//! pending.await?;
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::store::{Dispatch, GetState};

/// Boxed future returned by async thunks registered in a creator table.
pub type ThunkFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

type ThunkBody<S, A, R> = Box<dyn FnOnce(&Dispatch<S, A>, &GetState<S>) -> R + Send>;

/// A deferred computation dispatched instead of a plain action.
pub struct Thunk<S, A, R> {
    body: ThunkBody<S, A, R>,
}

impl<S, A, R> Thunk<S, A, R> {
    /// Wrap a thunk body
    pub fn new<F>(body: F) -> Self
    where
        F: FnOnce(&Dispatch<S, A>, &GetState<S>) -> R + Send + 'static,
    {
        Self {
            body: Box::new(body),
        }
    }

    pub(crate) fn call(self, dispatch: &Dispatch<S, A>, get_state: &GetState<S>) -> R {
        (self.body)(dispatch, get_state)
    }
}

impl<S, A, R> fmt::Debug for Thunk<S, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thunk").finish_non_exhaustive()
    }
}

/// Either a plain action or a deferred computation.
///
/// This is the one place where dispatch branches on what it was handed; see
/// [`Dispatch::apply`].
#[derive(Debug)]
pub enum Dispatchable<S, A, R = A> {
    /// Applied to the reducer immediately
    Plain(A),
    /// Invoked with the dispatch handle and a live state accessor
    Deferred(Thunk<S, A, R>),
}

/// What dispatching a [`Dispatchable`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched<A, R> {
    /// The plain action, handed back after it was applied
    Action(A),
    /// Whatever the thunk returned
    Returned(R),
}

impl<A, R> Dispatched<A, R> {
    /// The applied action, if this was a plain dispatch
    pub fn into_action(self) -> Option<A> {
        match self {
            Dispatched::Action(action) => Some(action),
            Dispatched::Returned(_) => None,
        }
    }

    /// The thunk's return value, if this was a deferred dispatch
    pub fn into_returned(self) -> Option<R> {
        match self {
            Dispatched::Action(_) => None,
            Dispatched::Returned(value) => Some(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ReduceError};
    use crate::store::SliceStore;
    use crate::Action;
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Clone, Debug, PartialEq)]
    enum LoadAction {
        Started,
        Finished(u32),
    }

    impl Action for LoadAction {
        fn name(&self) -> &'static str {
            match self {
                LoadAction::Started => "Started",
                LoadAction::Finished(_) => "Finished",
            }
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct Load {
        loading: bool,
        value: Option<u32>,
    }

    fn store() -> SliceStore<Load, LoadAction> {
        SliceStore::new(
            Load::default(),
            Arc::new(|_: &Load, action: &LoadAction| {
                Ok::<_, ReduceError>(match action {
                    LoadAction::Started => Load {
                        loading: true,
                        value: None,
                    },
                    LoadAction::Finished(value) => Load {
                        loading: false,
                        value: Some(*value),
                    },
                })
            }),
            [],
        )
        .unwrap()
    }

    fn load(value: u32) -> Thunk<Load, LoadAction, ThunkFuture<Result<LoadAction, Error>>> {
        Thunk::new(move |dispatch: &Dispatch<Load, LoadAction>, _: &GetState<Load>| {
            let _ = dispatch.dispatch(LoadAction::Started);
            let dispatch = dispatch.clone();
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(250)).await;
                dispatch.dispatch(LoadAction::Finished(value))
            }) as ThunkFuture<_>
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_async_thunk_runs_sync_part_first() {
        let store = store();
        let pending = store.dispatcher().run(load(7));

        assert!(store.state().loading);
        assert_eq!(store.version(), 1);

        let finished = pending.await.unwrap();
        assert_eq!(finished, LoadAction::Finished(7));
        assert_eq!(
            *store.state(),
            Load {
                loading: false,
                value: Some(7)
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_after_thunk_returns_precedes_async_tail() {
        let store = store();
        store.tag_log(1);
        let dispatch = store.dispatcher();

        let pending = dispatch.run(load(1));
        dispatch.dispatch(LoadAction::Finished(99)).unwrap();
        pending.await.unwrap();

        let names: Vec<_> = store
            .drain_log()
            .into_iter()
            .map(|entry| entry.action)
            .collect();
        assert_eq!(
            names,
            vec![
                LoadAction::Started,
                LoadAction::Finished(99),
                LoadAction::Finished(1)
            ]
        );
    }

    #[test]
    fn test_dispatched_accessors() {
        let action: Dispatched<u8, &str> = Dispatched::Action(1);
        let returned: Dispatched<u8, &str> = Dispatched::Returned("ok");

        assert_eq!(action.clone().into_action(), Some(1));
        assert_eq!(action.into_returned(), None);
        assert_eq!(returned.into_returned(), Some("ok"));
    }
}
