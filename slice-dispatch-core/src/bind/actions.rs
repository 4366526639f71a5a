//! Action-creator tables and their dispatch-bound counterparts

use std::any::{type_name, Any};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::action::Action;
use crate::error::{Error, Result};
use crate::store::Dispatch;
use crate::thunk::Thunk;

type Erased = Arc<dyn Any + Send + Sync>;
type Binder<S, A> = Arc<dyn Fn(&Dispatch<S, A>) -> Erased + Send + Sync>;
type BoundFn<P, Out> = Arc<dyn Fn(P) -> Result<Out> + Send + Sync>;

/// Whether a creator builds a plain action or a thunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreatorKind {
    Plain,
    Thunk,
}

struct CreatorEntry<S, A> {
    kind: CreatorKind,
    signature: &'static str,
    bind: Binder<S, A>,
}

impl<S, A> Clone for CreatorEntry<S, A> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            signature: self.signature,
            bind: Arc::clone(&self.bind),
        }
    }
}

/// Named action creators of a slice
///
/// Each creator takes one payload argument (use a tuple for several, `()`
/// for none) and builds either a plain action or a [`Thunk`].
///
/// # Example
///
/// ```ignore
/// let creators = ActionCreators::new()
///     .action("todo_added", |text: String| TodoAction::Added(Todo::new(text)))
///     .action("todo_deleted", TodoAction::Deleted)
///     .thunk("fetch_todo", |text: String| fetch_todo(text));
/// ```
pub struct ActionCreators<S, A> {
    entries: BTreeMap<&'static str, CreatorEntry<S, A>>,
}

impl<S, A> Clone for ActionCreators<S, A> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<S, A> Default for ActionCreators<S, A> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<S, A> fmt::Debug for ActionCreators<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(name, entry)| (name, entry.kind)))
            .finish()
    }
}

impl<S, A> ActionCreators<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plain action creator. Replaces any creator of the same name.
    pub fn action<P, F>(mut self, name: &'static str, create: F) -> Self
    where
        P: 'static,
        F: Fn(P) -> A + Send + Sync + 'static,
    {
        let create = Arc::new(create);
        let bind: Binder<S, A> = Arc::new(move |dispatch: &Dispatch<S, A>| {
            let create = Arc::clone(&create);
            let dispatch = dispatch.clone();
            let bound: BoundFn<P, A> = Arc::new(move |payload: P| dispatch.dispatch(create(payload)));
            Arc::new(bound) as Erased
        });

        self.entries.insert(
            name,
            CreatorEntry {
                kind: CreatorKind::Plain,
                signature: type_name::<fn(P) -> A>(),
                bind,
            },
        );
        self
    }

    /// Register a thunk creator. Replaces any creator of the same name.
    pub fn thunk<P, R, F>(mut self, name: &'static str, create: F) -> Self
    where
        P: 'static,
        R: 'static,
        F: Fn(P) -> Thunk<S, A, R> + Send + Sync + 'static,
    {
        let create = Arc::new(create);
        let bind: Binder<S, A> = Arc::new(move |dispatch: &Dispatch<S, A>| {
            let create = Arc::clone(&create);
            let dispatch = dispatch.clone();
            let bound: BoundFn<P, R> = Arc::new(move |payload: P| Ok(dispatch.run(create(payload))));
            Arc::new(bound) as Erased
        });

        self.entries.insert(
            name,
            CreatorEntry {
                kind: CreatorKind::Thunk,
                signature: type_name::<fn(P) -> R>(),
                bind,
            },
        );
        self
    }

    /// Creator names, sorted
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    /// Number of creators
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bind every creator to `dispatch`
    pub fn bind(&self, dispatch: &Dispatch<S, A>) -> BoundActions<S, A> {
        let entries = self
            .entries
            .iter()
            .map(|(name, entry)| {
                let bound = BoundEntry {
                    kind: entry.kind,
                    signature: entry.signature,
                    callable: (entry.bind)(dispatch),
                };
                (*name, bound)
            })
            .collect();

        BoundActions {
            dispatch: dispatch.clone(),
            entries,
        }
    }
}

#[derive(Clone)]
struct BoundEntry {
    kind: CreatorKind,
    signature: &'static str,
    callable: Erased,
}

/// A single creator bound to a dispatch handle
///
/// Calling it builds the action or thunk and dispatches it in one step.
pub struct BoundAction<P, Out> {
    name: &'static str,
    call: BoundFn<P, Out>,
}

impl<P, Out> Clone for BoundAction<P, Out> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            call: Arc::clone(&self.call),
        }
    }
}

impl<P, Out> fmt::Debug for BoundAction<P, Out> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundAction").field("name", &self.name).finish()
    }
}

impl<P, Out> BoundAction<P, Out> {
    /// Creator name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Build and dispatch
    ///
    /// Returns the action for plain creators, the thunk's return value for
    /// thunk creators.
    pub fn call(&self, payload: P) -> Result<Out> {
        (self.call)(payload)
    }
}

/// Every creator of a slice, bound to one dispatch handle
///
/// The name set always equals the creator table it was bound from.
pub struct BoundActions<S, A> {
    dispatch: Dispatch<S, A>,
    entries: BTreeMap<&'static str, BoundEntry>,
}

impl<S, A> Clone for BoundActions<S, A> {
    fn clone(&self) -> Self {
        Self {
            dispatch: self.dispatch.clone(),
            entries: self.entries.clone(),
        }
    }
}

impl<S, A> fmt::Debug for BoundActions<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(name, entry)| (name, entry.kind)))
            .finish()
    }
}

impl<S, A> BoundActions<S, A>
where
    S: Send + Sync + 'static,
    A: Action,
{
    /// The dispatch handle the creators are bound to
    pub fn dispatcher(&self) -> &Dispatch<S, A> {
        &self.dispatch
    }

    /// Bound names, sorted
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    /// Whether `name` is bound
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Kind of the creator bound under `name`
    pub fn kind(&self, name: &str) -> Option<CreatorKind> {
        self.entries.get(name).map(|entry| entry.kind)
    }

    /// Number of bound creators
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is bound
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Typed handle to a bound creator
    pub fn get<P: 'static, Out: 'static>(&self, name: &str) -> Result<BoundAction<P, Out>> {
        let (key, entry) = self
            .entries
            .get_key_value(name)
            .ok_or_else(|| Error::NotCallable { name: name.to_string() })?;

        let call = entry
            .callable
            .downcast_ref::<BoundFn<P, Out>>()
            .ok_or_else(|| Error::SignatureMismatch {
                name: name.to_string(),
                expected: entry.signature,
            })?;

        Ok(BoundAction {
            name: *key,
            call: Arc::clone(call),
        })
    }

    /// Call a plain creator and return the dispatched action
    pub fn call<P: 'static>(&self, name: &str, payload: P) -> Result<A> {
        self.expect_kind(name, CreatorKind::Plain)?;
        self.get::<P, A>(name)?.call(payload)
    }

    /// Call a thunk creator and return the thunk's result
    pub fn call_thunk<P: 'static, R: 'static>(&self, name: &str, payload: P) -> Result<R> {
        self.expect_kind(name, CreatorKind::Thunk)?;
        self.get::<P, R>(name)?.call(payload)
    }

    fn expect_kind(&self, name: &str, kind: CreatorKind) -> Result<()> {
        match self.entries.get(name) {
            None => Err(Error::NotCallable { name: name.to_string() }),
            Some(entry) if entry.kind != kind => Err(Error::SignatureMismatch {
                name: name.to_string(),
                expected: entry.signature,
            }),
            Some(_) => Ok(()),
        }
    }
}
