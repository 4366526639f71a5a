//! Selector tables and state-bound selectors

use std::any::{type_name, Any};
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{Error, Result};

type Erased = Arc<dyn Any + Send + Sync>;
type SelectFn<S, Args, R> = Arc<dyn Fn(&S, Args) -> R + Send + Sync>;

#[derive(Clone)]
struct SelectorEntry {
    signature: &'static str,
    select: Erased,
}

/// Named selectors of a slice
///
/// # Example
///
/// ```ignore
/// let selectors = Selectors::new()
///     .selector("select_total", |state: &TodoState| state.ids.len())
///     .selector_with("select_by_id", |state: &TodoState, id: String| {
///         state.entities.get(&id).cloned()
///     });
/// ```
pub struct Selectors<S> {
    entries: Arc<BTreeMap<&'static str, SelectorEntry>>,
    _marker: PhantomData<fn(&S)>,
}

impl<S> Clone for Selectors<S> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            _marker: PhantomData,
        }
    }
}

impl<S> Default for Selectors<S> {
    fn default() -> Self {
        Self {
            entries: Arc::new(BTreeMap::new()),
            _marker: PhantomData,
        }
    }
}

impl<S> fmt::Debug for Selectors<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.keys()).finish()
    }
}

impl<S: 'static> Selectors<S> {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a selector reading only the state
    pub fn selector<R, F>(self, name: &'static str, select: F) -> Self
    where
        R: 'static,
        F: Fn(&S) -> R + Send + Sync + 'static,
    {
        self.selector_with(name, move |state: &S, (): ()| select(state))
    }

    /// Register a selector taking extra arguments after the state
    pub fn selector_with<Args, R, F>(mut self, name: &'static str, select: F) -> Self
    where
        Args: 'static,
        R: 'static,
        F: Fn(&S, Args) -> R + Send + Sync + 'static,
    {
        let select: SelectFn<S, Args, R> = Arc::new(select);
        Arc::make_mut(&mut self.entries).insert(
            name,
            SelectorEntry {
                signature: type_name::<fn(&S, Args) -> R>(),
                select: Arc::new(select),
            },
        );
        self
    }

    /// Selector names, sorted
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    /// Number of selectors
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Close every selector over `state`
    pub fn bind(&self, state: Arc<S>) -> BoundSelectors<S> {
        BoundSelectors {
            state,
            entries: Arc::clone(&self.entries),
        }
    }
}

/// One selector closed over a state snapshot
pub struct BoundSelector<S, Args, R> {
    state: Arc<S>,
    select: SelectFn<S, Args, R>,
}

impl<S, Args, R> Clone for BoundSelector<S, Args, R> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            select: Arc::clone(&self.select),
        }
    }
}

impl<S, Args, R> BoundSelector<S, Args, R> {
    /// Run the selector against the bound snapshot
    pub fn call(&self, args: Args) -> R {
        (self.select)(&self.state, args)
    }
}

impl<S, R> BoundSelector<S, (), R> {
    /// Run a state-only selector
    pub fn get(&self) -> R {
        self.call(())
    }
}

/// Every selector of a slice, closed over the state of one render
///
/// Results are not memoized; each call runs the selector again.
pub struct BoundSelectors<S> {
    state: Arc<S>,
    entries: Arc<BTreeMap<&'static str, SelectorEntry>>,
}

impl<S> Clone for BoundSelectors<S> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<S> fmt::Debug for BoundSelectors<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.keys()).finish()
    }
}

impl<S: 'static> BoundSelectors<S> {
    /// The snapshot the selectors read
    pub fn state(&self) -> &Arc<S> {
        &self.state
    }

    /// Bound names, sorted
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    /// Whether `name` is bound
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of bound selectors
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is bound
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Typed handle to a bound selector
    pub fn get<Args: 'static, R: 'static>(&self, name: &str) -> Result<BoundSelector<S, Args, R>> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| Error::NotCallable { name: name.to_string() })?;

        let select = entry
            .select
            .downcast_ref::<SelectFn<S, Args, R>>()
            .ok_or_else(|| Error::SignatureMismatch {
                name: name.to_string(),
                expected: entry.signature,
            })?;

        Ok(BoundSelector {
            state: Arc::clone(&self.state),
            select: Arc::clone(select),
        })
    }

    /// Run a state-only selector
    pub fn select<R: 'static>(&self, name: &str) -> Result<R> {
        self.select_with(name, ())
    }

    /// Run a selector with extra arguments
    pub fn select_with<Args: 'static, R: 'static>(&self, name: &str, args: Args) -> Result<R> {
        Ok(self.get::<Args, R>(name)?.call(args))
    }
}
