//! slice-dispatch: Redux-style slices bound to locally owned state
//!
//! A slice describes a reducer, its initial state, named action creators and
//! named selectors. Mounting it yields session state owned by one usage,
//! creators that dispatch into that state, and selectors that read it.
//! Every dispatch is relayed to a time-travel devtools monitor when one is
//! installed.
//!
//! # Example
//! ```ignore
//! use slice_dispatch::prelude::*;
//!
//! #[derive(Action, Clone, Debug, Serialize)]
//! #[action(creators)]
//! enum CounterAction {
//!     Increment,
//!     IncrementBy(i64),
//! }
//!
//! let counter = SliceDef::new("counter", || 0i64, |count: &i64, action: &CounterAction| {
//!     Ok(match action {
//!         CounterAction::Increment => count + 1,
//!         CounterAction::IncrementBy(n) => count + n,
//!     })
//! })
//! .with_selectors(Selectors::new().selector("select_count", |count: &i64| *count));
//!
//! let mut hook = SliceHook::mount(Arc::new(counter), UseSliceOptions::default())?;
//! let Rendered { dispatch, .. } = hook.render();
//! dispatch.increment_by(5)?;
//! ```

// Re-export everything from core
pub use slice_dispatch_core::*;

// Re-export derive macros
pub use slice_dispatch_macros::Action;

/// Prelude for convenient imports
pub mod prelude {
    pub use slice_dispatch_core::prelude::*;

    // Derive macros
    pub use slice_dispatch_macros::Action;
}
