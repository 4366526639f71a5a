//! Binding creators to a dispatch handle and selectors to a state snapshot

mod actions;
mod selectors;

pub use actions::{ActionCreators, BoundAction, BoundActions, CreatorKind};
pub use selectors::{BoundSelector, BoundSelectors, Selectors};
