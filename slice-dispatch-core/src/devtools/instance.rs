//! Instance id allocation

use std::sync::atomic::{AtomicU32, Ordering};

/// First id handed out by the global registry; lower ids are left to
/// callers that pick their own.
pub const DEFAULT_FIRST_INSTANCE_ID: u32 = 5000;

static GLOBAL: InstanceRegistry = InstanceRegistry::starting_at(DEFAULT_FIRST_INSTANCE_ID);

/// Monotonic source of devtools instance ids
#[derive(Debug)]
pub struct InstanceRegistry {
    next: AtomicU32,
}

impl Default for InstanceRegistry {
    fn default() -> Self {
        Self::starting_at(DEFAULT_FIRST_INSTANCE_ID)
    }
}

impl InstanceRegistry {
    /// A registry whose first id is `first`
    pub const fn starting_at(first: u32) -> Self {
        Self {
            next: AtomicU32::new(first),
        }
    }

    /// The process-wide registry
    pub fn global() -> &'static InstanceRegistry {
        &GLOBAL
    }

    /// Next id, advancing the counter
    pub fn next_id(&self) -> u32 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// `requested` if given, else the next id.
    ///
    /// A requested id does not advance the counter.
    pub fn assign(&self, requested: Option<u32>) -> u32 {
        requested.unwrap_or_else(|| self.next_id())
    }

    /// Restart the counter at `first`
    pub fn reset(&self, first: u32) {
        self.next.store(first, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_increase() {
        let registry = InstanceRegistry::starting_at(10);
        assert_eq!(registry.next_id(), 10);
        assert_eq!(registry.next_id(), 11);
        assert_eq!(registry.assign(None), 12);
    }

    #[test]
    fn test_requested_id_does_not_advance() {
        let registry = InstanceRegistry::default();
        assert_eq!(registry.assign(Some(7)), 7);
        assert_eq!(registry.assign(None), DEFAULT_FIRST_INSTANCE_ID);
    }

    #[test]
    fn test_reset() {
        let registry = InstanceRegistry::starting_at(1);
        registry.next_id();
        registry.reset(100);
        assert_eq!(registry.next_id(), 100);
    }
}
