// ID Provider Port (for deterministic testing)

use crate::domain::EntityId;
#[cfg(any(test, feature = "test-util"))]
use std::sync::atomic::{AtomicU64, Ordering};

/// ID provider interface (allows deterministic IDs in tests)
pub trait IdProvider: Send + Sync {
    /// Generate a new unique entity ID
    fn generate_id(&self) -> EntityId;
}

/// UUID v4 provider (production)
pub struct UuidProvider;

impl IdProvider for UuidProvider {
    fn generate_id(&self) -> EntityId {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Sequential provider (`<prefix>-1`, `<prefix>-2`, ...).
///
/// Test support only: built with `cfg(test)` or the `test-util` feature.
#[cfg(any(test, feature = "test-util"))]
pub struct SequentialIdProvider {
    prefix: String,
    next: AtomicU64,
}

#[cfg(any(test, feature = "test-util"))]
impl SequentialIdProvider {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

#[cfg(any(test, feature = "test-util"))]
impl IdProvider for SequentialIdProvider {
    fn generate_id(&self) -> EntityId {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        format!("{}-{}", self.prefix, n)
    }
}
