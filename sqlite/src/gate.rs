//! Single-writer guard for generation operations.
//!
//! Generation rewrites source artifacts, and tools that watch the output
//! directory (a dev server reloading on change) need to know when a batch of
//! writes is in flight. [`GenerationGate`] is a shared flag that is set for
//! the duration of an operation and cleared when the returned
//! [`GateGuard`] is dropped, on every exit path including errors.
//!
//! ```
//! use entity_schema_sqlite::GenerationGate;
//!
//! let gate = GenerationGate::new();
//! let watcher = gate.clone();
//! {
//!     let _guard = gate.acquire().unwrap();
//!     assert!(watcher.is_active());
//!     assert!(gate.acquire().is_err());
//! }
//! assert!(!watcher.is_active());
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{GeneratorError, Result};

/// Shared in-progress flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct GenerationGate {
    active: Arc<AtomicBool>,
}

impl GenerationGate {
    /// Creates an inactive gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks an operation as in progress.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::Busy`] if the gate is already held.
    pub fn acquire(&self) -> Result<GateGuard> {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| GeneratorError::Busy)?;
        Ok(GateGuard {
            active: Arc::clone(&self.active),
        })
    }

    /// Returns `true` while an operation holds the gate.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// Releases the gate when dropped.
#[derive(Debug)]
pub struct GateGuard {
    active: Arc<AtomicBool>,
}

impl Drop for GateGuard {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_busy() {
        let gate = GenerationGate::new();
        let guard = gate.acquire().unwrap();
        assert!(matches!(gate.acquire(), Err(GeneratorError::Busy)));
        drop(guard);
        assert!(gate.acquire().is_ok());
    }

    #[test]
    fn test_released_on_error_path() {
        fn failing(gate: &GenerationGate) -> Result<()> {
            let _guard = gate.acquire()?;
            Err(GeneratorError::NotFound("Employee".to_string()))
        }

        let gate = GenerationGate::new();
        assert!(failing(&gate).is_err());
        assert!(!gate.is_active());
    }
}
