//! Per-entity in-flight request tracking.
//!
//! At most one request per (action, entity id) may be outstanding. Requests
//! for different entities, or different actions on the same entity, proceed
//! independently.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{LecternError, Result};

type Key = (&'static str, u64);

/// Set of outstanding actions, shared by clones.
#[derive(Debug, Clone, Default)]
pub struct PendingActions {
    inner: Arc<Mutex<HashSet<Key>>>,
}

impl PendingActions {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `action` on `id` as in flight.
    ///
    /// The returned guard clears the mark when dropped, whether the request
    /// succeeded or not.
    ///
    /// # Errors
    ///
    /// Returns `LecternError::ActionInFlight` if the same action on the same
    /// entity is already outstanding.
    pub fn begin(&self, action: &'static str, id: u64) -> Result<PendingGuard> {
        let mut set = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if !set.insert((action, id)) {
            return Err(LecternError::action_in_flight(format!("{action} {id}")));
        }
        Ok(PendingGuard {
            inner: Arc::clone(&self.inner),
            key: (action, id),
        })
    }

    /// Returns `true` if `action` on `id` is outstanding.
    #[must_use]
    pub fn is_pending(&self, action: &'static str, id: u64) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(action, id))
    }
}

/// Clears its pending mark on drop.
#[derive(Debug)]
pub struct PendingGuard {
    inner: Arc<Mutex<HashSet<Key>>>,
    key: Key,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tokio_test::{assert_err, assert_ok};

    use super::*;

    #[test]
    fn test_second_begin_is_rejected() {
        let pending = PendingActions::new();
        let _guard = pending.begin("enroll", 1).unwrap();

        assert!(pending.is_pending("enroll", 1));
        assert!(matches!(
            pending.begin("enroll", 1),
            Err(LecternError::ActionInFlight { .. })
        ));
    }

    #[test]
    fn test_entities_and_actions_are_independent() {
        let pending = PendingActions::new();
        let _a = assert_ok!(pending.begin("enroll", 1));
        let _b = assert_ok!(pending.begin("enroll", 2));
        let _c = assert_ok!(pending.begin("unenroll", 1));
        assert_err!(pending.begin("unenroll", 1));
    }

    #[test]
    fn test_guard_drop_releases() {
        let pending = PendingActions::new();
        {
            let _guard = pending.begin("complete", 5).unwrap();
        }
        assert!(!pending.is_pending("complete", 5));
        assert_ok!(pending.begin("complete", 5));
    }
}
