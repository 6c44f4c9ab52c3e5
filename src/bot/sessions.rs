//! Live leaderboard sessions.
//!
//! A session's buttons are answered by the collector of the command that
//! created it. The global component handler consults this set to tell a live
//! session (leave it to the collector) from a stale one (reply that it expired).

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// Ids of sessions whose collector is still waiting.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    active: Mutex<HashSet<String>>,
}

impl SessionRegistry {
    /// Marks `session` live until the returned guard is dropped.
    #[must_use]
    pub fn open(self: &Arc<Self>, session: String) -> SessionGuard {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session.clone());
        SessionGuard {
            registry: Arc::clone(self),
            session,
        }
    }

    /// Whether `session` is live.
    #[must_use]
    pub fn is_active(&self, session: &str) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(session)
    }
}

/// Removes its session from the registry on drop.
#[derive(Debug)]
pub struct SessionGuard {
    registry: Arc<SessionRegistry>,
    session: String,
}

impl SessionGuard {
    /// The session id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.session
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.registry
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_closes_session() {
        let registry = Arc::new(SessionRegistry::default());
        let guard = registry.open("42".to_string());
        assert_eq!(guard.id(), "42");
        assert!(registry.is_active("42"));
        assert!(!registry.is_active("43"));
        drop(guard);
        assert!(!registry.is_active("42"));
    }
}
