//! Per-session advance locks.
//!
//! One process-wide map from session to an async mutex. Acquisition never
//! waits: a second caller for the same session is turned away immediately.
//! Entries are removed once the last holder lets go, so the map only holds
//! sessions that are being advanced right now.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::foundation::SessionId;
use crate::domain::session::BracketError;

type LockMap = HashMap<SessionId, Arc<AsyncMutex<()>>>;

/// Registry of session-scoped locks.
#[derive(Clone, Default)]
pub struct SessionLocks {
    locks: Arc<Mutex<LockMap>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the lock for `session_id` without waiting.
    ///
    /// # Errors
    ///
    /// - `ConflictBusy` if the session is already locked
    pub fn try_acquire(&self, session_id: SessionId) -> Result<SessionLockGuard, BracketError> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        let lock = locks
            .entry(session_id)
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone();

        match lock.try_lock_owned() {
            Ok(guard) => Ok(SessionLockGuard {
                session_id,
                locks: self.locks.clone(),
                guard: Some(guard),
            }),
            Err(_) => {
                tracing::debug!(session_id = %session_id, "Session is busy");
                Err(BracketError::busy(session_id))
            }
        }
    }

    /// Number of sessions with a live lock entry.
    pub fn held_count(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Holds a session lock; released on drop.
pub struct SessionLockGuard {
    session_id: SessionId,
    locks: Arc<Mutex<LockMap>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl SessionLockGuard {
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }
}

impl Drop for SessionLockGuard {
    fn drop(&mut self) {
        drop(self.guard.take());

        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(lock) = locks.get(&self.session_id) {
            // Only the map's own handle is left.
            if Arc::strong_count(lock) == 1 {
                locks.remove(&self.session_id);
            }
        }
    }
}
