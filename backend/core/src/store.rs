//! In-memory session store.
//!
//! Owns every live `Session`. A single coarse lock guards the map; each
//! inbound event holds it only for the length of one state transition.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::session::{ConversationId, Session};

/// Conversation id → session map with an optional idle expiry policy.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<ConversationId, Session>>,
    idle_ttl: Option<Duration>,
}

impl SessionStore {
    /// A store that keeps sessions until they complete or are restarted.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose `reap_idle` drops sessions idle for longer than `ttl`.
    pub fn with_idle_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_ttl: Some(ttl),
        }
    }

    pub fn idle_ttl(&self) -> Option<Duration> {
        self.idle_ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ConversationId, Session>> {
        // A panic inside a transition leaves the map itself intact.
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with exclusive access to the slot for `id`.
    ///
    /// The slot is `None` when no session exists. Whatever `f` leaves in the
    /// slot is written back: `Some` stores the session, `None` removes it.
    pub fn with_session<R>(
        &self,
        id: &ConversationId,
        f: impl FnOnce(&mut Option<Session>) -> R,
    ) -> R {
        let mut sessions = self.lock();
        let mut slot = sessions.remove(id);
        let result = f(&mut slot);
        if let Some(session) = slot {
            sessions.insert(id.clone(), session);
        }
        result
    }

    /// Clone of the current session, if any.
    pub fn get(&self, id: &ConversationId) -> Option<Session> {
        self.lock().get(id).cloned()
    }

    pub fn contains(&self, id: &ConversationId) -> bool {
        self.lock().contains_key(id)
    }

    pub fn insert(&self, session: Session) {
        self.lock().insert(session.conversation_id.clone(), session);
    }

    pub fn remove(&self, id: &ConversationId) -> Option<Session> {
        self.lock().remove(id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every session idle for at least the configured TTL as of `now`.
    ///
    /// Returns the ids that were removed. A store without a TTL never reaps.
    pub fn reap_idle(&self, now: DateTime<Utc>) -> Vec<ConversationId> {
        let Some(ttl) = self.idle_ttl else {
            return Vec::new();
        };
        let mut sessions = self.lock();
        let expired: Vec<ConversationId> = sessions
            .values()
            .filter(|s| {
                (now - s.last_activity)
                    .to_std()
                    .map(|idle| idle >= ttl)
                    .unwrap_or(false)
            })
            .map(|s| s.conversation_id.clone())
            .collect();
        for id in &expired {
            sessions.remove(id);
            debug!(conversation = %id, "Reaped idle session");
        }
        if !expired.is_empty() {
            info!(reaped = expired.len(), remaining = sessions.len(), "Idle sessions reaped");
        }
        expired
    }
}
