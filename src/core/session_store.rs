//! Thread-safe session storage keyed by conversation
//!
//! This module provides the `SessionStore` struct, which holds one `Session`
//! per `ConversationId` in a `DashMap`. Different conversations never contend
//! on the same entry. Each `update` runs while the entry is locked, and
//! finished sessions are removed only if they are still terminal, so a session
//! started in between is never lost. Ordering of messages within one chat is
//! the transport's job.
//!
//! Sessions idle longer than the configured TTL are treated as gone. They are
//! dropped lazily on access and by a periodic sweep.

use crate::types::{ConversationId, Session};
use dashmap::DashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct SessionEntry {
    session: Session,
    touched: Instant,
}

/// Concurrent store of in-progress sessions
#[derive(Debug)]
pub struct SessionStore {
    sessions: DashMap<ConversationId, SessionEntry>,
    ttl: Duration,
    sweep_interval: Duration,
    last_sweep: Mutex<Instant>,
}

impl SessionEntry {
    fn expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.touched) > ttl
    }
}

impl SessionStore {
    /// Create an empty store that evicts sessions idle for longer than `ttl`
    ///
    /// Full sweeps run at most once per quarter of the TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
            sweep_interval: ttl / 4,
            last_sweep: Mutex::new(Instant::now()),
        }
    }

    /// Insert a session, replacing any session already held for `id`
    ///
    /// # Returns
    ///
    /// The replaced session, if there was one.
    pub fn insert(&self, id: ConversationId, session: Session) -> Option<Session> {
        self.sessions
            .insert(
                id,
                SessionEntry {
                    session,
                    touched: Instant::now(),
                },
            )
            .map(|entry| entry.session)
    }

    /// Snapshot of the session for `id`, `None` once it has expired
    pub fn get(&self, id: ConversationId) -> Option<Session> {
        let now = Instant::now();
        self.sessions
            .get(&id)
            .filter(|entry| !entry.expired(now, self.ttl))
            .map(|entry| entry.session.clone())
    }

    /// Update a session in place using a closure
    ///
    /// The closure runs while the entry is locked and its result is returned.
    /// The session's idle timer is reset.
    ///
    /// # Returns
    ///
    /// `None` if no session exists for `id`, or if it has expired (it is
    /// removed then).
    pub fn update<F, R>(&self, id: ConversationId, f: F) -> Option<R>
    where
        F: FnOnce(&mut Session) -> R,
    {
        let now = Instant::now();
        {
            let mut entry = self.sessions.get_mut(&id)?;
            if !entry.expired(now, self.ttl) {
                entry.touched = now;
                return Some(f(&mut entry.session));
            }
        }

        self.sessions
            .remove_if(&id, |_, entry| entry.expired(now, self.ttl));
        None
    }

    /// Remove and return the session for `id`
    pub fn remove(&self, id: ConversationId) -> Option<Session> {
        self.sessions.remove(&id).map(|(_, entry)| entry.session)
    }

    /// Remove the session for `id` only if it is in a terminal state
    ///
    /// A session that replaced the finished one in the meantime is kept.
    pub fn remove_finished(&self, id: ConversationId) -> Option<Session> {
        self.sessions
            .remove_if(&id, |_, entry| entry.session.state.is_terminal())
            .map(|(_, entry)| entry.session)
    }

    /// Run `evict_expired` if the last sweep is older than a quarter of the TTL
    ///
    /// # Returns
    ///
    /// The number of evicted sessions, 0 when the sweep was skipped.
    pub fn sweep(&self, now: Instant) -> usize {
        {
            let mut last = self
                .last_sweep
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if now.saturating_duration_since(*last) < self.sweep_interval {
                return 0;
            }
            *last = now;
        }
        self.evict_expired(now)
    }

    /// Drop every session idle for longer than the TTL as of `now`
    ///
    /// # Returns
    ///
    /// The number of evicted sessions.
    pub fn evict_expired(&self, now: Instant) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, entry| !entry.expired(now, self.ttl));
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SessionState;
    use std::sync::Arc;
    use std::thread;

    const TTL: Duration = Duration::from_secs(60);

    fn id(user: i64) -> ConversationId {
        ConversationId::new(user, user * 10)
    }

    #[test]
    fn test_insert_and_get() {
        let store = SessionStore::new(TTL);
        assert!(store.is_empty());

        assert_eq!(store.insert(id(1), Session::new(None)), None);
        assert_eq!(store.get(id(1)), Some(Session::new(None)));
        assert_eq!(store.get(id(2)), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_insert_replaces_existing_session() {
        let store = SessionStore::new(TTL);
        store.insert(id(1), Session::new(None));
        store.update(id(1), |session| session.state = SessionState::Engine);

        let replaced = store.insert(id(1), Session::new(None));
        assert_eq!(replaced.map(|s| s.state), Some(SessionState::Engine));
        assert_eq!(store.get(id(1)).map(|s| s.state), Some(SessionState::Price));
    }

    #[test]
    fn test_update_missing_session() {
        let store = SessionStore::new(TTL);
        assert_eq!(store.update(id(1), |session| session.state), None);
    }

    #[test]
    fn test_remove() {
        let store = SessionStore::new(TTL);
        store.insert(id(1), Session::new(None));

        assert!(store.remove(id(1)).is_some());
        assert!(store.remove(id(1)).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_evict_expired() {
        let store = SessionStore::new(TTL);
        store.insert(id(1), Session::new(None));
        store.insert(id(2), Session::new(None));

        assert_eq!(store.evict_expired(Instant::now()), 0);
        assert_eq!(store.evict_expired(Instant::now() + TTL * 2), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn test_sweep_is_throttled() {
        let store = SessionStore::new(TTL);
        let start = Instant::now();
        store.insert(id(1), Session::new(None));

        assert_eq!(store.sweep(start), 0);
        assert_eq!(store.sweep(start + TTL * 2), 1);

        store.insert(id(2), Session::new(None));
        assert_eq!(store.sweep(start + TTL * 2 + TTL / 8), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_expired_session_is_gone_before_sweep() {
        let store = SessionStore::new(Duration::from_millis(1));
        store.insert(id(1), Session::new(None));
        thread::sleep(Duration::from_millis(20));

        assert_eq!(store.get(id(1)), None);
        assert_eq!(store.update(id(1), |session| session.state), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_finished_keeps_active_session() {
        let store = SessionStore::new(TTL);
        store.insert(id(1), Session::new(None));
        store.update(id(1), |session| session.state = SessionState::Done);

        // A restart replaced the finished session before it was removed
        store.insert(id(1), Session::new(None));
        assert_eq!(store.remove_finished(id(1)), None);
        assert_eq!(store.get(id(1)).map(|s| s.state), Some(SessionState::Price));

        store.update(id(1), |session| session.state = SessionState::Cancelled);
        assert_eq!(
            store.remove_finished(id(1)).map(|s| s.state),
            Some(SessionState::Cancelled)
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_sessions_are_independent_across_threads() {
        let store = Arc::new(SessionStore::new(TTL));
        let handles: Vec<_> = (0..8)
            .map(|user| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    store.insert(id(user), Session::new(None));
                    store.update(id(user), |session| session.engine_cc = Some(1000 + user as u32));
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 8);
        for user in 0..8 {
            assert_eq!(
                store.get(id(user)).and_then(|s| s.engine_cc),
                Some(1000 + user as u32)
            );
        }
    }
}
