//! SessionStore trait and the process-local in-memory implementation.
//!
//! The trait keeps `ChatService` independent of where history lives, so a
//! persistent or distributed store can replace [`InMemorySessionStore`]
//! without touching orchestration.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;

use bharat_types::chat::{RoleTag, Session, SessionId, Turn};
use bharat_types::error::StoreError;

/// Default maximum number of turns retained per session.
pub const DEFAULT_MAX_HISTORY: usize = 10;

/// Port for session history storage.
///
/// Implementations must make `append_turn` atomic per session: the append and
/// the truncation back to the configured maximum happen as one unit.
pub trait SessionStore: Send + Sync {
    /// Return the existing session, or create one with empty history and the
    /// default role.
    fn get_or_create(
        &self,
        id: &SessionId,
    ) -> impl Future<Output = Result<Session, StoreError>> + Send;

    /// Look up a session without creating it.
    fn get(&self, id: &SessionId)
    -> impl Future<Output = Result<Option<Session>, StoreError>> + Send;

    /// Append a turn, truncating from the front to the configured maximum.
    ///
    /// Returns the history after the append. Creates the session if needed.
    fn append_turn(
        &self,
        id: &SessionId,
        turn: Turn,
    ) -> impl Future<Output = Result<Vec<Turn>, StoreError>> + Send;

    /// Record the traveller role for a session.
    fn set_role(
        &self,
        id: &SessionId,
        role: RoleTag,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Drop a session. Returns whether it existed.
    fn remove(&self, id: &SessionId) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Drop sessions idle for longer than `max_idle`, returning their ids.
    fn expire_idle(
        &self,
        max_idle: Duration,
    ) -> impl Future<Output = Result<Vec<SessionId>, StoreError>> + Send;

    /// Number of live sessions.
    fn count(&self) -> impl Future<Output = Result<usize, StoreError>> + Send;
}

/// Process-lifetime session store backed by a concurrent map.
///
/// Each mutation runs under the shard lock of its entry, so concurrent
/// appends to one session never break the length bound, and operations on
/// different sessions proceed independently.
#[derive(Debug)]
pub struct InMemorySessionStore {
    sessions: DashMap<SessionId, Session>,
    max_history: usize,
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl InMemorySessionStore {
    /// `max_history` is clamped to at least 1.
    pub fn new(max_history: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            max_history: max_history.max(1),
        }
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }
}

impl SessionStore for InMemorySessionStore {
    async fn get_or_create(&self, id: &SessionId) -> Result<Session, StoreError> {
        let entry = self
            .sessions
            .entry(id.clone())
            .or_insert_with(|| Session::new(id.clone()));
        Ok(entry.value().clone())
    }

    async fn get(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.get(id).map(|s| s.value().clone()))
    }

    async fn append_turn(&self, id: &SessionId, turn: Turn) -> Result<Vec<Turn>, StoreError> {
        let mut entry = self
            .sessions
            .entry(id.clone())
            .or_insert_with(|| Session::new(id.clone()));
        entry.push_bounded(turn, self.max_history);
        Ok(entry.history.clone())
    }

    async fn set_role(&self, id: &SessionId, role: RoleTag) -> Result<(), StoreError> {
        let mut entry = self
            .sessions
            .entry(id.clone())
            .or_insert_with(|| Session::new(id.clone()));
        entry.role = role;
        entry.last_active = Utc::now();
        Ok(())
    }

    async fn remove(&self, id: &SessionId) -> Result<bool, StoreError> {
        Ok(self.sessions.remove(id).is_some())
    }

    async fn expire_idle(&self, max_idle: Duration) -> Result<Vec<SessionId>, StoreError> {
        // A timeout reaching past the representable range expires nothing.
        let Some(cutoff) = chrono::Duration::from_std(max_idle)
            .ok()
            .and_then(|max_idle| Utc::now().checked_sub_signed(max_idle))
        else {
            return Ok(Vec::new());
        };

        let mut expired = Vec::new();
        self.sessions.retain(|id, session| {
            let keep = session.last_active >= cutoff;
            if !keep {
                expired.push(id.clone());
            }
            keep
        });
        Ok(expired)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.sessions.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn sid(s: &str) -> SessionId {
        SessionId::new(s)
    }

    #[tokio::test]
    async fn test_get_or_create_starts_empty_with_default_role() {
        let store = InMemorySessionStore::default();
        let session = store.get_or_create(&sid("a")).await.unwrap();
        assert!(session.history.is_empty());
        assert_eq!(session.role, RoleTag::Tourist);
        assert_eq!(store.count().await.unwrap(), 1);

        // Second call returns the same session rather than a new one.
        store.append_turn(&sid("a"), Turn::user("hi")).await.unwrap();
        let again = store.get_or_create(&sid("a")).await.unwrap();
        assert_eq!(again.history.len(), 1);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_append_truncates_to_most_recent() {
        let store = InMemorySessionStore::new(10);
        let mut last = Vec::new();
        for i in 0..15 {
            last = store
                .append_turn(&sid("trip"), Turn::user(format!("turn {i}")))
                .await
                .unwrap();
            assert!(last.len() <= 10);
        }
        assert_eq!(last.len(), 10);
        assert_eq!(last.first().unwrap().content, "turn 5");
        assert_eq!(last.last().unwrap().content, "turn 14");
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let store = InMemorySessionStore::default();
        store.append_turn(&sid("a"), Turn::user("one")).await.unwrap();
        store.append_turn(&sid("b"), Turn::user("two")).await.unwrap();
        store.append_turn(&sid("b"), Turn::assistant("three")).await.unwrap();

        assert_eq!(store.get(&sid("a")).await.unwrap().unwrap().history.len(), 1);
        assert_eq!(store.get(&sid("b")).await.unwrap().unwrap().history.len(), 2);
        assert!(store.get(&sid("c")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_role_and_remove() {
        let store = InMemorySessionStore::default();
        store.set_role(&sid("a"), RoleTag::Backpacker).await.unwrap();
        assert_eq!(
            store.get(&sid("a")).await.unwrap().unwrap().role,
            RoleTag::Backpacker
        );
        assert!(store.remove(&sid("a")).await.unwrap());
        assert!(!store.remove(&sid("a")).await.unwrap());
    }

    #[tokio::test]
    async fn test_expire_idle_drops_only_stale_sessions() {
        let store = InMemorySessionStore::default();
        store.append_turn(&sid("stale"), Turn::user("old")).await.unwrap();
        store.append_turn(&sid("fresh"), Turn::user("new")).await.unwrap();
        store
            .sessions
            .get_mut(&sid("stale"))
            .unwrap()
            .last_active = Utc::now() - chrono::Duration::hours(2);

        let expired = store.expire_idle(Duration::from_secs(3600)).await.unwrap();

        assert_eq!(expired, vec![sid("stale")]);
        assert!(store.get(&sid("stale")).await.unwrap().is_none());
        assert!(store.get(&sid("fresh")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_expire_idle_with_huge_timeout_keeps_everything() {
        let store = InMemorySessionStore::default();
        store.append_turn(&sid("a"), Turn::user("hi")).await.unwrap();

        for secs in [10_000_000_000_000, u64::MAX] {
            let expired = store.expire_idle(Duration::from_secs(secs)).await.unwrap();
            assert!(expired.is_empty());
        }
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_max_history_is_at_least_one() {
        let store = InMemorySessionStore::new(0);
        assert_eq!(store.max_history(), 1);
        let history = store.append_turn(&sid("a"), Turn::user("x")).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_appends_respect_bound() {
        let store = Arc::new(InMemorySessionStore::new(10));
        let mut handles = Vec::new();
        for task in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                for i in 0..25 {
                    let history = store
                        .append_turn(&sid("shared"), Turn::user(format!("{task}-{i}")))
                        .await
                        .unwrap();
                    assert!(history.len() <= 10);
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        let session = store.get(&sid("shared")).await.unwrap().unwrap();
        assert_eq!(session.history.len(), 10);
    }
}
