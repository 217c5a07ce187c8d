//! Session registry: one active game per session key, plus the per-session
//! inactivity timer bookkeeping.

use crate::error::GameError;
use crate::types::{ChatTurn, QuestionRecord, SessionKey};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{Mutex, RwLock};
use tokio::task::AbortHandle;

/// Mutable state of one running game
pub struct GameSession {
    pub record: QuestionRecord,
    pub question_count: u32,
    /// Conversation turns for the reasoning-service adapter. The first
    /// entry, when present, is the system framing for the current record.
    pub context: Vec<ChatTurn>,
}

impl GameSession {
    pub fn new(record: QuestionRecord, framing: Option<ChatTurn>) -> Self {
        Self {
            record,
            question_count: 0,
            context: framing.into_iter().collect(),
        }
    }

    /// Swap in a new puzzle: question count back to zero and the context
    /// replaced wholesale with the new record's framing.
    pub fn replace_record(&mut self, record: QuestionRecord, framing: Option<ChatTurn>) {
        self.record = record;
        self.question_count = 0;
        self.context = framing.into_iter().collect();
    }
}

/// Timer slot with a generation counter. Every reset bumps the generation,
/// so a fired timer task can detect it has been superseded and stand down
/// instead of expiring a session that just showed activity.
struct TimerSlot {
    generation: u64,
    handle: Option<AbortHandle>,
}

/// One registry entry. The `game` mutex is held for the duration of a turn,
/// which serializes concurrent inputs for the same session key.
pub struct SessionHandle {
    pub game: Mutex<GameSession>,
    timer: StdMutex<TimerSlot>,
}

impl SessionHandle {
    fn new(game: GameSession) -> Self {
        Self {
            game: Mutex::new(game),
            timer: StdMutex::new(TimerSlot {
                generation: 0,
                handle: None,
            }),
        }
    }

    /// Start a new timer generation, aborting any previous timer task.
    /// The caller spawns the task and attaches its handle under the
    /// returned generation.
    pub fn begin_timer(&self) -> u64 {
        let mut slot = self.timer.lock().expect("timer slot poisoned");
        if let Some(handle) = slot.handle.take() {
            handle.abort();
        }
        slot.generation += 1;
        slot.generation
    }

    pub fn attach_timer(&self, generation: u64, handle: AbortHandle) {
        let mut slot = self.timer.lock().expect("timer slot poisoned");
        if slot.generation == generation {
            slot.handle = Some(handle);
        } else {
            // A newer reset won the race; this task is already obsolete
            handle.abort();
        }
    }

    /// Called by a fired timer task. True iff this task's generation is
    /// still current, in which case the slot is cleared and the caller owns
    /// the expiry transition.
    pub fn try_expire(&self, generation: u64) -> bool {
        let mut slot = self.timer.lock().expect("timer slot poisoned");
        if slot.generation == generation {
            slot.handle = None;
            true
        } else {
            false
        }
    }

    fn cancel_timer(&self) {
        let mut slot = self.timer.lock().expect("timer slot poisoned");
        slot.generation += 1;
        if let Some(handle) = slot.handle.take() {
            handle.abort();
        }
    }
}

/// Concurrency-safe registry mapping session keys to active games
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionKey, Arc<SessionHandle>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new session. Fails if the key already has one; the check
    /// and insert happen under a single write lock, so exactly one of two
    /// concurrent creates for the same key can succeed.
    pub async fn create(
        &self,
        key: &SessionKey,
        game: GameSession,
    ) -> Result<Arc<SessionHandle>, GameError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(key) {
            return Err(GameError::SessionConflict);
        }
        let handle = Arc::new(SessionHandle::new(game));
        sessions.insert(key.clone(), Arc::clone(&handle));
        Ok(handle)
    }

    pub async fn get(&self, key: &SessionKey) -> Option<Arc<SessionHandle>> {
        self.sessions.read().await.get(key).cloned()
    }

    /// True iff `handle` is still the registered session for `key`. Used to
    /// re-validate after a suspension point: the session may have been
    /// removed, or even removed and replaced, while a service call was in
    /// flight.
    pub async fn still_active(&self, key: &SessionKey, handle: &Arc<SessionHandle>) -> bool {
        self.sessions
            .read()
            .await
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, handle))
    }

    /// Remove a session, cancelling its timer. Idempotent: removing an
    /// absent key is a no-op returning None.
    pub async fn remove(&self, key: &SessionKey) -> Option<Arc<SessionHandle>> {
        let handle = self.sessions.write().await.remove(key)?;
        handle.cancel_timer();
        Some(handle)
    }

    /// Remove a session only if `handle` is still the one registered under
    /// `key`. Terminal transitions (correct guess, exhausted budget, timer
    /// expiry) go through this so a racing removal-and-restart never tears
    /// down the wrong session.
    pub async fn remove_matching(
        &self,
        key: &SessionKey,
        handle: &Arc<SessionHandle>,
    ) -> Option<Arc<SessionHandle>> {
        let mut sessions = self.sessions.write().await;
        let current = sessions.get(key)?;
        if !Arc::ptr_eq(current, handle) {
            return None;
        }
        let removed = sessions.remove(key)?;
        drop(sessions);
        removed.cancel_timer();
        Some(removed)
    }

    /// Snapshot of all active keys. Taken before iterating for mass
    /// termination, so concurrent creations during the sweep are unaffected.
    pub async fn keys(&self) -> Vec<SessionKey> {
        self.sessions.read().await.keys().cloned().collect()
    }

    /// Remove every session, cancelling all timers. Used at shutdown.
    pub async fn drain(&self) -> usize {
        let drained: Vec<_> = self.sessions.write().await.drain().collect();
        for (_, handle) in &drained {
            handle.cancel_timer();
        }
        drained.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::QuestionBank;

    fn sample_session() -> GameSession {
        let record = QuestionBank::builtin().records()[0].clone();
        GameSession::new(record, None)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = SessionStore::new();
        let key = "group-1".to_string();

        assert!(store.get(&key).await.is_none());
        store.create(&key, sample_session()).await.unwrap();

        let handle = store.get(&key).await.expect("session registered");
        assert_eq!(handle.game.lock().await.question_count, 0);
    }

    #[tokio::test]
    async fn test_create_conflict() {
        let store = SessionStore::new();
        let key = "group-1".to_string();

        store.create(&key, sample_session()).await.unwrap();
        let result = store.create(&key, sample_session()).await;
        assert!(matches!(result, Err(GameError::SessionConflict)));
    }

    #[tokio::test]
    async fn test_concurrent_creates_yield_one_session() {
        let store = Arc::new(SessionStore::new());
        let key = "group-1".to_string();

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            let key = key.clone();
            tasks.push(tokio::spawn(async move {
                store.create(&key, sample_session()).await.is_ok()
            }));
        }

        let mut successes = 0;
        for task in tasks {
            if task.await.unwrap() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let store = SessionStore::new();
        let key = "group-1".to_string();

        store.create(&key, sample_session()).await.unwrap();
        assert!(store.remove(&key).await.is_some());
        assert!(store.remove(&key).await.is_none());
        assert!(store.remove(&"never-existed".to_string()).await.is_none());
    }

    #[tokio::test]
    async fn test_still_active_detects_replacement() {
        let store = SessionStore::new();
        let key = "group-1".to_string();

        let first = store.create(&key, sample_session()).await.unwrap();
        assert!(store.still_active(&key, &first).await);

        store.remove(&key).await;
        assert!(!store.still_active(&key, &first).await);

        // A new session under the same key is a different handle
        let second = store.create(&key, sample_session()).await.unwrap();
        assert!(!store.still_active(&key, &first).await);
        assert!(store.still_active(&key, &second).await);
    }

    #[tokio::test]
    async fn test_drain_clears_everything() {
        let store = SessionStore::new();
        for i in 0..3 {
            store
                .create(&format!("key-{i}"), sample_session())
                .await
                .unwrap();
        }
        assert_eq!(store.drain().await, 3);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_timer_generation_supersedes_stale_task() {
        let store = SessionStore::new();
        let key = "group-1".to_string();
        let handle = store.create(&key, sample_session()).await.unwrap();

        let first_generation = handle.begin_timer();
        let second_generation = handle.begin_timer();
        assert!(second_generation > first_generation);

        // The superseded generation must not win the expiry
        assert!(!handle.try_expire(first_generation));
        assert!(handle.try_expire(second_generation));
        // And expiry is claimed at most once
        assert!(!handle.try_expire(second_generation));
    }
}
