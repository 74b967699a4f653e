//! Session store
//!
//! Process-wide map from upstream session id to its bearer token.
//! Constructed once by the composition root and injected into the
//! gateway and the sweep task; deliberately not a global singleton so
//! tests can build an isolated store per case. Entries are evicted by
//! explicit end-session or by the periodic sweep, nothing else.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tokio::sync::watch;

const SESSION_TTL: Duration = Duration::from_secs(30 * 60);
const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// One active Agentforce conversation
#[derive(Debug, Clone)]
pub struct AgentSession {
    /// Upstream-assigned session id
    pub session_id: String,
    /// Bearer token scoped to this session
    pub access_token: String,
    /// Creation time, used by the expiry sweep
    pub created_at: Instant,
}

impl AgentSession {
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }
}

/// In-memory session store with a timer-driven expiry sweep
pub struct SessionStore {
    sessions: RwLock<HashMap<String, AgentSession>>,
    ttl: Duration,
    sweep_interval: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_config(SESSION_TTL, SWEEP_INTERVAL)
    }

    /// Custom TTL and sweep interval (tests use short values)
    pub fn with_config(ttl: Duration, sweep_interval: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
            sweep_interval,
        }
    }

    pub fn put(&self, session_id: impl Into<String>, access_token: impl Into<String>) {
        let session_id = session_id.into();
        let session = AgentSession {
            session_id: session_id.clone(),
            access_token: access_token.into(),
            created_at: Instant::now(),
        };
        self.sessions.write().insert(session_id, session);
    }

    pub fn get(&self, session_id: &str) -> Option<AgentSession> {
        self.sessions.read().get(session_id).cloned()
    }

    pub fn delete(&self, session_id: &str) {
        self.sessions.write().remove(session_id);
    }

    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Remove entries older than the TTL. Returns how many went.
    pub fn sweep_expired(&self) -> usize {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(self.ttl));
        before - sessions.len()
    }

    /// Spawn the periodic sweep. Returns a shutdown sender.
    pub fn start_sweep_task(self: &Arc<Self>) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let store = Arc::clone(self);
        let interval = store.sweep_interval;

        tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        let removed = store.sweep_expired();
                        if removed > 0 {
                            tracing::info!(
                                removed,
                                remaining = store.count(),
                                "Swept expired agent sessions"
                            );
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("Session sweep task shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }
}

/// Generate an external session key for session creation.
///
/// Millis plus a process-local counter, so keys stay unique even when
/// two sessions start within the same millisecond; never reused
/// within a process lifetime.
pub fn external_session_key() -> String {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let millis = chrono::Utc::now().timestamp_millis();
    format!("session-{}-{}", millis, seq)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_delete() {
        let store = SessionStore::new();
        store.put("sess-1", "tok-1");

        let session = store.get("sess-1").unwrap();
        assert_eq!(session.session_id, "sess-1");
        assert_eq!(session.access_token, "tok-1");

        store.delete("sess-1");
        assert!(store.get("sess-1").is_none());
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_get_unknown_is_none() {
        let store = SessionStore::new();
        assert!(store.get("nope").is_none());
    }

    #[test]
    fn test_sweep_removes_expired() {
        let store = SessionStore::with_config(Duration::ZERO, SWEEP_INTERVAL);
        store.put("sess-1", "tok-1");

        std::thread::sleep(Duration::from_millis(5));
        let removed = store.sweep_expired();
        assert_eq!(removed, 1);
        assert!(store.get("sess-1").is_none());
    }

    #[test]
    fn test_sweep_keeps_fresh() {
        let store = SessionStore::new();
        store.put("sess-1", "tok-1");
        assert_eq!(store.sweep_expired(), 0);
        assert!(store.get("sess-1").is_some());
    }

    #[test]
    fn test_external_session_keys_unique() {
        let a = external_session_key();
        let b = external_session_key();
        assert_ne!(a, b);
        assert!(a.starts_with("session-"));
    }

    #[tokio::test]
    async fn test_sweep_task_evicts() {
        let store = Arc::new(SessionStore::with_config(
            Duration::ZERO,
            Duration::from_millis(10),
        ));
        store.put("sess-1", "tok-1");

        let shutdown = store.start_sweep_task();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(store.get("sess-1").is_none());

        let _ = shutdown.send(true);
    }
}
