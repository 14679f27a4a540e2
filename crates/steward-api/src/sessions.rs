//! Bounded in-process chat session store.
//!
//! Sessions are evicted least-recently-used once capacity is reached. An
//! evicted session takes its pending proposal with it; nothing is written.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;
use tokio::sync::Mutex as AsyncMutex;

use steward_core::ChatSession;

pub type SharedSession = Arc<AsyncMutex<ChatSession>>;

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<LruCache<String, SharedSession>>>,
}

impl SessionStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            sessions: Arc::new(Mutex::new(LruCache::new(capacity))),
        }
    }

    /// Fetch the session for `key`, creating an empty one if needed.
    pub fn get_or_create(&self, key: &str) -> SharedSession {
        let mut sessions = match self.sessions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(session) = sessions.get(key) {
            return session.clone();
        }
        let session: SharedSession = Arc::new(AsyncMutex::new(ChatSession::new()));
        if let Some((evicted, _)) = sessions.push(key.to_string(), session.clone()) {
            if evicted != key {
                tracing::debug!(subsystem = "api", component = "sessions", "Evicted idle chat session");
            }
        }
        session
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
