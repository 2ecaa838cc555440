use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::{context::ConversationContext, error::Result};

/// State owned by one user session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub files_processed: usize,
    pub context: ConversationContext,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            files_processed: 0,
            context: ConversationContext::new(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Trait for storing and retrieving sessions
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn save(&self, session: Session) -> Result<()>;
    async fn get(&self, id: &str) -> Result<Option<Session>>;
    async fn delete(&self, id: &str) -> Result<bool>;
}

/// In-memory implementation of SessionStorage; sessions end with the process
pub struct InMemorySessionStorage {
    sessions: Arc<DashMap<String, Session>>,
}

impl InMemorySessionStorage {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemorySessionStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStorage for InMemorySessionStorage {
    async fn save(&self, session: Session) -> Result<()> {
        self.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Session>> {
        Ok(self.sessions.get(id).map(|entry| entry.clone()))
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.sessions.remove(id).is_some())
    }
}

/// Per-session async locks.
///
/// A request that loads, modifies and saves a session holds its guard for the
/// whole cycle, so concurrent writers of one session run one after another.
#[derive(Clone, Default)]
pub struct SessionLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, id: &str) {
        self.locks.insert(id.to_string(), Arc::new(Mutex::new(())));
    }

    /// Wait for exclusive access to a session.
    /// `None` for sessions never registered or already removed.
    pub async fn acquire(&self, id: &str) -> Option<OwnedMutexGuard<()>> {
        let lock = self.locks.get(id).map(|entry| entry.value().clone())?;
        Some(lock.lock_owned().await)
    }

    pub fn remove(&self, id: &str) {
        self.locks.remove(id);
    }
}
