//! In-process adapter state.
//!
//! One [`AdapterState`] belongs to one backend instance. Each logical
//! collection sits behind its own lock, and every registration is a single
//! write-lock critical section. Records are immutable once stored.

use std::fmt;

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use qrelay_hal::{BatchId, JobId};

/// Current credential.
#[derive(Clone, Default)]
pub struct AuthState {
    /// Bearer token.
    pub token: Option<String>,
    /// When the token was last set through `authenticate()`.
    pub authenticated_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthState")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("authenticated_at", &self.authenticated_at)
            .finish()
    }
}

/// Provider metadata for one submitted job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    /// Provider job id; `None` when the create response carried none.
    pub provider_id: Option<String>,
    /// Target device.
    pub backend: String,
    /// Submission time.
    pub submitted_at: DateTime<Utc>,
    /// Shots requested.
    pub shots: u32,
    /// Request body as sent.
    pub payload: Value,
}

/// Ordered job handles of one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRecord {
    /// Handles in submission order.
    pub job_ids: Vec<JobId>,
    /// Submission time.
    pub submitted_at: DateTime<Utc>,
}

/// A provider session opened by this instance.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    /// Target device.
    pub backend: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Requested maximum lifetime in seconds.
    pub max_ttl: u64,
}

/// Shared mutable state of an adapter instance.
#[derive(Debug, Default)]
pub struct AdapterState {
    auth: RwLock<AuthState>,
    jobs: RwLock<FxHashMap<JobId, JobRecord>>,
    batches: RwLock<FxHashMap<BatchId, BatchRecord>>,
    sessions: RwLock<FxHashMap<String, SessionRecord>>,
}

impl AdapterState {
    /// Empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// State seeded with a credential.
    pub fn with_token(token: Option<String>) -> Self {
        Self {
            auth: RwLock::new(AuthState {
                token: token.filter(|t| !t.trim().is_empty()),
                authenticated_at: None,
            }),
            ..Self::default()
        }
    }

    // ---- auth ----

    /// Current bearer token.
    pub async fn token(&self) -> Option<String> {
        self.auth.read().await.token.clone()
    }

    /// Snapshot of the auth state.
    pub async fn auth(&self) -> AuthState {
        self.auth.read().await.clone()
    }

    /// Replace the credential.
    pub async fn set_token(&self, token: impl Into<String>) {
        let mut auth = self.auth.write().await;
        auth.token = Some(token.into());
        auth.authenticated_at = Some(Utc::now());
    }

    // ---- jobs ----

    /// Store `record` under a fresh handle and return the handle.
    pub async fn register_job(&self, record: JobRecord) -> JobId {
        let mut jobs = self.jobs.write().await;
        let id = loop {
            let candidate = JobId::new(Uuid::new_v4().to_string());
            if !jobs.contains_key(&candidate) {
                break candidate;
            }
        };
        jobs.insert(id.clone(), record);
        id
    }

    /// Record stored under `id`.
    pub async fn job(&self, id: &JobId) -> Option<JobRecord> {
        self.jobs.read().await.get(id).cloned()
    }

    /// Number of registered jobs.
    pub async fn job_count(&self) -> usize {
        self.jobs.read().await.len()
    }

    // ---- batches ----

    /// Store a batch under a fresh handle and return the handle.
    pub async fn register_batch(&self, job_ids: Vec<JobId>) -> BatchId {
        let mut batches = self.batches.write().await;
        let id = loop {
            let candidate = BatchId::new(format!("batch-{}", Uuid::new_v4()));
            if !batches.contains_key(&candidate) {
                break candidate;
            }
        };
        batches.insert(
            id.clone(),
            BatchRecord {
                job_ids,
                submitted_at: Utc::now(),
            },
        );
        id
    }

    /// Record stored under `id`.
    pub async fn batch(&self, id: &BatchId) -> Option<BatchRecord> {
        self.batches.read().await.get(id).cloned()
    }

    // ---- sessions ----

    /// Store a session under its provider id.
    pub async fn insert_session(&self, id: impl Into<String>, record: SessionRecord) {
        self.sessions.write().await.insert(id.into(), record);
    }

    /// Session stored under `id`.
    pub async fn session(&self, id: &str) -> Option<SessionRecord> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Remove and return the session stored under `id`.
    pub async fn remove_session(&self, id: &str) -> Option<SessionRecord> {
        self.sessions.write().await.remove(id)
    }

    /// Ids of all open sessions.
    pub async fn session_ids(&self) -> Vec<String> {
        self.sessions.read().await.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn record(provider_id: Option<&str>) -> JobRecord {
        JobRecord {
            provider_id: provider_id.map(str::to_string),
            backend: "ibm_torino".into(),
            submitted_at: Utc::now(),
            shots: 100,
            payload: Value::Null,
        }
    }

    #[tokio::test]
    async fn test_register_and_lookup_job() {
        let state = AdapterState::new();
        let id = state.register_job(record(Some("p-1"))).await;
        let stored = state.job(&id).await.unwrap();
        assert_eq!(stored.provider_id.as_deref(), Some("p-1"));
        assert!(state.job(&JobId::new("nope")).await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_registrations_are_unique() {
        let state = Arc::new(AdapterState::new());
        let mut handles = Vec::new();
        for _ in 0..64 {
            let state = state.clone();
            handles.push(tokio::spawn(async move {
                state.register_job(record(None)).await
            }));
        }
        let mut ids = Vec::new();
        for h in handles {
            ids.push(h.await.unwrap());
        }
        ids.sort_by(|a, b| a.0.cmp(&b.0));
        ids.dedup();
        assert_eq!(ids.len(), 64);
        assert_eq!(state.job_count().await, 64);
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        let state = AdapterState::new();
        let jobs = vec![JobId::new("a"), JobId::new("b"), JobId::new("c")];
        let batch = state.register_batch(jobs.clone()).await;
        assert_eq!(state.batch(&batch).await.unwrap().job_ids, jobs);
    }

    #[tokio::test]
    async fn test_session_insert_remove() {
        let state = AdapterState::new();
        let rec = SessionRecord {
            backend: "ibm_fez".into(),
            created_at: Utc::now(),
            max_ttl: 3600,
        };
        state.insert_session("s-1", rec.clone()).await;
        assert_eq!(state.session("s-1").await, Some(rec.clone()));
        assert_eq!(state.remove_session("s-1").await, Some(rec));
        assert!(state.remove_session("s-1").await.is_none());
    }

    #[tokio::test]
    async fn test_token_handling() {
        let state = AdapterState::with_token(Some("  ".into()));
        assert!(state.token().await.is_none());

        state.set_token("tok").await;
        let auth = state.auth().await;
        assert_eq!(auth.token.as_deref(), Some("tok"));
        assert!(auth.authenticated_at.is_some());
        assert!(!format!("{auth:?}").contains("tok\""));
    }
}
