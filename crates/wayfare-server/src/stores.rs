//! The remaining checkpoint-persistence tables that aren't already
//! covered by `wayfare-runtime::FileCheckpointStore` (the `trip_sessions`
//! row's `state_json`/`status` snapshot, kept separately here since the
//! checkpoint store is keyed by `run_id` and gets deleted on completion,
//! while a session outlives any one run) or by
//! `wayfare-cache::FileDurableCache` (`api_cache`). Each table is one
//! JSON document, read on construction and flushed on every write, the
//! same convention `wayfare_cache::durable::FileDurableCache` uses.
//!
//! `shared_trips` has no dedicated trait: sharing a trip is "hand out a
//! read-only slug for a session's current snapshot", so it is modeled as
//! two extra `SessionStore` methods rather than a sixth trait — the slug
//! and the shared snapshot both live beside the session they were cut
//! from.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use wayfare_types::{AgentDecision, PlannerState};

async fn load_map<V: for<'de> Deserialize<'de> + Default>(path: &Path) -> V {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) => serde_json::from_str(&raw).unwrap_or_default(),
        Err(_) => V::default(),
    }
}

async fn flush_map<V: Serialize>(path: &Path, value: &V) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let serialized = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, serialized).await?;
    Ok(())
}

/// A `trip_sessions` row: the session's latest run linkage plus a full
/// state snapshot, so `resume`/`what-if` (both keyed by `session_id`,
/// per spec.md §6) can find the right run and the checkpoint-deleted
/// final state without replaying anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub user_id: String,
    pub run_id: String,
    pub status: String,
    pub current_stage: String,
    pub state: Option<PlannerState>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// `shared_trips.trip_id` equivalent: set once a session has been
    /// shared, so repeated share calls return the same slug.
    pub shared_slug: Option<String>,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn upsert(&self, record: SessionRecord) -> anyhow::Result<()>;
    async fn get(&self, session_id: &str) -> anyhow::Result<Option<SessionRecord>>;
    /// Mints (or returns the existing) share slug for a session and
    /// snapshots its current state under that slug, satisfying
    /// `shared_trips(trip_id, state_json, created_at, expires_at)`.
    async fn share(&self, session_id: &str) -> anyhow::Result<Option<String>>;
    async fn get_shared(&self, slug: &str) -> anyhow::Result<Option<PlannerState>>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SharedTrip {
    state: PlannerState,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

#[derive(Default, Serialize, Deserialize)]
struct SessionTables {
    #[serde(default)]
    sessions: HashMap<String, SessionRecord>,
    #[serde(default)]
    shared: HashMap<String, SharedTrip>,
}

pub struct FileSessionStore {
    path: PathBuf,
    tables: Arc<RwLock<SessionTables>>,
}

impl FileSessionStore {
    pub async fn new(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let tables: SessionTables = load_map(&path).await;
        Ok(Self { path, tables: Arc::new(RwLock::new(tables)) })
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn upsert(&self, record: SessionRecord) -> anyhow::Result<()> {
        let mut tables = self.tables.write().await;
        let session_id = record.session_id.clone();
        let previous = tables.sessions.insert(session_id.clone(), record);
        if let Err(err) = flush_map(&self.path, &*tables).await {
            match previous {
                Some(prev) => tables.sessions.insert(session_id, prev),
                None => tables.sessions.remove(&session_id),
            };
            return Err(err);
        }
        Ok(())
    }

    async fn get(&self, session_id: &str) -> anyhow::Result<Option<SessionRecord>> {
        Ok(self.tables.read().await.sessions.get(session_id).cloned())
    }

    async fn share(&self, session_id: &str) -> anyhow::Result<Option<String>> {
        let mut tables = self.tables.write().await;
        let Some(record) = tables.sessions.get(session_id).cloned() else {
            return Ok(None);
        };
        let Some(state) = record.state.clone() else {
            return Ok(None);
        };
        let slug = record.shared_slug.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
        let now = Utc::now();
        tables.shared.insert(
            slug.clone(),
            SharedTrip { state, created_at: now, expires_at: now + chrono::Duration::days(30) },
        );
        if let Some(entry) = tables.sessions.get_mut(session_id) {
            entry.shared_slug = Some(slug.clone());
        }
        flush_map(&self.path, &*tables).await?;
        Ok(Some(slug))
    }

    async fn get_shared(&self, slug: &str) -> anyhow::Result<Option<PlannerState>> {
        let tables = self.tables.read().await;
        let Some(trip) = tables.shared.get(slug) else { return Ok(None) };
        if trip.expires_at < Utc::now() {
            return Ok(None);
        }
        Ok(Some(trip.state.clone()))
    }
}

/// A `users` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: String,
    pub session_id: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Records activity for `user_id`, creating the row on first sight.
    async fn touch(&self, user_id: &str, session_id: &str) -> anyhow::Result<UserRecord>;
}

pub struct FileUserStore {
    path: PathBuf,
    rows: Arc<RwLock<HashMap<String, UserRecord>>>,
}

impl FileUserStore {
    pub async fn new(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let rows: HashMap<String, UserRecord> = load_map(&path).await;
        Ok(Self { path, rows: Arc::new(RwLock::new(rows)) })
    }
}

#[async_trait]
impl UserStore for FileUserStore {
    async fn touch(&self, user_id: &str, session_id: &str) -> anyhow::Result<UserRecord> {
        let mut rows = self.rows.write().await;
        let now = Utc::now();
        let record = rows
            .entry(user_id.to_string())
            .and_modify(|r| {
                r.session_id = session_id.to_string();
                r.last_active_at = now;
            })
            .or_insert_with(|| UserRecord {
                user_id: user_id.to_string(),
                session_id: session_id.to_string(),
                display_name: None,
                created_at: now,
                last_active_at: now,
            })
            .clone();
        flush_map(&self.path, &*rows).await?;
        Ok(record)
    }
}

/// An `agent_decisions` row, appended once per decision and grouped by
/// `session_id` for retrieval.
#[async_trait]
pub trait DecisionLog: Send + Sync {
    async fn append(&self, session_id: &str, decisions: &[AgentDecision]) -> anyhow::Result<()>;
    async fn history(&self, session_id: &str) -> anyhow::Result<Vec<AgentDecision>>;
}

pub struct FileDecisionLog {
    path: PathBuf,
    rows: Arc<RwLock<HashMap<String, Vec<AgentDecision>>>>,
}

impl FileDecisionLog {
    pub async fn new(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let rows: HashMap<String, Vec<AgentDecision>> = load_map(&path).await;
        Ok(Self { path, rows: Arc::new(RwLock::new(rows)) })
    }
}

#[async_trait]
impl DecisionLog for FileDecisionLog {
    async fn append(&self, session_id: &str, decisions: &[AgentDecision]) -> anyhow::Result<()> {
        if decisions.is_empty() {
            return Ok(());
        }
        let mut rows = self.rows.write().await;
        rows.entry(session_id.to_string()).or_default().extend(decisions.iter().cloned());
        flush_map(&self.path, &*rows).await
    }

    async fn history(&self, session_id: &str) -> anyhow::Result<Vec<AgentDecision>> {
        Ok(self.rows.read().await.get(session_id).cloned().unwrap_or_default())
    }
}

/// A `conversation_history` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: String,
    pub content: String,
    pub compressed_summary: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self { role: role.into(), content: content.into(), compressed_summary: None, created_at: Utc::now() }
    }
}

#[async_trait]
pub trait ConversationLog: Send + Sync {
    async fn append(&self, session_id: &str, turn: ConversationTurn) -> anyhow::Result<()>;
    async fn history(&self, session_id: &str) -> anyhow::Result<Vec<ConversationTurn>>;
}

pub struct FileConversationLog {
    path: PathBuf,
    rows: Arc<RwLock<HashMap<String, Vec<ConversationTurn>>>>,
}

impl FileConversationLog {
    pub async fn new(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let rows: HashMap<String, Vec<ConversationTurn>> = load_map(&path).await;
        Ok(Self { path, rows: Arc::new(RwLock::new(rows)) })
    }
}

#[async_trait]
impl ConversationLog for FileConversationLog {
    async fn append(&self, session_id: &str, turn: ConversationTurn) -> anyhow::Result<()> {
        let mut rows = self.rows.write().await;
        rows.entry(session_id.to_string()).or_default().push(turn);
        flush_map(&self.path, &*rows).await
    }

    async fn history(&self, session_id: &str) -> anyhow::Result<Vec<ConversationTurn>> {
        Ok(self.rows.read().await.get(session_id).cloned().unwrap_or_default())
    }
}
