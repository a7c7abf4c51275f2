use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Tier-2 durable KV row, backing the `api_cache` table from the
/// checkpoint persistence schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DurableRow {
    pub response_json: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[async_trait]
pub trait DurableCache: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<DurableRow>>;
    async fn put(&self, key: &str, row: DurableRow) -> anyhow::Result<()>;
}

/// JSON-file-backed Tier-2 cache: one document holding the whole table,
/// read on construction and written through on every put — a file per
/// logical table rather than an embedded SQL engine.
pub struct FileDurableCache {
    path: PathBuf,
    rows: Arc<RwLock<HashMap<String, DurableRow>>>,
}

impl FileDurableCache {
    pub async fn new(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let rows = if let Ok(contents) = tokio::fs::read_to_string(&path).await {
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            HashMap::new()
        };
        Ok(Self {
            path,
            rows: Arc::new(RwLock::new(rows)),
        })
    }

    async fn flush(&self, rows: &HashMap<String, DurableRow>) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let serialized = serde_json::to_string_pretty(rows)?;
        tokio::fs::write(&self.path, serialized).await?;
        Ok(())
    }
}

#[async_trait]
impl DurableCache for FileDurableCache {
    async fn get(&self, key: &str) -> anyhow::Result<Option<DurableRow>> {
        let rows = self.rows.read().await;
        Ok(rows.get(key).cloned())
    }

    async fn put(&self, key: &str, row: DurableRow) -> anyhow::Result<()> {
        let mut rows = self.rows.write().await;
        rows.insert(key.to_string(), row);
        self.flush(&rows).await
    }
}

/// Process-local Tier-2 cache with no backing file, for tests that want
/// the real two-tier `CacheClient::get`/`post` flow without touching
/// disk.
#[derive(Default)]
pub struct InMemoryDurableCache {
    rows: RwLock<HashMap<String, DurableRow>>,
}

impl InMemoryDurableCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DurableCache for InMemoryDurableCache {
    async fn get(&self, key: &str) -> anyhow::Result<Option<DurableRow>> {
        Ok(self.rows.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, row: DurableRow) -> anyhow::Result<()> {
        self.rows.write().await.insert(key.to_string(), row);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_through_disk() {
        let dir = tempfile_dir();
        let path = dir.join("api_cache.json");
        let cache = FileDurableCache::new(&path).await.unwrap();
        let row = DurableRow {
            response_json: serde_json::json!({"ok": true}),
            created_at: Utc::now(),
            expires_at: Utc::now() + chrono::Duration::hours(1),
        };
        cache.put("k1", row.clone()).await.unwrap();

        let reloaded = FileDurableCache::new(&path).await.unwrap();
        let got = reloaded.get("k1").await.unwrap().unwrap();
        assert_eq!(got.response_json, row.response_json);
    }

    fn tempfile_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("wayfare-cache-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
