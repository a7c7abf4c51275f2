//! Run checkpointing, so a suspended (awaiting-approval) run can be
//! resumed later without replaying research nodes. One JSON document
//! holds every in-flight checkpoint, read on construction and flushed
//! on every write.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;

use wayfare_types::PlannerState;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Checkpoint {
    pub run_id: String,
    pub node: String,
    pub state: PlannerState,
}

#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn save(&self, checkpoint: Checkpoint) -> anyhow::Result<()>;
    async fn load(&self, run_id: &str) -> anyhow::Result<Option<Checkpoint>>;
    async fn delete(&self, run_id: &str) -> anyhow::Result<()>;
}

pub struct FileCheckpointStore {
    path: PathBuf,
    cache: Arc<RwLock<HashMap<String, Checkpoint>>>,
}

impl FileCheckpointStore {
    pub async fn new(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let cache = if path.exists() {
            let raw = fs::read_to_string(&path).await?;
            serde_json::from_str(&raw).unwrap_or_default()
        } else {
            HashMap::new()
        };
        Ok(Self {
            path,
            cache: Arc::new(RwLock::new(cache)),
        })
    }

    async fn flush(&self) -> anyhow::Result<()> {
        let snapshot = self.cache.read().await.clone();
        let payload = serde_json::to_string_pretty(&snapshot)?;
        fs::write(&self.path, payload).await?;
        Ok(())
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn save(&self, checkpoint: Checkpoint) -> anyhow::Result<()> {
        self.cache
            .write()
            .await
            .insert(checkpoint.run_id.clone(), checkpoint);
        self.flush().await
    }

    async fn load(&self, run_id: &str) -> anyhow::Result<Option<Checkpoint>> {
        Ok(self.cache.read().await.get(run_id).cloned())
    }

    async fn delete(&self, run_id: &str) -> anyhow::Result<()> {
        self.cache.write().await.remove(run_id);
        self.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn round_trips_through_disk() {
        let path = std::env::temp_dir().join(format!("wayfare-checkpoint-{}.json", Uuid::new_v4()));
        let store = FileCheckpointStore::new(&path).await.unwrap();
        let checkpoint = Checkpoint {
            run_id: "run-1".to_string(),
            node: "negotiator".to_string(),
            state: PlannerState::new("s", "u", "q"),
        };
        store.save(checkpoint).await.unwrap();

        let reloaded = FileCheckpointStore::new(&path).await.unwrap();
        let loaded = reloaded.load("run-1").await.unwrap();
        assert!(loaded.is_some());
        assert_eq!(loaded.unwrap().node, "negotiator");

        let _ = fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn delete_removes_checkpoint() {
        let path = std::env::temp_dir().join(format!("wayfare-checkpoint-{}.json", Uuid::new_v4()));
        let store = FileCheckpointStore::new(&path).await.unwrap();
        store
            .save(Checkpoint {
                run_id: "run-2".to_string(),
                node: "intent_parser".to_string(),
                state: PlannerState::new("s", "u", "q"),
            })
            .await
            .unwrap();
        store.delete("run-2").await.unwrap();
        assert!(store.load("run-2").await.unwrap().is_none());
        let _ = fs::remove_file(&path).await;
    }
}
