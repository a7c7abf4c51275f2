//! Shared server state: one `Arc`-held struct handed to every handler,
//! bundling the scheduler and the four persistence stores a stateless
//! planning service needs.

use std::sync::Arc;

use wayfare_agents::EngineConfig;
use wayfare_runtime::{EventBus, FileCheckpointStore, GraphDefinition, Scheduler};

use crate::stores::{ConversationLog, DecisionLog, FileConversationLog, FileDecisionLog, FileSessionStore, FileUserStore, SessionStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub scheduler: Arc<Scheduler>,
    pub graph: Arc<GraphDefinition>,
    pub sessions: Arc<dyn SessionStore>,
    pub users: Arc<dyn UserStore>,
    pub decisions: Arc<dyn DecisionLog>,
    pub conversations: Arc<dyn ConversationLog>,
    pub config: EngineConfig,
}

impl AppState {
    /// Builds every store under `config.state_dir`, one JSON document per
    /// table, and wires the scheduler around the default planning graph.
    pub async fn bootstrap(config: EngineConfig) -> anyhow::Result<Self> {
        let graph = Arc::new(wayfare_agents::build_graph(&config).await?);
        let events = EventBus::new();
        let checkpoints = Arc::new(FileCheckpointStore::new(table_path(&config, "trip_checkpoints")).await?);
        let scheduler = Arc::new(Scheduler::new(graph.clone(), events, checkpoints));

        let sessions = Arc::new(FileSessionStore::new(table_path(&config, "trip_sessions")).await?);
        let users = Arc::new(FileUserStore::new(table_path(&config, "users")).await?);
        let decisions = Arc::new(FileDecisionLog::new(table_path(&config, "agent_decisions")).await?);
        let conversations = Arc::new(FileConversationLog::new(table_path(&config, "conversation_history")).await?);

        Ok(Self { scheduler, graph, sessions, users, decisions, conversations, config })
    }
}

fn table_path(config: &EngineConfig, table: &str) -> std::path::PathBuf {
    std::path::Path::new(&config.state_dir).join(format!("{table}.json"))
}
