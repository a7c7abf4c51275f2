use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Audit record every agent node appends after it runs, per the
/// per-node convention: `{agent_name, action, reasoning, result_summary,
/// tokens_used, latency_ms}`, persisted under `agent_decisions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDecision {
    pub agent_name: String,
    pub action: String,
    pub reasoning: String,
    pub result_summary: String,
    #[serde(default)]
    pub tokens_used: u32,
    #[serde(default)]
    pub latency_ms: u64,
    pub created_at: DateTime<Utc>,
}

impl AgentDecision {
    pub fn new(
        agent_name: impl Into<String>,
        action: impl Into<String>,
        reasoning: impl Into<String>,
        result_summary: impl Into<String>,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            action: action.into(),
            reasoning: reasoning.into(),
            result_summary: result_summary.into(),
            tokens_used: 0,
            latency_ms: 0,
            created_at: Utc::now(),
        }
    }
}
