//! Pass-through dispatcher/aggregator nodes for the two fan-out phases
//! (search, enrichment): each of these four nodes exists only to give
//! the conditional-edge fan-out a named place to attach, and carries no
//! logic beyond a stage-name update.

use async_trait::async_trait;
use serde_json::json;
use wayfare_runtime::{GraphNode, NodeOutcome, Route, SendCommand};
use wayfare_types::{PlannerState, PlannerStatePatch};

const SEARCH_AGENTS: &[&str] = &["flight_search", "hotel_search", "activity_search", "weather_check"];

pub struct SearchDispatcherNode;

impl SearchDispatcherNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SearchDispatcherNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphNode for SearchDispatcherNode {
    fn name(&self) -> &str {
        "search_dispatcher"
    }

    async fn run(&self, state: &PlannerState) -> anyhow::Result<NodeOutcome> {
        let patch = PlannerStatePatch {
            current_stage: Some("searching".to_string()),
            ..Default::default()
        };

        let active: Vec<&&str> = SEARCH_AGENTS.iter().filter(|a| state.active_agents.iter().any(|x| x == *a)).collect();
        if active.is_empty() {
            return Ok(NodeOutcome::next(patch, "search_aggregator"));
        }
        let sends = active.into_iter().map(|a| SendCommand::new(*a, json!({}))).collect();
        Ok(NodeOutcome { patch, route: Route::Dispatch(sends) })
    }
}

pub struct SearchAggregatorNode;

impl SearchAggregatorNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SearchAggregatorNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphNode for SearchAggregatorNode {
    fn name(&self) -> &str {
        "search_aggregator"
    }

    async fn run(&self, _state: &PlannerState) -> anyhow::Result<NodeOutcome> {
        let patch = PlannerStatePatch {
            current_stage: Some("search_done".to_string()),
            ..Default::default()
        };
        Ok(NodeOutcome::next(patch, "enrichment_dispatcher"))
    }
}

pub struct EnrichmentDispatcherNode;

impl EnrichmentDispatcherNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EnrichmentDispatcherNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphNode for EnrichmentDispatcherNode {
    fn name(&self) -> &str {
        "enrichment_dispatcher"
    }

    async fn run(&self, state: &PlannerState) -> anyhow::Result<NodeOutcome> {
        let patch = PlannerStatePatch {
            current_stage: Some("enriching".to_string()),
            ..Default::default()
        };

        let mut sends = Vec::new();
        if state.active_agents.iter().any(|a| a == "local_intel") {
            sends.push(SendCommand::new("local_intel", json!({})));
        }
        // festival_check always runs, regardless of active_agents.
        sends.push(SendCommand::new("festival_check", json!({})));

        Ok(NodeOutcome { patch, route: Route::Dispatch(sends) })
    }
}

pub struct EnrichmentAggregatorNode;

impl EnrichmentAggregatorNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EnrichmentAggregatorNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphNode for EnrichmentAggregatorNode {
    fn name(&self) -> &str {
        "enrichment_aggregator"
    }

    async fn run(&self, _state: &PlannerState) -> anyhow::Result<NodeOutcome> {
        let patch = PlannerStatePatch {
            current_stage: Some("enrichment_done".to_string()),
            ..Default::default()
        };
        Ok(NodeOutcome::next(patch, "approval_gate"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn search_dispatcher_fans_out_only_active_agents() {
        let node = SearchDispatcherNode::new();
        let mut state = PlannerState::new("s", "u", "q");
        state.active_agents = vec!["flight_search".to_string(), "weather_check".to_string()];

        let outcome = node.run(&state).await.unwrap();
        match outcome.route {
            Route::Dispatch(sends) => {
                assert_eq!(sends.len(), 2);
                assert!(sends.iter().any(|s| s.target == "flight_search"));
                assert!(sends.iter().any(|s| s.target == "weather_check"));
            }
            _ => panic!("expected Route::Dispatch"),
        }
    }

    #[tokio::test]
    async fn search_dispatcher_skips_straight_to_aggregator_when_nothing_active() {
        let node = SearchDispatcherNode::new();
        let state = PlannerState::new("s", "u", "q");
        let outcome = node.run(&state).await.unwrap();
        match outcome.route {
            Route::Node(next) => assert_eq!(next, "search_aggregator"),
            _ => panic!("expected Route::Node"),
        }
    }

    #[tokio::test]
    async fn enrichment_dispatcher_always_includes_festival_check() {
        let node = EnrichmentDispatcherNode::new();
        let state = PlannerState::new("s", "u", "q");
        let outcome = node.run(&state).await.unwrap();
        match outcome.route {
            Route::Dispatch(sends) => assert!(sends.iter().any(|s| s.target == "festival_check")),
            _ => panic!("expected Route::Dispatch"),
        }
    }
}
