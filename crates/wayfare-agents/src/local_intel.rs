//! Local tips and hidden gems: Reddit search (errors swallowed, never
//! propagated), a small curated tips table, and an LLM-generated top-up
//! when neither source has enough for the destination.

use async_trait::async_trait;
use serde_json::json;
use wayfare_providers::reddit::RedditProvider;
use wayfare_providers::{ChatMessage, LlmClient};
use wayfare_runtime::{GraphNode, NodeOutcome};
use wayfare_types::{AgentDecision, PlannerState, PlannerStatePatch};

const LLM_SYSTEM_PROMPT: &str = "You share hidden gems and local tips for travelers in an Indian city. \
Return ONLY a JSON array of 3-5 short strings, each a specific, non-obvious tip a local would give a \
first-time visitor.";

struct CuratedTip {
    city: &'static str,
    tips: &'static [&'static str],
}

const CURATED_TIPS: &[CuratedTip] = &[
    CuratedTip {
        city: "rishikesh",
        tips: &[
            "Cross the Ram Jhula footbridge at sunrise before the crowds arrive.",
            "The ashrams near Parmarth Niketan host free evening Ganga Aarti open to visitors.",
        ],
    },
    CuratedTip {
        city: "goa",
        tips: &[
            "North Goa's beach shacks negotiate lower rates outside peak December weeks.",
            "Old Goa's churches are far quieter on weekday mornings than the main beach strip.",
        ],
    },
    CuratedTip {
        city: "jaipur",
        tips: &[
            "Enter Amer Fort through the Suraj Pol to avoid the tour-bus queue at the main gate.",
            "The Bapu Bazaar stalls expect haggling — start at half the quoted price.",
        ],
    },
    CuratedTip {
        city: "varanasi",
        tips: &[
            "A dawn boat ride from Assi Ghat avoids both the heat and the evening Aarti crowds.",
            "Blue Lassi near Manikarnika Ghat has been serving the same recipe for decades.",
        ],
    },
];

pub struct LocalIntelNode {
    reddit: RedditProvider,
    llm: LlmClient,
}

impl LocalIntelNode {
    pub fn new(reddit: RedditProvider, llm: LlmClient) -> Self {
        Self { reddit, llm }
    }
}

#[async_trait]
impl GraphNode for LocalIntelNode {
    fn name(&self) -> &str {
        "local_intel"
    }

    async fn run(&self, state: &PlannerState) -> anyhow::Result<NodeOutcome> {
        let Some(request) = &state.trip_request else {
            return Ok(skip("No trip request available."));
        };
        let Some(destination) = request.destination.clone() else {
            return Ok(skip("Destination not yet resolved."));
        };

        let mut reasoning = Vec::new();

        let (gems, reason) = self.reddit.search_hidden_gems(&destination).await;
        if let Some(r) = reason {
            reasoning.push(format!("Reddit: {r}"));
        }

        let mut tips: Vec<serde_json::Value> = Vec::new();
        let key = destination.to_lowercase();
        if let Some(curated) = CURATED_TIPS.iter().find(|c| c.city == key) {
            tips.extend(curated.tips.iter().map(|t| json!({ "tip": t, "source": "curated", "verified": true })));
        }

        if tips.is_empty() {
            reasoning.push("No curated tips for this destination — generating via LLM.".to_string());
            tips = self.llm_generate_tips(&destination).await;
        }

        let summary = format!("{} local tip(s), {} hidden gem(s).", tips.len(), gems.len());
        let decision = AgentDecision::new("local_intel", "gather_local_intel", reasoning.join(" "), summary);

        let patch = PlannerStatePatch {
            local_tips: Some(tips),
            hidden_gems: Some(gems),
            current_stage: Some("local_intel_done".to_string()),
            agent_decisions: Some(vec![decision]),
            ..Default::default()
        };
        Ok(NodeOutcome::next(patch, "enrichment_aggregator"))
    }
}

impl LocalIntelNode {
    async fn llm_generate_tips(&self, destination: &str) -> Vec<serde_json::Value> {
        if !self.llm.is_configured() {
            return Vec::new();
        }
        let user = format!("City: {destination}\nGenerate the tip list now.");
        let Some(raw) = self
            .llm
            .complete(&[ChatMessage::system(LLM_SYSTEM_PROMPT), ChatMessage::user(user)], false)
            .await
        else {
            return Vec::new();
        };
        let Some(parsed) = wayfare_providers::lenient_parse_json(&raw) else {
            return Vec::new();
        };
        let Some(items) = parsed.as_array() else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(|v| v.as_str())
            .map(|tip| json!({ "tip": tip, "source": "llm", "verified": false }))
            .collect()
    }
}

fn skip(reason: &str) -> NodeOutcome {
    let decision = AgentDecision::new("local_intel", "skip", reason.to_string(), "Skipped".to_string());
    let patch = PlannerStatePatch {
        local_tips: Some(vec![]),
        hidden_gems: Some(vec![]),
        current_stage: Some("local_intel_done".to_string()),
        agent_decisions: Some(vec![decision]),
        ..Default::default()
    };
    NodeOutcome::next(patch, "enrichment_aggregator")
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
    async fn curated_tips_used_for_known_city() {
        let node = LocalIntelNode::new(
            RedditProvider::new(None, None, test_cache()),
            LlmClient::new(None, "https://example.invalid", "gpt-4o-mini", test_cache()),
        );
        let mut state = PlannerState::new("s", "u", "plan a trip to Jaipur");
        state.trip_request = Some(wayfare_types::TripRequest {
            origin: Some("Delhi".to_string()),
            destination: Some("Jaipur".to_string()),
            start_date: None,
            end_date: None,
            budget: Some(15_000),
            num_travelers: 1,
            travel_style: None,
            interests: vec![],
        });

        let outcome = node.run(&state).await.unwrap();
        assert!(!outcome.patch.local_tips.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_destination_skips_cleanly() {
        let node = LocalIntelNode::new(
            RedditProvider::new(None, None, test_cache()),
            LlmClient::new(None, "https://example.invalid", "gpt-4o-mini", test_cache()),
        );
        let mut state = PlannerState::new("s", "u", "plan a trip");
        state.trip_request = Some(wayfare_types::TripRequest {
            origin: Some("Delhi".to_string()),
            destination: None,
            start_date: None,
            end_date: None,
            budget: None,
            num_travelers: 1,
            travel_style: None,
            interests: vec![],
        });

        let outcome = node.run(&state).await.unwrap();
        assert!(outcome.patch.local_tips.unwrap().is_empty());
    }
}
