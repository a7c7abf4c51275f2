//! Scores the finished trip 0-100 with a category breakdown and a short
//! tagline: LLM-only, with an explicit `unavailable` result when the LLM
//! can't be reached. Deliberately has no heuristic scoring fallback.

use async_trait::async_trait;
use std::collections::HashMap;
use wayfare_providers::{ChatMessage, LlmClient};
use wayfare_runtime::{GraphNode, NodeOutcome};
use wayfare_types::{AgentDecision, PlannerState, PlannerStatePatch, VibeScore};

const LLM_SYSTEM_PROMPT: &str = "You score a finished India trip itinerary from 0-100 on how well it \
matches the traveler's stated style and interests. Return ONLY JSON: {\"overall\": n, \"breakdown\": \
{\"pace\": n, \"value\": n, \"authenticity\": n, \"variety\": n}, \"tagline\": str}. Tagline must be 8 \
words or fewer.";

pub struct VibeScorerNode {
    llm: LlmClient,
}

impl VibeScorerNode {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl GraphNode for VibeScorerNode {
    fn name(&self) -> &str {
        "vibe_scorer"
    }

    async fn run(&self, state: &PlannerState) -> anyhow::Result<NodeOutcome> {
        let Some(trip) = &state.trip else {
            return Ok(skip("No itinerary to score."));
        };

        let vibe_score = self.score(state, trip).await.unwrap_or_else(unavailable);
        let summary = if vibe_score.unavailable {
            "Vibe score unavailable.".to_string()
        } else {
            format!("Overall {}/100 — \"{}\"", vibe_score.overall, vibe_score.tagline)
        };
        let decision = AgentDecision::new("vibe_scorer", "score_trip", "Scored finished itinerary via LLM.", summary);

        let patch = PlannerStatePatch {
            vibe_score: Some(vibe_score),
            current_stage: Some("vibe_scored".to_string()),
            agent_decisions: Some(vec![decision]),
            ..Default::default()
        };
        Ok(NodeOutcome::next(patch, "approval_gate"))
    }
}

impl VibeScorerNode {
    async fn score(&self, state: &PlannerState, trip: &wayfare_types::Trip) -> Option<VibeScore> {
        if !self.llm.is_configured() {
            return None;
        }
        let style = state.trip_request.as_ref().and_then(|r| r.travel_style.clone()).unwrap_or_else(|| "balanced".to_string());
        let interests = state.trip_request.as_ref().map(|r| r.interests.join(", ")).unwrap_or_default();
        let items_summary: Vec<String> = trip.items.iter().take(20).map(|i| format!("{}: {}", i.day, i.name)).collect();

        let user = format!(
            "Destination: {}\nTravel style: {style}\nInterests: {interests}\nTotal cost: ₹{:.0}\n\nItinerary:\n{}",
            trip.destination,
            trip.total_cost,
            items_summary.join("\n"),
        );

        let raw = self
            .llm
            .complete(&[ChatMessage::system(LLM_SYSTEM_PROMPT), ChatMessage::user(user)], true)
            .await?;
        let parsed = wayfare_providers::lenient_parse_json(&raw)?;

        let overall = parsed.get("overall").and_then(|v| v.as_u64()).unwrap_or(0).min(100) as u8;
        let breakdown: HashMap<String, u8> = parsed
            .get("breakdown")
            .and_then(|v| v.as_object())
            .map(|obj| {
                obj.iter()
                    .filter_map(|(k, v)| v.as_u64().map(|n| (k.clone(), n.min(100) as u8)))
                    .collect()
            })
            .unwrap_or_default();
        let tagline = parsed.get("tagline").and_then(|v| v.as_str()).unwrap_or("A solid trip.").to_string();

        Some(VibeScore { overall, breakdown, tagline, unavailable: false })
    }
}

fn unavailable() -> VibeScore {
    VibeScore { overall: 0, breakdown: HashMap::new(), tagline: "Vibe score unavailable.".to_string(), unavailable: true }
}

fn skip(reason: &str) -> NodeOutcome {
    let decision = AgentDecision::new("vibe_scorer", "skip", reason.to_string(), "Skipped".to_string());
    let patch = PlannerStatePatch {
        vibe_score: Some(unavailable()),
        current_stage: Some("vibe_scored".to_string()),
        agent_decisions: Some(vec![decision]),
        ..Default::default()
    };
    NodeOutcome::next(patch, "approval_gate")
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
    async fn unconfigured_llm_yields_unavailable_score() {
        let node = VibeScorerNode::new(LlmClient::new(None, "https://example.invalid", "gpt-4o-mini", test_cache()));
        let mut state = PlannerState::new("s", "u", "q");
        state.trip = Some(wayfare_types::Trip {
            destination: "Goa".into(),
            duration_days: 2,
            items: vec![],
            total_cost: 0.0,
        });

        let outcome = node.run(&state).await.unwrap();
        assert!(outcome.patch.vibe_score.unwrap().unavailable);
    }

    #[tokio::test]
    async fn missing_trip_skips_with_unavailable_score() {
        let node = VibeScorerNode::new(LlmClient::new(None, "https://example.invalid", "gpt-4o-mini", test_cache()));
        let state = PlannerState::new("s", "u", "q");
        let outcome = node.run(&state).await.unwrap();
        assert!(outcome.patch.vibe_score.unwrap().unavailable);
    }
}
