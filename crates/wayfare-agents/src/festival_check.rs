//! Festival/local-event detection: a fixed table is checked first for
//! date-overlapping events, with an LLM-generated guess as fallback when
//! nothing in the table matches. Always dispatched in `registry.rs`
//! regardless of `active_agents` — a festival can affect any trip, plan
//! or modification alike.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;
use wayfare_providers::{ChatMessage, LlmClient};
use wayfare_runtime::{GraphNode, NodeOutcome};
use wayfare_types::{AgentDecision, PlannerState, PlannerStatePatch};

const LLM_SYSTEM_PROMPT: &str = "You know about Indian festivals and local events. Given a city and a \
date range, return ONLY a JSON array of 0-2 objects with keys: name, date (YYYY-MM-DD), impact \
(positive/negative/neutral), description. If nothing notable falls in range, return an empty array.";

struct Festival {
    city: &'static str,
    name: &'static str,
    month: u32,
    day: u32,
    impact: &'static str,
    description: &'static str,
}

/// Fixed-date or near-fixed-date festivals. Lunar festivals (Diwali,
/// Holi) actually shift year to year; here they're pinned to commonly
/// observed dates for the matching window, a known approximation noted
/// in DESIGN.md.
const FESTIVAL_CALENDAR: &[Festival] = &[
    Festival { city: "jaipur", name: "Teej Festival", month: 8, day: 15, impact: "positive", description: "Processions and markets come alive across the old city." },
    Festival { city: "pushkar", name: "Pushkar Camel Fair", month: 11, day: 10, impact: "positive", description: "Livestock fair draws huge crowds; book stays well ahead." },
    Festival { city: "goa", name: "Goa Carnival", month: 2, day: 20, impact: "positive", description: "Street parades and music across Panaji." },
    Festival { city: "varanasi", name: "Dev Deepawali", month: 11, day: 15, impact: "positive", description: "Ghats are lit with thousands of lamps; extremely crowded." },
    Festival { city: "amritsar", name: "Diwali at the Golden Temple", month: 11, day: 1, impact: "positive", description: "The temple is illuminated; expect heavy footfall." },
];

pub struct FestivalCheckNode {
    llm: LlmClient,
}

impl FestivalCheckNode {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl GraphNode for FestivalCheckNode {
    fn name(&self) -> &str {
        "festival_check"
    }

    async fn run(&self, state: &PlannerState) -> anyhow::Result<NodeOutcome> {
        let Some(request) = &state.trip_request else {
            return Ok(skip("No trip request available."));
        };
        let Some(destination) = request.destination.clone() else {
            return Ok(skip("Destination not yet resolved."));
        };

        let mut reasoning = Vec::new();
        let key = destination.to_lowercase();

        let curated: Vec<serde_json::Value> = FESTIVAL_CALENDAR
            .iter()
            .filter(|f| f.city == key)
            .filter(|f| within_window(f, request.start_date, request.end_date))
            .map(|f| {
                json!({
                    "name": f.name,
                    "date": format!("2026-{:02}-{:02}", f.month, f.day),
                    "impact": f.impact,
                    "description": f.description,
                    "source": "curated",
                })
            })
            .collect();

        let events = if !curated.is_empty() {
            reasoning.push(format!("{} curated festival(s) overlap the trip window.", curated.len()));
            curated
        } else if self.llm.is_configured() {
            reasoning.push("No curated festival match — checking via LLM.".to_string());
            self.llm_generate_events(&destination, request.start_date, request.end_date).await
        } else {
            reasoning.push("No curated festival match and LLM unconfigured.".to_string());
            Vec::new()
        };

        let summary = format!("{} event(s) found for {destination}.", events.len());
        let decision = AgentDecision::new("festival_check", "check_festivals", reasoning.join(" "), summary);

        let patch = PlannerStatePatch {
            events: Some(events),
            current_stage: Some("festival_check_done".to_string()),
            agent_decisions: Some(vec![decision]),
            ..Default::default()
        };
        Ok(NodeOutcome::next(patch, "enrichment_aggregator"))
    }
}

impl FestivalCheckNode {
    async fn llm_generate_events(
        &self,
        destination: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Vec<serde_json::Value> {
        let window = match (start, end) {
            (Some(s), Some(e)) => format!("{s} to {e}"),
            _ => "an unspecified near-term window".to_string(),
        };
        let user = format!("City: {destination}\nDate range: {window}\nList any notable festivals or local events.");
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
        parsed.as_array().cloned().unwrap_or_default()
    }
}

fn within_window(festival: &Festival, start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
    use chrono::Datelike;
    let (Some(start), Some(end)) = (start, end) else {
        return true;
    };
    let Some(festival_date) = NaiveDate::from_ymd_opt(start.year(), festival.month, festival.day) else {
        return false;
    };
    festival_date >= start && festival_date <= end
}

fn skip(reason: &str) -> NodeOutcome {
    let decision = AgentDecision::new("festival_check", "skip", reason.to_string(), "Skipped".to_string());
    let patch = PlannerStatePatch {
        events: Some(vec![]),
        current_stage: Some("festival_check_done".to_string()),
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
    async fn curated_festival_matches_overlapping_window() {
        let node = FestivalCheckNode::new(LlmClient::new(None, "https://example.invalid", "gpt-4o-mini", test_cache()));
        let mut state = PlannerState::new("s", "u", "plan a trip to Goa");
        state.trip_request = Some(wayfare_types::TripRequest {
            origin: Some("Mumbai".to_string()),
            destination: Some("Goa".to_string()),
            start_date: NaiveDate::from_ymd_opt(2026, 2, 18),
            end_date: NaiveDate::from_ymd_opt(2026, 2, 25),
            budget: Some(20_000),
            num_travelers: 2,
            travel_style: None,
            interests: vec![],
        });

        let outcome = node.run(&state).await.unwrap();
        let events = outcome.patch.events.unwrap();
        assert!(events.iter().any(|e| e["name"] == "Goa Carnival"));
    }

    #[tokio::test]
    async fn no_match_and_unconfigured_llm_returns_empty() {
        let node = FestivalCheckNode::new(LlmClient::new(None, "https://example.invalid", "gpt-4o-mini", test_cache()));
        let mut state = PlannerState::new("s", "u", "plan a trip to Manali");
        state.trip_request = Some(wayfare_types::TripRequest {
            origin: Some("Delhi".to_string()),
            destination: Some("Manali".to_string()),
            start_date: NaiveDate::from_ymd_opt(2026, 6, 1),
            end_date: NaiveDate::from_ymd_opt(2026, 6, 5),
            budget: Some(20_000),
            num_travelers: 1,
            travel_style: None,
            interests: vec![],
        });

        let outcome = node.run(&state).await.unwrap();
        assert!(outcome.patch.events.unwrap().is_empty());
    }
}
