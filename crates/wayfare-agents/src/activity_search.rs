//! Activity search: Google Places is queried per interest, a secondary
//! web search is always layered in additively (standing in for a
//! curated activities database, which has no Rust-side equivalent — see
//! DESIGN.md), and an LLM generates activities only as a last resort
//! when both return nothing.

use async_trait::async_trait;
use wayfare_providers::geocode::GeocodeProvider;
use wayfare_providers::places::PlacesProvider;
use wayfare_providers::search::WebSearchProvider;
use wayfare_providers::{ChatMessage, LlmClient};
use wayfare_runtime::{GraphNode, NodeOutcome};
use wayfare_types::{stable_id, Activity, AgentDecision, PlannerState, PlannerStatePatch, SourceOrigin};

const SEARCH_RADIUS_M: f64 = 10_000.0;
const MAX_RESULTS: usize = 15;

const LLM_SYSTEM_PROMPT: &str = "You generate a list of real tourist activities for an Indian city. \
Return ONLY a JSON array of 6-8 objects, each with: name, description, category, duration_hours, price \
(INR), address. Use real, specific place names — never generic placeholders.";

pub struct ActivitySearchNode {
    places: PlacesProvider,
    web_search: WebSearchProvider,
    llm: LlmClient,
    geocode: GeocodeProvider,
}

impl ActivitySearchNode {
    pub fn new(places: PlacesProvider, web_search: WebSearchProvider, llm: LlmClient, geocode: GeocodeProvider) -> Self {
        Self { places, web_search, llm, geocode }
    }
}

#[async_trait]
impl GraphNode for ActivitySearchNode {
    fn name(&self) -> &str {
        "activity_search"
    }

    async fn run(&self, state: &PlannerState) -> anyhow::Result<NodeOutcome> {
        let Some(request) = &state.trip_request else {
            return Ok(skip("No trip request available."));
        };
        let Some(destination) = request.destination.clone() else {
            return Ok(skip("Destination not yet resolved."));
        };

        let mut reasoning = Vec::new();
        let mut found: Vec<Activity> = Vec::new();

        let queries: Vec<String> = if request.interests.is_empty() {
            vec!["things to do".to_string(), "attractions".to_string()]
        } else {
            request.interests.iter().take(3).cloned().collect()
        };

        if let Some(coords) = self.geocode.geocode(&destination).await {
            for query in &queries {
                let text_query = format!("{query} in {destination}");
                let (activities, reason) = self
                    .places
                    .search_activities(&text_query, coords.lat, coords.lng, SEARCH_RADIUS_M)
                    .await;
                if let Some(r) = reason {
                    reasoning.push(format!("Places ({query}): {r}"));
                }
                found.extend(activities);
            }
        } else {
            reasoning.push(format!("Could not geocode {destination}; skipping Places."));
        }

        let web_query = format!("best things to do and activities in {destination} India");
        let (outcome, reason) = self.web_search.search(&web_query).await;
        if let Some(r) = reason {
            reasoning.push(format!("Web search: {r}"));
        } else if let Some(outcome) = outcome {
            found.extend(synthesize_activities_from_search(&outcome.results));
        }

        if found.is_empty() {
            reasoning.push("Places and web search both empty — generating activities via LLM.".to_string());
            found = self.llm_generate_activities(&destination, &request.interests).await;
        }

        let unique = dedupe_by_name(found);
        let truncated = unique.len() > MAX_RESULTS;
        let activities: Vec<Activity> = unique.into_iter().take(MAX_RESULTS).collect();
        if truncated {
            reasoning.push(format!("Capped at {MAX_RESULTS} unique activities."));
        }

        let summary = format!("{} unique activities found in {destination}.", activities.len());
        let decision = AgentDecision::new("activity_search", "search_activities", reasoning.join(" "), summary);

        let patch = PlannerStatePatch {
            activity_options: Some(activities),
            current_stage: Some("activity_search_done".to_string()),
            agent_decisions: Some(vec![decision]),
            ..Default::default()
        };
        Ok(NodeOutcome::next(patch, "search_aggregator"))
    }
}

impl ActivitySearchNode {
    async fn llm_generate_activities(&self, destination: &str, interests: &[String]) -> Vec<Activity> {
        if !self.llm.is_configured() {
            return Vec::new();
        }
        let interests_str = if interests.is_empty() {
            "general sightseeing".to_string()
        } else {
            interests.join(", ")
        };
        let user = format!("City: {destination}\nInterests: {interests_str}\nGenerate the activity list now.");
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
            .filter_map(|item| {
                let name = item.get("name")?.as_str()?.to_string();
                Some(Activity {
                    id: stable_id(&format!("llm-activity-{name}")),
                    name,
                    category: item.get("category").and_then(|v| v.as_str()).unwrap_or("sightseeing").to_string(),
                    duration_hours: item.get("duration_hours").and_then(|v| v.as_f64()).unwrap_or(2.0),
                    price: item.get("price").and_then(|v| v.as_f64()).unwrap_or(0.0),
                    lat: 0.0,
                    lng: 0.0,
                    opening_hours: None,
                    phone: None,
                    rating: 3.5,
                    source_origin: SourceOrigin::Llm,
                    verified: false,
                })
            })
            .collect()
    }
}

fn skip(reason: &str) -> NodeOutcome {
    let decision = AgentDecision::new("activity_search", "skip", reason.to_string(), "Skipped".to_string());
    let patch = PlannerStatePatch {
        activity_options: Some(vec![]),
        current_stage: Some("activity_search_done".to_string()),
        agent_decisions: Some(vec![decision]),
        ..Default::default()
    };
    NodeOutcome::next(patch, "search_aggregator")
}

fn synthesize_activities_from_search(results: &[wayfare_providers::search::SearchResult]) -> Vec<Activity> {
    results
        .iter()
        .take(8)
        .map(|r| Activity {
            id: stable_id(&format!("web-activity-{}", r.url)),
            name: r.title.clone(),
            category: "sightseeing".to_string(),
            duration_hours: 2.0,
            price: 0.0,
            lat: 0.0,
            lng: 0.0,
            opening_hours: None,
            phone: None,
            rating: 0.0,
            source_origin: SourceOrigin::TavilyWeb,
            verified: false,
        })
        .collect()
}

fn dedupe_by_name(activities: Vec<Activity>) -> Vec<Activity> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for activity in activities {
        let key = normalize(&activity.name);
        if seen.insert(key) {
            out.push(activity);
        }
    }
    out
}

fn normalize(name: &str) -> String {
    name.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wayfare_cache::CacheClient;

    fn unconfigured_node() -> ActivitySearchNode {
        let cache = Arc::new(CacheClient::in_memory());
        ActivitySearchNode::new(
            PlacesProvider::new(None, cache.clone()),
            WebSearchProvider::new(None, cache.clone()),
            LlmClient::new(None, "https://example.invalid", "gpt-4o-mini", cache.clone()),
            GeocodeProvider::new(cache),
        )
    }

    #[tokio::test]
    async fn missing_destination_skips_cleanly() {
        let node = unconfigured_node();
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
        assert!(outcome.patch.activity_options.unwrap().is_empty());
    }

    #[test]
    fn dedupe_collapses_case_and_whitespace_variants() {
        let a = Activity {
            id: "1".into(),
            name: "Ganga  Aarti".into(),
            category: "spiritual".into(),
            duration_hours: 1.0,
            price: 0.0,
            lat: 0.0,
            lng: 0.0,
            opening_hours: None,
            phone: None,
            rating: 4.0,
            source_origin: SourceOrigin::Api,
            verified: true,
        };
        let mut b = a.clone();
        b.id = "2".into();
        b.name = "ganga aarti".into();
        let out = dedupe_by_name(vec![a, b]);
        assert_eq!(out.len(), 1);
    }
}
