//! Extracts a [`TripRequest`] from the free-text query: LLM-first with a
//! keyword/regex heuristic fallback.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use regex::Regex;
use wayfare_providers::{ChatMessage, LlmClient};
use wayfare_runtime::{GraphNode, NodeOutcome};
use wayfare_types::{AgentDecision, PlannerState, PlannerStatePatch, TripRequest};

const CITY_KEYWORDS: &[(&str, &str)] = &[
    ("rishikesh", "Rishikesh"),
    ("goa", "Goa"),
    ("jaipur", "Jaipur"),
    ("manali", "Manali"),
    ("varanasi", "Varanasi"),
    ("delhi", "Delhi"),
    ("mumbai", "Mumbai"),
    ("kerala", "Kochi"),
    ("munnar", "Munnar"),
    ("kochi", "Kochi"),
    ("udaipur", "Udaipur"),
    ("agra", "Agra"),
    ("darjeeling", "Darjeeling"),
    ("shimla", "Shimla"),
    ("amritsar", "Amritsar"),
    ("jodhpur", "Jodhpur"),
    ("pushkar", "Pushkar"),
    ("pondicherry", "Pondicherry"),
    ("pondy", "Pondicherry"),
    ("coorg", "Coorg"),
    ("hampi", "Hampi"),
    ("leh", "Leh"),
    ("ladakh", "Leh"),
];

/// Keyword/regex heuristic used whenever the LLM is unconfigured or
/// returns something unparseable.
pub fn heuristic_parse(raw: &str) -> TripRequest {
    let lower = raw.to_lowercase();

    let destination = CITY_KEYWORDS
        .iter()
        .find(|(kw, _)| lower.contains(kw))
        .map(|(_, city)| city.to_string());

    let origin = if lower.contains("mumbai") && lower.contains("from") {
        "Mumbai".to_string()
    } else {
        "Delhi".to_string()
    };

    let budget = parse_budget(raw).unwrap_or(15_000);

    let start = Utc::now().date_naive() + Duration::days(7);
    let mut end = start + Duration::days(2);
    if lower.contains("weekend") {
        end = start + Duration::days(1);
    }
    if lower.contains("week") || lower.contains("4 day") || lower.contains("4-day") {
        end = start + Duration::days(3);
    }
    if lower.contains("5 day") || lower.contains("5-day") {
        end = start + Duration::days(4);
    }

    let travel_style = if lower.contains("luxury") {
        "luxury"
    } else if lower.contains("mid") {
        "balanced"
    } else {
        "backpacker"
    };

    let mut interests = Vec::new();
    if lower.contains("adventure") || lower.contains("rafting") || lower.contains("trekking") {
        interests.push("adventure".to_string());
    }
    if lower.contains("spiritual") || lower.contains("yoga") || lower.contains("temple") {
        interests.push("spiritual".to_string());
    }
    if lower.contains("culture") || lower.contains("heritage") {
        interests.push("culture".to_string());
    }
    if lower.contains("beach") {
        interests.push("beaches".to_string());
    }
    if interests.is_empty() {
        interests.push("adventure".to_string());
    }

    TripRequest {
        origin: Some(origin),
        destination,
        start_date: Some(start),
        end_date: Some(end),
        budget: Some(budget),
        num_travelers: 1,
        travel_style: Some(travel_style.to_string()),
        interests,
    }
}

fn parse_budget(raw: &str) -> Option<u64> {
    let pattern = Regex::new(r"(?i)₹?(\d[\d,]*)\s*[kK]?").unwrap();
    for word in raw.split_whitespace() {
        let lower = word.to_lowercase();
        if !lower.contains('k') && !lower.contains("000") {
            continue;
        }
        let Some(caps) = pattern.captures(word) else { continue };
        let digits: String = caps[1].chars().filter(|c| c.is_ascii_digit()).collect();
        let Ok(mut value) = digits.parse::<u64>() else { continue };
        if lower.contains('k') {
            value *= 1000;
        }
        if value < 1000 {
            value *= 1000;
        }
        return Some(value);
    }
    None
}

pub struct IntentParserNode {
    llm: LlmClient,
}

impl IntentParserNode {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    async fn llm_parse(&self, raw: &str) -> Option<TripRequest> {
        if !self.llm.is_configured() {
            return None;
        }
        let system = "Extract a travel plan from the user message. Return only valid JSON with keys: \
destination (full Indian city name or empty string), origin (city), start_date (YYYY-MM-DD), \
end_date (YYYY-MM-DD), budget (number), travel_style (backpacker/budget/balanced/luxury), \
interests (array of strings), num_travelers (number). Never use abbreviations for destination/origin; \
leave destination empty if unclear so a recommender can run.";
        let raw_reply = self
            .llm
            .complete(&[ChatMessage::system(system), ChatMessage::user(raw)], true)
            .await?;
        let parsed = wayfare_providers::lenient_parse_json(&raw_reply)?;

        let mut destination = parsed.get("destination").and_then(|v| v.as_str()).map(str::to_string);
        if let Some(d) = &destination {
            if d.trim().len() < 4 {
                destination = None;
            }
        }

        let start_date = parsed
            .get("start_date")
            .and_then(|v| v.as_str())
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());
        let end_date = parsed
            .get("end_date")
            .and_then(|v| v.as_str())
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());

        Some(TripRequest {
            origin: parsed.get("origin").and_then(|v| v.as_str()).map(str::to_string),
            destination,
            start_date,
            end_date,
            budget: parsed.get("budget").and_then(|v| v.as_f64()).map(|b| b.max(0.0) as u64),
            num_travelers: parsed.get("num_travelers").and_then(|v| v.as_u64()).unwrap_or(1) as u32,
            travel_style: parsed.get("travel_style").and_then(|v| v.as_str()).map(str::to_string),
            interests: parsed
                .get("interests")
                .and_then(|v| v.as_array())
                .map(|a| a.iter().filter_map(|v| v.as_str().map(String::from)).collect())
                .unwrap_or_default(),
        })
    }
}

#[async_trait]
impl GraphNode for IntentParserNode {
    fn name(&self) -> &str {
        "intent_parser"
    }

    async fn run(&self, state: &PlannerState) -> anyhow::Result<NodeOutcome> {
        let raw = state.raw_query.trim();
        if raw.is_empty() {
            let patch = PlannerStatePatch {
                current_stage: Some("intent_parsed".to_string()),
                ..Default::default()
            };
            return Ok(NodeOutcome::next(patch, "route_after_intent"));
        }

        let mut request = match self.llm_parse(raw).await {
            Some(req) => req,
            None => heuristic_parse(raw),
        };
        if let Some(dest) = &request.destination {
            if dest.trim().len() < 4 {
                request.destination = None;
            }
        }

        let dest_summary = request.destination.clone().unwrap_or_else(|| "To be recommended".to_string());
        let decision = AgentDecision::new(
            "intent_parser",
            "parse",
            format!("Parsed query: {}", truncate(raw, 100)),
            format!("Destination: {dest_summary}"),
        );

        let patch = PlannerStatePatch {
            trip_request: Some(request),
            current_stage: Some("intent_parsed".to_string()),
            agent_decisions: Some(vec![decision]),
            ..Default::default()
        };
        Ok(NodeOutcome::next(patch, "route_after_intent"))
    }
}

/// Pass-through routing node for the conditional edge after intent
/// parsing: no destination and no offered options means a destination
/// must be recommended first; a pending clarification takes the run
/// straight to the clarification gate; otherwise fan out to search.
pub struct RouteAfterIntentNode;

impl RouteAfterIntentNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RouteAfterIntentNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphNode for RouteAfterIntentNode {
    fn name(&self) -> &str {
        "route_after_intent"
    }

    async fn run(&self, state: &PlannerState) -> anyhow::Result<NodeOutcome> {
        let patch = PlannerStatePatch::default();
        let has_destination = state.trip_request.as_ref().and_then(|r| r.destination.as_ref()).is_some();

        if !has_destination && state.destination_options.is_empty() {
            return Ok(NodeOutcome::next(patch, "destination_recommender"));
        }
        if state.requires_approval && state.approval_type.as_deref() == Some("clarification") {
            return Ok(NodeOutcome::next(patch, "clarification"));
        }
        Ok(NodeOutcome::next(patch, "search_dispatcher"))
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristic_extracts_city_and_default_budget() {
        let req = heuristic_parse("Plan a weekend adventure trip to Rishikesh for 10k");
        assert_eq!(req.destination.as_deref(), Some("Rishikesh"));
        assert_eq!(req.budget, Some(10_000));
        assert!(req.interests.contains(&"adventure".to_string()));
    }

    #[test]
    fn no_city_keyword_leaves_destination_empty() {
        let req = heuristic_parse("plan something fun for my family");
        assert!(req.destination.is_none());
    }

    #[test]
    fn weekend_trip_is_two_days() {
        let req = heuristic_parse("weekend getaway to goa");
        assert_eq!((req.end_date.unwrap() - req.start_date.unwrap()).num_days(), 1);
    }

    #[tokio::test]
    async fn route_after_intent_sends_unresolved_destination_to_recommender() {
        let node = RouteAfterIntentNode::new();
        let state = PlannerState::new("s", "u", "plan something fun");
        let outcome = node.run(&state).await.unwrap();
        match outcome.route {
            wayfare_runtime::Route::Node(next) => assert_eq!(next, "destination_recommender"),
            _ => panic!("expected Route::Node"),
        }
    }

    #[tokio::test]
    async fn route_after_intent_with_resolved_destination_goes_to_search() {
        let node = RouteAfterIntentNode::new();
        let mut state = PlannerState::new("s", "u", "q");
        state.trip_request = Some(heuristic_parse("trip to goa"));
        let outcome = node.run(&state).await.unwrap();
        match outcome.route {
            wayfare_runtime::Route::Node(next) => assert_eq!(next, "search_dispatcher"),
            _ => panic!("expected Route::Node"),
        }
    }
}
