//! Builds the day-by-day [`Trip`] from everything gathered so far: an
//! LLM call produces the raw day plan, and each activity item is then
//! cross-checked against `selected_activities` to correct its cost and
//! mark it verified. Richer per-item fields (lat/lng, travel_mode,
//! contact info) have no counterpart in the already-settled
//! `ItineraryItem` shape used elsewhere in this crate set — they're
//! folded into `notes` as short text rather than expanding that type.

use async_trait::async_trait;
use wayfare_providers::{ChatMessage, LlmClient};
use wayfare_runtime::{GraphNode, NodeOutcome};
use wayfare_types::{AgentDecision, ItineraryItem, PlannerState, PlannerStatePatch, Trip};

const LLM_SYSTEM_PROMPT: &str = "You are building a day-by-day India travel itinerary. You will be given \
the destination, dates, travel style, interests, booked hotel, booked transport mode, available \
activities, weather, local events, and tips. Return ONLY a JSON array of day objects: \
[{\"day\": 1, \"items\": [{\"name\": str, \"category\": \"activity\"|\"meal\"|\"transport\"|\"hotel\"|\"free_time\", \
\"cost\": number, \"start_time\": \"HH:MM\", \"notes\": str}]}]. Use the booked transport mode for the \
main journey — never invent a different mode. Keep day 1 light (arrival) and the last day light \
(checkout). Include realistic meal costs and at least one free-time slot per day.";

pub struct ItineraryBuilderNode {
    llm: LlmClient,
}

impl ItineraryBuilderNode {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl GraphNode for ItineraryBuilderNode {
    fn name(&self) -> &str {
        "itinerary_builder"
    }

    async fn run(&self, state: &PlannerState) -> anyhow::Result<NodeOutcome> {
        let Some(request) = &state.trip_request else {
            return Ok(skip("No trip request available."));
        };
        let Some(destination) = request.destination.clone() else {
            return Ok(skip("Destination not yet resolved."));
        };

        let mut reasoning = Vec::new();
        let modification = if state.is_replanning { state.user_feedback.clone() } else { None };

        let raw_days = self.llm_build_days(state, request, &destination, modification.as_deref()).await;
        if raw_days.is_none() {
            reasoning.push("LLM itinerary generation failed or returned nothing — zero days produced.".to_string());
        }
        let raw_days = raw_days.unwrap_or_default();

        let duration_days = request.duration_days().max(1);
        let mut items = Vec::new();
        let mut verified_count = 0;
        let mut unverified_count = 0;

        for raw_day in &raw_days {
            let Some(day_num) = raw_day.get("day").and_then(|v| v.as_u64()) else { continue };
            let Some(raw_items) = raw_day.get("items").and_then(|v| v.as_array()) else { continue };
            for raw_item in raw_items {
                let Some(name) = raw_item.get("name").and_then(|v| v.as_str()) else { continue };
                let category = raw_item.get("category").and_then(|v| v.as_str()).unwrap_or("activity");
                let raw_cost = raw_item.get("cost").and_then(|v| v.as_f64()).unwrap_or(0.0);

                let (verified, cost, notes) = if category == "activity" {
                    match find_matching_activity(&state.selected_activities, name) {
                        Some(activity) => {
                            verified_count += 1;
                            (true, activity.price, Some(format!("Verified against {}", activity.name)))
                        }
                        None => {
                            unverified_count += 1;
                            (false, raw_cost, None)
                        }
                    }
                } else {
                    (false, raw_cost, None)
                };

                items.push(ItineraryItem {
                    day: day_num as u32,
                    name: name.to_string(),
                    category: category.to_string(),
                    cost,
                    verified,
                    start_time: raw_item.get("start_time").and_then(|v| v.as_str()).map(String::from),
                    notes: notes.or_else(|| raw_item.get("notes").and_then(|v| v.as_str()).map(String::from)),
                });
            }
        }

        if verified_count + unverified_count > 0 {
            reasoning.push(format!("{verified_count} activities verified, {unverified_count} unverified."));
        }

        let total_cost: f64 = items.iter().map(|i| i.cost).sum();
        let trip = Trip { destination: destination.clone(), duration_days, items, total_cost };

        let summary = format!("Built {}-day itinerary with {} item(s), total ₹{total_cost:.0}.", trip.duration_days, trip.items.len());
        let decision = AgentDecision::new("itinerary_builder", "build_itinerary", reasoning.join(" "), summary);

        let patch = PlannerStatePatch {
            trip: Some(trip),
            current_stage: Some("itinerary_built".to_string()),
            agent_decisions: Some(vec![decision]),
            ..Default::default()
        };
        Ok(NodeOutcome::next(patch, "response_validator"))
    }
}

impl ItineraryBuilderNode {
    async fn llm_build_days(
        &self,
        state: &PlannerState,
        request: &wayfare_types::TripRequest,
        destination: &str,
        modification: Option<&str>,
    ) -> Option<Vec<serde_json::Value>> {
        if !self.llm.is_configured() {
            return None;
        }

        let transport_mode = describe_transport_mode(state);
        let hotel_line = state
            .selected_hotel
            .as_ref()
            .map(|h| format!("{} (₹{:.0}/night)", h.name, h.price_per_night))
            .unwrap_or_else(|| "No hotel booked".to_string());
        let activity_lines: Vec<String> = state
            .selected_activities
            .iter()
            .take(12)
            .map(|a| format!("- {} (₹{:.0}, {}h)", a.name, a.price, a.duration_hours))
            .collect();

        let mut user = format!(
            "Destination: {destination}\nOrigin: {}\nDuration: {} days\nTravel style: {}\nInterests: {}\n\
Booked hotel: {hotel_line}\nBooked transport mode: {transport_mode}\n\nAvailable activities:\n{}",
            request.origin.clone().unwrap_or_default(),
            request.duration_days(),
            request.travel_style.clone().unwrap_or_else(|| "balanced".to_string()),
            request.interests.join(", "),
            activity_lines.join("\n"),
        );
        if let Some(modification) = modification {
            user.push_str(&format!(
                "\n\nUSER MODIFICATION REQUEST: {modification}\nThis takes priority over all other instructions."
            ));
        }

        let raw = self
            .llm
            .complete(&[ChatMessage::system(LLM_SYSTEM_PROMPT), ChatMessage::user(user)], false)
            .await?;
        let parsed = wayfare_providers::lenient_parse_json(&raw)?;
        parsed.as_array().cloned()
    }
}

fn describe_transport_mode(state: &PlannerState) -> &'static str {
    let Some(flight) = &state.selected_outbound_flight else {
        return "unknown";
    };
    use wayfare_types::TransportType;
    match flight.transport_type {
        TransportType::Train => "train",
        TransportType::Bus => "bus",
        TransportType::Cab | TransportType::Auto => "cab",
        TransportType::Flight => "flight",
    }
}

fn find_matching_activity<'a>(activities: &'a [wayfare_types::Activity], name: &str) -> Option<&'a wayfare_types::Activity> {
    let target = normalize(name);
    activities
        .iter()
        .find(|a| normalize(&a.name) == target)
        .or_else(|| activities.iter().find(|a| normalize(&a.name).contains(&target) || target.contains(&normalize(&a.name))))
}

fn normalize(name: &str) -> String {
    name.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

fn skip(reason: &str) -> NodeOutcome {
    let decision = AgentDecision::new("itinerary_builder", "skip", reason.to_string(), "Skipped".to_string());
    let patch = PlannerStatePatch {
        current_stage: Some("itinerary_built".to_string()),
        agent_decisions: Some(vec![decision]),
        ..Default::default()
    };
    NodeOutcome::next(patch, "response_validator")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use wayfare_cache::CacheClient;

    fn test_cache() -> Arc<CacheClient> {
        Arc::new(CacheClient::in_memory())
    }
    use wayfare_types::{Activity, SourceOrigin};

    #[test]
    fn find_matching_activity_allows_substring_match() {
        let activities = vec![Activity {
            id: "a1".into(),
            name: "Amer Fort Heritage Tour".into(),
            category: "sightseeing".into(),
            duration_hours: 2.0,
            price: 400.0,
            lat: 0.0,
            lng: 0.0,
            opening_hours: None,
            phone: None,
            rating: 4.5,
            source_origin: SourceOrigin::Api,
            verified: true,
        }];
        let found = find_matching_activity(&activities, "Amer Fort");
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn missing_destination_skips_cleanly() {
        let node = ItineraryBuilderNode::new(LlmClient::new(None, "https://example.invalid", "gpt-4o-mini", test_cache()));
        let mut state = PlannerState::new("s", "u", "q");
        state.trip_request = Some(wayfare_types::TripRequest {
            origin: Some("Delhi".into()),
            destination: None,
            start_date: None,
            end_date: None,
            budget: None,
            num_travelers: 1,
            travel_style: None,
            interests: vec![],
        });
        let outcome = node.run(&state).await.unwrap();
        assert!(outcome.patch.trip.is_none());
    }
}
