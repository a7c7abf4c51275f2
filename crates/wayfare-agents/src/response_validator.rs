//! Cross-checks the built itinerary against the search results it was
//! supposedly drawn from, flagging likely hallucinations, cost drift,
//! and budget overruns. Placed between `itinerary_builder` and
//! `vibe_scorer` since it needs the finished trip and should run before
//! the user-facing vibe score.

use async_trait::async_trait;
use wayfare_runtime::{GraphNode, NodeOutcome};
use wayfare_types::{Activity, AgentDecision, PlannerState, PlannerStatePatch};

/// Flag an itinerary line item whose cost exceeds the matched search
/// result's price by more than this multiple.
const COST_DRIFT_RATIO: f64 = 3.0;
/// Flag the overall trip once its total exceeds the stated budget by
/// more than this fraction.
const BUDGET_OVERRUN_THRESHOLD: f64 = 1.20;

pub struct ResponseValidatorNode;

impl ResponseValidatorNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ResponseValidatorNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphNode for ResponseValidatorNode {
    fn name(&self) -> &str {
        "response_validator"
    }

    async fn run(&self, state: &PlannerState) -> anyhow::Result<NodeOutcome> {
        let Some(trip) = &state.trip else {
            let decision = AgentDecision::new(
                "response_validator",
                "validate",
                "No itinerary present to validate.".to_string(),
                "Skipped".to_string(),
            );
            let patch = PlannerStatePatch {
                validation_issues: Some(vec!["No itinerary to validate.".to_string()]),
                current_stage: Some("validation_done".to_string()),
                agent_decisions: Some(vec![decision]),
                ..Default::default()
            };
            return Ok(NodeOutcome::next(patch, "vibe_scorer"));
        };

        let index = build_activity_index(&state.selected_activities);
        let mut issues = Vec::new();
        let mut warnings = Vec::new();
        let mut unmatched_count = 0;
        let mut drift_count = 0;

        for item in &trip.items {
            if item.cost < 0.0 {
                issues.push(format!("Item '{}' on day {} has a negative cost.", item.name, item.day));
                continue;
            }
            if item.category != "activity" {
                continue;
            }
            match index.get(&normalize(&item.name)).or_else(|| find_substring_match(&index, &item.name)) {
                Some(search_price) => {
                    if *search_price > 0.0 && item.cost > search_price * COST_DRIFT_RATIO {
                        drift_count += 1;
                        issues.push(format!(
                            "Item '{}' costs ₹{:.0} but the matching search result priced it at ₹{:.0}.",
                            item.name, item.cost, search_price
                        ));
                    }
                }
                None => {
                    if !state.selected_activities.is_empty() {
                        unmatched_count += 1;
                        issues.push(format!("Item '{}' does not match any searched activity — possible hallucination.", item.name));
                    }
                }
            }
        }

        let budget = state.trip_request.as_ref().and_then(|r| r.budget).unwrap_or(0) as f64;
        if budget > 0.0 && trip.total_cost > budget * BUDGET_OVERRUN_THRESHOLD {
            let msg = format!(
                "Itinerary total ₹{:.0} exceeds the ₹{budget:.0} budget by more than {:.0}%.",
                trip.total_cost,
                (BUDGET_OVERRUN_THRESHOLD - 1.0) * 100.0
            );
            issues.push(msg.clone());
            warnings.push(msg);
        }

        if unmatched_count > 0 {
            warnings.push(format!("{unmatched_count} itinerary item(s) could not be matched to a searched activity."));
        }
        if drift_count > 0 {
            warnings.push(format!("{drift_count} itinerary item(s) show cost drift versus search results."));
        }

        let summary = format!("{} issue(s) found.", issues.len());
        let decision = AgentDecision::new("response_validator", "validate", "Cross-checked itinerary against search results.", summary);

        let patch = PlannerStatePatch {
            validation_issues: Some(issues),
            budget_warnings: Some(warnings),
            current_stage: Some("validation_done".to_string()),
            agent_decisions: Some(vec![decision]),
            ..Default::default()
        };
        Ok(NodeOutcome::next(patch, "vibe_scorer"))
    }
}

fn build_activity_index(activities: &[Activity]) -> std::collections::HashMap<String, f64> {
    activities.iter().map(|a| (normalize(&a.name), a.price)).collect()
}

fn find_substring_match<'a>(index: &'a std::collections::HashMap<String, f64>, name: &str) -> Option<&'a f64> {
    let target = normalize(name);
    index.iter().find(|(key, _)| key.contains(&target) || target.contains(key.as_str())).map(|(_, price)| price)
}

fn normalize(name: &str) -> String {
    name.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfare_types::{ItineraryItem, SourceOrigin, Trip};

    fn activity(name: &str, price: f64) -> Activity {
        Activity {
            id: "a".into(),
            name: name.into(),
            category: "sightseeing".into(),
            duration_hours: 2.0,
            price,
            lat: 0.0,
            lng: 0.0,
            opening_hours: None,
            phone: None,
            rating: 4.0,
            source_origin: SourceOrigin::Api,
            verified: true,
        }
    }

    fn item(name: &str, category: &str, cost: f64) -> ItineraryItem {
        ItineraryItem {
            day: 1,
            name: name.into(),
            category: category.into(),
            cost,
            verified: false,
            start_time: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn cost_drift_is_flagged() {
        let node = ResponseValidatorNode::new();
        let mut state = PlannerState::new("s", "u", "q");
        state.selected_activities = vec![activity("Amer Fort Tour", 400.0)];
        state.trip = Some(Trip {
            destination: "Jaipur".into(),
            duration_days: 1,
            items: vec![item("Amer Fort Tour", "activity", 2000.0)],
            total_cost: 2000.0,
        });
        state.trip_request = Some(wayfare_types::TripRequest {
            origin: Some("Delhi".into()),
            destination: Some("Jaipur".into()),
            start_date: None,
            end_date: None,
            budget: Some(5000),
            num_travelers: 1,
            travel_style: None,
            interests: vec![],
        });

        let outcome = node.run(&state).await.unwrap();
        let issues = outcome.patch.validation_issues.unwrap();
        assert!(issues.iter().any(|i| i.contains("cost") || i.contains("priced it")));
    }

    #[tokio::test]
    async fn unmatched_activity_flagged_as_possible_hallucination() {
        let node = ResponseValidatorNode::new();
        let mut state = PlannerState::new("s", "u", "q");
        state.selected_activities = vec![activity("Amer Fort Tour", 400.0)];
        state.trip = Some(Trip {
            destination: "Jaipur".into(),
            duration_days: 1,
            items: vec![item("Invented Secret Garden", "activity", 300.0)],
            total_cost: 300.0,
        });

        let outcome = node.run(&state).await.unwrap();
        let issues = outcome.patch.validation_issues.unwrap();
        assert!(issues.iter().any(|i| i.contains("hallucination")));
    }

    #[tokio::test]
    async fn budget_overrun_flagged() {
        let node = ResponseValidatorNode::new();
        let mut state = PlannerState::new("s", "u", "q");
        state.trip = Some(Trip {
            destination: "Goa".into(),
            duration_days: 2,
            items: vec![item("Beach Shack Dinner", "meal", 5000.0)],
            total_cost: 13_000.0,
        });
        state.trip_request = Some(wayfare_types::TripRequest {
            origin: Some("Mumbai".into()),
            destination: Some("Goa".into()),
            start_date: None,
            end_date: None,
            budget: Some(10_000),
            num_travelers: 1,
            travel_style: None,
            interests: vec![],
        });

        let outcome = node.run(&state).await.unwrap();
        let warnings = outcome.patch.budget_warnings.unwrap();
        assert!(warnings.iter().any(|w| w.contains("exceeds")));
    }
}
