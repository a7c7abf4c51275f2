//! `PlannerState`: the single record threaded through the graph, plus the
//! per-field reducers used to merge a node's partial output back in.
//!
//! Two reducer shapes exist, both applied directly in [`PlannerState::apply`]:
//! `Overwrite` (last writer wins within one merge) and dedup-append
//! (concatenate then dedup — by candidate id/name/title for most
//! collections via [`crate::candidate::dedup_key_for_value`], by
//! `(agent_name, action, result_summary)` for `agent_decisions`, and by
//! string equality for the plain string logs). Both shapes are
//! associative and commutative over their dedup key, which is what lets
//! concurrent fan-out branches merge regardless of completion order.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::candidate::{dedup_key_for_value, Activity, Stay, Transport};
use crate::decision::AgentDecision;
use crate::negotiation::{BundleChoice, WhatIfEntry};
use crate::trip::{BudgetTracker, Trip, TripRequest, VibeScore};

fn dedup_append<T: Serialize + for<'de> Deserialize<'de> + Clone>(
    existing: &mut Vec<T>,
    incoming: Vec<T>,
) {
    let mut seen: std::collections::HashSet<String> = existing
        .iter()
        .map(|item| dedup_key_for_value(&serde_json::to_value(item).unwrap_or(Value::Null)))
        .collect();
    for item in incoming {
        let key = dedup_key_for_value(&serde_json::to_value(&item).unwrap_or(Value::Null));
        if seen.insert(key) {
            existing.push(item);
        }
    }
}

/// `AgentDecision` carries no `id`/`name`/`title`, so [`dedup_append`]'s
/// generic full-JSON fallback would key on `created_at` too and never
/// collide between logically-identical decisions. Key on the fields that
/// actually identify a decision instead.
fn dedup_append_decisions(existing: &mut Vec<AgentDecision>, incoming: Vec<AgentDecision>) {
    let mut seen: std::collections::HashSet<(String, String, String)> = existing
        .iter()
        .map(|d| (d.agent_name.clone(), d.action.clone(), d.result_summary.clone()))
        .collect();
    for item in incoming {
        let key = (item.agent_name.clone(), item.action.clone(), item.result_summary.clone());
        if seen.insert(key) {
            existing.push(item);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    Plan,
    Modify,
    Conversation,
}

impl Default for IntentType {
    fn default() -> Self {
        IntentType::Plan
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlannerState {
    pub session_id: String,
    pub user_id: String,
    pub raw_query: String,

    #[serde(default)]
    pub trip_request: Option<TripRequest>,
    #[serde(default)]
    pub intent_type: IntentType,
    #[serde(default = "default_stage")]
    pub current_stage: String,
    #[serde(default)]
    pub active_agents: Vec<String>,

    #[serde(default)]
    pub flight_options: Vec<Transport>,
    #[serde(default)]
    pub ground_transport_options: Vec<Transport>,
    #[serde(default)]
    pub hotel_options: Vec<Stay>,
    #[serde(default)]
    pub activity_options: Vec<Activity>,

    #[serde(default)]
    pub weather: Option<Value>,
    #[serde(default)]
    pub local_tips: Vec<Value>,
    #[serde(default)]
    pub hidden_gems: Vec<Value>,
    #[serde(default)]
    pub events: Vec<Value>,

    #[serde(default)]
    pub selected_outbound_flight: Option<Transport>,
    #[serde(default)]
    pub selected_return_flight: Option<Transport>,
    #[serde(default)]
    pub selected_hotel: Option<Stay>,
    #[serde(default)]
    pub selected_activities: Vec<Activity>,

    #[serde(default)]
    pub bundles: Vec<BundleChoice>,
    #[serde(default)]
    pub selected_bundle_id: Option<String>,
    #[serde(default)]
    pub what_if_delta: i64,
    #[serde(default)]
    pub what_if_history: Vec<WhatIfEntry>,
    #[serde(default)]
    pub negotiator_cache_key: Option<String>,

    #[serde(default)]
    pub budget_tracker: Option<BudgetTracker>,

    #[serde(default)]
    pub trip: Option<Trip>,
    #[serde(default)]
    pub vibe_score: Option<VibeScore>,

    #[serde(default)]
    pub requires_approval: bool,
    #[serde(default)]
    pub approval_type: Option<String>,
    #[serde(default)]
    pub user_feedback: Option<String>,
    #[serde(default)]
    pub is_replanning: bool,

    #[serde(default)]
    pub agent_decisions: Vec<AgentDecision>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub budget_warnings: Vec<String>,
    #[serde(default)]
    pub validation_issues: Vec<String>,
    #[serde(default)]
    pub negotiation_log: Vec<String>,
    #[serde(default)]
    pub feasibility_issues: Vec<String>,

    #[serde(default)]
    pub destination_options: Vec<Value>,
    #[serde(default)]
    pub conversation_response: Option<String>,
}

fn default_stage() -> String {
    "start".to_string()
}

impl PlannerState {
    pub fn new(session_id: impl Into<String>, user_id: impl Into<String>, raw_query: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: user_id.into(),
            raw_query: raw_query.into(),
            current_stage: default_stage(),
            ..Default::default()
        }
    }

    /// Merges a partial-state patch produced by a node into `self`,
    /// applying each field's reducer directly — the scheduler's only
    /// merge path, invoked once per completed node via `state.apply(patch)`.
    pub fn apply(&mut self, patch: PlannerStatePatch) {
        if let Some(v) = patch.trip_request {
            self.trip_request = Some(v);
        }
        if let Some(v) = patch.intent_type {
            self.intent_type = v;
        }
        if let Some(v) = patch.current_stage {
            self.current_stage = v;
        }
        if let Some(v) = patch.active_agents {
            self.active_agents = v;
        }
        if let Some(v) = patch.flight_options {
            dedup_append(&mut self.flight_options, v);
        }
        if let Some(v) = patch.ground_transport_options {
            dedup_append(&mut self.ground_transport_options, v);
        }
        if let Some(v) = patch.hotel_options {
            dedup_append(&mut self.hotel_options, v);
        }
        if let Some(v) = patch.activity_options {
            dedup_append(&mut self.activity_options, v);
        }
        if let Some(v) = patch.weather {
            self.weather = Some(v);
        }
        if let Some(v) = patch.local_tips {
            dedup_append(&mut self.local_tips, v);
        }
        if let Some(v) = patch.hidden_gems {
            dedup_append(&mut self.hidden_gems, v);
        }
        if let Some(v) = patch.events {
            dedup_append(&mut self.events, v);
        }
        if let Some(v) = patch.selected_outbound_flight {
            self.selected_outbound_flight = Some(v);
        }
        if let Some(v) = patch.selected_return_flight {
            self.selected_return_flight = Some(v);
        }
        if let Some(v) = patch.selected_hotel {
            self.selected_hotel = Some(v);
        }
        if let Some(v) = patch.selected_activities {
            self.selected_activities = v;
        }
        if let Some(v) = patch.bundles {
            self.bundles = v;
        }
        if let Some(v) = patch.selected_bundle_id {
            self.selected_bundle_id = Some(v);
        }
        if let Some(v) = patch.what_if_delta {
            self.what_if_delta = v;
        }
        if let Some(v) = patch.what_if_history {
            self.what_if_history.extend(v);
        }
        if let Some(v) = patch.negotiator_cache_key {
            self.negotiator_cache_key = v;
        }
        if let Some(v) = patch.budget_tracker {
            self.budget_tracker = Some(v);
        }
        if let Some(v) = patch.trip {
            self.trip = Some(v);
        }
        if let Some(v) = patch.vibe_score {
            self.vibe_score = Some(v);
        }
        if let Some(v) = patch.requires_approval {
            self.requires_approval = v;
        }
        if let Some(v) = patch.approval_type {
            self.approval_type = v;
        }
        if let Some(v) = patch.user_feedback {
            self.user_feedback = v;
        }
        if let Some(v) = patch.is_replanning {
            self.is_replanning = v;
        }
        if let Some(v) = patch.agent_decisions {
            dedup_append_decisions(&mut self.agent_decisions, v);
        }
        if let Some(v) = patch.errors {
            for e in v {
                if !self.errors.contains(&e) {
                    self.errors.push(e);
                }
            }
        }
        if let Some(v) = patch.budget_warnings {
            for w in v {
                if !self.budget_warnings.contains(&w) {
                    self.budget_warnings.push(w);
                }
            }
        }
        if let Some(v) = patch.validation_issues {
            for w in v {
                if !self.validation_issues.contains(&w) {
                    self.validation_issues.push(w);
                }
            }
        }
        if let Some(v) = patch.negotiation_log {
            self.negotiation_log.extend(v);
        }
        if let Some(v) = patch.feasibility_issues {
            for w in v {
                if !self.feasibility_issues.contains(&w) {
                    self.feasibility_issues.push(w);
                }
            }
        }
        if let Some(v) = patch.destination_options {
            self.destination_options = v;
        }
        if let Some(v) = patch.conversation_response {
            self.conversation_response = v;
        }
    }
}

/// A partial update to [`PlannerState`], the return type of every graph
/// node. Every field is optional: a node returns only what it touched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlannerStatePatch {
    pub trip_request: Option<TripRequest>,
    pub intent_type: Option<IntentType>,
    pub current_stage: Option<String>,
    pub active_agents: Option<Vec<String>>,
    pub flight_options: Option<Vec<Transport>>,
    pub ground_transport_options: Option<Vec<Transport>>,
    pub hotel_options: Option<Vec<Stay>>,
    pub activity_options: Option<Vec<Activity>>,
    pub weather: Option<Value>,
    pub local_tips: Option<Vec<Value>>,
    pub hidden_gems: Option<Vec<Value>>,
    pub events: Option<Vec<Value>>,
    pub selected_outbound_flight: Option<Transport>,
    pub selected_return_flight: Option<Transport>,
    pub selected_hotel: Option<Stay>,
    pub selected_activities: Option<Vec<Activity>>,
    pub bundles: Option<Vec<BundleChoice>>,
    pub selected_bundle_id: Option<String>,
    pub what_if_delta: Option<i64>,
    pub what_if_history: Option<Vec<WhatIfEntry>>,
    pub negotiator_cache_key: Option<Option<String>>,
    pub budget_tracker: Option<BudgetTracker>,
    pub trip: Option<Trip>,
    pub vibe_score: Option<VibeScore>,
    pub requires_approval: Option<bool>,
    pub approval_type: Option<Option<String>>,
    pub user_feedback: Option<Option<String>>,
    pub is_replanning: Option<bool>,
    pub agent_decisions: Option<Vec<AgentDecision>>,
    pub errors: Option<Vec<String>>,
    pub budget_warnings: Option<Vec<String>>,
    pub validation_issues: Option<Vec<String>>,
    pub negotiation_log: Option<Vec<String>>,
    pub feasibility_issues: Option<Vec<String>>,
    pub destination_options: Option<Vec<Value>>,
    pub conversation_response: Option<Option<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flight(id: &str, price: f64) -> Transport {
        Transport {
            id: id.to_string(),
            name: format!("flight-{id}"),
            transport_type: crate::candidate::TransportType::Flight,
            operator: "Air".to_string(),
            total_price: price,
            currency: "INR".to_string(),
            duration_minutes: 90,
            transfers: 0,
            rating: 4.0,
            booking_url: None,
            source_origin: crate::candidate::SourceOrigin::Api,
            verified: false,
        }
    }

    #[test]
    fn dedup_append_is_commutative() {
        let mut a = PlannerState::new("s", "u", "q");
        let mut b = PlannerState::new("s", "u", "q");

        let p1 = vec![flight("f1", 100.0), flight("f2", 200.0)];
        let p2 = vec![flight("f2", 200.0), flight("f3", 300.0)];

        a.apply(PlannerStatePatch {
            flight_options: Some(p1.clone()),
            ..Default::default()
        });
        a.apply(PlannerStatePatch {
            flight_options: Some(p2.clone()),
            ..Default::default()
        });

        b.apply(PlannerStatePatch {
            flight_options: Some(p2),
            ..Default::default()
        });
        b.apply(PlannerStatePatch {
            flight_options: Some(p1),
            ..Default::default()
        });

        let ids_a: std::collections::HashSet<_> = a.flight_options.iter().map(|t| t.id.clone()).collect();
        let ids_b: std::collections::HashSet<_> = b.flight_options.iter().map(|t| t.id.clone()).collect();
        assert_eq!(ids_a, ids_b);
        assert_eq!(a.flight_options.len(), 3);
        assert_eq!(b.flight_options.len(), 3);
    }

    #[test]
    fn overwrite_reducer_uses_last_writer() {
        let mut s = PlannerState::new("s", "u", "q");
        s.apply(PlannerStatePatch {
            current_stage: Some("searching".to_string()),
            ..Default::default()
        });
        s.apply(PlannerStatePatch {
            current_stage: Some("search_done".to_string()),
            ..Default::default()
        });
        assert_eq!(s.current_stage, "search_done");
    }

    #[test]
    fn agent_decisions_dedup_ignores_created_at_timestamp() {
        let mut s = PlannerState::new("s", "u", "q");
        let first = AgentDecision::new("flight_search", "search", "looked for flights", "found 3 options");
        // A logically-identical decision stamped a moment later must still
        // collide, even though `created_at` differs.
        let second = AgentDecision::new("flight_search", "search", "looked for flights", "found 3 options");
        s.apply(PlannerStatePatch {
            agent_decisions: Some(vec![first]),
            ..Default::default()
        });
        s.apply(PlannerStatePatch {
            agent_decisions: Some(vec![second]),
            ..Default::default()
        });
        assert_eq!(s.agent_decisions.len(), 1);
    }

    #[test]
    fn agent_decisions_with_different_summaries_both_survive() {
        let mut s = PlannerState::new("s", "u", "q");
        s.apply(PlannerStatePatch {
            agent_decisions: Some(vec![
                AgentDecision::new("flight_search", "search", "r1", "found 3 options"),
                AgentDecision::new("flight_search", "search", "r2", "found 5 options"),
            ]),
            ..Default::default()
        });
        assert_eq!(s.agent_decisions.len(), 2);
    }
}
