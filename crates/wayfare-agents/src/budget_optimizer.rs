//! Picks one flight, one hotel, and a handful of activities out of the
//! search results, then allocates the stated budget across categories:
//! LLM-driven selection indices with a default percentage split, falling
//! back to "first available of each" when the LLM is unconfigured or its
//! response can't be parsed.

use async_trait::async_trait;
use wayfare_providers::{ChatMessage, LlmClient};
use wayfare_runtime::{GraphNode, NodeOutcome};
use wayfare_types::{AgentDecision, BudgetTracker, PlannerState, PlannerStatePatch};

const DEFAULT_SPLIT: [(&str, f64); 5] = [
    ("transport", 0.30),
    ("accommodation", 0.35),
    ("activities", 0.20),
    ("meals", 0.10),
    ("misc", 0.05),
];

const LLM_SYSTEM_PROMPT: &str = "You are optimizing a travel budget. Given numbered transport, hotel, \
and activity options with prices, pick the best combination that fits within budget while maximizing \
value. Return ONLY JSON: {\"transport_index\": n, \"hotel_index\": n, \"activity_indices\": [n, ...]}. \
Indices refer to the order options were listed, zero-based. Pick at most 4 activities.";

pub struct BudgetOptimizerNode {
    llm: LlmClient,
}

impl BudgetOptimizerNode {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl GraphNode for BudgetOptimizerNode {
    fn name(&self) -> &str {
        "budget_optimizer"
    }

    async fn run(&self, state: &PlannerState) -> anyhow::Result<NodeOutcome> {
        let budget = state.trip_request.as_ref().and_then(|r| r.budget).unwrap_or(0) as f64;

        let transports: Vec<_> = state
            .flight_options
            .iter()
            .cloned()
            .chain(state.ground_transport_options.iter().cloned())
            .collect();

        let mut reasoning = Vec::new();
        let selection = self.select(state, &transports).await;
        if selection.via_llm {
            reasoning.push("LLM selected transport/hotel/activities.".to_string());
        } else {
            reasoning.push("Heuristic fallback: first available of each category.".to_string());
        }

        let selected_outbound_flight = selection.transport_index.and_then(|i| transports.get(i).cloned());
        let selected_hotel = selection.hotel_index.and_then(|i| state.hotel_options.get(i).cloned());
        let selected_activities: Vec<_> = selection
            .activity_indices
            .iter()
            .filter_map(|&i| state.activity_options.get(i).cloned())
            .collect();

        let spent_transport = selected_outbound_flight.as_ref().map(|t| t.total_price).unwrap_or(0.0);
        let spent_accommodation = selected_hotel.as_ref().map(|h| h.total_price).unwrap_or(0.0);
        let spent_activities: f64 = selected_activities.iter().map(|a| a.price).sum();

        let mut allocated = std::collections::HashMap::new();
        for (category, pct) in DEFAULT_SPLIT {
            allocated.insert(category.to_string(), budget * pct);
        }
        let mut spent = std::collections::HashMap::new();
        spent.insert("transport".to_string(), spent_transport);
        spent.insert("accommodation".to_string(), spent_accommodation);
        spent.insert("activities".to_string(), spent_activities);

        let total_spent = spent_transport + spent_accommodation + spent_activities;
        let mut warnings = Vec::new();
        if budget > 0.0 && total_spent > budget {
            warnings.push(format!(
                "Selected options total ₹{total_spent:.0}, which is over the ₹{budget:.0} budget."
            ));
        }

        let tracker = BudgetTracker { allocated, spent, warnings: warnings.clone() };

        let summary = format!(
            "Selected transport={}, hotel={}, {} activities. Spend ₹{total_spent:.0} of ₹{budget:.0}.",
            selected_outbound_flight.is_some(),
            selected_hotel.is_some(),
            selected_activities.len()
        );
        let decision = AgentDecision::new("budget_optimizer", "optimize_budget", reasoning.join(" "), summary);

        let patch = PlannerStatePatch {
            selected_outbound_flight,
            selected_hotel,
            selected_activities: Some(selected_activities),
            budget_tracker: Some(tracker),
            budget_warnings: Some(warnings),
            current_stage: Some("budget_optimized".to_string()),
            agent_decisions: Some(vec![decision]),
            ..Default::default()
        };
        Ok(NodeOutcome::next(patch, "itinerary_builder"))
    }
}

struct Selection {
    transport_index: Option<usize>,
    hotel_index: Option<usize>,
    activity_indices: Vec<usize>,
    via_llm: bool,
}

impl BudgetOptimizerNode {
    async fn select(&self, state: &PlannerState, transports: &[wayfare_types::Transport]) -> Selection {
        if self.llm.is_configured() {
            if let Some(sel) = self.llm_select(state, transports).await {
                return sel;
            }
        }
        Selection {
            transport_index: if transports.is_empty() { None } else { Some(0) },
            hotel_index: if state.hotel_options.is_empty() { None } else { Some(0) },
            activity_indices: (0..state.activity_options.len().min(4)).collect(),
            via_llm: false,
        }
    }

    async fn llm_select(&self, state: &PlannerState, transports: &[wayfare_types::Transport]) -> Option<Selection> {
        let transport_lines: Vec<String> = transports
            .iter()
            .enumerate()
            .map(|(i, t)| format!("{i}: {} — ₹{:.0}", t.name, t.total_price))
            .collect();
        let hotel_lines: Vec<String> = state
            .hotel_options
            .iter()
            .enumerate()
            .map(|(i, h)| format!("{i}: {} — ₹{:.0}/night", h.name, h.price_per_night))
            .collect();
        let activity_lines: Vec<String> = state
            .activity_options
            .iter()
            .enumerate()
            .map(|(i, a)| format!("{i}: {} — ₹{:.0}", a.name, a.price))
            .collect();

        let budget = state.trip_request.as_ref().and_then(|r| r.budget).unwrap_or(0);
        let user = format!(
            "Budget: ₹{budget}\n\nTransport options:\n{}\n\nHotel options:\n{}\n\nActivity options:\n{}\n\nSelect now.",
            transport_lines.join("\n"),
            hotel_lines.join("\n"),
            activity_lines.join("\n"),
        );

        let raw = self
            .llm
            .complete(&[ChatMessage::system(LLM_SYSTEM_PROMPT), ChatMessage::user(user)], true)
            .await?;
        let parsed = wayfare_providers::lenient_parse_json(&raw)?;

        let transport_index = parsed.get("transport_index").and_then(|v| v.as_u64()).map(|v| v as usize);
        let hotel_index = parsed.get("hotel_index").and_then(|v| v.as_u64()).map(|v| v as usize);
        let activity_indices = parsed
            .get("activity_indices")
            .and_then(|v| v.as_array())
            .map(|a| a.iter().filter_map(|v| v.as_u64().map(|n| n as usize)).collect())
            .unwrap_or_default();

        Some(Selection { transport_index, hotel_index, activity_indices, via_llm: true })
    }
}
