//! The three small LLM-templated responders with no further branching,
//! folded into one module: `ClarificationNode`, `ConversationHandlerNode`,
//! and `FeedbackHandlerNode`.

use async_trait::async_trait;
use wayfare_providers::{ChatMessage, LlmClient};
use wayfare_runtime::{GraphNode, NodeOutcome};
use wayfare_types::{AgentDecision, PlannerState, PlannerStatePatch};

/// Raises an approval gate asking the user to clarify an ambiguous
/// request: no LLM call, just a flag flip.
pub struct ClarificationNode;

impl ClarificationNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ClarificationNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphNode for ClarificationNode {
    fn name(&self) -> &str {
        "clarification"
    }

    async fn run(&self, _state: &PlannerState) -> anyhow::Result<NodeOutcome> {
        let decision = AgentDecision::new(
            "clarification",
            "request_clarification",
            "Query was too ambiguous to parse a destination or intent.",
            "Awaiting clarification".to_string(),
        );
        let patch = PlannerStatePatch {
            requires_approval: Some(true),
            approval_type: Some(Some("clarification".to_string())),
            current_stage: Some("clarification".to_string()),
            agent_decisions: Some(vec![decision]),
            ..Default::default()
        };
        Ok(NodeOutcome::end(patch))
    }
}

const CONVERSATION_SYSTEM_PROMPT: &str = "You answer a traveler's question about their already-planned \
India trip. Use the trip summary provided. Be concise and specific; if the answer isn't in the summary, \
say so honestly rather than guessing.";

pub struct ConversationHandlerNode {
    llm: LlmClient,
}

impl ConversationHandlerNode {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    fn trip_summary(state: &PlannerState) -> String {
        match &state.trip {
            Some(trip) => format!(
                "Destination: {}. {} days. Total cost ₹{:.0}. {} itinerary items.",
                trip.destination,
                trip.duration_days,
                trip.total_cost,
                trip.items.len()
            ),
            None => "No trip has been planned yet.".to_string(),
        }
    }
}

#[async_trait]
impl GraphNode for ConversationHandlerNode {
    fn name(&self) -> &str {
        "conversation_handler"
    }

    async fn run(&self, state: &PlannerState) -> anyhow::Result<NodeOutcome> {
        let question = state.user_feedback.clone().unwrap_or_else(|| state.raw_query.clone());
        let summary = Self::trip_summary(state);

        let response = if self.llm.is_configured() {
            let user = format!("Trip summary: {summary}\n\nQuestion: {question}");
            self.llm
                .complete(&[ChatMessage::system(CONVERSATION_SYSTEM_PROMPT), ChatMessage::user(user)], false)
                .await
        } else {
            None
        };
        let response = response.unwrap_or_else(|| {
            format!("Here's what I have so far: {summary} Ask me something more specific and I'll do my best.")
        });

        let decision = AgentDecision::new("conversation_handler", "answer_question", "Answered a question about the existing trip.", "Responded".to_string());
        let patch = PlannerStatePatch {
            conversation_response: Some(Some(response)),
            current_stage: Some("conversation_done".to_string()),
            agent_decisions: Some(vec![decision]),
            ..Default::default()
        };
        Ok(NodeOutcome::end(patch))
    }
}

const FEEDBACK_SYSTEM_PROMPT: &str = "Classify what a traveler wants changed about their itinerary. \
Return ONLY JSON: {\"change_type\": str, \"agents_to_rerun\": [str, ...]}. Valid agent names: \
flight_search, hotel_search, activity_search, budget_optimizer, itinerary_builder, vibe_scorer.";

pub struct FeedbackHandlerNode {
    llm: LlmClient,
}

impl FeedbackHandlerNode {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    async fn classify(&self, feedback: &str) -> Vec<String> {
        if self.llm.is_configured() {
            let user = format!("Feedback: \"{feedback}\"\n\nClassify now.");
            if let Some(raw) = self
                .llm
                .complete(&[ChatMessage::system(FEEDBACK_SYSTEM_PROMPT), ChatMessage::user(user)], true)
                .await
            {
                if let Some(parsed) = wayfare_providers::lenient_parse_json(&raw) {
                    if let Some(agents) = parsed.get("agents_to_rerun").and_then(|v| v.as_array()) {
                        let agents: Vec<String> = agents.iter().filter_map(|v| v.as_str().map(String::from)).collect();
                        if !agents.is_empty() {
                            return agents;
                        }
                    }
                }
            }
        }
        heuristic_agents_for(feedback)
    }
}

fn heuristic_agents_for(feedback: &str) -> Vec<String> {
    let lower = feedback.to_lowercase();
    if lower.contains("hotel") || lower.contains("stay") || lower.contains("accommodation") {
        vec!["hotel_search".to_string(), "budget_optimizer".to_string(), "itinerary_builder".to_string()]
    } else if lower.contains("flight") || lower.contains("transport") || lower.contains("bus") || lower.contains("train") {
        vec!["flight_search".to_string(), "budget_optimizer".to_string(), "itinerary_builder".to_string()]
    } else if lower.contains("activity") || lower.contains("adventure") || lower.contains("more") || lower.contains("add") {
        vec!["activity_search".to_string(), "budget_optimizer".to_string(), "itinerary_builder".to_string()]
    } else if lower.contains("budget") || lower.contains("cheap") || lower.contains("expensive") || lower.contains("cost") {
        vec!["budget_optimizer".to_string(), "itinerary_builder".to_string()]
    } else if lower.contains("delay") || lower.contains("cancel") || lower.contains("disrupt") {
        vec!["itinerary_builder".to_string(), "vibe_scorer".to_string()]
    } else {
        vec!["itinerary_builder".to_string()]
    }
}

#[async_trait]
impl GraphNode for FeedbackHandlerNode {
    fn name(&self) -> &str {
        "feedback_handler"
    }

    async fn run(&self, state: &PlannerState) -> anyhow::Result<NodeOutcome> {
        let feedback = state.user_feedback.clone().unwrap_or_else(|| state.raw_query.clone());
        let agents = self.classify(&feedback).await;

        let decision = AgentDecision::new(
            "feedback_handler",
            "classify_feedback",
            format!("Classified feedback: \"{feedback}\""),
            format!("Re-running: {}", agents.join(", ")),
        );
        let patch = PlannerStatePatch {
            active_agents: Some(agents),
            is_replanning: Some(true),
            current_stage: Some("feedback_classified".to_string()),
            agent_decisions: Some(vec![decision]),
            ..Default::default()
        };
        Ok(NodeOutcome::end(patch))
    }
}
