//! Entry node of every run: classifies the user's message into
//! `{plan, modify, conversation}` and sets `active_agents` for the rest
//! of the graph.

use async_trait::async_trait;
use wayfare_providers::{ChatMessage, LlmClient};
use wayfare_runtime::{GraphNode, NodeOutcome};
use wayfare_types::{AgentDecision, IntentType, PlannerState, PlannerStatePatch};

const SYSTEM_PROMPT: &str = "You are the router for a travel planning system. Classify the user's \
intent into exactly one of: \"plan\", \"modify\", \"conversation\". \"plan\" starts a new trip. \
\"modify\" changes an existing plan. \"conversation\" asks a question about an existing plan — prefer \
this over \"modify\" for when/where/what/how/why questions. Respond with JSON only: \
{\"intent_type\": \"plan\"|\"modify\"|\"conversation\", \"active_agents\": [...], \"reasoning\": \"...\"}.";

const DEFAULT_PLAN_AGENTS: &[&str] = &[
    "intent_parser",
    "flight_search",
    "hotel_search",
    "activity_search",
    "weather_check",
    "local_intel",
    "festival_check",
    "budget_optimizer",
    "itinerary_builder",
    "vibe_scorer",
];

pub struct SupervisorNode {
    llm: LlmClient,
}

impl SupervisorNode {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl GraphNode for SupervisorNode {
    fn name(&self) -> &str {
        "supervisor"
    }

    async fn run(&self, state: &PlannerState) -> anyhow::Result<NodeOutcome> {
        let message = state.user_feedback.clone().unwrap_or_else(|| state.raw_query.clone());
        let has_trip = state.trip.is_some();

        let (intent, active_agents, reasoning) = self.classify(&message, &state.current_stage, has_trip).await;

        let decision = AgentDecision::new(
            "supervisor",
            "classify_intent",
            reasoning,
            format!("{:?} -> {} agents", intent, active_agents.len()),
        );

        let patch = PlannerStatePatch {
            intent_type: Some(intent),
            active_agents: Some(active_agents),
            current_stage: Some("supervisor_done".to_string()),
            agent_decisions: Some(vec![decision]),
            ..Default::default()
        };

        let next = match intent {
            IntentType::Plan => "intent_parser",
            IntentType::Modify => "feedback_handler",
            IntentType::Conversation => "conversation_handler",
        };
        Ok(NodeOutcome::next(patch, next))
    }
}

impl SupervisorNode {
    async fn classify(&self, message: &str, current_stage: &str, has_trip: bool) -> (IntentType, Vec<String>, String) {
        if self.llm.is_configured() {
            let user = format!(
                "Current stage: {current_stage}\n\nUser message: \"{message}\"\n\nClassify the intent and respond with JSON."
            );
            if let Some(raw) = self
                .llm
                .complete(&[ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user)], true)
                .await
            {
                if let Some(parsed) = wayfare_providers::lenient_parse_json(&raw) {
                    let intent = parsed
                        .get("intent_type")
                        .and_then(|v| v.as_str())
                        .map(parse_intent)
                        .unwrap_or(IntentType::Plan);
                    let agents: Vec<String> = parsed
                        .get("active_agents")
                        .and_then(|v| v.as_array())
                        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(String::from)).collect())
                        .unwrap_or_else(|| default_agents_for(intent));
                    let reasoning = parsed
                        .get("reasoning")
                        .and_then(|v| v.as_str())
                        .unwrap_or("LLM classification")
                        .to_string();
                    return (intent, agents, reasoning);
                }
            }
        }

        let lower = message.to_lowercase();
        if has_trip && is_question(&lower) {
            return (
                IntentType::Conversation,
                vec![],
                "Heuristic: question detected with existing trip -> conversation".to_string(),
            );
        }
        if has_trip && is_modification(&lower) {
            return (
                IntentType::Modify,
                vec![],
                "Heuristic: modification keywords detected -> modify".to_string(),
            );
        }
        (
            IntentType::Plan,
            default_agents_for(IntentType::Plan),
            "Heuristic fallback -> plan".to_string(),
        )
    }
}

fn parse_intent(raw: &str) -> IntentType {
    match raw {
        "modify" => IntentType::Modify,
        "conversation" => IntentType::Conversation,
        _ => IntentType::Plan,
    }
}

fn default_agents_for(intent: IntentType) -> Vec<String> {
    match intent {
        IntentType::Plan => DEFAULT_PLAN_AGENTS.iter().map(|s| s.to_string()).collect(),
        _ => vec![],
    }
}

fn is_question(lower: &str) -> bool {
    ["what", "when", "where", "how much", "how", "tell me", "show me", "?"]
        .iter()
        .any(|q| lower.contains(q))
}

fn is_modification(lower: &str) -> bool {
    ["change", "modify", "update", "cheaper", "different", "remove", "add more"]
        .iter()
        .any(|w| lower.contains(w))
}
