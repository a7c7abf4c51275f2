//! Human-in-the-loop checkpoint. Routes the post-approval continuation
//! on the explicit `approval_type` set when the gate was first raised,
//! rather than substring-matching `current_stage` — stage names are
//! free text elsewhere in the graph and a substring match would be
//! fragile by construction (see DESIGN.md).

use async_trait::async_trait;
use wayfare_runtime::{GraphNode, NodeOutcome};
use wayfare_types::{AgentDecision, PlannerState, PlannerStatePatch};

pub struct ApprovalGateNode;

impl ApprovalGateNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ApprovalGateNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphNode for ApprovalGateNode {
    fn name(&self) -> &str {
        "approval_gate"
    }

    async fn run(&self, state: &PlannerState) -> anyhow::Result<NodeOutcome> {
        if state.requires_approval {
            return Ok(NodeOutcome::end(PlannerStatePatch::default()));
        }

        if let Some(approval_type) = state.approval_type.clone() {
            // Consuming `approval_type` clears it in the same patch: this
            // node is re-entered later in the same run (vibe_scorer routes
            // back here once the itinerary is built), and a stale value
            // would replay this routing instead of raising a fresh
            // approval for that later stage.
            let cleared = PlannerStatePatch {
                approval_type: Some(None),
                ..Default::default()
            };
            if approval_type == "itinerary" {
                return Ok(NodeOutcome::end(cleared));
            }
            let next = match approval_type.as_str() {
                "destination" => "search_dispatcher",
                "enrichment" => "budget_optimizer",
                _ => return Ok(NodeOutcome::end(cleared)),
            };
            let decision = AgentDecision::new(
                "approval_gate",
                "route_post_approval",
                format!("Routing post-approval continuation for approval_type={approval_type}."),
                format!("Next: {next}"),
            );
            let patch = PlannerStatePatch {
                approval_type: Some(None),
                agent_decisions: Some(vec![decision]),
                ..Default::default()
            };
            return Ok(NodeOutcome::next(patch, next));
        }

        let approval_type = if state.trip.is_some() {
            "itinerary"
        } else if !state.destination_options.is_empty() {
            "destination"
        } else {
            "enrichment"
        };

        let decision = AgentDecision::new(
            "approval_gate",
            "raise_approval",
            format!("Raising approval gate with type={approval_type}."),
            "Awaiting user approval".to_string(),
        );
        let patch = PlannerStatePatch {
            requires_approval: Some(true),
            approval_type: Some(Some(approval_type.to_string())),
            current_stage: Some("awaiting_approval".to_string()),
            agent_decisions: Some(vec![decision]),
            ..Default::default()
        };
        // Route back to self rather than `end`: the scheduler only checks
        // `requires_approval` at the top of its drive loop, before running
        // the current node, so a fresh approval has to loop once more to
        // get picked up and checkpointed as `Suspended` instead of being
        // swallowed by `Route::End`'s unconditional completion.
        Ok(NodeOutcome::next(patch, "approval_gate"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pending_approval_ends_the_run() {
        let node = ApprovalGateNode::new();
        let mut state = PlannerState::new("s", "u", "q");
        state.requires_approval = true;

        let outcome = node.run(&state).await.unwrap();
        assert!(matches!(outcome.route, wayfare_runtime::Route::End));
    }

    #[tokio::test]
    async fn destination_approval_type_routes_to_search_dispatcher() {
        let node = ApprovalGateNode::new();
        let mut state = PlannerState::new("s", "u", "q");
        state.approval_type = Some("destination".to_string());

        let outcome = node.run(&state).await.unwrap();
        match outcome.route {
            wayfare_runtime::Route::Node(next) => assert_eq!(next, "search_dispatcher"),
            _ => panic!("expected Route::Node"),
        }
    }

    #[tokio::test]
    async fn consuming_an_approval_type_clears_it() {
        let node = ApprovalGateNode::new();
        let mut state = PlannerState::new("s", "u", "q");
        state.approval_type = Some("enrichment".to_string());

        let outcome = node.run(&state).await.unwrap();
        assert_eq!(outcome.patch.approval_type, Some(None));
    }

    #[tokio::test]
    async fn itinerary_approval_type_ends_and_clears() {
        let node = ApprovalGateNode::new();
        let mut state = PlannerState::new("s", "u", "q");
        state.approval_type = Some("itinerary".to_string());

        let outcome = node.run(&state).await.unwrap();
        assert_eq!(outcome.patch.approval_type, Some(None));
        assert!(matches!(outcome.route, wayfare_runtime::Route::End));
    }

    #[tokio::test]
    async fn fresh_trip_raises_itinerary_approval() {
        let node = ApprovalGateNode::new();
        let mut state = PlannerState::new("s", "u", "q");
        state.trip = Some(wayfare_types::Trip {
            destination: "Goa".into(),
            duration_days: 2,
            items: vec![],
            total_cost: 0.0,
        });

        let outcome = node.run(&state).await.unwrap();
        assert_eq!(outcome.patch.approval_type, Some(Some("itinerary".to_string())));
        assert_eq!(outcome.patch.requires_approval, Some(true));
        match outcome.route {
            wayfare_runtime::Route::Node(next) => assert_eq!(next, "approval_gate"),
            _ => panic!("expected Route::Node looping back to approval_gate"),
        }
    }
}
