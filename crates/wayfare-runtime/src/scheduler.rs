//! Walks a [`GraphDefinition`], merging each node's patch into shared
//! state, fanning out `Route::Dispatch` branches concurrently with a
//! barrier join, and suspending the run whenever a node sets
//! `requires_approval`. The async-first, `tokio::spawn`-per-branch style
//! mirrors the rest of this workspace's provider and server crates.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::broadcast;
use tokio::time::timeout;

use wayfare_types::{PlannerState, PlannerStatePatch};

use crate::checkpoint::{Checkpoint, CheckpointStore};
use crate::events::{EventBus, StreamEvent};
use crate::graph::{GraphDefinition, Route};

const DEFAULT_NODE_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_STEPS: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Suspended,
    Failed,
}

pub struct RunResult {
    pub status: RunStatus,
    pub state: PlannerState,
}

pub struct Scheduler {
    graph: Arc<GraphDefinition>,
    events: EventBus,
    checkpoints: Arc<dyn CheckpointStore>,
    node_timeout: Duration,
    max_steps: usize,
}

impl Scheduler {
    pub fn new(
        graph: Arc<GraphDefinition>,
        events: EventBus,
        checkpoints: Arc<dyn CheckpointStore>,
    ) -> Self {
        Self {
            graph,
            events,
            checkpoints,
            node_timeout: DEFAULT_NODE_TIMEOUT,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    pub fn with_node_timeout(mut self, timeout: Duration) -> Self {
        self.node_timeout = timeout;
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StreamEvent> {
        self.events.subscribe()
    }

    pub async fn run(&self, run_id: &str, mut state: PlannerState) -> anyhow::Result<RunResult> {
        let mut current = self.graph.entry.clone();
        self.drive(run_id, &mut current, &mut state).await
    }

    /// Applies approval feedback to a suspended run's checkpointed state
    /// and continues from the node that was awaiting it. Research
    /// already gathered (flights, hotels, activities, weather) is not
    /// re-run — only the graph from the suspension point onward.
    pub async fn resume(&self, run_id: &str, feedback: PlannerStatePatch) -> anyhow::Result<RunResult> {
        let Some(checkpoint) = self.checkpoints.load(run_id).await? else {
            anyhow::bail!("no checkpoint found for run '{run_id}'");
        };
        let mut state = checkpoint.state;
        state.apply(feedback);
        state.requires_approval = false;
        self.events.publish(StreamEvent::Resumed {
            run_id: run_id.to_string(),
        });
        let mut current = checkpoint.node;
        self.drive(run_id, &mut current, &mut state).await
    }

    async fn drive(
        &self,
        run_id: &str,
        current: &mut String,
        state: &mut PlannerState,
    ) -> anyhow::Result<RunResult> {
        for _ in 0..self.max_steps {
            if state.requires_approval {
                self.checkpoints
                    .save(Checkpoint {
                        run_id: run_id.to_string(),
                        node: current.clone(),
                        state: state.clone(),
                    })
                    .await?;
                self.events.publish(StreamEvent::Suspended {
                    run_id: run_id.to_string(),
                    approval_type: state.approval_type.clone(),
                });
                return Ok(RunResult {
                    status: RunStatus::Suspended,
                    state: state.clone(),
                });
            }

            let Some(node) = self.graph.node(current) else {
                let error = format!("unknown graph node '{current}'");
                self.events.publish(StreamEvent::Failed {
                    run_id: run_id.to_string(),
                    error: error.clone(),
                });
                anyhow::bail!(error);
            };

            self.events.publish(StreamEvent::NodeStarted {
                run_id: run_id.to_string(),
                node: current.clone(),
            });

            let outcome = match timeout(self.node_timeout, node.run(state)).await {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(err)) => {
                    let error = err.to_string();
                    self.events.publish(StreamEvent::Failed {
                        run_id: run_id.to_string(),
                        error: error.clone(),
                    });
                    state.apply(PlannerStatePatch {
                        errors: Some(vec![error]),
                        ..Default::default()
                    });
                    return Ok(RunResult {
                        status: RunStatus::Failed,
                        state: state.clone(),
                    });
                }
                Err(_) => {
                    let error = format!("node '{current}' timed out after {:?}", self.node_timeout);
                    self.events.publish(StreamEvent::Failed {
                        run_id: run_id.to_string(),
                        error: error.clone(),
                    });
                    state.apply(PlannerStatePatch {
                        errors: Some(vec![error]),
                        ..Default::default()
                    });
                    return Ok(RunResult {
                        status: RunStatus::Failed,
                        state: state.clone(),
                    });
                }
            };

            state.apply(outcome.patch);

            match outcome.route {
                Route::Node(next) => {
                    self.events.publish(StreamEvent::NodeFinished {
                        run_id: run_id.to_string(),
                        node: current.clone(),
                        stage: next.clone(),
                    });
                    *current = next;
                }
                Route::Dispatch(sends) => {
                    let targets: Vec<String> = sends.iter().map(|s| s.target.clone()).collect();
                    self.events.publish(StreamEvent::Dispatched {
                        run_id: run_id.to_string(),
                        from: current.clone(),
                        targets,
                    });
                    let (patches, failures) = self.run_fanout(state, &sends).await;
                    for patch in patches {
                        state.apply(patch);
                    }
                    if !failures.is_empty() {
                        state.apply(PlannerStatePatch {
                            errors: Some(failures),
                            ..Default::default()
                        });
                    }
                    let Some(edge) = self.graph.edge(current) else {
                        anyhow::bail!("dispatching node '{current}' has no registered aggregator edge");
                    };
                    let next = edge.resolve(state);
                    self.events.publish(StreamEvent::NodeFinished {
                        run_id: run_id.to_string(),
                        node: current.clone(),
                        stage: next.clone(),
                    });
                    *current = next;
                }
                Route::End => {
                    self.checkpoints.delete(run_id).await?;
                    self.events.publish(StreamEvent::Completed {
                        run_id: run_id.to_string(),
                    });
                    return Ok(RunResult {
                        status: RunStatus::Completed,
                        state: state.clone(),
                    });
                }
            }
        }

        let error = format!("run '{run_id}' exceeded {} steps without completing", self.max_steps);
        self.events.publish(StreamEvent::Failed {
            run_id: run_id.to_string(),
            error: error.clone(),
        });
        anyhow::bail!(error)
    }

    /// Runs every dispatched branch concurrently and waits for all to
    /// finish — the barrier join a fan-out aggregator needs. A branch
    /// that errors or times out does not take the others down with it:
    /// its failure message is returned separately from the surviving
    /// branches' patches, so the run continues with whatever state they
    /// produced. A branch's own route (if it returns one) is discarded:
    /// dispatched nodes are leaves that report back into the aggregator.
    async fn run_fanout(
        &self,
        state: &PlannerState,
        sends: &[crate::graph::SendCommand],
    ) -> (Vec<PlannerStatePatch>, Vec<String>) {
        let futures = sends.iter().map(|send| {
            let node = self.graph.node(&send.target);
            let state = state.clone();
            let target = send.target.clone();
            async move {
                let Some(node) = node else {
                    return Err(format!("dispatch target '{target}' is not a registered node"));
                };
                match timeout(self.node_timeout, node.run(&state)).await {
                    Ok(Ok(outcome)) => Ok(outcome.patch),
                    Ok(Err(err)) => Err(format!("dispatch target '{target}' failed: {err}")),
                    Err(_) => Err(format!("dispatch target '{target}' timed out")),
                }
            }
        });

        let mut patches = Vec::new();
        let mut failures = Vec::new();
        for result in join_all(futures).await {
            match result {
                Ok(patch) => patches.push(patch),
                Err(error) => failures.push(error),
            }
        }
        (patches, failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::FileCheckpointStore;
    use crate::graph::{GraphNode, NodeOutcome, SendCommand};
    use async_trait::async_trait;
    use serde_json::json;
    use uuid::Uuid;

    struct StartNode;
    #[async_trait]
    impl GraphNode for StartNode {
        fn name(&self) -> &str {
            "start"
        }
        async fn run(&self, _state: &PlannerState) -> anyhow::Result<NodeOutcome> {
            Ok(NodeOutcome::next(PlannerStatePatch::default(), "finish"))
        }
    }

    struct FinishNode;
    #[async_trait]
    impl GraphNode for FinishNode {
        fn name(&self) -> &str {
            "finish"
        }
        async fn run(&self, _state: &PlannerState) -> anyhow::Result<NodeOutcome> {
            Ok(NodeOutcome::end(PlannerStatePatch {
                current_stage: Some("done".to_string()),
                ..Default::default()
            }))
        }
    }

    struct ApprovalNode;
    #[async_trait]
    impl GraphNode for ApprovalNode {
        fn name(&self) -> &str {
            "approval_gate"
        }
        async fn run(&self, _state: &PlannerState) -> anyhow::Result<NodeOutcome> {
            Ok(NodeOutcome::next(
                PlannerStatePatch {
                    requires_approval: Some(true),
                    approval_type: Some(Some("itinerary".to_string())),
                    ..Default::default()
                },
                "finish",
            ))
        }
    }

    struct RaisingNode;
    #[async_trait]
    impl GraphNode for RaisingNode {
        fn name(&self) -> &str {
            "raising"
        }
        async fn run(&self, _state: &PlannerState) -> anyhow::Result<NodeOutcome> {
            anyhow::bail!("boom")
        }
    }

    struct DispatcherNode;
    #[async_trait]
    impl GraphNode for DispatcherNode {
        fn name(&self) -> &str {
            "dispatcher"
        }
        async fn run(&self, _state: &PlannerState) -> anyhow::Result<NodeOutcome> {
            Ok(NodeOutcome::dispatch(
                PlannerStatePatch::default(),
                vec![
                    SendCommand::new("branch_a", json!({})),
                    SendCommand::new("branch_b", json!({})),
                ],
            ))
        }
    }

    struct BranchNode {
        name: &'static str,
        error: String,
    }
    #[async_trait]
    impl GraphNode for BranchNode {
        fn name(&self) -> &str {
            self.name
        }
        async fn run(&self, _state: &PlannerState) -> anyhow::Result<NodeOutcome> {
            Ok(NodeOutcome::end(PlannerStatePatch {
                errors: Some(vec![self.error.clone()]),
                ..Default::default()
            }))
        }
    }

    struct FailingBranchNode;
    #[async_trait]
    impl GraphNode for FailingBranchNode {
        fn name(&self) -> &str {
            "branch_b"
        }
        async fn run(&self, _state: &PlannerState) -> anyhow::Result<NodeOutcome> {
            anyhow::bail!("branch_b exploded")
        }
    }

    async fn checkpoint_store() -> Arc<dyn CheckpointStore> {
        let path = std::env::temp_dir().join(format!("wayfare-sched-{}.json", Uuid::new_v4()));
        Arc::new(FileCheckpointStore::new(path).await.unwrap())
    }

    #[tokio::test]
    async fn runs_to_completion_through_static_edges() {
        let graph = Arc::new(
            GraphDefinition::builder("start")
                .add_node(Arc::new(StartNode))
                .add_node(Arc::new(FinishNode))
                .build()
                .unwrap(),
        );
        let scheduler = Scheduler::new(graph, EventBus::new(), checkpoint_store().await);
        let result = scheduler
            .run("run-1", PlannerState::new("s", "u", "q"))
            .await
            .unwrap();
        assert_eq!(result.status, RunStatus::Completed);
        assert_eq!(result.state.current_stage, "done");
    }

    #[tokio::test]
    async fn suspends_and_resumes_at_the_approval_gate() {
        let graph = Arc::new(
            GraphDefinition::builder("approval_gate")
                .add_node(Arc::new(ApprovalNode))
                .add_node(Arc::new(FinishNode))
                .build()
                .unwrap(),
        );
        let checkpoints = checkpoint_store().await;
        let scheduler = Scheduler::new(graph, EventBus::new(), checkpoints);

        let suspended = scheduler
            .run("run-2", PlannerState::new("s", "u", "q"))
            .await
            .unwrap();
        assert_eq!(suspended.status, RunStatus::Suspended);
        assert_eq!(suspended.state.approval_type.as_deref(), Some("itinerary"));

        let resumed = scheduler
            .resume(
                "run-2",
                PlannerStatePatch {
                    user_feedback: Some(Some("looks good".to_string())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(resumed.status, RunStatus::Completed);
    }

    #[tokio::test]
    async fn fan_out_merges_both_branches_before_continuing() {
        let graph = Arc::new(
            GraphDefinition::builder("dispatcher")
                .add_node(Arc::new(DispatcherNode))
                .add_node(Arc::new(BranchNode { name: "branch_a", error: "a-ran".to_string() }))
                .add_node(Arc::new(BranchNode { name: "branch_b", error: "b-ran".to_string() }))
                .add_node(Arc::new(FinishNode))
                .add_edge("dispatcher", "finish")
                .build()
                .unwrap(),
        );
        let scheduler = Scheduler::new(graph, EventBus::new(), checkpoint_store().await);
        let result = scheduler
            .run("run-3", PlannerState::new("s", "u", "q"))
            .await
            .unwrap();
        assert_eq!(result.status, RunStatus::Completed);
        assert!(result.state.errors.contains(&"a-ran".to_string()));
        assert!(result.state.errors.contains(&"b-ran".to_string()));
    }

    #[tokio::test]
    async fn a_raising_node_is_caught_into_errors_instead_of_propagating() {
        let graph = Arc::new(
            GraphDefinition::builder("raising")
                .add_node(Arc::new(RaisingNode))
                .build()
                .unwrap(),
        );
        let scheduler = Scheduler::new(graph, EventBus::new(), checkpoint_store().await);
        let result = scheduler
            .run("run-4", PlannerState::new("s", "u", "q"))
            .await
            .unwrap();
        assert_eq!(result.status, RunStatus::Failed);
        assert!(result.state.errors.iter().any(|e| e.contains("boom")));
    }

    #[tokio::test]
    async fn fan_out_keeps_surviving_branches_patch_when_a_sibling_fails() {
        let graph = Arc::new(
            GraphDefinition::builder("dispatcher")
                .add_node(Arc::new(DispatcherNode))
                .add_node(Arc::new(BranchNode { name: "branch_a", error: "a-ran".to_string() }))
                .add_node(Arc::new(FailingBranchNode))
                .add_node(Arc::new(FinishNode))
                .add_edge("dispatcher", "finish")
                .build()
                .unwrap(),
        );
        let scheduler = Scheduler::new(graph, EventBus::new(), checkpoint_store().await);
        let result = scheduler
            .run("run-5", PlannerState::new("s", "u", "q"))
            .await
            .unwrap();
        assert_eq!(result.status, RunStatus::Completed);
        assert!(result.state.errors.contains(&"a-ran".to_string()));
        assert!(result.state.errors.iter().any(|e| e.contains("branch_b exploded")));
    }
}
