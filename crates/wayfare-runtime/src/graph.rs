//! The typed node/edge vocabulary the scheduler walks: an async node
//! reads shared state and returns a patch plus where to go next, the
//! same pure `(state) -> (patch, next)` shape as a reducer but async and
//! registered by name in a graph rather than closed over directly.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use wayfare_types::{PlannerState, PlannerStatePatch};

/// One unit of dispatched work: a target node name plus whatever extra
/// context that branch needs (e.g. which activity category to search),
/// since every branch reads the same shared `PlannerState` and only
/// needs a hint about its own slice of the fan-out. Named after
/// LangGraph's `Send` primitive, kept distinct from `std::marker::Send`.
#[derive(Debug, Clone)]
pub struct SendCommand {
    pub target: String,
    pub snapshot: Value,
}

impl SendCommand {
    pub fn new(target: impl Into<String>, snapshot: Value) -> Self {
        Self {
            target: target.into(),
            snapshot,
        }
    }
}

/// What a node wants to happen after it runs.
#[derive(Debug, Clone)]
pub enum Route {
    /// Continue directly to a named node, overriding the registry's edge.
    Node(String),
    /// Fan out to several nodes concurrently; the dispatching node's own
    /// registered edge determines the aggregator run once all branches
    /// finish.
    Dispatch(Vec<SendCommand>),
    /// The run is finished.
    End,
}

pub struct NodeOutcome {
    pub patch: PlannerStatePatch,
    pub route: Route,
}

impl NodeOutcome {
    pub fn next(patch: PlannerStatePatch, node: impl Into<String>) -> Self {
        Self {
            patch,
            route: Route::Node(node.into()),
        }
    }

    pub fn dispatch(patch: PlannerStatePatch, sends: Vec<SendCommand>) -> Self {
        Self {
            patch,
            route: Route::Dispatch(sends),
        }
    }

    pub fn end(patch: PlannerStatePatch) -> Self {
        Self {
            patch,
            route: Route::End,
        }
    }
}

#[async_trait]
pub trait GraphNode: Send + Sync {
    fn name(&self) -> &str;
    async fn run(&self, state: &PlannerState) -> anyhow::Result<NodeOutcome>;
}

/// A node's declared fallback edge, used once all of a dispatch's
/// branches have completed and the scheduler needs to know where the
/// dispatching node's own flow continues (the aggregator).
#[derive(Clone)]
pub enum Edge {
    Static(String),
    Conditional(Arc<dyn Fn(&PlannerState) -> String + Send + Sync>),
}

impl Edge {
    pub fn resolve(&self, state: &PlannerState) -> String {
        match self {
            Edge::Static(next) => next.clone(),
            Edge::Conditional(f) => f(state),
        }
    }
}

pub struct GraphDefinition {
    pub entry: String,
    nodes: HashMap<String, Arc<dyn GraphNode>>,
    edges: HashMap<String, Edge>,
}

impl GraphDefinition {
    pub fn builder(entry: impl Into<String>) -> GraphBuilder {
        GraphBuilder {
            entry: entry.into(),
            nodes: HashMap::new(),
            edges: HashMap::new(),
        }
    }

    pub fn node(&self, name: &str) -> Option<Arc<dyn GraphNode>> {
        self.nodes.get(name).cloned()
    }

    pub fn edge(&self, name: &str) -> Option<&Edge> {
        self.edges.get(name)
    }

    pub fn node_names(&self) -> Vec<String> {
        self.nodes.keys().cloned().collect()
    }
}

pub struct GraphBuilder {
    entry: String,
    nodes: HashMap<String, Arc<dyn GraphNode>>,
    edges: HashMap<String, Edge>,
}

impl GraphBuilder {
    pub fn add_node(mut self, node: Arc<dyn GraphNode>) -> Self {
        self.nodes.insert(node.name().to_string(), node);
        self
    }

    pub fn add_edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.edges.insert(from.into(), Edge::Static(to.into()));
        self
    }

    pub fn add_conditional_edge(
        mut self,
        from: impl Into<String>,
        f: impl Fn(&PlannerState) -> String + Send + Sync + 'static,
    ) -> Self {
        self.edges.insert(from.into(), Edge::Conditional(Arc::new(f)));
        self
    }

    pub fn build(self) -> anyhow::Result<GraphDefinition> {
        if !self.nodes.contains_key(&self.entry) {
            anyhow::bail!("graph entry node '{}' was never registered", self.entry);
        }
        Ok(GraphDefinition {
            entry: self.entry,
            nodes: self.nodes,
            edges: self.edges,
        })
    }
}
