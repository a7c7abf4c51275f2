//! Generic agent graph runtime: typed nodes, static/conditional edges,
//! concurrent fan-out with barrier join, checkpointing, and
//! suspend/resume for human-in-the-loop approval gates.

pub mod checkpoint;
pub mod events;
pub mod graph;
pub mod scheduler;

pub use checkpoint::{Checkpoint, CheckpointStore, FileCheckpointStore};
pub use events::{EventBus, StreamEvent};
pub use graph::{Edge, GraphBuilder, GraphDefinition, GraphNode, NodeOutcome, Route, SendCommand};
pub use scheduler::{RunResult, RunStatus, Scheduler};
