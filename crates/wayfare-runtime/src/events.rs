//! Run-progress event bus: a thin `tokio::sync::broadcast` wrapper so
//! every subscriber (SSE handlers, CLI watchers) sees the same
//! `StreamEvent` stream.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    NodeStarted { run_id: String, node: String },
    NodeFinished { run_id: String, node: String, stage: String },
    Dispatched { run_id: String, from: String, targets: Vec<String> },
    Suspended { run_id: String, approval_type: Option<String> },
    Resumed { run_id: String },
    Completed { run_id: String },
    Failed { run_id: String, error: String },
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<StreamEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1024);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StreamEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: StreamEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        bus.publish(StreamEvent::Completed {
            run_id: "r1".to_string(),
        });
        let received = rx.recv().await.unwrap();
        assert!(matches!(received, StreamEvent::Completed { run_id } if run_id == "r1"));
    }
}
