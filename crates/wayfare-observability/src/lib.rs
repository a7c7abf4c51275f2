//! Structured logging for the Wayfare engine: a JSON file layer plus a
//! compact console layer, and a small set of typed log-event helpers so
//! call sites don't hand-format strings, with correlation fields for
//! graph-run identity (`node`, `thread_id`, `agent_name`).

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;

use serde::Serialize;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessKind {
    Engine,
    Server,
}

impl ProcessKind {
    fn label(&self) -> &'static str {
        match self {
            ProcessKind::Engine => "engine",
            ProcessKind::Server => "server",
        }
    }
}

pub struct LoggingInitInfo {
    pub log_dir: String,
    pub process: ProcessKind,
}

/// A single structured observability event. Fields are borrowed so
/// emitting one at a hot call site doesn't force an allocation.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ObservabilityEvent<'a> {
    pub event: &'a str,
    pub node: Option<&'a str>,
    pub thread_id: Option<&'a str>,
    pub agent_name: Option<&'a str>,
    pub status: Option<&'a str>,
    pub error_code: Option<&'a str>,
    pub detail: Option<&'a str>,
}

impl<'a> ObservabilityEvent<'a> {
    pub fn new(event: &'a str) -> Self {
        Self {
            event,
            node: None,
            thread_id: None,
            agent_name: None,
            status: None,
            error_code: None,
            detail: None,
        }
    }

    pub fn node(mut self, node: &'a str) -> Self {
        self.node = Some(node);
        self
    }

    pub fn thread(mut self, thread_id: &'a str) -> Self {
        self.thread_id = Some(thread_id);
        self
    }

    pub fn agent(mut self, agent_name: &'a str) -> Self {
        self.agent_name = Some(agent_name);
        self
    }

    pub fn status(mut self, status: &'a str) -> Self {
        self.status = Some(status);
        self
    }

    pub fn error(mut self, code: &'a str) -> Self {
        self.error_code = Some(code);
        self
    }

    pub fn detail(mut self, detail: &'a str) -> Self {
        self.detail = Some(detail);
        self
    }
}

pub fn emit_info(ev: ObservabilityEvent<'_>) {
    tracing::info!(
        target: "wayfare.obs",
        event = ev.event,
        node = ev.node,
        thread_id = ev.thread_id,
        agent_name = ev.agent_name,
        status = ev.status,
        error_code = ev.error_code,
        detail = ev.detail,
        "observability event"
    );
}

pub fn emit_warn(ev: ObservabilityEvent<'_>) {
    tracing::warn!(
        target: "wayfare.obs",
        event = ev.event,
        node = ev.node,
        thread_id = ev.thread_id,
        agent_name = ev.agent_name,
        status = ev.status,
        error_code = ev.error_code,
        detail = ev.detail,
        "observability event"
    );
}

pub fn emit_error(ev: ObservabilityEvent<'_>) {
    tracing::error!(
        target: "wayfare.obs",
        event = ev.event,
        node = ev.node,
        thread_id = ev.thread_id,
        agent_name = ev.agent_name,
        status = ev.status,
        error_code = ev.error_code,
        detail = ev.detail,
        "observability event"
    );
}

/// Hash-based redaction, not cryptographic: enough to keep a raw query or
/// feedback string out of logs while still letting two log lines about
/// the same input be correlated.
pub fn redact_text(text: &str) -> String {
    format!("redacted:{}:{}", text.len(), short_hash(text))
}

pub fn short_hash(text: &str) -> String {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    format!("{:x}", hasher.finish())
}

/// Initializes process-wide logging: a daily-rolling JSON file under
/// `log_dir`, plus a compact console layer honoring `RUST_LOG`/`info`.
pub fn init_process_logging(info: &LoggingInitInfo) -> anyhow::Result<tracing_appender::non_blocking::WorkerGuard> {
    std::fs::create_dir_all(&info.log_dir)?;
    let file_appender = tracing_appender::rolling::daily(Path::new(&info.log_dir), format!("{}.jsonl", info.process.label()));
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let json_layer = fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_target(true);

    let console_layer = fmt::layer().compact().with_target(false);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_hash_is_stable() {
        assert_eq!(short_hash("hello"), short_hash("hello"));
    }

    #[test]
    fn redact_text_hides_content_keeps_length() {
        let r = redact_text("plan a trip");
        assert!(r.contains("11"));
        assert!(!r.contains("plan"));
    }
}
