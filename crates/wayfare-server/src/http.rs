//! The HTTP surface: `POST /runs`, `GET /runs/:id/stream` (SSE), `POST
//! /runs/:id/resume`, `POST /runs/:id/what-if`, plus a `share`/`GET
//! /shared/:slug` pair so a finished trip can be handed out as a
//! read-only link. The `BroadcastStream`-backed SSE handler streams
//! run events filtered by `run_id` straight off the scheduler's
//! broadcast channel.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use wayfare_runtime::{RunResult, RunStatus, StreamEvent};
use wayfare_types::PlannerState;

use crate::stores::{ConversationTurn, SessionRecord};
use crate::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/runs", post(create_run))
        .route("/runs/{id}/stream", get(stream_run))
        .route("/runs/{id}/resume", post(resume_run))
        .route("/runs/{id}/what-if", post(apply_what_if))
        .route("/runs/{id}/share", post(share_run))
        .route("/shared/{slug}", get(get_shared))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "wayfare-server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn internal_error(err: anyhow::Error) -> axum::response::Response {
    tracing::warn!(error = %err, "request failed");
    (axum::http::StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody { error: err.to_string() })).into_response()
}

fn not_found(message: &str) -> axum::response::Response {
    (axum::http::StatusCode::NOT_FOUND, Json(ErrorBody { error: message.to_string() })).into_response()
}

#[derive(Debug, Deserialize)]
struct CreateRunRequest {
    raw_query: String,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct RunResponse {
    run_id: String,
    session_id: String,
    status: RunStatus,
    state: PlannerState,
}

async fn create_run(State(state): State<AppState>, Json(body): Json<CreateRunRequest>) -> axum::response::Response {
    let session_id = body.session_id.unwrap_or_else(|| Uuid::new_v4().to_string());
    let user_id = body.user_id.unwrap_or_else(|| Uuid::new_v4().to_string());
    let run_id = Uuid::new_v4().to_string();

    if let Err(err) = state.users.touch(&user_id, &session_id).await {
        return internal_error(err);
    }
    if let Err(err) = state.conversations.append(&session_id, ConversationTurn::new("user", &body.raw_query)).await {
        return internal_error(err);
    }

    let planner_state = PlannerState::new(&session_id, &user_id, &body.raw_query);
    let result = match state.scheduler.run(&run_id, planner_state).await {
        Ok(result) => result,
        Err(err) => return internal_error(err),
    };

    if let Err(err) = persist_run_outcome(&state, &session_id, &user_id, &run_id, &result).await {
        return internal_error(err);
    }

    Json(RunResponse { run_id, session_id, status: result.status, state: result.state }).into_response()
}

#[derive(Debug, Deserialize)]
struct ResumeRequest {
    #[serde(default)]
    feedback: Option<String>,
    #[serde(default)]
    selected_destination: Option<String>,
    #[serde(default)]
    selected_bundle_id: Option<String>,
}

/// `:id` here is the `session_id` per spec.md §6's `resume(session_id,
/// feedback?, approval?)` — the session record carries the run that is
/// actually awaiting approval.
async fn resume_run(State(state): State<AppState>, Path(session_id): Path<String>, Json(body): Json<ResumeRequest>) -> axum::response::Response {
    let record = match state.sessions.get(&session_id).await {
        Ok(Some(record)) => record,
        Ok(None) => return not_found("unknown session"),
        Err(err) => return internal_error(err),
    };

    let mut patch = wayfare_types::PlannerStatePatch {
        user_feedback: Some(body.feedback.clone()),
        selected_bundle_id: body.selected_bundle_id.clone(),
        ..Default::default()
    };
    if let Some(destination) = body.selected_destination {
        let mut trip_request = record.state.as_ref().and_then(|s| s.trip_request.clone()).unwrap_or_default();
        trip_request.destination = Some(destination);
        patch.trip_request = Some(trip_request);
    }

    if let Some(feedback) = &body.feedback {
        if let Err(err) = state.conversations.append(&session_id, ConversationTurn::new("user", feedback)).await {
            return internal_error(err);
        }
    }

    let result = match state.scheduler.resume(&record.run_id, patch).await {
        Ok(result) => result,
        Err(err) => return internal_error(err),
    };

    if let Err(err) = persist_run_outcome(&state, &session_id, &record.user_id, &record.run_id, &result).await {
        return internal_error(err);
    }

    Json(RunResponse { run_id: record.run_id, session_id, status: result.status, state: result.state }).into_response()
}

#[derive(Debug, Deserialize)]
struct WhatIfRequest {
    delta_budget: i64,
}

/// Re-scores bundles from the already-gathered candidates without
/// touching the graph at all — `apply_what_if` mutates the session's
/// stored snapshot directly, per spec.md §6's `apply_what_if(state,
/// delta_budget) -> new_state`.
async fn apply_what_if(State(state): State<AppState>, Path(session_id): Path<String>, Json(body): Json<WhatIfRequest>) -> axum::response::Response {
    let Some(mut record) = (match state.sessions.get(&session_id).await {
        Ok(record) => record,
        Err(err) => return internal_error(err),
    }) else {
        return not_found("unknown session");
    };
    let Some(mut planner_state) = record.state.clone() else {
        return not_found("session has no state to apply a what-if against yet");
    };

    wayfare_negotiator::apply_what_if(&mut planner_state, body.delta_budget);
    record.state = Some(planner_state.clone());
    record.updated_at = chrono::Utc::now();
    if let Err(err) = state.sessions.upsert(record).await {
        return internal_error(err);
    }

    Json(planner_state).into_response()
}

async fn share_run(State(state): State<AppState>, Path(session_id): Path<String>) -> axum::response::Response {
    match state.sessions.share(&session_id).await {
        Ok(Some(slug)) => Json(serde_json::json!({ "slug": slug })).into_response(),
        Ok(None) => not_found("session has no state to share yet"),
        Err(err) => internal_error(err),
    }
}

async fn get_shared(State(state): State<AppState>, Path(slug): Path<String>) -> axum::response::Response {
    match state.sessions.get_shared(&slug).await {
        Ok(Some(planner_state)) => Json(planner_state).into_response(),
        Ok(None) => not_found("shared trip not found or expired"),
        Err(err) => internal_error(err),
    }
}

/// `:id` here is the `run_id` — stream subscribers want events as a
/// specific run progresses, independent of which session spawned it.
async fn stream_run(State(state): State<AppState>, Path(run_id): Path<String>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.scheduler.subscribe();
    let filtered = BroadcastStream::new(rx).filter_map(move |msg| match msg {
        Ok(event) if event_run_id(&event) == run_id => serde_json::to_string(&event).ok().map(|payload| Ok(Event::default().data(payload))),
        _ => None,
    });
    Sse::new(filtered).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

fn event_run_id(event: &StreamEvent) -> &str {
    match event {
        StreamEvent::NodeStarted { run_id, .. }
        | StreamEvent::NodeFinished { run_id, .. }
        | StreamEvent::Dispatched { run_id, .. }
        | StreamEvent::Suspended { run_id, .. }
        | StreamEvent::Resumed { run_id }
        | StreamEvent::Completed { run_id }
        | StreamEvent::Failed { run_id, .. } => run_id,
    }
}

async fn persist_run_outcome(state: &AppState, session_id: &str, user_id: &str, run_id: &str, result: &RunResult) -> anyhow::Result<()> {
    state.decisions.append(session_id, &result.state.agent_decisions).await?;
    if let Some(response) = &result.state.conversation_response {
        state.conversations.append(session_id, ConversationTurn::new("assistant", response)).await?;
    }

    let previous = state.sessions.get(session_id).await?;
    let now = chrono::Utc::now();
    state
        .sessions
        .upsert(SessionRecord {
            session_id: session_id.to_string(),
            user_id: user_id.to_string(),
            run_id: run_id.to_string(),
            status: status_label(result.status),
            current_stage: result.state.current_stage.clone(),
            state: Some(result.state.clone()),
            created_at: previous.as_ref().map(|p| p.created_at).unwrap_or(now),
            updated_at: now,
            shared_slug: previous.and_then(|p| p.shared_slug),
        })
        .await
}

fn status_label(status: RunStatus) -> String {
    match status {
        RunStatus::Completed => "completed".to_string(),
        RunStatus::Suspended => "suspended".to_string(),
        RunStatus::Failed => "failed".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use wayfare_agents::EngineConfig;
    use wayfare_runtime::{Checkpoint, CheckpointStore, FileCheckpointStore, GraphDefinition};
    use wayfare_types::PlannerState;

    use crate::stores::SessionRecord;
    use crate::AppState;

    use super::router;

    async fn test_state() -> AppState {
        let config = EngineConfig {
            state_dir: std::env::temp_dir().join(format!("wayfare-http-test-{}", Uuid::new_v4())).to_string_lossy().to_string(),
            ..Default::default()
        };
        AppState::bootstrap(config).await.expect("bootstrap")
    }

    async fn post(state: &AppState, uri: &str, body: Value) -> (StatusCode, Value) {
        let app = router(state.clone());
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .expect("request");
        let resp = app.oneshot(req).await.expect("response");
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
        let parsed = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).expect("json") };
        (status, parsed)
    }

    #[tokio::test]
    async fn create_run_suspends_at_the_approval_gate() {
        let state = test_state().await;
        let (status, body) = post(&state, "/runs", json!({ "raw_query": "Plan a relaxing trip to Goa" })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "suspended");
        assert_eq!(body["state"]["requires_approval"], true);
        assert_eq!(body["state"]["approval_type"], "enrichment");
        assert!(body["session_id"].as_str().is_some());
        assert!(body["run_id"].as_str().is_some());
    }

    #[tokio::test]
    async fn resume_continues_past_the_approval_gate_to_completion() {
        // The default graph raises approval twice for a fresh plan: once
        // before budget/itinerary ("enrichment") and once after the
        // itinerary is built and scored ("itinerary"), so finishing a run
        // takes two approvals.
        let state = test_state().await;
        let (_, created) = post(&state, "/runs", json!({ "raw_query": "Plan a relaxing trip to Goa" })).await;
        let session_id = created["session_id"].as_str().unwrap().to_string();
        assert_eq!(created["state"]["approval_type"], "enrichment");

        let (status, first_resume) = post(&state, &format!("/runs/{session_id}/resume"), json!({ "feedback": "looks good" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first_resume["status"], "suspended");
        assert_eq!(first_resume["state"]["approval_type"], "itinerary");
        assert_eq!(first_resume["state"]["trip"]["destination"], "Goa");

        let (status, second_resume) = post(&state, &format!("/runs/{session_id}/resume"), json!({ "feedback": "approved" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second_resume["status"], "completed");
        assert_eq!(second_resume["state"]["requires_approval"], false);
        assert_eq!(second_resume["state"]["trip"]["destination"], "Goa");
    }

    #[tokio::test]
    async fn resume_against_unknown_session_is_not_found() {
        let state = test_state().await;
        let (status, _) = post(&state, "/runs/does-not-exist/resume", json!({})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn what_if_adjusts_the_stored_budget_without_touching_the_scheduler() {
        let state = test_state().await;
        let mut planner_state = PlannerState::new("s1", "u1", "trip to Goa");
        planner_state.trip_request = Some(wayfare_types::TripRequest {
            budget: Some(20_000),
            ..Default::default()
        });
        state
            .sessions
            .upsert(SessionRecord {
                session_id: "s1".to_string(),
                user_id: "u1".to_string(),
                run_id: "r1".to_string(),
                status: "suspended".to_string(),
                current_stage: "awaiting_approval".to_string(),
                state: Some(planner_state),
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
                shared_slug: None,
            })
            .await
            .expect("seed session");

        let (status, body) = post(&state, "/runs/s1/what-if", json!({ "delta_budget": -5000 })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["what_if_delta"], -5000);
        assert_eq!(body["bundles"].as_array().map(|b| b.len()), Some(3));

        let reloaded = state.sessions.get("s1").await.unwrap().unwrap();
        assert_eq!(reloaded.state.unwrap().what_if_delta, -5000);
    }

    #[tokio::test]
    async fn share_then_get_shared_round_trips_the_snapshot() {
        let state = test_state().await;
        let planner_state = PlannerState::new("s2", "u2", "trip to Jaipur");
        state
            .sessions
            .upsert(SessionRecord {
                session_id: "s2".to_string(),
                user_id: "u2".to_string(),
                run_id: "r2".to_string(),
                status: "completed".to_string(),
                current_stage: "done".to_string(),
                state: Some(planner_state),
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
                shared_slug: None,
            })
            .await
            .expect("seed session");

        let (status, body) = post(&state, "/runs/s2/share", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        let slug = body["slug"].as_str().expect("slug").to_string();

        let app = router(state.clone());
        let req = Request::builder().method("GET").uri(format!("/shared/{slug}")).body(Body::empty()).expect("request");
        let resp = app.oneshot(req).await.expect("response");
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
        let shared: Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(shared["session_id"], "s2");
    }

    // Sanity check that the scheduler-suspend path this test module relies
    // on — `approval_gate` looping back to itself rather than ending —
    // actually produces a loadable checkpoint, independent of the HTTP
    // layer above it.
    #[tokio::test]
    async fn suspended_run_leaves_a_loadable_checkpoint() {
        let graph = Arc::new(
            GraphDefinition::builder("approval_gate")
                .add_node(Arc::new(wayfare_agents::approval_gate::ApprovalGateNode::new()))
                .build()
                .unwrap(),
        );
        let checkpoints_path = std::env::temp_dir().join(format!("wayfare-checkpoint-test-{}.json", Uuid::new_v4()));
        let checkpoints = Arc::new(FileCheckpointStore::new(&checkpoints_path).await.unwrap());
        let scheduler = wayfare_runtime::Scheduler::new(graph, wayfare_runtime::EventBus::new(), checkpoints.clone());

        let state = PlannerState::new("s", "u", "q");
        let result = scheduler.run("run-1", state).await.unwrap();
        assert!(matches!(result.status, wayfare_runtime::RunStatus::Suspended));

        let checkpoint: Option<Checkpoint> = checkpoints.load("run-1").await.unwrap();
        assert!(checkpoint.is_some());
        assert_eq!(checkpoint.unwrap().node, "approval_gate");
    }
}
