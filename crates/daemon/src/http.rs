// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Loopback HTTP query/command surface (SPEC_FULL.md §4.9) plus the
//! `/api/v2/events/stream` SSE hub (SPEC_FULL.md §4.8) and the internal
//! `/api/v2/hooks/:event` endpoint `pal hook` forwards to when a daemon is
//! running.
//!
//! Grounded on the teacher's bespoke length-prefixed JSON IPC in
//! `protocol.rs`: same shape (one request type per operation, one response
//! type, errors mapped to a stable code), rebuilt on `axum` since PAL Kit's
//! transport is loopback HTTP rather than a Unix socket. Every command
//! handler below delegates to the same `pal-engine` managers the hook
//! dispatcher uses — no handler reimplements a domain rule.

use crate::hooks::{HookDispatcher, HookRequest};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::stream::Stream;
use futures_util::StreamExt as _;
use pal_core::{Clock, CoreError, EventKind};
use pal_engine::{EscalationManager, Runtime, Scheduler, SessionManager};
use pal_wire::{PortRetryRequest, Problem, ResolveEscalationRequest, RestoreRequest};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;

pub struct ApiError(CoreError);

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let problem = Problem::from(&self.0);
        let status = StatusCode::from_u16(problem.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(problem)).into_response()
    }
}

#[derive(Clone)]
pub struct AppState<C: Clock + Clone + Send + Sync + 'static> {
    pub runtime: Arc<Runtime<C>>,
    pub dispatcher: Arc<HookDispatcher<C>>,
    pub clock: C,
}

pub fn router<C: Clock + Clone + Send + Sync + 'static>(state: AppState<C>) -> Router {
    Router::new()
        .route("/api/v2/sessions", get(list_sessions::<C>))
        .route("/api/v2/sessions/:id", get(get_session::<C>))
        .route("/api/v2/sessions/:id/hierarchy", get(get_hierarchy::<C>))
        .route("/api/v2/ports", get(list_ports::<C>))
        .route("/api/v2/ports/:id", get(get_port::<C>))
        .route("/api/v2/ports/:id/retry", post(retry_port::<C>))
        .route("/api/v2/pipelines/:id", get(get_pipeline::<C>))
        .route("/api/v2/escalations", get(list_escalations::<C>))
        .route("/api/v2/escalations/:id/resolve", post(resolve_escalation::<C>))
        .route("/api/v2/backup", post(create_backup::<C>))
        .route("/api/v2/data/repair", post(repair_data::<C>))
        .route("/api/v2/events/stream", get(event_stream::<C>))
        .route("/api/v2/hooks/:event", post(run_hook::<C>))
        .with_state(state)
}

async fn list_sessions<C: Clock + Clone + Send + Sync + 'static>(
    State(state): State<AppState<C>>,
) -> Json<Vec<pal_core::Session>> {
    let sessions = state.runtime.store().lock().query(|s| s.sessions.values().cloned().collect::<Vec<_>>());
    Json(sessions)
}

async fn get_session<C: Clock + Clone + Send + Sync + 'static>(
    State(state): State<AppState<C>>,
    Path(id): Path<String>,
) -> Result<Json<pal_core::Session>, ApiError> {
    let session = state
        .runtime
        .store()
        .lock()
        .query(|s| s.get_session(&id).cloned())
        .ok_or_else(|| CoreError::NotFound { resource: "session", id: id.clone() })?;
    Ok(Json(session))
}

async fn get_hierarchy<C: Clock + Clone + Send + Sync + 'static>(
    State(state): State<AppState<C>>,
    Path(id): Path<String>,
) -> Result<Json<pal_core::SessionTree>, ApiError> {
    let store = state.runtime.store();
    let store = store.lock();
    let tree = SessionManager::get_hierarchy(&store, &id, false)?;
    Ok(Json(tree))
}

async fn list_ports<C: Clock + Clone + Send + Sync + 'static>(
    State(state): State<AppState<C>>,
) -> Json<Vec<pal_core::Port>> {
    let ports = state.runtime.store().lock().query(|s| s.ports.values().cloned().collect::<Vec<_>>());
    Json(ports)
}

async fn get_port<C: Clock + Clone + Send + Sync + 'static>(
    State(state): State<AppState<C>>,
    Path(id): Path<String>,
) -> Result<Json<pal_core::Port>, ApiError> {
    let port = state
        .runtime
        .store()
        .lock()
        .query(|s| s.get_port(&id).cloned())
        .ok_or_else(|| CoreError::NotFound { resource: "port", id: id.clone() })?;
    Ok(Json(port))
}

async fn retry_port<C: Clock + Clone + Send + Sync + 'static>(
    State(state): State<AppState<C>>,
    Path(id): Path<String>,
    Json(_body): Json<PortRetryRequest>,
) -> Result<StatusCode, ApiError> {
    let mut store = state.runtime.store();
    let mut store = store.lock();
    Scheduler::retry_port(&mut store, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(serde::Serialize)]
struct PipelineView {
    #[serde(flatten)]
    pipeline: pal_core::Pipeline,
    status: pal_core::PipelineStatus,
    levels: Vec<Vec<String>>,
}

async fn get_pipeline<C: Clock + Clone + Send + Sync + 'static>(
    State(state): State<AppState<C>>,
    Path(id): Path<String>,
) -> Result<Json<PipelineView>, ApiError> {
    let store = state.runtime.store();
    let store = store.lock();
    let pipeline = store
        .query(|s| s.pipelines.get(&id).cloned())
        .ok_or_else(|| CoreError::NotFound { resource: "pipeline", id: id.clone() })?;
    let (status, levels) = store.query(|s| {
        (Scheduler::pipeline_status(s, &pipeline), Scheduler::topological_levels(s, &pipeline).unwrap_or_default())
    });
    Ok(Json(PipelineView { pipeline, status, levels }))
}

async fn list_escalations<C: Clock + Clone + Send + Sync + 'static>(
    State(state): State<AppState<C>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Vec<pal_core::Escalation>> {
    let status_filter = params.get("status").cloned();
    let mut escalations: Vec<pal_core::Escalation> =
        state.runtime.store().lock().query(|s| s.escalations.values().cloned().collect());
    if let Some(status) = status_filter {
        escalations.retain(|e| e.status.to_string().eq_ignore_ascii_case(&status));
    }
    escalations.sort_by_key(|e| e.created_at_ms);
    Json(escalations)
}

async fn resolve_escalation<C: Clock + Clone + Send + Sync + 'static>(
    State(state): State<AppState<C>>,
    Path(id): Path<String>,
    Json(body): Json<ResolveEscalationRequest>,
) -> Result<Json<pal_core::Escalation>, ApiError> {
    let escalation_id = pal_core::EscalationId::from_string(&id);
    let mut store = state.runtime.store();
    let mut store = store.lock();
    let escalation = EscalationManager::resolve(&mut store, &state.clock, escalation_id, body.resolution, "operator")?;
    Ok(Json(escalation))
}

#[derive(serde::Deserialize)]
struct BackupRequest {
    #[serde(default)]
    project: Option<String>,
}

async fn create_backup<C: Clock + Clone + Send + Sync + 'static>(
    State(state): State<AppState<C>>,
    Json(body): Json<BackupRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let store = state.runtime.store();
    let mut store = store.lock();
    store.checkpoint().map_err(|e| CoreError::Storage { message: e.to_string() })?;
    let snapshot_path = store.snapshot_path();
    let backups_dir = store.dir().join("backups");
    let project = body.project.unwrap_or_else(|| "default".to_string());
    let archive =
        pal_storage::backup::create(&snapshot_path, &backups_dir, &project).map_err(|e| CoreError::Storage { message: e.to_string() })?;
    Ok(Json(serde_json::json!({ "archive_path": archive })))
}

async fn repair_data<C: Clock + Clone + Send + Sync + 'static>(
    State(state): State<AppState<C>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    // `repair` consolidates the WAL into a fresh snapshot: any truncated
    // tail record is dropped by `Store::open`'s replay on the next open,
    // and `checkpoint` then commits the consolidated state as the new
    // snapshot baseline.
    let store = state.runtime.store();
    let mut store = store.lock();
    let version_before = store.version();
    store.checkpoint().map_err(|e| CoreError::Storage { message: e.to_string() })?;
    Ok(Json(serde_json::json!({ "version": version_before, "repaired": true })))
}

#[derive(serde::Deserialize)]
struct StreamParams {
    #[serde(default)]
    filter: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
}

async fn event_stream<C: Clock + Clone + Send + Sync + 'static>(
    State(state): State<AppState<C>>,
    Query(params): Query<StreamParams>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let filter: Vec<EventKind> = params.filter.as_deref().map(EventKind::parse_filter_list).unwrap_or_default();
    let session_scope = params.session_id;

    let receiver = state.runtime.subscribe();
    // A lagged receiver means this client's buffered channel filled up and
    // the hub dropped frames underneath it; spec.md §4.8 requires closing
    // such a connection rather than resuming with a gap in its feed. `None`
    // here ends the stream (via `take_while` below) instead of just
    // skipping the frame the way a non-matching event does.
    let stream = BroadcastStream::new(receiver)
        .map(move |msg| match msg {
            Ok(event) if event.matches(&filter, session_scope.as_deref()) => Some(Some(
                SseEvent::default().data(serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string())),
            )),
            Ok(_) => Some(None),
            Err(_) => None,
        })
        .take_while(|frame| std::future::ready(frame.is_some()))
        .filter_map(|frame| std::future::ready(frame.flatten().map(Ok)));

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(30)).text("ping"))
}

#[derive(serde::Deserialize)]
struct HookRequestBody {
    input: pal_wire::HookInput,
    #[serde(default)]
    port_id: Option<String>,
}

async fn run_hook<C: Clock + Clone + Send + Sync + 'static>(
    State(state): State<AppState<C>>,
    Path(_event): Path<String>,
    Json(body): Json<HookRequestBody>,
) -> Result<Json<pal_wire::HookOutput>, ApiError> {
    let output = state.dispatcher.dispatch(HookRequest { input: body.input, port_id: body.port_id }).await?;
    Ok(Json(output))
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
