//! Axum router and HTTP handlers for risk-daemon. `build_router` is the
//! single entry point; `main.rs` attaches middleware after this call so
//! tests can compose the bare router directly.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use risk_schemas::RunRequest;

use crate::api_types::{
    CubeQuery, CubeResponse, CubeRowResponse, HealthResponse, PutPositionSnapshotRequest,
    PutSnapshotRequest, PutSnapshotResponse, ResultsQuery, RunResponse, RunStatusResponse,
    SummaryResponse,
};
use crate::error::ApiError;
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/marketdata/snapshots", post(put_market_snapshot))
        .route("/v1/marketdata/snapshots/:snapshot_id", get(get_market_snapshot))
        .route("/v1/positions/snapshot", post(put_position_snapshot))
        .route("/v1/runs", post(create_run))
        .route("/v1/runs/:run_id", get(get_run))
        .route("/v1/results/:run_id/summary", get(get_summary))
        .route("/v1/results/:run_id/cube", get(get_cube))
        .with_state(state)
}

async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let status = risk_db::status(&st.pool).await;
    let db_ok = status.map(|s| s.ok && s.has_run_table).unwrap_or(false);
    (
        StatusCode::OK,
        Json(HealthResponse { ok: true, service: st.service, version: st.version, database: db_ok }),
    )
}

async fn put_market_snapshot(
    State(st): State<Arc<AppState>>,
    Json(body): Json<PutSnapshotRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.snapshot_id.trim().is_empty() {
        return Err(ApiError::bad_request("snapshot_id must not be empty"));
    }
    let outcome = risk_db::put_market_snapshot(&st.pool, &body.snapshot_id, body.payload.clone()).await?;
    let payload_hash = risk_config::payload_hash(&body.payload);
    Ok((
        StatusCode::OK,
        Json(PutSnapshotResponse {
            snapshot_id: body.snapshot_id,
            payload_hash,
            inserted: matches!(outcome, risk_db::PutOutcome::Inserted),
        }),
    ))
}

async fn get_market_snapshot(
    State(st): State<Arc<AppState>>,
    Path(snapshot_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let row = risk_db::get_market_snapshot(&st.pool, &snapshot_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("market snapshot {snapshot_id} not found")))?;
    Ok((StatusCode::OK, Json(row.payload)))
}

async fn put_position_snapshot(
    State(st): State<Arc<AppState>>,
    Json(body): Json<PutPositionSnapshotRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if body.position_snapshot_id.trim().is_empty() {
        return Err(ApiError::bad_request("position_snapshot_id must not be empty"));
    }
    let outcome =
        risk_db::put_position_snapshot(&st.pool, &body.position_snapshot_id, body.payload.clone()).await?;
    let payload_hash = risk_config::payload_hash(&body.payload);
    Ok((
        StatusCode::OK,
        Json(PutSnapshotResponse {
            snapshot_id: body.position_snapshot_id,
            payload_hash,
            inserted: matches!(outcome, risk_db::PutOutcome::Inserted),
        }),
    ))
}

async fn create_run(
    State(st): State<Arc<AppState>>,
    Json(req): Json<RunRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.market_snapshot_id.trim().is_empty() {
        return Err(ApiError::bad_request("market_snapshot_id must not be empty"));
    }
    if req.measures.is_empty() {
        return Err(ApiError::bad_request("measures must not be empty"));
    }
    if req.execution.hash_mod == 0 {
        return Err(ApiError::bad_request("execution.hash_mod must be a positive integer"));
    }

    risk_worker::submit_run(&st.pool, &req, st.default_max_attempts, &st.positions_snapshot_path).await?;

    let (_, status) = risk_db::fetch_run_with_derived_status(&st.pool, req.run_id).await?;
    let counts = risk_db::count_tasks(&st.pool, req.run_id).await?;

    Ok((
        StatusCode::OK,
        Json(RunResponse { run_id: req.run_id, status: status.as_str().to_string(), task_count: Some(counts.total) }),
    ))
}

async fn get_run(State(st): State<Arc<AppState>>, Path(run_id): Path<Uuid>) -> Result<impl IntoResponse, ApiError> {
    let (_, status) = risk_db::fetch_run_with_derived_status(&st.pool, run_id).await?;
    let counts = risk_db::count_tasks(&st.pool, run_id).await?;
    Ok((
        StatusCode::OK,
        Json(RunStatusResponse {
            run_id,
            status: status.as_str().to_string(),
            tasks_total: counts.total,
            tasks_done: counts.done,
            tasks_dead: counts.dead,
        }),
    ))
}

async fn get_summary(
    State(st): State<Arc<AppState>>,
    Path(run_id): Path<Uuid>,
    Query(q): Query<ResultsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let summary = risk_db::summary(&st.pool, run_id, &q.scenario_id).await?;
    Ok((
        StatusCode::OK,
        Json(SummaryResponse { run_id, scenario_id: q.scenario_id, rows: summary.rows, pv_sum: summary.pv_sum }),
    ))
}

async fn get_cube(
    State(st): State<Arc<AppState>>,
    Path(run_id): Path<Uuid>,
    Query(q): Query<CubeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let group_by = risk_db::results::GroupBy::parse(&q.group_by)?;
    let rows = risk_db::cube(&st.pool, run_id, &q.measure, group_by, &q.scenario_id).await?;
    Ok((
        StatusCode::OK,
        Json(CubeResponse {
            run_id,
            measure: q.measure,
            scenario_id: q.scenario_id,
            rows: rows.into_iter().map(|r| CubeRowResponse { key: r.key, value: r.value }).collect(),
        }),
    ))
}
