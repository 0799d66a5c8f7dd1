//! Run submission: the idempotent-insert-then-fanout sequence shared by
//! risk-daemon's `POST /v1/runs` handler and risk-cli's `run submit`
//! command, so the two entry points can't drift.
//!
//! Every error surfaced here is a `risk_db::StoreError`, not `anyhow::Error`
//! — callers at the HTTP boundary match on `StoreError::kind()` to pick a
//! status code, and flattening through `anyhow` would erase that.

use std::collections::BTreeSet;

use risk_db::{Result, StoreError};
use risk_schemas::{Position, PositionSnapshotPayload, RunRequest};
use sqlx::PgPool;

use crate::fanout::{partition_into_tasks, FanoutPlan};

fn internal<E: std::fmt::Display>(context: &'static str) -> impl FnOnce(E) -> StoreError {
    move |e| StoreError::Internal(anyhow::anyhow!("{context}: {e}"))
}

pub async fn submit_run(
    pool: &PgPool,
    req: &RunRequest,
    default_max_attempts: i32,
    positions_snapshot_path: &str,
) -> Result<risk_db::InsertRunOutcome> {
    let request_hash =
        risk_config::payload_hash(&serde_json::to_value(req).map_err(internal("serializing run request"))?);

    let position_snapshot_id = resolve_position_snapshot_id(pool, req, positions_snapshot_path).await?;

    let new_run = risk_db::runs::NewRun {
        run_id: req.run_id,
        run_type: req.run_type.clone(),
        as_of_time: req.as_of_time,
        market_snapshot_id: req.market_snapshot_id.clone(),
        position_snapshot_id: position_snapshot_id.clone(),
        portfolio_scope: serde_json::to_value(&req.portfolio_scope).map_err(internal("serializing portfolio scope"))?,
        measures: serde_json::to_value(&req.measures).map_err(internal("serializing measures"))?,
        scenarios: serde_json::to_value(&req.scenarios).map_err(internal("serializing scenarios"))?,
        hash_mod: req.execution.hash_mod as i32,
        request_hash,
        requested_by: None,
    };

    let outcome = risk_db::insert_run(pool, &new_run).await?;

    if matches!(outcome, risk_db::InsertRunOutcome::Inserted) {
        fan_out(pool, req, &position_snapshot_id, default_max_attempts).await?;
    }

    Ok(outcome)
}

/// Resolve the position universe for `req.portfolio_scope`: either the
/// caller's `position_snapshot_id`, or — when absent — the positions file
/// configured out-of-band via `positions_snapshot_path`, persisted as a new
/// `PositionSnapshot` keyed by its own `payload_hash` so repeated fallback
/// submissions against the same file content resolve to the same snapshot.
async fn resolve_position_snapshot_id(
    pool: &PgPool,
    req: &RunRequest,
    positions_snapshot_path: &str,
) -> Result<String> {
    if let Some(id) = &req.portfolio_scope.position_snapshot_id {
        return Ok(id.clone());
    }

    let raw = std::fs::read_to_string(positions_snapshot_path).map_err(|e| {
        StoreError::InvalidInput(format!(
            "portfolio_scope.position_snapshot_id is absent and fallback file {positions_snapshot_path} could not be read: {e}"
        ))
    })?;
    let positions: Vec<Position> =
        serde_json::from_str(&raw).map_err(internal("fallback positions file is malformed"))?;
    let payload = serde_json::to_value(PositionSnapshotPayload { positions })
        .map_err(internal("serializing fallback position snapshot"))?;
    let payload_hash = risk_config::payload_hash(&payload);

    risk_db::put_position_snapshot(pool, &payload_hash, payload).await?;
    Ok(payload_hash)
}

async fn fan_out(pool: &PgPool, req: &RunRequest, position_snapshot_id: &str, max_attempts: i32) -> Result<()> {
    let snapshot_row = risk_db::get_position_snapshot(pool, position_snapshot_id)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("position snapshot {position_snapshot_id} not found")))?;
    let universe: PositionSnapshotPayload = serde_json::from_value(snapshot_row.payload)
        .map_err(internal("position snapshot payload is malformed"))?;

    let wanted: BTreeSet<&str> = req.portfolio_scope.portfolio_node_ids.iter().map(|s| s.as_str()).collect();
    let positions: Vec<_> = universe
        .positions
        .into_iter()
        .filter(|p| wanted.is_empty() || wanted.contains(p.portfolio_node_id.as_str()))
        .collect();

    if positions.is_empty() {
        return Err(StoreError::InvalidInput(format!(
            "no positions matched portfolio_scope.portfolio_node_ids in snapshot {position_snapshot_id}"
        )));
    }

    let plan = FanoutPlan {
        market_snapshot_id: req.market_snapshot_id.clone(),
        measures: req.measures.clone(),
        scenarios: req.scenarios.clone(),
        hash_mod: req.execution.hash_mod,
        max_attempts,
    };
    let tasks = partition_into_tasks(&positions, &plan);

    risk_db::tasks::insert_tasks(pool, req.run_id, &tasks).await?;
    risk_db::advance_to_running(pool, req.run_id).await?;
    Ok(())
}
