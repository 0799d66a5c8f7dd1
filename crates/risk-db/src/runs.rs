//! Run persistence and idempotent creation.
//!
//! The `run` row only ever has its `status` column written twice in its
//! lifetime: `CREATED` on insert, `RUNNING` once fanout has inserted tasks.
//! `COMPLETED` and `FAILED` are never written back — they are derived at
//! read time from `run_task` state, so run-status transitions stay monotonic
//! and race-free without a second writer.

use chrono::{DateTime, Utc};
use risk_schemas::RunStatus;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Result, StoreError};

#[derive(Debug, Clone)]
pub struct NewRun {
    pub run_id: Uuid,
    pub run_type: String,
    pub as_of_time: DateTime<Utc>,
    pub market_snapshot_id: String,
    pub position_snapshot_id: String,
    pub portfolio_scope: Value,
    pub measures: Value,
    pub scenarios: Value,
    pub hash_mod: i32,
    pub request_hash: String,
    pub requested_by: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RunRow {
    pub run_id: Uuid,
    pub run_type: String,
    pub as_of_time: DateTime<Utc>,
    pub market_snapshot_id: String,
    pub position_snapshot_id: String,
    pub portfolio_scope: Value,
    pub measures: Value,
    pub scenarios: Value,
    pub hash_mod: i32,
    pub request_hash: String,
    pub requested_by: Option<String>,
    pub status: RunStatus,
    pub last_error: Option<String>,
    pub created_at_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertRunOutcome {
    Inserted,
    AlreadyExistsIdentical,
}

/// Upsert-by-idempotency-key: a run re-submitted with the same `run_id` and
/// the same `request_hash` succeeds as a no-op; a different `request_hash`
/// is a `Conflict`.
pub async fn insert_run(pool: &PgPool, run: &NewRun) -> Result<InsertRunOutcome> {
    let inserted: Option<(Uuid,)> = sqlx::query_as(
        r#"
        insert into run (
            run_id, run_type, as_of_time, market_snapshot_id, position_snapshot_id,
            portfolio_scope, measures, scenarios, hash_mod, request_hash, requested_by, status
        )
        values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'CREATED')
        on conflict (run_id) do nothing
        returning run_id
        "#,
    )
    .bind(run.run_id)
    .bind(&run.run_type)
    .bind(run.as_of_time)
    .bind(&run.market_snapshot_id)
    .bind(&run.position_snapshot_id)
    .bind(&run.portfolio_scope)
    .bind(&run.measures)
    .bind(&run.scenarios)
    .bind(run.hash_mod)
    .bind(&run.request_hash)
    .bind(&run.requested_by)
    .fetch_optional(pool)
    .await?;

    if inserted.is_some() {
        return Ok(InsertRunOutcome::Inserted);
    }

    let existing = fetch_run(pool, run.run_id).await?;
    if existing.request_hash == run.request_hash {
        Ok(InsertRunOutcome::AlreadyExistsIdentical)
    } else {
        Err(StoreError::Conflict(format!(
            "run_id {} already exists with a different request body",
            run.run_id
        )))
    }
}

/// Advance a `CREATED` run to `RUNNING`, once fanout has inserted its tasks.
/// A no-op if the run is already past `CREATED`.
pub async fn advance_to_running(pool: &PgPool, run_id: Uuid) -> Result<()> {
    sqlx::query(
        r#"
        update run
           set status = 'RUNNING', updated_at_utc = now()
         where run_id = $1 and status = 'CREATED'
        "#,
    )
    .bind(run_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn fetch_run(pool: &PgPool, run_id: Uuid) -> Result<RunRow> {
    let row = sqlx::query_as::<
        _,
        (
            Uuid,
            String,
            DateTime<Utc>,
            String,
            String,
            Value,
            Value,
            Value,
            i32,
            String,
            Option<String>,
            String,
            Option<String>,
            DateTime<Utc>,
        ),
    >(
        r#"
        select run_id, run_type, as_of_time, market_snapshot_id, position_snapshot_id,
               portfolio_scope, measures, scenarios, hash_mod, request_hash, requested_by,
               status, last_error, created_at_utc
        from run
        where run_id = $1
        "#,
    )
    .bind(run_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| StoreError::NotFound(format!("run {run_id} not found")))?;

    let (
        run_id,
        run_type,
        as_of_time,
        market_snapshot_id,
        position_snapshot_id,
        portfolio_scope,
        measures,
        scenarios,
        hash_mod,
        request_hash,
        requested_by,
        status,
        last_error,
        created_at_utc,
    ) = row;

    Ok(RunRow {
        run_id,
        run_type,
        as_of_time,
        market_snapshot_id,
        position_snapshot_id,
        portfolio_scope,
        measures,
        scenarios,
        hash_mod,
        request_hash,
        requested_by,
        status: RunStatus::parse(&status).map_err(StoreError::Internal)?,
        last_error,
        created_at_utc,
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TaskCounts {
    pub total: i64,
    pub done: i64,
    pub dead: i64,
}

pub async fn count_tasks(pool: &PgPool, run_id: Uuid) -> Result<TaskCounts> {
    let (total, done, dead): (i64, i64, i64) = sqlx::query_as(
        r#"
        select
            count(*)::bigint,
            count(*) filter (where state = 'DONE')::bigint,
            count(*) filter (where state = 'DEAD')::bigint
        from run_task
        where run_id = $1
        "#,
    )
    .bind(run_id)
    .fetch_one(pool)
    .await?;

    Ok(TaskCounts { total, done, dead })
}

/// A run's effective status: once it has been advanced to `RUNNING`, its
/// status is recomputed from task states on every read rather than stored.
pub fn derive_status(stored: RunStatus, tasks: TaskCounts) -> RunStatus {
    if stored == RunStatus::Created {
        return RunStatus::Created;
    }
    if tasks.dead > 0 {
        RunStatus::Failed
    } else if tasks.total > 0 && tasks.done == tasks.total {
        RunStatus::Completed
    } else {
        RunStatus::Running
    }
}

pub async fn fetch_run_with_derived_status(pool: &PgPool, run_id: Uuid) -> Result<(RunRow, RunStatus)> {
    let row = fetch_run(pool, run_id).await?;
    let counts = count_tasks(pool, run_id).await?;
    let derived = derive_status(row.status, counts);
    Ok((row, derived))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_status_completed_when_all_done() {
        let s = derive_status(
            RunStatus::Running,
            TaskCounts {
                total: 3,
                done: 3,
                dead: 0,
            },
        );
        assert_eq!(s, RunStatus::Completed);
    }

    #[test]
    fn derive_status_failed_when_any_dead() {
        let s = derive_status(
            RunStatus::Running,
            TaskCounts {
                total: 3,
                done: 2,
                dead: 1,
            },
        );
        assert_eq!(s, RunStatus::Failed);
    }

    #[test]
    fn derive_status_running_while_incomplete() {
        let s = derive_status(
            RunStatus::Running,
            TaskCounts {
                total: 3,
                done: 1,
                dead: 0,
            },
        );
        assert_eq!(s, RunStatus::Running);
    }

    #[test]
    fn derive_status_created_stays_created_before_fanout_advance() {
        let s = derive_status(
            RunStatus::Created,
            TaskCounts {
                total: 0,
                done: 0,
                dead: 0,
            },
        );
        assert_eq!(s, RunStatus::Created);
    }
}
