//! The task queue: insertion (fanout), lease claim, heartbeat, complete and
//! fail. `claim_tasks` is the atomic heart of the whole system — it uses
//! `SELECT ... FOR UPDATE SKIP LOCKED` so two concurrent claimers never
//! observe the same row as claimable, the same primitive this codebase's
//! lineage uses for its outbox dispatch claim.

use chrono::{DateTime, Utc};
use risk_schemas::TaskState;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Result, StoreError};

#[derive(Debug, Clone)]
pub struct NewTask {
    pub product_type: String,
    pub hash_bucket: i32,
    pub payload: Value,
    pub max_attempts: i32,
}

#[derive(Debug, Clone)]
pub struct TaskRow {
    pub task_id: i64,
    pub run_id: Uuid,
    pub product_type: String,
    pub hash_bucket: i32,
    pub state: TaskState,
    pub attempts: i32,
    pub max_attempts: i32,
    pub leased_until: Option<DateTime<Utc>>,
    pub leased_by: Option<String>,
    pub last_error: Option<String>,
    pub payload: Value,
    pub created_at_utc: DateTime<Utc>,
}

/// Insert a batch of `QUEUED` tasks for a run. Used once by fanout; never
/// called again for that run (tasks are not added after the run is created).
pub async fn insert_tasks(pool: &PgPool, run_id: Uuid, tasks: &[NewTask]) -> Result<()> {
    let mut tx = pool.begin().await?;

    for t in tasks {
        sqlx::query(
            r#"
            insert into run_task (run_id, product_type, hash_bucket, state, attempts, max_attempts, payload)
            values ($1, $2, $3, 'QUEUED', 0, $4, $5)
            on conflict (run_id, product_type, hash_bucket) do nothing
            "#,
        )
        .bind(run_id)
        .bind(&t.product_type)
        .bind(t.hash_bucket)
        .bind(t.max_attempts)
        .bind(&t.payload)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

fn row_from_tuple(
    tup: (
        i64,
        Uuid,
        String,
        i32,
        String,
        i32,
        i32,
        Option<DateTime<Utc>>,
        Option<String>,
        Option<String>,
        Value,
        DateTime<Utc>,
    ),
) -> Result<TaskRow> {
    let (
        task_id,
        run_id,
        product_type,
        hash_bucket,
        state,
        attempts,
        max_attempts,
        leased_until,
        leased_by,
        last_error,
        payload,
        created_at_utc,
    ) = tup;

    Ok(TaskRow {
        task_id,
        run_id,
        product_type,
        hash_bucket,
        state: TaskState::parse(&state).map_err(StoreError::Internal)?,
        attempts,
        max_attempts,
        leased_until,
        leased_by,
        last_error,
        payload,
        created_at_utc,
    })
}

/// Atomically claim up to `limit` claimable tasks (`QUEUED`, or `LEASED`
/// with an expired lease) for exclusive processing by `worker_id`.
pub async fn claim_tasks(
    pool: &PgPool,
    worker_id: &str,
    lease_seconds: i64,
    limit: i64,
) -> Result<Vec<TaskRow>> {
    let rows = sqlx::query_as::<
        _,
        (
            i64,
            Uuid,
            String,
            i32,
            String,
            i32,
            i32,
            Option<DateTime<Utc>>,
            Option<String>,
            Option<String>,
            Value,
            DateTime<Utc>,
        ),
    >(
        r#"
        with to_claim as (
            select task_id
            from run_task
            where state = 'QUEUED'
               or (state = 'LEASED' and leased_until < now())
            order by created_at_utc asc
            limit $1
            for update skip locked
        )
        update run_task
           set state = 'LEASED',
               leased_by = $2,
               leased_until = now() + ($3::bigint * interval '1 second'),
               attempts = attempts + 1,
               last_error = null,
               updated_at_utc = now()
         where task_id in (select task_id from to_claim)
        returning task_id, run_id, product_type, hash_bucket, state, attempts, max_attempts,
                  leased_until, leased_by, last_error, payload, created_at_utc
        "#,
    )
    .bind(limit)
    .bind(worker_id)
    .bind(lease_seconds)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(row_from_tuple).collect()
}

/// Heartbeat: push `leased_until` forward without releasing the row. Only
/// succeeds while the caller still holds the lease.
pub async fn extend_lease(
    pool: &PgPool,
    task_id: i64,
    worker_id: &str,
    lease_seconds: i64,
) -> Result<bool> {
    let updated: Option<(i64,)> = sqlx::query_as(
        r#"
        update run_task
           set leased_until = now() + ($3::bigint * interval '1 second'),
               updated_at_utc = now()
         where task_id = $1
           and leased_by = $2
           and state = 'LEASED'
        returning task_id
        "#,
    )
    .bind(task_id)
    .bind(worker_id)
    .bind(lease_seconds)
    .fetch_optional(pool)
    .await?;

    Ok(updated.is_some())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// The task was already `DONE` (a replayed commit); no new work happened.
    AlreadyDone,
    /// The caller's lease was lost (expired and reclaimed by another
    /// worker); the caller must not write results.
    LeaseLost,
}

/// Write all results for a task and mark it `DONE`, in one transaction.
/// `write_results` is invoked with the open transaction so the caller can
/// upsert `valuation_result` rows as part of the same atomic unit.
pub async fn complete_task<F>(
    pool: &PgPool,
    task_id: i64,
    worker_id: &str,
    write_results: F,
) -> Result<CommitOutcome>
where
    F: for<'c> FnOnce(
        &'c mut sqlx::Transaction<'_, sqlx::Postgres>,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + Send + 'c>>,
{
    let mut tx = pool.begin().await?;

    let current: Option<(String, Option<String>)> = sqlx::query_as(
        r#"select state, leased_by from run_task where task_id = $1 for update"#,
    )
    .bind(task_id)
    .fetch_optional(&mut *tx)
    .await?;

    let (state, leased_by) = match current {
        Some(v) => v,
        None => return Err(StoreError::NotFound(format!("task {task_id} not found"))),
    };

    if state == "DONE" {
        tx.commit().await?;
        return Ok(CommitOutcome::AlreadyDone);
    }

    if state != "LEASED" || leased_by.as_deref() != Some(worker_id) {
        tx.commit().await?;
        return Ok(CommitOutcome::LeaseLost);
    }

    write_results(&mut tx).await?;

    sqlx::query(
        r#"
        update run_task
           set state = 'DONE',
               leased_until = null,
               leased_by = null,
               last_error = null,
               updated_at_utc = now()
         where task_id = $1
        "#,
    )
    .bind(task_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(CommitOutcome::Committed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOutcome {
    RequeuedForRetry,
    DeadLettered,
}

/// Record a pricing failure. Returns the task to `QUEUED` if attempts
/// remain, otherwise transitions it to the terminal `DEAD` state.
pub async fn fail_task(pool: &PgPool, task_id: i64, last_error: &str) -> Result<FailOutcome> {
    let mut tx = pool.begin().await?;

    let (attempts, max_attempts): (i32, i32) = sqlx::query_as(
        r#"select attempts, max_attempts from run_task where task_id = $1 for update"#,
    )
    .bind(task_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| StoreError::NotFound(format!("task {task_id} not found")))?;

    let outcome = if attempts < max_attempts {
        sqlx::query(
            r#"
            update run_task
               set state = 'QUEUED',
                   leased_until = null,
                   leased_by = null,
                   last_error = $2,
                   updated_at_utc = now()
             where task_id = $1
            "#,
        )
        .bind(task_id)
        .bind(last_error)
        .execute(&mut *tx)
        .await?;
        FailOutcome::RequeuedForRetry
    } else {
        sqlx::query(
            r#"
            update run_task
               set state = 'DEAD',
                   leased_until = null,
                   leased_by = null,
                   last_error = $2,
                   updated_at_utc = now()
             where task_id = $1
            "#,
        )
        .bind(task_id)
        .bind(last_error)
        .execute(&mut *tx)
        .await?;
        FailOutcome::DeadLettered
    };

    tx.commit().await?;
    Ok(outcome)
}

/// Dead-letter a task immediately regardless of remaining attempts. Used for
/// terminal, non-retryable failures such as an unknown product type.
pub async fn dead_letter_task(pool: &PgPool, task_id: i64, last_error: &str) -> Result<()> {
    sqlx::query(
        r#"
        update run_task
           set state = 'DEAD',
               leased_until = null,
               leased_by = null,
               last_error = $2,
               updated_at_utc = now()
         where task_id = $1
        "#,
    )
    .bind(task_id)
    .bind(last_error)
    .execute(pool)
    .await?;
    Ok(())
}
