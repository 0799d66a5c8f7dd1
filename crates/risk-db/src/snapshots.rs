//! Content-addressed market-data and position snapshots.
//!
//! Both tables follow the same idempotency rule: a re-POST of the same id
//! with the same `payload_hash` is a no-op; a re-POST with a different hash
//! is a `Conflict`.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

use crate::error::{Result, StoreError};

#[derive(Debug, Clone)]
pub struct MarketSnapshotRow {
    pub snapshot_id: String,
    pub payload_hash: String,
    pub payload: Value,
    pub created_at_utc: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PositionSnapshotRow {
    pub position_snapshot_id: String,
    pub payload_hash: String,
    pub payload: Value,
    pub created_at_utc: DateTime<Utc>,
}

/// Outcome of an idempotent snapshot insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    Inserted,
    AlreadyExists,
}

pub async fn put_market_snapshot(
    pool: &PgPool,
    snapshot_id: &str,
    payload: Value,
) -> Result<PutOutcome> {
    let payload_hash = risk_config::payload_hash(&payload);

    if let Some(existing) = get_market_snapshot(pool, snapshot_id).await? {
        return if existing.payload_hash == payload_hash {
            Ok(PutOutcome::AlreadyExists)
        } else {
            Err(StoreError::Conflict(format!(
                "snapshot_id {snapshot_id} already exists with a different payload_hash"
            )))
        };
    }

    sqlx::query(
        r#"
        insert into marketdata_snapshot (snapshot_id, payload_hash, payload)
        values ($1, $2, $3)
        on conflict (snapshot_id) do nothing
        "#,
    )
    .bind(snapshot_id)
    .bind(&payload_hash)
    .bind(&payload)
    .execute(pool)
    .await?;

    Ok(PutOutcome::Inserted)
}

pub async fn get_market_snapshot(
    pool: &PgPool,
    snapshot_id: &str,
) -> Result<Option<MarketSnapshotRow>> {
    let row = sqlx::query_as::<_, (String, String, Value, DateTime<Utc>)>(
        r#"
        select snapshot_id, payload_hash, payload, created_at_utc
        from marketdata_snapshot
        where snapshot_id = $1
        "#,
    )
    .bind(snapshot_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|(snapshot_id, payload_hash, payload, created_at_utc)| MarketSnapshotRow {
        snapshot_id,
        payload_hash,
        payload,
        created_at_utc,
    }))
}

pub async fn put_position_snapshot(
    pool: &PgPool,
    position_snapshot_id: &str,
    payload: Value,
) -> Result<PutOutcome> {
    let payload_hash = risk_config::payload_hash(&payload);

    if let Some(existing) = get_position_snapshot(pool, position_snapshot_id).await? {
        return if existing.payload_hash == payload_hash {
            Ok(PutOutcome::AlreadyExists)
        } else {
            Err(StoreError::Conflict(format!(
                "position_snapshot_id {position_snapshot_id} already exists with a different payload_hash"
            )))
        };
    }

    sqlx::query(
        r#"
        insert into position_snapshot (position_snapshot_id, payload_hash, payload)
        values ($1, $2, $3)
        on conflict (position_snapshot_id) do nothing
        "#,
    )
    .bind(position_snapshot_id)
    .bind(&payload_hash)
    .bind(&payload)
    .execute(pool)
    .await?;

    Ok(PutOutcome::Inserted)
}

pub async fn get_position_snapshot(
    pool: &PgPool,
    position_snapshot_id: &str,
) -> Result<Option<PositionSnapshotRow>> {
    let row = sqlx::query_as::<_, (String, String, Value, DateTime<Utc>)>(
        r#"
        select position_snapshot_id, payload_hash, payload, created_at_utc
        from position_snapshot
        where position_snapshot_id = $1
        "#,
    )
    .bind(position_snapshot_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(
        |(position_snapshot_id, payload_hash, payload, created_at_utc)| PositionSnapshotRow {
            position_snapshot_id,
            payload_hash,
            payload,
            created_at_utc,
        },
    ))
}
