//! Valuation result storage and the results-aggregation read path.

use risk_schemas::ValuationResult;
use serde_json::json;
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::Result;

/// Idempotent upsert on `(run_id, position_id, scenario_id)`. Replaying a
/// completed task does not duplicate rows; the most recent `measures` and
/// `input_hash` win.
pub async fn upsert_valuation_result(
    tx: &mut Transaction<'_, Postgres>,
    result: &ValuationResult,
) -> Result<()> {
    let measures_json = json!(result
        .measures
        .iter()
        .map(|(k, v)| (k.clone(), *v))
        .collect::<std::collections::BTreeMap<_, _>>());

    sqlx::query(
        r#"
        insert into valuation_result (
            run_id, position_id, scenario_id, product_type, portfolio_node_id,
            currency, measures, input_hash
        )
        values ($1, $2, $3, $4, $5, $6, $7, $8)
        on conflict (run_id, position_id, scenario_id) do update
           set measures = excluded.measures,
               input_hash = excluded.input_hash,
               product_type = excluded.product_type,
               portfolio_node_id = excluded.portfolio_node_id,
               currency = excluded.currency,
               updated_at_utc = now()
        "#,
    )
    .bind(result.run_id)
    .bind(&result.position_id)
    .bind(result.scenario_id.as_str())
    .bind(&result.product_type)
    .bind(&result.portfolio_node_id)
    .bind(&result.currency)
    .bind(&measures_json)
    .bind(&result.input_hash)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub rows: i64,
    pub pv_sum: f64,
}

/// Row count and total PV for a run under one scenario. Missing `PV` counts
/// as zero.
pub async fn summary(pool: &PgPool, run_id: uuid::Uuid, scenario_id: &str) -> Result<Summary> {
    let (rows, pv_sum): (i64, Option<f64>) = sqlx::query_as(
        r#"
        select
            count(*)::bigint,
            sum(coalesce((measures->>'PV')::double precision, 0.0))
        from valuation_result
        where run_id = $1 and scenario_id = $2
        "#,
    )
    .bind(run_id)
    .bind(scenario_id)
    .fetch_one(pool)
    .await?;

    Ok(Summary {
        rows,
        pv_sum: pv_sum.unwrap_or(0.0),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct CubeRow {
    pub key: String,
    pub value: f64,
}

/// Supported `group_by` dimensions for `cube`. Validated against an
/// allow-list rather than interpolated directly, since `group_by` selects a
/// SQL column name and cannot be bound as a query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    ProductType,
    PortfolioNodeId,
    Currency,
}

impl GroupBy {
    pub fn parse(s: &str) -> std::result::Result<Self, crate::error::StoreError> {
        match s {
            "product_type" => Ok(GroupBy::ProductType),
            "portfolio_node_id" => Ok(GroupBy::PortfolioNodeId),
            "currency" => Ok(GroupBy::Currency),
            other => Err(crate::error::StoreError::InvalidInput(format!(
                "unsupported group_by: {other}"
            ))),
        }
    }

    fn column(self) -> &'static str {
        match self {
            GroupBy::ProductType => "product_type",
            GroupBy::PortfolioNodeId => "portfolio_node_id",
            GroupBy::Currency => "currency",
        }
    }
}

/// Aggregate one measure across a run's valuation results, grouped by
/// `group_by`, under one scenario.
pub async fn cube(
    pool: &PgPool,
    run_id: uuid::Uuid,
    measure: &str,
    group_by: GroupBy,
    scenario_id: &str,
) -> Result<Vec<CubeRow>> {
    let column = group_by.column();
    let sql = format!(
        r#"
        select {column} as key,
               sum(coalesce((measures->>$1)::double precision, 0.0)) as value
        from valuation_result
        where run_id = $2 and scenario_id = $3
        group by {column}
        "#
    );

    let rows: Vec<(String, f64)> = sqlx::query_as(&sql)
        .bind(measure)
        .bind(run_id)
        .bind(scenario_id)
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(key, value)| CubeRow { key, value })
        .collect())
}
