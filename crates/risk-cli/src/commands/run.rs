//! `risk run submit` and `risk run status`: run-lifecycle command handlers.

use anyhow::{Context, Result};
use risk_schemas::RunRequest;
use uuid::Uuid;

/// Read a `RunRequest` JSON document from `path`, submit it, and print the
/// resulting status. Uses the same `risk_worker::submit_run` sequence as
/// `POST /v1/runs`, so a run created from the CLI and one created through
/// the daemon fan out identically.
pub async fn submit(path: String) -> Result<()> {
    let raw = std::fs::read_to_string(&path).with_context(|| format!("reading run request from {path}"))?;
    let req: RunRequest = serde_json::from_str(&raw).context("run request is not valid JSON")?;

    let settings = risk_config::Settings::from_env()?;
    let pool = risk_db::connect(&settings.database_url).await?;
    risk_db::migrate(&pool).await?;

    let outcome = risk_worker::submit_run(
        &pool,
        &req,
        settings.run_task_max_attempts,
        &settings.positions_snapshot_path,
    )
    .await?;
    let (_, status) = risk_db::fetch_run_with_derived_status(&pool, req.run_id).await?;
    let counts = risk_db::count_tasks(&pool, req.run_id).await?;

    println!("run_id={}", req.run_id);
    println!("insert_outcome={:?}", outcome);
    println!("status={}", status.as_str());
    println!("tasks_total={}", counts.total);
    Ok(())
}

pub async fn status(run_id: String) -> Result<()> {
    let run_id = Uuid::parse_str(&run_id).context("invalid run_id uuid")?;
    let pool = risk_db::connect_from_env().await?;

    let (_, status) = risk_db::fetch_run_with_derived_status(&pool, run_id).await?;
    let counts = risk_db::count_tasks(&pool, run_id).await?;

    println!("run_id={}", run_id);
    println!("status={}", status.as_str());
    println!("tasks_total={}", counts.total);
    println!("tasks_done={}", counts.done);
    println!("tasks_dead={}", counts.dead);
    Ok(())
}
