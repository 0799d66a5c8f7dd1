//! Process-level bootstrap shared by the `risk-runtime` worker binary and
//! `risk-cli worker run`'s dev-convenience wrapper, so the two entry points
//! start a worker identically.

use anyhow::Result;

use crate::worker::{shutdown_signal, Worker, WorkerConfig};

/// Load settings from the environment, connect and migrate, and run one
/// worker loop until shutdown.
pub async fn run_worker_from_env() -> Result<()> {
    let settings = risk_config::Settings::from_env()?;
    let pool = risk_db::connect(&settings.database_url).await?;
    risk_db::migrate(&pool).await?;

    let worker = Worker::new(
        pool,
        WorkerConfig {
            worker_id: settings.worker_id.clone(),
            lease_seconds: settings.worker_lease_seconds,
            claim_batch_size: 10,
            poll_interval: std::time::Duration::from_secs(1),
        },
    );

    tracing::info!(worker_id = %settings.worker_id, "starting risk worker");
    worker.run_until(shutdown_signal()).await
}
