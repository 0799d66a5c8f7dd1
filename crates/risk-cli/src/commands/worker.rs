//! `risk worker run`: a dev-convenience wrapper that starts one worker loop
//! in the current process. Production deployments run the `risk-runtime`
//! binary instead.

use anyhow::Result;

pub async fn run() -> Result<()> {
    risk_worker::run_worker_from_env().await
}
