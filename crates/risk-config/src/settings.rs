//! Process environment configuration.
//!
//! Recognized options: `database_url` (required), `worker_id`,
//! `worker_lease_seconds`, `run_task_hash_mod`, `run_task_max_attempts`,
//! `positions_snapshot_path`. Parsed by hand from `std::env::var` with typed
//! defaults rather than via a derive-macro config crate, matching this
//! codebase's preference for explicit, dependency-light env parsing.

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub worker_id: String,
    pub worker_lease_seconds: i64,
    pub run_task_hash_mod: u32,
    pub run_task_max_attempts: i32,
    pub positions_snapshot_path: String,
}

const ENV_DATABASE_URL: &str = "DATABASE_URL";
const ENV_WORKER_ID: &str = "WORKER_ID";
const ENV_WORKER_LEASE_SECONDS: &str = "WORKER_LEASE_SECONDS";
const ENV_RUN_TASK_HASH_MOD: &str = "RUN_TASK_HASH_MOD";
const ENV_RUN_TASK_MAX_ATTEMPTS: &str = "RUN_TASK_MAX_ATTEMPTS";
const ENV_POSITIONS_SNAPSHOT_PATH: &str = "POSITIONS_SNAPSHOT_PATH";

const DEFAULT_WORKER_ID: &str = "worker-1";
const DEFAULT_WORKER_LEASE_SECONDS: i64 = 60;
const DEFAULT_RUN_TASK_HASH_MOD: u32 = 1;
const DEFAULT_RUN_TASK_MAX_ATTEMPTS: i32 = 3;
const DEFAULT_POSITIONS_SNAPSHOT_PATH: &str = "demo/positions.json";

impl Settings {
    /// Load settings from the process environment. `database_url` is
    /// required; every other key falls back to its documented default.
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var(ENV_DATABASE_URL)
            .with_context(|| format!("missing required env var {ENV_DATABASE_URL}"))?;

        let worker_id =
            std::env::var(ENV_WORKER_ID).unwrap_or_else(|_| DEFAULT_WORKER_ID.to_string());

        let worker_lease_seconds = parse_env_or(
            ENV_WORKER_LEASE_SECONDS,
            DEFAULT_WORKER_LEASE_SECONDS,
        )?;

        let run_task_hash_mod = parse_env_or(ENV_RUN_TASK_HASH_MOD, DEFAULT_RUN_TASK_HASH_MOD)?;

        let run_task_max_attempts =
            parse_env_or(ENV_RUN_TASK_MAX_ATTEMPTS, DEFAULT_RUN_TASK_MAX_ATTEMPTS)?;

        let positions_snapshot_path = std::env::var(ENV_POSITIONS_SNAPSHOT_PATH)
            .unwrap_or_else(|_| DEFAULT_POSITIONS_SNAPSHOT_PATH.to_string());

        Ok(Self {
            database_url,
            worker_id,
            worker_lease_seconds,
            run_task_hash_mod,
            run_task_max_attempts,
            positions_snapshot_path,
        })
    }
}

fn parse_env_or<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid value for {key}: {e}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Serializes env-var mutation across tests in this module; std::env is
    // process-global, and Rust test binaries run tests concurrently by
    // default.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults_apply_when_optional_vars_unset() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var(ENV_DATABASE_URL, "postgres://localhost/test");
        std::env::remove_var(ENV_WORKER_ID);
        std::env::remove_var(ENV_WORKER_LEASE_SECONDS);
        std::env::remove_var(ENV_RUN_TASK_HASH_MOD);
        std::env::remove_var(ENV_RUN_TASK_MAX_ATTEMPTS);
        std::env::remove_var(ENV_POSITIONS_SNAPSHOT_PATH);

        let s = Settings::from_env().unwrap();
        assert_eq!(s.worker_id, DEFAULT_WORKER_ID);
        assert_eq!(s.worker_lease_seconds, DEFAULT_WORKER_LEASE_SECONDS);
        assert_eq!(s.run_task_hash_mod, DEFAULT_RUN_TASK_HASH_MOD);
        assert_eq!(s.run_task_max_attempts, DEFAULT_RUN_TASK_MAX_ATTEMPTS);
        assert_eq!(s.positions_snapshot_path, DEFAULT_POSITIONS_SNAPSHOT_PATH);
    }

    #[test]
    fn missing_database_url_is_an_error() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var(ENV_DATABASE_URL);
        assert!(Settings::from_env().is_err());
    }
}
