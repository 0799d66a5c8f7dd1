pub mod bootstrap;
pub mod fanout;
pub mod orchestrate;
pub mod worker;

pub use bootstrap::run_worker_from_env;
pub use fanout::{bucket_for, partition_into_tasks, stable_hash, FanoutPlan};
pub use orchestrate::submit_run;
pub use worker::{shutdown_signal, Worker, WorkerConfig};
