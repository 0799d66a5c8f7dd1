pub mod error;
pub mod results;
pub mod runs;
pub mod snapshots;
pub mod store;
pub mod tasks;

pub use error::{Result, StoreError};
pub use results::{cube, summary, upsert_valuation_result, CubeRow, GroupBy, Summary};
pub use runs::{
    advance_to_running, count_tasks, derive_status, fetch_run, fetch_run_with_derived_status,
    insert_run, InsertRunOutcome, NewRun, RunRow, TaskCounts,
};
pub use snapshots::{
    get_market_snapshot, get_position_snapshot, put_market_snapshot, put_position_snapshot,
    MarketSnapshotRow, PositionSnapshotRow, PutOutcome,
};
pub use store::{connect, connect_and_migrate_from_env, connect_from_env, migrate, status, DbStatus, ENV_DB_URL};
pub use tasks::{
    claim_tasks, complete_task, dead_letter_task, extend_lease, fail_task, insert_tasks,
    CommitOutcome, FailOutcome, NewTask, TaskRow,
};
