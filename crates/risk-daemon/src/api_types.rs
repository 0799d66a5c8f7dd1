//! Request and response types for every risk-daemon HTTP endpoint. These
//! types are `Serialize`/`Deserialize` only; no business logic lives here.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
    pub database: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: &'static str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PutSnapshotRequest {
    pub snapshot_id: String,
    pub payload: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct PutSnapshotResponse {
    pub snapshot_id: String,
    pub payload_hash: String,
    pub inserted: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PutPositionSnapshotRequest {
    pub position_snapshot_id: String,
    pub payload: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResponse {
    pub run_id: Uuid,
    pub status: String,
    pub task_count: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunStatusResponse {
    pub run_id: Uuid,
    pub status: String,
    pub tasks_total: i64,
    pub tasks_done: i64,
    pub tasks_dead: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResultsQuery {
    #[serde(default = "default_scenario_id")]
    pub scenario_id: String,
}

fn default_scenario_id() -> String {
    "BASE".to_string()
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryResponse {
    pub run_id: Uuid,
    pub scenario_id: String,
    pub rows: i64,
    pub pv_sum: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CubeQuery {
    pub measure: String,
    #[serde(rename = "by")]
    pub group_by: String,
    #[serde(default = "default_scenario_id")]
    pub scenario_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CubeRowResponse {
    pub key: String,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CubeResponse {
    pub run_id: Uuid,
    pub measure: String,
    pub scenario_id: String,
    pub rows: Vec<CubeRowResponse>,
}
