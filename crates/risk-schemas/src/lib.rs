use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Measures & scenarios
// ---------------------------------------------------------------------------

/// A named scalar pricing output. New measures are added here as the pricer
/// registry grows; unknown measure strings are rejected at run-creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Measure {
    #[serde(rename = "PV")]
    Pv,
    #[serde(rename = "DV01")]
    Dv01,
    #[serde(rename = "FX_DELTA")]
    FxDelta,
    #[serde(rename = "ACCRUED_INTEREST")]
    AccruedInterest,
}

impl Measure {
    pub fn as_str(&self) -> &'static str {
        match self {
            Measure::Pv => "PV",
            Measure::Dv01 => "DV01",
            Measure::FxDelta => "FX_DELTA",
            Measure::AccruedInterest => "ACCRUED_INTEREST",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "PV" => Ok(Measure::Pv),
            "DV01" => Ok(Measure::Dv01),
            "FX_DELTA" => Ok(Measure::FxDelta),
            "ACCRUED_INTEREST" => Ok(Measure::AccruedInterest),
            other => Err(anyhow!("unknown measure: {other}")),
        }
    }
}

impl std::fmt::Display for Measure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named perturbation of a market snapshot, applied before pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScenarioId {
    #[serde(rename = "BASE")]
    Base,
    #[serde(rename = "RATES_PARALLEL_1BP")]
    RatesParallel1Bp,
    #[serde(rename = "SPREAD_25BP")]
    Spread25Bp,
    #[serde(rename = "FX_SPOT_1PCT")]
    FxSpot1Pct,
}

impl ScenarioId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioId::Base => "BASE",
            ScenarioId::RatesParallel1Bp => "RATES_PARALLEL_1BP",
            ScenarioId::Spread25Bp => "SPREAD_25BP",
            ScenarioId::FxSpot1Pct => "FX_SPOT_1PCT",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "BASE" => Ok(ScenarioId::Base),
            "RATES_PARALLEL_1BP" => Ok(ScenarioId::RatesParallel1Bp),
            "SPREAD_25BP" => Ok(ScenarioId::Spread25Bp),
            "FX_SPOT_1PCT" => Ok(ScenarioId::FxSpot1Pct),
            other => Err(anyhow!("unknown scenario id: {other}")),
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Default for ScenarioId {
    fn default() -> Self {
        ScenarioId::Base
    }
}

// ---------------------------------------------------------------------------
// Market data
// ---------------------------------------------------------------------------

/// A single point on a curve: time-to-node in years, and the node value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveNode {
    pub tenor_years: f64,
    pub value: f64,
}

/// A named yield or credit-spread curve, flat-interpolated by the pricers
/// (interpolation method is out of scope for this repo; pricers own it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    pub curve_id: String,
    pub currency: String,
    pub nodes: Vec<CurveNode>,
}

/// An immutable, content-hashed market snapshot payload.
///
/// `rates_curves` and `credit_curves` are keyed by `curve_id`; `fx_spots` are
/// keyed by a `"BASE/QUOTE"` pair (e.g. `"EUR/USD"`).
/// The payload stored under a `position_snapshot_id`: the full universe of
/// positions a run's `portfolio_node_ids` filter selects from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PositionSnapshotPayload {
    pub positions: Vec<Position>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MarketSnapshotPayload {
    pub rates_curves: BTreeMap<String, Curve>,
    pub credit_curves: BTreeMap<String, Curve>,
    pub fx_spots: BTreeMap<String, f64>,
}

impl MarketSnapshotPayload {
    pub fn rates_curve(&self, curve_id: &str) -> Option<&Curve> {
        self.rates_curves.get(curve_id)
    }

    pub fn credit_curve(&self, curve_id: &str) -> Option<&Curve> {
        self.credit_curves.get(curve_id)
    }

    pub fn fx_spot(&self, pair: &str) -> Option<f64> {
        self.fx_spots.get(pair).copied()
    }
}

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

/// A single position. `attributes` carries the embedded instrument data plus
/// any product-specific fields pricers need; instrument data stays coupled
/// to the position rather than living in a separate instrument table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub position_id: String,
    pub product_type: String,
    pub portfolio_node_id: String,
    pub currency: String,
    pub attributes: Value,
}

impl Position {
    pub fn product_type_upper(&self) -> String {
        self.product_type.to_uppercase()
    }
}

// ---------------------------------------------------------------------------
// Run requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionOptions {
    #[serde(default = "default_hash_mod")]
    pub hash_mod: u32,
}

fn default_hash_mod() -> u32 {
    1
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            hash_mod: default_hash_mod(),
        }
    }
}

/// Scope of a run: the set of portfolio node identifiers to resolve positions
/// for. Resolution itself (via `position_snapshot_id` or a configured file
/// path) happens in the orchestrator, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioScope {
    pub portfolio_node_ids: Vec<String>,
    pub position_snapshot_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRequest {
    pub run_id: Uuid,
    pub run_type: String,
    pub as_of_time: DateTime<Utc>,
    pub market_snapshot_id: String,
    pub portfolio_scope: PortfolioScope,
    pub measures: Vec<Measure>,
    #[serde(default = "default_scenarios")]
    pub scenarios: Vec<ScenarioId>,
    #[serde(default)]
    pub execution: ExecutionOptions,
}

fn default_scenarios() -> Vec<ScenarioId> {
    vec![ScenarioId::Base]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Created,
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Created => "CREATED",
            RunStatus::Running => "RUNNING",
            RunStatus::Completed => "COMPLETED",
            RunStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "CREATED" => Ok(RunStatus::Created),
            "RUNNING" => Ok(RunStatus::Running),
            "COMPLETED" => Ok(RunStatus::Completed),
            "FAILED" => Ok(RunStatus::Failed),
            other => Err(anyhow!("invalid run status: {other}")),
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    Queued,
    Leased,
    Done,
    Failed,
    Dead,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Queued => "QUEUED",
            TaskState::Leased => "LEASED",
            TaskState::Done => "DONE",
            TaskState::Failed => "FAILED",
            TaskState::Dead => "DEAD",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "QUEUED" => Ok(TaskState::Queued),
            "LEASED" => Ok(TaskState::Leased),
            "DONE" => Ok(TaskState::Done),
            "FAILED" => Ok(TaskState::Failed),
            "DEAD" => Ok(TaskState::Dead),
            other => Err(anyhow!("invalid task state: {other}")),
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The payload carried by a single task: the slice of positions it owns plus
/// the measures/scenarios every position in the slice must be priced under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskPayload {
    pub market_snapshot_id: String,
    pub product_type: String,
    pub hash_bucket: i32,
    pub positions: Vec<Position>,
    pub measures: Vec<Measure>,
    pub scenarios: Vec<ScenarioId>,
}

/// One `(position, scenario)` valuation result, keyed for idempotent upsert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationResult {
    pub run_id: Uuid,
    pub position_id: String,
    pub scenario_id: ScenarioId,
    pub product_type: String,
    pub portfolio_node_id: String,
    pub currency: String,
    pub measures: BTreeMap<String, f64>,
    pub input_hash: String,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Shared error taxonomy. Every crate boundary maps its own error type into
/// this one where it needs to cross into HTTP responses or task outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    Conflict,
    Transient,
    PricerError,
    Fatal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::Transient => "TRANSIENT",
            ErrorKind::PricerError => "PRICER_ERROR",
            ErrorKind::Fatal => "FATAL",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measure_round_trips_through_as_str_and_parse() {
        for m in [Measure::Pv, Measure::Dv01, Measure::FxDelta, Measure::AccruedInterest] {
            assert_eq!(Measure::parse(m.as_str()).unwrap(), m);
        }
    }

    #[test]
    fn scenario_id_round_trips_through_as_str_and_parse() {
        for s in [
            ScenarioId::Base,
            ScenarioId::RatesParallel1Bp,
            ScenarioId::Spread25Bp,
            ScenarioId::FxSpot1Pct,
        ] {
            assert_eq!(ScenarioId::parse(s.as_str()).unwrap(), s);
        }
    }

    #[test]
    fn unknown_measure_is_rejected() {
        assert!(Measure::parse("NOT_A_MEASURE").is_err());
    }

    #[test]
    fn default_scenario_is_base() {
        assert_eq!(ScenarioId::default(), ScenarioId::Base);
    }

    #[test]
    fn run_request_defaults_scenarios_to_base_when_omitted() {
        let json = serde_json::json!({
            "run_id": "00000000-0000-0000-0000-000000000001",
            "run_type": "VALUATION",
            "as_of_time": "2026-01-01T00:00:00Z",
            "market_snapshot_id": "SNAP-1",
            "portfolio_scope": {"portfolio_node_ids": ["DESK-1"], "position_snapshot_id": null},
            "measures": ["PV"]
        });
        let req: RunRequest = serde_json::from_value(json).unwrap();
        assert_eq!(req.scenarios, vec![ScenarioId::Base]);
        assert_eq!(req.execution.hash_mod, 1);
    }
}
