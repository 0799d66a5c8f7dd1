//! Generic internal-bump sensitivity helpers shared by every pricer.
//!
//! Sensitivities are never a separate task: a pricer that is asked for DV01
//! or FX_DELTA computes it by re-pricing under an extra internal bump on
//! top of whatever snapshot it was handed (which already reflects the
//! task's own scenario), and reporting the resulting difference. This keeps
//! every pricer's sensitivity numerically consistent with the externally
//! observable PV under the corresponding external scenario, without the
//! worker ever dispatching a second task for it.

use risk_schemas::{MarketSnapshotPayload, ScenarioId};

use crate::scenario::apply_scenario;

/// DV01 = (PV at the received snapshot − PV one rates-parallel bump above
/// it) / 0.0001, so that asking for DV01 under scenario BASE reproduces the
/// externally observable PV delta between BASE and RATES_PARALLEL_1BP.
pub fn dv01_via_internal_bump(
    snapshot: &MarketSnapshotPayload,
    pv_at: impl Fn(&MarketSnapshotPayload) -> f64,
) -> f64 {
    let base_pv = pv_at(snapshot);
    let bumped = apply_scenario(snapshot, ScenarioId::RatesParallel1Bp);
    let bumped_pv = pv_at(&bumped);
    (base_pv - bumped_pv) / 0.0001
}

/// FX_DELTA = (PV one fx-spot bump above the received snapshot − PV at the
/// received snapshot) / 0.01, the same internal-bump convention as DV01 but
/// expressed per unit of spot-rate move rather than per unit of yield move.
pub fn fx_delta_via_internal_bump(
    snapshot: &MarketSnapshotPayload,
    pv_at: impl Fn(&MarketSnapshotPayload) -> f64,
) -> f64 {
    let base_pv = pv_at(snapshot);
    let bumped = apply_scenario(snapshot, ScenarioId::FxSpot1Pct);
    let bumped_pv = pv_at(&bumped);
    (bumped_pv - base_pv) / 0.01
}
