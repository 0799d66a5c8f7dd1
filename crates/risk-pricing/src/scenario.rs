//! Scenario application. `apply_scenario` produces a deep, independent copy
//! of the snapshot with the scenario's bumps applied; the original is never
//! mutated. Scenarios compose by name only — no combination of scenarios is
//! implied.

use risk_schemas::{MarketSnapshotPayload, ScenarioId};

const RATES_PARALLEL_BUMP: f64 = 0.0001;
const SPREAD_BUMP: f64 = 0.0025;
const FX_SPOT_MULTIPLIER: f64 = 1.01;

pub fn apply_scenario(
    snapshot: &MarketSnapshotPayload,
    scenario_id: ScenarioId,
) -> MarketSnapshotPayload {
    let mut bumped = snapshot.clone();

    match scenario_id {
        ScenarioId::Base => {}
        ScenarioId::RatesParallel1Bp => {
            for curve in bumped.rates_curves.values_mut() {
                for node in curve.nodes.iter_mut() {
                    node.value += RATES_PARALLEL_BUMP;
                }
            }
        }
        ScenarioId::Spread25Bp => {
            for curve in bumped.credit_curves.values_mut() {
                for node in curve.nodes.iter_mut() {
                    node.value += SPREAD_BUMP;
                }
            }
        }
        ScenarioId::FxSpot1Pct => {
            for spot in bumped.fx_spots.values_mut() {
                *spot *= FX_SPOT_MULTIPLIER;
            }
        }
    }

    bumped
}

#[cfg(test)]
mod tests {
    use super::*;
    use risk_config::payload_hash;
    use risk_schemas::{Curve, CurveNode};
    use std::collections::BTreeMap;

    fn sample_snapshot() -> MarketSnapshotPayload {
        let mut rates_curves = BTreeMap::new();
        rates_curves.insert(
            "USD".to_string(),
            Curve {
                curve_id: "USD".to_string(),
                currency: "USD".to_string(),
                nodes: vec![
                    CurveNode { tenor_years: 1.0, value: 0.05 },
                    CurveNode { tenor_years: 5.0, value: 0.05 },
                ],
            },
        );
        let mut credit_curves = BTreeMap::new();
        credit_curves.insert(
            "USD_IG".to_string(),
            Curve {
                curve_id: "USD_IG".to_string(),
                currency: "USD".to_string(),
                nodes: vec![CurveNode { tenor_years: 5.0, value: 0.01 }],
            },
        );
        let mut fx_spots = BTreeMap::new();
        fx_spots.insert("EUR/USD".to_string(), 1.1);

        MarketSnapshotPayload {
            rates_curves,
            credit_curves,
            fx_spots,
        }
    }

    fn to_json(s: &MarketSnapshotPayload) -> serde_json::Value {
        serde_json::to_value(s).unwrap()
    }

    #[test]
    fn base_is_identity_and_does_not_mutate_input() {
        let snap = sample_snapshot();
        let before_hash = payload_hash(&to_json(&snap));

        let bumped = apply_scenario(&snap, ScenarioId::Base);

        assert_eq!(payload_hash(&to_json(&snap)), before_hash);
        assert_eq!(payload_hash(&to_json(&bumped)), before_hash);
    }

    #[test]
    fn rates_parallel_bump_shifts_every_rates_node_by_one_bp() {
        let snap = sample_snapshot();
        let bumped = apply_scenario(&snap, ScenarioId::RatesParallel1Bp);

        for (curve_id, curve) in &bumped.rates_curves {
            let original = snap.rates_curve(curve_id).unwrap();
            for (b, o) in curve.nodes.iter().zip(original.nodes.iter()) {
                assert!((b.value - (o.value + RATES_PARALLEL_BUMP)).abs() < 1e-12);
            }
        }
        // Credit curves and fx spots are untouched.
        assert_eq!(bumped.credit_curves, snap.credit_curves);
        assert_eq!(bumped.fx_spots, snap.fx_spots);
    }

    #[test]
    fn spread_bump_shifts_only_credit_curves() {
        let snap = sample_snapshot();
        let bumped = apply_scenario(&snap, ScenarioId::Spread25Bp);

        let original = snap.credit_curve("USD_IG").unwrap();
        let new = bumped.credit_curve("USD_IG").unwrap();
        assert!((new.nodes[0].value - (original.nodes[0].value + SPREAD_BUMP)).abs() < 1e-12);
        assert_eq!(bumped.rates_curves, snap.rates_curves);
    }

    #[test]
    fn fx_spot_bump_multiplies_every_spot_by_1_01() {
        let snap = sample_snapshot();
        let bumped = apply_scenario(&snap, ScenarioId::FxSpot1Pct);

        let original = snap.fx_spot("EUR/USD").unwrap();
        let new = bumped.fx_spot("EUR/USD").unwrap();
        assert!((new - original * FX_SPOT_MULTIPLIER).abs() < 1e-12);
    }

    #[test]
    fn scenarios_never_mutate_the_original_snapshot() {
        let snap = sample_snapshot();
        let original_hash = payload_hash(&to_json(&snap));

        let _ = apply_scenario(&snap, ScenarioId::RatesParallel1Bp);
        let _ = apply_scenario(&snap, ScenarioId::Spread25Bp);
        let _ = apply_scenario(&snap, ScenarioId::FxSpot1Pct);

        assert_eq!(payload_hash(&to_json(&snap)), original_hash);
    }
}
