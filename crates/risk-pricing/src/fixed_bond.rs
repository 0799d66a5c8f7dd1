//! FIXED_BOND: a vanilla fixed-coupon bullet bond. Expects
//! `position.attributes` to carry:
//!
//! ```json
//! {
//!   "notional": 1000000.0,
//!   "coupon_rate": 0.05,
//!   "maturity_years": 5.0,
//!   "frequency_per_year": 2,
//!   "discount_curve_id": "USD",
//!   "credit_curve_id": "USD_IG"
//! }
//! ```
//!
//! `discount_curve_id` defaults to the position's currency; `credit_curve_id`
//! is optional and, if present, its value is added to the discount rate at
//! each tenor as a flat spread.

use std::collections::BTreeMap;

use risk_schemas::{MarketSnapshotPayload, Measure, Position};

use crate::curve_math::{discount_factor_periodic, interpolate};
use crate::error::PricerError;
use crate::registry::Pricer;
use crate::sensitivity::{dv01_via_internal_bump, fx_delta_via_internal_bump};

const PRODUCT_TYPE: &str = "FIXED_BOND";

struct Terms {
    notional: f64,
    coupon_rate: f64,
    maturity_years: f64,
    periods_per_year: f64,
    discount_curve_id: String,
    credit_curve_id: Option<String>,
}

fn field<'a>(attrs: &'a serde_json::Value, name: &'static str) -> Result<&'a serde_json::Value, PricerError> {
    attrs.get(name).ok_or_else(|| PricerError::MissingField {
        product_type: PRODUCT_TYPE.to_string(),
        field: name,
    })
}

fn read_terms(position: &Position) -> Result<Terms, PricerError> {
    let attrs = &position.attributes;
    let notional = field(attrs, "notional")?
        .as_f64()
        .ok_or_else(|| PricerError::MissingField { product_type: PRODUCT_TYPE.to_string(), field: "notional" })?;
    let coupon_rate = field(attrs, "coupon_rate")?
        .as_f64()
        .ok_or_else(|| PricerError::MissingField { product_type: PRODUCT_TYPE.to_string(), field: "coupon_rate" })?;
    let maturity_years = field(attrs, "maturity_years")?
        .as_f64()
        .ok_or_else(|| PricerError::MissingField { product_type: PRODUCT_TYPE.to_string(), field: "maturity_years" })?;
    let periods_per_year = attrs
        .get("frequency_per_year")
        .and_then(|v| v.as_f64())
        .unwrap_or(2.0);
    let discount_curve_id = attrs
        .get("discount_curve_id")
        .and_then(|v| v.as_str())
        .unwrap_or(position.currency.as_str())
        .to_string();
    let credit_curve_id = attrs
        .get("credit_curve_id")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    Ok(Terms { notional, coupon_rate, maturity_years, periods_per_year, discount_curve_id, credit_curve_id })
}

fn rate_at(snapshot: &MarketSnapshotPayload, terms: &Terms, tenor_years: f64) -> Option<f64> {
    let base_rate = interpolate(snapshot.rates_curve(&terms.discount_curve_id)?, tenor_years);
    let spread = match &terms.credit_curve_id {
        Some(id) => interpolate(snapshot.credit_curve(id)?, tenor_years),
        None => 0.0,
    };
    Some(base_rate + spread)
}

fn present_value(snapshot: &MarketSnapshotPayload, terms: &Terms) -> Option<f64> {
    let n = (terms.maturity_years * terms.periods_per_year).round() as u64;
    if n == 0 {
        return None;
    }
    let coupon_per_period = terms.notional * terms.coupon_rate / terms.periods_per_year;

    let mut pv = 0.0;
    for k in 1..=n {
        let t = k as f64 / terms.periods_per_year;
        let rate = rate_at(snapshot, terms, t)?;
        let df = discount_factor_periodic(rate, t, terms.periods_per_year);
        pv += coupon_per_period * df;
    }
    let rate_at_maturity = rate_at(snapshot, terms, terms.maturity_years)?;
    pv += terms.notional * discount_factor_periodic(rate_at_maturity, terms.maturity_years, terms.periods_per_year);
    Some(pv)
}

fn accrued_interest(terms: &Terms) -> f64 {
    let period_length = 1.0 / terms.periods_per_year;
    let coupon_per_period = terms.notional * terms.coupon_rate / terms.periods_per_year;
    let time_since_last_coupon = period_length - (terms.maturity_years % period_length);
    let fraction = if period_length > 0.0 { time_since_last_coupon / period_length } else { 0.0 };
    coupon_per_period * fraction
}

pub struct FixedBondPricer;

impl Pricer for FixedBondPricer {
    fn price(
        &self,
        position: &Position,
        snapshot: &MarketSnapshotPayload,
        measures: &[Measure],
    ) -> Result<BTreeMap<String, f64>, PricerError> {
        let terms = read_terms(position)?;
        let pv_at = |snap: &MarketSnapshotPayload| present_value(snap, &terms).unwrap_or(f64::NAN);

        let mut out = BTreeMap::new();
        for measure in measures {
            let value = match measure {
                Measure::Pv => present_value(snapshot, &terms).ok_or_else(|| PricerError::MissingMarketData {
                    what: format!("curve data for {} at {}", position.position_id, terms.discount_curve_id),
                })?,
                Measure::Dv01 => dv01_via_internal_bump(snapshot, pv_at),
                Measure::FxDelta => fx_delta_via_internal_bump(snapshot, pv_at),
                Measure::AccruedInterest => accrued_interest(&terms),
            };
            if !value.is_finite() {
                return Err(PricerError::NonFinite { measure: measure.as_str().to_string() });
            }
            out.insert(measure.as_str().to_string(), value);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use risk_schemas::{Curve, CurveNode};
    use std::collections::BTreeMap as Map;

    fn flat_snapshot(rate: f64) -> MarketSnapshotPayload {
        let mut rates_curves = Map::new();
        rates_curves.insert(
            "USD".to_string(),
            Curve {
                curve_id: "USD".to_string(),
                currency: "USD".to_string(),
                nodes: vec![
                    CurveNode { tenor_years: 0.5, value: rate },
                    CurveNode { tenor_years: 30.0, value: rate },
                ],
            },
        );
        MarketSnapshotPayload { rates_curves, credit_curves: Map::new(), fx_spots: Map::new() }
    }

    fn bond_position() -> Position {
        Position {
            position_id: "bond-1".to_string(),
            product_type: "FIXED_BOND".to_string(),
            portfolio_node_id: "desk-1".to_string(),
            currency: "USD".to_string(),
            attributes: serde_json::json!({
                "notional": 1_000_000.0,
                "coupon_rate": 0.05,
                "maturity_years": 5.0,
                "frequency_per_year": 2
            }),
        }
    }

    #[test]
    fn par_bond_prices_to_notional_when_curve_equals_coupon_rate() {
        let snapshot = flat_snapshot(0.05);
        let position = bond_position();
        let pricer = FixedBondPricer;

        let result = pricer.price(&position, &snapshot, &[Measure::Pv]).unwrap();
        let pv = result["PV"];
        assert!((pv - 1_000_000.0).abs() / 1_000_000.0 < 1e-6, "pv={pv}");
    }

    #[test]
    fn dv01_matches_the_external_rates_parallel_scenario_delta() {
        let snapshot = flat_snapshot(0.05);
        let position = bond_position();
        let pricer = FixedBondPricer;

        let base = pricer.price(&position, &snapshot, &[Measure::Pv, Measure::Dv01]).unwrap();

        let bumped_snapshot = crate::scenario::apply_scenario(&snapshot, risk_schemas::ScenarioId::RatesParallel1Bp);
        let bumped = pricer.price(&position, &bumped_snapshot, &[Measure::Pv]).unwrap();

        let expected_dv01 = (base["PV"] - bumped["PV"]) / 0.0001;
        assert!((base["DV01"] - expected_dv01).abs() < 1e-6);
    }

    #[test]
    fn missing_notional_is_a_missing_field_error() {
        let snapshot = flat_snapshot(0.05);
        let mut position = bond_position();
        position.attributes = serde_json::json!({ "coupon_rate": 0.05, "maturity_years": 5.0 });
        let pricer = FixedBondPricer;

        let err = pricer.price(&position, &snapshot, &[Measure::Pv]).unwrap_err();
        match err {
            PricerError::MissingField { field, .. } => assert_eq!(field, "notional"),
            other => panic!("expected MissingField, got {other:?}"),
        }
    }
}
