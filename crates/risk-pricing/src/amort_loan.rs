//! AMORT_LOAN: a level-payment amortizing loan. Expects
//! `position.attributes`:
//!
//! ```json
//! {
//!   "principal": 500000.0,
//!   "coupon_rate": 0.06,
//!   "maturity_years": 10.0,
//!   "frequency_per_year": 12,
//!   "discount_curve_id": "USD"
//! }
//! ```
//!
//! The periodic payment is the standard fixed annuity payment computed from
//! the loan's own coupon rate; the discount curve (possibly a different
//! rate from the coupon) is used to mark the remaining cashflows to market.

use std::collections::BTreeMap;

use risk_schemas::{MarketSnapshotPayload, Measure, Position};

use crate::curve_math::{discount_factor_periodic, interpolate};
use crate::error::PricerError;
use crate::registry::Pricer;
use crate::sensitivity::{dv01_via_internal_bump, fx_delta_via_internal_bump};

const PRODUCT_TYPE: &str = "AMORT_LOAN";

struct Terms {
    principal: f64,
    coupon_rate: f64,
    maturity_years: f64,
    periods_per_year: f64,
    discount_curve_id: String,
}

fn field<'a>(attrs: &'a serde_json::Value, name: &'static str) -> Result<&'a serde_json::Value, PricerError> {
    attrs.get(name).ok_or_else(|| PricerError::MissingField {
        product_type: PRODUCT_TYPE.to_string(),
        field: name,
    })
}

fn read_terms(position: &Position) -> Result<Terms, PricerError> {
    let attrs = &position.attributes;
    let principal = field(attrs, "principal")?
        .as_f64()
        .ok_or_else(|| PricerError::MissingField { product_type: PRODUCT_TYPE.to_string(), field: "principal" })?;
    let coupon_rate = field(attrs, "coupon_rate")?
        .as_f64()
        .ok_or_else(|| PricerError::MissingField { product_type: PRODUCT_TYPE.to_string(), field: "coupon_rate" })?;
    let maturity_years = field(attrs, "maturity_years")?
        .as_f64()
        .ok_or_else(|| PricerError::MissingField { product_type: PRODUCT_TYPE.to_string(), field: "maturity_years" })?;
    let periods_per_year = attrs
        .get("frequency_per_year")
        .and_then(|v| v.as_f64())
        .unwrap_or(12.0);
    let discount_curve_id = attrs
        .get("discount_curve_id")
        .and_then(|v| v.as_str())
        .unwrap_or(position.currency.as_str())
        .to_string();

    Ok(Terms { principal, coupon_rate, maturity_years, periods_per_year, discount_curve_id })
}

fn periodic_payment(terms: &Terms, n: u64) -> f64 {
    let i = terms.coupon_rate / terms.periods_per_year;
    if i == 0.0 {
        return terms.principal / n as f64;
    }
    terms.principal * i / (1.0 - (1.0 + i).powf(-(n as f64)))
}

fn present_value(snapshot: &MarketSnapshotPayload, terms: &Terms) -> Option<f64> {
    let curve = snapshot.rates_curve(&terms.discount_curve_id)?;
    let n = (terms.maturity_years * terms.periods_per_year).round() as u64;
    if n == 0 {
        return None;
    }
    let payment = periodic_payment(terms, n);

    let mut pv = 0.0;
    for k in 1..=n {
        let t = k as f64 / terms.periods_per_year;
        let rate = interpolate(curve, t);
        pv += payment * discount_factor_periodic(rate, t, terms.periods_per_year);
    }
    Some(pv)
}

fn accrued_interest(terms: &Terms) -> f64 {
    let period_length = 1.0 / terms.periods_per_year;
    let n = (terms.maturity_years * terms.periods_per_year).round() as u64;
    if n == 0 {
        return 0.0;
    }
    let payment = periodic_payment(terms, n);
    let i = terms.coupon_rate / terms.periods_per_year;
    let time_since_last_payment = period_length - (terms.maturity_years % period_length);
    let fraction = if period_length > 0.0 { time_since_last_payment / period_length } else { 0.0 };
    payment * i * fraction
}

pub struct AmortLoanPricer;

impl Pricer for AmortLoanPricer {
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

    fn snapshot(rate: f64) -> MarketSnapshotPayload {
        let mut rates_curves = Map::new();
        rates_curves.insert(
            "USD".to_string(),
            Curve {
                curve_id: "USD".to_string(),
                currency: "USD".to_string(),
                nodes: vec![CurveNode { tenor_years: 0.25, value: rate }, CurveNode { tenor_years: 30.0, value: rate }],
            },
        );
        MarketSnapshotPayload { rates_curves, credit_curves: Map::new(), fx_spots: Map::new() }
    }

    fn position() -> Position {
        Position {
            position_id: "loan-1".to_string(),
            product_type: "AMORT_LOAN".to_string(),
            portfolio_node_id: "desk-1".to_string(),
            currency: "USD".to_string(),
            attributes: serde_json::json!({
                "principal": 500_000.0,
                "coupon_rate": 0.06,
                "maturity_years": 10.0,
                "frequency_per_year": 12
            }),
        }
    }

    #[test]
    fn loan_priced_off_its_own_coupon_rate_discounts_to_principal() {
        let snap = snapshot(0.06);
        let p = position();
        let pricer = AmortLoanPricer;

        let result = pricer.price(&p, &snap, &[Measure::Pv]).unwrap();
        let pv = result["PV"];
        assert!((pv - 500_000.0).abs() / 500_000.0 < 1e-6, "pv={pv}");
    }

    #[test]
    fn higher_discount_rate_than_coupon_marks_below_principal() {
        let snap = snapshot(0.08);
        let p = position();
        let pricer = AmortLoanPricer;

        let result = pricer.price(&p, &snap, &[Measure::Pv]).unwrap();
        assert!(result["PV"] < 500_000.0);
    }
}
