//! FX_FWD: an outright FX forward, long the base currency, short the quote
//! currency. Expects `position.attributes`:
//!
//! ```json
//! {
//!   "notional_base": 1000000.0,
//!   "currency_pair": "EUR/USD",
//!   "forward_rate": 1.10,
//!   "maturity_years": 0.5
//! }
//! ```
//!
//! `currency_pair` is `BASE/QUOTE`; the base and quote legs are each
//! discounted off the rates curve named after their own currency code, and
//! the contract is marked against `fx_spots[currency_pair]` adjusted for the
//! cost of carry implied by those two curves (covered interest parity). PV
//! is reported in the quote currency.

use std::collections::BTreeMap;

use risk_schemas::{MarketSnapshotPayload, Measure, Position};

use crate::curve_math::{discount_factor, interpolate};
use crate::error::PricerError;
use crate::registry::Pricer;
use crate::sensitivity::{dv01_via_internal_bump, fx_delta_via_internal_bump};

const PRODUCT_TYPE: &str = "FX_FWD";

struct Terms {
    notional_base: f64,
    base_ccy: String,
    quote_ccy: String,
    currency_pair: String,
    forward_rate: f64,
    maturity_years: f64,
}

fn field<'a>(attrs: &'a serde_json::Value, name: &'static str) -> Result<&'a serde_json::Value, PricerError> {
    attrs.get(name).ok_or_else(|| PricerError::MissingField {
        product_type: PRODUCT_TYPE.to_string(),
        field: name,
    })
}

fn read_terms(position: &Position) -> Result<Terms, PricerError> {
    let attrs = &position.attributes;
    let notional_base = field(attrs, "notional_base")?
        .as_f64()
        .ok_or_else(|| PricerError::MissingField { product_type: PRODUCT_TYPE.to_string(), field: "notional_base" })?;
    let currency_pair = field(attrs, "currency_pair")?
        .as_str()
        .ok_or_else(|| PricerError::MissingField { product_type: PRODUCT_TYPE.to_string(), field: "currency_pair" })?
        .to_string();
    let forward_rate = field(attrs, "forward_rate")?
        .as_f64()
        .ok_or_else(|| PricerError::MissingField { product_type: PRODUCT_TYPE.to_string(), field: "forward_rate" })?;
    let maturity_years = field(attrs, "maturity_years")?
        .as_f64()
        .ok_or_else(|| PricerError::MissingField { product_type: PRODUCT_TYPE.to_string(), field: "maturity_years" })?;

    let (base_ccy, quote_ccy) = currency_pair
        .split_once('/')
        .ok_or_else(|| PricerError::MissingField { product_type: PRODUCT_TYPE.to_string(), field: "currency_pair" })?;

    Ok(Terms {
        notional_base,
        base_ccy: base_ccy.to_string(),
        quote_ccy: quote_ccy.to_string(),
        currency_pair,
        forward_rate,
        maturity_years,
    })
}

fn present_value(snapshot: &MarketSnapshotPayload, terms: &Terms) -> Option<f64> {
    let spot = snapshot.fx_spot(&terms.currency_pair)?;
    let base_rate = interpolate(snapshot.rates_curve(&terms.base_ccy)?, terms.maturity_years);
    let quote_rate = interpolate(snapshot.rates_curve(&terms.quote_ccy)?, terms.maturity_years);

    let df_base = discount_factor(base_rate, terms.maturity_years);
    let df_quote = discount_factor(quote_rate, terms.maturity_years);
    let implied_forward = spot * df_base / df_quote;

    Some(terms.notional_base * (implied_forward - terms.forward_rate) * df_quote)
}

pub struct FxForwardPricer;

impl Pricer for FxForwardPricer {
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
                    what: format!("fx spot or curve data for {}", position.position_id),
                })?,
                Measure::Dv01 => dv01_via_internal_bump(snapshot, pv_at),
                Measure::FxDelta => fx_delta_via_internal_bump(snapshot, pv_at),
                Measure::AccruedInterest => 0.0,
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

    fn snapshot() -> MarketSnapshotPayload {
        let mut rates_curves = Map::new();
        rates_curves.insert(
            "USD".to_string(),
            Curve {
                curve_id: "USD".to_string(),
                currency: "USD".to_string(),
                nodes: vec![CurveNode { tenor_years: 0.5, value: 0.05 }, CurveNode { tenor_years: 5.0, value: 0.05 }],
            },
        );
        rates_curves.insert(
            "EUR".to_string(),
            Curve {
                curve_id: "EUR".to_string(),
                currency: "EUR".to_string(),
                nodes: vec![CurveNode { tenor_years: 0.5, value: 0.03 }, CurveNode { tenor_years: 5.0, value: 0.03 }],
            },
        );
        let mut fx_spots = Map::new();
        fx_spots.insert("EUR/USD".to_string(), 1.10);
        MarketSnapshotPayload { rates_curves, credit_curves: Map::new(), fx_spots }
    }

    fn position() -> Position {
        Position {
            position_id: "fwd-1".to_string(),
            product_type: "FX_FWD".to_string(),
            portfolio_node_id: "desk-1".to_string(),
            currency: "USD".to_string(),
            attributes: serde_json::json!({
                "notional_base": 1_000_000.0,
                "currency_pair": "EUR/USD",
                "forward_rate": 1.10,
                "maturity_years": 0.5
            }),
        }
    }

    #[test]
    fn forward_struck_at_the_implied_rate_prices_to_zero() {
        let snap = snapshot();
        let mut p = position();
        let eur_rate = 0.03;
        let usd_rate = 0.05;
        let implied = 1.10 * discount_factor(eur_rate, 0.5) / discount_factor(usd_rate, 0.5);
        p.attributes["forward_rate"] = serde_json::json!(implied);

        let pricer = FxForwardPricer;
        let result = pricer.price(&p, &snap, &[Measure::Pv]).unwrap();
        assert!(result["PV"].abs() < 1e-6);
    }

    #[test]
    fn unknown_currency_pair_is_missing_market_data() {
        let snap = snapshot();
        let mut p = position();
        p.attributes["currency_pair"] = serde_json::json!("GBP/USD");

        let pricer = FxForwardPricer;
        let err = pricer.price(&p, &snap, &[Measure::Pv]).unwrap_err();
        assert!(matches!(err, PricerError::MissingMarketData { .. }));
    }
}
