//! Canned market data and positions shared by scenario tests across crates.

use std::collections::BTreeMap;

use risk_schemas::{Curve, CurveNode, MarketSnapshotPayload, Position};

/// A flat 5% USD discount curve, one node. Pricing a bond against this curve
/// at a 5% coupon is the standard par-bond check.
pub fn flat_usd_curve(curve_id: &str, rate: f64) -> Curve {
    Curve {
        curve_id: curve_id.to_string(),
        currency: "USD".to_string(),
        nodes: vec![CurveNode { tenor_years: 30.0, value: rate }],
    }
}

/// A market snapshot with a flat 5% USD curve, a flat 3% EUR curve, and an
/// EUR/USD spot of 1.10.
pub fn base_snapshot() -> MarketSnapshotPayload {
    let mut rates_curves = BTreeMap::new();
    rates_curves.insert("USD".to_string(), flat_usd_curve("USD", 0.05));
    rates_curves.insert(
        "EUR".to_string(),
        Curve {
            curve_id: "EUR".to_string(),
            currency: "EUR".to_string(),
            nodes: vec![CurveNode { tenor_years: 30.0, value: 0.03 }],
        },
    );

    let mut fx_spots = BTreeMap::new();
    fx_spots.insert("EUR/USD".to_string(), 1.10);

    MarketSnapshotPayload { rates_curves, credit_curves: BTreeMap::new(), fx_spots }
}

/// A $1,000,000, 5-year, semiannual, 5% coupon bond — par under
/// [`base_snapshot`]'s flat 5% USD curve.
pub fn par_fixed_bond(position_id: &str, portfolio_node_id: &str) -> Position {
    Position {
        position_id: position_id.to_string(),
        product_type: "FIXED_BOND".to_string(),
        portfolio_node_id: portfolio_node_id.to_string(),
        currency: "USD".to_string(),
        attributes: serde_json::json!({
            "notional": 1_000_000.0,
            "coupon_rate": 0.05,
            "maturity_years": 5.0,
            "frequency_per_year": 2,
            "discount_curve_id": "USD",
        }),
    }
}

/// A EUR/USD forward struck at the spot-implied forward rate under
/// [`base_snapshot`] — prices to ~0.
pub fn atm_fx_forward(position_id: &str, portfolio_node_id: &str) -> Position {
    Position {
        position_id: position_id.to_string(),
        product_type: "FX_FWD".to_string(),
        portfolio_node_id: portfolio_node_id.to_string(),
        currency: "EUR".to_string(),
        attributes: serde_json::json!({
            "notional_base": 1_000_000.0,
            "currency_pair": "EUR/USD",
            "forward_rate": 1.10 * (0.05f64 * 1.0).exp() / (0.03f64 * 1.0).exp(),
            "maturity_years": 1.0,
        }),
    }
}

/// A $500,000, 10-year, monthly amortizing loan at a 6% coupon, discounted
/// off [`base_snapshot`]'s flat 5% USD curve — marks above principal.
pub fn par_amort_loan(position_id: &str, portfolio_node_id: &str) -> Position {
    Position {
        position_id: position_id.to_string(),
        product_type: "AMORT_LOAN".to_string(),
        portfolio_node_id: portfolio_node_id.to_string(),
        currency: "USD".to_string(),
        attributes: serde_json::json!({
            "principal": 500_000.0,
            "coupon_rate": 0.06,
            "maturity_years": 10.0,
            "frequency_per_year": 12,
            "discount_curve_id": "USD",
        }),
    }
}
