//! Shared curve math used by every pricer: flat-extrapolated linear
//! interpolation and discount-factor conversion. This is the minimum needed
//! to make the pricers in this crate well-defined; curve construction and
//! bootstrapping methodology are out of scope.

use risk_schemas::Curve;

/// Linearly interpolate `curve` at `tenor_years`, flat-extrapolating past
/// the first and last nodes. Panics only if the curve has no nodes, which
/// the snapshot invariants in this crate never allow to reach here.
pub fn interpolate(curve: &Curve, tenor_years: f64) -> f64 {
    let nodes = &curve.nodes;
    assert!(!nodes.is_empty(), "curve {} has no nodes", curve.curve_id);

    if tenor_years <= nodes[0].tenor_years {
        return nodes[0].value;
    }
    if tenor_years >= nodes[nodes.len() - 1].tenor_years {
        return nodes[nodes.len() - 1].value;
    }

    for w in nodes.windows(2) {
        let (a, b) = (&w[0], &w[1]);
        if tenor_years >= a.tenor_years && tenor_years <= b.tenor_years {
            let span = b.tenor_years - a.tenor_years;
            if span <= 0.0 {
                return a.value;
            }
            let t = (tenor_years - a.tenor_years) / span;
            return a.value + t * (b.value - a.value);
        }
    }

    nodes[nodes.len() - 1].value
}

/// Continuously-compounded discount factor for a zero rate `rate` observed
/// at `tenor_years`.
pub fn discount_factor(rate: f64, tenor_years: f64) -> f64 {
    (-rate * tenor_years).exp()
}

/// Periodically-compounded discount factor, compounding `periods_per_year`
/// times a year at rate `rate`. Used by the coupon-bearing pricers so that a
/// flat curve priced at the coupon rate reproduces par exactly (the
/// standard discrete-compounding bond identity).
pub fn discount_factor_periodic(rate: f64, tenor_years: f64, periods_per_year: f64) -> f64 {
    (1.0 + rate / periods_per_year).powf(-periods_per_year * tenor_years)
}

#[cfg(test)]
mod tests {
    use super::*;
    use risk_schemas::CurveNode;

    fn flat_curve(value: f64) -> Curve {
        Curve {
            curve_id: "TEST".to_string(),
            currency: "USD".to_string(),
            nodes: vec![
                CurveNode { tenor_years: 1.0, value },
                CurveNode { tenor_years: 10.0, value },
            ],
        }
    }

    #[test]
    fn flat_curve_interpolates_to_the_same_value_everywhere() {
        let c = flat_curve(0.05);
        assert_eq!(interpolate(&c, 0.5), 0.05);
        assert_eq!(interpolate(&c, 5.0), 0.05);
        assert_eq!(interpolate(&c, 20.0), 0.05);
    }

    #[test]
    fn linear_interpolation_between_two_nodes() {
        let c = Curve {
            curve_id: "TEST".to_string(),
            currency: "USD".to_string(),
            nodes: vec![
                CurveNode { tenor_years: 1.0, value: 0.02 },
                CurveNode { tenor_years: 2.0, value: 0.04 },
            ],
        };
        assert!((interpolate(&c, 1.5) - 0.03).abs() < 1e-12);
    }

    #[test]
    fn discount_factor_at_zero_tenor_is_one() {
        assert_eq!(discount_factor(0.05, 0.0), 1.0);
    }
}
