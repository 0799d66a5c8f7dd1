//! Pricer capability trait and the registry that dispatches a position's
//! `product_type` to the struct that knows how to price it.
//!
//! Registration is explicit: nothing runs at import time. A caller builds a
//! registry with `PricerRegistry::bootstrap()` and holds it for the
//! lifetime of the worker; there is no global or lazily-initialized state.

use std::collections::BTreeMap;

use risk_schemas::{MarketSnapshotPayload, Measure, Position};

use crate::error::PricerError;

/// A pure function from (position, market snapshot, requested measures) to
/// a map of measure name to value. A `Pricer` never mutates its inputs and
/// never performs IO; everything it needs is already in `snapshot`.
pub trait Pricer: Send + Sync {
    fn price(
        &self,
        position: &Position,
        snapshot: &MarketSnapshotPayload,
        measures: &[Measure],
    ) -> Result<BTreeMap<String, f64>, PricerError>;
}

pub struct PricerRegistry {
    pricers: BTreeMap<String, Box<dyn Pricer>>,
}

impl PricerRegistry {
    /// Registers every pricer this build knows about. Required keys:
    /// `FIXED_BOND`, `FX_FWD`, `AMORT_LOAN`.
    pub fn bootstrap() -> Self {
        let mut pricers: BTreeMap<String, Box<dyn Pricer>> = BTreeMap::new();
        pricers.insert("FIXED_BOND".to_string(), Box::new(crate::fixed_bond::FixedBondPricer));
        pricers.insert("FX_FWD".to_string(), Box::new(crate::fx_fwd::FxForwardPricer));
        pricers.insert("AMORT_LOAN".to_string(), Box::new(crate::amort_loan::AmortLoanPricer));
        Self { pricers }
    }

    pub fn get(&self, product_type: &str) -> Option<&dyn Pricer> {
        self.pricers.get(product_type).map(|b| b.as_ref())
    }

    /// Swap the pricer registered for `product_type`, for injecting a
    /// fault-injecting pricer in tests. Not used by `bootstrap()` itself.
    pub fn replace(&mut self, product_type: &str, pricer: Box<dyn Pricer>) {
        self.pricers.insert(product_type.to_string(), pricer);
    }

    pub fn product_types(&self) -> impl Iterator<Item = &str> {
        self.pricers.keys().map(|s| s.as_str())
    }

    /// Looks up the pricer for `position.product_type` and prices it,
    /// turning an unregistered product type into `PricerError::UnknownProductType`
    /// rather than panicking or silently skipping the position.
    pub fn dispatch(
        &self,
        position: &Position,
        snapshot: &MarketSnapshotPayload,
        measures: &[Measure],
    ) -> Result<BTreeMap<String, f64>, PricerError> {
        let product_type = position.product_type_upper();
        match self.get(&product_type) {
            Some(pricer) => pricer.price(position, snapshot, measures),
            None => Err(PricerError::UnknownProductType(product_type)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_registers_the_three_required_product_types() {
        let registry = PricerRegistry::bootstrap();
        assert!(registry.get("FIXED_BOND").is_some());
        assert!(registry.get("FX_FWD").is_some());
        assert!(registry.get("AMORT_LOAN").is_some());
        assert!(registry.get("SOMETHING_ELSE").is_none());
    }

    #[test]
    fn dispatch_reports_unknown_product_type_by_name() {
        let registry = PricerRegistry::bootstrap();
        let position = Position {
            position_id: "p1".to_string(),
            product_type: "EXOTIC_SWAP".to_string(),
            portfolio_node_id: "desk-1".to_string(),
            currency: "USD".to_string(),
            attributes: serde_json::json!({}),
        };
        let snapshot = MarketSnapshotPayload::default();
        let err = registry.dispatch(&position, &snapshot, &[Measure::Pv]).unwrap_err();
        match err {
            PricerError::UnknownProductType(pt) => assert_eq!(pt, "EXOTIC_SWAP"),
            other => panic!("expected UnknownProductType, got {other:?}"),
        }
    }
}
