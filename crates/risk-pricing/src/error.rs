/// Pricing-side error taxonomy. An unknown-product-type dispatch failure
/// never reaches a pricer at all — it is raised by the registry before
/// dispatch. Everything a pricer itself can raise is a `PricerError` and
/// counts against a task's `max_attempts`.
#[derive(Debug, Clone, PartialEq)]
pub enum PricerError {
    /// A required field was absent from `position.attributes`.
    MissingField { product_type: String, field: &'static str },
    /// A curve or FX spot the pricer needed was not present in the snapshot.
    MissingMarketData { what: String },
    /// The pricer produced `NaN` or `Inf` for a requested measure.
    NonFinite { measure: String },
    /// `product_type` has no registered pricer.
    UnknownProductType(String),
}

impl std::fmt::Display for PricerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PricerError::MissingField { product_type, field } => {
                write!(f, "{product_type}: missing required field '{field}'")
            }
            PricerError::MissingMarketData { what } => {
                write!(f, "missing market data: {what}")
            }
            PricerError::NonFinite { measure } => {
                write!(f, "pricer produced a non-finite value for measure {measure}")
            }
            PricerError::UnknownProductType(pt) => write!(f, "unknown product type: {pt}"),
        }
    }
}

impl std::error::Error for PricerError {}

impl PricerError {
    /// Only `UnknownProductType` is non-retryable: every other variant
    /// counts against `max_attempts` like any other `PricerError`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PricerError::UnknownProductType(_))
    }
}
