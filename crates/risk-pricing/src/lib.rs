pub mod amort_loan;
pub mod curve_math;
pub mod error;
pub mod fixed_bond;
pub mod fx_fwd;
pub mod registry;
pub mod scenario;
pub mod sensitivity;

pub use error::PricerError;
pub use registry::{Pricer, PricerRegistry};
pub use scenario::apply_scenario;
