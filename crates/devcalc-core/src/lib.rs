pub mod assumptions;
pub mod development;
pub mod error;
pub mod report;
pub mod time_value;
pub mod types;

pub use assumptions::{CostBasis, CostSchedule, MarketAssumptions, PriceSegment, SegmentAssumptions};
pub use development::estimation::{estimate_project, EstimationInput, EstimationOutput, ProjectParameters};
pub use error::DevCalcError;
pub use types::*;

/// Standard result type for all devcalc operations
pub type DevCalcResult<T> = Result<T, DevCalcError>;
