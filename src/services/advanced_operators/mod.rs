//! C8: advanced analytical operators layered on top of the raw query
//! results - comparison, percentage, trend, and projection. Each is a pure
//! function over already-fetched numbers; none of them touch the catalog.

pub mod comparison;
pub mod percentage;
pub mod projection;
pub mod trend;

pub use comparison::{compare, ComparisonOutcome};
pub use percentage::{percentage_of, PercentageOutcome};
pub use projection::{
    project, ConfidenceLevel, ProjectionMethod, ProjectionOutcome, TrendContext,
};
pub use trend::{analyze_trend, TrendDirection, TrendOutcome};
