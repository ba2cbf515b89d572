//! FILENAME: engine/src/lib.rs
//! PURPOSE: Main library entry point for the aggregation engine.
//! CONTEXT: Re-exports the value types shared by the grouping engine and the
//! command-line tools: aggregators, composite keys, column mapping, errors.

pub mod aggregator;
pub mod columns;
pub mod coord;
pub mod error;
pub mod histogram;

// Re-export commonly used types at the crate root
pub use aggregator::{
    create_from_string, Aggregator, AggregatorSpec, ConfidenceInterval, Count, Max, Mean, Min,
    StdDev, Sum,
};
pub use columns::{field_label, parse_number, resolve_field, ColumnNames, FieldIndex};
pub use coord::{compare_values, Coordinate, Position};
pub use error::{EngineError, EngineResult};
pub use histogram::Histogram;
