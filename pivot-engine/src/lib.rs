//! FILENAME: pivot-engine/src/lib.rs
//! Grouping and pivot subsystem of the stat toolkit.
//!
//! This crate groups delimited records into buckets and arranges the
//! aggregated buckets as flat tables or paged pivot grids. It depends on
//! `engine` for the shared value types (Aggregator, Coordinate, Position).
//!
//! Layers:
//! - `definition`: Serializable configuration (what the table IS)
//! - `cache`: Bucket table and lookup strategies (HOW we group)
//! - `view`: Renderable output (WHAT we display)
//! - `engine`: Pivot arrangement (HOW we lay out)

pub mod cache;
pub mod definition;
pub mod engine;
pub mod view;

pub use cache::*;
pub use definition::*;
pub use engine::{arrange_pivot, render_group_table, PivotArranger};
pub use view::*;
