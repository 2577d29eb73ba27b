//! Package parsing
//!
//! Walks the relationship graph of an opened [`Package`](crate::container::Package)
//! and decodes the chart parts it reaches.

pub mod extract;
pub mod relationships;
pub mod topology;

pub use extract::{extract_charts, Extraction, SheetCharts};
pub use relationships::{resolve_target, RelationshipMap};
pub use topology::{find_chart_parts, find_sheets};
