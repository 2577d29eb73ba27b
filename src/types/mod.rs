//! Data types shared across the extraction pipeline.

mod cell;
mod chart;
mod workbook;

pub use cell::*;
pub use chart::*;
pub use workbook::*;
