//! xlchart - chart extraction for XLSX packages
//!
//! Finds every chart in a spreadsheet package and turns it into something a
//! charting library can draw:
//! - Container reading (stored and deflate entries, ZIP64)
//! - Relationship walking from the workbook manifest down to chart parts
//! - Chart decoding for the 2006 chart and 2014 chartex schemas
//! - Reference resolution against a live cell model
//! - Plot configs with graceful degradation for unsupported chart types
//!
//! # Usage
//!
//! ```no_run
//! use xlchart::{ChartSession, ExtractOptions, PlotHandle, RecordingSurface};
//!
//! let bytes = std::fs::read("report.xlsx")?;
//! let mut session: ChartSession<PlotHandle> = ChartSession::load(bytes, ExtractOptions::default());
//! let model = session.cached_model();
//! let mut surface = RecordingSurface::default();
//! let report = session.render(&model, &mut surface);
//! println!("{} chart(s)", report.charts.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cell_ref;
pub mod charts;
pub mod container;
pub mod dates;
pub mod drawings;
pub mod error;
pub mod model;
pub mod namespaces;
pub mod parser;
pub mod render;
pub mod resolve;
pub mod session;
pub mod types;
pub mod workbook_meta;
pub mod xml_helpers;

pub use cell_ref::{parse_reference, RangeAddress};
pub use charts::{decode, try_decode};
pub use container::{inflate_strategies, InflateStrategy, Package};
pub use error::{Result, XlchartError};
pub use model::{CellOverride, RecalcModel, WorkbookModel};
pub use parser::{extract_charts, find_chart_parts, find_sheets, Extraction};
pub use render::{
    build_histogram, to_plot_config, AdapterContext, ExtractOptions, PlotConfig, PlotHandle,
    PlotKind, PlotSurface, RecordingSurface, RenderOptions, SurfaceCapabilities,
};
pub use resolve::{resolve, resolve_numbers, resolve_series, resolve_text};
pub use session::{ChartSession, ChartStatus, RenderReport};
pub use workbook_meta::DateSystem;

pub use types::*;
