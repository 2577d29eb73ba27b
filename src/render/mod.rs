//! Chart rendering seam.
//!
//! This module provides:
//! - The [`PlotSurface`] trait that abstracts chart-drawing backends
//! - The adapter from decoded descriptors to backend-agnostic [`PlotConfig`]s
//! - Histogram binning and stock role inference used by the adapter
//! - Render options

pub mod adapter;
pub mod histogram;
pub mod options;
pub mod plot;
pub mod stock;

pub use adapter::{plot_chart, to_plot_config, AdapterContext};
pub use histogram::{build_histogram, HistogramBin};
pub use options::{ExtractOptions, RenderOptions};
pub use plot::{
    BubblePoint, Candle, Dataset, DatasetData, PlotConfig, PlotHandle, PlotKind, PlotSurface,
    RecordingSurface, SurfaceCapabilities, XyPoint,
};
pub use stock::{infer_roles, StockRoles, CLOSE_ONLY_SUFFIX};
