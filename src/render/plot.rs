//! Plot configuration and the surface trait.
//!
//! A [`PlotConfig`] is what a chart-drawing library needs to draw one chart:
//! a primitive kind, category labels and datasets. [`PlotSurface`] abstracts
//! the library itself so the pipeline never depends on a concrete renderer.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::Result;
use crate::types::ChartFamily;

/// Drawing primitive a surface is asked to use.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum PlotKind {
    Bar,
    Line,
    Pie,
    Doughnut,
    Scatter,
    Bubble,
    Radar,
    /// Open-high-low-close candles
    Candlestick,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct XyPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct BubblePoint {
    pub x: f64,
    pub y: f64,
    /// Radius in pixels
    pub r: f64,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct Candle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Payload of one dataset.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "shape", content = "points", rename_all = "camelCase")]
pub enum DatasetData {
    /// One value per category label; gaps stay `None`
    Values(Vec<Option<f64>>),
    Points(Vec<XyPoint>),
    Bubbles(Vec<BubblePoint>),
    /// One candle per category label
    Candles(Vec<Candle>),
}

impl DatasetData {
    pub fn len(&self) -> usize {
        match self {
            Self::Values(v) => v.len(),
            Self::Points(p) => p.len(),
            Self::Bubbles(b) => b.len(),
            Self::Candles(c) => c.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    /// Primitive for this dataset; differs from the config's in combos
    pub kind: PlotKind,
    /// Fill under the line (area charts)
    pub fill: bool,
    /// Connect points; off for scatter
    pub show_line: bool,
    pub data: DatasetData,
}

/// Everything needed to draw one chart.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlotConfig {
    pub kind: PlotKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
    /// Family that was drawn with a different primitive, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub substituted_from: Option<ChartFamily>,
    pub show_legend: bool,
    pub begin_at_zero: bool,
    pub width: u32,
    pub height: u32,
}

/// Optional primitives a surface may support.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceCapabilities {
    pub radar: bool,
    pub candlestick: bool,
}

impl SurfaceCapabilities {
    pub const fn all() -> Self {
        Self {
            radar: true,
            candlestick: true,
        }
    }

    /// Only the primitives every surface has.
    pub const fn basic() -> Self {
        Self {
            radar: false,
            candlestick: false,
        }
    }
}

impl Default for SurfaceCapabilities {
    /// Radar but no candlesticks, the common core of charting libraries.
    fn default() -> Self {
        Self {
            radar: true,
            candlestick: false,
        }
    }
}

/// A chart-drawing backend.
///
/// Handles are owned by the caller and must be passed back to
/// [`dispose`](PlotSurface::dispose) before the slot is reused.
pub trait PlotSurface {
    type Handle;

    fn capabilities(&self) -> SurfaceCapabilities;

    /// Draw `config` into `slot`.
    ///
    /// # Errors
    /// [`XlchartError::Render`](crate::error::XlchartError::Render) when the
    /// backend rejects the config.
    fn create(&mut self, slot: usize, config: &PlotConfig) -> Result<Self::Handle>;

    fn dispose(&mut self, handle: Self::Handle);
}

/// Handle issued by [`RecordingSurface`].
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlotHandle(pub u64);

/// A surface that keeps every live config in memory.
///
/// Used by the CLI to collect plot configs and by tests to observe the
/// create/dispose sequence.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    capabilities: SurfaceCapabilities,
    live: BTreeMap<PlotHandle, (usize, PlotConfig)>,
    next_handle: u64,
    created: usize,
    disposed: usize,
}

impl RecordingSurface {
    pub fn new(capabilities: SurfaceCapabilities) -> Self {
        Self {
            capabilities,
            ..Self::default()
        }
    }

    /// Live configs in slot order.
    pub fn live_configs(&self) -> Vec<(usize, &PlotConfig)> {
        let mut configs: Vec<_> = self.live.values().map(|(s, c)| (*s, c)).collect();
        configs.sort_by_key(|(slot, _)| *slot);
        configs
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn created_count(&self) -> usize {
        self.created
    }

    pub fn disposed_count(&self) -> usize {
        self.disposed
    }
}

impl PlotSurface for RecordingSurface {
    type Handle = PlotHandle;

    fn capabilities(&self) -> SurfaceCapabilities {
        self.capabilities
    }

    fn create(&mut self, slot: usize, config: &PlotConfig) -> Result<PlotHandle> {
        let handle = PlotHandle(self.next_handle);
        self.next_handle += 1;
        self.created += 1;
        self.live.insert(handle, (slot, config.clone()));
        Ok(handle)
    }

    fn dispose(&mut self, handle: PlotHandle) {
        if self.live.remove(&handle).is_some() {
            self.disposed += 1;
        } else {
            tracing::debug!("dispose of unknown plot handle {}", handle.0);
        }
    }
}
