//! Chart session: one loaded package, its selection and live plot handles.
//!
//! ```text
//! load ──> select_sheet / set_scenario ──> render ──> ... ──> close
//!              ^                              |
//!              └──────── model changed ───────┘
//! ```
//!
//! Every `render` disposes all handles from the previous one before creating
//! new ones, so a surface never holds plots from two renders at once.

use serde::Serialize;

use crate::container::Package;
use crate::model::{RecalcModel, WorkbookModel};
use crate::parser::{extract_charts, Extraction};
use crate::render::{plot_chart, AdapterContext, ExtractOptions, PlotConfig, PlotSurface};
use crate::types::ChartDescriptor;

/// Outcome of loading a package or rendering a sheet.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ChartStatus {
    /// The selected sheet has charts
    Ready,
    /// The selected sheet (or the whole package) has none
    NoCharts,
    /// The container could not be opened
    ExtractionFailed,
}

/// The current sheet and scenario.
#[derive(Debug, Serialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub sheet: Option<String>,
    /// Opaque label such as "Bull"; the model decides what it means
    pub scenario: Option<String>,
}

/// One chart drawn by [`ChartSession::render`].
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RenderedChart {
    pub slot: usize,
    /// Card heading: the title, else the upper-case family name
    pub heading: String,
    /// Accessible name: the title, else "Chart N"
    pub aria_label: String,
    pub part_path: String,
    pub plot: PlotConfig,
}

/// A chart the surface refused to draw.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RenderFailure {
    pub slot: usize,
    pub part_path: String,
    pub message: String,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RenderReport {
    pub selection: Selection,
    pub status: ChartStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub charts: Vec<RenderedChart>,
    pub failures: Vec<RenderFailure>,
    /// Charts past the per-sheet limit
    pub truncated: usize,
    /// Handles disposed before this render
    pub disposed: usize,
}

/// A loaded package and the plots currently drawn from it.
pub struct ChartSession<H> {
    package: Option<Package>,
    extraction: Extraction,
    options: ExtractOptions,
    selection: Selection,
    handles: Vec<H>,
    needs_render: bool,
}

impl<H> ChartSession<H> {
    /// Open a package and decode all its charts.
    ///
    /// Never fails: a corrupt container gives an empty session whose status
    /// is [`ChartStatus::ExtractionFailed`]. The first sheet is selected.
    pub fn load(bytes: impl Into<Vec<u8>>, options: ExtractOptions) -> Self {
        let (package, extraction) = match Package::open(bytes) {
            Ok(package) => {
                let extraction = extract_charts(&package);
                (Some(package), extraction)
            }
            Err(e) => {
                tracing::warn!("chart extraction failed: {e}");
                (None, Extraction::default())
            }
        };

        let sheet = extraction.sheet_names().next().map(str::to_string);
        Self {
            package,
            extraction,
            options,
            selection: Selection {
                sheet,
                scenario: None,
            },
            handles: Vec::new(),
            needs_render: true,
        }
    }

    pub fn extraction(&self) -> &Extraction {
        &self.extraction
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.extraction.sheet_names().collect()
    }

    pub fn charts_for(&self, sheet: &str) -> &[ChartDescriptor] {
        self.extraction.charts_for(sheet)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Whether the selection changed since the last render.
    pub fn needs_render(&self) -> bool {
        self.needs_render
    }

    /// Number of plot handles currently held.
    pub fn live_handles(&self) -> usize {
        self.handles.len()
    }

    /// Select a sheet by name. Returns `false` (and keeps the selection) if
    /// the package has no such sheet.
    pub fn select_sheet(&mut self, name: &str) -> bool {
        if !self.extraction.sheet_names().any(|s| s == name) {
            tracing::debug!("select_sheet: unknown sheet {name:?}");
            return false;
        }
        if self.selection.sheet.as_deref() != Some(name) {
            self.selection.sheet = Some(name.to_string());
            self.needs_render = true;
        }
        true
    }

    /// Change the scenario label; the next render re-resolves every chart.
    pub fn set_scenario(&mut self, scenario: Option<String>) {
        if self.selection.scenario != scenario {
            self.selection.scenario = scenario;
            self.needs_render = true;
        }
    }

    pub fn status(&self) -> ChartStatus {
        if self.package.is_none() {
            ChartStatus::ExtractionFailed
        } else if self.selected_charts().is_empty() {
            ChartStatus::NoCharts
        } else {
            ChartStatus::Ready
        }
    }

    /// User-facing status line, if the status is not [`ChartStatus::Ready`].
    pub fn status_message(&self) -> Option<&'static str> {
        match self.status() {
            ChartStatus::Ready => None,
            ChartStatus::ExtractionFailed => Some("Chart extraction failed."),
            ChartStatus::NoCharts if self.extraction.chart_count() == 0 => {
                Some("No embedded charts found.")
            }
            ChartStatus::NoCharts => Some("No charts found on this sheet."),
        }
    }

    /// Cached cell values of the loaded package.
    pub fn cached_model(&self) -> WorkbookModel {
        match &self.package {
            Some(package) => WorkbookModel::from_package(package, &self.extraction.manifest),
            None => WorkbookModel::new(),
        }
    }

    fn selected_charts(&self) -> &[ChartDescriptor] {
        self.selection
            .sheet
            .as_deref()
            .map_or(&[], |sheet| self.extraction.charts_for(sheet))
    }

    /// Dispose every live plot, then draw the selected sheet's charts.
    ///
    /// At most `chart_limit` charts are drawn, in slot order. A chart the
    /// surface rejects is listed in [`RenderReport::failures`] and the rest
    /// still render, so rendering itself never fails.
    pub fn render<M, S>(&mut self, model: &M, surface: &mut S) -> RenderReport
    where
        M: RecalcModel + ?Sized,
        S: PlotSurface<Handle = H>,
    {
        let disposed = self.dispose_all(surface);
        self.needs_render = false;

        let status = self.status();
        let mut report = RenderReport {
            selection: self.selection.clone(),
            status,
            message: self.status_message().map(str::to_string),
            charts: Vec::new(),
            failures: Vec::new(),
            truncated: 0,
            disposed,
        };
        if status != ChartStatus::Ready {
            return report;
        }

        let ctx = AdapterContext {
            epoch: self.extraction.manifest.date_system,
            capabilities: surface.capabilities(),
            options: self.options.render.clone(),
        };
        let charts = self.selected_charts();
        let limit = self.options.chart_limit;
        report.truncated = charts.len().saturating_sub(limit);

        let mut handles = Vec::new();
        for (slot, chart) in charts.iter().take(limit).enumerate() {
            let plot = plot_chart(chart, model, &ctx);
            match surface.create(slot, &plot) {
                Ok(handle) => {
                    handles.push(handle);
                    report.charts.push(RenderedChart {
                        slot,
                        heading: plot
                            .title
                            .clone()
                            .unwrap_or_else(|| chart.family.fallback_title()),
                        aria_label: plot
                            .title
                            .clone()
                            .unwrap_or_else(|| format!("Chart {}", slot + 1)),
                        part_path: chart.part_path.clone(),
                        plot,
                    });
                }
                Err(e) => {
                    tracing::warn!("failed to render chart {}: {e}", chart.part_path);
                    report.failures.push(RenderFailure {
                        slot,
                        part_path: chart.part_path.clone(),
                        message: format!("Failed to render chart: {e}"),
                    });
                }
            }
        }
        self.handles = handles;

        if report.truncated > 0 {
            tracing::debug!("{} chart(s) beyond the limit of {limit}", report.truncated);
        }
        report
    }

    /// Dispose every live plot.
    pub fn close<S: PlotSurface<Handle = H>>(&mut self, surface: &mut S) {
        self.dispose_all(surface);
        self.needs_render = true;
    }

    fn dispose_all<S: PlotSurface<Handle = H>>(&mut self, surface: &mut S) -> usize {
        let count = self.handles.len();
        for handle in self.handles.drain(..) {
            surface.dispose(handle);
        }
        count
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::render::{PlotHandle, RecordingSurface};

    #[test]
    fn test_corrupt_container_is_extraction_failed() {
        let mut session: ChartSession<PlotHandle> =
            ChartSession::load(b"definitely not a zip".to_vec(), ExtractOptions::default());
        assert_eq!(session.status(), ChartStatus::ExtractionFailed);
        assert_eq!(session.status_message(), Some("Chart extraction failed."));
        assert!(session.sheet_names().is_empty());

        let model = session.cached_model();
        let mut surface = RecordingSurface::default();
        let report = session.render(&model, &mut surface);
        assert_eq!(report.status, ChartStatus::ExtractionFailed);
        assert!(report.charts.is_empty());
        assert_eq!(surface.created_count(), 0);
    }

    #[test]
    fn test_scenario_change_marks_dirty() {
        let mut session: ChartSession<PlotHandle> =
            ChartSession::load(Vec::new(), ExtractOptions::default());
        let mut surface = RecordingSurface::default();
        session.render(&WorkbookModel::new(), &mut surface);
        assert!(!session.needs_render());

        session.set_scenario(Some("Bull".into()));
        assert!(session.needs_render());
        assert_eq!(session.selection().scenario.as_deref(), Some("Bull"));
    }
}
