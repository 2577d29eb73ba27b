//! Session lifecycle and plot configs for generated packages.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod fixtures;

use fixtures::{
    bar_chart, chartex_chart, chartex_literal, classic_chart, ser_ref, ser_values, SheetBuilder,
    XlsxBuilder,
};
use test_case::test_case;
use xlchart::render::{DatasetData, CLOSE_ONLY_SUFFIX};
use xlchart::{
    ChartFamily, ChartSession, ChartStatus, ExtractOptions, PlotConfig, PlotHandle, PlotKind,
    PlotSurface, RecordingSurface, SurfaceCapabilities, XlchartError,
};

fn session(bytes: Vec<u8>) -> ChartSession<PlotHandle> {
    ChartSession::load(bytes, ExtractOptions::default())
}

fn stock_package(names: &[&str]) -> Vec<u8> {
    let columns = ["B", "C", "D", "E"];
    let mut sheet = SheetBuilder::new("Prices").column("A2", &[45000.0, 45001.0, 45002.0]);
    let mut series = Vec::new();
    for (col, name) in columns.iter().zip(names) {
        let values: [f64; 3] = match *name {
            "Open" => [10.0, 11.0, 12.0],
            "High" => [15.0, 16.0, 17.0],
            "Low" => [8.0, 9.0, 10.0],
            _ => [12.0, 13.0, 14.0],
        };
        sheet = sheet
            .cell(&format!("{col}1"), *name)
            .column(&format!("{col}2"), &values);
        series.push(ser_ref(
            &format!("Prices!${col}$1"),
            "Prices!$A$2:$A$4",
            &format!("Prices!${col}$2:${col}$4"),
        ));
    }
    XlsxBuilder::new()
        .sheet(sheet.chart(classic_chart("stockChart", Some("ACME"), &series)))
        .build()
}

fn render_first(bytes: Vec<u8>, capabilities: SurfaceCapabilities) -> PlotConfig {
    let mut session = session(bytes);
    let model = session.cached_model();
    let mut surface = RecordingSurface::new(capabilities);
    let mut report = session.render(&model, &mut surface);
    assert_eq!(report.status, ChartStatus::Ready);
    report.charts.remove(0).plot
}

#[test]
fn test_stock_roles_follow_names() {
    // Close is written first; names decide the roles, not positions.
    let plot = render_first(
        stock_package(&["Close", "Open", "High", "Low"]),
        SurfaceCapabilities::all(),
    );
    assert_eq!(plot.kind, PlotKind::Candlestick);
    assert_eq!(plot.labels, ["2023-03-15", "2023-03-16", "2023-03-17"]);
    let DatasetData::Candles(candles) = &plot.datasets[0].data else {
        panic!("expected candles");
    };
    assert_eq!(candles.len(), 3);
    assert_eq!(candles[0].open, 10.0);
    assert_eq!(candles[0].high, 15.0);
    assert_eq!(candles[0].low, 8.0);
    assert_eq!(candles[0].close, 12.0);
}

#[test]
fn test_stock_without_candlesticks_is_close_only() {
    let plot = render_first(
        stock_package(&["Open", "High", "Low", "Close"]),
        SurfaceCapabilities::basic(),
    );
    assert_eq!(plot.kind, PlotKind::Bar);
    assert_eq!(plot.substituted_from, Some(ChartFamily::Stock));
    assert_eq!(plot.title, Some(format!("ACME{CLOSE_ONLY_SUFFIX}")));
    assert_eq!(plot.datasets.len(), 1);
    assert_eq!(plot.datasets[0].label, "Close");
    assert_eq!(
        plot.datasets[0].data,
        DatasetData::Values(vec![Some(12.0), Some(13.0), Some(14.0)])
    );
}

#[test]
fn test_stock_with_two_series_is_close_only() {
    let plot = render_first(stock_package(&["Open", "High"]), SurfaceCapabilities::all());
    assert_eq!(plot.kind, PlotKind::Bar);
    assert!(plot.title.unwrap().ends_with(CLOSE_ONLY_SUFFIX));
    assert_eq!(plot.datasets.len(), 1);
}

#[test]
fn test_histogram_from_raw_sample() {
    let sample: Vec<f64> = (1..=8).map(f64::from).collect();
    let bytes = XlsxBuilder::new()
        .sheet(
            SheetBuilder::new("S")
                .column("A1", &sample)
                .chart(chartex_chart("clusteredColumn", Some("Spread"), "S!$A$1:$A$8", "S!$A$1:$A$8")),
        )
        .build();
    let plot = render_first(bytes, SurfaceCapabilities::default());

    assert_eq!(plot.kind, PlotKind::Bar);
    assert_eq!(plot.substituted_from, Some(ChartFamily::Histogram));
    // Sturges: ceil(log2(8) + 1) = 4 bins over [1, 8].
    assert_eq!(plot.labels.len(), 4);
    assert_eq!(plot.labels[0], "1.00\u{2013}2.75");
    let DatasetData::Values(counts) = &plot.datasets[0].data else {
        panic!("expected counts");
    };
    assert_eq!(counts.iter().flatten().sum::<f64>(), 8.0);
}

#[test_case("waterfall", ChartFamily::Waterfall)]
#[test_case("funnel", ChartFamily::Funnel)]
#[test_case("treemap", ChartFamily::Treemap)]
fn test_unsupported_families_degrade_to_bars(layout: &str, family: ChartFamily) {
    let bytes = XlsxBuilder::new()
        .sheet(SheetBuilder::new("S").chart(chartex_literal(layout, None, &[3.0, -1.0, 2.0])))
        .build();
    let plot = render_first(bytes, SurfaceCapabilities::all());
    assert_eq!(plot.kind, PlotKind::Bar);
    assert_eq!(plot.substituted_from, Some(family));
    assert_eq!(
        plot.datasets[0].data,
        DatasetData::Values(vec![Some(3.0), Some(-1.0), Some(2.0)])
    );
    assert_eq!(plot.labels, ["1", "2", "3"]);
}

fn charts_package(count: usize) -> Vec<u8> {
    let mut sheet = SheetBuilder::new("Many").column("A1", &[1.0, 2.0, 3.0]);
    for i in 0..count {
        sheet = sheet.chart(
            bar_chart(Some(&format!("Chart {i}")), &[ser_values("A", "Many!$A$1:$A$3")])
                .at(0, u32::try_from(i).unwrap() * 20),
        );
    }
    XlsxBuilder::new()
        .sheet(sheet)
        .sheet(SheetBuilder::new("Empty").cell("A1", 1.0))
        .build()
}

#[test]
fn test_render_disposes_before_creating() {
    let mut session = session(charts_package(3));
    let model = session.cached_model();
    let mut surface = RecordingSurface::default();

    let first = session.render(&model, &mut surface);
    assert_eq!(first.disposed, 0);
    assert_eq!(surface.live_count(), 3);

    let second = session.render(&model, &mut surface);
    assert_eq!(second.disposed, 3);
    assert_eq!(surface.live_count(), 3);
    assert_eq!(surface.created_count(), 6);
    assert_eq!(surface.disposed_count(), 3);
    assert_eq!(session.live_handles(), 3);

    session.close(&mut surface);
    assert_eq!(surface.live_count(), 0);
    assert_eq!(session.live_handles(), 0);
}

#[test]
fn test_switching_sheets_clears_previous_plots() {
    let mut session = session(charts_package(2));
    let model = session.cached_model();
    let mut surface = RecordingSurface::default();
    session.render(&model, &mut surface);
    assert_eq!(surface.live_count(), 2);

    assert!(session.select_sheet("Empty"));
    assert!(session.needs_render());
    let report = session.render(&model, &mut surface);
    assert_eq!(report.status, ChartStatus::NoCharts);
    assert_eq!(report.message.as_deref(), Some("No charts found on this sheet."));
    assert_eq!(report.disposed, 2);
    assert_eq!(surface.live_count(), 0);

    assert!(!session.select_sheet("Nope"));
    assert_eq!(session.selection().sheet.as_deref(), Some("Empty"));
}

#[test]
fn test_chart_limit_truncates() {
    let options = ExtractOptions::from_json(r#"{"chartLimit": 2}"#).unwrap();
    let mut session: ChartSession<PlotHandle> = ChartSession::load(charts_package(5), options);
    let model = session.cached_model();
    let mut surface = RecordingSurface::default();
    let report = session.render(&model, &mut surface);

    assert_eq!(report.charts.len(), 2);
    assert_eq!(report.truncated, 3);
    let titles: Vec<_> = report.charts.iter().map(|c| c.heading.as_str()).collect();
    assert_eq!(titles, ["Chart 0", "Chart 1"]);
}

/// Rejects every config whose title contains "bad".
#[derive(Default)]
struct PickySurface {
    inner: RecordingSurface,
}

impl PlotSurface for PickySurface {
    type Handle = PlotHandle;

    fn capabilities(&self) -> SurfaceCapabilities {
        self.inner.capabilities()
    }

    fn create(&mut self, slot: usize, config: &PlotConfig) -> xlchart::Result<PlotHandle> {
        if config.title.as_deref().is_some_and(|t| t.contains("bad")) {
            return Err(XlchartError::Render("canvas unavailable".into()));
        }
        self.inner.create(slot, config)
    }

    fn dispose(&mut self, handle: PlotHandle) {
        self.inner.dispose(handle);
    }
}

#[test]
fn test_surface_failures_are_isolated() {
    let bytes = XlsxBuilder::new()
        .sheet(
            SheetBuilder::new("S")
                .column("A1", &[1.0, 2.0])
                .chart(bar_chart(Some("good one"), &[ser_values("A", "S!$A$1:$A$2")]))
                .chart(bar_chart(Some("bad one"), &[ser_values("A", "S!$A$1:$A$2")]))
                .chart(bar_chart(Some("good two"), &[ser_values("A", "S!$A$1:$A$2")])),
        )
        .build();
    let mut session = session(bytes);
    let model = session.cached_model();
    let mut surface = PickySurface::default();
    let report = session.render(&model, &mut surface);

    assert_eq!(report.charts.len(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].slot, 1);
    assert_eq!(
        report.failures[0].message,
        "Failed to render chart: Render error: canvas unavailable"
    );
    assert_eq!(session.live_handles(), 2);
}

#[test]
fn test_package_without_charts() {
    let session = session(
        XlsxBuilder::new()
            .sheet(SheetBuilder::new("Only").cell("A1", 1.0))
            .build(),
    );
    assert_eq!(session.status(), ChartStatus::NoCharts);
    assert_eq!(session.status_message(), Some("No embedded charts found."));
    assert_eq!(session.sheet_names(), ["Only"]);
}

#[test]
fn test_corrupt_container_fails_extraction() {
    let mut bytes = charts_package(1);
    bytes.truncate(bytes.len() / 2);
    let mut session = session(bytes);
    assert_eq!(session.status(), ChartStatus::ExtractionFailed);

    let mut surface = RecordingSurface::default();
    let model = session.cached_model();
    let report = session.render(&model, &mut surface);
    assert_eq!(report.message.as_deref(), Some("Chart extraction failed."));
    assert_eq!(surface.created_count(), 0);
}

#[test]
fn test_scenario_overrides_flow_into_plots() {
    let mut session = session(charts_package(1));
    let base = session.cached_model();
    let mut surface = RecordingSurface::default();

    let overrides: Vec<xlchart::CellOverride> =
        serde_json::from_str(r#"[{"sheet": "Many", "row": 0, "col": 0, "value": 42}]"#).unwrap();
    session.set_scenario(Some("Bull".into()));
    let overlay = base.with_overrides(overrides);
    let report = session.render(&overlay, &mut surface);

    assert_eq!(report.selection.scenario.as_deref(), Some("Bull"));
    assert_eq!(
        report.charts[0].plot.datasets[0].data,
        DatasetData::Values(vec![Some(42.0), Some(2.0), Some(3.0)])
    );
}
