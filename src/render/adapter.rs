//! Descriptor -> plot config.
//!
//! Every [`ChartFamily`] is matched exhaustively here. Families a surface
//! cannot draw natively degrade to bars or lines and record the original
//! family in [`PlotConfig::substituted_from`].

use serde::Serialize;

use super::histogram::build_histogram;
use super::options::RenderOptions;
use super::plot::{
    BubblePoint, Dataset, DatasetData, PlotConfig, PlotKind, SurfaceCapabilities, XyPoint,
};
use super::stock::{aligned_candles, infer_roles, CLOSE_ONLY_SUFFIX};
use crate::dates::format_serial_date;
use crate::model::RecalcModel;
use crate::resolve::{resolve_all, resolve_text};
use crate::types::{AxisKind, ChartDescriptor, ChartFamily, ResolvedSeries, Scalar, TextSource};
use crate::workbook_meta::DateSystem;

/// Everything the adapter needs besides the chart itself.
#[derive(Debug, Serialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AdapterContext {
    /// Date system of the package, for date-axis labels
    pub epoch: DateSystem,
    pub capabilities: SurfaceCapabilities,
    pub options: RenderOptions,
}

/// Build a plot config from already-resolved series.
///
/// Only a literal title is used; see [`plot_chart`] to resolve referenced
/// titles against a model.
pub fn to_plot_config(
    descriptor: &ChartDescriptor,
    series: &[ResolvedSeries],
    ctx: &AdapterContext,
) -> PlotConfig {
    let title = match &descriptor.title {
        TextSource::Literal(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    };
    build_config(descriptor, title, series, ctx)
}

/// Resolve a chart against `model` and build its plot config.
pub fn plot_chart<M: RecalcModel + ?Sized>(
    descriptor: &ChartDescriptor,
    model: &M,
    ctx: &AdapterContext,
) -> PlotConfig {
    let series = resolve_all(&descriptor.series, model);
    let title = resolve_text(&descriptor.title, model);
    build_config(descriptor, title, &series, ctx)
}

fn build_config(
    descriptor: &ChartDescriptor,
    title: Option<String>,
    series: &[ResolvedSeries],
    ctx: &AdapterContext,
) -> PlotConfig {
    let family = descriptor.family;
    let date_axis = descriptor.category_axis == AxisKind::Date || family == ChartFamily::Stock;
    let labels = || category_labels(series, date_axis, ctx.epoch);
    let mut config = PlotConfig {
        kind: PlotKind::Bar,
        title,
        labels: Vec::new(),
        datasets: Vec::new(),
        substituted_from: None,
        show_legend: ctx.options.show_legend,
        begin_at_zero: true,
        width: ctx.options.canvas_width,
        height: ctx.options.canvas_height,
    };

    match family {
        ChartFamily::Pie | ChartFamily::Doughnut => {
            config.kind = if family == ChartFamily::Pie {
                PlotKind::Pie
            } else {
                PlotKind::Doughnut
            };
            config.begin_at_zero = false;
            config.labels = labels();
            config.datasets = series
                .first()
                .map(|s| values_dataset(s, config.kind))
                .into_iter()
                .collect();
        }
        ChartFamily::Scatter => {
            config.kind = PlotKind::Scatter;
            config.begin_at_zero = false;
            config.datasets = series.iter().map(scatter_dataset).collect();
        }
        ChartFamily::Bubble => {
            config.kind = PlotKind::Bubble;
            config.begin_at_zero = false;
            config.datasets = bubble_datasets(series, &ctx.options);
        }
        ChartFamily::Histogram => {
            config.substituted_from = Some(family);
            let (labels, dataset) = histogram(series, &ctx.options);
            config.labels = labels;
            config.datasets = dataset.into_iter().collect();
        }
        ChartFamily::Stock => stock(&mut config, series, labels(), ctx.capabilities),
        ChartFamily::Radar if ctx.capabilities.radar => {
            config.kind = PlotKind::Radar;
            config.labels = labels();
            config.datasets = series.iter().map(|s| values_dataset(s, PlotKind::Radar)).collect();
        }
        ChartFamily::Bar
        | ChartFamily::Line
        | ChartFamily::Area
        | ChartFamily::Radar
        | ChartFamily::Combo => {
            let (kind, _) = series_kind(family);
            config.kind = kind;
            if family != ChartFamily::Bar && family != ChartFamily::Line {
                config.substituted_from = Some(family);
            }
            config.labels = labels();
            config.datasets = descriptor
                .series
                .iter()
                .map(|d| d.family)
                .chain(std::iter::repeat(family))
                .zip(series)
                .map(|(series_family, s)| {
                    let (kind, fill) = series_kind(series_family);
                    Dataset {
                        fill,
                        ..values_dataset(s, kind)
                    }
                })
                .collect();
        }
        ChartFamily::Waterfall
        | ChartFamily::Funnel
        | ChartFamily::BoxWhisker
        | ChartFamily::Sunburst
        | ChartFamily::Treemap
        | ChartFamily::Surface
        | ChartFamily::Other => {
            config.substituted_from = Some(family);
            config.labels = labels();
            config.datasets = series.iter().map(|s| values_dataset(s, PlotKind::Bar)).collect();
        }
    }

    tracing::trace!(
        "{} -> {:?} with {} datasets",
        family.as_str(),
        config.kind,
        config.datasets.len()
    );
    config
}

/// Primitive and fill for a series of a bar/line-like family.
fn series_kind(family: ChartFamily) -> (PlotKind, bool) {
    match family {
        ChartFamily::Line | ChartFamily::Radar => (PlotKind::Line, false),
        ChartFamily::Area => (PlotKind::Line, true),
        _ => (PlotKind::Bar, false),
    }
}

fn values_dataset(series: &ResolvedSeries, kind: PlotKind) -> Dataset {
    Dataset {
        label: series.name.clone(),
        kind,
        fill: false,
        show_line: kind != PlotKind::Bar,
        data: DatasetData::Values(series.values.clone()),
    }
}

/// Labels from the first series that has categories, else `1..=n`.
fn category_labels(series: &[ResolvedSeries], date_axis: bool, epoch: DateSystem) -> Vec<String> {
    if let Some(categories) = series
        .iter()
        .map(|s| &s.categories)
        .find(|c| !c.is_empty())
    {
        return categories
            .iter()
            .map(|c| match c {
                Some(Scalar::Number(n)) if date_axis => {
                    format_serial_date(*n, epoch).unwrap_or_else(|| Scalar::Number(*n).to_label())
                }
                Some(scalar) => scalar.to_label(),
                None => String::new(),
            })
            .collect();
    }

    let len = series.iter().map(|s| s.values.len()).max().unwrap_or(0);
    (1..=len).map(|i| i.to_string()).collect()
}

/// x for point `i`: its category as a number, or the 1-based index when
/// the series has no categories at all.
#[allow(clippy::cast_precision_loss)]
fn x_at(series: &ResolvedSeries, i: usize) -> Option<f64> {
    if series.categories.is_empty() {
        return Some((i + 1) as f64);
    }
    series.categories.get(i)?.as_ref()?.as_number()
}

fn scatter_dataset(series: &ResolvedSeries) -> Dataset {
    let points = series
        .values
        .iter()
        .enumerate()
        .filter_map(|(i, y)| Some(XyPoint { x: x_at(series, i)?, y: (*y)? }))
        .collect();
    Dataset {
        label: series.name.clone(),
        kind: PlotKind::Scatter,
        fill: false,
        show_line: false,
        data: DatasetData::Points(points),
    }
}

fn bubble_datasets(series: &[ResolvedSeries], options: &RenderOptions) -> Vec<Dataset> {
    let observed = series
        .iter()
        .filter_map(|s| s.sizes.as_ref())
        .flatten()
        .flatten()
        .copied()
        .filter(|v| v.is_finite());
    let (min, max) = observed.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    let span = max - min;

    let radius = |size: Option<f64>| -> f64 {
        match size {
            Some(s) if span > 0.0 && span.is_finite() => {
                let t = ((s - min) / span).clamp(0.0, 1.0);
                options.min_bubble_radius + t * (options.max_bubble_radius - options.min_bubble_radius)
            }
            _ => options.default_bubble_radius,
        }
    };

    series
        .iter()
        .map(|s| {
            let points = s
                .values
                .iter()
                .enumerate()
                .filter_map(|(i, y)| {
                    let size = s.sizes.as_ref().and_then(|sz| sz.get(i).copied().flatten());
                    Some(BubblePoint {
                        x: x_at(s, i)?,
                        y: (*y)?,
                        r: radius(size),
                    })
                })
                .collect();
            Dataset {
                label: s.name.clone(),
                kind: PlotKind::Bubble,
                fill: false,
                show_line: false,
                data: DatasetData::Bubbles(points),
            }
        })
        .collect()
}

/// Pre-bucketed (text label, count) pairs if the first series has them,
/// otherwise a binned sample.
#[allow(clippy::cast_precision_loss)]
fn histogram(series: &[ResolvedSeries], options: &RenderOptions) -> (Vec<String>, Option<Dataset>) {
    let Some(first) = series.first() else {
        return (Vec::new(), None);
    };

    let bucketed = !first.categories.is_empty()
        && first.categories.len() == first.values.len()
        && first
            .categories
            .iter()
            .all(|c| matches!(c, Some(Scalar::Text(t)) if !t.trim().is_empty()))
        && first.values.iter().all(Option::is_some);
    if bucketed {
        let labels = first
            .categories
            .iter()
            .flatten()
            .map(Scalar::to_label)
            .collect();
        return (labels, Some(values_dataset(first, PlotKind::Bar)));
    }

    let sample: Vec<f64> = first.values.iter().flatten().copied().collect();
    let bins = build_histogram(&sample, options.histogram_label_precision);
    let labels = bins.iter().map(|b| b.label.clone()).collect();
    let counts = bins.iter().map(|b| Some(b.count as f64)).collect();
    let dataset = Dataset {
        label: first.name.clone(),
        kind: PlotKind::Bar,
        fill: false,
        show_line: false,
        data: DatasetData::Values(counts),
    };
    (labels, Some(dataset))
}

fn stock(
    config: &mut PlotConfig,
    series: &[ResolvedSeries],
    labels: Vec<String>,
    capabilities: SurfaceCapabilities,
) {
    let usable: Vec<&ResolvedSeries> = series
        .iter()
        .filter(|s| s.values.iter().any(Option::is_some))
        .collect();
    let names: Vec<&str> = usable.iter().map(|s| s.name.as_str()).collect();
    let roles = infer_roles(&names);

    let candles = roles
        .complete()
        .filter(|_| usable.len() >= 4 && capabilities.candlestick)
        .and_then(|[o, h, l, c]| {
            let pick = |i: usize| usable.get(i).map(|s| s.values.as_slice());
            Some(aligned_candles([pick(o)?, pick(h)?, pick(l)?, pick(c)?]))
        })
        .filter(|candles| !candles.is_empty());

    if let Some(candles) = candles {
        config.kind = PlotKind::Candlestick;
        config.begin_at_zero = false;
        config.labels = candles
            .iter()
            .map(|(i, _)| labels.get(*i).cloned().unwrap_or_default())
            .collect();
        config.datasets = vec![Dataset {
            label: "OHLC".to_string(),
            kind: PlotKind::Candlestick,
            fill: false,
            show_line: false,
            data: DatasetData::Candles(candles.into_iter().map(|(_, c)| c).collect()),
        }];
        return;
    }

    // Close only: the close role if one was inferred, else the last usable series.
    config.kind = PlotKind::Bar;
    config.substituted_from = Some(ChartFamily::Stock);
    config.labels = labels;
    let close = roles
        .close
        .and_then(|i| usable.get(i))
        .or_else(|| usable.last());
    config.datasets = close
        .map(|s| values_dataset(s, PlotKind::Bar))
        .into_iter()
        .collect();
    let base = config
        .title
        .take()
        .unwrap_or_else(|| ChartFamily::Stock.fallback_title());
    config.title = Some(format!("{base}{CLOSE_ONLY_SUFFIX}"));
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::types::{DataSource, SeriesDescriptor};
    use test_case::test_case;

    fn descriptor(family: ChartFamily, series_families: &[ChartFamily]) -> ChartDescriptor {
        ChartDescriptor {
            family,
            title: TextSource::Literal("Chart".into()),
            series: series_families
                .iter()
                .map(|f| SeriesDescriptor {
                    name: TextSource::Absent,
                    categories: DataSource::Absent,
                    values: DataSource::Absent,
                    sizes: None,
                    family: *f,
                })
                .collect(),
            category_axis: if family.is_xy() {
                AxisKind::Value
            } else {
                AxisKind::Category
            },
            part_path: "xl/charts/chart1.xml".into(),
            anchor: None,
            name: None,
        }
    }

    fn series(name: &str, categories: Vec<Option<Scalar>>, values: Vec<Option<f64>>) -> ResolvedSeries {
        ResolvedSeries {
            name: name.into(),
            categories,
            values,
            sizes: None,
        }
    }

    fn text(s: &str) -> Option<Scalar> {
        Some(Scalar::Text(s.into()))
    }

    fn num(n: f64) -> Option<Scalar> {
        Some(Scalar::Number(n))
    }

    #[test_case(ChartFamily::Bar, PlotKind::Bar, None)]
    #[test_case(ChartFamily::Line, PlotKind::Line, None)]
    #[test_case(ChartFamily::Area, PlotKind::Line, Some(ChartFamily::Area))]
    #[test_case(ChartFamily::Waterfall, PlotKind::Bar, Some(ChartFamily::Waterfall))]
    #[test_case(ChartFamily::Funnel, PlotKind::Bar, Some(ChartFamily::Funnel))]
    #[test_case(ChartFamily::BoxWhisker, PlotKind::Bar, Some(ChartFamily::BoxWhisker))]
    #[test_case(ChartFamily::Sunburst, PlotKind::Bar, Some(ChartFamily::Sunburst))]
    #[test_case(ChartFamily::Treemap, PlotKind::Bar, Some(ChartFamily::Treemap))]
    #[test_case(ChartFamily::Surface, PlotKind::Bar, Some(ChartFamily::Surface))]
    #[test_case(ChartFamily::Other, PlotKind::Bar, Some(ChartFamily::Other))]
    #[test_case(ChartFamily::Combo, PlotKind::Bar, Some(ChartFamily::Combo))]
    fn test_category_families(family: ChartFamily, kind: PlotKind, substituted: Option<ChartFamily>) {
        let d = descriptor(family, &[family]);
        let s = [series("A", vec![text("x"), text("y")], vec![Some(1.0), None])];
        let config = to_plot_config(&d, &s, &AdapterContext::default());
        assert_eq!(config.kind, kind);
        assert_eq!(config.substituted_from, substituted);
        assert_eq!(config.labels, vec!["x", "y"]);
        assert_eq!(config.title.as_deref(), Some("Chart"));
        assert_eq!(config.datasets[0].data, DatasetData::Values(vec![Some(1.0), None]));
        assert_eq!((config.width, config.height), (420, 260));
    }

    #[test]
    fn test_area_fills() {
        let d = descriptor(ChartFamily::Area, &[ChartFamily::Area]);
        let s = [series("A", vec![], vec![Some(1.0)])];
        let config = to_plot_config(&d, &s, &AdapterContext::default());
        assert!(config.datasets[0].fill);
        assert_eq!(config.labels, vec!["1"]);
    }

    #[test]
    fn test_radar_depends_on_capability() {
        let d = descriptor(ChartFamily::Radar, &[ChartFamily::Radar]);
        let s = [series("A", vec![text("a")], vec![Some(1.0)])];

        let with = to_plot_config(&d, &s, &AdapterContext::default());
        assert_eq!(with.kind, PlotKind::Radar);
        assert_eq!(with.substituted_from, None);

        let ctx = AdapterContext {
            capabilities: SurfaceCapabilities::basic(),
            ..AdapterContext::default()
        };
        let without = to_plot_config(&d, &s, &ctx);
        assert_eq!(without.kind, PlotKind::Line);
        assert_eq!(without.substituted_from, Some(ChartFamily::Radar));
    }

    #[test]
    fn test_mixed_series_keep_their_kind() {
        let d = descriptor(ChartFamily::Bar, &[ChartFamily::Bar, ChartFamily::Line]);
        let s = [
            series("Units", vec![text("a")], vec![Some(1.0)]),
            series("Trend", vec![text("a")], vec![Some(2.0)]),
        ];
        let config = to_plot_config(&d, &s, &AdapterContext::default());
        assert_eq!(config.kind, PlotKind::Bar);
        assert_eq!(config.datasets[0].kind, PlotKind::Bar);
        assert_eq!(config.datasets[1].kind, PlotKind::Line);
    }

    #[test]
    fn test_pie_uses_first_series_only() {
        let d = descriptor(ChartFamily::Pie, &[ChartFamily::Pie, ChartFamily::Pie]);
        let s = [
            series("Share", vec![text("a"), text("b")], vec![Some(60.0), Some(40.0)]),
            series("Ignored", vec![], vec![Some(1.0)]),
        ];
        let config = to_plot_config(&d, &s, &AdapterContext::default());
        assert_eq!(config.kind, PlotKind::Pie);
        assert_eq!(config.datasets.len(), 1);
        assert_eq!(config.datasets[0].label, "Share");
        assert_eq!(config.labels, vec!["a", "b"]);
    }

    #[test]
    fn test_scatter_drops_incomplete_points() {
        let d = descriptor(ChartFamily::Scatter, &[ChartFamily::Scatter; 2]);
        let s = [
            series("xy", vec![num(1.0), None, num(3.0)], vec![Some(2.0), Some(5.0), None]),
            series("indexed", vec![], vec![Some(7.0), Some(8.0)]),
        ];
        let config = to_plot_config(&d, &s, &AdapterContext::default());
        assert_eq!(config.kind, PlotKind::Scatter);
        assert!(!config.datasets[0].show_line);
        assert_eq!(
            config.datasets[0].data,
            DatasetData::Points(vec![XyPoint { x: 1.0, y: 2.0 }])
        );
        assert_eq!(
            config.datasets[1].data,
            DatasetData::Points(vec![XyPoint { x: 1.0, y: 7.0 }, XyPoint { x: 2.0, y: 8.0 }])
        );
    }

    #[test]
    fn test_bubble_radius_rescaled() {
        let d = descriptor(ChartFamily::Bubble, &[ChartFamily::Bubble]);
        let mut s = series("b", vec![num(1.0), num(2.0), num(3.0)], vec![Some(1.0); 3]);
        s.sizes = Some(vec![Some(10.0), Some(20.0), None]);
        let config = to_plot_config(&d, &[s], &AdapterContext::default());
        let DatasetData::Bubbles(points) = &config.datasets[0].data else {
            panic!("expected bubbles");
        };
        assert_eq!(points[0].r, 3.0);
        assert_eq!(points[1].r, 18.0);
        assert_eq!(points[2].r, 6.0);
    }

    #[test]
    fn test_bubble_equal_sizes_use_default() {
        let d = descriptor(ChartFamily::Bubble, &[ChartFamily::Bubble]);
        let mut s = series("b", vec![num(1.0), num(2.0)], vec![Some(1.0); 2]);
        s.sizes = Some(vec![Some(5.0), Some(5.0)]);
        let config = to_plot_config(&d, &[s], &AdapterContext::default());
        let DatasetData::Bubbles(points) = &config.datasets[0].data else {
            panic!("expected bubbles");
        };
        assert!(points.iter().all(|p| p.r == 6.0));
    }

    #[test]
    fn test_histogram_bins_raw_sample() {
        let d = descriptor(ChartFamily::Histogram, &[ChartFamily::Histogram]);
        let s = [series("h", vec![], vec![Some(0.0), Some(1.0), Some(2.0), Some(3.0)])];
        let config = to_plot_config(&d, &s, &AdapterContext::default());
        assert_eq!(config.kind, PlotKind::Bar);
        assert_eq!(config.labels.len(), 3);
        assert_eq!(
            config.datasets[0].data,
            DatasetData::Values(vec![Some(1.0), Some(1.0), Some(2.0)])
        );
    }

    #[test]
    fn test_histogram_prebucketed() {
        let d = descriptor(ChartFamily::Histogram, &[ChartFamily::Histogram]);
        let s = [series(
            "h",
            vec![text("[0, 10]"), text("(10, 20]")],
            vec![Some(4.0), Some(9.0)],
        )];
        let config = to_plot_config(&d, &s, &AdapterContext::default());
        assert_eq!(config.labels, vec!["[0, 10]", "(10, 20]"]);
        assert_eq!(config.datasets[0].data, DatasetData::Values(vec![Some(4.0), Some(9.0)]));
    }

    fn stock_series(names: [&str; 4]) -> Vec<ResolvedSeries> {
        let dates = vec![num(45292.0), num(45293.0)];
        let values = [
            [10.0, 11.0],
            [12.0, 13.0],
            [9.0, 10.0],
            [11.0, 12.5],
        ];
        names
            .iter()
            .zip(values)
            .map(|(n, v)| series(n, dates.clone(), v.iter().map(|x| Some(*x)).collect()))
            .collect()
    }

    #[test]
    fn test_stock_candles_by_name() {
        let mut d = descriptor(ChartFamily::Stock, &[ChartFamily::Stock; 4]);
        d.category_axis = AxisKind::Category;
        let s = stock_series(["Close", "Open", "High", "Low"]);
        let ctx = AdapterContext {
            capabilities: SurfaceCapabilities::all(),
            ..AdapterContext::default()
        };
        let config = to_plot_config(&d, &s, &ctx);
        assert_eq!(config.kind, PlotKind::Candlestick);
        assert_eq!(config.labels, vec!["2024-01-01", "2024-01-02"]);
        let DatasetData::Candles(candles) = &config.datasets[0].data else {
            panic!("expected candles");
        };
        // "Close" is the first series, so close = 10.0 on day one.
        assert_eq!(candles[0].close, 10.0);
        assert_eq!(candles[0].open, 12.0);
        assert_eq!(candles[0].high, 9.0);
        assert_eq!(candles[0].low, 11.0);
    }

    #[test]
    fn test_stock_without_candlestick_is_close_only() {
        let d = descriptor(ChartFamily::Stock, &[ChartFamily::Stock; 4]);
        let s = stock_series(["Open", "High", "Low", "Close"]);
        let config = to_plot_config(&d, &s, &AdapterContext::default());
        assert_eq!(config.kind, PlotKind::Bar);
        assert_eq!(config.substituted_from, Some(ChartFamily::Stock));
        assert_eq!(config.title.as_deref(), Some("Chart (Close only)"));
        assert_eq!(config.datasets[0].label, "Close");
    }

    #[test]
    fn test_stock_two_series_is_close_only() {
        let d = descriptor(ChartFamily::Stock, &[ChartFamily::Stock; 2]);
        let s: Vec<_> = stock_series(["Open", "Close", "x", "y"]).into_iter().take(2).collect();
        let ctx = AdapterContext {
            capabilities: SurfaceCapabilities::all(),
            ..AdapterContext::default()
        };
        let config = to_plot_config(&d, &s, &ctx);
        assert_eq!(config.kind, PlotKind::Bar);
        assert!(config.title.unwrap().ends_with(CLOSE_ONLY_SUFFIX));
        assert_eq!(config.datasets[0].label, "Close");
    }

    #[test]
    fn test_date_axis_labels_follow_epoch() {
        let mut d = descriptor(ChartFamily::Line, &[ChartFamily::Line]);
        d.category_axis = AxisKind::Date;
        let s = [series("d", vec![num(0.0)], vec![Some(1.0)])];
        let ctx_1904 = AdapterContext {
            epoch: DateSystem::Date1904,
            ..AdapterContext::default()
        };
        assert_eq!(
            to_plot_config(&d, &s, &AdapterContext::default()).labels,
            vec!["1899-12-30"]
        );
        assert_eq!(to_plot_config(&d, &s, &ctx_1904).labels, vec!["1904-01-01"]);
    }
}
