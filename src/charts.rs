//! Chart part decoding
//!
//! Turns one chart part into a [`ChartDescriptor`]. Classic charts live in
//! `xl/charts/chartN.xml` (2006 chart schema); Office 2016 chart types live in
//! `xl/charts/chartExN.xml` (2014 chartex schema). Both are parsed into a tree
//! and matched by local name only, so one code path serves `c:` and `cx:`.
//!
//! ## Classic structure
//! ```xml
//! <c:chartSpace>
//!   <c:chart>
//!     <c:title><c:tx><c:rich>...<a:t>Revenue</a:t>...</c:rich></c:tx></c:title>
//!     <c:autoTitleDeleted val="0"/>
//!     <c:plotArea>
//!       <c:barChart>                      <!-- first chart-type element wins -->
//!         <c:ser>
//!           <c:tx><c:strRef><c:f>Sheet1!$B$1</c:f></c:strRef></c:tx>
//!           <c:cat><c:strRef><c:f>Sheet1!$A$2:$A$5</c:f></c:strRef></c:cat>
//!           <c:val><c:numRef><c:f>Sheet1!$B$2:$B$5</c:f><c:numCache>...</c:numCache></c:numRef></c:val>
//!         </c:ser>
//!       </c:barChart>
//!       <c:lineChart>...</c:lineChart>    <!-- contributes its series as Line -->
//!       <c:catAx>...</c:catAx>
//!     </c:plotArea>
//!   </c:chart>
//! </c:chartSpace>
//! ```
//!
//! ## Chartex structure
//! ```xml
//! <cx:chartSpace>
//!   <cx:chartData>
//!     <cx:data id="0">
//!       <cx:strDim type="cat"><cx:f>Sheet1!$A$2:$A$9</cx:f></cx:strDim>
//!       <cx:numDim type="val"><cx:f>Sheet1!$B$2:$B$9</cx:f></cx:numDim>
//!     </cx:data>
//!   </cx:chartData>
//!   <cx:chart>
//!     <cx:plotArea><cx:plotAreaRegion>
//!       <cx:series layoutId="waterfall"><cx:dataId val="0"/></cx:series>
//!     </cx:plotAreaRegion></cx:plotArea>
//!   </cx:chart>
//! </cx:chartSpace>
//! ```

use roxmltree::{Document, Node};
use std::collections::HashMap;

use crate::container::Package;
use crate::dates::is_date_format;
use crate::error::{Result, XlchartError};
use crate::types::{
    AxisKind, ChartDescriptor, ChartFamily, ChartPartRef, DataSource, Scalar, SeriesDescriptor,
    TextSource,
};

/// Upper bound on a dense point list; `ptCount` is untrusted.
const MAX_POINTS: usize = 1 << 20;

/// Decode a chart part, logging and discarding failures.
pub fn decode(xml: &[u8]) -> Option<ChartDescriptor> {
    match try_decode(xml) {
        Ok(descriptor) => Some(descriptor),
        Err(e) => {
            tracing::debug!("chart part not decoded: {e}");
            None
        }
    }
}

/// Decode a chart part.
///
/// The returned descriptor has an empty `part_path` and no anchor; see
/// [`decode_chart_part`] for the package-aware variant.
///
/// # Errors
/// - [`XlchartError::Dom`] if the document is not well-formed
/// - [`XlchartError::UnrecognizedChartFamily`] if no chart-type element is
///   found under the plot area
pub fn try_decode(xml: &[u8]) -> Result<ChartDescriptor> {
    let text = std::str::from_utf8(xml)
        .map_err(|e| XlchartError::Parse(format!("chart part is not UTF-8: {e}")))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let doc = Document::parse(text)?;

    let root = doc.root_element();
    let chart = child(root, "chart").unwrap_or(root);
    let plot_area = chart
        .descendants()
        .find(|n| is_named(*n, "plotArea"))
        .ok_or_else(|| XlchartError::UnrecognizedChartFamily("no plotArea".to_string()))?;

    let (family, series) = match classic_series(plot_area) {
        Some(found) => found,
        None => chartex_series(root, plot_area).ok_or_else(|| {
            XlchartError::UnrecognizedChartFamily(describe_plot_area(plot_area))
        })?,
    };

    // An explicit title wins over autoTitleDeleted; without one there is
    // nothing to show either way.
    let title = child(chart, "title")
        .and_then(|title| child(title, "tx"))
        .map(decode_text)
        .unwrap_or_default();

    let category_axis = category_axis(plot_area, family);
    tracing::trace!(
        "decoded {} chart with {} series ({category_axis:?} axis)",
        family.as_str(),
        series.len()
    );

    Ok(ChartDescriptor {
        family,
        title,
        series,
        category_axis,
        part_path: String::new(),
        anchor: None,
        name: None,
    })
}

/// Read and decode the chart part a [`ChartPartRef`] points at, carrying
/// over its path, anchor and frame name.
pub fn decode_chart_part(package: &Package, part: &ChartPartRef) -> Result<ChartDescriptor> {
    let xml = package.read(&part.part_path)?;
    let mut descriptor = try_decode(&xml).map_err(|e| match e {
        XlchartError::UnrecognizedChartFamily(detail) => {
            XlchartError::UnrecognizedChartFamily(format!("{} ({detail})", part.part_path))
        }
        other => other,
    })?;
    descriptor.part_path.clone_from(&part.part_path);
    descriptor.anchor = part.anchor;
    descriptor.name.clone_from(&part.name);
    Ok(descriptor)
}

/// Series of every chart-type element under a classic plot area, or `None`
/// when there is no chart-type element.
fn classic_series(plot_area: Node<'_, '_>) -> Option<(ChartFamily, Vec<SeriesDescriptor>)> {
    let mut family = None;
    let mut series = Vec::new();

    for group in plot_area.children().filter(Node::is_element) {
        let Some(group_family) = ChartFamily::from_element(group.tag_name().name()) else {
            continue;
        };
        family.get_or_insert(group_family);
        series.extend(children_named(group, "ser").map(|ser| decode_series(ser, group_family)));
    }

    family.map(|family| (family, series))
}

/// Series of a chartex plot area, with their data pulled from `chartData`.
fn chartex_series(
    root: Node<'_, '_>,
    plot_area: Node<'_, '_>,
) -> Option<(ChartFamily, Vec<SeriesDescriptor>)> {
    let data = chart_data(root);
    let mut family = None;
    let mut series = Vec::new();

    for ser in plot_area.descendants().filter(|n| is_named(*n, "series")) {
        let layout = ser.attribute("layoutId").unwrap_or("");
        let Some(ser_family) = ChartFamily::from_layout_id(layout) else {
            tracing::debug!("skipping chartex series with layout {layout:?}");
            continue;
        };
        family.get_or_insert(ser_family);
        series.push(decode_chartex_series(ser, ser_family, &data));
    }

    family.map(|family| (family, series))
}

fn describe_plot_area(plot_area: Node<'_, '_>) -> String {
    let names: Vec<&str> = plot_area
        .children()
        .filter(Node::is_element)
        .map(|n| n.tag_name().name())
        .collect();
    if names.is_empty() {
        "empty plotArea".to_string()
    } else {
        format!("plotArea children: {}", names.join(", "))
    }
}

fn decode_series(ser: Node<'_, '_>, family: ChartFamily) -> SeriesDescriptor {
    let name = child(ser, "tx").map(decode_text).unwrap_or_default();
    let categories = child(ser, "cat")
        .or_else(|| child(ser, "xVal"))
        .map(decode_data)
        .unwrap_or_default();
    let values = child(ser, "val")
        .or_else(|| child(ser, "yVal"))
        .map(decode_data)
        .unwrap_or_default();
    let sizes = (family == ChartFamily::Bubble).then(|| {
        child(ser, "bubbleSize")
            .map(decode_data)
            .unwrap_or_default()
    });

    SeriesDescriptor {
        name,
        categories,
        values,
        sizes,
        family,
    }
}

/// `tx` element -> text source.
///
/// Rich text runs first, then a formula, then a plain value, then the first
/// cached string of a formula-less `strRef`.
fn decode_text(tx: Node<'_, '_>) -> TextSource {
    if let Some(rich) = child(tx, "rich") {
        let runs: Vec<&str> = rich
            .descendants()
            .filter(|n| is_named(*n, "t"))
            .filter_map(|n| n.text())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if !runs.is_empty() {
            return TextSource::Literal(runs.join(" "));
        }
    }

    let holder = child(tx, "strRef").or_else(|| child(tx, "txData"));
    if let Some(f) = holder.and_then(|n| child_text(n, "f")) {
        return TextSource::Reference(f.to_string());
    }

    let plain = child_text(tx, "v").or_else(|| holder.and_then(|n| child_text(n, "v")));
    if let Some(v) = plain {
        return TextSource::Literal(v.to_string());
    }

    let cached = child(tx, "strRef")
        .and_then(|r| child(r, "strCache"))
        .and_then(|cache| children_named(cache, "pt").next())
        .and_then(|pt| child_text(pt, "v"));
    match cached {
        Some(v) => TextSource::Literal(v.to_string()),
        None => TextSource::Absent,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PointKind {
    Number,
    Text,
}

/// `cat` / `val` / `xVal` / `yVal` / `bubbleSize` -> data source.
///
/// A formula always wins over the cache stored beside it.
fn decode_data(node: Node<'_, '_>) -> DataSource {
    for reference in ["numRef", "strRef", "multiLvlStrRef"] {
        if let Some(f) = child(node, reference).and_then(|r| child_text(r, "f")) {
            return DataSource::Reference(f.to_string());
        }
    }

    if let Some(cache) = child(node, "numRef")
        .and_then(|r| child(r, "numCache"))
        .or_else(|| child(node, "numLit"))
    {
        return DataSource::Literal(dense_points(cache, PointKind::Number, None));
    }
    if let Some(cache) = child(node, "strRef")
        .and_then(|r| child(r, "strCache"))
        .or_else(|| child(node, "strLit"))
    {
        return DataSource::Literal(dense_points(cache, PointKind::Text, None));
    }
    if let Some(cache) = child(node, "multiLvlStrRef").and_then(|r| child(r, "multiLvlStrCache")) {
        // The first level is the innermost (leaf) labels.
        if let Some(level) = child(cache, "lvl") {
            return DataSource::Literal(dense_points(level, PointKind::Text, point_count(cache)));
        }
    }

    DataSource::Absent
}

/// Reassemble `pt` children by `idx` into a dense list of length
/// `max(ptCount, max idx + 1)`; gaps are `None`.
fn dense_points(
    container: Node<'_, '_>,
    kind: PointKind,
    count_hint: Option<usize>,
) -> Vec<Option<Scalar>> {
    let mut points = Vec::new();
    let mut max_idx = None::<usize>;

    for pt in children_named(container, "pt") {
        let Some(idx) = pt.attribute("idx").and_then(|v| v.trim().parse::<usize>().ok()) else {
            continue;
        };
        // Classic points wrap their value in <v>; chartex points hold it directly.
        let raw = child_text(pt, "v").or_else(|| pt.text()).unwrap_or("");
        let value = match kind {
            PointKind::Number => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Scalar::Number),
            PointKind::Text => Some(Scalar::Text(raw.to_string())),
        };
        max_idx = Some(max_idx.map_or(idx, |m| m.max(idx)));
        points.push((idx, value));
    }

    let declared = point_count(container).or(count_hint).unwrap_or(0);
    let inferred = max_idx.map_or(0, |m| m.saturating_add(1));
    let len = declared.max(inferred).min(MAX_POINTS);

    let mut values = vec![None; len];
    for (idx, value) in points {
        if let Some(slot) = values.get_mut(idx) {
            *slot = value;
        }
    }
    values
}

/// `<ptCount val=".."/>` child (classic) or `ptCount` attribute (chartex).
fn point_count(container: Node<'_, '_>) -> Option<usize> {
    child(container, "ptCount")
        .and_then(|n| n.attribute("val"))
        .or_else(|| container.attribute("ptCount"))
        .and_then(|v| v.trim().parse().ok())
}

/// `data id` -> `<data>` element of a chartex `chartData` block.
fn chart_data<'a, 'input>(root: Node<'a, 'input>) -> HashMap<&'a str, Node<'a, 'input>> {
    let Some(chart_data) = root.descendants().find(|n| is_named(*n, "chartData")) else {
        return HashMap::new();
    };
    children_named(chart_data, "data")
        .filter_map(|data| data.attribute("id").map(|id| (id.trim(), data)))
        .collect()
}

fn decode_chartex_series(
    ser: Node<'_, '_>,
    family: ChartFamily,
    data: &HashMap<&str, Node<'_, '_>>,
) -> SeriesDescriptor {
    let name = child(ser, "tx").map(decode_text).unwrap_or_default();
    let mut descriptor = SeriesDescriptor {
        name,
        categories: DataSource::Absent,
        values: DataSource::Absent,
        sizes: None,
        family,
    };

    let data_id = ser.attribute("dataId").or_else(|| {
        child(ser, "dataId").and_then(|n| n.attribute("val").or_else(|| n.text()))
    });
    let Some(data_node) = data_id.and_then(|id| data.get(id.trim())) else {
        tracing::debug!("chartex series without matching chartData entry ({data_id:?})");
        return descriptor;
    };

    let mut size = DataSource::Absent;
    for dim in data_node.children().filter(Node::is_element) {
        let kind = match dim.tag_name().name() {
            "strDim" => PointKind::Text,
            "numDim" => PointKind::Number,
            _ => continue,
        };
        let slot = match dim.attribute("type").unwrap_or("") {
            "cat" | "x" => &mut descriptor.categories,
            "val" | "y" => &mut descriptor.values,
            "size" => &mut size,
            _ => continue,
        };
        if slot.is_absent() {
            *slot = decode_dim(dim, kind);
        }
    }

    // Treemap and sunburst carry their magnitudes as `size`.
    if descriptor.values.is_absent() {
        descriptor.values = size;
    }
    descriptor
}

fn decode_dim(dim: Node<'_, '_>, kind: PointKind) -> DataSource {
    if let Some(f) = child_text(dim, "f") {
        return DataSource::Reference(f.to_string());
    }
    match child(dim, "lvl") {
        Some(level) => DataSource::Literal(dense_points(level, kind, None)),
        None => DataSource::Absent,
    }
}

fn category_axis(plot_area: Node<'_, '_>, family: ChartFamily) -> AxisKind {
    if plot_area.children().any(|n| is_named(n, "dateAx")) {
        return AxisKind::Date;
    }
    let date_formatted = plot_area
        .descendants()
        .filter(|n| is_named(*n, "cat"))
        .find_map(|cat| {
            child(cat, "numRef")
                .and_then(|r| child(r, "numCache"))
                .or_else(|| child(cat, "numLit"))
                .and_then(|cache| child_text(cache, "formatCode"))
        })
        .is_some_and(is_date_format);
    if date_formatted {
        return AxisKind::Date;
    }
    if family.is_xy() {
        AxisKind::Value
    } else {
        AxisKind::Category
    }
}

// =============================================================================
// Tree helpers
// =============================================================================

fn is_named(node: Node<'_, '_>, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| is_named(*n, name))
}

fn children_named<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children().filter(move |n| is_named(*n, name))
}

/// Trimmed, non-empty text of a named child.
fn child_text<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    child(node, name)
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn chart_xml(plot_area: &str, extra: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<c:chartSpace xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart"
              xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main">
  <c:chart>{extra}<c:plotArea><c:layout/>{plot_area}</c:plotArea></c:chart>
</c:chartSpace>"#
        )
    }

    const BAR_SERIES: &str = r#"<c:ser><c:idx val="0"/><c:order val="0"/>
  <c:tx><c:strRef><c:f>Sheet1!$B$1</c:f><c:strCache><c:ptCount val="1"/><c:pt idx="0"><c:v>Revenue</c:v></c:pt></c:strCache></c:strRef></c:tx>
  <c:cat><c:strRef><c:f>Sheet1!$A$2:$A$4</c:f></c:strRef></c:cat>
  <c:val><c:numRef><c:f>Sheet1!$B$2:$B$4</c:f><c:numCache><c:ptCount val="3"/><c:pt idx="0"><c:v>1</c:v></c:pt></c:numCache></c:numRef></c:val>
</c:ser>"#;

    #[test_case("barChart", ChartFamily::Bar)]
    #[test_case("bar3DChart", ChartFamily::Bar)]
    #[test_case("line3DChart", ChartFamily::Line)]
    #[test_case("areaChart", ChartFamily::Area)]
    #[test_case("ofPieChart", ChartFamily::Pie)]
    #[test_case("doughnutChart", ChartFamily::Doughnut)]
    #[test_case("radarChart", ChartFamily::Radar)]
    #[test_case("stockChart", ChartFamily::Stock)]
    #[test_case("wireframeSurface3DChart", ChartFamily::Surface)]
    #[test_case("paretoChart", ChartFamily::Bar)]
    fn test_family_mapping(element: &str, expected: ChartFamily) {
        let xml = chart_xml(&format!("<c:{element}>{BAR_SERIES}</c:{element}>"), "");
        let descriptor = try_decode(xml.as_bytes()).unwrap();
        assert_eq!(descriptor.family, expected);
        assert_eq!(descriptor.series.len(), 1);
        assert_eq!(descriptor.series[0].family, expected);
    }

    #[test]
    fn test_reference_wins_over_cache() {
        let xml = chart_xml(&format!("<c:barChart>{BAR_SERIES}</c:barChart>"), "");
        let descriptor = try_decode(xml.as_bytes()).unwrap();
        let series = &descriptor.series[0];
        assert_eq!(series.name, TextSource::Reference("Sheet1!$B$1".into()));
        assert_eq!(
            series.categories,
            DataSource::Reference("Sheet1!$A$2:$A$4".into())
        );
        assert_eq!(series.values, DataSource::Reference("Sheet1!$B$2:$B$4".into()));
        assert_eq!(series.sizes, None);
    }

    #[test]
    fn test_sparse_cache_is_dense_with_gaps() {
        let ser = r#"<c:ser>
  <c:tx><c:v>Cached</c:v></c:tx>
  <c:cat><c:strRef><c:strCache><c:ptCount val="4"/>
    <c:pt idx="0"><c:v>Q1</c:v></c:pt><c:pt idx="2"><c:v>Q3</c:v></c:pt>
  </c:strCache></c:strRef></c:cat>
  <c:val><c:numRef><c:numCache><c:formatCode>General</c:formatCode><c:ptCount val="2"/>
    <c:pt idx="0"><c:v>1.5</c:v></c:pt><c:pt idx="1"><c:v>oops</c:v></c:pt><c:pt idx="3"><c:v>4</c:v></c:pt>
  </c:numCache></c:numRef></c:val>
</c:ser>"#;
        let xml = chart_xml(&format!("<c:lineChart>{ser}</c:lineChart>"), "");
        let series = &try_decode(xml.as_bytes()).unwrap().series[0];

        assert_eq!(series.name, TextSource::Literal("Cached".into()));
        assert_eq!(
            series.categories,
            DataSource::Literal(vec![
                Some(Scalar::Text("Q1".into())),
                None,
                Some(Scalar::Text("Q3".into())),
                None,
            ])
        );
        // ptCount says 2 but idx 3 exists: length is max(ptCount, max idx + 1).
        assert_eq!(
            series.values,
            DataSource::Literal(vec![
                Some(Scalar::Number(1.5)),
                None,
                None,
                Some(Scalar::Number(4.0)),
            ])
        );
    }

    #[test]
    fn test_literal_series() {
        let ser = r#"<c:ser>
  <c:cat><c:strLit><c:ptCount val="2"/><c:pt idx="0"><c:v>a</c:v></c:pt><c:pt idx="1"><c:v>b</c:v></c:pt></c:strLit></c:cat>
  <c:val><c:numLit><c:ptCount val="2"/><c:pt idx="0"><c:v>10</c:v></c:pt><c:pt idx="1"><c:v>20</c:v></c:pt></c:numLit></c:val>
</c:ser>"#;
        let xml = chart_xml(&format!("<c:pieChart>{ser}</c:pieChart>"), "");
        let series = &try_decode(xml.as_bytes()).unwrap().series[0];
        assert_eq!(series.name, TextSource::Absent);
        assert_eq!(
            series.values,
            DataSource::Literal(vec![Some(Scalar::Number(10.0)), Some(Scalar::Number(20.0))])
        );
    }

    #[test]
    fn test_title_rules() {
        let rich = r#"<c:title><c:tx><c:rich><a:bodyPr/><a:p><a:r><a:t>Sales</a:t></a:r><a:r><a:t> 2024 </a:t></a:r></a:p></c:rich></c:tx></c:title>"#;
        let xml = chart_xml("<c:barChart/>", rich);
        assert_eq!(
            try_decode(xml.as_bytes()).unwrap().title,
            TextSource::Literal("Sales 2024".into())
        );

        let by_ref = r#"<c:title><c:tx><c:strRef><c:f>'My Sheet'!$A$1</c:f></c:strRef></c:tx></c:title>"#;
        let xml = chart_xml("<c:barChart/>", by_ref);
        assert_eq!(
            try_decode(xml.as_bytes()).unwrap().title,
            TextSource::Reference("'My Sheet'!$A$1".into())
        );

        let kept = format!(r#"{rich}<c:autoTitleDeleted val="0"/>"#);
        let xml = chart_xml("<c:barChart/>", &kept);
        assert_eq!(
            try_decode(xml.as_bytes()).unwrap().title,
            TextSource::Literal("Sales 2024".into())
        );

        let untitled = chart_xml("<c:barChart/>", r#"<c:autoTitleDeleted val="1"/>"#);
        assert_eq!(try_decode(untitled.as_bytes()).unwrap().title, TextSource::Absent);
    }

    #[test]
    fn test_explicit_title_survives_auto_title_deleted() {
        let title = r#"<c:title><c:tx><c:rich><a:bodyPr/><a:p><a:r><a:t>Revenue</a:t></a:r></a:p></c:rich></c:tx></c:title><c:autoTitleDeleted val="1"/>"#;
        let xml = chart_xml("<c:barChart/>", title);
        assert_eq!(
            try_decode(xml.as_bytes()).unwrap().title,
            TextSource::Literal("Revenue".into())
        );
    }

    #[test]
    fn test_combo_keeps_series_families() {
        let plot = format!(
            "<c:barChart>{BAR_SERIES}</c:barChart><c:lineChart>{BAR_SERIES}{BAR_SERIES}</c:lineChart>"
        );
        let descriptor = try_decode(chart_xml(&plot, "").as_bytes()).unwrap();
        assert_eq!(descriptor.family, ChartFamily::Bar);
        let families: Vec<ChartFamily> = descriptor.series.iter().map(|s| s.family).collect();
        assert_eq!(
            families,
            vec![ChartFamily::Bar, ChartFamily::Line, ChartFamily::Line]
        );
    }

    #[test]
    fn test_bubble_sizes_only_for_bubble() {
        let ser = r#"<c:ser>
  <c:xVal><c:numRef><c:f>S!$A$2:$A$4</c:f></c:numRef></c:xVal>
  <c:yVal><c:numRef><c:f>S!$B$2:$B$4</c:f></c:numRef></c:yVal>
  <c:bubbleSize><c:numRef><c:f>S!$C$2:$C$4</c:f></c:numRef></c:bubbleSize>
</c:ser>"#;
        let bubble = try_decode(chart_xml(&format!("<c:bubbleChart>{ser}</c:bubbleChart>"), "").as_bytes())
            .unwrap();
        assert_eq!(bubble.category_axis, AxisKind::Value);
        assert_eq!(
            bubble.series[0].sizes,
            Some(DataSource::Reference("S!$C$2:$C$4".into()))
        );
        assert_eq!(
            bubble.series[0].categories,
            DataSource::Reference("S!$A$2:$A$4".into())
        );

        let scatter = try_decode(chart_xml(&format!("<c:scatterChart>{ser}</c:scatterChart>"), "").as_bytes())
            .unwrap();
        assert_eq!(scatter.series[0].sizes, None);
    }

    #[test]
    fn test_date_axis_detection() {
        let xml = chart_xml("<c:lineChart/><c:dateAx/><c:valAx/>", "");
        assert_eq!(try_decode(xml.as_bytes()).unwrap().category_axis, AxisKind::Date);

        let ser = r#"<c:ser><c:cat><c:numRef><c:f>S!$A$2:$A$3</c:f><c:numCache>
  <c:formatCode>m/d/yyyy</c:formatCode><c:ptCount val="1"/><c:pt idx="0"><c:v>45000</c:v></c:pt>
</c:numCache></c:numRef></c:cat></c:ser>"#;
        let xml = chart_xml(&format!("<c:lineChart>{ser}</c:lineChart><c:catAx/>"), "");
        assert_eq!(try_decode(xml.as_bytes()).unwrap().category_axis, AxisKind::Date);

        let xml = chart_xml(&format!("<c:barChart>{BAR_SERIES}</c:barChart><c:catAx/>"), "");
        assert_eq!(
            try_decode(xml.as_bytes()).unwrap().category_axis,
            AxisKind::Category
        );
    }

    #[test]
    fn test_unrecognized_family() {
        let xml = chart_xml("<c:spPr/>", "");
        assert!(matches!(
            try_decode(xml.as_bytes()),
            Err(XlchartError::UnrecognizedChartFamily(_))
        ));
        assert!(decode(xml.as_bytes()).is_none());
    }

    #[test]
    fn test_malformed_xml() {
        assert!(matches!(
            try_decode(b"<c:chartSpace><c:chart>"),
            Err(XlchartError::Dom(_))
        ));
    }

    const CHARTEX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<cx:chartSpace xmlns:cx="http://schemas.microsoft.com/office/drawing/2014/chartex">
  <cx:chartData>
    <cx:data id="0">
      <cx:strDim type="cat"><cx:f>Sheet1!$A$2:$A$4</cx:f></cx:strDim>
      <cx:numDim type="val"><cx:f>Sheet1!$B$2:$B$4</cx:f></cx:numDim>
    </cx:data>
    <cx:data id="1">
      <cx:numDim type="val"><cx:lvl ptCount="3" formatCode="General"><cx:pt idx="0">5</cx:pt><cx:pt idx="2">7</cx:pt></cx:lvl></cx:numDim>
    </cx:data>
  </cx:chartData>
  <cx:chart>
    <cx:title><cx:tx><cx:txData><cx:v>Bridge</cx:v></cx:txData></cx:tx></cx:title>
    <cx:plotArea><cx:plotAreaRegion>
      <cx:series layoutId="LAYOUT" uniqueId="{1}">
        <cx:tx><cx:txData><cx:f>Sheet1!$B$1</cx:f><cx:v>Amount</cx:v></cx:txData></cx:tx>
        <cx:dataId val="0"/>
      </cx:series>
      <cx:series layoutId="LAYOUT"><cx:dataId val="1"/></cx:series>
    </cx:plotAreaRegion></cx:plotArea>
  </cx:chart>
</cx:chartSpace>"#;

    #[test_case("waterfall", ChartFamily::Waterfall)]
    #[test_case("funnel", ChartFamily::Funnel)]
    #[test_case("clusteredColumn", ChartFamily::Histogram)]
    #[test_case("boxWhisker", ChartFamily::BoxWhisker)]
    #[test_case("sunburst", ChartFamily::Sunburst)]
    #[test_case("treemap", ChartFamily::Treemap)]
    #[test_case("regionMap", ChartFamily::Other)]
    fn test_chartex_layouts(layout: &str, expected: ChartFamily) {
        let xml = CHARTEX.replace("LAYOUT", layout);
        let descriptor = try_decode(xml.as_bytes()).unwrap();
        assert_eq!(descriptor.family, expected);
        assert_eq!(descriptor.title, TextSource::Literal("Bridge".into()));
        assert_eq!(descriptor.series.len(), 2);
    }

    #[test]
    fn test_chartex_data_resolution() {
        let xml = CHARTEX.replace("LAYOUT", "waterfall");
        let descriptor = try_decode(xml.as_bytes()).unwrap();
        let first = &descriptor.series[0];
        assert_eq!(first.name, TextSource::Reference("Sheet1!$B$1".into()));
        assert_eq!(
            first.categories,
            DataSource::Reference("Sheet1!$A$2:$A$4".into())
        );
        assert_eq!(first.values, DataSource::Reference("Sheet1!$B$2:$B$4".into()));

        let second = &descriptor.series[1];
        assert_eq!(second.categories, DataSource::Absent);
        assert_eq!(
            second.values,
            DataSource::Literal(vec![Some(Scalar::Number(5.0)), None, Some(Scalar::Number(7.0))])
        );
    }

    #[test]
    fn test_pareto_line_is_histogram() {
        let xml = CHARTEX
            .replacen("LAYOUT", "clusteredColumn", 1)
            .replacen("LAYOUT", "paretoLine", 1);
        let descriptor = try_decode(xml.as_bytes()).unwrap();
        assert_eq!(descriptor.family, ChartFamily::Histogram);
        assert!(descriptor
            .series
            .iter()
            .all(|s| s.family == ChartFamily::Histogram));
    }
}
