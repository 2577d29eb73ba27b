use serde::Serialize;

/// Family of a chart, normalized across the 2006 chart and 2014 chartex
/// schemas.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub enum ChartFamily {
    /// Bar or column chart (also pareto)
    #[default]
    Bar,
    Line,
    Area,
    /// XY plot
    Scatter,
    Bubble,
    Pie,
    Doughnut,
    Radar,
    Histogram,
    /// Open-high-low-close
    Stock,
    Waterfall,
    Funnel,
    BoxWhisker,
    Sunburst,
    Treemap,
    Surface,
    /// Several chart-type elements in one plot area
    Combo,
    /// Recognized but not otherwise modelled (e.g. region maps)
    Other,
}

impl ChartFamily {
    /// Every family, in declaration order.
    pub const ALL: [ChartFamily; 18] = [
        Self::Bar,
        Self::Line,
        Self::Area,
        Self::Scatter,
        Self::Bubble,
        Self::Pie,
        Self::Doughnut,
        Self::Radar,
        Self::Histogram,
        Self::Stock,
        Self::Waterfall,
        Self::Funnel,
        Self::BoxWhisker,
        Self::Sunburst,
        Self::Treemap,
        Self::Surface,
        Self::Combo,
        Self::Other,
    ];

    /// Map a plot-area child element (local name) to a family.
    pub fn from_element(local_name: &str) -> Option<Self> {
        let family = match local_name {
            "barChart" | "bar3DChart" | "paretoChart" => Self::Bar,
            "lineChart" | "line3DChart" => Self::Line,
            "areaChart" | "area3DChart" => Self::Area,
            "scatterChart" => Self::Scatter,
            "bubbleChart" => Self::Bubble,
            "pieChart" | "pie3DChart" | "ofPieChart" => Self::Pie,
            "doughnutChart" => Self::Doughnut,
            "radarChart" => Self::Radar,
            "histogramChart" => Self::Histogram,
            "stockChart" => Self::Stock,
            "waterfallChart" => Self::Waterfall,
            "funnelChart" => Self::Funnel,
            "boxWhiskerChart" => Self::BoxWhisker,
            "sunburstChart" => Self::Sunburst,
            "treemapChart" => Self::Treemap,
            "surfaceChart"
            | "surface3DChart"
            | "wireframeSurfaceChart"
            | "wireframeSurface3DChart" => Self::Surface,
            "comboChart" => Self::Combo,
            _ => return None,
        };
        Some(family)
    }

    /// Map a chartex `series/@layoutId` to a family.
    pub fn from_layout_id(layout_id: &str) -> Option<Self> {
        let family = match layout_id {
            "clusteredColumn" | "paretoLine" => Self::Histogram,
            "waterfall" => Self::Waterfall,
            "funnel" => Self::Funnel,
            "boxWhisker" => Self::BoxWhisker,
            "sunburst" => Self::Sunburst,
            "treemap" => Self::Treemap,
            "regionMap" => Self::Other,
            _ => return None,
        };
        Some(family)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::Line => "line",
            Self::Area => "area",
            Self::Scatter => "scatter",
            Self::Bubble => "bubble",
            Self::Pie => "pie",
            Self::Doughnut => "doughnut",
            Self::Radar => "radar",
            Self::Histogram => "histogram",
            Self::Stock => "stock",
            Self::Waterfall => "waterfall",
            Self::Funnel => "funnel",
            Self::BoxWhisker => "boxWhisker",
            Self::Sunburst => "sunburst",
            Self::Treemap => "treemap",
            Self::Surface => "surface",
            Self::Combo => "combo",
            Self::Other => "other",
        }
    }

    /// Upper-case label shown when a chart has no title.
    pub fn fallback_title(self) -> String {
        self.as_str().to_uppercase()
    }

    /// Whether series of this family plot against a numeric x axis.
    pub fn is_xy(self) -> bool {
        matches!(self, Self::Scatter | Self::Bubble)
    }
}

/// How the category axis should be read.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum AxisKind {
    #[default]
    Category,
    /// Numeric categories are date serials
    Date,
    /// Numeric x axis (scatter, bubble)
    Value,
}

/// A single cached or resolved cell value.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Text(String),
    Bool(bool),
}

impl Scalar {
    /// Numeric reading: numbers as-is, bools as 1/0, numeric text parsed.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            Self::Number(_) => None,
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        }
    }

    /// Display text for labels.
    pub fn to_label(&self) -> String {
        match self {
            Self::Number(n) => format_number(*n),
            Self::Text(s) => s.clone(),
            Self::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        }
    }
}

/// Integers without a trailing `.0`, everything else via `Display`.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

/// Where a series' data comes from.
///
/// A reference always wins over a cache stored next to it; the cache only
/// survives when no formula is present.
#[derive(Debug, Serialize, Clone, PartialEq, Default)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum DataSource {
    /// Range formula, e.g. `Sheet1!$B$2:$B$5`
    Reference(String),
    /// Dense cached or literal points; gaps are `None`
    Literal(Vec<Option<Scalar>>),
    #[default]
    Absent,
}

impl DataSource {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

/// Where a title or series name comes from.
#[derive(Debug, Serialize, Clone, PartialEq, Eq, Default)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum TextSource {
    Reference(String),
    Literal(String),
    #[default]
    Absent,
}

/// One series as declared in a chart part.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SeriesDescriptor {
    pub name: TextSource,
    pub categories: DataSource,
    pub values: DataSource,
    /// Bubble sizes; only present on bubble series
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizes: Option<DataSource>,
    /// The series' own family (differs from the chart's only in combos)
    pub family: ChartFamily,
}

/// Cell anchor of a chart frame within its sheet (0-indexed).
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChartAnchor {
    pub from_col: u32,
    pub from_row: u32,
    /// None for oneCellAnchor / absoluteAnchor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_col: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_row: Option<u32>,
}

/// A decoded chart part, independent of any renderer.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChartDescriptor {
    pub family: ChartFamily,
    pub title: TextSource,
    /// Document order
    pub series: Vec<SeriesDescriptor>,
    pub category_axis: AxisKind,
    /// Package path of the chart part (empty when decoded standalone)
    pub part_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<ChartAnchor>,
    /// Frame name from the drawing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A series with every source resolved to concrete values.
#[derive(Debug, Serialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSeries {
    pub name: String,
    pub categories: Vec<Option<Scalar>>,
    /// Absent values stay `None`, distinct from zero
    pub values: Vec<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sizes: Option<Vec<Option<f64>>>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_every_family_has_a_distinct_name() {
        let mut names: Vec<&str> = ChartFamily::ALL.iter().map(|f| f.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ChartFamily::ALL.len());
    }

    #[test]
    fn test_scalar_as_number() {
        assert_eq!(Scalar::Number(2.5).as_number(), Some(2.5));
        assert_eq!(Scalar::Bool(true).as_number(), Some(1.0));
        assert_eq!(Scalar::Text(" 42 ".into()).as_number(), Some(42.0));
        assert_eq!(Scalar::Text("n/a".into()).as_number(), None);
        assert_eq!(Scalar::Number(f64::NAN).as_number(), None);
    }

    #[test]
    fn test_scalar_labels() {
        assert_eq!(Scalar::Number(3.0).to_label(), "3");
        assert_eq!(Scalar::Number(3.25).to_label(), "3.25");
        assert_eq!(Scalar::Bool(false).to_label(), "FALSE");
    }

    #[test]
    fn test_data_source_serializes_tagged() {
        let json = serde_json::to_string(&DataSource::Reference("Sheet1!$A$1".into())).unwrap();
        assert_eq!(json, r#"{"kind":"reference","value":"Sheet1!$A$1"}"#);
        let json = serde_json::to_string(&DataSource::Literal(vec![
            Some(Scalar::Number(1.0)),
            None,
        ]))
        .unwrap();
        assert_eq!(json, r#"{"kind":"literal","value":[1.0,null]}"#);
    }
}
