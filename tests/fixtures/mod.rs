//! Test fixtures for generating XLSX packages with charts in memory.
//!
//! Builds the full relationship chain the extractor walks:
//!
//! ```text
//! _rels/.rels -> xl/workbook.xml -> xl/worksheets/sheetN.xml
//!   -> xl/drawings/drawingM.xml -> xl/charts/chartK.xml | chartExK.xml
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use fixtures::{bar_chart, ser_ref, SheetBuilder, XlsxBuilder};
//!
//! let xlsx = XlsxBuilder::new()
//!     .sheet(
//!         SheetBuilder::new("Data")
//!             .cell("A2", "Q1")
//!             .cell("B2", 10.0)
//!             .chart(bar_chart(Some("Sales"), &[ser_ref("Data!$B$1", "Data!$A$2", "Data!$B$2")])),
//!     )
//!     .build();
//! ```
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use std::fmt::Write as _;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_XDR: &str = "http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing";
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_C: &str = "http://schemas.openxmlformats.org/drawingml/2006/chart";
const NS_CX: &str = "http://schemas.microsoft.com/office/drawing/2014/chartex";
const NS_MC: &str = "http://schemas.openxmlformats.org/markup-compatibility/2006";

const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
const REL_CHARTSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chartsheet";
const REL_SHARED_STRINGS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";
const REL_DRAWING: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing";
const REL_CHART: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart";
const REL_CHARTEX: &str = "http://schemas.microsoft.com/office/2014/relationships/chartEx";

// ============================================================================
// Cell Value
// ============================================================================

/// A cached cell value written into a worksheet.
#[derive(Debug, Clone)]
pub enum CellValue {
    Number(f64),
    /// Written to the shared string table
    String(String),
    /// Written as `t="inlineStr"`
    InlineString(String),
    Boolean(bool),
    /// A formula with its cached numeric result
    Formula { formula: String, cached: f64 },
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(f64::from(n))
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

// ============================================================================
// Chart Parts
// ============================================================================

/// Schema of a chart part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartSchema {
    /// 2006 chart, `xl/charts/chartN.xml`
    Classic,
    /// 2014 chartex, `xl/charts/chartExN.xml`
    Chartex,
}

/// A chart part plus the frame that anchors it.
#[derive(Debug, Clone)]
pub struct ChartEntry {
    pub schema: ChartSchema,
    pub xml: String,
    pub from: (u32, u32),
    pub to: (u32, u32),
    pub frame_name: String,
    /// Write the drawing relationship but not the chart part itself
    pub dangling: bool,
}

impl ChartEntry {
    /// Anchor the frame at `(col, row)`, 0-indexed.
    #[must_use]
    pub fn at(mut self, col: u32, row: u32) -> Self {
        self.from = (col, row);
        self.to = (col + 8, row + 15);
        self
    }

    #[must_use]
    pub fn named(mut self, name: &str) -> Self {
        self.frame_name = name.to_string();
        self
    }

    /// Keep the relationship but omit the chart part from the package.
    #[must_use]
    pub fn dangling(mut self) -> Self {
        self.dangling = true;
        self
    }
}

fn entry(schema: ChartSchema, xml: String) -> ChartEntry {
    ChartEntry {
        schema,
        xml,
        from: (0, 0),
        to: (8, 15),
        frame_name: "Chart".to_string(),
        dangling: false,
    }
}

/// Classic chart with one chart-type group.
#[must_use]
pub fn classic_chart(element: &str, title: Option<&str>, series: &[String]) -> ChartEntry {
    classic_chart_groups(&[(element, series)], title)
}

/// Classic chart with several chart-type groups (a combo).
#[must_use]
pub fn classic_chart_groups(groups: &[(&str, &[String])], title: Option<&str>) -> ChartEntry {
    let mut plot_area = String::new();
    for (element, series) in groups {
        write!(plot_area, "<c:{element}>").unwrap();
        for (i, ser) in series.iter().enumerate() {
            write!(plot_area, r#"<c:ser><c:idx val="{i}"/><c:order val="{i}"/>{ser}</c:ser>"#)
                .unwrap();
        }
        write!(plot_area, "</c:{element}>").unwrap();
    }
    plot_area.push_str("<c:catAx/><c:valAx/>");
    entry(ChartSchema::Classic, classic_chart_xml(&plot_area, title))
}

/// A classic chart part from raw XML.
#[must_use]
pub fn raw_chart(xml: String) -> ChartEntry {
    entry(ChartSchema::Classic, xml)
}

#[must_use]
pub fn bar_chart(title: Option<&str>, series: &[String]) -> ChartEntry {
    classic_chart("barChart", title, series)
}

/// Raw classic chart part around a plot area body.
#[must_use]
pub fn classic_chart_xml(plot_area: &str, title: Option<&str>) -> String {
    let title = match title {
        Some(t) => format!(
            r#"<c:title><c:tx><c:rich><a:bodyPr/><a:p><a:r><a:t>{}</a:t></a:r></a:p></c:rich></c:tx></c:title><c:autoTitleDeleted val="0"/>"#,
            escape(t)
        ),
        None => r#"<c:autoTitleDeleted val="1"/>"#.to_string(),
    };
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<c:chartSpace xmlns:c="{NS_C}" xmlns:a="{NS_A}" xmlns:r="{NS_REL}"><c:chart>{title}<c:plotArea><c:layout/>{plot_area}</c:plotArea><c:plotVisOnly val="1"/></c:chart></c:chartSpace>"#
    )
}

/// Series whose name, categories and values are all range references.
#[must_use]
pub fn ser_ref(name_ref: &str, cat_ref: &str, val_ref: &str) -> String {
    format!(
        "<c:tx><c:strRef><c:f>{}</c:f></c:strRef></c:tx>\
         <c:cat><c:strRef><c:f>{}</c:f></c:strRef></c:cat>\
         <c:val><c:numRef><c:f>{}</c:f></c:numRef></c:val>",
        escape(name_ref),
        escape(cat_ref),
        escape(val_ref)
    )
}

/// Series with a literal name and a values reference only.
#[must_use]
pub fn ser_values(name: &str, val_ref: &str) -> String {
    format!(
        "<c:tx><c:v>{}</c:v></c:tx><c:val><c:numRef><c:f>{}</c:f></c:numRef></c:val>",
        escape(name),
        escape(val_ref)
    )
}

/// Series made only of literals, no references.
#[must_use]
pub fn ser_literal(name: &str, categories: &[&str], values: &[f64]) -> String {
    let mut cat = format!(r#"<c:strLit><c:ptCount val="{}"/>"#, categories.len());
    for (i, c) in categories.iter().enumerate() {
        write!(cat, r#"<c:pt idx="{i}"><c:v>{}</c:v></c:pt>"#, escape(c)).unwrap();
    }
    cat.push_str("</c:strLit>");

    let mut val = format!(r#"<c:numLit><c:formatCode>General</c:formatCode><c:ptCount val="{}"/>"#, values.len());
    for (i, v) in values.iter().enumerate() {
        write!(val, r#"<c:pt idx="{i}"><c:v>{v}</c:v></c:pt>"#).unwrap();
    }
    val.push_str("</c:numLit>");

    format!(
        "<c:tx><c:v>{}</c:v></c:tx><c:cat>{cat}</c:cat><c:val>{val}</c:val>",
        escape(name)
    )
}

/// XY series: x and y references.
#[must_use]
pub fn ser_xy(name: &str, x_ref: &str, y_ref: &str) -> String {
    format!(
        "<c:tx><c:v>{}</c:v></c:tx>\
         <c:xVal><c:numRef><c:f>{}</c:f></c:numRef></c:xVal>\
         <c:yVal><c:numRef><c:f>{}</c:f></c:numRef></c:yVal>",
        escape(name),
        escape(x_ref),
        escape(y_ref)
    )
}

/// Chartex chart with one data block and one series.
#[must_use]
pub fn chartex_chart(layout_id: &str, title: Option<&str>, cat_ref: &str, val_ref: &str) -> ChartEntry {
    let data = format!(
        r#"<cx:strDim type="cat"><cx:f>{}</cx:f></cx:strDim><cx:numDim type="val"><cx:f>{}</cx:f></cx:numDim>"#,
        escape(cat_ref),
        escape(val_ref)
    );
    entry(ChartSchema::Chartex, chartex_xml(layout_id, title, &data))
}

/// Chartex chart whose only data is a literal value dimension.
#[must_use]
pub fn chartex_literal(layout_id: &str, title: Option<&str>, values: &[f64]) -> ChartEntry {
    let mut data = format!(
        r#"<cx:numDim type="val"><cx:lvl ptCount="{}" formatCode="General">"#,
        values.len()
    );
    for (i, v) in values.iter().enumerate() {
        write!(data, r#"<cx:pt idx="{i}">{v}</cx:pt>"#).unwrap();
    }
    data.push_str("</cx:lvl></cx:numDim>");
    entry(ChartSchema::Chartex, chartex_xml(layout_id, title, &data))
}

fn chartex_xml(layout_id: &str, title: Option<&str>, data: &str) -> String {
    let title = title
        .map(|t| {
            format!(
                r#"<cx:title><cx:tx><cx:txData><cx:v>{}</cx:v></cx:txData></cx:tx></cx:title>"#,
                escape(t)
            )
        })
        .unwrap_or_default();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cx:chartSpace xmlns:cx="{NS_CX}" xmlns:a="{NS_A}" xmlns:r="{NS_REL}"><cx:chartData><cx:data id="0">{data}</cx:data></cx:chartData><cx:chart>{title}<cx:plotArea><cx:plotAreaRegion><cx:series layoutId="{layout_id}" uniqueId="{{00000000-0000-0000-0000-000000000001}}"><cx:dataId val="0"/></cx:series></cx:plotAreaRegion></cx:plotArea></cx:chart></cx:chartSpace>"#
    )
}

// ============================================================================
// Sheet Builder
// ============================================================================

/// Builder for one worksheet or chart sheet.
#[derive(Debug, Clone)]
pub struct SheetBuilder {
    pub name: String,
    pub chart_sheet: bool,
    pub hidden: bool,
    pub cells: Vec<(String, CellValue)>,
    pub charts: Vec<ChartEntry>,
}

impl SheetBuilder {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            chart_sheet: false,
            hidden: false,
            cells: Vec::new(),
            charts: Vec::new(),
        }
    }

    /// A chart sheet holding a single chart on an absolute anchor.
    #[must_use]
    pub fn chart_sheet(name: &str, chart: ChartEntry) -> Self {
        Self {
            chart_sheet: true,
            charts: vec![chart],
            ..Self::new(name)
        }
    }

    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    #[must_use]
    pub fn cell(mut self, cell_ref: &str, value: impl Into<CellValue>) -> Self {
        self.cells.push((cell_ref.to_string(), value.into()));
        self
    }

    /// Write `values` down a column starting at `first_cell`.
    #[must_use]
    pub fn column<V: Into<CellValue> + Clone>(mut self, first_cell: &str, values: &[V]) -> Self {
        let split = first_cell
            .find(|c: char| c.is_ascii_digit())
            .expect("cell reference needs a row");
        let (col, row) = first_cell.split_at(split);
        let row: u32 = row.parse().expect("row number");
        for (i, v) in values.iter().enumerate() {
            let r = row + u32::try_from(i).unwrap();
            self.cells.push((format!("{col}{r}"), v.clone().into()));
        }
        self
    }

    #[must_use]
    pub fn chart(mut self, chart: ChartEntry) -> Self {
        self.charts.push(chart);
        self
    }
}

// ============================================================================
// Package Builder
// ============================================================================

/// Builder for a whole package.
#[derive(Debug, Clone, Default)]
pub struct XlsxBuilder {
    pub sheets: Vec<SheetBuilder>,
    pub date1904: bool,
    pub stored: bool,
    /// Absolute `/xl/...` drawing targets instead of relative ones
    pub absolute_targets: bool,
}

impl XlsxBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sheet(mut self, sheet: SheetBuilder) -> Self {
        self.sheets.push(sheet);
        self
    }

    #[must_use]
    pub fn date1904(mut self) -> Self {
        self.date1904 = true;
        self
    }

    /// Write every entry with the "stored" method.
    #[must_use]
    pub fn stored(mut self) -> Self {
        self.stored = true;
        self
    }

    /// Use `/xl/...` relationship targets instead of relative ones.
    #[must_use]
    pub fn absolute_targets(mut self) -> Self {
        self.absolute_targets = true;
        self
    }

    /// Build the package bytes.
    pub fn build(self) -> Vec<u8> {
        let method = if self.stored {
            zip::CompressionMethod::Stored
        } else {
            zip::CompressionMethod::Deflated
        };
        let options = FileOptions::default().compression_method(method);
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let put = |zip: &mut ZipWriter<Cursor<Vec<u8>>>, path: &str, body: &str| {
            zip.start_file(path, options).expect("start entry");
            zip.write_all(body.as_bytes()).expect("write entry");
        };

        let mut shared_strings: Vec<String> = Vec::new();
        for sheet in &self.sheets {
            for (_, value) in &sheet.cells {
                if let CellValue::String(s) = value {
                    if !shared_strings.contains(s) {
                        shared_strings.push(s.clone());
                    }
                }
            }
        }

        put(&mut zip, "[Content_Types].xml", CONTENT_TYPES);
        put(&mut zip, "_rels/.rels", &package_rels());

        let mut workbook_rels = Vec::new();
        let mut sheet_entries = String::new();
        let mut worksheet_n = 0;
        let mut chartsheet_n = 0;
        let mut drawing_n = 0;
        let mut chart_n = 0;

        for (i, sheet) in self.sheets.iter().enumerate() {
            let rel_id = format!("rId{}", i + 1);
            let state = if sheet.hidden { r#" state="hidden""# } else { "" };
            write!(
                sheet_entries,
                r#"<sheet name="{}" sheetId="{}"{state} r:id="{rel_id}"/>"#,
                escape(&sheet.name),
                i + 1
            )
            .unwrap();

            let (part, rel_type) = if sheet.chart_sheet {
                chartsheet_n += 1;
                (format!("chartsheets/sheet{chartsheet_n}.xml"), REL_CHARTSHEET)
            } else {
                worksheet_n += 1;
                (format!("worksheets/sheet{worksheet_n}.xml"), REL_WORKSHEET)
            };
            workbook_rels.push((rel_id, rel_type, part.clone()));

            let mut sheet_rels = Vec::new();
            if !sheet.charts.is_empty() {
                drawing_n += 1;
                let drawing = format!("xl/drawings/drawing{drawing_n}.xml");
                let target = if self.absolute_targets {
                    format!("/{drawing}")
                } else {
                    format!("../drawings/drawing{drawing_n}.xml")
                };
                sheet_rels.push(("rId1".to_string(), REL_DRAWING, target));

                let mut drawing_rels = Vec::new();
                let mut anchors = String::new();
                for (k, chart) in sheet.charts.iter().enumerate() {
                    chart_n += 1;
                    let chart_rel = format!("rId{}", k + 1);
                    let (file, chart_rel_type) = match chart.schema {
                        ChartSchema::Classic => (format!("chart{chart_n}.xml"), REL_CHART),
                        ChartSchema::Chartex => (format!("chartEx{chart_n}.xml"), REL_CHARTEX),
                    };
                    if !chart.dangling {
                        put(&mut zip, &format!("xl/charts/{file}"), &chart.xml);
                    }
                    drawing_rels.push((chart_rel.clone(), chart_rel_type, format!("../charts/{file}")));
                    anchors.push_str(&anchor_xml(chart, &chart_rel, k + 2, sheet.chart_sheet));
                }
                put(&mut zip, &drawing, &drawing_xml(&anchors));
                put(
                    &mut zip,
                    &format!("xl/drawings/_rels/drawing{drawing_n}.xml.rels"),
                    &rels_xml(&drawing_rels),
                );
            }

            let body = if sheet.chart_sheet {
                chartsheet_xml(!sheet.charts.is_empty())
            } else {
                worksheet_xml(sheet, &shared_strings, !sheet.charts.is_empty())
            };
            put(&mut zip, &format!("xl/{part}"), &body);
            if !sheet_rels.is_empty() {
                let (dir, file) = part.split_once('/').unwrap();
                put(&mut zip, &format!("xl/{dir}/_rels/{file}.rels"), &rels_xml(&sheet_rels));
            }
        }

        if !shared_strings.is_empty() {
            let id = format!("rId{}", self.sheets.len() + 1);
            workbook_rels.push((id, REL_SHARED_STRINGS, "sharedStrings.xml".to_string()));
            put(&mut zip, "xl/sharedStrings.xml", &shared_strings_xml(&shared_strings));
        }

        let date1904 = if self.date1904 { r#" date1904="1""# } else { "" };
        put(
            &mut zip,
            "xl/workbook.xml",
            &format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="{NS_MAIN}" xmlns:r="{NS_REL}"><workbookPr{date1904}/><sheets>{sheet_entries}</sheets></workbook>"#
            ),
        );
        put(&mut zip, "xl/_rels/workbook.xml.rels", &rels_xml(&workbook_rels));

        zip.finish().expect("finish package").into_inner()
    }
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/></Types>"#;

fn package_rels() -> String {
    rels_xml(&[("rId1".to_string(), REL_OFFICE_DOCUMENT, "xl/workbook.xml".to_string())])
}

fn rels_xml(rels: &[(String, &str, String)]) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="{NS_PKG_REL}">"#
    );
    for (id, rel_type, target) in rels {
        write!(xml, r#"<Relationship Id="{id}" Type="{rel_type}" Target="{target}"/>"#).unwrap();
    }
    xml.push_str("</Relationships>");
    xml
}

fn anchor_xml(chart: &ChartEntry, rel_id: &str, frame_id: usize, absolute: bool) -> String {
    let graphic_data = match chart.schema {
        ChartSchema::Classic => format!(
            r#"<a:graphicData uri="{NS_C}"><c:chart xmlns:c="{NS_C}" r:id="{rel_id}"/></a:graphicData>"#
        ),
        ChartSchema::Chartex => format!(
            r#"<a:graphicData uri="http://schemas.microsoft.com/office/drawing/2014/chartex"><cx:chart xmlns:cx="{NS_CX}" r:id="{rel_id}"/></a:graphicData>"#
        ),
    };
    let frame = format!(
        r#"<xdr:graphicFrame macro=""><xdr:nvGraphicFramePr><xdr:cNvPr id="{frame_id}" name="{}"/><xdr:cNvGraphicFramePr/></xdr:nvGraphicFramePr><xdr:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/></xdr:xfrm><a:graphic>{graphic_data}</a:graphic></xdr:graphicFrame>"#,
        escape(&chart.frame_name)
    );
    let frame = match chart.schema {
        ChartSchema::Classic => frame,
        ChartSchema::Chartex => format!(
            r#"<mc:AlternateContent xmlns:mc="{NS_MC}"><mc:Choice xmlns:cx1="http://schemas.microsoft.com/office/drawing/2015/9/8/chartex" Requires="cx1">{frame}</mc:Choice><mc:Fallback><xdr:sp macro="" textlink=""><xdr:nvSpPr><xdr:cNvPr id="{frame_id}" name="{}"/><xdr:cNvSpPr/></xdr:nvSpPr></xdr:sp></mc:Fallback></mc:AlternateContent>"#,
            escape(&chart.frame_name)
        ),
    };

    if absolute {
        return format!(
            r#"<xdr:absoluteAnchor><xdr:pos x="0" y="0"/><xdr:ext cx="8666049" cy="6293304"/>{frame}<xdr:clientData/></xdr:absoluteAnchor>"#
        );
    }
    let ((from_col, from_row), (to_col, to_row)) = (chart.from, chart.to);
    format!(
        r#"<xdr:twoCellAnchor editAs="oneCell"><xdr:from><xdr:col>{from_col}</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>{from_row}</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from><xdr:to><xdr:col>{to_col}</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>{to_row}</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:to>{frame}<xdr:clientData/></xdr:twoCellAnchor>"#
    )
}

fn drawing_xml(anchors: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<xdr:wsDr xmlns:xdr="{NS_XDR}" xmlns:a="{NS_A}" xmlns:r="{NS_REL}">{anchors}</xdr:wsDr>"#
    )
}

fn chartsheet_xml(has_drawing: bool) -> String {
    let drawing = if has_drawing { r#"<drawing r:id="rId1"/>"# } else { "" };
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<chartsheet xmlns="{NS_MAIN}" xmlns:r="{NS_REL}"><sheetViews><sheetView workbookViewId="0"/></sheetViews>{drawing}</chartsheet>"#
    )
}

fn worksheet_xml(sheet: &SheetBuilder, shared_strings: &[String], has_drawing: bool) -> String {
    // Group cells by row, keeping insertion order within a row.
    let mut rows: Vec<(u32, Vec<String>)> = Vec::new();
    for (cell_ref, value) in &sheet.cells {
        let split = cell_ref.find(|c: char| c.is_ascii_digit()).unwrap();
        let row: u32 = cell_ref[split..].parse().unwrap();
        let xml = cell_xml(cell_ref, value, shared_strings);
        match rows.iter_mut().find(|(r, _)| *r == row) {
            Some((_, cells)) => cells.push(xml),
            None => rows.push((row, vec![xml])),
        }
    }
    rows.sort_by_key(|(r, _)| *r);

    let mut data = String::new();
    for (row, cells) in rows {
        write!(data, r#"<row r="{row}">{}</row>"#, cells.concat()).unwrap();
    }
    let drawing = if has_drawing { r#"<drawing r:id="rId1"/>"# } else { "" };
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="{NS_MAIN}" xmlns:r="{NS_REL}"><sheetData>{data}</sheetData>{drawing}</worksheet>"#
    )
}

fn cell_xml(cell_ref: &str, value: &CellValue, shared_strings: &[String]) -> String {
    match value {
        CellValue::Number(n) => format!(r#"<c r="{cell_ref}"><v>{n}</v></c>"#),
        CellValue::String(s) => {
            let idx = shared_strings.iter().position(|x| x == s).unwrap();
            format!(r#"<c r="{cell_ref}" t="s"><v>{idx}</v></c>"#)
        }
        CellValue::InlineString(s) => format!(
            r#"<c r="{cell_ref}" t="inlineStr"><is><t>{}</t></is></c>"#,
            escape(s)
        ),
        CellValue::Boolean(b) => {
            format!(r#"<c r="{cell_ref}" t="b"><v>{}</v></c>"#, u8::from(*b))
        }
        CellValue::Formula { formula, cached } => format!(
            r#"<c r="{cell_ref}"><f>{}</f><v>{cached}</v></c>"#,
            escape(formula)
        ),
    }
}

fn shared_strings_xml(strings: &[String]) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="{NS_MAIN}" count="{0}" uniqueCount="{0}">"#,
        strings.len()
    );
    for s in strings {
        write!(xml, "<si><t>{}</t></si>", escape(s)).unwrap();
    }
    xml.push_str("</sst>");
    xml
}

/// Escape XML special characters.
#[must_use]
pub fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
