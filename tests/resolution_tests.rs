//! Reference resolution against cached and overridden cell values.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod fixtures;

use fixtures::{bar_chart, classic_chart, ser_literal, ser_ref, ser_values, SheetBuilder, XlsxBuilder};
use test_case::test_case;
use xlchart::model::OverrideValue;
use xlchart::resolve::{resolve_all, try_resolve_reference, MAX_REFERENCE_CELLS};
use xlchart::{
    extract_charts, resolve, resolve_numbers, resolve_series, resolve_text, CellOverride,
    CellValue, ChartDescriptor, DataSource, Package, RecalcModel, Scalar, TextSource,
    WorkbookModel, XlchartError,
};

struct Loaded {
    package: Package,
    charts: Vec<ChartDescriptor>,
}

impl Loaded {
    fn model(&self) -> WorkbookModel {
        let extraction = extract_charts(&self.package);
        WorkbookModel::from_package(&self.package, &extraction.manifest)
    }
}

fn load(bytes: Vec<u8>, sheet: &str) -> Loaded {
    let package = Package::open(bytes).unwrap();
    let charts = extract_charts(&package).charts_for(sheet).to_vec();
    Loaded { package, charts }
}

fn sales_package() -> Vec<u8> {
    XlsxBuilder::new()
        .sheet(
            SheetBuilder::new("Sales Data")
                .cell("A1", "Quarter")
                .cell("B1", "Revenue")
                .column("A2", &["Q1", "Q2", "Q3", "Q4"])
                .column("B2", &[100.0, 250.5, 175.0])
                .cell(
                    "B5",
                    fixtures::CellValue::Formula {
                        formula: "SUM(B2:B4)".into(),
                        cached: 525.5,
                    },
                )
                .chart(bar_chart(
                    None,
                    &[ser_ref(
                        "'Sales Data'!$B$1",
                        "'Sales Data'!$A$2:$A$5",
                        "'Sales Data'!$B$2:$B$5",
                    )],
                )),
        )
        .build()
}

#[test]
fn test_references_resolve_against_cached_values() {
    let loaded = load(sales_package(), "Sales Data");
    let model = loaded.model();
    let series = &loaded.charts[0].series[0];

    let resolved = resolve_series(series, 0, &model);
    assert_eq!(resolved.name, "Revenue");
    assert_eq!(
        resolved.categories,
        vec![
            Some(Scalar::Text("Q1".into())),
            Some(Scalar::Text("Q2".into())),
            Some(Scalar::Text("Q3".into())),
            Some(Scalar::Text("Q4".into())),
        ]
    );
    assert_eq!(
        resolved.values,
        vec![Some(100.0), Some(250.5), Some(175.0), Some(525.5)]
    );
}

#[test]
fn test_literal_only_series_needs_no_model() {
    let loaded = load(
        XlsxBuilder::new()
            .sheet(SheetBuilder::new("S").chart(classic_chart(
                "pieChart",
                Some("Mix"),
                &[ser_literal("Share", &["A", "B", "C"], &[0.5, 0.25, 0.25])],
            )))
            .build(),
        "S",
    );
    let series = &loaded.charts[0].series[0];

    // No sheets at all: literal data must not consult the model.
    let empty = WorkbookModel::new();
    let resolved = resolve_series(series, 0, &empty);
    assert_eq!(resolved.name, "Share");
    assert_eq!(resolved.values, vec![Some(0.5), Some(0.25), Some(0.25)]);
    assert_eq!(resolved.categories.len(), 3);
    assert_eq!(resolve(&series.values, &empty), resolve(&series.values, &loaded.model()));
}

#[test]
fn test_resolution_is_repeatable() {
    let loaded = load(sales_package(), "Sales Data");
    let model = loaded.model();
    let first = resolve_all(&loaded.charts[0].series, &model);
    let second = resolve_all(&loaded.charts[0].series, &model);
    assert_eq!(first, second);
}

#[test]
fn test_model_changes_are_picked_up() {
    let loaded = load(sales_package(), "Sales Data");
    let mut model = loaded.model();
    let values = &loaded.charts[0].series[0].values;
    assert_eq!(resolve_numbers(values, &model)[0], Some(100.0));

    let sheet = model.sheet_id("Sales Data").unwrap();
    model.set_cell(sheet, 1, 1, CellValue::Number(999.0));
    model.set_cell(sheet, 2, 1, CellValue::Empty);
    let values = resolve_numbers(values, &model);
    assert_eq!(values[0], Some(999.0));
    assert_eq!(values[1], None);
}

#[test]
fn test_overrides_layer_on_top() {
    let loaded = load(sales_package(), "Sales Data");
    let base = loaded.model();
    let overlay = base.with_overrides(vec![
        CellOverride {
            sheet: "Sales Data".into(),
            row: 1,
            col: 1,
            value: OverrideValue::Number(1.5),
        },
        CellOverride {
            sheet: "Missing".into(),
            row: 0,
            col: 0,
            value: OverrideValue::Text("dropped".into()),
        },
    ]);
    assert_eq!(overlay.override_count(), 1);

    let values = &loaded.charts[0].series[0].values;
    assert_eq!(resolve_numbers(values, &overlay)[0], Some(1.5));
    assert_eq!(resolve_numbers(values, &base)[0], Some(100.0));
}

#[test]
fn test_missing_sheet_resolves_to_nothing() {
    let model = WorkbookModel::new();
    let source = DataSource::Reference("Nowhere!$A$1:$A$3".into());
    assert!(resolve(&source, &model).is_empty());
    assert!(matches!(
        try_resolve_reference("Nowhere!$A$1:$A$3", &model),
        Err(XlchartError::UnresolvableReference(_))
    ));
}

#[test_case("'Sales Data'!$B$2:$B$3", &[Some(100.0), Some(250.5)]; "column")]
#[test_case("('Sales Data'!$B$2,'Sales Data'!$B$4)", &[Some(100.0), Some(175.0)]; "union")]
#[test_case("'sales data'!B2", &[Some(100.0)]; "case-insensitive sheet")]
#[test_case("'Sales Data'!$A$1:$B$1", &[None, None]; "text is not numeric")]
fn test_reference_shapes(formula: &str, expected: &[Option<f64>]) {
    let loaded = load(sales_package(), "Sales Data");
    let model = loaded.model();
    let values = resolve_numbers(&DataSource::Reference(formula.into()), &model);
    assert_eq!(values, expected);
}

#[test]
fn test_text_sources() {
    let loaded = load(sales_package(), "Sales Data");
    let model = loaded.model();
    assert_eq!(
        resolve_text(&TextSource::Reference("'Sales Data'!$A$1:$B$1".into()), &model).as_deref(),
        Some("Quarter Revenue")
    );
    assert_eq!(resolve_text(&TextSource::Literal("  ".into()), &model), None);
    assert_eq!(resolve_text(&TextSource::Absent, &model), None);
}

#[test]
fn test_unnamed_series_get_positional_names() {
    let loaded = load(
        XlsxBuilder::new()
            .sheet(
                SheetBuilder::new("S")
                    .column("A1", &[1.0, 2.0])
                    .chart(classic_chart(
                        "lineChart",
                        None,
                        &[
                            ser_values("", "S!$A$1:$A$2"),
                            ser_values("", "S!$A$1:$A$2"),
                        ],
                    )),
            )
            .build(),
        "S",
    );
    let resolved = resolve_all(&loaded.charts[0].series, &loaded.model());
    let names: Vec<&str> = resolved.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["Series 1", "Series 2"]);
}

#[test]
fn test_shared_and_inline_strings() {
    let loaded = load(
        XlsxBuilder::new()
            .sheet(
                SheetBuilder::new("S")
                    .cell("A1", "shared")
                    .cell("A2", fixtures::CellValue::InlineString("inline".into()))
                    .cell("A3", true),
            )
            .build(),
        "S",
    );
    let model = loaded.model();
    let values = resolve(&DataSource::Reference("S!A1:A3".into()), &model);
    assert_eq!(
        values,
        vec![
            Some(Scalar::Text("shared".into())),
            Some(Scalar::Text("inline".into())),
            Some(Scalar::Bool(true)),
        ]
    );
}

#[test]
fn test_whole_sheet_series_stays_bounded() {
    let loaded = load(
        XlsxBuilder::new()
            .sheet(
                SheetBuilder::new("Data")
                    .cell("A1", 7.0)
                    .chart(bar_chart(None, &[ser_values("All", "Data!$A$1:$XFD$1048576")])),
            )
            .build(),
        "Data",
    );
    let model = loaded.model();
    let resolved = resolve_series(&loaded.charts[0].series[0], 0, &model);
    assert_eq!(resolved.values.len(), MAX_REFERENCE_CELLS);
    assert_eq!(resolved.values[0], Some(7.0));
}
