//! Package topology - from the workbook manifest down to chart parts.
//!
//! ```text
//! _rels/.rels --officeDocument--> xl/workbook.xml
//!   xl/_rels/workbook.xml.rels --rId--> xl/worksheets/sheetN.xml
//!     xl/worksheets/_rels/sheetN.xml.rels --drawing--> xl/drawings/drawingM.xml
//!       xl/drawings/_rels/drawingM.xml.rels --chart--> xl/charts/chartK.xml
//! ```
//!
//! Every hop is optional: a missing part or unresolved id drops that branch
//! and the walk continues.

use std::collections::HashSet;

use crate::container::Package;
use crate::drawings::{parse_chart_anchors, DrawingChart};
use crate::error::{Result, XlchartError};
use crate::namespaces::{
    is_chart_relationship, is_chartsheet_relationship, is_drawing_relationship,
    is_shared_strings_relationship,
};
use crate::parser::relationships::{read_relationships, RelationshipMap};
use crate::types::{ChartPartRef, Manifest, SheetKind, SheetMeta};
use crate::workbook_meta::{find_manifest_path, parse_workbook_xml};

/// Read the manifest and resolve every sheet to its part.
///
/// Sheets whose relationship id does not resolve are dropped with a warning.
///
/// # Errors
/// [`XlchartError::MissingEntry`] when the package has no workbook part.
pub fn find_sheets(package: &Package) -> Result<Manifest> {
    let workbook_path = find_manifest_path(package);
    let xml = package.read(&workbook_path)?;
    let workbook = parse_workbook_xml(&xml);
    let rels = read_relationships(package, &workbook_path);

    let sheets = workbook
        .sheets
        .into_iter()
        .filter_map(|entry| {
            let Some(rel) = rels.get(&entry.rel_id) else {
                tracing::warn!(
                    "dropping sheet {:?}: relationship {:?} not found in {}",
                    entry.name,
                    entry.rel_id,
                    rels.source_part()
                );
                return None;
            };
            let kind = if rel.target.contains("chartsheet")
                || is_chartsheet_relationship(&rel.rel_type)
                || rel.rel_type.to_ascii_lowercase().contains("chartsheet")
            {
                SheetKind::ChartSheet
            } else {
                SheetKind::Worksheet
            };
            Some(SheetMeta {
                name: entry.name,
                part_path: rel.target.clone(),
                kind,
                state: entry.state,
            })
        })
        .collect();

    let shared_strings = rels
        .of_type(is_shared_strings_relationship)
        .map(|rel| rel.target.clone())
        .next();

    Ok(Manifest {
        workbook_path,
        sheets,
        date_system: workbook.date_system,
        shared_strings,
    })
}

/// Every chart part in the package, as `(sheet, part)` pairs.
///
/// Order: manifest order, then drawing relationship order, then anchor
/// order. A package without a readable manifest has no charts.
pub fn find_chart_parts(package: &Package) -> Vec<ChartPartRef> {
    match find_sheets(package) {
        Ok(manifest) => chart_parts_for_manifest(package, &manifest),
        Err(e) => {
            tracing::warn!("no workbook manifest: {e}");
            Vec::new()
        }
    }
}

/// Chart parts for every sheet of an already-resolved manifest.
pub fn chart_parts_for_manifest(package: &Package, manifest: &Manifest) -> Vec<ChartPartRef> {
    manifest
        .sheets
        .iter()
        .flat_map(|sheet| chart_parts_for_sheet(package, sheet))
        .collect()
}

/// Chart parts reachable from one sheet.
///
/// A part reachable twice (for example through a duplicated frame) is listed
/// once, at its first position.
pub fn chart_parts_for_sheet(package: &Package, sheet: &SheetMeta) -> Vec<ChartPartRef> {
    let sheet_rels = read_relationships(package, &sheet.part_path);
    let mut parts = Vec::new();
    let mut seen = HashSet::new();

    for drawing in sheet_rels.of_type(is_drawing_relationship) {
        let Some(xml) = package.read_optional(&drawing.target) else {
            continue;
        };
        let drawing_rels = read_relationships(package, &drawing.target);

        for frame in parse_chart_anchors(&xml) {
            match resolve_chart_frame(package, &drawing_rels, &frame) {
                Ok(part_path) => {
                    if seen.insert(part_path.clone()) {
                        parts.push(ChartPartRef {
                            sheet_name: sheet.name.clone(),
                            part_path,
                            anchor: frame.anchor,
                            name: frame.name,
                        });
                    }
                }
                Err(e) => tracing::warn!("sheet {:?}: {e}", sheet.name),
            }
        }
    }

    if sheet.kind == SheetKind::ChartSheet {
        for rel in sheet_rels.of_type(is_chart_relationship) {
            if !package.contains(&rel.target) {
                tracing::debug!("chart sheet {:?}: {} not present", sheet.name, rel.target);
                continue;
            }
            if seen.insert(rel.target.clone()) {
                parts.push(ChartPartRef {
                    sheet_name: sheet.name.clone(),
                    part_path: rel.target.clone(),
                    anchor: None,
                    name: None,
                });
            }
        }
    }

    tracing::trace!("sheet {:?}: {} chart part(s)", sheet.name, parts.len());
    parts
}

/// Follow a frame's relationship id to a chart part that exists.
fn resolve_chart_frame(
    package: &Package,
    drawing_rels: &RelationshipMap,
    frame: &DrawingChart,
) -> Result<String> {
    let dangling = || XlchartError::DanglingChartReference {
        drawing: drawing_rels.source_part().to_string(),
        id: frame.rel_id.clone(),
    };

    let rel = drawing_rels.get(&frame.rel_id).ok_or_else(dangling)?;
    let looks_like_chart = is_chart_relationship(&rel.rel_type) || rel.target.contains("chart");
    if !looks_like_chart || !package.contains(&rel.target) {
        return Err(dangling());
    }
    Ok(rel.target.clone())
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;
    use zip::ZipWriter;

    const REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

    fn rels(entries: &[(&str, &str, &str)]) -> String {
        let mut xml = String::from(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for (id, kind, target) in entries {
            xml.push_str(&format!(
                r#"<Relationship Id="{id}" Type="{REL}/{kind}" Target="{target}"/>"#
            ));
        }
        xml.push_str("</Relationships>");
        xml
    }

    fn drawing(rel_ids: &[&str]) -> String {
        let mut xml = String::from(r#"<xdr:wsDr xmlns:xdr="x" xmlns:c="c" xmlns:r="r">"#);
        for (i, id) in rel_ids.iter().enumerate() {
            xml.push_str(&format!(
                r#"<xdr:twoCellAnchor><xdr:from><xdr:col>{i}</xdr:col><xdr:row>0</xdr:row></xdr:from>
<xdr:graphicFrame><xdr:nvGraphicFramePr><xdr:cNvPr id="{i}" name="Chart {i}"/></xdr:nvGraphicFramePr>
<c:chart r:id="{id}"/></xdr:graphicFrame></xdr:twoCellAnchor>"#
            ));
        }
        xml.push_str("</xdr:wsDr>");
        xml
    }

    fn package(files: &[(&str, String)]) -> Package {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        for (name, body) in files {
            zip.start_file(*name, options).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        Package::open(zip.finish().unwrap().into_inner()).unwrap()
    }

    fn workbook(sheets: &[(&str, &str)]) -> String {
        let mut xml = String::from(r#"<workbook xmlns:r="r"><sheets>"#);
        for (i, (name, id)) in sheets.iter().enumerate() {
            xml.push_str(&format!(r#"<sheet name="{name}" sheetId="{i}" r:id="{id}"/>"#));
        }
        xml.push_str("</sheets></workbook>");
        xml
    }

    fn two_sheet_package() -> Package {
        package(&[
            (
                "_rels/.rels",
                rels(&[("rId1", "officeDocument", "xl/workbook.xml")]),
            ),
            (
                "xl/workbook.xml",
                workbook(&[("Data", "rId2"), ("Summary", "rId1"), ("Ghost", "rId9")]),
            ),
            (
                "xl/_rels/workbook.xml.rels",
                rels(&[
                    ("rId1", "worksheet", "worksheets/sheet2.xml"),
                    ("rId2", "worksheet", "worksheets/sheet1.xml"),
                ]),
            ),
            ("xl/worksheets/sheet1.xml", "<worksheet/>".into()),
            ("xl/worksheets/sheet2.xml", "<worksheet/>".into()),
            (
                "xl/worksheets/_rels/sheet2.xml.rels",
                rels(&[("rId1", "drawing", "../drawings/drawing1.xml")]),
            ),
            ("xl/drawings/drawing1.xml", drawing(&["rId2", "rId1", "rId5"])),
            (
                "xl/drawings/_rels/drawing1.xml.rels",
                rels(&[
                    ("rId1", "chart", "../charts/chart1.xml"),
                    ("rId2", "chart", "../charts/chart2.xml"),
                    ("rId5", "chart", "../charts/missing.xml"),
                ]),
            ),
            ("xl/charts/chart1.xml", "<chartSpace/>".into()),
            ("xl/charts/chart2.xml", "<chartSpace/>".into()),
        ])
    }

    #[test]
    fn test_find_sheets_drops_unresolved_ids() {
        let manifest = find_sheets(&two_sheet_package()).unwrap();
        let names: Vec<&str> = manifest.sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Data", "Summary"]);
        assert_eq!(manifest.sheets[0].part_path, "xl/worksheets/sheet1.xml");
        assert_eq!(manifest.sheets[1].kind, SheetKind::Worksheet);
    }

    #[test]
    fn test_chart_parts_follow_anchor_order() {
        let parts = find_chart_parts(&two_sheet_package());
        let paths: Vec<&str> = parts.iter().map(|p| p.part_path.as_str()).collect();
        // rId5 points at a part that is not in the package.
        assert_eq!(paths, vec!["xl/charts/chart2.xml", "xl/charts/chart1.xml"]);
        assert!(parts.iter().all(|p| p.sheet_name == "Summary"));
        assert_eq!(parts[0].name.as_deref(), Some("Chart 0"));
        assert_eq!(parts[1].anchor.unwrap().from_col, 1);
    }

    #[test]
    fn test_manifest_fallback_without_root_rels() {
        let pkg = package(&[
            ("xl/workbook.xml", workbook(&[("Only", "rId1")])),
            (
                "xl/_rels/workbook.xml.rels",
                rels(&[("rId1", "worksheet", "worksheets/sheet1.xml")]),
            ),
            ("xl/worksheets/sheet1.xml", "<worksheet/>".into()),
        ]);
        let manifest = find_sheets(&pkg).unwrap();
        assert_eq!(manifest.workbook_path, "xl/workbook.xml");
        assert_eq!(manifest.sheets.len(), 1);
        assert!(find_chart_parts(&pkg).is_empty());
    }

    #[test]
    fn test_chartsheet_direct_chart_relationship() {
        let pkg = package(&[
            ("xl/workbook.xml", workbook(&[("Chart1", "rId1")])),
            (
                "xl/_rels/workbook.xml.rels",
                rels(&[("rId1", "chartsheet", "chartsheets/sheet1.xml")]),
            ),
            ("xl/chartsheets/sheet1.xml", "<chartsheet/>".into()),
            (
                "xl/chartsheets/_rels/sheet1.xml.rels",
                rels(&[("rId1", "chart", "../charts/chart3.xml")]),
            ),
            ("xl/charts/chart3.xml", "<chartSpace/>".into()),
        ]);
        let manifest = find_sheets(&pkg).unwrap();
        assert_eq!(manifest.sheets[0].kind, SheetKind::ChartSheet);
        let parts = find_chart_parts(&pkg);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].part_path, "xl/charts/chart3.xml");
        assert_eq!(parts[0].anchor, None);
    }

    #[test]
    fn test_missing_workbook_is_error() {
        let pkg = package(&[("docProps/app.xml", "<Properties/>".into())]);
        assert!(matches!(
            find_sheets(&pkg),
            Err(XlchartError::MissingEntry(_))
        ));
        assert!(find_chart_parts(&pkg).is_empty());
    }
}
