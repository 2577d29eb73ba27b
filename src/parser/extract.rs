//! Whole-package chart extraction.

use serde::Serialize;

use crate::charts::decode_chart_part;
use crate::container::Package;
use crate::parser::topology::{chart_parts_for_sheet, find_sheets};
use crate::types::{ChartDescriptor, Manifest, SheetKind};

/// Charts of one sheet, in document order.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SheetCharts {
    pub name: String,
    pub kind: SheetKind,
    pub charts: Vec<ChartDescriptor>,
}

/// Result of walking and decoding a package.
#[derive(Debug, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
    pub manifest: Manifest,
    /// Manifest order; sheets without charts are included
    pub sheets: Vec<SheetCharts>,
    /// Chart parts that were found but could not be decoded
    pub skipped: usize,
}

impl Extraction {
    pub fn charts_for(&self, sheet: &str) -> &[ChartDescriptor] {
        self.sheets
            .iter()
            .find(|s| s.name == sheet)
            .map_or(&[], |s| s.charts.as_slice())
    }

    pub fn chart_count(&self) -> usize {
        self.sheets.iter().map(|s| s.charts.len()).sum()
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|s| s.name.as_str())
    }
}

/// Walk the package and decode every chart part, sheet by sheet.
///
/// Never fails: a package without a manifest yields no sheets, and chart
/// parts that do not decode are counted in [`Extraction::skipped`].
pub fn extract_charts(package: &Package) -> Extraction {
    let manifest = match find_sheets(package) {
        Ok(manifest) => manifest,
        Err(e) => {
            tracing::warn!("no workbook manifest: {e}");
            return Extraction::default();
        }
    };

    let mut skipped = 0;
    let sheets = manifest
        .sheets
        .iter()
        .map(|sheet| {
            let charts = chart_parts_for_sheet(package, sheet)
                .iter()
                .filter_map(|part| match decode_chart_part(package, part) {
                    Ok(descriptor) => Some(descriptor),
                    Err(e) => {
                        tracing::warn!("sheet {:?}: skipping {}: {e}", sheet.name, part.part_path);
                        skipped += 1;
                        None
                    }
                })
                .collect();
            SheetCharts {
                name: sheet.name.clone(),
                kind: sheet.kind,
                charts,
            }
        })
        .collect();

    let extraction = Extraction {
        manifest,
        sheets,
        skipped,
    };
    tracing::debug!(
        "extracted {} chart(s) from {} sheet(s), {} skipped",
        extraction.chart_count(),
        extraction.sheets.len(),
        extraction.skipped
    );
    extraction
}
