use serde::Serialize;

use super::ChartAnchor;
use crate::workbook_meta::{DateSystem, SheetState};

/// Whether a sheet is a cell grid or a dedicated chart sheet.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SheetKind {
    #[default]
    Worksheet,
    ChartSheet,
}

/// A sheet listed in the workbook manifest, with its part resolved.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SheetMeta {
    pub name: String,
    /// Normalized package path, e.g. `xl/worksheets/sheet1.xml`
    pub part_path: String,
    pub kind: SheetKind,
    pub state: SheetState,
}

/// The resolved workbook manifest.
#[derive(Debug, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Path of the workbook part itself
    pub workbook_path: String,
    /// Manifest order
    pub sheets: Vec<SheetMeta>,
    pub date_system: DateSystem,
    /// Shared string table, when the workbook has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_strings: Option<String>,
}

impl Manifest {
    pub fn sheet(&self, name: &str) -> Option<&SheetMeta> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

/// One chart part reachable from a sheet.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChartPartRef {
    pub sheet_name: String,
    /// Normalized package path of the chart (or chartex) part
    pub part_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<ChartAnchor>,
    /// Frame name from the drawing (`xdr:cNvPr/@name`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}
