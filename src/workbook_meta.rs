//! Workbook metadata parsing module
//! This module locates the workbook manifest and reads its sheet list and
//! date system.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;

use crate::container::Package;
use crate::namespaces::{get_rel_id, is_office_document_relationship};
use crate::parser::relationships::read_relationships;

/// Conventional manifest location, used when the root relationships do not
/// name one.
pub const DEFAULT_WORKBOOK_PATH: &str = "xl/workbook.xml";

/// Excel date system - determines how serial dates are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DateSystem {
    /// Windows 1900 date system (default). Serial 1 = 1900-01-01, with the
    /// phantom 1900-02-29 kept for Lotus compatibility.
    #[default]
    Date1900,
    /// Mac 1904 date system - serial 0 = 1904-01-01
    Date1904,
}

/// Visibility of a sheet tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SheetState {
    #[default]
    Visible,
    Hidden,
    VeryHidden,
}

/// A `<sheet>` element as written in the manifest, before its relationship
/// id is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry {
    pub name: String,
    pub rel_id: String,
    pub state: SheetState,
}

/// Everything read from the workbook part itself.
#[derive(Debug, Clone, Default)]
pub struct WorkbookXml {
    pub sheets: Vec<SheetEntry>,
    pub date_system: DateSystem,
}

/// Locate the workbook manifest.
///
/// Follows the root `officeDocument` relationship, falling back to
/// `xl/workbook.xml` when the root relationships are absent or silent.
pub fn find_manifest_path(package: &Package) -> String {
    let root = read_relationships(package, "");
    let path = root
        .of_type(is_office_document_relationship)
        .map(|rel| rel.target.clone())
        .find(|target| package.contains(target))
        .unwrap_or_else(|| {
            tracing::debug!("no officeDocument relationship, using {DEFAULT_WORKBOOK_PATH}");
            DEFAULT_WORKBOOK_PATH.to_string()
        });
    path
}

/// Parse workbook.xml for the sheet list and date system
///
/// Parses:
/// - `<sheets><sheet name="..." r:id="rId1" state="hidden"/></sheets>`
/// - `<workbookPr date1904="1"/>`
///
/// Sheets keep manifest order. A malformed document yields what was read
/// before the error.
pub fn parse_workbook_xml(xml: &[u8]) -> WorkbookXml {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut workbook = WorkbookXml::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e) | Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"sheet" => {
                    if let Some(entry) = parse_sheet_element(e) {
                        workbook.sheets.push(entry);
                    }
                }
                b"workbookPr" => workbook.date_system = parse_workbook_pr(e),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::warn!("malformed workbook manifest: {e}");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    workbook
}

/// Parse a sheet element. Sheets without a name are skipped.
fn parse_sheet_element(e: &BytesStart<'_>) -> Option<SheetEntry> {
    let mut name = String::new();
    let mut state = SheetState::Visible;

    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"name" => {
                name = attr
                    .unescape_value()
                    .map(|v| v.into_owned())
                    .unwrap_or_default();
            }
            b"state" => {
                state = match std::str::from_utf8(&attr.value).unwrap_or("") {
                    "hidden" => SheetState::Hidden,
                    "veryHidden" => SheetState::VeryHidden,
                    _ => SheetState::Visible,
                };
            }
            _ => {}
        }
    }

    if name.is_empty() {
        tracing::debug!("skipping unnamed sheet element");
        return None;
    }

    let rel_id = get_rel_id(e).unwrap_or_default();
    Some(SheetEntry {
        name,
        rel_id,
        state,
    })
}

/// Parse workbookPr element for date system
fn parse_workbook_pr(e: &BytesStart<'_>) -> DateSystem {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"date1904" {
            let val = std::str::from_utf8(&attr.value).unwrap_or("0");
            if val == "1" || val.eq_ignore_ascii_case("true") {
                return DateSystem::Date1904;
            }
        }
    }
    DateSystem::Date1900
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

    #[test]
    fn test_parse_workbook_xml() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"
          xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <workbookPr date1904="1"/>
  <sheets>
    <sheet name="Data &amp; Notes" sheetId="1" r:id="rId3"/>
    <sheet name="Chart1" sheetId="2" state="hidden" r:id="rId1"/>
    <sheet sheetId="3" r:id="rId2"/>
  </sheets>
</workbook>"#;
        let workbook = parse_workbook_xml(xml.as_bytes());
        assert_eq!(workbook.date_system, DateSystem::Date1904);
        assert_eq!(workbook.sheets.len(), 2);
        assert_eq!(workbook.sheets[0].name, "Data & Notes");
        assert_eq!(workbook.sheets[0].rel_id, "rId3");
        assert_eq!(workbook.sheets[1].state, SheetState::Hidden);
    }

    #[test]
    fn test_date_system_default() {
        assert_eq!(DateSystem::default(), DateSystem::Date1900);
        let workbook = parse_workbook_xml(b"<workbook><workbookPr date1904=\"0\"/></workbook>");
        assert_eq!(workbook.date_system, DateSystem::Date1900);
    }

    #[test]
    fn test_strict_prefixed_manifest() {
        let xml = r#"<x:workbook xmlns:x="http://purl.oclc.org/ooxml/spreadsheetml/main"
          xmlns:r="http://purl.oclc.org/ooxml/officeDocument/relationships">
  <x:sheets><x:sheet name="S" sheetId="1" r:id="rId1"/></x:sheets>
</x:workbook>"#;
        let workbook = parse_workbook_xml(xml.as_bytes());
        assert_eq!(workbook.sheets.len(), 1);
        assert_eq!(workbook.sheets[0].rel_id, "rId1");
    }
}
