//! XML namespace and relationship-type constants.
//!
//! Producers disagree on which namespace family they write (Transitional,
//! Strict, or the Microsoft extension URIs used for chartex). Parsing matches
//! local names, and relationship types are matched by their final path
//! segment so every family is accepted.

use quick_xml::events::BytesStart;

// =============================================================================
// Chart namespaces
// =============================================================================

/// DrawingML chart namespace (2006)
pub const NS_CHART: &str = "http://schemas.openxmlformats.org/drawingml/2006/chart";

/// Office 2016 extended chart namespace (2014 chartex)
pub const NS_CHARTEX: &str = "http://schemas.microsoft.com/office/drawing/2014/chartex";

/// Markup compatibility namespace (`mc:AlternateContent`)
pub const NS_MARKUP_COMPATIBILITY: &str =
    "http://schemas.openxmlformats.org/markup-compatibility/2006";

/// DrawingML spreadsheet drawing namespace
pub const NS_DRAWING_SPREADSHEET: &str =
    "http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing";

// =============================================================================
// Relationship types (Transitional)
// =============================================================================

/// Root relationship to the workbook part
pub const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

pub const REL_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";

pub const REL_CHARTSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chartsheet";

pub const REL_DRAWING: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing";

pub const REL_CHART: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart";

pub const REL_SHARED_STRINGS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";

// =============================================================================
// Relationship types (Strict and Microsoft extensions)
// =============================================================================

pub const REL_OFFICE_DOCUMENT_STRICT: &str =
    "http://purl.oclc.org/ooxml/officeDocument/relationships/officeDocument";

pub const REL_WORKSHEET_STRICT: &str =
    "http://purl.oclc.org/ooxml/officeDocument/relationships/worksheet";

pub const REL_CHARTSHEET_STRICT: &str =
    "http://purl.oclc.org/ooxml/officeDocument/relationships/chartsheet";

pub const REL_DRAWING_STRICT: &str =
    "http://purl.oclc.org/ooxml/officeDocument/relationships/drawing";

pub const REL_CHART_STRICT: &str = "http://purl.oclc.org/ooxml/officeDocument/relationships/chart";

/// Extended chart part (Office 2016 chart types)
pub const REL_CHARTEX: &str = "http://schemas.microsoft.com/office/2014/relationships/chartEx";

// =============================================================================
// Helper functions for namespace-aware parsing
// =============================================================================

/// Check if an element matches a local name, ignoring namespace prefix.
#[inline]
pub fn element_matches(e: &BytesStart, local_name: &[u8]) -> bool {
    e.local_name().as_ref() == local_name
}

/// Get a relationship ID attribute (commonly `r:id`).
///
/// Accepts `r:id`, any other prefix ending in `:id`, or plain `id`.
pub fn get_rel_id(e: &BytesStart) -> Option<String> {
    for attr in e.attributes().flatten() {
        let key = attr.key.as_ref();
        if key == b"id" || key == b"r:id" || (key.len() > 3 && key.ends_with(b":id")) {
            return std::str::from_utf8(&attr.value).ok().map(|s| s.to_string());
        }
    }
    None
}

/// Final path segment of a relationship type URI, lower-cased.
fn rel_type_suffix(rel_type: &str) -> String {
    rel_type
        .rsplit('/')
        .next()
        .unwrap_or(rel_type)
        .to_ascii_lowercase()
}

pub fn is_office_document_relationship(rel_type: &str) -> bool {
    rel_type == REL_OFFICE_DOCUMENT
        || rel_type == REL_OFFICE_DOCUMENT_STRICT
        || rel_type_suffix(rel_type) == "officedocument"
}

pub fn is_worksheet_relationship(rel_type: &str) -> bool {
    rel_type == REL_WORKSHEET
        || rel_type == REL_WORKSHEET_STRICT
        || rel_type_suffix(rel_type) == "worksheet"
}

pub fn is_chartsheet_relationship(rel_type: &str) -> bool {
    rel_type == REL_CHARTSHEET
        || rel_type == REL_CHARTSHEET_STRICT
        || rel_type_suffix(rel_type) == "chartsheet"
}

pub fn is_drawing_relationship(rel_type: &str) -> bool {
    rel_type == REL_DRAWING
        || rel_type == REL_DRAWING_STRICT
        || rel_type_suffix(rel_type) == "drawing"
}

/// Classic (`c:`) or extended (`cx:`) chart part.
pub fn is_chart_relationship(rel_type: &str) -> bool {
    if rel_type == REL_CHART || rel_type == REL_CHART_STRICT || rel_type == REL_CHARTEX {
        return true;
    }
    matches!(rel_type_suffix(rel_type).as_str(), "chart" | "chartex")
}

pub fn is_shared_strings_relationship(rel_type: &str) -> bool {
    rel_type == REL_SHARED_STRINGS || rel_type_suffix(rel_type) == "sharedstrings"
}
