//! Relationship parsing - `.rels` parts and part-path normalization.
//!
//! Every hop of the package graph (root -> workbook -> sheet -> drawing ->
//! chart) goes through a `.rels` part. Targets are relative to the part the
//! `.rels` describes, not to the `.rels` file itself:
//!
//! ```text
//! xl/worksheets/_rels/sheet1.xml.rels   describes   xl/worksheets/sheet1.xml
//! Target="../drawings/drawing1.xml"     resolves to xl/drawings/drawing1.xml
//! ```

use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;

use crate::container::Package;
use crate::error::{Result, XlchartError};

/// One `Relationship` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    /// Normalized, case-folded, package-absolute part path.
    pub target: String,
}

/// Relationships of one source part, in document order.
#[derive(Debug, Clone, Default)]
pub struct RelationshipMap {
    source_part: String,
    entries: Vec<Relationship>,
    by_id: HashMap<String, usize>,
}

impl RelationshipMap {
    /// The part these relationships belong to (empty for the package root).
    pub fn source_part(&self) -> &str {
        &self.source_part
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.by_id
            .get(id)
            .and_then(|&index| self.entries.get(index))
    }

    /// Target path for an id.
    ///
    /// # Errors
    /// [`XlchartError::MissingRelationshipTarget`] when the id is unknown.
    pub fn target(&self, id: &str) -> Result<&str> {
        self.get(id)
            .map(|rel| rel.target.as_str())
            .ok_or_else(|| XlchartError::MissingRelationshipTarget {
                source_part: self.source_part.clone(),
                id: id.to_string(),
            })
    }

    /// All relationships in document order.
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.entries.iter()
    }

    /// Relationships whose type satisfies `pred`, in document order.
    pub fn of_type<'a>(
        &'a self,
        pred: impl Fn(&str) -> bool + 'a,
    ) -> impl Iterator<Item = &'a Relationship> + 'a {
        self.entries.iter().filter(move |rel| pred(&rel.rel_type))
    }

    fn push(&mut self, rel: Relationship) {
        if self.by_id.contains_key(&rel.id) {
            tracing::debug!("duplicate relationship id {} in {}", rel.id, self.source_part);
            return;
        }
        self.by_id.insert(rel.id.clone(), self.entries.len());
        self.entries.push(rel);
    }
}

/// Parse a `.rels` document.
///
/// `rels_path` is the path of the `.rels` part itself; targets are resolved
/// against the part it describes. External targets are skipped, as are
/// elements without an `Id` or `Target`. A malformed document yields the
/// relationships read before the error.
pub fn parse_relationships(xml: &[u8], rels_path: &str) -> RelationshipMap {
    let source_part = source_part_for_rels(rels_path);
    let mut map = RelationshipMap {
        source_part,
        ..RelationshipMap::default()
    };

    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e) | Event::Start(ref e)) => {
                if e.local_name().as_ref() == b"Relationship" {
                    let mut id = None;
                    let mut target = None;
                    let mut rel_type = String::new();
                    let mut external = false;

                    for attr in e.attributes().flatten() {
                        let value = std::str::from_utf8(&attr.value).unwrap_or("").to_string();
                        match attr.key.local_name().as_ref() {
                            b"Id" => id = Some(value),
                            b"Target" => target = Some(value),
                            b"Type" => rel_type = value,
                            b"TargetMode" => external = value.eq_ignore_ascii_case("External"),
                            _ => {}
                        }
                    }

                    match (id, target) {
                        (_, _) if external => {}
                        (Some(id), Some(target)) if !id.is_empty() && !target.is_empty() => {
                            let target = resolve_target(&map.source_part, &target);
                            map.push(Relationship {
                                id,
                                rel_type,
                                target,
                            });
                        }
                        _ => tracing::debug!("skipping malformed relationship in {rels_path}"),
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::warn!("malformed relationships part {rels_path}: {e}");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    map
}

/// Read and parse the relationships of `part`.
///
/// A part without a `.rels` companion simply has no relationships.
pub fn read_relationships(package: &Package, part: &str) -> RelationshipMap {
    let rels_path = rels_path_for(part);
    match package.read_optional(&rels_path) {
        Some(xml) => parse_relationships(&xml, &rels_path),
        None => RelationshipMap {
            source_part: normalize_part_path(part),
            ..RelationshipMap::default()
        },
    }
}

/// `dir/name.xml` -> `dir/_rels/name.xml.rels`.
///
/// The package root (empty path) maps to `_rels/.rels`.
pub fn rels_path_for(part: &str) -> String {
    let part = part.trim_start_matches('/');
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// Inverse of [`rels_path_for`]: `dir/_rels/name.xml.rels` -> `dir/name.xml`.
pub fn source_part_for_rels(rels_path: &str) -> String {
    let rels_path = normalize_part_path(rels_path);
    let (dir, file) = match rels_path.rsplit_once('/') {
        Some((dir, file)) => (dir, file),
        None => ("", rels_path.as_str()),
    };
    let file = file.strip_suffix(".rels").unwrap_or(file);
    let dir = match dir.rsplit_once('/') {
        Some((parent, "_rels")) => parent,
        None if dir == "_rels" => "",
        _ => dir,
    };
    if dir.is_empty() {
        file.to_string()
    } else {
        format!("{dir}/{file}")
    }
}

/// Directory portion of a part path (empty at the root).
pub fn part_directory(part: &str) -> &str {
    part.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// Resolve a relationship target against its source part.
///
/// A leading `/` is package-absolute. Otherwise the target is relative to the
/// source part's directory. `..` above the root clamps at the root.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    let target = target.split('#').next().unwrap_or("").replace('\\', "/");

    let mut components: Vec<&str> = if target.starts_with('/') {
        Vec::new()
    } else {
        part_directory(source_part)
            .split('/')
            .filter(|s| !s.is_empty())
            .collect()
    };

    for part in target.split('/') {
        match part {
            ".." => {
                components.pop();
            }
            "." | "" => {}
            _ => components.push(part),
        }
    }

    components.join("/").to_lowercase()
}

/// Case-fold a part path, drop a leading slash and unify separators.
pub fn normalize_part_path(path: &str) -> String {
    path.trim_start_matches('/').replace('\\', "/").to_lowercase()
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
    use test_case::test_case;

    const SHEET_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com" TargetMode="External"/>
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing" Target="../drawings/Drawing1.xml"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/comments"/>
</Relationships>"#;

    #[test_case("xl/worksheets/sheet1.xml", "../drawings/drawing1.xml", "xl/drawings/drawing1.xml"; "parent directory")]
    #[test_case("xl/workbook.xml", "worksheets/sheet1.xml", "xl/worksheets/sheet1.xml"; "sibling directory")]
    #[test_case("xl/workbook.xml", "/xl/worksheets/sheet1.xml", "xl/worksheets/sheet1.xml"; "absolute")]
    #[test_case("xl/drawings/drawing1.xml", "./../charts/chart1.xml", "xl/charts/chart1.xml"; "current directory")]
    #[test_case("xl/workbook.xml", "../../../x.xml", "x.xml"; "clamps at root")]
    #[test_case("xl/workbook.xml", "sheet.xml#frag", "xl/sheet.xml"; "fragment stripped")]
    #[test_case("xl/workbook.xml", "worksheets\\Sheet1.XML", "xl/worksheets/sheet1.xml"; "backslashes and case")]
    #[test_case("", "xl/workbook.xml", "xl/workbook.xml"; "package root")]
    fn test_resolve_target(source: &str, target: &str, expected: &str) {
        assert_eq!(resolve_target(source, target), expected);
    }

    #[test_case("xl/drawings/drawing1.xml", "xl/drawings/_rels/drawing1.xml.rels")]
    #[test_case("xl/workbook.xml", "xl/_rels/workbook.xml.rels")]
    #[test_case("workbook.xml", "_rels/workbook.xml.rels")]
    #[test_case("", "_rels/.rels")]
    fn test_rels_path_round_trip(part: &str, rels: &str) {
        assert_eq!(rels_path_for(part), rels);
        assert_eq!(source_part_for_rels(rels), part);
    }

    #[test]
    fn test_parse_sheet_relationships() {
        let map = parse_relationships(
            SHEET_RELS.as_bytes(),
            "xl/worksheets/_rels/sheet1.xml.rels",
        );
        assert_eq!(map.source_part(), "xl/worksheets/sheet1.xml");
        // External hyperlink and target-less comment are skipped.
        assert_eq!(map.len(), 1);
        assert_eq!(map.target("rId1").unwrap(), "xl/drawings/drawing1.xml");
        assert!(map.get("rId2").is_none());
    }

    #[test]
    fn test_missing_id_is_an_error() {
        let map = parse_relationships(
            SHEET_RELS.as_bytes(),
            "xl/worksheets/_rels/sheet1.xml.rels",
        );
        match map.target("rId9") {
            Err(XlchartError::MissingRelationshipTarget { source_part, id }) => {
                assert_eq!(source_part, "xl/worksheets/sheet1.xml");
                assert_eq!(id, "rId9");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_truncated_document_keeps_parsed_entries() {
        let xml = r#"<Relationships>
  <Relationship Id="rId1" Type="t/chart" Target="../charts/chart1.xml"/>
  <Relationship Id="rId2" Type="t/chart" Target="../charts/chart2.xml"/>
  <Relationship Id="rId3" Type="t/chart" Target="#;
        let map = parse_relationships(xml.as_bytes(), "xl/drawings/_rels/drawing1.xml.rels");
        assert_eq!(map.len(), 2);
        let targets: Vec<&str> = map.iter().map(|r| r.target.as_str()).collect();
        assert_eq!(targets, vec!["xl/charts/chart1.xml", "xl/charts/chart2.xml"]);
    }

    #[test]
    fn test_of_type_keeps_document_order() {
        let xml = r#"<Relationships>
  <Relationship Id="rId5" Type="x/drawing" Target="../drawings/drawing2.xml"/>
  <Relationship Id="rId1" Type="x/printerSettings" Target="../printerSettings/p1.bin"/>
  <Relationship Id="rId2" Type="x/drawing" Target="../drawings/drawing1.xml"/>
</Relationships>"#;
        let map = parse_relationships(xml.as_bytes(), "xl/worksheets/_rels/sheet1.xml.rels");
        let ids: Vec<&str> = map
            .of_type(crate::namespaces::is_drawing_relationship)
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["rId5", "rId2"]);
    }
}
