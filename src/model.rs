//! Cell values for reference resolution.
//!
//! [`RecalcModel`] is the seam between the chart pipeline and whatever owns
//! the live cell grid. [`WorkbookModel`] is the built-in implementation: it
//! reads the values Excel cached in each worksheet the last time the file was
//! saved, so charts can be resolved without a formula engine.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::cell_ref::parse_cell_ref_bytes;
use crate::container::Package;
use crate::types::{CellValue, Manifest, SheetId, SheetKind};
use crate::xml_helpers::{attr_string, attr_u32};

/// Read access to current cell values.
///
/// Implementations must be pure for the duration of a resolution pass: the
/// same `(sheet, row, col)` returns the same value until the caller mutates
/// the model.
pub trait RecalcModel {
    /// Look up a sheet by its display name.
    fn sheet_id(&self, name: &str) -> Option<SheetId>;

    /// Current value of a cell (0-indexed). Out-of-range cells are `Empty`.
    fn cell_value(&self, sheet: SheetId, row: u32, col: u32) -> CellValue;
}

impl<M: RecalcModel + ?Sized> RecalcModel for &M {
    fn sheet_id(&self, name: &str) -> Option<SheetId> {
        (**self).sheet_id(name)
    }

    fn cell_value(&self, sheet: SheetId, row: u32, col: u32) -> CellValue {
        (**self).cell_value(sheet, row, col)
    }
}

#[derive(Debug, Clone, Default)]
struct SheetCells {
    name: String,
    cells: HashMap<(u32, u32), CellValue>,
}

/// A workbook's cached cell values, keyed by sheet.
#[derive(Debug, Clone, Default)]
pub struct WorkbookModel {
    sheets: Vec<SheetCells>,
    by_name: HashMap<String, SheetId>,
}

/// One cell replaced on top of a [`WorkbookModel`].
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CellOverride {
    pub sheet: String,
    pub row: u32,
    pub col: u32,
    pub value: OverrideValue,
}

/// Override payload; JSON numbers, strings and booleans map directly.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum OverrideValue {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl From<OverrideValue> for CellValue {
    fn from(value: OverrideValue) -> Self {
        match value {
            OverrideValue::Number(n) => Self::Number(n),
            OverrideValue::Bool(b) => Self::Bool(b),
            OverrideValue::Text(s) => Self::Text(s),
        }
    }
}

impl WorkbookModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load cached values for every sheet in the manifest.
    ///
    /// Never fails: an unreadable sheet part leaves that sheet empty.
    pub fn from_package(package: &Package, manifest: &Manifest) -> Self {
        let shared_strings = manifest
            .shared_strings
            .as_deref()
            .and_then(|path| package.read_optional(path))
            .map(|xml| parse_shared_strings(&xml))
            .unwrap_or_default();

        let mut model = Self::new();
        for sheet in &manifest.sheets {
            let id = model.add_sheet(&sheet.name);
            if sheet.kind == SheetKind::ChartSheet {
                continue;
            }
            let Some(xml) = package.read_optional(&sheet.part_path) else {
                continue;
            };
            let cells = parse_sheet_cells(&xml, &shared_strings);
            tracing::trace!("sheet {:?}: {} cached cells", sheet.name, cells.len());
            if let Some(slot) = model.sheets.get_mut(id.0) {
                slot.cells = cells;
            }
        }
        model
    }

    /// Add a sheet, or return the id of the existing sheet with that name.
    pub fn add_sheet(&mut self, name: &str) -> SheetId {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        let id = SheetId(self.sheets.len());
        self.sheets.push(SheetCells {
            name: name.to_string(),
            cells: HashMap::new(),
        });
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Set a cell; `CellValue::Empty` clears it.
    pub fn set_cell(&mut self, sheet: SheetId, row: u32, col: u32, value: CellValue) {
        let Some(target) = self.sheets.get_mut(sheet.0) else {
            tracing::debug!("set_cell on unknown sheet id {}", sheet.0);
            return;
        };
        if value == CellValue::Empty {
            target.cells.remove(&(row, col));
        } else {
            target.cells.insert((row, col), value);
        }
    }

    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|s| s.name.as_str())
    }

    /// Number of non-empty cells on a sheet.
    pub fn cell_count(&self, sheet: SheetId) -> usize {
        self.sheets.get(sheet.0).map_or(0, |s| s.cells.len())
    }

    /// Layer overrides on top of this model without touching it.
    ///
    /// Overrides naming a sheet this model does not have are dropped.
    pub fn with_overrides<I>(&self, overrides: I) -> OverlayModel<'_>
    where
        I: IntoIterator<Item = CellOverride>,
    {
        let mut cells = HashMap::new();
        for o in overrides {
            match self.sheet_id(&o.sheet) {
                Some(id) => {
                    cells.insert((id, o.row, o.col), CellValue::from(o.value));
                }
                None => tracing::debug!("override for unknown sheet {:?} dropped", o.sheet),
            }
        }
        OverlayModel { base: self, cells }
    }
}

impl RecalcModel for WorkbookModel {
    fn sheet_id(&self, name: &str) -> Option<SheetId> {
        self.by_name.get(name).copied().or_else(|| {
            // Sheet names compare case-insensitively in formulas.
            self.sheets
                .iter()
                .position(|s| s.name.eq_ignore_ascii_case(name))
                .map(SheetId)
        })
    }

    fn cell_value(&self, sheet: SheetId, row: u32, col: u32) -> CellValue {
        self.sheets
            .get(sheet.0)
            .and_then(|s| s.cells.get(&(row, col)))
            .cloned()
            .unwrap_or_default()
    }
}

/// A [`WorkbookModel`] seen through a set of cell overrides.
#[derive(Debug, Clone)]
pub struct OverlayModel<'a> {
    base: &'a WorkbookModel,
    cells: HashMap<(SheetId, u32, u32), CellValue>,
}

impl OverlayModel<'_> {
    pub fn override_count(&self) -> usize {
        self.cells.len()
    }
}

impl RecalcModel for OverlayModel<'_> {
    fn sheet_id(&self, name: &str) -> Option<SheetId> {
        self.base.sheet_id(name)
    }

    fn cell_value(&self, sheet: SheetId, row: u32, col: u32) -> CellValue {
        match self.cells.get(&(sheet, row, col)) {
            Some(value) => value.clone(),
            None => self.base.cell_value(sheet, row, col),
        }
    }
}

/// Parse the shared string table. Phonetic runs (`rPh`) are skipped.
pub fn parse_shared_strings(xml: &[u8]) -> Vec<String> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(false);

    let mut strings = Vec::new();
    let mut buf = Vec::new();
    let mut current = String::new();
    let mut in_si = false;
    let mut in_t = false;
    let mut in_phonetic = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"si" => {
                    in_si = true;
                    current.clear();
                }
                b"rPh" => in_phonetic = true,
                b"t" if in_si && !in_phonetic => in_t = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) if e.local_name().as_ref() == b"si" => {
                strings.push(String::new());
            }
            Ok(Event::Text(ref e)) if in_t => {
                if let Ok(text) = e.unescape() {
                    current.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"si" => {
                    strings.push(std::mem::take(&mut current));
                    in_si = false;
                }
                b"rPh" => in_phonetic = false,
                b"t" => in_t = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::warn!("shared strings truncated after {} entries: {e}", strings.len());
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    strings
}

/// Cell type tag from the `t` attribute of a `<c>` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellTypeTag {
    Shared,
    Inline,
    Str,
    Bool,
    Error,
    Default,
}

fn parse_cell_type_tag(value: &str) -> CellTypeTag {
    match value {
        "s" => CellTypeTag::Shared,
        "b" => CellTypeTag::Bool,
        "e" => CellTypeTag::Error,
        "str" | "d" => CellTypeTag::Str,
        "inlineStr" => CellTypeTag::Inline,
        _ => CellTypeTag::Default,
    }
}

/// Parse the cached values of a worksheet's `sheetData`.
///
/// Cells without an `r` attribute take the position after the previous cell
/// in the row; rows without `r` follow the previous row.
pub fn parse_sheet_cells(xml: &[u8], shared_strings: &[String]) -> HashMap<(u32, u32), CellValue> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(false);

    let mut cells = HashMap::new();
    let mut buf = Vec::new();

    let mut row: u32 = 0;
    let mut next_row: u32 = 0;
    let mut next_col: u32 = 0;

    let mut cell: Option<(u32, u32, CellTypeTag)> = None;
    let mut text = String::new();
    let mut has_text = false;
    let mut in_value = false;
    let mut in_inline = false;
    let mut in_phonetic = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(ref event @ (Event::Start(_) | Event::Empty(_))) => {
                let (Event::Start(ref e) | Event::Empty(ref e)) = event else {
                    continue;
                };
                let is_start = matches!(event, Event::Start(_));
                match e.local_name().as_ref() {
                    b"row" => {
                        row = attr_u32(e, b"r").map_or(next_row, |r| r.saturating_sub(1));
                        next_row = row.saturating_add(1);
                        next_col = 0;
                    }
                    b"c" => {
                        let (col, cell_row) = attr_string(e, b"r")
                            .and_then(|r| parse_cell_ref_bytes(r.as_bytes()))
                            .unwrap_or((next_col, row));
                        next_col = col.saturating_add(1);
                        if is_start {
                            let tag = attr_string(e, b"t")
                                .map_or(CellTypeTag::Default, |t| parse_cell_type_tag(&t));
                            cell = Some((cell_row, col, tag));
                            text.clear();
                            has_text = false;
                        }
                    }
                    b"v" if is_start && cell.is_some() => in_value = true,
                    b"is" if is_start && cell.is_some() => in_inline = true,
                    b"rPh" if is_start => in_phonetic = true,
                    b"t" if is_start && in_inline && !in_phonetic => in_value = true,
                    _ => {}
                }
            }
            Ok(Event::Text(ref e)) if in_value => {
                if let Ok(t) = e.unescape() {
                    text.push_str(&t);
                    has_text = true;
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"is" => in_inline = false,
                b"rPh" => in_phonetic = false,
                b"c" => {
                    if let Some((r, c, tag)) = cell.take() {
                        if has_text {
                            let value = convert_cell(&text, tag, shared_strings);
                            if value != CellValue::Empty {
                                cells.insert((r, c), value);
                            }
                        }
                    }
                    in_value = false;
                    in_inline = false;
                }
                b"sheetData" => break,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::warn!("worksheet cells truncated after {} values: {e}", cells.len());
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    cells
}

fn convert_cell(raw: &str, tag: CellTypeTag, shared_strings: &[String]) -> CellValue {
    match tag {
        CellTypeTag::Shared => {
            let text = raw
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|idx| shared_strings.get(idx));
            match text {
                Some(s) => CellValue::Text(s.clone()),
                None => {
                    tracing::debug!("shared string index {raw:?} out of range");
                    CellValue::Empty
                }
            }
        }
        CellTypeTag::Inline | CellTypeTag::Str => CellValue::Text(raw.to_string()),
        CellTypeTag::Bool => CellValue::Bool(matches!(raw.trim(), "1" | "true")),
        CellTypeTag::Error => CellValue::Error(raw.trim().to_string()),
        CellTypeTag::Default => match raw.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => CellValue::Number(n),
            _ if raw.trim().is_empty() => CellValue::Empty,
            _ => CellValue::Text(raw.to_string()),
        },
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp
)]
mod tests {
    use super::*;

    const SST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="3" uniqueCount="3">
  <si><t>Month</t></si>
  <si><r><t>Rev</t></r><r><t xml:space="preserve">enue </t></r></si>
  <si><t>東京</t><rPh sb="0" eb="2"><t>トウキョウ</t></rPh></si>
  <si/>
</sst>"#;

    #[test]
    fn test_shared_strings() {
        let strings = parse_shared_strings(SST.as_bytes());
        assert_eq!(strings, vec!["Month", "Revenue ", "東京", ""]);
    }

    #[test]
    fn test_sheet_cells() {
        let shared = parse_shared_strings(SST.as_bytes());
        let xml = r#"<worksheet><sheetData>
  <row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row>
  <row r="2">
    <c r="A2"><v>45000</v></c>
    <c r="B2"><f>A2*2</f><v>1.5</v></c>
    <c r="C2" t="b"><v>1</v></c>
    <c r="D2" t="e"><v>#DIV/0!</v></c>
    <c r="E2" t="inlineStr"><is><r><t>in</t></r><r><t>line</t></r></is></c>
    <c r="F2" t="str"><v>formula text</v></c>
    <c r="G2" s="3"/>
    <c r="H2" t="s"><v>99</v></c>
  </row>
  <row><c><v>7</v></c><c><v>8</v></c></row>
</sheetData></worksheet>"#;
        let cells = parse_sheet_cells(xml.as_bytes(), &shared);

        assert_eq!(cells[&(0, 0)], CellValue::Text("Month".into()));
        assert_eq!(cells[&(0, 1)], CellValue::Text("Revenue ".into()));
        assert_eq!(cells[&(1, 0)], CellValue::Number(45000.0));
        assert_eq!(cells[&(1, 1)], CellValue::Number(1.5));
        assert_eq!(cells[&(1, 2)], CellValue::Bool(true));
        assert_eq!(cells[&(1, 3)], CellValue::Error("#DIV/0!".into()));
        assert_eq!(cells[&(1, 4)], CellValue::Text("inline".into()));
        assert_eq!(cells[&(1, 5)], CellValue::Text("formula text".into()));
        assert!(!cells.contains_key(&(1, 6)));
        assert!(!cells.contains_key(&(1, 7)));
        // Row and columns inferred from position.
        assert_eq!(cells[&(2, 0)], CellValue::Number(7.0));
        assert_eq!(cells[&(2, 1)], CellValue::Number(8.0));
    }

    #[test]
    fn test_model_lookup_and_set() {
        let mut model = WorkbookModel::new();
        let data = model.add_sheet("Data");
        assert_eq!(model.add_sheet("Data"), data);
        model.set_cell(data, 0, 0, CellValue::Number(1.0));

        assert_eq!(model.sheet_id("data"), Some(data));
        assert_eq!(model.sheet_id("Missing"), None);
        assert_eq!(model.cell_value(data, 0, 0), CellValue::Number(1.0));
        assert_eq!(model.cell_value(data, 5, 5), CellValue::Empty);
        assert_eq!(model.cell_value(SheetId(9), 0, 0), CellValue::Empty);

        model.set_cell(data, 0, 0, CellValue::Empty);
        assert_eq!(model.cell_count(data), 0);
    }

    #[test]
    fn test_overrides_do_not_mutate_base() {
        let mut model = WorkbookModel::new();
        let data = model.add_sheet("Data");
        model.set_cell(data, 1, 1, CellValue::Number(10.0));

        let overlay = model.with_overrides(vec![
            CellOverride {
                sheet: "Data".into(),
                row: 1,
                col: 1,
                value: OverrideValue::Number(12.5),
            },
            CellOverride {
                sheet: "Nope".into(),
                row: 0,
                col: 0,
                value: OverrideValue::Bool(true),
            },
        ]);

        assert_eq!(overlay.override_count(), 1);
        assert_eq!(overlay.cell_value(data, 1, 1), CellValue::Number(12.5));
        assert_eq!(model.cell_value(data, 1, 1), CellValue::Number(10.0));
    }

    #[test]
    fn test_override_json() {
        let overrides: Vec<CellOverride> = serde_json::from_str(
            r#"[{"sheet":"Data","row":0,"col":1,"value":3},{"sheet":"Data","row":0,"col":2,"value":"Bull"}]"#,
        )
        .unwrap();
        assert_eq!(overrides[0].value, OverrideValue::Number(3.0));
        assert_eq!(overrides[1].value, OverrideValue::Text("Bull".into()));
    }
}
