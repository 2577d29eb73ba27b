//! Utilities for parsing Excel-style cell references and range formulas.

use serde::Serialize;

/// Last column in a worksheet (XFD), 0-indexed.
const MAX_COL: u32 = 16_383;
/// Last row in a worksheet, 0-indexed.
const MAX_ROW: u32 = 1_048_575;

/// A rectangular block of cells on one sheet.
///
/// Coordinates are `(row, col)`, 0-indexed, with `start <= end` on both axes.
#[derive(Debug, Serialize, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct RangeAddress {
    pub sheet: String,
    pub start: (u32, u32),
    pub end: (u32, u32),
}

impl RangeAddress {
    /// Build a range, swapping corners so that `start <= end`.
    pub fn new(sheet: impl Into<String>, a: (u32, u32), b: (u32, u32)) -> Self {
        Self {
            sheet: sheet.into(),
            start: (a.0.min(b.0), a.1.min(b.1)),
            end: (a.0.max(b.0), a.1.max(b.1)),
        }
    }

    pub fn row_count(&self) -> u32 {
        self.end.0 - self.start.0 + 1
    }

    pub fn col_count(&self) -> u32 {
        self.end.1 - self.start.1 + 1
    }

    /// Cell count, saturating.
    pub fn cell_count(&self) -> usize {
        let rows = usize::try_from(self.row_count()).unwrap_or(usize::MAX);
        let cols = usize::try_from(self.col_count()).unwrap_or(usize::MAX);
        rows.saturating_mul(cols)
    }

    /// Every `(row, col)` in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (self.start.0..=self.end.0)
            .flat_map(move |row| (self.start.1..=self.end.1).map(move |col| (row, col)))
    }
}

/// Parse a cell reference like "A1" into (col, row) where col and row are 0-indexed.
///
/// `$` markers are ignored; letters must precede digits.
pub fn parse_cell_ref(cell_ref: &str) -> Option<(u32, u32)> {
    parse_cell_ref_bytes(cell_ref.trim().as_bytes())
}

/// Parse a cell reference from raw bytes (ASCII) into (col, row) where col and row are 0-indexed.
///
/// This is the bytes equivalent of [`parse_cell_ref`] for use when working with
/// raw XML attribute values (e.g., `attr.value` from quick-xml).
pub fn parse_cell_ref_bytes(ref_bytes: &[u8]) -> Option<(u32, u32)> {
    let mut col: u32 = 0;
    let mut row: u32 = 0;
    let mut saw_col = false;
    let mut saw_row = false;

    for &b in ref_bytes {
        if b == b'$' {
            continue;
        }
        if b.is_ascii_alphabetic() {
            if saw_row {
                return None;
            }
            let upper = b.to_ascii_uppercase();
            col = col.checked_mul(26)?.checked_add(u32::from(upper - b'A') + 1)?;
            saw_col = true;
        } else if b.is_ascii_digit() {
            row = row.checked_mul(10)?.checked_add(u32::from(b - b'0'))?;
            saw_row = true;
        } else {
            return None;
        }
    }

    if !saw_col || !saw_row || row == 0 {
        return None;
    }

    let (col, row) = (col - 1, row - 1);
    (col <= MAX_COL && row <= MAX_ROW).then_some((col, row))
}

/// Parse a chart range formula into its areas, in order.
///
/// Accepts `Sheet1!$A$1:$B$4`, quoted names (`'Q1 ''24'!A1`), external
/// workbook prefixes (`[1]Sheet1!A1`, which are stripped) and parenthesized
/// unions (`(Sheet1!A1:A3,Sheet1!C1:C3)`). Returns `None` if any area is not
/// a plain sheet-qualified cell or range.
pub fn parse_reference(formula: &str) -> Option<Vec<RangeAddress>> {
    let mut formula = formula.trim();
    formula = formula.strip_prefix('=').unwrap_or(formula).trim();
    if let Some(inner) = formula.strip_prefix('(').and_then(|f| f.strip_suffix(')')) {
        formula = inner;
    }

    let areas = split_union(formula)
        .into_iter()
        .map(parse_range_address)
        .collect::<Option<Vec<_>>>()?;
    (!areas.is_empty()).then_some(areas)
}

/// Parse a single sheet-qualified area like `'My Sheet'!$A$2:$A$9`.
pub fn parse_range_address(area: &str) -> Option<RangeAddress> {
    let (sheet, cells) = split_sheet(area.trim())?;
    let sheet = strip_external_prefix(&sheet);
    if sheet.is_empty() {
        return None;
    }

    let (start, end) = match cells.split_once(':') {
        Some((a, b)) => (parse_cell_ref(a)?, parse_cell_ref(b)?),
        None => {
            let cell = parse_cell_ref(cells)?;
            (cell, cell)
        }
    };
    Some(RangeAddress::new(
        sheet,
        (start.1, start.0),
        (end.1, end.0),
    ))
}

/// Split at top-level commas, ignoring commas inside quoted sheet names.
fn split_union(formula: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;

    for (i, c) in formula.char_indices() {
        match c {
            '\'' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                parts.push(formula.get(start..i).unwrap_or(""));
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(formula.get(start..).unwrap_or(""));
    parts.into_iter().map(str::trim).filter(|p| !p.is_empty()).collect()
}

/// `'It''s'!A1` -> ("It's", "A1"); `Sheet1!A1` -> ("Sheet1", "A1").
fn split_sheet(area: &str) -> Option<(String, &str)> {
    if let Some(quoted) = area.strip_prefix('\'') {
        let mut name = String::new();
        let mut chars = quoted.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            if c != '\'' {
                name.push(c);
                continue;
            }
            if chars.peek().is_some_and(|&(_, next)| next == '\'') {
                chars.next();
                name.push('\'');
                continue;
            }
            let rest = quoted.get(i + 1..)?.strip_prefix('!')?;
            return Some((name, rest));
        }
        return None;
    }

    let (sheet, cells) = area.rsplit_once('!')?;
    Some((sheet.trim().to_string(), cells))
}

fn strip_external_prefix(sheet: &str) -> String {
    match sheet.strip_prefix('[').and_then(|s| s.split_once(']')) {
        Some((_, rest)) => rest.to_string(),
        None => sheet.to_string(),
    }
}
