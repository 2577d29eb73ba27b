//! Reference resolution.
//!
//! Turns the [`DataSource`]s of a decoded chart into concrete vectors by
//! reading a [`RecalcModel`]. Resolution is pure and uncached: calling it
//! again after the model changed picks up the new values.

use crate::cell_ref::{parse_reference, RangeAddress};
use crate::error::{Result, XlchartError};
use crate::model::RecalcModel;
use crate::types::{DataSource, ResolvedSeries, Scalar, SeriesDescriptor, TextSource};

/// Upper bound on the cells read for one reference; whole-sheet ranges
/// would otherwise allocate billions of slots.
pub const MAX_REFERENCE_CELLS: usize = 1 << 20;

/// Resolve a data source to scalars.
///
/// Literals come back verbatim, `Absent` is empty, and a reference that
/// cannot be resolved is empty too (logged at debug).
pub fn resolve<M: RecalcModel + ?Sized>(source: &DataSource, model: &M) -> Vec<Option<Scalar>> {
    match source {
        DataSource::Literal(points) => points.clone(),
        DataSource::Absent => Vec::new(),
        DataSource::Reference(formula) => match try_resolve_reference(formula, model) {
            Ok(values) => values,
            Err(e) => {
                tracing::debug!("{e}");
                Vec::new()
            }
        },
    }
}

/// Read every cell a range formula covers, row-major, areas in order.
///
/// # Errors
/// [`XlchartError::UnresolvableReference`] if the formula does not parse or
/// names a sheet the model does not have.
pub fn try_resolve_reference<M: RecalcModel + ?Sized>(
    formula: &str,
    model: &M,
) -> Result<Vec<Option<Scalar>>> {
    let areas = parse_reference(formula).ok_or_else(|| {
        XlchartError::UnresolvableReference(format!("cannot parse range {formula:?}"))
    })?;

    let total = areas
        .iter()
        .map(RangeAddress::cell_count)
        .fold(0usize, usize::saturating_add);
    let mut values = Vec::with_capacity(total.min(MAX_REFERENCE_CELLS));
    for area in &areas {
        let sheet = model.sheet_id(&area.sheet).ok_or_else(|| {
            XlchartError::UnresolvableReference(format!(
                "sheet {:?} not found for {formula:?}",
                area.sheet
            ))
        })?;
        let remaining = MAX_REFERENCE_CELLS.saturating_sub(values.len());
        values.extend(
            area.cells()
                .take(remaining)
                .map(|(row, col)| model.cell_value(sheet, row, col).to_scalar()),
        );
    }
    if total > MAX_REFERENCE_CELLS {
        tracing::debug!(
            "{formula:?} covers {total} cells, truncated to {MAX_REFERENCE_CELLS}"
        );
    }
    Ok(values)
}

/// Resolve a title or series name; referenced cells are joined by a space.
pub fn resolve_text<M: RecalcModel + ?Sized>(source: &TextSource, model: &M) -> Option<String> {
    let text = match source {
        TextSource::Literal(s) => s.clone(),
        TextSource::Absent => return None,
        TextSource::Reference(formula) => {
            let parts: Vec<String> = resolve(&DataSource::Reference(formula.clone()), model)
                .iter()
                .flatten()
                .map(Scalar::to_label)
                .filter(|s| !s.trim().is_empty())
                .collect();
            parts.join(" ")
        }
    };
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Resolve to numbers: bools read as 1/0, numeric text is parsed, other
/// text is a gap.
pub fn resolve_numbers<M: RecalcModel + ?Sized>(source: &DataSource, model: &M) -> Vec<Option<f64>> {
    resolve(source, model)
        .iter()
        .map(|v| v.as_ref().and_then(Scalar::as_number))
        .collect()
}

/// Resolve every source of a series. `index` is 0-based and only used for
/// the fallback name `"Series N"`.
pub fn resolve_series<M: RecalcModel + ?Sized>(
    series: &SeriesDescriptor,
    index: usize,
    model: &M,
) -> ResolvedSeries {
    ResolvedSeries {
        name: resolve_text(&series.name, model)
            .unwrap_or_else(|| format!("Series {}", index + 1)),
        categories: resolve(&series.categories, model),
        values: resolve_numbers(&series.values, model),
        sizes: series.sizes.as_ref().map(|s| resolve_numbers(s, model)),
    }
}

/// Resolve all series of a chart, in document order.
pub fn resolve_all<M: RecalcModel + ?Sized>(
    series: &[SeriesDescriptor],
    model: &M,
) -> Vec<ResolvedSeries> {
    series
        .iter()
        .enumerate()
        .map(|(i, s)| resolve_series(s, i, model))
        .collect()
}
