use serde::Serialize;

use super::Scalar;

/// Opaque handle to a sheet inside a recalculation model.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SheetId(pub usize);

/// The current value of one cell.
#[derive(Debug, Serialize, Clone, PartialEq, Default)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
    /// Error literal such as `#DIV/0!`
    Error(String),
}

impl CellValue {
    /// Chart-facing reading: empty and error cells are gaps.
    pub fn to_scalar(&self) -> Option<Scalar> {
        match self {
            Self::Empty | Self::Error(_) => None,
            Self::Number(n) => Some(Scalar::Number(*n)),
            Self::Text(s) => Some(Scalar::Text(s.clone())),
            Self::Bool(b) => Some(Scalar::Bool(*b)),
        }
    }
}
