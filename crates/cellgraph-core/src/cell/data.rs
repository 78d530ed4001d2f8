//! Stored cell data

use super::value::CellValue;

/// A stored cell: what the user typed plus what the grid shows
///
/// If `formula` is set, `value` and `display` are owned by the evaluator and are only
/// ever written by a recalculation commit. Otherwise `value` is the coerced raw input
/// and `display` its string form.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CellData {
    /// The literal text last entered
    pub raw_input: String,
    /// `raw_input` when it is a formula
    pub formula: Option<String>,
    /// Computed value
    pub value: CellValue,
    /// String shown in the grid
    pub display: String,
}

impl CellData {
    /// An empty cell
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether raw input is a formula (starts with `=`)
    pub fn is_formula_input(raw: &str) -> bool {
        raw.starts_with('=')
    }

    /// Build a literal (non-formula) cell from raw input
    pub fn literal(raw: &str) -> Self {
        let value = CellValue::from_literal(raw);
        let display = value.display();
        Self {
            raw_input: raw.to_string(),
            formula: None,
            value,
            display,
        }
    }

    /// Check if the cell holds a formula
    pub fn is_formula(&self) -> bool {
        self.formula.is_some()
    }

    /// Check if the cell is entirely empty
    pub fn is_empty(&self) -> bool {
        self.raw_input.is_empty() && self.formula.is_none() && self.value.is_empty()
    }
}
