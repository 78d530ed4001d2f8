//! Formula error types

use cellgraph_core::CellError;
use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur during formula parsing or evaluation
///
/// None of these cross a recalculation boundary: [`FormulaError::to_cell_error`]
/// turns each one into the marker stored in the owning cell.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// Formula syntax error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Formula evaluation error (type mismatch)
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// Unknown function
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Wrong number of arguments
    #[error("Wrong number of arguments for {function}: expected {expected}, got {actual}")]
    ArgumentCount {
        function: String,
        expected: String,
        actual: usize,
    },

    /// Circular reference
    #[error("Circular reference detected")]
    CircularReference,

    /// Reference to invalid cell
    #[error("Invalid reference: {0}")]
    InvalidReference(String),
}

impl FormulaError {
    /// The error marker a cell shows when its formula fails this way
    pub fn to_cell_error(&self) -> CellError {
        match self {
            FormulaError::Parse(_) => CellError::Error,
            FormulaError::Evaluation(_) | FormulaError::Argument(_) => CellError::Value,
            FormulaError::UnknownFunction(_) => CellError::Name,
            FormulaError::ArgumentCount { .. } => CellError::Na,
            FormulaError::CircularReference => CellError::Cycle,
            FormulaError::InvalidReference(_) => CellError::Ref,
        }
    }
}
