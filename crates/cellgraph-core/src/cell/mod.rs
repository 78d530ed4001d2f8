//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellAddress`] - A cell's location (e.g., "A1")
//! - [`CellRange`] - A range of cells (e.g., "A1:B10")
//! - [`CellValue`] - The computed value of a cell
//! - [`CellData`] - Complete stored cell: raw input, formula, value, display, format

mod address;
mod data;
mod value;

pub use address::{
    column_to_letters, letters_to_column, to_address, to_index, CellAddress, CellRange,
    CellRangeIterator,
};
pub use data::CellData;
pub use value::{format_number, CellError, CellValue};
