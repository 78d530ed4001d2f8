//! # cellgraph-core
//!
//! Core data structures for the cellgraph recalculation engine.
//!
//! This crate provides the fundamental types used throughout cellgraph:
//! - [`CellAddress`] and [`CellRange`] - Cell addressing (A1 notation ↔ zero-based indices)
//! - [`CellValue`] and [`CellError`] - Computed cell values and error markers
//! - [`CellData`] - A stored cell: raw input, formula, value and display
//!
//! ## Example
//!
//! ```rust
//! use cellgraph_core::{to_address, to_index, CellAddress};
//!
//! assert_eq!(to_index("B3").unwrap(), (2, 1));
//! assert_eq!(to_address(2, 1), "B3");
//!
//! let addr: CellAddress = "AA10".parse().unwrap();
//! assert_eq!(addr.col, 26);
//! ```

pub mod cell;
pub mod error;

// Re-exports for convenience
pub use cell::{
    column_to_letters, format_number, letters_to_column, to_address, to_index, CellAddress,
    CellData, CellError, CellRange, CellValue,
};
pub use error::{Error, Result};

/// Rows in a freshly initialized sheet
pub const DEFAULT_ROWS: u32 = 25;

/// Columns in a freshly initialized sheet (A..Z)
pub const DEFAULT_COLS: u32 = 26;
