//! # cellgraph
//!
//! Formula dependency tracking and incremental recalculation for a spreadsheet grid.
//!
//! Editing a cell re-evaluates exactly the formulas that depend on it, in
//! dependency order, and reports the cells whose value or display changed as one
//! [`RecalcBatch`].
//!
//! ## Features
//!
//! - A1-style addressing with unbounded column letters
//! - Precedent extraction and a bidirectional dependency graph
//! - Topological recalculation with `#CYCLE!` for circular references
//! - Diff-only batches delivered to subscribers
//! - Lenient JSON snapshots and debounced autosave
//!
//! ## Example
//!
//! ```rust
//! use cellgraph::prelude::*;
//!
//! let mut workbook = Workbook::new();
//! workbook.edit("A1", "1").unwrap();
//! workbook.edit("B1", "=A1+1").unwrap();
//! workbook.edit("C1", "=B1+1").unwrap();
//!
//! let batch = workbook.edit("A1", "10").unwrap();
//! let changed: Vec<String> = batch.addresses().iter().map(|a| a.to_string()).collect();
//! assert_eq!(changed, ["A1", "B1", "C1"]);
//! assert_eq!(workbook.get_cell("C1").unwrap().display, "12");
//!
//! // Snapshots round-trip through JSON
//! let json = workbook.snapshot().to_json().unwrap();
//! let restored = Workbook::restore(PersistedState::from_json(&json).unwrap(), WorkbookOptions::default());
//! assert_eq!(restored.get_cell("C1").unwrap().value, CellValue::Number(12.0));
//! ```

pub mod autosave;
pub mod error;
pub mod options;
pub mod persist;
pub mod prelude;
pub mod recalc;
pub mod workbook;

pub use autosave::{AutoSaver, Debouncer};
pub use error::PersistError;
pub use options::{storage_key, AutosaveOptions, WorkbookOptions};
pub use persist::{
    default_format, default_sheets, FileStore, MemoryStore, PersistedCell, PersistedState,
    SheetInfo, SnapshotStore,
};
pub use recalc::{BatchSink, CellUpdate, RecalcBatch, RecalcPhase, RecalcStats};
pub use workbook::{CellView, Workbook};

// Re-export core types
pub use cellgraph_core::{
    to_address, to_index, CellAddress, CellData, CellError, CellRange, CellValue, Error, Result,
    DEFAULT_COLS, DEFAULT_ROWS,
};

// Re-export formula types
pub use cellgraph_formula::{
    extract_precedents, parse_formula, DependencyGraph, Evaluator, FormulaError, FormulaValue,
    FunctionDef, FunctionRegistry,
};
