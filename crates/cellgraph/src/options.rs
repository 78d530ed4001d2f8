//! Workbook and autosave configuration

use cellgraph_core::{DEFAULT_COLS, DEFAULT_ROWS};
use cellgraph_formula::DEFAULT_MAX_RANGE_CELLS;
use std::time::Duration;

/// Options for a [`Workbook`](crate::Workbook)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkbookOptions {
    /// Rows present (as empty cells) in a fresh grid (default: 25)
    pub rows: u32,
    /// Columns present in a fresh grid (default: 26, A..Z)
    pub cols: u32,
    /// Largest range a formula may reference, in cells (default: 100 000)
    pub max_range_cells: u64,
}

impl Default for WorkbookOptions {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            max_range_cells: DEFAULT_MAX_RANGE_CELLS,
        }
    }
}

impl WorkbookOptions {
    /// Set the initial row count
    pub fn with_rows(mut self, rows: u32) -> Self {
        self.rows = rows;
        self
    }

    /// Set the initial column count
    pub fn with_cols(mut self, cols: u32) -> Self {
        self.cols = cols;
        self
    }

    /// Set the range size limit
    pub fn with_max_range_cells(mut self, max_range_cells: u64) -> Self {
        self.max_range_cells = max_range_cells;
        self
    }
}

/// Storage key of a sheet's snapshot
pub fn storage_key(sheet_id: &str) -> String {
    format!("sheet-data-{}", sheet_id)
}

/// Options for [`AutoSaver`](crate::AutoSaver)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutosaveOptions {
    /// Quiet period before a scheduled write happens (default: 500ms)
    pub delay: Duration,
    /// Key the snapshot is stored under (default: `sheet-data-1`)
    pub key: String,
}

impl Default for AutosaveOptions {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(500),
            key: storage_key("1"),
        }
    }
}

impl AutosaveOptions {
    /// Options for the given sheet id
    pub fn for_sheet(sheet_id: &str) -> Self {
        Self {
            key: storage_key(sheet_id),
            ..Self::default()
        }
    }

    /// Set the debounce delay
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Set the storage key
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }
}
