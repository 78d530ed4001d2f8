//! Prelude module - common imports for cellgraph users
//!
//! ```rust
//! use cellgraph::prelude::*;
//! ```

pub use crate::{
    // Persistence
    AutoSaver,
    AutosaveOptions,
    // Recalculation
    BatchSink,
    // Cell types
    CellAddress,
    CellError,
    CellRange,
    CellUpdate,
    CellValue,
    CellView,

    // Error types
    Error,
    FileStore,
    MemoryStore,
    PersistError,
    PersistedState,
    RecalcBatch,
    RecalcStats,
    Result,
    SnapshotStore,

    // Main types
    Workbook,
    WorkbookOptions,
};
