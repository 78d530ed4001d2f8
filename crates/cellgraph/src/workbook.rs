//! The recalculating sheet
//!
//! A [`Workbook`] owns the cells, the dependency graph and the evaluator of one
//! sheet. Every edit runs a complete recalculation cycle (see [`crate::recalc`])
//! before it returns.

use crate::options::WorkbookOptions;
use crate::persist::{
    default_format, merge_format, PersistedCell, PersistedState, SheetInfo, SnapshotStore,
};
use crate::recalc::{BatchSink, RecalcBatch, RecalcCycle, RecalcPhase, RecalcStats};
use cellgraph_core::{CellAddress, CellData, CellValue, Result};
use cellgraph_formula::{
    extract_precedents_limited, DependencyGraph, Evaluated, Evaluator, FunctionRegistry,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// What the grid shows for one cell
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CellView {
    pub value: CellValue,
    pub display: String,
    pub formula: Option<String>,
    #[serde(skip)]
    pub raw_input: String,
}

impl From<&CellData> for CellView {
    fn from(cell: &CellData) -> Self {
        Self {
            value: cell.value.clone(),
            display: cell.display.clone(),
            formula: cell.formula.clone(),
            raw_input: cell.raw_input.clone(),
        }
    }
}

/// A sheet of cells that recalculates its formulas on every edit
///
/// # Example
/// ```rust
/// use cellgraph::{CellValue, Workbook};
///
/// let mut workbook = Workbook::new();
/// workbook.edit("A1", "5").unwrap();
/// workbook.edit("B1", "=A1*2").unwrap();
///
/// let batch = workbook.edit("A1", "10").unwrap();
/// assert_eq!(batch.get("B1").unwrap().value, CellValue::Number(20.0));
/// assert_eq!(workbook.get_cell("B1").unwrap().display, "20");
/// ```
pub struct Workbook {
    options: WorkbookOptions,
    cells: BTreeMap<CellAddress, CellData>,
    /// Formats that differ from [`default_format`]
    formats: BTreeMap<CellAddress, Map<String, Value>>,
    graph: DependencyGraph,
    evaluator: Evaluator,
    sinks: Vec<Box<dyn BatchSink>>,
    sheets: Vec<SheetInfo>,
    active_sheet_id: String,
    last_stats: RecalcStats,
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Workbook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workbook")
            .field("options", &self.options)
            .field("cells", &self.cells.len())
            .field("edges", &self.graph.edge_count())
            .field("sinks", &self.sinks.len())
            .field("active_sheet_id", &self.active_sheet_id)
            .finish()
    }
}

impl Workbook {
    /// Create an empty 25×26 grid
    pub fn new() -> Self {
        Self::with_options(WorkbookOptions::default())
    }

    /// Create an empty grid sized by `options`
    pub fn with_options(options: WorkbookOptions) -> Self {
        let mut cells = BTreeMap::new();
        for row in 0..options.rows {
            for col in 0..options.cols {
                cells.insert(CellAddress::new(row, col), CellData::empty());
            }
        }

        let defaults = PersistedState::default();
        Self {
            evaluator: Evaluator::new().with_max_range_cells(options.max_range_cells),
            options,
            cells,
            formats: BTreeMap::new(),
            graph: DependencyGraph::new(),
            sinks: Vec::new(),
            sheets: defaults.sheets,
            active_sheet_id: defaults.active_sheet_id,
            last_stats: RecalcStats::default(),
        }
    }

    /// Build a workbook from rows of raw input, then recalculate everything
    ///
    /// Formulas with syntax errors are kept (they show `#ERROR!`) and logged.
    pub fn from_grid<S: AsRef<str>>(rows: &[Vec<S>], options: WorkbookOptions) -> Self {
        let mut workbook = Self::with_options(options);

        for (row, values) in (0u32..).zip(rows) {
            for (col, raw) in (0u32..).zip(values) {
                let raw = raw.as_ref();
                let address = CellAddress::new(row, col);

                let cell = if CellData::is_formula_input(raw) {
                    if let Err(e) = extract_precedents_limited(raw, workbook.options.max_range_cells)
                    {
                        log::warn!("Seeding {} with an invalid formula {}: {}", address, raw, e);
                    }
                    CellData {
                        raw_input: raw.to_string(),
                        formula: Some(raw.to_string()),
                        ..CellData::default()
                    }
                } else {
                    CellData::literal(raw)
                };
                workbook.cells.insert(address, cell);
            }
        }

        workbook.recalculate_all();
        workbook
    }

    /// Rebuild a workbook from persisted state
    ///
    /// Persisted cells are laid over a fresh grid. Formula results are
    /// recomputed rather than trusted; literal cells are re-read from their
    /// display text.
    pub fn restore(state: PersistedState, options: WorkbookOptions) -> Self {
        let mut workbook = Self::with_options(options);
        let default = default_format();

        for (address, persisted) in state.cells {
            let PersistedCell {
                value,
                formula,
                display,
                format,
            } = persisted;

            let cell = match formula.filter(|f| CellData::is_formula_input(f)) {
                Some(formula) => CellData {
                    raw_input: formula.clone(),
                    formula: Some(formula),
                    value,
                    display,
                },
                None if display.is_empty() => CellData::literal(&value.display()),
                None => CellData::literal(&display),
            };
            workbook.cells.insert(address, cell);

            if format != default {
                workbook.formats.insert(address, format);
            }
        }

        workbook.sheets = state.sheets;
        workbook.active_sheet_id = state.active_sheet_id;
        workbook.recalculate_all();
        workbook
    }

    /// Load the snapshot stored under `key`, or start empty
    ///
    /// Persistence failures are logged, never returned.
    pub fn load_or_empty(store: &dyn SnapshotStore, key: &str, options: WorkbookOptions) -> Self {
        match store.load(key) {
            Ok(Some(payload)) => match PersistedState::from_json(&payload) {
                Ok(state) => return Self::restore(state, options),
                Err(e) => log::warn!("Discarding unreadable snapshot {}: {}", key, e),
            },
            Ok(None) => log::debug!("No snapshot stored under {}", key),
            Err(e) => log::warn!("Failed to load snapshot {}: {}", key, e),
        }
        Self::with_options(options)
    }

    /// Register a batch consumer; it sees every non-empty batch from now on
    pub fn subscribe<S: BatchSink + 'static>(&mut self, sink: S) {
        self.sinks.push(Box::new(sink));
    }

    /// Set a cell's raw input and recalculate what depends on it
    ///
    /// Only a malformed address is an error; formula problems end up as error
    /// markers in the cells.
    pub fn edit(&mut self, address: &str, raw_input: &str) -> Result<RecalcBatch> {
        let address = CellAddress::parse(address)?;
        Ok(self.edit_at(address, raw_input))
    }

    /// Like [`Workbook::edit`], with a parsed address
    pub fn edit_at(&mut self, address: CellAddress, raw_input: &str) -> RecalcBatch {
        let mut cycle = RecalcCycle::begin();

        cycle.enter(RecalcPhase::Registering);
        let cell = self.cells.entry(address).or_default();
        cell.raw_input = raw_input.to_string();
        let had_formula = cell.formula.is_some();

        if CellData::is_formula_input(raw_input) {
            cell.formula = Some(raw_input.to_string());
            let precedents =
                match extract_precedents_limited(raw_input, self.options.max_range_cells) {
                    Ok(precedents) => precedents,
                    Err(e) => {
                        log::trace!("{} has no precedents: {}", address, e);
                        BTreeSet::new()
                    }
                };
            self.graph.register(address, precedents);
        } else {
            cell.formula = None;
            let literal = CellData::literal(raw_input);
            let unchanged =
                !had_formula && cell.value == literal.value && cell.display == literal.display;
            cycle.stage(
                address,
                Evaluated {
                    value: literal.value,
                    display: literal.display,
                },
            );
            self.graph.clear(address);

            // Dependents already saw this value
            if unchanged {
                log::trace!("{} unchanged; nothing to recalculate", address);
                let (batch, stats) = cycle.commit(&mut self.cells);
                return self.finish(batch, stats);
            }
        }

        cycle.enter(RecalcPhase::Resolving);
        let mut affected = vec![address];
        affected.extend(
            self.graph
                .affected_closure(address)
                .into_iter()
                .filter(|&cell| cell != address),
        );
        let (order, cyclic) = cycle.resolve(&self.graph, &affected);

        cycle.enter(RecalcPhase::Evaluating);
        cycle.evaluate(&order, &self.cells, &self.evaluator);
        cycle.mark_cycles(cyclic);

        let (batch, stats) = cycle.commit(&mut self.cells);
        log::debug!(
            "Edited {}: {} affected, {} evaluated, {} changed",
            address,
            stats.affected,
            stats.cells_evaluated,
            stats.changed
        );
        self.finish(batch, stats)
    }

    /// Recompute every formula cell from scratch
    ///
    /// The dependency graph is rebuilt from the stored formulas first.
    pub fn recalculate_all(&mut self) -> RecalcBatch {
        let mut cycle = RecalcCycle::begin();

        cycle.enter(RecalcPhase::Registering);
        self.graph.reset();
        let mut formula_cells = Vec::new();
        for (&address, cell) in &self.cells {
            let Some(formula) = cell.formula.as_deref() else {
                continue;
            };
            if let Ok(precedents) = extract_precedents_limited(formula, self.options.max_range_cells)
            {
                self.graph.register(address, precedents);
            }
            formula_cells.push(address);
        }

        cycle.enter(RecalcPhase::Resolving);
        let (order, cyclic) = cycle.resolve(&self.graph, &formula_cells);

        cycle.enter(RecalcPhase::Evaluating);
        cycle.evaluate(&order, &self.cells, &self.evaluator);
        cycle.mark_cycles(cyclic);

        let (batch, stats) = cycle.commit(&mut self.cells);
        log::debug!(
            "Recalculated {} formula cells: {} cycles, {} changed",
            stats.cells_evaluated,
            stats.cycles,
            stats.changed
        );
        self.finish(batch, stats)
    }

    /// Reset every cell to empty and forget all formulas and formats
    pub fn clear(&mut self) -> RecalcBatch {
        let mut cycle = RecalcCycle::begin();

        cycle.enter(RecalcPhase::Registering);
        self.graph.reset();
        self.formats.clear();
        for (&address, cell) in self.cells.iter_mut() {
            cell.raw_input.clear();
            cell.formula = None;
            cycle.stage(
                address,
                Evaluated {
                    value: CellValue::Empty,
                    display: String::new(),
                },
            );
        }

        let (batch, stats) = cycle.commit(&mut self.cells);
        log::debug!("Cleared sheet: {} changed", stats.changed);
        self.finish(batch, stats)
    }

    fn finish(&mut self, batch: RecalcBatch, stats: RecalcStats) -> RecalcBatch {
        self.last_stats = stats;
        if !batch.is_empty() {
            for sink in &mut self.sinks {
                sink.on_batch(&batch);
            }
        }
        batch
    }

    /// What the grid shows at an A1-style address
    ///
    /// Cells that were never touched read as empty.
    pub fn get_cell(&self, address: &str) -> Result<CellView> {
        let address = CellAddress::parse(address)?;
        Ok(self.cell_at(address))
    }

    /// What the grid shows at an address
    pub fn cell_at(&self, address: CellAddress) -> CellView {
        self.cells
            .get(&address)
            .map(CellView::from)
            .unwrap_or_default()
    }

    /// Stored cells that hold something, in row-major order
    pub fn non_empty_cells(&self) -> impl Iterator<Item = (CellAddress, &CellData)> + '_ {
        self.cells
            .iter()
            .filter(|(_, cell)| !cell.is_empty())
            .map(|(&address, cell)| (address, cell))
    }

    /// Format of a cell (the default format if it was never styled)
    pub fn format(&self, address: &str) -> Result<Map<String, Value>> {
        let address = CellAddress::parse(address)?;
        Ok(self
            .formats
            .get(&address)
            .cloned()
            .unwrap_or_else(default_format))
    }

    /// Merge `patch` into a cell's format; values and formulas are untouched
    pub fn update_format(&mut self, address: &str, patch: &Map<String, Value>) -> Result<()> {
        let address = CellAddress::parse(address)?;
        let format = self.formats.entry(address).or_insert_with(default_format);
        merge_format(format, patch);
        Ok(())
    }

    /// The current state, ready to persist
    ///
    /// Holds every non-empty or styled cell.
    pub fn snapshot(&self) -> PersistedState {
        let mut cells = BTreeMap::new();

        for (&address, cell) in &self.cells {
            let format = self.formats.get(&address);
            if cell.is_empty() && format.is_none() {
                continue;
            }
            cells.insert(
                address,
                PersistedCell {
                    value: cell.value.clone(),
                    formula: cell.formula.clone(),
                    display: cell.display.clone(),
                    format: format.cloned().unwrap_or_else(default_format),
                },
            );
        }

        PersistedState {
            cells,
            sheets: self.sheets.clone(),
            active_sheet_id: self.active_sheet_id.clone(),
        }
    }

    /// Statistics of the most recent recalculation
    pub fn last_stats(&self) -> &RecalcStats {
        &self.last_stats
    }

    /// The dependency graph between formula cells
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// The functions formulas can call
    ///
    /// Register new functions before entering formulas that use them; existing
    /// cells are only re-evaluated by [`Workbook::recalculate_all`].
    pub fn functions_mut(&mut self) -> &mut FunctionRegistry {
        self.evaluator.registry_mut()
    }

    /// Options this workbook was created with
    pub fn options(&self) -> &WorkbookOptions {
        &self.options
    }

    /// Sheet tabs carried through persistence
    pub fn sheets(&self) -> &[SheetInfo] {
        &self.sheets
    }

    /// Id of the active sheet
    pub fn active_sheet_id(&self) -> &str {
        &self.active_sheet_id
    }
}
