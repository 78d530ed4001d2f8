//! Recalculation cycle
//!
//! One cycle moves through [`RecalcPhase`]s: the edited cell is registered, the
//! affected cells are put in dependency order, formulas are evaluated against a
//! staging overlay, and the changes are committed all at once as a [`RecalcBatch`].

use cellgraph_core::{CellAddress, CellData, CellError, CellValue};
use cellgraph_formula::{DependencyGraph, Evaluated, Evaluator};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

/// Phases of one recalculation cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecalcPhase {
    /// No cycle in progress
    Idle,
    /// Recording the new input and its precedents
    Registering,
    /// Computing the affected set and its evaluation order
    Resolving,
    /// Evaluating formulas into the staging overlay
    Evaluating,
    /// Diffing and applying the staged values
    Committing,
}

/// Statistics from one recalculation cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecalcStats {
    /// Cells in the affected set (including the edited cell)
    pub affected: usize,
    /// Formula cells evaluated
    pub cells_evaluated: usize,
    /// Cells marked `#CYCLE!`
    pub cycles: usize,
    /// Staged values that are error markers (cycles included)
    pub errors: usize,
    /// Cells whose value or display changed
    pub changed: usize,
}

/// New value and display of one cell
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CellUpdate {
    pub value: CellValue,
    pub display: String,
}

impl From<Evaluated> for CellUpdate {
    fn from(evaluated: Evaluated) -> Self {
        Self {
            value: evaluated.value,
            display: evaluated.display,
        }
    }
}

/// The committed changes of one cycle, in evaluation order
///
/// Serializes as `{"A1": {"value": ..., "display": ...}, ...}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecalcBatch {
    updates: Vec<(CellAddress, CellUpdate)>,
}

impl RecalcBatch {
    /// Look up the update for an A1-style address
    pub fn get(&self, address: &str) -> Option<&CellUpdate> {
        let address = CellAddress::parse(address).ok()?;
        self.get_at(address)
    }

    /// Look up the update for an address
    pub fn get_at(&self, address: CellAddress) -> Option<&CellUpdate> {
        self.updates
            .iter()
            .find(|(a, _)| *a == address)
            .map(|(_, update)| update)
    }

    /// Number of changed cells
    pub fn len(&self) -> usize {
        self.updates.len()
    }

    /// Check if nothing changed
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Iterate over the updates in evaluation order
    pub fn iter(&self) -> impl Iterator<Item = (&CellAddress, &CellUpdate)> {
        self.updates.iter().map(|(a, u)| (a, u))
    }

    /// Changed addresses in evaluation order
    pub fn addresses(&self) -> Vec<CellAddress> {
        self.updates.iter().map(|(a, _)| *a).collect()
    }

    fn push(&mut self, address: CellAddress, update: CellUpdate) {
        self.updates.push((address, update));
    }
}

impl Serialize for RecalcBatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.updates.len()))?;
        for (address, update) in &self.updates {
            map.serialize_entry(address, update)?;
        }
        map.end()
    }
}

/// Receives every non-empty batch a workbook commits
pub trait BatchSink {
    fn on_batch(&mut self, batch: &RecalcBatch);
}

impl<F> BatchSink for F
where
    F: FnMut(&RecalcBatch),
{
    fn on_batch(&mut self, batch: &RecalcBatch) {
        self(batch)
    }
}

/// Order `affected` so every cell comes after its in-set precedents (Kahn's algorithm)
///
/// Returns the ordered cells and the cells left over, which sit on or downstream
/// of a cycle.
pub(crate) fn topological_order(
    graph: &DependencyGraph,
    affected: &[CellAddress],
) -> (Vec<CellAddress>, Vec<CellAddress>) {
    let in_set: HashSet<CellAddress> = affected.iter().copied().collect();

    let mut pending: HashMap<CellAddress, usize> = affected
        .iter()
        .map(|&cell| {
            let count = graph
                .precedents(cell)
                .filter(|p| in_set.contains(p))
                .count();
            (cell, count)
        })
        .collect();

    let mut queue: VecDeque<CellAddress> = affected
        .iter()
        .copied()
        .filter(|cell| pending.get(cell) == Some(&0))
        .collect();
    let mut order = Vec::with_capacity(affected.len());

    while let Some(cell) = queue.pop_front() {
        order.push(cell);

        let mut ready: Vec<CellAddress> = graph
            .dependents(cell)
            .filter(|d| in_set.contains(d))
            .collect();
        ready.sort_unstable();

        for dependent in ready {
            if let Some(count) = pending.get_mut(&dependent) {
                *count -= 1;
                if *count == 0 {
                    queue.push_back(dependent);
                }
            }
        }
    }

    let ordered: HashSet<CellAddress> = order.iter().copied().collect();
    let leftover = affected
        .iter()
        .copied()
        .filter(|cell| !ordered.contains(cell))
        .collect();

    (order, leftover)
}

/// State of one recalculation cycle
pub(crate) struct RecalcCycle {
    phase: RecalcPhase,
    staged: HashMap<CellAddress, Evaluated>,
    /// Staging order, which becomes the batch order
    sequence: Vec<CellAddress>,
    stats: RecalcStats,
}

impl RecalcCycle {
    pub(crate) fn begin() -> Self {
        Self {
            phase: RecalcPhase::Idle,
            staged: HashMap::new(),
            sequence: Vec::new(),
            stats: RecalcStats::default(),
        }
    }

    pub(crate) fn enter(&mut self, phase: RecalcPhase) {
        log::trace!("recalc phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    /// Stage a value without touching committed state
    pub(crate) fn stage(&mut self, address: CellAddress, evaluated: Evaluated) {
        if evaluated.value.is_error() {
            self.stats.errors += 1;
        }
        if self.staged.insert(address, evaluated).is_none() {
            self.sequence.push(address);
        }
    }

    /// Put the affected set in evaluation order
    ///
    /// Returns the ordered cells and the cells that can never be ordered.
    pub(crate) fn resolve(
        &mut self,
        graph: &DependencyGraph,
        affected: &[CellAddress],
    ) -> (Vec<CellAddress>, Vec<CellAddress>) {
        debug_assert_eq!(self.phase, RecalcPhase::Resolving);
        self.stats.affected = affected.len();
        topological_order(graph, affected)
    }

    /// Stage `#CYCLE!` for cells on or downstream of a circular reference
    pub(crate) fn mark_cycles(&mut self, cyclic: Vec<CellAddress>) {
        for cell in cyclic {
            log::trace!("{} is on or behind a circular reference", cell);
            self.stats.cycles += 1;
            self.stage(cell, Evaluated::error(CellError::Cycle));
        }
    }

    /// Evaluate the formula cells of `order`, reading staged values first
    pub(crate) fn evaluate(
        &mut self,
        order: &[CellAddress],
        cells: &BTreeMap<CellAddress, CellData>,
        evaluator: &Evaluator,
    ) {
        debug_assert_eq!(self.phase, RecalcPhase::Evaluating);

        for &address in order {
            let Some(formula) = cells.get(&address).and_then(|c| c.formula.as_deref()) else {
                continue;
            };

            let result = {
                let staged = &self.staged;
                let lookup = |a: CellAddress| {
                    staged
                        .get(&a)
                        .map(|e| e.value.clone())
                        .or_else(|| cells.get(&a).map(|c| c.value.clone()))
                        .unwrap_or_default()
                };
                evaluator.evaluate(address, formula, &lookup)
            };

            log::trace!("{} {} => {}", address, formula, result.display);
            self.stats.cells_evaluated += 1;
            self.stage(address, result);
        }
    }

    /// Apply every staged value that differs from the committed one
    pub(crate) fn commit(
        mut self,
        cells: &mut BTreeMap<CellAddress, CellData>,
    ) -> (RecalcBatch, RecalcStats) {
        self.enter(RecalcPhase::Committing);
        let mut batch = RecalcBatch::default();

        for address in std::mem::take(&mut self.sequence) {
            let Some(new) = self.staged.remove(&address) else {
                continue;
            };
            let cell = cells.entry(address).or_default();
            if cell.value == new.value && cell.display == new.display {
                continue;
            }
            cell.value = new.value.clone();
            cell.display = new.display.clone();
            batch.push(address, new.into());
        }

        self.stats.changed = batch.len();
        self.enter(RecalcPhase::Idle);
        (batch, self.stats)
    }
}
