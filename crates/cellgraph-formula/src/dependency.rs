//! Dependency tracking for formula calculation

use ahash::{AHashMap, AHashSet};
use cellgraph_core::CellAddress;
use std::collections::VecDeque;

/// Dependency graph for formula cells
///
/// Tracks which cells depend on which other cells, enabling targeted
/// recalculation. The two maps are always mutual inverses: `b` is in
/// `dependents[a]` exactly when `a` is in `precedents[b]`. Cycles are stored
/// like any other edge; traversals are guarded by visited sets.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Cell → Cells that read it (forward edges)
    dependents: AHashMap<CellAddress, AHashSet<CellAddress>>,
    /// Cell → Cells it reads (reverse edges)
    precedents: AHashMap<CellAddress, AHashSet<CellAddress>>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the precedents of `cell` with `precedents`
    ///
    /// Edges from the previous registration that are not in the new set are
    /// removed. Registering the same set twice leaves the graph unchanged.
    pub fn register<I>(&mut self, cell: CellAddress, precedents: I)
    where
        I: IntoIterator<Item = CellAddress>,
    {
        let new: AHashSet<CellAddress> = precedents.into_iter().collect();

        // Drop stale forward edges
        if let Some(old) = self.precedents.remove(&cell) {
            for precedent in old.difference(&new) {
                self.unlink(*precedent, cell);
            }
        }

        for precedent in &new {
            self.dependents.entry(*precedent).or_default().insert(cell);
        }

        if !new.is_empty() {
            self.precedents.insert(cell, new);
        }
    }

    /// Remove every precedent edge of `cell` (it no longer holds a formula)
    ///
    /// Cells that read `cell` keep their edges to it.
    pub fn clear(&mut self, cell: CellAddress) {
        self.register(cell, std::iter::empty());
    }

    fn unlink(&mut self, precedent: CellAddress, dependent: CellAddress) {
        if let Some(deps) = self.dependents.get_mut(&precedent) {
            deps.remove(&dependent);
            if deps.is_empty() {
                self.dependents.remove(&precedent);
            }
        }
    }

    /// Get cells that directly depend on the given cell
    pub fn dependents(&self, cell: CellAddress) -> impl Iterator<Item = CellAddress> + '_ {
        self.dependents
            .get(&cell)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Get cells that the given cell directly depends on
    pub fn precedents(&self, cell: CellAddress) -> impl Iterator<Item = CellAddress> + '_ {
        self.precedents
            .get(&cell)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Every cell transitively reachable from `changed` over dependent edges
    ///
    /// Breadth-first from the direct dependents of `changed`. `changed` itself is
    /// only included when it reaches itself through a cycle.
    pub fn affected_closure(&self, changed: CellAddress) -> Vec<CellAddress> {
        let mut result = Vec::new();
        let mut visited = AHashSet::new();
        let mut queue: VecDeque<CellAddress> = self.dependents(changed).collect();

        while let Some(cell) = queue.pop_front() {
            if !visited.insert(cell) {
                continue;
            }
            result.push(cell);
            queue.extend(self.dependents(cell).filter(|d| !visited.contains(d)));
        }

        result
    }

    /// Detect whether `cell` participates in a circular reference
    pub fn contains_cycle_through(&self, cell: CellAddress) -> bool {
        self.affected_closure(cell).contains(&cell)
    }

    /// Number of precedent edges in the graph
    pub fn edge_count(&self) -> usize {
        self.precedents.values().map(|set| set.len()).sum()
    }

    /// Check if the graph has no edges
    pub fn is_empty(&self) -> bool {
        self.precedents.is_empty() && self.dependents.is_empty()
    }

    /// Clear the entire graph
    pub fn reset(&mut self) {
        self.dependents.clear();
        self.precedents.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn addr(s: &str) -> CellAddress {
        CellAddress::parse(s).unwrap()
    }

    fn sorted<I: IntoIterator<Item = CellAddress>>(cells: I) -> Vec<CellAddress> {
        let mut v: Vec<_> = cells.into_iter().collect();
        v.sort();
        v
    }

    /// Forward and reverse maps describe the same edge set, with no empty entries
    fn assert_inverse(graph: &DependencyGraph) {
        for (dependent, precs) in &graph.precedents {
            assert!(!precs.is_empty());
            for p in precs {
                assert!(graph.dependents[p].contains(dependent));
            }
        }
        for (precedent, deps) in &graph.dependents {
            assert!(!deps.is_empty());
            for d in deps {
                assert!(graph.precedents[d].contains(precedent));
            }
        }
    }

    #[test]
    fn test_register() {
        let mut graph = DependencyGraph::new();
        graph.register(addr("B1"), [addr("A1")]);

        assert_eq!(sorted(graph.dependents(addr("A1"))), vec![addr("B1")]);
        assert_eq!(sorted(graph.precedents(addr("B1"))), vec![addr("A1")]);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut graph = DependencyGraph::new();
        graph.register(addr("C1"), [addr("A1"), addr("B1")]);
        let before = format!("{:?}", sorted(graph.precedents(addr("C1"))));

        graph.register(addr("C1"), [addr("B1"), addr("A1"), addr("A1")]);

        assert_eq!(format!("{:?}", sorted(graph.precedents(addr("C1")))), before);
        assert_eq!(graph.edge_count(), 2);
        assert_inverse(&graph);
    }

    #[test]
    fn test_reregister_drops_stale_edges() {
        let mut graph = DependencyGraph::new();
        graph.register(addr("B1"), [addr("A1")]);
        graph.register(addr("B1"), [addr("C1")]);

        assert_eq!(graph.dependents(addr("A1")).count(), 0);
        assert_eq!(sorted(graph.dependents(addr("C1"))), vec![addr("B1")]);
        assert_inverse(&graph);
    }

    #[test]
    fn test_clear_keeps_incoming_edges() {
        let mut graph = DependencyGraph::new();
        graph.register(addr("B1"), [addr("A1")]);
        graph.register(addr("C1"), [addr("B1")]);

        graph.clear(addr("B1"));

        assert_eq!(graph.dependents(addr("A1")).count(), 0);
        assert_eq!(sorted(graph.dependents(addr("B1"))), vec![addr("C1")]);
        assert_inverse(&graph);

        graph.clear(addr("C1"));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_affected_closure_multi_hop() {
        let mut graph = DependencyGraph::new();
        graph.register(addr("B1"), [addr("A1")]);
        graph.register(addr("C1"), [addr("B1")]);
        graph.register(addr("D1"), [addr("A1"), addr("C1")]);

        let closure = graph.affected_closure(addr("A1"));
        assert_eq!(
            sorted(closure.iter().copied()),
            vec![addr("B1"), addr("C1"), addr("D1")]
        );
        // Breadth first: direct dependents come before C1
        assert_eq!(closure.last(), Some(&addr("C1")));
        assert!(!closure.contains(&addr("A1")));
    }

    #[test]
    fn test_circular_reference() {
        let mut graph = DependencyGraph::new();
        graph.register(addr("A1"), [addr("B1")]);
        graph.register(addr("B1"), [addr("A1")]);
        graph.register(addr("C1"), [addr("A1")]);

        assert!(graph.contains_cycle_through(addr("A1")));
        assert!(graph.contains_cycle_through(addr("B1")));
        assert!(!graph.contains_cycle_through(addr("C1")));

        let closure = graph.affected_closure(addr("A1"));
        assert_eq!(
            sorted(closure),
            vec![addr("A1"), addr("B1"), addr("C1")]
        );
    }

    #[test]
    fn test_self_reference() {
        let mut graph = DependencyGraph::new();
        graph.register(addr("A1"), [addr("A1")]);

        assert!(graph.contains_cycle_through(addr("A1")));
        assert_eq!(graph.affected_closure(addr("A1")), vec![addr("A1")]);
    }

    #[test]
    fn test_reset() {
        let mut graph = DependencyGraph::new();
        graph.register(addr("B1"), [addr("A1")]);
        graph.reset();
        assert!(graph.is_empty());
        assert_eq!(graph.edge_count(), 0);
    }

    fn small_addr() -> impl Strategy<Value = CellAddress> {
        (0u32..6, 0u32..4).prop_map(|(r, c)| CellAddress::new(r, c))
    }

    proptest! {
        #[test]
        fn prop_register_keeps_maps_inverse(
            ops in prop::collection::vec(
                (small_addr(), prop::collection::vec(small_addr(), 0..5)),
                0..40,
            )
        ) {
            let mut graph = DependencyGraph::new();
            for (cell, precs) in &ops {
                graph.register(*cell, precs.iter().copied());
                assert_inverse(&graph);
            }

            // Clearing every cell leaves nothing behind
            for (cell, _) in &ops {
                graph.clear(*cell);
            }
            prop_assert!(graph.is_empty());
        }

        #[test]
        fn prop_last_registration_wins(
            cell in small_addr(),
            first in prop::collection::vec(small_addr(), 0..5),
            second in prop::collection::vec(small_addr(), 0..5),
        ) {
            let mut graph = DependencyGraph::new();
            graph.register(cell, first);
            graph.register(cell, second.clone());

            let mut expected = second;
            expected.sort();
            expected.dedup();
            prop_assert_eq!(sorted(graph.precedents(cell)), expected);
        }
    }
}
