//! Precedent extraction
//!
//! Finds every cell a formula reads, without evaluating it.

use crate::ast::{FormulaExpr, Reference};
use crate::error::FormulaResult;
use crate::parser::parse_formula;
use cellgraph_core::{CellAddress, CellData};
use std::collections::BTreeSet;

/// Largest range (in cells) expanded into individual precedents by default
pub const DEFAULT_MAX_RANGE_CELLS: u64 = 100_000;

/// Extract the set of cells a formula references
///
/// Input that is not a formula yields an empty set without being parsed.
///
/// # Example
/// ```rust
/// use cellgraph_formula::extract_precedents;
///
/// let refs = extract_precedents("=a1+$B$2*SUM(C1:C2)").unwrap();
/// let names: Vec<String> = refs.iter().map(|a| a.to_string()).collect();
/// // Row by row, then column by column
/// assert_eq!(names, ["A1", "C1", "B2", "C2"]);
///
/// assert!(extract_precedents("hello").unwrap().is_empty());
/// assert!(extract_precedents("=SUM(A1").is_err());
/// ```
pub fn extract_precedents(formula_text: &str) -> FormulaResult<BTreeSet<CellAddress>> {
    extract_precedents_limited(formula_text, DEFAULT_MAX_RANGE_CELLS)
}

/// Like [`extract_precedents`], but ranges larger than `max_range_cells` contribute
/// nothing (they are logged and skipped).
pub fn extract_precedents_limited(
    formula_text: &str,
    max_range_cells: u64,
) -> FormulaResult<BTreeSet<CellAddress>> {
    if !CellData::is_formula_input(formula_text) {
        return Ok(BTreeSet::new());
    }

    let expr = parse_formula(formula_text)?;
    Ok(collect_precedents(&expr, max_range_cells))
}

/// Collect the references of an already parsed expression
pub fn collect_precedents(expr: &FormulaExpr, max_range_cells: u64) -> BTreeSet<CellAddress> {
    let mut refs = BTreeSet::new();

    expr.for_each_reference(&mut |reference| match reference {
        Reference::Cell(addr) => {
            refs.insert(*addr);
        }
        Reference::Range(range) => {
            if range.cell_count() > max_range_cells {
                log::warn!(
                    "Range {} has {} cells (limit {}); not tracked as precedents",
                    range,
                    range.cell_count(),
                    max_range_cells
                );
                return;
            }
            refs.extend(range.cells());
        }
    });

    refs
}
