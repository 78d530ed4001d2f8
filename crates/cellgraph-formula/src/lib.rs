//! # cellgraph-formula
//!
//! Formula parser, dependency graph and evaluator for cellgraph.
//!
//! This crate provides:
//! - Formula parsing (text → AST)
//! - Precedent extraction (text → referenced cells)
//! - Dependency tracking for targeted recalculation
//! - Formula evaluation (AST → value) with a per-evaluator function registry
//!
//! ## Example
//!
//! ```rust
//! use cellgraph_core::{CellAddress, CellValue};
//! use cellgraph_formula::{extract_precedents, DependencyGraph, Evaluator};
//!
//! let b1 = CellAddress::parse("B1").unwrap();
//! let precedents = extract_precedents("=A1*2").unwrap();
//!
//! let mut graph = DependencyGraph::new();
//! graph.register(b1, precedents);
//! assert_eq!(graph.affected_closure(CellAddress::parse("A1").unwrap()), vec![b1]);
//!
//! let lookup = |_: CellAddress| CellValue::Number(21.0);
//! let result = Evaluator::new().evaluate(b1, "=A1*2", &lookup);
//! assert_eq!(result.display, "42");
//! ```

pub mod ast;
pub mod dependency;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod parser;
pub mod precedents;

pub use ast::{BinaryOperator, FormulaExpr, Reference, UnaryOperator, MAX_EXPR_DEPTH};
pub use dependency::DependencyGraph;
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{evaluate, CellLookup, EvaluationContext, Evaluated, Evaluator, FormulaValue};
pub use functions::{FunctionDef, FunctionImpl, FunctionRegistry};
pub use parser::parse_formula;
pub use precedents::{
    collect_precedents, extract_precedents, extract_precedents_limited, DEFAULT_MAX_RANGE_CELLS,
};
