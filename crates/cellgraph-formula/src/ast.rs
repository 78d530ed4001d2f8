//! Formula Abstract Syntax Tree types

use cellgraph_core::{CellAddress, CellError, CellRange};

/// Deepest expression tree the parser builds and the evaluator walks
pub const MAX_EXPR_DEPTH: usize = 256;

/// Formula expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaExpr {
    // === Literals ===
    /// Numeric literal
    Number(f64),
    /// String literal
    String(String),
    /// Boolean literal
    Boolean(bool),
    /// Error literal
    Error(CellError),

    // === References ===
    /// Single cell reference
    CellRef(CellAddress),
    /// Range reference
    RangeRef(CellRange),
    /// Bare identifier that is neither a reference nor a function call
    NameRef(String),

    // === Operators ===
    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<FormulaExpr>,
        right: Box<FormulaExpr>,
    },
    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<FormulaExpr>,
    },

    // === Function call ===
    Function {
        name: String,
        args: Vec<FormulaExpr>,
    },
}

impl FormulaExpr {
    /// Height of the expression tree; a literal or reference has depth 1
    ///
    /// Walks with an explicit stack so that arbitrarily deep trees are safe to measure.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1)];

        while let Some((expr, level)) = stack.pop() {
            deepest = deepest.max(level);
            match expr {
                FormulaExpr::BinaryOp { left, right, .. } => {
                    stack.push((left, level + 1));
                    stack.push((right, level + 1));
                }
                FormulaExpr::UnaryOp { operand, .. } => stack.push((operand, level + 1)),
                FormulaExpr::Function { args, .. } => {
                    stack.extend(args.iter().map(|arg| (arg, level + 1)));
                }
                _ => {}
            }
        }

        deepest
    }

    /// Visit every cell and range reference in the expression, depth first
    pub fn for_each_reference<F>(&self, f: &mut F)
    where
        F: FnMut(Reference<'_>),
    {
        match self {
            FormulaExpr::CellRef(addr) => f(Reference::Cell(addr)),
            FormulaExpr::RangeRef(range) => f(Reference::Range(range)),
            FormulaExpr::BinaryOp { left, right, .. } => {
                left.for_each_reference(f);
                right.for_each_reference(f);
            }
            FormulaExpr::UnaryOp { operand, .. } => operand.for_each_reference(f),
            FormulaExpr::Function { args, .. } => {
                for arg in args {
                    arg.for_each_reference(f);
                }
            }
            // Literals have no references
            FormulaExpr::Number(_)
            | FormulaExpr::String(_)
            | FormulaExpr::Boolean(_)
            | FormulaExpr::Error(_)
            | FormulaExpr::NameRef(_) => {}
        }
    }
}

/// A reference found while walking an expression
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reference<'a> {
    Cell(&'a CellAddress),
    Range(&'a CellRange),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,

    // Text
    Concat,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Percent,
}
