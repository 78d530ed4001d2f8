//! Formula evaluator
//!
//! Evaluates formula ASTs to produce values. Cell contents are read through a
//! [`CellLookup`], so the evaluator never owns or mutates cell storage.
//!
//! Reference coercion: a single-cell reference yields its number, numeric text is
//! coerced, booleans count as 1/0, errors propagate, and anything else (empty,
//! missing, non-numeric text) reads as 0. Inside a range only the numeric values
//! are kept.

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator, MAX_EXPR_DEPTH};
use crate::error::{FormulaError, FormulaResult};
use crate::functions::FunctionRegistry;
use crate::parser::parse_formula;
use crate::precedents::DEFAULT_MAX_RANGE_CELLS;
use cellgraph_core::{format_number, CellAddress, CellError, CellRange, CellValue};

/// Read access to committed (or in-progress) cell values
pub trait CellLookup {
    /// Current value of a cell; cells that were never written are `Empty`
    fn value(&self, address: CellAddress) -> CellValue;
}

impl<F> CellLookup for F
where
    F: Fn(CellAddress) -> CellValue,
{
    fn value(&self, address: CellAddress) -> CellValue {
        self(address)
    }
}

/// Value types during formula evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaValue {
    Number(f64),
    String(String),
    Boolean(bool),
    Error(CellError),
    /// Values of a range reference, row by row (only numbers and errors)
    Range(Vec<FormulaValue>),
}

impl FormulaValue {
    /// Convert to number, if possible
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FormulaValue::Number(n) => Some(*n),
            FormulaValue::Boolean(true) => Some(1.0),
            FormulaValue::Boolean(false) => Some(0.0),
            FormulaValue::String(s) => CellValue::text(s.as_str()).as_number(),
            _ => None,
        }
    }

    /// Force conversion to number for arithmetic
    pub fn to_number(&self) -> FormulaResult<f64> {
        self.as_number().ok_or_else(|| {
            FormulaError::Evaluation(format!("Cannot convert {} to number", self.as_string()))
        })
    }

    /// Convert to boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FormulaValue::Boolean(b) => Some(*b),
            FormulaValue::Number(n) => Some(*n != 0.0),
            FormulaValue::String(s) => {
                let upper = s.to_uppercase();
                if upper == "TRUE" {
                    Some(true)
                } else if upper == "FALSE" {
                    Some(false)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Convert to string
    pub fn as_string(&self) -> String {
        match self {
            FormulaValue::Number(n) => format_number(*n),
            FormulaValue::String(s) => s.clone(),
            FormulaValue::Boolean(true) => "TRUE".to_string(),
            FormulaValue::Boolean(false) => "FALSE".to_string(),
            FormulaValue::Error(e) => e.to_string(),
            FormulaValue::Range(_) => CellError::Value.to_string(),
        }
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        matches!(self, FormulaValue::Error(_))
    }

    /// Get the error if this is one
    pub fn get_error(&self) -> Option<CellError> {
        match self {
            FormulaValue::Error(e) => Some(*e),
            _ => None,
        }
    }
}

impl From<FormulaValue> for CellValue {
    fn from(value: FormulaValue) -> Self {
        match value {
            FormulaValue::Number(n) if !n.is_finite() => CellValue::Error(CellError::Num),
            // Adding 0 turns -0 into 0
            FormulaValue::Number(n) => CellValue::Number(n + 0.0),
            FormulaValue::String(s) => CellValue::Text(s),
            FormulaValue::Boolean(b) => CellValue::Boolean(b),
            FormulaValue::Error(e) => CellValue::Error(e),
            // A bare range is not a single value
            FormulaValue::Range(_) => CellValue::Error(CellError::Value),
        }
    }
}

/// Context for formula evaluation
pub struct EvaluationContext<'a> {
    /// Cell whose formula is being evaluated
    pub current: CellAddress,
    lookup: &'a dyn CellLookup,
    registry: &'a FunctionRegistry,
    max_range_cells: u64,
}

impl<'a> EvaluationContext<'a> {
    /// Create a new evaluation context
    pub fn new(
        current: CellAddress,
        lookup: &'a dyn CellLookup,
        registry: &'a FunctionRegistry,
    ) -> Self {
        Self {
            current,
            lookup,
            registry,
            max_range_cells: DEFAULT_MAX_RANGE_CELLS,
        }
    }

    /// Limit the size of ranges that may be read
    pub fn with_max_range_cells(mut self, max_range_cells: u64) -> Self {
        self.max_range_cells = max_range_cells;
        self
    }

    /// The functions available to this evaluation
    pub fn registry(&self) -> &FunctionRegistry {
        self.registry
    }

    /// Get a single cell's value with reference coercion applied
    pub fn get_cell_value(&self, address: CellAddress) -> FormulaValue {
        match self.lookup.value(address) {
            CellValue::Error(e) => FormulaValue::Error(e),
            other => FormulaValue::Number(other.as_number().unwrap_or(0.0)),
        }
    }

    /// Get the numeric values (and errors) of a range
    pub fn get_range_values(&self, range: &CellRange) -> FormulaValue {
        if range.cell_count() > self.max_range_cells {
            log::warn!(
                "{}: range {} exceeds {} cells",
                self.current,
                range,
                self.max_range_cells
            );
            return FormulaValue::Error(CellError::Ref);
        }

        let values = range
            .cells()
            .filter_map(|address| match self.lookup.value(address) {
                CellValue::Error(e) => Some(FormulaValue::Error(e)),
                other => other.as_number().map(FormulaValue::Number),
            })
            .collect();

        FormulaValue::Range(values)
    }
}

/// Evaluate a formula expression
///
/// Recurses once per tree level. Trees from [`parse_formula`] are at most
/// [`MAX_EXPR_DEPTH`] deep; [`Evaluator::evaluate_expr`] checks hand-built ones.
pub fn evaluate(expr: &FormulaExpr, ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    match expr {
        // === Literals ===
        FormulaExpr::Number(n) => Ok(FormulaValue::Number(*n)),
        FormulaExpr::String(s) => Ok(FormulaValue::String(s.clone())),
        FormulaExpr::Boolean(b) => Ok(FormulaValue::Boolean(*b)),
        FormulaExpr::Error(e) => Ok(FormulaValue::Error(*e)),

        // === References ===
        FormulaExpr::CellRef(address) => Ok(ctx.get_cell_value(*address)),
        FormulaExpr::RangeRef(range) => Ok(ctx.get_range_values(range)),
        FormulaExpr::NameRef(name) => {
            log::trace!("{}: unknown name '{}'", ctx.current, name);
            Ok(FormulaValue::Error(CellError::Name))
        }

        // === Operators ===
        FormulaExpr::BinaryOp { op, left, right } => evaluate_binary_op(*op, left, right, ctx),

        FormulaExpr::UnaryOp { op, operand } => evaluate_unary_op(*op, operand, ctx),

        // === Functions ===
        FormulaExpr::Function { name, args } => evaluate_function(name, args, ctx),
    }
}

/// Evaluate a binary operation
fn evaluate_binary_op(
    op: BinaryOperator,
    left: &FormulaExpr,
    right: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    // Evaluate operands first
    let left_val = evaluate(left, ctx)?;
    let right_val = evaluate(right, ctx)?;

    // Propagate errors
    if let Some(e) = left_val.get_error() {
        return Ok(FormulaValue::Error(e));
    }
    if let Some(e) = right_val.get_error() {
        return Ok(FormulaValue::Error(e));
    }

    // Operators only apply to single values
    if matches!(left_val, FormulaValue::Range(_)) || matches!(right_val, FormulaValue::Range(_)) {
        return Ok(FormulaValue::Error(CellError::Value));
    }

    match op {
        // Arithmetic operators
        BinaryOperator::Add => arithmetic(&left_val, &right_val, |l, r| l + r),
        BinaryOperator::Subtract => arithmetic(&left_val, &right_val, |l, r| l - r),
        BinaryOperator::Multiply => arithmetic(&left_val, &right_val, |l, r| l * r),
        BinaryOperator::Divide => {
            let l = left_val.to_number()?;
            let r = right_val.to_number()?;
            if r == 0.0 {
                Ok(FormulaValue::Error(CellError::Div0))
            } else {
                Ok(FormulaValue::Number(l / r))
            }
        }
        BinaryOperator::Power => arithmetic(&left_val, &right_val, f64::powf),

        // Comparison operators
        BinaryOperator::Equal => Ok(FormulaValue::Boolean(
            compare_values(&left_val, &right_val) == 0,
        )),
        BinaryOperator::NotEqual => Ok(FormulaValue::Boolean(
            compare_values(&left_val, &right_val) != 0,
        )),
        BinaryOperator::LessThan => Ok(FormulaValue::Boolean(
            compare_values(&left_val, &right_val) < 0,
        )),
        BinaryOperator::LessEqual => Ok(FormulaValue::Boolean(
            compare_values(&left_val, &right_val) <= 0,
        )),
        BinaryOperator::GreaterThan => Ok(FormulaValue::Boolean(
            compare_values(&left_val, &right_val) > 0,
        )),
        BinaryOperator::GreaterEqual => Ok(FormulaValue::Boolean(
            compare_values(&left_val, &right_val) >= 0,
        )),

        // Concatenation
        BinaryOperator::Concat => {
            let l = left_val.as_string();
            let r = right_val.as_string();
            Ok(FormulaValue::String(l + &r))
        }
    }
}

/// Apply a numeric operator, turning non-finite results into `#NUM!`
fn arithmetic(
    left: &FormulaValue,
    right: &FormulaValue,
    op: impl Fn(f64, f64) -> f64,
) -> FormulaResult<FormulaValue> {
    let result = op(left.to_number()?, right.to_number()?);
    if result.is_finite() {
        Ok(FormulaValue::Number(result))
    } else {
        Ok(FormulaValue::Error(CellError::Num))
    }
}

/// Compare two values for ordering
fn compare_values(left: &FormulaValue, right: &FormulaValue) -> i32 {
    match (left, right) {
        // Numbers compare numerically
        (FormulaValue::Number(l), FormulaValue::Number(r)) => {
            if l < r {
                -1
            } else if l > r {
                1
            } else {
                0
            }
        }

        // Strings compare case-insensitively
        (FormulaValue::String(l), FormulaValue::String(r)) => {
            l.to_lowercase().cmp(&r.to_lowercase()) as i32
        }

        // Booleans: FALSE < TRUE
        (FormulaValue::Boolean(l), FormulaValue::Boolean(r)) => (*l as i32) - (*r as i32),

        // Mixed types: number < string < boolean
        (FormulaValue::Number(_), FormulaValue::String(_)) => -1,
        (FormulaValue::String(_), FormulaValue::Number(_)) => 1,
        (FormulaValue::Number(_), FormulaValue::Boolean(_)) => -1,
        (FormulaValue::Boolean(_), FormulaValue::Number(_)) => 1,
        (FormulaValue::String(_), FormulaValue::Boolean(_)) => -1,
        (FormulaValue::Boolean(_), FormulaValue::String(_)) => 1,

        // Other cases
        _ => 0,
    }
}

/// Evaluate a unary operation
fn evaluate_unary_op(
    op: UnaryOperator,
    operand: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let val = evaluate(operand, ctx)?;

    // Propagate errors
    if let Some(e) = val.get_error() {
        return Ok(FormulaValue::Error(e));
    }

    match op {
        UnaryOperator::Negate => Ok(FormulaValue::Number(-val.to_number()?)),
        UnaryOperator::Percent => Ok(FormulaValue::Number(val.to_number()? / 100.0)),
    }
}

/// Evaluate a function call
fn evaluate_function(
    name: &str,
    args: &[FormulaExpr],
    ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let func = ctx
        .registry()
        .get(name)
        .ok_or_else(|| FormulaError::UnknownFunction(name.to_string()))?;

    // Check argument count
    if args.len() < func.min_args {
        return Err(FormulaError::ArgumentCount {
            function: name.to_string(),
            expected: format!("at least {}", func.min_args),
            actual: args.len(),
        });
    }

    if let Some(max) = func.max_args {
        if args.len() > max {
            return Err(FormulaError::ArgumentCount {
                function: name.to_string(),
                expected: format!("at most {}", max),
                actual: args.len(),
            });
        }
    }

    // Evaluate arguments; a failing argument becomes an error value so that
    // functions like IFERROR can observe it
    let evaluated_args: Vec<FormulaValue> = args
        .iter()
        .map(|arg| evaluate(arg, ctx).unwrap_or_else(|e| FormulaValue::Error(e.to_cell_error())))
        .collect();

    // Call the function
    (func.implementation)(&evaluated_args, ctx)
}

/// Result of evaluating one formula cell
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluated {
    /// Computed value (errors included as markers)
    pub value: CellValue,
    /// String shown in the grid
    pub display: String,
}

impl Evaluated {
    fn from_value(value: CellValue) -> Self {
        let display = value.display();
        Self { value, display }
    }

    /// An error marker result
    pub fn error(error: CellError) -> Self {
        Self::from_value(CellValue::Error(error))
    }
}

/// Evaluates formula text against a cell lookup
///
/// Owns its [`FunctionRegistry`]; create one per workbook.
///
/// # Example
/// ```rust
/// use cellgraph_core::{CellAddress, CellValue};
/// use cellgraph_formula::Evaluator;
///
/// let evaluator = Evaluator::new();
/// let lookup = |addr: CellAddress| {
///     if addr == CellAddress::new(0, 0) { CellValue::Number(5.0) } else { CellValue::Empty }
/// };
///
/// let result = evaluator.evaluate(CellAddress::new(0, 1), "=A1*2", &lookup);
/// assert_eq!(result.value, CellValue::Number(10.0));
/// assert_eq!(result.display, "10");
///
/// let result = evaluator.evaluate(CellAddress::new(0, 1), "=(A1", &lookup);
/// assert_eq!(result.display, "#ERROR!");
/// ```
pub struct Evaluator {
    registry: FunctionRegistry,
    max_range_cells: u64,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    /// Create an evaluator with all built-in functions
    pub fn new() -> Self {
        Self::with_registry(FunctionRegistry::new())
    }

    /// Create an evaluator with a custom function registry
    pub fn with_registry(registry: FunctionRegistry) -> Self {
        Self {
            registry,
            max_range_cells: DEFAULT_MAX_RANGE_CELLS,
        }
    }

    /// Limit the size of ranges formulas may read
    pub fn with_max_range_cells(mut self, max_range_cells: u64) -> Self {
        self.max_range_cells = max_range_cells;
        self
    }

    /// The functions this evaluator knows
    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    /// Mutable access for registering additional functions
    pub fn registry_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.registry
    }

    /// Evaluate formula text (with its leading `=`) for the cell at `address`
    ///
    /// Never fails: syntax and evaluation errors come back as error markers.
    pub fn evaluate(
        &self,
        address: CellAddress,
        formula: &str,
        lookup: &dyn CellLookup,
    ) -> Evaluated {
        match parse_formula(formula) {
            Ok(expr) => self.evaluate_expr(address, &expr, lookup),
            Err(e) => {
                log::trace!("{}: {}", address, e);
                Evaluated::error(e.to_cell_error())
            }
        }
    }

    /// Evaluate an already parsed expression for the cell at `address`
    pub fn evaluate_expr(
        &self,
        address: CellAddress,
        expr: &FormulaExpr,
        lookup: &dyn CellLookup,
    ) -> Evaluated {
        if expr.depth() > MAX_EXPR_DEPTH {
            log::warn!("{}: expression is more than {} levels deep", address, MAX_EXPR_DEPTH);
            return Evaluated::error(CellError::Error);
        }

        let ctx = EvaluationContext::new(address, lookup, &self.registry)
            .with_max_range_cells(self.max_range_cells);

        match evaluate(expr, &ctx) {
            Ok(value) => Evaluated::from_value(value.into()),
            Err(e) => {
                log::trace!("{}: {}", address, e);
                Evaluated::error(e.to_cell_error())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn eval(formula: &str) -> CellValue {
        eval_with(formula, &[])
    }

    fn eval_with(formula: &str, cells: &[(&str, CellValue)]) -> CellValue {
        let cells: HashMap<CellAddress, CellValue> = cells
            .iter()
            .map(|(a, v)| (CellAddress::parse(a).unwrap(), v.clone()))
            .collect();
        let lookup = move |addr: CellAddress| cells.get(&addr).cloned().unwrap_or_default();
        Evaluator::new()
            .evaluate(CellAddress::new(99, 0), formula, &lookup)
            .value
    }

    fn num(n: f64) -> CellValue {
        CellValue::Number(n)
    }

    fn err(e: CellError) -> CellValue {
        CellValue::Error(e)
    }

    #[test]
    fn test_evaluate_literals() {
        assert_eq!(eval("=42"), num(42.0));
        assert_eq!(eval("=\"Hello\""), CellValue::text("Hello"));
        assert_eq!(eval("=TRUE"), CellValue::Boolean(true));
        assert_eq!(eval("=#VALUE!"), err(CellError::Value));
    }

    #[test]
    fn test_evaluate_arithmetic() {
        assert_eq!(eval("=1+2"), num(3.0));
        assert_eq!(eval("=10-3"), num(7.0));
        assert_eq!(eval("=4*5"), num(20.0));
        assert_eq!(eval("=20/4"), num(5.0));
        assert_eq!(eval("=2^10"), num(1024.0));
        assert_eq!(eval("=0.1+0.2"), num(0.1 + 0.2));
    }

    #[test]
    fn test_evaluate_precedence() {
        assert_eq!(eval("=1+2*3"), num(7.0));
        assert_eq!(eval("=(1+2)*3"), num(9.0));
        assert_eq!(eval("=2+3*4-5"), num(9.0));
        assert_eq!(eval("=2^3^2"), num(512.0));
    }

    #[test]
    fn test_evaluate_unary() {
        assert_eq!(eval("=-5"), num(-5.0));
        assert_eq!(eval("=50%"), num(0.5));
        assert_eq!(eval("=--5"), num(5.0));
        assert_eq!(eval("=+5"), num(5.0));
    }

    #[test]
    fn test_evaluate_comparison() {
        assert_eq!(eval("=1<2"), CellValue::Boolean(true));
        assert_eq!(eval("=1>2"), CellValue::Boolean(false));
        assert_eq!(eval("=5=5"), CellValue::Boolean(true));
        assert_eq!(eval("=5<>5"), CellValue::Boolean(false));
        assert_eq!(eval("=\"abc\"=\"ABC\""), CellValue::Boolean(true));
    }

    #[test]
    fn test_evaluate_concatenation() {
        assert_eq!(eval("=\"Hello \"&\"World\""), CellValue::text("Hello World"));
        assert_eq!(eval("=\"Value: \"&42"), CellValue::text("Value: 42"));
        assert_eq!(eval("=\"x\"&1.5"), CellValue::text("x1.5"));
    }

    #[test]
    fn test_evaluate_error_markers() {
        assert_eq!(eval("=1/0"), err(CellError::Div0));
        assert_eq!(eval("=(1+2"), err(CellError::Error));
        assert_eq!(eval("=FOO(1)"), err(CellError::Name));
        assert_eq!(eval("=foo"), err(CellError::Name));
        assert_eq!(eval("=ABS(1,2)"), err(CellError::Na));
        assert_eq!(eval("=\"a\"+1"), err(CellError::Value));
        assert_eq!(eval("=10^400"), err(CellError::Num));
        assert_eq!(eval("=A0"), err(CellError::Ref));
    }

    #[test]
    fn test_reference_coercion() {
        let cells = [
            ("A1", num(5.0)),
            ("A2", CellValue::text("7")),
            ("A3", CellValue::text("hello")),
            ("A4", CellValue::Boolean(true)),
            ("A5", err(CellError::Div0)),
        ];
        assert_eq!(eval_with("=A1", &cells), num(5.0));
        assert_eq!(eval_with("=A2*2", &cells), num(14.0));
        assert_eq!(eval_with("=A3+1", &cells), num(1.0));
        assert_eq!(eval_with("=A4+1", &cells), num(2.0));
        assert_eq!(eval_with("=A5+1", &cells), err(CellError::Div0));
        // Empty and never-written cells read as zero
        assert_eq!(eval_with("=Z100+1", &cells), num(1.0));
        assert_eq!(eval_with("=a1+$A$2", &cells), num(12.0));
    }

    #[test]
    fn test_range_arguments() {
        let cells = [
            ("A1", num(1.0)),
            ("A2", CellValue::text("2")),
            ("A3", CellValue::text("skip")),
            ("B1", num(4.0)),
        ];
        assert_eq!(eval_with("=SUM(A1:B3)", &cells), num(7.0));
        assert_eq!(eval_with("=COUNT(A1:B3)", &cells), num(3.0));
        assert_eq!(eval_with("=AVERAGE(A1:A3)", &cells), num(1.5));

        let with_error = [("A1", num(1.0)), ("A2", err(CellError::Value))];
        assert_eq!(eval_with("=SUM(A1:A2)", &with_error), err(CellError::Value));

        // A range is not a scalar
        assert_eq!(eval_with("=A1:A2", &cells), err(CellError::Value));
        assert_eq!(eval_with("=A1:A2+1", &cells), err(CellError::Value));
        assert_eq!(eval_with("=A1:A2=1", &cells), err(CellError::Value));
    }

    #[test]
    fn test_oversized_range() {
        let evaluator = Evaluator::new().with_max_range_cells(4);
        let lookup = |_: CellAddress| CellValue::Number(1.0);
        let result = evaluator.evaluate(CellAddress::new(0, 5), "=SUM(A1:A10)", &lookup);
        assert_eq!(result.value, err(CellError::Ref));
    }

    #[test]
    fn test_display_strings() {
        let evaluator = Evaluator::new();
        let lookup = |_: CellAddress| CellValue::Empty;
        let at = CellAddress::new(0, 0);
        assert_eq!(evaluator.evaluate(at, "=10*2", &lookup).display, "20");
        assert_eq!(evaluator.evaluate(at, "=1/4", &lookup).display, "0.25");
        assert_eq!(evaluator.evaluate(at, "=1>0", &lookup).display, "TRUE");
        assert_eq!(evaluator.evaluate(at, "=1/0", &lookup).display, "#DIV/0!");
        assert_eq!(evaluator.evaluate(at, "=-0", &lookup).display, "0");
    }

    #[test]
    fn test_evaluate_nested_functions() {
        assert_eq!(eval("=SUM(1,MAX(2,3),ABS(-4))"), num(8.0));
        assert_eq!(eval("=IF(SUM(1,2)>2,\"big\",\"small\")"), CellValue::text("big"));
        assert_eq!(eval("=IFERROR(FOO(1),\"fallback\")"), CellValue::text("fallback"));
    }

    #[test]
    fn test_deep_formulas_are_errors() {
        let nested = format!("={}1{}", "(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(eval(&nested), err(CellError::Error));
        assert_eq!(eval(&format!("=1{}", "+1".repeat(200_000))), err(CellError::Error));
        assert_eq!(eval(&format!("=1{}", "+1".repeat(50))), num(51.0));

        // Trees built by hand are measured before walking them
        let mut expr = FormulaExpr::Number(1.0);
        for _ in 0..MAX_EXPR_DEPTH {
            expr = FormulaExpr::UnaryOp {
                op: UnaryOperator::Negate,
                operand: Box::new(expr),
            };
        }
        let lookup = |_: CellAddress| CellValue::Empty;
        let result = Evaluator::new().evaluate_expr(CellAddress::new(0, 0), &expr, &lookup);
        assert_eq!(result.display, "#ERROR!");
    }

    #[test]
    fn test_custom_registry() {
        use crate::functions::FunctionDef;

        fn fn_answer(_args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
            Ok(FormulaValue::Number(42.0))
        }

        let mut evaluator = Evaluator::with_registry(FunctionRegistry::empty());
        let lookup = |_: CellAddress| CellValue::Empty;
        let at = CellAddress::new(0, 0);
        assert_eq!(
            evaluator.evaluate(at, "=SUM(1)", &lookup).value,
            err(CellError::Name)
        );

        evaluator.registry_mut().register(FunctionDef {
            name: "ANSWER",
            min_args: 0,
            max_args: Some(0),
            implementation: fn_answer,
        });
        assert_eq!(evaluator.evaluate(at, "=answer()", &lookup).value, num(42.0));
    }
}
