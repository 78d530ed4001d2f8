//! Built-in spreadsheet functions

pub mod logical;
pub mod math;
pub mod text;

use crate::error::FormulaResult;
use crate::evaluator::{EvaluationContext, FormulaValue};
use cellgraph_core::CellError;
use std::collections::HashMap;

/// Function implementation signature
///
/// Arguments arrive already evaluated; a failing argument is passed as an error value.
pub type FunctionImpl = fn(&[FormulaValue], &EvaluationContext) -> FormulaResult<FormulaValue>;

/// Function definition
pub struct FunctionDef {
    /// Function name (uppercase)
    pub name: &'static str,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Implementation
    pub implementation: FunctionImpl,
}

/// Function registry
pub struct FunctionRegistry {
    functions: HashMap<String, FunctionDef>,
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self::empty();

        registry.register_math_functions();
        registry.register_logical_functions();
        registry.register_text_functions();

        registry
    }

    /// Create a registry with no functions at all
    pub fn empty() -> Self {
        Self {
            functions: HashMap::new(),
        }
    }

    /// Look up a function by name
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(&name.to_uppercase())
    }

    /// Check whether a function is known
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Register a function, replacing any previous definition with the same name
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name.to_uppercase(), def);
    }

    /// Names of all registered functions, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn register_math_functions(&mut self) {
        // Aggregates take any number of values and ranges
        for (name, implementation) in [
            ("SUM", math::fn_sum as FunctionImpl),
            ("AVERAGE", math::fn_average),
            ("MIN", math::fn_min),
            ("MAX", math::fn_max),
            ("COUNT", math::fn_count),
            ("PRODUCT", math::fn_product),
        ] {
            self.register(FunctionDef {
                name,
                min_args: 1,
                max_args: None,
                implementation,
            });
        }

        // ABS
        self.register(FunctionDef {
            name: "ABS",
            min_args: 1,
            max_args: Some(1),
            implementation: math::fn_abs,
        });

        // ROUND
        self.register(FunctionDef {
            name: "ROUND",
            min_args: 1,
            max_args: Some(2),
            implementation: math::fn_round,
        });

        // INT
        self.register(FunctionDef {
            name: "INT",
            min_args: 1,
            max_args: Some(1),
            implementation: math::fn_int,
        });

        // MOD
        self.register(FunctionDef {
            name: "MOD",
            min_args: 2,
            max_args: Some(2),
            implementation: math::fn_mod,
        });

        // SQRT
        self.register(FunctionDef {
            name: "SQRT",
            min_args: 1,
            max_args: Some(1),
            implementation: math::fn_sqrt,
        });

        // POWER
        self.register(FunctionDef {
            name: "POWER",
            min_args: 2,
            max_args: Some(2),
            implementation: math::fn_power,
        });
    }

    fn register_logical_functions(&mut self) {
        // IF
        self.register(FunctionDef {
            name: "IF",
            min_args: 2,
            max_args: Some(3),
            implementation: logical::fn_if,
        });

        // AND
        self.register(FunctionDef {
            name: "AND",
            min_args: 1,
            max_args: None,
            implementation: logical::fn_and,
        });

        // OR
        self.register(FunctionDef {
            name: "OR",
            min_args: 1,
            max_args: None,
            implementation: logical::fn_or,
        });

        // NOT
        self.register(FunctionDef {
            name: "NOT",
            min_args: 1,
            max_args: Some(1),
            implementation: logical::fn_not,
        });

        // IFERROR
        self.register(FunctionDef {
            name: "IFERROR",
            min_args: 2,
            max_args: Some(2),
            implementation: logical::fn_iferror,
        });
    }

    fn register_text_functions(&mut self) {
        // CONCATENATE
        self.register(FunctionDef {
            name: "CONCATENATE",
            min_args: 1,
            max_args: None,
            implementation: text::fn_concatenate,
        });
    }
}

/// Gather every numeric argument, expanding ranges
///
/// Booleans and numeric text count as numbers, other text is ignored, and the
/// first error encountered is returned.
pub(crate) fn collect_numbers(args: &[FormulaValue]) -> Result<Vec<f64>, CellError> {
    let mut numbers = Vec::new();

    for arg in args {
        match arg {
            FormulaValue::Error(e) => return Err(*e),
            FormulaValue::Range(values) => {
                for value in values {
                    match value {
                        FormulaValue::Error(e) => return Err(*e),
                        other => numbers.extend(other.as_number()),
                    }
                }
            }
            other => numbers.extend(other.as_number()),
        }
    }

    Ok(numbers)
}

/// Read a single numeric argument
///
/// Missing arguments, ranges and non-numeric text are `#VALUE!`; errors propagate.
pub(crate) fn scalar_number(arg: Option<&FormulaValue>) -> Result<f64, CellError> {
    match arg {
        Some(FormulaValue::Error(e)) => Err(*e),
        Some(value) => value.as_number().ok_or(CellError::Value),
        None => Err(CellError::Value),
    }
}
