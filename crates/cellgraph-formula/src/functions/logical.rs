//! Logical functions

use crate::error::FormulaResult;
use crate::evaluator::{EvaluationContext, FormulaValue};
use cellgraph_core::CellError;

/// IF(condition, if_true, [if_false])
pub fn fn_if(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let (Some(condition), Some(if_true)) = (args.first(), args.get(1)) else {
        return Ok(FormulaValue::Error(CellError::Value));
    };
    let if_false = args.get(2);

    if let Some(e) = condition.get_error() {
        return Ok(FormulaValue::Error(e));
    }
    let Some(condition) = condition.as_bool() else {
        return Ok(FormulaValue::Error(CellError::Value));
    };

    if condition {
        Ok(if_true.clone())
    } else {
        Ok(if_false.cloned().unwrap_or(FormulaValue::Boolean(false)))
    }
}

/// Fold the truthiness of every argument (ranges expanded); errors propagate
fn fold_truth(args: &[FormulaValue], init: bool, f: fn(bool, bool) -> bool) -> FormulaValue {
    let mut acc = init;

    for arg in args {
        let values = match arg {
            FormulaValue::Range(values) => values.as_slice(),
            other => std::slice::from_ref(other),
        };
        for value in values {
            match value {
                FormulaValue::Error(e) => return FormulaValue::Error(*e),
                other => {
                    if let Some(b) = other.as_bool() {
                        acc = f(acc, b);
                    }
                }
            }
        }
    }

    FormulaValue::Boolean(acc)
}

/// AND function
pub fn fn_and(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(fold_truth(args, true, |acc, b| acc && b))
}

/// OR function
pub fn fn_or(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    Ok(fold_truth(args, false, |acc, b| acc || b))
}

/// NOT function
pub fn fn_not(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    match args.first() {
        Some(FormulaValue::Error(e)) => Ok(FormulaValue::Error(*e)),
        Some(arg) => Ok(arg
            .as_bool()
            .map_or(FormulaValue::Error(CellError::Value), |b| {
                FormulaValue::Boolean(!b)
            })),
        None => Ok(FormulaValue::Error(CellError::Value)),
    }
}

/// IFERROR(value, value_if_error) - Returns value_if_error if value is an error, otherwise returns value
pub fn fn_iferror(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    match (args.first(), args.get(1)) {
        (Some(FormulaValue::Error(_)), Some(fallback)) => Ok(fallback.clone()),
        (Some(value), Some(_)) => Ok(value.clone()),
        _ => Ok(FormulaValue::Error(CellError::Value)),
    }
}
