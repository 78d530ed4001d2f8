//! Math functions

use super::{collect_numbers, scalar_number};
use crate::error::FormulaResult;
use crate::evaluator::{EvaluationContext, FormulaValue};
use cellgraph_core::CellError;

/// Unwrap a numeric argument or return its error as the function result
macro_rules! number_or_return {
    ($arg:expr) => {
        match scalar_number($arg) {
            Ok(n) => n,
            Err(e) => return Ok(FormulaValue::Error(e)),
        }
    };
}

/// Like `number_or_return!` for the aggregate argument list
macro_rules! numbers_or_return {
    ($args:expr) => {
        match collect_numbers($args) {
            Ok(numbers) => numbers,
            Err(e) => return Ok(FormulaValue::Error(e)),
        }
    };
}

fn finite(n: f64) -> FormulaValue {
    if n.is_finite() {
        FormulaValue::Number(n)
    } else {
        FormulaValue::Error(CellError::Num)
    }
}

/// SUM function
pub fn fn_sum(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let numbers = numbers_or_return!(args);
    Ok(finite(numbers.iter().fold(0.0, |acc, n| acc + n)))
}

/// AVERAGE function
///
/// `#DIV/0!` when there is nothing numeric to average.
pub fn fn_average(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let numbers = numbers_or_return!(args);

    if numbers.is_empty() {
        Ok(FormulaValue::Error(CellError::Div0))
    } else {
        let total = numbers.iter().fold(0.0, |acc, n| acc + n);
        Ok(finite(total / numbers.len() as f64))
    }
}

/// MIN function (0 when there are no numbers)
pub fn fn_min(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let numbers = numbers_or_return!(args);
    let min = numbers.into_iter().reduce(f64::min);
    Ok(FormulaValue::Number(min.unwrap_or(0.0)))
}

/// MAX function (0 when there are no numbers)
pub fn fn_max(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let numbers = numbers_or_return!(args);
    let max = numbers.into_iter().reduce(f64::max);
    Ok(FormulaValue::Number(max.unwrap_or(0.0)))
}

/// COUNT function
///
/// Counts numeric values; text, booleans and errors are not counted.
pub fn fn_count(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let mut count = 0;

    for arg in args {
        match arg {
            FormulaValue::Number(_) => count += 1,
            FormulaValue::Range(values) => {
                count += values
                    .iter()
                    .filter(|v| matches!(v, FormulaValue::Number(_)))
                    .count();
            }
            _ => {} // Don't count non-numeric
        }
    }

    Ok(FormulaValue::Number(count as f64))
}

/// PRODUCT function
pub fn fn_product(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let numbers = numbers_or_return!(args);
    if numbers.is_empty() {
        return Ok(FormulaValue::Number(0.0));
    }
    Ok(finite(numbers.iter().product()))
}

/// ABS(number)
pub fn fn_abs(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let number = number_or_return!(args.first());
    Ok(FormulaValue::Number(number.abs()))
}

/// ROUND(number, [num_digits]) - Rounds half away from zero
pub fn fn_round(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let number = number_or_return!(args.first());
    let num_digits = match args.get(1) {
        Some(arg) => number_or_return!(Some(arg)).trunc() as i32,
        None => 0,
    };

    let half_away = |n: f64| if n >= 0.0 { (n + 0.5).floor() } else { (n - 0.5).ceil() };

    // For negative digits, we round to the left of the decimal point
    let result = if num_digits >= 0 {
        let multiplier = 10_f64.powi(num_digits);
        half_away(number * multiplier) / multiplier
    } else {
        let divisor = 10_f64.powi(-num_digits);
        half_away(number / divisor) * divisor
    };

    Ok(finite(result))
}

/// INT(number) - Rounds toward negative infinity
pub fn fn_int(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let number = number_or_return!(args.first());
    Ok(FormulaValue::Number(number.floor()))
}

/// MOD(number, divisor) - The result has the sign of the divisor
pub fn fn_mod(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let number = number_or_return!(args.first());
    let divisor = number_or_return!(args.get(1));

    if divisor == 0.0 {
        return Ok(FormulaValue::Error(CellError::Div0));
    }

    Ok(finite(number - divisor * (number / divisor).floor()))
}

/// SQRT(number) - `#NUM!` for negative numbers
pub fn fn_sqrt(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let number = number_or_return!(args.first());
    if number < 0.0 {
        return Ok(FormulaValue::Error(CellError::Num));
    }
    Ok(FormulaValue::Number(number.sqrt()))
}

/// POWER(number, power) - Equivalent to number^power
pub fn fn_power(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let number = number_or_return!(args.first());
    let power = number_or_return!(args.get(1));

    // Cases like 0^(-1) or negative^(non-integer)
    Ok(finite(number.powf(power)))
}
