//! Text functions

use crate::error::FormulaResult;
use crate::evaluator::{EvaluationContext, FormulaValue};
use cellgraph_core::CellError;

/// CONCATENATE(text1, [text2], ...)
pub fn fn_concatenate(
    args: &[FormulaValue],
    _ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let mut result = String::new();

    for arg in args {
        match arg {
            FormulaValue::Error(e) => return Ok(FormulaValue::Error(*e)),
            FormulaValue::Range(_) => return Ok(FormulaValue::Error(CellError::Value)),
            other => result.push_str(&other.as_string()),
        }
    }

    Ok(FormulaValue::String(result))
}

#[cfg(test)]
mod tests {
    use crate::evaluator::Evaluator;
    use cellgraph_core::{CellAddress, CellError, CellValue};

    fn eval(formula: &str) -> CellValue {
        let lookup = |_: CellAddress| CellValue::Number(2.5);
        Evaluator::new()
            .evaluate(CellAddress::new(0, 0), formula, &lookup)
            .value
    }

    #[test]
    fn test_concatenate() {
        assert_eq!(
            eval("=CONCATENATE(\"a\",1,TRUE,B2)"),
            CellValue::text("a1TRUE2.5")
        );
        assert_eq!(
            eval("=CONCATENATE(\"a\",1/0)"),
            CellValue::Error(CellError::Div0)
        );
        assert_eq!(
            eval("=CONCATENATE(B1:B2)"),
            CellValue::Error(CellError::Value)
        );
    }
}
