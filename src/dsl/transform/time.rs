use crate::dsl::ast::{TimeExpr, TimeExprKind, TimeOp};
use crate::error::TransformError;

/// Evaluate a time expression to seconds.
///
/// `previous_end` is the end of the previous event on the same timeline;
/// relative literals (`+2s`) are offsets from it.
pub fn evaluate_time(expr: &TimeExpr, previous_end: f64) -> Result<f64, TransformError> {
    match &expr.kind {
        TimeExprKind::Literal { value, unit } => Ok(unit.to_seconds(*value)),
        TimeExprKind::Relative { value, unit } => Ok(previous_end + unit.to_seconds(*value)),
        TimeExprKind::Binary { op, left, right } => {
            let l = evaluate_time(left, previous_end)?;
            let r = evaluate_time(right, previous_end)?;
            match op {
                TimeOp::Add => Ok(l + r),
                TimeOp::Sub => Ok(l - r),
                TimeOp::Mul => Ok(l * r),
                TimeOp::Div if r == 0.0 => Err(TransformError::invalid_expression(
                    "Division by zero in time expression",
                    expr.location,
                )),
                TimeOp::Div => Ok(l / r),
            }
        }
        TimeExprKind::Reference { name } => Err(TransformError::invalid_expression(
            format!("Variable '{name}' cannot be used as a time; time expressions must be literals"),
            expr.location,
        )),
    }
}

/// Length of a `for <duration>` clause. Relative markers carry no meaning
/// here, so the magnitude is used as is.
pub fn evaluate_duration(expr: &TimeExpr) -> Result<f64, TransformError> {
    let seconds = evaluate_time(expr, 0.0)?;
    if seconds < 0.0 || !seconds.is_finite() {
        return Err(TransformError::invalid_event(
            format!("Duration must be a non-negative time, got {seconds}s"),
            expr.location,
        ));
    }
    Ok(seconds)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn time(value: Value) -> TimeExpr {
        serde_json::from_value(value).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn units_normalize_to_seconds() {
        let cases = [("ms", 1500.0, 1.5), ("s", 2.0, 2.0), ("m", 1.5, 90.0), ("h", 1.0, 3600.0)];
        for (unit, value, expected) in cases {
            let t = time(json!({ "$type": "Literal", "value": value, "unit": unit }));
            assert!(close(evaluate_time(&t, 0.0).unwrap(), expected), "{unit}");
        }
    }

    #[test]
    fn relative_times_offset_previous_end() {
        let t = time(json!({ "$type": "Relative", "value": 2 }));
        assert!(close(evaluate_time(&t, 5.0).unwrap(), 7.0));
    }

    #[test]
    fn binary_time_arithmetic() {
        let t = time(json!({
            "$type": "Binary", "op": "+",
            "left": { "$type": "Literal", "value": 1, "unit": "s" },
            "right": { "$type": "Literal", "value": 500, "unit": "ms" }
        }));
        assert!(close(evaluate_time(&t, 0.0).unwrap(), 1.5));

        let div = time(json!({
            "$type": "Binary", "op": "/",
            "left": { "$type": "Literal", "value": 1 },
            "right": { "$type": "Literal", "value": 0 }
        }));
        assert!(matches!(
            evaluate_time(&div, 0.0),
            Err(TransformError::InvalidExpression { .. })
        ));
    }

    #[test]
    fn references_are_rejected() {
        let t = time(json!({ "$type": "Reference", "name": "start", "location": { "line": 9, "column": 4 } }));
        let err = evaluate_time(&t, 0.0).unwrap_err();
        assert_eq!(err.location().line, 9);
        assert!(err.to_string().contains("'start'"));
    }

    #[test]
    fn negative_durations_are_invalid_events() {
        let t = time(json!({ "$type": "Literal", "value": -1 }));
        assert!(matches!(evaluate_duration(&t), Err(TransformError::InvalidEvent { .. })));
    }
}
