//! Best-effort compile-time evaluation of value expressions.
//!
//! Only literals, folded constants, and operators over them evaluate. Any
//! runtime reference makes the whole expression non-constant, in which case
//! lowering emits a runtime lookup instead.

use serde_json::{Map, Number, Value};

use super::ast::{BinOp, Expr, ExprKind, UnaryOp};

/// Anything that can answer "is `name` a folded constant, and what is it".
pub trait ConstantLookup {
    fn constant(&self, name: &str) -> Option<&Value>;
}

/// Evaluate `expr` against the visible constants.
///
/// Returns `None` when the expression depends on runtime state or an
/// operator has no JSON-representable result (e.g. division by zero).
pub fn evaluate_expression(expr: &Expr, visible: &dyn ConstantLookup) -> Option<Value> {
    match &expr.kind {
        ExprKind::String { value } => Some(Value::String(value.clone())),
        ExprKind::Number { value } => number_value(*value),
        ExprKind::Boolean { value } => Some(Value::Bool(*value)),
        ExprKind::Null => Some(Value::Null),
        ExprKind::Array { elements } => elements
            .iter()
            .map(|e| evaluate_expression(e, visible))
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        ExprKind::Object { properties } => {
            let mut object = Map::new();
            for prop in properties {
                object.insert(prop.key.clone(), evaluate_expression(&prop.value, visible)?);
            }
            Some(Value::Object(object))
        }
        ExprKind::VariableReference { name } => visible.constant(name).cloned(),
        ExprKind::ParameterReference { .. }
        | ExprKind::SystemPropertyReference { .. }
        | ExprKind::PropertyChain { .. } => None,
        ExprKind::Unary { op, operand } => {
            let value = evaluate_expression(operand, visible)?;
            fold_unary(*op, &value)
        }
        ExprKind::Binary { op, left, right } => {
            let l = evaluate_expression(left, visible)?;
            let r = evaluate_expression(right, visible)?;
            fold_binary(*op, &l, &r)
        }
    }
}

/// JSON number for `v`, preferring an integer representation when exact.
pub fn number_value(v: f64) -> Option<Value> {
    // 2^53: beyond this f64 no longer represents every integer
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    if v.fract() == 0.0 && v.abs() < MAX_EXACT {
        #[allow(clippy::cast_possible_truncation)]
        return Some(Value::from(v as i64));
    }
    Number::from_f64(v).map(Value::Number)
}

/// JavaScript truthiness, which is what the runtime applies to conditions.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn fold_unary(op: UnaryOp, value: &Value) -> Option<Value> {
    match op {
        UnaryOp::Neg => number_value(-value.as_f64()?),
        UnaryOp::Not => Some(Value::Bool(!truthy(value))),
    }
}

fn fold_binary(op: BinOp, l: &Value, r: &Value) -> Option<Value> {
    match op {
        BinOp::Add => match (l, r) {
            (Value::String(a), b) => Some(Value::String(format!("{a}{}", display(b)))),
            (a, Value::String(b)) => Some(Value::String(format!("{}{b}", display(a)))),
            _ => number_value(l.as_f64()? + r.as_f64()?),
        },
        BinOp::Sub => number_value(l.as_f64()? - r.as_f64()?),
        BinOp::Mul => number_value(l.as_f64()? * r.as_f64()?),
        BinOp::Div => {
            let divisor = r.as_f64()?;
            if divisor == 0.0 {
                return None;
            }
            number_value(l.as_f64()? / divisor)
        }
        BinOp::Mod => {
            let divisor = r.as_f64()?;
            if divisor == 0.0 {
                return None;
            }
            number_value(l.as_f64()? % divisor)
        }
        BinOp::Eq => Some(Value::Bool(loose_eq(l, r))),
        BinOp::Ne => Some(Value::Bool(!loose_eq(l, r))),
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            let ordering = compare(l, r)?;
            let result = match op {
                BinOp::Lt => ordering.is_lt(),
                BinOp::Le => ordering.is_le(),
                BinOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            };
            Some(Value::Bool(result))
        }
        BinOp::And => Some(if truthy(l) { r.clone() } else { l.clone() }),
        BinOp::Or => Some(if truthy(l) { l.clone() } else { r.clone() }),
    }
}

fn loose_eq(l: &Value, r: &Value) -> bool {
    match (l.as_f64(), r.as_f64()) {
        (Some(a), Some(b)) => (a - b).abs() < f64::EPSILON,
        _ => l == r,
    }
}

fn compare(l: &Value, r: &Value) -> Option<std::cmp::Ordering> {
    match (l, r) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => l.as_f64()?.partial_cmp(&r.as_f64()?),
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::HashMap;

    struct Consts(HashMap<String, Value>);

    impl ConstantLookup for Consts {
        fn constant(&self, name: &str) -> Option<&Value> {
            self.0.get(name)
        }
    }

    fn expr(value: Value) -> Expr {
        serde_json::from_value(value).unwrap()
    }

    fn num(v: f64) -> Value {
        json!({ "$type": "Number", "value": v })
    }

    fn eval(value: Value) -> Option<Value> {
        evaluate_expression(&expr(value), &Consts(HashMap::new()))
    }

    #[test]
    fn folds_arithmetic_to_integers() {
        let sum = json!({ "$type": "Binary", "op": "+", "left": num(2.0), "right": num(3.0) });
        assert_eq!(eval(sum), Some(json!(5)));

        let half = json!({ "$type": "Binary", "op": "/", "left": num(1.0), "right": num(2.0) });
        assert_eq!(eval(half), Some(json!(0.5)));
    }

    #[test]
    fn string_concatenation() {
        let e = json!({
            "$type": "Binary", "op": "+",
            "left": { "$type": "String", "value": "item-" },
            "right": num(3.0)
        });
        assert_eq!(eval(e), Some(json!("item-3")));
    }

    #[test]
    fn comparisons_and_logic() {
        let lt = json!({ "$type": "Binary", "op": "<", "left": num(1.0), "right": num(2.0) });
        assert_eq!(eval(lt), Some(json!(true)));

        let not = json!({ "$type": "Unary", "op": "!", "operand": { "$type": "Boolean", "value": true } });
        assert_eq!(eval(not), Some(json!(false)));

        let or = json!({
            "$type": "Binary", "op": "||",
            "left": { "$type": "Null" },
            "right": { "$type": "String", "value": "fallback" }
        });
        assert_eq!(eval(or), Some(json!("fallback")));
    }

    #[test]
    fn division_by_zero_is_not_constant() {
        let e = json!({ "$type": "Binary", "op": "/", "left": num(1.0), "right": num(0.0) });
        assert_eq!(eval(e), None);
    }

    #[test]
    fn runtime_references_block_folding() {
        let e = json!({
            "$type": "Binary", "op": "*",
            "left": { "$type": "SystemPropertyReference", "name": "index" },
            "right": num(100.0)
        });
        assert_eq!(eval(e), None);
        assert_eq!(eval(json!({ "$type": "ParameterReference", "name": "x" })), None);
    }

    #[test]
    fn constants_resolve_through_lookup() {
        let consts = Consts(HashMap::from([("n".to_string(), json!(5))]));
        let e = expr(json!({
            "$type": "Binary", "op": "*",
            "left": { "$type": "VariableReference", "name": "n" },
            "right": num(2.0)
        }));
        assert_eq!(evaluate_expression(&e, &consts), Some(json!(10)));

        let unknown = expr(json!({ "$type": "VariableReference", "name": "missing" }));
        assert_eq!(evaluate_expression(&unknown, &consts), None);
    }

    #[test]
    fn collections_fold_when_every_element_does() {
        let arr = json!({ "$type": "Array", "elements": [num(1.0), { "$type": "String", "value": "a" }] });
        assert_eq!(eval(arr), Some(json!([1, "a"])));

        let obj = json!({ "$type": "Object", "properties": [
            { "key": "opacity", "value": num(1.0) },
            { "key": "left", "value": { "$type": "ParameterReference", "name": "x" } }
        ] });
        assert_eq!(eval(obj), None);
    }

    #[test]
    fn negation() {
        let e = json!({ "$type": "Unary", "op": "-", "operand": num(2.5) });
        assert_eq!(eval(e), Some(json!(-2.5)));
    }
}
