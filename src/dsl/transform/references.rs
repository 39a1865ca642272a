//! Lowering value expressions to operation-data JSON.
//!
//! Constant subtrees become literals. Everything else becomes a runtime
//! path string (`$operationdata.x`, `$scope.currentItem`, ...) or, for
//! operators over runtime values, an infix expression string.

use serde_json::{Map, Value};

use crate::dsl::ast::{Expr, ExprKind};
use crate::dsl::eval::evaluate_expression;
use crate::dsl::scope::{ParameterBinding, Resolved, ScopeContext};
use crate::error::{suggestion_text, TransformError};
use crate::registry::params::is_runtime_string;
use crate::registry::validation::suggest_from;

pub const LOOP_ITEM_PATH: &str = "$scope.currentItem";

pub fn parameter_path(name: &str) -> String {
    format!("$operationdata.{name}")
}

pub fn event_argument_path(index: usize) -> String {
    format!("$operationdata.eventArgs[{index}]")
}

pub fn scope_path(name: &str) -> String {
    format!("$scope.{name}")
}

pub fn local_variable_path(name: &str) -> String {
    format!("$scope.variables.{name}")
}

pub fn global_variable_path(name: &str) -> String {
    format!("$globaldata.{name}")
}

/// Lower `expr` to the JSON value placed in operation data.
pub fn lower_expression(expr: &Expr, scope: &ScopeContext<'_>) -> Result<Value, TransformError> {
    if let Some(value) = evaluate_expression(expr, scope) {
        return Ok(value);
    }
    match &expr.kind {
        ExprKind::Array { elements } => elements
            .iter()
            .map(|e| lower_expression(e, scope))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        ExprKind::Object { properties } => {
            let mut object = Map::new();
            for prop in properties {
                object.insert(prop.key.clone(), lower_expression(&prop.value, scope)?);
            }
            Ok(Value::Object(object))
        }
        ExprKind::Binary { .. } | ExprKind::Unary { .. } => {
            Ok(Value::String(render_infix(expr, scope, false)?))
        }
        _ => lower_reference(expr, scope),
    }
}

/// Lower a condition for `when(...)`. Always text, even when constant.
pub fn lower_condition(expr: &Expr, scope: &ScopeContext<'_>) -> Result<String, TransformError> {
    render_infix(expr, scope, false)
}

fn lower_reference(expr: &Expr, scope: &ScopeContext<'_>) -> Result<Value, TransformError> {
    match &expr.kind {
        ExprKind::ParameterReference { name } => lower_identifier(name, expr, scope),
        ExprKind::VariableReference { name } => lower_variable(name, expr, scope),
        ExprKind::SystemPropertyReference { name } => Ok(match scope.resolve_system_property(name) {
            Some(Resolved::StaggerItem(item)) => item.clone(),
            Some(Resolved::LoopItem) => Value::String(LOOP_ITEM_PATH.to_string()),
            _ => Value::String(scope_path(name)),
        }),
        ExprKind::PropertyChain { scope: root, properties } => {
            let mut path = format!("${}", root.trim_start_matches('$'));
            for property in properties {
                path.push('.');
                path.push_str(property);
            }
            Ok(Value::String(path))
        }
        _ => Err(TransformError::invalid_expression(
            "Unsupported expression form",
            expr.location,
        )),
    }
}

fn lower_identifier(
    name: &str,
    expr: &Expr,
    scope: &ScopeContext<'_>,
) -> Result<Value, TransformError> {
    let path = match scope.resolve_identifier(name) {
        Some(Resolved::LoopItem) => LOOP_ITEM_PATH.to_string(),
        Some(Resolved::Parameter { index, binding: ParameterBinding::EventArgs }) => {
            event_argument_path(index)
        }
        Some(Resolved::Parameter { binding: ParameterBinding::Named, .. }) => parameter_path(name),
        Some(Resolved::OuterLoopItem) => {
            return Err(TransformError::invalid_expression(
                format!("Loop variable '{name}' belongs to an enclosing loop and is not accessible here"),
                expr.location,
            ))
        }
        Some(Resolved::StaggerItem(item)) => return Ok(item.clone()),
        None if !scope.in_action_body() => {
            return Err(TransformError::invalid_expression(
                format!("Parameter reference '{name}' is only valid inside an action body"),
                expr.location,
            ))
        }
        None => {
            let candidates = scope.parameters().iter().map(String::as_str);
            let suggestions = suggest_from(name, candidates);
            return Err(TransformError::invalid_expression(
                format!("Unknown parameter '{name}'{}", suggestion_text(&suggestions)),
                expr.location,
            ));
        }
    };
    Ok(Value::String(path))
}

fn lower_variable(name: &str, expr: &Expr, scope: &ScopeContext<'_>) -> Result<Value, TransformError> {
    if scope.loop_variable() == Some(name) {
        return Ok(Value::String(LOOP_ITEM_PATH.to_string()));
    }
    if scope.is_runtime_local(name) {
        return Ok(Value::String(local_variable_path(name)));
    }
    if scope.is_runtime_global(name) {
        return Ok(Value::String(global_variable_path(name)));
    }
    let known = scope
        .globals()
        .constants
        .iter()
        .map(|b| b.name.as_str())
        .chain(scope.globals().runtime.iter().map(String::as_str));
    let suggestions = suggest_from(name, known);
    Err(TransformError::invalid_expression(
        format!("Unknown variable '@{name}'{}", suggestion_text(&suggestions)),
        expr.location,
    ))
}

/// Render an operator expression as infix text. Operands are runtime paths
/// or JSON literals; nested operators are parenthesized.
fn render_infix(expr: &Expr, scope: &ScopeContext<'_>, nested: bool) -> Result<String, TransformError> {
    if let Some(value) = evaluate_expression(expr, scope) {
        return Ok(value.to_string());
    }
    let text = match &expr.kind {
        ExprKind::Binary { op, left, right } => {
            let l = render_infix(left, scope, true)?;
            let r = render_infix(right, scope, true)?;
            let text = format!("{l} {} {r}", op.symbol());
            if nested {
                format!("({text})")
            } else {
                text
            }
        }
        ExprKind::Unary { op, operand } => {
            format!("{}{}", op.symbol(), render_infix(operand, scope, true)?)
        }
        _ => match lower_expression(expr, scope)? {
            Value::String(s) if is_runtime_string(&s) => s,
            other => other.to_string(),
        },
    };
    Ok(text)
}
