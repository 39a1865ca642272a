//! Positional argument → named operation data binding.

use serde_json::{Map, Value};

use crate::error::MappingError;

use super::{OperationSignature, ParameterSpec};

/// Flattened named arguments of one operation call.
pub type OperationData = Map<String, Value>;

/// Runtime data scopes a lowered reference can point into.
pub const RUNTIME_SCOPES: &[&str] = &["$operationdata", "$scope", "$globaldata"];

/// True when a string carries a runtime lookup (a path or an expression over
/// paths). Such values are resolved by the engine, so their type is unknown here.
pub fn is_runtime_value(value: &Value) -> bool {
    match value {
        Value::String(s) => RUNTIME_SCOPES.iter().any(|scope| s.contains(scope)),
        _ => false,
    }
}

/// True when `s` is exactly a runtime path such as `$scope.currentItem`.
pub fn is_runtime_string(s: &str) -> bool {
    RUNTIME_SCOPES.iter().any(|scope| {
        s.strip_prefix(scope)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('.') || rest.starts_with('['))
    })
}

/// Bind positional arguments to the signature's parameters.
///
/// The i-th argument binds to the i-th parameter (required first, then
/// optional). When the last argument is an object literal whose keys are a
/// superset of the remaining required parameter names, its keys are merged
/// directly, so `f(x, y)` and `f({x, y})` produce the same data. Optional
/// parameters may be left out of the wrapper; keys naming no parameter are
/// carried through unchecked.
pub fn map_parameters(
    signature: &OperationSignature,
    args: &[Value],
) -> Result<OperationData, MappingError> {
    let mut data = OperationData::new();

    if let Some((last, positional)) = args.split_last() {
        if let Some(object) = as_wrapper(signature, positional.len(), last) {
            bind_positional(signature, positional, &mut data)?;
            for (key, value) in object {
                if let Some(param) = signature.parameter(key) {
                    check_type(signature, param, value)?;
                }
                data.insert(key.clone(), value.clone());
            }
            return Ok(data);
        }
    }

    if !signature.accepts_arity(args.len()) {
        let min = signature.required_count();
        return Err(MappingError::ParameterCount {
            operation: signature.system_name.to_string(),
            min,
            max: min + signature.optional_count(),
            actual: args.len(),
        });
    }
    bind_positional(signature, args, &mut data)?;
    Ok(data)
}

fn bind_positional(
    signature: &OperationSignature,
    args: &[Value],
    data: &mut OperationData,
) -> Result<(), MappingError> {
    for (param, value) in signature.parameters.iter().zip(args) {
        check_type(signature, param, value)?;
        data.insert(param.name.to_string(), value.clone());
    }
    Ok(())
}

/// The object to flatten, if `candidate` (at position `index`) is a wrapper.
fn as_wrapper<'v>(
    signature: &OperationSignature,
    index: usize,
    candidate: &'v Value,
) -> Option<&'v Map<String, Value>> {
    let object = candidate.as_object()?;
    let remaining = signature.parameters.get(index..)?;
    let mut required = remaining.iter().filter(|p| p.required).peekable();
    required.peek()?;
    required.all(|p| object.contains_key(p.name)).then_some(object)
}

fn check_type(
    signature: &OperationSignature,
    param: &ParameterSpec,
    value: &Value,
) -> Result<(), MappingError> {
    if param.types.accepts(value) || is_runtime_value(value) {
        return Ok(());
    }
    Err(MappingError::ParameterType {
        operation: signature.system_name.to_string(),
        parameter: param.name.to_string(),
        expected: param.types.describe(),
        actual: json_kind(value).to_string(),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
