//! Call-site and dataflow validation against the operation registry.
//!
//! Centralizes arity checks, dependency tracking, and "did you mean"
//! suggestions so the transformer and the CLI report problems the same way.

use std::collections::HashSet;

use crate::error::{MissingDependencyError, OperationError};

use super::{all_operations, lookup, producers_of, OperationSignature, OPERATIONS};

/// Names written to the shared data bag by earlier operations in a sequence.
pub type AvailableOutputs = HashSet<String>;

const MAX_SUGGESTION_DISTANCE: usize = 3;
const MAX_SUGGESTIONS: usize = 3;

/// Check that `name` exists and accepts `arg_count` positional arguments.
pub fn validate_call(
    name: &str,
    arg_count: usize,
) -> Result<&'static OperationSignature, OperationError> {
    let signature = lookup(name).ok_or_else(|| OperationError::UnknownOperation {
        name: name.to_string(),
        suggestions: suggest_operations(name),
    })?;
    if !signature.accepts_arity(arg_count) {
        let min = signature.required_count();
        return Err(OperationError::ParameterCount {
            operation: name.to_string(),
            min,
            max: min + signature.optional_count(),
            actual: arg_count,
        });
    }
    Ok(signature)
}

/// Every declared dependency of `signature` that is not yet available.
pub fn validate_dependencies(
    signature: &OperationSignature,
    available: &AvailableOutputs,
) -> Vec<MissingDependencyError> {
    signature
        .dependencies
        .iter()
        .filter(|dep| !available.contains(**dep))
        .map(|dep| MissingDependencyError {
            operation: signature.system_name.to_string(),
            dependency: (*dep).to_string(),
            hint: dependency_hint(signature.system_name, dep),
        })
        .collect()
}

/// Union the signature's outputs into the running set.
pub fn track_outputs(signature: &OperationSignature, available: &mut AvailableOutputs) {
    available.extend(signature.outputs.iter().map(|o| (*o).to_string()));
}

/// Walk a flat operation sequence, validating and tracking each step.
///
/// Returns the index of the first offending operation with its error.
/// Unknown names are skipped; call sites already rejected them.
pub fn validate_sequence<'a>(
    names: impl IntoIterator<Item = &'a str>,
    available: &mut AvailableOutputs,
) -> Result<(), (usize, MissingDependencyError)> {
    for (index, name) in names.into_iter().enumerate() {
        let Some(signature) = lookup(name) else {
            continue;
        };
        if let Some(missing) = validate_dependencies(signature, available).into_iter().next() {
            return Err((index, missing));
        }
        track_outputs(signature, available);
    }
    Ok(())
}

fn dependency_hint(operation: &str, dependency: &str) -> String {
    match producers_of(dependency).as_slice() {
        [] => format!("Provide '{dependency}' before calling {operation}()."),
        [single] => format!("Add a call to {single}() before {operation}()."),
        many => format!(
            "Add a call to one of {} before {operation}().",
            many.iter().map(|p| format!("{p}()")).collect::<Vec<_>>().join(", ")
        ),
    }
}

/// Registry operations within edit distance 3 of `name`, closest first.
pub fn suggest_operations(name: &str) -> Vec<String> {
    suggest_from(name, all_operations().map(|op| op.system_name))
}

/// Same ranking as [`suggest_operations`] over an arbitrary candidate list.
pub fn suggest_from<'a>(name: &str, candidates: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let lowered = name.to_lowercase();
    let mut scored: Vec<(usize, &str)> = candidates
        .into_iter()
        .map(|candidate| (strsim::levenshtein(&lowered, &candidate.to_lowercase()), candidate))
        .filter(|(distance, _)| *distance <= MAX_SUGGESTION_DISTANCE)
        .collect();
    scored.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
    scored.dedup_by(|a, b| a.1 == b.1);
    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, candidate)| candidate.to_string())
        .collect()
}

/// Self-check of the static catalog. Meant for tests and the CLI, not lowering.
pub fn validate_registry() -> Vec<String> {
    let mut problems = Vec::new();
    let mut seen = HashSet::new();

    for op in OPERATIONS {
        if !seen.insert(op.system_name) {
            problems.push(format!("Duplicate operation '{}'", op.system_name));
        }
        if op.system_name.is_empty() {
            problems.push("Operation with empty system name".to_string());
        }
        if op.description.trim().is_empty() {
            problems.push(format!("Operation '{}' has an empty description", op.system_name));
        }

        let mut seen_optional = false;
        let mut param_names = HashSet::new();
        for param in op.parameters {
            if param.types.is_empty() {
                problems.push(format!(
                    "Parameter '{}' of '{}' accepts no types",
                    param.name, op.system_name
                ));
            }
            if !param_names.insert(param.name) {
                problems.push(format!(
                    "Parameter '{}' of '{}' is declared twice",
                    param.name, op.system_name
                ));
            }
            if param.required && seen_optional {
                problems.push(format!(
                    "Required parameter '{}' of '{}' follows an optional one",
                    param.name, op.system_name
                ));
            }
            seen_optional |= !param.required;
        }

        for dep in op.dependencies {
            if producers_of(dep).is_empty() {
                problems.push(format!(
                    "Dependency '{dep}' of '{}' is produced by no operation",
                    op.system_name
                ));
            }
        }
    }

    problems
}
