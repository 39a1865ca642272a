//! Structural checks on a finished engine configuration.
//!
//! Lowering already guarantees references and dataflow. This pass only
//! guards the shape the engine reads: required strings, timeline types,
//! duration ordering, and that every id is unique and source-mapped.

use std::collections::HashSet;

use serde_json::Value;

use crate::error::TypeError;
use crate::model::{EligiusIR, TimelineType};

/// Check the configuration of `ir`, collecting every problem.
pub fn check_config(ir: &EligiusIR) -> Result<(), Vec<TypeError>> {
    let value = serde_json::to_value(&ir.config).map_err(|e| vec![TypeError::new("$", e.to_string())])?;
    let mut errors = check_config_value(&value);

    let mut seen = HashSet::new();
    for (id, kind) in ir.config.ids() {
        if !seen.insert(id) {
            errors.push(TypeError::new(format!("{kind} {id}"), "duplicate id"));
        }
        if !ir.source_map.contains(id) {
            errors.push(TypeError::new(format!("{kind} {id}"), "missing from source map"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Shape checks on a serialized configuration.
pub fn check_config_value(config: &Value) -> Vec<TypeError> {
    let mut errors = Vec::new();
    for field in ["id", "containerSelector", "language"] {
        require_string(config, field, field, &mut errors);
    }

    let timelines = config.get("timelines").and_then(Value::as_array);
    match timelines {
        Some(timelines) if !timelines.is_empty() => {
            for (i, timeline) in timelines.iter().enumerate() {
                check_timeline(timeline, &format!("timelines[{i}]"), &mut errors);
            }
        }
        _ => errors.push(TypeError::new("timelines", "at least one timeline is required")),
    }
    errors
}

fn check_timeline(timeline: &Value, path: &str, errors: &mut Vec<TypeError>) {
    require_string(timeline, "id", &format!("{path}.id"), errors);

    let kind = timeline.get("type").and_then(Value::as_str);
    if !kind.is_some_and(|k| TimelineType::all().iter().any(|t| t.as_str() == k)) {
        let allowed: Vec<&str> = TimelineType::all().iter().map(|t| t.as_str()).collect();
        errors.push(TypeError::new(
            format!("{path}.type"),
            format!("expected one of {}, got {}", allowed.join(", "), describe(timeline.get("type"))),
        ));
    }

    let actions = timeline
        .get("timelineActions")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for (j, action) in actions.iter().enumerate() {
        check_duration(action.get("duration"), &format!("{path}.timelineActions[{j}].duration"), errors);
    }
}

fn check_duration(duration: Option<&Value>, path: &str, errors: &mut Vec<TypeError>) {
    let bound = |key: &str| duration.and_then(|d| d.get(key)).and_then(Value::as_f64);
    match (bound("start"), bound("end")) {
        (Some(start), Some(end)) if end >= start => {}
        (Some(start), Some(end)) => errors.push(TypeError::new(
            path,
            format!("end ({end}) precedes start ({start})"),
        )),
        _ => errors.push(TypeError::new(path, "start and end must be numbers")),
    }
}

fn require_string(object: &Value, field: &str, path: &str, errors: &mut Vec<TypeError>) {
    match object.get(field).and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => {}
        Some(_) => errors.push(TypeError::new(path, "must not be empty")),
        None => errors.push(TypeError::new(path, format!("expected a string, got {}", describe(object.get(field))))),
    }
}

fn describe(value: Option<&Value>) -> String {
    match value {
        None => "nothing".to_string(),
        Some(v) => v.to_string(),
    }
}
