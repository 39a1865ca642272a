#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{json, Value};

use super::*;
use crate::dsl::ast::Library;
use crate::dsl::documents::LibraryDocuments;
use crate::model::{TimelineActionConfig, TimelineType};

// ── Syntax tree builders ────────────────────────────────────────

fn string(value: &str) -> Value {
    json!({ "$type": "String", "value": value })
}

fn number(value: f64) -> Value {
    json!({ "$type": "Number", "value": value })
}

fn param(name: &str) -> Value {
    json!({ "$type": "ParameterReference", "name": name })
}

fn var(name: &str) -> Value {
    json!({ "$type": "VariableReference", "name": name })
}

fn call(name: &str, args: Value) -> Value {
    json!({ "$type": "OperationCall", "name": name, "args": args })
}

fn action(name: &str, params: &[&str], ops: Value) -> Value {
    let parameters: Vec<Value> = params.iter().map(|p| json!({ "name": p })).collect();
    json!({
        "$type": "ActionDefinition",
        "name": name,
        "parameters": parameters,
        "body": { "$type": "Regular", "operations": ops },
        "location": { "line": 1, "column": 1 }
    })
}

fn endable(name: &str, params: &[&str], start: Value, end: Value) -> Value {
    let parameters: Vec<Value> = params.iter().map(|p| json!({ "name": p })).collect();
    json!({
        "$type": "ActionDefinition",
        "name": name,
        "parameters": parameters,
        "body": { "$type": "Endable", "startOperations": start, "endOperations": end }
    })
}

fn seconds(value: f64) -> Value {
    json!({ "$type": "Literal", "value": value, "unit": "s" })
}

fn named(name: &str, args: Value) -> Value {
    json!({ "$type": "Named", "call": { "name": name, "args": args } })
}

fn timed(start: f64, end: f64, action: Value) -> Value {
    json!({
        "$type": "Timed",
        "range": { "start": seconds(start), "end": seconds(end) },
        "action": action
    })
}

fn timeline(events: Value) -> Value {
    json!({
        "$type": "Timeline",
        "name": "main",
        "containerSelector": "#app",
        "provider": "raf",
        "events": events,
        "location": { "line": 20, "column": 1 }
    })
}

fn parse(elements: Value) -> Program {
    serde_json::from_value(json!({ "elements": elements })).unwrap()
}

fn lower_with(elements: Value, settings: &CompilerSettings) -> Result<EligiusIR, TransformError> {
    lower_program(&parse(elements), &LibraryDocuments::new(), &AssetBundle::default(), settings)
}

fn lower(elements: Value) -> Result<EligiusIR, TransformError> {
    lower_with(elements, &CompilerSettings::deterministic())
}

fn names(ops: &[OperationConfig]) -> Vec<&str> {
    ops.iter().map(|op| op.system_name.as_str()).collect()
}

fn first_action(ir: &EligiusIR) -> &TimelineActionConfig {
    &ir.config.timelines[0].timeline_actions[0]
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ── Scenarios ───────────────────────────────────────────────────

#[test]
fn named_action_on_timeline_requests_then_starts() {
    let ir = lower(json!([
        action("fadeIn", &["selector"], json!([call("selectElement", json!([param("selector")]))])),
        timeline(json!([timed(0.0, 5.0, named("fadeIn", json!([string(".box")])))])),
    ]))
    .unwrap();

    let timeline = &ir.config.timelines[0];
    assert_eq!(timeline.timeline_actions.len(), 1);
    let lowered = first_action(&ir);
    assert_eq!(names(&lowered.start_operations), vec!["requestAction", "startAction"]);
    assert_eq!(lowered.start_operations[0].operation_data["systemName"], json!("fadeIn"));
    assert_eq!(
        lowered.start_operations[1].operation_data["actionOperationData"],
        json!({ "selector": ".box" })
    );
    assert!(lowered.end_operations.is_empty());
    assert!(close(lowered.duration.start, 0.0) && close(lowered.duration.end, 5.0));

    let fade = &ir.config.actions[0];
    assert_eq!(fade.name, "fadeIn");
    assert_eq!(fade.start_operations[0].operation_data["selector"], json!("$operationdata.selector"));
}

#[test]
fn missing_dependency_is_a_validation_error() {
    let err = lower(json!([
        action("highlight", &[], json!([call("addClass", json!([string("x")]))])),
        timeline(json!([timed(0.0, 1.0, named("highlight", json!([])))])),
    ]))
    .unwrap_err();

    assert!(matches!(err, TransformError::ValidationError { .. }));
    let message = err.to_string();
    assert!(message.contains("selectedElement"), "{message}");
    assert!(message.contains("selectElement()"), "{message}");
    assert!(message.contains("'highlight'"), "{message}");
}

#[test]
fn folded_constants_are_inlined() {
    let ir = lower(json!([
        {
            "$type": "VariableDeclaration",
            "name": "n",
            "value": { "$type": "Binary", "op": "+", "left": number(2.0), "right": number(3.0) }
        },
        action("pause", &[], json!([call("wait", json!([var("n")]))])),
        timeline(json!([timed(0.0, 1.0, named("pause", json!([])))])),
    ]))
    .unwrap();

    assert_eq!(ir.config.actions[0].start_operations[0].operation_data["milliseconds"], json!(5));
    assert!(ir.config.init_actions.is_empty());
    assert!(ir.config.operations().all(|op| op.system_name != "setVariable"));
    assert_eq!(ir.metadata.constant_count, 1);
}

#[test]
fn for_loop_aliases_item_to_current_item() {
    let ir = lower(json!([
        action("show", &["value"], json!([call("log", json!([param("value")]))])),
        action("each", &[], json!([{
            "$type": "For",
            "itemName": "item",
            "collection": { "$type": "Array", "elements": [number(1.0), number(2.0), number(3.0)] },
            "body": [call("show", json!([param("item")]))]
        }])),
        timeline(json!([timed(0.0, 1.0, named("each", json!([])))])),
    ]))
    .unwrap();

    let each = &ir.config.actions[1];
    assert_eq!(
        names(&each.start_operations),
        vec!["forEach", "requestAction", "startAction", "endForEach"]
    );
    assert_eq!(
        Value::Object(each.start_operations[0].operation_data.clone()),
        json!({ "collection": [1, 2, 3], "itemName": "item" })
    );
    assert_eq!(
        each.start_operations[2].operation_data["actionOperationData"],
        json!({ "value": "$scope.currentItem" })
    );
}

// ── Control flow ────────────────────────────────────────────────

#[test]
fn if_else_lowers_to_when_otherwise_end_when() {
    let ir = lower(json!([
        action("mark", &["count"], json!([
            call("selectElement", json!([string(".row")])),
            {
                "$type": "If",
                "condition": { "$type": "Binary", "op": ">", "left": param("count"), "right": number(2.0) },
                "then": [call("addClass", json!([string("many")]))],
                "else": [call("removeClass", json!([string("many")]))]
            }
        ])),
        timeline(json!([timed(0.0, 1.0, named("mark", json!([number(3.0)])))])),
    ]))
    .unwrap();

    let ops = &ir.config.actions[0].start_operations;
    assert_eq!(
        names(ops),
        vec!["selectElement", "when", "addClass", "otherwise", "removeClass", "endWhen"]
    );
    assert_eq!(ops[1].operation_data["expression"], json!("$operationdata.count > 2"));
}

#[test]
fn if_without_else_has_no_otherwise() {
    let ir = lower(json!([
        action("maybe", &["flag"], json!([{
            "$type": "If",
            "condition": param("flag"),
            "then": [call("log", json!([string("on")]))]
        }])),
        timeline(json!([timed(0.0, 1.0, named("maybe", json!([])))])),
    ]))
    .unwrap();
    assert_eq!(names(&ir.config.actions[0].start_operations), vec!["when", "log", "endWhen"]);
}

#[test]
fn branch_constants_do_not_leak() {
    let err = lower(json!([
        action("leak", &[], json!([
            {
                "$type": "If",
                "condition": { "$type": "Boolean", "value": true },
                "then": [{ "$type": "VariableDeclaration", "name": "x", "value": number(1.0) }]
            },
            call("log", json!([var("x")]))
        ])),
        timeline(json!([timed(0.0, 1.0, named("leak", json!([])))])),
    ]))
    .unwrap_err();
    assert!(matches!(err, TransformError::InvalidExpression { .. }), "{err}");
}

#[test]
fn runtime_locals_emit_set_variable() {
    let ir = lower(json!([
        action("store", &["value"], json!([
            {
                "$type": "VariableDeclaration",
                "name": "copy",
                "value": { "$type": "Object", "properties": [{ "key": "value", "value": param("value") }] }
            },
            call("log", json!([var("copy")]))
        ])),
        timeline(json!([timed(0.0, 1.0, named("store", json!([])))])),
    ]))
    .unwrap();

    let ops = &ir.config.actions[0].start_operations;
    assert_eq!(names(ops), vec!["setVariable", "log"]);
    assert_eq!(
        Value::Object(ops[0].operation_data.clone()),
        json!({ "name": "copy", "value": { "value": "$operationdata.value" } })
    );
    assert_eq!(ops[1].operation_data["logValue"], json!("$scope.variables.copy"));
}

#[test]
fn break_outside_loop_is_rejected() {
    let err = lower(json!([
        action("stop", &[], json!([{ "$type": "Break" }])),
        timeline(json!([timed(0.0, 1.0, named("stop", json!([])))])),
    ]))
    .unwrap_err();
    assert!(err.to_string().contains("'break'"));
}

// ── Actions and events ──────────────────────────────────────────

#[test]
fn endable_actions_get_an_end_step() {
    let elements = json!([
        endable(
            "show",
            &["sel"],
            json!([call("selectElement", json!([param("sel")])), call("addClass", json!([string("on")]))]),
            json!([call("removeClass", json!([string("on")]))]),
        ),
        timeline(json!([timed(0.0, 2.0, named("show", json!([string("#hero")])))])),
    ]);

    let ir = lower(elements.clone()).unwrap();
    let lowered = first_action(&ir);
    assert_eq!(names(&lowered.end_operations), vec!["requestAction", "endAction"]);
    assert_eq!(
        lowered.end_operations[1].operation_data["actionOperationData"],
        json!({ "sel": "#hero" })
    );

    let unseeded = CompilerSettings {
        seed_end_operations: false,
        ..CompilerSettings::deterministic()
    };
    let err = lower_with(elements, &unseeded).unwrap_err();
    assert!(err.to_string().contains("removeClass"), "{err}");
}

#[test]
fn extra_action_arguments_are_rejected() {
    let err = lower(json!([
        action("solo", &["a"], json!([call("log", json!([param("a")]))])),
        timeline(json!([timed(0.0, 1.0, named("solo", json!([number(1.0), number(2.0)])))])),
    ]))
    .unwrap_err();
    assert!(matches!(err, TransformError::ValidationError { .. }));
    assert!(err.to_string().contains("takes 1 argument(s), got 2"));
}

#[test]
fn missing_trailing_arguments_are_omitted() {
    let ir = lower(json!([
        action("pair", &["a", "b"], json!([call("log", json!([param("a")]))])),
        timeline(json!([timed(0.0, 1.0, named("pair", json!([number(1.0)])))])),
    ]))
    .unwrap();
    assert_eq!(
        first_action(&ir).start_operations[1].operation_data["actionOperationData"],
        json!({ "a": 1 })
    );
}

#[test]
fn unknown_operations_suggest_close_names() {
    let err = lower(json!([
        action("typo", &[], json!([call("addClas", json!([string("x")]))])),
        timeline(json!([timed(0.0, 1.0, named("typo", json!([])))])),
    ]))
    .unwrap_err();
    assert!(err.to_string().contains("Did you mean: addClass"), "{err}");
}

#[test]
fn event_actions_use_positional_arguments() {
    let ir = lower(json!([
        {
            "$type": "EventActionDefinition",
            "name": "onSelect",
            "eventName": "item-selected",
            "eventTopic": "nav",
            "parameters": [{ "name": "selector" }, { "name": "index" }],
            "operations": [
                call("selectElement", json!([param("selector")])),
                call("setElementContent", json!([param("index")]))
            ]
        },
        timeline(json!([])),
    ]))
    .unwrap();

    let event = &ir.config.event_actions[0];
    assert_eq!(event.event_name, "item-selected");
    assert_eq!(event.event_topic.as_deref(), Some("nav"));
    assert_eq!(event.start_operations[0].operation_data["selector"], json!("$operationdata.eventArgs[0]"));
    assert_eq!(event.start_operations[1].operation_data["template"], json!("$operationdata.eventArgs[1]"));
}

#[test]
fn runtime_globals_are_written_by_init_action() {
    let ir = lower(json!([
        {
            "$type": "VariableDeclaration",
            "name": "startedAt",
            "value": { "$type": "SystemPropertyReference", "name": "currentTime" }
        },
        action("report", &[], json!([call("log", json!([var("startedAt")]))])),
        timeline(json!([timed(0.0, 1.0, named("report", json!([])))])),
    ]))
    .unwrap();

    let init = &ir.config.init_actions[0];
    assert_eq!(init.name, INIT_GLOBALS_ACTION);
    assert_eq!(names(&init.start_operations), vec!["setGlobalData"]);
    assert_eq!(
        init.start_operations[0].operation_data["properties"],
        json!({ "startedAt": "$scope.currentTime" })
    );
    assert_eq!(
        ir.config.actions[0].start_operations[0].operation_data["logValue"],
        json!("$globaldata.startedAt")
    );
}

#[test]
fn local_action_shadows_import() {
    let library: Library = serde_json::from_value(json!({
        "name": "effects",
        "actions": [
            action("fadeIn", &[], json!([call("log", json!([string("library")]))])),
            action("fadeOut", &[], json!([call("log", json!([string("out")]))]))
        ]
    }))
    .unwrap();
    let documents = LibraryDocuments::new().with("effects.eligian", library);
    let program = parse(json!([
        {
            "$type": "LibraryImport",
            "path": "./effects.eligian",
            "actions": [{ "action": "fadeIn" }, { "action": "fadeOut", "alias": "vanish" }]
        },
        action("fadeIn", &[], json!([call("log", json!([string("local")]))])),
        timeline(json!([timed(0.0, 1.0, named("vanish", json!([])))])),
    ]));

    let ir = lower_program(&program, &documents, &AssetBundle::default(), &CompilerSettings::deterministic())
        .unwrap();
    let action_names: Vec<&str> = ir.config.actions.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(action_names, vec!["vanish", "fadeIn"]);
    assert_eq!(ir.config.actions[1].start_operations[0].operation_data["logValue"], json!("local"));
    assert_eq!(first_action(&ir).start_operations[0].operation_data["systemName"], json!("vanish"));
}

fn anim_library() -> LibraryDocuments {
    let library: Library = serde_json::from_value(json!({
        "name": "anim",
        "actions": [
            action("fadeIn", &["selector"], json!([call("helper", json!([param("selector")]))])),
            action("helper", &["target"], json!([call("log", json!([param("target")]))]))
        ]
    }))
    .unwrap();
    LibraryDocuments::new().with("anim.eligian", library)
}

#[test]
fn library_action_calls_its_own_helper() {
    let program = parse(json!([
        { "$type": "LibraryImport", "path": "./anim.eligian", "actions": [{ "action": "fadeIn" }] },
        timeline(json!([timed(0.0, 1.0, named("fadeIn", json!([string(".box")])))])),
    ]));

    let ir = lower_program(&program, &anim_library(), &AssetBundle::default(), &CompilerSettings::deterministic())
        .unwrap();
    let action_names: Vec<&str> = ir.config.actions.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(action_names, vec!["fadeIn", "anim.eligian#helper"]);

    let fade = &ir.config.actions[0];
    assert_eq!(names(&fade.start_operations), vec!["requestAction", "startAction"]);
    assert_eq!(fade.start_operations[0].operation_data["systemName"], json!("anim.eligian#helper"));
    assert_eq!(
        fade.start_operations[1].operation_data["actionOperationData"],
        json!({ "target": "$operationdata.selector" })
    );
    assert_eq!(
        ir.config.actions[1].start_operations[0].operation_data["logValue"],
        json!("$operationdata.target")
    );
}

#[test]
fn imported_helper_keeps_its_program_name() {
    let program = parse(json!([
        {
            "$type": "LibraryImport",
            "path": "./anim.eligian",
            "actions": [{ "action": "fadeIn" }, { "action": "helper", "alias": "assist" }]
        },
        timeline(json!([timed(0.0, 1.0, named("fadeIn", json!([string(".box")])))])),
    ]));

    let ir = lower_program(&program, &anim_library(), &AssetBundle::default(), &CompilerSettings::deterministic())
        .unwrap();
    let action_names: Vec<&str> = ir.config.actions.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(action_names, vec!["fadeIn", "assist"]);
    assert_eq!(ir.config.actions[0].start_operations[0].operation_data["systemName"], json!("assist"));
}

#[test]
fn program_cannot_call_unimported_library_helper() {
    let program = parse(json!([
        { "$type": "LibraryImport", "path": "./anim.eligian", "actions": [{ "action": "fadeIn" }] },
        timeline(json!([timed(0.0, 1.0, named("helper", json!([])))])),
    ]));

    let err = lower_program(&program, &anim_library(), &AssetBundle::default(), &CompilerSettings::deterministic())
        .unwrap_err();
    assert!(matches!(err, TransformError::ValidationError { .. }));
}

// ── Timelines ───────────────────────────────────────────────────

#[test]
fn program_without_timeline_fails() {
    let err = lower(json!([action("idle", &[], json!([]))])).unwrap_err();
    assert!(matches!(err, TransformError::InvalidTimeline { .. }));
}

#[test]
fn inverted_range_is_an_invalid_event() {
    let err = lower(json!([
        action("noop", &[], json!([])),
        timeline(json!([timed(5.0, 2.0, named("noop", json!([])))])),
    ]))
    .unwrap_err();
    assert!(matches!(err, TransformError::InvalidEvent { .. }));
}

#[test]
fn sequence_and_relative_times_advance_the_cursor() {
    let ir = lower(json!([
        action("intro", &[], json!([])),
        action("main", &[], json!([])),
        action("outro", &[], json!([])),
        timeline(json!([
            {
                "$type": "Sequence",
                "items": [
                    { "call": { "name": "intro" }, "duration": seconds(2.0) },
                    { "call": { "name": "main" }, "duration": { "$type": "Literal", "value": 3000, "unit": "ms" } }
                ]
            },
            {
                "$type": "Timed",
                "range": {
                    "start": { "$type": "Relative", "value": 1 },
                    "end": { "$type": "Relative", "value": 2 }
                },
                "action": named("outro", json!([]))
            }
        ])),
    ]))
    .unwrap();

    let windows: Vec<(f64, f64)> = ir.config.timelines[0]
        .timeline_actions
        .iter()
        .map(|a| (a.duration.start, a.duration.end))
        .collect();
    let expected = [(0.0, 2.0), (2.0, 5.0), (6.0, 7.0)];
    assert_eq!(windows.len(), expected.len());
    for ((start, end), (want_start, want_end)) in windows.iter().zip(expected) {
        assert!(close(*start, want_start) && close(*end, want_end), "{windows:?}");
    }
    assert!(close(ir.config.timelines[0].duration, 7.0));
}

fn stagger_program(base_end: f64, delay_ms: u32, items: &[&str], duration_ms: u32) -> Value {
    let elements: Vec<Value> = items.iter().map(|i| string(i)).collect();
    json!([
        action("reveal", &["selector"], json!([call("selectElement", json!([param("selector")]))])),
        timeline(json!([
            timed(0.0, base_end, named("reveal", json!([string("#intro")]))),
            {
                "$type": "Stagger",
                "delay": { "$type": "Literal", "value": delay_ms, "unit": "ms" },
                "items": { "$type": "Array", "elements": elements },
                "action": named("reveal", json!([{ "$type": "SystemPropertyReference", "name": "item" }])),
                "duration": { "$type": "Literal", "value": duration_ms, "unit": "ms" }
            }
        ])),
    ])
}

#[test]
fn stagger_expands_one_action_per_item() {
    let ir = lower(stagger_program(2.0, 200, &[".a", ".b", ".c"], 1000)).unwrap();
    let actions = &ir.config.timelines[0].timeline_actions;
    assert_eq!(actions.len(), 4);

    let selectors: Vec<&Value> = actions[1..]
        .iter()
        .map(|a| &a.start_operations[1].operation_data["actionOperationData"]["selector"])
        .collect();
    assert_eq!(selectors, vec![&json!(".a"), &json!(".b"), &json!(".c")]);
    assert!(close(actions[3].duration.start, 2.4));
    assert!(close(ir.config.timelines[0].duration, 3.4));
}

#[test]
fn stagger_items_must_be_constant() {
    let err = lower(json!([
        action("reveal", &[], json!([])),
        timeline(json!([{
            "$type": "Stagger",
            "delay": seconds(1.0),
            "items": var("unknown"),
            "action": named("reveal", json!([])),
            "duration": seconds(1.0)
        }])),
    ]))
    .unwrap_err();
    assert!(matches!(err, TransformError::InvalidEvent { .. }));
}

proptest! {
    #[test]
    fn stagger_timing_law(
        base in 0u32..10,
        delay_ms in 0u32..2000,
        count in 1usize..6,
        duration_ms in 0u32..5000,
    ) {
        let items: Vec<String> = (0..count).map(|k| format!(".item-{k}")).collect();
        let refs: Vec<&str> = items.iter().map(String::as_str).collect();
        let ir = lower(stagger_program(f64::from(base), delay_ms, &refs, duration_ms)).unwrap();

        let generated = &ir.config.timelines[0].timeline_actions[1..];
        prop_assert_eq!(generated.len(), count);
        let delay = f64::from(delay_ms) / 1000.0;
        let length = f64::from(duration_ms) / 1000.0;
        for (k, action) in generated.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let start = f64::from(base) + k as f64 * delay;
            prop_assert!(close(action.duration.start, start));
            prop_assert!(close(action.duration.end, start + length));
        }
    }
}

// ── Assembly ────────────────────────────────────────────────────

#[test]
fn providers_are_registered_per_timeline_type() {
    let ir = lower(json!([
        action("noop", &[], json!([])),
        timeline(json!([timed(0.0, 1.0, named("noop", json!([])))])),
        {
            "$type": "Timeline",
            "name": "film",
            "containerSelector": ".player",
            "provider": "video",
            "source": "movie.mp4",
            "events": []
        }
    ]))
    .unwrap();

    let config = &ir.config;
    assert_eq!(config.timelines[1].timeline_type, TimelineType::Mediaplayer);
    assert_eq!(config.timelines[1].uri.as_deref(), Some("movie.mp4"));
    let keys: Vec<&str> = config.timeline_provider_settings.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["animation", "mediaplayer"]);
    assert_eq!(
        config.timeline_provider_settings["mediaplayer"].system_name,
        "MediaElementTimelineProvider"
    );
    assert_eq!(config.container_selector, "#app");
    assert_eq!(config.layout_template, "<div id=\"app\"></div>\n<div class=\"player\"></div>");
}

#[test]
fn every_id_has_a_source_location() {
    let ir = lower(stagger_program(1.0, 100, &[".x", ".y"], 500)).unwrap();
    for (id, kind) in ir.config.ids() {
        assert!(ir.source_map.contains(id), "{kind} {id} missing from source map");
    }
    assert_eq!(ir.config.engine.system_name, "EligiusEngine");
    assert_eq!(ir.config.language, "en-US");
}

#[test]
fn fixed_config_id_is_used() {
    let settings = CompilerSettings {
        config_id: Some("presentation".into()),
        ..CompilerSettings::deterministic()
    };
    let ir = lower_with(json!([timeline(json!([]))]), &settings).unwrap();
    assert_eq!(ir.config.id, "presentation");
    assert!(ir.source_map.contains("presentation"));
}
