//! Lowering of a syntax tree into an engine configuration.
//!
//! One [`Lowerer`] lives for one call of [`lower_program`]. It owns the id
//! generator and the source map, so every entity that gets an id gets its
//! source location in the same step. The first error aborts the lowering.

pub mod assets;
pub mod ids;
pub mod operations;
pub mod references;
pub mod time;
pub mod timeline;

#[cfg(test)]
mod tests;

use indexmap::{IndexMap, IndexSet};
use serde_json::{Map, Value};

use crate::dsl::ast::{ActionBody, ActionDefinition, EventActionDefinition, Program, SourceLocation};
use crate::dsl::constants::build_constant_map;
use crate::dsl::documents::DocumentResolver;
use crate::dsl::imports::{collect_actions, ActionOrigin, ActionSet, LogicalAction};
use crate::dsl::scope::{GlobalScope, ParameterBinding, ScopeContext};
use crate::error::TransformError;
use crate::model::{
    EligiusIR, EndableActionConfig, EngineConfig, EngineInfo, EventActionConfig, IrMetadata, OperationConfig,
    SourceMap, TimelineProviderSetting,
};
use crate::registry::params::OperationData;
use crate::registry::validation::{validate_sequence, AvailableOutputs};
use crate::settings::{AssetBundle, CompilerSettings};

use ids::IdGenerator;
use references::lower_expression;

/// Name of the synthesized action that writes runtime globals.
pub const INIT_GLOBALS_ACTION: &str = "init-globals";

/// Per-call lowering state.
pub(crate) struct Lowerer<'a> {
    settings: &'a CompilerSettings,
    actions: ActionSet<'a>,
    /// Where the body being lowered was defined; calls resolve against the
    /// actions visible from there.
    origin: ActionOrigin,
    /// Library actions called from library bodies without being imported by
    /// the program, keyed by the name they are emitted under.
    reached: IndexMap<String, LogicalAction<'a>>,
    ids: IdGenerator,
    source_map: SourceMap,
}

impl<'a> Lowerer<'a> {
    fn new(settings: &'a CompilerSettings, actions: ActionSet<'a>) -> Self {
        Self {
            settings,
            actions,
            origin: ActionOrigin::Local,
            reached: IndexMap::new(),
            ids: IdGenerator::new(settings.id_strategy),
            source_map: SourceMap::new(),
        }
    }

    fn entity_id(&mut self, kind: &str, location: SourceLocation) -> String {
        let id = self.ids.next(kind);
        self.source_map.insert(id.clone(), location);
        id
    }

    /// Lower `action` under `name`. Its body sees the actions of the
    /// document that defines it.
    fn lower_action(
        &mut self,
        action: &LogicalAction<'_>,
        name: &str,
        globals: &GlobalScope,
    ) -> Result<EndableActionConfig, TransformError> {
        let definition: &ActionDefinition = action.definition;
        let caller = std::mem::replace(&mut self.origin, action.origin.clone());
        let lowered = self.lower_action_body(definition, globals);
        self.origin = caller;
        let (start_operations, end_operations) = lowered?;
        Ok(EndableActionConfig {
            id: self.entity_id("action", definition.location),
            name: name.to_string(),
            start_operations,
            end_operations,
        })
    }

    fn lower_action_body(
        &mut self,
        definition: &ActionDefinition,
        globals: &GlobalScope,
    ) -> Result<(Vec<OperationConfig>, Vec<OperationConfig>), TransformError> {
        let scope = ScopeContext::action(globals, definition.parameter_names(), ParameterBinding::Named);
        match &definition.body {
            ActionBody::Regular { operations } => Ok((self.lower_block(operations, &mut scope.enter_block())?, Vec::new())),
            ActionBody::Endable { start_operations, end_operations } => Ok((
                self.lower_block(start_operations, &mut scope.enter_block())?,
                self.lower_block(end_operations, &mut scope.enter_block())?,
            )),
        }
    }

    /// Event handlers receive positional arguments, so their parameters
    /// lower to `eventArgs` slots.
    fn lower_event_action(
        &mut self,
        event: &EventActionDefinition,
        globals: &GlobalScope,
    ) -> Result<EventActionConfig, TransformError> {
        let names = event.parameters.iter().map(|p| p.name.clone()).collect();
        let mut scope = ScopeContext::action(globals, names, ParameterBinding::EventArgs);
        let start_operations = self.lower_block(&event.operations, &mut scope)?;
        Ok(EventActionConfig {
            id: self.entity_id("event-action", event.location),
            name: event.name.clone(),
            event_name: event.event_name.clone(),
            event_topic: event.event_topic.clone(),
            start_operations,
        })
    }
}

/// Runtime globals are collected into one init action that writes them with
/// `setGlobalData`. Each initializer sees the globals declared before it.
fn lower_runtime_globals(
    program: &Program,
    globals: &mut GlobalScope,
    lowerer: &mut Lowerer<'_>,
) -> Result<Option<EndableActionConfig>, TransformError> {
    let mut properties = Map::new();
    let mut first_location = None;
    for decl in program.variables() {
        if globals.constants.contains(&decl.name) {
            continue;
        }
        let value = {
            let scope = ScopeContext::top_level(globals);
            lower_expression(&decl.value, &scope)?
        };
        globals.runtime.insert(decl.name.clone());
        properties.insert(decl.name.clone(), value);
        first_location.get_or_insert(decl.location);
    }
    let Some(location) = first_location else {
        return Ok(None);
    };

    let mut data = OperationData::new();
    data.insert("properties".to_string(), Value::Object(properties));
    let write = lowerer.synthesize("setGlobalData", data, location);
    Ok(Some(EndableActionConfig {
        id: lowerer.entity_id("action", location),
        name: INIT_GLOBALS_ACTION.to_string(),
        start_operations: vec![write],
        end_operations: Vec::new(),
    }))
}

/// Lower `program` into an engine configuration with its source map.
///
/// Passes run in a fixed order: constants, runtime globals, imports,
/// actions, event actions, timelines, dependency validation, assembly.
pub fn lower_program(
    program: &Program,
    documents: &dyn DocumentResolver,
    assets: &AssetBundle,
    settings: &CompilerSettings,
) -> Result<EligiusIR, TransformError> {
    let mut globals = GlobalScope {
        constants: build_constant_map(program),
        runtime: IndexSet::new(),
    };

    let actions = collect_actions(program, documents);
    let mut lowerer = Lowerer::new(settings, actions);

    let init_actions: Vec<EndableActionConfig> =
        lower_runtime_globals(program, &mut globals, &mut lowerer)?.into_iter().collect();
    let globals = globals;

    let logical_actions = lowerer.actions.program.clone();
    let mut action_configs = Vec::with_capacity(logical_actions.len());
    for action in &logical_actions {
        action_configs.push(lowerer.lower_action(action, action.name(), &globals)?);
    }
    // Lowering a reached helper can reach further helpers.
    let mut next = 0;
    while let Some((name, action)) = lowerer.reached.get_index(next).map(|(n, a)| (n.clone(), a.clone())) {
        tracing::debug!(action = %name, "lowering library-internal action");
        action_configs.push(lowerer.lower_action(&action, &name, &globals)?);
        next += 1;
    }

    let mut event_actions = Vec::new();
    for event in program.event_actions() {
        event_actions.push(lowerer.lower_event_action(event, &globals)?);
    }

    if program.timelines().next().is_none() {
        return Err(TransformError::invalid_timeline(
            "A program must declare at least one timeline",
            program.location,
        ));
    }
    let mut timelines = Vec::new();
    let mut provider_locations = IndexMap::new();
    for timeline in program.timelines() {
        let lowered = lowerer.lower_timeline(timeline, &globals)?;
        provider_locations.entry(lowered.timeline_type).or_insert(timeline.location);
        timelines.push(lowered);
    }

    let mut timeline_provider_settings = IndexMap::new();
    for (timeline_type, location) in provider_locations {
        timeline_provider_settings.insert(
            timeline_type.as_str().to_string(),
            TimelineProviderSetting {
                id: lowerer.entity_id("timeline-provider", location),
                system_name: timeline_type.provider_system_name().to_string(),
            },
        );
    }

    let config_id = match &settings.config_id {
        Some(id) => {
            lowerer.source_map.insert(id.clone(), program.location);
            id.clone()
        }
        None => lowerer.entity_id("config", program.location),
    };
    let (language, available_languages) = assets::languages(assets, settings);
    let config = EngineConfig {
        id: config_id,
        engine: EngineInfo {
            system_name: settings.engine_system_name.clone(),
        },
        container_selector: timelines.first().map(|t| t.selector.clone()).unwrap_or_default(),
        language,
        available_languages,
        layout_template: assets::layout_template(assets, &timelines),
        css_files: assets::css_files(assets, program),
        init_actions,
        actions: action_configs,
        event_actions,
        timelines,
        timeline_provider_settings,
    };

    validate_config_dependencies(&config, &lowerer.source_map, settings.seed_end_operations)?;

    let metadata = IrMetadata {
        compiler_version: env!("CARGO_PKG_VERSION").to_string(),
        timeline_count: config.timelines.len(),
        action_count: config.actions.len(),
        operation_count: config.operations().count(),
        constant_count: globals.constants.len(),
    };
    tracing::info!(
        timelines = metadata.timeline_count,
        actions = metadata.action_count,
        operations = metadata.operation_count,
        ids = lowerer.ids.issued(),
        "lowered program"
    );

    Ok(EligiusIR {
        config,
        source_map: lowerer.source_map,
        metadata,
    })
}

/// Dataflow check over every start/end list in the configuration.
///
/// With `seed_end` the end list starts from what the start list produced,
/// matching how the engine runs the two halves on one operation data bag.
fn validate_config_dependencies(
    config: &EngineConfig,
    source_map: &SourceMap,
    seed_end: bool,
) -> Result<(), TransformError> {
    for action in config.init_actions.iter().chain(&config.actions) {
        check_halves(&action.name, &action.start_operations, &action.end_operations, source_map, seed_end)?;
    }
    for event in &config.event_actions {
        check_halves(&event.name, &event.start_operations, &[], source_map, seed_end)?;
    }
    for timeline in &config.timelines {
        for action in &timeline.timeline_actions {
            check_halves(&action.name, &action.start_operations, &action.end_operations, source_map, seed_end)?;
        }
    }
    Ok(())
}

fn check_halves(
    owner: &str,
    start: &[OperationConfig],
    end: &[OperationConfig],
    source_map: &SourceMap,
    seed_end: bool,
) -> Result<(), TransformError> {
    let mut available = AvailableOutputs::new();
    check_operations(owner, start, &mut available, source_map)?;

    let mut end_available = if seed_end {
        available
    } else {
        AvailableOutputs::new()
    };
    check_operations(owner, end, &mut end_available, source_map)
}

fn check_operations(
    owner: &str,
    operations: &[OperationConfig],
    available: &mut AvailableOutputs,
    source_map: &SourceMap,
) -> Result<(), TransformError> {
    validate_sequence(operations.iter().map(|op| op.system_name.as_str()), available).map_err(|(index, missing)| {
        let location = operations
            .get(index)
            .and_then(|op| source_map.get(&op.id))
            .unwrap_or_default();
        TransformError::validation(format!("In '{owner}': {missing}"), location)
    })
}
