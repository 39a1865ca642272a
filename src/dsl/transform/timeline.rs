//! Timeline lowering. Every event form ends up as a list of timed actions;
//! a cursor carries the previous event's end so relative times and
//! `sequence`/`stagger` blocks lay out after it.

use serde_json::Value;

use crate::dsl::ast::{ActionCall, SourceLocation, Timeline, TimelineAction, TimelineEvent, TimelineProvider};
use crate::dsl::constants::evaluate_expression;
use crate::dsl::scope::{GlobalScope, ScopeContext};
use crate::error::{suggestion_text, TransformError};
use crate::model::{Duration, OperationConfig, TimelineActionConfig, TimelineConfig, TimelineType};
use crate::registry::validation::suggest_from;

use super::operations::CallPosition;
use super::time::{evaluate_duration, evaluate_time};
use super::Lowerer;

/// Engine timeline type for a provider keyword.
pub fn timeline_type(provider: TimelineProvider) -> TimelineType {
    match provider {
        TimelineProvider::Video | TimelineProvider::Audio => TimelineType::Mediaplayer,
        TimelineProvider::Raf | TimelineProvider::Custom => TimelineType::Animation,
    }
}

impl<'a> Lowerer<'a> {
    pub(super) fn lower_timeline(
        &mut self,
        timeline: &Timeline,
        globals: &GlobalScope,
    ) -> Result<TimelineConfig, TransformError> {
        let id = self.ids.next("timeline");
        self.source_map.insert(id.clone(), timeline.location);

        let scope = ScopeContext::top_level(globals);
        let mut actions = Vec::new();
        let mut cursor = 0.0_f64;
        for event in &timeline.events {
            cursor = self.lower_event(timeline, event, &scope, cursor, &mut actions)?;
        }
        let duration = actions
            .iter()
            .map(|a: &TimelineActionConfig| a.duration.end)
            .fold(0.0_f64, f64::max);

        tracing::debug!(
            timeline = %timeline.name,
            actions = actions.len(),
            duration,
            "lowered timeline"
        );
        Ok(TimelineConfig {
            id,
            uri: timeline.source.clone(),
            timeline_type: timeline_type(timeline.provider),
            duration,
            looping: self.settings.timeline_loop,
            selector: timeline.container_selector.clone(),
            timeline_actions: actions,
        })
    }

    /// Lower one event and return the new cursor.
    fn lower_event(
        &mut self,
        timeline: &Timeline,
        event: &TimelineEvent,
        scope: &ScopeContext<'_>,
        cursor: f64,
        out: &mut Vec<TimelineActionConfig>,
    ) -> Result<f64, TransformError> {
        match event {
            TimelineEvent::Timed { range, action, location } => {
                let start = evaluate_time(&range.start, cursor)?;
                let end = evaluate_time(&range.end, cursor)?;
                let duration = Duration::new(start, end).ok_or_else(|| {
                    TransformError::invalid_event(
                        format!("Invalid time range {start}s..{end}s: start must be >= 0 and end must not precede start"),
                        *location,
                    )
                })?;
                let lowered = self.lower_timeline_action(timeline, action, duration, scope, *location, out.len())?;
                out.push(lowered);
                Ok(end)
            }
            TimelineEvent::Sequence { items, .. } => {
                let mut start = cursor;
                for item in items {
                    let end = start + evaluate_duration(&item.duration)?;
                    let duration = Duration::new(start, end).ok_or_else(|| {
                        TransformError::invalid_event("Invalid sequence item duration", item.location)
                    })?;
                    let action = TimelineAction::Named { call: item.call.clone() };
                    let lowered = self.lower_timeline_action(timeline, &action, duration, scope, item.location, out.len())?;
                    out.push(lowered);
                    start = end;
                }
                Ok(start)
            }
            TimelineEvent::Stagger { delay, items, action, duration, location } => {
                let delay = evaluate_duration(delay)?;
                let length = evaluate_duration(duration)?;
                let Some(Value::Array(values)) = evaluate_expression(items, scope) else {
                    return Err(TransformError::invalid_event(
                        "Stagger items must be a constant array",
                        items.location,
                    ));
                };

                let mut last_end = cursor;
                for (k, item) in values.into_iter().enumerate() {
                    #[allow(clippy::cast_precision_loss)]
                    let start = cursor + k as f64 * delay;
                    let end = start + length;
                    let window = Duration::new(start, end).ok_or_else(|| {
                        TransformError::invalid_event("Invalid stagger timing", *location)
                    })?;
                    let item_scope = scope.with_stagger_item(item);
                    let lowered = self.lower_timeline_action(timeline, action, window, &item_scope, *location, out.len())?;
                    out.push(lowered);
                    last_end = last_end.max(end);
                }
                Ok(last_end)
            }
        }
    }

    fn lower_timeline_action(
        &mut self,
        timeline: &Timeline,
        action: &TimelineAction,
        duration: Duration,
        scope: &ScopeContext<'_>,
        location: SourceLocation,
        index: usize,
    ) -> Result<TimelineActionConfig, TransformError> {
        let (name, start_operations, end_operations) = match action {
            TimelineAction::Inline { start_operations, end_operations } => (
                format!("{}-event-{}", timeline.name, index + 1),
                self.lower_block(start_operations, &mut scope.enter_block())?,
                self.lower_block(end_operations, &mut scope.enter_block())?,
            ),
            TimelineAction::Named { call } => {
                let (start, end) = self.lower_action_call(call, scope)?;
                (call.name.clone(), start, end)
            }
        };

        let id = self.ids.next("timeline-action");
        self.source_map.insert(id.clone(), location);
        Ok(TimelineActionConfig {
            id,
            name,
            duration,
            start_operations,
            end_operations,
        })
    }

    /// Start and end operation lists for a named action invoked from a
    /// timeline. Only endable actions get an end step.
    fn lower_action_call(
        &mut self,
        call: &ActionCall,
        scope: &ScopeContext<'_>,
    ) -> Result<(Vec<OperationConfig>, Vec<OperationConfig>), TransformError> {
        let Some((name, definition)) = self.find_action(&call.name) else {
            let suggestions = suggest_from(&call.name, self.actions.program.iter().map(|a| a.name()));
            return Err(TransformError::validation(
                format!("Unknown action '{}'{}", call.name, suggestion_text(&suggestions)),
                call.location,
            ));
        };
        let start = self.invoke_action(&name, definition, &call.args, scope, CallPosition::Start, call.location)?;
        let end = if definition.is_endable() {
            self.invoke_action(&name, definition, &call.args, scope, CallPosition::End, call.location)?
        } else {
            Vec::new()
        };
        Ok((start, end))
    }
}
