use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::registry::params::OperationData;

use super::source_map::SourceMap;

/// One call of a runtime operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[cfg_attr(feature = "ts-export", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct OperationConfig {
    pub id: String,
    pub system_name: String,
    #[cfg_attr(feature = "ts-export", ts(type = "Record<string, unknown>"))]
    pub operation_data: OperationData,
}

/// A named action with start and end halves. Regular actions have an empty
/// end list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[cfg_attr(feature = "ts-export", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct EndableActionConfig {
    pub id: String,
    pub name: String,
    pub start_operations: Vec<OperationConfig>,
    pub end_operations: Vec<OperationConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[cfg_attr(feature = "ts-export", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct EventActionConfig {
    pub id: String,
    pub name: String,
    pub event_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_topic: Option<String>,
    pub start_operations: Vec<OperationConfig>,
}

/// Active window of a timeline action, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[cfg_attr(feature = "ts-export", derive(ts_rs::TS), ts(export))]
pub struct Duration {
    pub start: f64,
    pub end: f64,
}

impl Duration {
    /// Returns None if start is negative or end precedes start.
    pub fn new(start: f64, end: f64) -> Option<Self> {
        if start >= 0.0 && end >= start && end.is_finite() {
            Some(Self { start, end })
        } else {
            None
        }
    }

    pub fn length(&self) -> f64 {
        self.end - self.start
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[cfg_attr(feature = "ts-export", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct TimelineActionConfig {
    pub id: String,
    pub name: String,
    pub duration: Duration,
    pub start_operations: Vec<OperationConfig>,
    pub end_operations: Vec<OperationConfig>,
}

/// Timeline driver family understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[cfg_attr(feature = "ts-export", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum TimelineType {
    Animation,
    Mediaplayer,
}

impl TimelineType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Animation => "animation",
            Self::Mediaplayer => "mediaplayer",
        }
    }

    pub fn all() -> &'static [TimelineType] {
        &[Self::Animation, Self::Mediaplayer]
    }

    /// Engine class that drives timelines of this type.
    pub fn provider_system_name(self) -> &'static str {
        match self {
            Self::Animation => "RequestAnimationFrameTimelineProvider",
            Self::Mediaplayer => "MediaElementTimelineProvider",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[cfg_attr(feature = "ts-export", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct TimelineConfig {
    pub id: String,
    pub uri: Option<String>,
    #[serde(rename = "type")]
    pub timeline_type: TimelineType,
    pub duration: f64,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub selector: String,
    pub timeline_actions: Vec<TimelineActionConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[cfg_attr(feature = "ts-export", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct TimelineProviderSetting {
    pub id: String,
    pub system_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[cfg_attr(feature = "ts-export", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct EngineInfo {
    pub system_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[cfg_attr(feature = "ts-export", derive(ts_rs::TS), ts(export))]
pub struct LanguageLabel {
    #[serde(rename = "languageCode")]
    pub code: String,
    pub label: String,
}

/// The configuration object handed to the playback engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[cfg_attr(feature = "ts-export", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    pub id: String,
    pub engine: EngineInfo,
    pub container_selector: String,
    pub language: String,
    pub available_languages: Vec<LanguageLabel>,
    pub layout_template: String,
    pub css_files: Vec<String>,
    pub init_actions: Vec<EndableActionConfig>,
    pub actions: Vec<EndableActionConfig>,
    pub event_actions: Vec<EventActionConfig>,
    pub timelines: Vec<TimelineConfig>,
    pub timeline_provider_settings: IndexMap<String, TimelineProviderSetting>,
}

impl EngineConfig {
    /// Every operation in the configuration, in document order.
    pub fn operations(&self) -> impl Iterator<Item = &OperationConfig> {
        let actions = self
            .init_actions
            .iter()
            .chain(&self.actions)
            .flat_map(|a| a.start_operations.iter().chain(&a.end_operations));
        let events = self.event_actions.iter().flat_map(|e| e.start_operations.iter());
        let timelines = self
            .timelines
            .iter()
            .flat_map(|t| &t.timeline_actions)
            .flat_map(|a| a.start_operations.iter().chain(&a.end_operations));
        actions.chain(events).chain(timelines)
    }

    /// Every generated id with the kind of entity it names.
    pub fn ids(&self) -> Vec<(&str, &'static str)> {
        let mut ids = vec![(self.id.as_str(), "config")];
        for action in self.init_actions.iter().chain(&self.actions) {
            ids.push((action.id.as_str(), "action"));
        }
        for event in &self.event_actions {
            ids.push((event.id.as_str(), "eventAction"));
        }
        for timeline in &self.timelines {
            ids.push((timeline.id.as_str(), "timeline"));
            for action in &timeline.timeline_actions {
                ids.push((action.id.as_str(), "timelineAction"));
            }
        }
        for provider in self.timeline_provider_settings.values() {
            ids.push((provider.id.as_str(), "timelineProvider"));
        }
        for op in self.operations() {
            ids.push((op.id.as_str(), "operation"));
        }
        ids
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[cfg_attr(feature = "ts-export", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct IrMetadata {
    pub compiler_version: String,
    pub timeline_count: usize,
    pub action_count: usize,
    pub operation_count: usize,
    pub constant_count: usize,
}

/// Result of one compilation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EligiusIR {
    pub config: EngineConfig,
    pub source_map: SourceMap,
    pub metadata: IrMetadata,
}
