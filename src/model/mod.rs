pub mod config;
pub mod source_map;

pub use config::{
    Duration, EligiusIR, EndableActionConfig, EngineConfig, EngineInfo, EventActionConfig,
    IrMetadata, LanguageLabel, OperationConfig, TimelineActionConfig, TimelineConfig,
    TimelineProviderSetting, TimelineType,
};
pub use source_map::SourceMap;
