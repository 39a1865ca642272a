use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::model::LanguageLabel;

// ── Compiler settings ───────────────────────────────────────────

/// How generated entity ids are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[cfg_attr(feature = "ts-export", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum IdStrategy {
    /// Random v4 UUIDs.
    #[default]
    Uuid,
    /// `<prefix>-<n>` counters, stable across runs. Useful for snapshot tests.
    Sequential,
}

/// Options for one compilation, read from a JSON file next to the program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[cfg_attr(feature = "ts-export", derive(ts_rs::TS), ts(export))]
#[serde(default)]
pub struct CompilerSettings {
    pub version: u32,
    /// Fixed id for the engine configuration. None = generated.
    pub config_id: Option<String>,
    pub engine_system_name: String,
    pub default_language: String,
    pub id_strategy: IdStrategy,
    /// Validate end operations starting from the outputs of the start list.
    pub seed_end_operations: bool,
    pub timeline_loop: bool,
}

pub const SETTINGS_VERSION: u32 = 1;

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            config_id: None,
            engine_system_name: "EligiusEngine".to_string(),
            default_language: "en-US".to_string(),
            id_strategy: IdStrategy::Uuid,
            seed_end_operations: true,
            timeline_loop: false,
        }
    }
}

impl CompilerSettings {
    /// Defaults with sequential ids, for reproducible output.
    pub fn deterministic() -> Self {
        Self {
            id_strategy: IdStrategy::Sequential,
            ..Self::default()
        }
    }
}

/// Read a JSON file into `T`.
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, SettingsError> {
    let data = std::fs::read_to_string(path)?;
    let value = serde_json::from_str(&data)?;
    Ok(value)
}

/// Load settings from `path`. A missing file yields the defaults.
pub fn load_settings(path: &Path) -> Result<CompilerSettings, SettingsError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no settings file, using defaults");
        return Ok(CompilerSettings::default());
    }
    let settings: CompilerSettings = read_json(path)?;
    if settings.version > SETTINGS_VERSION {
        return Err(SettingsError::Version(settings.version));
    }
    Ok(settings)
}

// ── Pre-loaded assets ───────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[cfg_attr(feature = "ts-export", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct LocaleData {
    pub default_language: String,
    #[serde(default)]
    pub languages: Vec<LanguageLabel>,
}

/// Asset results loaded by the front end before lowering. Anything absent
/// is synthesized from the program.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[cfg_attr(feature = "ts-export", derive(ts_rs::TS), ts(export))]
#[serde(default, rename_all = "camelCase")]
pub struct AssetBundle {
    pub layout_template: Option<String>,
    pub css_files: Option<Vec<String>>,
    pub locale: Option<LocaleData>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(name);
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = temp_dir("eligian_test_settings_missing");
        let settings = load_settings(&dir.join("settings.json")).unwrap();
        assert_eq!(settings, CompilerSettings::default());
        assert!(settings.seed_end_operations);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = temp_dir("eligian_test_settings_partial");
        let path = dir.join("settings.json");
        std::fs::write(&path, r#"{ "id_strategy": "sequential", "timeline_loop": true }"#).unwrap();

        let settings = load_settings(&path).expect("should load");
        assert_eq!(settings.id_strategy, IdStrategy::Sequential);
        assert!(settings.timeline_loop);
        assert_eq!(settings.engine_system_name, "EligiusEngine");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn newer_version_is_rejected() {
        let dir = temp_dir("eligian_test_settings_version");
        let path = dir.join("settings.json");
        std::fs::write(&path, r#"{ "version": 99 }"#).unwrap();
        assert!(matches!(load_settings(&path), Err(SettingsError::Version(99))));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = temp_dir("eligian_test_settings_bad");
        let path = dir.join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_settings(&path), Err(SettingsError::Json(_))));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn asset_bundle_reads_camel_case() {
        let bundle: AssetBundle = serde_json::from_str(
            r#"{ "layoutTemplate": "<div></div>",
                 "locale": { "defaultLanguage": "nl-NL",
                             "languages": [{ "languageCode": "nl-NL", "label": "Nederlands" }] } }"#,
        )
        .unwrap();
        assert_eq!(bundle.layout_template.as_deref(), Some("<div></div>"));
        assert!(bundle.css_files.is_none());
        assert_eq!(bundle.locale.unwrap().languages[0].code, "nl-NL");
    }
}
