//! Layout, stylesheet, and language fields of the engine configuration.
//! Pre-loaded assets win; otherwise the values are derived from the program.

use crate::dsl::ast::{AssetKind, Program};
use crate::model::{LanguageLabel, TimelineConfig};
use crate::settings::{AssetBundle, CompilerSettings};

/// Layout HTML: the pre-loaded template, or one container element per
/// distinct timeline selector.
pub fn layout_template(assets: &AssetBundle, timelines: &[TimelineConfig]) -> String {
    if let Some(template) = &assets.layout_template {
        return template.clone();
    }
    let mut seen = Vec::new();
    for timeline in timelines {
        if !seen.contains(&timeline.selector.as_str()) {
            seen.push(timeline.selector.as_str());
        }
    }
    seen.into_iter().map(container_element).collect::<Vec<_>>().join("\n")
}

/// `#id` and `.class` selectors become matching divs; anything more complex
/// is kept as a data attribute.
pub fn container_element(selector: &str) -> String {
    let simple = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if let Some(id) = selector.strip_prefix('#').filter(|s| simple(s)) {
        format!("<div id=\"{id}\"></div>")
    } else if let Some(class) = selector.strip_prefix('.').filter(|s| simple(s)) {
        format!("<div class=\"{class}\"></div>")
    } else {
        format!("<div data-selector=\"{}\"></div>", escape_attribute(selector))
    }
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Stylesheets: the pre-loaded list, or the paths of `styles` imports.
pub fn css_files(assets: &AssetBundle, program: &Program) -> Vec<String> {
    if let Some(files) = &assets.css_files {
        return files.clone();
    }
    program
        .asset_imports()
        .filter(|import| import.kind == AssetKind::Styles)
        .map(|import| import.path.clone())
        .collect()
}

/// Active language and the list offered to the user.
pub fn languages(assets: &AssetBundle, settings: &CompilerSettings) -> (String, Vec<LanguageLabel>) {
    let language = assets
        .locale
        .as_ref()
        .map(|locale| locale.default_language.clone())
        .filter(|code| !code.is_empty())
        .unwrap_or_else(|| settings.default_language.clone());

    let mut available = assets
        .locale
        .as_ref()
        .map(|locale| locale.languages.clone())
        .unwrap_or_default();
    if !available.iter().any(|label| label.code == language) {
        available.insert(
            0,
            LanguageLabel {
                code: language.clone(),
                label: language.clone(),
            },
        );
    }
    (language, available)
}
