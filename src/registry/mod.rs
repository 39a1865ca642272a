pub mod catalog;
pub mod params;
pub mod reference;
pub mod validation;

use std::sync::LazyLock;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

pub use catalog::OPERATIONS;

// ── Parameter types ─────────────────────────────────────────────

/// Type tag accepted by an operation parameter.
///
/// Most tags are semantic refinements of a JSON string; they exist so the
/// reference docs and diagnostics can say *which* string is expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ParamType {
    String,
    Number,
    Boolean,
    Object,
    Array,
    ClassName,
    Selector,
    HtmlContent,
    Url,
    Expression,
    ActionName,
    EventName,
    Any,
}

impl ParamType {
    pub fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
            Self::ClassName => "className",
            Self::Selector => "selector",
            Self::HtmlContent => "htmlContent",
            Self::Url => "url",
            Self::Expression => "expression",
            Self::ActionName => "actionName",
            Self::EventName => "eventName",
            Self::Any => "any",
        }
    }

    /// Whether a literal JSON value fits this tag.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Any => true,
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
            Self::String
            | Self::ClassName
            | Self::Selector
            | Self::HtmlContent
            | Self::Url
            | Self::Expression
            | Self::ActionName
            | Self::EventName => value.is_string(),
        }
    }
}

/// What a parameter accepts: one or more type tags, or a fixed set of literals.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(tag = "kind", content = "values", rename_all = "camelCase")]
pub enum ParamTypes {
    Types(&'static [ParamType]),
    Constants(&'static [&'static str]),
}

impl ParamTypes {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Types(types) => types.is_empty(),
            Self::Constants(values) => values.is_empty(),
        }
    }

    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::Types(types) => types.iter().any(|t| t.accepts(value)),
            Self::Constants(values) => match value {
                Value::String(s) => values.contains(&s.as_str()),
                _ => false,
            },
        }
    }

    /// Human-readable list of what is accepted, for diagnostics.
    pub fn describe(&self) -> Vec<String> {
        match self {
            Self::Types(types) => types.iter().map(|t| t.name().to_string()).collect(),
            Self::Constants(values) => values.iter().map(|v| format!("\"{v}\"")).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSpec {
    pub name: &'static str,
    pub types: ParamTypes,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<&'static str>,
    pub description: &'static str,
}

// ── Operation metadata ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OperationCategory {
    Dom,
    Class,
    Animation,
    Data,
    ControlFlow,
    Action,
    Event,
    Controller,
}

impl OperationCategory {
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Dom => "dom",
            Self::Class => "class",
            Self::Animation => "animation",
            Self::Data => "data",
            Self::ControlFlow => "control-flow",
            Self::Action => "action",
            Self::Event => "event",
            Self::Controller => "controller",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Dom => "Select, create and modify DOM elements",
            Self::Class => "Add, remove and toggle CSS classes",
            Self::Animation => "Animate properties and pause execution",
            Self::Data => "Read and write operation, scope and global data",
            Self::ControlFlow => "Conditional and loop markers produced by if/for",
            Self::Action => "Instantiate and run named actions",
            Self::Event => "Broadcast events to the runtime",
            Self::Controller => "Attach controllers to elements",
        }
    }

    pub fn all() -> &'static [OperationCategory] {
        &[
            Self::Dom,
            Self::Class,
            Self::Animation,
            Self::Data,
            Self::ControlFlow,
            Self::Action,
            Self::Event,
            Self::Controller,
        ]
    }
}

/// Signature of a built-in runtime operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationSignature {
    pub system_name: &'static str,
    pub description: &'static str,
    pub category: OperationCategory,
    /// Required parameters come first; this order defines positional binding.
    pub parameters: &'static [ParameterSpec],
    /// Values read from the shared operation data bag.
    pub dependencies: &'static [&'static str],
    /// Values written to the shared operation data bag.
    pub outputs: &'static [&'static str],
}

impl OperationSignature {
    pub fn required_count(&self) -> usize {
        self.parameters.iter().filter(|p| p.required).count()
    }

    pub fn optional_count(&self) -> usize {
        self.parameters.len() - self.required_count()
    }

    /// Positional argument count lies in `[required, required + optional]`.
    pub fn accepts_arity(&self, count: usize) -> bool {
        let required = self.required_count();
        count >= required && count <= required + self.optional_count()
    }

    pub fn parameter(&self, name: &str) -> Option<&'static ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

// ── Lookup ──────────────────────────────────────────────────────

static REGISTRY: LazyLock<IndexMap<&'static str, &'static OperationSignature>> =
    LazyLock::new(|| OPERATIONS.iter().map(|op| (op.system_name, op)).collect());

pub fn lookup(name: &str) -> Option<&'static OperationSignature> {
    REGISTRY.get(name).copied()
}

pub fn all_operations() -> impl Iterator<Item = &'static OperationSignature> {
    REGISTRY.values().copied()
}

/// Operations that write `output` to the data bag, in registry order.
pub fn producers_of(output: &str) -> Vec<&'static str> {
    all_operations()
        .filter(|op| op.outputs.contains(&output))
        .map(|op| op.system_name)
        .collect()
}
