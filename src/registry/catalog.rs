use super::{OperationCategory, OperationSignature, ParamType, ParamTypes, ParameterSpec};

/// Built-in operation: single source of truth for name, parameters, and dataflow.
/// Adding an operation means adding one entry here. The validator, parameter
/// mapper, and reference docs all read from this table.
pub static OPERATIONS: &[OperationSignature] = &[
    // ── DOM ─────────────────────────────────────────────────────
    OperationSignature {
        system_name: "selectElement", category: OperationCategory::Dom,
        description: "Select the first element matching a CSS selector",
        parameters: &[
            req("selector", &[ParamType::Selector], "CSS selector of the element"),
            opt("useSelectedElementAsRoot", &[ParamType::Boolean], Some("false"), "Search below the currently selected element"),
        ],
        dependencies: &[], outputs: &["selectedElement"],
    },
    OperationSignature {
        system_name: "createElement", category: OperationCategory::Dom,
        description: "Create a detached element as a template",
        parameters: &[
            req("elementName", &[ParamType::String], "Tag name, e.g. \"div\""),
            opt("text", &[ParamType::String], None, "Text content"),
            opt("attributes", &[ParamType::Object], None, "Attribute name/value pairs"),
        ],
        dependencies: &[], outputs: &["template"],
    },
    OperationSignature {
        system_name: "removeElement", category: OperationCategory::Dom,
        description: "Remove the selected element from the document",
        parameters: &[], dependencies: &["selectedElement"], outputs: &[],
    },
    OperationSignature {
        system_name: "clearElement", category: OperationCategory::Dom,
        description: "Remove all children of the selected element",
        parameters: &[], dependencies: &["selectedElement"], outputs: &[],
    },
    OperationSignature {
        system_name: "toggleElement", category: OperationCategory::Dom,
        description: "Toggle visibility of the selected element",
        parameters: &[], dependencies: &["selectedElement"], outputs: &[],
    },
    OperationSignature {
        system_name: "setElementAttributes", category: OperationCategory::Dom,
        description: "Set attributes on the selected element",
        parameters: &[req("attributes", &[ParamType::Object], "Attribute name/value pairs")],
        dependencies: &["selectedElement"], outputs: &[],
    },
    OperationSignature {
        system_name: "setStyle", category: OperationCategory::Dom,
        description: "Set inline CSS properties on the selected element",
        parameters: &[req("properties", &[ParamType::Object], "CSS property/value pairs")],
        dependencies: &["selectedElement"], outputs: &[],
    },
    OperationSignature {
        system_name: "setElementContent", category: OperationCategory::Dom,
        description: "Insert content into the selected element",
        parameters: &[
            req("template", &[ParamType::String, ParamType::HtmlContent], "HTML or text to insert"),
            ParameterSpec {
                name: "insertionType",
                types: ParamTypes::Constants(&["overwrite", "append", "prepend"]),
                required: false,
                default: Some("overwrite"),
                description: "Where the content goes",
            },
        ],
        dependencies: &["selectedElement"], outputs: &[],
    },
    OperationSignature {
        system_name: "getElementDimensions", category: OperationCategory::Dom,
        description: "Measure the selected element",
        parameters: &[opt("modifier", &[ParamType::String], None, "Adjustment such as \"+10\"")],
        dependencies: &["selectedElement"], outputs: &["dimensions"],
    },
    OperationSignature {
        system_name: "getAttributesFromElement", category: OperationCategory::Dom,
        description: "Read attribute values from the selected element",
        parameters: &[req("attributeNames", &[ParamType::Array], "Names of the attributes to read")],
        dependencies: &["selectedElement"], outputs: &["attributeValues"],
    },
    // ── Classes ─────────────────────────────────────────────────
    OperationSignature {
        system_name: "addClass", category: OperationCategory::Class,
        description: "Add a CSS class to the selected element",
        parameters: &[req("className", &[ParamType::ClassName], "Class to add")],
        dependencies: &["selectedElement"], outputs: &[],
    },
    OperationSignature {
        system_name: "removeClass", category: OperationCategory::Class,
        description: "Remove a CSS class from the selected element",
        parameters: &[req("className", &[ParamType::ClassName], "Class to remove")],
        dependencies: &["selectedElement"], outputs: &[],
    },
    OperationSignature {
        system_name: "toggleClass", category: OperationCategory::Class,
        description: "Toggle a CSS class on the selected element",
        parameters: &[req("className", &[ParamType::ClassName], "Class to toggle")],
        dependencies: &["selectedElement"], outputs: &[],
    },
    // ── Animation ───────────────────────────────────────────────
    OperationSignature {
        system_name: "animate", category: OperationCategory::Animation,
        description: "Animate CSS properties of the selected element",
        parameters: &[
            req("animationProperties", &[ParamType::Object], "Target property values"),
            req("animationDuration", &[ParamType::Number], "Duration in milliseconds"),
            opt("animationEasing", &[ParamType::String], None, "Easing function name"),
        ],
        dependencies: &["selectedElement"], outputs: &[],
    },
    OperationSignature {
        system_name: "wait", category: OperationCategory::Animation,
        description: "Pause the operation sequence",
        parameters: &[req("milliseconds", &[ParamType::Number], "Pause length in milliseconds")],
        dependencies: &[], outputs: &[],
    },
    // ── Data ────────────────────────────────────────────────────
    OperationSignature {
        system_name: "setData", category: OperationCategory::Data,
        description: "Write properties into the operation data bag",
        parameters: &[req("properties", &[ParamType::Object], "Property name/value pairs")],
        dependencies: &[], outputs: &[],
    },
    OperationSignature {
        system_name: "setGlobalData", category: OperationCategory::Data,
        description: "Write properties into the global data store",
        parameters: &[req("properties", &[ParamType::Object], "Property name/value pairs")],
        dependencies: &[], outputs: &[],
    },
    OperationSignature {
        system_name: "setVariable", category: OperationCategory::Data,
        description: "Assign a scope variable",
        parameters: &[
            req("name", &[ParamType::String], "Variable name"),
            req("value", &[ParamType::Any], "Value to assign"),
        ],
        dependencies: &[], outputs: &[],
    },
    OperationSignature {
        system_name: "setOperationData", category: OperationCategory::Data,
        description: "Merge or replace the operation data bag",
        parameters: &[
            req("properties", &[ParamType::Object], "Property name/value pairs"),
            opt("override", &[ParamType::Boolean], Some("false"), "Replace instead of merge"),
        ],
        dependencies: &[], outputs: &[],
    },
    OperationSignature {
        system_name: "clearOperationData", category: OperationCategory::Data,
        description: "Remove properties from the operation data bag",
        parameters: &[opt("properties", &[ParamType::Array], None, "Names to remove; all when omitted")],
        dependencies: &[], outputs: &[],
    },
    OperationSignature {
        system_name: "loadJson", category: OperationCategory::Data,
        description: "Fetch a JSON document",
        parameters: &[
            req("url", &[ParamType::Url], "Location of the document"),
            opt("cache", &[ParamType::Boolean], Some("true"), "Reuse earlier responses"),
        ],
        dependencies: &[], outputs: &["json"],
    },
    OperationSignature {
        system_name: "getQueryParams", category: OperationCategory::Data,
        description: "Read the page query string",
        parameters: &[opt("defaultValues", &[ParamType::Object], None, "Fallback values")],
        dependencies: &[], outputs: &["queryParams"],
    },
    OperationSignature {
        system_name: "calc", category: OperationCategory::Data,
        description: "Arithmetic on two numbers",
        parameters: &[
            req("left", &[ParamType::Number], "Left operand"),
            req("right", &[ParamType::Number], "Right operand"),
            ParameterSpec {
                name: "operator",
                types: ParamTypes::Constants(&["+", "-", "*", "/", "%", "**"]),
                required: true,
                default: None,
                description: "Arithmetic operator",
            },
        ],
        dependencies: &[], outputs: &["calculationResult"],
    },
    OperationSignature {
        system_name: "log", category: OperationCategory::Data,
        description: "Write a value to the console",
        parameters: &[opt("logValue", &[ParamType::Any], None, "Value to log")],
        dependencies: &[], outputs: &[],
    },
    // ── Control flow ────────────────────────────────────────────
    OperationSignature {
        system_name: "when", category: OperationCategory::ControlFlow,
        description: "Start a conditional block",
        parameters: &[req("expression", &[ParamType::Expression], "Condition evaluated at runtime")],
        dependencies: &[], outputs: &[],
    },
    OperationSignature {
        system_name: "otherwise", category: OperationCategory::ControlFlow,
        description: "Start the else branch of a conditional block",
        parameters: &[], dependencies: &[], outputs: &[],
    },
    OperationSignature {
        system_name: "endWhen", category: OperationCategory::ControlFlow,
        description: "Close a conditional block",
        parameters: &[], dependencies: &[], outputs: &[],
    },
    OperationSignature {
        system_name: "forEach", category: OperationCategory::ControlFlow,
        description: "Start a loop over a collection",
        parameters: &[
            req("collection", &[ParamType::Array, ParamType::Expression], "Items to iterate"),
            opt("itemName", &[ParamType::String], None, "Name of the loop variable"),
        ],
        dependencies: &[], outputs: &[],
    },
    OperationSignature {
        system_name: "endForEach", category: OperationCategory::ControlFlow,
        description: "Close a loop",
        parameters: &[], dependencies: &[], outputs: &[],
    },
    OperationSignature {
        system_name: "breakForEach", category: OperationCategory::ControlFlow,
        description: "Leave the innermost loop",
        parameters: &[], dependencies: &[], outputs: &[],
    },
    OperationSignature {
        system_name: "continueForEach", category: OperationCategory::ControlFlow,
        description: "Skip to the next iteration of the innermost loop",
        parameters: &[], dependencies: &[], outputs: &[],
    },
    // ── Actions ─────────────────────────────────────────────────
    OperationSignature {
        system_name: "requestAction", category: OperationCategory::Action,
        description: "Look up an action instance by name",
        parameters: &[req("systemName", &[ParamType::ActionName], "Name of the action")],
        dependencies: &[], outputs: &["actionInstance"],
    },
    OperationSignature {
        system_name: "startAction", category: OperationCategory::Action,
        description: "Run the start operations of the requested action",
        parameters: &[opt("actionOperationData", &[ParamType::Object], None, "Arguments passed to the action")],
        dependencies: &["actionInstance"], outputs: &[],
    },
    OperationSignature {
        system_name: "endAction", category: OperationCategory::Action,
        description: "Run the end operations of the requested action",
        parameters: &[opt("actionOperationData", &[ParamType::Object], None, "Arguments passed to the action")],
        dependencies: &["actionInstance"], outputs: &[],
    },
    // ── Events ──────────────────────────────────────────────────
    OperationSignature {
        system_name: "broadcastEvent", category: OperationCategory::Event,
        description: "Broadcast an event to listeners",
        parameters: &[
            req("eventName", &[ParamType::EventName], "Event to broadcast"),
            opt("eventArgs", &[ParamType::Array], None, "Positional event arguments"),
            opt("eventTopic", &[ParamType::String], None, "Topic filter"),
        ],
        dependencies: &[], outputs: &[],
    },
    // ── Controllers ─────────────────────────────────────────────
    OperationSignature {
        system_name: "getControllerInstance", category: OperationCategory::Controller,
        description: "Create a controller instance by name",
        parameters: &[req("systemName", &[ParamType::String], "Controller name")],
        dependencies: &[], outputs: &["controllerInstance"],
    },
    OperationSignature {
        system_name: "addControllerToElement", category: OperationCategory::Controller,
        description: "Attach the controller instance to the selected element",
        parameters: &[opt("json", &[ParamType::Object], None, "Controller configuration")],
        dependencies: &["selectedElement", "controllerInstance"], outputs: &[],
    },
    OperationSignature {
        system_name: "removeControllerFromElement", category: OperationCategory::Controller,
        description: "Detach a controller from the selected element",
        parameters: &[req("controllerName", &[ParamType::String], "Controller name")],
        dependencies: &["selectedElement"], outputs: &[],
    },
];

const fn req(
    name: &'static str,
    types: &'static [ParamType],
    description: &'static str,
) -> ParameterSpec {
    ParameterSpec {
        name,
        types: ParamTypes::Types(types),
        required: true,
        default: None,
        description,
    }
}

const fn opt(
    name: &'static str,
    types: &'static [ParamType],
    default: Option<&'static str>,
    description: &'static str,
) -> ParameterSpec {
    ParameterSpec {
        name,
        types: ParamTypes::Types(types),
        required: false,
        default,
        description,
    }
}
