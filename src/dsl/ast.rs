//! Syntax tree for the Eligian timeline DSL.
//!
//! The tree is produced by the external parser and handed over as JSON. Every
//! node kind is a closed enum discriminated by `"$type"`, so lowering matches
//! exhaustively instead of dispatching on strings.

use serde::{Deserialize, Serialize};

/// Source position of a node, used for diagnostics and the source map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-export", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts-export", ts(export))]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
    #[serde(default)]
    pub length: u32,
}

impl SourceLocation {
    pub fn new(line: u32, column: u32, length: u32) -> Self {
        Self { line, column, length }
    }

    /// True when the parser did not attach a position.
    pub fn is_unknown(&self) -> bool {
        self.line == 0
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A complete program document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    #[serde(default)]
    pub elements: Vec<ProgramElement>,
    #[serde(default)]
    pub location: SourceLocation,
}

impl Program {
    pub fn variables(&self) -> impl Iterator<Item = &VariableDeclaration> {
        self.elements.iter().filter_map(|e| match e {
            ProgramElement::VariableDeclaration(v) => Some(v),
            _ => None,
        })
    }

    pub fn actions(&self) -> impl Iterator<Item = &ActionDefinition> {
        self.elements.iter().filter_map(|e| match e {
            ProgramElement::ActionDefinition(a) => Some(a),
            _ => None,
        })
    }

    pub fn event_actions(&self) -> impl Iterator<Item = &EventActionDefinition> {
        self.elements.iter().filter_map(|e| match e {
            ProgramElement::EventActionDefinition(a) => Some(a),
            _ => None,
        })
    }

    pub fn timelines(&self) -> impl Iterator<Item = &Timeline> {
        self.elements.iter().filter_map(|e| match e {
            ProgramElement::Timeline(t) => Some(t),
            _ => None,
        })
    }

    pub fn library_imports(&self) -> impl Iterator<Item = &LibraryImport> {
        self.elements.iter().filter_map(|e| match e {
            ProgramElement::LibraryImport(i) => Some(i),
            _ => None,
        })
    }

    pub fn asset_imports(&self) -> impl Iterator<Item = &AssetImport> {
        self.elements.iter().filter_map(|e| match e {
            ProgramElement::AssetImport(i) => Some(i),
            _ => None,
        })
    }
}

/// Top-level statements of a program.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "$type")]
pub enum ProgramElement {
    AssetImport(AssetImport),
    LibraryImport(LibraryImport),
    VariableDeclaration(VariableDeclaration),
    ActionDefinition(ActionDefinition),
    EventActionDefinition(EventActionDefinition),
    Timeline(Timeline),
}

/// `styles "./main.css"`, `layout "./layout.html"`, `provider "./video.mp4"`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetImport {
    pub kind: AssetKind,
    pub path: String,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Layout,
    Styles,
    Provider,
}

/// `import { fadeIn, slideIn as enter } from "./animations.eligian"`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryImport {
    pub path: String,
    #[serde(default)]
    pub actions: Vec<ActionImport>,
    #[serde(default)]
    pub location: SourceLocation,
}

/// One named entry of a library import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionImport {
    pub action: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub location: SourceLocation,
}

/// An imported library document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Library {
    pub name: String,
    #[serde(default)]
    pub imports: Vec<LibraryImport>,
    #[serde(default)]
    pub actions: Vec<ActionDefinition>,
}

/// `const name = value`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableDeclaration {
    pub name: String,
    pub value: Expr,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(default, rename = "type")]
    pub type_annotation: Option<String>,
    #[serde(default)]
    pub location: SourceLocation,
}

/// `action fadeIn(selector) [ ... ]` or `endable action show(sel) [ ... ] [ ... ]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionDefinition {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    pub body: ActionBody,
    #[serde(default)]
    pub location: SourceLocation,
}

impl ActionDefinition {
    pub fn is_endable(&self) -> bool {
        matches!(self.body, ActionBody::Endable { .. })
    }

    pub fn parameter_names(&self) -> Vec<String> {
        self.parameters.iter().map(|p| p.name.clone()).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "$type")]
pub enum ActionBody {
    Regular {
        #[serde(default)]
        operations: Vec<Stmt>,
    },
    #[serde(rename_all = "camelCase")]
    Endable {
        #[serde(default)]
        start_operations: Vec<Stmt>,
        #[serde(default)]
        end_operations: Vec<Stmt>,
    },
}

/// `on event "click" topic "nav" action onClick(target) [ ... ]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventActionDefinition {
    pub name: String,
    pub event_name: String,
    #[serde(default)]
    pub event_topic: Option<String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub operations: Vec<Stmt>,
    #[serde(default)]
    pub location: SourceLocation,
}

/// Statements inside an operation list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "$type")]
pub enum Stmt {
    OperationCall(OperationCall),
    If {
        condition: Expr,
        #[serde(default, rename = "then")]
        then_ops: Vec<Stmt>,
        #[serde(default, rename = "else")]
        else_ops: Option<Vec<Stmt>>,
        #[serde(default)]
        location: SourceLocation,
    },
    #[serde(rename_all = "camelCase")]
    For {
        item_name: String,
        collection: Expr,
        #[serde(default)]
        body: Vec<Stmt>,
        #[serde(default)]
        location: SourceLocation,
    },
    VariableDeclaration(VariableDeclaration),
    Break {
        #[serde(default)]
        location: SourceLocation,
    },
    Continue {
        #[serde(default)]
        location: SourceLocation,
    },
}

impl Stmt {
    pub fn location(&self) -> SourceLocation {
        match self {
            Stmt::OperationCall(call) => call.location,
            Stmt::VariableDeclaration(decl) => decl.location,
            Stmt::If { location, .. }
            | Stmt::For { location, .. }
            | Stmt::Break { location }
            | Stmt::Continue { location } => *location,
        }
    }
}

/// `selectElement(".box")` or a call to a named action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationCall {
    pub name: String,
    #[serde(default)]
    pub args: Vec<Expr>,
    #[serde(default)]
    pub location: SourceLocation,
}

/// `timeline "main" in "#app" using raf { ... }`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    pub name: String,
    pub container_selector: String,
    pub provider: TimelineProvider,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub events: Vec<TimelineEvent>,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineProvider {
    Video,
    Audio,
    Raf,
    Custom,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "$type")]
pub enum TimelineEvent {
    /// `at 0s..5s fadeIn(".box")`
    Timed {
        range: TimeRangeExpr,
        action: TimelineAction,
        #[serde(default)]
        location: SourceLocation,
    },
    /// `sequence { intro() for 2s  main() for 10s }`
    Sequence {
        #[serde(default)]
        items: Vec<SequenceItem>,
        #[serde(default)]
        location: SourceLocation,
    },
    /// `stagger 200ms [".a", ".b"] with fadeIn(@@item) for 1s`
    Stagger {
        delay: TimeExpr,
        items: Expr,
        action: TimelineAction,
        duration: TimeExpr,
        #[serde(default)]
        location: SourceLocation,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeRangeExpr {
    pub start: TimeExpr,
    pub end: TimeExpr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceItem {
    pub call: ActionCall,
    pub duration: TimeExpr,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "$type")]
pub enum TimelineAction {
    #[serde(rename_all = "camelCase")]
    Inline {
        #[serde(default)]
        start_operations: Vec<Stmt>,
        #[serde(default)]
        end_operations: Vec<Stmt>,
    },
    Named { call: ActionCall },
}

/// Invocation of a named action from a timeline event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionCall {
    pub name: String,
    #[serde(default)]
    pub args: Vec<Expr>,
    #[serde(default)]
    pub location: SourceLocation,
}

/// Time position expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeExpr {
    #[serde(flatten)]
    pub kind: TimeExprKind,
    #[serde(default)]
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "$type")]
pub enum TimeExprKind {
    /// `5s`, `200ms`
    Literal {
        value: f64,
        #[serde(default)]
        unit: TimeUnit,
    },
    /// `+2s`
    Relative {
        value: f64,
        #[serde(default)]
        unit: TimeUnit,
    },
    Binary {
        op: TimeOp,
        left: Box<TimeExpr>,
        right: Box<TimeExpr>,
    },
    /// `@start` in time position; never supported.
    Reference { name: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Ms,
    #[default]
    S,
    M,
    H,
}

impl TimeUnit {
    /// `value` in this unit, expressed in seconds.
    pub fn to_seconds(self, value: f64) -> f64 {
        match self {
            TimeUnit::Ms => value / 1000.0,
            TimeUnit::S => value,
            TimeUnit::M => value * 60.0,
            TimeUnit::H => value * 3600.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
}

/// Value expressions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expr {
    #[serde(flatten)]
    pub kind: ExprKind,
    #[serde(default)]
    pub location: SourceLocation,
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Self {
            kind,
            location: SourceLocation::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "$type")]
pub enum ExprKind {
    /// `"text"`
    String { value: String },
    /// `42`, `0.5`
    Number { value: f64 },
    /// `true`, `false`
    Boolean { value: bool },
    Null,
    /// `[1, 2, 3]`
    Array {
        #[serde(default)]
        elements: Vec<Expr>,
    },
    /// `{ opacity: 1, color: "red" }`
    Object {
        #[serde(default)]
        properties: Vec<ObjectProperty>,
    },
    /// Bare identifier: an action parameter (or the active loop variable).
    ParameterReference { name: String },
    /// `@name`
    VariableReference { name: String },
    /// `@@name`
    SystemPropertyReference { name: String },
    /// `$scope.currentItem.title`
    PropertyChain {
        scope: String,
        #[serde(default)]
        properties: Vec<String>,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectProperty {
    pub key: String,
    pub value: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Mod,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    #[serde(rename = "-")]
    Neg,
    #[serde(rename = "!")]
    Not,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        }
    }
}
