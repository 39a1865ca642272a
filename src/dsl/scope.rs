//! Lexical scope threaded through lowering.
//!
//! A [`ScopeContext`] is a plain value. Entering a block clones it, so
//! declarations in one `if` branch never reach the sibling branch or the
//! code after the statement.

use indexmap::IndexSet;
use serde_json::Value;

use super::ast::VariableDeclaration;
use super::constants::{evaluate_expression, ConstantLookup, ConstantMap};

/// Program-level names: folded constants and the runtime globals written by
/// the init action.
#[derive(Debug, Clone, Default)]
pub struct GlobalScope {
    pub constants: ConstantMap,
    pub runtime: IndexSet<String>,
}

/// How bare parameter references lower.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterBinding {
    /// `$operationdata.<name>`
    Named,
    /// `$operationdata.eventArgs[<index>]`
    EventArgs,
}

/// What a bare identifier or `@@name` refers to in the current scope.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved<'s> {
    Parameter { index: usize, binding: ParameterBinding },
    LoopItem,
    StaggerItem(&'s Value),
    OuterLoopItem,
}

#[derive(Debug, Clone)]
pub struct ScopeContext<'g> {
    globals: &'g GlobalScope,
    in_action_body: bool,
    parameters: Vec<String>,
    binding: ParameterBinding,
    /// Innermost last.
    loop_variables: Vec<String>,
    stagger_item: Option<Value>,
    locals: ConstantMap,
    runtime_locals: IndexSet<String>,
}

impl<'g> ScopeContext<'g> {
    /// Scope for inline timeline operations: no parameters.
    pub fn top_level(globals: &'g GlobalScope) -> Self {
        Self {
            globals,
            in_action_body: false,
            parameters: Vec::new(),
            binding: ParameterBinding::Named,
            loop_variables: Vec::new(),
            stagger_item: None,
            locals: ConstantMap::new(),
            runtime_locals: IndexSet::new(),
        }
    }

    /// Fresh scope for an action body seeded with its parameter names.
    pub fn action(globals: &'g GlobalScope, parameters: Vec<String>, binding: ParameterBinding) -> Self {
        Self {
            in_action_body: true,
            parameters,
            binding,
            ..Self::top_level(globals)
        }
    }

    /// Copy for a nested block. Declarations made in the copy stay there.
    pub fn enter_block(&self) -> Self {
        self.clone()
    }

    /// Copy for a loop body with `item_name` as the active loop variable.
    pub fn enter_loop(&self, item_name: &str) -> Self {
        let mut scope = self.clone();
        scope.loop_variables.push(item_name.to_string());
        scope
    }

    /// Copy in which `@@item` / `@@currentItem` resolve to `item`.
    pub fn with_stagger_item(&self, item: Value) -> Self {
        let mut scope = self.clone();
        scope.stagger_item = Some(item);
        scope
    }

    pub fn in_action_body(&self) -> bool {
        self.in_action_body
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn loop_variable(&self) -> Option<&str> {
        self.loop_variables.last().map(String::as_str)
    }

    pub fn globals(&self) -> &'g GlobalScope {
        self.globals
    }

    /// Record a local declaration. Returns the folded value when the
    /// initializer is constant; otherwise the name becomes a runtime local.
    ///
    /// The initializer sees the bindings in effect before the declaration.
    pub fn declare(&mut self, decl: &VariableDeclaration) -> Option<Value> {
        let folded = evaluate_expression(&decl.value, &*self);
        self.locals.remove(&decl.name);
        self.runtime_locals.shift_remove(&decl.name);
        match folded {
            Some(value) => Some(self.locals.bind(decl, value).clone()),
            None => {
                self.runtime_locals.insert(decl.name.clone());
                None
            }
        }
    }

    pub fn is_runtime_local(&self, name: &str) -> bool {
        self.runtime_locals.contains(name)
    }

    pub fn is_runtime_global(&self, name: &str) -> bool {
        self.globals.runtime.contains(name)
    }

    /// Resolve a bare identifier. Loop variables shadow parameters.
    pub fn resolve_identifier(&self, name: &str) -> Option<Resolved<'_>> {
        if self.loop_variable() == Some(name) {
            return Some(Resolved::LoopItem);
        }
        if self.loop_variables.iter().any(|v| v == name) {
            return Some(Resolved::OuterLoopItem);
        }
        let index = self.parameters.iter().position(|p| p == name)?;
        self.in_action_body.then_some(Resolved::Parameter {
            index,
            binding: self.binding,
        })
    }

    /// Resolve `@@name` when it names a loop or stagger item.
    pub fn resolve_system_property(&self, name: &str) -> Option<Resolved<'_>> {
        if let Some(item) = &self.stagger_item {
            if name == "item" || name == "currentItem" {
                return Some(Resolved::StaggerItem(item));
            }
        }
        if self.loop_variable() == Some(name) {
            return Some(Resolved::LoopItem);
        }
        None
    }
}

impl ConstantLookup for ScopeContext<'_> {
    /// The active loop variable and runtime locals shadow constants.
    fn constant(&self, name: &str) -> Option<&Value> {
        if self.loop_variable() == Some(name) || self.runtime_locals.contains(name) {
            return None;
        }
        self.locals
            .constant(name)
            .or_else(|| self.globals.constants.constant(name))
    }
}
