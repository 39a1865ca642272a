//! Statement lowering: operation calls, calls to custom actions, local
//! declarations, and the `when`/`forEach` desugaring of `if`/`for`.

use serde_json::{Map, Value};

use crate::dsl::ast::{ActionDefinition, Expr, OperationCall, SourceLocation, Stmt, VariableDeclaration};
use crate::dsl::imports::{find_action_by_name, ActionOrigin};
use crate::dsl::scope::ScopeContext;
use crate::error::{suggestion_text, TransformError};
use crate::model::OperationConfig;
use crate::registry::params::{map_parameters, OperationData};
use crate::registry::{self, validation::suggest_from};

use super::references::{lower_condition, lower_expression};
use super::Lowerer;

/// Which half of a custom action a call site runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPosition {
    Start,
    End,
}

impl<'a> Lowerer<'a> {
    /// Lower a statement list into a flat operation sequence.
    pub(super) fn lower_block(
        &mut self,
        stmts: &[Stmt],
        scope: &mut ScopeContext<'_>,
    ) -> Result<Vec<OperationConfig>, TransformError> {
        let mut out = Vec::new();
        for stmt in stmts {
            self.lower_stmt(stmt, scope, &mut out)?;
        }
        Ok(out)
    }

    fn lower_stmt(
        &mut self,
        stmt: &Stmt,
        scope: &mut ScopeContext<'_>,
        out: &mut Vec<OperationConfig>,
    ) -> Result<(), TransformError> {
        match stmt {
            Stmt::OperationCall(call) => self.lower_call(call, scope, out),
            Stmt::VariableDeclaration(decl) => self.lower_declaration(decl, scope, out),
            Stmt::If { condition, then_ops, else_ops, location } => {
                let expression = lower_condition(condition, scope)?;
                out.push(self.synthesize("when", data([("expression", Value::String(expression))]), *location));
                out.extend(self.lower_block(then_ops, &mut scope.enter_block())?);
                if let Some(else_ops) = else_ops {
                    out.push(self.synthesize("otherwise", OperationData::new(), *location));
                    out.extend(self.lower_block(else_ops, &mut scope.enter_block())?);
                }
                out.push(self.synthesize("endWhen", OperationData::new(), *location));
                Ok(())
            }
            Stmt::For { item_name, collection, body, location } => {
                let items = lower_expression(collection, scope)?;
                out.push(self.synthesize(
                    "forEach",
                    data([("collection", items), ("itemName", Value::String(item_name.clone()))]),
                    *location,
                ));
                out.extend(self.lower_block(body, &mut scope.enter_loop(item_name))?);
                out.push(self.synthesize("endForEach", OperationData::new(), *location));
                Ok(())
            }
            Stmt::Break { location } => {
                require_loop(scope, "break", *location)?;
                out.push(self.synthesize("breakForEach", OperationData::new(), *location));
                Ok(())
            }
            Stmt::Continue { location } => {
                require_loop(scope, "continue", *location)?;
                out.push(self.synthesize("continueForEach", OperationData::new(), *location));
                Ok(())
            }
        }
    }

    /// A folded declaration emits nothing; references inline its value.
    /// Anything else becomes a `setVariable` at this point in the sequence.
    fn lower_declaration(
        &mut self,
        decl: &VariableDeclaration,
        scope: &mut ScopeContext<'_>,
        out: &mut Vec<OperationConfig>,
    ) -> Result<(), TransformError> {
        let value = lower_expression(&decl.value, scope)?;
        if scope.declare(decl).is_some() {
            return Ok(());
        }
        out.push(self.synthesize(
            "setVariable",
            data([("name", Value::String(decl.name.clone())), ("value", value)]),
            decl.location,
        ));
        Ok(())
    }

    /// Custom actions take precedence over built-in operations of the same name.
    fn lower_call(
        &mut self,
        call: &OperationCall,
        scope: &ScopeContext<'_>,
        out: &mut Vec<OperationConfig>,
    ) -> Result<(), TransformError> {
        if let Some((name, definition)) = self.find_action(&call.name) {
            let ops = self.invoke_action(&name, definition, &call.args, scope, CallPosition::Start, call.location)?;
            out.extend(ops);
            return Ok(());
        }
        if registry::lookup(&call.name).is_none() {
            let operations = registry::all_operations().map(|op| op.system_name);
            let actions = self.actions.visible_from(&self.origin).iter().map(|a| a.name());
            let suggestions = suggest_from(&call.name, operations.chain(actions));
            return Err(TransformError::validation(
                format!(
                    "Unknown operation or action '{}'{}",
                    call.name,
                    suggestion_text(&suggestions)
                ),
                call.location,
            ));
        }
        let args = lower_arguments(&call.args, scope)?;
        out.push(self.emit(&call.name, &args, call.location)?);
        Ok(())
    }

    /// Look up a callable action, returning the name it is emitted under.
    ///
    /// Inside a library body a helper the program never imported is queued
    /// for emission under its qualified name.
    pub(super) fn find_action(&mut self, name: &str) -> Option<(String, &'a ActionDefinition)> {
        let found = find_action_by_name(name, self.actions.visible_from(&self.origin))?.clone();
        if self.origin == ActionOrigin::Local {
            return Some((found.name().to_string(), found.definition));
        }
        if let Some(visible) = self.actions.program.iter().find(|a| std::ptr::eq(a.definition, found.definition)) {
            return Some((visible.name().to_string(), found.definition));
        }
        let emitted = found.qualified_name();
        let definition = found.definition;
        self.reached.entry(emitted.clone()).or_insert(found);
        Some((emitted, definition))
    }

    /// `requestAction(name)` followed by `startAction`/`endAction` carrying
    /// the arguments keyed by the action's parameter names.
    pub(super) fn invoke_action(
        &mut self,
        name: &str,
        definition: &ActionDefinition,
        args: &[Expr],
        scope: &ScopeContext<'_>,
        position: CallPosition,
        location: SourceLocation,
    ) -> Result<Vec<OperationConfig>, TransformError> {
        if args.len() > definition.parameters.len() {
            return Err(TransformError::validation(
                format!(
                    "Action '{name}' takes {} argument(s), got {}",
                    definition.parameters.len(),
                    args.len()
                ),
                location,
            ));
        }
        let mut action_data = Map::new();
        for (param, arg) in definition.parameters.iter().zip(args) {
            action_data.insert(param.name.clone(), lower_expression(arg, scope)?);
        }

        let step = match position {
            CallPosition::Start => "startAction",
            CallPosition::End => "endAction",
        };
        Ok(vec![
            self.synthesize("requestAction", data([("systemName", Value::String(name.to_string()))]), location),
            self.synthesize(step, data([("actionOperationData", Value::Object(action_data))]), location),
        ])
    }

    /// Map positional `args` onto the registry signature of `system_name`.
    fn emit(
        &mut self,
        system_name: &str,
        args: &[Value],
        location: SourceLocation,
    ) -> Result<OperationConfig, TransformError> {
        let signature = registry::lookup(system_name).ok_or_else(|| {
            TransformError::validation(format!("Unknown operation '{system_name}'"), location)
        })?;
        let data = map_parameters(signature, args)
            .map_err(|err| TransformError::validation(err.to_string(), location))?;
        Ok(self.synthesize(system_name, data, location))
    }

    /// Record an operation whose data the compiler built itself. Positional
    /// mapping is skipped so argument objects are never flattened.
    pub(super) fn synthesize(&mut self, system_name: &str, data: OperationData, location: SourceLocation) -> OperationConfig {
        let id = self.ids.next("op");
        self.source_map.insert(id.clone(), location);
        OperationConfig {
            id,
            system_name: system_name.to_string(),
            operation_data: data,
        }
    }
}

fn data<const N: usize>(entries: [(&str, Value); N]) -> OperationData {
    entries.into_iter().map(|(key, value)| (key.to_string(), value)).collect()
}

fn lower_arguments(args: &[Expr], scope: &ScopeContext<'_>) -> Result<Vec<Value>, TransformError> {
    args.iter().map(|arg| lower_expression(arg, scope)).collect()
}

fn require_loop(scope: &ScopeContext<'_>, keyword: &str, location: SourceLocation) -> Result<(), TransformError> {
    if scope.loop_variable().is_some() {
        Ok(())
    } else {
        Err(TransformError::validation(
            format!("'{keyword}' can only be used inside a for loop"),
            location,
        ))
    }
}
