use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use super::ast::{Program, SourceLocation, VariableDeclaration};
pub use super::eval::{evaluate_expression, ConstantLookup};

/// Coarse type of a folded value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    String,
    Number,
    Boolean,
    Null,
    Array,
    Object,
}

impl PrimitiveType {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::String(_) => Self::String,
            Value::Number(_) => Self::Number,
            Value::Bool(_) => Self::Boolean,
            Value::Null => Self::Null,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }
}

/// A declaration whose initializer folded to a literal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstantBinding {
    pub name: String,
    pub value: Value,
    pub ty: PrimitiveType,
    pub location: SourceLocation,
}

/// Constants in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstantMap {
    bindings: IndexMap<String, ConstantBinding>,
}

impl ConstantMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold `decl` against `visible` and record it here on success.
    ///
    /// Returns the value bound to the name afterwards, which is the earlier
    /// binding when one exists. `None` when the initializer is runtime
    /// dependent.
    pub fn try_bind(
        &mut self,
        decl: &VariableDeclaration,
        visible: &dyn ConstantLookup,
    ) -> Option<&Value> {
        let value = evaluate_expression(&decl.value, visible)?;
        Some(self.bind(decl, value))
    }

    /// Record an already folded `value` for `decl`. An existing binding is
    /// never overwritten; the binding in effect is returned.
    pub fn bind(&mut self, decl: &VariableDeclaration, value: Value) -> &Value {
        &self
            .bindings
            .entry(decl.name.clone())
            .or_insert_with(|| ConstantBinding {
                name: decl.name.clone(),
                ty: PrimitiveType::of(&value),
                value,
                location: decl.location,
            })
            .value
    }

    /// Drop a binding so a redeclaration in a nested scope can replace it.
    pub fn remove(&mut self, name: &str) -> Option<ConstantBinding> {
        self.bindings.shift_remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&ConstantBinding> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConstantBinding> {
        self.bindings.values()
    }
}

impl ConstantLookup for ConstantMap {
    fn constant(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name).map(|b| &b.value)
    }
}

/// Fold program-level declarations in order.
///
/// Each initializer sees only the constants declared before it, so forward
/// references stay runtime variables.
pub fn build_constant_map(program: &Program) -> ConstantMap {
    let mut map = ConstantMap::new();
    for decl in program.variables() {
        match evaluate_expression(&decl.value, &map) {
            Some(value) => {
                let bound = map.bind(decl, value);
                tracing::trace!(name = %decl.name, value = %bound, "folded constant");
            }
            None => tracing::trace!(name = %decl.name, "runtime variable"),
        }
    }
    map
}
