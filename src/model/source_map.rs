use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::dsl::ast::SourceLocation;

/// Generated id → originating source position. Diagnostics only; the engine
/// never reads it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceMap {
    entries: IndexMap<String, SourceLocation>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, location: SourceLocation) {
        self.entries.insert(id.into(), location);
    }

    pub fn get(&self, id: &str) -> Option<SourceLocation> {
        self.entries.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, SourceLocation)> {
        self.entries.iter().map(|(id, loc)| (id.as_str(), *loc))
    }
}
