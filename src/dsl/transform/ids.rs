use uuid::Uuid;

use crate::settings::IdStrategy;

/// Hands out ids that are unique within one compilation.
#[derive(Debug)]
pub struct IdGenerator {
    strategy: IdStrategy,
    issued: usize,
}

impl IdGenerator {
    pub fn new(strategy: IdStrategy) -> Self {
        Self { strategy, issued: 0 }
    }

    /// Next id. `kind` only shows up in sequential ids (`op-12`).
    pub fn next(&mut self, kind: &str) -> String {
        self.issued += 1;
        match self.strategy {
            IdStrategy::Uuid => Uuid::new_v4().to_string(),
            IdStrategy::Sequential => format!("{kind}-{}", self.issued),
        }
    }

    pub fn issued(&self) -> usize {
        self.issued
    }
}
