//! Explanation component: reconstructs *why* a fact holds.
//!
//! The builder walks a fact's provenance records recursively: a user-seeded
//! fact is a leaf, a rule-derived fact names the firing rule and recurses
//! into each support in the order the rule listed its conditions. The
//! working-memory timestamp invariant (every support strictly predates the
//! fact it licenses) guarantees the walk terminates.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::EngineError;
use crate::types::FactId;
use crate::working_memory::{Source, WorkingMemory};

/// A justification tree for one fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub identity: FactId,
    pub source: Source,
    /// Justifications of the supports, in condition order. Empty for
    /// user-asserted leaves.
    pub supports: Vec<Explanation>,
}

impl Explanation {
    /// Render the tree as indented text, one fact per line.
    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        self.render_into(&mut lines, 0);
        lines.join("\n")
    }

    fn render_into(&self, lines: &mut Vec<String>, depth: usize) {
        let indent = "  ".repeat(depth);
        match &self.source {
            Source::User => {
                lines.push(format!("{}- '{}' asserted by user", indent, self.identity));
            }
            Source::Rule(rule_id) => {
                lines.push(format!(
                    "{}- '{}' derived by rule {}",
                    indent, self.identity, rule_id
                ));
                for support in &self.supports {
                    support.render_into(lines, depth + 1);
                }
            }
        }
    }

    /// Depth of the longest justification chain under this node.
    pub fn depth(&self) -> usize {
        1 + self
            .supports
            .iter()
            .map(Explanation::depth)
            .max()
            .unwrap_or(0)
    }
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Read-only view over a session's working memory that answers explanation
/// queries on demand.
pub struct ExplanationBuilder<'a> {
    memory: &'a WorkingMemory,
}

impl<'a> ExplanationBuilder<'a> {
    pub fn new(memory: &'a WorkingMemory) -> Self {
        Self { memory }
    }

    /// Build the justification tree for `identity`. Asking about an absent
    /// fact is a recoverable negative result, reported as `MissingFact`.
    pub fn explain(&self, identity: &str) -> Result<Explanation, EngineError> {
        let record = self.memory.get_record(identity)?;
        let supports = record
            .supports
            .iter()
            .map(|support| self.explain(support))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Explanation {
            identity: record.identity.clone(),
            source: record.source.clone(),
            supports,
        })
    }
}
