//! Conflict-resolution strategies.
//!
//! A strategy narrows a non-empty candidate set to the subset considered
//! equally top-ranked, preserving knowledge-base order among ties; the
//! engine always fires the first element of the result. The strategy set is
//! a closed enum validated once when a session is built; an unrecognized
//! tag is an error, never a silent fallback to a default.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::EngineError;
use crate::types::{Rule, RuleId};
use crate::working_memory::WorkingMemory;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Fire the earliest rule in declared knowledge-base order.
    Order,
    /// Prefer rules with the most condition clauses; ties kept.
    Specificity,
    /// Prefer rules whose condition facts were added most recently.
    Recency,
    /// External rule-id -> priority mapping; unmapped ids default to 0.
    Priority(HashMap<RuleId, i64>),
}

impl Strategy {
    /// Parse a caller-facing strategy tag. `priorities` is only consulted
    /// for the `priority` tag.
    pub fn parse(
        tag: &str,
        priorities: Option<HashMap<RuleId, i64>>,
    ) -> Result<Strategy, EngineError> {
        match tag.trim().to_lowercase().as_str() {
            "order" | "first" => Ok(Strategy::Order),
            "specificity" => Ok(Strategy::Specificity),
            "recency" => Ok(Strategy::Recency),
            "priority" => Ok(Strategy::Priority(priorities.unwrap_or_default())),
            other => Err(EngineError::UnknownStrategy(other.to_string())),
        }
    }

    /// Narrow `candidates` (non-empty, in knowledge-base order) to the
    /// equally top-ranked subset, order preserved.
    pub fn resolve<'a>(
        &self,
        candidates: &[&'a Rule],
        memory: &WorkingMemory,
    ) -> Vec<&'a Rule> {
        match self {
            Strategy::Order => candidates.first().map(|rule| vec![*rule]).unwrap_or_default(),
            Strategy::Specificity => candidates
                .iter()
                .copied()
                .max_set_by_key(|rule| rule.conditions.len()),
            Strategy::Recency => candidates
                .iter()
                .copied()
                .max_set_by_key(|rule| recency_score(rule, memory)),
            Strategy::Priority(priorities) => candidates
                .iter()
                .copied()
                .max_set_by_key(|rule| priorities.get(&rule.id).copied().unwrap_or(0)),
        }
    }
}

/// Maximum timestamp among the records supporting a rule's conditions, or 0
/// for a rule whose conditions resolve to no support.
fn recency_score(rule: &Rule, memory: &WorkingMemory) -> u64 {
    rule.conditions
        .iter()
        .filter_map(|condition| condition.support_identity(memory))
        .filter_map(|identity| {
            memory
                .get_record(&identity)
                .map(|record| record.timestamp)
                .ok()
        })
        .max()
        .unwrap_or(0)
}
