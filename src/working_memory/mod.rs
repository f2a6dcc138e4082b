//! Working memory: the append-only fact store of one inference session.
//!
//! Responsibilities:
//! - Keep one provenance-carrying record per fact identity, keyed for O(1)
//!   lookup, in insertion order.
//! - Assign strictly increasing timestamps so support chains are acyclic by
//!   construction (every support predates the fact it licenses).
//! - Track the latest assignment per variable, with its typed value, for
//!   structured-condition evaluation.
//!
//! Unit tests are colocated at the bottom of this file.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::errors::EngineError;
use crate::types::{FactId, RuleId, Value};

/// Where a fact came from: seeded by the caller or derived by a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    User,
    Rule(RuleId),
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::User => f.write_str("user"),
            Source::Rule(id) => write!(f, "rule {}", id),
        }
    }
}

/// Provenance record of one fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactRecord {
    /// Fact identity: bare proposition or `"variable = value"` rendering.
    pub identity: FactId,
    /// Who asserted it.
    pub source: Source,
    /// Identities that licensed the firing, in the order the rule listed
    /// its conditions. Empty for user-seeded facts.
    pub supports: Vec<FactId>,
    /// Session-monotonic insertion counter. Strictly increasing, never
    /// repeated.
    pub timestamp: u64,
}

/// The most recent assignment to one variable: the record identity plus the
/// typed value, kept so equality conditions compare real values instead of
/// their string renderings.
#[derive(Debug, Clone)]
struct Binding {
    identity: FactId,
    value: Value,
}

/// The fact store of one session. Created empty or pre-seeded, mutated only
/// by the engine while it fires rules, read-only afterwards. No deletion.
#[derive(Debug, Clone, Default)]
pub struct WorkingMemory {
    facts: IndexMap<FactId, FactRecord>,
    /// variable -> most recent assignment.
    bindings: HashMap<String, Binding>,
    counter: u64,
}

impl WorkingMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a memory pre-seeded with user-sourced facts.
    pub fn seeded<I, S>(facts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<FactId>,
    {
        let mut memory = Self::new();
        for fact in facts {
            // User facts have no supports, so insertion cannot fail; a
            // duplicate seed is an idempotent skip like any other.
            let _ = memory.add_fact(fact, Source::User, &[]);
        }
        memory
    }

    /// Insert a fact given by its identity string. Returns `Ok(true)` if
    /// newly inserted, `Ok(false)` if the identity is already present (the
    /// existing record, including its original source, supports, and
    /// timestamp, is left untouched).
    ///
    /// An identity of the `"variable = value"` shape advances the bindings
    /// index; the value side is parsed from its rendering, which is the best
    /// a string seed can offer. Assignments with a typed value in hand go
    /// through [`WorkingMemory::add_assignment`] instead.
    ///
    /// Every support must already be present; a dangling support is an
    /// engine bug and fails with `InvariantViolation`.
    pub fn add_fact(
        &mut self,
        identity: impl Into<FactId>,
        source: Source,
        supports: &[FactId],
    ) -> Result<bool, EngineError> {
        let identity = identity.into();
        let value = identity
            .split_once(" = ")
            .map(|(_, rendered)| Value::parse_scalar(rendered));
        self.insert(identity, value, source, supports)
    }

    /// Insert an assignment, keeping the typed value with the binding so a
    /// later equality condition compares against the value as asserted, not
    /// against a re-parse of its rendering.
    pub fn add_assignment(
        &mut self,
        variable: &str,
        value: Value,
        source: Source,
        supports: &[FactId],
    ) -> Result<bool, EngineError> {
        let identity = format!("{} = {}", variable, value);
        self.insert(identity, Some(value), source, supports)
    }

    fn insert(
        &mut self,
        identity: FactId,
        value: Option<Value>,
        source: Source,
        supports: &[FactId],
    ) -> Result<bool, EngineError> {
        if self.facts.contains_key(&identity) {
            return Ok(false);
        }
        for support in supports {
            if !self.facts.contains_key(support) {
                return Err(EngineError::InvariantViolation(format!(
                    "fact '{}' claims support '{}' which is not in working memory",
                    identity, support
                )));
            }
        }

        self.counter += 1;
        let record = FactRecord {
            identity: identity.clone(),
            source,
            supports: supports.to_vec(),
            timestamp: self.counter,
        };
        if let (Some(value), Some((variable, _))) = (value, identity.split_once(" = ")) {
            self.bindings.insert(
                variable.to_string(),
                Binding {
                    identity: identity.clone(),
                    value,
                },
            );
        }
        self.facts.insert(identity, record);
        Ok(true)
    }

    pub fn has_fact(&self, identity: &str) -> bool {
        self.facts.contains_key(identity)
    }

    pub fn get_record(&self, identity: &str) -> Result<&FactRecord, EngineError> {
        self.facts
            .get(identity)
            .ok_or_else(|| EngineError::MissingFact(identity.to_string()))
    }

    /// Fact identities in timestamp order. Insertion order of the backing
    /// map is exactly timestamp order, so no re-sort is needed. This is the
    /// canonical, deterministic display and audit order.
    pub fn facts_in_order(&self) -> impl Iterator<Item = &FactId> {
        self.facts.keys()
    }

    /// Full records in timestamp order.
    pub fn records_in_order(&self) -> impl Iterator<Item = &FactRecord> {
        self.facts.values()
    }

    /// Current value bound to `variable`, exactly as it was asserted.
    /// `None` when the variable was never bound.
    pub fn value_of(&self, variable: &str) -> Option<Value> {
        self.bindings
            .get(variable)
            .map(|binding| binding.value.clone())
    }

    /// Identity of the record currently binding `variable`.
    pub fn binding_identity(&self, variable: &str) -> Option<&str> {
        self.bindings
            .get(variable)
            .map(|binding| binding.identity.as_str())
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_fact_assigns_increasing_timestamps() {
        let mut wm = WorkingMemory::new();
        assert!(wm.add_fact("A", Source::User, &[]).unwrap());
        assert!(wm.add_fact("B", Source::User, &[]).unwrap());
        assert_eq!(wm.get_record("A").unwrap().timestamp, 1);
        assert_eq!(wm.get_record("B").unwrap().timestamp, 2);
    }

    #[test]
    fn test_duplicate_insertion_is_idempotent_skip() {
        let mut wm = WorkingMemory::new();
        wm.add_fact("A", Source::User, &[]).unwrap();
        let inserted = wm
            .add_fact("A", Source::Rule("R1".into()), &[])
            .unwrap();
        assert!(!inserted);
        // Original record untouched: still user-sourced, same timestamp.
        let record = wm.get_record("A").unwrap();
        assert_eq!(record.source, Source::User);
        assert_eq!(record.timestamp, 1);
        assert_eq!(wm.len(), 1);
    }

    #[test]
    fn test_dangling_support_is_invariant_violation() {
        let mut wm = WorkingMemory::new();
        let err = wm
            .add_fact("B", Source::Rule("R1".into()), &["A".to_string()])
            .unwrap_err();
        assert!(matches!(err, EngineError::InvariantViolation(_)));
        assert!(!wm.has_fact("B"));
    }

    #[test]
    fn test_supports_predate_supported_fact() {
        let mut wm = WorkingMemory::new();
        wm.add_fact("A", Source::User, &[]).unwrap();
        wm.add_fact("B", Source::Rule("R1".into()), &["A".to_string()])
            .unwrap();
        let a = wm.get_record("A").unwrap().timestamp;
        let b = wm.get_record("B").unwrap().timestamp;
        assert!(a < b);
    }

    #[test]
    fn test_facts_in_order_follows_timestamps() {
        let mut wm = WorkingMemory::new();
        wm.add_fact("C", Source::User, &[]).unwrap();
        wm.add_fact("A", Source::User, &[]).unwrap();
        wm.add_fact("B", Source::User, &[]).unwrap();
        let order: Vec<&str> = wm.facts_in_order().map(String::as_str).collect();
        assert_eq!(order, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_missing_fact_lookup() {
        let wm = WorkingMemory::new();
        let err = wm.get_record("ghost").unwrap_err();
        assert!(matches!(err, EngineError::MissingFact(id) if id == "ghost"));
    }

    #[test]
    fn test_bindings_track_latest_assignment() {
        let mut wm = WorkingMemory::new();
        wm.add_fact("budget = 40000", Source::User, &[]).unwrap();
        assert_eq!(wm.value_of("budget"), Some(Value::Int(40000)));
        assert_eq!(wm.binding_identity("budget"), Some("budget = 40000"));

        wm.add_fact("budget = 90000", Source::Rule("R3".into()), &[])
            .unwrap();
        // Both identities remain, the binding moves to the newest.
        assert!(wm.has_fact("budget = 40000"));
        assert_eq!(wm.value_of("budget"), Some(Value::Int(90000)));
        assert_eq!(wm.binding_identity("budget"), Some("budget = 90000"));
    }

    #[test]
    fn test_assignment_keeps_the_typed_value() {
        let mut wm = WorkingMemory::new();
        wm.add_assignment("code", Value::Text("007".into()), Source::Rule("R1".into()), &[])
            .unwrap();
        // The rendering looks numeric; the stored value must stay text.
        assert!(wm.has_fact("code = 007"));
        assert_eq!(wm.value_of("code"), Some(Value::Text("007".into())));
        assert_eq!(wm.binding_identity("code"), Some("code = 007"));
    }

    #[test]
    fn test_list_assignment_survives_its_rendering() {
        let mut wm = WorkingMemory::new();
        let colors = Value::List(vec![Value::Text("red".into()), Value::Text("blue".into())]);
        wm.add_assignment("colors", colors.clone(), Source::User, &[])
            .unwrap();
        assert!(wm.has_fact("colors = [red, blue]"));
        assert_eq!(wm.value_of("colors"), Some(colors));
    }

    #[test]
    fn test_unbound_variable_has_no_value() {
        let wm = WorkingMemory::new();
        assert_eq!(wm.value_of("season"), None);
        assert_eq!(wm.binding_identity("season"), None);
    }

    #[test]
    fn test_seeded_memory_is_user_sourced() {
        let wm = WorkingMemory::seeded(["A", "season = summer"]);
        assert_eq!(wm.len(), 2);
        assert_eq!(wm.get_record("A").unwrap().source, Source::User);
        assert!(wm.get_record("season = summer").unwrap().supports.is_empty());
    }
}
