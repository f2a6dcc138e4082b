//! Knowledge base: the immutable, ordered rule collection of a session.
//!
//! Construction validates the whole collection up front so the engine never
//! meets a malformed rule mid-scan. Once built, the knowledge base is
//! side-effect-free and safe to share (behind an `Arc`) across concurrently
//! running independent sessions.

pub mod loader;

use serde::{Deserialize, Serialize};

use crate::errors::EngineError;
use crate::types::{Rule, RuleId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBase {
    rules: Vec<Rule>,
}

impl KnowledgeBase {
    /// Build a knowledge base from an already-parsed rule list.
    ///
    /// Fails with a configuration error when the list is empty, a rule id
    /// is blank or duplicated, or a rule has no conditions.
    pub fn new(rules: Vec<Rule>) -> Result<Self, EngineError> {
        if rules.is_empty() {
            return Err(EngineError::Configuration(
                "the rule set must not be empty".to_string(),
            ));
        }
        let mut seen: Vec<&RuleId> = Vec::with_capacity(rules.len());
        for rule in &rules {
            if rule.id.trim().is_empty() {
                return Err(EngineError::Configuration(format!(
                    "a rule is missing its identifier ({})",
                    rule
                )));
            }
            if seen.contains(&&rule.id) {
                return Err(EngineError::Configuration(format!(
                    "duplicate rule identifier '{}'",
                    rule.id
                )));
            }
            if rule.conditions.is_empty() {
                return Err(EngineError::Configuration(format!(
                    "rule '{}' has no conditions",
                    rule.id
                )));
            }
            seen.push(&rule.id);
        }
        Ok(Self { rules })
    }

    /// Rules in declared order. The order is semantically significant: the
    /// `order` strategy fires the earliest-declared candidate.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Conclusion, Condition};

    fn rule(id: &str, conditions: &[&str], conclusion: &str) -> Rule {
        Rule {
            id: id.to_string(),
            conditions: conditions
                .iter()
                .map(|c| Condition::Fact(c.to_string()))
                .collect(),
            conclusion: Conclusion::Fact(conclusion.to_string()),
        }
    }

    #[test]
    fn test_empty_rule_set_rejected() {
        let err = KnowledgeBase::new(vec![]).unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn test_blank_rule_id_rejected() {
        let err = KnowledgeBase::new(vec![rule("  ", &["A"], "B")]).unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn test_duplicate_rule_id_rejected() {
        let rules = vec![rule("R1", &["A"], "B"), rule("R1", &["B"], "C")];
        let err = KnowledgeBase::new(rules).unwrap_err();
        assert!(matches!(err, EngineError::Configuration(msg) if msg.contains("R1")));
    }

    #[test]
    fn test_rule_without_conditions_rejected() {
        let err = KnowledgeBase::new(vec![rule("R1", &[], "B")]).unwrap_err();
        assert!(matches!(err, EngineError::Configuration(msg) if msg.contains("R1")));
    }

    #[test]
    fn test_declared_order_preserved() {
        let kb = KnowledgeBase::new(vec![
            rule("R2", &["B"], "C"),
            rule("R1", &["A"], "B"),
        ])
        .unwrap();
        let ids: Vec<&str> = kb.rules().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["R2", "R1"]);
        assert!(kb.get("R1").is_some());
        assert!(kb.get("R9").is_none());
    }
}
