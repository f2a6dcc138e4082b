//! Caller-owned inference session.
//!
//! One session bundles a shared knowledge base, its own working memory, and
//! a validated strategy. There is no process-wide engine or memory
//! singleton. The knowledge base may be shared read-only across concurrent
//! sessions; the memory and counters may not.

use std::collections::HashMap;
use std::sync::Arc;

use crate::conflict::Strategy;
use crate::engine::{EngineConfig, InferenceEngine, InferenceOutcome};
use crate::errors::EngineError;
use crate::explanation::{Explanation, ExplanationBuilder};
use crate::knowledge_base::KnowledgeBase;
use crate::types::{FactId, RuleId};
use crate::working_memory::{FactRecord, WorkingMemory};

#[derive(Debug)]
pub struct Session {
    knowledge_base: Arc<KnowledgeBase>,
    strategy: Strategy,
    config: EngineConfig,
    memory: WorkingMemory,
    outcome: Option<InferenceOutcome>,
}

impl Session {
    /// Build a session from an already-validated strategy.
    pub fn new<I, S>(
        knowledge_base: Arc<KnowledgeBase>,
        initial_facts: I,
        strategy: Strategy,
        config: EngineConfig,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<FactId>,
    {
        Self {
            knowledge_base,
            strategy,
            config,
            memory: WorkingMemory::seeded(initial_facts),
            outcome: None,
        }
    }

    /// Build a session from a caller-facing strategy tag. An unrecognized
    /// tag fails here, before any scan executes.
    pub fn with_strategy_tag<I, S>(
        knowledge_base: Arc<KnowledgeBase>,
        initial_facts: I,
        strategy_tag: &str,
        priorities: Option<HashMap<RuleId, i64>>,
    ) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = S>,
        S: Into<FactId>,
    {
        let strategy = Strategy::parse(strategy_tag, priorities)?;
        Ok(Self::new(
            knowledge_base,
            initial_facts,
            strategy,
            EngineConfig::default(),
        ))
    }

    /// Override the iteration cap before running.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Run the engine to completion. Idempotent: a second call returns the
    /// cached outcome without touching the memory again.
    pub fn run(&mut self) -> Result<&InferenceOutcome, EngineError> {
        let outcome = match self.outcome.take() {
            Some(outcome) => outcome,
            None => {
                let engine = InferenceEngine::new(
                    Arc::clone(&self.knowledge_base),
                    self.strategy.clone(),
                    self.config,
                );
                engine.run(&mut self.memory)?
            }
        };
        Ok(self.outcome.insert(outcome))
    }

    /// The outcome of a completed run, if `run` was called.
    pub fn outcome(&self) -> Option<&InferenceOutcome> {
        self.outcome.as_ref()
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.knowledge_base
    }

    pub fn memory(&self) -> &WorkingMemory {
        &self.memory
    }

    /// Fact identities in derivation order.
    pub fn facts_in_order(&self) -> Vec<&FactId> {
        self.memory.facts_in_order().collect()
    }

    pub fn record(&self, identity: &str) -> Result<&FactRecord, EngineError> {
        self.memory.get_record(identity)
    }

    /// Justification tree for a fact, on demand.
    pub fn explain(&self, identity: &str) -> Result<Explanation, EngineError> {
        ExplanationBuilder::new(&self.memory).explain(identity)
    }

    /// Display lines with provenance tags, e.g. `'B' (rule R1)`.
    pub fn fact_listing(&self) -> Vec<String> {
        self.memory
            .records_in_order()
            .map(|record| format!("'{}' ({})", record.identity, record.source))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Conclusion, Condition, Rule};

    fn kb() -> Arc<KnowledgeBase> {
        let rules = vec![
            Rule {
                id: "R1".into(),
                conditions: vec![Condition::Fact("A".into())],
                conclusion: Conclusion::Fact("B".into()),
            },
            Rule {
                id: "R2".into(),
                conditions: vec![Condition::Fact("B".into())],
                conclusion: Conclusion::Fact("C".into()),
            },
        ];
        Arc::new(KnowledgeBase::new(rules).unwrap())
    }

    #[test]
    fn test_unknown_strategy_fails_before_any_scan() {
        let err = Session::with_strategy_tag(kb(), ["A"], "bogus", None).unwrap_err();
        assert!(matches!(err, EngineError::UnknownStrategy(tag) if tag == "bogus"));
    }

    #[test]
    fn test_run_is_idempotent() {
        let mut session = Session::with_strategy_tag(kb(), ["A"], "order", None).unwrap();
        let first = session.run().unwrap().clone();
        let second = session.run().unwrap().clone();
        assert_eq!(first, second);
        assert_eq!(session.memory().len(), 3);
    }

    #[test]
    fn test_fact_listing_carries_provenance_tags() {
        let mut session = Session::with_strategy_tag(kb(), ["A"], "order", None).unwrap();
        session.run().unwrap();
        assert_eq!(
            session.fact_listing(),
            vec![
                "'A' (user)".to_string(),
                "'B' (rule R1)".to_string(),
                "'C' (rule R2)".to_string(),
            ]
        );
    }

    #[test]
    fn test_shared_knowledge_base_across_sessions() {
        let shared = kb();
        let mut one = Session::with_strategy_tag(Arc::clone(&shared), ["A"], "order", None).unwrap();
        let mut two =
            Session::with_strategy_tag(Arc::clone(&shared), Vec::<String>::new(), "order", None)
                .unwrap();
        one.run().unwrap();
        two.run().unwrap();
        assert_eq!(one.memory().len(), 3);
        assert!(two.memory().is_empty());
    }
}
