//! Forward-chaining inference engine.
//!
//! The engine drives a scan/fire loop to saturation: each scan collects the
//! conflict set (every rule whose conditions are all satisfied and whose
//! conclusion would still add information), the strategy narrows it, and the
//! first ranked rule fires into working memory. A configurable iteration cap
//! bounds runaway rule sets; hitting it is a reported outcome, not an error,
//! and the facts derived up to that point stay valid.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::conflict::Strategy;
use crate::errors::EngineError;
use crate::knowledge_base::KnowledgeBase;
use crate::types::{Conclusion, FactId, Rule, RuleId};
use crate::working_memory::{Source, WorkingMemory};

/// Safety bounds for one inference run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of successful firings before the run aborts.
    pub max_iterations: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { max_iterations: 100 }
    }
}

/// One entry of the audit trail: which rule fired on which iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedRule {
    pub rule_id: RuleId,
    /// Identity the firing asserted.
    pub conclusion: FactId,
    /// 1-based iteration counter at the time of the firing.
    pub iteration: usize,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// No rule can add further information.
    Saturated,
    /// The iteration cap was exceeded with rules still eligible to fire.
    Aborted { iterations: usize },
}

/// Result of one run: the ordered firing trace and the terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceOutcome {
    pub applied: Vec<AppliedRule>,
    pub termination: Termination,
}

/// The engine itself: stateless between runs, it owns no working memory.
/// The knowledge base is shared read-only; each run mutates the memory the
/// caller passes in.
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    knowledge_base: Arc<KnowledgeBase>,
    strategy: Strategy,
    config: EngineConfig,
}

impl InferenceEngine {
    pub fn new(
        knowledge_base: Arc<KnowledgeBase>,
        strategy: Strategy,
        config: EngineConfig,
    ) -> Self {
        Self {
            knowledge_base,
            strategy,
            config,
        }
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.knowledge_base
    }

    /// Run the scan/fire loop to saturation (or abort) against `memory`.
    ///
    /// Errors only surface for engine bugs (an invariant violation when
    /// inserting a fact); termination by cap is an ordinary outcome.
    pub fn run(&self, memory: &mut WorkingMemory) -> Result<InferenceOutcome, EngineError> {
        let mut applied: Vec<AppliedRule> = Vec::new();
        let mut iteration: usize = 0;

        loop {
            let mut conflict_set = self.collect_conflict_set(memory);
            trace!(
                candidates = conflict_set.len(),
                iteration,
                "scan complete"
            );

            if conflict_set.is_empty() {
                debug!(iterations = iteration, "saturated");
                return Ok(InferenceOutcome {
                    applied,
                    termination: Termination::Saturated,
                });
            }
            if iteration >= self.config.max_iterations {
                warn!(
                    iterations = iteration,
                    cap = self.config.max_iterations,
                    "iteration cap exceeded, aborting run"
                );
                return Ok(InferenceOutcome {
                    applied,
                    termination: Termination::Aborted {
                        iterations: iteration,
                    },
                });
            }

            // Fire the first ranked rule. A no-op insertion means the
            // redundancy predicate was computed from a stale snapshot; drop
            // the rule from this scan's set and retry resolution without
            // consuming an iteration.
            while !conflict_set.is_empty() {
                let ranked = self.strategy.resolve(&conflict_set, memory);
                let Some(&rule) = ranked.first() else {
                    break;
                };
                if self.fire(rule, memory)? {
                    iteration += 1;
                    debug!(rule = %rule.id, iteration, "rule fired");
                    applied.push(AppliedRule {
                        rule_id: rule.id.clone(),
                        conclusion: rule.conclusion.identity(),
                        iteration,
                    });
                    break;
                }
                let stale_id = rule.id.clone();
                conflict_set.retain(|candidate| candidate.id != stale_id);
            }
        }
    }

    /// Every rule whose conditions all hold against the current memory and
    /// whose conclusion identity is not already asserted. A rule that would
    /// merely repeat an existing fact is excluded so it cannot contribute
    /// wasted iterations.
    fn collect_conflict_set<'a>(&'a self, memory: &WorkingMemory) -> Vec<&'a Rule> {
        self.knowledge_base
            .rules()
            .iter()
            .filter(|rule| !memory.has_fact(&rule.conclusion.identity()))
            .filter(|rule| {
                rule.conditions
                    .iter()
                    .all(|condition| condition.is_satisfied(memory))
            })
            .collect()
    }

    /// Insert the rule's conclusion with the identities that satisfied each
    /// condition as supports, in condition order. Returns whether the fact
    /// was newly inserted.
    fn fire(&self, rule: &Rule, memory: &mut WorkingMemory) -> Result<bool, EngineError> {
        let supports = rule
            .conditions
            .iter()
            .map(|condition| {
                condition.support_identity(memory).ok_or_else(|| {
                    EngineError::InvariantViolation(format!(
                        "rule '{}' fired while condition {} is unsupported",
                        rule.id, condition
                    ))
                })
            })
            .collect::<Result<Vec<FactId>, _>>()?;

        let source = Source::Rule(rule.id.clone());
        match &rule.conclusion {
            Conclusion::Fact(identity) => memory.add_fact(identity.clone(), source, &supports),
            // Assignments carry their typed value into the bindings index so
            // later conditions compare against the value as asserted.
            Conclusion::Assign { variable, value } => {
                memory.add_assignment(variable, value.clone(), source, &supports)
            }
        }
    }
}
