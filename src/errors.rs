//! Error types for the inference core.
//!
//! One enum covers the whole crate. Load-time and strategy-selection
//! failures are fatal to session construction; a missing fact during an
//! explanation query is an ordinary negative result the caller can report;
//! an invariant violation indicates an engine bug rather than user error.

use thiserror::Error;

use crate::types::FactId;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Empty or malformed rule set at load.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Unrecognized conflict-resolution strategy tag. Raised at session
    /// construction, never silently substituted with a default.
    #[error("unknown conflict-resolution strategy '{0}'")]
    UnknownStrategy(String),

    /// Unrecognized condition operator token in a rule file.
    #[error("unknown condition operator '{0}'")]
    UnknownOperator(String),

    /// Lookup of a fact that is not in working memory.
    #[error("fact '{0}' is not present in working memory")]
    MissingFact(FactId),

    /// A support reference points at a fact that does not exist yet.
    #[error("working-memory invariant violated: {0}")]
    InvariantViolation(String),
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Configuration(format!("IO error: {}", e))
    }
}

impl From<serde_yaml::Error> for EngineError {
    fn from(e: serde_yaml::Error) -> Self {
        EngineError::Configuration(format!("YAML error: {}", e))
    }
}
