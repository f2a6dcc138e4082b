//! prodsys: a production-rule forward-chaining inference engine.
//!
//! The crate implements the classic expert-system core: an ordered
//! knowledge base of condition -> conclusion rules, an append-only working
//! memory that records provenance for every derived fact, a family of
//! conflict-resolution strategies, a scan/fire loop that runs to saturation
//! under a configurable iteration cap, and an explanation component that
//! reconstructs a fact's justification chain on demand.
//!
//! Typical use goes through [`session::Session`]:
//!
//! ```
//! use std::sync::Arc;
//! use prodsys::knowledge_base::loader;
//! use prodsys::session::Session;
//!
//! let kb = loader::from_yaml_str(
//!     "rules:\n  - id: R1\n    conditions: [A]\n    conclusion: B\n",
//! )?;
//! let mut session = Session::with_strategy_tag(Arc::new(kb), ["A"], "order", None)?;
//! session.run()?;
//! println!("{}", session.explain("B")?.render());
//! # Ok::<(), prodsys::errors::EngineError>(())
//! ```

pub mod conflict;
pub mod engine;
pub mod errors;
pub mod explanation;
pub mod knowledge_base;
pub mod session;
pub mod types;
pub mod working_memory;

pub use conflict::Strategy;
pub use engine::{AppliedRule, EngineConfig, InferenceEngine, InferenceOutcome, Termination};
pub use errors::EngineError;
pub use explanation::{Explanation, ExplanationBuilder};
pub use knowledge_base::KnowledgeBase;
pub use session::Session;
pub use types::{Conclusion, Condition, FactId, Operator, Rule, RuleId, Value};
pub use working_memory::{FactRecord, Source, WorkingMemory};
