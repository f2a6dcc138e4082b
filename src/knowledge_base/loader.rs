//! YAML rule-file loader.
//!
//! Parses a rule document into raw record shapes first, then converts them
//! into validated [`Rule`]s so every malformed clause is reported with the
//! record it came from. The document is a mapping with a required `rules`
//! list:
//!
//! ```yaml
//! rules:
//!   - id: R1
//!     conditions:
//!       - engine_cranks
//!       - variable: battery_voltage
//!         operator: ">="
//!         value: 12.0
//!     conclusion: battery_ok
//!   - id: R2
//!     conditions: [battery_ok]
//!     conclusion:
//!       variable: diagnosis
//!       value: starter
//! ```

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::errors::EngineError;
use crate::knowledge_base::KnowledgeBase;
use crate::types::{Conclusion, Condition, Operator, Rule, Value};

#[derive(Debug, Deserialize)]
struct RawDocument {
    rules: Option<Vec<RawRule>>,
}

#[derive(Debug, Deserialize)]
struct RawRule {
    id: Option<serde_yaml::Value>,
    conditions: Option<Vec<RawCondition>>,
    conclusion: Option<RawConclusion>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCondition {
    Bare(String),
    Structured {
        variable: String,
        operator: String,
        value: Value,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawConclusion {
    Bare(String),
    Assignment { variable: String, value: Value },
}

/// Load and validate a knowledge base from a YAML string.
pub fn from_yaml_str(text: &str) -> Result<KnowledgeBase, EngineError> {
    let document: RawDocument = serde_yaml::from_str(text)?;
    let raw_rules = document.rules.ok_or_else(|| {
        EngineError::Configuration("rule file has no top-level 'rules' list".to_string())
    })?;

    let mut rules = Vec::with_capacity(raw_rules.len());
    for (index, raw) in raw_rules.into_iter().enumerate() {
        rules.push(convert_rule(index, raw)?);
    }
    KnowledgeBase::new(rules)
}

/// Load and validate a knowledge base from a YAML file on disk.
pub fn from_yaml_file(path: &Path) -> Result<KnowledgeBase, EngineError> {
    if !path.exists() {
        return Err(EngineError::Configuration(format!(
            "rule file not found: {}",
            path.display()
        )));
    }
    let text = fs::read_to_string(path)?;
    from_yaml_str(&text)
}

fn convert_rule(index: usize, raw: RawRule) -> Result<Rule, EngineError> {
    let id = match raw.id {
        Some(serde_yaml::Value::String(s)) => s,
        Some(serde_yaml::Value::Number(n)) => n.to_string(),
        Some(other) => {
            return Err(EngineError::Configuration(format!(
                "rule record #{} has an unusable id: {:?}",
                index, other
            )))
        }
        None => {
            return Err(EngineError::Configuration(format!(
                "rule record #{} is missing its 'id' field",
                index
            )))
        }
    };

    let raw_conditions = raw.conditions.ok_or_else(|| {
        EngineError::Configuration(format!("rule '{}' is missing its 'conditions' field", id))
    })?;
    let conditions = raw_conditions
        .into_iter()
        .map(|raw| convert_condition(&id, raw))
        .collect::<Result<Vec<_>, _>>()?;

    let conclusion = match raw.conclusion {
        Some(RawConclusion::Bare(fact)) => Conclusion::Fact(fact),
        Some(RawConclusion::Assignment { variable, value }) => {
            Conclusion::Assign { variable, value }
        }
        None => {
            return Err(EngineError::Configuration(format!(
                "rule '{}' is missing its 'conclusion' field",
                id
            )))
        }
    };

    Ok(Rule {
        id,
        conditions,
        conclusion,
    })
}

fn convert_condition(rule_id: &str, raw: RawCondition) -> Result<Condition, EngineError> {
    match raw {
        RawCondition::Bare(fact) => Ok(Condition::Fact(fact)),
        RawCondition::Structured {
            variable,
            operator,
            value,
        } => {
            let operator = Operator::parse(&operator)?;
            if operator == Operator::In && !matches!(value, Value::List(_)) {
                return Err(EngineError::Configuration(format!(
                    "rule '{}': 'in' condition on '{}' requires a list value",
                    rule_id, variable
                )));
            }
            Ok(Condition::Compare {
                variable,
                operator,
                value,
            })
        }
    }
}
