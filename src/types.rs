//! Core data types for the production-rule system.
//!
//! Rules are plain, immutable data: an ordered list of condition clauses and
//! a single conclusion clause. Clause shapes are closed tagged variants so a
//! malformed clause is rejected once at load time instead of surfacing as an
//! operator failure in the middle of a scan.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::EngineError;
use crate::working_memory::WorkingMemory;

/// Identifier of a rule (opaque string, unique within a knowledge base).
pub type RuleId = String;

/// Identity of a fact in working memory. Either a bare proposition
/// (`"engine_running"`) or an assignment rendering (`"status = ok"`).
pub type FactId = String;

/// A scalar or list value as it appears in rule files and assignments.
///
/// The variant set mirrors the YAML scalar types the rule loader accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
}

impl Value {
    /// Numeric coercion used by the ordering operators. `Int`/`Float` map
    /// directly, `Text` is parsed, `Bool` and `List` never coerce.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            Value::Text(s) => s.trim().parse::<f64>().ok(),
            Value::Bool(_) | Value::List(_) => None,
        }
    }

    /// Parse a scalar from its textual rendering. Used to recover the value
    /// side of a string-seeded assignment identity; engine-derived
    /// assignments keep their typed value and never go through this.
    pub fn parse_scalar(text: &str) -> Value {
        let trimmed = text.trim();
        if trimmed == "true" {
            return Value::Bool(true);
        }
        if trimmed == "false" {
            return Value::Bool(false);
        }
        if let Ok(n) = trimmed.parse::<i64>() {
            return Value::Int(n);
        }
        if let Ok(n) = trimmed.parse::<f64>() {
            return Value::Float(n);
        }
        Value::Text(trimmed.to_string())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            // Int and Float compare numerically so YAML `1` matches `1.0`.
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Comparison operator of a structured condition clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
}

impl Operator {
    /// Parse an operator token from a rule file. Unknown tokens are a fatal
    /// configuration problem and are rejected here, at load time.
    pub fn parse(token: &str) -> Result<Operator, EngineError> {
        match token.trim() {
            "=" | "==" => Ok(Operator::Eq),
            "!=" | "<>" | "≠" => Ok(Operator::Ne),
            "<" => Ok(Operator::Lt),
            "<=" | "≤" => Ok(Operator::Le),
            ">" => Ok(Operator::Gt),
            ">=" | "≥" => Ok(Operator::Ge),
            "in" | "∈" => Ok(Operator::In),
            other => Err(EngineError::UnknownOperator(other.to_string())),
        }
    }

    /// Whether the operator holds for two numerically-coerced operands.
    /// Only meaningful for the comparison operators; `In` is never numeric.
    fn holds_numeric(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Operator::Eq => lhs == rhs,
            Operator::Ne => lhs != rhs,
            Operator::Lt => lhs < rhs,
            Operator::Le => lhs <= rhs,
            Operator::Gt => lhs > rhs,
            Operator::Ge => lhs >= rhs,
            Operator::In => false,
        }
    }

    pub fn token(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::In => "in",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// A condition clause of a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// Membership test: satisfied iff the exact identity exists in memory.
    Fact(FactId),
    /// Structured comparison against the current value bound to `variable`.
    Compare {
        variable: String,
        operator: Operator,
        value: Value,
    },
}

impl Condition {
    /// Evaluate this clause against the current working memory snapshot.
    ///
    /// Evaluation is total: operator validity was checked at load, numeric
    /// coercion failures and unbound variables evaluate to `false`.
    pub fn is_satisfied(&self, memory: &WorkingMemory) -> bool {
        match self {
            Condition::Fact(identity) => memory.has_fact(identity),
            Condition::Compare {
                variable,
                operator,
                value,
            } => {
                let Some(current) = memory.value_of(variable) else {
                    return false;
                };
                match operator {
                    Operator::Eq => current == *value,
                    Operator::Ne => current != *value,
                    Operator::Lt | Operator::Le | Operator::Gt | Operator::Ge => {
                        match (current.as_number(), value.as_number()) {
                            (Some(lhs), Some(rhs)) => operator.holds_numeric(lhs, rhs),
                            _ => false,
                        }
                    }
                    Operator::In => match value {
                        Value::List(items) => items.iter().any(|item| *item == current),
                        _ => false,
                    },
                }
            }
        }
    }

    /// Identity of the fact that currently satisfies this clause, used as
    /// the support entry when a rule fires. `None` when unsatisfied.
    pub fn support_identity(&self, memory: &WorkingMemory) -> Option<FactId> {
        match self {
            Condition::Fact(identity) => {
                memory.has_fact(identity).then(|| identity.clone())
            }
            Condition::Compare { variable, .. } => {
                memory.binding_identity(variable).map(str::to_string)
            }
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Fact(identity) => write!(f, "'{}'", identity),
            Condition::Compare {
                variable,
                operator,
                value,
            } => write!(f, "'{}' {} '{}'", variable, operator, value),
        }
    }
}

/// The conclusion clause of a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Conclusion {
    /// Assert a bare proposition.
    Fact(FactId),
    /// Bind a variable to a value.
    Assign { variable: String, value: Value },
}

impl Conclusion {
    /// The working-memory identity this conclusion asserts. Assignments
    /// embed the value, so binding the same variable to a different value
    /// yields a distinct identity.
    pub fn identity(&self) -> FactId {
        match self {
            Conclusion::Fact(identity) => identity.clone(),
            Conclusion::Assign { variable, value } => format!("{} = {}", variable, value),
        }
    }
}

impl fmt::Display for Conclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.identity())
    }
}

/// One production rule. Immutable once loaded; the declared order within the
/// knowledge base is semantically significant for the `order` strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    pub conditions: Vec<Condition>,
    pub conclusion: Conclusion,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule {}: IF ", self.id)?;
        for (i, condition) in self.conditions.iter().enumerate() {
            if i > 0 {
                write!(f, " AND ")?;
            }
            write!(f, "{}", condition)?;
        }
        write!(f, " THEN {}", self.conclusion)
    }
}
