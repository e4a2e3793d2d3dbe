use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison applied by a leaf rule.
///
/// Operators this crate does not know survive a load/save cycle as
/// `Unknown` and are dropped when a tree is serialized or evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    DoesNotContain,
    BeginsWith,
    EndsWith,
    In,
    NotIn,
    Unknown(String),
}

impl Operator {
    pub const KNOWN: [Operator; 12] = [
        Operator::Eq,
        Operator::NotEq,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::Contains,
        Operator::DoesNotContain,
        Operator::BeginsWith,
        Operator::EndsWith,
        Operator::In,
        Operator::NotIn,
    ];

    /// Wire name as stored in persisted filters.
    pub fn as_str(&self) -> &str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "!=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Contains => "contains",
            Operator::DoesNotContain => "doesNotContain",
            Operator::BeginsWith => "beginsWith",
            Operator::EndsWith => "endsWith",
            Operator::In => "in",
            Operator::NotIn => "notIn",
            Operator::Unknown(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Operator::Unknown(_))
    }

    /// Parse the symbolic comparators that appear in free text (`TTL >= 300`).
    pub fn from_comparator(symbol: &str) -> Option<Self> {
        match symbol {
            "=" | "==" => Some(Operator::Eq),
            "!=" => Some(Operator::NotEq),
            ">" => Some(Operator::Gt),
            ">=" => Some(Operator::Gte),
            "<" => Some(Operator::Lt),
            "<=" => Some(Operator::Lte),
            _ => None,
        }
    }
}

impl From<String> for Operator {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "=" => Operator::Eq,
            "!=" => Operator::NotEq,
            ">" => Operator::Gt,
            ">=" => Operator::Gte,
            "<" => Operator::Lt,
            "<=" => Operator::Lte,
            "contains" => Operator::Contains,
            "doesNotContain" => Operator::DoesNotContain,
            "beginsWith" => Operator::BeginsWith,
            "endsWith" => Operator::EndsWith,
            "in" => Operator::In,
            "notIn" => Operator::NotIn,
            _ => Operator::Unknown(raw),
        }
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        match op {
            Operator::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
