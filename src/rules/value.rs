use crate::clock::format_timestamp;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};
use std::borrow::Cow;

/// Operand of a leaf rule.
///
/// Serialized untagged so stored filters keep their loose JSON shape:
/// `true`, `3600`, `0.5`, `"2026-01-01T00:00:00.000Z"`, `["A","MX"]`, `"A"`.
///
/// Strings that parse as RFC 3339 are `Date`, whether they come from JSON
/// or from `From<&str>`, and dates are held at millisecond precision. A
/// value therefore reloads equal to what was saved. `Text` never holds a
/// timestamp unless built by hand.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RuleValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Date(#[serde(serialize_with = "serialize_date")] DateTime<Utc>),
    List(Vec<String>),
    Text(String),
}

fn serialize_date<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(ts))
}

impl<'de> Deserialize<'de> for RuleValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Bool(bool),
            Integer(i64),
            Float(f64),
            List(Vec<String>),
            Text(String),
        }

        Ok(match Wire::deserialize(deserializer)? {
            Wire::Bool(b) => RuleValue::Bool(b),
            Wire::Integer(n) => RuleValue::Integer(n),
            Wire::Float(f) => RuleValue::Float(f),
            Wire::List(items) => RuleValue::List(items),
            Wire::Text(s) => RuleValue::from(s),
        })
    }
}

fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|ts| ts.with_timezone(&Utc).trunc_subsecs(3))
}

impl RuleValue {
    /// Type a single token taken from free text, a comma-separated list or
    /// a facet value: integers, finite floats, `true`/`false`, then dates.
    pub fn from_token(token: &str) -> Self {
        let token = token.trim();
        if let Ok(n) = token.parse::<i64>() {
            return RuleValue::Integer(n);
        }
        if let Some(f) = token.parse::<f64>().ok().filter(|f| f.is_finite()) {
            return RuleValue::Float(f);
        }
        match token {
            "true" => RuleValue::Bool(true),
            "false" => RuleValue::Bool(false),
            _ => RuleValue::from(token),
        }
    }

    /// Members of a set operand for `in` / `notIn`.
    ///
    /// Text is split on commas and trimmed, empty members are dropped.
    pub fn list_items(&self) -> Vec<RuleValue> {
        match self {
            RuleValue::List(items) => items.iter().map(|s| RuleValue::from_token(s)).collect(),
            RuleValue::Text(text) => text
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(RuleValue::from_token)
                .collect(),
            other => vec![other.clone()],
        }
    }

    /// Plain text form used by substring operators.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            RuleValue::Text(s) => Cow::Borrowed(s),
            RuleValue::Bool(b) => Cow::Owned(b.to_string()),
            RuleValue::Integer(n) => Cow::Owned(n.to_string()),
            RuleValue::Float(f) => Cow::Owned(f.to_string()),
            RuleValue::Date(ts) => Cow::Owned(format_timestamp(ts)),
            RuleValue::List(items) => Cow::Owned(items.join(",")),
        }
    }

    /// JSON scalar used by the Mongo emitter and in-process evaluation.
    pub fn to_json(&self) -> Value {
        match self {
            RuleValue::Bool(b) => Value::Bool(*b),
            RuleValue::Integer(n) => Value::Number((*n).into()),
            RuleValue::Float(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            RuleValue::Date(ts) => Value::String(format_timestamp(ts)),
            RuleValue::List(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
            RuleValue::Text(s) => Value::String(s.clone()),
        }
    }
}

impl From<&str> for RuleValue {
    fn from(s: &str) -> Self {
        parse_date(s).map_or_else(|| RuleValue::Text(s.to_string()), RuleValue::Date)
    }
}

impl From<String> for RuleValue {
    fn from(s: String) -> Self {
        match parse_date(&s) {
            Some(ts) => RuleValue::Date(ts),
            None => RuleValue::Text(s),
        }
    }
}

impl From<bool> for RuleValue {
    fn from(b: bool) -> Self {
        RuleValue::Bool(b)
    }
}

impl From<i64> for RuleValue {
    fn from(n: i64) -> Self {
        RuleValue::Integer(n)
    }
}

impl From<i32> for RuleValue {
    fn from(n: i32) -> Self {
        RuleValue::Integer(n.into())
    }
}

impl From<f64> for RuleValue {
    fn from(f: f64) -> Self {
        RuleValue::Float(f)
    }
}

impl From<DateTime<Utc>> for RuleValue {
    fn from(ts: DateTime<Utc>) -> Self {
        RuleValue::Date(ts.trunc_subsecs(3))
    }
}
