use super::{Combinator, Operator, Rule, RuleNode, RuleTree, RuleValue};
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// One result row: a JSON object keyed by field name.
pub type Row = Map<String, Value>;

impl RuleTree {
    /// Evaluate the tree against a row.
    ///
    /// Mirrors the emitted SQL/Mongo: substring operators ignore case,
    /// numbers compare numerically, strings lexicographically, and rules
    /// with unknown operators are skipped.
    pub fn matches(&self, row: &Row) -> bool {
        matches_group(&self.pruned(), row)
    }
}

fn matches_group(tree: &RuleTree, row: &Row) -> bool {
    if tree.rules.is_empty() {
        return true;
    }

    let mut results = tree.rules.iter().map(|node| match node {
        RuleNode::Leaf(rule) => matches_rule(rule, row),
        RuleNode::Group(group) => matches_group(group, row),
    });

    match tree.combinator {
        Combinator::And => results.all(|hit| hit),
        Combinator::Or => results.any(|hit| hit),
    }
}

fn matches_rule(rule: &Rule, row: &Row) -> bool {
    let actual = row.get(&rule.field).unwrap_or(&Value::Null);

    match &rule.operator {
        Operator::Eq => values_equal(actual, &rule.value),
        Operator::NotEq => !values_equal(actual, &rule.value),
        Operator::Gt => compare(actual, &rule.value) == Some(Ordering::Greater),
        Operator::Gte => matches!(
            compare(actual, &rule.value),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Operator::Lt => compare(actual, &rule.value) == Some(Ordering::Less),
        Operator::Lte => matches!(
            compare(actual, &rule.value),
            Some(Ordering::Less | Ordering::Equal)
        ),
        Operator::Contains => text_of(actual)
            .is_some_and(|text| text.contains(&rule.value.as_text().to_lowercase())),
        Operator::DoesNotContain => !text_of(actual)
            .is_some_and(|text| text.contains(&rule.value.as_text().to_lowercase())),
        Operator::BeginsWith => text_of(actual)
            .is_some_and(|text| text.starts_with(&rule.value.as_text().to_lowercase())),
        Operator::EndsWith => text_of(actual)
            .is_some_and(|text| text.ends_with(&rule.value.as_text().to_lowercase())),
        Operator::In => rule
            .value
            .list_items()
            .iter()
            .any(|item| values_equal(actual, item)),
        Operator::NotIn => !rule
            .value
            .list_items()
            .iter()
            .any(|item| values_equal(actual, item)),
        Operator::Unknown(_) => true,
    }
}

fn values_equal(actual: &Value, expected: &RuleValue) -> bool {
    let expected = expected.to_json();
    match (actual, &expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => actual == &expected,
    }
}

fn compare(actual: &Value, expected: &RuleValue) -> Option<Ordering> {
    match (actual, &expected.to_json()) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.as_str().cmp(b.as_str())),
        _ => None,
    }
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.to_lowercase()),
        other => Some(other.to_string().to_lowercase()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Rule;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn empty_tree_matches_everything() {
        assert!(RuleTree::new().matches(&row(json!({"type": "A"}))));
    }

    #[test]
    fn substring_operators_ignore_case() {
        let record = row(json!({"value": "v=SPF1 include:_spf.google.com"}));
        let tree = RuleTree::and([
            Rule::new("value", Operator::Contains, "spf1").into(),
            Rule::new("value", Operator::BeginsWith, "V=").into(),
            Rule::new("value", Operator::DoesNotContain, "outlook").into(),
        ]);
        assert!(tree.matches(&record));
    }

    #[test]
    fn comparisons_are_numeric_for_numbers() {
        let record = row(json!({"ttl": 86400}));
        assert!(RuleTree::and([Rule::new("ttl", Operator::Gt, 3600).into()]).matches(&record));
        assert!(!RuleTree::and([Rule::new("ttl", Operator::Lte, 300).into()]).matches(&record));
    }

    #[test]
    fn set_membership_uses_comma_lists() {
        let record = row(json!({"type": "MX"}));
        assert!(RuleTree::and([Rule::new("type", Operator::In, "A, MX").into()]).matches(&record));
        assert!(!RuleTree::and([Rule::new("type", Operator::NotIn, "MX").into()]).matches(&record));
    }
}
