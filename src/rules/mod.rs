//! Rule trees: the canonical in-memory form of a record filter.
//!
//! A tree is a group of children joined by one combinator. Children are
//! either leaf rules (`field operator value`) or nested groups, which is how
//! mixed AND/OR logic is expressed. A group without children is "no filter".

mod eval;
mod operator;
mod value;

pub use eval::Row;
pub use operator::Operator;
pub use value::RuleValue;

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Combinator {
    #[default]
    #[serde(rename = "AND", alias = "and")]
    And,
    #[serde(rename = "OR", alias = "or")]
    Or,
}

impl Combinator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Combinator::And => " AND ",
            Combinator::Or => " OR ",
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Combinator::And => f.write_str("AND"),
            Combinator::Or => f.write_str("OR"),
        }
    }
}

/// A single `field operator value` predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub field: String,
    pub operator: Operator,
    pub value: RuleValue,
}

impl Rule {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<RuleValue>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

/// Child of a group. Groups are tried first when deserializing; only they
/// carry `combinator` and `rules`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleNode {
    Group(RuleTree),
    Leaf(Rule),
}

impl From<Rule> for RuleNode {
    fn from(rule: Rule) -> Self {
        RuleNode::Leaf(rule)
    }
}

impl From<RuleTree> for RuleNode {
    fn from(tree: RuleTree) -> Self {
        RuleNode::Group(tree)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RuleTree {
    pub combinator: Combinator,
    pub rules: Vec<RuleNode>,
}

impl RuleTree {
    /// Empty AND group, the canonical "no filter".
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_combinator(combinator: Combinator) -> Self {
        Self {
            combinator,
            rules: Vec::new(),
        }
    }

    pub fn and(rules: impl IntoIterator<Item = RuleNode>) -> Self {
        Self {
            combinator: Combinator::And,
            rules: rules.into_iter().collect(),
        }
    }

    pub fn or(rules: impl IntoIterator<Item = RuleNode>) -> Self {
        Self {
            combinator: Combinator::Or,
            rules: rules.into_iter().collect(),
        }
    }

    pub fn push(&mut self, node: impl Into<RuleNode>) {
        self.rules.push(node.into());
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// All leaf rules in depth-first order.
    pub fn leaves(&self) -> Vec<&Rule> {
        let mut out = Vec::new();
        collect_leaves(self, &mut out);
        out
    }

    /// Copy of the tree without unknown-operator leaves and without groups
    /// left empty by that removal (or empty to begin with).
    ///
    /// Both query dialects and in-process evaluation walk the pruned tree,
    /// so a skipped rule means the same thing everywhere.
    pub fn pruned(&self) -> RuleTree {
        let rules = self
            .rules
            .iter()
            .filter_map(|node| match node {
                RuleNode::Leaf(rule) if rule.operator.is_known() => Some(node.clone()),
                RuleNode::Leaf(rule) => {
                    tracing::debug!(
                        field = %rule.field,
                        operator = %rule.operator,
                        "dropping rule with unknown operator"
                    );
                    None
                }
                RuleNode::Group(group) => {
                    let group = group.pruned();
                    (!group.is_empty()).then_some(RuleNode::Group(group))
                }
            })
            .collect();

        RuleTree {
            combinator: self.combinator,
            rules,
        }
    }

    /// AND-combine two trees, skipping whichever side is empty.
    pub fn merge_and(self, other: RuleTree) -> RuleTree {
        match (self.is_empty(), other.is_empty()) {
            (true, _) => other,
            (_, true) => self,
            _ => RuleTree::and([RuleNode::Group(self), RuleNode::Group(other)]),
        }
    }
}

fn collect_leaves<'a>(tree: &'a RuleTree, out: &mut Vec<&'a Rule>) {
    for node in &tree.rules {
        match node {
            RuleNode::Leaf(rule) => out.push(rule),
            RuleNode::Group(group) => collect_leaves(group, out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_groups_deserialize_as_groups() {
        let tree: RuleTree = serde_json::from_value(json!({
            "combinator": "AND",
            "rules": [
                { "field": "type", "operator": "=", "value": "MX" },
                { "combinator": "or", "rules": [
                    { "field": "ttl", "operator": ">", "value": 300 }
                ]}
            ]
        }))
        .unwrap();

        assert!(matches!(tree.rules[0], RuleNode::Leaf(_)));
        match &tree.rules[1] {
            RuleNode::Group(group) => assert_eq!(group.combinator, Combinator::Or),
            other => panic!("expected group, got {other:?}"),
        }
        assert_eq!(tree.leaves().len(), 2);
    }

    #[test]
    fn pruning_drops_unknown_operators_and_empty_groups() {
        let tree = RuleTree::or([
            Rule::new("ttl", Operator::Unknown("between".into()), "1,2").into(),
            RuleTree::and([Rule::new("name", Operator::Unknown("near".into()), "x").into()]).into(),
            Rule::new("type", Operator::Eq, "A").into(),
        ]);

        let pruned = tree.pruned();
        assert_eq!(pruned.rules.len(), 1);
        assert_eq!(pruned.combinator, Combinator::Or);
    }

    #[test]
    fn merging_with_an_empty_tree_keeps_the_other_side() {
        let parsed = RuleTree::and([Rule::new("type", Operator::Eq, "A").into()]);
        assert_eq!(RuleTree::new().merge_and(parsed.clone()), parsed);
        assert_eq!(parsed.clone().merge_and(RuleTree::new()), parsed);
    }
}
