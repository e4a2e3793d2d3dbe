use crate::rules::{Combinator, Operator, Rule, RuleNode, RuleTree, RuleValue};
use serde_json::{Map, Value, json};

/// Render a tree as a MongoDB query document.
///
/// An empty (or fully pruned) tree renders as `{}`, which matches every
/// document. A group with a single child collapses to that child.
pub fn to_mongo(tree: &RuleTree) -> Value {
    render_group(&tree.pruned())
}

fn render_group(tree: &RuleTree) -> Value {
    let mut children: Vec<Value> = tree
        .rules
        .iter()
        .map(|node| match node {
            RuleNode::Leaf(rule) => render_rule(rule),
            RuleNode::Group(group) => render_group(group),
        })
        .collect();

    match children.len() {
        0 => Value::Object(Map::new()),
        1 => children.remove(0),
        _ => {
            let key = match tree.combinator {
                Combinator::And => "$and",
                Combinator::Or => "$or",
            };
            let mut doc = Map::new();
            doc.insert(key.to_string(), Value::Array(children));
            Value::Object(doc)
        }
    }
}

fn render_rule(rule: &Rule) -> Value {
    let value = &rule.value;
    let condition = match &rule.operator {
        Operator::Eq => value.to_json(),
        Operator::NotEq => json!({ "$ne": value.to_json() }),
        Operator::Gt => json!({ "$gt": value.to_json() }),
        Operator::Gte => json!({ "$gte": value.to_json() }),
        Operator::Lt => json!({ "$lt": value.to_json() }),
        Operator::Lte => json!({ "$lte": value.to_json() }),
        Operator::Contains => regex(value, "", ""),
        Operator::DoesNotContain => json!({ "$not": regex(value, "", "") }),
        Operator::BeginsWith => regex(value, "^", ""),
        Operator::EndsWith => regex(value, "", "$"),
        Operator::In => json!({ "$in": list(value) }),
        Operator::NotIn => json!({ "$nin": list(value) }),
        // pruned before rendering
        Operator::Unknown(_) => return Value::Object(Map::new()),
    };

    let mut doc = Map::new();
    doc.insert(rule.field.clone(), condition);
    Value::Object(doc)
}

fn regex(value: &RuleValue, prefix: &str, suffix: &str) -> Value {
    let pattern = format!("{prefix}{}{suffix}", regex::escape(&value.as_text()));
    json!({ "$regex": pattern, "$options": "i" })
}

fn list(value: &RuleValue) -> Vec<Value> {
    value.list_items().iter().map(RuleValue::to_json).collect()
}
