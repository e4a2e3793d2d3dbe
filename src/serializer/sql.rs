use crate::rules::{Operator, Rule, RuleNode, RuleTree, RuleValue};

/// Render a tree as a SQL `WHERE` clause body.
///
/// An empty (or fully pruned) tree renders as `""`, meaning "no predicate".
pub fn to_sql(tree: &RuleTree) -> String {
    render_group(&tree.pruned())
}

fn render_group(tree: &RuleTree) -> String {
    tree.rules
        .iter()
        .map(|node| match node {
            RuleNode::Leaf(rule) => render_rule(rule),
            RuleNode::Group(group) => format!("({})", render_group(group)),
        })
        .collect::<Vec<_>>()
        .join(tree.combinator.as_sql())
}

fn render_rule(rule: &Rule) -> String {
    let field = &rule.field;
    let value = &rule.value;

    match &rule.operator {
        Operator::Contains => like(field, "LIKE", value, true, true),
        Operator::DoesNotContain => like(field, "NOT LIKE", value, true, true),
        Operator::BeginsWith => like(field, "LIKE", value, false, true),
        Operator::EndsWith => like(field, "LIKE", value, true, false),
        Operator::In => format!("{field} IN ({})", literal_list(value)),
        Operator::NotIn => format!("{field} NOT IN ({})", literal_list(value)),
        op => format!("{field} {} {}", op.as_str(), literal(value)),
    }
}

fn like(field: &str, keyword: &str, value: &RuleValue, lead: bool, trail: bool) -> String {
    let text = value.as_text();
    let needs_escape = text.contains(['%', '_', '\\']);
    let mut pattern = String::with_capacity(text.len() + 2);
    if lead {
        pattern.push('%');
    }
    for c in text.chars() {
        if needs_escape && matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    if trail {
        pattern.push('%');
    }

    let mut clause = format!("{field} {keyword} {}", quote(&pattern));
    if needs_escape {
        clause.push_str(" ESCAPE '\\'");
    }
    clause
}

fn literal_list(value: &RuleValue) -> String {
    value
        .list_items()
        .iter()
        .map(literal)
        .collect::<Vec<_>>()
        .join(", ")
}

fn literal(value: &RuleValue) -> String {
    match value {
        RuleValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        RuleValue::Integer(n) => n.to_string(),
        RuleValue::Float(f) => f.to_string(),
        RuleValue::List(_) => format!("({})", literal_list(value)),
        RuleValue::Date(_) | RuleValue::Text(_) => quote(&value.as_text()),
    }
}

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}
