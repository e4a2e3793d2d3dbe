//! Field schema describing which record fields and operators a filter UI
//! offers. The schema is advisory: nothing here rejects a rule.

use crate::rules::{Operator, RuleTree};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Boolean,
    Date,
    Select,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub operators: Vec<Operator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<String>>,
}

impl FieldDef {
    fn new(name: &str, label: &str, field_type: FieldType, operators: &[Operator]) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            field_type,
            operators: operators.to_vec(),
            values: None,
        }
    }

    fn with_values(mut self, values: &[&str]) -> Self {
        self.values = Some(values.iter().map(|v| v.to_string()).collect());
        self
    }
}

const TEXT_OPS: &[Operator] = &[
    Operator::Eq,
    Operator::NotEq,
    Operator::Contains,
    Operator::DoesNotContain,
    Operator::BeginsWith,
    Operator::EndsWith,
    Operator::In,
    Operator::NotIn,
];
const NUMBER_OPS: &[Operator] = &[
    Operator::Eq,
    Operator::NotEq,
    Operator::Gt,
    Operator::Gte,
    Operator::Lt,
    Operator::Lte,
    Operator::In,
    Operator::NotIn,
];
const DATE_OPS: &[Operator] = &[Operator::Gt, Operator::Gte, Operator::Lt, Operator::Lte];
const BOOL_OPS: &[Operator] = &[Operator::Eq, Operator::NotEq];
const SELECT_OPS: &[Operator] = &[Operator::Eq, Operator::NotEq, Operator::In, Operator::NotIn];

/// Fields of a DNS record row.
pub fn record_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::new("name", "Name", FieldType::Text, TEXT_OPS),
        FieldDef::new("type", "Type", FieldType::Select, SELECT_OPS)
            .with_values(&crate::nl::RECORD_TYPES),
        FieldDef::new("value", "Value", FieldType::Text, TEXT_OPS),
        FieldDef::new("zone", "Zone", FieldType::Text, TEXT_OPS),
        FieldDef::new("ttl", "TTL", FieldType::Number, NUMBER_OPS),
        FieldDef::new("priority", "Priority", FieldType::Number, NUMBER_OPS),
        FieldDef::new("enabled", "Enabled", FieldType::Boolean, BOOL_OPS),
        FieldDef::new("createdAt", "Created", FieldType::Date, DATE_OPS),
        FieldDef::new("modifiedAt", "Modified", FieldType::Date, DATE_OPS),
    ]
}

/// Describe rules that reference fields or operators the schema does not
/// offer. Useful to surface typos; filtering proceeds regardless.
pub fn rule_warnings(tree: &RuleTree, schema: &[FieldDef]) -> Vec<String> {
    let mut warnings = Vec::new();

    for rule in tree.leaves() {
        let Some(def) = schema.iter().find(|f| f.name == rule.field) else {
            warnings.push(format!("Unknown field '{}'", rule.field));
            continue;
        };

        if !rule.operator.is_known() {
            warnings.push(format!(
                "Unknown operator '{}' on field '{}' will be ignored",
                rule.operator, rule.field
            ));
        } else if !def.operators.contains(&rule.operator) {
            warnings.push(format!(
                "Operator '{}' is not offered for field '{}' ({:?})",
                rule.operator, rule.field, def.field_type
            ));
        }
    }

    warnings
}
