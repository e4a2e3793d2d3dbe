//! Facets: value counts over a result set and the selections made on them.
//!
//! Selections live in [`ColumnFilters`], keyed by field. A field never maps
//! to an empty checkbox selection; deselecting the last value removes the key.

use crate::rules::{Operator, Row, Rule, RuleNode, RuleTree, RuleValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Reverse;
use std::collections::BTreeMap;

pub const DEFAULT_RANGE: [f64; 2] = [0.0, 100.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacetKind {
    Checkbox,
    Range,
    Date,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetSpec {
    pub field: String,
    pub label: String,
    pub kind: FacetKind,
    /// Slider bounds for range facets; [`DEFAULT_RANGE`] when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<[f64; 2]>,
}

impl FacetSpec {
    pub fn checkbox(field: &str, label: &str) -> Self {
        Self::new(field, label, FacetKind::Checkbox)
    }

    pub fn range(field: &str, label: &str, bounds: Option<[f64; 2]>) -> Self {
        Self {
            bounds,
            ..Self::new(field, label, FacetKind::Range)
        }
    }

    pub fn date(field: &str, label: &str) -> Self {
        Self::new(field, label, FacetKind::Date)
    }

    fn new(field: &str, label: &str, kind: FacetKind) -> Self {
        Self {
            field: field.to_string(),
            label: label.to_string(),
            kind,
            bounds: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateBounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

impl DateBounds {
    pub fn is_set(&self) -> bool {
        self.start.as_deref().is_some_and(|s| !s.is_empty())
            || self.end.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// Selection held for one facet. Serialized untagged so the persisted
/// shapes are `["A","MX"]`, `[10, 3600]` and `{"start": .., "end": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FacetSelection {
    Values(Vec<String>),
    Range([f64; 2]),
    Dates(DateBounds),
}

pub type ColumnFilters = BTreeMap<String, FacetSelection>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacetValue {
    pub value: String,
    pub count: usize,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Facet {
    pub field: String,
    pub label: String,
    pub kind: FacetKind,
    /// Checkbox facets only.
    pub values: Vec<FacetValue>,
    /// Range facets only: current selection or the spec bounds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<[f64; 2]>,
    /// Date facets only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dates: Option<DateBounds>,
}

pub fn compute_facets(rows: &[Row], specs: &[FacetSpec], filters: &ColumnFilters) -> Vec<Facet> {
    specs
        .iter()
        .map(|spec| {
            let current = filters.get(&spec.field);
            let mut facet = Facet {
                field: spec.field.clone(),
                label: spec.label.clone(),
                kind: spec.kind,
                values: Vec::new(),
                range: None,
                dates: None,
            };

            match spec.kind {
                FacetKind::Checkbox => facet.values = count_values(rows, &spec.field, current),
                FacetKind::Range => {
                    facet.range = Some(match current {
                        Some(FacetSelection::Range(range)) => *range,
                        _ => spec.bounds.unwrap_or(DEFAULT_RANGE),
                    })
                }
                FacetKind::Date => {
                    facet.dates = Some(match current {
                        Some(FacetSelection::Dates(bounds)) => bounds.clone(),
                        _ => DateBounds::default(),
                    })
                }
            }

            facet
        })
        .collect()
}

fn count_values(rows: &[Row], field: &str, current: Option<&FacetSelection>) -> Vec<FacetValue> {
    let mut grouped: BTreeMap<String, usize> = BTreeMap::new();
    for row in rows {
        if let Some(key) = row.get(field).and_then(facet_key) {
            *grouped.entry(key).or_insert(0) += 1;
        }
    }

    let selected: &[String] = match current {
        Some(FacetSelection::Values(values)) => values,
        _ => &[],
    };

    let mut values: Vec<_> = grouped
        .into_iter()
        .map(|(value, count)| FacetValue {
            selected: selected.contains(&value),
            value,
            count,
        })
        .collect();
    values.sort_by_key(|v| (Reverse(v.count), v.value.clone()));
    values
}

fn facet_key(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Toggle `value` in the checkbox selection for `field`.
pub fn select_facet_value(filters: &mut ColumnFilters, field: &str, value: &str) {
    let mut values = match filters.remove(field) {
        Some(FacetSelection::Values(values)) => values,
        _ => Vec::new(),
    };

    if let Some(pos) = values.iter().position(|v| v == value) {
        values.remove(pos);
    } else {
        values.push(value.to_string());
    }

    if !values.is_empty() {
        filters.insert(field.to_string(), FacetSelection::Values(values));
    }
}

pub fn set_range(filters: &mut ColumnFilters, field: &str, range: [f64; 2]) {
    filters.insert(field.to_string(), FacetSelection::Range(range));
}

/// Set date bounds; clearing both bounds removes the facet key.
pub fn set_date_range(filters: &mut ColumnFilters, field: &str, bounds: DateBounds) {
    if bounds.is_set() {
        filters.insert(field.to_string(), FacetSelection::Dates(bounds));
    } else {
        filters.remove(field);
    }
}

pub fn clear_facet(filters: &mut ColumnFilters, field: &str) {
    filters.remove(field);
}

pub fn clear_all(filters: &mut ColumnFilters) {
    filters.clear();
}

/// Number of active selections on `field`, as shown on the facet badge.
pub fn selected_count(filters: &ColumnFilters, field: &str) -> usize {
    match filters.get(field) {
        None => 0,
        Some(FacetSelection::Values(values)) => values.len(),
        Some(FacetSelection::Range(_)) => 1,
        Some(FacetSelection::Dates(bounds)) => usize::from(bounds.is_set()),
    }
}

/// Facet selections as an AND group of predicates.
pub fn facet_predicates(filters: &ColumnFilters) -> RuleTree {
    let mut tree = RuleTree::new();

    for (field, selection) in filters {
        match selection {
            FacetSelection::Values(values) if !values.is_empty() => {
                tree.push(Rule::new(
                    field.as_str(),
                    Operator::In,
                    RuleValue::List(values.clone()),
                ));
            }
            FacetSelection::Values(_) => {}
            FacetSelection::Range([min, max]) => {
                tree.push(Rule::new(field.as_str(), Operator::Gte, number(*min)));
                tree.push(Rule::new(field.as_str(), Operator::Lte, number(*max)));
            }
            FacetSelection::Dates(bounds) => {
                let pairs = [(&bounds.start, Operator::Gte), (&bounds.end, Operator::Lte)];
                for (bound, operator) in pairs {
                    if let Some(text) = bound.as_deref().filter(|s| !s.is_empty()) {
                        tree.push(RuleNode::Leaf(Rule::new(
                            field.as_str(),
                            operator,
                            RuleValue::from_token(text),
                        )));
                    }
                }
            }
        }
    }

    tree
}

fn number(n: f64) -> RuleValue {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        RuleValue::Integer(n as i64)
    } else {
        RuleValue::Float(n)
    }
}
