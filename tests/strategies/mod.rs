//! Generators for rule trees and filter states.
//!
//! `any_*` strategies cover every persisted shape and feed the round-trip
//! checks. `record_*` strategies stay within the typed columns of the DNS
//! record fixture so SQL, Mongo and in-process evaluation can be compared.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use dns_query_filter::clock::format_timestamp;
use dns_query_filter::facets::{ColumnFilters, DateBounds, FacetSelection};
use dns_query_filter::state::{FilterState, TimePreset, TimeRange};
use dns_query_filter::{Combinator, Operator, Rule, RuleNode, RuleTree, RuleValue};
use proptest::prelude::*;
use proptest::sample::{select, subsequence};

const TEXT_FIELDS: [&str; 3] = ["name", "type", "value"];
const NUMBER_FIELDS: [&str; 3] = ["id", "ttl", "priority"];
const RECORD_TYPES: [&str; 6] = ["A", "AAAA", "CNAME", "MX", "NS", "TXT"];
const TEXT_SAMPLES: [&str; 10] = [
    "MX",
    "TXT",
    "example.com",
    "mail.",
    ".org",
    "spf1",
    "100%",
    "off_",
    "it's",
    "V=SPF1",
];
const CREATED_SAMPLES: [&str; 4] = [
    "2026-10-18T09:00:00.000Z",
    "2026-10-17T00:00:00.000Z",
    "2026-10-16T23:59:59.999Z",
    "2026-09-01T12:00:00.000Z",
];

/// Instants between 2026-08-01 and 2026-11-01 at millisecond precision.
pub fn instant() -> impl Strategy<Value = DateTime<Utc>> {
    (1_785_542_400_000i64..1_793_491_200_000)
        .prop_map(|ms| DateTime::from_timestamp_millis(ms).unwrap())
}

/// Floats with two decimals; their JSON text parses back to the same value.
pub fn decimal() -> impl Strategy<Value = f64> {
    (-10_000_000i64..10_000_000).prop_map(|n| n as f64 / 100.0)
}

fn combinator() -> impl Strategy<Value = Combinator> {
    prop_oneof![Just(Combinator::And), Just(Combinator::Or)]
}

fn known(operators: Vec<Operator>) -> impl Strategy<Value = Operator> {
    select(operators)
}

fn unknown_operator() -> impl Strategy<Value = Operator> {
    "fuzzy[A-Za-z]{0,4}".prop_map(Operator::from)
}

/// Groups nested up to three levels, empty groups included.
pub fn tree_of(leaf: BoxedStrategy<Rule>) -> impl Strategy<Value = RuleTree> {
    let node = leaf
        .prop_map(RuleNode::Leaf)
        .prop_recursive(3, 24, 4, |inner| {
            (combinator(), prop::collection::vec(inner, 0..4))
                .prop_map(|(combinator, rules)| RuleNode::Group(RuleTree { combinator, rules }))
        });
    (combinator(), prop::collection::vec(node, 0..4))
        .prop_map(|(combinator, rules)| RuleTree { combinator, rules })
}

pub fn any_value() -> impl Strategy<Value = RuleValue> {
    prop_oneof![
        any::<bool>().prop_map(RuleValue::Bool),
        any::<i64>().prop_map(RuleValue::Integer),
        decimal().prop_map(RuleValue::Float),
        instant().prop_map(RuleValue::from),
        instant().prop_map(|ts| RuleValue::from(ts.to_rfc3339())),
        prop::collection::vec(".{0,6}", 0..4).prop_map(RuleValue::List),
        ".{0,12}".prop_map(RuleValue::from),
    ]
}

pub fn any_rule() -> BoxedStrategy<Rule> {
    let operator = prop_oneof![8 => known(Operator::KNOWN.to_vec()), 1 => unknown_operator()];
    (".{0,8}", operator, any_value())
        .prop_map(|(field, operator, value)| Rule::new(field, operator, value))
        .boxed()
}

pub fn any_tree() -> impl Strategy<Value = RuleTree> {
    tree_of(any_rule())
}

fn preset() -> impl Strategy<Value = TimePreset> {
    select(vec![
        TimePreset::LastHour,
        TimePreset::Last24h,
        TimePreset::Last7d,
        TimePreset::Last30d,
        TimePreset::Last90d,
        TimePreset::Custom,
    ])
}

pub fn time_range() -> impl Strategy<Value = TimeRange> {
    prop_oneof![
        Just(TimeRange::default()),
        (preset(), instant()).prop_map(|(preset, now)| TimeRange::from_preset(preset, now)),
        (prop::option::of(instant()), prop::option::of(instant()))
            .prop_map(|(start, end)| TimeRange::custom(start, end)),
    ]
}

fn any_selection() -> impl Strategy<Value = FacetSelection> {
    prop_oneof![
        prop::collection::vec(".{0,6}", 0..3).prop_map(FacetSelection::Values),
        (decimal(), decimal()).prop_map(|(min, max)| FacetSelection::Range([min, max])),
        (prop::option::of(".{0,10}"), prop::option::of(".{0,10}"))
            .prop_map(|(start, end)| FacetSelection::Dates(DateBounds { start, end })),
    ]
}

pub fn any_state() -> impl Strategy<Value = FilterState> {
    (
        any_tree(),
        time_range(),
        prop::collection::btree_set("[A-Za-z ]{1,12}", 0..3),
        prop::collection::btree_map("[a-zA-Z]{1,8}", any_selection(), 0..3),
        ".{0,10}",
        prop::option::of(".{0,8}"),
        prop::option::of(".{0,16}"),
    )
        .prop_map(
            |(query, time_range, quick_filters, column_filters, search_term, regex, nl)| {
                FilterState {
                    query,
                    time_range,
                    quick_filters,
                    column_filters,
                    search_term,
                    regex,
                    natural_language_query: nl,
                }
            },
        )
}

/// `in`/`notIn` operand, either as a JSON list or as comma-separated text.
fn list_operand(token: BoxedStrategy<String>) -> impl Strategy<Value = RuleValue> {
    (prop::collection::vec(token, 1..4), any::<bool>()).prop_map(|(items, as_list)| {
        if as_list {
            RuleValue::List(items)
        } else {
            RuleValue::Text(items.join(", "))
        }
    })
}

fn text_rule() -> impl Strategy<Value = Rule> {
    use Operator::*;
    let operand = prop_oneof![
        select(TEXT_SAMPLES.to_vec()).prop_map(String::from),
        "[a-zA-Z0-9 .%_':=~\\\\-]{0,6}",
    ];
    let scalar = (
        select(TEXT_FIELDS.to_vec()),
        known(vec![
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
        ]),
        operand,
    )
        .prop_map(|(field, op, text)| Rule::new(field, op, RuleValue::Text(text)));

    let token = prop_oneof![
        select(RECORD_TYPES.to_vec()).prop_map(String::from),
        "[A-Z]{1,4}",
    ]
    .boxed();
    let member = (
        select(TEXT_FIELDS.to_vec()),
        known(vec![In, NotIn]),
        list_operand(token),
    )
        .prop_map(|(field, op, value)| Rule::new(field, op, value));

    prop_oneof![3 => scalar, 1 => member]
}

fn number_rule() -> impl Strategy<Value = Rule> {
    use Operator::*;
    let scalar_value = prop_oneof![
        (-5i64..100_000).prop_map(RuleValue::Integer),
        select(vec![0i64, 5, 10, 20, 60, 120, 300, 3600, 7200, 86400]).prop_map(RuleValue::Integer),
        (-500i64..10_000_000).prop_map(|n| RuleValue::Float(n as f64 / 100.0)),
    ];
    let scalar = (
        select(NUMBER_FIELDS.to_vec()),
        known(vec![Eq, NotEq, Gt, Gte, Lt, Lte]),
        scalar_value,
    )
        .prop_map(|(field, op, value)| Rule::new(field, op, value));

    let token = prop_oneof![
        select(vec!["0", "1", "5", "60", "300", "3600", "86400"]).prop_map(String::from),
        (-5i64..100_000).prop_map(|n| n.to_string()),
        (0i64..100_000).prop_map(|n| (n as f64 / 100.0).to_string()),
    ]
    .boxed();
    let member = (
        select(NUMBER_FIELDS.to_vec()),
        known(vec![In, NotIn]),
        list_operand(token),
    )
        .prop_map(|(field, op, value)| Rule::new(field, op, value));

    prop_oneof![3 => scalar, 1 => member]
}

fn bool_rule() -> impl Strategy<Value = Rule> {
    use Operator::*;
    let scalar = (known(vec![Eq, NotEq]), any::<bool>())
        .prop_map(|(op, enabled)| Rule::new("enabled", op, enabled));
    let token = select(vec!["true", "false"]).prop_map(String::from).boxed();
    let member = (known(vec![In, NotIn]), list_operand(token))
        .prop_map(|(op, value)| Rule::new("enabled", op, value));
    prop_oneof![scalar, member]
}

fn date_rule() -> impl Strategy<Value = Rule> {
    use Operator::*;
    let at = prop_oneof![
        instant(),
        select(CREATED_SAMPLES.to_vec()).prop_map(|s| s.parse::<DateTime<Utc>>().unwrap()),
    ];
    (known(vec![Eq, NotEq, Gt, Gte, Lt, Lte]), at)
        .prop_map(|(op, at)| Rule::new("createdAt", op, at))
}

fn unknown_rule() -> impl Strategy<Value = Rule> {
    (select(TEXT_FIELDS.to_vec()), unknown_operator(), "[a-z]{0,5}")
        .prop_map(|(field, op, text)| Rule::new(field, op, RuleValue::Text(text)))
}

/// Leaf rules whose operand type matches the record column they test.
pub fn record_rule() -> BoxedStrategy<Rule> {
    prop_oneof![
        3 => text_rule(),
        3 => number_rule(),
        1 => bool_rule(),
        2 => date_rule(),
        1 => unknown_rule(),
    ]
    .boxed()
}

pub fn record_tree() -> impl Strategy<Value = RuleTree> {
    tree_of(record_rule())
}

fn date_bound() -> impl Strategy<Value = Option<String>> {
    prop::option::of(prop_oneof![
        instant().prop_map(|ts| format_timestamp(&ts)),
        Just("2026-10-16".to_string()),
    ])
}

fn checkbox(items: Vec<&str>) -> FacetSelection {
    FacetSelection::Values(items.into_iter().map(String::from).collect())
}

/// Facet selections on the record columns, boolean checkboxes included.
pub fn record_filters() -> impl Strategy<Value = ColumnFilters> {
    (
        prop::option::of(subsequence(RECORD_TYPES.to_vec(), 1..3)),
        prop::option::of(subsequence(vec!["true", "false"], 1..3)),
        prop::option::of((0u32..90_000, 0u32..90_000)),
        prop::option::of((date_bound(), date_bound())),
    )
        .prop_map(|(types, enabled, ttl, created)| {
            let mut filters = ColumnFilters::new();
            if let Some(types) = types {
                filters.insert("type".into(), checkbox(types));
            }
            if let Some(enabled) = enabled {
                filters.insert("enabled".into(), checkbox(enabled));
            }
            if let Some((min, max)) = ttl {
                filters.insert("ttl".into(), FacetSelection::Range([min.into(), max.into()]));
            }
            if let Some((start, end)) = created {
                let bounds = DateBounds { start, end };
                filters.insert("createdAt".into(), FacetSelection::Dates(bounds));
            }
            filters
        })
}

pub fn record_state() -> impl Strategy<Value = FilterState> {
    (record_tree(), time_range(), record_filters()).prop_map(
        |(query, time_range, column_filters)| FilterState {
            query,
            time_range,
            column_filters,
            ..FilterState::default()
        },
    )
}
