//! The composite filter a filtering view owns, and everything that keeps it
//! alive across reloads.

mod manager;
mod storage;
mod url;

pub use manager::{FilterStateManager, FilterStateManagerBuilder, SubscriptionId};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use url::{FILTER_PARAM, UrlLocation};

use crate::facets::{ColumnFilters, facet_predicates};
use crate::rules::{Combinator, Operator, Rule, RuleNode, RuleTree};
use chrono::{DateTime, TimeDelta, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimePreset {
    #[serde(rename = "last-hour")]
    LastHour,
    #[serde(rename = "last-24h")]
    Last24h,
    #[serde(rename = "last-7d")]
    Last7d,
    #[serde(rename = "last-30d")]
    Last30d,
    #[serde(rename = "last-90d")]
    Last90d,
    #[default]
    #[serde(rename = "custom")]
    Custom,
}

impl TimePreset {
    pub fn window(&self) -> Option<TimeDelta> {
        match self {
            TimePreset::LastHour => Some(TimeDelta::hours(1)),
            TimePreset::Last24h => Some(TimeDelta::hours(24)),
            TimePreset::Last7d => Some(TimeDelta::days(7)),
            TimePreset::Last30d => Some(TimeDelta::days(30)),
            TimePreset::Last90d => Some(TimeDelta::days(90)),
            TimePreset::Custom => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub preset: TimePreset,
}

impl TimeRange {
    /// Window for `preset` ending at `now`, computed once. It does not
    /// slide forward afterwards. `Custom` yields an open range.
    pub fn from_preset(preset: TimePreset, now: DateTime<Utc>) -> Self {
        match preset.window() {
            Some(window) => Self {
                start: Some(now - window),
                end: Some(now),
                preset,
            },
            None => Self {
                preset,
                ..Self::default()
            },
        }
    }

    pub fn custom(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self {
            start,
            end,
            preset: TimePreset::Custom,
        }
    }

    fn predicates(&self) -> Vec<RuleNode> {
        let mut out = Vec::new();
        if let Some(start) = self.start {
            out.push(Rule::new("createdAt", Operator::Gte, start).into());
        }
        if let Some(end) = self.end {
            out.push(Rule::new("createdAt", Operator::Lte, end).into());
        }
        out
    }
}

/// Everything the filtering UI has selected; the unit that gets persisted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterState {
    pub query: RuleTree,
    pub time_range: TimeRange,
    /// Opaque tags interpreted by the data layer.
    pub quick_filters: BTreeSet<String>,
    pub column_filters: ColumnFilters,
    pub search_term: String,
    pub regex: Option<String>,
    pub natural_language_query: Option<String>,
}

impl FilterState {
    /// Query, time range and facet selections as one AND tree.
    ///
    /// Quick filters, the search term and the regex are left to the
    /// consumer.
    pub fn to_rule_tree(&self) -> RuleTree {
        let mut combined = RuleTree::new();

        if !self.query.is_empty() {
            if self.query.combinator == Combinator::And {
                combined.rules.extend(self.query.rules.iter().cloned());
            } else {
                combined.push(self.query.clone());
            }
        }
        combined.rules.extend(self.time_range.predicates());
        combined.rules.extend(facet_predicates(&self.column_filters).rules);

        combined
    }

    /// Compiled regex, only when the stored pattern is valid.
    pub fn active_regex(&self) -> Option<Regex> {
        let pattern = self.regex.as_deref().filter(|p| !p.is_empty())?;
        Regex::new(pattern).ok()
    }
}

/// Result of checking a regex pattern typed by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegexCheck {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub fn validate_pattern(pattern: &str) -> RegexCheck {
    match Regex::new(pattern) {
        Ok(_) => RegexCheck {
            valid: true,
            message: None,
        },
        Err(e) => RegexCheck {
            valid: false,
            message: Some(e.to_string()),
        },
    }
}

/// Partial update merged shallowly into a [`FilterState`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterUpdate {
    pub query: Option<RuleTree>,
    pub time_range: Option<TimeRange>,
    pub quick_filters: Option<BTreeSet<String>>,
    pub column_filters: Option<ColumnFilters>,
    pub search_term: Option<String>,
    pub regex: Option<Option<String>>,
    pub natural_language_query: Option<Option<String>>,
}

impl FilterUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, query: RuleTree) -> Self {
        self.query = Some(query);
        self
    }

    pub fn time_range(mut self, time_range: TimeRange) -> Self {
        self.time_range = Some(time_range);
        self
    }

    pub fn quick_filters<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.quick_filters = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn column_filters(mut self, filters: ColumnFilters) -> Self {
        self.column_filters = Some(filters);
        self
    }

    pub fn search_term(mut self, term: impl Into<String>) -> Self {
        self.search_term = Some(term.into());
        self
    }

    pub fn regex(mut self, pattern: Option<impl Into<String>>) -> Self {
        self.regex = Some(pattern.map(Into::into));
        self
    }

    pub fn natural_language_query(mut self, text: Option<impl Into<String>>) -> Self {
        self.natural_language_query = Some(text.map(Into::into));
        self
    }

    pub fn apply_to(self, state: &mut FilterState) {
        if let Some(query) = self.query {
            state.query = query;
        }
        if let Some(time_range) = self.time_range {
            state.time_range = time_range;
        }
        if let Some(tags) = self.quick_filters {
            state.quick_filters = tags;
        }
        if let Some(filters) = self.column_filters {
            state.column_filters = filters;
        }
        if let Some(term) = self.search_term {
            state.search_term = term;
        }
        if let Some(regex) = self.regex {
            state.regex = regex;
        }
        if let Some(text) = self.natural_language_query {
            state.natural_language_query = text;
        }
    }
}

impl From<FilterState> for FilterUpdate {
    /// Update that replaces every member, e.g. when loading a preset.
    fn from(state: FilterState) -> Self {
        Self {
            query: Some(state.query),
            time_range: Some(state.time_range),
            quick_filters: Some(state.quick_filters),
            column_filters: Some(state.column_filters),
            search_term: Some(state.search_term),
            regex: Some(state.regex),
            natural_language_query: Some(state.natural_language_query),
        }
    }
}
