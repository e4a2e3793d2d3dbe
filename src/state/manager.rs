use super::storage::KeyValueStore;
use super::url::{FILTER_PARAM, UrlLocation};
use super::{FilterState, FilterUpdate, RegexCheck, TimePreset, TimeRange, validate_pattern};
use crate::clock::{Clock, SystemClock};
use crate::facets::{self, DateBounds};
use crate::nl;
use crate::rules::RuleTree;
use chrono::{DateTime, Utc};

type Listener = Box<dyn FnMut(&FilterState)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Owns one view's [`FilterState`], persists it after every change and
/// notifies listeners synchronously.
///
/// Single-threaded by construction (listeners are not `Send`); share it
/// across threads only behind a mutex.
pub struct FilterStateManager {
    state: FilterState,
    url: Option<UrlLocation>,
    store: Option<(Box<dyn KeyValueStore>, String)>,
    clock: Box<dyn Clock>,
    on_change: Option<Listener>,
    subscribers: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

pub struct FilterStateManagerBuilder {
    defaults: FilterUpdate,
    url: Option<UrlLocation>,
    store: Option<(Box<dyn KeyValueStore>, String)>,
    clock: Box<dyn Clock>,
    on_change: Option<Listener>,
}

impl Default for FilterStateManagerBuilder {
    fn default() -> Self {
        Self {
            defaults: FilterUpdate::default(),
            url: None,
            store: None,
            clock: Box::new(SystemClock),
            on_change: None,
        }
    }
}

impl FilterStateManagerBuilder {
    /// Values merged over the empty baseline when nothing is persisted.
    pub fn defaults(mut self, defaults: FilterUpdate) -> Self {
        self.defaults = defaults;
        self
    }

    /// Enable URL persistence through the `filter` parameter of `location`.
    pub fn url(mut self, location: UrlLocation) -> Self {
        self.url = Some(location);
        self
    }

    /// Enable local persistence under `key`.
    pub fn storage(mut self, store: impl KeyValueStore + 'static, key: impl Into<String>) -> Self {
        self.store = Some((Box::new(store), key.into()));
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn on_filter_change(mut self, callback: impl FnMut(&FilterState) + 'static) -> Self {
        self.on_change = Some(Box::new(callback));
        self
    }

    /// Hydrate from the URL, then local storage, then the defaults.
    pub fn build(self) -> FilterStateManager {
        let state = self
            .url
            .as_ref()
            .and_then(hydrate_from_url)
            .or_else(|| {
                self.store
                    .as_ref()
                    .and_then(|(store, key)| hydrate_from_store(store.as_ref(), key))
            })
            .unwrap_or_else(|| {
                let mut state = FilterState::default();
                self.defaults.apply_to(&mut state);
                state
            });

        FilterStateManager {
            state,
            url: self.url,
            store: self.store,
            clock: self.clock,
            on_change: self.on_change,
            subscribers: Vec::new(),
            next_subscription: 0,
        }
    }
}

fn hydrate_from_url(url: &UrlLocation) -> Option<FilterState> {
    let raw = url.param(FILTER_PARAM)?;
    match serde_json::from_str(&raw) {
        Ok(state) => Some(state),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unparseable filter URL parameter");
            None
        }
    }
}

fn hydrate_from_store(store: &dyn KeyValueStore, key: &str) -> Option<FilterState> {
    let raw = match store.get(key) {
        Ok(raw) => raw?,
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to read persisted filter state");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(state) => Some(state),
        Err(e) => {
            tracing::warn!(key, error = %e, "ignoring unparseable persisted filter state");
            None
        }
    }
}

impl FilterStateManager {
    pub fn builder() -> FilterStateManagerBuilder {
        FilterStateManagerBuilder::default()
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    /// Current page address, when URL persistence is enabled.
    pub fn url(&self) -> Option<&UrlLocation> {
        self.url.as_ref()
    }

    /// Query, time range and facets combined, see [`FilterState::to_rule_tree`].
    pub fn composite_tree(&self) -> RuleTree {
        self.state.to_rule_tree()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&FilterState) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    pub fn update_filter(&mut self, update: FilterUpdate) {
        update.apply_to(&mut self.state);
        self.changed();
    }

    /// Reset to the empty state: empty AND query, open custom time range,
    /// no quick filters, facets, search term or regex.
    pub fn clear_filters(&mut self) {
        self.state = FilterState::default();
        self.changed();
    }

    /// Parse `text` and merge the result into the query. An empty query is
    /// replaced; otherwise both sides are AND-combined.
    pub fn apply_natural_language(&mut self, text: &str) -> RuleTree {
        let parsed = nl::parse_with_clock(text, self.clock.as_ref());
        let current = std::mem::take(&mut self.state.query);
        self.state.query = current.merge_and(parsed.clone());
        self.state.natural_language_query = Some(text.to_string());
        self.changed();
        parsed
    }

    pub fn set_time_preset(&mut self, preset: TimePreset) {
        self.state.time_range = TimeRange::from_preset(preset, self.clock.now());
        self.changed();
    }

    pub fn set_custom_time_range(
        &mut self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) {
        self.state.time_range = TimeRange::custom(start, end);
        self.changed();
    }

    pub fn toggle_quick_filter(&mut self, tag: &str) {
        if !self.state.quick_filters.remove(tag) {
            self.state.quick_filters.insert(tag.to_string());
        }
        self.changed();
    }

    pub fn set_search_term(&mut self, term: &str) {
        self.state.search_term = term.to_string();
        self.changed();
    }

    /// Store `pattern` as typed and report whether it compiles. Invalid
    /// patterns are kept but never applied.
    pub fn set_regex(&mut self, pattern: &str) -> RegexCheck {
        let check = validate_pattern(pattern);
        if !check.valid {
            tracing::debug!(pattern, "stored regex does not compile");
        }
        self.state.regex = (!pattern.is_empty()).then(|| pattern.to_string());
        self.changed();
        check
    }

    pub fn select_facet_value(&mut self, field: &str, value: &str) {
        facets::select_facet_value(&mut self.state.column_filters, field, value);
        self.changed();
    }

    pub fn set_facet_range(&mut self, field: &str, range: [f64; 2]) {
        facets::set_range(&mut self.state.column_filters, field, range);
        self.changed();
    }

    pub fn set_facet_dates(&mut self, field: &str, bounds: DateBounds) {
        facets::set_date_range(&mut self.state.column_filters, field, bounds);
        self.changed();
    }

    pub fn clear_facet(&mut self, field: &str) {
        facets::clear_facet(&mut self.state.column_filters, field);
        self.changed();
    }

    pub fn clear_all_facets(&mut self) {
        facets::clear_all(&mut self.state.column_filters);
        self.changed();
    }

    pub fn selected_count(&self, field: &str) -> usize {
        facets::selected_count(&self.state.column_filters, field)
    }

    fn changed(&mut self) {
        self.persist();

        if let Some(callback) = self.on_change.as_mut() {
            callback(&self.state);
        }
        for (_, listener) in self.subscribers.iter_mut() {
            listener(&self.state);
        }
    }

    fn persist(&mut self) {
        if self.url.is_none() && self.store.is_none() {
            return;
        }

        let json = match serde_json::to_string(&self.state) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize filter state");
                return;
            }
        };

        if let Some(url) = self.url.as_mut() {
            url.replace_param(FILTER_PARAM, &json);
        }
        if let Some((store, key)) = self.store.as_mut()
            && let Err(e) = store.set(key, &json)
        {
            tracing::warn!(key = %key, error = %e, "failed to persist filter state");
        }
    }
}
