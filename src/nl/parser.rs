use super::dates::parse_absolute_date;
use crate::clock::{Clock, SystemClock};
use crate::rules::{Combinator, Operator, Rule, RuleTree, RuleValue};
use chrono::{DateTime, TimeDelta, Utc};
use regex::Regex;
use std::sync::LazyLock;

/// DNS record types recognized in `<TYPE> record(s)` phrases.
pub const RECORD_TYPES: [&str; 10] = [
    "A", "AAAA", "CNAME", "MX", "TXT", "NS", "SOA", "PTR", "SRV", "CAA",
];

static RECORD_TYPE_RES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    RECORD_TYPES
        .iter()
        .map(|ty| {
            let re = Regex::new(&format!(r"(?i)\b{ty}\s+records?\b"))
                .expect("valid record type regex");
            (*ty, re)
        })
        .collect()
});

static LAST_HOURS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\blast\s+(\d+)\s+hours?\b").expect("valid hours regex"));
static LAST_DAYS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\blast\s+(\d+)\s+days?\b").expect("valid days regex"));
static LAST_WEEK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\blast\s+week\b").expect("valid week regex"));
static LAST_MONTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\blast\s+month\b").expect("valid month regex"));
static TODAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\btoday\b").expect("valid today regex"));
static YESTERDAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\byesterday\b").expect("valid yesterday regex"));

static TTL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bttl\s*(>=|<=|!=|==|=|>|<)?\s*(\d+)").expect("valid ttl regex")
});
static PRIORITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bpriority\s*(>=|<=|!=|==|=|>|<)?\s*(\d+)").expect("valid priority regex")
});
static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:domain|name|for)\s+((?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,63})\b",
    )
    .expect("valid name regex")
});
static CONTAINING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bcontaining\s+["']([^"']+)["']"#).expect("valid containing regex")
});
static EXCLUDING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bexcluding\s+["']([^"']+)["']"#).expect("valid excluding regex")
});
static ACTIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bactive\b").expect("valid active regex"));
static INACTIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\binactive\b").expect("valid inactive regex"));
static OR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bor\b|\|\|").expect("valid or regex"));

/// Parse free text against the wall clock.
pub fn parse(text: &str) -> RuleTree {
    parse_with_clock(text, &SystemClock)
}

/// Parse free text, reading "now" from `clock` for relative and partial dates.
pub fn parse_with_clock(text: &str, clock: &dyn Clock) -> RuleTree {
    let now = clock.now();
    let mut tree = RuleTree::with_combinator(combinator_for(text));

    for (ty, re) in RECORD_TYPE_RES.iter() {
        if re.is_match(text) {
            tree.push(Rule::new("type", Operator::Eq, *ty));
        }
    }

    let remaining = match relative_cutoff(text, now) {
        Some((cutoff, span)) => {
            tree.push(Rule::new("createdAt", Operator::Gte, cutoff));
            let mut rest = text.to_string();
            rest.replace_range(span, " ");
            rest
        }
        None => text.to_string(),
    };

    if let Some(date) = parse_absolute_date(&remaining, now) {
        tree.push(Rule::new("createdAt", Operator::Gte, date));
    }

    if let Some(rule) = numeric_comparator(&TTL_RE, "ttl", text) {
        tree.push(rule);
    }
    if let Some(rule) = numeric_comparator(&PRIORITY_RE, "priority", text) {
        tree.push(rule);
    }

    if let Some(fqdn) = first_capture(&NAME_RE, text) {
        tree.push(Rule::new("name", Operator::Contains, fqdn));
    }
    if let Some(needle) = first_capture(&CONTAINING_RE, text) {
        tree.push(Rule::new("value", Operator::Contains, needle));
    }
    if let Some(needle) = first_capture(&EXCLUDING_RE, text) {
        tree.push(Rule::new("value", Operator::DoesNotContain, needle));
    }

    // contradictory phrases both contribute, producing an always-false AND
    if ACTIVE_RE.is_match(text) {
        tree.push(Rule::new("enabled", Operator::Eq, true));
    }
    if INACTIVE_RE.is_match(text) {
        tree.push(Rule::new("enabled", Operator::Eq, false));
    }

    tracing::debug!(
        rules = tree.rules.len(),
        combinator = %tree.combinator,
        "parsed natural-language query"
    );
    tree
}

fn combinator_for(text: &str) -> Combinator {
    if OR_RE.is_match(text) {
        Combinator::Or
    } else {
        Combinator::And
    }
}

/// First matching relative-time phrase, in priority order, with its byte span.
fn relative_cutoff(
    text: &str,
    now: DateTime<Utc>,
) -> Option<(DateTime<Utc>, std::ops::Range<usize>)> {
    let counted: [(&Regex, fn(i64) -> Option<TimeDelta>); 2] = [
        (&LAST_HOURS_RE, TimeDelta::try_hours),
        (&LAST_DAYS_RE, TimeDelta::try_days),
    ];
    for (re, unit) in counted {
        let Some(caps) = re.captures(text) else {
            continue;
        };
        // an out-of-range count leaves the later phrases in play
        let cutoff = caps[1]
            .parse::<i64>()
            .ok()
            .and_then(unit)
            .and_then(|delta| now.checked_sub_signed(delta));
        if let (Some(cutoff), Some(whole)) = (cutoff, caps.get(0)) {
            return Some((cutoff, whole.range()));
        }
    }

    let fixed: [(&Regex, i64); 2] = [(&LAST_WEEK_RE, 7), (&LAST_MONTH_RE, 30)];
    for (re, days) in fixed {
        if let Some(m) = re.find(text) {
            return Some((now - TimeDelta::days(days), m.range()));
        }
    }

    if let Some(m) = TODAY_RE.find(text) {
        let midnight = now.date_naive().and_hms_opt(0, 0, 0)?.and_utc();
        return Some((midnight, m.range()));
    }
    if let Some(m) = YESTERDAY_RE.find(text) {
        return Some((now - TimeDelta::days(1), m.range()));
    }

    None
}

fn numeric_comparator(re: &Regex, field: &str, text: &str) -> Option<Rule> {
    let caps = re.captures(text)?;
    let operator = caps
        .get(1)
        .and_then(|m| Operator::from_comparator(m.as_str()))
        .unwrap_or(Operator::Eq);
    let amount: i64 = caps[2].parse().ok()?;
    Some(Rule::new(field, operator, RuleValue::Integer(amount)))
}

fn first_capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text)?.get(1).map(|m| m.as_str())
}
