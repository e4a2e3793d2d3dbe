use chrono::{DateTime, SecondsFormat, Utc};

/// Source of "now" for everything that stamps or windows by time.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to one instant, used by tests and the `--now` flag.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    pub fn parse(rfc3339: &str) -> Result<Self, chrono::ParseError> {
        let at = DateTime::parse_from_rfc3339(rfc3339)?.with_timezone(&Utc);
        Ok(Self(at))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Canonical timestamp text used in persisted state and emitted queries.
///
/// Millisecond precision with a `Z` suffix keeps lexicographic and
/// chronological order identical, which both query dialects rely on.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
