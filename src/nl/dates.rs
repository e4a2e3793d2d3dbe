use chrono::{DateTime, Datelike, NaiveDate, Utc};
use regex::{Captures, Regex};
use std::sync::LazyLock;

static ISO_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").expect("valid iso date regex"));
static MONTH_DAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?\s+(\d{1,2})(?:st|nd|rd|th)?(?:,?\s+(\d{4}))?\b",
    )
    .expect("valid month day regex")
});
static SLASH_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").expect("valid slash date regex")
});

/// Find the first absolute calendar date in `text`.
///
/// Understands `2026-01-05`, `January 5`, `Jan 5th, 2026` and `1/5/2026`
/// (month first). A month/day without a year takes the year of `now`.
/// The result is midnight UTC. Impossible dates (`February 30`) are ignored.
pub fn parse_absolute_date(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let candidates = [
        first_valid(&ISO_DATE_RE, text, |caps| {
            ymd(num(caps, 1)?, num(caps, 2)?, num(caps, 3)?)
        }),
        first_valid(&MONTH_DAY_RE, text, |caps| {
            let month = month_number(caps.get(1)?.as_str())?;
            let year = caps
                .get(3)
                .and_then(|y| y.as_str().parse().ok())
                .unwrap_or(now.year());
            ymd(year, month, num(caps, 2)?)
        }),
        first_valid(&SLASH_DATE_RE, text, |caps| {
            ymd(num(caps, 3)?, num(caps, 1)?, num(caps, 2)?)
        }),
    ];

    // earliest position in the text wins across formats
    candidates
        .into_iter()
        .flatten()
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, date)| date)
}

fn first_valid(
    re: &Regex,
    text: &str,
    build: impl Fn(&Captures) -> Option<NaiveDate>,
) -> Option<(usize, DateTime<Utc>)> {
    re.captures_iter(text).find_map(|caps| {
        let start = caps.get(0)?.start();
        let date = build(&caps)?;
        Some((start, date.and_hms_opt(0, 0, 0)?.and_utc()))
    })
}

fn num<T: std::str::FromStr>(caps: &Captures, idx: usize) -> Option<T> {
    caps.get(idx)?.as_str().parse().ok()
}

fn ymd(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
}

fn month_number(name: &str) -> Option<u32> {
    let prefix: String = name.to_lowercase().chars().take(3).collect();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}
