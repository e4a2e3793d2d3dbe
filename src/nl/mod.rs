//! Natural-language record queries
//!
//! Turns free text typed into the search box into a [`RuleTree`]. Each
//! extraction rule below runs independently over the whole text and may
//! contribute one leaf; nothing is ever rejected, and text with no
//! recognizable phrase yields an empty tree.
//!
//! # Recognized phrases
//!
//! ```text
//! A records / MX record ...     type = <TYPE>          (A AAAA CNAME MX TXT NS SOA PTR SRV CAA)
//! last 6 hours / last 3 days    createdAt >= now - N   (first match wins:
//! last week / last month        createdAt >= now - 7d / 30d   hours, days, week,
//! today / yesterday             createdAt >= midnight / now - 1d   month, today, yesterday)
//! January 5 / 2026-01-05        createdAt >= that date
//! TTL > 3600 / ttl 300          ttl <op> N             (op defaults to =)
//! priority <= 10                priority <op> N
//! domain / name / for <fqdn>    name contains <fqdn>
//! containing "spf1"             value contains spf1
//! excluding "google"            value doesNotContain google
//! active / inactive             enabled = true / false
//! ... or ... / ||               top-level combinator OR (otherwise AND)
//! ```
//!
//! # Examples
//!
//! ```text
//! show all A records from last 24 hours
//! MX records for example.com with priority < 20
//! TXT records containing "spf1" excluding "google"
//! ```

mod dates;
mod parser;

pub use dates::parse_absolute_date;
pub use parser::{RECORD_TYPES, parse, parse_with_clock};
