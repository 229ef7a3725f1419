//! Time zone parsing and conversion helpers.
//!
//! What this module provides:
//! - [`parse_ts_to_utc`]: Parse RFC-3339 timestamps with an explicit offset and convert to UTC.
//! - [`to_rfc3339_millis`]: The single storage format for reading timestamps.
//! - [`from_local_naive_with_policy`]: Resolve a naive local wall time in an IANA zone to
//!   UTC, choosing how DST gaps and ambiguities are handled via [`DstPolicy`].
//!
//! Notes:
//! - All database writes are RFC-3339 UTC strings with millisecond precision, so
//!   lexical order of the stored column equals chronological order.
//! - Local time only matters for deciding which calendar day a reading belongs to.
//!   A few zones move their clocks at midnight, which is why day boundaries are
//!   resolved with [`DstPolicy::Lenient`] rather than failing.

use anyhow::Context;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// RFC-3339 with offset -> UTC.
///
/// Example:
/// - "2024-03-10T09:30:00-05:00" -> "2024-03-10T14:30:00Z"
pub fn parse_ts_to_utc(s: &str) -> anyhow::Result<DateTime<Utc>> {
    let dt = DateTime::parse_from_rfc3339(s).with_context(|| format!("bad rfc3339: {s}"))?;
    Ok(dt.with_timezone(&Utc))
}

/// Format a UTC datetime as an RFC-3339 string with millisecond precision.
pub fn to_rfc3339_millis(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Policy for handling DST edge cases when converting local naive timestamps to UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DstPolicy {
    /// Error on ambiguous (fall-back) or nonexistent (spring-forward) local times.
    Strict,
    /// Ambiguous times resolve to the earlier instant; nonexistent times shift
    /// forward minute by minute (at most two hours) to the first valid instant.
    Lenient,
}

/// Convert a naive local timestamp to UTC using a specific IANA time zone and DST policy.
///
/// Errors:
/// - Returns an error if the time is ambiguous or nonexistent and the policy does not resolve it.
pub fn from_local_naive_with_policy(
    naive: NaiveDateTime,
    tz: Tz,
    policy: DstPolicy,
) -> anyhow::Result<DateTime<Utc>> {
    use chrono::offset::LocalResult::*;
    match tz.from_local_datetime(&naive) {
        Single(dt) => Ok(dt.with_timezone(&Utc)),
        Ambiguous(a, _) if policy == DstPolicy::Lenient => Ok(a.with_timezone(&Utc)),
        Ambiguous(..) => Err(anyhow::anyhow!("ambiguous local time {naive} in {tz}")),
        None if policy == DstPolicy::Lenient => {
            let mut t = naive;
            for _ in 0..120 {
                t += chrono::Duration::minutes(1);
                match tz.from_local_datetime(&t) {
                    Single(dt) | Ambiguous(dt, _) => return Ok(dt.with_timezone(&Utc)),
                    None => {}
                }
            }
            Err(anyhow::anyhow!("nonexistent local time {naive} in {tz}"))
        }
        None => Err(anyhow::anyhow!("nonexistent local time {naive} in {tz}")),
    }
}

/// Parse an IANA zone name such as `"Europe/Budapest"`.
pub fn parse_tz(name: &str) -> anyhow::Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| anyhow::anyhow!("bad tz: {name}: {e}"))
}
