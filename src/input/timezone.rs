//! Time-zone policy used to read naive timestamps and to render window edges.
//!
//! `Local` follows the executing machine's zone, which is what the classic
//! output format expects. `Utc` and named IANA zones make the output
//! reproducible across machines.

use chrono::{
    DateTime, Duration, FixedOffset, Local, LocalResult, NaiveDateTime, Offset, TimeZone, Utc,
};
use chrono_tz::Tz;
use std::fmt;
use std::str::FromStr;

/// Format of the `date` field in emitted records.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Which calendar the engine reads and writes wall-clock times in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeZonePolicy {
    /// Time zone of the executing machine
    #[default]
    Local,
    /// Coordinated Universal Time
    Utc,
    /// A named IANA zone, e.g. `Europe/Lisbon`
    Named(Tz),
}

impl TimeZonePolicy {
    /// Render an epoch minute as `YYYY-MM-DD HH:MM:SS` in this zone.
    pub fn format_epoch_minute(&self, epoch_minute: i64) -> String {
        let instant = epoch_minute
            .checked_mul(60)
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        match self {
            TimeZonePolicy::Local => instant.with_timezone(&Local).format(DATE_FORMAT),
            TimeZonePolicy::Utc => instant.format(DATE_FORMAT),
            TimeZonePolicy::Named(tz) => instant.with_timezone(tz).format(DATE_FORMAT),
        }
        .to_string()
    }

    /// Attach this zone's offset to a timestamp that carried none.
    ///
    /// Ambiguous wall-clock times (DST fall-back) resolve to the earlier
    /// instant. Wall-clock times skipped by a DST gap are read with the
    /// offset in force before the gap. Returns `None` only when the result
    /// falls outside the representable range.
    pub fn interpret_naive(&self, naive: &NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        match self {
            TimeZonePolicy::Local => resolve_local(&Local, naive),
            TimeZonePolicy::Utc => Some(Utc.from_utc_datetime(naive).fixed_offset()),
            TimeZonePolicy::Named(tz) => resolve_local(tz, naive),
        }
    }
}

fn resolve_local<Z: TimeZone>(tz: &Z, naive: &NaiveDateTime) -> Option<DateTime<FixedOffset>> {
    match tz.from_local_datetime(naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
            let offset = dt.offset().fix();
            Some(dt.with_timezone(&offset))
        }
        LocalResult::None => {
            // A day earlier is safely before the transition
            let before = naive.checked_sub_signed(Duration::days(1))?;
            let offset = tz.offset_from_utc_datetime(&before).fix();
            offset.from_local_datetime(naive).single()
        }
    }
}

impl fmt::Display for TimeZonePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeZonePolicy::Local => write!(f, "local"),
            TimeZonePolicy::Utc => write!(f, "utc"),
            TimeZonePolicy::Named(tz) => write!(f, "{}", tz.name()),
        }
    }
}

impl FromStr for TimeZonePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "local" => Ok(TimeZonePolicy::Local),
            "utc" | "z" => Ok(TimeZonePolicy::Utc),
            _ => trimmed
                .parse::<Tz>()
                .map(TimeZonePolicy::Named)
                .map_err(|_| format!("unknown time zone '{trimmed}'")),
        }
    }
}
