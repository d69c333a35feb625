use chrono::{Local, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Zone {
    Local,
    Named(Tz),
}

/// Maps epoch seconds to calendar-day keys (`YYYY-MM-DD`) in one timezone.
///
/// The ledger day count and the `day` of every simulated trade must come from
/// the same resolver, otherwise the daily cap drifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayKeyResolver {
    zone: Zone,
}

impl DayKeyResolver {
    /// Resolve days in the process's local timezone.
    pub fn local() -> Self {
        Self { zone: Zone::Local }
    }

    pub fn utc() -> Self {
        Self::new(chrono_tz::UTC)
    }

    pub fn new(tz: Tz) -> Self {
        Self {
            zone: Zone::Named(tz),
        }
    }

    /// Parse a timezone setting. `local`, `auto` and the empty string select
    /// the process timezone; anything else must be an IANA name.
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim() {
            "" | "local" | "auto" => Ok(Self::local()),
            other => other
                .parse::<Tz>()
                .map(Self::new)
                .map_err(|e| Error::Config(format!("unknown timezone '{other}': {e}"))),
        }
    }

    /// Wall-clock time at `epoch_secs` in this timezone.
    pub fn to_local(&self, epoch_secs: i64) -> Option<NaiveDateTime> {
        let utc = Utc.timestamp_opt(epoch_secs, 0).single()?;
        Some(match self.zone {
            Zone::Local => utc.with_timezone(&Local).naive_local(),
            Zone::Named(tz) => utc.with_timezone(&tz).naive_local(),
        })
    }

    /// Calendar-day key of `epoch_secs`. Timestamps outside chrono's range
    /// map to the epoch day.
    pub fn day_key(&self, epoch_secs: i64) -> String {
        match self.to_local(epoch_secs) {
            Some(local) => local.format("%Y-%m-%d").to_string(),
            None => "1970-01-01".to_string(),
        }
    }

    pub fn name(&self) -> String {
        match self.zone {
            Zone::Local => "local".to_string(),
            Zone::Named(tz) => tz.name().to_string(),
        }
    }
}

impl Default for DayKeyResolver {
    fn default() -> Self {
        Self::local()
    }
}
