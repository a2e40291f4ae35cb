use std::time::Duration;

use chrono::TimeDelta;
use tracing::warn;

pub const DEFAULT_TTL: TimeDelta = TimeDelta::hours(24);
pub const DEFAULT_REAP_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    /// Lifetime given to sessions issued from now on.
    ///
    /// Zero or negative values are accepted and produce sessions that are
    /// expired as soon as they are issued.
    pub ttl: TimeDelta,

    /// Period between reaper sweeps.
    ///
    /// Bounds how long an expired record can keep occupying memory:
    /// at most one interval past its expiry.
    pub reap_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            reap_interval: DEFAULT_REAP_INTERVAL,
        }
    }
}

impl StoreConfig {
    /// Reads `SESSION_TTL_SECS` and `SESSION_REAP_INTERVAL_SECS`, falling back
    /// to defaults for anything missing or malformed.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let ttl = match lookup("SESSION_TTL_SECS") {
            None => defaults.ttl,
            Some(raw) => match raw.trim().parse::<i64>().ok().and_then(TimeDelta::try_seconds) {
                Some(ttl) => ttl,
                None => {
                    warn!(value = %raw, "invalid SESSION_TTL_SECS; using default");
                    defaults.ttl
                }
            },
        };

        let reap_interval = match lookup("SESSION_REAP_INTERVAL_SECS") {
            None => defaults.reap_interval,
            Some(raw) => match raw.trim().parse::<u64>() {
                // tokio intervals reject a zero period
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    warn!(value = %raw, "invalid SESSION_REAP_INTERVAL_SECS; using default");
                    defaults.reap_interval
                }
            },
        };

        Self { ttl, reap_interval }
    }

    pub fn with_ttl(mut self, ttl: TimeDelta) -> Self {
        self.ttl = ttl;
        self
    }

    /// A zero interval is replaced by the default.
    pub fn with_reap_interval(mut self, every: Duration) -> Self {
        self.reap_interval = if every.is_zero() {
            DEFAULT_REAP_INTERVAL
        } else {
            every
        };
        self
    }
}
