use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Caller-supplied data stored with a session. Never interpreted by the store
/// beyond [`Subject::from_attributes`].
pub type Attributes = HashMap<String, Value>;

pub const USER_ID_KEY: &str = "user_id";
pub const USERNAME_KEY: &str = "username";
pub const EMAIL_KEY: &str = "email";

/// Identity fields picked out of the attributes at issuance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
}

impl Subject {
    /// Only string values count; a numeric `user_id` is left in the
    /// attributes but not promoted.
    pub fn from_attributes(attributes: &Attributes) -> Self {
        let pick = |key: &str| {
            attributes
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_owned)
        };

        Self {
            user_id: pick(USER_ID_KEY),
            username: pick(USERNAME_KEY),
            email: pick(EMAIL_KEY),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.username.is_none() && self.email.is_none()
    }
}

/// One issued session. Callers only ever see clones of the stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,

    // Identity
    pub subject: Subject,
    pub attributes: Attributes,

    // Lifetime
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Build a record whose expiry is `now + ttl`, saturating toward the
    /// sign of `ttl` when the sum leaves the representable range.
    pub(crate) fn new(
        token: String,
        subject: Subject,
        attributes: Attributes,
        now: DateTime<Utc>,
        ttl: TimeDelta,
    ) -> Self {
        let expires_at = now.checked_add_signed(ttl).unwrap_or(if ttl < TimeDelta::zero() {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        });

        Self {
            token,
            subject,
            attributes,
            created_at: now,
            expires_at,
        }
    }

    /// True once `now` is past `expires_at`. A record issued with a
    /// non-positive TTL is never live, even at the instant of issuance.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= self.created_at || now > self.expires_at
    }

    /// Time left before expiry, zero once expired.
    pub fn remaining(&self, now: DateTime<Utc>) -> TimeDelta {
        if self.is_expired(now) {
            return TimeDelta::zero();
        }
        self.expires_at - now
    }
}
