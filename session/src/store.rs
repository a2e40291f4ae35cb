//! In-memory session store.
//!
//! The token → record map sits behind a single `RwLock`:
//! - `issue`, `refresh`, `revoke` and sweeps take the write lock
//! - `validate` and `count` take the read lock
//!
//! Nothing here performs I/O, so the operations are synchronous and safe to
//! call from async handlers without `spawn_blocking`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::TimeDelta;
use parking_lot::RwLock;
use tracing::{debug, info, instrument};

use crate::clock::{Clock, SystemClock};
use crate::config::StoreConfig;
use crate::error::{SessionError, SessionResult};
use crate::model::{Attributes, Session, Subject};
use crate::token::{EntropySource, OsEntropy, generate_token, redact};

pub struct SessionStore {
    /// Session storage by token.
    sessions: RwLock<HashMap<String, Session>>,
    /// TTL applied at issuance; existing records keep theirs.
    ttl: RwLock<TimeDelta>,

    clock: Arc<dyn Clock>,
    entropy: Arc<dyn EntropySource>,
}

impl SessionStore {
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl: RwLock::new(config.ttl),
            clock: Arc::new(SystemClock),
            entropy: Arc::new(OsEntropy),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_entropy(mut self, entropy: Arc<dyn EntropySource>) -> Self {
        self.entropy = entropy;
        self
    }

    pub fn ttl(&self) -> TimeDelta {
        *self.ttl.read()
    }

    /// Changes the lifetime of sessions issued from now on.
    pub fn set_ttl(&self, ttl: TimeDelta) {
        let old = std::mem::replace(&mut *self.ttl.write(), ttl);
        info!(
            old_secs = old.num_seconds(),
            new_secs = ttl.num_seconds(),
            "session ttl updated"
        );
    }

    /// Create a session for `attributes` and return its token.
    #[instrument(skip_all, fields(attributes = attributes.len()))]
    pub fn issue(&self, attributes: Attributes) -> SessionResult<String> {
        let token = generate_token(self.entropy.as_ref())?;
        let subject = Subject::from_attributes(&attributes);
        let anonymous = subject.is_empty();

        let mut sessions = self.sessions.write();

        let session = Session::new(
            token.clone(),
            subject,
            attributes,
            self.clock.now(),
            self.ttl(),
        );

        debug!(
            token = redact(&token),
            anonymous,
            expires_at = %session.expires_at,
            "session issued"
        );

        sessions.insert(token.clone(), session);
        Ok(token)
    }

    /// Return a copy of the live session behind `token`.
    ///
    /// Expired records are rejected but left in place for the reaper.
    #[instrument(skip_all, fields(token = redact(token)))]
    pub fn validate(&self, token: &str) -> SessionResult<Session> {
        let sessions = self.sessions.read();

        let session = sessions.get(token).ok_or(SessionError::NotFound)?;

        if session.is_expired(self.clock.now()) {
            debug!("rejected expired session");
            return Err(SessionError::Expired);
        }

        Ok(session.clone())
    }

    /// Replace the session behind `token` with a fresh one and return the new
    /// token. The swap happens under one write lock, so no reader ever sees
    /// both tokens live or neither.
    ///
    /// An expired record is removed before `Expired` is returned.
    #[instrument(skip_all, fields(token = redact(token)))]
    pub fn refresh(&self, token: &str) -> SessionResult<String> {
        let mut sessions = self.sessions.write();
        let now = self.clock.now();

        let current = sessions.get(token).ok_or(SessionError::NotFound)?;

        if current.is_expired(now) {
            sessions.remove(token);
            debug!("removed expired session on refresh");
            return Err(SessionError::Expired);
        }

        let new_token = generate_token(self.entropy.as_ref())?;

        let replacement = Session::new(
            new_token.clone(),
            current.subject.clone(),
            current.attributes.clone(),
            now,
            self.ttl(),
        );

        sessions.insert(new_token.clone(), replacement);
        sessions.remove(token);

        debug!(new_token = redact(&new_token), "session refreshed");
        Ok(new_token)
    }

    /// Delete the record behind `token`, live or not.
    #[instrument(skip_all, fields(token = redact(token)))]
    pub fn revoke(&self, token: &str) -> SessionResult<()> {
        if self.sessions.write().remove(token).is_none() {
            return Err(SessionError::NotFound);
        }

        debug!("session revoked");
        Ok(())
    }

    /// Number of stored records, expired-but-unreaped ones included.
    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Remove every expired record in one pass and return how many went.
    pub fn reap_expired(&self) -> usize {
        let now = self.clock.now();
        let mut sessions = self.sessions.write();

        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now));
        let removed = before - sessions.len();

        debug!(removed, remaining = sessions.len(), "expired sessions swept");
        removed
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(&StoreConfig::default())
    }
}
