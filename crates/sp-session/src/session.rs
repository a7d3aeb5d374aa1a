//! Authenticated SP sessions.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::{SessionError, SessionResult};

/// Default session lifetime (30 minutes from creation).
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// An authenticated session, created after a response passed validation.
///
/// Sessions are immutable once stored; logout or expiry removes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Opaque session identifier handed to the caller.
    pub session_id: String,
    /// Subject NameID asserted by the IdP.
    pub name_id: String,
    /// IdP-assigned session index, used to target single logout.
    pub session_index: Option<String>,
    /// Flattened identity attributes.
    pub attributes: HashMap<String, String>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Returns true if the session is older than `ttl` at `now`.
    #[must_use]
    pub fn is_expired_at(&self, ttl: TimeDelta, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.created_at) > ttl
    }
}

/// Concurrent TTL store of [`Session`]s.
///
/// Expired sessions are evicted lazily when looked up and in bulk by
/// [`SessionStore::sweep`]. The `*_at` variants take the current time
/// explicitly.
#[derive(Debug)]
pub struct SessionStore {
    sessions: DashMap<String, Arc<Session>>,
    ttl: TimeDelta,
}

impl SessionStore {
    /// Creates an empty store whose sessions live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
        }
    }

    /// Session lifetime.
    #[must_use]
    pub const fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    /// Creates a session and returns its new ID.
    pub fn create(
        &self,
        name_id: impl Into<String>,
        session_index: Option<String>,
        attributes: HashMap<String, String>,
    ) -> String {
        self.create_at(name_id, session_index, attributes, Utc::now())
    }

    /// Creates a session stamped with `now`.
    pub fn create_at(
        &self,
        name_id: impl Into<String>,
        session_index: Option<String>,
        attributes: HashMap<String, String>,
        now: DateTime<Utc>,
    ) -> String {
        let session_id = sp_crypto::generate_session_id();
        let session = Session {
            session_id: session_id.clone(),
            name_id: name_id.into(),
            session_index,
            attributes,
            created_at: now,
        };
        self.sessions.insert(session_id.clone(), Arc::new(session));
        tracing::debug!(sessions = self.sessions.len(), "session created");
        session_id
    }

    /// Returns true if the session exists and has not expired.
    ///
    /// An expired session is removed as a side effect.
    pub fn validate(&self, session_id: &str) -> bool {
        self.validate_at(session_id, Utc::now())
    }

    /// [`SessionStore::validate`] evaluated at `now`.
    pub fn validate_at(&self, session_id: &str, now: DateTime<Utc>) -> bool {
        self.require_at(session_id, now).is_ok()
    }

    /// Returns the live session with this ID, if any.
    pub fn get(&self, session_id: &str) -> Option<Arc<Session>> {
        self.get_at(session_id, Utc::now())
    }

    /// [`SessionStore::get`] evaluated at `now`.
    pub fn get_at(&self, session_id: &str, now: DateTime<Utc>) -> Option<Arc<Session>> {
        self.require_at(session_id, now).ok()
    }

    /// Like [`SessionStore::get`] but says why a session is unavailable.
    pub fn require(&self, session_id: &str) -> SessionResult<Arc<Session>> {
        self.require_at(session_id, Utc::now())
    }

    /// [`SessionStore::require`] evaluated at `now`.
    pub fn require_at(&self, session_id: &str, now: DateTime<Utc>) -> SessionResult<Arc<Session>> {
        let session = self
            .sessions
            .get(session_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(SessionError::NotFound)?;

        if session.is_expired_at(self.ttl, now) {
            // Re-checked under the shard lock.
            self.sessions
                .remove_if(session_id, |_, s| s.is_expired_at(self.ttl, now));
            tracing::debug!("expired session evicted on lookup");
            return Err(SessionError::Expired);
        }

        Ok(session)
    }

    /// Removes the session. Idempotent; returns whether anything was removed.
    pub fn invalidate(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    /// Removes every session of `name_id`.
    ///
    /// When `session_indexes` is non-empty only sessions carrying one of those
    /// indexes are removed. Returns the number removed.
    pub fn invalidate_by_name_id(&self, name_id: &str, session_indexes: &[String]) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| {
            let matches = s.name_id == name_id
                && (session_indexes.is_empty()
                    || s.session_index
                        .as_ref()
                        .is_some_and(|idx| session_indexes.contains(idx)));
            !matches
        });
        before.saturating_sub(self.sessions.len())
    }

    /// Removes all expired sessions, returning how many were removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Utc::now())
    }

    /// [`SessionStore::sweep`] evaluated at `now`.
    pub fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| !s.is_expired_at(self.ttl, now));
        before.saturating_sub(self.sessions.len())
    }

    /// Number of stored sessions, expired ones included until evicted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns true if no sessions are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}
