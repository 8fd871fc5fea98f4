//! Installation, anonymous, stream and session identity.
//!
//! Responsibilities:
//! - Load or generate persisted ids through a [`KeyValueStorage`].
//! - Rotate the session id after a period of inactivity.
//!
//! Does NOT handle:
//! - Storage lifecycle (callers load the storage before or after construction).
//!
//! Invariants:
//! - One context per SDK instance; there is no process-wide identity state.
//! - The stream id equals the anonymous id unless explicitly overridden.
//! - An uninitialized storage never blocks: fresh in-memory ids are used.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::storage::KeyValueStorage;

pub const INSTALLATION_ID_KEY: &str = "inspector.installationId";
pub const ANONYMOUS_ID_KEY: &str = "inspector.anonymousId";
pub const SESSION_ID_KEY: &str = "inspector.sessionId";
pub const SESSION_LAST_ACTIVITY_KEY: &str = "inspector.sessionLastActivity";

#[derive(Debug)]
struct IdentityState {
    installation_id: String,
    anonymous_id: String,
    stream_override: Option<String>,
    session_id: Option<String>,
    last_activity: Option<DateTime<Utc>>,
}

/// Identity values attached to every schema record.
pub struct IdentityContext {
    storage: Arc<dyn KeyValueStorage>,
    session_timeout: Duration,
    state: Mutex<IdentityState>,
}

impl std::fmt::Debug for IdentityContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityContext")
            .field("session_timeout", &self.session_timeout)
            .field("state", &*self.lock())
            .finish()
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl IdentityContext {
    pub fn new(storage: Arc<dyn KeyValueStorage>, session_timeout: Duration) -> Self {
        let installation_id = load_or_create(storage.as_ref(), INSTALLATION_ID_KEY);
        let anonymous_id = load_or_create(storage.as_ref(), ANONYMOUS_ID_KEY);
        let (session_id, last_activity) = if storage.is_initialized() {
            (
                storage.get(SESSION_ID_KEY),
                storage
                    .get(SESSION_LAST_ACTIVITY_KEY)
                    .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
                    .map(|ts| ts.with_timezone(&Utc)),
            )
        } else {
            debug!("Storage not initialized, using in-memory identity");
            (None, None)
        };

        Self {
            storage,
            session_timeout,
            state: Mutex::new(IdentityState {
                installation_id,
                anonymous_id,
                stream_override: None,
                session_id,
                last_activity,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, IdentityState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn persist(&self, key: &str, value: String) {
        if !self.storage.is_initialized() {
            return;
        }
        if let Err(e) = self.storage.set(key, value) {
            warn!(key, error = %e, "Failed to persist identity value");
        }
    }

    pub fn installation_id(&self) -> String {
        self.lock().installation_id.clone()
    }

    pub fn anonymous_id(&self) -> String {
        self.lock().anonymous_id.clone()
    }

    /// Replace the anonymous id, e.g. after the host app identifies a user.
    pub fn set_anonymous_id(&self, id: impl Into<String>) {
        let id = id.into();
        self.lock().anonymous_id = id.clone();
        self.persist(ANONYMOUS_ID_KEY, id);
    }

    /// Stream id: the override when set, else the anonymous id.
    pub fn stream_id(&self) -> String {
        let state = self.lock();
        state
            .stream_override
            .clone()
            .unwrap_or_else(|| state.anonymous_id.clone())
    }

    pub fn set_stream_id(&self, stream_id: Option<String>) {
        self.lock().stream_override = stream_id;
    }

    /// Current session id, recording activity now.
    pub fn session_id(&self) -> String {
        self.session_id_at(Utc::now())
    }

    /// Current session id as of `now`. Starts a new session when the last
    /// activity is at least `session_timeout` old.
    pub fn session_id_at(&self, now: DateTime<Utc>) -> String {
        let timeout = chrono::Duration::from_std(self.session_timeout)
            .unwrap_or(chrono::Duration::MAX);

        let (session_id, rotated) = {
            let mut state = self.lock();
            let expired = match state.last_activity {
                Some(last) => now.signed_duration_since(last) >= timeout,
                None => true,
            };
            let rotated = expired || state.session_id.is_none();
            if rotated {
                state.session_id = Some(new_id());
            }
            state.last_activity = Some(now);
            (state.session_id.clone().unwrap_or_default(), rotated)
        };

        if rotated {
            debug!("Started new session");
            self.persist(SESSION_ID_KEY, session_id.clone());
        }
        self.persist(SESSION_LAST_ACTIVITY_KEY, now.to_rfc3339());
        session_id
    }
}

fn load_or_create(storage: &dyn KeyValueStorage, key: &str) -> String {
    if !storage.is_initialized() {
        return new_id();
    }
    if let Some(existing) = storage.get(key).filter(|v| !v.is_empty()) {
        return existing;
    }
    let id = new_id();
    if let Err(e) = storage.set(key, id.clone()) {
        warn!(key, error = %e, "Failed to persist identity value");
    }
    id
}
