use crate::table::ScriptTable;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Name of the cookie carrying the session id
pub const SESSION_COOKIE: &str = "script_session";

/// Severity of a one-shot page notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Info,
    Warning,
    Error,
}

/// Notice shown once on the next page render
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: FlashLevel::Info, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: FlashLevel::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: FlashLevel::Error, message: message.into() }
    }
}

/// Form input that was rejected, kept so the form can be refilled
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RowDraft {
    pub page_number: String,
    pub targets: Vec<String>,
    pub effect_description: String,
    pub script: String,
}

/// Per-browser working state
#[derive(Debug, Clone)]
pub struct Session {
    /// Rows entered in this session
    pub table: ScriptTable,

    /// Course name used for export file names
    pub course_name: String,

    /// Whether the table stretches to the container width
    pub wide_layout: bool,

    /// Pending notice for the next render
    pub flash: Option<Flash>,

    /// Rejected entry to put back into the form on the next render
    pub draft: Option<RowDraft>,

    last_seen: Instant,
}

impl Session {
    fn new(course_name: String, now: Instant) -> Self {
        Self {
            table: ScriptTable::new(),
            course_name,
            wide_layout: true,
            flash: None,
            draft: None,
            last_seen: now,
        }
    }

    // A TTL too large to add to an Instant never expires.
    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        self.last_seen
            .checked_add(ttl)
            .is_some_and(|deadline| deadline <= now)
    }

    /// Take the pending notice, leaving none behind
    pub fn take_flash(&mut self) -> Option<Flash> {
        self.flash.take()
    }
}

/// In-memory map of session id to [`Session`]
///
/// Sessions idle for longer than the TTL are dropped the next time the
/// store is touched, and a lookup with an unknown or expired id hands out
/// a fresh session.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
    default_course: String,
}

impl SessionStore {
    pub fn new(ttl: Duration, default_course: impl Into<String>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
            default_course: default_course.into(),
        }
    }

    pub fn default_course(&self) -> &str {
        &self.default_course
    }

    /// Return a live session id, creating a session when needed
    ///
    /// # Arguments
    /// * `session_id` - Id presented by the client, if any
    ///
    /// # Returns
    /// * `(String, bool)` - The id to use and whether it was newly created
    pub fn resolve(&self, session_id: Option<&str>) -> (String, bool) {
        let now = Instant::now();
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);

        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(self.ttl, now));
        let purged = before - sessions.len();
        if purged > 0 {
            log::debug!("Purged {} expired session(s)", purged);
        }

        if let Some(id) = session_id {
            if let Some(session) = sessions.get_mut(id) {
                session.last_seen = now;
                return (id.to_string(), false);
            }
        }

        let id = Uuid::new_v4().to_string();
        sessions.insert(id.clone(), Session::new(self.default_course.clone(), now));
        log::info!("Created session {}", id);
        (id, true)
    }

    /// Run `f` against the session with the given id
    ///
    /// A missing session is recreated empty so callers never have to deal
    /// with a vanished id between [`SessionStore::resolve`] and this call.
    pub fn with_session<R>(&self, session_id: &str, f: impl FnOnce(&mut Session) -> R) -> R {
        let now = Instant::now();
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let session = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Session::new(self.default_course.clone(), now));
        session.last_seen = now;
        f(session)
    }

    /// Number of live sessions, expired ones included until the next purge
    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
