use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use pitchmap::geometry::session::CalibrationSession;

use crate::error::ApiError;

/// Session used when a request does not name one.
pub const DEFAULT_SESSION: &str = "default";

/// Calibration sessions keyed by client-chosen id.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<CalibrationSession>>>,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions,
        }
    }

    /// Look up an existing session.
    pub fn get(&self, id: &str) -> Option<Arc<CalibrationSession>> {
        self.sessions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(id)
            .cloned()
    }

    /// Look up a session, creating it if it does not exist yet.
    pub fn get_or_create(&self, id: &str) -> Result<Arc<CalibrationSession>, ApiError> {
        if let Some(session) = self.get(id) {
            return Ok(session);
        }

        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(session) = sessions.get(id) {
            return Ok(session.clone());
        }
        if sessions.len() >= self.max_sessions {
            return Err(ApiError::BadRequest(format!(
                "Session limit of {} reached",
                self.max_sessions
            )));
        }

        log::debug!("creating session '{id}'");
        let session = Arc::new(CalibrationSession::new());
        sessions.insert(id.to_string(), session.clone());
        Ok(session)
    }
}

/// State shared by all handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: Arc::new(SessionStore::new(max_sessions)),
        }
    }
}
