//! Session Management
//!
//! Sessions are created lazily on first reference to an id. Idle sessions
//! expire after a timeout (swept by a background task); when the store is
//! full the least recently active session makes room for a new one.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

use honeypot_agent::ConversationState;
use honeypot_config::SessionConfig;

use crate::metrics::record_active_sessions;

/// Session state
pub struct Session {
    /// Session ID
    pub id: String,
    /// Conversation aggregate, mutated once per turn
    pub state: Mutex<ConversationState>,
    /// Last activity
    pub last_activity: RwLock<Instant>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: Mutex::new(ConversationState::new()),
            last_activity: RwLock::new(Instant::now()),
        }
    }

    /// Update last activity
    pub fn touch(&self) {
        *self.last_activity.write() = Instant::now();
    }

    /// Check if session is expired
    pub fn is_expired(&self, timeout: Duration) -> bool {
        self.last_activity.read().elapsed() > timeout
    }

    fn last_active_at(&self) -> Instant {
        *self.last_activity.read()
    }
}

/// Session manager
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    max_sessions: usize,
    session_timeout: Duration,
    cleanup_interval: Duration,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(max_sessions: usize) -> Self {
        Self::with_config(
            max_sessions,
            Duration::from_secs(3600),
            Duration::from_secs(300),
        )
    }

    /// Create a new session manager with custom timeout and cleanup interval
    pub fn with_config(
        max_sessions: usize,
        session_timeout: Duration,
        cleanup_interval: Duration,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions: max_sessions.max(1),
            session_timeout,
            cleanup_interval,
        }
    }

    pub fn from_settings(config: &SessionConfig) -> Self {
        Self::with_config(
            config.max_sessions,
            Duration::from_secs(config.idle_timeout_secs),
            Duration::from_secs(config.cleanup_interval_secs),
        )
    }

    /// Start a background task that periodically removes expired sessions.
    ///
    /// Returns a shutdown sender that stops the task.
    pub fn start_cleanup_task(self: &Arc<Self>) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let manager = Arc::clone(self);
        let interval = manager.cleanup_interval;

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(interval);
            interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        let removed = manager.cleanup_expired();
                        if removed > 0 {
                            tracing::info!(
                                removed,
                                remaining = manager.count(),
                                "Session cleanup removed expired sessions"
                            );
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("Session cleanup task shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }

    /// Fetch the session for `id`, creating it on first reference.
    ///
    /// Racing first requests for the same id observe one session.
    pub fn get_or_create(&self, id: &str) -> Arc<Session> {
        if let Some(session) = self.sessions.read().get(id) {
            session.touch();
            return session.clone();
        }

        let mut sessions = self.sessions.write();
        if let Some(session) = sessions.get(id) {
            session.touch();
            return session.clone();
        }

        if sessions.len() >= self.max_sessions {
            self.cleanup_expired_internal(&mut sessions);
        }
        while sessions.len() >= self.max_sessions {
            if !Self::evict_least_recent(&mut sessions) {
                break;
            }
        }

        let session = sessions
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Session::new(id)))
            .clone();
        record_active_sessions(sessions.len());

        tracing::info!(session_id = %id, "Created session");
        session
    }

    /// Get a session by ID
    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.read().get(id).cloned()
    }

    /// Get session count
    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }

    /// List all session IDs
    pub fn list(&self) -> Vec<String> {
        self.sessions.read().keys().cloned().collect()
    }

    /// Remove expired sessions, returning how many were dropped
    pub fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.write();
        let removed = self.cleanup_expired_internal(&mut sessions);
        record_active_sessions(sessions.len());
        removed
    }

    fn cleanup_expired_internal(&self, sessions: &mut HashMap<String, Arc<Session>>) -> usize {
        let timeout = self.session_timeout;
        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, s)| s.is_expired(timeout))
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            if sessions.remove(id).is_some() {
                tracing::info!(session_id = %id, "Expired session");
            }
        }
        expired.len()
    }

    fn evict_least_recent(sessions: &mut HashMap<String, Arc<Session>>) -> bool {
        let oldest = sessions
            .iter()
            .min_by_key(|(_, s)| s.last_active_at())
            .map(|(id, _)| id.clone());

        match oldest.and_then(|id| sessions.remove(&id)) {
            Some(session) => {
                // In-flight turns keep their Arc and finish on the detached state
                tracing::info!(session_id = %session.id, "Evicted least recently active session");
                true
            }
            None => false,
        }
    }
}
