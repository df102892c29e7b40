//! Expiring session tokens.

use crate::directory::Role;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// An issued session
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub email: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// In-memory store of live sessions
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl: Duration::seconds(ttl_secs),
        }
    }

    /// Issue a fresh token for a logged-in operator. Expired sessions
    /// are pruned on the way through.
    pub fn issue(&self, email: &str, role: Role) -> Session {
        let session = Session {
            token: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role,
            expires_at: Utc::now() + self.ttl,
        };
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.retain(|_, s| !s.is_expired());
        sessions.insert(session.token.clone(), session.clone());
        debug!(email, live = sessions.len(), "session issued");
        session
    }

    /// Look up a token, rejecting and removing it when expired.
    pub fn validate(&self, token: &str) -> Option<Session> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        match sessions.get(token) {
            Some(session) if !session.is_expired() => Some(session.clone()),
            Some(_) => {
                sessions.remove(token);
                None
            }
            None => None,
        }
    }

    /// Drop a session, if present.
    pub fn revoke(&self, token: &str) -> bool {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.remove(token).is_some()
    }

    pub fn live_count(&self) -> usize {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.values().filter(|s| !s.is_expired()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_validate() {
        let store = SessionStore::new(3600);
        let session = store.issue("sam@example.com", Role::Supervisor);
        let found = store.validate(&session.token).unwrap();
        assert_eq!(found.email, "sam@example.com");
        assert_eq!(found.role, Role::Supervisor);
    }

    #[test]
    fn test_unknown_token_rejected() {
        let store = SessionStore::new(3600);
        assert!(store.validate("not-a-token").is_none());
    }

    #[test]
    fn test_expired_token_rejected_and_removed() {
        let store = SessionStore::new(0);
        let session = store.issue("sam@example.com", Role::Supervisor);
        assert!(store.validate(&session.token).is_none());
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn test_revoke() {
        let store = SessionStore::new(3600);
        let session = store.issue("pat@example.com", Role::Operator);
        assert!(store.revoke(&session.token));
        assert!(!store.revoke(&session.token));
        assert!(store.validate(&session.token).is_none());
    }
}
