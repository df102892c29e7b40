//! Permitted-operator directory.

use crate::AuthError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use tracing::info;

/// Dashboard role an operator is assigned to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Supervisor,
    ProductionManager,
    Operator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Supervisor => "supervisor",
            Self::ProductionManager => "production-manager",
            Self::Operator => "operator",
        }
    }

    /// Where a successful login redirects to.
    pub fn dashboard_path(&self) -> String {
        format!("/{}", self.as_str())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configured operator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorEntry {
    pub email: String,
    pub role: Role,
    /// SHA-256 hex digest of the password
    pub password_sha256: String,
}

/// SHA-256 hex digest of a password.
pub fn digest(password: &str) -> String {
    let hash = Sha256::digest(password.as_bytes());
    let mut out = String::with_capacity(hash.len() * 2);
    for byte in hash {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

/// Lookup table over the configured operators, keyed by lowercased email
pub struct OperatorDirectory {
    operators: HashMap<String, OperatorEntry>,
}

impl OperatorDirectory {
    pub fn from_entries(entries: Vec<OperatorEntry>) -> Self {
        info!(operators = entries.len(), "loading operator directory");
        let operators = entries
            .into_iter()
            .map(|entry| (entry.email.to_lowercase(), entry))
            .collect();
        Self { operators }
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    /// Check a login attempt. The checks run in a fixed order so the
    /// caller can report the first failure: unknown email, then role
    /// mismatch, then wrong password.
    pub fn login(
        &self,
        email: &str,
        password: &str,
        requested_role: Role,
    ) -> Result<&OperatorEntry, AuthError> {
        let entry = self
            .operators
            .get(&email.to_lowercase())
            .ok_or(AuthError::UnknownEmail)?;
        if entry.role != requested_role {
            return Err(AuthError::RoleMismatch {
                requested: requested_role,
            });
        }
        if digest(password) != entry.password_sha256 {
            return Err(AuthError::BadPassword);
        }
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> OperatorDirectory {
        OperatorDirectory::from_entries(vec![
            OperatorEntry {
                email: "sam@example.com".to_string(),
                role: Role::Supervisor,
                password_sha256: digest("hunter2"),
            },
            OperatorEntry {
                email: "pat@example.com".to_string(),
                role: Role::Operator,
                password_sha256: digest("secret"),
            },
        ])
    }

    #[test]
    fn test_login_success() {
        let dir = directory();
        let entry = dir.login("sam@example.com", "hunter2", Role::Supervisor).unwrap();
        assert_eq!(entry.role, Role::Supervisor);
    }

    #[test]
    fn test_login_is_case_insensitive_on_email() {
        let dir = directory();
        assert!(dir.login("Sam@Example.com", "hunter2", Role::Supervisor).is_ok());
    }

    #[test]
    fn test_unknown_email_reported_first() {
        let dir = directory();
        // Wrong everything, but the email failure wins.
        let err = dir.login("ghost@example.com", "nope", Role::Operator).unwrap_err();
        assert_eq!(err, AuthError::UnknownEmail);
    }

    #[test]
    fn test_role_mismatch_beats_bad_password() {
        let dir = directory();
        let err = dir.login("pat@example.com", "nope", Role::Supervisor).unwrap_err();
        assert_eq!(
            err,
            AuthError::RoleMismatch {
                requested: Role::Supervisor
            }
        );
    }

    #[test]
    fn test_bad_password() {
        let dir = directory();
        let err = dir.login("pat@example.com", "nope", Role::Operator).unwrap_err();
        assert_eq!(err, AuthError::BadPassword);
    }

    #[test]
    fn test_digest_is_stable_hex() {
        let d = digest("12345");
        assert_eq!(d.len(), 64);
        assert_eq!(d, digest("12345"));
        assert_ne!(d, digest("12346"));
    }

    #[test]
    fn test_dashboard_paths() {
        assert_eq!(Role::Supervisor.dashboard_path(), "/supervisor");
        assert_eq!(Role::ProductionManager.dashboard_path(), "/production-manager");
        assert_eq!(Role::Operator.dashboard_path(), "/operator");
    }
}
