//! Operator Authentication
//!
//! The login gate for the dashboard: operators are listed in
//! configuration (email, role, SHA-256 password digest), a login must
//! name the role the email is actually assigned to, and success issues
//! an expiring session token plus the role's dashboard path.

mod directory;
mod session;

pub use directory::{digest, OperatorDirectory, OperatorEntry, Role};
pub use session::{Session, SessionStore};

use thiserror::Error;

/// Login and session errors. Variants mirror the order checks run in:
/// email lookup, then role match, then password.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("email not recognized")]
    UnknownEmail,
    #[error("this email is not assigned to the \"{requested}\" role")]
    RoleMismatch { requested: Role },
    #[error("incorrect password")]
    BadPassword,
    #[error("session expired or unknown")]
    InvalidSession,
}
