//! Notifier
//!
//! Delivers threshold alerts to operators as SMS messages and voice
//! calls through the Twilio REST API. A single dispatch can request
//! either channel or both; each successful send returns the provider's
//! resource SID.

mod twilio;

pub use twilio::{validate_phone, DispatchOutcome, DispatchRequest, TwilioClient, TwilioConfig};

use thiserror::Error;

/// Notification delivery errors
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("invalid phone number: {0}")]
    InvalidPhone(String),
}
