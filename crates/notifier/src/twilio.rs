//! Twilio REST client.

use crate::NotifierError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// Twilio account settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TwilioConfig {
    /// Account SID
    pub account_sid: String,
    /// Auth token
    pub auth_token: String,
    /// Number calls and texts are sent from
    pub from_number: String,
    /// TwiML document played when a call connects
    pub voice_url: String,
    /// API base URL
    pub base_url: String,
    /// Per-request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            auth_token: String::new(),
            from_number: String::new(),
            voice_url: "http://demo.twilio.com/docs/voice.xml".to_string(),
            base_url: "https://api.twilio.com".to_string(),
            timeout_secs: 10,
        }
    }
}

impl TwilioConfig {
    /// Whether enough is set to actually deliver anything.
    pub fn is_configured(&self) -> bool {
        !self.account_sid.is_empty() && !self.auth_token.is_empty() && !self.from_number.is_empty()
    }
}

/// One dispatch request: a destination, a message, and which channels to use
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchRequest {
    pub phone: String,
    pub message: String,
    #[serde(default)]
    pub sms: bool,
    #[serde(default)]
    pub call: bool,
}

/// Result of a dispatch, carrying the provider SIDs of whatever was sent
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchOutcome {
    pub success: bool,
    pub sms_sid: Option<String>,
    pub call_sid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedResource {
    sid: String,
}

/// Check a destination number is E.164-shaped. Spaces and dashes are
/// tolerated and stripped before checking.
pub fn validate_phone(phone: &str) -> Result<(), NotifierError> {
    let compact: String = phone.chars().filter(|c| *c != ' ' && *c != '-').collect();
    let valid = compact.starts_with('+')
        && compact.len() >= 9
        && compact.len() <= 16
        && compact[1..].chars().all(|c| c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(NotifierError::InvalidPhone(phone.to_string()))
    }
}

/// HTTP client for the messaging provider
pub struct TwilioClient {
    http: reqwest::Client,
    config: TwilioConfig,
}

impl TwilioClient {
    pub fn new(config: TwilioConfig) -> Result<Self, NotifierError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.base_url.trim_end_matches('/'),
            self.config.account_sid,
        )
    }

    fn calls_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Calls.json",
            self.config.base_url.trim_end_matches('/'),
            self.config.account_sid,
        )
    }

    async fn create(&self, url: &str, form: &[(&str, &str)]) -> Result<String, NotifierError> {
        let response = self
            .http
            .post(url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifierError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let created: CreatedResource = response.json().await?;
        debug!(sid = %created.sid, "provider accepted request");
        Ok(created.sid)
    }

    /// Send a text message, returning its SID.
    pub async fn send_sms(&self, to: &str, body: &str) -> Result<String, NotifierError> {
        validate_phone(to)?;
        let url = self.messages_url();
        let sid = self
            .create(
                &url,
                &[("To", to), ("From", &self.config.from_number), ("Body", body)],
            )
            .await?;
        info!(to, sid = %sid, "sms sent");
        Ok(sid)
    }

    /// Place a voice call, returning its SID.
    pub async fn place_call(&self, to: &str) -> Result<String, NotifierError> {
        validate_phone(to)?;
        let url = self.calls_url();
        let sid = self
            .create(
                &url,
                &[
                    ("To", to),
                    ("From", &self.config.from_number),
                    ("Url", &self.config.voice_url),
                ],
            )
            .await?;
        info!(to, sid = %sid, "call placed");
        Ok(sid)
    }

    /// Run one dispatch: whichever channels were requested, in order.
    /// A request with neither flag set succeeds without contacting the
    /// provider.
    pub async fn dispatch(&self, request: &DispatchRequest) -> Result<DispatchOutcome, NotifierError> {
        let mut outcome = DispatchOutcome {
            success: true,
            sms_sid: None,
            call_sid: None,
        };
        if request.sms {
            outcome.sms_sid = Some(self.send_sms(&request.phone, &request.message).await?);
        }
        if request.call {
            outcome.call_sid = Some(self.place_call(&request.phone).await?);
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> TwilioClient {
        let config = TwilioConfig {
            account_sid: "AC123".to_string(),
            auth_token: "secret".to_string(),
            from_number: "+15005550006".to_string(),
            ..Default::default()
        };
        TwilioClient::new(config).unwrap()
    }

    #[test]
    fn test_default_config_is_not_configured() {
        assert!(!TwilioConfig::default().is_configured());
    }

    #[test]
    fn test_resource_urls() {
        let client = client();
        assert_eq!(
            client.messages_url(),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages.json"
        );
        assert_eq!(
            client.calls_url(),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Calls.json"
        );
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+15005550006").is_ok());
        assert!(validate_phone("+91 70586 27122").is_ok());
        assert!(validate_phone("15005550006").is_err());
        assert!(validate_phone("+1500call").is_err());
        assert!(validate_phone("+1").is_err());
    }

    #[tokio::test]
    async fn test_dispatch_with_no_channels_is_a_noop() {
        let request = DispatchRequest {
            phone: "+15005550006".to_string(),
            message: "test".to_string(),
            sms: false,
            call: false,
        };
        let outcome = client().dispatch(&request).await.unwrap();
        assert!(outcome.success);
        assert!(outcome.sms_sid.is_none());
        assert!(outcome.call_sid.is_none());
    }
}
