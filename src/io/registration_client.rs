//! Client for the proxy's own registration-email endpoint
//!
//! Used after a successful booking and by the CLI's test-send command.
//! Never returns an error: every failure is folded into [`SendOutcome`].

use crate::domain::types::{RegistrationEmail, RegistrationEmailRequest};
use crate::io::http_api::SEND_REGISTRATION_EMAIL_PATH;
use crate::services::email_dispatch::DispatchResponse;
use serde_json::Value;
use tracing::{info, warn};

fn non_empty(body: &Value, key: &str) -> Option<String> {
    body.get(key).and_then(Value::as_str).filter(|s| !s.is_empty()).map(str::to_string)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SendOutcome {
    pub success: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

impl SendOutcome {
    fn failed(error: impl Into<String>) -> Self {
        Self { success: false, message_id: None, error: Some(error.into()) }
    }
}

#[derive(Debug, Clone)]
pub struct RegistrationEmailClient {
    client: reqwest::Client,
    proxy_url: String,
}

impl RegistrationEmailClient {
    pub fn new(proxy_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            proxy_url: proxy_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.proxy_url, SEND_REGISTRATION_EMAIL_PATH)
    }

    pub async fn send_registration_email(&self, email: &RegistrationEmail) -> SendOutcome {
        let request = RegistrationEmailRequest::from(email);
        let response = match self.client.post(self.endpoint()).json(&request).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, to = %email.customer_email, "registration_email_unreachable");
                return SendOutcome::failed(e.to_string());
            }
        };

        let status = response.status();
        let body = response.json::<Value>().await.ok();

        if !status.is_success() {
            let error = body
                .as_ref()
                .and_then(|b| non_empty(b, "error").or_else(|| non_empty(b, "message")))
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            warn!(status = %status.as_u16(), error = %error, "registration_email_failed");
            return SendOutcome::failed(error);
        }

        match body.and_then(|b| serde_json::from_value::<DispatchResponse>(b).ok()) {
            Some(body) if body.success => {
                info!(
                    to = %email.customer_email,
                    message_id = ?body.message_id,
                    "registration_email_delivered"
                );
                SendOutcome { success: true, message_id: body.message_id, error: None }
            }
            Some(body) => {
                SendOutcome::failed(body.error.unwrap_or_else(|| "Failed to send email".to_string()))
            }
            None => SendOutcome::failed("Invalid response from email proxy"),
        }
    }

    /// Send a fixed sample registration to `to`
    pub async fn send_test_email(&self, to: &str) -> SendOutcome {
        self.send_registration_email(&sample_registration(to)).await
    }
}

pub fn sample_registration(to: &str) -> RegistrationEmail {
    RegistrationEmail {
        event_name: "Test Event - Hampta Pass Trek".to_string(),
        customer_name: "Test User".to_string(),
        customer_email: to.to_string(),
        event_date: "Monday, December 16, 2024".to_string(),
        event_address: "Manali, Himachal Pradesh, India".to_string(),
    }
}
