//! ZeptoMail template-send client
//!
//! Wire format for `POST /v1.1/email/template`:
//! `{from, to:[{email_address}], template_key, merge_info}`.
//! The Authorization header carries the full key string from config.

use crate::io::vendor::{VendorError, VendorReply};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailAddress {
    pub address: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recipient {
    pub email_address: EmailAddress,
}

/// Template variables. The event-name key contains a literal space because
/// that is what the vendor template substitutes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeInfo {
    pub name: String,
    #[serde(rename = "event name")]
    pub event_name: String,
    pub date: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateEmail {
    pub from: EmailAddress,
    pub to: Vec<Recipient>,
    pub template_key: String,
    pub merge_info: MergeInfo,
}

/// Accepted send
#[derive(Debug, Clone)]
pub struct SendReceipt {
    /// `data[0].additional_info[0].message_id`, verbatim
    pub message_id: Option<String>,
    /// Full vendor response body
    pub raw: Value,
    pub latency_ms: u64,
}

impl SendReceipt {
    pub fn from_body(raw: Value, latency_ms: u64) -> Self {
        let message_id = raw
            .pointer("/data/0/additional_info/0/message_id")
            .and_then(Value::as_str)
            .map(str::to_string);
        Self { message_id, raw, latency_ms }
    }
}

/// Something that can deliver a template email
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_template(&self, email: &TemplateEmail) -> Result<SendReceipt, VendorError>;
}

pub struct ZeptoMailClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl ZeptoMailClient {
    pub fn new(api_url: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl Mailer for ZeptoMailClient {
    async fn send_template(&self, email: &TemplateEmail) -> Result<SendReceipt, VendorError> {
        let start = Instant::now();
        debug!(
            recipients = email.to.len(),
            template_key = %email.template_key,
            "zeptomail_request"
        );

        let response = self
            .client
            .post(&self.api_url)
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, &self.api_key)
            .json(email)
            .send()
            .await?;

        let reply = VendorReply::read(response).await?;
        let latency_ms = start.elapsed().as_millis() as u64;

        match reply.error_for_status("Failed to send email") {
            Ok(reply) => {
                let receipt = SendReceipt::from_body(reply.body.unwrap_or(Value::Null), latency_ms);
                debug!(
                    message_id = ?receipt.message_id,
                    latency_ms = %latency_ms,
                    "zeptomail_accepted"
                );
                Ok(receipt)
            }
            Err(e) => {
                warn!(
                    status = ?e.status(),
                    error = %e,
                    latency_ms = %latency_ms,
                    "zeptomail_rejected"
                );
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> TemplateEmail {
        TemplateEmail {
            from: EmailAddress {
                address: "noreply@trippechalo.in".to_string(),
                name: "TrippeChalo".to_string(),
            },
            to: vec![Recipient {
                email_address: EmailAddress {
                    address: "asha@example.com".to_string(),
                    name: "Asha".to_string(),
                },
            }],
            template_key: "tmpl-1".to_string(),
            merge_info: MergeInfo {
                name: "Asha".to_string(),
                event_name: "Hampta Pass Trek".to_string(),
                date: "Monday, December 16, 2024".to_string(),
                address: "Manali".to_string(),
            },
        }
    }

    #[test]
    fn test_wire_format() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            value,
            json!({
                "from": {"address": "noreply@trippechalo.in", "name": "TrippeChalo"},
                "to": [{"email_address": {"address": "asha@example.com", "name": "Asha"}}],
                "template_key": "tmpl-1",
                "merge_info": {
                    "name": "Asha",
                    "event name": "Hampta Pass Trek",
                    "date": "Monday, December 16, 2024",
                    "address": "Manali"
                }
            })
        );
    }

    #[test]
    fn test_receipt_extracts_nested_message_id() {
        let body = json!({
            "data": [{"code": "EM_104", "additional_info": [{"message_id": "2d6f.abc"}]}],
            "message": "OK"
        });
        let receipt = SendReceipt::from_body(body, 12);
        assert_eq!(receipt.message_id.as_deref(), Some("2d6f.abc"));
    }

    #[test]
    fn test_receipt_without_message_id() {
        let receipt = SendReceipt::from_body(json!({"data": []}), 0);
        assert!(receipt.message_id.is_none());
        let receipt = SendReceipt::from_body(Value::Null, 0);
        assert!(receipt.message_id.is_none());
    }
}
