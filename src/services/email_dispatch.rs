//! Registration email dispatch
//!
//! Validates the inbound request, maps it onto the vendor template
//! variables, and forwards it through a [`Mailer`]. One inbound request
//! is exactly one outbound send; there is no retry and no deduplication.

use crate::domain::types::{RegistrationEmail, RegistrationEmailRequest, MISSING_FIELDS_MESSAGE};
use crate::infra::metrics::DispatchOutcome;
use crate::io::vendor::VendorError;
use crate::io::zeptomail::{EmailAddress, Mailer, MergeInfo, Recipient, SendReceipt, TemplateEmail};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use thiserror::Error;
use tracing::info;

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Invalid JSON body: {0}")]
    InvalidBody(String),
    #[error("{}", MISSING_FIELDS_MESSAGE)]
    MissingFields,
    /// The vendor call failed after `latency_ms`
    #[error("{source}")]
    Vendor { source: VendorError, latency_ms: u64 },
}

impl DispatchError {
    /// HTTP status the proxy answers with
    pub fn status_code(&self) -> u16 {
        match self {
            DispatchError::InvalidBody(_) | DispatchError::MissingFields => 400,
            DispatchError::Vendor { source: VendorError::Http { status, .. }, .. }
                if (400..=599).contains(status) =>
            {
                *status
            }
            DispatchError::Vendor { source: VendorError::Http { .. }, .. } => 400,
            DispatchError::Vendor { .. } => 500,
        }
    }

    /// Text for the `error` field of the response
    pub fn client_message(&self) -> String {
        let message = self.to_string();
        if message.is_empty() {
            INTERNAL_ERROR_MESSAGE.to_string()
        } else {
            message
        }
    }

    pub fn outcome(&self) -> DispatchOutcome {
        match self {
            DispatchError::InvalidBody(_) | DispatchError::MissingFields => DispatchOutcome::Rejected,
            DispatchError::Vendor { source: VendorError::Http { .. }, .. } => {
                DispatchOutcome::VendorError
            }
            DispatchError::Vendor { .. } => DispatchOutcome::TransportError,
        }
    }

    /// How long the failed vendor call took; `None` when no call was made
    pub fn vendor_latency_ms(&self) -> Option<u64> {
        match self {
            DispatchError::Vendor { latency_ms, .. } => Some(*latency_ms),
            _ => None,
        }
    }
}

/// Body of every proxy answer on the email endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DispatchResponse {
    pub fn sent(receipt: SendReceipt) -> Self {
        Self { success: true, message_id: receipt.message_id, data: Some(receipt.raw), error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self { success: false, error: Some(error.into()), ..Default::default() }
    }
}

pub struct EmailDispatcher<M: Mailer> {
    mailer: M,
    sender: EmailAddress,
    template_key: String,
}

impl<M: Mailer> EmailDispatcher<M> {
    pub fn new(mailer: M, from_address: &str, from_name: &str, template_key: &str) -> Self {
        Self {
            mailer,
            sender: EmailAddress { address: from_address.to_string(), name: from_name.to_string() },
            template_key: template_key.to_string(),
        }
    }

    /// Map a validated request onto the vendor template payload
    pub fn build_template(&self, email: &RegistrationEmail) -> TemplateEmail {
        TemplateEmail {
            from: self.sender.clone(),
            to: vec![Recipient {
                email_address: EmailAddress {
                    address: email.customer_email.clone(),
                    name: email.customer_name.clone(),
                },
            }],
            template_key: self.template_key.clone(),
            merge_info: MergeInfo {
                name: email.customer_name.clone(),
                event_name: email.event_name.clone(),
                date: email.event_date.clone(),
                address: email.event_address.clone(),
            },
        }
    }

    /// Decode, validate, map, and send one raw request body
    pub async fn dispatch_body(&self, body: &[u8]) -> Result<SendReceipt, DispatchError> {
        let request: RegistrationEmailRequest =
            serde_json::from_slice(body).map_err(|e| DispatchError::InvalidBody(e.to_string()))?;
        self.dispatch(request).await
    }

    pub async fn dispatch(
        &self,
        request: RegistrationEmailRequest,
    ) -> Result<SendReceipt, DispatchError> {
        let email = request.validate().ok_or(DispatchError::MissingFields)?;
        let template = self.build_template(&email);

        info!(
            to = %email.customer_email,
            event_name = %email.event_name,
            template_key = %self.template_key,
            "registration_email_sending"
        );

        let started = Instant::now();
        let receipt = self.mailer.send_template(&template).await.map_err(|source| {
            DispatchError::Vendor { source, latency_ms: started.elapsed().as_millis() as u64 }
        })?;

        info!(
            to = %email.customer_email,
            message_id = ?receipt.message_id,
            latency_ms = %receipt.latency_ms,
            "registration_email_sent"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records every payload and answers with a fixed result
    struct RecordingMailer {
        sent: Mutex<Vec<TemplateEmail>>,
        reply: fn() -> Result<SendReceipt, VendorError>,
    }

    impl RecordingMailer {
        fn new(reply: fn() -> Result<SendReceipt, VendorError>) -> Self {
            Self { sent: Mutex::new(Vec::new()), reply }
        }
    }

    #[async_trait::async_trait]
    impl Mailer for RecordingMailer {
        async fn send_template(&self, email: &TemplateEmail) -> Result<SendReceipt, VendorError> {
            self.sent.lock().unwrap().push(email.clone());
            (self.reply)()
        }
    }

    fn accepted() -> Result<SendReceipt, VendorError> {
        Ok(SendReceipt::from_body(
            json!({"data": [{"additional_info": [{"message_id": "msg-1"}]}]}),
            5,
        ))
    }

    fn full_request() -> RegistrationEmailRequest {
        RegistrationEmailRequest {
            event_name: Some("Kedarkantha Trek".to_string()),
            customer_name: Some("Ravi".to_string()),
            customer_email: Some("ravi@example.com".to_string()),
            event_date: Some("2025-01-10".to_string()),
            event_address: Some("Sankri, Uttarakhand".to_string()),
        }
    }

    fn dispatcher(reply: fn() -> Result<SendReceipt, VendorError>) -> EmailDispatcher<RecordingMailer> {
        EmailDispatcher::new(RecordingMailer::new(reply), "noreply@trippechalo.in", "TrippeChalo", "tmpl-1")
    }

    #[tokio::test]
    async fn test_each_missing_field_is_rejected_without_send() {
        let blankers: [fn(&mut RegistrationEmailRequest); 5] = [
            |r| r.event_name = None,
            |r| r.customer_name = None,
            |r| r.customer_email = None,
            |r| r.event_date = None,
            |r| r.event_address = Some(String::new()),
        ];

        for blank in blankers {
            let dispatcher = dispatcher(accepted);
            let mut request = full_request();
            blank(&mut request);

            let err = dispatcher.dispatch(request).await.unwrap_err();
            assert!(matches!(err, DispatchError::MissingFields));
            assert_eq!(err.status_code(), 400);
            assert_eq!(err.client_message(), MISSING_FIELDS_MESSAGE);
            assert!(dispatcher.mailer.sent.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_merge_info_mapping() {
        let dispatcher = dispatcher(accepted);
        let receipt = dispatcher.dispatch(full_request()).await.unwrap();
        assert_eq!(receipt.message_id.as_deref(), Some("msg-1"));

        let sent = dispatcher.mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let merge_info = serde_json::to_value(&sent[0].merge_info).unwrap();
        let keys: Vec<&String> = merge_info.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 4);
        assert_eq!(merge_info["name"], "Ravi");
        assert_eq!(merge_info["event name"], "Kedarkantha Trek");
        assert_eq!(merge_info["date"], "2025-01-10");
        assert_eq!(merge_info["address"], "Sankri, Uttarakhand");
        assert_eq!(sent[0].to[0].email_address.address, "ravi@example.com");
        assert_eq!(sent[0].template_key, "tmpl-1");
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let dispatcher = dispatcher(accepted);
        let err = dispatcher.dispatch_body(b"{not json").await.unwrap_err();
        assert!(matches!(err, DispatchError::InvalidBody(_)));
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.outcome(), DispatchOutcome::Rejected);
        assert_eq!(err.vendor_latency_ms(), None);
    }

    #[tokio::test]
    async fn test_vendor_status_passthrough() {
        let dispatcher = dispatcher(|| {
            Err(VendorError::Http { status: 401, message: "Invalid API Token found".to_string() })
        });
        let err = dispatcher.dispatch(full_request()).await.unwrap_err();
        assert_eq!(err.status_code(), 401);
        assert_eq!(err.client_message(), "Invalid API Token found");
        assert_eq!(err.outcome(), DispatchOutcome::VendorError);
        assert!(err.vendor_latency_ms().is_some());
    }

    #[tokio::test]
    async fn test_transport_failure_is_500() {
        let dispatcher = dispatcher(|| Err(VendorError::Transport(String::new())));
        let err = dispatcher.dispatch(full_request()).await.unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.client_message(), INTERNAL_ERROR_MESSAGE);
        assert_eq!(err.outcome(), DispatchOutcome::TransportError);
        assert!(err.vendor_latency_ms().is_some());
    }

    #[test]
    fn test_response_shape() {
        let ok = DispatchResponse::sent(SendReceipt::from_body(json!({"data": []}), 0));
        let value = serde_json::to_value(ok).unwrap();
        assert_eq!(value["success"], true);
        assert!(value.get("messageId").is_none());

        let failed = serde_json::to_value(DispatchResponse::failed("boom")).unwrap();
        assert_eq!(failed, json!({"success": false, "error": "boom"}));
    }
}
