//! Booking lookups against the content vendor
//!
//! Both calls need a bearer token for the signed-in customer; obtaining
//! it is the caller's job. Failures are folded into the response
//! (`success: false`) rather than returned as errors, so a failed lookup
//! simply shows the "register" state.

use crate::domain::booking::{AllBookingsResponse, BookingStatusResponse};
use crate::io::vendor::{join_segments, VendorError, VendorReply};
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

const UNKNOWN_ERROR: &str = "Unknown error occurred";

/// Fields shared by both booking responses, for folding failures in
trait FailureResponse: DeserializeOwned {
    fn failure(error: String, message: Option<String>) -> Self;
}

impl FailureResponse for BookingStatusResponse {
    fn failure(error: String, message: Option<String>) -> Self {
        Self { success: false, data: None, error: Some(error), message }
    }
}

impl FailureResponse for AllBookingsResponse {
    fn failure(error: String, message: Option<String>) -> Self {
        Self { success: false, data: None, error: Some(error), message }
    }
}

#[derive(Debug, Clone)]
pub struct BookingClient {
    client: reqwest::Client,
    base_url: String,
}

impl BookingClient {
    pub fn new(base_url: &str) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.to_string() }
    }

    /// Booking for the current customer on one event
    pub async fn booking_status(&self, token: &str, event_id: &str) -> BookingStatusResponse {
        self.get(
            token,
            &["api", "bookings", "event", "customer", event_id],
            "Failed to check booking status",
        )
        .await
    }

    /// Every booking of the current customer
    pub async fn all_bookings(&self, token: &str) -> AllBookingsResponse {
        self.get(token, &["api", "bookings", "allMyEvents"], "Failed to fetch bookings").await
    }

    async fn get<T: FailureResponse>(&self, token: &str, segments: &[&str], fallback: &str) -> T {
        match self.fetch(token, segments).await {
            Ok(reply) if reply.status.is_success() => {
                let body = reply.body.unwrap_or(Value::Null);
                serde_json::from_value(body).unwrap_or_else(|e| T::failure(e.to_string(), None))
            }
            Ok(reply) => {
                let body = reply.body.unwrap_or(Value::Null);
                let error = body.get("error").and_then(Value::as_str).unwrap_or(fallback);
                let message = body.get("message").and_then(Value::as_str).unwrap_or(UNKNOWN_ERROR);
                warn!(status = %reply.status.as_u16(), error = %error, "booking_lookup_failed");
                T::failure(error.to_string(), Some(message.to_string()))
            }
            Err(e) => {
                warn!(error = %e, "booking_lookup_error");
                let error = e.to_string();
                T::failure(if error.is_empty() { UNKNOWN_ERROR.to_string() } else { error }, None)
            }
        }
    }

    async fn fetch(&self, token: &str, segments: &[&str]) -> Result<VendorReply, VendorError> {
        let url = join_segments(&self.base_url, segments)?;
        debug!(url = %url, "booking_lookup");

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;
        VendorReply::read(response).await
    }
}
