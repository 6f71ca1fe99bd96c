//! Booking records and the registration state shown for an event

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Booking status for one event, as returned by the vendor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingStatusResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<BookingStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingStatus {
    pub id: String,
    pub event_id: String,
    pub customer_id: String,
    pub name: String,
    pub phone_number: String,
    pub email: String,
    pub custom_form_data: Map<String, Value>,
    pub is_approved: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Booking {
    pub id: String,
    pub event_id: String,
    pub customer_id: String,
    pub name: String,
    pub phone_number: String,
    pub email: String,
    pub custom_form_data: Map<String, Value>,
    pub is_approved: Option<bool>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllBookingsResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Booking>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// What the customer sees for an event they may have registered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingState {
    /// No booking yet
    Register,
    /// Booked, awaiting approval
    Registered,
    /// Approved, payment pending
    Approved,
    /// Not selected
    Rejected,
}

impl BookingState {
    pub fn from_response(response: &BookingStatusResponse) -> Self {
        let Some(data) = response.data.as_ref().filter(|_| response.success) else {
            return BookingState::Register;
        };

        match data.is_approved {
            None => BookingState::Registered,
            Some(true) => BookingState::Approved,
            Some(false) => BookingState::Rejected,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingState::Register => "register",
            BookingState::Registered => "registered",
            BookingState::Approved => "approved",
            BookingState::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for BookingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(json: &str) -> BookingStatusResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_state_without_data_is_register() {
        assert_eq!(BookingState::from_response(&status(r#"{"success":true}"#)), BookingState::Register);
        assert_eq!(
            BookingState::from_response(&status(r#"{"success":false,"error":"nope"}"#)),
            BookingState::Register
        );
    }

    #[test]
    fn test_state_follows_is_approved() {
        let pending = status(r#"{"success":true,"data":{"id":"b1","is_approved":null}}"#);
        let approved = status(r#"{"success":true,"data":{"id":"b1","is_approved":true}}"#);
        let rejected = status(r#"{"success":true,"data":{"id":"b1","is_approved":false}}"#);

        assert_eq!(BookingState::from_response(&pending), BookingState::Registered);
        assert_eq!(BookingState::from_response(&approved), BookingState::Approved);
        assert_eq!(BookingState::from_response(&rejected), BookingState::Rejected);
    }

    #[test]
    fn test_unsuccessful_response_ignores_data() {
        let response = status(r#"{"success":false,"data":{"id":"b1","is_approved":true}}"#);
        assert_eq!(BookingState::from_response(&response), BookingState::Register);
    }
}
