//! IO modules - external system interfaces
//!
//! This module contains all external IO operations:
//! - `vendor` - Shared response/error plumbing for third-party HTTP APIs
//! - `zeptomail` - ZeptoMail template-send client
//! - `nearby` - Proximity and detail lookups for events and experiences
//! - `booking` - Booking status lookups
//! - `http_api` - Email proxy HTTP server
//! - `registration_client` - Client for the email proxy endpoint
//! - `prometheus` - Prometheus text rendering of proxy metrics

pub mod booking;
pub mod http_api;
pub mod nearby;
pub mod prometheus;
pub mod registration_client;
pub mod vendor;
pub mod zeptomail;

// Re-export commonly used types
pub use booking::BookingClient;
pub use http_api::{serve, start_api_server, ApiState};
pub use nearby::NearbyClient;
pub use registration_client::{RegistrationEmailClient, SendOutcome};
pub use vendor::VendorError;
pub use zeptomail::{Mailer, SendReceipt, ZeptoMailClient};
