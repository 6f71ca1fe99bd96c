//! Domain models - request/response DTOs and pure rules
//!
//! This module contains the data types used throughout the system:
//! - `RegistrationEmailRequest` - inbound body of the email proxy
//! - `NearbyItem` / `NearbyContent` - normalized proximity query results
//! - `DetailedEvent` / `DetailedExperience` - vendor detail records
//! - `BookingState` - registration state derived from a booking lookup

pub mod booking;
pub mod types;

pub use booking::{AllBookingsResponse, Booking, BookingState, BookingStatusResponse};
pub use types::{
    format_event_date, DetailedEvent, DetailedExperience, LocationCoordinates, NearbyContent,
    NearbyEvents, NearbyExperiences, NearbyItem, RegistrationEmail, RegistrationEmailRequest,
};
