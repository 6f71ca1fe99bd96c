//! Services - business logic
//!
//! This module contains the core business logic services:
//! - `email_dispatch` - Validate and forward registration emails
//! - `geolocation` - Location acquisition with timeout and error mapping
//! - `aggregator` - Nearby content discovery and detail resolution

pub mod aggregator;
pub mod email_dispatch;
pub mod geolocation;

// Re-export commonly used types
pub use aggregator::{AggregateError, NearbyAggregator};
pub use email_dispatch::{DispatchError, DispatchResponse, EmailDispatcher};
pub use geolocation::{acquire_location, LocationError, LocationSource, PositionOptions};
