//! Location acquisition
//!
//! A [`LocationSource`] reports raw position errors with the standard
//! numeric codes (1 = permission denied, 2 = unavailable, 3 = timeout).
//! [`acquire_location`] enforces the configured timeout and maps those
//! codes to human-readable [`LocationError`]s.

use crate::domain::types::LocationCoordinates;
use crate::infra::config::Config;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::from_secs(300),
        }
    }
}

impl PositionOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            enable_high_accuracy: config.location_high_accuracy(),
            timeout: config.location_timeout(),
            maximum_age: config.location_maximum_age(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub coordinates: LocationCoordinates,
    /// Meters, when the source knows it
    pub accuracy_m: Option<f64>,
}

/// Raw error from a location source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionError {
    pub code: u16,
    pub message: String,
}

pub const PERMISSION_DENIED: u16 = 1;
pub const POSITION_UNAVAILABLE: u16 = 2;
pub const TIMEOUT: u16 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Geolocation is not supported on this host")]
    Unsupported,
    #[error("Location access denied by user")]
    PermissionDenied,
    #[error("Location information unavailable")]
    PositionUnavailable,
    #[error("Location request timeout")]
    Timeout,
    #[error("Unable to get location")]
    Unknown,
}

impl From<PositionError> for LocationError {
    fn from(e: PositionError) -> Self {
        match e.code {
            PERMISSION_DENIED => LocationError::PermissionDenied,
            POSITION_UNAVAILABLE => LocationError::PositionUnavailable,
            TIMEOUT => LocationError::Timeout,
            _ => LocationError::Unknown,
        }
    }
}

/// Something that can report the current position
#[async_trait]
pub trait LocationSource: Send + Sync {
    /// `false` when no positioning capability exists at all
    fn is_supported(&self) -> bool {
        true
    }

    async fn current_position(&self, options: &PositionOptions) -> Result<Position, PositionError>;
}

/// A position pinned by configuration or the command line
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation {
    coordinates: LocationCoordinates,
}

impl FixedLocation {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { coordinates: LocationCoordinates { lat, lng } }
    }
}

#[async_trait]
impl LocationSource for FixedLocation {
    async fn current_position(&self, _options: &PositionOptions) -> Result<Position, PositionError> {
        Ok(Position { coordinates: self.coordinates, accuracy_m: None })
    }
}

/// Host without any positioning capability
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocation;

#[async_trait]
impl LocationSource for NoLocation {
    fn is_supported(&self) -> bool {
        false
    }

    async fn current_position(&self, _options: &PositionOptions) -> Result<Position, PositionError> {
        Err(PositionError { code: POSITION_UNAVAILABLE, message: "no location source".to_string() })
    }
}

/// Source that always fails with a fixed error code
#[derive(Debug, Clone, Copy)]
pub struct FailingLocation {
    code: u16,
}

impl FailingLocation {
    pub fn new(code: u16) -> Self {
        Self { code }
    }
}

#[async_trait]
impl LocationSource for FailingLocation {
    async fn current_position(&self, _options: &PositionOptions) -> Result<Position, PositionError> {
        Err(PositionError { code: self.code, message: "position error".to_string() })
    }
}

/// Pick the location source described by configuration
pub fn source_from_config(config: &Config) -> Box<dyn LocationSource> {
    match config.fixed_location() {
        Some((lat, lng)) => Box::new(FixedLocation::new(lat, lng)),
        None => Box::new(NoLocation),
    }
}

/// Ask `source` for the current coordinates within `options.timeout`
pub async fn acquire_location(
    source: &dyn LocationSource,
    options: &PositionOptions,
) -> Result<LocationCoordinates, LocationError> {
    if !source.is_supported() {
        return Err(LocationError::Unsupported);
    }

    match tokio::time::timeout(options.timeout, source.current_position(options)).await {
        Ok(Ok(position)) => {
            debug!(
                coordinates = %position.coordinates,
                accuracy_m = ?position.accuracy_m,
                "location_acquired"
            );
            Ok(position.coordinates)
        }
        Ok(Err(e)) => {
            warn!(code = e.code, message = %e.message, "location_error");
            Err(e.into())
        }
        Err(_) => {
            warn!(timeout_ms = options.timeout.as_millis() as u64, "location_timeout");
            Err(LocationError::Timeout)
        }
    }
}
