//! Nearby events/experiences vendor client
//!
//! Proximity endpoints (`POST {base}/webhook/nearby-events`,
//! `POST {base}/webhook/nearby-experiences`) answer with an array, a bare
//! object, or nothing. The body is classified into a [`VendorPayload`]
//! right after the call so callers only ever see `{events: [...]}` /
//! `{experiences: [...]}`.
//!
//! Detail endpoints live on a second host and are fetched one id at a
//! time. Nothing is cached or retried.

use crate::domain::types::{
    DetailedEvent, DetailedExperience, LocationCoordinates, NearbyContent, NearbyEvents,
    NearbyExperiences, NearbyItem, ProximityQuery,
};
use crate::io::vendor::{join_segments, unwrap_envelope, VendorError, VendorPayload, VendorReply};
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
enum ProximityKind {
    Events,
    Experiences,
}

impl ProximityKind {
    fn webhook(&self) -> &'static str {
        match self {
            ProximityKind::Events => "nearby-events",
            ProximityKind::Experiences => "nearby-experiences",
        }
    }

    fn fallback_message(&self) -> &'static str {
        match self {
            ProximityKind::Events => "Failed to fetch nearby events",
            ProximityKind::Experiences => "Failed to fetch nearby experiences",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NearbyClient {
    client: reqwest::Client,
    base_url: Arc<str>,
    detail_base_url: Arc<str>,
}

impl NearbyClient {
    pub fn new(base_url: &str, detail_base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, detail_base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str, detail_base_url: &str) -> Self {
        Self { client, base_url: Arc::from(base_url), detail_base_url: Arc::from(detail_base_url) }
    }

    async fn proximity(
        &self,
        kind: ProximityKind,
        coordinates: LocationCoordinates,
        max_distance: &str,
    ) -> Result<Vec<NearbyItem>, VendorError> {
        let url = join_segments(&self.base_url, &["webhook", kind.webhook()])?;
        let query = ProximityQuery::new(coordinates, max_distance);

        let response = self.client.post(url).json(&query).send().await?;
        let reply = VendorReply::read(response).await?.error_for_status(kind.fallback_message())?;

        let payload = VendorPayload::classify(reply.body);
        debug!(
            webhook = kind.webhook(),
            coordinates = %coordinates,
            shape = payload.shape(),
            "nearby_response_received"
        );
        Ok(payload.into_items())
    }

    pub async fn nearby_events(
        &self,
        coordinates: LocationCoordinates,
        max_distance: &str,
    ) -> Result<NearbyEvents, VendorError> {
        let events = self.proximity(ProximityKind::Events, coordinates, max_distance).await?;
        Ok(NearbyEvents { events })
    }

    pub async fn nearby_experiences(
        &self,
        coordinates: LocationCoordinates,
        max_distance: &str,
    ) -> Result<NearbyExperiences, VendorError> {
        let experiences =
            self.proximity(ProximityKind::Experiences, coordinates, max_distance).await?;
        Ok(NearbyExperiences { experiences })
    }

    /// Issue both proximity queries concurrently; the first failure wins
    pub async fn nearby_all(
        &self,
        coordinates: LocationCoordinates,
        max_distance: &str,
    ) -> Result<NearbyContent, VendorError> {
        let (events, experiences) = tokio::try_join!(
            self.nearby_events(coordinates, max_distance),
            self.nearby_experiences(coordinates, max_distance),
        )?;
        Ok(NearbyContent { events, experiences })
    }

    async fn detail<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        fallback: &str,
    ) -> Result<T, VendorError> {
        let url = join_segments(&self.detail_base_url, segments)?;
        let response = self.client.get(url).header(CONTENT_TYPE, "application/json").send().await?;
        let reply = VendorReply::read(response).await?.error_for_status(fallback)?;

        let record = unwrap_envelope(reply.body.unwrap_or(Value::Null));
        serde_json::from_value(record)
            .map_err(|e| VendorError::Decode(format!("unexpected detail shape: {e}")))
    }

    pub async fn event_details(&self, event_id: &str) -> Result<DetailedEvent, VendorError> {
        self.detail(&["api", "events", "getevent", event_id], "Failed to fetch event details").await
    }

    pub async fn experience_details(
        &self,
        experience_id: &str,
    ) -> Result<DetailedExperience, VendorError> {
        self.detail(
            &["api", "recurringevents", "getrecurringevent", experience_id],
            "Failed to fetch experience details",
        )
        .await
    }
}
