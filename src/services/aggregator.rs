//! Nearby content aggregation
//!
//! Location → both proximity queries in parallel → lazy per-item detail
//! resolution. Every call goes to the network; there is no cache and no
//! request coalescing, so resolving the same id twice costs two calls.

use crate::domain::types::{
    DetailedEvent, DetailedExperience, LocationCoordinates, NearbyContent, NearbyItem,
};
use crate::infra::config::Config;
use crate::io::nearby::NearbyClient;
use crate::io::vendor::VendorError;
use crate::services::geolocation::{
    acquire_location, LocationError, LocationSource, PositionOptions,
};
use std::future::Future;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error(transparent)]
    Location(#[from] LocationError),
    #[error(transparent)]
    Vendor(#[from] VendorError),
}

/// Outcome of one detail lookup, keyed by the item id
pub type Resolved<T> = (String, Result<T, VendorError>);

pub struct NearbyAggregator {
    client: NearbyClient,
    default_max_distance: String,
}

impl NearbyAggregator {
    pub fn new(client: NearbyClient, default_max_distance: &str) -> Self {
        Self { client, default_max_distance: default_max_distance.to_string() }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            NearbyClient::new(config.nearby_base_url(), config.detail_base_url()),
            config.default_max_distance(),
        )
    }

    pub fn client(&self) -> &NearbyClient {
        &self.client
    }

    /// Events and experiences around `coordinates`
    pub async fn discover(
        &self,
        coordinates: LocationCoordinates,
        max_distance: Option<&str>,
    ) -> Result<NearbyContent, AggregateError> {
        let max_distance = max_distance.unwrap_or(&self.default_max_distance);
        let content = self.client.nearby_all(coordinates, max_distance).await?;

        info!(
            coordinates = %coordinates,
            max_distance = %max_distance,
            events = content.events.events.len(),
            experiences = content.experiences.experiences.len(),
            "nearby_content_discovered"
        );
        Ok(content)
    }

    /// Acquire the current location, then discover around it
    pub async fn discover_here(
        &self,
        source: &dyn LocationSource,
        options: &PositionOptions,
        max_distance: Option<&str>,
    ) -> Result<(LocationCoordinates, NearbyContent), AggregateError> {
        let coordinates = acquire_location(source, options).await?;
        let content = self.discover(coordinates, max_distance).await?;
        Ok((coordinates, content))
    }

    /// Fetch details for every event, one call per item, in completion order
    pub async fn resolve_events(&self, items: &[NearbyItem]) -> Vec<Resolved<DetailedEvent>> {
        self.resolve_all(items, |client, id| async move { client.event_details(&id).await }).await
    }

    /// Fetch details for every experience, one call per item, in completion order
    pub async fn resolve_experiences(
        &self,
        items: &[NearbyItem],
    ) -> Vec<Resolved<DetailedExperience>> {
        self.resolve_all(items, |client, id| async move { client.experience_details(&id).await })
            .await
    }

    async fn resolve_all<T, F, Fut>(&self, items: &[NearbyItem], fetch: F) -> Vec<Resolved<T>>
    where
        T: Send + 'static,
        F: Fn(NearbyClient, String) -> Fut,
        Fut: Future<Output = Result<T, VendorError>> + Send + 'static,
    {
        let mut tasks = JoinSet::new();
        for item in items {
            let id = item.id.clone();
            let lookup = fetch(self.client.clone(), id.clone());
            tasks.spawn(async move { (id, lookup.await) });
        }

        let mut resolved = Vec::with_capacity(items.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(entry) => resolved.push(entry),
                Err(e) => error!(error = %e, "detail_task_failed"),
            }
        }
        resolved
    }
}
