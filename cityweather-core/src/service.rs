//! Fetch → normalize → persist, one city per call.

use tracing::{info, warn};

use crate::{
    error::Error,
    model::{City, Observation},
    normalize::normalize,
    provider::WeatherProvider,
    query::QueryFacade,
    store::{CityStore, ObservationStore},
};

/// Composes a weather provider with the city and observation stores.
///
/// Holds no mutable state of its own; concurrent calls only contend on the store.
#[derive(Debug)]
pub struct WeatherService<P, S> {
    provider: P,
    store: S,
}

impl<P, S> WeatherService<P, S>
where
    P: WeatherProvider,
    S: CityStore + ObservationStore,
{
    pub fn new(provider: P, store: S) -> Self {
        Self { provider, store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn query(&self) -> QueryFacade<'_, S> {
        QueryFacade::new(&self.store)
    }

    /// Fetch and normalize the current weather for `city` without storing it.
    pub async fn preview(&self, city: &str) -> Result<(City, Observation), Error> {
        let response = self.provider.fetch(city).await?;

        if !response.is_success() {
            warn!(city, status = response.status, "no weather for city");
            return Err(Error::UpstreamStatus(response.status));
        }

        Ok(normalize(&response.body)?)
    }

    /// Fetch, normalize and store the current weather for `city`.
    ///
    /// A stored city with the same name and country is reused; otherwise the
    /// reported city is saved along with the observation, in one store write.
    /// Returns the stored pair.
    pub async fn ingest(&self, city: &str) -> Result<(City, Observation), Error> {
        let (reported, observation) = self.preview(city).await?;

        let (city, observation) = self.store.save_observation_for(&reported, &observation)?;

        info!(
            city = %city.name,
            country = %city.country,
            timestamp = observation.timestamp,
            "stored observation"
        );

        Ok((city, observation))
    }
}
