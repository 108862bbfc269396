//! Read-side lookups over the stores.
//!
//! Coordinates and measurements are matched by exact floating-point equality,
//! without tolerance. A city stored at `50.6333` is not found by `50.6334`.

use crate::{
    error::StoreResult,
    model::{Attribute, City, Observation, ObservationId},
    store::{CityStore, ObservationStore},
};

pub struct QueryFacade<'a, S> {
    store: &'a S,
}

impl<'a, S> QueryFacade<'a, S>
where
    S: CityStore + ObservationStore,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// At most one city; the first stored wins when names collide.
    pub fn city_by_name(&self, name: &str) -> StoreResult<Option<City>> {
        self.store.find_city_by_name(name)
    }

    pub fn cities_by_latitude(&self, latitude: f64) -> StoreResult<Vec<City>> {
        self.store.find_cities_by_latitude(latitude)
    }

    pub fn cities_by_longitude(&self, longitude: f64) -> StoreResult<Vec<City>> {
        self.store.find_cities_by_longitude(longitude)
    }

    pub fn all_cities(&self) -> StoreResult<Vec<City>> {
        self.store.list_cities()
    }

    pub fn observations_for_city(&self, city: &City) -> StoreResult<Vec<Observation>> {
        self.store.find_observations_by_city(city)
    }

    /// Observations for the city stored under `name`; empty when no such city exists.
    pub fn observations_for_city_named(&self, name: &str) -> StoreResult<Vec<Observation>> {
        match self.store.find_city_by_name(name)? {
            Some(city) => self.store.find_observations_by_city(&city),
            None => Ok(Vec::new()),
        }
    }

    pub fn observation_by_id(&self, id: ObservationId) -> StoreResult<Vec<Observation>> {
        self.store.find_observations_by_id(id)
    }

    pub fn observations_by(&self, attribute: Attribute, value: f64) -> StoreResult<Vec<Observation>> {
        self.store.find_observations_by(attribute, value)
    }
}
