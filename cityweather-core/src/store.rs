//! Persistence collaborators for cities and observations.
//!
//! All numeric lookups compare by exact equality: `50.6333` does not match a
//! city stored at `50.63330001`.

use crate::{
    error::StoreResult,
    model::{Attribute, City, CityId, Observation, ObservationId},
};

pub mod sqlite;

pub use sqlite::SqliteStore;

pub trait CityStore {
    /// Insert a new city (assigning its id) or update the stored one with the same id.
    fn save_city(&self, city: &City) -> StoreResult<City>;

    fn find_city_by_id(&self, id: CityId) -> StoreResult<Option<City>>;

    /// First stored city with exactly this name.
    fn find_city_by_name(&self, name: &str) -> StoreResult<Option<City>>;

    /// First stored city with exactly this name and country.
    fn find_city_by_name_and_country(&self, name: &str, country: &str)
    -> StoreResult<Option<City>>;

    fn find_cities_by_latitude(&self, latitude: f64) -> StoreResult<Vec<City>>;

    fn find_cities_by_longitude(&self, longitude: f64) -> StoreResult<Vec<City>>;

    fn list_cities(&self) -> StoreResult<Vec<City>>;
}

pub trait ObservationStore {
    /// Insert or update an observation. Its `city_id` must reference a stored city.
    fn save_observation(&self, observation: &Observation) -> StoreResult<Observation>;

    /// Save `observation` under the stored city with `city`'s name and country,
    /// inserting that city first when none exists. Either both rows are written
    /// or neither is; `city.id` and `observation.city_id` are ignored.
    fn save_observation_for(
        &self,
        city: &City,
        observation: &Observation,
    ) -> StoreResult<(City, Observation)>;

    /// Observations of `city` in insertion order; empty for an unsaved city.
    fn find_observations_by_city(&self, city: &City) -> StoreResult<Vec<Observation>>;

    fn find_observations_by_id(&self, id: ObservationId) -> StoreResult<Vec<Observation>>;

    fn find_observations_by(&self, attribute: Attribute, value: f64)
    -> StoreResult<Vec<Observation>>;

    fn find_observations_by_cloudiness(&self, cloudiness: f64) -> StoreResult<Vec<Observation>> {
        self.find_observations_by(Attribute::Cloudiness, cloudiness)
    }

    fn find_observations_by_humidity(&self, humidity: f64) -> StoreResult<Vec<Observation>> {
        self.find_observations_by(Attribute::Humidity, humidity)
    }

    fn find_observations_by_pressure(&self, pressure: f64) -> StoreResult<Vec<Observation>> {
        self.find_observations_by(Attribute::Pressure, pressure)
    }

    fn find_observations_by_rain(&self, rain: f64) -> StoreResult<Vec<Observation>> {
        self.find_observations_by(Attribute::Rain, rain)
    }

    fn find_observations_by_snow(&self, snow: f64) -> StoreResult<Vec<Observation>> {
        self.find_observations_by(Attribute::Snow, snow)
    }
}
