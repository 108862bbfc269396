use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use tracing::debug;

use crate::{
    error::{StoreError, StoreResult},
    model::{Attribute, City, CityId, Observation, ObservationId},
};

use super::{CityStore, ObservationStore};

const CITY_COLUMNS: &str = "id, name, country, latitude, longitude";
const OBSERVATION_COLUMNS: &str = "id, city_id, observed_at, temperature, humidity, pressure, \
     wind_speed, wind_direction, cloudiness, rain, snow";

/// SQLite storage for cities and their observations.
///
/// The connection sits behind a mutex, so one store can be shared between
/// threads and writes are serialized.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        Self::with_connection(Connection::open(path)?)
    }

    /// A private in-memory database, dropped with the store.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        init_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }
}

fn init_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS cities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            country TEXT NOT NULL,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS observations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            city_id INTEGER NOT NULL,
            observed_at INTEGER NOT NULL,
            temperature REAL NOT NULL,
            humidity REAL NOT NULL,
            pressure REAL NOT NULL,
            wind_speed REAL NOT NULL,
            wind_direction REAL NOT NULL,
            cloudiness REAL NOT NULL,
            rain REAL NOT NULL DEFAULT 0,
            snow REAL NOT NULL DEFAULT 0,
            FOREIGN KEY (city_id) REFERENCES cities(id)
        );

        CREATE INDEX IF NOT EXISTS idx_cities_name ON cities(name);
        CREATE INDEX IF NOT EXISTS idx_observations_city ON observations(city_id);",
    )?;
    Ok(())
}

fn city_from_row(row: &Row<'_>) -> rusqlite::Result<City> {
    Ok(City {
        id: Some(CityId(row.get(0)?)),
        name: row.get(1)?,
        country: row.get(2)?,
        latitude: row.get(3)?,
        longitude: row.get(4)?,
    })
}

fn observation_from_row(row: &Row<'_>) -> rusqlite::Result<Observation> {
    Ok(Observation {
        id: Some(ObservationId(row.get(0)?)),
        city_id: Some(CityId(row.get(1)?)),
        timestamp: row.get(2)?,
        temperature: row.get(3)?,
        humidity: row.get(4)?,
        pressure: row.get(5)?,
        wind_speed: row.get(6)?,
        wind_direction: row.get(7)?,
        cloudiness: row.get(8)?,
        rain: row.get(9)?,
        snow: row.get(10)?,
    })
}

fn upsert_city(conn: &Connection, city: &City) -> StoreResult<City> {
    let id = match city.id {
        Some(id) => {
            conn.execute(
                "INSERT INTO cities (id, name, country, latitude, longitude)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    country = excluded.country,
                    latitude = excluded.latitude,
                    longitude = excluded.longitude",
                params![id.0, city.name, city.country, city.latitude, city.longitude],
            )?;
            id
        }
        None => {
            conn.execute(
                "INSERT INTO cities (name, country, latitude, longitude) VALUES (?1, ?2, ?3, ?4)",
                params![city.name, city.country, city.latitude, city.longitude],
            )?;
            CityId(conn.last_insert_rowid())
        }
    };

    debug!(%id, name = %city.name, "saved city");
    Ok(City { id: Some(id), ..city.clone() })
}

fn city_by_name_and_country(conn: &Connection, name: &str, country: &str) -> StoreResult<Option<City>> {
    let city = conn
        .query_row(
            &format!(
                "SELECT {CITY_COLUMNS} FROM cities WHERE name = ?1 AND country = ?2 ORDER BY id LIMIT 1"
            ),
            [name, country],
            city_from_row,
        )
        .optional()?;
    Ok(city)
}

fn upsert_observation(conn: &Connection, o: &Observation) -> StoreResult<Observation> {
    let city_id = o.city_id.ok_or(StoreError::UnsavedCity)?;

    let city_exists = conn
        .query_row("SELECT 1 FROM cities WHERE id = ?1", [city_id.0], |_| Ok(()))
        .optional()?
        .is_some();
    if !city_exists {
        return Err(StoreError::UnsavedCity);
    }

    let id = match o.id {
        Some(id) => {
            conn.execute(
                "INSERT INTO observations (id, city_id, observed_at, temperature, humidity,
                    pressure, wind_speed, wind_direction, cloudiness, rain, snow)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 ON CONFLICT(id) DO UPDATE SET
                    city_id = excluded.city_id,
                    observed_at = excluded.observed_at,
                    temperature = excluded.temperature,
                    humidity = excluded.humidity,
                    pressure = excluded.pressure,
                    wind_speed = excluded.wind_speed,
                    wind_direction = excluded.wind_direction,
                    cloudiness = excluded.cloudiness,
                    rain = excluded.rain,
                    snow = excluded.snow",
                params![
                    id.0,
                    city_id.0,
                    o.timestamp,
                    o.temperature,
                    o.humidity,
                    o.pressure,
                    o.wind_speed,
                    o.wind_direction,
                    o.cloudiness,
                    o.rain,
                    o.snow,
                ],
            )?;
            id
        }
        None => {
            conn.execute(
                "INSERT INTO observations (city_id, observed_at, temperature, humidity,
                    pressure, wind_speed, wind_direction, cloudiness, rain, snow)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    city_id.0,
                    o.timestamp,
                    o.temperature,
                    o.humidity,
                    o.pressure,
                    o.wind_speed,
                    o.wind_direction,
                    o.cloudiness,
                    o.rain,
                    o.snow,
                ],
            )?;
            ObservationId(conn.last_insert_rowid())
        }
    };

    debug!(%id, %city_id, timestamp = o.timestamp, "saved observation");
    Ok(Observation { id: Some(id), ..o.clone() })
}

impl SqliteStore {
    fn query_cities(&self, filter: &str, value: f64) -> StoreResult<Vec<City>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&format!("SELECT {CITY_COLUMNS} FROM cities WHERE {filter} = ?1 ORDER BY id"))?;

        let cities = stmt.query_map([value], city_from_row)?.collect::<Result<Vec<_>, _>>()?;
        Ok(cities)
    }

    fn query_observations<P: rusqlite::Params>(
        &self,
        filter: &str,
        params: P,
    ) -> StoreResult<Vec<Observation>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {OBSERVATION_COLUMNS} FROM observations WHERE {filter} ORDER BY id"
        ))?;

        let observations =
            stmt.query_map(params, observation_from_row)?.collect::<Result<Vec<_>, _>>()?;
        Ok(observations)
    }
}

impl CityStore for SqliteStore {
    fn save_city(&self, city: &City) -> StoreResult<City> {
        upsert_city(&self.conn.lock(), city)
    }

    fn find_city_by_id(&self, id: CityId) -> StoreResult<Option<City>> {
        let conn = self.conn.lock();
        let city = conn
            .query_row(
                &format!("SELECT {CITY_COLUMNS} FROM cities WHERE id = ?1"),
                [id.0],
                city_from_row,
            )
            .optional()?;
        Ok(city)
    }

    fn find_city_by_name(&self, name: &str) -> StoreResult<Option<City>> {
        let conn = self.conn.lock();
        let city = conn
            .query_row(
                &format!("SELECT {CITY_COLUMNS} FROM cities WHERE name = ?1 ORDER BY id LIMIT 1"),
                [name],
                city_from_row,
            )
            .optional()?;
        Ok(city)
    }

    fn find_city_by_name_and_country(&self, name: &str, country: &str) -> StoreResult<Option<City>> {
        city_by_name_and_country(&self.conn.lock(), name, country)
    }

    fn find_cities_by_latitude(&self, latitude: f64) -> StoreResult<Vec<City>> {
        self.query_cities("latitude", latitude)
    }

    fn find_cities_by_longitude(&self, longitude: f64) -> StoreResult<Vec<City>> {
        self.query_cities("longitude", longitude)
    }

    fn list_cities(&self) -> StoreResult<Vec<City>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!("SELECT {CITY_COLUMNS} FROM cities ORDER BY id"))?;

        let cities = stmt.query_map([], city_from_row)?.collect::<Result<Vec<_>, _>>()?;
        Ok(cities)
    }
}

impl ObservationStore for SqliteStore {
    fn save_observation(&self, observation: &Observation) -> StoreResult<Observation> {
        upsert_observation(&self.conn.lock(), observation)
    }

    fn save_observation_for(
        &self,
        city: &City,
        observation: &Observation,
    ) -> StoreResult<(City, Observation)> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let city = match city_by_name_and_country(&tx, &city.name, &city.country)? {
            Some(existing) => existing,
            None => upsert_city(&tx, &City { id: None, ..city.clone() })?,
        };
        let observation =
            upsert_observation(&tx, &Observation { city_id: city.id, ..observation.clone() })?;

        tx.commit()?;
        Ok((city, observation))
    }

    fn find_observations_by_city(&self, city: &City) -> StoreResult<Vec<Observation>> {
        let Some(city_id) = city.id else {
            return Ok(Vec::new());
        };
        self.query_observations("city_id = ?1", [city_id.0])
    }

    fn find_observations_by_id(&self, id: ObservationId) -> StoreResult<Vec<Observation>> {
        self.query_observations("id = ?1", [id.0])
    }

    fn find_observations_by(
        &self,
        attribute: Attribute,
        value: f64,
    ) -> StoreResult<Vec<Observation>> {
        self.query_observations(&format!("{} = ?1", attribute.as_str()), [value])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn lille() -> City {
        City::new("Lille", "France", 50.6333, 3.0667)
    }

    fn observation(city: &City, cloudiness: f64) -> Observation {
        Observation {
            temperature: 10.0,
            humidity: 20.0,
            pressure: 30.0,
            wind_speed: 40.0,
            wind_direction: 50.0,
            cloudiness,
            ..Observation::for_city(city.id, 110)
        }
    }

    #[test]
    fn save_assigns_id_and_find_by_name() {
        let store = SqliteStore::open_in_memory().unwrap();

        let saved = store.save_city(&lille()).unwrap();
        assert!(saved.id.is_some());

        let found = store.find_city_by_name("Lille").unwrap().expect("city stored");
        assert_eq!(found.name, "Lille");
        assert_eq!(found, saved);
        assert!(store.find_city_by_name("lille").unwrap().is_none());
    }

    #[test]
    fn find_by_name_returns_first_stored() {
        let store = SqliteStore::open_in_memory().unwrap();

        let first = store.save_city(&City::new("Paris", "FR", 48.8534, 2.3488)).unwrap();
        store.save_city(&City::new("Paris", "US", 33.6609, -95.5555)).unwrap();

        let found = store.find_city_by_name("Paris").unwrap().unwrap();
        assert_eq!(found.id, first.id);
        assert_eq!(found.country, "FR");
    }

    #[test]
    fn coordinates_match_exactly() {
        let store = SqliteStore::open_in_memory().unwrap();
        let saved = store.save_city(&lille()).unwrap();
        store.save_city(&City::new("Nancy", "France", 48.6833, 6.2)).unwrap();

        assert_eq!(store.find_cities_by_latitude(50.6333).unwrap(), vec![saved.clone()]);
        assert_eq!(store.find_cities_by_longitude(3.0667).unwrap(), vec![saved]);
        assert!(store.find_cities_by_latitude(50.6334).unwrap().is_empty());
        assert!(store.find_cities_by_longitude(3.0668).unwrap().is_empty());
    }

    #[test]
    fn save_with_id_updates_in_place() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut city = store.save_city(&lille()).unwrap();

        city.country = "FR".to_string();
        let updated = store.save_city(&city).unwrap();

        assert_eq!(updated.id, city.id);
        assert_eq!(store.list_cities().unwrap().len(), 1);
        assert_eq!(store.find_city_by_id(city.id.unwrap()).unwrap().unwrap().country, "FR");
    }

    #[test]
    fn observation_requires_stored_city() {
        let store = SqliteStore::open_in_memory().unwrap();

        let unsaved = lille();
        let err = store.save_observation(&observation(&unsaved, 60.0)).unwrap_err();
        assert!(matches!(err, StoreError::UnsavedCity));

        let dangling = Observation::for_city(Some(CityId(42)), 110);
        let err = store.save_observation(&dangling).unwrap_err();
        assert!(matches!(err, StoreError::UnsavedCity));
    }

    #[test]
    fn observations_by_city_and_id() {
        let store = SqliteStore::open_in_memory().unwrap();
        let lille = store.save_city(&lille()).unwrap();
        let nancy = store.save_city(&City::new("Nancy", "France", 48.6833, 6.2)).unwrap();

        let first = store.save_observation(&observation(&lille, 60.0)).unwrap();
        store.save_observation(&observation(&lille, 70.0)).unwrap();
        store.save_observation(&observation(&nancy, 60.0)).unwrap();

        let for_lille = store.find_observations_by_city(&lille).unwrap();
        assert_eq!(for_lille.len(), 2);
        assert!(for_lille.iter().all(|o| o.city_id == lille.id));

        let by_id = store.find_observations_by_id(first.id.unwrap()).unwrap();
        assert_eq!(by_id, vec![first]);
        assert!(store.find_observations_by_id(ObservationId(999)).unwrap().is_empty());

        assert!(store.find_observations_by_city(&City::new("Metz", "FR", 0.0, 0.0)).unwrap().is_empty());
    }

    #[test]
    fn observations_by_attribute_use_exact_values() {
        let store = SqliteStore::open_in_memory().unwrap();
        let city = store.save_city(&lille()).unwrap();

        let mut wet = observation(&city, 60.0);
        wet.rain = 2.5;
        store.save_observation(&wet).unwrap();
        store.save_observation(&observation(&city, 40.0)).unwrap();

        assert_eq!(store.find_observations_by_cloudiness(60.0).unwrap().len(), 1);
        assert_eq!(store.find_observations_by_humidity(20.0).unwrap().len(), 2);
        assert_eq!(store.find_observations_by_pressure(30.0).unwrap().len(), 2);
        assert_eq!(store.find_observations_by_rain(2.5).unwrap().len(), 1);
        assert_eq!(store.find_observations_by_rain(0.0).unwrap().len(), 1);
        assert_eq!(store.find_observations_by_snow(0.0).unwrap().len(), 2);
        assert!(store.find_observations_by_cloudiness(60.0001).unwrap().is_empty());
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("weather.db");

        {
            let store = SqliteStore::open(&db_path).unwrap();
            let city = store.save_city(&lille()).unwrap();
            store.save_observation(&observation(&city, 60.0)).unwrap();
        }

        let store = SqliteStore::open(&db_path).unwrap();
        let city = store.find_city_by_name("Lille").unwrap().unwrap();
        assert_eq!(store.find_observations_by_city(&city).unwrap().len(), 1);
    }

    #[test]
    fn find_by_name_and_country_skips_foreign_namesakes() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.save_city(&City::new("Nancy", "US", 37.0, -84.0)).unwrap();
        let fr = store.save_city(&City::new("Nancy", "FR", 48.6833, 6.2)).unwrap();

        assert_eq!(store.find_city_by_name_and_country("Nancy", "FR").unwrap(), Some(fr));
        assert!(store.find_city_by_name_and_country("Nancy", "DE").unwrap().is_none());
    }

    #[test]
    fn save_observation_for_reuses_matching_city() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.save_city(&City::new("Nancy", "US", 37.0, -84.0)).unwrap();

        let reported = City::new("Nancy", "FR", 48.6833, 6.2);
        let (first, _) =
            store.save_observation_for(&reported, &Observation::for_city(None, 100)).unwrap();
        let (second, obs) =
            store.save_observation_for(&reported, &Observation::for_city(None, 200)).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(obs.city_id, first.id);
        assert_eq!(store.list_cities().unwrap().len(), 2);
        assert_eq!(store.find_observations_by_city(&first).unwrap().len(), 2);
    }

    #[test]
    fn failed_observation_rolls_back_new_city() {
        let store = SqliteStore::open_in_memory().unwrap();

        // SQLite stores NaN as NULL, which the NOT NULL column rejects.
        let broken = Observation { temperature: f64::NAN, ..Observation::for_city(None, 100) };
        assert!(store.save_observation_for(&lille(), &broken).is_err());

        assert!(store.list_cities().unwrap().is_empty());
    }

    #[test]
    fn concurrent_saves_insert_city_once() {
        let store = SqliteStore::open_in_memory().unwrap();
        let reported = lille();

        std::thread::scope(|s| {
            for ts in 0..8 {
                let store = &store;
                let reported = &reported;
                s.spawn(move || {
                    store.save_observation_for(reported, &Observation::for_city(None, ts)).unwrap();
                });
            }
        });

        let cities = store.list_cities().unwrap();
        assert_eq!(cities.len(), 1);
        assert_eq!(store.find_observations_by_city(&cities[0]).unwrap().len(), 8);
    }
}
