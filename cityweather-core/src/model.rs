use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned key of a [`City`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CityId(pub i64);

/// Store-assigned key of an [`Observation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObservationId(pub i64);

impl fmt::Display for CityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ObservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named location that observations are recorded for.
///
/// Country and coordinates are whatever the provider reported; they are not
/// checked against any gazetteer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    /// `None` until the city has been saved.
    pub id: Option<CityId>,
    pub name: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl City {
    pub fn new(
        name: impl Into<String>,
        country: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self { id: None, name: name.into(), country: country.into(), latitude, longitude }
    }

    pub fn is_saved(&self) -> bool {
        self.id.is_some()
    }
}

/// One normalized weather measurement for one city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub id: Option<ObservationId>,
    /// Foreign key to the owning city; must point at a stored city before saving.
    pub city_id: Option<CityId>,
    /// Seconds since the Unix epoch, as reported by the provider.
    pub timestamp: i64,
    /// °C
    pub temperature: f64,
    /// %
    pub humidity: f64,
    /// hPa
    pub pressure: f64,
    pub wind_speed: f64,
    /// Degrees
    pub wind_direction: f64,
    /// %
    pub cloudiness: f64,
    /// mm over the last hour
    pub rain: f64,
    /// mm over the last hour
    pub snow: f64,
}

impl Observation {
    /// An observation with every measurement zeroed, tied to `city_id`.
    pub fn for_city(city_id: Option<CityId>, timestamp: i64) -> Self {
        Self {
            id: None,
            city_id,
            timestamp,
            temperature: 0.0,
            humidity: 0.0,
            pressure: 0.0,
            wind_speed: 0.0,
            wind_direction: 0.0,
            cloudiness: 0.0,
            rain: 0.0,
            snow: 0.0,
        }
    }

    /// The provider timestamp as a UTC instant, if it is in chrono's range.
    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }

    pub fn value_of(&self, attribute: Attribute) -> f64 {
        match attribute {
            Attribute::Cloudiness => self.cloudiness,
            Attribute::Humidity => self.humidity,
            Attribute::Pressure => self.pressure,
            Attribute::Rain => self.rain,
            Attribute::Snow => self.snow,
        }
    }
}

/// Observation measurements that can be looked up by exact value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    Cloudiness,
    Humidity,
    Pressure,
    Rain,
    Snow,
}

impl Attribute {
    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::Cloudiness => "cloudiness",
            Attribute::Humidity => "humidity",
            Attribute::Pressure => "pressure",
            Attribute::Rain => "rain",
            Attribute::Snow => "snow",
        }
    }

    pub const fn all() -> &'static [Attribute] {
        &[
            Attribute::Cloudiness,
            Attribute::Humidity,
            Attribute::Pressure,
            Attribute::Rain,
            Attribute::Snow,
        ]
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Attribute {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        Attribute::all().iter().copied().find(|a| a.as_str() == lower).ok_or_else(|| {
            anyhow::anyhow!(
                "Unknown attribute '{value}'. Supported attributes: cloudiness, humidity, pressure, rain, snow."
            )
        })
    }
}
