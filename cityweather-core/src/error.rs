//! Error types for fetching, normalizing and storing observations.

use thiserror::Error;

/// Why a provider payload could not be turned into a City/Observation pair.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    #[error("response body is not a JSON object")]
    NotJson,

    #[error("payload is missing city fields (name, sys.country, coord.lat, coord.lon)")]
    MissingCityFields,

    #[error("payload is missing the observation timestamp (dt)")]
    MissingTimestamp,

    #[error("payload is missing main fields (temp, humidity, pressure)")]
    MissingMainFields,

    #[error("payload is missing wind fields (speed, deg)")]
    MissingWindFields,

    #[error("payload is missing cloud cover (clouds.all)")]
    MissingCloudFields,

    /// A precipitation section is present but its `1h` value is not a number.
    #[error("'{section}.1h' is present but not a number")]
    MalformedPrecipitation { section: &'static str },
}

/// Network-level failure talking to the weather provider.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request to weather provider timed out")]
    Timeout(#[source] reqwest::Error),

    #[error("could not reach weather provider: {0}")]
    Request(#[source] reqwest::Error),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { Self::Timeout(err) } else { Self::Request(err) }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("observation does not reference a stored city")]
    UnsavedCity,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of a single fetch-normalize-persist call.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("weather provider answered with status {0}")]
    UpstreamStatus(u16),

    #[error("could not normalize provider response: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Error {
    /// True when the provider reported that the city does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::UpstreamStatus(404))
    }
}
