//! Core library for the `cityweather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The weather provider client
//! - Normalization of provider payloads into City/Observation entities
//! - SQLite-backed stores and the query façade over them
//! - The ingestion service tying those together
//!
//! It is used by `cityweather-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod query;
pub mod service;
pub mod store;

pub use config::{Config, ProviderConfig, ProviderSettings, StorageConfig};
pub use error::{Error, ParseError, StoreError, StoreResult, TransportError};
pub use model::{Attribute, City, CityId, Observation, ObservationId};
pub use normalize::normalize;
pub use provider::{OpenWeatherClient, RawResponse, WeatherProvider};
pub use query::QueryFacade;
pub use service::WeatherService;
pub use store::{CityStore, ObservationStore, SqliteStore};
