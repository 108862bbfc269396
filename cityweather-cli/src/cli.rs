use anyhow::{Context, Result, anyhow};
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use cityweather_core::{
    Attribute, Config, OpenWeatherClient, ObservationId, QueryFacade, SqliteStore,
    WeatherService, config::DEFAULT_WEATHER_URL,
};

use crate::output;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "cityweather", version, about = "Fetch and store current weather per city")]
pub struct Cli {
    /// SQLite database to use instead of the configured one.
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the weather provider API key and endpoint.
    Configure,

    /// Fetch current weather for one or more cities and store it.
    Fetch {
        /// City names, e.g. "Nancy".
        #[arg(required = true)]
        cities: Vec<String>,

        /// Print the normalized result without storing it.
        #[arg(long)]
        dry_run: bool,
    },

    /// Show a stored city by exact name.
    City { name: String },

    /// List stored cities by exact coordinate, or all of them.
    #[command(group(ArgGroup::new("filter").required(true).args(["latitude", "longitude", "all"])))]
    Cities {
        #[arg(long, allow_negative_numbers = true)]
        latitude: Option<f64>,

        #[arg(long, allow_negative_numbers = true)]
        longitude: Option<f64>,

        /// List every stored city.
        #[arg(long)]
        all: bool,
    },

    /// Show stored observations by city, id, or exact measurement value.
    #[command(group(ArgGroup::new("selector").required(true).args(["city", "id", "attribute"])))]
    Observations {
        #[arg(long)]
        city: Option<String>,

        #[arg(long)]
        id: Option<i64>,

        #[arg(long, requires = "value")]
        attribute: Option<AttributeArg>,

        #[arg(long, requires = "attribute", allow_negative_numbers = true)]
        value: Option<f64>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum AttributeArg {
    Cloudiness,
    Humidity,
    Pressure,
    Rain,
    Snow,
}

impl From<AttributeArg> for Attribute {
    fn from(arg: AttributeArg) -> Self {
        match arg {
            AttributeArg::Cloudiness => Attribute::Cloudiness,
            AttributeArg::Humidity => Attribute::Humidity,
            AttributeArg::Pressure => Attribute::Pressure,
            AttributeArg::Rain => Attribute::Rain,
            AttributeArg::Snow => Attribute::Snow,
        }
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            // Edit what is on disk, not the environment-overridden view.
            Command::Configure => configure(Config::load_file()?),
            Command::Fetch { ref cities, dry_run } => {
                let config = Config::load()?;
                let store = self.open_store(&config)?;
                let client = OpenWeatherClient::new(config.provider_settings()?)?;
                let service = WeatherService::new(client, store);

                let mut failures = 0;
                for city in cities {
                    let result =
                        if dry_run { service.preview(city).await } else { service.ingest(city).await };

                    match result {
                        Ok((city, observation)) => output::pair(&city, &observation, self.json)?,
                        Err(err) if err.is_not_found() => {
                            failures += 1;
                            eprintln!("{city}: city not found");
                        }
                        Err(err) => {
                            failures += 1;
                            eprintln!("{city}: {err}");
                        }
                    }
                }

                if failures > 0 {
                    return Err(anyhow!("{failures} of {} cities failed", cities.len()));
                }
                Ok(())
            }
            Command::City { ref name } => {
                let config = Config::load()?;
                let store = self.open_store(&config)?;
                let city = QueryFacade::new(&store)
                    .city_by_name(name)?
                    .ok_or_else(|| anyhow!("No stored city named '{name}'"))?;
                output::cities(&[city], self.json)
            }
            Command::Cities { latitude, longitude, all } => {
                let config = Config::load()?;
                let store = self.open_store(&config)?;
                let query = QueryFacade::new(&store);
                let cities = match (latitude, longitude) {
                    (Some(lat), _) => query.cities_by_latitude(lat)?,
                    (_, Some(lon)) => query.cities_by_longitude(lon)?,
                    (None, None) if all => query.all_cities()?,
                    (None, None) => return Err(anyhow!("Choose --latitude, --longitude, or --all")),
                };
                output::cities(&cities, self.json)
            }
            Command::Observations { ref city, id, attribute, value } => {
                let config = Config::load()?;
                let store = self.open_store(&config)?;
                let query = QueryFacade::new(&store);
                let observations = match (city, id, attribute.zip(value)) {
                    (Some(name), _, _) => query.observations_for_city_named(name)?,
                    (_, Some(id), _) => query.observation_by_id(ObservationId(id))?,
                    (_, _, Some((attr, value))) => query.observations_by(attr.into(), value)?,
                    _ => return Err(anyhow!("Choose --city, --id, or --attribute with --value")),
                };
                output::observations(&observations, self.json)
            }
        }
    }

    fn open_store(&self, config: &Config) -> Result<SqliteStore> {
        let path = match &self.database {
            Some(path) => path.clone(),
            None => config.database_path()?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory: {}", parent.display())
            })?;
        }

        tracing::debug!(path = %path.display(), "opening database");
        SqliteStore::open(&path)
            .with_context(|| format!("Failed to open database: {}", path.display()))
    }
}

fn configure(mut config: Config) -> Result<()> {
    let api_key = inquire::Password::new("OpenWeatherMap API key:")
        .without_confirmation()
        .with_display_mode(inquire::PasswordDisplayMode::Masked)
        .prompt()
        .context("Failed to read API key")?;

    if api_key.trim().is_empty() {
        return Err(anyhow!("API key must not be empty"));
    }

    let current_url =
        if config.provider.url.is_empty() { DEFAULT_WEATHER_URL } else { config.provider.url.as_str() };
    let url = inquire::Text::new("Current weather endpoint:")
        .with_default(current_url)
        .prompt()
        .context("Failed to read endpoint URL")?;

    config.set_provider(api_key.trim().to_string(), Some(url));
    config.save()?;

    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}
