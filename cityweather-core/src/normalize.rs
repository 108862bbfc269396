//! Turns a current-weather payload from the provider into a [`City`] and an
//! [`Observation`].
//!
//! Everything except precipitation is required: a missing section fails the
//! whole payload with the matching [`ParseError`]. The provider leaves `rain`
//! and `snow` out entirely in dry weather, so those default to `0.0`.

use serde_json::{Map, Value};

use crate::{
    error::ParseError,
    model::{City, Observation},
};

type Object = Map<String, Value>;

/// Normalize a raw response body. Nothing is persisted.
///
/// A body that is not a JSON object (including the bare status code the
/// provider client substitutes for non-2xx responses) fails with
/// [`ParseError::NotJson`] before any field is looked at.
pub fn normalize(body: &str) -> Result<(City, Observation), ParseError> {
    let root = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => map,
        _ => return Err(ParseError::NotJson),
    };

    let city = extract_city(&root)?;

    let timestamp = root.get("dt").and_then(Value::as_i64).ok_or(ParseError::MissingTimestamp)?;

    let main = object(&root, "main").ok_or(ParseError::MissingMainFields)?;
    let temperature = number(main, "temp").ok_or(ParseError::MissingMainFields)?;
    let humidity = number(main, "humidity").ok_or(ParseError::MissingMainFields)?;
    let pressure = number(main, "pressure").ok_or(ParseError::MissingMainFields)?;

    let wind = object(&root, "wind").ok_or(ParseError::MissingWindFields)?;
    let wind_speed = number(wind, "speed").ok_or(ParseError::MissingWindFields)?;
    let wind_direction = number(wind, "deg").ok_or(ParseError::MissingWindFields)?;

    let cloudiness = object(&root, "clouds")
        .and_then(|clouds| number(clouds, "all"))
        .ok_or(ParseError::MissingCloudFields)?;

    let rain = last_hour_precipitation(&root, "rain")?;
    let snow = last_hour_precipitation(&root, "snow")?;

    let observation = Observation {
        id: None,
        city_id: None,
        timestamp,
        temperature,
        humidity,
        pressure,
        wind_speed,
        wind_direction,
        cloudiness,
        rain,
        snow,
    };

    Ok((city, observation))
}

fn extract_city(root: &Object) -> Result<City, ParseError> {
    let name = root.get("name").and_then(Value::as_str).ok_or(ParseError::MissingCityFields)?;
    let country = object(root, "sys")
        .and_then(|sys| sys.get("country"))
        .and_then(Value::as_str)
        .ok_or(ParseError::MissingCityFields)?;

    let coord = object(root, "coord").ok_or(ParseError::MissingCityFields)?;
    let latitude = number(coord, "lat").ok_or(ParseError::MissingCityFields)?;
    let longitude = number(coord, "lon").ok_or(ParseError::MissingCityFields)?;

    Ok(City::new(name, country, latitude, longitude))
}

/// `<section>.1h`, or `0.0` when the section or its `1h` key is absent.
///
/// Each section is looked up on its own; one being absent never affects the other.
/// A section that is present but not an object, or a non-numeric `1h`, is malformed.
fn last_hour_precipitation(root: &Object, section: &'static str) -> Result<f64, ParseError> {
    let Some(value) = root.get(section).filter(|v| !v.is_null()) else {
        return Ok(0.0);
    };
    let malformed = ParseError::MalformedPrecipitation { section };

    match value.as_object().ok_or(malformed)?.get("1h") {
        Some(last_hour) => last_hour.as_f64().ok_or(malformed),
        None => Ok(0.0),
    }
}

fn object<'a>(parent: &'a Object, key: &str) -> Option<&'a Object> {
    parent.get(key).and_then(Value::as_object)
}

fn number(parent: &Object, key: &str) -> Option<f64> {
    parent.get(key).and_then(Value::as_f64)
}
