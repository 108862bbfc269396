use anyhow::Result;
use cityweather_core::{City, Observation};
use serde_json::json;

pub fn pair(city: &City, observation: &Observation, as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(&json!({ "city": city, "observation": observation }))?);
        return Ok(());
    }

    println!("{}", city_line(city));
    println!("  {}", observation_line(observation));
    Ok(())
}

pub fn cities(cities: &[City], as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(cities)?);
        return Ok(());
    }

    if cities.is_empty() {
        println!("No matching cities.");
    }
    for city in cities {
        println!("{}", city_line(city));
    }
    Ok(())
}

pub fn observations(observations: &[Observation], as_json: bool) -> Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(observations)?);
        return Ok(());
    }

    if observations.is_empty() {
        println!("No matching observations.");
    }
    for obs in observations {
        println!("{}", observation_line(obs));
    }
    Ok(())
}

fn city_line(city: &City) -> String {
    let id = city.id.map(|id| format!("#{id} ")).unwrap_or_default();
    format!("{id}{}, {} ({:.4}, {:.4})", city.name, city.country, city.latitude, city.longitude)
}

fn observation_line(obs: &Observation) -> String {
    let when = obs
        .observed_at()
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| obs.timestamp.to_string());
    let id = obs.id.map(|id| format!("#{id} ")).unwrap_or_default();

    format!(
        "{id}{when}: {:.1}°C, humidity {}%, {} hPa, wind {} m/s @ {}°, clouds {}%, rain {} mm, snow {} mm",
        obs.temperature,
        obs.humidity,
        obs.pressure,
        obs.wind_speed,
        obs.wind_direction,
        obs.cloudiness,
        obs.rain,
        obs.snow,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use cityweather_core::CityId;

    #[test]
    fn city_line_includes_id_when_saved() {
        let mut city = City::new("Lille", "France", 50.6333, 3.0667);
        assert_eq!(city_line(&city), "Lille, France (50.6333, 3.0667)");

        city.id = Some(CityId(7));
        assert!(city_line(&city).starts_with("#7 Lille"));
    }

    #[test]
    fn observation_line_formats_time() {
        let obs = Observation { temperature: 10.0, ..Observation::for_city(None, 1_700_000_000) };
        let line = observation_line(&obs);
        assert!(line.starts_with("2023-11-14 22:13 UTC: 10.0°C"), "{line}");
    }
}
