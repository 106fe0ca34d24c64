//! Stand-in weather for when the provider is not configured or fails.
//!
//! Values have a fixed shape and plausible ranges but are not physically
//! consistent: min/max are drawn independently of the current temperature.

use crate::models::{
    display_name, CurrentWeather, DataSource, Forecast, ForecastDay, Location, Temperature,
    FORECAST_DAYS,
};
use chrono::{Duration, Local, NaiveDateTime};
use rand::seq::SliceRandom;
use rand::Rng;

pub const CONDITIONS: [&str; 6] = ["sunny", "cloudy", "rainy", "partly_cloudy", "stormy", "snowy"];

/// Current weather for `city_name` using the thread-local RNG and wall clock.
pub fn generate_current(city_name: &str, location: Option<&Location>) -> CurrentWeather {
    generate_current_with(
        &mut rand::thread_rng(),
        Local::now().naive_local(),
        city_name,
        location,
    )
}

/// Five days of forecast starting today, using the thread-local RNG.
pub fn generate_forecast(city_name: &str, location: Option<&Location>) -> Forecast {
    generate_forecast_with(
        &mut rand::thread_rng(),
        Local::now().naive_local(),
        city_name,
        location,
    )
}

pub fn generate_current_with<R: Rng + ?Sized>(
    rng: &mut R,
    now: NaiveDateTime,
    city_name: &str,
    location: Option<&Location>,
) -> CurrentWeather {
    let city = city_for(city_name, location);

    CurrentWeather {
        location: location
            .cloned()
            .unwrap_or_else(|| Location::unknown(city.clone())),
        city,
        temperature: Temperature {
            current: round1(rng.gen_range(0.0..=35.0)),
            feels_like: round1(rng.gen_range(0.0..=35.0)),
            min: round1(rng.gen_range(-5.0..=15.0)),
            max: round1(rng.gen_range(20.0..=40.0)),
        },
        condition: pick_condition(rng),
        humidity: rng.gen_range(30..=90),
        wind_speed: round1(rng.gen_range(0.0..=50.0)),
        timestamp: Some(now),
        source: DataSource::Simulated,
    }
}

pub fn generate_forecast_with<R: Rng + ?Sized>(
    rng: &mut R,
    now: NaiveDateTime,
    city_name: &str,
    location: Option<&Location>,
) -> Forecast {
    let today = now.date();

    let forecast = (0..FORECAST_DAYS as i64)
        .map(|offset| ForecastDay {
            date: today + Duration::days(offset),
            temp_min: round1(rng.gen_range(-5.0..=15.0)),
            temp_max: round1(rng.gen_range(20.0..=40.0)),
            condition: pick_condition(rng),
        })
        .collect();

    Forecast {
        city: city_for(city_name, location),
        source: DataSource::Simulated,
        forecast,
    }
}

/// A resolved location already carries the provider's canonical name; raw
/// input gets the display-name treatment.
fn city_for(city_name: &str, location: Option<&Location>) -> String {
    match location {
        Some(loc) if !loc.display_name.is_empty() => loc.display_name.clone(),
        _ => display_name(city_name),
    }
}

fn pick_condition<R: Rng + ?Sized>(rng: &mut R) -> String {
    CONDITIONS
        .choose(rng)
        .copied()
        .unwrap_or("sunny")
        .to_string()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
