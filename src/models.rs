use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Where a response's data came from. A response is never a mix of both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    OpenWeatherMap,
    Simulated,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::OpenWeatherMap => "openweathermap",
            DataSource::Simulated => "simulated",
        }
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved place. Only the coordinates are part of the JSON shape; the
/// display name travels in the response's `city` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
    #[serde(skip)]
    pub display_name: String,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64, display_name: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            display_name: display_name.into(),
        }
    }

    /// Placeholder used when simulating without coordinates.
    pub fn unknown(display_name: impl Into<String>) -> Self {
        Self::new(0.0, 0.0, display_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    pub current: f64,
    pub feels_like: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub city: String,
    pub location: Location,
    pub temperature: Temperature,
    pub condition: String,
    pub humidity: u8,
    pub wind_speed: f64,
    pub timestamp: Option<NaiveDateTime>,
    pub source: DataSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub temp_min: f64,
    pub temp_max: f64,
    pub condition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub city: String,
    pub source: DataSource,
    pub forecast: Vec<ForecastDay>,
}

/// Number of days every forecast response carries.
pub const FORECAST_DAYS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct City {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct CityList {
    pub cities: Vec<City>,
}

/// Display name used when a response is built from raw user input rather than
/// a provider match: every whitespace-separated word gets an upper-case first
/// letter and lower-case remainder. Provider names are never passed through
/// this and are shown verbatim.
pub fn display_name(input: &str) -> String {
    input
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_capitalizes_each_word() {
        assert_eq!(display_name("atlantis"), "Atlantis");
        assert_eq!(display_name("new york"), "New York");
        assert_eq!(display_name("UnknownCity"), "Unknowncity");
        assert_eq!(display_name("  rio   de  JANEIRO "), "Rio De Janeiro");
    }

    #[test]
    fn source_serializes_as_lowercase_token() {
        assert_eq!(
            serde_json::to_value(DataSource::OpenWeatherMap).unwrap(),
            "openweathermap"
        );
        assert_eq!(serde_json::to_value(DataSource::Simulated).unwrap(), "simulated");
    }

    #[test]
    fn location_serializes_coordinates_only() {
        let value = serde_json::to_value(Location::new(51.5, -0.12, "London")).unwrap();
        assert_eq!(value, serde_json::json!({ "lat": 51.5, "lon": -0.12 }));
    }

    #[test]
    fn forecast_day_date_is_plain_iso_date() {
        let day = ForecastDay {
            date: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
            temp_min: 1.0,
            temp_max: 2.0,
            condition: "rain".to_string(),
        };
        let value = serde_json::to_value(day).unwrap();
        assert_eq!(value["date"], "2024-03-09");
    }
}
