use crate::error::AppError;
use std::env;
use std::time::Duration;

pub const DEFAULT_GEOCODING_URL: &str = "https://api.openweathermap.org/geo/1.0/direct";
pub const DEFAULT_ONE_CALL_URL: &str = "https://api.openweathermap.org/data/3.0/onecall";
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    /// Absent means simulation-only mode, which is a normal way to run.
    pub weather_api_key: Option<String>,
    pub geocoding_url: String,
    pub one_call_url: String,
    pub provider_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            weather_api_key: None,
            geocoding_url: DEFAULT_GEOCODING_URL.to_string(),
            one_call_url: DEFAULT_ONE_CALL_URL.to_string(),
            provider_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout_secs = match lookup("PROVIDER_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                AppError::Config(format!("PROVIDER_TIMEOUT_SECS must be a number, got '{}'", raw))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            weather_api_key: lookup("OPENWEATHERMAP_API_KEY")
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty()),
            geocoding_url: lookup("OPENWEATHERMAP_GEOCODING_URL")
                .unwrap_or_else(|| DEFAULT_GEOCODING_URL.to_string()),
            one_call_url: lookup("OPENWEATHERMAP_ONE_CALL_URL")
                .unwrap_or_else(|| DEFAULT_ONE_CALL_URL.to_string()),
            provider_timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn provider_configured(&self) -> bool {
        self.weather_api_key.is_some()
    }
}
