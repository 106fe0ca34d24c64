//! Resolution policy: decides per request whether data comes from the
//! provider or the simulator. Never returns an error to its caller.

use crate::config::Config;
use crate::error::AppError;
use crate::models::{CurrentWeather, Forecast, Location};
use crate::simulated;
use crate::weather::{WeatherClient, WeatherProvider};
use log::warn;
use std::sync::Arc;

#[derive(Clone)]
pub struct WeatherService {
    provider: Option<Arc<dyn WeatherProvider>>,
}

impl WeatherService {
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Ok(match WeatherClient::from_config(config)? {
            Some(client) => Self::with_provider(Arc::new(client)),
            None => Self::simulated_only(),
        })
    }

    pub fn with_provider(provider: Arc<dyn WeatherProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    pub fn simulated_only() -> Self {
        Self { provider: None }
    }

    pub fn provider_configured(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn get_weather(&self, city_name: &str) -> CurrentWeather {
        let Some(provider) = &self.provider else {
            return simulated::generate_current(city_name, None);
        };
        let Some(location) = resolve(provider.as_ref(), city_name).await else {
            return simulated::generate_current(city_name, None);
        };

        match provider.fetch_current(&location).await {
            Ok(weather) => weather,
            Err(e) => {
                warn!(
                    "⚠️ Current weather unavailable for {}, simulating: {}",
                    location.display_name, e
                );
                simulated::generate_current(city_name, Some(&location))
            }
        }
    }

    pub async fn get_forecast(&self, city_name: &str) -> Forecast {
        let Some(provider) = &self.provider else {
            return simulated::generate_forecast(city_name, None);
        };
        let Some(location) = resolve(provider.as_ref(), city_name).await else {
            return simulated::generate_forecast(city_name, None);
        };

        match provider.fetch_forecast(&location).await {
            Ok(forecast) => forecast,
            Err(e) => {
                warn!(
                    "⚠️ Forecast unavailable for {}, simulating: {}",
                    location.display_name, e
                );
                simulated::generate_forecast(city_name, Some(&location))
            }
        }
    }
}

async fn resolve(provider: &dyn WeatherProvider, city_name: &str) -> Option<Location> {
    match provider.resolve(city_name).await {
        Ok(location) => Some(location),
        Err(e) => {
            warn!("⚠️ Could not resolve '{}', simulating: {}", city_name, e);
            None
        }
    }
}
