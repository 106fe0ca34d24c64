use crate::config::Config;
use crate::error::{AppError, ProviderError};
use crate::models::{
    CurrentWeather, DataSource, Forecast, ForecastDay, Location, Temperature, FORECAST_DAYS,
};
use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDateTime, Utc};
use log::{debug, info};
use serde::Deserialize;
use std::time::Duration;

/// The three remote steps the resolution policy can take. Every call is a
/// single request with no retry; any `Err` sends the policy to simulation.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Resolve free text to the provider's best (single) match.
    async fn resolve(&self, city_name: &str) -> Result<Location, ProviderError>;

    async fn fetch_current(&self, location: &Location) -> Result<CurrentWeather, ProviderError>;

    async fn fetch_forecast(&self, location: &Location) -> Result<Forecast, ProviderError>;
}

#[derive(Clone)]
pub struct WeatherClient {
    api_key: String,
    geocoding_url: String,
    one_call_url: String,
    client: reqwest::Client,
}

impl WeatherClient {
    pub fn new(
        api_key: String,
        geocoding_url: String,
        one_call_url: String,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            api_key,
            geocoding_url,
            one_call_url,
            client,
        })
    }

    /// `None` when no credential is configured.
    pub fn from_config(config: &Config) -> Result<Option<Self>, AppError> {
        match &config.weather_api_key {
            Some(key) => Ok(Some(Self::new(
                key.clone(),
                config.geocoding_url.clone(),
                config.one_call_url.clone(),
                config.provider_timeout,
            )?)),
            None => Ok(None),
        }
    }

    async fn one_call(
        &self,
        location: &Location,
        exclude: &str,
    ) -> Result<OneCallResponse, ProviderError> {
        let response = self
            .client
            .get(&self.one_call_url)
            .query(&[
                ("lat", location.latitude.to_string()),
                ("lon", location.longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
                ("exclude", exclude.to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::RemoteUnavailable(format!(
                "One Call API returned status {}: {}",
                status,
                truncate_body(&error_text)
            )));
        }

        Ok(response.json::<OneCallResponse>().await?)
    }
}

#[async_trait]
impl WeatherProvider for WeatherClient {
    async fn resolve(&self, city_name: &str) -> Result<Location, ProviderError> {
        info!("🌐 Geocoding city: {}", city_name);

        let response = self
            .client
            .get(&self.geocoding_url)
            .query(&[("q", city_name), ("limit", "1"), ("appid", self.api_key.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::RemoteUnavailable(format!(
                "Geocoding API returned status {}: {}",
                status,
                truncate_body(&error_text)
            )));
        }

        let matches: Vec<GeoMatch> = response.json().await?;
        let first = matches
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::NotFound(city_name.to_string()))?;

        debug!(
            "Resolved '{}' to {} ({:.4}, {:.4})",
            city_name, first.name, first.lat, first.lon
        );

        Ok(Location::new(first.lat, first.lon, first.name))
    }

    async fn fetch_current(&self, location: &Location) -> Result<CurrentWeather, ProviderError> {
        info!("🌐 Fetching current weather for {}", location.display_name);

        let response = self.one_call(location, "minutely,hourly,alerts").await?;
        let weather = current_from_one_call(location, response)?;

        info!(
            "✅ Weather fetched: {} - {}°C, {}",
            weather.city, weather.temperature.current, weather.condition
        );

        Ok(weather)
    }

    async fn fetch_forecast(&self, location: &Location) -> Result<Forecast, ProviderError> {
        info!("🌐 Fetching forecast for {}", location.display_name);

        let response = self.one_call(location, "current,minutely,hourly,alerts").await?;
        let forecast = forecast_from_one_call(location, response)?;

        info!("✅ Forecast fetched: {} days for {}", forecast.forecast.len(), forecast.city);

        Ok(forecast)
    }
}

// ==================== provider payloads ====================

#[derive(Debug, Deserialize)]
struct GeoMatch {
    name: String,
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
pub struct OneCallResponse {
    current: Option<OneCallCurrent>,
    #[serde(default)]
    daily: Vec<OneCallDaily>,
}

#[derive(Debug, Deserialize)]
struct OneCallCurrent {
    dt: Option<i64>,
    temp: f64,
    feels_like: f64,
    humidity: u8,
    wind_speed: f64,
    #[serde(default)]
    weather: Vec<OneCallWeather>,
}

#[derive(Debug, Deserialize)]
struct OneCallDaily {
    dt: i64,
    temp: OneCallDailyTemp,
    #[serde(default)]
    weather: Vec<OneCallWeather>,
}

#[derive(Debug, Deserialize)]
struct OneCallDailyTemp {
    min: f64,
    max: f64,
}

#[derive(Debug, Deserialize)]
struct OneCallWeather {
    main: Option<String>,
}

// ==================== normalization ====================

pub fn current_from_one_call(
    location: &Location,
    response: OneCallResponse,
) -> Result<CurrentWeather, ProviderError> {
    let current = response
        .current
        .ok_or_else(|| ProviderError::MalformedResponse("missing 'current'".to_string()))?;
    let today = response
        .daily
        .first()
        .ok_or_else(|| ProviderError::MalformedResponse("missing 'daily'".to_string()))?;

    Ok(CurrentWeather {
        city: location.display_name.clone(),
        location: location.clone(),
        temperature: Temperature {
            current: current.temp,
            feels_like: current.feels_like,
            min: today.temp.min,
            max: today.temp.max,
        },
        condition: condition_of(&current.weather),
        humidity: current.humidity,
        wind_speed: current.wind_speed,
        timestamp: current.dt.and_then(local_datetime),
        source: DataSource::OpenWeatherMap,
    })
}

/// Fewer than five daily entries is treated as a malformed response so the
/// caller falls back to a fully simulated forecast.
pub fn forecast_from_one_call(
    location: &Location,
    response: OneCallResponse,
) -> Result<Forecast, ProviderError> {
    if response.daily.len() < FORECAST_DAYS {
        return Err(ProviderError::MalformedResponse(format!(
            "expected {} daily entries, got {}",
            FORECAST_DAYS,
            response.daily.len()
        )));
    }

    let forecast = response
        .daily
        .into_iter()
        .take(FORECAST_DAYS)
        .map(|day| {
            let date = local_datetime(day.dt)
                .ok_or_else(|| {
                    ProviderError::MalformedResponse(format!("invalid daily dt {}", day.dt))
                })?
                .date();

            Ok(ForecastDay {
                date,
                temp_min: day.temp.min,
                temp_max: day.temp.max,
                condition: condition_of(&day.weather),
            })
        })
        .collect::<Result<Vec<_>, ProviderError>>()?;

    Ok(Forecast {
        city: location.display_name.clone(),
        source: DataSource::OpenWeatherMap,
        forecast,
    })
}

fn condition_of(weather: &[OneCallWeather]) -> String {
    weather
        .first()
        .and_then(|w| w.main.as_deref())
        .unwrap_or("unknown")
        .to_lowercase()
}

fn local_datetime(epoch_secs: i64) -> Option<NaiveDateTime> {
    DateTime::<Utc>::from_timestamp(epoch_secs, 0).map(|utc| utc.with_timezone(&Local).naive_local())
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::dev::ServerHandle;
    use actix_web::{web, App, HttpResponse, HttpServer};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    const LONDON_DT: i64 = 1684929490;
    const DAILY_DT: i64 = 1684926000;

    fn london() -> Location {
        Location::new(51.5074, -0.1278, "London")
    }

    fn one_call_body(days: usize) -> Value {
        let daily: Vec<Value> = (0..days)
            .map(|i| {
                json!({
                    "dt": DAILY_DT + 86400 * i as i64,
                    "temp": { "day": 16.2, "min": 10.5, "max": 18.0, "night": 12.1 },
                    "weather": [{ "main": "Clouds" }]
                })
            })
            .collect();

        json!({
            "lat": 51.5074,
            "lon": -0.1278,
            "timezone": "Europe/London",
            "current": {
                "dt": LONDON_DT,
                "temp": 15.5,
                "feels_like": 14.8,
                "pressure": 1015,
                "humidity": 60,
                "wind_speed": 4.1,
                "weather": [{ "id": 803, "main": "Clouds", "description": "broken clouds" }]
            },
            "daily": daily
        })
    }

    fn parse(body: Value) -> OneCallResponse {
        serde_json::from_value(body).expect("fixture should deserialize")
    }

    #[test]
    fn maps_current_conditions() {
        let weather = current_from_one_call(&london(), parse(one_call_body(8))).unwrap();

        assert_eq!(weather.city, "London");
        assert_eq!(weather.location, london());
        assert_eq!(weather.temperature.current, 15.5);
        assert_eq!(weather.temperature.feels_like, 14.8);
        assert_eq!(weather.temperature.min, 10.5);
        assert_eq!(weather.temperature.max, 18.0);
        assert_eq!(weather.condition, "clouds");
        assert_eq!(weather.humidity, 60);
        assert_eq!(weather.wind_speed, 4.1);
        assert_eq!(weather.timestamp, local_datetime(LONDON_DT));
        assert_eq!(weather.source, DataSource::OpenWeatherMap);
    }

    #[test]
    fn missing_dt_and_weather_fall_back_to_null_and_unknown() {
        let mut body = one_call_body(1);
        body["current"].as_object_mut().unwrap().remove("dt");
        body["current"]["weather"] = json!([]);

        let weather = current_from_one_call(&london(), parse(body)).unwrap();

        assert_eq!(weather.timestamp, None);
        assert_eq!(weather.condition, "unknown");
    }

    #[test]
    fn missing_current_is_malformed() {
        let mut body = one_call_body(8);
        body.as_object_mut().unwrap().remove("current");

        let err = current_from_one_call(&london(), parse(body)).unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse(_)));
    }

    #[test]
    fn forecast_truncates_to_five_days() {
        let forecast = forecast_from_one_call(&london(), parse(one_call_body(8))).unwrap();

        assert_eq!(forecast.city, "London");
        assert_eq!(forecast.source, DataSource::OpenWeatherMap);
        assert_eq!(forecast.forecast.len(), FORECAST_DAYS);
        assert_eq!(forecast.forecast[0].date, local_datetime(DAILY_DT).unwrap().date());
        assert_eq!(forecast.forecast[0].temp_min, 10.5);
        assert_eq!(forecast.forecast[0].temp_max, 18.0);
        assert_eq!(forecast.forecast[0].condition, "clouds");
        for pair in forecast.forecast.windows(2) {
            assert!(pair[0].date < pair[1].date);
        }
    }

    #[test]
    fn short_forecast_is_malformed() {
        let err = forecast_from_one_call(&london(), parse(one_call_body(3))).unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse(_)));
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "é".repeat(300);
        let truncated = truncate_body(&long);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }

    // ---------- against an in-process stub of the provider ----------

    struct Stub {
        base: String,
        handle: ServerHandle,
    }

    fn stub(geo: Value, one_call: Value) -> Stub {
        let server = HttpServer::new(move || {
            let geo = geo.clone();
            let one_call = one_call.clone();

            App::new()
                .route(
                    "/geo",
                    web::get().to(move |q: web::Query<HashMap<String, String>>| {
                        let geo = geo.clone();
                        async move {
                            let valid = q.get("limit").map(String::as_str) == Some("1")
                                && q.get("appid").map(String::as_str) == Some("test-key")
                                && q.contains_key("q");
                            if !valid {
                                return HttpResponse::BadRequest().finish();
                            }
                            HttpResponse::Ok().json(geo)
                        }
                    }),
                )
                .route(
                    "/onecall",
                    web::get().to(move |q: web::Query<HashMap<String, String>>| {
                        let one_call = one_call.clone();
                        async move {
                            let exclude_ok = matches!(
                                q.get("exclude").map(String::as_str),
                                Some("minutely,hourly,alerts")
                                    | Some("current,minutely,hourly,alerts")
                            );
                            let valid = exclude_ok
                                && q.get("units").map(String::as_str) == Some("metric")
                                && q.get("lat").map(String::as_str) == Some("51.5074")
                                && q.get("lon").map(String::as_str) == Some("-0.1278");
                            if !valid {
                                return HttpResponse::BadRequest().finish();
                            }
                            HttpResponse::Ok().json(one_call)
                        }
                    }),
                )
                .route(
                    "/slow",
                    web::get().to(|| async {
                        tokio::time::sleep(Duration::from_secs(3)).await;
                        HttpResponse::Ok().json(json!([]))
                    }),
                )
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .expect("stub should bind");

        let base = format!("http://{}", server.addrs()[0]);
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        Stub { base, handle }
    }

    fn client_for(base: &str, geo_path: &str, timeout: Duration) -> WeatherClient {
        WeatherClient::new(
            "test-key".to_string(),
            format!("{}{}", base, geo_path),
            format!("{}/onecall", base),
            timeout,
        )
        .unwrap()
    }

    fn geo_london() -> Value {
        json!([{ "name": "London", "lat": 51.5074, "lon": -0.1278, "country": "GB" }])
    }

    #[actix_web::test]
    async fn resolves_first_match_verbatim() {
        let stub = stub(geo_london(), one_call_body(8));
        let client = client_for(&stub.base, "/geo", Duration::from_secs(5));

        let location = client.resolve("london").await.unwrap();

        assert_eq!(location, london());
        stub.handle.stop(false).await;
    }

    #[actix_web::test]
    async fn empty_geocode_result_is_not_found() {
        let stub = stub(json!([]), one_call_body(8));
        let client = client_for(&stub.base, "/geo", Duration::from_secs(5));

        let err = client.resolve("Atlantis").await.unwrap_err();

        assert!(matches!(err, ProviderError::NotFound(name) if name == "Atlantis"));
        stub.handle.stop(false).await;
    }

    #[actix_web::test]
    async fn fetches_current_and_forecast_over_http() {
        let stub = stub(geo_london(), one_call_body(8));
        let client = client_for(&stub.base, "/geo", Duration::from_secs(5));

        let weather = client.fetch_current(&london()).await.unwrap();
        assert_eq!(weather.temperature.current, 15.5);
        assert_eq!(weather.condition, "clouds");

        let forecast = client.fetch_forecast(&london()).await.unwrap();
        assert_eq!(forecast.forecast.len(), FORECAST_DAYS);

        stub.handle.stop(false).await;
    }

    #[actix_web::test]
    async fn http_error_status_is_remote_unavailable() {
        let stub = stub(geo_london(), one_call_body(8));
        let client = client_for(&stub.base, "/missing", Duration::from_secs(5));

        let err = client.resolve("London").await.unwrap_err();

        assert!(matches!(err, ProviderError::RemoteUnavailable(_)));
        stub.handle.stop(false).await;
    }

    #[actix_web::test]
    async fn unexpected_json_is_malformed() {
        let stub = stub(json!({ "cod": 401 }), one_call_body(8));
        let client = client_for(&stub.base, "/geo", Duration::from_secs(5));

        let err = client.resolve("London").await.unwrap_err();

        assert!(matches!(err, ProviderError::MalformedResponse(_)));
        stub.handle.stop(false).await;
    }

    #[actix_web::test]
    async fn slow_provider_times_out() {
        let stub = stub(geo_london(), one_call_body(8));
        let client = client_for(&stub.base, "/slow", Duration::from_millis(200));

        let err = client.resolve("London").await.unwrap_err();

        assert!(matches!(err, ProviderError::RemoteUnavailable(_)));
        stub.handle.stop(false).await;
    }

    #[actix_web::test]
    async fn closed_port_is_remote_unavailable() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = client_for(&format!("http://127.0.0.1:{}", port), "/geo", Duration::from_secs(1));

        let err = client.fetch_current(&london()).await.unwrap_err();

        assert!(matches!(err, ProviderError::RemoteUnavailable(_)));
    }

    #[test]
    fn no_client_without_credential() {
        let config = Config::default();
        assert!(WeatherClient::from_config(&config).unwrap().is_none());

        let config = Config {
            weather_api_key: Some("key".to_string()),
            ..Config::default()
        };
        assert!(WeatherClient::from_config(&config).unwrap().is_some());
    }
}
