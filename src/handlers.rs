use crate::error::AppError;
use crate::models::{City, CityList};
use crate::AppState;
use actix_web::{web, HttpResponse, Responder};
use log::info;

/// Static catalog served by `/cities`.
pub const KNOWN_CITIES: [&str; 5] = ["New York", "London", "Tokyo", "Sydney", "Paris"];

const MAX_CITY_ID_LEN: usize = 100;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(api_description))
        .route("/health", web::get().to(health_check))
        .route("/cities", web::get().to(list_cities))
        .route("/weather/{city_id}", web::get().to(get_weather))
        .route("/forecast/{city_id}", web::get().to(get_forecast));
}

async fn api_description() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "name": "Weather API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "/weather/<city>": "Get current weather for a city",
            "/forecast/<city>": "Get 5-day forecast for a city",
            "/cities": "List available cities",
            "/health": "Service health and data source",
        }
    }))
}

async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let provider = if state.weather.provider_configured() {
        "openweathermap"
    } else {
        "simulated"
    };

    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "Weather API",
        "provider": provider,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn list_cities() -> impl Responder {
    HttpResponse::Ok().json(CityList {
        cities: city_catalog(),
    })
}

async fn get_weather(
    state: web::Data<AppState>,
    city_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let city = city_name_from_id(&city_id)?;
    info!("🌤️  Weather requested for {}", city);

    let weather = state.weather.get_weather(&city).await;
    Ok(HttpResponse::Ok().json(weather))
}

async fn get_forecast(
    state: web::Data<AppState>,
    city_id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let city = city_name_from_id(&city_id)?;
    info!("📅 Forecast requested for {}", city);

    let forecast = state.weather.get_forecast(&city).await;
    Ok(HttpResponse::Ok().json(forecast))
}

pub fn city_catalog() -> Vec<City> {
    KNOWN_CITIES
        .iter()
        .map(|name| City {
            id: name.to_lowercase().replace(' ', "_"),
            name: name.to_string(),
        })
        .collect()
}

/// Map a path id to the free text handed to the weather service. Catalog ids
/// map to their catalog name; anything else has `_` read as a space. Only
/// structurally invalid ids are rejected; unknown cities are not.
pub fn city_name_from_id(city_id: &str) -> Result<String, AppError> {
    let trimmed = city_id.trim();

    let valid = !trimmed.is_empty()
        && trimmed.chars().count() <= MAX_CITY_ID_LEN
        && trimmed
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-' | '\'' | '.' | ','));
    if !valid {
        return Err(AppError::NotFound("City not found".to_string()));
    }

    let lowered = trimmed.to_lowercase();
    if let Some(city) = city_catalog().into_iter().find(|c| c.id == lowered) {
        return Ok(city.name);
    }

    Ok(trimmed.replace('_', " "))
}
