use actix_web::{middleware, web, App, HttpServer};
use clap::{Parser, Subcommand};
use log::info;

mod config;
mod error;
mod handlers;
mod models;
mod service;
mod simulated;
mod weather;


use crate::config::Config;
use crate::error::AppError;
use crate::service::WeatherService;

#[derive(Parser, Debug)]
#[command(author, version, about = "Weather API - current weather and 5-day forecasts by city")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the web server
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
    /// Print current weather for a city
    Weather { city: String },
    /// Print the 5-day forecast for a city
    Forecast { city: String },
    /// List the built-in city catalog
    Cities,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub weather: WeatherService,
}

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let weather = WeatherService::from_config(&config)?;

    if config.provider_configured() {
        info!("🔑 OpenWeatherMap credential found, using provider with simulated fallback");
    } else {
        info!("🎲 No OPENWEATHERMAP_API_KEY set, serving simulated data only");
    }

    match cli.command {
        Some(Commands::Serve { host, port }) => {
            start_server(&host, port, AppState { config, weather }).await?;
        }
        Some(Commands::Weather { city }) => {
            let current = weather.get_weather(&city).await;
            println!("{}", serde_json::to_string_pretty(&current)?);
        }
        Some(Commands::Forecast { city }) => {
            let forecast = weather.get_forecast(&city).await;
            println!("{}", serde_json::to_string_pretty(&forecast)?);
        }
        Some(Commands::Cities) => {
            println!("📋 Known cities:");
            for city in handlers::city_catalog() {
                println!("  {:<10} {}", city.id, city.name);
            }
        }
        None => {
            start_server("0.0.0.0", 8080, AppState { config, weather }).await?;
        }
    }

    Ok(())
}

async fn start_server(host: &str, port: u16, app_state: AppState) -> Result<(), AppError> {
    info!("🌐 Starting server on http://{}:{}", host, port);
    info!(
        "⏱️  Provider timeout: {}s",
        app_state.config.provider_timeout.as_secs()
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(handlers::configure_routes)
    })
    .bind((host, port))?
    .run()
    .await?;

    Ok(())
}
