mod cli;
mod config;
mod datasources;
mod error;
mod logic;
mod models;
mod parser;
mod schema;
mod ui;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use cli::{Cli, Commands};
use config::{Config, FetchConfig, LocationConfig};
use datasources::VentuskyClient;
use logic::ForecastHub;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use ui::ForecastReport;

#[tokio::main]
async fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Fetch { lat, lon, output } => fetch(cli.config, lat, lon, &output).await,
        Commands::Parse {
            input,
            output,
            location,
        } => parse(&input, &output, location.as_deref()),
        Commands::Read { file, day, field } => {
            let forecast = schema::read_forecast(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let text = ForecastReport::new(&forecast)
                .with_day(day.as_deref())
                .with_field(field.as_deref())
                .render()?;
            println!("{}", text);
            Ok(())
        }
        Commands::Watch => watch_locations(cli.config).await,
        Commands::Init => {
            let (config, path) = Config::setup_interactive()?;
            for location in &config.locations {
                println!("  {} -> {}", location.name, location.entity_id());
            }
            println!("Run `ventusky check --config {}` to verify.", path.display());
            Ok(())
        }
        Commands::Check => check(cli.config).await,
    }
}

async fn fetch(config_path: Option<PathBuf>, lat: f64, lon: f64, output: &Path) -> Result<()> {
    let settings = if Config::exists(config_path.as_ref()) {
        Config::load(config_path)?.fetch
    } else {
        FetchConfig::default()
    };
    let client = VentuskyClient::new(&settings)?;

    println!("Fetching {} ...", client.page_url(lat, lon));
    let html = client.fetch_page(lat, lon).await?;
    tokio::fs::write(output, &html)
        .await
        .with_context(|| format!("writing {}", output.display()))?;
    println!("Saved to {} ({} bytes)", output.display(), html.len());
    Ok(())
}

fn parse(input: &Path, output: &Path, location: Option<&str>) -> Result<()> {
    let html = std::fs::read_to_string(input)
        .with_context(|| format!("reading {}", input.display()))?;
    let parsed = parser::parse_page(&html, location)
        .with_context(|| format!("parsing {}", input.display()))?;
    for warning in &parsed.warnings {
        warn!("{}: {}", input.display(), warning);
    }

    let forecast = &parsed.forecast;
    schema::write_forecast(output, forecast)
        .with_context(|| format!("writing {}", output.display()))?;
    println!(
        "Parsed {} days for {} ({} to {}) -> {}",
        forecast.forecast.len(),
        forecast.location,
        forecast.first_date().unwrap_or("?"),
        forecast.last_date().unwrap_or("?"),
        output.display()
    );
    Ok(())
}

async fn check(config_path: Option<PathBuf>) -> Result<()> {
    let config = Config::load(config_path)?;
    println!("Config OK: {} location(s)", config.locations.len());

    let client = VentuskyClient::new(&config.fetch)?;
    for location in &config.locations {
        let url = client.page_url(location.latitude, location.longitude);
        match client.test_connection(location).await {
            Ok(true) => println!("  {}: OK ({})", location.name, url),
            Ok(false) => println!("  {}: unexpected HTTP status ({})", location.name, url),
            Err(e) => println!("  {}: OFFLINE ({})", location.name, e),
        }
    }
    Ok(())
}

async fn watch_locations(config_path: Option<PathBuf>) -> Result<()> {
    let config = Config::load(config_path)?;
    if config.locations.is_empty() {
        anyhow::bail!("no locations configured");
    }

    let hub = Arc::new(ForecastHub::from_config(&config)?);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut tasks = hub.spawn_all(&shutdown_rx);

    for location in &config.locations {
        let mut feed = hub.subscribe(location)?;
        let mut shutdown = shutdown_rx.clone();
        let hub = Arc::clone(&hub);
        let location = location.clone();
        tasks.push(tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = feed.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    _ = shutdown.changed() => break,
                }
                report_update(&hub, &location).await;
            }
        }));
    }

    println!(
        "Watching {} location(s), press Ctrl-C to stop",
        config.locations.len()
    );
    tokio::signal::ctrl_c()
        .await
        .context("waiting for Ctrl-C")?;

    info!("Shutting down");
    let _ = shutdown_tx.send(true);
    for task in tasks {
        let _ = task.await;
    }
    Ok(())
}

async fn report_update(hub: &ForecastHub, location: &LocationConfig) {
    let status = match hub.status(location).await {
        Ok(status) => status.to_string(),
        Err(e) => e.to_string(),
    };

    match hub.get_current_conditions(location).await {
        Ok(current) => {
            info!(
                entity = %location.entity_id(),
                status = %status,
                condition = %current.condition,
                "Forecast updated"
            );
            println!(
                "[{}] {} ({}): {} °C, {}, wind {} {} km/h",
                Local::now().format("%H:%M"),
                location.entity_id(),
                status,
                current.temperature_c,
                current.condition,
                current.wind_direction,
                current.wind_speed_kmh
            );
        }
        Err(e) => warn!("{}: {}", location.name, e),
    }

    if let Ok(sensors) = hub.get_sensor_readings(location).await {
        debug!(entity = %location.entity_id(), ?sensors, "Sensor readings");
    }
}
