use anyhow::{Context, bail};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use inquire::Password;
use munchies_core::{Config, MunchieAggregator, MunchieEnvelope, MunchieRequest, ProviderId};
use std::time::Duration;
use tracing::info;

use crate::{http, state::AppState};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "munchies", version, about = "Food and forecast for where you're headed")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name: "google", "yelp" or "openweather".
        provider: String,
    },

    /// Run the HTTP API.
    Serve {
        /// Address to listen on; overrides the configured one.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Look up a munchie once and print it as JSON.
    Show {
        #[arg(long)]
        start: String,

        #[arg(long)]
        end: String,

        /// Cuisine category, e.g. "chinese".
        #[arg(long)]
        food: String,

        /// Optional RFC 3339 departure time; if absent, means "now".
        #[arg(long)]
        depart: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => configure(&provider),
            Command::Serve { bind } => serve(bind).await,
            Command::Show { start, end, food, depart } => show(start, end, food, depart).await,
        }
    }
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    let api_key = Password::new(&format!("API key for {id}:"))
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    if api_key.trim().is_empty() {
        bail!("API key for '{id}' must not be empty");
    }

    config.upsert_provider_api_key(id, api_key.trim().to_string());
    config.save()?;

    println!("Saved credentials for {id} to {}", Config::config_file_path()?.display());

    let missing = config.missing_providers();
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(ProviderId::as_str).collect();
        println!("Still missing: {}", names.join(", "));
    }

    Ok(())
}

async fn serve(bind: Option<String>) -> anyhow::Result<()> {
    let config = Config::load()?;
    let aggregator = MunchieAggregator::from_config(&config)?;

    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    let timeout = Duration::from_secs(config.server.request_timeout_secs);
    let app = http::router(AppState::new(aggregator, timeout));

    let listener = tokio::net::TcpListener::bind(bind.as_str())
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;

    info!(%bind, ?timeout, "munchies listening");

    axum::serve(listener, app).await.context("HTTP server terminated")?;
    Ok(())
}

async fn show(
    start: String,
    end: String,
    food: String,
    depart: Option<String>,
) -> anyhow::Result<()> {
    let config = Config::load()?;
    let aggregator = MunchieAggregator::from_config(&config)?;
    let request = MunchieRequest::try_new(Some(start), Some(end), Some(food))?;

    let now = match depart {
        Some(s) => parse_departure(&s)?,
        None => Utc::now(),
    };

    let response = aggregator.handle_at(&request, now).await?;
    let json = serde_json::to_string_pretty(&MunchieEnvelope::from(response))
        .context("Failed to render response as JSON")?;

    println!("{json}");
    Ok(())
}

fn parse_departure(s: &str) -> anyhow::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("Invalid --depart '{s}', expected RFC 3339 like 2024-05-01T17:30:00Z"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_show_arguments() {
        let cli = Cli::try_parse_from([
            "munchies", "show", "--start", "denver,co", "--end", "pueblo,co", "--food", "chinese",
        ])
        .unwrap();

        match cli.command {
            Command::Show { start, end, food, depart } => {
                assert_eq!(start, "denver,co");
                assert_eq!(end, "pueblo,co");
                assert_eq!(food, "chinese");
                assert!(depart.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn departure_accepts_offsets() {
        let dt = parse_departure("2024-05-01T11:30:00-06:00").unwrap();
        assert_eq!(dt.timestamp(), DateTime::parse_from_rfc3339("2024-05-01T17:30:00Z").unwrap().timestamp());
    }

    #[test]
    fn departure_rejects_garbage() {
        let err = parse_departure("tomorrow").unwrap_err();
        assert!(err.to_string().contains("Invalid --depart"));
    }
}
