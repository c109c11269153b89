use clap::Parser;

mod alerts;
mod app;
mod auth;
mod cli;
mod clients;
mod config;
mod corpus;
mod discovery;
mod errors;
mod prospects;
mod scoring;
mod storage;
#[cfg(test)]
mod tests;
mod web;

use app::RefreshRequest;
use config::Config;
use scoring::Method;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Comma-separated list parameter into trimmed, non-empty values.
pub fn parse_list(values: String) -> Vec<String> {
    values
        .split(',')
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(|value| value.to_string())
        .collect()
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "prospecta=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = cli::Args::parse();

    let base_path = std::env::var("PROSPECTA_BASE_PATH").unwrap_or("./data".to_string());
    let config = Config::load_with(&base_path);
    let app = app::App::new(config, &base_path)?;

    match args.command {
        cli::Command::Daemon {} => {
            web::start_daemon(app);
            Ok(())
        }

        cli::Command::Search {
            region,
            limit,
            method,
        } => {
            let region = region.unwrap_or_else(|| app.config().default_region.clone());
            let method = method
                .as_deref()
                .map(Method::parse)
                .unwrap_or_else(|| app.config().scoring.method());
            let items = app.search_prospects(&region, limit.unwrap_or(10), method)?;

            println!("{}", serde_json::to_string_pretty(&items).unwrap());
            Ok(())
        }

        cli::Command::Refresh {
            region,
            industries,
            keywords,
            limit,
            method,
        } => {
            let request = RefreshRequest {
                region: region.unwrap_or_else(|| app.config().default_region.clone()),
                industries: industries.map(parse_list),
                keywords: keywords.map(parse_list),
                method: method
                    .as_deref()
                    .map(Method::parse)
                    .unwrap_or_else(|| app.config().scoring.method()),
                limit: limit.unwrap_or(20),
            };
            let items = app.refresh_prospects(request)?;

            println!("{}", serde_json::to_string_pretty(&items).unwrap());
            Ok(())
        }
    }
}
