// SPDX-FileCopyrightText: 2026 Alertmail Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! alertmail - alert ingestion with scheduled email digests.
//!
//! This is the binary entry point for the alertmail service.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;
mod shutdown;

use std::path::PathBuf;

use alertmail_config::{AlertmailConfig, ConfigError};
use alertmail_core::AlertmailError;
use alertmail_core::types::parse_alert_time;
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};

/// alertmail - alert ingestion with scheduled email digests.
#[derive(Parser, Debug)]
#[command(name = "alertmail", version, about, long_about = None)]
struct Cli {
    /// Load this file (plus ALERTMAIL_* overrides) instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API and run the digest scheduler (default).
    Serve,
    /// Build and send digests once, then exit.
    Send {
        /// Window start, `YYYY-MM-DD HH:MM:SS`. Defaults to today's configured start.
        #[arg(long, value_parser = parse_bound)]
        start: Option<NaiveDateTime>,
        /// Window end, `YYYY-MM-DD HH:MM:SS`. Defaults to today's configured end.
        #[arg(long, value_parser = parse_bound)]
        end: Option<NaiveDateTime>,
    },
    /// Validate the configuration and exit.
    CheckConfig,
}

fn parse_bound(value: &str) -> Result<NaiveDateTime, String> {
    parse_alert_time(value).map_err(|e| e.to_string())
}

fn load_config(path: Option<&PathBuf>) -> Result<AlertmailConfig, Vec<ConfigError>> {
    match path {
        Some(path) => alertmail_config::load_and_validate_path(path),
        None => alertmail_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            alertmail_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Commands::Send { start, end } => match serve::run_send(config, start, end).await {
            Ok(summary) => print_summary(&summary),
            Err(AlertmailError::Delivery { summary, .. }) => {
                print_summary(&summary);
                std::process::exit(2);
            }
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        },
        Commands::CheckConfig => {
            println!(
                "alertmail: config ok (listen {}:{}, database {}, schedule '{}', scheduler {})",
                config.server.host,
                config.server.port,
                config.storage.database_path,
                config.cron.schedule,
                if config.cron.enabled { "enabled" } else { "disabled" },
            );
        }
    }
}

fn print_summary(summary: &alertmail_core::DispatchSummary) {
    match serde_json::to_string_pretty(summary) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("error: failed to encode summary: {e}"),
    }
}
