// SPDX-FileCopyrightText: 2026 Chatrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! chatrelay - a shared chat room with an AI responder.
//!
//! This is the binary entry point for the relay server.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;
mod shutdown;

use std::path::PathBuf;

use chatrelay_config::{ChatrelayConfig, ConfigError};
use clap::{Parser, Subcommand};

/// chatrelay - a shared chat room with an AI responder.
#[derive(Parser, Debug)]
#[command(name = "chatrelay", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the relay server (default).
    Serve,
    /// Validate configuration and print the effective settings.
    CheckConfig,
}

fn load(cli: &Cli) -> Result<ChatrelayConfig, Vec<ConfigError>> {
    match &cli.config {
        Some(path) => chatrelay_config::load_and_validate_path(path),
        None => chatrelay_config::load_and_validate(),
    }
}

/// Effective configuration as TOML, with the API key masked.
fn effective_config_toml(config: &ChatrelayConfig) -> Result<String, toml::ser::Error> {
    let mut shown = config.clone();
    if shown.completion.api_key.is_some() {
        shown.completion.api_key = Some("********".to_string());
    }
    toml::to_string_pretty(&shown)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load(&cli) {
        Ok(config) => config,
        Err(errors) => {
            chatrelay_config::render_errors(&errors);
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
        Commands::CheckConfig => match effective_config_toml(&config) {
            Ok(rendered) => {
                eprintln!("chatrelay: config ok (listening on {})", config.server.bind_addr());
                println!("{rendered}");
            }
            Err(e) => {
                eprintln!("error: failed to render config: {e}");
                std::process::exit(1);
            }
        },
    }
}
