// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parley - embeddable support chat.
//!
//! Binary entry point: serves the gateway, runs retention sweeps, and
//! prints the resolved configuration.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};

mod serve;
mod sweep;

/// Parley - embeddable support chat.
#[derive(Parser, Debug)]
#[command(name = "parley", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the chat gateway server.
    Serve,
    /// Delete stale closed sessions and expired flow state, then exit.
    Sweep,
    /// Print the resolved configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match parley_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            parley_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Sweep) => sweep::run_sweep(config).await,
        Some(Commands::Config) => {
            print_config(&config);
            Ok(())
        }
        None => {
            println!("parley: use --help for available commands");
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn print_config(config: &parley_config::ParleyConfig) {
    println!("server.host            = {}", config.server.host);
    println!("server.port            = {}", config.server.port);
    println!(
        "server.operator_token  = {}",
        if config.server.operator_token.is_some() {
            "[set]"
        } else {
            "[unset -- operator surface disabled]"
        }
    );
    println!("server.log_level       = {}", config.server.log_level);
    println!("storage.database_path  = {}", config.storage.database_path);
    println!("storage.wal_mode       = {}", config.storage.wal_mode);
    println!(
        "relay                  = {}",
        if config.relay.is_configured() {
            "configured"
        } else {
            "unconfigured (widget falls back to polling)"
        }
    );
    println!("relay.channel_prefix   = {}", config.relay.channel_prefix);
    println!("flow.enabled           = {}", config.flow.enabled);
    println!(
        "flow.operator_window   = {}s",
        config.flow.operator_window_secs
    );
    println!("flow.state_ttl_days    = {}", config.flow.state_ttl_days);
    println!("retention.sweep_days   = {}", config.retention.sweep_days);
}
