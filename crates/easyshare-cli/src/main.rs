// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// EasyShare — downloads bridge CLI.
//
// Entry point. Initialises logging, loads configuration, builds the channel
// for this platform and sends it one call.

mod cli;

use std::process::ExitCode;

use clap::Parser;
use easyshare_bridge::MethodResponse;
use easyshare_core::BridgeConfig;
use easyshare_core::error::Result;

use cli::Cli;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(response) => {
            println!("{}", response.to_json());
            if response.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "easyshare failed");
            println!("{}", MethodResponse::from_error(&e).to_json());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<MethodResponse> {
    let config = match &cli.config {
        Some(path) => BridgeConfig::load(path)?,
        None => BridgeConfig::default(),
    };
    let call = cli.command.to_method_call()?;
    let channel = easyshare_bridge::downloads_channel(&config)?;
    tracing::debug!(backend = ?channel.backend_name(), sdk_int = channel.sdk_int(), "channel built");
    Ok(channel.handle(&call))
}
