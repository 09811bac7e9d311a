// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// USSD Plus — desktop host for the native SMS bridge.
//
// Entry point. Initialises logging, parses the command line, and either
// seeds a fixture inbox or sends one method call through the channel.

mod services;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use ussdplus_core::BridgeConfig;
use ussdplus_core::error::Result;

use services::data_dir;
use services::host::{DesktopHost, describe_reply, seed_inbox};

#[derive(Debug, Parser)]
#[command(name = "ussdplus", version, about = "Drive the USSD Plus SMS bridge from a desktop inbox")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fill an inbox database with sample received messages.
    Seed {
        /// Inbox database (defaults to the data directory).
        #[arg(long)]
        inbox: Option<PathBuf>,
        /// Number of messages to add.
        #[arg(long, default_value_t = 150)]
        count: u32,
    },
    /// Send one method call over the SMS channel and print the reply.
    Call {
        /// Inbox database (defaults to the data directory).
        #[arg(long)]
        inbox: Option<PathBuf>,
        /// Method name to invoke.
        #[arg(long, default_value = "getSMS")]
        method: String,
        /// Answer permission checks with "denied".
        #[arg(long)]
        deny: bool,
        /// Accept the permission prompt a refused call raises, then retry once.
        #[arg(long)]
        accept_prompt: bool,
        /// JSON bridge configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "ussdplus failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<()> {
    match command {
        Command::Seed { inbox, count } => {
            let path = match inbox {
                Some(path) => path,
                None => data_dir::default_inbox()?,
            };
            let total = seed_inbox(&path, count)?;
            println!("{total} inbox messages in {}", path.display());
        }
        Command::Call {
            inbox,
            method,
            deny,
            accept_prompt,
            config,
        } => {
            let config = match config {
                Some(path) => BridgeConfig::load(path)?,
                None => BridgeConfig::default(),
            };
            let path = match inbox {
                Some(path) => path,
                None => data_dir::default_inbox()?,
            };
            let host = DesktopHost::open(&path, config, !deny)?;

            let reply = if accept_prompt {
                host.call_accepting_prompt(&method).await?
            } else {
                host.call(&method).await?
            };
            let output = describe_reply(&method, reply);
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}
