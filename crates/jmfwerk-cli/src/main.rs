// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// jmfwerk — submit JMF envelopes to a print workflow server.
//
// Entry point. Initialises logging, loads configuration, applies command-line
// overrides and hands the envelope to the dispatcher.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use jmfwerk_client::Dispatcher;
use jmfwerk_core::error::Result;
use jmfwerk_core::{ClientConfig, Envelope};

#[derive(Debug, Parser)]
#[command(name = "jmfwerk", version, about = "JMF job-messaging client")]
struct Cli {
    /// JSON configuration file.
    #[arg(long, short, global = true, env = "JMFWERK_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Submit a JMF envelope and print the server's response.
    Submit {
        /// Envelope XML file.
        envelope: PathBuf,
        /// Target URL (overrides `default_url`).
        #[arg(long, env = "JMFWERK_URL")]
        url: Option<String>,
        /// DeviceID to stamp on the envelope.
        #[arg(long)]
        device: Option<String>,
        /// Total attempts before giving up.
        #[arg(long)]
        attempts: Option<u32>,
        /// Per-attempt timeout in seconds.
        #[arg(long)]
        timeout: Option<u64>,
        /// Base directory for relative cid:// references.
        #[arg(long)]
        attachment_dir: Option<PathBuf>,
        /// Reset the envelope after each attempt.
        #[arg(long)]
        reinitialize: bool,
    },
    /// Print the effective configuration as JSON.
    Config,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "jmfwerk failed");
            eprintln!("error: {e}");
            if e.is_configuration() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };

    match cli.command {
        Command::Config => {
            println!("{}", config.to_json()?);
            Ok(())
        }
        Command::Submit {
            envelope,
            url,
            device,
            attempts,
            timeout,
            attachment_dir,
            reinitialize,
        } => {
            if let Some(attempts) = attempts {
                config.max_attempts = attempts;
            }
            if let Some(timeout) = timeout {
                config.timeout_secs = timeout;
            }
            if attachment_dir.is_some() {
                config.attachment_dir = attachment_dir;
            }

            let bytes = std::fs::read(&envelope)?;
            let mut message = Envelope::from_xml(&bytes)?;
            if let Some(device) = device {
                message.set_device(&device);
            }

            tracing::info!(
                envelope = %envelope.display(),
                message_type = message.message_type().unwrap_or("-"),
                "submitting"
            );
            let dispatcher = Dispatcher::new(config)?;
            let response = dispatcher.submit(&mut message, url.as_deref(), reinitialize)?;

            println!("ReturnCode: {}", response.return_code());
            if let Some(comment) = response.comment() {
                println!("Comment: {comment}");
            }
            Ok(())
        }
    }
}
