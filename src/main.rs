//! CLI entry point for apilink.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use apilink_core::{
    ApiClient, ApiResponse, CancellationToken, ClientConfig, Downloader, StorageRoot,
};

mod cli;

use cli::{ApiCommand, Args, Command};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // Logs go to stderr so stdout carries only the JSON result.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let mut config = ClientConfig::from_env().context("invalid environment configuration")?;
    args.apply_to(&mut config);
    debug!(?config, "effective configuration");

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling");
            on_signal.cancel();
        }
    });

    match args.command {
        Command::Download { base, path } => {
            let downloader = Downloader::new(&config.http, StorageRoot::new(&config.storage_root))?;
            let file = downloader.download(&base, &path, &cancel).await?;
            print_json(&file)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Api(command) => {
            let client = ApiClient::from_config(&config)
                .await
                .context("failed to set up transport")?;
            let succeeded = run_api_command(&client, command, &cancel).await?;
            Ok(if succeeded {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

/// Runs one CRUD command, prints its envelope, and reports whether it succeeded.
async fn run_api_command(
    client: &ApiClient,
    command: ApiCommand,
    cancel: &CancellationToken,
) -> Result<bool> {
    info!(transport = client.transport_name(), "calling API");
    match command {
        ApiCommand::List { params } => {
            let params: Vec<(&str, Value)> = params
                .iter()
                .map(|(k, v)| (k.as_str(), Value::String(v.clone())))
                .collect();
            emit(&client.list::<Value>(&params, cancel).await)
        }
        ApiCommand::Get { id } => emit(&client.fetch::<Value>(&id, cancel).await),
        ApiCommand::Create { json } => {
            let body = parse_body(&json)?;
            emit(&client.create::<Value, _>(&body, cancel).await)
        }
        ApiCommand::Replace { id, json } => {
            let body = parse_body(&json)?;
            emit(&client.replace::<Value, _>(&id, &body, cancel).await)
        }
        ApiCommand::Update { id, json } => {
            let body = parse_body(&json)?;
            emit(&client.update::<Value, _>(&id, &body, cancel).await)
        }
        ApiCommand::Delete { id } => emit(&client.delete(&id, cancel).await),
    }
}

fn parse_body(json: &str) -> Result<Value> {
    serde_json::from_str(json).context("--json is not valid JSON")
}

fn emit<T: Serialize>(response: &ApiResponse<T>) -> Result<bool> {
    print_json(response)?;
    Ok(response.is_success())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
