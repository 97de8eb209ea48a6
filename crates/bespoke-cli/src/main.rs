//! `bespoke`: cliente de línea de comandos del coordinador.
use bespoke_adapters::coordinator::CoordinatorClient;
use bespoke_core::{Status, TransportError};
use bespoke_domain::{BespokeOptimizationSchema, DomainError};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum CliError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid input schema: {0}")]
    Schema(#[from] DomainError),
    #[error("request failed: {0}")]
    Transport(#[from] TransportError),
    #[error("unknown status '{0}' (expected waiting, running, success or errored)")]
    UnknownStatus(String),
}

#[derive(Parser, Debug)]
#[command(name = "bespoke", about = "Submit and inspect bespoke force-field fits")]
struct Cli {
    /// URL base del coordinador (por defecto BEFLOW_GATEWAY_HOST/PORT).
    #[arg(long, global = true)]
    url: Option<String>,

    /// Prefijo de rutas (por defecto BEFLOW_API_V1_STR o /api/v1).
    #[arg(long, global = true)]
    prefix: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Envía un esquema de optimización.
    Submit {
        #[arg(long)]
        input: PathBuf,
    },
    /// Muestra el estado completo de una tarea.
    Status { id: String },
    /// Lista tareas, opcionalmente filtradas por estado.
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long, default_value_t = 0)]
        skip: usize,
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },
    /// Sondea una tarea hasta que termine.
    Watch {
        id: String,
        #[arg(long, default_value_t = 2000)]
        interval_ms: u64,
    },
}

fn default_url() -> String {
    let host = std::env::var("BEFLOW_GATEWAY_HOST").unwrap_or_else(|_| "127.0.0.1".into());
    let port = std::env::var("BEFLOW_GATEWAY_PORT").unwrap_or_else(|_| "8000".into());
    format!("http://{host}:{port}")
}

fn default_prefix() -> String {
    std::env::var("BEFLOW_API_V1_STR").unwrap_or_else(|_| "/api/v1".into())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> Result<ExitCode, CliError> {
    let url = cli.url.unwrap_or_else(default_url);
    let prefix = cli.prefix.unwrap_or_else(default_prefix);
    let client = CoordinatorClient::new(&url, &prefix)?;

    match cli.command {
        Command::Submit { input } => {
            let raw = std::fs::read_to_string(&input).map_err(|source| CliError::Read { path: input.clone(),
                                                                                      source })?;
            let value: Value = serde_json::from_str(&raw)?;
            // Validación local antes de enviar; el servidor vuelve a validar.
            let schema: BespokeOptimizationSchema = serde_json::from_value(value.clone())?;
            schema.validate()?;
            let created = client.submit(value).await?;
            print_json(&created)?;
        }
        Command::Status { id } => {
            let view = client.get(&id).await?;
            print_json(&view)?;
        }
        Command::List { status, skip, limit } => {
            let status = match status {
                Some(raw) => Some(Status::parse(&raw).ok_or(CliError::UnknownStatus(raw))?),
                None => None,
            };
            let tasks = client.list(status, skip, limit).await?;
            for task in tasks {
                println!("{}\t{}\t{}", task.id, task.status, task.self_link);
            }
        }
        Command::Watch { id, interval_ms } => {
            let mut last: Option<Status> = None;
            loop {
                let view = client.get(&id).await?;
                if last != Some(view.status) {
                    let stages: Vec<String> = view.stages.iter().map(|s| format!("{}={}", s.kind, s.status)).collect();
                    println!("{} {} [{}]", view.id, view.status, stages.join(", "));
                    last = Some(view.status);
                }
                if view.status.is_terminal() {
                    if let Some(err) = view.stages.iter().find_map(|s| s.error.as_deref()) {
                        eprintln!("error: {err}");
                    }
                    if view.status == Status::Errored {
                        return Ok(ExitCode::from(2));
                    }
                    print_json(&view.results)?;
                    break;
                }
                tokio::time::sleep(Duration::from_millis(interval_ms)).await;
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
                             .with_writer(std::io::stderr)
                             .init();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("bespoke: {e}");
            ExitCode::FAILURE
        }
    }
}
