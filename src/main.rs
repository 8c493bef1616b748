//! HTTP request dump server
//!
//! Echoes every request back in wire format, as plain text or as a
//! highlighted, line-numbered HTML page, and serves a handful of demo
//! endpoints for exercising HTTP clients and proxies.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!                 │                    DUMP SERVER                        │
//!                 │                                                       │
//!   Request ──────┼─▶ routes ──┬─▶ gzip set ────┐                         │
//!                 │            └─▶ /nogzip set ─┴─▶ handlers              │
//!                 │                                  │                    │
//!                 │                ┌─────────────────┼──────────────┐     │
//!                 │                ▼                 ▼              ▼     │
//!                 │            snapshot          demo reply      stream   │
//!                 │                │                                │     │
//!                 │                ▼                                │     │
//!                 │        negotiate (raw / page)                   │     │
//!                 │                │                                │     │
//!                 │                ▼                                │     │
//!                 │   highlight → table → template                  │     │
//!                 │                │                                │     │
//!   Response ◀────┼────────────────┴────────────────────────────────┘     │
//!                 │                                                       │
//!                 │   config · assets · logging · lifecycle                │
//!                 └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::Parser;
use tokio::net::TcpListener;

use dump_request::lifecycle::signals::wait_for_signal;
use dump_request::lifecycle::startup::{resolve_config, Overrides};
use dump_request::observability::logging;
use dump_request::{HttpServer, Shutdown, VERSION};

#[derive(Parser, Debug)]
#[command(name = "dump-request", version, about = "HTTP request dump and demo server")]
struct Cli {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind [default: 0.0.0.0]
    #[arg(short, long)]
    listen: Option<String>,

    /// Port number to bind [default: 3000]
    #[arg(short, long)]
    port: Option<u16>,

    /// Timeout of reading request [default: 30s]
    #[arg(long, value_parser = humantime::parse_duration)]
    read_timeout: Option<Duration>,

    /// Timeout of writing response [default: 90s]
    #[arg(long, value_parser = humantime::parse_duration)]
    write_timeout: Option<Duration>,
}

impl From<Cli> for Overrides {
    fn from(cli: Cli) -> Self {
        Self {
            config_path: cli.config,
            listen: cli.listen,
            port: cli.port,
            read_timeout: cli.read_timeout,
            write_timeout: cli.write_timeout,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    let config = match resolve_config(&cli.into()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("dump-request: {}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init(&config.observability);

    tracing::info!(version = VERSION, "dump-request starting");
    tracing::info!(
        bind_address = %config.listener.bind_address(),
        read_timeout_ms = config.timeouts.read_ms,
        write_timeout_ms = config.timeouts.write_ms,
        "Configuration loaded"
    );

    let bind_address = config.listener.bind_address();

    let server = match HttpServer::new(config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return ExitCode::FAILURE;
        }
    };

    let listener = match TcpListener::bind(&bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(address = %bind_address, error = %e, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    if let Err(e) = server.run(listener, server_shutdown).await {
        tracing::error!(error = %e, "Server error");
        return ExitCode::FAILURE;
    }

    tracing::info!("Shutdown complete");
    ExitCode::SUCCESS
}
