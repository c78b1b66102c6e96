//! Rewriting edge proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────┐
//!                      │                   EDGE PROXY                     │
//!   Client Request     │  ┌─────────┐   ┌───────────┐   ┌────────────┐    │
//!   ───────────────────┼─▶│  axum   │──▶│ translate │──▶│ dispatcher │────┼──▶ Upstream
//!   (or function       │  │ server  │   │ (request) │   │ (reqwest)  │    │
//!    event on stdin)   │  └─────────┘   └───────────┘   └─────┬──────┘    │
//!                      │       ▲                              │           │
//!                      │       │        ┌───────────┐   ┌─────▼──────┐    │
//!   Client Response    │       └────────│ assemble  │◀──│  classify  │    │
//!   ◀──────────────────┼────────────────│ (response)│   │ + rewrite  │    │
//!                      │                └───────────┘   └────────────┘    │
//!                      │   any failure ──▶ 302 to fallback URL            │
//!                      └──────────────────────────────────────────────────┘
//! ```
//!
//! # Modes
//! - `serve` (default): HTTP server on the configured bind address
//! - `invoke`: read one function event JSON from stdin, print the response JSON
//! - `check-config`: validate a config file and exit

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;

use edge_proxy::config::{load_config, ProxyConfig};
use edge_proxy::http::{invoke, HttpServer, ProxyHandler};
use edge_proxy::lifecycle::{signals, Shutdown};
use edge_proxy::observability::logging::{init_logging, LogTarget};
use edge_proxy::observability::metrics;

#[derive(Parser)]
#[command(name = "edge-proxy")]
#[command(about = "Edge proxy that rewrites textual upstream responses", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Override listener.bind_address
        #[arg(long)]
        bind: Option<String>,

        /// Override upstream.target_host
        #[arg(long)]
        target_host: Option<String>,
    },
    /// Handle one function event read from stdin
    Invoke,
    /// Validate the configuration and exit
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    match cli.command.unwrap_or(Commands::Serve {
        bind: None,
        target_host: None,
    }) {
        Commands::Serve { bind, target_host } => serve(config, bind, target_host).await,
        Commands::Invoke => invoke_once(config).await,
        Commands::CheckConfig => {
            let rules = config.rewrite.rules.len();
            println!(
                "configuration OK: upstream {}://{}, {} rewrite rule(s), fallback {}",
                config.upstream.scheme, config.upstream.target_host, rules, config.fallback.url
            );
            Ok(())
        }
    }
}

async fn serve(
    mut config: ProxyConfig,
    bind: Option<String>,
    target_host: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(bind) = bind {
        config.listener.bind_address = bind;
    }
    if let Some(host) = target_host {
        config.upstream.target_host = host;
    }
    edge_proxy::config::validate_config(&config)
        .map_err(edge_proxy::config::ConfigError::Validation)?;

    init_logging(&config.observability, LogTarget::Stdout);
    tracing::info!("edge-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.target_host,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn invoke_once(config: ProxyConfig) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(&config.observability, LogTarget::Stderr);

    let mut raw_event = String::new();
    tokio::io::stdin().read_to_string(&mut raw_event).await?;

    let handler = ProxyHandler::new(config)?;
    let response = invoke(&handler, &raw_event).await;

    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}
