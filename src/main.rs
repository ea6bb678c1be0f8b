//! ClawSearch - private meta-search gateway
//!
//! Exposes SearXNG behind an authenticated REST API with a response cache
//! that prefers Redis and falls back to process memory.

use anyhow::Context;
use clap::{Parser, Subcommand};
use clawsearch_core::GatewayConfig;
use clawsearch_infra::{init_logger, logger_config_from_env};
use clawsearch_serve::{AppState, GatewayServer};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "clawsearch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "ClawSearch - private meta-search REST gateway")]
#[command(long_about = r#"
ClawSearch forwards search requests to a SearXNG instance and caches the
normalized responses. Configuration is read from the environment:

  UPSTREAM_URL, API_KEYS, CACHE_TTL_SECONDS, EXTERNAL_STORE_URL,
  LISTEN_HOST, LISTEN_PORT, UPSTREAM_TIMEOUT_SECONDS,
  EXTERNAL_STORE_TIMEOUT_MS, CLAWSEARCH_LOG_LEVEL, CLAWSEARCH_LOG_JSON
"#)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP gateway (default)
    Serve {
        /// Host to bind, overrides LISTEN_HOST
        #[arg(long)]
        host: Option<String>,

        /// Port to bind, overrides LISTEN_PORT
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Probe SearXNG and the cache backend, then exit
    Health,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut log_config = logger_config_from_env();
    if cli.verbose {
        log_config.level = "debug".to_string();
    }
    init_logger(log_config).context("failed to initialize logging")?;

    let result = match cli.command.unwrap_or(Commands::Serve {
        host: None,
        port: None,
    }) {
        Commands::Serve { host, port } => handle_serve(host, port).await,
        Commands::Health => handle_health().await,
        Commands::Version => {
            println!("{}", clawsearch_core::version_info());
            Ok(())
        }
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}

fn load_config() -> anyhow::Result<GatewayConfig> {
    GatewayConfig::from_env().context("invalid configuration")
}

async fn handle_serve(host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let mut config = load_config()?;
    if let Some(host) = host {
        config.listen_host = host;
    }
    if let Some(port) = port {
        config.listen_port = port;
    }

    info!("ClawSearch {} starting", clawsearch_core::VERSION);
    let server = GatewayServer::new(config).context("failed to build server")?;
    server.start().await.context("server failed")?;
    Ok(())
}

async fn handle_health() -> anyhow::Result<()> {
    let config = load_config()?;
    let state = AppState::from_config(&config).context("failed to build service")?;
    let health = state.service.health().await;

    println!("{}", serde_json::to_string_pretty(&health)?);

    if health.status != "healthy" {
        anyhow::bail!("SearXNG is {:?}", health.searxng);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_overrides_parse() {
        let cli = Cli::try_parse_from(["clawsearch", "serve", "--host", "127.0.0.1", "-p", "9000"])
            .unwrap();
        match cli.command {
            Some(Commands::Serve { host, port }) => {
                assert_eq!(host.as_deref(), Some("127.0.0.1"));
                assert_eq!(port, Some(9000));
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_default_command_is_absent() {
        let cli = Cli::try_parse_from(["clawsearch"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }
}
