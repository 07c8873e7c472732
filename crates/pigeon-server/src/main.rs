use std::io;
use std::path::PathBuf;

use clap::Parser;
use pigeon_config::Config;
use pigeon_gateway::{Gateway, GatewayConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod push;
mod server;
mod state;

use server::run_server;
use state::AppState;

#[derive(Parser, Debug, Clone)]
#[command(name = "pigeon-server")]
#[command(about = "Pigeon WebSocket relay server")]
#[command(version)]
struct Cli {
    /// Enable debug mode
    #[arg(long, env = "DEBUG", default_value = "false")]
    debug: bool,

    /// HTTP port (overrides config)
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Gateway bind address (overrides config)
    #[arg(long, env = "PIGEON_GATEWAY_BIND")]
    gateway_bind: Option<String>,

    /// Log level (overrides config)
    #[arg(long, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Config file path
    #[arg(long, env = "PIGEON_CONFIG", default_value = "~/.pigeon/config.json")]
    config: String,

    /// Disable the periodic clock push
    #[arg(long, default_value = "false")]
    no_push: bool,
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let cli = Cli::parse();

    let config_path = pigeon_config::expand_tilde(&cli.config)
        .unwrap_or_else(|| PathBuf::from(&cli.config));

    let config = match Config::load(&config_path).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config from {:?}: {}", config_path, e);
            std::process::exit(1);
        }
    };

    // CLI overrides config, config overrides defaults
    let log_level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| {
            if cli.debug {
                "debug".to_string()
            } else {
                config.logging.level.as_str().to_string()
            }
        });
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&log_level))
        .init();

    let port = cli.port.unwrap_or(config.server.port);
    let gateway_bind = cli
        .gateway_bind
        .clone()
        .unwrap_or_else(|| config.gateway.bind.clone());

    info!("Starting pigeon-server");
    info!("  HTTP: {}:{}", config.server.host, port);
    info!("  Gateway: ws://{}{}", gateway_bind, pigeon_gateway::ENDPOINT_PREFIX);
    info!("  Max connections: {}", config.gateway.max_connections);
    info!(
        "  Clock push: {}",
        config.push.enabled && !cli.no_push
    );

    let gateway = Gateway::new(GatewayConfig {
        bind: gateway_bind,
        max_connections: config.gateway.max_connections,
    });
    let router = gateway.router().clone();

    let gateway_task = gateway.clone();
    tokio::spawn(async move {
        if let Err(e) = gateway_task.run().await {
            error!("Gateway error: {}", e);
        }
    });

    if config.push.enabled && !cli.no_push {
        tokio::spawn(push::run_clock_pusher(router.clone(), config.push.clone()));
    }

    run_server(AppState::new(router), &config.server.host, port).await
}
