//! Chat Relay Gateway
//!
//! Serves the chat WebSocket, the bundled chat page and `/health`.

use chat_relay::agent::CompletionClient;
use chat_relay::config::{self, AnswerMode, Config};
use chat_relay::gateway::{self, AppState, Gateway};
use chat_relay::logging::init_logging;
use chat_relay::provider::ProfileFactory;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "chat-relay-gateway", version = chat_relay::VERSION, about = "Chat Relay WebSocket gateway")]
struct Args {
    /// Config file (defaults to the standard config location)
    #[arg(long, short, env = "CHAT_RELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Bind address
    #[arg(long)]
    bind: Option<String>,

    /// Port
    #[arg(long, short)]
    port: Option<u16>,

    /// Answer profile (window or retrieval)
    #[arg(long)]
    mode: Option<AnswerMode>,
}

fn load(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => config::load_layered_config(path)?,
        None => Config::from_env()?,
    };

    if let Some(bind) = &args.bind {
        config.gateway.bind = bind.clone();
    }
    if let Some(port) = args.port {
        config.gateway.port = port;
    }
    if let Some(mode) = args.mode {
        config.answer.mode = mode;
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load(&args)?;
    let _log_guard = init_logging(&config.log)?;

    info!("Starting Chat Relay v{}", chat_relay::VERSION);

    let validation = config::validate_config(&config);
    for issue in &validation.warnings {
        warn!("Config: {}", issue);
    }
    validation.into_result()?;

    let client = CompletionClient::new(config.provider.clone())?;
    let factory = ProfileFactory::from_config(&config, client.clone())?;
    info!(
        "Answer profile: {} (model {})",
        factory.mode(),
        client.model()
    );

    let gateway = Gateway::new(Arc::new(factory), &config.gateway);
    let state = AppState::new(gateway, config.answer.mode).with_client(client);
    let app = gateway::router(state, &config.gateway.path);

    let addr: SocketAddr = format!("{}:{}", config.gateway.bind, config.gateway.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    gateway::serve(listener, app, gateway::shutdown_signal()).await?;

    info!("Gateway stopped");
    Ok(())
}
