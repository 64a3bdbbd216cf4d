//! Chat Relay CLI
//!
//! Terminal chat client and configuration tooling.

use chat_relay::agent::{CompletionClient, GenerationOptions, Message};
use chat_relay::config::{self, Config};
use chat_relay::gateway::{ChatFrame, FrameType, Sender};
use chat_relay::{Error, Result, VERSION};
use clap::{Parser, Subcommand};
use console::style;
use futures::{SinkExt, StreamExt};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::AsyncBufReadExt;
use tokio_tungstenite::tungstenite::Message as WsMessage;

#[derive(Parser)]
#[command(
    name = "chat-relay",
    version = VERSION,
    about = "Chat Relay - talk to a relay gateway from the terminal",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with a running gateway
    Chat {
        /// WebSocket URL of the gateway
        #[arg(long, short, default_value = "ws://127.0.0.1:9000/chat")]
        url: String,
    },

    /// Load and validate configuration, then print any issues
    CheckConfig {
        /// Config file (defaults to the standard config location)
        #[arg(long, short, env = "CHAT_RELAY_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Write a default configuration file
    InitConfig {
        /// Destination (defaults to the standard config location)
        #[arg(long, short)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },

    /// Send one prompt straight to the completion service
    TestLlm {
        /// Model to test
        #[arg(short, long)]
        model: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Chat { url } => chat(&url).await,
        Commands::CheckConfig { config } => check_config(config),
        Commands::InitConfig { path, force } => init_config(path, force),
        Commands::TestLlm { model } => test_llm(model).await,
    }
}

// ============================================================================
// Chat
// ============================================================================

/// Render one server frame. Echoes are skipped since the user just typed them.
fn render(frame: &ChatFrame) {
    match (frame.sender, frame.kind) {
        (Sender::You, _) => {}
        (Sender::Bot, FrameType::Start) => {
            print!("{} ", style("Bot:").cyan().bold());
            let _ = std::io::stdout().flush();
        }
        (Sender::Bot, FrameType::Stream) => println!("{}", frame.message),
        (Sender::Bot, FrameType::End) => {
            println!();
            prompt();
        }
        (Sender::Bot, FrameType::Error) => {
            println!("{}", style(&frame.message).red());
            println!();
            prompt();
        }
    }
}

fn prompt() {
    print!("{} ", style("You:").green().bold());
    let _ = std::io::stdout().flush();
}

async fn chat(url: &str) -> Result<()> {
    let (socket, _) = tokio_tungstenite::connect_async(url)
        .await
        .map_err(|e| Error::Internal(format!("Failed to connect to {}: {}", url, e)))?;
    let (mut outbound, mut inbound) = socket.split();

    println!("{} {}", style("Connected to").dim(), style(url).cyan());
    println!("{}", style("Type a question and press Enter. Ctrl-D to quit.").dim());
    println!();

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            message = inbound.next() => match message {
                Some(Ok(WsMessage::Text(text))) => match serde_json::from_str::<ChatFrame>(text.as_str()) {
                    Ok(frame) => render(&frame),
                    Err(e) => eprintln!("{} {}", style("Unreadable frame:").yellow(), e),
                },
                Some(Ok(WsMessage::Close(_))) | None => {
                    println!("\n{}", style("Server closed the connection").dim());
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(Error::Internal(format!("Connection error: {}", e))),
            },
            line = lines.next_line() => match line? {
                Some(line) if line.trim().is_empty() => prompt(),
                Some(line) => {
                    outbound
                        .send(WsMessage::text(line))
                        .await
                        .map_err(|_| Error::ConnectionClosed)?;
                }
                None => {
                    let _ = outbound.close().await;
                    break;
                }
            },
        }
    }

    Ok(())
}

// ============================================================================
// Configuration
// ============================================================================

fn check_config(explicit: Option<PathBuf>) -> Result<()> {
    let path = explicit.clone().unwrap_or_else(config::config_path);
    let snapshot = config::read_config_snapshot(&path);

    println!("{}", style("Configuration").cyan().bold());
    println!("   File: {}", style(path.display()).cyan());
    if snapshot.exists {
        for issue in &snapshot.issues {
            println!("   {} {}", style("✗").red(), issue);
        }
    } else {
        println!("   {} Not found, using defaults and environment", style("ℹ").blue());
    }

    let config = match &explicit {
        Some(path) => config::load_layered_config(path)?,
        None => config::load_config()?,
    };
    println!("   Mode: {}", style(config.answer.mode).cyan());
    println!("   Model: {}", style(&config.provider.model).cyan());
    println!("   Listen: {}:{}{}", config.gateway.bind, config.gateway.port, config.gateway.path);
    println!();

    let result = config::validate_config(&config);
    for issue in &result.warnings {
        println!("   {} {}", style("⚠").yellow(), issue);
    }
    for issue in &result.errors {
        println!("   {} {}", style("✗").red(), issue);
    }

    if result.valid {
        println!("   {} Configuration is valid", style("✓").green());
        Ok(())
    } else {
        result.into_result()
    }
}

fn init_config(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = path.unwrap_or_else(config::config_path);
    if path.exists() && !force {
        return Err(Error::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    config::save_config(&Config::default(), &path)?;
    println!("   {} Wrote {}", style("✓").green(), style(path.display()).cyan());
    println!("   Set OPENAI_API_KEY (or provider.api_key_file) before starting the gateway.");
    Ok(())
}

async fn test_llm(model: Option<String>) -> Result<()> {
    let mut config = Config::from_env()?;
    if let Some(model) = model {
        config.provider.model = model;
    }
    config::validate_config(&config).into_result()?;

    let client = CompletionClient::new(config.provider)?;
    println!("Testing model: {}\n", client.model());

    let messages = vec![
        Message::system("You are a helpful assistant. Keep responses brief."),
        Message::user("Say 'Hello from Chat Relay!' in exactly those words."),
    ];
    let reply = client.complete(messages, GenerationOptions::precise()).await?;

    println!("Response: {}", reply);
    println!("\nTokens used: {}", client.total_tokens());
    println!("\n{} LLM test successful!", style("✓").green());
    Ok(())
}
