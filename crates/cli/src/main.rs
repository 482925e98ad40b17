mod config;
mod error;

use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use runtime::{Agent, ChatSession, GeminiBackend, ToolRegistry};
use tracing_subscriber::EnvFilter;

use config::{API_KEY_ENV, Config};
use error::Result;

const CONFIG_FILE: &str = "deckhand.toml";

#[derive(Parser)]
#[command(name = "deckhand")]
#[command(about = "A terminal agent that can read, list, and edit local files", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Override the configured model
    #[arg(short, long)]
    model: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat session
    Chat,
    /// List the tools offered to the model
    Tools,
}

#[tokio::main]
async fn main() {
    init_logging();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(io::stderr)
        .init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let tools = ToolRegistry::builtin()?;

    match cli.command {
        Some(Commands::Chat) | None => cmd_chat(&cli.config, cli.model, tools).await,
        Some(Commands::Tools) => {
            cmd_tools(&tools);
            Ok(())
        }
    }
}

async fn cmd_chat(config_path: &Path, model: Option<String>, tools: ToolRegistry) -> Result<()> {
    // A missing .env is fine; the key may come from the config or the shell.
    let _ = dotenvy::dotenv();

    let mut config = Config::load_or_default(config_path)?;
    if let Some(model) = model {
        config.backend.model = model;
    }
    let api_key = config.api_key(std::env::var(API_KEY_ENV).ok())?;

    let mut builder = GeminiBackend::builder(api_key, &config.backend.model)
        .max_tokens(config.backend.max_tokens);
    if let Some(system) = &config.agent.system_prompt {
        builder = builder.system(system);
    }
    let backend = builder.build();
    tracing::info!(%backend, tools = tools.len(), "starting chat session");

    let session = ChatSession::new(backend, tools.list());
    let mut agent = Agent::new(session, tools).with_color(io::stdout().is_terminal());

    println!(
        "=== Chat with {} (Ctrl+D or 'quit' to exit) ===",
        config.backend.model
    );
    agent.run(io::stdin().lock(), io::stdout()).await?;
    println!();
    Ok(())
}

fn cmd_tools(tools: &ToolRegistry) {
    for spec in tools.list() {
        println!("{}", spec.name);
        for line in spec.description.lines().filter(|l| !l.trim().is_empty()) {
            println!("    {}", line.trim());
        }
        for param in &spec.params {
            let required = if param.required { "required" } else { "optional" };
            println!(
                "    - {} ({:?}, {required}): {}",
                param.name, param.kind, param.description
            );
        }
        println!();
    }
}
