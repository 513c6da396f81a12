mod config;
mod render;
mod server;

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use venice_contracts::events::EventWriter;
use venice_contracts::images::InMemoryImageRegistry;
use venice_contracts::tools::tool_definitions;
use venice_engine::{default_backend_registry, ActionLinks, ToolDispatcher, VeniceSettings};

use crate::config::{ServeArgs, ServerConfig};

#[derive(Debug, Parser)]
#[command(
    name = "venice-mcp",
    version,
    about = "Venice image generation tool server"
)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the tool-call protocol over HTTP.
    Serve(ServeArgs),
    /// Print the tool definitions as JSON and exit.
    Tools,
}

fn main() {
    match run() {
        Ok(()) => {}
        Err(err) => {
            eprintln!("venice-mcp error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Command::Serve(args) => run_serve(args),
        Command::Tools => {
            let rendered = serde_json::to_string_pretty(&tool_definitions())?;
            println!("{rendered}");
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose {
        "venice_mcp=debug,venice_engine=debug,venice_contracts=debug,info"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt().with_env_filter(filter).try_init().ok();
}

fn run_serve(args: ServeArgs) -> Result<()> {
    let config = ServerConfig::resolve(args, VeniceSettings::from_env());
    // The blocking HTTP client inside the backend must be built and dropped
    // outside the async runtime, so the dispatcher outlives it here.
    let dispatcher = Arc::new(build_dispatcher(&config)?);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let served = runtime.block_on(server::serve(&config, Arc::clone(&dispatcher)));
    drop(runtime);
    served
}

fn build_dispatcher(config: &ServerConfig) -> Result<ToolDispatcher> {
    let registry = default_backend_registry(config.venice.clone())?;
    let backend = registry.get(&config.backend).ok_or_else(|| {
        anyhow!(
            "unknown backend '{}' (available: {})",
            config.backend,
            registry.names().join(", ")
        )
    })?;
    if backend.name() == "venice" && config.venice.api_key.is_none() {
        warn!("VENICE_API_KEY is not set; generations will return placeholders");
    }
    info!(backend = backend.name(), public_url = %config.public_url, "backend selected");

    let mut dispatcher = ToolDispatcher::new(
        backend,
        Arc::new(InMemoryImageRegistry::new()),
        ActionLinks::new(config.public_url.clone()),
    );
    if let Some(path) = &config.events {
        let session_id = Uuid::new_v4().to_string();
        info!(path = %path.display(), session_id = %session_id, "journaling image events");
        dispatcher = dispatcher.with_events(EventWriter::open(path.clone(), session_id)?);
    }
    Ok(dispatcher)
}
