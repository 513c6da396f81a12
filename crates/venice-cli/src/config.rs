use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use venice_engine::VeniceSettings;

#[derive(Debug, Clone, Parser)]
pub struct ServeArgs {
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,
    #[arg(long, short = 'p', default_value_t = 8000)]
    pub port: u16,
    /// Venice API key; falls back to VENICE_API_KEY.
    #[arg(long, short = 'k')]
    pub api_key: Option<String>,
    /// Venice API base URL; falls back to VENICE_API_BASE.
    #[arg(long)]
    pub api_base: Option<String>,
    /// Externally reachable base URL used for approve/regenerate links.
    #[arg(long)]
    pub public_url: Option<String>,
    #[arg(long, default_value = "venice")]
    pub backend: String,
    #[arg(long, default_value_t = 60)]
    pub timeout_secs: u64,
    /// Append image lifecycle events to this JSONL file.
    #[arg(long)]
    pub events: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub backend: String,
    pub public_url: String,
    pub events: Option<PathBuf>,
    pub venice: VeniceSettings,
}

impl ServerConfig {
    /// Resolves CLI flags over environment defaults.
    pub fn resolve(args: ServeArgs, env: VeniceSettings) -> Self {
        let public_url = args
            .public_url
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| format!("http://{}:{}", display_host(&args.host), args.port));
        let venice = VeniceSettings {
            api_base: non_empty(args.api_base).unwrap_or(env.api_base),
            api_key: non_empty(args.api_key).or(env.api_key),
            timeout: Duration::from_secs(args.timeout_secs.max(1)),
        };
        Self {
            host: args.host,
            port: args.port,
            backend: args.backend.trim().to_ascii_lowercase(),
            public_url,
            events: args.events,
            venice,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn tools_list_url(&self) -> String {
        format!("{}/mcp/tools/list", self.public_url)
    }

    pub fn tools_call_url(&self) -> String {
        format!("{}/mcp/tools/call", self.public_url)
    }
}

fn display_host(host: &str) -> &str {
    match host {
        "0.0.0.0" | "::" | "[::]" => "localhost",
        other => other,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}
