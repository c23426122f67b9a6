//! Command-line interface for llm-proxy

use clap::{Parser, Subcommand};

/// Single HTTP gateway in front of many LLM chat-completion providers
#[derive(Parser)]
#[command(name = "llm-proxy")]
#[command(version)]
#[command(about = "Single HTTP gateway in front of many LLM chat-completion providers")]
#[command(
    long_about = "llm-proxy accepts OpenAI-style chat requests, translates them for the \
    selected provider, and returns a normalized response. Provider API keys are read \
    from environment variables at startup."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# llm-proxy Configuration
# =======================
#
# Only [server] is required. API keys are never stored here; each provider
# reads its key from an environment variable at startup.

# ─────────────────────────────────────────────────────────────────────────────
# SERVER
# ─────────────────────────────────────────────────────────────────────────────

[server]
# IP address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "0.0.0.0"

# Port to listen on
port = 3000

# Upper bound for one chat request, including provider polling (1-300)
request_timeout_seconds = 90

# ─────────────────────────────────────────────────────────────────────────────
# POLLING (asynchronous providers such as Replicate)
# ─────────────────────────────────────────────────────────────────────────────

[polling]
# Delay between status checks
interval_ms = 2000

# Status checks before giving up
max_attempts = 30

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error"
# RUST_LOG takes precedence when set
log_level = "info"

# Prometheus metrics are always available at /metrics on the server port

# ─────────────────────────────────────────────────────────────────────────────
# PROVIDERS (optional overrides)
# ─────────────────────────────────────────────────────────────────────────────
#
# Default key variables:
#   openai       OPENAI_API_KEY
#   cohere       COHERE_API_KEY
#   groq         GROQ_API_KEY
#   corcel       CORCEL_API_KEY
#   huggingface  HUGGINGFACE_API_KEY
#   ollama       (no key)
#   anthropic    ANTHROPIC_API_KEY
#   replicate    REPLICATE_API_KEY
#   together     TOGETHER_API_KEY

# [providers.openai]
# base_url = "https://api.openai.com/v1"
# api_key_env = "OPENAI_API_KEY"

[providers.ollama]
base_url = "http://localhost:11434"
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::providers::ProviderId;
    use clap::CommandFactory;
    use std::str::FromStr;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn default_config_path() {
        let cli = Cli::parse_from(["llm-proxy"]);
        assert_eq!(cli.config, "config.toml");
        assert!(cli.command.is_none());
    }

    #[test]
    fn custom_config_path() {
        let cli = Cli::parse_from(["llm-proxy", "--config", "custom.toml"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn config_subcommand_with_output() {
        let cli = Cli::parse_from(["llm-proxy", "config", "-o", "my-config.toml"]);
        assert!(matches!(
            cli.command,
            Some(Command::Config { output: Some(ref path) }) if path == "my-config.toml"
        ));
    }

    #[test]
    fn template_loads_as_config() {
        let config = Config::from_str(generate_config_template())
            .expect("template should be a valid configuration");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.request_timeout_seconds, 90);
        assert_eq!(config.polling.max_attempts(), 30);
        assert_eq!(config.base_url_for(ProviderId::Ollama), "http://localhost:11434");
    }
}
