//! Configuration management for llm-proxy
//!
//! Parses TOML configuration files and provides typed access to settings.
//! Only `[server]` is required; every other section falls back to defaults.

use crate::error::{AppError, AppResult};
use crate::providers::{PollPolicy, ProviderId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Upper bound for the per-request timeout
pub const MAX_REQUEST_TIMEOUT_SECONDS: u64 = 300;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    #[serde(default)]
    pub providers: HashMap<ProviderId, ProviderOverride>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_request_timeout() -> u64 {
    90
}

/// Status polling for asynchronous providers
///
/// Validated at deserialization time: both values must be positive, so an
/// invalid instance never exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PollingConfig {
    interval_ms: u64,
    max_attempts: u32,
}

impl PollingConfig {
    /// Create a validated polling configuration
    ///
    /// # Errors
    ///
    /// Returns an error if either value is zero.
    pub fn new(interval_ms: u64, max_attempts: u32) -> AppResult<Self> {
        if interval_ms == 0 {
            return Err(AppError::Config(
                "polling.interval_ms must be greater than 0".to_string(),
            ));
        }
        if max_attempts == 0 {
            return Err(AppError::Config(
                "polling.max_attempts must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            interval_ms,
            max_attempts,
        })
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn policy(&self) -> PollPolicy {
        PollPolicy::new(Duration::from_millis(self.interval_ms), self.max_attempts)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: PollPolicy::DEFAULT_INTERVAL.as_millis() as u64,
            max_attempts: PollPolicy::DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl<'de> Deserialize<'de> for PollingConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(deny_unknown_fields)]
        struct RawPollingConfig {
            interval_ms: Option<u64>,
            max_attempts: Option<u32>,
        }

        let raw = RawPollingConfig::deserialize(deserializer)?;
        let defaults = PollingConfig::default();
        PollingConfig::new(
            raw.interval_ms.unwrap_or(defaults.interval_ms),
            raw.max_attempts.unwrap_or(defaults.max_attempts),
        )
        .map_err(|e| serde::de::Error::custom(format!("Invalid polling configuration: {}", e)))
    }
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Per-provider overrides (`[providers.<id>]`)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_key_env: Option<String>,
}

impl ProviderOverride {
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn api_key_env(&self) -> Option<&str> {
        self.api_key_env.as_deref()
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        // Phase 1: read
        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| {
            AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            }
        })?;

        // Phase 2: parse
        let config: Self =
            toml::from_str(&content).map_err(|source| AppError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            })?;

        // Phase 3: validate
        config
            .validate()
            .map_err(|e| AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Validate configuration after parsing
    ///
    /// Called by `from_file()` and `from_str()`; call it explicitly when
    /// building a `Config` by hand.
    pub fn validate(&self) -> AppResult<()> {
        if self.server.host.trim().is_empty() {
            return Err(AppError::Config(
                "server.host must not be empty".to_string(),
            ));
        }

        if self.server.request_timeout_seconds == 0 {
            return Err(AppError::Config(
                "server.request_timeout_seconds must be greater than 0".to_string(),
            ));
        }
        if self.server.request_timeout_seconds > MAX_REQUEST_TIMEOUT_SECONDS {
            return Err(AppError::Config(format!(
                "server.request_timeout_seconds cannot exceed {} seconds, got {}",
                MAX_REQUEST_TIMEOUT_SECONDS, self.server.request_timeout_seconds
            )));
        }

        // The last status check must be reachable before the request times out
        let poll_budget_ms = self
            .polling
            .interval_ms()
            .saturating_mul(u64::from(self.polling.max_attempts().saturating_sub(1)));
        let timeout_ms = self.server.request_timeout_seconds.saturating_mul(1000);
        if poll_budget_ms >= timeout_ms {
            return Err(AppError::Config(format!(
                "polling.interval_ms * (polling.max_attempts - 1) = {} ms must be less than \
                 server.request_timeout_seconds ({} ms)",
                poll_budget_ms, timeout_ms
            )));
        }

        for (provider, overrides) in &self.providers {
            if let Some(base_url) = overrides.base_url()
                && !base_url.starts_with("http://")
                && !base_url.starts_with("https://")
            {
                return Err(AppError::Config(format!(
                    "providers.{}.base_url '{}' must start with 'http://' or 'https://'",
                    provider, base_url
                )));
            }
            if let Some(env_var) = overrides.api_key_env()
                && env_var.trim().is_empty()
            {
                return Err(AppError::Config(format!(
                    "providers.{}.api_key_env must not be empty",
                    provider
                )));
            }
        }

        Ok(())
    }

    /// Upper bound on one chat request, including any status polling
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_seconds)
    }

    pub fn poll_policy(&self) -> PollPolicy {
        self.polling.policy()
    }

    /// Base URL for `provider`, honoring `[providers.<id>].base_url`
    pub fn base_url_for(&self, provider: ProviderId) -> &str {
        self.providers
            .get(&provider)
            .and_then(ProviderOverride::base_url)
            .unwrap_or_else(|| provider.default_base_url())
    }

    /// Environment variable holding `provider`'s API key
    pub fn api_key_env_for(&self, provider: ProviderId) -> &str {
        self.providers
            .get(&provider)
            .and_then(ProviderOverride::api_key_env)
            .unwrap_or_else(|| provider.default_api_key_env())
    }
}

impl FromStr for Config {
    type Err = AppError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Config =
            toml::from_str(toml_str).map_err(|source| AppError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_CONFIG: &str = r#"
[server]
host = "0.0.0.0"
port = 3000
request_timeout_seconds = 60

[polling]
interval_ms = 500
max_attempts = 10

[observability]
log_level = "debug"

[providers.ollama]
base_url = "http://gpu-box:11434"

[providers.openai]
api_key_env = "MY_OPENAI_KEY"
"#;

    const MINIMAL_CONFIG: &str = r#"
[server]
host = "127.0.0.1"
port = 8080
"#;

    #[test]
    fn test_config_from_str_parses_successfully() {
        let config = Config::from_str(TEST_CONFIG).expect("should parse config");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.request_timeout_seconds, 60);
        assert_eq!(config.observability.log_level, "debug");
    }

    #[test]
    fn test_config_parses_polling() {
        let config = Config::from_str(TEST_CONFIG).unwrap();
        let policy = config.poll_policy();
        assert_eq!(policy.interval(), Duration::from_millis(500));
        assert_eq!(policy.max_attempts(), 10);
    }

    #[test]
    fn test_config_provider_overrides() {
        let config = Config::from_str(TEST_CONFIG).unwrap();
        assert_eq!(
            config.base_url_for(ProviderId::Ollama),
            "http://gpu-box:11434"
        );
        assert_eq!(config.api_key_env_for(ProviderId::OpenAi), "MY_OPENAI_KEY");
        // unset fields fall back to provider defaults
        assert_eq!(
            config.base_url_for(ProviderId::OpenAi),
            "https://api.openai.com/v1"
        );
        assert_eq!(config.api_key_env_for(ProviderId::Groq), "GROQ_API_KEY");
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::from_str(MINIMAL_CONFIG).unwrap();
        assert_eq!(config.server.request_timeout_seconds, 90);
        assert_eq!(config.polling, PollingConfig::default());
        assert_eq!(config.poll_policy(), PollPolicy::default());
        assert_eq!(config.observability.log_level, "info");
        assert!(config.providers.is_empty());
    }

    #[test]
    fn test_missing_server_section_fails() {
        let err = Config::from_str("[observability]\nlog_level = \"info\"").unwrap_err();
        assert!(matches!(err, AppError::ConfigParseFailed { .. }));
    }

    #[test]
    fn test_unknown_provider_section_fails() {
        let toml = format!("{}\n[providers.mistral]\nbase_url = \"https://x\"\n", MINIMAL_CONFIG);
        let err = Config::from_str(&toml).unwrap_err();
        assert!(matches!(err, AppError::ConfigParseFailed { .. }));
    }

    #[test]
    fn test_config_validation_zero_timeout_fails() {
        let toml = MINIMAL_CONFIG.replace("port = 8080", "port = 8080\nrequest_timeout_seconds = 0");
        let err = Config::from_str(&toml).unwrap_err();
        assert!(err.to_string().contains("greater than 0"));
    }

    #[test]
    fn test_config_validation_excessive_timeout_fails() {
        let toml =
            MINIMAL_CONFIG.replace("port = 8080", "port = 8080\nrequest_timeout_seconds = 301");
        let err = Config::from_str(&toml).unwrap_err();
        assert!(err.to_string().contains("cannot exceed 300"));

        let toml =
            MINIMAL_CONFIG.replace("port = 8080", "port = 8080\nrequest_timeout_seconds = 300");
        assert!(Config::from_str(&toml).is_ok());
    }

    #[test]
    fn test_polling_zero_values_rejected_at_parse_time() {
        for section in ["[polling]\ninterval_ms = 0", "[polling]\nmax_attempts = 0"] {
            let toml = format!("{}\n{}\n", MINIMAL_CONFIG, section);
            let err = Config::from_str(&toml).unwrap_err();
            assert!(
                matches!(err, AppError::ConfigParseFailed { .. }),
                "section {:?} should fail to parse",
                section
            );
        }
    }

    #[test]
    fn test_polling_budget_must_fit_request_timeout() {
        // 2000 ms * 99 intervals outlasts the default 90 s timeout
        let toml = format!("{}\n[polling]\nmax_attempts = 100\n", MINIMAL_CONFIG);
        let err = Config::from_str(&toml).unwrap_err();
        assert!(matches!(err, AppError::Config(_)), "got {:?}", err);
        assert!(err.to_string().contains("polling.max_attempts"));

        // 2000 ms * 44 = 88 s still leaves room
        let toml = format!("{}\n[polling]\nmax_attempts = 45\n", MINIMAL_CONFIG);
        assert!(Config::from_str(&toml).is_ok());
    }

    #[test]
    fn test_polling_partial_section_keeps_other_default() {
        let toml = format!("{}\n[polling]\nmax_attempts = 5\n", MINIMAL_CONFIG);
        let config = Config::from_str(&toml).unwrap();
        assert_eq!(config.polling.interval_ms(), 2000);
        assert_eq!(config.polling.max_attempts(), 5);
    }

    #[test]
    fn test_provider_base_url_scheme_validated() {
        let toml = format!(
            "{}\n[providers.ollama]\nbase_url = \"localhost:11434\"\n",
            MINIMAL_CONFIG
        );
        let err = Config::from_str(&toml).unwrap_err();
        assert!(err.to_string().contains("providers.ollama.base_url"));
    }

    #[test]
    fn test_provider_empty_env_var_rejected() {
        let toml = format!(
            "{}\n[providers.groq]\napi_key_env = \"  \"\n",
            MINIMAL_CONFIG
        );
        let err = Config::from_str(&toml).unwrap_err();
        assert!(err.to_string().contains("providers.groq.api_key_env"));
    }

    #[test]
    fn test_polling_config_new_validates() {
        assert!(PollingConfig::new(0, 1).is_err());
        assert!(PollingConfig::new(1, 0).is_err());
        let polling = PollingConfig::new(250, 4).unwrap();
        assert_eq!(polling.policy(), PollPolicy::new(Duration::from_millis(250), 4));
    }
}
