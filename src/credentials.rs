//! Provider credential resolution
//!
//! Credentials are resolved once at startup into an immutable
//! [`CredentialStore`]. Nothing else in the crate reads the environment.

use crate::config::Config;
use crate::providers::{AdapterCredential, ProviderId};
use std::collections::HashMap;

/// Resolved credentials keyed by provider
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    credentials: HashMap<ProviderId, AdapterCredential>,
    env_vars: HashMap<ProviderId, String>,
}

impl CredentialStore {
    /// Resolve every provider's API key from the process environment
    pub fn from_env(config: &Config) -> Self {
        Self::from_lookup(config, |name| std::env::var(name).ok())
    }

    /// Resolve credentials through `lookup`, which maps a variable name to
    /// its value
    ///
    /// Providers that need a key are absent from the store when the variable
    /// is unset or blank. Keyless providers are always present.
    pub fn from_lookup<F>(config: &Config, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut credentials = HashMap::new();
        let mut env_vars = HashMap::new();

        for provider in ProviderId::ALL {
            let env_var = config.api_key_env_for(provider).to_string();
            let api_key = lookup(&env_var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty());

            match (api_key, provider.requires_api_key()) {
                (Some(key), _) => {
                    credentials.insert(
                        provider,
                        AdapterCredential::new(key, config.base_url_for(provider)),
                    );
                }
                (None, false) => {
                    credentials.insert(
                        provider,
                        AdapterCredential::new("", config.base_url_for(provider)),
                    );
                }
                (None, true) => {
                    tracing::debug!(
                        provider = %provider,
                        env_var = %env_var,
                        "No API key configured"
                    );
                }
            }
            env_vars.insert(provider, env_var);
        }

        Self {
            credentials,
            env_vars,
        }
    }

    /// Credential for `provider`, if configured
    pub fn get(&self, provider: ProviderId) -> Option<&AdapterCredential> {
        self.credentials.get(&provider)
    }

    pub fn is_configured(&self, provider: ProviderId) -> bool {
        self.credentials.contains_key(&provider)
    }

    /// Variable consulted for `provider`'s key
    pub fn env_var(&self, provider: ProviderId) -> &str {
        self.env_vars
            .get(&provider)
            .map(String::as_str)
            .unwrap_or_else(|| provider.default_api_key_env())
    }

    /// Configured providers, in declaration order
    pub fn configured(&self) -> Vec<ProviderId> {
        ProviderId::ALL
            .into_iter()
            .filter(|p| self.is_configured(*p))
            .collect()
    }
}
