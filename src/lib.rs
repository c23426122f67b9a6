//! llm-proxy - one HTTP gateway in front of many LLM chat-completion providers
//!
//! Requests arrive in a canonical OpenAI-style shape, are translated for the
//! selected provider, and come back as a canonical response.

pub mod chat;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod providers;
pub mod service;
pub mod telemetry;
