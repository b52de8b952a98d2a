// SPDX-FileCopyrightText: 2026 Chatrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the chatrelay server.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level chatrelay configuration.
///
/// Every section is optional and defaults to the values the relay ships with.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatrelayConfig {
    /// Listener, CORS and logging settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Completion API settings.
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Outbound queue and retry settings.
    #[serde(default)]
    pub dispatcher: DispatcherConfig,

    /// Message log settings.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// HTTP/WebSocket listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Browser origin allowed by CORS.
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,

    /// Number of past messages sent to a client when it connects.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
            history_limit: default_history_limit(),
            log_level: default_log_level(),
        }
    }
}

impl ServerConfig {
    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

fn default_history_limit() -> usize {
    500
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Completion endpoint configuration (OpenAI-compatible chat completions).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CompletionConfig {
    /// API key. `None` falls back to the `OPENAI_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Full URL of the chat-completions endpoint.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model identifier sent with every request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Output-length cap per reply.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Fixed system instruction sent with every request.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            system_prompt: default_system_prompt(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl CompletionConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_max_tokens() -> u32 {
    150
}

fn default_system_prompt() -> String {
    "Respond as if you are talking to a software professional with around 2 years of experience."
        .to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Which inbound messages get a generated reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyPolicyKind {
    /// Every human message.
    #[default]
    All,
    /// Only messages from `reply_senders`.
    Senders,
    /// Pure relay, no replies.
    None,
}

/// Outbound queue, backoff and cool-down configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DispatcherConfig {
    /// Pause between two consecutive jobs, in milliseconds.
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    /// Backoff unit; attempt `n` waits `backoff_base_ms * 2^n`.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Completion attempts per job before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default)]
    pub reply_policy: ReplyPolicyKind,

    /// Senders that get replies when `reply_policy = "senders"`.
    #[serde(default)]
    pub reply_senders: Vec<String>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: default_cooldown_ms(),
            backoff_base_ms: default_backoff_base_ms(),
            max_attempts: default_max_attempts(),
            reply_policy: ReplyPolicyKind::default(),
            reply_senders: Vec::new(),
        }
    }
}

impl DispatcherConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }
}

fn default_cooldown_ms() -> u64 {
    2000
}

fn default_backoff_base_ms() -> u64 {
    1000
}

fn default_max_attempts() -> u32 {
    5
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("chatrelay").join("messages.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("messages.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}
