// SPDX-FileCopyrightText: 2026 Chatrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde attributes cannot express, such as a
//! non-zero port or a parseable CORS origin.

use crate::diagnostic::ConfigError;
use crate::model::{ChatrelayConfig, ReplyPolicyKind};

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &ChatrelayConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(validation("server.host must not be empty"));
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(validation(format!(
                "server.host `{host}` is not a valid IP address or hostname"
            )));
        }
    }

    if config.server.port == 0 {
        errors.push(validation("server.port must be between 1 and 65535"));
    }

    if !is_valid_origin(&config.server.cors_origin) {
        errors.push(validation(format!(
            "server.cors_origin `{}` must look like `http://host[:port]`",
            config.server.cors_origin
        )));
    }

    if config.completion.max_tokens == 0 {
        errors.push(validation("completion.max_tokens must be at least 1"));
    }

    if config.completion.base_url.trim().is_empty() {
        errors.push(validation("completion.base_url must not be empty"));
    }

    if config.dispatcher.max_attempts == 0 {
        errors.push(validation("dispatcher.max_attempts must be at least 1"));
    }

    if config.dispatcher.reply_policy == ReplyPolicyKind::Senders
        && config.dispatcher.reply_senders.is_empty()
    {
        errors.push(validation(
            "dispatcher.reply_senders must list at least one sender when reply_policy = \"senders\"",
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(validation("storage.database_path must not be empty"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validation(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}

/// A browser origin: scheme, host and optional port, nothing else.
fn is_valid_origin(origin: &str) -> bool {
    let Some((scheme, rest)) = origin.split_once("://") else {
        return false;
    };
    if scheme != "http" && scheme != "https" {
        return false;
    }
    let (host, port) = match rest.rsplit_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (rest, None),
    };
    if host.is_empty()
        || !host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return false;
    }
    port.is_none_or(|p| p.parse::<u16>().is_ok_and(|p| p != 0))
}
