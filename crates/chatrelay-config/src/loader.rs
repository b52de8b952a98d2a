// SPDX-FileCopyrightText: 2026 Chatrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Lookup order: `/etc/chatrelay/chatrelay.toml`, then
//! `~/.config/chatrelay/chatrelay.toml`, then `./chatrelay.toml`, with
//! `CHATRELAY_` environment variables applied last.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ChatrelayConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/chatrelay/chatrelay.toml";

/// Config file in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "chatrelay.toml";

/// Sections recognised by the env var mapping. `CHATRELAY_<SECTION>_<KEY>`
/// maps to `<section>.<key>`.
const ENV_SECTIONS: &[&str] = &["server", "completion", "dispatcher", "storage"];

/// `~/.config/chatrelay/chatrelay.toml`, if a config dir exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("chatrelay").join("chatrelay.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/chatrelay/chatrelay.toml` (system-wide)
/// 3. `~/.config/chatrelay/chatrelay.toml` (user XDG config)
/// 4. `./chatrelay.toml` (local directory)
/// 5. `CHATRELAY_*` environment variables
pub fn load_config() -> Result<ChatrelayConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<ChatrelayConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ChatrelayConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ChatrelayConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ChatrelayConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for the XDG hierarchy, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ChatrelayConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Env provider with explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `CHATRELAY_DISPATCHER_MAX_ATTEMPTS` must become
/// `dispatcher.max_attempts`, not `dispatcher.max.attempts`.
fn env_provider() -> Env {
    Env::prefixed("CHATRELAY_").map(|key| map_env_key(key.as_str()).into())
}

/// `SERVER_PORT` -> `server.port`. Figment hands over the key with the
/// prefix stripped but its case intact.
fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("SERVER_PORT"), "server.port");
        assert_eq!(
            map_env_key("DISPATCHER_MAX_ATTEMPTS"),
            "dispatcher.max_attempts"
        );
        assert_eq!(map_env_key("COMPLETION_API_KEY"), "completion.api_key");
        assert_eq!(map_env_key("STORAGE_WAL_MODE"), "storage.wal_mode");
        assert_eq!(map_env_key("server_host"), "server.host");
    }

    #[test]
    fn unmapped_env_key_is_lowercased() {
        assert_eq!(map_env_key("VERBOSE"), "verbose");
    }

    #[test]
    fn env_override_alone_loads() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("CHATRELAY_SERVER_PORT", "5000");
            jail.set_env("CHATRELAY_DISPATCHER_MAX_ATTEMPTS", "3");
            let config = load_config()?;
            assert_eq!(config.server.port, 5000);
            assert_eq!(config.dispatcher.max_attempts, 3);
            Ok(())
        });
    }
}
