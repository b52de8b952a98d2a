// SPDX-FileCopyrightText: 2026 Chatrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the chatrelay configuration system.

use chatrelay_config::diagnostic::ConfigError;
use chatrelay_config::model::{ChatrelayConfig, ReplyPolicyKind};
use chatrelay_config::{
    load_and_validate, load_and_validate_path, load_and_validate_str, load_config,
    load_config_from_str,
};
use figment::Jail;

/// Valid TOML with every known field deserializes successfully.
#[test]
fn valid_toml_deserializes_into_config() {
    let toml = r#"
[server]
host = "0.0.0.0"
port = 8080
cors_origin = "https://chat.example.com"
history_limit = 50
log_level = "debug"

[completion]
api_key = "sk-test"
base_url = "http://localhost:9999/v1/chat/completions"
model = "gpt-4o-mini"
max_tokens = 64
system_prompt = "Be brief."
request_timeout_secs = 5

[dispatcher]
cooldown_ms = 500
backoff_base_ms = 250
max_attempts = 3
reply_policy = "senders"
reply_senders = ["ana@example.com"]

[storage]
database_path = "/tmp/chat.db"
wal_mode = false
"#;

    let config = load_and_validate_str(toml).expect("valid TOML should load");
    assert_eq!(config.server.bind_addr(), "0.0.0.0:8080");
    assert_eq!(config.server.cors_origin, "https://chat.example.com");
    assert_eq!(config.server.history_limit, 50);
    assert_eq!(config.completion.api_key.as_deref(), Some("sk-test"));
    assert_eq!(config.completion.model, "gpt-4o-mini");
    assert_eq!(config.completion.max_tokens, 64);
    assert_eq!(config.completion.system_prompt, "Be brief.");
    assert_eq!(config.dispatcher.cooldown_ms, 500);
    assert_eq!(config.dispatcher.max_attempts, 3);
    assert_eq!(config.dispatcher.reply_policy, ReplyPolicyKind::Senders);
    assert_eq!(config.dispatcher.reply_senders, vec!["ana@example.com"]);
    assert_eq!(config.storage.database_path, "/tmp/chat.db");
    assert!(!config.storage.wal_mode);
}

/// An empty file yields the shipped defaults.
#[test]
fn empty_toml_yields_defaults() {
    let config = load_config_from_str("").expect("empty TOML should load");
    let defaults = ChatrelayConfig::default();
    assert_eq!(config.server.port, defaults.server.port);
    assert_eq!(config.dispatcher.cooldown_ms, 2000);
    assert_eq!(config.dispatcher.backoff_base_ms, 1000);
    assert_eq!(config.completion.max_tokens, 150);
}

/// A partial section keeps defaults for the keys it leaves out.
#[test]
fn partial_section_keeps_other_defaults() {
    let config = load_config_from_str("[server]\nport = 4000\n").unwrap();
    assert_eq!(config.server.port, 4000);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.cors_origin, "http://localhost:3000");
}

/// A misspelled key is reported with a suggestion and a source span.
#[test]
fn unknown_key_gets_suggestion() {
    let toml = "[dispatcher]\ncooldwon_ms = 10\n";
    let errors = load_and_validate_str(toml).expect_err("typo should be rejected");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key,
            suggestion,
            valid_keys,
            span,
            ..
        } => {
            assert_eq!(key, "cooldwon_ms");
            assert_eq!(suggestion.as_deref(), Some("cooldown_ms"));
            assert!(valid_keys.contains("max_attempts"));
            assert!(span.is_some(), "inline source should yield a span");
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

/// Unknown top-level section is rejected.
#[test]
fn unknown_section_is_rejected() {
    let errors = load_and_validate_str("[telegram]\nbot_token = \"x\"\n").unwrap_err();
    assert!(matches!(&errors[0], ConfigError::UnknownKey { key, .. } if key == "telegram"));
}

/// Wrong value types surface as InvalidType.
#[test]
fn wrong_type_is_reported() {
    let errors = load_and_validate_str("[server]\nport = \"abc\"\n").unwrap_err();
    match &errors[0] {
        ConfigError::InvalidType { key, .. } => assert_eq!(key, "server.port"),
        other => panic!("expected InvalidType, got {other:?}"),
    }
}

/// An unknown reply policy name is rejected at deserialization.
#[test]
fn unknown_reply_policy_is_rejected() {
    assert!(load_and_validate_str("[dispatcher]\nreply_policy = \"some\"\n").is_err());
}

/// Semantic checks run after deserialization.
#[test]
fn validation_errors_are_collected() {
    let toml = r#"
[server]
port = 0
cors_origin = "localhost"

[dispatcher]
max_attempts = 0
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert_eq!(errors.len(), 3);
    assert!(
        errors
            .iter()
            .all(|e| matches!(e, ConfigError::Validation { .. }))
    );
}

/// Env vars override file values using the section mapping.
#[test]
fn env_overrides_local_file() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "chatrelay.toml",
            "[server]\nport = 4000\n\n[dispatcher]\nmax_attempts = 2\n",
        )?;
        jail.set_env("CHATRELAY_SERVER_PORT", "5000");
        jail.set_env("CHATRELAY_DISPATCHER_COOLDOWN_MS", "100");

        let config = load_config()?;
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.dispatcher.max_attempts, 2);
        assert_eq!(config.dispatcher.cooldown_ms, 100);
        Ok(())
    });
}

/// `load_and_validate` picks up `./chatrelay.toml`.
#[test]
fn load_and_validate_reads_local_file() {
    Jail::expect_with(|jail| {
        jail.create_file("chatrelay.toml", "[server]\nlog_level = \"debug\"\n")?;
        let config = load_and_validate().expect("local file should be valid");
        assert_eq!(config.server.log_level, "debug");
        Ok(())
    });
}

/// An explicit path that does not exist is an error, not silent defaults.
#[test]
fn missing_explicit_path_is_an_error() {
    let errors = load_and_validate_path(std::path::Path::new("/nonexistent/chatrelay.toml"))
        .expect_err("missing file should fail");
    assert!(matches!(&errors[0], ConfigError::Other(msg) if msg.contains("does not exist")));
}

/// An explicit file is loaded and validated.
#[test]
fn explicit_path_is_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("relay.toml");
    std::fs::write(&path, "[storage]\ndatabase_path = \"/tmp/x.db\"\n").unwrap();

    let config = load_and_validate_path(&path).unwrap();
    assert_eq!(config.storage.database_path, "/tmp/x.db");
}
