use std::collections::HashMap;
use std::io::Write;

use tempfile::NamedTempFile;

use super::*;
use crate::PortalError;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_default_config_is_valid() {
    let config = AppConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.polling.stop_timeout_seconds, 15);
    assert_eq!(config.completion.llama_model, "llama-3.1-8b-instant");
    assert_eq!(config.completion.deepseek_model, "deepseek-r1-distill-llama-70b");
}

#[test]
fn test_load_partial_file_keeps_defaults() {
    let file = write_config(
        r#"
[server]
bind_address = "127.0.0.1:8088"

[polling]
stop_timeout_seconds = 5
autostart = true
"#,
    );

    let config = AppConfig::load(file.path().to_str()).unwrap();
    assert_eq!(config.server.bind_address, "127.0.0.1:8088");
    assert_eq!(config.server.request_timeout_seconds, 120);
    assert_eq!(config.polling.stop_timeout_seconds, 5);
    assert!(config.polling.autostart);
    assert_eq!(config.polling.shutdown_check_interval_ms, 1000);
    assert_eq!(config.telegram.api_base_url, "https://api.telegram.org");
}

#[test]
fn test_load_missing_explicit_file_fails() {
    let result = AppConfig::load(Some("/definitely/not/here/portal.toml"));
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("配置文件不存在"));
}

#[test]
fn test_load_rejects_invalid_values() {
    let file = write_config(
        r#"
[polling]
shutdown_check_interval_ms = 0
"#,
    );

    assert!(AppConfig::load(file.path().to_str()).is_err());
}

#[test]
fn test_check_interval_must_be_shorter_than_stop_timeout() {
    let mut config = AppConfig::default();
    config.polling.shutdown_check_interval_ms = 20_000;
    config.polling.stop_timeout_seconds = 15;
    assert!(config.validate().is_err());
}

#[test]
fn test_validation_rejects_bad_fields() {
    let mut config = AppConfig::default();
    config.observability.log_format = "xml".to_string();
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.completion.deepseek_model = "  ".to_string();
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.telegram.api_base_url = "api.telegram.org".to_string();
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.server.bind_address = "localhost".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_from_toml_with_full_document() {
    let toml_str = AppConfig::default().to_toml().unwrap();
    let edited = toml_str.replace("autostart = false", "autostart = true");

    let config = AppConfig::from_toml(&edited).unwrap();
    assert!(config.polling.autostart);
}

#[test]
fn test_credentials_require_bot_token() {
    let env: HashMap<&str, &str> = HashMap::from([(COMPLETION_API_KEY_ENV, "gsk_test")]);
    let result = Credentials::from_lookup(|k| env.get(k).map(|v| v.to_string()));
    assert!(matches!(result, Err(PortalError::Configuration(_))));

    let env: HashMap<&str, &str> = HashMap::from([(BOT_TOKEN_ENV, "   ")]);
    let result = Credentials::from_lookup(|k| env.get(k).map(|v| v.to_string()));
    assert!(result.is_err());
}

#[test]
fn test_credentials_optional_api_key() {
    let env: HashMap<&str, &str> = HashMap::from([(BOT_TOKEN_ENV, "123:abc")]);
    let creds = Credentials::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
    assert_eq!(creds.bot_token, "123:abc");
    assert!(!creds.has_completion_key());

    let env: HashMap<&str, &str> =
        HashMap::from([(BOT_TOKEN_ENV, "123:abc"), (COMPLETION_API_KEY_ENV, "gsk_x")]);
    let creds = Credentials::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
    assert_eq!(creds.completion_api_key.as_deref(), Some("gsk_x"));
}

#[test]
fn test_credentials_debug_is_redacted() {
    let env: HashMap<&str, &str> =
        HashMap::from([(BOT_TOKEN_ENV, "123:secret"), (COMPLETION_API_KEY_ENV, "gsk_secret")]);
    let creds = Credentials::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
    let printed = format!("{creds:?}");
    assert!(!printed.contains("secret"));
}

#[test]
fn test_huge_stop_timeout_does_not_overflow() {
    let mut config = AppConfig::default();
    config.polling.stop_timeout_seconds = u64::MAX;
    assert!(config.validate().is_ok());

    config.polling.shutdown_check_interval_ms = u64::MAX;
    assert!(config.validate().is_err());
}
