use super::*;

use std::{
    collections::HashMap,
    env, fs,
    time::{SystemTime, UNIX_EPOCH},
};

fn no_env(_: &str) -> Option<String> {
    None
}

fn temp_config_path(tag: &str) -> std::path::PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    env::temp_dir().join(format!("aid4all_client_config_{tag}_{suffix}.toml"))
}

#[test]
fn missing_file_and_env_yield_defaults() {
    let config = load_client_config_from(Path::new("/nonexistent/caregiver.toml"), no_env)
        .expect("config");
    assert_eq!(config, ClientConfig::default());
    assert_eq!(config.poll_interval, Duration::from_millis(5000));
    assert_eq!(config.feedback_ttl, Duration::from_millis(3000));
}

#[test]
fn default_urls_parse_to_local_hub_and_chat() {
    let config = ClientConfig::default();
    assert_eq!(config.base_url.as_str(), "http://127.0.0.1:5000/");
    assert_eq!(config.chat_url.as_str(), "http://127.0.0.1:8501/");
}

#[test]
fn env_overrides_file_values() {
    let path = temp_config_path("layering");
    fs::write(
        &path,
        "base_url = \"http://10.0.0.5:5000\"\npoll_interval_ms = 2000\n",
    )
    .expect("write config");

    let vars: HashMap<&str, &str> = [("AID4ALL_BASE_URL", "http://192.168.1.100:5000")]
        .into_iter()
        .collect();
    let config = load_client_config_from(&path, |key| vars.get(key).map(|v| v.to_string()))
        .expect("config");

    assert_eq!(config.base_url.as_str(), "http://192.168.1.100:5000/");
    assert_eq!(config.poll_interval, Duration::from_millis(2000));

    fs::remove_file(path).expect("cleanup");
}

#[test]
fn rejects_non_http_base_url() {
    let err = ClientConfig::default()
        .with_base_url("ftp://example.org")
        .expect_err("must fail");
    assert!(matches!(err, ConfigError::UnsupportedScheme { .. }));

    let err = ClientConfig::default()
        .with_base_url("not a url")
        .expect_err("must fail");
    assert!(matches!(err, ConfigError::InvalidUrl { .. }));
}

#[test]
fn invalid_poll_interval_env_is_ignored() {
    let config = load_client_config_from(Path::new("/nonexistent/caregiver.toml"), |key| {
        (key == "AID4ALL_POLL_INTERVAL_MS").then(|| "soon".to_string())
    })
    .expect("config");
    assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
}

#[test]
fn zero_poll_interval_in_file_is_ignored() {
    let path = temp_config_path("zero_interval");
    fs::write(&path, "poll_interval_ms = 0\nfeedback_ttl_ms = 1500\n").expect("write config");

    let config = load_client_config_from(&path, no_env).expect("config");
    assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
    assert_eq!(config.feedback_ttl, Duration::from_millis(1500));

    let config = load_client_config_from(&path, |key| {
        (key == "AID4ALL_POLL_INTERVAL_MS").then(|| "0".to_string())
    })
    .expect("config");
    assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);

    fs::remove_file(path).expect("cleanup");
}

#[test]
fn endpoint_keeps_base_path_prefix() {
    let config = ClientConfig::default()
        .with_base_url("http://hub.local/api")
        .expect("url");
    assert_eq!(
        config.endpoint("data").expect("join").as_str(),
        "http://hub.local/api/data"
    );
    assert_eq!(
        config.endpoint("/custom-message").expect("join").as_str(),
        "http://hub.local/api/custom-message"
    );

    let config = ClientConfig::default();
    assert_eq!(
        config.endpoint("action").expect("join").as_str(),
        "http://127.0.0.1:5000/action"
    );
}
