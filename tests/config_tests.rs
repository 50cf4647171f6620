use std::collections::HashMap;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;
use triad::config::{ClientConfig, Config, RelayConfig};

#[test]
fn test_missing_file_yields_defaults() {
    let temp_dir = TempDir::new().expect("Failed to create temporary directory");
    let config = Config::load_from(&temp_dir.path().join("absent.toml"))
        .expect("missing config is not an error");

    assert_eq!(config, Config::default());
    assert_eq!(config.client.max_attempts, 3);
    assert_eq!(config.client.base_delay_ms, 1000);
    assert_eq!(config.client.max_input_chars, 5000);
    assert_eq!(config.relay.rate_limit_requests, 100);
    assert_eq!(config.relay.rate_limit_window_secs, 900);
}

#[test]
fn test_save_and_load_round_trip() {
    let temp_dir = TempDir::new().expect("Failed to create temporary directory");
    let path = temp_dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config.client.relay_url = "https://relay.example.com".to_string();
    config.client.max_delay_ms = Some(8000);
    config.relay.model = "gemini-pro".to_string();
    config.verbose_logging = true;
    config.save_to(&path).expect("Failed to save config");

    let loaded = Config::load_from(&path).expect("Failed to load config");
    assert_eq!(loaded, config);
    assert_eq!(
        loaded.client.retry_policy().max_delay,
        Some(Duration::from_millis(8000))
    );
}

#[test]
fn test_api_key_is_not_written_when_empty() {
    let temp_dir = TempDir::new().expect("Failed to create temporary directory");
    let path = temp_dir.path().join("config.toml");

    Config::default().save_to(&path).expect("Failed to save config");

    let content = fs::read_to_string(&path).expect("Failed to read config");
    assert!(!content.contains("api_key ="));
    assert!(content.contains("api_key_env = \"GEMINI_API_KEY\""));
}

#[test]
fn test_partial_file_fills_in_defaults() {
    let temp_dir = TempDir::new().expect("Failed to create temporary directory");
    let path = temp_dir.path().join("config.toml");
    fs::write(&path, "[client]\nmax_attempts = 5\n\n[relay]\nport = 8080\n")
        .expect("Failed to write config");

    let config = Config::load_from(&path).expect("Failed to load config");

    assert_eq!(config.client.max_attempts, 5);
    assert_eq!(config.client.base_delay_ms, ClientConfig::default().base_delay_ms);
    assert_eq!(config.relay.port, 8080);
    assert_eq!(config.relay.route, RelayConfig::default().route);
}

#[test]
fn test_invalid_toml_is_reported() {
    let temp_dir = TempDir::new().expect("Failed to create temporary directory");
    let path = temp_dir.path().join("config.toml");
    fs::write(&path, "[client\nmax_attempts = ").expect("Failed to write config");

    let error = Config::load_from(&path).expect_err("broken TOML must fail");
    assert!(error.to_string().contains("Invalid configuration file format"));
}

#[test]
fn test_zero_attempts_in_file_is_rejected() {
    let temp_dir = TempDir::new().expect("Failed to create temporary directory");
    let path = temp_dir.path().join("config.toml");
    fs::write(&path, "[client]\nmax_attempts = 0\n").expect("Failed to write config");

    let error = Config::load_from(&path).expect_err("zero attempts is invalid");
    assert!(error.to_string().contains("max_attempts"));
}

#[test]
fn test_env_overrides_apply_on_top_of_file() {
    let env: HashMap<&str, &str> = HashMap::from([
        ("TRIAD_RELAY_URL", "http://10.0.0.5:9000"),
        ("TRIAD_MAX_ATTEMPTS", "6"),
        ("TRIAD_BASE_DELAY_MS", "250"),
        ("TRIAD_MAX_INPUT_CHARS", "1200"),
    ]);

    let mut config = Config::default();
    config
        .apply_overrides_from(|key| env.get(key).map(|value| (*value).to_string()))
        .expect("overrides are valid");

    assert_eq!(config.client.relay_url, "http://10.0.0.5:9000");
    assert_eq!(config.client.max_attempts, 6);
    assert_eq!(config.client.base_delay_ms, 250);
    assert_eq!(config.client.max_input_chars, 1200);
    assert_eq!(
        config
            .client
            .endpoint_url()
            .expect("endpoint url")
            .as_str(),
        "http://10.0.0.5:9000/api/gemini"
    );
}

#[test]
fn test_non_numeric_env_override_is_an_error() {
    let mut config = Config::default();
    let error = config
        .apply_overrides_from(|key| (key == "TRIAD_MAX_ATTEMPTS").then(|| "lots".to_string()))
        .expect_err("non-numeric attempts");

    assert!(error.to_string().contains("TRIAD_MAX_ATTEMPTS"));
}

#[test]
fn test_update_validates_values() {
    let mut config = Config::default();

    config
        .update(None, Some(4), Some(500), None)
        .expect("valid update");
    assert_eq!(config.client.max_attempts, 4);
    assert_eq!(config.client.base_delay_ms, 500);
    assert_eq!(config.client.relay_url, ClientConfig::default().relay_url);

    assert!(
        config
            .update(Some("not a url".to_string()), None, None, None)
            .is_err()
    );
    assert!(config.update(None, None, None, Some(0)).is_err());
}

#[test]
fn test_api_key_prefers_environment_then_config() {
    let relay = RelayConfig {
        api_key_env: "TRIAD_CONFIG_TEST_KEY_NOT_SET".to_string(),
        api_key: "from-file".to_string(),
        ..RelayConfig::default()
    };
    assert_eq!(relay.resolve_api_key().expect("key from file"), "from-file");

    let missing = RelayConfig {
        api_key: "   ".to_string(),
        ..relay
    };
    assert!(missing.resolve_api_key().is_err());
}
