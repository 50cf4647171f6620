use crate::client::RetryPolicy;
use crate::log_debug;

use anyhow::{Context, Result, anyhow};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Directory name under the platform config dir
pub const CONFIG_DIR_NAME: &str = "triad";
/// Configuration filename
pub const CONFIG_FILENAME: &str = "config.toml";

/// Configuration structure for the triad application
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Config {
    /// Whether to enable verbose logging (includes HTTP stack logs)
    #[serde(default)]
    pub verbose_logging: bool,
    /// Settings for the client side of an analysis run
    #[serde(default)]
    pub client: ClientConfig,
    /// Settings for the relay server
    #[serde(default)]
    pub relay: RelayConfig,
}

/// Client-side settings, fixed for the lifetime of the process
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the relay
    pub relay_url: String,
    /// Path of the relay endpoint, joined onto `relay_url`
    pub endpoint_path: String,
    /// Maximum attempts per model call, including the first
    pub max_attempts: u32,
    /// Delay before the first retry; doubles after every failed attempt
    pub base_delay_ms: u64,
    /// Optional ceiling on a single backoff delay
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_delay_ms: Option<u64>,
    /// Randomize backoff delays
    pub jitter: bool,
    /// Timeout for a single HTTP attempt
    pub request_timeout_secs: u64,
    /// Maximum problem statement length in characters
    pub max_input_chars: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            relay_url: "http://127.0.0.1:3000".to_string(),
            endpoint_path: "/api/gemini".to_string(),
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: None,
            jitter: false,
            request_timeout_secs: 60,
            max_input_chars: 5000,
        }
    }
}

/// Relay server settings
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct RelayConfig {
    pub listen_address: String,
    pub port: u16,
    /// Route the relay accepts model requests on
    pub route: String,
    /// Base URL of the upstream generative language API
    pub upstream_base: String,
    pub model: String,
    /// Environment variable holding the upstream API key
    pub api_key_env: String,
    /// API key, used only when the environment variable is unset
    #[serde(skip_serializing_if = "String::is_empty")]
    pub api_key: String,
    /// Requests allowed per client IP in each window
    pub rate_limit_requests: u32,
    pub rate_limit_window_secs: u64,
    pub max_body_bytes: usize,
    pub upstream_timeout_secs: u64,
    /// Answer cross-origin requests from any origin
    pub cors: bool,
    /// Directory of static files to serve for any unmatched path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub static_dir: Option<PathBuf>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_address: "127.0.0.1".to_string(),
            port: 3000,
            route: "/api/gemini".to_string(),
            upstream_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash-preview-05-20".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            api_key: String::new(),
            rate_limit_requests: 100,
            rate_limit_window_secs: 15 * 60,
            max_body_bytes: 64 * 1024,
            upstream_timeout_secs: 60,
            cors: true,
            static_dir: None,
        }
    }
}

impl ClientConfig {
    /// Full URL of the relay endpoint
    pub fn endpoint_url(&self) -> Result<Url> {
        let base = Url::parse(&self.relay_url)
            .with_context(|| format!("Invalid relay URL: {}", self.relay_url))?;
        base.join(&self.endpoint_path)
            .with_context(|| format!("Invalid endpoint path: {}", self.endpoint_path))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: self.max_delay_ms.map(Duration::from_millis),
            jitter: self.jitter,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl RelayConfig {
    /// Resolve the upstream API key, preferring the environment
    pub fn resolve_api_key(&self) -> Result<String> {
        if let Ok(key) = std::env::var(&self.api_key_env)
            && !key.trim().is_empty()
        {
            return Ok(key);
        }
        if self.api_key.trim().is_empty() {
            return Err(anyhow!(
                "No API key configured. Set the {} environment variable.",
                self.api_key_env
            ));
        }
        Ok(self.api_key.clone())
    }
}

impl Config {
    /// Load the configuration from the default location, then apply env overrides
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides()?;
        log_debug!("Configuration loaded: {:?}", config);
        Ok(config)
    }

    /// Load the configuration from a specific file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            anyhow!(
                "Invalid configuration file format: {}. Please check {} for syntax errors.",
                e,
                path.display()
            )
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration to the default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        log_debug!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Get the path to the configuration file
    pub fn get_config_path() -> Result<PathBuf> {
        let mut path =
            config_dir().ok_or_else(|| anyhow!("Unable to determine config directory"))?;
        path.push(CONFIG_DIR_NAME);
        path.push(CONFIG_FILENAME);
        Ok(path)
    }

    /// Apply `TRIAD_*` environment variables on top of the file settings
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup, so callers and tests need not touch the process env
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("TRIAD_RELAY_URL") {
            self.client.relay_url = url;
        }
        if let Some(attempts) = lookup("TRIAD_MAX_ATTEMPTS") {
            self.client.max_attempts = attempts
                .parse()
                .with_context(|| format!("TRIAD_MAX_ATTEMPTS is not a number: {attempts}"))?;
        }
        if let Some(delay) = lookup("TRIAD_BASE_DELAY_MS") {
            self.client.base_delay_ms = delay
                .parse()
                .with_context(|| format!("TRIAD_BASE_DELAY_MS is not a number: {delay}"))?;
        }
        if let Some(max_chars) = lookup("TRIAD_MAX_INPUT_CHARS") {
            self.client.max_input_chars = max_chars
                .parse()
                .with_context(|| format!("TRIAD_MAX_INPUT_CHARS is not a number: {max_chars}"))?;
        }
        self.validate()
    }

    /// Check that the settings describe a usable configuration
    pub fn validate(&self) -> Result<()> {
        if self.client.max_attempts == 0 {
            return Err(anyhow!("max_attempts must be at least 1"));
        }
        if self.client.max_input_chars == 0 {
            return Err(anyhow!("max_input_chars must be at least 1"));
        }
        self.client.endpoint_url()?;
        if !self.relay.route.starts_with('/') {
            return Err(anyhow!("relay route must start with '/': {}", self.relay.route));
        }
        Url::parse(&self.relay.upstream_base)
            .with_context(|| format!("Invalid upstream URL: {}", self.relay.upstream_base))?;
        if self.relay.rate_limit_requests == 0 || self.relay.rate_limit_window_secs == 0 {
            return Err(anyhow!("relay rate limit must allow at least one request per window"));
        }
        Ok(())
    }

    /// Update client settings from CLI flags; `None` leaves a value untouched
    pub fn update(
        &mut self,
        relay_url: Option<String>,
        max_attempts: Option<u32>,
        base_delay_ms: Option<u64>,
        max_input_chars: Option<usize>,
    ) -> Result<()> {
        if let Some(url) = relay_url {
            self.client.relay_url = url;
        }
        if let Some(attempts) = max_attempts {
            self.client.max_attempts = attempts;
        }
        if let Some(delay) = base_delay_ms {
            self.client.base_delay_ms = delay;
        }
        if let Some(max_chars) = max_input_chars {
            self.client.max_input_chars = max_chars;
        }
        self.validate()
    }
}
