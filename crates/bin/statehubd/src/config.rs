//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `statehub.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use serde::Deserialize;
use statehub_adapter_mqtt::MqttConfig;
use statehub_domain::topic::{BaseTopic, TopicError};

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Broker connection and topic prefix.
    pub mqtt: MqttConfig,
    /// Chat notification settings.
    pub notifications: NotificationsConfig,
    /// In-process device simulators.
    pub simulators: SimulatorsConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Notification bridge configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    pub enabled: bool,
    /// Only post in this guild.
    pub guild: Option<String>,
    /// Events buffered before the oldest are dropped.
    pub queue_capacity: usize,
}

/// Device simulator configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SimulatorsConfig {
    pub enabled: bool,
    pub sensor_id: String,
    pub switch_id: String,
    pub clock_id: String,
    /// Seconds between periodic reports.
    pub period_secs: u64,
    pub sensor_min: f64,
    pub sensor_max: f64,
    /// `HH:MM:SS`; the current local time when absent.
    pub clock_start: Option<String>,
    pub clock_increment_secs: i64,
}

impl Config {
    /// Load configuration from `statehub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("statehub.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("STATEHUB_HOST") {
            self.server.host = val;
        }
        if let Some(port) = var("STATEHUB_PORT").and_then(|v| v.parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = var("STATEHUB_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Some(val) = var("STATEHUB_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = var("STATEHUB_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("MQTT_BROKER") {
            self.mqtt.broker_host = val;
        }
        if let Some(port) = var("MQTT_PORT").and_then(|v| v.parse().ok()) {
            self.mqtt.broker_port = port;
        }
        if let Some(val) = var("MQTT_BASE_TOPIC") {
            self.mqtt.base_topic = val;
        }
        if let Some(val) = var("STATEHUB_CHAT_GUILD") {
            self.notifications.guild = Some(val);
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        self.base_topic()?;
        if self.notifications.queue_capacity == 0 {
            return Err(ConfigError::Validation(
                "notification queue capacity must be non-zero".to_string(),
            ));
        }
        if self.simulators.enabled && self.simulators.sensor_min > self.simulators.sensor_max {
            return Err(ConfigError::Validation(
                "simulated sensor range is empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    /// The validated topic prefix every device lives under.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BaseTopic`] if `mqtt.base_topic` is not three
    /// non-empty segments.
    pub fn base_topic(&self) -> Result<BaseTopic, ConfigError> {
        Ok(BaseTopic::new(self.mqtt.base_topic.as_str())?)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:statehub.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "statehubd=info,statehub=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            guild: None,
            queue_capacity: 1024,
        }
    }
}

impl Default for SimulatorsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            sensor_id: "temp01".to_string(),
            switch_id: "boiler".to_string(),
            clock_id: "clock01".to_string(),
            period_secs: 5,
            sensor_min: 19.0,
            sensor_max: 23.0,
            clock_start: None,
            clock_increment_secs: 1,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// The MQTT base topic is unusable.
    #[error("invalid mqtt.base_topic")]
    BaseTopic(#[from] TopicError),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
