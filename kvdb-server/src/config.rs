//! Server configuration.
//!
//! Loaded in a fixed order, later stages overriding earlier ones:
//! 1. Compiled-in defaults
//! 2. A YAML file, if `KVDB_CONFIG` names one (missing/unparsable file is fatal)
//! 3. Per-field `KVDB_<SECTION>_<FIELD>` environment overrides

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub wal: WalSectionConfig,
    pub network: NetworkConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Loads and validates configuration: defaults, then an optional
    /// `KVDB_CONFIG` file, then environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("KVDB_CONFIG") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e.to_string()))
    }

    fn apply_env_overrides(&mut self) {
        self.engine.apply_env_overrides();
        self.wal.apply_env_overrides();
        self.network.apply_env_overrides();
        self.logging.apply_env_overrides();
    }

    /// Validates every field named in the configuration surface. Checked once,
    /// after layering, before any component is constructed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.kind != "in_memory" {
            return Err(ConfigError::Validation(format!(
                "engine.type must be 'in_memory', got '{}'",
                self.engine.kind
            )));
        }
        if self.wal.flushing_batch_size < 1 {
            return Err(ConfigError::Validation("wal.flushing_batch_size must be >= 1".into()));
        }
        if self.wal.flushing_batch_timeout_ms < 1 {
            return Err(ConfigError::Validation("wal.flushing_batch_timeout must be >= 1ms".into()));
        }
        const MIN_SEGMENT: u64 = 100 * 1024;
        const MAX_SEGMENT: u64 = 100 * 1024 * 1024;
        if !(MIN_SEGMENT..=MAX_SEGMENT).contains(&self.wal.max_segment_size) {
            return Err(ConfigError::Validation(format!(
                "wal.max_segment_size must be within [{MIN_SEGMENT}, {MAX_SEGMENT}], got {}",
                self.wal.max_segment_size
            )));
        }
        if !(1..=10_000).contains(&self.network.max_connections) {
            return Err(ConfigError::Validation(
                "network.max_connections must be within [1, 10000]".into(),
            ));
        }
        if self.network.max_message_size < 1 {
            return Err(ConfigError::Validation("network.max_message_size must be >= 1".into()));
        }
        if self.network.idle_timeout_ms < 1 {
            return Err(ConfigError::Validation("network.idle_timeout must be >= 1ms".into()));
        }
        match self.logging.level.as_str() {
            "debug" | "info" | "warn" | "warning" | "error" => {}
            other => {
                return Err(ConfigError::Validation(format!(
                    "logging.level must be one of debug/info/warn/warning/error, got '{other}'"
                )))
            }
        }
        match self.logging.output.as_str() {
            "stdout" | "stderr" | "discard" => {}
            other => {
                return Err(ConfigError::Validation(format!(
                    "logging.output must be one of stdout/stderr/discard, got '{other}'"
                )))
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    #[serde(rename = "type")]
    pub kind: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { kind: "in_memory".to_string() }
    }
}

impl EngineConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(kind) = std::env::var("KVDB_ENGINE_TYPE") {
            self.kind = kind;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalSectionConfig {
    pub enabled: bool,
    pub flushing_batch_size: usize,
    pub flushing_batch_timeout_ms: u64,
    pub max_segment_size: u64,
    pub data_directory: PathBuf,
}

impl Default for WalSectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            flushing_batch_size: 100,
            flushing_batch_timeout_ms: 10,
            max_segment_size: 64 * 1024 * 1024,
            data_directory: PathBuf::from("./data/wal"),
        }
    }
}

impl WalSectionConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("KVDB_WAL_ENABLED") {
            self.enabled = v == "1" || v.eq_ignore_ascii_case("true");
        }
        if let Ok(v) = std::env::var("KVDB_WAL_FLUSHING_BATCH_SIZE") {
            if let Ok(n) = v.parse() {
                self.flushing_batch_size = n;
            }
        }
        if let Ok(v) = std::env::var("KVDB_WAL_FLUSHING_BATCH_TIMEOUT") {
            if let Ok(n) = v.parse() {
                self.flushing_batch_timeout_ms = n;
            }
        }
        if let Ok(v) = std::env::var("KVDB_WAL_MAX_SEGMENT_SIZE") {
            if let Ok(n) = v.parse() {
                self.max_segment_size = n;
            }
        }
        if let Ok(v) = std::env::var("KVDB_WAL_DATA_DIRECTORY") {
            self.data_directory = PathBuf::from(v);
        }
    }

    pub fn flushing_batch_timeout(&self) -> Duration {
        Duration::from_millis(self.flushing_batch_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    #[serde(with = "socket_addr_serde")]
    pub address: SocketAddr,
    pub max_connections: usize,
    pub max_message_size: usize,
    pub idle_timeout_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:7401".parse().unwrap(),
            max_connections: 1000,
            max_message_size: 8192,
            idle_timeout_ms: 300_000,
        }
    }
}

impl NetworkConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("KVDB_NETWORK_ADDRESS") {
            if let Ok(addr) = v.parse() {
                self.address = addr;
            }
        }
        if let Ok(v) = std::env::var("KVDB_NETWORK_MAX_CONNECTIONS") {
            if let Ok(n) = v.parse() {
                self.max_connections = n;
            }
        }
        if let Ok(v) = std::env::var("KVDB_NETWORK_MAX_MESSAGE_SIZE") {
            if let Ok(n) = v.parse() {
                self.max_message_size = n;
            }
        }
        if let Ok(v) = std::env::var("KVDB_NETWORK_IDLE_TIMEOUT") {
            if let Ok(n) = v.parse() {
                self.idle_timeout_ms = n;
            }
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub output: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), output: "stdout".to_string() }
    }
}

impl LoggingConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("KVDB_LOGGING_LEVEL") {
            self.level = v;
        }
        if let Ok(v) = std::env::var("KVDB_LOGGING_OUTPUT") {
            self.output = v;
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, String),
    Validation(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "failed to read config file '{}': {e}", path.display()),
            ConfigError::Parse(path, e) => write!(f, "failed to parse config file '{}': {e}", path.display()),
            ConfigError::Validation(msg) => write!(f, "configuration validation failed: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

mod socket_addr_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::net::SocketAddr;

    pub fn serialize<S>(addr: &SocketAddr, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&addr.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SocketAddr, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
