//! Configuration types for asset-courier
//!
//! The configuration is built once (usually from the environment) and passed by
//! reference into the pipeline; nothing reads process-wide settings after startup.

use crate::error::{Error, Result};
use crate::types::AssetExtensions;
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Telegram's upload limit for bot documents (50 MiB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// S3-compatible object store settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Endpoint URL (e.g. "https://s3.us-west-004.backblazeb2.com")
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Bucket holding the asset locations
    pub bucket: String,

    /// Access key id
    pub key_id: String,

    /// Secret access key
    pub application_key: String,

    /// Signing region (default: "us-east-1")
    #[serde(default = "default_region")]
    pub region: String,

    /// Use path-style addressing (`endpoint/bucket/key`) instead of virtual hosts
    #[serde(default)]
    pub force_path_style: bool,

    /// Per-operation timeout (default: 60 seconds)
    #[serde(default = "default_store_timeout", with = "duration_serde")]
    pub timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            bucket: String::new(),
            key_id: String::new(),
            application_key: String::new(),
            region: default_region(),
            force_path_style: false,
            timeout: default_store_timeout(),
        }
    }
}

/// Which files are handed to the delivery channel after a successful download
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryScope {
    /// Only the files of the group that was just downloaded (default)
    #[default]
    Group,
    /// Every file currently in the staging directory, including leftovers from earlier runs
    StagingArea,
}

/// Telegram delivery settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Bot token
    pub bot_token: String,

    /// Target chat or channel id
    pub chat_id: String,

    /// Bot API base URL (default: "https://api.telegram.org")
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Request timeout per file (default: 120 seconds)
    #[serde(default = "default_delivery_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// Files strictly larger than this are skipped (default: 52,428,800 bytes)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Which files to deliver after a download
    #[serde(default)]
    pub scope: DeliveryScope,

    /// Send a short text message after the run to check the channel (default: false)
    #[serde(default)]
    pub send_probe_message: bool,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            api_base: default_api_base(),
            timeout: default_delivery_timeout(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            scope: DeliveryScope::default(),
            send_probe_message: false,
        }
    }
}

/// What to scan for
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Candidate locations in priority order (default: "444/", "555/", "666/")
    #[serde(default = "default_locations")]
    pub locations: Vec<String>,

    /// Required extension set
    #[serde(default)]
    pub extensions: AssetExtensions,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            locations: default_locations(),
            extensions: AssetExtensions::default(),
        }
    }
}

/// Local filesystem paths
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Staging directory for downloaded files (default: "data/downloaded")
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,

    /// Publication state file (default: "config/config_public.json")
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    /// Append-only log file (default: "logs/operation_log.txt", None = stdout only)
    #[serde(default = "default_log_file")]
    pub log_file: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            staging_dir: default_staging_dir(),
            state_file: default_state_file(),
            log_file: default_log_file(),
        }
    }
}

/// Retry behavior for store and delivery operations
///
/// Retries are opt-in: with the default `max_attempts = 0` every operation runs once.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (default: 0, retries disabled)
    #[serde(default)]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 30 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 0,
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

/// Main configuration for the pipeline
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Object store connection
    pub store: StoreConfig,

    /// Delivery channel
    pub delivery: DeliveryConfig,

    /// Locations and required extensions
    #[serde(default)]
    pub scan: ScanConfig,

    /// Local paths
    #[serde(default)]
    pub paths: PathsConfig,

    /// Opt-in retry policy
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Config {
    /// Load configuration from the process environment (and a `.env` file if present)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// Required keys: `S3_BUCKET_NAME`, `S3_KEY_ID`, `S3_APPLICATION_KEY`,
    /// `TELEGRAM_TOKEN`, `TELEGRAM_CHAT_ID`. Everything else falls back to defaults.
    /// The result is validated before it is returned.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values count as unset
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            get(key).ok_or_else(|| Error::config(format!("{key} not set in environment"), key))
        };

        let mut config = Config {
            store: StoreConfig {
                endpoint: get("S3_ENDPOINT"),
                bucket: require("S3_BUCKET_NAME")?,
                key_id: require("S3_KEY_ID")?,
                application_key: require("S3_APPLICATION_KEY")?,
                ..Default::default()
            },
            delivery: DeliveryConfig {
                bot_token: require("TELEGRAM_TOKEN")?,
                chat_id: require("TELEGRAM_CHAT_ID")?,
                ..Default::default()
            },
            ..Default::default()
        };

        if let Some(region) = get("S3_REGION") {
            config.store.region = region;
        }
        if let Some(value) = get("S3_FORCE_PATH_STYLE") {
            config.store.force_path_style = parse_bool("S3_FORCE_PATH_STYLE", &value)?;
        }
        if let Some(value) = get("S3_TIMEOUT_SECS") {
            config.store.timeout = Duration::from_secs(parse_number("S3_TIMEOUT_SECS", &value)?);
        }

        if let Some(api_base) = get("TELEGRAM_API_BASE") {
            config.delivery.api_base = api_base;
        }
        if let Some(value) = get("TELEGRAM_TIMEOUT_SECS") {
            config.delivery.timeout =
                Duration::from_secs(parse_number("TELEGRAM_TIMEOUT_SECS", &value)?);
        }
        if let Some(value) = get("TELEGRAM_SEND_PROBE") {
            config.delivery.send_probe_message = parse_bool("TELEGRAM_SEND_PROBE", &value)?;
        }
        if let Some(value) = get("DELIVERY_SCOPE") {
            config.delivery.scope = match value.trim().to_lowercase().as_str() {
                "group" => DeliveryScope::Group,
                "staging" | "staging_area" => DeliveryScope::StagingArea,
                other => {
                    return Err(Error::config(
                        format!("unknown delivery scope '{other}' (expected 'group' or 'staging')"),
                        "DELIVERY_SCOPE",
                    ));
                }
            };
        }

        if let Some(value) = get("ASSET_LOCATIONS") {
            config.scan.locations = split_list(&value);
        }
        if let Some(value) = get("ASSET_EXTENSIONS") {
            let parts = split_list(&value);
            let [metadata, image, video] = parts.as_slice() else {
                return Err(Error::config(
                    format!(
                        "expected three extensions (metadata,image,video), got {}",
                        parts.len()
                    ),
                    "ASSET_EXTENSIONS",
                ));
            };
            config.scan.extensions = AssetExtensions::new(metadata, image, video);
        }

        if let Some(dir) = get("STAGING_DIR") {
            config.paths.staging_dir = PathBuf::from(dir);
        }
        if let Some(file) = get("STATE_FILE") {
            config.paths.state_file = PathBuf::from(file);
        }
        // LOG_FILE set to an empty string disables the file log
        if let Some(file) = lookup("LOG_FILE") {
            config.paths.log_file = (!file.trim().is_empty()).then(|| PathBuf::from(file));
        }

        if let Some(value) = get("RETRY_MAX_ATTEMPTS") {
            config.retry.max_attempts = parse_number("RETRY_MAX_ATTEMPTS", &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        let required = [
            (&self.store.bucket, "S3_BUCKET_NAME"),
            (&self.store.key_id, "S3_KEY_ID"),
            (&self.store.application_key, "S3_APPLICATION_KEY"),
            (&self.delivery.bot_token, "TELEGRAM_TOKEN"),
            (&self.delivery.chat_id, "TELEGRAM_CHAT_ID"),
        ];
        for (value, key) in required {
            if value.trim().is_empty() {
                return Err(Error::config(format!("{key} must not be empty"), key));
            }
        }

        if self.scan.locations.is_empty() {
            return Err(Error::config(
                "at least one location is required",
                "ASSET_LOCATIONS",
            ));
        }

        // Compare normalized forms so "json" and ".JSON" count as duplicates
        let all = self.scan.extensions.normalized();
        if all.iter().any(|ext| ext.is_empty()) {
            return Err(Error::config(
                "required extensions must not be empty",
                "ASSET_EXTENSIONS",
            ));
        }
        if all[0] == all[1] || all[0] == all[2] || all[1] == all[2] {
            return Err(Error::config(
                format!(
                    "required extensions must be distinct, got {}, {}, {}",
                    all[0], all[1], all[2]
                ),
                "ASSET_EXTENSIONS",
            ));
        }

        url::Url::parse(&self.delivery.api_base).map_err(|e| {
            Error::config(
                format!("invalid API base URL '{}': {e}", self.delivery.api_base),
                "TELEGRAM_API_BASE",
            )
        })?;

        if self.delivery.max_file_size == 0 {
            return Err(Error::Config {
                message: "max_file_size must be greater than zero".into(),
                key: None,
            });
        }

        Ok(())
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::config(
            format!("expected a boolean, got '{other}'"),
            key,
        )),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::config(format!("expected a number, got '{value}'"), key))
}

// Default value functions
fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_store_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_delivery_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_locations() -> Vec<String> {
    vec!["444/".to_string(), "555/".to_string(), "666/".to_string()]
}

fn default_staging_dir() -> PathBuf {
    PathBuf::from("data/downloaded")
}

fn default_state_file() -> PathBuf {
    PathBuf::from("config/config_public.json")
}

fn default_log_file() -> Option<PathBuf> {
    Some(PathBuf::from("logs/operation_log.txt"))
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
