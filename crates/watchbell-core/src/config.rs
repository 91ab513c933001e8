//! Watchbell configuration system.
//!
//! Built once at startup from `~/.watchbell/config.toml` (or `--config`) and
//! passed by reference to whatever needs it. Every field has a default so a
//! config file only has to carry the bot token.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, WatchbellError};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WatchbellConfig {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub status: StatusConfig,
    #[serde(default)]
    pub timelapse: TimelapseConfig,
    /// Optional light toggled around every capture.
    #[serde(default)]
    pub actuation: Option<ActuationConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl WatchbellConfig {
    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| WatchbellError::Config(format!("Failed to read config: {e}")))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| WatchbellError::Config(format!("Failed to parse config: {e}")))
    }

    /// Write the config as pretty TOML, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| WatchbellError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the Watchbell home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".watchbell")
    }

    /// Reject configurations the daemon cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.trim().is_empty() {
            return Err(WatchbellError::Config(
                "telegram.bot_token is empty (or set WATCHBELL_TELEGRAM_TOKEN)".into(),
            ));
        }
        if self.status.enabled {
            if self.status.url.trim().is_empty() {
                return Err(WatchbellError::Config("status.url is empty".into()));
            }
            check_period("status.interval_secs", self.status.interval_secs, 1)?;
            check_period("status.initial_delay_secs", self.status.initial_delay_secs, 0)?;
        }
        if self.timelapse.enabled {
            let t = &self.timelapse;
            check_period("timelapse.interval_secs", t.interval_secs, 1)?;
            check_period("timelapse.initial_delay_secs", t.initial_delay_secs, 0)?;
            if t.compile_window_secs == 0 || t.compile_window_secs > SECS_PER_DAY {
                return Err(WatchbellError::Config(format!(
                    "timelapse.compile_window_secs must be in 1..={SECS_PER_DAY}"
                )));
            }
            // Otherwise some nights no firing lands in the window and that
            // day is never compiled.
            if t.interval_secs > t.compile_window_secs {
                return Err(WatchbellError::Config(format!(
                    "timelapse.interval_secs ({}) must not exceed compile_window_secs ({})",
                    t.interval_secs, t.compile_window_secs
                )));
            }
        }
        if !self.status.enabled && !self.timelapse.enabled {
            return Err(WatchbellError::Config(
                "nothing to do: both status and timelapse are disabled".into(),
            ));
        }
        Ok(())
    }
}

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Longest accepted interval or delay.
const MAX_PERIOD_SECS: u64 = 366 * SECS_PER_DAY;

fn check_period(field: &str, secs: u64, min: u64) -> Result<()> {
    if secs < min || secs > MAX_PERIOD_SECS {
        return Err(WatchbellError::Config(format!(
            "{field} must be in {min}..={MAX_PERIOD_SECS}, got {secs}"
        )));
    }
    Ok(())
}

/// Expand `~` and environment variables in a configured path. An unknown
/// variable leaves the path with only `~` expanded.
pub fn expand_path(p: &str) -> PathBuf {
    let expanded = shellexpand::full(p)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| shellexpand::tilde(p).into_owned());
    PathBuf::from(expanded)
}

fn bool_true() -> bool { true }

/// Telegram bot configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    /// Pause between two `getUpdates` calls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Long-poll timeout passed to `getUpdates`.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
}

fn default_poll_interval() -> u64 { 1 }
fn default_poll_timeout() -> u64 { 30 }

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            poll_interval_secs: default_poll_interval(),
            poll_timeout_secs: default_poll_timeout(),
        }
    }
}

/// Where durable state lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_subscribers_file")]
    pub subscribers_file: String,
    #[serde(default = "default_message_file")]
    pub message_file: String,
}

fn default_data_dir() -> String { "~/.watchbell".into() }
fn default_subscribers_file() -> String { "subscribed_users.json".into() }
fn default_message_file() -> String { "message.txt".into() }

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            subscribers_file: default_subscribers_file(),
            message_file: default_message_file(),
        }
    }
}

impl StorageConfig {
    pub fn data_dir(&self) -> PathBuf {
        expand_path(&self.data_dir)
    }

    pub fn subscribers_path(&self) -> PathBuf {
        self.data_dir().join(&self.subscribers_file)
    }

    pub fn message_path(&self) -> PathBuf {
        self.data_dir().join(&self.message_file)
    }
}

/// Status notifier job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    /// JSON endpoint polled every interval.
    #[serde(default = "default_status_url")]
    pub url: String,
    /// Template with `{/json/pointer}` placeholders.
    #[serde(default = "default_status_template")]
    pub template: String,
    #[serde(default = "default_status_interval")]
    pub interval_secs: u64,
    #[serde(default = "default_status_initial_delay")]
    pub initial_delay_secs: u64,
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,
}

fn default_status_url() -> String {
    "https://ll.thespacedevs.com/2.2.0/launch/upcoming/?limit=1".into()
}
fn default_status_template() -> String {
    "🚀 {/results/0/name}\nNET: {/results/0/net}\nStatus: {/results/0/status/name}".into()
}
fn default_status_interval() -> u64 { 3600 }
fn default_status_initial_delay() -> u64 { 300 }
fn default_fetch_timeout() -> u64 { 30 }

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: default_status_url(),
            template: default_status_template(),
            interval_secs: default_status_interval(),
            initial_delay_secs: default_status_initial_delay(),
            timeout_secs: default_fetch_timeout(),
        }
    }
}

/// Timelapse notifier job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelapseConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Root of the per-day frame folders and the compiled GIFs.
    #[serde(default = "default_picture_dir")]
    pub picture_dir: String,
    #[serde(default = "default_picture_interval")]
    pub interval_secs: u64,
    #[serde(default)]
    pub initial_delay_secs: u64,
    /// How long after midnight the previous day may still be compiled.
    #[serde(default = "default_compile_window")]
    pub compile_window_secs: u64,
    /// Display time of each frame in the compiled GIF.
    #[serde(default = "default_frame_delay")]
    pub frame_delay_ms: u32,
    #[serde(default = "default_frame_extension")]
    pub frame_extension: String,
    #[serde(default = "default_camera_program")]
    pub camera_program: String,
    /// Arguments for the camera program; `{path}` is replaced by the frame path.
    #[serde(default = "default_camera_args")]
    pub camera_args: Vec<String>,
}

fn default_picture_dir() -> String { "~/.watchbell/timelapse".into() }
fn default_picture_interval() -> u64 { 600 }
fn default_compile_window() -> u64 { 600 }
fn default_frame_delay() -> u32 { 200 }
fn default_frame_extension() -> String { "jpg".into() }
fn default_camera_program() -> String { "libcamera-still".into() }
fn default_camera_args() -> Vec<String> {
    vec!["-n".into(), "-o".into(), "{path}".into()]
}

impl Default for TimelapseConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            picture_dir: default_picture_dir(),
            interval_secs: default_picture_interval(),
            initial_delay_secs: 0,
            compile_window_secs: default_compile_window(),
            frame_delay_ms: default_frame_delay(),
            frame_extension: default_frame_extension(),
            camera_program: default_camera_program(),
            camera_args: default_camera_args(),
        }
    }
}

impl TimelapseConfig {
    pub fn picture_dir(&self) -> PathBuf {
        expand_path(&self.picture_dir)
    }
}

/// Home Assistant light switched on for the duration of a capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActuationConfig {
    /// e.g. `http://homeassistant.local:8123`
    pub base_url: String,
    /// Long-lived access token.
    pub token: String,
    pub entity_id: String,
    #[serde(default = "default_actuation_domain")]
    pub domain: String,
}

fn default_actuation_domain() -> String { "light".into() }

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional directory for a daily-rotated log file.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_log_level() -> String { "info".into() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_toml() {
        let config = WatchbellConfig::from_toml("").unwrap();
        assert_eq!(config.status.interval_secs, 3600);
        assert_eq!(config.status.initial_delay_secs, 300);
        assert_eq!(config.timelapse.interval_secs, 600);
        assert_eq!(config.timelapse.frame_delay_ms, 200);
        assert!(!config.timelapse.enabled);
        assert!(config.actuation.is_none());
        assert_eq!(config.storage.subscribers_file, "subscribed_users.json");
    }

    #[test]
    fn test_partial_toml() {
        let config = WatchbellConfig::from_toml(
            r#"
            [telegram]
            bot_token = "123:abc"

            [timelapse]
            enabled = true
            picture_dir = "/srv/timelapse"

            [actuation]
            base_url = "http://ha.local:8123"
            token = "secret"
            entity_id = "light.desk"
            "#,
        )
        .unwrap();
        assert_eq!(config.telegram.bot_token, "123:abc");
        assert_eq!(config.telegram.poll_timeout_secs, 30);
        assert!(config.timelapse.enabled);
        assert_eq!(config.timelapse.picture_dir(), PathBuf::from("/srv/timelapse"));
        let act = config.actuation.as_ref().unwrap();
        assert_eq!(act.domain, "light");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_token() {
        let config = WatchbellConfig::default();
        assert!(matches!(config.validate(), Err(WatchbellError::Config(_))));
    }

    #[test]
    fn test_validate_requires_some_job() {
        let mut config = WatchbellConfig::default();
        config.telegram.bot_token = "t".into();
        config.status.enabled = false;
        assert!(config.validate().is_err());
    }

    fn timelapse_config() -> WatchbellConfig {
        let mut config = WatchbellConfig::default();
        config.telegram.bot_token = "t".into();
        config.timelapse.enabled = true;
        config
    }

    #[test]
    fn test_validate_interval_must_fit_compile_window() {
        let mut config = timelapse_config();
        assert!(config.validate().is_ok());

        config.timelapse.interval_secs = 3600;
        assert!(matches!(config.validate(), Err(WatchbellError::Config(_))));

        config.timelapse.compile_window_secs = 3600;
        assert!(config.validate().is_ok());

        config.timelapse.compile_window_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bounds_periods() {
        let mut config = timelapse_config();
        config.timelapse.compile_window_secs = u64::MAX;
        assert!(config.validate().is_err());

        let mut config = timelapse_config();
        config.status.initial_delay_secs = u64::MAX;
        assert!(config.validate().is_err());

        let mut config = timelapse_config();
        config.status.interval_secs = 400 * 24 * 3600;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_expand_path_env_and_tilde() {
        // SAFETY: variable name is unique to this test.
        unsafe { std::env::set_var("WATCHBELL_TEST_ROOT", "/srv/bell") };
        assert_eq!(
            expand_path("$WATCHBELL_TEST_ROOT/timelapse"),
            PathBuf::from("/srv/bell/timelapse")
        );
        assert_eq!(expand_path("/plain/path"), PathBuf::from("/plain/path"));
        assert_eq!(
            expand_path("$WATCHBELL_TEST_UNSET_VAR/x"),
            PathBuf::from("$WATCHBELL_TEST_UNSET_VAR/x")
        );
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = WatchbellConfig::default();
        config.telegram.bot_token = "abc".into();
        config.status.interval_secs = 60;
        config.save_to(&path).unwrap();

        let back = WatchbellConfig::load_from(&path).unwrap();
        assert_eq!(back.telegram.bot_token, "abc");
        assert_eq!(back.status.interval_secs, 60);
    }

    #[test]
    fn test_storage_paths_join_data_dir() {
        let storage = StorageConfig {
            data_dir: "/var/lib/watchbell".into(),
            ..Default::default()
        };
        assert_eq!(
            storage.subscribers_path(),
            PathBuf::from("/var/lib/watchbell/subscribed_users.json")
        );
        assert_eq!(storage.message_path(), PathBuf::from("/var/lib/watchbell/message.txt"));
    }
}
