//! Runtime configuration
//!
//! Read from `osumem.toml`. Every section and key is optional; anything
//! left out takes its default.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::memory::layout::scan::WINDOW_SIZE;
use crate::osu;

/// Default configuration file name
pub const CONFIG_FILE: &str = "osumem.toml";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub process: ProcessConfig,
    pub scan: ScanConfig,
    pub poll: PollConfig,
    pub read: ReadConfig,
    pub cache: CacheConfig,
}

/// Which process to attach to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    pub name: String,
    /// Window titles whose owning process is never attached to
    pub blacklisted_titles: Vec<String>,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            name: osu::PROCESS_NAME.to_string(),
            blacklisted_titles: osu::BLACKLISTED_TITLES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Bytes read per scanner window
    pub window_size: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            window_size: WINDOW_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub interval_ms: u64,
    /// Wait between attempts to find the process or its signatures
    pub retry_delay_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1,
            retry_delay_ms: 3000,
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadConfig {
    /// Record fields whose read failures are not reported
    pub ignored_fields: Vec<String>,
}

impl Default for ReadConfig {
    fn default() -> Self {
        Self {
            ignored_fields: osu::TRANSIENT_FIELDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from(crate::cache::CACHE_FILE),
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Parse and validate a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, falling back to defaults when the file does not exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path).map_err(Error::from) {
            Ok(content) => {
                debug!("Loading config from {}", path.display());
                Self::from_toml(&content)
            }
            Err(e) if e.is_not_found() => {
                warn!("Config file {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.process.name.trim().is_empty() {
            return Err(Error::InvalidConfig("process.name is empty".to_string()));
        }
        if self.scan.window_size == 0 {
            return Err(Error::InvalidConfig(
                "scan.window_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`Config`]
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    process_name: Option<String>,
    blacklisted_titles: Option<Vec<String>>,
    window_size: Option<usize>,
    interval_ms: Option<u64>,
    retry_delay_ms: Option<u64>,
    ignored_fields: Option<Vec<String>>,
    cache_enabled: Option<bool>,
    cache_path: Option<PathBuf>,
}

impl ConfigBuilder {
    pub fn process_name(mut self, name: impl Into<String>) -> Self {
        self.process_name = Some(name.into());
        self
    }

    pub fn blacklisted_titles<I, S>(mut self, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blacklisted_titles = Some(titles.into_iter().map(Into::into).collect());
        self
    }

    pub fn window_size(mut self, size: usize) -> Self {
        self.window_size = Some(size);
        self
    }

    pub fn interval_ms(mut self, ms: u64) -> Self {
        self.interval_ms = Some(ms);
        self
    }

    pub fn retry_delay_ms(mut self, ms: u64) -> Self {
        self.retry_delay_ms = Some(ms);
        self
    }

    pub fn ignored_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Enable or disable the address cache
    pub fn cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = Some(enabled);
        self
    }

    pub fn cache_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<Config> {
        let default = Config::default();
        let config = Config {
            process: ProcessConfig {
                name: self.process_name.unwrap_or(default.process.name),
                blacklisted_titles: self
                    .blacklisted_titles
                    .unwrap_or(default.process.blacklisted_titles),
            },
            scan: ScanConfig {
                window_size: self.window_size.unwrap_or(default.scan.window_size),
            },
            poll: PollConfig {
                interval_ms: self.interval_ms.unwrap_or(default.poll.interval_ms),
                retry_delay_ms: self.retry_delay_ms.unwrap_or(default.poll.retry_delay_ms),
            },
            read: ReadConfig {
                ignored_fields: self.ignored_fields.unwrap_or(default.read.ignored_fields),
            },
            cache: CacheConfig {
                enabled: self.cache_enabled.unwrap_or(default.cache.enabled),
                path: self.cache_path.unwrap_or(default.cache.path),
            },
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.process.name, "osu!.exe");
        assert_eq!(config.process.blacklisted_titles, vec!["osu!lazer", "osu!framework"]);
        assert_eq!(config.scan.window_size, 64 * 1024);
        assert_eq!(config.poll.retry_delay(), Duration::from_secs(3));
        assert_eq!(config.read.ignored_fields, vec!["leaderboard", "key_overlay"]);
        assert!(config.cache.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [scan]
            window_size = 4096

            [read]
            ignored_fields = []
            "#,
        )
        .unwrap();

        assert_eq!(config.scan.window_size, 4096);
        assert!(config.read.ignored_fields.is_empty());
        assert_eq!(config.process, ProcessConfig::default());
        assert_eq!(config.poll, PollConfig::default());
    }

    #[test]
    fn test_rejects_invalid_values() {
        let err = Config::from_toml("[scan]\nwindow_size = 0\n").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));

        let err = Config::from_toml("[process]\nname = \"\"\n").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));

        let err = Config::from_toml("[scan]\nwindow_size = \"big\"\n").unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[process]\nname = \"osu!test.exe\"\n\n[poll]\ninterval_ms = 50").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.process.name, "osu!test.exe");
        assert_eq!(config.poll.interval(), Duration::from_millis(50));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path().join("missing.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_builder() {
        let config = Config::builder()
            .process_name("osu!.exe")
            .blacklisted_titles(["osu!lazer"])
            .window_size(1024)
            .cache(false)
            .build()
            .unwrap();

        assert_eq!(config.process.blacklisted_titles, vec!["osu!lazer"]);
        assert_eq!(config.scan.window_size, 1024);
        assert!(!config.cache.enabled);
        assert_eq!(config.poll, PollConfig::default());

        assert!(Config::builder().window_size(0).build().is_err());
    }
}
