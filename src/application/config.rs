use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::value_objects::{AdvisorSettings, AdvisorThresholds};

/// Top-level application configuration loaded from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub sink: SinkConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub advisors: AdvisorsConfig,
}

/// Metric cache location (tilde-expanded at point of use).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Drop superseded `ProgramRuntime` records after each import.
    #[serde(default)]
    pub compact: bool,
}

/// Where locally produced samples go: disabled, file or database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    #[serde(default = "default_sink_kind")]
    pub kind: String,
    #[serde(default)]
    pub path: Option<String>,
}

/// Spool-directory server mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_interval")]
    pub interval_secs: u64,
    #[serde(default = "default_spool_dir")]
    pub spool_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorsConfig {
    /// Stop the whole run at the first failing advisor.
    #[serde(default = "default_true")]
    pub abort_on_failure: bool,
    #[serde(default)]
    pub execution_times: ExecutionTimesConfig,
    #[serde(default)]
    pub data_transfer: RatioAdvisorConfig,
    #[serde(default)]
    pub garbage_collection: RatioAdvisorConfig,
    #[serde(default)]
    pub out_of_memory: OutOfMemoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionTimesConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// An advisor that compares a time share against a threshold in `[0, 1]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatioAdvisorConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub ratio_threshold: f64,
}

/// Growth thresholds in bytes per second.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutOfMemoryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub heap_growth_threshold: f64,
    #[serde(default)]
    pub non_heap_growth_threshold: f64,
    #[serde(default)]
    pub swap_growth_threshold: f64,
}

// --- Defaults ---

// NOTE: Stored as raw string with tilde; expand with shellexpand at point of use.
fn default_database_path() -> String {
    "~/.local/share/rankscope/cache.db".into()
}

fn default_sink_kind() -> String {
    "disabled".into()
}

const fn default_server_interval() -> u64 {
    30
}

fn default_spool_dir() -> String {
    "~/.local/share/rankscope/spool".into()
}

const fn default_true() -> bool {
    true
}

// --- Default impls ---

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            kind: default_sink_kind(),
            path: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_server_interval(),
            spool_dir: default_spool_dir(),
        }
    }
}

impl Default for AdvisorsConfig {
    fn default() -> Self {
        Self {
            abort_on_failure: default_true(),
            execution_times: ExecutionTimesConfig::default(),
            data_transfer: RatioAdvisorConfig::default(),
            garbage_collection: RatioAdvisorConfig::default(),
            out_of_memory: OutOfMemoryConfig::default(),
        }
    }
}

impl Default for ExecutionTimesConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
        }
    }
}

impl Default for RatioAdvisorConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            ratio_threshold: 0.0,
        }
    }
}

impl Default for OutOfMemoryConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            heap_growth_threshold: 0.0,
            non_heap_growth_threshold: 0.0,
            swap_growth_threshold: 0.0,
        }
    }
}

// --- Loading ---

impl AppConfig {
    /// Reads `explicit` when given, otherwise the per-user config file,
    /// which is written with defaults on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// default file cannot be created.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => Self::load_or_create(&Self::default_path()?),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// the default config cannot be written.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(path, &text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "writing default configuration");
                let config = Self::default();
                config.write_to(path)?;
                Ok(config)
            }
            Err(e) => Err(e).with_context(|| format!("cannot read {}", path.display())),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        Self::parse(path, &text)
    }

    fn parse(path: &Path, text: &str) -> Result<Self> {
        toml::from_str(text).with_context(|| format!("invalid configuration in {}", path.display()))
    }

    /// Writes the config as TOML, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any filesystem operation fails.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("cannot create {}", dir.display()))?;
        }
        let text = toml::to_string_pretty(self).context("cannot serialize configuration")?;
        std::fs::write(path, text).with_context(|| format!("cannot write {}", path.display()))
    }

    /// `<config dir>/rankscope/config.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error when the platform has no config directory.
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("rankscope").join("config.toml"))
            .context("no config directory on this platform")
    }

    /// Apply `RANKSCOPE_*` overrides on top of the file values.
    ///
    /// Unrelated variables are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error naming the variable when a value cannot be parsed.
    pub fn apply_env_overrides<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix("RANKSCOPE_") else {
                continue;
            };
            let advisors = &mut self.advisors;
            match name {
                "DATABASE_PATH" => self.database.path = value,
                "SINK_KIND" => self.sink.kind = value,
                "SINK_PATH" => self.sink.path = Some(value),
                "ABORT_ON_FAILURE" => advisors.abort_on_failure = parse_flag(&key, &value)?,
                "EXECUTION_TIMES_ENABLED" => {
                    advisors.execution_times.enabled = parse_flag(&key, &value)?;
                }
                "DATA_TRANSFER_ENABLED" => {
                    advisors.data_transfer.enabled = parse_flag(&key, &value)?;
                }
                "GARBAGE_COLLECTION_ENABLED" => {
                    advisors.garbage_collection.enabled = parse_flag(&key, &value)?;
                }
                "OUT_OF_MEMORY_ENABLED" => {
                    advisors.out_of_memory.enabled = parse_flag(&key, &value)?;
                }
                "DATA_TRANSFER_THRESHOLD" => {
                    advisors.data_transfer.ratio_threshold = parse_number(&key, &value)?;
                }
                "GARBAGE_COLLECTION_THRESHOLD" => {
                    advisors.garbage_collection.ratio_threshold = parse_number(&key, &value)?;
                }
                "OOM_HEAP_THRESHOLD" => {
                    advisors.out_of_memory.heap_growth_threshold = parse_number(&key, &value)?;
                }
                "OOM_NON_HEAP_THRESHOLD" => {
                    advisors.out_of_memory.non_heap_growth_threshold =
                        parse_number(&key, &value)?;
                }
                "OOM_SWAP_THRESHOLD" => {
                    advisors.out_of_memory.swap_growth_threshold = parse_number(&key, &value)?;
                }
                _ => {}
            }
        }
        Ok(())
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => bail!("{key}: expected a boolean, got {value:?}"),
    }
}

fn parse_number(key: &str, value: &str) -> Result<f64> {
    let parsed: f64 = value
        .trim()
        .parse()
        .with_context(|| format!("{key}: expected a number, got {value:?}"))?;
    if !parsed.is_finite() {
        bail!("{key}: expected a finite number, got {value:?}");
    }
    Ok(parsed)
}

impl From<&AdvisorsConfig> for AdvisorSettings {
    fn from(config: &AdvisorsConfig) -> Self {
        // Ratios are shares of program time; growth rates cannot be negative
        Self {
            execution_times: config.execution_times.enabled,
            data_transfer: config.data_transfer.enabled,
            garbage_collection: config.garbage_collection.enabled,
            out_of_memory: config.out_of_memory.enabled,
            thresholds: AdvisorThresholds {
                data_transfer_ratio: config.data_transfer.ratio_threshold.clamp(0.0, 1.0),
                garbage_collection_ratio: config
                    .garbage_collection
                    .ratio_threshold
                    .clamp(0.0, 1.0),
                heap_growth: config.out_of_memory.heap_growth_threshold.max(0.0),
                non_heap_growth: config.out_of_memory.non_heap_growth_threshold.max(0.0),
                swap_growth: config.out_of_memory.swap_growth_threshold.max(0.0),
            },
        }
    }
}
