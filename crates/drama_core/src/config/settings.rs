//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Each section can be updated independently for atomic section-level updates.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::manager::{ConfigError, ConfigResult};
use crate::logging::{LogConfig, LogLevel};
use crate::media::TranscodeSpec;

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Where the batch lives and where run artifacts go.
    #[serde(default)]
    pub paths: PathSettings,

    /// Worker pool and resume behaviour.
    #[serde(default)]
    pub orchestration: OrchestrationSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,

    /// External tool options.
    #[serde(default)]
    pub media: MediaSettings,
}

impl Settings {
    /// Reject values no run can start with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.orchestration.max_workers == 0 {
            return Err(ConfigError::invalid(
                "orchestration.max_workers must be at least 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.media.accompaniment_volume) {
            return Err(ConfigError::invalid(format!(
                "media.accompaniment_volume must be within [0, 1], got {}",
                self.media.accompaniment_volume
            )));
        }
        if let Some(spec) = self
            .media
            .transcode_specs
            .iter()
            .find(|s| s.width == 0 || s.height == 0)
        {
            return Err(ConfigError::invalid(format!(
                "media.transcode_specs contains an empty size {}x{}",
                spec.width, spec.height
            )));
        }
        Ok(())
    }
}

/// Path configuration.
///
/// Relative `state_file`, `report_dir` and `logs_folder` values are taken
/// relative to `drama_root`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSettings {
    /// Directory holding the `drama-NNNN` units.
    #[serde(default)]
    pub drama_root: String,

    /// Completion store file.
    #[serde(default = "default_state_file")]
    pub state_file: String,

    /// Folder for JSON run reports.
    #[serde(default = "default_report_dir")]
    pub report_dir: String,

    /// Folder for per-unit log files.
    #[serde(default = "default_logs_folder")]
    pub logs_folder: String,
}

fn default_state_file() -> String {
    ".drama_processor_state.json".to_string()
}

fn default_report_dir() -> String {
    "reports".to_string()
}

fn default_logs_folder() -> String {
    ".logs".to_string()
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            drama_root: String::new(),
            state_file: default_state_file(),
            report_dir: default_report_dir(),
            logs_folder: default_logs_folder(),
        }
    }
}

impl PathSettings {
    pub fn root(&self) -> PathBuf {
        PathBuf::from(&self.drama_root)
    }

    pub fn state_path(&self) -> PathBuf {
        self.under_root(&self.state_file)
    }

    pub fn report_path(&self) -> PathBuf {
        self.under_root(&self.report_dir)
    }

    pub fn logs_path(&self) -> PathBuf {
        self.under_root(&self.logs_folder)
    }

    fn under_root(&self, value: &str) -> PathBuf {
        let path = Path::new(value);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root().join(path)
        }
    }
}

/// Worker pool and resume behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationSettings {
    /// Number of concurrent workers.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Skip units whose outputs are already recorded and present.
    #[serde(default = "default_true")]
    pub enable_resume: bool,

    /// Write a JSON report after each run.
    #[serde(default = "default_true")]
    pub generate_report: bool,
}

fn default_max_workers() -> usize {
    4
}

fn default_true() -> bool {
    true
}

impl Default for OrchestrationSettings {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            enable_resume: true,
            generate_report: true,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Minimum level for console and unit logs.
    #[serde(default)]
    pub level: LogLevel,

    /// Number of tool output lines to show when a command fails.
    #[serde(default = "default_error_tail")]
    pub error_tail: usize,

    /// Keep tool output out of unit log files.
    #[serde(default = "default_true")]
    pub compact: bool,
}

fn default_error_tail() -> usize {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            error_tail: default_error_tail(),
            compact: true,
        }
    }
}

impl LoggingSettings {
    /// Per-unit logger configuration for these settings.
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            level: self.level,
            compact: self.compact,
            error_tail: self.error_tail,
            ..LogConfig::default()
        }
    }
}

/// Options passed to the external media tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaSettings {
    /// Model argument for the separator (`-p`).
    #[serde(default = "default_separator_model")]
    pub separator_model: String,

    /// Accompaniment level mixed back under the vocals, 0.0 to 1.0.
    #[serde(default)]
    pub accompaniment_volume: f64,

    /// x264 preset.
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Renditions produced by transcode.
    #[serde(default = "TranscodeSpec::defaults")]
    pub transcode_specs: Vec<TranscodeSpec>,
}

fn default_separator_model() -> String {
    crate::media::DEFAULT_SEPARATOR_MODEL.to_string()
}

fn default_preset() -> String {
    crate::media::DEFAULT_PRESET.to_string()
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            separator_model: default_separator_model(),
            accompaniment_volume: 0.0,
            preset: default_preset(),
            transcode_specs: TranscodeSpec::defaults(),
        }
    }
}

/// Names of config sections for targeted updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    Paths,
    Orchestration,
    Logging,
    Media,
}

impl ConfigSection {
    pub const ALL: [ConfigSection; 4] = [
        ConfigSection::Paths,
        ConfigSection::Orchestration,
        ConfigSection::Logging,
        ConfigSection::Media,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "paths",
            ConfigSection::Orchestration => "orchestration",
            ConfigSection::Logging => "logging",
            ConfigSection::Media => "media",
        }
    }

    /// Comment written above the table in generated files.
    pub(super) fn description(&self) -> &'static str {
        match self {
            ConfigSection::Paths => "Batch root and run artifact locations",
            ConfigSection::Orchestration => "Worker pool and resume behaviour",
            ConfigSection::Logging => "Logging configuration",
            ConfigSection::Media => "External tool options",
        }
    }
}
