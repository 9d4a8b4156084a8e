//! Configuration management for the drama processor.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//! - Validation before a run starts
//!
//! # Example
//!
//! ```no_run
//! use drama_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new("drama.toml");
//! config.load_or_create().unwrap();
//! config.settings().validate().unwrap();
//!
//! println!("Workers: {}", config.settings().orchestration.max_workers);
//!
//! config.settings_mut().orchestration.enable_resume = false;
//! config.update_section(ConfigSection::Orchestration).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, LoggingSettings, MediaSettings, OrchestrationSettings, PathSettings, Settings,
};
