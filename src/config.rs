// =============================================================================
// CONFIGURATION - Load settings from config.toml
// =============================================================================
//
// Window size and title, the instance components to request, and the log
// level. Every field has a default, so a missing file or missing keys are
// fine.

use std::ffi::CString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::LevelFilter;
use serde::Deserialize;

use crate::pipeline::{AppIdentity, GfxSettings};

pub const CONFIG_FILE: &str = "config.toml";

/// Root configuration structure
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub vulkan: VulkanConfig,
    pub debug: DebugConfig,
}

/// Window settings
#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "prism".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

/// Instance settings
#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct VulkanConfig {
    pub validation: bool,
    /// Instance extensions requested on top of the window's.
    pub extensions: Vec<String>,
    pub layers: Vec<String>,
    pub application_name: String,
    pub engine_name: String,
}

impl Default for VulkanConfig {
    fn default() -> Self {
        Self {
            validation: true,
            extensions: Vec::new(),
            layers: Vec::new(),
            application_name: "prism".to_string(),
            engine_name: "prism".to_string(),
        }
    }
}

/// Debug settings
#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    pub log_level: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Where the configuration came from. Logging is configured from the
/// loaded values, so this is reported afterwards with `ConfigSource::log`.
#[derive(Debug)]
pub enum ConfigSource {
    File(PathBuf),
    Missing(PathBuf),
    Invalid(anyhow::Error),
}

impl ConfigSource {
    pub fn log(&self, config: &Config) {
        match self {
            Self::File(path) => log::info!("Loaded configuration from {:?}", path),
            Self::Missing(path) => log::info!("Config file not found at {:?}, using defaults", path),
            Self::Invalid(e) => log::warn!("{:#}. Using defaults.", e),
        }
        log::debug!("Config: {:?}", config);
    }
}

impl Config {
    /// Load config.toml, falling back to defaults if missing or broken
    pub fn load() -> (Self, ConfigSource) {
        Self::load_or_default(CONFIG_FILE)
    }

    pub fn load_or_default<P: AsRef<Path>>(path: P) -> (Self, ConfigSource) {
        let path = path.as_ref();

        match Self::load_from_path(path) {
            Ok(Some(config)) => (config, ConfigSource::File(path.to_path_buf())),
            Ok(None) => (Config::default(), ConfigSource::Missing(path.to_path_buf())),
            Err(e) => (Config::default(), ConfigSource::Invalid(e)),
        }
    }

    /// Load configuration from a specific path. `None` if there is no file.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config = Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(Some(config))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Log level from `[debug] log_level`. Unknown names fall back to info.
    pub fn log_level(&self) -> LevelFilter {
        self.debug.log_level.parse().unwrap_or_else(|_| {
            eprintln!(
                "Unknown log level '{}', defaulting to info",
                self.debug.log_level
            );
            LevelFilter::Info
        })
    }

    /// Instance settings for the pipeline.
    pub fn gfx_settings(&self) -> Result<GfxSettings> {
        let identity = AppIdentity::new(&self.vulkan.application_name, &self.vulkan.engine_name)?;

        Ok(GfxSettings {
            identity,
            extensions: c_names(&self.vulkan.extensions).context("Invalid [vulkan] extensions")?,
            layers: c_names(&self.vulkan.layers).context("Invalid [vulkan] layers")?,
            validation: self.vulkan.validation,
        })
    }
}

fn c_names(names: &[String]) -> Result<Vec<CString>> {
    names
        .iter()
        .map(|name| CString::new(name.as_str()).with_context(|| format!("{:?}", name)))
        .collect()
}
