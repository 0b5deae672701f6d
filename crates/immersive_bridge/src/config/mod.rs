//! Configuration system
//!
//! [`BridgeConfig`] is the top-level configuration a host hands to
//! [`Bridge::new`](crate::Bridge::new). Settings live in TOML or RON files;
//! the extension picks the format, and a missing section or field keeps its
//! default.

use std::fmt;
use std::path::Path;

pub use serde::{Deserialize, Serialize};

/// On-disk encodings a settings file may use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.toml`
    Toml,
    /// `.ron`
    Ron,
}

impl ConfigFormat {
    /// Format implied by the extension of `path`
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Toml => "TOML",
            Self::Ron => "RON",
        })
    }
}

/// Settings that persist to a TOML or RON file
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Decode settings from `text` in `format`
    fn parse(text: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        match format {
            ConfigFormat::Toml => toml::from_str(text).map_err(|e| ConfigError::Parse {
                format,
                reason: e.to_string(),
            }),
            ConfigFormat::Ron => ron::from_str(text).map_err(|e| ConfigError::Parse {
                format,
                reason: e.to_string(),
            }),
        }
    }

    /// Encode settings as `format`
    fn render(&self, format: ConfigFormat) -> Result<String, ConfigError> {
        let encoded = match format {
            ConfigFormat::Toml => toml::to_string_pretty(self).map_err(|e| e.to_string()),
            ConfigFormat::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| e.to_string()),
        };
        encoded.map_err(|reason| ConfigError::Serialize { format, reason })
    }

    /// Read settings from `path`; the extension selects the format
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text, format)
    }

    /// Write settings to `path`; the extension selects the format
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = self.render(ConfigFormat::from_path(path)?)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}

/// Failure to read, write or accept bridge settings
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The settings file could not be read or written
    #[error("cannot access settings file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid for its format
    #[error("malformed {format} settings: {reason}")]
    Parse {
        /// Format the file was decoded as
        format: ConfigFormat,
        /// Decoder message
        reason: String,
    },

    /// The settings could not be encoded
    #[error("cannot encode settings as {format}: {reason}")]
    Serialize {
        /// Requested encoding
        format: ConfigFormat,
        /// Encoder message
        reason: String,
    },

    /// The path has neither a `.toml` nor a `.ron` extension
    #[error("settings file {0} is neither .toml nor .ron")]
    UnsupportedFormat(String),

    /// A value parsed but is out of range
    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// # Scene Transition Configuration
///
/// Bounds applied to timed scene swaps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    /// Longest transition accepted; longer requests are clamped
    pub max_duration_seconds: f32,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            max_duration_seconds: 10.0,
        }
    }
}

/// # Headless Engine Configuration
///
/// Settings for the in-process [`HeadlessEngine`](crate::engine::headless::HeadlessEngine).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadlessConfig {
    /// Surface width assumed before the first `surface_changed`
    pub surface_width: u32,
    /// Surface height assumed before the first `surface_changed`
    pub surface_height: u32,
    /// Name given to the engine's render thread
    pub render_thread_name: String,
    /// Vertical field of view used to unproject screen points, in degrees
    pub vertical_fov_degrees: f32,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            surface_width: 1280,
            surface_height: 720,
            render_thread_name: "headless-render".to_string(),
            vertical_fov_degrees: 60.0,
        }
    }
}

/// # Bridge Configuration
///
/// Top-level configuration for a [`Bridge`](crate::Bridge) and the engines it creates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Log level used when the host initializes logging
    pub log_level: String,
    /// Whether new instances start with the debug overlay enabled
    pub debug_hud: bool,
    /// Maximum query completions delivered per drawn frame (0 = unlimited)
    pub completion_budget: usize,
    /// Scene transition bounds
    pub transition: TransitionConfig,
    /// Headless engine settings
    pub headless: HeadlessConfig,
}

impl BridgeConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            debug_hud: false,
            completion_budget: 0,
            transition: TransitionConfig::default(),
            headless: HeadlessConfig::default(),
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enable the debug overlay on new instances
    pub fn with_debug_hud(mut self, enabled: bool) -> Self {
        self.debug_hud = enabled;
        self
    }

    /// Bound the completions delivered per frame
    pub fn with_completion_budget(mut self, budget: usize) -> Self {
        self.completion_budget = budget;
        self
    }

    /// Set the longest accepted scene transition
    pub fn with_max_transition(mut self, seconds: f32) -> Self {
        self.transition.max_duration_seconds = seconds;
        self
    }

    /// Set the headless engine settings
    pub fn with_headless(mut self, headless: HeadlessConfig) -> Self {
        self.headless = headless;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_level.trim().is_empty() {
            return Err(ConfigError::Invalid("log level cannot be empty".to_string()));
        }

        let max = self.transition.max_duration_seconds;
        if !max.is_finite() || max <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "max transition duration must be positive, got {max}"
            )));
        }

        if self.headless.surface_width == 0 || self.headless.surface_height == 0 {
            return Err(ConfigError::Invalid(
                "headless surface dimensions must be non-zero".to_string(),
            ));
        }

        let fov = self.headless.vertical_fov_degrees;
        if !(fov > 0.0 && fov < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "vertical field of view must be in (0, 180), got {fov}"
            )));
        }

        Ok(())
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for BridgeConfig {}
