use crate::error::{CoreError, Result};
use crate::override_timer::DEFAULT_OVERRIDE_TIMEOUT;
use crate::time::DurationExt;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBookConfig {
    #[serde(default)]
    pub scorebook: PagingConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingConfig {
    /// How long manual navigation suppresses auto-advance
    #[serde(default = "default_override_timeout_ms")]
    pub override_timeout_ms: u64,
    /// Quiet period before a burst of viewport changes is applied
    #[serde(default = "default_resize_debounce_ms")]
    pub resize_debounce_ms: u64,
    #[serde(default = "default_min_lines_per_page")]
    pub min_lines_per_page: usize,
}

fn default_override_timeout_ms() -> u64 {
    DEFAULT_OVERRIDE_TIMEOUT.as_millis_u64()
}

const fn default_resize_debounce_ms() -> u64 {
    150
}

const fn default_min_lines_per_page() -> usize {
    1
}

impl PagingConfig {
    #[must_use]
    pub const fn override_timeout(&self) -> Duration {
        Duration::from_millis(self.override_timeout_ms)
    }

    #[must_use]
    pub const fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            override_timeout_ms: default_override_timeout_ms(),
            resize_debounce_ms: default_resize_debounce_ms(),
            min_lines_per_page: default_min_lines_per_page(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Height of one lyric line in logical pixels at font scale 1.0
    #[serde(default = "default_line_height")]
    pub line_height: f32,
    /// Space taken by headers and controls
    #[serde(default = "default_reserved_height")]
    pub reserved_height: f32,
    #[serde(default = "default_font_scale")]
    pub font_scale: f32,
    /// Window height used until the first real measurement arrives
    #[serde(default = "default_window_height")]
    pub window_height: f32,
}

const fn default_line_height() -> f32 {
    32.0
}

const fn default_reserved_height() -> f32 {
    96.0
}

const fn default_font_scale() -> f32 {
    1.0
}

const fn default_window_height() -> f32 {
    480.0
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            line_height: default_line_height(),
            reserved_height: default_reserved_height(),
            font_scale: default_font_scale(),
            window_height: default_window_height(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Interval between simulated clock ticks
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default = "default_speed")]
    pub speed: f64,
}

const fn default_tick_ms() -> u64 {
    50
}

const fn default_speed() -> f64 {
    1.0
}

impl PlaybackConfig {
    #[must_use]
    pub const fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            speed: default_speed(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write logs to `~/.config/scorebook/scorebook.log`
    #[serde(default)]
    pub enabled: bool,
}

impl ScoreBookConfig {
    /// Get the config file path (~/.config/scorebook/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load config from the default path, writing a template on first run.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigNotFound`] after creating the template, or an
    /// error if the file cannot be read, parsed or validated.
    pub fn load_or_create() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&config_path, CONFIG_TEMPLATE)?;
            return Err(CoreError::ConfigNotFound { path: config_path });
        }

        Self::load_from(&config_path)
    }

    /// Load and validate config from an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigParseError`] for TOML errors and
    /// [`CoreError::ConfigInvalid`] for out-of-range values.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigInvalid`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| -> Result<()> {
            Err(CoreError::ConfigInvalid {
                message: message.to_string(),
            })
        };

        if self.scorebook.min_lines_per_page == 0 {
            return invalid("scorebook.min_lines_per_page must be at least 1");
        }
        if !(self.layout.line_height.is_finite() && self.layout.line_height > 0.0) {
            return invalid("layout.line_height must be a positive number");
        }
        if !(self.layout.font_scale.is_finite() && self.layout.font_scale > 0.0) {
            return invalid("layout.font_scale must be a positive number");
        }
        if !(self.layout.reserved_height.is_finite() && self.layout.reserved_height >= 0.0) {
            return invalid("layout.reserved_height must not be negative");
        }
        if self.playback.tick_ms == 0 {
            return invalid("playback.tick_ms must be at least 1");
        }
        if !(self.playback.speed.is_finite() && self.playback.speed > 0.0) {
            return invalid("playback.speed must be a positive number");
        }
        Ok(())
    }
}

pub const CONFIG_TEMPLATE: &str = r"# Scorebook Configuration
# ~/.config/scorebook/config.toml

[scorebook]
# Manual navigation pauses auto-advance for this long (milliseconds)
override_timeout_ms = 4000
# Viewport changes are applied once they have been quiet this long
resize_debounce_ms = 150
min_lines_per_page = 1

[layout]
# Logical pixels
line_height = 32
reserved_height = 96
font_scale = 1.0
window_height = 480

[playback]
# Simulated clock tick and speed multiplier
tick_ms = 50
speed = 1.0

[logging]
# Write logs to ~/.config/scorebook/scorebook.log
enabled = false
";
