//! Input translation configuration.
//!
//! [`InputConfig`] carries the platform settings the translation layer
//! depends on: the double-click window, wheel step constants, and whether
//! Control and Meta are presented swapped. It can be built in code or
//! loaded from TOML.
//!
//! # Example
//!
//! ```ignore
//! use horizon_lattice_webinput::config::{InputConfig, Platform};
//!
//! let config = InputConfig::new()
//!     .with_platform(Platform::MacOs)
//!     .with_double_click_interval_ms(500)
//!     .with_wheel_scroll_lines(5);
//!
//! let from_file = InputConfig::load("input.toml")?;
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Host platform whose input conventions are followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    Windows,
    #[serde(rename = "macos")]
    MacOs,
}

impl Platform {
    /// The platform this crate was compiled for.
    pub const fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Linux
        }
    }

    /// Whether the toolkit reports Command as Control on this platform.
    pub const fn swaps_control_and_meta(self) -> bool {
        matches!(self, Platform::MacOs)
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

/// Configuration for input translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Platform conventions to follow.
    platform: Platform,
    /// Maximum time between presses of one click streak.
    double_click_interval_ms: u64,
    /// Maximum Manhattan distance between presses of one click streak.
    start_drag_distance: f32,
    /// Lines scrolled per wheel tick.
    wheel_scroll_lines: u32,
    /// Angle-delta units per wheel tick.
    wheel_deltas_per_step: f32,
    /// Pixels per scrolled line.
    scroll_step_pixels: f32,
    /// Explicit Control/Meta swap; `None` follows the platform.
    swap_control_meta: Option<bool>,
    /// Whether engine-produced pinch gestures zoom the page.
    pinch_to_zoom: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            platform: Platform::current(),
            double_click_interval_ms: 400,
            start_drag_distance: 10.0,
            wheel_scroll_lines: 3,
            wheel_deltas_per_step: 120.0,
            scroll_step_pixels: 20.0,
            swap_control_meta: None,
            pinch_to_zoom: true,
        }
    }
}

impl InputConfig {
    /// Create a configuration with platform defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a configuration from TOML text.
    ///
    /// Missing keys take their default values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check that every value is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.wheel_scroll_lines == 0 {
            return Err(ConfigError::invalid("wheel_scroll_lines", "must be at least 1"));
        }
        if !(self.wheel_deltas_per_step > 0.0) {
            return Err(ConfigError::invalid(
                "wheel_deltas_per_step",
                format!("must be positive, got {}", self.wheel_deltas_per_step),
            ));
        }
        if !(self.scroll_step_pixels > 0.0) {
            return Err(ConfigError::invalid(
                "scroll_step_pixels",
                format!("must be positive, got {}", self.scroll_step_pixels),
            ));
        }
        if !(self.start_drag_distance >= 0.0) {
            return Err(ConfigError::invalid(
                "start_drag_distance",
                format!("must not be negative, got {}", self.start_drag_distance),
            ));
        }
        Ok(())
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_double_click_interval_ms(mut self, interval_ms: u64) -> Self {
        self.double_click_interval_ms = interval_ms;
        self
    }

    pub fn with_start_drag_distance(mut self, distance: f32) -> Self {
        self.start_drag_distance = distance;
        self
    }

    pub fn with_wheel_scroll_lines(mut self, lines: u32) -> Self {
        self.wheel_scroll_lines = lines;
        self
    }

    pub fn with_wheel_deltas_per_step(mut self, deltas: f32) -> Self {
        self.wheel_deltas_per_step = deltas;
        self
    }

    pub fn with_scroll_step_pixels(mut self, pixels: f32) -> Self {
        self.scroll_step_pixels = pixels;
        self
    }

    /// Force the Control/Meta swap on or off regardless of platform.
    pub fn with_swap_control_meta(mut self, swap: bool) -> Self {
        self.swap_control_meta = Some(swap);
        self
    }

    pub fn with_pinch_to_zoom(mut self, enabled: bool) -> Self {
        self.pinch_to_zoom = enabled;
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn double_click_interval(&self) -> Duration {
        Duration::from_millis(self.double_click_interval_ms)
    }

    pub fn start_drag_distance(&self) -> f32 {
        self.start_drag_distance
    }

    pub fn wheel_scroll_lines(&self) -> u32 {
        self.wheel_scroll_lines
    }

    pub fn wheel_deltas_per_step(&self) -> f32 {
        self.wheel_deltas_per_step
    }

    pub fn scroll_step_pixels(&self) -> f32 {
        self.scroll_step_pixels
    }

    /// Effective Control/Meta swap.
    pub fn swap_control_meta(&self) -> bool {
        self.swap_control_meta
            .unwrap_or_else(|| self.platform.swaps_control_and_meta())
    }

    pub fn pinch_to_zoom(&self) -> bool {
        self.pinch_to_zoom
    }
}
