//! Converting measured viewport dimensions into a page capacity.
//!
//! Measurement itself happens in the presentation layer and arrives
//! asynchronously; this module only turns the numbers into `lines_per_page`.

use crate::config::LayoutConfig;

/// Available space for lyric lines, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub available_height: f32,
    pub line_height: f32,
}

impl Viewport {
    #[must_use]
    pub const fn new(available_height: f32, line_height: f32) -> Self {
        Self {
            available_height,
            line_height,
        }
    }

    /// How many whole lines fit, never less than `max(min, 1)`.
    ///
    /// Non-finite or non-positive measurements degrade to the minimum.
    #[must_use]
    pub fn lines_per_page(&self, min: usize) -> usize {
        let min = min.max(1);
        if !self.available_height.is_finite()
            || !self.line_height.is_finite()
            || self.available_height <= 0.0
            || self.line_height <= 0.0
        {
            return min;
        }

        let fits = (self.available_height / self.line_height).floor();
        // Clamped before the cast, non-negative after the checks above
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let fits = fits.min(f32::from(u16::MAX)) as usize;
        fits.max(min)
    }
}

/// Layout parameters used to derive a [`Viewport`] from a raw window height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutMetrics {
    /// Height of one lyric line at a font scale of 1.0
    pub line_height: f32,
    /// Height taken by chrome (headers, controls) that never holds lyrics
    pub reserved_height: f32,
    /// User font-size preference multiplier
    pub font_scale: f32,
}

impl LayoutMetrics {
    #[must_use]
    pub fn from_config(config: &LayoutConfig) -> Self {
        Self {
            line_height: config.line_height,
            reserved_height: config.reserved_height,
            font_scale: config.font_scale,
        }
    }

    /// Copy of these metrics with a different font scale.
    #[must_use]
    pub const fn with_font_scale(mut self, font_scale: f32) -> Self {
        self.font_scale = font_scale;
        self
    }

    /// Viewport available for lyrics inside a window of `window_height`.
    #[must_use]
    pub fn viewport(&self, window_height: f32) -> Viewport {
        let scale = if self.font_scale.is_finite() && self.font_scale > 0.0 {
            self.font_scale
        } else {
            1.0
        };
        Viewport::new(
            (window_height - self.reserved_height).max(0.0),
            self.line_height * scale,
        )
    }
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self::from_config(&LayoutConfig::default())
    }
}
