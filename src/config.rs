//! Viewport configuration record
//!
//! The record is supplied once per `ZoomPan` instance and never mutated
//! afterwards. Field names serialize in camelCase (`zoomMax`, `zoomMin`,
//! `zoomDefault`, ...) so records written for the web component load as-is.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ZoomPanError};

/// Relative step used when neither `zoomFactor` nor `zoomStep` is given
pub const DEFAULT_ZOOM_FACTOR: f32 = 0.1;

/// How a single zoom-in/zoom-out action or wheel tick changes the scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoomStep {
    /// Multiply by `1 + factor` per step; constant relative change
    Factor(f32),
    /// Add `step` per step
    Additive(f32),
}

impl ZoomStep {
    /// Apply `delta` steps (may be negative or fractional) to `scale`.
    pub fn apply(&self, scale: f32, delta: f32) -> f32 {
        match *self {
            ZoomStep::Factor(factor) => scale * (1.0 + factor).powf(delta),
            ZoomStep::Additive(step) => scale + step * delta,
        }
    }
}

/// Configuration for a pan/zoom viewport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ZoomPanConfig {
    /// Upper scale bound; `None` or `0` means unbounded
    pub zoom_max: Option<f32>,
    /// Lower scale bound; `None` or `0` means unbounded
    pub zoom_min: Option<f32>,
    /// Scale restored by `reset()`
    pub zoom_default: f32,
    /// Scale at construction, falls back to `zoom_default`
    pub zoom_scale: Option<f32>,
    /// Multiplicative step per zoom action
    pub zoom_factor: Option<f32>,
    /// Additive step per zoom action, used only without `zoom_factor`
    pub zoom_step: Option<f32>,
    /// Minimum spacing between handled wheel events; 0 disables throttling
    pub wheel_throttle_ms: u64,
    /// Length of the slide transition for programmatic moves
    pub slide_ms: u64,
    /// Quiet window before the host offset is recomputed after a layout change
    pub layout_debounce_ms: u64,
    /// Initial content offset from the top, applied at construction
    pub top: f32,
    /// Initial content offset from the left, applied at construction
    pub left: f32,
}

impl Default for ZoomPanConfig {
    fn default() -> Self {
        Self {
            zoom_max: Some(2.0),
            zoom_min: Some(0.1),
            zoom_default: 1.0,
            zoom_scale: None,
            zoom_factor: None,
            zoom_step: None,
            wheel_throttle_ms: 20,
            slide_ms: 250,
            layout_debounce_ms: 100,
            top: 0.0,
            left: 0.0,
        }
    }
}

impl ZoomPanConfig {
    /// Parse and validate a config from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ZoomPanConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ZoomPanError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Builder-style setter for both scale bounds.
    pub fn with_bounds(mut self, zoom_min: Option<f32>, zoom_max: Option<f32>) -> Self {
        self.zoom_min = zoom_min;
        self.zoom_max = zoom_max;
        self
    }

    /// Builder-style setter for a multiplicative step.
    pub fn with_factor(mut self, factor: f32) -> Self {
        self.zoom_factor = Some(factor);
        self
    }

    /// Builder-style setter for an additive step.
    pub fn with_step(mut self, step: f32) -> Self {
        self.zoom_factor = None;
        self.zoom_step = Some(step);
        self
    }

    /// Lower bound if one is in effect.
    pub fn min_bound(&self) -> Option<f32> {
        self.zoom_min.filter(|v| *v != 0.0)
    }

    /// Upper bound if one is in effect.
    pub fn max_bound(&self) -> Option<f32> {
        self.zoom_max.filter(|v| *v != 0.0)
    }

    /// Scale the viewport starts at.
    pub fn initial_scale(&self) -> f32 {
        self.zoom_scale.unwrap_or(self.zoom_default)
    }

    /// Resolve the step mode. A factor wins over an additive step.
    pub fn zoom_step_mode(&self) -> ZoomStep {
        match (self.zoom_factor, self.zoom_step) {
            (Some(factor), _) => ZoomStep::Factor(factor),
            (None, Some(step)) => ZoomStep::Additive(step),
            (None, None) => ZoomStep::Factor(DEFAULT_ZOOM_FACTOR),
        }
    }

    pub fn wheel_throttle(&self) -> Duration {
        Duration::from_millis(self.wheel_throttle_ms)
    }

    pub fn slide_duration(&self) -> Duration {
        Duration::from_millis(self.slide_ms)
    }

    pub fn layout_debounce(&self) -> Duration {
        Duration::from_millis(self.layout_debounce_ms)
    }

    /// Check the record for values the viewport cannot work with.
    pub fn validate(&self) -> Result<()> {
        let finite = |name: &str, value: Option<f32>| -> Result<()> {
            match value {
                Some(v) if !v.is_finite() => {
                    Err(ZoomPanError::invalid_config(format!("{name} must be finite, got {v}")))
                }
                _ => Ok(()),
            }
        };

        finite("zoomMax", self.zoom_max)?;
        finite("zoomMin", self.zoom_min)?;
        finite("zoomFactor", self.zoom_factor)?;
        finite("zoomStep", self.zoom_step)?;
        finite("top", Some(self.top))?;
        finite("left", Some(self.left))?;

        if let Some(min) = self.min_bound() {
            if min < 0.0 {
                return Err(ZoomPanError::invalid_config(format!("zoomMin must not be negative, got {min}")));
            }
        }
        if let Some(max) = self.max_bound() {
            if max < 0.0 {
                return Err(ZoomPanError::invalid_config(format!("zoomMax must not be negative, got {max}")));
            }
        }
        if let (Some(min), Some(max)) = (self.min_bound(), self.max_bound()) {
            if min > max {
                return Err(ZoomPanError::invalid_config(format!(
                    "zoomMin ({min}) exceeds zoomMax ({max})"
                )));
            }
        }
        if !(self.zoom_default.is_finite() && self.zoom_default > 0.0) {
            return Err(ZoomPanError::invalid_config(format!(
                "zoomDefault must be positive, got {}",
                self.zoom_default
            )));
        }
        if let Some(scale) = self.zoom_scale {
            if !(scale.is_finite() && scale > 0.0) {
                return Err(ZoomPanError::invalid_config(format!("zoomScale must be positive, got {scale}")));
            }
        }
        if self.zoom_factor.is_some_and(|f| f < 0.0) {
            return Err(ZoomPanError::invalid_config("zoomFactor must not be negative"));
        }
        if self.zoom_step.is_some_and(|s| s < 0.0) {
            return Err(ZoomPanError::invalid_config("zoomStep must not be negative"));
        }

        Ok(())
    }
}
