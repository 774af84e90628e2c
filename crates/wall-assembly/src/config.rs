//! Wall parameters: defaults, JSON loading and validation.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{invalid, require_positive, Result, WallError};

/// Rectangular cross-section of a bar, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub width: f64,
    pub height: f64,
}

impl Section {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn validate(&self) -> Result<()> {
        require_positive(&[("section width", self.width), ("section height", self.height)])
    }
}

/// Regular grid of holes drilled through a panel.
///
/// `x` runs along the panel height, `y` along its width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HolePattern {
    pub x_start: f64,
    pub x_dist: f64,
    pub y_start: f64,
    pub y_dist: f64,
    pub diameter: f64,
}

impl Default for HolePattern {
    fn default() -> Self {
        Self {
            x_start: 100.0,
            x_dist: 200.0,
            y_start: 100.0,
            y_dist: 200.0,
            diameter: 13.0,
        }
    }
}

impl HolePattern {
    pub fn validate(&self) -> Result<()> {
        require_positive(&[
            ("hole x spacing", self.x_dist),
            ("hole y spacing", self.y_dist),
            ("hole diameter", self.diameter),
        ])?;
        for (name, start) in [("hole x start", self.x_start), ("hole y start", self.y_start)] {
            if !(start.is_finite() && start >= 0.0) {
                return Err(invalid(format!("{name} must be non-negative, got {start}")));
            }
        }
        let spacing = self.x_dist.min(self.y_dist);
        if self.diameter >= spacing {
            return Err(invalid(format!(
                "hole diameter {} must be smaller than the hole spacing {}",
                self.diameter, spacing
            )));
        }
        Ok(())
    }
}

/// High-level parameters of the climbing wall, in millimetres and degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WallParams {
    pub width: f64,
    pub height: f64,
    pub thickness: f64,
    /// Overhang angle from vertical.
    pub angle: f64,
    pub gap: f64,
    pub safety: f64,
    pub holes: HolePattern,
    /// Floor, back, diagonal and top bars.
    pub bar_section: Section,
    /// Front vertical bars.
    pub front_section: Section,
}

impl Default for WallParams {
    fn default() -> Self {
        Self {
            width: 2000.0,
            height: 2400.0,
            thickness: 21.0,
            angle: 25.0,
            gap: 100.0,
            safety: 500.0,
            holes: HolePattern::default(),
            bar_section: Section::new(100.0, 80.0),
            front_section: Section::new(100.0, 100.0),
        }
    }
}

impl WallParams {
    pub fn validate(&self) -> Result<()> {
        require_positive(&[
            ("wall width", self.width),
            ("wall height", self.height),
            ("wall thickness", self.thickness),
        ])?;
        if !(self.angle.is_finite() && self.angle > 0.0 && self.angle < 90.0) {
            return Err(invalid(format!(
                "wall angle must lie strictly between 0 and 90 degrees, got {}",
                self.angle
            )));
        }
        for (name, value) in [("gap", self.gap), ("safety", self.safety)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(invalid(format!("{name} must be non-negative, got {value}")));
            }
        }
        if self.width <= self.bar_section.height {
            return Err(invalid(format!(
                "wall width {} must exceed the bar height {}",
                self.width, self.bar_section.height
            )));
        }
        self.bar_section.validate()?;
        self.front_section.validate()?;
        self.holes.validate()
    }

    /// Parse parameters from JSON; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let params: WallParams = serde_json::from_str(json).map_err(|e| WallError::Config {
            reason: format!("invalid wall parameters: {e}"),
        })?;
        params.validate()?;
        Ok(params)
    }

    /// Read and parse a JSON parameter file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| WallError::Config {
            reason: format!("cannot read {}: {e}", path.display()),
        })?;
        Self::from_json_str(&text)
    }
}
