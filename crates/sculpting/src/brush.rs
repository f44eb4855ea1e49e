//! Brush state and falloff.
//!
//! The falloff is the dome polynomial
//!
//! ```text
//!   w(x) = (n - 1) x^n - n x^(n-1) + 1        x = dist / radius in [0, 1]
//! ```
//!
//! with `w(0) = 1`, `w(1) = 0` and `w'(0) = w'(1) = 0` for `n >= 2`. Larger
//! `n` widens the plateau around the center.

use sculpt_config::SculptConfig;
use serde::{Deserialize, Serialize};

use crate::types::{Direction, OperatorKind};

/// Smallest exponent for which the dome is flat at the center.
pub const MIN_SMOOTHING_EXPONENT: u32 = 2;

/// Dome falloff with a configurable exponent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Falloff {
    exponent: u32,
}

impl Default for Falloff {
    fn default() -> Self {
        Self {
            exponent: MIN_SMOOTHING_EXPONENT,
        }
    }
}

impl Falloff {
    /// Exponents below 2 are raised to 2.
    pub fn new(exponent: u32) -> Self {
        Self {
            exponent: exponent.max(MIN_SMOOTHING_EXPONENT),
        }
    }

    pub fn exponent(&self) -> u32 {
        self.exponent
    }

    /// Strength at a normalized distance (0.0 = center, 1.0 = edge).
    pub fn evaluate(&self, normalized_distance: f32) -> f32 {
        let x = normalized_distance.clamp(0.0, 1.0);
        let n = self.exponent as i32;
        let nf = n as f32;
        (nf - 1.0) * x.powi(n) - nf * x.powi(n - 1) + 1.0
    }

    /// Strength at a distance from the brush center. Zero for a degenerate radius.
    pub fn at_distance(&self, distance: f32, radius: f32) -> f32 {
        if radius <= 0.0 {
            return 0.0;
        }
        self.evaluate(distance / radius)
    }
}

/// Interactive brush settings.
///
/// Radius changes are clamped to the tool range the brush was built with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brush {
    radius: f32,
    min_radius: f32,
    max_radius: f32,
    pub operator: OperatorKind,
    pub direction: Direction,
    pub falloff: Falloff,
}

impl Default for Brush {
    fn default() -> Self {
        Self::from_config(&SculptConfig::default())
    }
}

impl Brush {
    pub fn from_config(config: &SculptConfig) -> Self {
        Self {
            radius: config.clamp_radius(config.tool_radius),
            min_radius: config.min_tool_radius,
            max_radius: config.max_tool_radius,
            operator: OperatorKind::default(),
            direction: Direction::default(),
            falloff: Falloff::new(config.smoothing_exponent),
        }
    }

    /// Inflate brush
    pub fn inflate(config: &SculptConfig) -> Self {
        Self::from_config(config)
    }

    /// Deflate brush
    pub fn deflate(config: &SculptConfig) -> Self {
        Self {
            direction: Direction::Deflate,
            ..Self::from_config(config)
        }
    }

    /// Counter-clockwise twist brush
    pub fn twist(config: &SculptConfig) -> Self {
        Self {
            operator: OperatorKind::Twist,
            ..Self::from_config(config)
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Set the radius, clamped to the tool range. Returns the applied value.
    pub fn set_radius(&mut self, radius: f32) -> f32 {
        // Not `f32::clamp`: a deserialized brush may carry an inverted range
        self.radius = radius.max(self.min_radius).min(self.max_radius);
        self.radius
    }

    pub fn radius_range(&self) -> (f32, f32) {
        (self.min_radius, self.max_radius)
    }
}
