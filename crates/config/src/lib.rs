//! Shared configuration for the sculpting engine
//!
//! This crate is the single source of truth for brush limits, the ratios used
//! to derive remeshing bounds from a freshly loaded mesh, and the import scale.
//! It is plain serde data so hosts can keep it in a settings file.

use serde::{Deserialize, Serialize};

#[cfg(feature = "bevy")]
use bevy::prelude::Resource;

/// Smallest brush radius in working units
pub const DEFAULT_MIN_TOOL_RADIUS: f32 = 0.05;

/// Largest brush radius in working units
pub const DEFAULT_MAX_TOOL_RADIUS: f32 = 10.0;

/// Brush radius used until the host changes it
pub const DEFAULT_TOOL_RADIUS: f32 = 1.0;

/// Exponent of the dome falloff polynomial
pub const DEFAULT_SMOOTHING_EXPONENT: u32 = 2;

/// `minEdgeLength = average edge length * ratio`
pub const DEFAULT_MIN_EDGE_RATIO: f32 = 0.5;

/// `maxEdgeLength = average edge length * ratio`
pub const DEFAULT_MAX_EDGE_RATIO: f32 = 1.0;

/// `dThickness = maxEdgeLength * ratio`
pub const DEFAULT_THICKNESS_RATIO: f32 = 1.0;

/// Share of the largest safe displacement used as `dMove`
pub const DEFAULT_DISPLACEMENT_FRACTION: f32 = 0.5;

/// Remesh passes per interaction tick
pub const DEFAULT_REMESH_PASSES: u32 = 1;

/// How the influence field is gathered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldQuery {
    /// Scan every vertex and edge
    LinearScan,
    /// Vertex octree, rebuilt lazily after remeshing
    #[default]
    Octree,
}

/// Sculpting configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "bevy", derive(Resource))]
#[serde(default)]
pub struct SculptConfig {
    /// Lower clamp for the brush radius
    pub min_tool_radius: f32,
    /// Upper clamp for the brush radius
    pub max_tool_radius: f32,
    /// Initial brush radius
    pub tool_radius: f32,
    /// Initial falloff exponent (at least 2)
    pub smoothing_exponent: u32,
    pub min_edge_ratio: f32,
    pub max_edge_ratio: f32,
    pub thickness_ratio: f32,
    /// In `(0, 1]`
    pub displacement_fraction: f32,
    /// Per-axis scale applied on import, inverted on export
    pub import_scale: [f32; 3],
    /// Remesh passes per tick (1 = single collapse+split pass)
    pub remesh_passes: u32,
    pub field_query: FieldQuery,
}

impl Default for SculptConfig {
    fn default() -> Self {
        Self {
            min_tool_radius: DEFAULT_MIN_TOOL_RADIUS,
            max_tool_radius: DEFAULT_MAX_TOOL_RADIUS,
            tool_radius: DEFAULT_TOOL_RADIUS,
            smoothing_exponent: DEFAULT_SMOOTHING_EXPONENT,
            min_edge_ratio: DEFAULT_MIN_EDGE_RATIO,
            max_edge_ratio: DEFAULT_MAX_EDGE_RATIO,
            thickness_ratio: DEFAULT_THICKNESS_RATIO,
            displacement_fraction: DEFAULT_DISPLACEMENT_FRACTION,
            import_scale: [1.0, 1.0, 1.0],
            remesh_passes: DEFAULT_REMESH_PASSES,
            field_query: FieldQuery::default(),
        }
    }
}

/// Reasons a configuration is rejected
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("tool radius range [{min}, {max}] is empty or non-positive")]
    ToolRadiusRange { min: f32, max: f32 },
    #[error("smoothing exponent {0} is below 2")]
    SmoothingExponent(u32),
    #[error("edge ratios min={min} max={max} must satisfy 0 < min <= max / 2")]
    EdgeRatios { min: f32, max: f32 },
    #[error("thickness ratio {0} leaves no room for displacement")]
    ThicknessRatio(f32),
    #[error("displacement fraction {0} is outside (0, 1]")]
    DisplacementFraction(f32),
    #[error("import scale {0:?} has a zero or non-finite axis")]
    ImportScale([f32; 3]),
    #[error("remesh passes must be at least 1")]
    RemeshPasses,
    #[error("invalid config JSON: {0}")]
    Json(String),
}

impl SculptConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Json(e.to_string()))
    }

    /// Check every field. Derived remeshing parameters are only guaranteed to
    /// be valid for a config that passes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_tool_radius > 0.0 && self.min_tool_radius <= self.max_tool_radius) {
            return Err(ConfigError::ToolRadiusRange {
                min: self.min_tool_radius,
                max: self.max_tool_radius,
            });
        }
        if self.smoothing_exponent < 2 {
            return Err(ConfigError::SmoothingExponent(self.smoothing_exponent));
        }
        if !(self.min_edge_ratio > 0.0 && self.min_edge_ratio <= self.max_edge_ratio / 2.0) {
            return Err(ConfigError::EdgeRatios {
                min: self.min_edge_ratio,
                max: self.max_edge_ratio,
            });
        }
        // dThickness must exceed maxEdgeLength / sqrt(3)
        if !(self.thickness_ratio > 1.0 / 3.0_f32.sqrt()) {
            return Err(ConfigError::ThicknessRatio(self.thickness_ratio));
        }
        if !(self.displacement_fraction > 0.0 && self.displacement_fraction <= 1.0) {
            return Err(ConfigError::DisplacementFraction(self.displacement_fraction));
        }
        if self
            .import_scale
            .iter()
            .any(|s| !s.is_finite() || *s == 0.0)
        {
            return Err(ConfigError::ImportScale(self.import_scale));
        }
        if self.remesh_passes == 0 {
            return Err(ConfigError::RemeshPasses);
        }
        Ok(())
    }

    /// Clamp a radius into the configured tool range. An inverted range
    /// resolves to `max_tool_radius`; NaN resolves to the lower bound.
    pub fn clamp_radius(&self, radius: f32) -> f32 {
        radius.max(self.min_tool_radius).min(self.max_tool_radius)
    }
}
