//! Core sculpting types.

use glam::Vec3;
use mesh::IndexedMesh;
use serde::{Deserialize, Serialize};

use crate::error::SculptError;

/// Sense of a deformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    /// Along the normal (or counter-clockwise about it for twist)
    #[default]
    Inflate,
    /// Against the normal (or clockwise about it for twist)
    Deflate,
}

impl Direction {
    /// +1 for inflate, -1 for deflate
    pub fn sign(self) -> f32 {
        match self {
            Direction::Inflate => 1.0,
            Direction::Deflate => -1.0,
        }
    }

    /// The other direction
    pub fn flipped(self) -> Self {
        match self {
            Direction::Inflate => Direction::Deflate,
            Direction::Deflate => Direction::Inflate,
        }
    }
}

/// Which deformation the brush applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OperatorKind {
    /// Reserved, leaves the mesh untouched
    Sweep,
    /// Inflate/deflate along vertex normals
    #[default]
    InfDef,
    /// Rotate about the normal at the field center
    Twist,
}

/// Topology event reported by an operator after deforming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TopologicalChange {
    #[default]
    None,
    /// The deformation merged or split surface components
    Genus,
}

/// Where a sculpting tick currently is.
///
/// ```text
///   Idle -> FieldBuilt -> Deformed -> Remeshed -> Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SculptStage {
    #[default]
    Idle,
    FieldBuilt,
    Deformed,
    Remeshed,
}

/// Per-axis scale between the source asset and sculpting units.
///
/// Import multiplies positions by the factor, export by its inverse. Normals
/// go through the inverse transpose (divide by the factor) and are
/// renormalized, so they stay perpendicular to the scaled surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactor(Vec3);

impl Default for ScaleFactor {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ScaleFactor {
    pub const IDENTITY: Self = Self(Vec3::ONE);

    /// Rejects zero and non-finite axes.
    pub fn new(scale: Vec3) -> Result<Self, SculptError> {
        if !scale.is_finite() || scale.cmpeq(Vec3::ZERO).any() {
            return Err(SculptError::InvalidScale(scale.to_array()));
        }
        Ok(Self(scale))
    }

    pub fn uniform(scale: f32) -> Result<Self, SculptError> {
        Self::new(Vec3::splat(scale))
    }

    pub fn from_array(scale: [f32; 3]) -> Result<Self, SculptError> {
        Self::new(Vec3::from_array(scale))
    }

    pub fn as_vec3(&self) -> Vec3 {
        self.0
    }

    pub fn inverse(&self) -> Self {
        Self(self.0.recip())
    }

    pub fn is_identity(&self) -> bool {
        self.0 == Vec3::ONE
    }

    /// Map a point from source units into sculpting units.
    pub fn to_working(&self, point: Vec3) -> Vec3 {
        point * self.0
    }

    /// Map a point from sculpting units back into source units.
    pub fn from_working(&self, point: Vec3) -> Vec3 {
        point / self.0
    }

    /// Scale positions and fix up normals. Everything else is copied.
    pub fn apply(&self, source: &IndexedMesh) -> IndexedMesh {
        if self.is_identity() {
            return source.clone();
        }
        let mut scaled = source.clone();
        for p in &mut scaled.positions {
            *p = (Vec3::from_array(*p) * self.0).to_array();
        }
        for n in &mut scaled.normals {
            *n = (Vec3::from_array(*n) / self.0).normalize_or_zero().to_array();
        }
        scaled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_sign() {
        assert_eq!(Direction::Inflate.sign(), 1.0);
        assert_eq!(Direction::Deflate.sign(), -1.0);
        assert_eq!(Direction::Inflate.flipped(), Direction::Deflate);
    }

    #[test]
    fn test_scale_factor_rejects_zero_axis() {
        assert!(ScaleFactor::new(Vec3::new(1.0, 0.0, 1.0)).is_err());
        assert!(ScaleFactor::new(Vec3::new(1.0, f32::NAN, 1.0)).is_err());
        assert!(ScaleFactor::uniform(2.0).is_ok());
    }

    #[test]
    fn test_scale_then_inverse_restores_positions() {
        let source = IndexedMesh::icosahedron(1.0);
        let scale = ScaleFactor::new(Vec3::new(2.0, 0.5, 3.0)).unwrap();
        let restored = scale.inverse().apply(&scale.apply(&source));
        for (a, b) in restored.positions.iter().zip(&source.positions) {
            assert!((Vec3::from_array(*a) - Vec3::from_array(*b)).length() < 1e-5);
        }
        for (a, b) in restored.normals.iter().zip(&source.normals) {
            assert!((Vec3::from_array(*a) - Vec3::from_array(*b)).length() < 1e-5);
        }
    }

    #[test]
    fn test_point_mapping_matches_mesh_scaling() {
        let source = IndexedMesh::icosahedron(1.0);
        let scale = ScaleFactor::new(Vec3::new(2.0, 0.5, -3.0)).unwrap();
        let scaled = scale.apply(&source);
        for (a, b) in source.positions.iter().zip(&scaled.positions) {
            let working = scale.to_working(Vec3::from_array(*a));
            assert!(working.distance(Vec3::from_array(*b)) < 1e-6);
            assert!(scale.from_working(working).distance(Vec3::from_array(*a)) < 1e-6);
        }
    }

    #[test]
    fn test_scaled_normals_stay_perpendicular() {
        // Plane x + y = 1 has normal (1, 1, 0)/sqrt(2); stretching x by 2
        // maps it to x/2 + y = 1 with normal along (0.5, 1, 0).
        let mesh = IndexedMesh {
            positions: vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 1.0, 1.0]],
            normals: vec![[std::f32::consts::FRAC_1_SQRT_2, std::f32::consts::FRAC_1_SQRT_2, 0.0]; 3],
            uvs: None,
            tangents: None,
            indices: vec![0, 1, 2],
            face_tags: vec![],
        };
        let scale = ScaleFactor::new(Vec3::new(2.0, 1.0, 1.0)).unwrap();
        let scaled = scale.apply(&mesh);
        let normal = Vec3::from_array(scaled.normals[0]);
        let edge = Vec3::from_array(scaled.positions[1]) - Vec3::from_array(scaled.positions[0]);
        assert!(normal.dot(edge).abs() < 1e-6);
        assert!((normal.length() - 1.0).abs() < 1e-6);
    }
}
