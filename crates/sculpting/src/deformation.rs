//! Deformation operators.
//!
//! An [`Operator`] turns an influence field into per-vertex displacements.
//! [`Operator::apply`] is pure; [`apply_deformation`] writes the
//! result into the mesh and records original positions.
//!
//! | operator | displacement of a field vertex at normalized distance `x` |
//! |----------|------------------------------------------------------------|
//! | InfDef   | `sign * w(x) * dMove` along the vertex normal              |
//! | Twist    | rotation by `sign * w(x) * dMove / radius` radians about the normal at the center |
//! | Sweep    | none                                                       |
//!
//! `w` is the brush [`Falloff`]. Vertex normals must be current before
//! calling. No operator moves a vertex further than `dMove`.

use glam::{Quat, Vec3};
use mesh::{HalfEdgeMesh, VertexId};
use std::collections::HashMap;
use tracing::trace;

use crate::brush::Falloff;
use crate::field::InfluenceField;
use crate::types::{Direction, OperatorKind, TopologicalChange};

/// A deformation operator with its interactive settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operator {
    Sweep,
    InfDef { direction: Direction, falloff: Falloff },
    Twist { direction: Direction, falloff: Falloff },
}

/// Offset for one vertex
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Displacement {
    pub vertex: VertexId,
    pub offset: Vec3,
}

/// Result of applying an operator.
#[derive(Debug, Default)]
pub struct DeformationResult {
    /// Vertices that were moved
    pub modified_vertices: Vec<VertexId>,
    /// Positions before the move
    pub original_positions: HashMap<VertexId, Vec3>,
    pub topological_change: TopologicalChange,
}

impl Operator {
    pub fn new(kind: OperatorKind, direction: Direction, falloff: Falloff) -> Self {
        match kind {
            OperatorKind::Sweep => Operator::Sweep,
            OperatorKind::InfDef => Operator::InfDef { direction, falloff },
            OperatorKind::Twist => Operator::Twist { direction, falloff },
        }
    }

    pub fn kind(&self) -> OperatorKind {
        match self {
            Operator::Sweep => OperatorKind::Sweep,
            Operator::InfDef { .. } => OperatorKind::InfDef,
            Operator::Twist { .. } => OperatorKind::Twist,
        }
    }

    pub fn direction(&self) -> Option<Direction> {
        match self {
            Operator::Sweep => None,
            Operator::InfDef { direction, .. } | Operator::Twist { direction, .. } => {
                Some(*direction)
            }
        }
    }

    pub fn set_direction(&mut self, new_direction: Direction) {
        if let Operator::InfDef { direction, .. } | Operator::Twist { direction, .. } = self {
            *direction = new_direction;
        }
    }

    pub fn set_falloff(&mut self, new_falloff: Falloff) {
        if let Operator::InfDef { falloff, .. } | Operator::Twist { falloff, .. } = self {
            *falloff = new_falloff;
        }
    }

    /// Topology event caused by the last application. Neither InfDef nor
    /// Twist can change genus, so this is always `None` today.
    pub fn topological_change(&self) -> TopologicalChange {
        TopologicalChange::None
    }

    /// Signed strength `b` at a distance from the pick point:
    /// `sign * w(dist / radius) * dMove` (0 for Sweep).
    pub fn strength(&self, distance: f32, radius: f32, d_move: f32) -> f32 {
        match self {
            Operator::Sweep => 0.0,
            Operator::InfDef { direction, falloff } | Operator::Twist { direction, falloff } => {
                direction.sign() * falloff.at_distance(distance, radius) * d_move
            }
        }
    }

    /// Offsets for every field vertex. Does not touch the mesh.
    pub fn apply(
        &self,
        mesh: &HalfEdgeMesh,
        field: &InfluenceField,
        radius: f32,
        d_move: f32,
    ) -> Vec<Displacement> {
        if radius <= 0.0 {
            return Vec::new();
        }
        match self {
            Operator::Sweep => Vec::new(),
            Operator::InfDef { .. } => field
                .vertices
                .iter()
                .filter_map(|fv| {
                    let vertex = mesh.vertex(fv.vertex)?;
                    let b = self.strength(fv.distance, radius, d_move);
                    Some(Displacement {
                        vertex: fv.vertex,
                        offset: vertex.normal.normalize_or_zero() * b,
                    })
                })
                .collect(),
            Operator::Twist { .. } => {
                let Some(center) = field.center.and_then(|c| mesh.vertex(c)) else {
                    return Vec::new();
                };
                let axis = center.normal.normalize_or_zero();
                if axis == Vec3::ZERO {
                    return Vec::new();
                }
                field
                    .vertices
                    .iter()
                    .filter_map(|fv| {
                        let position = mesh.vertex(fv.vertex)?.position;
                        let angle = self.strength(fv.distance, radius, d_move) / radius;
                        let rotated = center.position
                            + Quat::from_axis_angle(axis, angle) * (position - center.position);
                        Some(Displacement {
                            vertex: fv.vertex,
                            offset: rotated - position,
                        })
                    })
                    .collect()
            }
        }
    }
}

/// Apply an operator to the mesh, moving field vertices in place.
pub fn apply_deformation(
    operator: &Operator,
    mesh: &mut HalfEdgeMesh,
    field: &InfluenceField,
    radius: f32,
    d_move: f32,
) -> DeformationResult {
    let displacements = operator.apply(mesh, field, radius, d_move);

    let mut result = DeformationResult {
        topological_change: operator.topological_change(),
        ..Default::default()
    };
    for d in displacements {
        if d.offset == Vec3::ZERO {
            continue;
        }
        let Some(old) = mesh.vertex(d.vertex).map(|v| v.position) else {
            continue;
        };
        mesh.set_vertex_position(d.vertex, old + d.offset);
        result.original_positions.insert(d.vertex, old);
        result.modified_vertices.push(d.vertex);
    }

    trace!(
        "apply_deformation: {:?} moved {} of {} field vertices",
        operator.kind(),
        result.modified_vertices.len(),
        field.vertices.len()
    );
    result
}
