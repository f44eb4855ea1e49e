//! Type definitions for the half-edge mesh data structure.

use glam::{Vec2, Vec3};

/// Type-safe vertex identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub u32);

/// Type-safe half-edge identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HalfEdgeId(pub u32);

/// Type-safe face identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FaceId(pub u32);

/// A vertex in the half-edge mesh
#[derive(Debug, Clone)]
pub struct Vertex {
    pub id: VertexId,
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Option<Vec2>,
    /// One outgoing half-edge from this vertex. `None` once the vertex has no faces.
    pub outgoing_half_edge: Option<HalfEdgeId>,
    /// Index in the imported vertex buffer (`u32::MAX` for vertices created by surgery)
    pub source_index: u32,
}

/// A half-edge in the mesh
///
/// Each interior edge is represented by two half-edges pointing in opposite
/// directions. Boundary edges have a single half-edge with `twin = None`.
#[derive(Debug, Clone)]
pub struct HalfEdge {
    pub id: HalfEdgeId,
    /// The vertex this half-edge originates from
    pub origin: VertexId,
    /// The opposite half-edge (None for boundary edges)
    pub twin: Option<HalfEdgeId>,
    /// The next half-edge around the face (counter-clockwise)
    pub next: HalfEdgeId,
    /// The previous half-edge around the face (counter-clockwise)
    pub prev: HalfEdgeId,
    /// The owning face. `None` marks a removed half-edge awaiting compaction.
    pub face: Option<FaceId>,
    /// Attributes of the face corner at `origin`, when they differ from the vertex
    pub corner: Option<Corner>,
}

/// Per-corner attributes of a vertex welded from several imported vertices.
///
/// Exporters duplicate a vertex wherever its faces disagree on uv or normal
/// (texture seams, hard edges). Import welds the duplicates into one vertex
/// and records what each face corner saw, so export can split them again.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corner {
    /// Imported vertex this corner came from, [`NO_SOURCE_INDEX`] if made by surgery
    pub source_index: u32,
    pub uv: Option<Vec2>,
    /// Imported normal, dropped once the surface around the vertex changes
    pub normal: Option<Vec3>,
}

/// A triangular face in the mesh
#[derive(Debug, Clone)]
pub struct Face {
    pub id: FaceId,
    /// One half-edge on the boundary of this face
    pub half_edge: HalfEdgeId,
    /// Cached face normal
    pub normal: Vec3,
    /// Per-face annotation carried through import, surgery and export
    pub tag: u32,
}

/// Source index used for vertices that did not come from an imported buffer.
pub const NO_SOURCE_INDEX: u32 = u32::MAX;

/// Errors that can occur during half-edge mesh operations
#[derive(Debug, thiserror::Error)]
pub enum HalfEdgeError {
    #[error("Mesh has no positions")]
    NoPositions,
    #[error("Mesh has no indices")]
    NoIndices,
    #[error("Attribute {attribute} has {actual} entries, expected {expected}")]
    AttributeLength {
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
    #[error("Invalid mesh topology: {0}")]
    InvalidTopology(String),
    #[error("Non-manifold edge detected")]
    NonManifoldEdge,
}
