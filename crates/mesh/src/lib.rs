//! Triangle mesh kernel for interactive sculpting
//!
//! This crate provides the connectivity layer the sculpting engine operates on:
//! - [`half_edge`] - Half-edge mesh with local surgery (collapse, split, compaction)
//! - [`indexed`] - Indexed triangle list used at the import/export boundary
//! - [`primitives`] - Small procedural meshes (triangle lattice, icosahedron)
//!
//! With the `bevy` feature enabled, [`IndexedMesh`] converts to and from
//! `bevy::mesh::Mesh`.

pub mod half_edge;
pub mod indexed;
pub mod primitives;

#[cfg(feature = "bevy")]
mod bevy_mesh;

pub use half_edge::{
    CollapseOutcome, CompactionMap, Corner, Face, FaceId, HalfEdge, HalfEdgeError, HalfEdgeId,
    HalfEdgeMesh, ManifoldError, SplitOutcome, Vertex, VertexId,
};
pub use indexed::{IndexedMesh, PackedVertex};
