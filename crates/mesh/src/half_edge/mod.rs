//! Half-edge mesh data structure for sculpting surgery
//!
//! Provides the topology information (vertex rings, boundary detection, edge
//! lookup) that the remesher needs, plus the local mutations it performs.
//!
//! ## Element lifetime
//!
//! Elements are stored in arenas indexed by their id. Removing a face marks its
//! half-edges with `face = None` and leaves the slots in place, so handles held
//! by a caller stay resolvable (and can be checked for liveness) until
//! [`HalfEdgeMesh::compact`] renumbers everything.
//!
//! ```text
//!   add_face / remove_face      (tombstones, handles stay stable)
//!            |
//!            v
//!   collapse / split            (built from remove + add)
//!            |
//!            v
//!   compact()  ->  CompactionMap (old id -> new id)
//! ```

mod construction;
mod modification;
mod topology;
mod types;
mod validation;

use std::collections::HashMap;

pub use modification::{CollapseOutcome, CompactionMap, SplitOutcome};
pub use types::{
    Corner, Face, FaceId, HalfEdge, HalfEdgeError, HalfEdgeId, NO_SOURCE_INDEX, Vertex, VertexId,
};
pub use validation::ManifoldError;

/// Half-edge mesh data structure
///
/// Triangles only. Every live directed edge is registered in `edge_map`, which
/// is how twins are found when faces are added.
#[derive(Debug, Clone, Default)]
pub struct HalfEdgeMesh {
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) half_edges: Vec<HalfEdge>,
    pub(crate) faces: Vec<Face>,
    /// Map from (origin, destination) vertex pair to half-edge
    pub(crate) edge_map: HashMap<(VertexId, VertexId), HalfEdgeId>,
}

impl HalfEdgeMesh {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }
}


#[cfg(test)]
mod tests {
    use super::test_meshes::*;
    use super::*;

    #[test]
    fn test_empty_mesh() {
        let mesh = HalfEdgeMesh::new();
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.face_count(), 0);
        assert_eq!(mesh.edge_count(), 0);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_quad_connectivity() {
        let mesh = quad();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.face_count(), 2);
        // 4 boundary edges + 1 shared diagonal
        assert_eq!(mesh.edge_count(), 5);

        let diagonal = mesh.find_edge(VertexId(0), VertexId(2)).unwrap();
        assert!(!mesh.is_boundary_edge(diagonal));
        assert!(mesh.validate().is_ok());
        assert!(mesh.check_manifold().is_ok());
    }
}
