//! Error types for the sculpting engine.

use mesh::{HalfEdgeError, VertexId};

use crate::params::ParameterError;
use crate::types::TopologicalChange;

/// Errors surfaced by [`crate::Sculptor`] and the topology stage.
///
/// Remesh steps that would break manifoldness are not errors; they are
/// skipped and counted in [`crate::RemeshStats`].
#[derive(Debug, thiserror::Error)]
pub enum SculptError {
    #[error("invalid remeshing parameters: {0}")]
    InvalidParameters(#[from] ParameterError),
    #[error("mesh import failed: {0}")]
    Import(#[from] HalfEdgeError),
    #[error("mesh has no edges to derive remeshing bounds from")]
    NoEdges,
    #[error("scale factor {0:?} has a zero or non-finite axis")]
    InvalidScale([f32; 3]),
    #[error("vertex {0:?} is not part of the mesh")]
    MissingVertex(VertexId),
    #[error("topology change {0:?} has no handler")]
    UnhandledTopologyChange(TopologicalChange),
}
