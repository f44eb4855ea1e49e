//! Interactive sculpting with adaptive remeshing.
//!
//! A brush pushes, pulls or twists a triangle mesh while the remesher keeps
//! every edge length inside a bounded range, so the surface never gets
//! visibly faceted or needlessly dense.
//!
//! # Architecture
//!
//! One sculpting tick, driven by [`Sculptor::process_input`]:
//!
//! ```text
//!   pick point -> FieldBuilder -> Operator -> AdaptiveRemesher
//!                                   |
//!                                   +-- GENUS -> TopologyOutcome::Unhandled
//! ```
//!
//! ## Key Components
//!
//! - **Params**: the four remeshing scalars and the predicate tying them together
//! - **Field**: vertices and edges within the brush radius, linear or octree backed
//! - **Deformation**: InfDef, Twist and Sweep operators
//! - **Tessellation**: edge collapse and split toward uniform edge length
//! - **Topology**: best-effort stitching of two vertex rings
//! - **Pipeline**: the [`Sculptor`] state machine

pub mod brush;
pub mod deformation;
pub mod error;
pub mod field;
pub mod params;
pub mod pipeline;
pub mod spatial;
pub mod tessellation;
pub mod topology;
pub mod types;

pub use brush::{Brush, Falloff, MIN_SMOOTHING_EXPONENT};
pub use deformation::{DeformationResult, Displacement, Operator, apply_deformation};
pub use error::SculptError;
pub use field::{FieldBuilder, FieldVertex, InfluenceField, build_field_indexed, build_field_linear};
pub use params::{ParameterError, Parameters, displacement_bound};
pub use pipeline::{SculptOutcome, Sculptor, TopologyOutcome};
pub use spatial::{Aabb, OctreeConfig, VertexOctree};
pub use tessellation::{
    EDGE_LENGTH_TOLERANCE, RemeshDecision, RemeshOptions, RemeshStats, make_uniform,
    make_uniform_field,
};
pub use topology::{JoinReport, RingMatch, TopologicalHandler};
pub use types::{Direction, OperatorKind, ScaleFactor, SculptStage, TopologicalChange};

pub use sculpt_config::{FieldQuery, SculptConfig};
