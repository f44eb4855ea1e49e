//! Sculpting orchestration.
//!
//! [`Sculptor`] owns the mesh and runs one sculpting tick per pointer sample:
//!
//! ```text
//!   pick point -> influence field -> operator -> remesh field edges
//!   Idle       -> FieldBuilt      -> Deformed  -> Remeshed -> Idle
//! ```
//!
//! A tick runs to completion before returning. Vertex and edge ids are only
//! valid until the next call that mutates the mesh; hosts should not keep
//! them across ticks.

use glam::Vec3;
use mesh::{HalfEdgeMesh, IndexedMesh, VertexId};
use sculpt_config::SculptConfig;
use tracing::{debug, info, trace, warn};

#[cfg(feature = "bevy")]
use bevy::prelude::Resource;

use crate::brush::{Brush, Falloff};
use crate::deformation::{Operator, apply_deformation};
use crate::error::SculptError;
use crate::field::FieldBuilder;
use crate::params::{ParameterError, Parameters};
use crate::tessellation::{RemeshOptions, RemeshStats, make_uniform, make_uniform_field};
use crate::topology::{JoinReport, TopologicalHandler};
use crate::types::{Direction, OperatorKind, ScaleFactor, SculptStage, TopologicalChange};

/// What happened to a topology event reported by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TopologyOutcome {
    #[default]
    Unchanged,
    /// The operator reported a change nothing in the tick resolves
    Unhandled(TopologicalChange),
}

impl TopologyOutcome {
    pub fn from_change(change: TopologicalChange) -> Self {
        match change {
            TopologicalChange::None => TopologyOutcome::Unchanged,
            change => TopologyOutcome::Unhandled(change),
        }
    }
}

/// Result of one sculpting tick.
#[derive(Debug, Default)]
pub struct SculptOutcome {
    /// Last stage the tick reached before returning to idle
    pub reached: SculptStage,
    pub field_vertices: usize,
    pub vertices_moved: usize,
    pub remesh: RemeshStats,
    pub topology: TopologyOutcome,
}

/// Interactive sculpting session over one mesh.
#[cfg_attr(feature = "bevy", derive(Resource))]
#[derive(Debug)]
pub struct Sculptor {
    config: SculptConfig,
    mesh: HalfEdgeMesh,
    params: Parameters,
    brush: Brush,
    field_builder: FieldBuilder,
    remesh_options: RemeshOptions,
    scale: ScaleFactor,
    stage: SculptStage,
}

impl Default for Sculptor {
    fn default() -> Self {
        Self::new(SculptConfig::default())
    }
}

impl Sculptor {
    /// An empty session. Parameters stay invalid until a mesh is loaded.
    ///
    /// A config that fails validation is replaced by the defaults.
    pub fn new(config: SculptConfig) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(err) => {
                warn!("Sculptor::new: {}, using the default config", err);
                SculptConfig::default()
            }
        };
        let scale = ScaleFactor::from_array(config.import_scale).unwrap_or_else(|err| {
            warn!("Sculptor::new: {}, importing unscaled", err);
            ScaleFactor::IDENTITY
        });
        Self {
            mesh: HalfEdgeMesh::new(),
            params: Parameters::invalid(),
            brush: Brush::from_config(&config),
            field_builder: FieldBuilder::new(config.field_query),
            remesh_options: RemeshOptions::from_config(&config),
            scale,
            stage: SculptStage::Idle,
            config,
        }
    }

    /// Load a mesh with the configured import scale.
    pub fn set_mesh(&mut self, source: &IndexedMesh) -> Result<RemeshStats, SculptError> {
        self.set_mesh_scaled(source, self.scale)
    }

    /// Load a mesh, scaling it into sculpting units.
    ///
    /// Derives parameters from the average edge length and remeshes the
    /// whole surface once. On error the previous mesh stays loaded.
    pub fn set_mesh_scaled(
        &mut self,
        source: &IndexedMesh,
        scale: ScaleFactor,
    ) -> Result<RemeshStats, SculptError> {
        let mut mesh = HalfEdgeMesh::from_indexed(&scale.apply(source))?;
        let average = mesh.average_edge_length();
        if !(average > 0.0) {
            return Err(SculptError::NoEdges);
        }
        let params = Parameters::from_average_edge_length(average, &self.config)?;
        let stats = make_uniform(&mut mesh, &params, self.remesh_options)?;

        info!(
            "Sculptor::set_mesh: {} vertices, {} faces, average edge {:.4}, edge bounds [{:.4}, {:.4}], dMove {:.4}",
            mesh.live_vertex_count(),
            mesh.live_face_count(),
            average,
            params.min_edge_length(),
            params.max_edge_length(),
            params.d_move()
        );

        self.mesh = mesh;
        self.params = params;
        self.scale = scale;
        self.field_builder.invalidate();
        self.stage = SculptStage::Idle;
        Ok(stats)
    }

    /// Export the current surface in source units.
    pub fn get_mesh(&self) -> IndexedMesh {
        self.scale.inverse().apply(&self.mesh.to_indexed())
    }

    /// Run one sculpting tick at `pick_point` (sculpting units).
    pub fn process_input(&mut self, pick_point: Vec3) -> Result<SculptOutcome, SculptError> {
        let result = self.tick(pick_point);
        self.stage = SculptStage::Idle;
        result
    }

    /// Run one sculpting tick at a pick point given in source units.
    ///
    /// The point goes through the same scale as the loaded mesh. The brush
    /// radius is always in sculpting units.
    pub fn process_input_source(
        &mut self,
        source_pick_point: Vec3,
    ) -> Result<SculptOutcome, SculptError> {
        self.process_input(self.scale.to_working(source_pick_point))
    }

    fn tick(&mut self, pick_point: Vec3) -> Result<SculptOutcome, SculptError> {
        self.params.validate()?;
        let radius = self.brush.radius();
        let mut outcome = SculptOutcome::default();

        let field = self.field_builder.build(&self.mesh, pick_point, radius);
        self.enter(SculptStage::FieldBuilt, &mut outcome);
        outcome.field_vertices = field.vertices.len();
        if field.is_empty() {
            trace!("Sculptor::tick: nothing within {} of {:?}", radius, pick_point);
            return Ok(outcome);
        }

        let field_vertices: Vec<VertexId> = field.vertex_ids();
        self.mesh.recalculate_normals_around(&field_vertices);
        let operator = self.current_operator();
        let deformation =
            apply_deformation(&operator, &mut self.mesh, &field, radius, self.params.d_move());
        self.mesh
            .recalculate_normals_around(&deformation.modified_vertices);
        self.field_builder
            .track_displacements(&self.mesh, &deformation.original_positions);
        outcome.vertices_moved = deformation.modified_vertices.len();
        self.enter(SculptStage::Deformed, &mut outcome);

        outcome.remesh =
            make_uniform_field(&mut self.mesh, &self.params, &field.edges, self.remesh_options)?;
        self.field_builder
            .track_remesh(&self.mesh, outcome.remesh.vertices_renumbered());
        self.enter(SculptStage::Remeshed, &mut outcome);

        outcome.topology = TopologyOutcome::from_change(deformation.topological_change);
        if let TopologyOutcome::Unhandled(change) = outcome.topology {
            warn!(
                "Sculptor::tick: operator reported {:?}, no handler runs during a tick",
                change
            );
        }

        debug!(
            "Sculptor::tick: {} field vertices, {} moved, {} collapsed, {} split",
            outcome.field_vertices,
            outcome.vertices_moved,
            outcome.remesh.edges_collapsed,
            outcome.remesh.edges_split
        );
        Ok(outcome)
    }

    fn enter(&mut self, stage: SculptStage, outcome: &mut SculptOutcome) {
        trace!("Sculptor: {:?} -> {:?}", self.stage, stage);
        self.stage = stage;
        outcome.reached = stage;
    }

    /// Stitch the rings of two vertices together.
    ///
    /// Not part of a tick; hosts call it when they decide two regions should
    /// fuse.
    pub fn join_vertex_rings(
        &mut self,
        v1: VertexId,
        v2: VertexId,
    ) -> Result<JoinReport, SculptError> {
        TopologicalHandler::join_vertex_rings(&mut self.mesh, v1, v2)
    }

    /// Set the brush radius, clamped to the tool range. Returns the applied value.
    pub fn set_radius(&mut self, radius: f32) -> f32 {
        self.brush.set_radius(radius)
    }

    pub fn set_current_operator(&mut self, kind: OperatorKind) {
        self.brush.operator = kind;
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.brush.direction = direction;
    }

    /// Returns the applied exponent (at least 2).
    pub fn set_smoothing_exponent(&mut self, exponent: u32) -> u32 {
        self.brush.falloff = Falloff::new(exponent);
        self.brush.falloff.exponent()
    }

    /// Replace the parameters. On failure the current ones are kept.
    pub fn set_parameters(
        &mut self,
        min_edge_length: f32,
        max_edge_length: f32,
        d_move: f32,
        d_thickness: f32,
    ) -> Result<(), ParameterError> {
        self.params
            .set(min_edge_length, max_edge_length, d_move, d_thickness)
    }

    pub fn current_operator(&self) -> Operator {
        Operator::new(self.brush.operator, self.brush.direction, self.brush.falloff)
    }

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    pub fn stage(&self) -> SculptStage {
        self.stage
    }

    pub fn mesh(&self) -> &HalfEdgeMesh {
        &self.mesh
    }

    pub fn brush(&self) -> &Brush {
        &self.brush
    }

    pub fn config(&self) -> &SculptConfig {
        &self.config
    }

    pub fn scale(&self) -> ScaleFactor {
        self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sculpt_config::FieldQuery;

    fn lattice_sculptor(config: SculptConfig) -> Sculptor {
        let mut sculptor = Sculptor::new(config);
        sculptor
            .set_mesh(&IndexedMesh::triangle_lattice(16, 16, 0.25))
            .unwrap();
        sculptor
    }

    fn lattice_center(sculptor: &Sculptor) -> Vec3 {
        let (min, max) = sculptor.mesh().bounds().unwrap();
        (min + max) * 0.5
    }

    fn max_z(mesh: &HalfEdgeMesh) -> f32 {
        mesh.live_vertices()
            .map(|v| v.position.z)
            .fold(f32::MIN, f32::max)
    }

    #[test]
    fn test_tick_without_mesh_is_refused() {
        let mut sculptor = Sculptor::default();
        assert!(!sculptor.parameters().valid());
        let result = sculptor.process_input(Vec3::ZERO);
        assert!(matches!(result, Err(SculptError::InvalidParameters(_))));
        assert_eq!(sculptor.stage(), SculptStage::Idle);
    }

    #[test]
    fn test_set_mesh_derives_parameters() {
        let sculptor = lattice_sculptor(SculptConfig::default());
        let params = sculptor.parameters();
        assert!(params.valid());
        assert!((params.max_edge_length() - 0.25).abs() < 1e-4);
        assert!((params.min_edge_length() - 0.125).abs() < 1e-4);
        assert_eq!(sculptor.mesh().vertex_count(), 256);
    }

    #[test]
    fn test_set_mesh_rejects_empty_input() {
        let mut sculptor = lattice_sculptor(SculptConfig::default());
        let result = sculptor.set_mesh(&IndexedMesh::default());
        assert!(matches!(result, Err(SculptError::Import(_))));
        // Previous mesh kept
        assert_eq!(sculptor.mesh().vertex_count(), 256);
    }

    #[test]
    fn test_inflate_raises_surface_by_at_most_dmove() {
        let mut sculptor = lattice_sculptor(SculptConfig::default());
        let pick = lattice_center(&sculptor);
        let d_move = sculptor.parameters().d_move();

        let outcome = sculptor.process_input(pick).unwrap();
        assert_eq!(outcome.reached, SculptStage::Remeshed);
        assert_eq!(outcome.topology, TopologyOutcome::Unchanged);
        assert!(outcome.vertices_moved > 0);
        assert_eq!(sculptor.stage(), SculptStage::Idle);

        let top = max_z(sculptor.mesh());
        assert!(top > 0.5 * d_move);
        assert!(top <= d_move + 1e-5);
        assert!(sculptor.mesh().check_manifold().is_ok());
    }

    #[test]
    fn test_deflate_lowers_surface() {
        let mut sculptor = lattice_sculptor(SculptConfig::default());
        sculptor.set_direction(Direction::Deflate);
        let pick = lattice_center(&sculptor);
        sculptor.process_input(pick).unwrap();
        let lowest = sculptor
            .mesh()
            .live_vertices()
            .map(|v| v.position.z)
            .fold(f32::MAX, f32::min);
        assert!(lowest < 0.0);
    }

    #[test]
    fn test_repeated_ticks_keep_mesh_manifold() {
        let mut sculptor = lattice_sculptor(SculptConfig::default());
        let center = lattice_center(&sculptor);
        let kinds = [OperatorKind::InfDef, OperatorKind::Twist, OperatorKind::InfDef];
        for step in 0..24 {
            sculptor.set_current_operator(kinds[step % kinds.len()]);
            if step % 5 == 4 {
                sculptor.set_direction(Direction::Deflate);
            } else {
                sculptor.set_direction(Direction::Inflate);
            }
            let offset = Vec3::new((step as f32 * 0.7).cos(), (step as f32 * 0.7).sin(), 0.0);
            sculptor.process_input(center + offset * 0.6).unwrap();

            let mesh = sculptor.mesh();
            assert!(mesh.validate().is_ok(), "step {}", step);
            assert!(mesh.check_manifold().is_ok(), "step {}", step);
        }
    }

    #[test]
    fn test_sweep_leaves_mesh_untouched() {
        let mut sculptor = lattice_sculptor(SculptConfig::default());
        sculptor.set_current_operator(OperatorKind::Sweep);
        let before = sculptor.get_mesh();
        let pick = lattice_center(&sculptor);

        let outcome = sculptor.process_input(pick).unwrap();
        assert_eq!(outcome.vertices_moved, 0);
        assert!(!outcome.remesh.changed());
        assert_eq!(sculptor.get_mesh(), before);
    }

    #[test]
    fn test_pick_outside_mesh_stops_after_field() {
        let mut sculptor = lattice_sculptor(SculptConfig::default());
        let outcome = sculptor.process_input(Vec3::new(100.0, 100.0, 0.0)).unwrap();
        assert_eq!(outcome.reached, SculptStage::FieldBuilt);
        assert_eq!(outcome.field_vertices, 0);
    }

    #[test]
    fn test_field_strategies_sculpt_identically() {
        let mut linear = lattice_sculptor(SculptConfig {
            field_query: FieldQuery::LinearScan,
            ..Default::default()
        });
        let mut indexed = lattice_sculptor(SculptConfig {
            field_query: FieldQuery::Octree,
            ..Default::default()
        });
        let center = lattice_center(&linear);
        for step in 0..6 {
            let pick = center + Vec3::new(step as f32 * 0.2, 0.0, 0.0);
            linear.process_input(pick).unwrap();
            indexed.process_input(pick).unwrap();
        }
        assert_eq!(linear.get_mesh(), indexed.get_mesh());
    }

    #[test]
    fn test_round_trip_with_scale() {
        let source = IndexedMesh::icosahedron(1.0);
        let mut sculptor = Sculptor::default();
        let stats = sculptor
            .set_mesh_scaled(&source, ScaleFactor::uniform(2.0).unwrap())
            .unwrap();
        assert!(!stats.changed());

        let out = sculptor.get_mesh();
        assert_eq!(out.indices, source.indices);
        for (a, b) in out.positions.iter().zip(&source.positions) {
            assert!(Vec3::from_array(*a).distance(Vec3::from_array(*b)) < 1e-5);
        }
        for (a, b) in out.normals.iter().zip(&source.normals) {
            assert!(Vec3::from_array(*a).distance(Vec3::from_array(*b)) < 1e-4);
        }
    }

    #[test]
    fn test_round_trip_keeps_uv_seam() {
        // Two equilateral triangles; vertex 3 duplicates vertex 2 on a uv seam
        let h = 3.0_f32.sqrt() / 2.0;
        let source = IndexedMesh {
            positions: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.5, h, 0.0],
                [0.5, h, 0.0],
                [1.5, h, 0.0],
            ],
            normals: vec![[0.0, 0.0, 1.0]; 5],
            uvs: Some(vec![[0.0, 0.0], [0.5, 0.0], [0.25, 0.5], [0.9, 0.1], [0.75, 0.5]]),
            tangents: None,
            indices: vec![0, 1, 2, 1, 4, 3],
            face_tags: vec![],
        };
        let mut sculptor = Sculptor::default();
        let stats = sculptor.set_mesh(&source).unwrap();
        assert!(!stats.changed());

        let out = sculptor.get_mesh();
        assert_eq!(out.positions.len(), source.positions.len());
        assert_eq!(out.indices.len(), source.indices.len());
        assert!(out.uvs.unwrap().contains(&[0.9, 0.1]));
    }

    #[test]
    fn test_source_pick_uses_import_scale() {
        let source = IndexedMesh::triangle_lattice(16, 16, 0.25);
        let scale = ScaleFactor::new(Vec3::new(2.0, 0.5, 1.0)).unwrap();
        let mut by_source = Sculptor::default();
        by_source.set_mesh_scaled(&source, scale).unwrap();
        let mut by_working = Sculptor::default();
        by_working.set_mesh_scaled(&source, scale).unwrap();

        // Center of the lattice in source units
        let (min, max) = HalfEdgeMesh::from_indexed(&source).unwrap().bounds().unwrap();
        let source_pick = (min + max) * 0.5;

        let outcome = by_source.process_input_source(source_pick).unwrap();
        assert!(outcome.vertices_moved > 0);
        by_working
            .process_input(scale.to_working(source_pick))
            .unwrap();
        assert_eq!(by_source.get_mesh(), by_working.get_mesh());
    }

    #[test]
    fn test_invalid_config_falls_back_to_defaults() {
        let sculptor = Sculptor::new(SculptConfig {
            min_tool_radius: 2.0,
            max_tool_radius: 1.0,
            ..Default::default()
        });
        assert_eq!(sculptor.config(), &SculptConfig::default());
        assert_eq!(
            sculptor.brush().radius_range(),
            (
                sculpt_config::DEFAULT_MIN_TOOL_RADIUS,
                sculpt_config::DEFAULT_MAX_TOOL_RADIUS
            )
        );
    }

    #[test]
    fn test_invalid_scale_is_rejected() {
        assert!(matches!(
            ScaleFactor::new(Vec3::new(1.0, 0.0, 1.0)),
            Err(SculptError::InvalidScale(_))
        ));
    }

    #[test]
    fn test_set_radius_is_clamped() {
        let mut sculptor = Sculptor::default();
        assert_eq!(sculptor.set_radius(100.0), sculpt_config::DEFAULT_MAX_TOOL_RADIUS);
        assert_eq!(sculptor.set_radius(0.0), sculpt_config::DEFAULT_MIN_TOOL_RADIUS);
        assert_eq!(sculptor.set_radius(2.0), 2.0);
        assert_eq!(sculptor.brush().radius(), 2.0);
    }

    #[test]
    fn test_set_parameters_keeps_previous_on_failure() {
        let mut sculptor = lattice_sculptor(SculptConfig::default());
        let before = *sculptor.parameters();
        assert!(sculptor.set_parameters(1.0, 1.0, 0.01, 1.0).is_err());
        assert_eq!(*sculptor.parameters(), before);

        sculptor.set_parameters(0.2, 0.4, 0.01, 0.4).unwrap();
        assert_eq!(sculptor.parameters().max_edge_length(), 0.4);
    }

    #[test]
    fn test_operator_follows_brush() {
        let mut sculptor = Sculptor::default();
        sculptor.set_current_operator(OperatorKind::Twist);
        sculptor.set_direction(Direction::Deflate);
        assert_eq!(sculptor.set_smoothing_exponent(1), 2);
        assert_eq!(
            sculptor.current_operator(),
            Operator::Twist {
                direction: Direction::Deflate,
                falloff: Falloff::new(2),
            }
        );
    }

    #[test]
    fn test_genus_maps_to_unhandled() {
        assert_eq!(
            TopologyOutcome::from_change(TopologicalChange::Genus),
            TopologyOutcome::Unhandled(TopologicalChange::Genus)
        );
        assert_eq!(
            TopologyOutcome::from_change(TopologicalChange::None),
            TopologyOutcome::Unchanged
        );
    }
}
