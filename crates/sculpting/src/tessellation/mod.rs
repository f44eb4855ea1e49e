//! Adaptive remeshing.
//!
//! Keeps edge lengths inside `[minEdgeLength, maxEdgeLength]` by collapsing
//! short edges and splitting long ones, either over the whole mesh
//! ([`make_uniform`]) or over the edges of an influence field
//! ([`make_uniform_field`]).
//!
//! ## Handles
//!
//! Collapse and split replace faces and half-edges, so edge ids go stale as
//! soon as the mesh changes. Candidates are therefore recorded as vertex
//! pairs before anything is mutated. Collapsed vertices are redirected to
//! their survivor, and each pair is looked up again right before use.
//!
//! ## Determinism
//!
//! Collapses run shortest first, splits longest first, ties broken by vertex
//! ids, so the same input always yields the same mesh.

mod edge_collapse;
mod edge_split;
mod metrics;

pub use edge_collapse::{
    CollapseCheck, CollapseRejection, calculate_collapse_position, can_collapse_edge,
    collapse_edge, would_cause_flip,
};
pub use edge_split::{SplitRejection, calculate_split_position, split_edge};
pub use metrics::{
    EDGE_LENGTH_TOLERANCE, EdgeEvaluation, MeshQuality, calculate_mesh_quality,
    calculate_triangle_aspect_ratio, evaluate_edge, evaluate_length, is_degenerate_triangle,
};

use mesh::{CompactionMap, HalfEdgeId, HalfEdgeMesh, VertexId};
use sculpt_config::{DEFAULT_REMESH_PASSES, SculptConfig};
use std::collections::{HashMap, HashSet};
use tracing::{info, trace};

use crate::error::SculptError;
use crate::params::Parameters;

/// Remesh decision for a single edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemeshDecision {
    /// Shorter than `minEdgeLength`
    Collapse,
    /// Longer than `maxEdgeLength`
    Split,
    None,
}

/// How far the remesher may go beyond a single pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemeshOptions {
    /// Collapse+split passes. Passes after the first only revisit edges
    /// around vertices the previous pass touched.
    pub max_passes: u32,
}

impl Default for RemeshOptions {
    fn default() -> Self {
        Self {
            max_passes: DEFAULT_REMESH_PASSES,
        }
    }
}

impl RemeshOptions {
    pub fn from_config(config: &SculptConfig) -> Self {
        Self {
            max_passes: config.remesh_passes.max(1),
        }
    }
}

/// Statistics from a remesh run.
#[derive(Debug, Default)]
pub struct RemeshStats {
    pub edges_collapsed: usize,
    pub edges_split: usize,
    /// Collapses skipped by a safety check
    pub collapses_rejected: usize,
    pub splits_rejected: usize,
    pub passes: u32,
    /// Renumbering applied at the end, if anything changed
    pub compaction: Option<CompactionMap>,
}

impl RemeshStats {
    pub fn changed(&self) -> bool {
        self.edges_collapsed + self.edges_split > 0
    }

    /// True when compaction gave surviving vertices new ids.
    pub fn vertices_renumbered(&self) -> bool {
        self.compaction
            .as_ref()
            .is_some_and(|c| !c.vertices_unchanged())
    }
}

/// An edge recorded by its endpoints, lower id first
type VertexPair = (VertexId, VertexId);

/// Remesh every edge of the mesh.
pub fn make_uniform(
    mesh: &mut HalfEdgeMesh,
    params: &Parameters,
    options: RemeshOptions,
) -> Result<RemeshStats, SculptError> {
    let edges = mesh.edges();
    make_uniform_field(mesh, params, &edges, options)
}

/// Remesh a set of edges.
///
/// Runs a collapse phase then a split phase per pass. Edges that fail a
/// safety check are skipped and counted. The mesh is compacted once at the
/// end, so every id held by the caller is stale if anything changed; use
/// [`RemeshStats::compaction`] to translate.
pub fn make_uniform_field(
    mesh: &mut HalfEdgeMesh,
    params: &Parameters,
    edges: &[HalfEdgeId],
    options: RemeshOptions,
) -> Result<RemeshStats, SculptError> {
    params.validate()?;

    let mut stats = RemeshStats::default();
    let mut remesher = Remesher {
        mesh: &mut *mesh,
        params,
        survivors: HashMap::new(),
        touched: HashSet::new(),
    };

    let mut candidates = remesher.snapshot(edges);
    let max_passes = options.max_passes.max(1);
    while stats.passes < max_passes && !candidates.is_empty() {
        stats.passes += 1;
        remesher.touched.clear();
        trace!(
            "make_uniform_field: pass {} over {} edges",
            stats.passes,
            candidates.len()
        );

        remesher.collapse_phase(&candidates, &mut stats);
        remesher.split_phase(&candidates, &mut stats);

        if remesher.touched.is_empty() {
            break;
        }
        candidates = remesher.incident_pairs();
    }

    if stats.changed() {
        stats.compaction = Some(mesh.compact());
    }

    info!(
        "make_uniform_field: {} edges in scope, {} collapsed ({} rejected), {} split ({} rejected), {} passes",
        edges.len(),
        stats.edges_collapsed,
        stats.collapses_rejected,
        stats.edges_split,
        stats.splits_rejected,
        stats.passes
    );

    #[cfg(debug_assertions)]
    if stats.changed() {
        if let Err(e) = mesh.validate() {
            tracing::error!("MESH VALIDATION FAILED after remesh: {}", e);
        }
    }

    Ok(stats)
}

struct Remesher<'a> {
    mesh: &'a mut HalfEdgeMesh,
    params: &'a Parameters,
    /// Collapsed vertex -> vertex that absorbed it
    survivors: HashMap<VertexId, VertexId>,
    /// Vertices changed in the current pass
    touched: HashSet<VertexId>,
}

impl Remesher<'_> {
    fn snapshot(&self, edges: &[HalfEdgeId]) -> Vec<VertexPair> {
        let mut pairs: Vec<VertexPair> = edges
            .iter()
            .filter_map(|&e| self.mesh.edge_vertices(e))
            .map(|(a, b)| ordered(a, b))
            .collect();
        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }

    fn resolve(&self, mut vertex: VertexId) -> VertexId {
        while let Some(&survivor) = self.survivors.get(&vertex) {
            vertex = survivor;
        }
        vertex
    }

    /// Current edge for a recorded pair, if it still exists.
    fn resolve_edge(&self, (a, b): VertexPair) -> Option<HalfEdgeId> {
        let (a, b) = (self.resolve(a), self.resolve(b));
        if a == b {
            return None;
        }
        self.mesh.find_edge(a, b)
    }

    /// Pairs whose edge currently classifies as `decision`, with lengths.
    fn queue(&self, candidates: &[VertexPair], decision: RemeshDecision) -> Vec<(f32, VertexPair)> {
        candidates
            .iter()
            .filter_map(|&pair| {
                let edge = self.resolve_edge(pair)?;
                let eval = evaluate_edge(self.mesh, edge, self.params)?;
                (eval.decision == decision).then_some((eval.length, pair))
            })
            .collect()
    }

    /// Edge for a queued pair if it still needs `decision`.
    fn still_needs(&self, pair: VertexPair, decision: RemeshDecision) -> Option<HalfEdgeId> {
        let edge = self.resolve_edge(pair)?;
        let eval = evaluate_edge(self.mesh, edge, self.params)?;
        (eval.decision == decision).then_some(edge)
    }

    fn collapse_phase(&mut self, candidates: &[VertexPair], stats: &mut RemeshStats) {
        let mut queue = self.queue(candidates, RemeshDecision::Collapse);
        queue.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1)));

        for (_, pair) in queue {
            // Earlier collapses may have merged or lengthened this edge
            let Some(edge) = self.still_needs(pair, RemeshDecision::Collapse) else {
                trace!("collapse_phase: {:?} no longer short", pair);
                continue;
            };
            match collapse_edge(self.mesh, edge) {
                Ok(outcome) => {
                    self.survivors.insert(outcome.removed, outcome.survivor);
                    self.touched.remove(&outcome.removed);
                    self.touched.insert(outcome.survivor);
                    stats.edges_collapsed += 1;
                }
                Err(rejection) => {
                    trace!("collapse_phase: skipped {:?}: {:?}", pair, rejection);
                    stats.collapses_rejected += 1;
                }
            }
        }
    }

    fn split_phase(&mut self, candidates: &[VertexPair], stats: &mut RemeshStats) {
        let mut queue = self.queue(candidates, RemeshDecision::Split);
        queue.sort_by(|x, y| y.0.total_cmp(&x.0).then(x.1.cmp(&y.1)));

        for (_, pair) in queue {
            let Some(edge) = self.still_needs(pair, RemeshDecision::Split) else {
                trace!("split_phase: {:?} no longer long", pair);
                continue;
            };
            let ends = self.mesh.edge_vertices(edge);
            match split_edge(self.mesh, edge) {
                Ok(outcome) => {
                    self.touched.insert(outcome.vertex);
                    if let Some((a, b)) = ends {
                        self.touched.insert(a);
                        self.touched.insert(b);
                    }
                    stats.edges_split += 1;
                }
                Err(rejection) => {
                    trace!("split_phase: skipped {:?}: {:?}", pair, rejection);
                    stats.splits_rejected += 1;
                }
            }
        }
    }

    /// Edges around the vertices touched in the last pass.
    fn incident_pairs(&self) -> Vec<VertexPair> {
        let mut touched: Vec<VertexId> = self.touched.iter().map(|&v| self.resolve(v)).collect();
        touched.sort_unstable();
        touched.dedup();

        let mut pairs = Vec::new();
        for vertex in touched {
            if !self.mesh.is_vertex_live(vertex) {
                continue;
            }
            for neighbor in self.mesh.get_adjacent_vertices(vertex) {
                pairs.push(ordered(vertex, neighbor));
            }
        }
        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }
}

fn ordered(a: VertexId, b: VertexId) -> VertexPair {
    if a <= b { (a, b) } else { (b, a) }
}
