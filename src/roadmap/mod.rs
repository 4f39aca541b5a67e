// Background roadmap of valid configurations used to shorten found solutions
pub mod connectivity;
pub mod growth;
pub mod refine;

pub use connectivity::ConnectivityIndex;
pub use growth::RoadmapGrower;
pub use refine::{RefinementOutcome, SolutionPath, SolutionRefiner};

use crate::geometry::{configuration_distance, Configuration};
use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Arena index of a roadmap vertex
pub type VertexId = usize;

/// Roadmap shared between the growth thread and refinement
pub type SharedRoadmap = Arc<RwLock<Roadmap>>;

pub fn read_roadmap(roadmap: &SharedRoadmap) -> RwLockReadGuard<'_, Roadmap> {
    roadmap.read().unwrap_or_else(PoisonError::into_inner)
}

pub fn write_roadmap(roadmap: &SharedRoadmap) -> RwLockWriteGuard<'_, Roadmap> {
    roadmap.write().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub to: VertexId,
    pub cost: f64,
}

/// Append-only graph of valid configurations.
///
/// Vertices and edges are never mutated or removed once inserted, only
/// dropped all together by [`Roadmap::clear`].
#[derive(Debug, Clone, Default)]
pub struct Roadmap {
    vertices: Vec<Configuration>,
    adjacency: Vec<Vec<Edge>>,
    connectivity: ConnectivityIndex,
    edge_count: usize,
}

impl Roadmap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn component_count(&self) -> usize {
        self.connectivity.component_count()
    }

    pub fn vertices(&self) -> &[Configuration] {
        &self.vertices
    }

    pub fn configuration(&self, id: VertexId) -> Option<&Configuration> {
        self.vertices.get(id)
    }

    pub fn neighbors(&self, id: VertexId) -> &[Edge] {
        self.adjacency.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn add_vertex(&mut self, configuration: Configuration) -> VertexId {
        let id = self.connectivity.add();
        self.vertices.push(configuration);
        self.adjacency.push(Vec::new());
        id
    }

    /// Connect two vertices with an undirected edge costed by configuration distance.
    ///
    /// Self loops, duplicates and unknown ids are ignored.
    pub fn add_edge(&mut self, a: VertexId, b: VertexId) -> bool {
        if a == b || a >= self.len() || b >= self.len() {
            return false;
        }
        if self.adjacency[a].iter().any(|edge| edge.to == b) {
            return false;
        }

        let cost = configuration_distance(&self.vertices[a], &self.vertices[b]);
        self.adjacency[a].push(Edge { to: b, cost });
        self.adjacency[b].push(Edge { to: a, cost });
        self.connectivity.union(a, b);
        self.edge_count += 1;
        true
    }

    pub fn same_component(&self, a: VertexId, b: VertexId) -> bool {
        self.connectivity.same_component(a, b)
    }

    /// Up to `k` vertices closest to `configuration`, nearest first
    pub fn nearest(
        &self,
        configuration: &Configuration,
        k: usize,
        max_distance: Option<f64>,
    ) -> Vec<(VertexId, f64)> {
        let limit = max_distance.unwrap_or(f64::INFINITY);
        let mut candidates: Vec<(VertexId, f64)> = self
            .vertices
            .iter()
            .enumerate()
            .map(|(id, q)| (id, configuration_distance(q, configuration)))
            .filter(|(_, d)| *d <= limit)
            .collect();

        candidates.sort_by(|a, b| a.1.total_cmp(&b.1));
        candidates.truncate(k);
        candidates
    }

    /// First vertex whose configuration equals `configuration` exactly
    pub fn find_vertex(&self, configuration: &Configuration) -> Option<VertexId> {
        self.vertices.iter().position(|q| q == configuration)
    }

    /// Cheapest internal path from `from` to `to`, both endpoints included.
    ///
    /// A* over the roadmap with configuration distance as both edge cost and
    /// heuristic. `None` when the vertices are unknown or not connected.
    pub fn construct_solution(&self, from: VertexId, to: VertexId) -> Option<Vec<Configuration>> {
        if !self.same_component(from, to) {
            return None;
        }
        if from == to {
            return Some(vec![self.vertices[from].clone()]);
        }

        let goal = &self.vertices[to];
        let heuristic = |v: VertexId| configuration_distance(&self.vertices[v], goal);

        let n = self.len();
        let mut cost_so_far = vec![f64::INFINITY; n];
        let mut came_from: Vec<Option<VertexId>> = vec![None; n];
        let mut closed = vec![false; n];

        // Min-heap: (estimated total cost, vertex)
        let mut heap: BinaryHeap<Reverse<(OrderedFloat<f64>, VertexId)>> = BinaryHeap::new();
        cost_so_far[from] = 0.0;
        heap.push(Reverse((OrderedFloat(heuristic(from)), from)));

        while let Some(Reverse((_, v))) = heap.pop() {
            if closed[v] {
                continue;
            }
            if v == to {
                return Some(self.reconstruct(&came_from, to));
            }
            closed[v] = true;

            for edge in &self.adjacency[v] {
                let next_cost = cost_so_far[v] + edge.cost;
                if next_cost < cost_so_far[edge.to] {
                    cost_so_far[edge.to] = next_cost;
                    came_from[edge.to] = Some(v);
                    heap.push(Reverse((OrderedFloat(next_cost + heuristic(edge.to)), edge.to)));
                }
            }
        }

        log::warn!("Vertices {} and {} share a component but no path was found", from, to);
        None
    }

    fn reconstruct(&self, came_from: &[Option<VertexId>], to: VertexId) -> Vec<Configuration> {
        let mut ids = vec![to];
        let mut current = to;
        while let Some(previous) = came_from[current] {
            ids.push(previous);
            current = previous;
        }
        ids.iter().rev().map(|&id| self.vertices[id].clone()).collect()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.adjacency.clear();
        self.connectivity.clear();
        self.edge_count = 0;
    }
}
