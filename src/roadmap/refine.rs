// Shortening found solutions through the roadmap
use super::{Roadmap, VertexId};
use crate::geometry::{configuration_distance, Configuration, Point3D};
use crate::kinematics::ForwardKinematics;
use crate::region::WorkspaceGoalRegion;
use rayon::prelude::*;
use std::sync::Arc;

/// Largest configuration distance at which a recorded terminal vertex still counts as the path's end
pub const TERMINAL_MATCH_TOLERANCE: f64 = 1e-6;

/// A host solution: start-to-goal configurations, plus the roadmap vertex the
/// last configuration came from when known
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolutionPath {
    pub states: Vec<Configuration>,
    pub terminal_vertex: Option<VertexId>,
}

impl SolutionPath {
    pub fn new(states: Vec<Configuration>) -> Self {
        Self {
            states,
            terminal_vertex: None,
        }
    }

    pub fn with_terminal_vertex(mut self, vertex: VertexId) -> Self {
        self.terminal_vertex = Some(vertex);
        self
    }

    pub fn terminal(&self) -> Option<&Configuration> {
        self.states.last()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefinementOutcome {
    /// The path's last configuration is not a roadmap vertex
    NoTerminalVertex,
    /// No reachable vertex scores better than the terminal one
    NoBetterVertex,
    Spliced { appended: usize },
}

/// Extends solutions toward the goal-region centroids along roadmap paths
pub struct SolutionRefiner {
    centroids: Vec<Point3D>,
    kinematics: Arc<dyn ForwardKinematics>,
}

impl SolutionRefiner {
    pub fn new(regions: &[WorkspaceGoalRegion], kinematics: Arc<dyn ForwardKinematics>) -> Self {
        Self {
            centroids: regions.iter().map(WorkspaceGoalRegion::centroid).collect(),
            kinematics,
        }
    }

    pub fn set_regions(&mut self, regions: &[WorkspaceGoalRegion]) {
        self.centroids = regions.iter().map(WorkspaceGoalRegion::centroid).collect();
    }

    /// End-effector distance to the closest region centroid
    pub fn score(&self, configuration: &Configuration) -> f64 {
        let position = self.kinematics.end_effector_pose(configuration).position;
        self.centroids
            .iter()
            .map(|c| (position - c).norm())
            .fold(f64::INFINITY, f64::min)
    }

    /// Roadmap vertex the path ends on.
    ///
    /// A recorded vertex is used only while its configuration is within
    /// [`TERMINAL_MATCH_TOLERANCE`] of the path's last state; otherwise the
    /// first exact configuration match, if any.
    pub fn terminal_vertex(&self, roadmap: &Roadmap, path: &SolutionPath) -> Option<VertexId> {
        let terminal = path.terminal()?;
        path.terminal_vertex
            .filter(|&id| {
                roadmap
                    .configuration(id)
                    .is_some_and(|q| configuration_distance(q, terminal) <= TERMINAL_MATCH_TOLERANCE)
            })
            .or_else(|| roadmap.find_vertex(terminal))
    }

    /// Append the roadmap path from the terminal vertex to the best-scoring
    /// vertex in its component.
    ///
    /// Only the roadmap snapshot passed in is considered. Unreachable vertices
    /// are skipped even when they score better.
    pub fn improve(&self, roadmap: &Roadmap, path: &mut SolutionPath) -> RefinementOutcome {
        let Some(terminal) = self.terminal_vertex(roadmap, path) else {
            log::debug!("Solution terminal state is not a roadmap vertex, nothing to refine");
            return RefinementOutcome::NoTerminalVertex;
        };

        let mut scored: Vec<(VertexId, f64)> = roadmap
            .vertices()
            .par_iter()
            .enumerate()
            .map(|(id, q)| (id, self.score(q)))
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));

        let best = scored
            .iter()
            .map(|&(id, _)| id)
            .find(|&id| roadmap.same_component(id, terminal));

        let Some(best) = best.filter(|&id| id != terminal) else {
            return RefinementOutcome::NoBetterVertex;
        };

        let Some(states) = roadmap.construct_solution(terminal, best) else {
            return RefinementOutcome::NoBetterVertex;
        };

        let appended = states.len().saturating_sub(1);
        path.states.extend(states.into_iter().skip(1));
        path.terminal_vertex = Some(best);

        log::info!(
            "Refined solution through roadmap: vertex {} -> {}, {} states appended",
            terminal,
            best,
            appended
        );
        RefinementOutcome::Spliced { appended }
    }
}
