// Goal-membership test and distance heuristic for the host search
use super::queue::{lock_queue, SharedGoalQueue};
use crate::geometry::{Configuration, Pose};
use crate::kinematics::ForwardKinematics;
use crate::region::WorkspaceGoalRegion;
use std::sync::Arc;

/// Smallest distance reported for a configuration that is not inside any region
pub const MIN_OUTSIDE_DISTANCE: f64 = 1e-9;

/// Answers "how far is this configuration from the goal regions?"
///
/// A configuration is inside when its end-effector position lies in a
/// region's box and every fixed orientation axis is within tolerance of the
/// region's orientation. Inside configurations are at distance 0; everything
/// else gets the nearest-candidate distance in configuration space, or a
/// workspace distance while no candidate has been sampled yet.
pub struct RegionDistanceEvaluator {
    regions: Vec<WorkspaceGoalRegion>,
    kinematics: Arc<dyn ForwardKinematics>,
    queue: SharedGoalQueue,
    orientation_tolerance: f64,
}

impl RegionDistanceEvaluator {
    pub fn new(
        regions: Vec<WorkspaceGoalRegion>,
        kinematics: Arc<dyn ForwardKinematics>,
        queue: SharedGoalQueue,
        orientation_tolerance: f64,
    ) -> Self {
        Self {
            regions,
            kinematics,
            queue,
            orientation_tolerance,
        }
    }

    pub fn regions(&self) -> &[WorkspaceGoalRegion] {
        &self.regions
    }

    pub fn distance_to_goal(&self, configuration: &Configuration) -> f64 {
        let pose = self.kinematics.end_effector_pose(configuration);
        if let Some(index) = self.region_containing(&pose) {
            log::trace!("Configuration inside goal region {}", index);
            return 0.0;
        }
        self.outside_distance(configuration, &pose)
    }

    pub fn is_satisfied(&self, configuration: &Configuration) -> bool {
        self.containing_region(configuration).is_some()
    }

    /// Index of the first region containing the configuration's end effector
    pub fn containing_region(&self, configuration: &Configuration) -> Option<usize> {
        self.region_containing(&self.kinematics.end_effector_pose(configuration))
    }

    /// Forget all regions; nothing is inside afterwards
    pub fn clear(&mut self) {
        self.regions.clear();
    }

    pub fn set_regions(&mut self, regions: Vec<WorkspaceGoalRegion>) {
        self.regions = regions;
    }

    fn region_containing(&self, pose: &Pose) -> Option<usize> {
        self.regions.iter().position(|region| {
            region.bounds.contains(&pose.position)
                && (region.all_free()
                    || region.fixed_axis_error(&pose.orientation) <= self.orientation_tolerance)
        })
    }

    fn outside_distance(&self, configuration: &Configuration, pose: &Pose) -> f64 {
        let nearest = lock_queue(&self.queue).nearest_distance(configuration);
        let distance = match nearest {
            Some(d) => d,
            None => self
                .regions
                .iter()
                .map(|region| {
                    let orientation_excess = (region.fixed_axis_error(&pose.orientation)
                        - self.orientation_tolerance)
                        .max(0.0);
                    region.bounds.distance_to(&pose.position) + orientation_excess
                })
                .fold(f64::INFINITY, f64::min),
        };
        distance.max(MIN_OUTSIDE_DISTANCE)
    }
}
