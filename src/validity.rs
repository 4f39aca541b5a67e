// Workspace-bounds validity checking
use crate::geometry::{Configuration, Point3D};
use crate::kinematics::{ForwardKinematics, JointBoundsSampler, ValidityChecker};
use std::sync::Arc;

/// Rejects configurations outside joint limits or whose end effector leaves the platform box.
///
/// No collision geometry; hosts with a real checker plug that in instead.
#[derive(Clone)]
pub struct WorkspaceBoundsChecker {
    pub kinematics: Arc<dyn ForwardKinematics>,
    pub platform_bounds: (Point3D, Point3D),
    pub joint_limits: Option<JointBoundsSampler>,
}

#[derive(Debug, Clone, Default)]
pub struct ValidityReport {
    pub is_valid: bool,
    pub outside_platform: bool,
    pub outside_joint_limits: bool,
    pub end_effector: Option<Point3D>,
}

impl WorkspaceBoundsChecker {
    pub fn new(kinematics: Arc<dyn ForwardKinematics>, platform_bounds: (Point3D, Point3D)) -> Self {
        Self {
            kinematics,
            platform_bounds,
            joint_limits: None,
        }
    }

    pub fn with_joint_limits(mut self, limits: JointBoundsSampler) -> Self {
        self.joint_limits = Some(limits);
        self
    }

    pub fn check(&self, configuration: &Configuration) -> ValidityReport {
        let outside_joint_limits = self
            .joint_limits
            .as_ref()
            .is_some_and(|limits| !limits.contains(configuration));
        if outside_joint_limits {
            return ValidityReport {
                is_valid: false,
                outside_platform: false,
                outside_joint_limits,
                end_effector: None,
            };
        }

        let position = self.kinematics.end_effector_pose(configuration).position;
        let (min_bounds, max_bounds) = &self.platform_bounds;

        let outside_platform = position.z < min_bounds.z
            || position.z > max_bounds.z
            || position.x < min_bounds.x
            || position.x > max_bounds.x
            || position.y < min_bounds.y
            || position.y > max_bounds.y;

        ValidityReport {
            is_valid: !outside_platform,
            outside_platform,
            outside_joint_limits,
            end_effector: Some(position),
        }
    }
}

impl ValidityChecker for WorkspaceBoundsChecker {
    fn is_valid(&self, configuration: &Configuration, verbose: bool) -> bool {
        let report = self.check(configuration);
        if verbose && !report.is_valid {
            if report.outside_joint_limits {
                log::info!("Configuration rejected: outside joint limits");
            } else if let Some(p) = report.end_effector {
                log::info!(
                    "Configuration rejected: end effector ({:.3}, {:.3}, {:.3}) outside platform",
                    p.x, p.y, p.z
                );
            }
        }
        report.is_valid
    }
}
