// Shared robot model for the integration tests
#![allow(dead_code)]

use std::sync::Arc;
use workspace_goal_sampler::geometry::from_rpy;
use workspace_goal_sampler::*;

/// Gantry with a roll/pitch/yaw wrist; joints are [x, y, z, roll, pitch, yaw]
pub struct GantryWrist;

impl ForwardKinematics for GantryWrist {
    fn end_effector_pose(&self, q: &Configuration) -> Pose {
        Pose::new(Point3D::new(q[0], q[1], q[2]), from_rpy(q[3], q[4], q[5]))
    }
}

pub fn configuration_for(pose: &Pose) -> Configuration {
    let [roll, pitch, yaw] = pose.rpy();
    let p = pose.position;
    Configuration::from_vec(vec![p.x, p.y, p.z, roll, pitch, yaw])
}

pub struct AcceptAll;

impl ValidityChecker for AcceptAll {
    fn is_valid(&self, _configuration: &Configuration, _verbose: bool) -> bool {
        true
    }
}

struct ExactProjector {
    target: Pose,
}

impl ConstraintProjector for ExactProjector {
    fn project(
        &mut self,
        configuration: &mut Configuration,
        _max_attempts: u32,
        validity: &mut dyn FnMut(&Configuration) -> bool,
    ) -> bool {
        let candidate = configuration_for(&self.target);
        if !validity(&candidate) {
            return false;
        }
        *configuration = candidate;
        true
    }
}

pub struct ExactAllocator;

impl ConstraintSamplerAllocator for ExactAllocator {
    fn select_sampler(&self, constraint: &PoseConstraint) -> Option<Box<dyn ConstraintProjector>> {
        Some(Box::new(ExactProjector {
            target: constraint.target(),
        }))
    }
}

pub fn q(values: &[f64]) -> Configuration {
    Configuration::from_vec(values.to_vec())
}

pub fn gantry_limits() -> JointBoundsSampler {
    let pi = std::f64::consts::PI;
    JointBoundsSampler::new(
        q(&[-2.0, -2.0, -2.0, -pi, -pi / 2.0, -pi]),
        q(&[2.0, 2.0, 2.0, pi, pi / 2.0, pi]),
    )
    .unwrap()
}

pub fn robot() -> RobotInterfaces {
    RobotInterfaces::new(
        Arc::new(GantryWrist),
        Arc::new(AcceptAll),
        Arc::new(ExactAllocator),
        Arc::new(gantry_limits()),
    )
}

pub fn unit_box_region() -> WorkspaceGoalRegion {
    WorkspaceGoalRegion::new(
        PositionBounds::new(Point3D::new(0.0, 0.0, 0.0), Point3D::new(1.0, 1.0, 1.0)).unwrap(),
    )
}

pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
    while std::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(std::time::Duration::from_millis(1));
    }
    false
}
