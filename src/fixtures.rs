// Test robot: a Cartesian gantry carrying a roll/pitch/yaw wrist.
// Joints are [x, y, z, roll, pitch, yaw], so forward kinematics is exact.
use crate::geometry::{from_rpy, Configuration, Point3D, Pose};
use crate::kinematics::{
    ConstraintEvaluator, ConstraintProjector, ConstraintSamplerAllocator, ForwardKinematics,
    JointBoundsSampler, RobotInterfaces, ValidityChecker,
};
use crate::region::PoseConstraint;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub struct GantryWrist;

impl GantryWrist {
    pub fn configuration_for(pose: &Pose) -> Configuration {
        let [roll, pitch, yaw] = pose.rpy();
        Configuration::from_vec(vec![
            pose.position.x,
            pose.position.y,
            pose.position.z,
            roll,
            pitch,
            yaw,
        ])
    }
}

impl ForwardKinematics for GantryWrist {
    fn end_effector_pose(&self, q: &Configuration) -> Pose {
        Pose::new(Point3D::new(q[0], q[1], q[2]), from_rpy(q[3], q[4], q[5]))
    }
}

pub struct AcceptAll;

impl ValidityChecker for AcceptAll {
    fn is_valid(&self, _configuration: &Configuration, _verbose: bool) -> bool {
        true
    }
}

pub struct RejectAll;

impl ValidityChecker for RejectAll {
    fn is_valid(&self, _configuration: &Configuration, _verbose: bool) -> bool {
        false
    }
}

/// Solves the constraint exactly and counts every projection call
pub struct ExactProjector {
    target: Pose,
    calls: Arc<AtomicUsize>,
}

impl ConstraintProjector for ExactProjector {
    fn project(
        &mut self,
        configuration: &mut Configuration,
        _max_attempts: u32,
        validity: &mut dyn FnMut(&Configuration) -> bool,
    ) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let candidate = GantryWrist::configuration_for(&self.target);
        if !validity(&candidate) {
            return false;
        }
        *configuration = candidate;
        true
    }
}

/// Allocator handing out [`ExactProjector`]s sharing one call counter
#[derive(Default)]
pub struct ExactAllocator {
    pub calls: Arc<AtomicUsize>,
}

impl ExactAllocator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ConstraintSamplerAllocator for ExactAllocator {
    fn select_sampler(&self, constraint: &PoseConstraint) -> Option<Box<dyn ConstraintProjector>> {
        Some(Box::new(ExactProjector {
            target: constraint.target(),
            calls: Arc::clone(&self.calls),
        }))
    }
}

/// Projector that "succeeds" but lands somewhere that never satisfies the constraint
pub struct MissingProjector;

impl ConstraintProjector for MissingProjector {
    fn project(
        &mut self,
        configuration: &mut Configuration,
        _max_attempts: u32,
        _validity: &mut dyn FnMut(&Configuration) -> bool,
    ) -> bool {
        *configuration = Configuration::from_vec(vec![100.0, 100.0, 100.0, 0.0, 0.0, 0.0]);
        true
    }
}

pub struct MissingAllocator;

impl ConstraintSamplerAllocator for MissingAllocator {
    fn select_sampler(&self, _constraint: &PoseConstraint) -> Option<Box<dyn ConstraintProjector>> {
        Some(Box::new(MissingProjector))
    }
}

pub struct NoSamplerAllocator;

impl ConstraintSamplerAllocator for NoSamplerAllocator {
    fn select_sampler(&self, _constraint: &PoseConstraint) -> Option<Box<dyn ConstraintProjector>> {
        None
    }
}

pub fn q(values: &[f64]) -> Configuration {
    Configuration::from_vec(values.to_vec())
}

/// Counts validity queries made in verbose mode; accepts nothing
#[derive(Default)]
pub struct VerboseCounter {
    pub verbose_calls: AtomicUsize,
}

impl ValidityChecker for VerboseCounter {
    fn is_valid(&self, _configuration: &Configuration, verbose: bool) -> bool {
        if verbose {
            self.verbose_calls.fetch_add(1, Ordering::SeqCst);
        }
        false
    }
}

pub struct AlwaysSatisfied;

impl ConstraintEvaluator for AlwaysSatisfied {
    fn decide(&self, _constraint: &PoseConstraint, _configuration: &Configuration, _verbose: bool) -> bool {
        true
    }
}

/// Joint limits covering a 2 m gantry cube and the full wrist range
pub fn gantry_limits() -> JointBoundsSampler {
    let pi = std::f64::consts::PI;
    JointBoundsSampler::new(
        q(&[-2.0, -2.0, -2.0, -pi, -pi / 2.0, -pi]),
        q(&[2.0, 2.0, 2.0, pi, pi / 2.0, pi]),
    )
    .unwrap()
}

pub fn interfaces(
    validity: Arc<dyn ValidityChecker>,
    constraint_samplers: Arc<dyn ConstraintSamplerAllocator>,
) -> RobotInterfaces {
    RobotInterfaces::new(
        Arc::new(GantryWrist),
        validity,
        constraint_samplers,
        Arc::new(gantry_limits()),
    )
}
