//! Narrow interfaces to the robot-side collaborators.
//!
//! Forward kinematics, validity checking and constraint projection are owned
//! by the host; the sampler only calls through these traits. Everything here
//! is queried concurrently from the sampling, roadmap and host search threads,
//! so implementations must be `Send + Sync` and keep any scratch state local
//! to the call.

use crate::geometry::{Configuration, Pose};
use crate::region::PoseConstraint;
use crate::{Error, Result};
use rand::{Rng, RngCore};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// End-effector pose of the group the regions are expressed for
pub trait ForwardKinematics: Send + Sync {
    fn end_effector_pose(&self, configuration: &Configuration) -> Pose;
}

/// Full-state validity (collisions, joint limits, ...)
pub trait ValidityChecker: Send + Sync {
    fn is_valid(&self, configuration: &Configuration, verbose: bool) -> bool;
}

/// Projects a configuration onto the constraint it was selected for.
///
/// `validity` is called on every candidate the projector produces; a
/// projection only succeeds on a candidate the callback accepted.
pub trait ConstraintProjector: Send {
    fn project(
        &mut self,
        configuration: &mut Configuration,
        max_attempts: u32,
        validity: &mut dyn FnMut(&Configuration) -> bool,
    ) -> bool;
}

/// Resolves a projector able to satisfy a constraint, if any
pub trait ConstraintSamplerAllocator: Send + Sync {
    fn select_sampler(&self, constraint: &PoseConstraint) -> Option<Box<dyn ConstraintProjector>>;
}

/// Decides whether a configuration satisfies a pose constraint
pub trait ConstraintEvaluator: Send + Sync {
    fn decide(&self, constraint: &PoseConstraint, configuration: &Configuration, verbose: bool) -> bool;
}

/// Unconstrained configuration sampler
pub trait StateSampler: Send + Sync {
    fn sample_uniform(&self, rng: &mut dyn RngCore) -> Configuration;
}

/// What the sampler needs to know about the host's path search
///
/// The loop's own attempt count and whether it is still sampling are not
/// asked of the host; the source reads them from [`SamplingContext`].
///
/// [`SamplingContext`]: crate::goal_sampling::SamplingContext
pub trait HostSearchState: Send + Sync {
    fn has_solution(&self) -> bool;
}

/// The robot-side collaborators the sampler calls through
#[derive(Clone)]
pub struct RobotInterfaces {
    pub kinematics: Arc<dyn ForwardKinematics>,
    pub validity: Arc<dyn ValidityChecker>,
    pub constraint_samplers: Arc<dyn ConstraintSamplerAllocator>,
    pub constraint_evaluator: Arc<dyn ConstraintEvaluator>,
    pub state_sampler: Arc<dyn StateSampler>,
}

impl RobotInterfaces {
    /// Interfaces deciding constraints with [`KinematicConstraintEvaluator`]
    pub fn new(
        kinematics: Arc<dyn ForwardKinematics>,
        validity: Arc<dyn ValidityChecker>,
        constraint_samplers: Arc<dyn ConstraintSamplerAllocator>,
        state_sampler: Arc<dyn StateSampler>,
    ) -> Self {
        let constraint_evaluator = Arc::new(KinematicConstraintEvaluator::new(Arc::clone(&kinematics)));
        Self {
            kinematics,
            validity,
            constraint_samplers,
            constraint_evaluator,
            state_sampler,
        }
    }

    pub fn with_constraint_evaluator(mut self, evaluator: Arc<dyn ConstraintEvaluator>) -> Self {
        self.constraint_evaluator = evaluator;
        self
    }
}

/// Shared "solution found" flag for hosts without their own search state
#[derive(Debug, Clone, Default)]
pub struct SolutionFlag(Arc<AtomicBool>);

impl SolutionFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_solved(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl HostSearchState for SolutionFlag {
    fn has_solution(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Constraint evaluator that runs forward kinematics and compares poses
#[derive(Clone)]
pub struct KinematicConstraintEvaluator {
    kinematics: Arc<dyn ForwardKinematics>,
}

impl KinematicConstraintEvaluator {
    pub fn new(kinematics: Arc<dyn ForwardKinematics>) -> Self {
        Self { kinematics }
    }
}

impl ConstraintEvaluator for KinematicConstraintEvaluator {
    fn decide(&self, constraint: &PoseConstraint, configuration: &Configuration, verbose: bool) -> bool {
        let pose = self.kinematics.end_effector_pose(configuration);
        let satisfied = constraint.is_satisfied_by(&pose);

        if verbose && !satisfied {
            log::debug!(
                "Region {} constraint unsatisfied: position error {:.4}, orientation error {:.4} rad",
                constraint.region_index,
                (pose.position - constraint.position).norm(),
                pose.orientation.angle_to(&constraint.orientation)
            );
        }
        satisfied
    }
}

/// Uniform sampler inside per-joint limits
#[derive(Debug, Clone)]
pub struct JointBoundsSampler {
    lower: Configuration,
    upper: Configuration,
}

impl JointBoundsSampler {
    pub fn new(lower: Configuration, upper: Configuration) -> Result<Self> {
        if lower.len() != upper.len() {
            return Err(Error::DimensionMismatch {
                expected: lower.len(),
                found: upper.len(),
            });
        }
        if let Some(joint) = (0..lower.len()).find(|&j| !(lower[j] <= upper[j])) {
            return Err(Error::InvalidConfig(format!(
                "joint {} limits inverted: [{}, {}]",
                joint, lower[joint], upper[joint]
            )));
        }
        Ok(Self { lower, upper })
    }

    pub fn dimension(&self) -> usize {
        self.lower.len()
    }

    pub fn contains(&self, configuration: &Configuration) -> bool {
        configuration.len() == self.dimension()
            && (0..self.dimension())
                .all(|j| configuration[j] >= self.lower[j] && configuration[j] <= self.upper[j])
    }
}

impl StateSampler for JointBoundsSampler {
    fn sample_uniform(&self, rng: &mut dyn RngCore) -> Configuration {
        Configuration::from_fn(self.dimension(), |j, _| {
            rng.gen_range(self.lower[j]..=self.upper[j])
        })
    }
}
