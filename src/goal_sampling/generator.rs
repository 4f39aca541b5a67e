// Candidate generation: one projection-based sampling pass over every region
use crate::config::SamplerConfig;
use crate::geometry::{uniform_orientation, Configuration, Pose};
use crate::kinematics::{ConstraintProjector, HostSearchState, RobotInterfaces};
use crate::region::{PoseConstraint, WorkspaceGoalRegion};
use crate::worker::StopSignal;
use rand::rngs::SmallRng;
use rand::SeedableRng;

/// Invalid-sample warnings wait for at least this many constrained projections
const MIN_ATTEMPTS_FOR_WARNING: u64 = 10;

/// What a candidate source can observe about the surrounding sampling loop
pub struct SamplingContext<'a> {
    host: &'a dyn HostSearchState,
    stop: &'a StopSignal,
    attempts_so_far: u64,
    goal_count: usize,
}

impl<'a> SamplingContext<'a> {
    pub fn new(
        host: &'a dyn HostSearchState,
        stop: &'a StopSignal,
        attempts_so_far: u64,
        goal_count: usize,
    ) -> Self {
        Self {
            host,
            stop,
            attempts_so_far,
            goal_count,
        }
    }

    pub fn has_solution(&self) -> bool {
        self.host.has_solution()
    }

    /// Sampling iterations completed before this one
    pub fn sampling_attempts_count(&self) -> u64 {
        self.attempts_so_far
    }

    pub fn is_sampling(&self) -> bool {
        !self.stop.is_stopped()
    }

    /// Candidates in the goal queue when the iteration started
    pub fn goal_count(&self) -> usize {
        self.goal_count
    }
}

/// Something the sampling engine can ask for new goal configurations.
///
/// Accepted configurations are pushed onto `accepted`; the return value says
/// whether anything was accepted this call.
pub trait CandidateSource: Send {
    fn generate(&mut self, context: &SamplingContext<'_>, accepted: &mut Vec<Configuration>) -> bool;

    /// Drop all source-owned state
    fn clear(&mut self) {}
}

impl<F> CandidateSource for F
where
    F: FnMut(&SamplingContext<'_>, &mut Vec<Configuration>) -> bool + Send,
{
    fn generate(&mut self, context: &SamplingContext<'_>, accepted: &mut Vec<Configuration>) -> bool {
        self(context, accepted)
    }
}

#[derive(Debug, Clone, Default)]
pub struct GeneratorStats {
    /// Projection or fallback attempts made
    pub attempts: u64,
    /// Attempts made through a constraint projector
    pub constrained_attempts: u64,
    /// Projections that succeeded but did not satisfy the constraint
    pub invalid_samples: u64,
    pub accepted: u64,
    pub verbose_shown: u32,
    pub warned_invalid_samples: bool,
}

/// Samples workspace poses per region and turns them into validated goal configurations
pub struct CandidateGenerator {
    regions: Vec<WorkspaceGoalRegion>,
    constraints: Vec<Option<PoseConstraint>>,
    robot: RobotInterfaces,
    initial_state: Configuration,
    work_state: Configuration,
    rng: SmallRng,
    max_attempts: u32,
    state_sampling_attempts: u32,
    position_tolerance: f64,
    orientation_tolerance: f64,
    invalid_sample_warning_ratio: f64,
    verbose_displays: u32,
    stats: GeneratorStats,
}

impl CandidateGenerator {
    pub fn new(
        regions: Vec<WorkspaceGoalRegion>,
        robot: RobotInterfaces,
        initial_state: Configuration,
        config: &SamplerConfig,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let constraints = vec![None; regions.len()];

        for index in 0..regions.len() {
            log::debug!("Creating SE(3) workspace sampler for goal region {}", index + 1);
        }

        Self {
            regions,
            constraints,
            robot,
            work_state: initial_state.clone(),
            initial_state,
            rng,
            max_attempts: config.max_attempts,
            state_sampling_attempts: config.state_sampling_attempts,
            position_tolerance: config.position_tolerance,
            orientation_tolerance: config.orientation_tolerance,
            invalid_sample_warning_ratio: config.invalid_sample_warning_ratio,
            verbose_displays: config.verbose_displays,
            stats: GeneratorStats::default(),
        }
    }

    pub fn regions(&self) -> &[WorkspaceGoalRegion] {
        &self.regions
    }

    /// Current constraint of a region, `None` until the region is first sampled
    pub fn constraint(&self, region_index: usize) -> Option<&PoseConstraint> {
        self.constraints.get(region_index).and_then(Option::as_ref)
    }

    pub fn stats(&self) -> &GeneratorStats {
        &self.stats
    }

    /// Replace the regions; constraints are rebuilt on the next pass
    pub fn set_regions(&mut self, regions: Vec<WorkspaceGoalRegion>) {
        self.constraints = vec![None; regions.len()];
        self.regions = regions;
    }

    fn refresh_constraint(&mut self, index: usize) -> PoseConstraint {
        let region = &self.regions[index];
        let position = region.bounds.sample_uniform(&mut self.rng);
        let orientation = if region.any_free() {
            uniform_orientation(&mut self.rng)
        } else {
            region.orientation
        };

        let (position_tolerance, orientation_tolerance) = (self.position_tolerance, self.orientation_tolerance);
        let constraint = self.constraints[index].get_or_insert_with(|| {
            PoseConstraint::from_region(index, region, position_tolerance, orientation_tolerance)
        });
        constraint.refresh(region, &Pose::new(position, orientation));
        constraint.clone()
    }

    fn attempt_region(
        &mut self,
        context: &SamplingContext<'_>,
        constraint: &PoseConstraint,
        mut projector: Option<Box<dyn ConstraintProjector>>,
        goal_count: usize,
    ) -> Option<Configuration> {
        let verbose_from = self.max_attempts / 2;

        for attempt in 0..self.max_attempts {
            if !context.is_sampling() {
                break;
            }
            let verbose = self.take_verbose(goal_count == 0 && attempt >= verbose_from);
            self.stats.attempts += 1;

            let candidate = match projector.as_mut() {
                Some(projector) => self.project(projector.as_mut(), constraint, verbose),
                None => self.sample_unconstrained(constraint, verbose),
            };
            if candidate.is_some() {
                self.stats.accepted += 1;
                return candidate;
            }
        }
        None
    }

    fn project(
        &mut self,
        projector: &mut dyn ConstraintProjector,
        constraint: &PoseConstraint,
        verbose: bool,
    ) -> Option<Configuration> {
        self.stats.constrained_attempts += 1;

        let validity = &self.robot.validity;
        let mut callback = |candidate: &Configuration| validity.is_valid(candidate, verbose);
        if !projector.project(&mut self.work_state, self.state_sampling_attempts, &mut callback) {
            return None;
        }

        if !self.robot.constraint_evaluator.decide(constraint, &self.work_state, verbose) {
            self.record_invalid_sample();
            return None;
        }
        if !self.robot.validity.is_valid(&self.work_state, verbose) {
            return None;
        }
        Some(self.work_state.clone())
    }

    fn sample_unconstrained(&mut self, constraint: &PoseConstraint, verbose: bool) -> Option<Configuration> {
        let candidate = self.robot.state_sampler.sample_uniform(&mut self.rng);
        if !self.robot.validity.is_valid(&candidate, verbose) {
            return None;
        }
        if !self.robot.constraint_evaluator.decide(constraint, &candidate, verbose) {
            return None;
        }
        self.work_state = candidate.clone();
        Some(candidate)
    }

    fn take_verbose(&mut self, eligible: bool) -> bool {
        if eligible && self.stats.verbose_shown < self.verbose_displays {
            self.stats.verbose_shown += 1;
            true
        } else {
            false
        }
    }

    fn record_invalid_sample(&mut self) {
        self.stats.invalid_samples += 1;
        let attempts = self.stats.constrained_attempts;
        if !self.stats.warned_invalid_samples
            && attempts >= MIN_ATTEMPTS_FOR_WARNING
            && self.stats.invalid_samples as f64 > self.invalid_sample_warning_ratio * attempts as f64
        {
            self.stats.warned_invalid_samples = true;
            log::warn!(
                "More than {:.0}% of the sampled goal states fail to satisfy the constraints imposed on the goal sampler. Is the constrained sampler working correctly?",
                self.invalid_sample_warning_ratio * 100.0
            );
        }
    }
}

impl CandidateSource for CandidateGenerator {
    fn generate(&mut self, context: &SamplingContext<'_>, accepted: &mut Vec<Configuration>) -> bool {
        let mut success = false;

        for index in 0..self.regions.len() {
            // Back off while the host already holds a solution
            if context.has_solution() {
                continue;
            }

            let constraint = self.refresh_constraint(index);
            let projector = self.robot.constraint_samplers.select_sampler(&constraint);
            if projector.is_none() {
                log::debug!("No constraint sampler for goal region {}, using default sampler", index + 1);
            }

            let goal_count = context.goal_count() + accepted.len();
            if let Some(goal) = self.attempt_region(context, &constraint, projector, goal_count) {
                accepted.push(goal);
                success = true;
            }
        }
        success
    }

    fn clear(&mut self) {
        self.regions.clear();
        self.constraints.clear();
        self.work_state = self.initial_state.clone();
        self.stats = GeneratorStats::default();
    }
}
