// Goal-region sampling: candidate queue, generator, background engine, and the facade wiring them
pub mod distance;
pub mod engine;
pub mod generator;
pub mod queue;

pub use distance::{RegionDistanceEvaluator, MIN_OUTSIDE_DISTANCE};
pub use engine::{SamplingEngine, SamplingPhase};
pub use generator::{CandidateGenerator, CandidateSource, GeneratorStats, SamplingContext};
pub use queue::{lock_queue, GoalHandle, SharedGoalQueue, WeightedGoal, WeightedGoalQueue, DEFAULT_GOAL_WEIGHT};

use crate::config::SamplerConfig;
use crate::geometry::Configuration;
use crate::kinematics::{HostSearchState, RobotInterfaces};
use crate::region::WorkspaceGoalRegion;
use crate::roadmap::growth::GrowthStats;
use crate::roadmap::{
    read_roadmap, write_roadmap, RefinementOutcome, Roadmap, RoadmapGrower, SharedRoadmap, SolutionPath,
    SolutionRefiner,
};
use crate::worker::BackgroundWorker;
use crate::Result;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

struct RoadmapState {
    graph: SharedRoadmap,
    refiner: SolutionRefiner,
    growth: Option<BackgroundWorker<GrowthStats>>,
}

/// Goal sampler for a set of workspace goal regions.
///
/// Construction validates the regions, starts background sampling into the
/// shared goal queue and, when `roadmap` is configured, starts growing the
/// roadmap used by [`improve_solution`](Self::improve_solution). Background
/// threads are stopped on [`stop`](Self::stop), [`clear`](Self::clear) or drop.
pub struct GoalRegionSampler {
    evaluator: RegionDistanceEvaluator,
    engine: SamplingEngine,
    roadmap: Option<RoadmapState>,
}

impl GoalRegionSampler {
    pub fn new(
        regions: Vec<WorkspaceGoalRegion>,
        robot: RobotInterfaces,
        initial_state: Configuration,
        config: SamplerConfig,
        host: Arc<dyn HostSearchState>,
    ) -> Result<Self> {
        config.validate()?;
        for region in &regions {
            region.validate()?;
        }

        let queue: SharedGoalQueue = Arc::new(Mutex::new(WeightedGoalQueue::with_capacity_limit(
            config.queue_order,
            config.max_sampled_goals,
        )));

        let evaluator = RegionDistanceEvaluator::new(
            regions.clone(),
            Arc::clone(&robot.kinematics),
            Arc::clone(&queue),
            config.orientation_tolerance,
        );

        let generator = CandidateGenerator::new(regions.clone(), robot.clone(), initial_state, &config);
        let mut engine = SamplingEngine::new(
            Box::new(generator),
            Arc::clone(&queue),
            host,
            Duration::from_millis(config.idle_backoff_ms),
        );

        let roadmap = match &config.roadmap {
            Some(roadmap_config) => {
                let graph: SharedRoadmap = Arc::new(RwLock::new(Roadmap::new()));
                let grower = RoadmapGrower::new(
                    Arc::clone(&graph),
                    Arc::clone(&queue),
                    Arc::clone(&robot.validity),
                    Arc::clone(&robot.state_sampler),
                    roadmap_config.clone(),
                    config.seed.map(|seed| seed.wrapping_add(1)),
                )
                .with_idle_backoff(Duration::from_millis(config.idle_backoff_ms));
                Some(RoadmapState {
                    graph,
                    refiner: SolutionRefiner::new(&regions, Arc::clone(&robot.kinematics)),
                    growth: Some(grower.spawn()?),
                })
            }
            None => None,
        };

        log::info!(
            "Goal region sampler created for {} region(s), roadmap {}",
            regions.len(),
            if roadmap.is_some() { "enabled" } else { "disabled" }
        );

        engine.start()?;

        Ok(Self {
            evaluator,
            engine,
            roadmap,
        })
    }

    pub fn regions(&self) -> &[WorkspaceGoalRegion] {
        self.evaluator.regions()
    }

    /// Zero inside a goal region, a strictly positive heuristic otherwise
    pub fn distance_to_goal(&self, configuration: &Configuration) -> f64 {
        self.evaluator.distance_to_goal(configuration)
    }

    pub fn is_satisfied(&self, configuration: &Configuration) -> bool {
        self.evaluator.is_satisfied(configuration)
    }

    /// Goal candidates shared with the host search
    pub fn queue(&self) -> &SharedGoalQueue {
        self.engine.queue()
    }

    pub fn phase(&self) -> SamplingPhase {
        self.engine.phase()
    }

    pub fn is_sampling(&self) -> bool {
        self.engine.is_sampling()
    }

    pub fn sampling_attempts_count(&self) -> u64 {
        self.engine.sampling_attempts_count()
    }

    /// Whether solutions can be refined through a background roadmap
    pub fn sort_roadmap(&self) -> bool {
        self.roadmap.is_some()
    }

    pub fn roadmap(&self) -> Option<&SharedRoadmap> {
        self.roadmap.as_ref().map(|state| &state.graph)
    }

    /// Extend `path` through the current roadmap snapshot.
    ///
    /// Without a roadmap there is never a terminal vertex to start from.
    pub fn improve_solution(&self, path: &mut SolutionPath) -> RefinementOutcome {
        match &self.roadmap {
            Some(state) => {
                let graph = read_roadmap(&state.graph);
                state.refiner.improve(&graph, path)
            }
            None => RefinementOutcome::NoTerminalVertex,
        }
    }

    /// Stop goal sampling and roadmap growth, keeping all sampled state
    pub fn stop(&mut self) -> Result<()> {
        self.engine.stop()?;
        if let Some(state) = self.roadmap.as_mut() {
            if let Some(growth) = state.growth.take() {
                let stats = growth.stop_and_join()?;
                log::debug!("Roadmap growth joined after {} iterations", stats.iterations);
            }
        }
        Ok(())
    }

    /// Stop all background work and drop regions, candidates and the roadmap
    pub fn clear(&mut self) -> Result<()> {
        self.stop()?;
        self.engine.clear()?;
        self.evaluator.clear();
        if let Some(state) = self.roadmap.as_mut() {
            write_roadmap(&state.graph).clear();
            state.refiner.set_regions(&[]);
        }
        Ok(())
    }
}
