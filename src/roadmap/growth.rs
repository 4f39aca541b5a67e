// Goal-biased roadmap growth on a background thread
use super::{read_roadmap, write_roadmap, SharedRoadmap, VertexId};
use crate::config::RoadmapConfig;
use crate::geometry::{configuration_distance, interpolate, Configuration};
use crate::goal_sampling::queue::{lock_queue, SharedGoalQueue};
use crate::kinematics::{StateSampler, ValidityChecker};
use crate::worker::{BackgroundWorker, StopSignal};
use crate::Result;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;

const WORKER_NAME: &str = "roadmap-growth";

const DEFAULT_IDLE_BACKOFF: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Default)]
pub struct GrowthStats {
    pub iterations: u64,
    pub vertices_added: u64,
    pub edges_added: u64,
}

/// Grows a [`Roadmap`](super::Roadmap) from goal candidates and uniform samples.
///
/// Each step samples a configuration (an accepted goal candidate with
/// probability `goal_bias`, otherwise the state sampler), rejects it if
/// invalid, adds it as a vertex and connects it to its nearest neighbours
/// whose straight-line motion stays valid.
pub struct RoadmapGrower {
    roadmap: SharedRoadmap,
    queue: SharedGoalQueue,
    validity: Arc<dyn ValidityChecker>,
    state_sampler: Arc<dyn StateSampler>,
    config: RoadmapConfig,
    rng: SmallRng,
    idle_backoff: Duration,
    stats: GrowthStats,
}

impl RoadmapGrower {
    pub fn new(
        roadmap: SharedRoadmap,
        queue: SharedGoalQueue,
        validity: Arc<dyn ValidityChecker>,
        state_sampler: Arc<dyn StateSampler>,
        config: RoadmapConfig,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self {
            roadmap,
            queue,
            validity,
            state_sampler,
            config,
            rng,
            idle_backoff: DEFAULT_IDLE_BACKOFF,
            stats: GrowthStats::default(),
        }
    }

    /// Pause after a step that added no vertex
    pub fn with_idle_backoff(mut self, idle_backoff: Duration) -> Self {
        self.idle_backoff = idle_backoff;
        self
    }

    pub fn stats(&self) -> &GrowthStats {
        &self.stats
    }

    /// Run [`grow_once`](Self::grow_once) on a worker thread until stopped
    pub fn spawn(mut self) -> Result<BackgroundWorker<GrowthStats>> {
        let worker = BackgroundWorker::spawn(WORKER_NAME, move |stop: StopSignal| {
            while !stop.is_stopped() {
                if self.grow_once().is_none() {
                    if self.idle_backoff.is_zero() {
                        std::thread::yield_now();
                    } else {
                        std::thread::sleep(self.idle_backoff);
                    }
                }
            }
            log::info!(
                "Roadmap growth stopped: {} vertices, {} edges added in {} iterations",
                self.stats.vertices_added,
                self.stats.edges_added,
                self.stats.iterations
            );
            self.stats
        })?;
        log::info!("Started roadmap growth thread");
        Ok(worker)
    }

    /// One growth step; returns the new vertex if one was added
    pub fn grow_once(&mut self) -> Option<VertexId> {
        self.stats.iterations += 1;

        let sample = self.sample();
        if !self.validity.is_valid(&sample, false) {
            return None;
        }

        let neighbors: Vec<(VertexId, Configuration)> = {
            let roadmap = read_roadmap(&self.roadmap);
            // Goal candidates are drawn repeatedly; keep one vertex per configuration
            if roadmap.find_vertex(&sample).is_some() {
                return None;
            }
            roadmap
                .nearest(
                    &sample,
                    self.config.max_nearest_neighbors,
                    self.config.max_connection_distance,
                )
                .into_iter()
                .filter_map(|(id, _)| roadmap.configuration(id).map(|q| (id, q.clone())))
                .collect()
        };

        // Vertices are append-only, so the ids stay valid while motions are checked unlocked
        let connectable: Vec<VertexId> = neighbors
            .iter()
            .filter(|(_, q)| self.motion_is_valid(q, &sample))
            .map(|(id, _)| *id)
            .collect();

        let mut roadmap = write_roadmap(&self.roadmap);
        let vertex = roadmap.add_vertex(sample);
        for neighbor in connectable {
            if roadmap.add_edge(vertex, neighbor) {
                self.stats.edges_added += 1;
            }
        }
        self.stats.vertices_added += 1;
        Some(vertex)
    }

    fn sample(&mut self) -> Configuration {
        if self.rng.gen_bool(self.config.goal_bias) {
            let goal = lock_queue(&self.queue).sample(&mut self.rng);
            if let Some(goal) = goal {
                return goal;
            }
        }
        self.state_sampler.sample_uniform(&mut self.rng)
    }

    /// Check the interior of the straight segment `from -> to` every `motion_resolution`
    fn motion_is_valid(&self, from: &Configuration, to: &Configuration) -> bool {
        let distance = configuration_distance(from, to);
        if !distance.is_finite() {
            return false;
        }
        let steps = (distance / self.config.motion_resolution).ceil().max(1.0) as usize;
        (1..steps).all(|step| {
            let t = step as f64 / steps as f64;
            self.validity.is_valid(&interpolate(from, to, t), false)
        })
    }
}
