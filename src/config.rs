use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Which end of the weight ordering the goal queue hands out first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueOrder {
    /// Highest weight first
    MaxFirst,
    /// Lowest weight first
    MinFirst,
}

/// How roadmap vertices are ranked when refining a solution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadmapSort {
    /// Distance from the end effector to the nearest goal-region centroid
    GoalRegionCentroid,
}

/// Configuration for the background roadmap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadmapConfig {
    /// Ranking used by solution refinement
    pub sort: RoadmapSort,

    /// Neighbours considered when connecting a new vertex
    pub max_nearest_neighbors: usize,

    /// Longest edge attempted, `None` for unbounded
    pub max_connection_distance: Option<f64>,

    /// Step used when validity-checking an edge
    pub motion_resolution: f64,

    /// Probability of growing from an accepted goal candidate instead of a uniform sample
    pub goal_bias: f64,
}

impl Default for RoadmapConfig {
    fn default() -> Self {
        Self {
            sort: RoadmapSort::GoalRegionCentroid,
            max_nearest_neighbors: 10,
            max_connection_distance: None,
            motion_resolution: 0.05,
            goal_bias: 0.5,
        }
    }
}

/// Configuration for goal-region sampling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Projection attempts per region per sampling call
    pub max_attempts: u32,

    /// Attempts handed to the projector on each projection
    pub state_sampling_attempts: u32,

    /// Per-axis tolerance (rad) for fixed orientation axes and pose constraints
    pub orientation_tolerance: f64,

    /// Position tolerance of the sampled pose constraint
    pub position_tolerance: f64,

    /// Fraction of unsatisfied projections that triggers the one-time warning
    pub invalid_sample_warning_ratio: f64,

    /// How many attempts may run with verbose validity checking
    pub verbose_displays: u32,

    /// Goal queue capacity; the lowest-priority candidate is evicted beyond it
    pub max_sampled_goals: usize,

    pub queue_order: QueueOrder,

    /// Seed for reproducible sampling
    pub seed: Option<u64>,

    /// Pause after a sampling iteration that accepted nothing
    pub idle_backoff_ms: u64,

    /// Grow a roadmap alongside sampling when set
    pub roadmap: Option<RoadmapConfig>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            state_sampling_attempts: 2,
            orientation_tolerance: 0.02,
            position_tolerance: 1e-3,
            invalid_sample_warning_ratio: 0.8,
            verbose_displays: 1,
            max_sampled_goals: 50,
            queue_order: QueueOrder::MaxFirst,
            seed: None,
            idle_backoff_ms: 1,
            roadmap: None,
        }
    }
}

impl SamplerConfig {
    /// Parse and validate a JSON configuration; missing fields take defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SamplerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::InvalidConfig("max_attempts must be at least 1".into()));
        }
        if self.state_sampling_attempts == 0 {
            return Err(Error::InvalidConfig(
                "state_sampling_attempts must be at least 1".into(),
            ));
        }
        if !(self.orientation_tolerance >= 0.0) || !(self.position_tolerance >= 0.0) {
            return Err(Error::InvalidConfig("tolerances must be non-negative".into()));
        }
        if !(self.invalid_sample_warning_ratio > 0.0 && self.invalid_sample_warning_ratio <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "invalid_sample_warning_ratio {} outside (0, 1]",
                self.invalid_sample_warning_ratio
            )));
        }
        if self.max_sampled_goals == 0 {
            return Err(Error::InvalidConfig("max_sampled_goals must be at least 1".into()));
        }
        if let Some(roadmap) = &self.roadmap {
            if roadmap.max_nearest_neighbors == 0 {
                return Err(Error::InvalidConfig(
                    "roadmap.max_nearest_neighbors must be at least 1".into(),
                ));
            }
            if !(roadmap.motion_resolution > 0.0) {
                return Err(Error::InvalidConfig(
                    "roadmap.motion_resolution must be positive".into(),
                ));
            }
            if !(0.0..=1.0).contains(&roadmap.goal_bias) {
                return Err(Error::InvalidConfig("roadmap.goal_bias outside [0, 1]".into()));
            }
        }
        Ok(())
    }
}
