// Goal-region sampling for manipulators whose goal is a set of workspace boxes
pub mod geometry;
pub mod region;
pub mod config;
pub mod kinematics;
pub mod validity;
pub mod worker;
pub mod goal_sampling;
pub mod roadmap;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-export commonly used types
pub use geometry::{Configuration, Orientation, Point3D, Pose, Vector3D};
pub use region::{OrientationAxis, PoseConstraint, PositionBounds, WorkspaceGoalRegion};
pub use config::{QueueOrder, RoadmapConfig, RoadmapSort, SamplerConfig};
pub use kinematics::{
    ConstraintEvaluator, ConstraintProjector, ConstraintSamplerAllocator, ForwardKinematics,
    HostSearchState, JointBoundsSampler, KinematicConstraintEvaluator, RobotInterfaces, SolutionFlag,
    StateSampler, ValidityChecker,
};
pub use validity::WorkspaceBoundsChecker;
pub use goal_sampling::{
    lock_queue, CandidateGenerator, CandidateSource, GoalHandle, GoalRegionSampler, RegionDistanceEvaluator,
    SamplingContext, SamplingEngine, SamplingPhase, SharedGoalQueue, WeightedGoal, WeightedGoalQueue,
};
pub use roadmap::{
    read_roadmap, ConnectivityIndex, RefinementOutcome, Roadmap, RoadmapGrower, SharedRoadmap, SolutionPath,
    SolutionRefiner, VertexId,
};

/// Main result type for the sampler
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the sampler
///
/// Rejected samples are not errors; these only cover construction,
/// configuration and handle misuse.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid workspace goal region: {0}")]
    InvalidRegion(String),

    #[error("Invalid sampler configuration: {0}")]
    InvalidConfig(String),

    #[error("Goal handle {0:?} does not refer to a live candidate")]
    UnknownGoal(GoalHandle),

    #[error("Configuration has {found} joints, expected {expected}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Background worker '{0}' panicked")]
    WorkerPanicked(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
