// Example: sample goals for a gantry with a roll/pitch/yaw wrist and refine a path through the roadmap

use std::sync::Arc;
use std::time::Duration;
use workspace_goal_sampler::geometry::from_rpy;
use workspace_goal_sampler::*;

/// Cartesian gantry carrying a spherical wrist: joints are [x, y, z, roll, pitch, yaw]
struct GantryWrist;

impl ForwardKinematics for GantryWrist {
    fn end_effector_pose(&self, q: &Configuration) -> Pose {
        Pose::new(Point3D::new(q[0], q[1], q[2]), from_rpy(q[3], q[4], q[5]))
    }
}

/// Closed-form inverse kinematics for the gantry
struct GantryProjector {
    target: Pose,
}

impl ConstraintProjector for GantryProjector {
    fn project(
        &mut self,
        configuration: &mut Configuration,
        _max_attempts: u32,
        validity: &mut dyn FnMut(&Configuration) -> bool,
    ) -> bool {
        let [roll, pitch, yaw] = self.target.rpy();
        let p = self.target.position;
        let candidate = Configuration::from_vec(vec![p.x, p.y, p.z, roll, pitch, yaw]);
        if !validity(&candidate) {
            return false;
        }
        *configuration = candidate;
        true
    }
}

struct GantryAllocator;

impl ConstraintSamplerAllocator for GantryAllocator {
    fn select_sampler(&self, constraint: &PoseConstraint) -> Option<Box<dyn ConstraintProjector>> {
        Some(Box::new(GantryProjector {
            target: constraint.target(),
        }))
    }
}

fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("Workspace goal sampler - gantry wrist demo");
    log::info!("==========================================\n");

    let pi = std::f64::consts::PI;
    let limits = JointBoundsSampler::new(
        Configuration::from_vec(vec![-1.0, -1.0, 0.0, -pi, -pi / 2.0, -pi]),
        Configuration::from_vec(vec![1.0, 1.0, 1.0, pi, pi / 2.0, pi]),
    )?;
    let kinematics: Arc<dyn ForwardKinematics> = Arc::new(GantryWrist);
    let checker = WorkspaceBoundsChecker::new(
        Arc::clone(&kinematics),
        (Point3D::new(-1.0, -1.0, 0.0), Point3D::new(1.0, 1.0, 1.0)),
    )
    .with_joint_limits(limits.clone());

    let robot = RobotInterfaces::new(
        kinematics,
        Arc::new(checker),
        Arc::new(GantryAllocator),
        Arc::new(limits),
    );

    // Step 1: Goal regions
    log::info!("Step 1: Defining goal regions");
    let shelf = WorkspaceGoalRegion::new(PositionBounds::new(
        Point3D::new(0.4, 0.4, 0.2),
        Point3D::new(0.6, 0.6, 0.4),
    )?);
    let bin = WorkspaceGoalRegion::new(PositionBounds::new(
        Point3D::new(-0.6, 0.2, 0.0),
        Point3D::new(-0.4, 0.4, 0.1),
    )?)
    .with_orientation(
        from_rpy(0.0, 0.0, 0.0),
        [OrientationAxis::Fixed, OrientationAxis::Fixed, OrientationAxis::Free],
    );
    let regions = vec![shelf, bin];
    for (i, region) in regions.iter().enumerate() {
        log::info!("  Region {}: centroid {:?}, axes {:?}", i + 1, region.centroid(), region.axes());
    }

    // Step 2: Start sampling
    log::info!("\nStep 2: Sampling goals with a background roadmap");
    let config = SamplerConfig::from_json_str(
        r#"{ "seed": 7, "max_sampled_goals": 20, "roadmap": { "goal_bias": 0.3 } }"#,
    )?;
    let host = SolutionFlag::new();
    let start = Configuration::from_vec(vec![0.0, 0.0, 0.5, 0.0, 0.0, 0.0]);
    let mut sampler = GoalRegionSampler::new(regions, robot, start.clone(), config, Arc::new(host.clone()))?;

    std::thread::sleep(Duration::from_millis(200));

    let best_goal = {
        let queue = lock_queue(sampler.queue());
        log::info!("  Goal candidates: {}", queue.len());
        queue.peek().map(|goal| goal.configuration.clone())
    };
    let Some(best_goal) = best_goal else {
        log::warn!("No goal candidate sampled");
        return Ok(());
    };
    log::info!("  Distance to goal of best candidate: {}", sampler.distance_to_goal(&best_goal));
    log::info!("  Distance to goal of start state: {:.4}", sampler.distance_to_goal(&start));

    // Step 3: Pretend the host found a path to the candidate, then refine it
    log::info!("\nStep 3: Refining a solution through the roadmap");
    host.mark_solved();
    sampler.stop()?;

    if let Some(roadmap) = sampler.roadmap() {
        let graph = read_roadmap(roadmap);
        log::info!("  Roadmap: {} vertices, {} edges", graph.len(), graph.edge_count());
    }

    let mut path = SolutionPath::new(vec![start, best_goal]);
    match sampler.improve_solution(&mut path) {
        RefinementOutcome::Spliced { appended } => log::info!("  Appended {} states", appended),
        outcome => log::info!("  No refinement: {:?}", outcome),
    }

    sampler.clear()?;
    log::info!("\nDone");
    Ok(())
}
