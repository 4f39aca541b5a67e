mod common;

use common::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};
use workspace_goal_sampler::geometry::from_rpy;
use workspace_goal_sampler::worker::StopSignal;
use workspace_goal_sampler::*;

fn generate(generator: &mut CandidateGenerator, rounds: u64) -> Vec<Configuration> {
    let host = SolutionFlag::new();
    let stop = StopSignal::new();
    let mut accepted = Vec::new();
    for round in 0..rounds {
        let context = SamplingContext::new(&host, &stop, round, accepted.len());
        generator.generate(&context, &mut accepted);
    }
    accepted
}

#[test]
fn unit_box_yields_candidates_inside() {
    let config = SamplerConfig {
        seed: Some(100),
        ..SamplerConfig::default()
    };
    let mut generator = CandidateGenerator::new(vec![unit_box_region()], robot(), q(&[0.0; 6]), &config);

    let accepted = generate(&mut generator, 100);

    assert!(!accepted.is_empty());
    let region = unit_box_region();
    for goal in &accepted {
        let position = GantryWrist.end_effector_pose(goal).position;
        assert!(region.bounds.contains(&position), "{:?} outside the box", position);
    }
}

#[test]
fn fixed_roll_off_by_half_radian_is_never_inside() {
    let region = unit_box_region().with_orientation(
        Orientation::identity(),
        [OrientationAxis::Fixed, OrientationAxis::Free, OrientationAxis::Free],
    );
    let queue: SharedGoalQueue = Arc::new(Mutex::new(WeightedGoalQueue::new(QueueOrder::MaxFirst)));
    let evaluator = RegionDistanceEvaluator::new(vec![region.clone()], Arc::new(GantryWrist), queue, 0.02);
    let mut rng = SmallRng::seed_from_u64(9);

    for i in 0..200 {
        let position = region.bounds.sample_uniform(&mut rng);
        let roll = if i % 2 == 0 { 0.5 } else { -0.5 };
        let orientation = from_rpy(roll, rng.gen_range(-1.2..1.2), rng.gen_range(-3.0..3.0));
        let configuration = configuration_for(&Pose::new(position, orientation));

        assert!(evaluator.distance_to_goal(&configuration) > 0.0);
        assert!(!evaluator.is_satisfied(&configuration));
    }
}

#[test]
fn queue_extracts_in_weight_order() {
    let mut rng = SmallRng::seed_from_u64(17);
    for order in [QueueOrder::MaxFirst, QueueOrder::MinFirst] {
        let mut queue = WeightedGoalQueue::new(order);
        let handles: Vec<GoalHandle> = (0..40)
            .map(|i| queue.insert_weighted(q(&[i as f64]), rng.gen_range(0.0..10.0)))
            .collect();

        // Handles stay usable until extraction
        for handle in handles.iter().step_by(3) {
            queue.update_weight(*handle, rng.gen_range(0.0..10.0)).unwrap();
        }

        let weights: Vec<f64> = std::iter::from_fn(|| queue.pop()).map(|goal| goal.weight).collect();
        assert_eq!(weights.len(), 40);
        for pair in weights.windows(2) {
            match order {
                QueueOrder::MaxFirst => assert!(pair[0] >= pair[1]),
                QueueOrder::MinFirst => assert!(pair[0] <= pair[1]),
            }
        }
        assert!(handles.iter().all(|handle| !queue.contains(*handle)));
    }
}

#[test]
fn clear_then_new_regions_start_from_scratch() {
    let config = SamplerConfig {
        seed: Some(3),
        ..SamplerConfig::default()
    };
    let mut generator = CandidateGenerator::new(vec![unit_box_region()], robot(), q(&[0.0; 6]), &config);
    assert!(!generate(&mut generator, 5).is_empty());

    generator.clear();
    assert!(generator.regions().is_empty());
    assert!(generate(&mut generator, 5).is_empty());

    let far = WorkspaceGoalRegion::new(
        PositionBounds::new(Point3D::new(1.5, 1.5, 1.5), Point3D::new(1.8, 1.8, 1.8)).unwrap(),
    );
    generator.set_regions(vec![far.clone()]);
    assert!(generator.constraint(0).is_none());

    let accepted = generate(&mut generator, 5);
    assert!(!accepted.is_empty());
    for goal in &accepted {
        assert!(far.bounds.contains(&GantryWrist.end_effector_pose(goal).position));
    }
}

#[test]
fn sampler_fills_queue_and_refines_through_roadmap() {
    let config = SamplerConfig {
        seed: Some(11),
        roadmap: Some(RoadmapConfig {
            goal_bias: 0.5,
            ..RoadmapConfig::default()
        }),
        ..SamplerConfig::default()
    };
    let host = SolutionFlag::new();
    let mut sampler = GoalRegionSampler::new(
        vec![unit_box_region()],
        robot(),
        q(&[0.0; 6]),
        config,
        Arc::new(host.clone()),
    )
    .unwrap();

    let roadmap = Arc::clone(sampler.roadmap().unwrap());
    // Wait for a goal candidate that has also become a roadmap vertex
    let mut terminal = None;
    assert!(wait_until(|| {
        let goals: Vec<Configuration> = lock_queue(sampler.queue())
            .iter()
            .map(|goal| goal.configuration.clone())
            .collect();
        let graph = read_roadmap(&roadmap);
        terminal = goals.into_iter().find(|goal| graph.find_vertex(goal).is_some());
        terminal.is_some() && graph.len() > 20
    }));

    host.mark_solved();
    sampler.stop().unwrap();
    assert_eq!(sampler.phase(), SamplingPhase::Stopped);

    let Some(terminal) = terminal else {
        panic!("no goal candidate became a roadmap vertex");
    };
    let mut path = SolutionPath::new(vec![q(&[0.0; 6]), terminal.clone()]);
    let centroid = unit_box_region().centroid();
    let score = |c: &Configuration| (GantryWrist.end_effector_pose(c).position - centroid).norm();

    match sampler.improve_solution(&mut path) {
        RefinementOutcome::Spliced { appended } => {
            assert_eq!(path.len(), 2 + appended);
            let last = path.terminal().unwrap();
            assert!(score(last) <= score(&terminal));
            assert!(path.terminal_vertex.is_some());
        }
        RefinementOutcome::NoBetterVertex => assert_eq!(path.len(), 2),
        RefinementOutcome::NoTerminalVertex => panic!("terminal vertex was in the roadmap"),
    }

    sampler.clear().unwrap();
    assert!(lock_queue(sampler.queue()).is_empty());
    assert!(read_roadmap(&roadmap).is_empty());
}

#[test]
fn refinement_reads_roadmap_while_it_grows() {
    let config = SamplerConfig {
        seed: Some(23),
        roadmap: Some(RoadmapConfig::default()),
        ..SamplerConfig::default()
    };
    let mut sampler = GoalRegionSampler::new(
        vec![unit_box_region()],
        robot(),
        q(&[0.0; 6]),
        config,
        Arc::new(SolutionFlag::new()),
    )
    .unwrap();
    let roadmap = Arc::clone(sampler.roadmap().unwrap());
    assert!(wait_until(|| read_roadmap(&roadmap).len() > 10));
    let size_before = read_roadmap(&roadmap).len();

    for _ in 0..20 {
        let goals: Vec<Configuration> = lock_queue(sampler.queue())
            .iter()
            .map(|goal| goal.configuration.clone())
            .collect();
        let terminal = {
            let graph = read_roadmap(&roadmap);
            goals.into_iter().find(|goal| graph.find_vertex(goal).is_some())
        };
        let Some(terminal) = terminal else {
            std::thread::sleep(std::time::Duration::from_millis(2));
            continue;
        };

        // Growth keeps running while the solution is refined
        let mut path = SolutionPath::new(vec![q(&[0.0; 6]), terminal.clone()]);
        let outcome = sampler.improve_solution(&mut path);
        assert_ne!(outcome, RefinementOutcome::NoTerminalVertex);

        if let RefinementOutcome::Spliced { appended } = outcome {
            assert_eq!(path.len(), 2 + appended);
            assert_eq!(path.states[1], terminal);

            let graph = read_roadmap(&roadmap);
            for pair in path.states[1..].windows(2) {
                let from = graph.find_vertex(&pair[0]).unwrap();
                let to = graph.find_vertex(&pair[1]).unwrap();
                assert!(
                    graph.neighbors(from).iter().any(|edge| edge.to == to),
                    "spliced states {} -> {} are not joined by an edge",
                    from,
                    to
                );
            }
            assert_eq!(graph.find_vertex(path.terminal().unwrap()), path.terminal_vertex);
        }
        std::thread::sleep(std::time::Duration::from_millis(2));
    }

    assert!(wait_until(|| read_roadmap(&roadmap).len() > size_before));
    sampler.stop().unwrap();
}
