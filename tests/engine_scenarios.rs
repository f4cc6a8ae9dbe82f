//! End-to-end scenarios for the simulation engine.
//!
//! These exercise the full tick pipeline: sensing with delay, strategy
//! evaluation, actuator response, clamps and collision bookkeeping.

use swarm_lib::config::SimConfig;
use swarm_lib::engine::io::{load_result, save_result};
use swarm_lib::engine::{Engine, SimulationResult};
use swarm_lib::geometry::arena::{Arena, Obstacle};
use swarm_lib::phase::Phase;
use swarm_lib::vector::Vec3;

fn quiet_config(n: usize) -> SimConfig {
    let mut config = SimConfig::default();
    config.sit.number_of_agents = n;
    config.sit.delta_t = 0.1;
    config.unit.t_gps = 0.1;
    config.unit.t_del = 0.5;
    config.unit.sigma_gps_xy = 0.0;
    config.unit.sigma_gps_z = 0.0;
    config.unit.sigma_outer_xy = 0.0;
    config.unit.sigma_outer_z = 0.0;
    config
}

fn huge_arena() -> Arena {
    Arena::Disc {
        center: Vec3::zero(),
        radius: 1_000_000.0,
    }
}

fn engine_at(config: SimConfig, arena: Arena, positions: &[(f64, f64)]) -> Engine {
    let mut initial = Phase::new(positions.len());
    for (i, &(x, y)) in positions.iter().enumerate() {
        initial.coordinates[i] = Vec3::new(x, y, 0.0);
    }
    Engine::new(config, arena, Vec::new(), initial, 11).unwrap()
}

/// A close pair under the repulsive strategy separates at full preferred
/// speed: after one tick both velocities point apart.
#[test]
fn close_pair_moves_apart() {
    let mut config = quiet_config(2);
    config.unit.flocking_type = 5;
    config.flocking.r_0 = 1000.0;
    config.flocking.v_rep = 400.0;
    config.flocking.v_flock = 400.0;

    let mut engine = engine_at(config, huge_arena(), &[(-150.0, 0.0), (150.0, 0.0)]);
    engine.step().unwrap();

    let phase = engine.current_phase();
    assert!(
        phase.velocities[0].x < 0.0,
        "left agent must accelerate further left"
    );
    assert!(phase.velocities[1].x > 0.0);

    // Keep stepping: they keep separating.
    let initial_gap = 300.0;
    engine.run(30).unwrap();
    let phase = engine.current_phase();
    let gap = (phase.coordinates[1] - phase.coordinates[0]).norm();
    assert!(gap > initial_gap, "gap {gap} must exceed {initial_gap}");
}

/// An agent stranded outside a small disc arena is pulled back by the
/// shill-wall term (scenario: 50 ticks at dt = 0.1 suffice to come home).
#[test]
fn stranded_agent_returns_to_the_arena() {
    let config = quiet_config(1);
    let arena = Arena::Disc {
        center: Vec3::zero(),
        radius: 1000.0,
    };
    let mut engine = engine_at(config, arena, &[(2000.0, 0.0)]);
    engine.run(50).unwrap();
    let position = engine.current_phase().coordinates[0];
    assert!(
        position.norm() <= 1100.0,
        "agent still at |x| = {}",
        position.norm()
    );
}

/// Obstacle-collision bookkeeping: one count on entry, no re-count inside.
#[test]
fn obstacle_crossing_counts_exactly_once() {
    let mut config = quiet_config(1);
    config.sit.delta_t = 0.001;
    config.unit.t_gps = 0.001;
    config.unit.t_del = 0.002;
    config.flocking.v_flock = 500.0;
    config.flocking.v_max = 600.0;

    let square = Obstacle::new(vec![
        Vec3::new(-0.5, -0.5, 0.0),
        Vec3::new(0.5, -0.5, 0.0),
        Vec3::new(0.5, 0.5, 0.0),
        Vec3::new(-0.5, 0.5, 0.0),
    ])
    .unwrap();

    let mut initial = Phase::new(1);
    initial.coordinates[0] = Vec3::new(10.0, 0.0, 0.0);
    initial.velocities[0] = Vec3::new(-500.0, 0.0, 0.0);
    let mut engine = Engine::new(config, huge_arena(), vec![square], initial, 11).unwrap();

    let mut seen_inside = false;
    for _ in 0..60 {
        engine.step().unwrap();
        let x = engine.current_phase().coordinates[0].x;
        if x.abs() < 0.5 {
            seen_inside = true;
            assert_eq!(
                engine.collisions_obstacle(),
                1,
                "exactly one count while inside"
            );
        } else if !seen_inside {
            assert_eq!(engine.collisions_obstacle(), 0, "no count before entry");
        }
        if seen_inside && x < -0.5 {
            break;
        }
    }
    assert!(seen_inside, "the agent never crossed the obstacle");
    assert_eq!(engine.collisions_obstacle(), 1);
}

/// Delayed observation: at tick 10 with a 0.5 s delay and dt = 0.1, an ego
/// view reads the neighbour state of tick 5 exactly.
#[test]
fn neighbour_observations_lag_by_the_configured_delay() {
    use swarm_lib::sensing::build_ego_view;
    use swarm_lib::sensing::gps::GpsNoise;

    let config = quiet_config(2);
    // Drive an engine so the ring fills with distinct phases.
    let mut initial = Phase::new(2);
    initial.coordinates[1] = Vec3::new(2000.0, 0.0, 0.0);
    initial.velocities[1] = Vec3::new(10.0, 0.0, 0.0);
    let mut engine = Engine::new(config, huge_arena(), Vec::new(), initial, 11).unwrap();
    let mut velocity_log = vec![engine.current_phase().velocities[1]];
    for _ in 0..10 {
        engine.step().unwrap();
        velocity_log.push(engine.current_phase().velocities[1]);
    }

    // Rebuild agent 0's view at tick 10 from the same committed data.
    let gps = GpsNoise::new(2);
    let readout = build_ego_view(
        engine.current_phase(),
        engine.phase_at_delay(),
        &gps,
        &gps,
        &[],
        &[],
        0,
        &config,
        config.flocking.r_0,
        None,
    );
    assert_eq!(readout.ego.phase.real_ids[1], 1);
    // Slot 1 carries exactly the tick-5 velocity, not the current one.
    assert_eq!(readout.ego.phase.velocities[1], velocity_log[5]);
    assert_ne!(readout.ego.phase.velocities[1], velocity_log[10]);
}

/// Deterministic replay and result persistence round-trip.
#[test]
fn result_round_trips_through_bincode() {
    let dir = tempfile::tempdir().unwrap();
    let config = quiet_config(3);
    let mut engine = engine_at(
        config,
        huge_arena(),
        &[(0.0, 0.0), (700.0, 0.0), (0.0, 800.0)],
    );
    engine.run(20).unwrap();

    let result = SimulationResult {
        config,
        snapshots: Vec::new(),
        final_phase: engine.current_phase().clone(),
        total_ticks: engine.tick(),
        collisions: engine.collisions(),
        collisions_obstacle: engine.collisions_obstacle(),
        duration_seconds: 0.0,
    };
    save_result(dir.path(), "scenario", 11, &result).unwrap();
    let loaded = load_result(dir.path(), "scenario", 11).unwrap();
    assert_eq!(loaded.total_ticks, 20);
    assert_eq!(
        loaded.final_phase.coordinates,
        result.final_phase.coordinates
    );
}
