//! Scenarios for the connectivity-preserving strategy and the tracking
//! strategies driving a swarm towards a target.

use swarm_lib::config::SimConfig;
use swarm_lib::engine::Engine;
use swarm_lib::geometry::arena::Arena;
use swarm_lib::phase::Phase;
use swarm_lib::vector::Vec3;

fn huge_arena() -> Arena {
    Arena::Disc {
        center: Vec3::zero(),
        radius: 10_000_000.0,
    }
}

/// Strategy 6 on a sparse line: the connectivity controller tightens the
/// graph, so the algebraic connectivity grows towards its target.
#[test]
fn connectivity_controller_raises_lambda2() {
    let mut config = SimConfig::default();
    config.sit.number_of_agents = 6;
    config.sit.delta_t = 0.01;
    config.sit.radius = 1.0;
    config.unit.flocking_type = 6;
    config.unit.t_gps = 0.01;
    config.unit.t_del = 0.05;
    config.unit.tau_pid_xy = 0.05;
    config.unit.sigma_gps_xy = 0.0;
    config.unit.sigma_gps_z = 0.0;
    config.unit.sigma_outer_xy = 0.0;
    config.unit.sigma_outer_z = 0.0;
    config.flocking.v_flock = 10.0;
    config.flocking.v_max = 20.0;
    config.flocking.lambda_2 = 4.0;
    // Adjacency scale of the type-6 potential (metre-scale experiment).
    config.flocking.r_lambda = 30.0;

    let mut initial = Phase::new(6);
    for i in 0..6 {
        initial.coordinates[i] = Vec3::new(i as f64 * 25.0, 0.0, 0.0);
    }
    let mut engine = Engine::new(config, huge_arena(), Vec::new(), initial, 23).unwrap();

    // Lambda_2 is cached from the first step onwards.
    engine.step().unwrap();
    let lambda_start = engine.lambda2();
    assert!(
        lambda_start < 1.0,
        "sparse line must start weakly connected, got {lambda_start}"
    );

    engine.run(800).unwrap();
    let lambda_end = engine.lambda2();
    assert!(
        lambda_end > lambda_start * 1.5 + 0.01,
        "lambda2 must grow: start {lambda_start}, end {lambda_end}"
    );
}

/// Strategy 2 with a leader chasing a target at the origin: every agent's
/// distance to the target shrinks markedly.
#[test]
fn leader_led_swarm_approaches_the_target() {
    let mut config = SimConfig::default();
    config.sit.number_of_agents = 3;
    config.sit.delta_t = 0.1;
    config.unit.flocking_type = 2;
    config.unit.t_gps = 0.1;
    config.unit.t_del = 0.1;
    config.unit.sigma_gps_xy = 0.0;
    config.unit.sigma_gps_z = 0.0;
    config.unit.sigma_outer_xy = 0.0;
    config.unit.sigma_outer_z = 0.0;

    // Three agents on a 20 km ring around the origin.
    let mut initial = Phase::new(3);
    for i in 0..3 {
        let angle = i as f64 * 2.0 * std::f64::consts::PI / 3.0;
        initial.coordinates[i] = Vec3::new(20_000.0 * angle.cos(), 20_000.0 * angle.sin(), 0.0);
    }
    let start: Vec<f64> = initial.coordinates.iter().map(|c| c.norm()).collect();

    let mut engine = Engine::new(config, huge_arena(), Vec::new(), initial, 23).unwrap();
    engine.set_leader_mode(true);
    engine.set_targets(vec![Vec3::zero()], 1);
    engine.run(200).unwrap();

    let phase = engine.current_phase();
    let mean_before: f64 = start.iter().sum::<f64>() / 3.0;
    let mean_after: f64 =
        phase.coordinates.iter().map(|c| c.norm()).sum::<f64>() / 3.0;
    assert!(
        mean_after < mean_before - 2000.0,
        "swarm must close in on the target: {mean_before} -> {mean_after}"
    );
    // The leader itself has made major progress.
    assert!(
        phase.coordinates[0].norm() < start[0] - 5000.0,
        "leader at {}",
        phase.coordinates[0].norm()
    );
}
