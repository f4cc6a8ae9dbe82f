use clap::Parser;
use log::{error, info};
use std::process::ExitCode;
use std::sync::mpsc;
use std::time::Instant;
use swarm_lib::cli::{Cli, Commands};
use swarm_lib::config::SimConfig;
use swarm_lib::engine::io::{export_json, save_result};
use swarm_lib::engine::{Engine, SimulationResult};
use swarm_lib::geometry::arena::{load_arenas, load_obstacles, select_arena, Arena};
use swarm_lib::vector::Vec3;
use swarm_lib::SimError;

fn main() -> ExitCode {
    env_logger::init();
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), SimError> {
    let Commands::Run {
        config,
        arena,
        obst,
        steps,
        seed,
        leader,
        target,
        output_dir,
        tag,
        frame_interval,
    } = cli.command;

    let config = match config {
        Some(path) => SimConfig::load(&path)?,
        None => {
            let defaults = SimConfig::default();
            defaults.validate()?;
            defaults
        }
    };

    let arena = match arena {
        Some(path) => select_arena(&load_arenas(&path)?, config.flocking.arena_shape),
        None => Arena::Disc {
            center: Vec3::new(
                config.flocking.arena_center_x,
                config.flocking.arena_center_y,
                0.0,
            ),
            radius: config.flocking.arena_radius,
        },
    };
    let obstacles = match obst {
        Some(path) => load_obstacles(&path)?,
        None => Vec::new(),
    };

    let (frame_tx, frame_rx) = mpsc::channel();
    let mut engine = Engine::with_random_placement(config, arena, obstacles, seed)?
        .with_frame_sender(frame_tx, frame_interval);
    engine.set_leader_mode(leader);

    if let Some(raw) = target {
        let point = parse_target(&raw)?;
        engine.set_targets(vec![point], 1);
    }

    let started = Instant::now();
    engine.run(steps)?;
    let duration = started.elapsed().as_secs_f64();

    info!(
        "finished {} ticks in {duration:.2}s: {} pairwise / {} obstacle collisions, lambda2 = {:.3}",
        engine.tick(),
        engine.collisions(),
        engine.collisions_obstacle(),
        engine.lambda2()
    );

    if let Some(dir) = output_dir {
        let result = SimulationResult {
            config,
            snapshots: frame_rx.try_iter().collect(),
            final_phase: engine.current_phase().clone(),
            total_ticks: engine.tick(),
            collisions: engine.collisions(),
            collisions_obstacle: engine.collisions_obstacle(),
            duration_seconds: duration,
        };
        let path = save_result(&dir, &tag, seed, &result)?;
        export_json(&dir, &tag, seed, &result)?;
        info!("result written to {}", path.display());
    }
    Ok(())
}

fn parse_target(raw: &str) -> Result<Vec3, SimError> {
    let mut it = raw.split(',').map(str::trim);
    let x: f64 = it
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| SimError::Config(format!("bad target `{raw}`, expected \"x,y\"")))?;
    let y: f64 = it
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| SimError::Config(format!("bad target `{raw}`, expected \"x,y\"")))?;
    Ok(Vec3::new(x, y, 0.0))
}
