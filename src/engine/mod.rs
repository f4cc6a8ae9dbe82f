//! # Simulation Engine
//!
//! Owns the phase history, the noise states and the per-tick schedule:
//!
//! 1. count pairwise collisions on the committed phase;
//! 2. advance the GPS error filters (on GPS ticks);
//! 3. assign the leader flag;
//! 4. build the Laplacian and Fiedler pair;
//! 5. build each agent's ego view and evaluate its strategy (parallel over
//!    agents; every view only reads committed history);
//! 6. apply the first-order actuator response and integrate positions;
//! 7. clamp accelerations;
//! 8. add diffusive outer noise;
//! 9. handle reset requests;
//! 10. commit the stepped phase to the history ring.
//!
//! The run is deterministic for a fixed seed and parameter block: every
//! randomness consumer draws from its own per-tick stream, so the parallel
//! agent loop cannot perturb reproducibility.

// Collision counters and coverage state machine
pub mod bookkeeping;
// Per-agent update logic
pub mod logic;
// Snapshot/result persistence
pub mod io;

use crate::config::SimConfig;
use crate::connectivity::refresh_spectrum;
use crate::error::SimError;
use crate::geometry::arena::{Arena, Obstacle};
use crate::geometry::{convex_hull, point_in_polygon, polygons_intersect};
use crate::ipc::CosimChannel;
use crate::phase::history::PhaseRing;
use crate::phase::{Phase, INNER_LEADER_RANK};
use crate::sensing::gps::GpsNoise;
use crate::strategy::StrategyCtx;
use crate::vector::Vec3;
use bookkeeping::{CollisionLedger, CoverageState};
use log::{debug, info};
use logic::{
    agent_step, clamp_acceleration, outer_noise, step_wind, stream_rng, AgentStep, TickInputs,
    LANE_AGENT_BASE, LANE_GPS, LANE_GPS_DELAYED, LANE_RESET, LANE_WIND,
};
use rand_distr::{Distribution, Uniform};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;

/// Temporal snapshot streamed to external consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    pub tick: u64,
    pub timestamp: f64,
    pub phase: Phase,
}

/// Complete run output with counters and timing metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub config: SimConfig,
    pub snapshots: Vec<SimulationSnapshot>,
    pub final_phase: Phase,
    pub total_ticks: u64,
    pub collisions: usize,
    pub collisions_obstacle: usize,
    pub duration_seconds: f64,
}

/// Scope of a phase re-randomisation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetScope {
    /// Re-randomise within the configured initial volume.
    Home,
    /// Re-randomise within the current view bounds.
    Viz,
}

/// Placement bounds used by the viz-scoped reset.
#[derive(Debug, Clone, Copy)]
pub struct ResetBounds {
    pub center: Vec3,
    pub half_x: f64,
    pub half_y: f64,
    pub half_z: f64,
}

/// The time-stepped flocking engine.
pub struct Engine {
    config: SimConfig,
    arena: Arena,
    obstacles: Vec<Obstacle>,
    history: PhaseRing,
    gps: GpsNoise,
    gps_delayed: GpsNoise,
    preferred: Vec<Vec3>,
    coverage: CoverageState,
    collisions: CollisionLedger,
    wind: Vec3,
    targets: Vec<Vec3>,
    which_target: usize,
    leader_mode: bool,
    reset_request: Option<ResetScope>,
    viz_bounds: ResetBounds,
    cosim: Option<CosimChannel<UnixStream>>,
    seed: u64,
    tick: u64,
    current_time: f64,
    frame_sender: Option<mpsc::Sender<SimulationSnapshot>>,
    frame_interval: u64,
    should_stop: Arc<AtomicBool>,
}

impl Engine {
    /// Creates an engine over an explicit initial phase.
    pub fn new(
        config: SimConfig,
        arena: Arena,
        obstacles: Vec<Obstacle>,
        mut initial: Phase,
        seed: u64,
    ) -> Result<Self, SimError> {
        config.validate()?;
        let n = config.sit.number_of_agents;
        if initial.len() != n {
            return Err(SimError::Config(format!(
                "initial phase holds {} agents, configuration says {n}",
                initial.len()
            )));
        }
        if config.flocking.dim == 2 {
            initial.pin_planar();
        }

        let viz_bounds = ResetBounds {
            center: Vec3::new(
                config.flocking.arena_center_x,
                config.flocking.arena_center_y,
                0.0,
            ),
            half_x: config.sit.initial_x,
            half_y: config.sit.initial_y,
            half_z: config.sit.initial_z,
        };

        info!(
            "engine: {n} agents, strategy {}, dim {}, dt {}s, delay {} ticks",
            config.unit.flocking_type,
            config.flocking.dim,
            config.sit.delta_t,
            config.delay_steps()
        );

        Ok(Engine {
            history: PhaseRing::new(initial, config.delay_steps()),
            gps: GpsNoise::new(n),
            gps_delayed: GpsNoise::new(n),
            preferred: vec![Vec3::zero(); n],
            coverage: CoverageState::default(),
            collisions: CollisionLedger::new(n),
            wind: Vec3::new(
                config.unit.wind_angle.cos(),
                config.unit.wind_angle.sin(),
                0.0,
            ) * if config.unit.wind_std_dev > 0.0 { 1.0 } else { 0.0 },
            targets: Vec::new(),
            which_target: 0,
            leader_mode: false,
            reset_request: None,
            viz_bounds,
            cosim: None,
            seed,
            tick: 0,
            current_time: 0.0,
            frame_sender: None,
            frame_interval: 1,
            should_stop: Arc::new(AtomicBool::new(false)),
            config,
            arena,
            obstacles,
        })
    }

    /// Creates an engine with agents placed uniformly at random inside the
    /// configured initial volume, respecting the collision radius.
    pub fn with_random_placement(
        config: SimConfig,
        arena: Arena,
        obstacles: Vec<Obstacle>,
        seed: u64,
    ) -> Result<Self, SimError> {
        config.validate()?;
        let center = Vec3::new(
            config.flocking.arena_center_x,
            config.flocking.arena_center_y,
            0.0,
        );
        let bounds = ResetBounds {
            center,
            half_x: config.sit.initial_x,
            half_y: config.sit.initial_y,
            half_z: config.sit.initial_z,
        };
        let mut rng = stream_rng(seed, 0, LANE_RESET);
        let mut initial = Phase::new(config.sit.number_of_agents);
        randomize_positions(&mut initial, &bounds, config.sit.radius, config.flocking.dim, &mut rng);
        Self::new(config, arena, obstacles, initial, seed)
    }

    /// Attaches the snapshot channel; a frame is emitted every
    /// `frame_interval` ticks during [`Engine::run`].
    pub fn with_frame_sender(
        mut self,
        sender: mpsc::Sender<SimulationSnapshot>,
        frame_interval: u64,
    ) -> Self {
        self.frame_sender = Some(sender);
        self.frame_interval = frame_interval.max(1);
        self
    }

    /// Switches sensing to co-simulation mode: the oracle on this channel
    /// supplies neighbour and link-power matrices every tick.
    pub fn attach_cosim(&mut self, channel: CosimChannel<UnixStream>) {
        self.cosim = Some(channel);
    }

    pub fn parameters(&self) -> &SimConfig {
        &self.config
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// The committed phase of the current tick.
    pub fn current_phase(&self) -> &Phase {
        self.history.read(self.tick)
    }

    /// The committed phase `ceil(t_del/dt)` ticks in the past, as the
    /// sensing pipeline observes neighbours.
    pub fn phase_at_delay(&self) -> &Phase {
        self.history
            .read_delayed(self.tick, self.config.delay_steps() as u64)
    }

    pub fn collisions(&self) -> usize {
        self.collisions.pairwise
    }

    pub fn collisions_obstacle(&self) -> usize {
        self.collisions.obstacle
    }

    /// Algebraic connectivity cached on the current phase.
    pub fn lambda2(&self) -> f64 {
        self.current_phase().second_eigenvalue
    }

    /// Waypoint list consumed by the tracking strategies.
    pub fn set_targets(&mut self, targets: Vec<Vec3>, which_target: usize) {
        self.which_target = which_target.min(targets.len());
        self.targets = targets;
    }

    /// Leader display mode: agent 0 carries rank 1 while active.
    pub fn set_leader_mode(&mut self, enabled: bool) {
        self.leader_mode = enabled;
    }

    pub fn set_viz_bounds(&mut self, bounds: ResetBounds) {
        self.viz_bounds = bounds;
    }

    /// Requests a phase re-randomisation applied at the next tick boundary.
    pub fn request_reset(&mut self, scope: ResetScope) {
        self.reset_request = Some(scope);
    }

    /// Cloneable flag for external graceful termination.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.should_stop)
    }

    pub fn stop(&self) {
        self.should_stop.store(true, Ordering::Relaxed);
    }

    /// Runs up to `ticks` steps, honouring the stop flag, streaming frames
    /// at the configured interval.
    pub fn run(&mut self, ticks: u64) -> Result<(), SimError> {
        for _ in 0..ticks {
            if self.should_stop.load(Ordering::Relaxed) {
                debug!("stop flag observed at tick {}", self.tick);
                break;
            }
            self.step()?;
            if self.tick % self.frame_interval == 0 {
                self.send_frame_data();
            }
        }
        Ok(())
    }

    /// Advances the simulation by one tick.
    pub fn step(&mut self) -> Result<(), SimError> {
        let config = self.config;
        let n = config.sit.number_of_agents;
        let dt = config.sit.delta_t;
        let dim = config.flocking.dim;

        // Oracle rows arrive first so a broken channel kills the tick loop
        // before any state mutates.
        let oracle_rows = match &mut self.cosim {
            Some(channel) => Some(channel.recv_tick()?),
            None => None,
        };

        let mut observed = self.history.read(self.tick).clone();
        observed.inner_states[0][INNER_LEADER_RANK] =
            if self.leader_mode { 1.0 } else { 0.0 };

        self.collisions.count_pairwise(&observed, config.sit.radius);

        let gps_tick = self.tick % config.gps_tick_steps() == 0;
        if gps_tick && oracle_rows.is_none() {
            let mut rng = stream_rng(self.seed, self.tick, LANE_GPS);
            self.gps.step(
                config.unit.sigma_gps_xy,
                config.unit.sigma_gps_z,
                dim,
                &mut rng,
            );
            let mut rng = stream_rng(self.seed, self.tick, LANE_GPS_DELAYED);
            self.gps_delayed.step(
                config.unit.sigma_gps_xy,
                config.unit.sigma_gps_z,
                dim,
                &mut rng,
            );
        }

        // Spectral step: the join barrier before the per-agent loop.
        refresh_spectrum(&mut observed, config.flocking.r_lambda, self.tick)?;

        // Obstacles that can obstruct a link this tick: those meeting the
        // swarm's convex hull.
        let hull = convex_hull(&observed.coordinates);
        let candidates: Vec<usize> = self
            .obstacles
            .iter()
            .enumerate()
            .filter(|(_, obstacle)| {
                polygons_intersect(&hull, &obstacle.vertices)
                    || point_in_polygon(&obstacle.center, &hull)
            })
            .map(|(index, _)| index)
            .collect();

        let delayed = self
            .history
            .read_delayed(self.tick, config.delay_steps() as u64);

        let r0_effective = self.coverage.r0_effective(config.flocking.r_0);
        let inputs = TickInputs {
            observed: &observed,
            delayed,
            gps: &self.gps,
            gps_delayed: &self.gps_delayed,
            candidates: &candidates,
            ctx: StrategyCtx {
                arena: &self.arena,
                obstacles: &self.obstacles,
                targets: &self.targets,
                which_target: self.which_target,
                active_target: self.coverage.active_target,
                leader_mode: self.leader_mode,
                r0_effective,
            },
            oracle: oracle_rows.as_deref(),
            gps_tick,
        };

        // Per-agent loop: reads committed state only, writes its own slot.
        let preferred = self.preferred.clone();
        let steps: Vec<AgentStep> = (0..n)
            .into_par_iter()
            .map(|agent| agent_step(agent, &inputs, preferred[agent], &config))
            .collect();

        // Integrate and commit.
        let mut stepped = Phase::new(n);
        stepped.real_ids = observed.real_ids.clone();
        stepped.laplacian = observed.laplacian.clone();
        stepped.second_eigenvalue = observed.second_eigenvalue;
        stepped.second_eigenvector = observed.second_eigenvector.clone();

        for (agent, step) in steps.iter().enumerate() {
            // Positions advance with the committed velocity (plus wind).
            stepped.coordinates[agent] = (observed.coordinates[agent]
                + (observed.velocities[agent] + self.wind) * dt)
                .zeroed_z(dim);

            let clamped = clamp_acceleration(step.velocity, observed.velocities[agent], &config);
            let mut rng = stream_rng(self.seed, self.tick, LANE_AGENT_BASE + agent as u64);
            let noised = outer_noise(clamped, &config, &mut rng);
            let velocity = noised.clamp_norm(config.flocking.v_max).zeroed_z(dim);

            if velocity.has_nan() || stepped.coordinates[agent].has_nan() {
                return Err(SimError::Numerical {
                    tick: self.tick,
                    reason: format!("NaN in agent {agent} state"),
                });
            }

            stepped.velocities[agent] = velocity;
            stepped.inner_states[agent] = step.inner.clone();
            stepped.neigh_set[agent] = step.neigh_row.clone();
            stepped.received_power[agent] = step.power_row.clone();
            stepped.pressure[agent] = step.pressure;
            self.preferred[agent] = step.preferred;
        }

        self.collisions
            .count_obstacle_crossings(&stepped, &self.obstacles);

        if config.unit.flocking_type == 3 && self.which_target != 0 {
            let near = steps.iter().filter(|s| s.near_target).count();
            self.coverage.update(near, self.targets.len());
        }

        let mut wind_rng = stream_rng(self.seed, self.tick, LANE_WIND);
        self.wind = step_wind(self.wind, &config, &mut wind_rng);

        if let Some(scope) = self.reset_request.take() {
            self.apply_reset(&mut stepped, scope);
        }

        self.tick += 1;
        self.current_time += dt;
        self.history.write(self.tick, stepped);
        Ok(())
    }

    fn apply_reset(&mut self, stepped: &mut Phase, scope: ResetScope) {
        let bounds = match scope {
            ResetScope::Home => ResetBounds {
                center: Vec3::new(
                    self.config.flocking.arena_center_x,
                    self.config.flocking.arena_center_y,
                    0.0,
                ),
                half_x: self.config.sit.initial_x,
                half_y: self.config.sit.initial_y,
                half_z: self.config.sit.initial_z,
            },
            ResetScope::Viz => self.viz_bounds,
        };
        info!("phase reset ({scope:?}) at tick {}", self.tick);
        let mut rng = stream_rng(self.seed, self.tick, LANE_RESET);
        randomize_positions(
            stepped,
            &bounds,
            self.config.sit.radius,
            self.config.flocking.dim,
            &mut rng,
        );
        self.collisions.reset();
    }

    fn send_frame_data(&self) {
        if let Some(sender) = &self.frame_sender {
            let frame = SimulationSnapshot {
                tick: self.tick,
                timestamp: self.current_time,
                phase: self.current_phase().clone(),
            };
            // Non-blocking: a departed receiver must not stall the run.
            if let Err(err) = sender.send(frame) {
                debug!("frame receiver gone: {err}");
            }
        }
    }
}

/// Uniform placement inside a box, rejection-sampled against the minimum
/// separation; velocities are zeroed.
fn randomize_positions(
    phase: &mut Phase,
    bounds: &ResetBounds,
    min_distance: f64,
    dim: u32,
    rng: &mut rand::rngs::StdRng,
) {
    let n = phase.len();
    let x = Uniform::new_inclusive(-bounds.half_x, bounds.half_x)
        .unwrap_or_else(|_| Uniform::new_inclusive(0.0, 0.0).expect("degenerate bound"));
    let y = Uniform::new_inclusive(-bounds.half_y, bounds.half_y)
        .unwrap_or_else(|_| Uniform::new_inclusive(0.0, 0.0).expect("degenerate bound"));
    let z = Uniform::new_inclusive(-bounds.half_z, bounds.half_z)
        .unwrap_or_else(|_| Uniform::new_inclusive(0.0, 0.0).expect("degenerate bound"));

    for agent in 0..n {
        let mut attempts = 0;
        loop {
            let candidate = Vec3::new(
                bounds.center.x + x.sample(rng),
                bounds.center.y + y.sample(rng),
                if dim == 2 {
                    0.0
                } else {
                    bounds.center.z + z.sample(rng)
                },
            );
            let clear = phase.coordinates[..agent]
                .iter()
                .all(|p| (p - &candidate).norm() >= min_distance);
            attempts += 1;
            if clear || attempts > 1000 {
                phase.coordinates[agent] = candidate;
                break;
            }
        }
        phase.velocities[agent] = Vec3::zero();
    }
    if dim == 2 {
        phase.pin_planar();
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.stop();
    }
}
