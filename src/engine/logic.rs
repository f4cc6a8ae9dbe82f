//! Per-agent update logic for one simulation tick.
//!
//! Everything here is a pure function of committed state, so the per-agent
//! loop can run in parallel over agents with no locking; each agent draws
//! from its own deterministic RNG stream.

use crate::config::SimConfig;
use crate::phase::{Phase, INNER_NEIGH_RATIO};
use crate::sensing::gps::GpsNoise;
use crate::sensing::{build_ego_view, OracleRows, SensorReadout};
use crate::strategy::{preferred_velocity, StrategyCtx};
use crate::vector::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

/// RNG stream lanes so concurrent consumers never share a sequence.
pub const LANE_GPS: u64 = 0;
pub const LANE_GPS_DELAYED: u64 = 1;
pub const LANE_WIND: u64 = 2;
pub const LANE_RESET: u64 = 3;
pub const LANE_AGENT_BASE: u64 = 16;

/// Derives the deterministic RNG for one (tick, lane) pair from the master
/// seed (splitmix-style finaliser).
pub fn stream_rng(seed: u64, tick: u64, lane: u64) -> StdRng {
    let mut z = seed
        .wrapping_add(tick.wrapping_mul(0x9E37_79B9_7F4A_7C15))
        .wrapping_add(lane.wrapping_mul(0xBF58_476D_1CE4_E5B9));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    StdRng::seed_from_u64(z ^ (z >> 31))
}

/// Everything one agent's update produces; committed serially afterwards.
pub struct AgentStep {
    pub velocity: Vec3,
    pub preferred: Vec3,
    pub inner: Vec<f64>,
    pub power_row: Vec<f64>,
    pub neigh_row: Vec<i64>,
    pub pressure: f64,
    pub near_target: bool,
}

/// Inputs shared by every agent in one tick.
pub struct TickInputs<'a> {
    pub observed: &'a Phase,
    pub delayed: &'a Phase,
    pub gps: &'a GpsNoise,
    pub gps_delayed: &'a GpsNoise,
    pub candidates: &'a [usize],
    pub ctx: StrategyCtx<'a>,
    pub oracle: Option<&'a [OracleRows]>,
    pub gps_tick: bool,
}

/// Runs sensing, the (GPS-gated) strategy and the first-order velocity
/// response for one agent.
pub fn agent_step(
    which: usize,
    inputs: &TickInputs<'_>,
    previous_preferred: Vec3,
    config: &SimConfig,
) -> AgentStep {
    let SensorReadout {
        ego,
        power_row,
        neigh_row,
        pressure,
    } = build_ego_view(
        inputs.observed,
        inputs.delayed,
        inputs.gps,
        inputs.gps_delayed,
        inputs.candidates,
        inputs.ctx.obstacles,
        which,
        config,
        inputs.ctx.r0_effective,
        inputs.oracle.map(|rows| &rows[which]),
    );

    // The observed (noisy) own velocity drives the response filter.
    let noisy_velocity = ego.self_velocity();

    let (preferred, mut inner, near_target) = if inputs.gps_tick {
        let out = preferred_velocity(&ego, config, &inputs.ctx);
        (out.velocity, out.inner, out.near_target)
    } else {
        (
            previous_preferred,
            ego.phase.inner_states[0].clone(),
            false,
        )
    };

    // Adaptive attraction/repulsion neighbourhood ratio (all strategies but
    // the coverage one, which reuses the slot as its near-target flag).
    if config.unit.flocking_type != 3 {
        let n = ego.visible as f64;
        let scaled = n * inner[INNER_NEIGH_RATIO];
        if pressure == 0.0 && scaled < n {
            inner[INNER_NEIGH_RATIO] += 0.05;
        } else if pressure > 0.0 && scaled > 3.0 {
            inner[INNER_NEIGH_RATIO] -= 0.05;
        }
        inner[INNER_NEIGH_RATIO] = inner[INNER_NEIGH_RATIO].clamp(0.0, 1.0);
    }

    // First-order actuator response towards the preferred velocity, with
    // separate horizontal and vertical time constants.
    let real_velocity = inputs.observed.velocities[which];
    let dt = config.sit.delta_t;
    let gain_xy = dt / config.unit.tau_pid_xy;
    let gain_z = dt / config.unit.tau_pid_z;
    let velocity = Vec3::new(
        real_velocity.x + gain_xy * (preferred.x - noisy_velocity.x),
        real_velocity.y + gain_xy * (preferred.y - noisy_velocity.y),
        real_velocity.z + gain_z * (preferred.z - noisy_velocity.z),
    )
    .zeroed_z(config.flocking.dim);

    AgentStep {
        velocity,
        preferred,
        inner,
        power_row,
        neigh_row,
        pressure,
        near_target,
    }
}

/// Clamps the implied acceleration to `a_max`, rescaling the velocity step.
pub fn clamp_acceleration(new_velocity: Vec3, old_velocity: Vec3, config: &SimConfig) -> Vec3 {
    let dt = config.sit.delta_t;
    let delta = new_velocity - old_velocity;
    let acceleration = delta.norm() / dt;
    if acceleration > config.unit.a_max {
        old_velocity + delta.normalize() * (config.unit.a_max * dt)
    } else {
        new_velocity
    }
}

/// Adds the axis-separable diffusive outer noise,
/// `N(0,1)·sqrt(2·sigma_axis·dt)` per component.
pub fn outer_noise(velocity: Vec3, config: &SimConfig, rng: &mut StdRng) -> Vec3 {
    let dt = config.sit.delta_t;
    let sigma_xy = config.unit.sigma_outer_xy;
    let sigma_z = config.unit.sigma_outer_z;
    if sigma_xy <= 0.0 && sigma_z <= 0.0 {
        return velocity;
    }
    let unit_gauss = Normal::new(0.0, 1.0).expect("unit normal is well formed");
    let scale_xy = (2.0 * sigma_xy).sqrt() * dt.sqrt();
    let scale_z = (2.0 * sigma_z).sqrt() * dt.sqrt();
    let noised = Vec3::new(
        velocity.x + unit_gauss.sample(rng) * scale_xy,
        velocity.y + unit_gauss.sample(rng) * scale_xy,
        velocity.z + unit_gauss.sample(rng) * scale_z,
    );
    noised.zeroed_z(config.flocking.dim)
}

/// Stokes-like wind: a Gaussian random walk of the wind velocity vector.
pub fn step_wind(wind: Vec3, config: &SimConfig, rng: &mut StdRng) -> Vec3 {
    if config.unit.wind_std_dev <= 0.0 {
        return wind;
    }
    let unit_gauss = Normal::new(0.0, 1.0).expect("unit normal is well formed");
    let scale = (2.0 * config.unit.wind_std_dev * config.sit.delta_t).sqrt();
    Vec3::new(
        wind.x + unit_gauss.sample(rng) * scale,
        wind.y + unit_gauss.sample(rng) * scale,
        wind.z,
    )
}
