//! # Strategy Dispatcher
//!
//! Selects and sums the interaction terms for the configured
//! `flocking_type` (0..=6), applies the arena and obstacle shill terms that
//! every strategy shares, and saturates the result to the preferred-velocity
//! magnitude. The component vectors are exported into the diagnostic inner
//! states so external tooling can plot the decomposition.
//!
//! Leaders are agents whose canonical ID is 0; followers discover a leader
//! chain through the inner-state rank (implicit leader following).


use crate::config::SimConfig;
use crate::geometry::arena::{Arena, Obstacle};
use crate::interactions::*;
use crate::phase::{
    INNER_DIAG_ADJ_X, INNER_DIAG_ADJ_Y, INNER_DIAG_ATT_X, INNER_DIAG_ATT_Y, INNER_DIAG_CONN_X,
    INNER_DIAG_CONN_Y, INNER_DIAG_FRICT_X, INNER_DIAG_FRICT_Y, INNER_DIAG_OBST_X,
    INNER_DIAG_OBST_Y, INNER_DIAG_REP_X, INNER_DIAG_REP_Y, INNER_DIAG_SPP_X, INNER_DIAG_SPP_Y,
    INNER_LEADER_RANK, INNER_NEIGH_RATIO,
};
use crate::sensing::EgoView;
use crate::vector::Vec3;

/// Adjacency-potential constants of the connectivity strategy.
const ADJ_RANGE: f64 = 30.0;
const ADJ_MU1: f64 = 10.0;
const ADJ_MU2: f64 = 200.0;
const ADJ_GAIN: f64 = 0.05;
const CONN_KC0: f64 = 1000.0;
const CONN_SIGMA0: f64 = 1.0;

/// Distance below which a strategy-3 agent counts as "near target".
pub const COVERAGE_NEAR_TARGET: f64 = 10_000.0;

/// Immutable per-tick context the dispatcher needs beyond the ego view.
pub struct StrategyCtx<'a> {
    pub arena: &'a Arena,
    pub obstacles: &'a [Obstacle],
    /// Waypoint list; `which_target == 0` means no target is active,
    /// otherwise `targets[which_target - 1]` is the current one.
    pub targets: &'a [Vec3],
    pub which_target: usize,
    /// Index of the coverage state machine's active target (strategy 3).
    pub active_target: usize,
    /// Leader display mode: agent 0 is flagged as leader each tick.
    pub leader_mode: bool,
    /// Equilibrium distance after any coverage inflation.
    pub r0_effective: f64,
}

/// Result of one strategy evaluation.
pub struct StrategyOutput {
    /// Saturated preferred velocity.
    pub velocity: Vec3,
    /// Updated inner-state vector for the agent (rank + diagnostics).
    pub inner: Vec<f64>,
    /// Strategy-3 near-target flag for the coverage state machine.
    pub near_target: bool,
}

/// Follower-side implicit leader following: picks the visible agent with the
/// highest non-zero leader rank (first in ID order on ties) and adopts
/// rank + 1. Returns the chosen slot.
fn assign_leader(ego: &EgoView, inner: &mut [f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for slot in ego.neighbour_slots() {
        let rank = ego.phase.inner_states[slot][INNER_LEADER_RANK];
        if rank <= 0.0 {
            continue;
        }
        let better = match best {
            None => true,
            Some((best_slot, best_rank)) => {
                rank > best_rank
                    || (rank == best_rank
                        && ego.phase.real_ids[slot] < ego.phase.real_ids[best_slot])
            }
        };
        if better {
            best = Some((slot, rank));
        }
    }
    match best {
        Some((slot, rank)) => {
            inner[INNER_LEADER_RANK] = rank + 1.0;
            Some(slot)
        }
        None => {
            inner[INNER_LEADER_RANK] = 0.0;
            None
        }
    }
}

/// Saturates the summed interaction velocity: normalised to `v_flock`, or
/// clamped to `v_max` in cut-off mode. A numerically zero sum falls back to
/// the agent's current heading (self-propelled-particle behaviour).
fn saturate(sum: Vec3, ego: &EgoView, config: &SimConfig) -> Vec3 {
    let f = &config.flocking;
    let out = if f.cut_off_mode {
        sum.clamp_norm(f.v_max)
    } else if sum.norm() > 1e-9 {
        sum.with_norm(f.v_flock)
    } else {
        ego.self_velocity().zeroed_z(f.dim).normalize() * f.v_flock
    };
    out.zeroed_z(f.dim)
}

/// Leader-bound pursuit used by the follower branches: full-speed simple
/// tracking of the leader's position with a 4000/6000 engagement ramp.
fn leader_follower_term(ego: &EgoView, leader_slot: usize, v_flock: f64, dim: u32) -> Vec3 {
    let leader_position = ego.phase.coordinates[leader_slot];
    target_tracking_simple(ego, &leader_position, 4000.0, 6000.0, dim) * v_flock
}

/// Leader-side target pursuit: simple tracking scaled to cruise speed and
/// capped at `cap`.
fn leader_target_term(
    ego: &EgoView,
    target: &Vec3,
    r_inner: f64,
    r_outer: f64,
    v_flock: f64,
    cap: f64,
    dim: u32,
) -> Vec3 {
    (target_tracking_simple(ego, target, r_inner, r_outer, dim) * v_flock).clamp_norm(cap)
}

/// Evaluates the configured strategy for one agent and returns its
/// saturated preferred velocity plus the updated inner states.
pub fn preferred_velocity(ego: &EgoView, config: &SimConfig, ctx: &StrategyCtx) -> StrategyOutput {
    let f = &config.flocking;
    let dim = f.dim;
    let r_0 = ctx.r0_effective;
    let flocking_type = config.unit.flocking_type;

    let mut inner = ego.phase.inner_states[0].clone();
    let is_leader = ego.self_id() == 0;
    let has_target = ctx.which_target != 0;
    let target = if has_target {
        Some(ctx.targets[ctx.which_target - 1])
    } else {
        None
    };

    // Component vectors; unused ones stay zero and are exported as such.
    let mut repulsion = Vec3::zero();
    let mut attraction = Vec3::zero();
    let mut pressure = Vec3::zero();
    let mut friction = Vec3::zero();
    let mut tracking = Vec3::zero();
    let mut leader_follow = Vec3::zero();
    let mut adjacency = Vec3::zero();
    let mut connectivity = Vec3::zero();
    let spp = spp_term(ego, f.v_flock, dim);
    let mut near_target = false;

    // Friction engages in the strategies that sum it (0, 1, 3, 4, 5).
    if matches!(flocking_type, 0 | 1 | 3 | 4 | 5) {
        friction = friction_lin_sqrt(
            ego,
            f.c_frict,
            f.v_frict,
            f.acc_frict,
            f.slope_frict,
            r_0 + f.r_0_offset_frict,
            dim,
        );
    }

    let mut sum = match flocking_type {
        0 => {
            attraction = attraction_lin(ego, 2.0 * f.v_rep, f.slope_att, r_0 + 100.0, dim, false);
            pressure = pressure_repulsion(ego, f.k_press, r_0, f.v_rep, dim);
            if let (Some(t), true) = (target.as_ref(), is_leader) {
                tracking =
                    leader_target_term(ego, t, 5000.0, 10_000.0, f.v_flock, 0.5 * f.v_flock, dim);
            }
            if !is_leader && ctx.leader_mode {
                if let Some(slot) = assign_leader(ego, &mut inner) {
                    leader_follow = leader_follower_term(ego, slot, f.v_flock, dim);
                }
            }
            if has_target && is_leader {
                spp + pressure + tracking
            } else {
                pressure + attraction + friction + leader_follow
            }
        }
        1 => {
            attraction = attraction_vat(ego, 1.6 * f.v_rep, f.slope_att, r_0 + 100.0, dim, false);
            repulsion = repulsion_lin(ego, f.v_rep, f.slope_rep, r_0, dim, false);
            if let (Some(t), true) = (target.as_ref(), is_leader) {
                tracking =
                    leader_target_term(ego, t, 5000.0, 10_000.0, f.v_flock, 0.5 * f.v_flock, dim);
            }
            if !is_leader && ctx.leader_mode {
                if let Some(slot) = assign_leader(ego, &mut inner) {
                    leader_follow = leader_follower_term(ego, slot, f.v_flock, dim);
                }
            }
            if has_target && is_leader {
                spp + repulsion + tracking
            } else {
                repulsion + attraction + friction + leader_follow
            }
        }
        2 => {
            let gradient = gradient_based(
                ego,
                f.epsilon,
                f.a_action_function,
                f.b_action_function,
                f.h_bump,
                r_0,
                (2.0f64.sqrt() + 1.0) * r_0,
                dim,
            ) * 3.0;
            let align = alignment_olfati(ego, f.h_bump, 2.0 * r_0, f.epsilon, dim);
            if let (Some(t), true) = (target.as_ref(), is_leader) {
                tracking = leader_target_term(ego, t, 5000.0, 10_000.0, f.v_flock, f.v_flock, dim);
            }
            if !is_leader && ctx.leader_mode {
                if let Some(slot) = assign_leader(ego, &mut inner) {
                    leader_follow = tracking_olfati(
                        ego,
                        &ego.phase.coordinates[slot],
                        &ego.phase.velocities[slot],
                        f.v_flock,
                        dim,
                    );
                }
            }
            if has_target && is_leader {
                spp + gradient * 0.01 + tracking
            } else {
                (gradient + align) * 0.01 + leader_follow
            }
        }
        3 => {
            repulsion = repulsion_lin(ego, f.v_rep, f.slope_rep, r_0, dim, false);
            if has_target {
                let active = ctx.targets[ctx.active_target.min(ctx.targets.len() - 1)];
                tracking = (target_tracking(
                    ego,
                    &active,
                    r_0 + 300.0,
                    r_0 + 4000.0,
                    5000.0,
                    10_000.0,
                    dim,
                ) * f.v_flock)
                    .clamp_norm(f.v_flock);
                let from_target = (&ego.self_position() - &active).zeroed_z(dim).norm();
                near_target = from_target < COVERAGE_NEAR_TARGET;
                inner[INNER_NEIGH_RATIO] = if near_target { 1.0 } else { 0.0 };
            }
            repulsion + tracking + friction
        }
        4 => {
            attraction = attraction_lin(ego, 1.6 * f.v_rep, f.slope_att, r_0 + 100.0, dim, false);
            pressure = pressure_repulsion(ego, f.k_press, r_0, f.v_rep, dim);
            if !is_leader && ctx.leader_mode {
                if let Some(slot) = assign_leader(ego, &mut inner) {
                    leader_follow = leader_follower_term(ego, slot, f.v_flock, dim);
                }
            }
            pressure + attraction + friction + leader_follow
        }
        5 => {
            attraction = attraction_lin(ego, 1.6 * f.v_rep, f.slope_att, r_0 + 100.0, dim, false);
            repulsion = repulsion_lin(ego, f.v_rep, f.slope_rep, r_0, dim, false);
            if let (Some(t), true) = (target.as_ref(), is_leader) {
                tracking =
                    leader_target_term(ego, t, 5000.0, 10_000.0, f.v_flock, 0.5 * f.v_flock, dim);
            }
            if !is_leader && has_target {
                if let Some(slot) = assign_leader(ego, &mut inner) {
                    leader_follow = leader_follower_term(ego, slot, f.v_flock, dim);
                }
            }
            if has_target && is_leader {
                spp + repulsion + tracking
            } else {
                repulsion + attraction + friction + leader_follow
            }
        }
        _ => {
            // Type 6: adjacency potential + global connectivity control.
            let r1 = 0.45 * ADJ_RANGE;
            let r2 = 0.55 * ADJ_RANGE;
            adjacency = potential_based(ego, ADJ_GAIN, ADJ_RANGE, r1, r2, ADJ_MU1, ADJ_MU2, dim);
            connectivity = global_connectivity_controller(
                ego,
                CONN_KC0,
                CONN_SIGMA0,
                f.lambda_2,
                ADJ_RANGE,
                dim,
            );
            if let (Some(t), true) = (target.as_ref(), is_leader) {
                tracking =
                    leader_target_term(ego, t, 2000.0, 2000.0, f.v_flock, 0.5 * f.v_flock, dim);
            }
            adjacency + connectivity + tracking
        }
    };

    // Arena and obstacle shill agents act in every strategy.
    let arena_shill = shill_wall_lin_sqrt(
        ego,
        ctx.arena,
        f.v_shill,
        f.r_0_shill,
        f.acc_shill,
        f.slope_shill,
        dim,
    );
    let mut obstacle_shill = Vec3::zero();
    for obstacle in ctx.obstacles {
        obstacle_shill += shill_obstacle_lin_sqrt(
            ego,
            obstacle,
            f.v_shill,
            f.r_0_shill,
            f.acc_shill,
            f.slope_shill,
            dim,
        );
    }
    sum += arena_shill;
    sum += obstacle_shill;

    // Export the decomposition for external plotting. The first diagnostic
    // pair carries pressure under type 0 and repulsion otherwise.
    let first_pair = if flocking_type == 0 { pressure } else { repulsion };
    inner[INNER_DIAG_REP_X] = first_pair.x;
    inner[INNER_DIAG_REP_Y] = first_pair.y;
    inner[INNER_DIAG_ATT_X] = attraction.x;
    inner[INNER_DIAG_ATT_Y] = attraction.y;
    inner[INNER_DIAG_FRICT_X] = friction.x;
    inner[INNER_DIAG_FRICT_Y] = friction.y;
    inner[INNER_DIAG_OBST_X] = obstacle_shill.x;
    inner[INNER_DIAG_OBST_Y] = obstacle_shill.y;
    inner[INNER_DIAG_SPP_X] = spp.x;
    inner[INNER_DIAG_SPP_Y] = spp.y;
    inner[INNER_DIAG_ADJ_X] = adjacency.x;
    inner[INNER_DIAG_ADJ_Y] = adjacency.y;
    inner[INNER_DIAG_CONN_X] = connectivity.x;
    inner[INNER_DIAG_CONN_Y] = connectivity.y;

    StrategyOutput {
        velocity: saturate(sum, ego, config),
        inner,
        near_target,
    }
}
