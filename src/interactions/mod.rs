//! # Interaction Library
//!
//! The composable force-term catalogue of the flocking model. Every term is
//! a pure function of an [`EgoView`] and named parameters, returning a
//! velocity-space contribution that the strategy dispatcher sums. In 2D mode
//! the z-component is zeroed at every step, not just at the end.
//!
//! Distances are measured between the (delayed, noisy) positions the
//! observing agent actually has, never the true global state.


use crate::geometry::arena::{Arena, Obstacle};
use crate::geometry::nearest_point_of_polygon;
use crate::sensing::EgoView;
use crate::vector::kernels::{
    action_function, bump_function, sat, sigma_grad, sigma_norm, sigma_norm_scalar, sigmoid_lin,
    sigmoid_lin_att, vel_decay_lin_sqrt,
};
use crate::vector::Vec3;

/// Scales the accumulated term down by the number of contributing
/// neighbours (the optional 1/n normalisation of the linear terms).
fn normalise_by_count(sum: Vec3, n: usize, enabled: bool) -> Vec3 {
    if enabled && n > 1 {
        sum / n as f64
    } else {
        sum
    }
}

/// Linear pairwise repulsion.
///
/// Each neighbour closer than `r_0` contributes `sigmoid_lin(d)` away from
/// itself.
pub fn repulsion_lin(
    view: &EgoView,
    v_rep: f64,
    slope: f64,
    r_0: f64,
    dim: u32,
    normalize: bool,
) -> Vec3 {
    let own = view.self_position();
    let mut out = Vec3::zero();
    let mut n = 0usize;

    for slot in view.neighbour_slots() {
        let away = (&own - &view.phase.coordinates[slot]).zeroed_z(dim);
        let distance = away.norm();
        if distance >= r_0 {
            continue;
        }
        n += 1;
        out += away.normalize() * sigmoid_lin(distance, slope, v_rep, r_0);
    }
    normalise_by_count(out, n, normalize).zeroed_z(dim)
}

/// Jaccard-gated linear attraction.
///
/// Only neighbours beyond `r_0` whose signed Jaccard similarity is
/// non-positive attract; the pull is damped by `(1 + J)` so contacts that
/// are already symmetrically linked contribute nothing. The gain argument is
/// `d·ln d`, which steepens the pull on far stragglers.
pub fn attraction_lin(
    view: &EgoView,
    v_att: f64,
    slope: f64,
    r_0: f64,
    dim: u32,
    normalize: bool,
) -> Vec3 {
    let own = view.self_position();
    let mut out = Vec3::zero();
    let mut n = 0usize;

    for slot in view.neighbour_slots() {
        let toward = (&view.phase.coordinates[slot] - &own).zeroed_z(dim);
        let distance = toward.norm();
        if distance <= r_0 {
            continue;
        }
        let jaccard = view.jaccard[slot];
        if jaccard > 0.0 {
            continue;
        }
        n += 1;
        let gain = sigmoid_lin_att(distance * distance.ln(), slope, v_att, r_0);
        out += toward.normalize() * (gain * (1.0 + jaccard));
    }
    normalise_by_count(out, n, normalize).zeroed_z(dim)
}

/// Linear attraction without the Jaccard gate (VAT variant).
pub fn attraction_vat(
    view: &EgoView,
    v_att: f64,
    slope: f64,
    r_0: f64,
    dim: u32,
    normalize: bool,
) -> Vec3 {
    let own = view.self_position();
    let mut out = Vec3::zero();
    let mut n = 0usize;

    for slot in view.neighbour_slots() {
        let toward = (&view.phase.coordinates[slot] - &own).zeroed_z(dim);
        let distance = toward.norm();
        if distance <= r_0 {
            continue;
        }
        n += 1;
        out += toward.normalize() * sigmoid_lin_att(distance, slope, v_att, r_0);
    }
    normalise_by_count(out, n, normalize).zeroed_z(dim)
}

/// Friction-like velocity alignment on the linsqrt braking curve.
///
/// When the velocity difference towards a neighbour exceeds the maximum the
/// braking curve allows at the current distance (with `v_frict` slack), the
/// excess is compensated along the difference direction.
#[allow(clippy::too_many_arguments)]
pub fn friction_lin_sqrt(
    view: &EgoView,
    c_frict: f64,
    v_frict: f64,
    acc: f64,
    slope: f64,
    r_0: f64,
    dim: u32,
) -> Vec3 {
    let own_position = view.self_position();
    let own_velocity = view.self_velocity();
    let mut out = Vec3::zero();

    for slot in view.neighbour_slots() {
        let distance = (&view.phase.coordinates[slot] - &own_position).norm();
        let vel_diff = (&view.phase.velocities[slot] - &own_velocity).zeroed_z(dim);
        let magnitude = vel_diff.norm();
        let max_allowed = v_frict.max(vel_decay_lin_sqrt(distance, slope, acc, r_0));
        if magnitude > max_allowed {
            out += vel_diff.normalize() * (c_frict * (magnitude - max_allowed));
        }
    }
    out.zeroed_z(dim)
}

/// Pressure-mediated repulsion.
///
/// Neighbours within `2·r_0` push the agent away proportionally to their own
/// crowding pressure and the agent's speed, clipped at `v_rep`.
pub fn pressure_repulsion(view: &EgoView, k_press: f64, r_0: f64, v_rep: f64, dim: u32) -> Vec3 {
    let own_position = view.self_position();
    let own_speed = view.self_velocity().zeroed_z(dim).norm();
    let mut out = Vec3::zero();

    for slot in view.neighbour_slots() {
        let away = (&own_position - &view.phase.coordinates[slot]).zeroed_z(dim);
        let distance = away.norm();
        if distance > 2.0 * r_0 {
            continue;
        }
        let gain = (k_press * view.phase.pressure[slot] * own_speed).clamp(0.0, v_rep);
        out += away.normalize() * gain;
    }
    out.zeroed_z(dim)
}

/// Olfati-Saber gradient-based pair potential.
///
/// Smooth attraction/repulsion through the sigma-norm, a bump window at the
/// sensing radius `r_sense` and the uneven action function centred on the
/// equilibrium distance `d_eq`.
#[allow(clippy::too_many_arguments)]
pub fn gradient_based(
    view: &EgoView,
    epsilon: f64,
    a: f64,
    b: f64,
    h: f64,
    d_eq: f64,
    r_sense: f64,
    dim: u32,
) -> Vec3 {
    let own = view.self_position();
    let sigma_r = sigma_norm_scalar(r_sense, epsilon);
    let sigma_d = sigma_norm_scalar(d_eq, epsilon);
    let mut out = Vec3::zero();

    for slot in view.neighbour_slots() {
        let toward = (&view.phase.coordinates[slot] - &own).zeroed_z(dim);
        let sigma_distance = sigma_norm(&toward, epsilon);
        let phi_alpha = bump_function(sigma_distance / sigma_r, h)
            * action_function(sigma_distance - sigma_d, a, b);
        out += sigma_grad(&toward, epsilon) * phi_alpha;
    }
    out.zeroed_z(dim)
}

/// Olfati-Saber velocity consensus.
///
/// Neighbour velocity differences weighted by the bump of the
/// sigma-normalised distance.
pub fn alignment_olfati(view: &EgoView, h: f64, r_sense: f64, epsilon: f64, dim: u32) -> Vec3 {
    let own_position = view.self_position();
    let own_velocity = view.self_velocity();
    let sigma_r = sigma_norm_scalar(r_sense, epsilon);
    let mut out = Vec3::zero();

    for slot in view.neighbour_slots() {
        let toward = (&view.phase.coordinates[slot] - &own_position).zeroed_z(dim);
        let weight = bump_function(sigma_norm(&toward, epsilon) / sigma_r, h);
        out += (&view.phase.velocities[slot] - &own_velocity).zeroed_z(dim) * weight;
    }
    out.zeroed_z(dim)
}

/// Simple saturated pursuit of a fixed point.
///
/// Returns a unit-bounded vector towards `target`: zero within `r_inner`,
/// ramping linearly to full gain at `r_outer`. Callers scale by the cruise
/// speed and apply their own cap. With `r_inner == r_outer` the ramp
/// degenerates to a step.
pub fn target_tracking_simple(
    view: &EgoView,
    target: &Vec3,
    r_inner: f64,
    r_outer: f64,
    dim: u32,
) -> Vec3 {
    let toward = (target - &view.self_position()).zeroed_z(dim);
    let distance = toward.norm();
    let gain = if r_outer > r_inner {
        ((distance - r_inner) / (r_outer - r_inner)).clamp(0.0, 1.0)
    } else if distance > r_inner {
        1.0
    } else {
        0.0
    };
    toward.normalize() * gain
}

/// Flock-mediated pursuit used by the coverage strategy.
///
/// The agent chases the target only while it stays attached to the flock:
/// when it drifts beyond `r_com_far` of the visible centre of mass it turns
/// back towards the flock instead; within `r_com_near` the pure pursuit ramp
/// (`r_inner`..`r_outer`) applies unchanged.
#[allow(clippy::too_many_arguments)]
pub fn target_tracking(
    view: &EgoView,
    target: &Vec3,
    r_com_near: f64,
    r_com_far: f64,
    r_inner: f64,
    r_outer: f64,
    dim: u32,
) -> Vec3 {
    let mut com = Vec3::zero();
    for slot in 0..view.visible {
        com += view.phase.coordinates[slot];
    }
    com = com / view.visible as f64;

    let from_com = (&view.self_position() - &com).zeroed_z(dim).norm();
    if from_com > r_com_far {
        // Rejoin the flock at full gain.
        (&com - &view.self_position()).zeroed_z(dim).normalize()
    } else {
        let pursuit = target_tracking_simple(view, target, r_inner, r_outer, dim);
        if from_com > r_com_near {
            // Straggling: blend pursuit down as the agent separates.
            pursuit * ((r_com_far - from_com) / (r_com_far - r_com_near).max(f64::EPSILON))
        } else {
            pursuit
        }
    }
}

/// Olfati-Saber navigation feedback towards a moving reference.
///
/// Position error through the bounded sigma_1 sigmoid scaled to the cruise
/// speed, plus the raw velocity error.
pub fn tracking_olfati(
    view: &EgoView,
    target_position: &Vec3,
    target_velocity: &Vec3,
    v_flock: f64,
    dim: u32,
) -> Vec3 {
    let position_error = (target_position - &view.self_position()).zeroed_z(dim);
    let scale = (1.0 + position_error.norm_squared()).sqrt().recip();
    let velocity_error = (target_velocity - &view.self_velocity()).zeroed_z(dim);
    (position_error * (v_flock * scale) + velocity_error).zeroed_z(dim)
}

/// Shared tail of the shill terms: a virtual agent at the boundary moving at
/// `v_shill` along `inward`; the velocity difference above the braking-curve
/// allowance at `dist` is compensated.
fn shill_compensation(
    own_velocity: &Vec3,
    inward: Vec3,
    dist: f64,
    v_shill: f64,
    r0_shill: f64,
    acc: f64,
    slope: f64,
    dim: u32,
) -> Vec3 {
    let shill_velocity = inward.normalize() * v_shill;
    let vel_diff = (&shill_velocity - own_velocity).zeroed_z(dim);
    let magnitude = vel_diff.norm();
    let max_allowed = vel_decay_lin_sqrt(dist, slope, acc, r0_shill);
    if magnitude > max_allowed {
        vel_diff.normalize() * (magnitude - max_allowed)
    } else {
        Vec3::zero()
    }
}

/// Arena boundary shill agent.
///
/// The shill stands on the wall moving inward at `v_shill`; agents match it
/// progressively as they approach the boundary and fully once outside
/// (negative wall distance allows no velocity difference at all). The square
/// arena applies the gate per wall.
#[allow(clippy::too_many_arguments)]
pub fn shill_wall_lin_sqrt(
    view: &EgoView,
    arena: &Arena,
    v_shill: f64,
    r0_shill: f64,
    acc: f64,
    slope: f64,
    dim: u32,
) -> Vec3 {
    let own_position = view.self_position();
    let own_velocity = view.self_velocity();
    let mut out = Vec3::zero();

    match arena {
        Arena::Disc { center, radius } => {
            let rel = Vec3::new(
                own_position.x - center.x,
                own_position.y - center.y,
                0.0,
            );
            let r = rel.xy_norm();
            if r > f64::EPSILON {
                let dist_from_wall = radius - r;
                out += shill_compensation(
                    &own_velocity,
                    -rel,
                    dist_from_wall,
                    v_shill,
                    r0_shill,
                    acc,
                    slope,
                    dim,
                );
            }
        }
        Arena::Square { center, radius } => {
            // (inward normal, distance from that wall)
            let walls = [
                (Vec3::new(-1.0, 0.0, 0.0), center.x + radius - own_position.x),
                (Vec3::new(1.0, 0.0, 0.0), own_position.x - (center.x - radius)),
                (Vec3::new(0.0, -1.0, 0.0), center.y + radius - own_position.y),
                (Vec3::new(0.0, 1.0, 0.0), own_position.y - (center.y - radius)),
            ];
            for (inward, dist) in walls {
                out += shill_compensation(
                    &own_velocity,
                    inward,
                    dist,
                    v_shill,
                    r0_shill,
                    acc,
                    slope,
                    dim,
                );
            }
        }
    }
    out.zeroed_z(dim)
}

/// Obstacle shill agent.
///
/// Same braking-curve gate against the nearest point of the polygon; inside
/// an obstacle the shill points out through the nearest wall and the
/// distance is negative, forcing full compensation.
#[allow(clippy::too_many_arguments)]
pub fn shill_obstacle_lin_sqrt(
    view: &EgoView,
    obstacle: &Obstacle,
    v_shill: f64,
    r0_shill: f64,
    acc: f64,
    slope: f64,
    dim: u32,
) -> Vec3 {
    let own_position = view.self_position();
    let own_velocity = view.self_velocity();

    // Obstacles are validated convex and non-empty at load time.
    let (nearest, dist) = match nearest_point_of_polygon(&own_position, &obstacle.vertices) {
        Ok(result) => result,
        Err(_) => return Vec3::zero(),
    };

    let direction = if dist < 0.0 {
        // Inside: head for the nearest wall point.
        (&nearest - &own_position).zeroed_z(2)
    } else {
        // Outside: the shill pushes straight away from the obstacle.
        (&own_position - &nearest).zeroed_z(2)
    };

    shill_compensation(
        &own_velocity,
        direction,
        dist,
        v_shill,
        r0_shill,
        acc,
        slope,
        dim,
    )
    .zeroed_z(dim)
}

/// Adjacency potential with a zero-force well.
///
/// Within the adjacency range `r_cut`, neighbours closer than `r1` push
/// apart with stiffness `mu1`, neighbours beyond `r2` pull together with
/// stiffness `mu2`, and the band between is force-free.
#[allow(clippy::too_many_arguments)]
pub fn potential_based(
    view: &EgoView,
    k0: f64,
    r_cut: f64,
    r1: f64,
    r2: f64,
    mu1: f64,
    mu2: f64,
    dim: u32,
) -> Vec3 {
    let own = view.self_position();
    let mut out = Vec3::zero();

    for slot in view.neighbour_slots() {
        let away = (&own - &view.phase.coordinates[slot]).zeroed_z(dim);
        let distance = away.norm();
        if distance >= r_cut || distance <= f64::EPSILON {
            continue;
        }
        if distance < r1 {
            out += away.normalize() * (k0 * mu1 * (r1 - distance));
        } else if distance > r2 {
            out -= away.normalize() * (k0 * mu2 * (distance - r2));
        }
    }
    out.zeroed_z(dim)
}

/// Global connectivity controller on the cached Fiedler pair.
///
/// Gradient-style feedback that strengthens weak links while the algebraic
/// connectivity `lambda_2` is below its target and relaxes them above it.
/// The per-link weight follows the Gaussian adjacency `exp(-d²/(2θ²))` and
/// the squared Fiedler-vector difference across the link.
pub fn global_connectivity_controller(
    view: &EgoView,
    kc0: f64,
    sigma0: f64,
    lambda_target: f64,
    theta: f64,
    dim: u32,
) -> Vec3 {
    let lambda2 = view.phase.second_eigenvalue;
    let error = lambda_target - lambda2;
    if error.abs() < 1e-9 || theta <= 0.0 || sigma0 <= 0.0 {
        return Vec3::zero();
    }

    let kc = kc0 * sat(error, 0.2);
    let sigma = sigma0 * sat(-error, 0.2);
    let boost = ((-error) / sigma).exp();

    let own = view.self_position();
    let fiedler = &view.phase.second_eigenvector;
    let v_self = fiedler.get(view.self_id()).copied().unwrap_or(0.0);
    let mut out = Vec3::zero();

    for slot in view.neighbour_slots() {
        let toward = (&view.phase.coordinates[slot] - &own).zeroed_z(dim);
        let distance = toward.norm();
        if distance <= f64::EPSILON {
            continue;
        }
        let adjacency = (-(distance * distance) / (2.0 * theta * theta)).exp();
        let v_other = fiedler
            .get(view.phase.real_ids[slot])
            .copied()
            .unwrap_or(0.0);
        let spread = (v_self - v_other) * (v_self - v_other);
        out += toward.normalize() * (kc * adjacency * spread * boost / (theta * theta));
    }
    out.zeroed_z(dim)
}

/// Self-propulsion: hold the current heading at cruise speed.
pub fn spp_term(view: &EgoView, v_flock: f64, dim: u32) -> Vec3 {
    view.self_velocity().zeroed_z(dim).normalize() * v_flock
}
