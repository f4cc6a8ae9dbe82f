//! # Ego-View Builder
//!
//! Each agent acts on a private, degraded projection of the swarm: slot 0 is
//! the agent itself observed at the current tick through its own GPS error,
//! slots 1.. are the radio-selected neighbours observed `t_del` seconds in
//! the past through the delayed GPS error stream. The builder also computes
//! the agent's crowding pressure and the signed Jaccard similarity towards
//! each visible neighbour.
//!
//! In co-simulation mode an external radio oracle supplies the neighbour and
//! link-power rows; GPS noise and the internal radio model are skipped and
//! the supplied list is clamped to `Size_Neighbourhood`.

// AR(1) GPS error streams
pub mod gps;
// Unit tests
pub mod tests;

use crate::config::SimConfig;
use crate::geometry::arena::Obstacle;
use crate::geometry::obstructed_length;
use crate::phase::{Phase, NO_NEIGHBOUR};
use crate::radio::{neighbour_row, select_neighbourhood, Link};
use crate::vector::Vec3;
use gps::GpsNoise;

/// Conversion from simulation distance units to the metres fed into the
/// radio path-loss law.
pub const SIM_UNIT_TO_METRES: f64 = 0.01;

/// Oracle-supplied sensing rows for one agent (co-simulation mode).
#[derive(Debug, Clone)]
pub struct OracleRows {
    /// Neighbour IDs in reception order, sentinel −1.
    pub neighbours: Vec<i64>,
    /// Link powers parallel to `neighbours`, dBm, sentinel −∞.
    pub powers: Vec<f64>,
}

/// Per-agent projection of the swarm. The embedded phase holds `visible`
/// meaningful slots; slot 0 is the observing agent (`real_ids[0] == self`).
#[derive(Debug, Clone)]
pub struct EgoView {
    pub phase: Phase,
    pub visible: usize,
    /// Signed Jaccard similarity per slot (entry 0 unused).
    pub jaccard: Vec<f64>,
}

impl EgoView {
    #[inline]
    pub fn self_position(&self) -> Vec3 {
        self.phase.coordinates[0]
    }

    #[inline]
    pub fn self_velocity(&self) -> Vec3 {
        self.phase.velocities[0]
    }

    #[inline]
    pub fn self_id(&self) -> usize {
        self.phase.real_ids[0]
    }

    /// Slots of the visible neighbours (1..visible).
    #[inline]
    pub fn neighbour_slots(&self) -> std::ops::Range<usize> {
        1..self.visible
    }
}

/// Everything one sensing pass produces: the ego view plus the canonical
/// rows the scheduler commits to the outgoing global phase.
#[derive(Debug, Clone)]
pub struct SensorReadout {
    pub ego: EgoView,
    /// Link powers towards all agents, canonical order, dBm.
    pub power_row: Vec<f64>,
    /// Selected neighbour IDs, canonical sentinel-padded row.
    pub neigh_row: Vec<i64>,
    /// Self crowding pressure.
    pub pressure: f64,
}

/// Builds agent `which`'s view of the swarm.
///
/// `observed` is the committed phase of the current tick, `delayed` the
/// phase `ceil(t_del/dt)` ticks in the past. `candidates` indexes the
/// obstacles that intersect the swarm's convex hull and may obstruct a line
/// of sight. `r0_effective` is the equilibrium distance after any
/// strategy-level inflation.
#[allow(clippy::too_many_arguments)]
pub fn build_ego_view(
    observed: &Phase,
    delayed: &Phase,
    gps: &GpsNoise,
    gps_delayed: &GpsNoise,
    candidates: &[usize],
    obstacles: &[Obstacle],
    which: usize,
    config: &SimConfig,
    r0_effective: f64,
    oracle: Option<&OracleRows>,
) -> SensorReadout {
    let n = observed.len();
    let cap = config.flocking.size_neighbourhood;
    let cosim = oracle.is_some();

    let (links, power_row) = match oracle {
        Some(rows) => links_from_oracle(rows, which, cap, n),
        None => links_from_radio(observed, candidates, obstacles, which, config, cap),
    };

    let mut phase = Phase::new(n);
    let visible = 1 + links.len();

    // Slot 0: self at the current tick, through the own-state GPS filter.
    let (self_pos, self_vel) = if cosim {
        (observed.coordinates[which], observed.velocities[which])
    } else {
        (
            observed.coordinates[which] + gps.position_error(which),
            observed.velocities[which] + gps.velocity_error(which),
        )
    };
    phase.coordinates[0] = self_pos;
    phase.velocities[0] = self_vel;
    phase.inner_states[0] = observed.inner_states[which].clone();
    phase.real_ids[0] = which;
    phase.pressure[0] = observed.pressure[which];

    // Slots 1..: neighbours as they looked `t_del` seconds ago, through the
    // delayed GPS filter.
    for (slot, link) in links.iter().enumerate() {
        let slot = slot + 1;
        let id = link.id;
        let (pos, vel) = if cosim {
            (delayed.coordinates[id], delayed.velocities[id])
        } else {
            (
                delayed.coordinates[id] + gps_delayed.position_error(id),
                delayed.velocities[id] + gps_delayed.velocity_error(id),
            )
        };
        phase.coordinates[slot] = pos;
        phase.velocities[slot] = vel;
        phase.inner_states[slot] = observed.inner_states[id].clone();
        phase.real_ids[slot] = id;
        phase.pressure[slot] = observed.pressure[id];
        phase.received_power[0][slot] = link.power_dbm;
        // Neighbour's own neighbour row from the committed phase, for the
        // Jaccard similarity below.
        phase.neigh_set[slot] = observed.neigh_set[id].clone();
    }

    let neigh_row = neighbour_row(&links, n);
    phase.neigh_set[0] = neigh_row.clone();

    // Connectivity cache travels with the view (the controller reads the
    // Fiedler pair of the whole graph; a distributed estimator would go
    // here).
    phase.laplacian = observed.laplacian.clone();
    phase.second_eigenvalue = observed.second_eigenvalue;
    phase.second_eigenvector = observed.second_eigenvector.clone();

    let pressure = self_pressure(&phase, visible, r0_effective);
    phase.pressure[0] = pressure;

    let jaccard = jaccard_row(&phase, visible, which, &neigh_row, observed);

    SensorReadout {
        ego: EgoView {
            phase,
            visible,
            jaccard,
        },
        power_row,
        neigh_row,
        pressure,
    }
}

/// Link powers through the internal radio model, with obstruction lengths
/// from the candidate obstacle polygons.
fn links_from_radio(
    observed: &Phase,
    candidates: &[usize],
    obstacles: &[Obstacle],
    which: usize,
    config: &SimConfig,
    cap: usize,
) -> (Vec<Link>, Vec<f64>) {
    let n = observed.len();
    let budget = config.unit.link_budget();
    let own_position = observed.coordinates[which];

    let mut power_row = vec![0.0; n];
    for i in 0..n {
        if i == which {
            continue;
        }
        let other = observed.coordinates[i];
        let distance = (&other - &own_position).norm();
        let mut obstructed = 0.0;
        for &c in candidates {
            obstructed += obstructed_length(&own_position, &other, &obstacles[c].vertices);
        }
        power_row[i] = budget.received_power(
            distance * SIM_UNIT_TO_METRES,
            obstructed * SIM_UNIT_TO_METRES,
        );
    }

    let links = select_neighbourhood(
        &power_row,
        which,
        config.unit.sensitivity_thresh,
        cap,
    );
    (links, power_row)
}

/// Links taken verbatim from the co-simulation oracle, clamped to the
/// neighbourhood cap.
fn links_from_oracle(rows: &OracleRows, which: usize, cap: usize, n: usize) -> (Vec<Link>, Vec<f64>) {
    let mut links = Vec::new();
    let mut power_row = vec![f64::NEG_INFINITY; n];
    power_row[which] = 0.0;

    for (idx, &id) in rows.neighbours.iter().enumerate() {
        if id == NO_NEIGHBOUR || links.len() >= cap {
            continue;
        }
        let id = id as usize;
        if id == which || id >= n {
            continue;
        }
        let power = rows.powers.get(idx).copied().unwrap_or(f64::NEG_INFINITY);
        power_row[id] = power;
        links.push(Link {
            id,
            power_dbm: power,
        });
    }
    (links, power_row)
}

/// Mean crowding contribution `R_0 - d` of the neighbours within `R_0`;
/// zero when none press.
fn self_pressure(phase: &Phase, visible: usize, r_0: f64) -> f64 {
    let own_position = phase.coordinates[0];
    let mut press = 0.0;
    let mut pressing = 0usize;
    for slot in 1..visible {
        let distance = (&phase.coordinates[slot] - &own_position).norm();
        if distance <= r_0 {
            press += r_0 - distance;
            pressing += 1;
        }
    }
    if pressing > 0 {
        press / pressing as f64
    } else {
        0.0
    }
}

/// Signed Jaccard similarity of the observer towards each visible slot.
///
/// Sign is +1 when the relationship is mutual (the neighbour's committed
/// row lists the observer back), −1 otherwise; magnitude is
/// `|N_i ∩ N_j| / |N_i ∪ N_j|` over the two neighbour ID sets.
fn jaccard_row(
    phase: &Phase,
    visible: usize,
    which: usize,
    own_row: &[i64],
    observed: &Phase,
) -> Vec<f64> {
    let own: Vec<i64> = own_row
        .iter()
        .copied()
        .take_while(|&id| id != NO_NEIGHBOUR)
        .collect();

    let mut jaccard = vec![0.0; phase.len()];
    for slot in 1..visible {
        let id = phase.real_ids[slot];
        let theirs: Vec<i64> = observed.neigh_set[id]
            .iter()
            .copied()
            .take_while(|&t| t != NO_NEIGHBOUR)
            .collect();

        let mutual = theirs.contains(&(which as i64));
        let intersection = own.iter().filter(|t| theirs.contains(t)).count();
        let union = own.len() + theirs.len() - intersection;
        let magnitude = if union > 0 {
            intersection as f64 / union as f64
        } else {
            0.0
        };
        jaccard[slot] = if mutual { magnitude } else { -magnitude };
    }
    jaccard
}
