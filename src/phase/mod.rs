//! # Phase Store
//!
//! [`Phase`] is the global snapshot of the swarm at one discrete time: the
//! true coordinates and velocities of all agents, their scalar inner states,
//! the identity permutation, and the per-tick caches of the sensing and
//! connectivity layers (pressure, link powers, neighbour sets, Laplacian and
//! Fiedler pair).
//!
//! The phase is created once at initialisation, mutated only by the
//! integrator at tick boundaries, and read by the ego-view builder and the
//! connectivity layer. The [`history::PhaseRing`] owns the past phases the
//! delayed observation model reads from.

// History ring buffer for delayed observation
pub mod history;

use crate::vector::Vec3;
use serde::{Deserialize, Serialize};

/// Number of scalar inner states per agent in the reference strategy set.
pub const NUM_INNER_STATES: usize = 17;

/// Sentinel marking an empty slot in a neighbour set.
pub const NO_NEIGHBOUR: i64 = -1;

// Inner-state layout. Indices 3..=16 carry last-tick diagnostic
// sub-velocities for external plotting.
/// Attraction/repulsion neighbourhood ratio in [0, 1].
pub const INNER_NEIGH_RATIO: usize = 0;
/// Reserved.
pub const INNER_RESERVED: usize = 1;
/// Leader rank for implicit leader following; 0 means "not in a chain".
pub const INNER_LEADER_RANK: usize = 2;
pub const INNER_DIAG_REP_X: usize = 3;
pub const INNER_DIAG_REP_Y: usize = 4;
pub const INNER_DIAG_ATT_X: usize = 5;
pub const INNER_DIAG_ATT_Y: usize = 6;
pub const INNER_DIAG_FRICT_X: usize = 7;
pub const INNER_DIAG_FRICT_Y: usize = 8;
pub const INNER_DIAG_OBST_X: usize = 9;
pub const INNER_DIAG_OBST_Y: usize = 10;
pub const INNER_DIAG_SPP_X: usize = 11;
pub const INNER_DIAG_SPP_Y: usize = 12;
pub const INNER_DIAG_ADJ_X: usize = 13;
pub const INNER_DIAG_ADJ_Y: usize = 14;
pub const INNER_DIAG_CONN_X: usize = 15;
pub const INNER_DIAG_CONN_Y: usize = 16;

/// Global swarm snapshot at one discrete time step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phase {
    /// Positions in metres; z pinned to 0 in 2D mode.
    pub coordinates: Vec<Vec3>,
    /// Velocities in m/s; z pinned to 0 in 2D mode.
    pub velocities: Vec<Vec3>,
    /// Per-agent scalar state vectors, `NUM_INNER_STATES` entries each.
    pub inner_states: Vec<Vec<f64>>,
    /// Permutation mapping local slot to canonical agent ID. Slot 0 of an
    /// ego view is always the observing agent itself.
    pub real_ids: Vec<usize>,
    /// Crowding pressure per agent.
    pub pressure: Vec<f64>,
    /// Last computed link-power matrix in dBm; diagonal is 0.
    pub received_power: Vec<Vec<f64>>,
    /// Per-agent neighbour ID lists, padded with [`NO_NEIGHBOUR`].
    pub neigh_set: Vec<Vec<i64>>,
    /// Weighted graph Laplacian cached by the connectivity layer.
    pub laplacian: Vec<Vec<f64>>,
    /// Algebraic connectivity (second-smallest Laplacian eigenvalue).
    pub second_eigenvalue: f64,
    /// Fiedler vector paired with [`Phase::second_eigenvalue`].
    pub second_eigenvector: Vec<f64>,
}

impl Phase {
    /// Allocates a phase for `n` agents with identity slot mapping and all
    /// dynamic quantities zeroed.
    pub fn new(n: usize) -> Self {
        Phase {
            coordinates: vec![Vec3::zero(); n],
            velocities: vec![Vec3::zero(); n],
            inner_states: vec![vec![0.0; NUM_INNER_STATES]; n],
            real_ids: (0..n).collect(),
            pressure: vec![0.0; n],
            received_power: vec![vec![0.0; n]; n],
            neigh_set: vec![vec![NO_NEIGHBOUR; n]; n],
            laplacian: vec![vec![0.0; n]; n],
            second_eigenvalue: 0.0,
            second_eigenvector: vec![0.0; n],
        }
    }

    /// Number of agent slots in this phase.
    #[inline]
    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    /// Pins all z-components to zero (2D mode).
    pub fn pin_planar(&mut self) {
        for c in self.coordinates.iter_mut() {
            c.z = 0.0;
        }
        for v in self.velocities.iter_mut() {
            v.z = 0.0;
        }
    }

    /// Non-sentinel neighbour IDs of agent `i`.
    pub fn neighbours_of(&self, i: usize) -> impl Iterator<Item = usize> + '_ {
        self.neigh_set[i]
            .iter()
            .take_while(|&&id| id != NO_NEIGHBOUR)
            .map(|&id| id as usize)
    }
}
