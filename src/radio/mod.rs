//! # Radio Link Model
//!
//! Received-power computation for inter-agent links and the power-based
//! neighbour selection policy.
//!
//! The loss model is a log-distance law with an additive obstacle
//! attenuation term and a frequency constant derived from the carrier
//! wavelength:
//!
//! ```text
//! P_rx = P_tx + 20·log10(λ / (4π·d_ref))
//!             − 10·γ·log10(d / d_ref)
//!             − 10·γ_obst·log10(max(d_obst, d_ref) / d_ref)
//! ```
//!
//! The `communication_type` selects the loss kernel only; the interface is
//! identical across modes. Distances are metres; powers are dBm. A zero
//! distance (the self link) yields −∞.


use crate::phase::NO_NEIGHBOUR;
use serde::{Deserialize, Serialize};

/// Speed of light in vacuum, m/s.
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Loss-kernel selection (`communication_type` parameter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommModel {
    /// Free-space path loss (path-loss exponent fixed at 2).
    FreeSpace,
    /// Log-distance law with the configured exponent, no obstacle term.
    LogDistance,
    /// Log-distance law plus obstacle attenuation along the obstructed path.
    LogDistanceObstructed,
}

impl CommModel {
    /// Maps the numeric `communication_type` configuration value.
    pub fn from_index(index: u32) -> Self {
        match index {
            0 => CommModel::FreeSpace,
            1 => CommModel::LogDistance,
            _ => CommModel::LogDistanceObstructed,
        }
    }
}

/// Radio parameters shared by all links.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LinkBudget {
    pub model: CommModel,
    /// Transmit power, dBm.
    pub transmit_power: f64,
    /// Reference distance of the log-distance law, metres.
    pub ref_distance: f64,
    /// Path-loss exponent.
    pub gamma: f64,
    /// Additional exponent applied to the obstructed path length.
    pub gamma_obst: f64,
    /// Carrier frequency, Hz.
    pub freq: f64,
}

impl LinkBudget {
    /// Frequency-dependent additive constant, `20·log10(λ/(4π·d_ref))`.
    fn frequency_constant(&self) -> f64 {
        let wavelength = SPEED_OF_LIGHT / self.freq;
        20.0 * (wavelength / (4.0 * std::f64::consts::PI * self.ref_distance)).log10()
    }

    /// Received power over a link of length `d` metres of which `d_obst`
    /// metres pass through obstacles. Returns −∞ for the degenerate self
    /// link (`d == 0`).
    pub fn received_power(&self, d: f64, d_obst: f64) -> f64 {
        if d <= 0.0 {
            return f64::NEG_INFINITY;
        }
        let k = self.frequency_constant();
        let gamma = match self.model {
            CommModel::FreeSpace => 2.0,
            _ => self.gamma,
        };
        let mut power =
            self.transmit_power + k - 10.0 * gamma * (d / self.ref_distance).log10();
        if self.model == CommModel::LogDistanceObstructed {
            power -= 10.0
                * self.gamma_obst
                * (d_obst.max(self.ref_distance) / self.ref_distance).log10();
        }
        power
    }
}

/// One candidate neighbour with its link power.
#[derive(Debug, Clone, Copy)]
pub struct Link {
    pub id: usize,
    pub power_dbm: f64,
}

/// Power-based neighbour selection.
///
/// Keeps links at or above `sensitivity_thresh` dBm, sorted by descending
/// power, truncated to `size_neighbourhood`, and returns the canonical-order
/// neighbour row padded with the [`NO_NEIGHBOUR`] sentinel.
pub fn select_neighbourhood(
    powers: &[f64],
    this_agent: usize,
    sensitivity_thresh: f64,
    size_neighbourhood: usize,
) -> Vec<Link> {
    let mut links: Vec<Link> = powers
        .iter()
        .enumerate()
        .filter(|&(id, &p)| id != this_agent && p >= sensitivity_thresh && p.is_finite())
        .map(|(id, &p)| Link { id, power_dbm: p })
        .collect();
    // Descending by power; ID order breaks exact ties deterministically.
    links.sort_by(|a, b| {
        b.power_dbm
            .partial_cmp(&a.power_dbm)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.id.cmp(&b.id))
    });
    links.truncate(size_neighbourhood);
    links
}

/// Renders selected links as a sentinel-padded neighbour row of width `n`.
pub fn neighbour_row(links: &[Link], n: usize) -> Vec<i64> {
    let mut row = vec![NO_NEIGHBOUR; n];
    for (slot, link) in links.iter().enumerate() {
        row[slot] = link.id as i64;
    }
    row
}
