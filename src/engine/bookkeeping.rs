//! Collision counters and the spatial-coverage state machine.

use crate::geometry::arena::Obstacle;
use crate::geometry::point_in_polygon;
use crate::phase::Phase;

/// Edge-triggered pairwise and obstacle collision counters.
///
/// A pair is counted once when it first closes below the collision radius
/// and re-arms when it separates; an agent crossing into an obstacle
/// increments the obstacle counter once and not again until it has left
/// that obstacle.
#[derive(Debug, Clone)]
pub struct CollisionLedger {
    pub pairwise: usize,
    pub obstacle: usize,
    pair_active: Vec<bool>,
    inside_obstacle: Vec<Option<usize>>,
    n: usize,
}

impl CollisionLedger {
    pub fn new(n: usize) -> Self {
        CollisionLedger {
            pairwise: 0,
            obstacle: 0,
            pair_active: vec![false; n * n],
            inside_obstacle: vec![None; n],
            n,
        }
    }

    /// Counts pairs newly closer than `radius` on this phase.
    pub fn count_pairwise(&mut self, phase: &Phase, radius: f64) {
        for i in 0..self.n {
            for j in (i + 1)..self.n {
                let distance = (&phase.coordinates[i] - &phase.coordinates[j]).norm();
                let slot = i * self.n + j;
                if distance < radius {
                    if !self.pair_active[slot] {
                        self.pairwise += 1;
                        self.pair_active[slot] = true;
                    }
                } else {
                    self.pair_active[slot] = false;
                }
            }
        }
    }

    /// Counts agents newly inside an obstacle polygon.
    pub fn count_obstacle_crossings(&mut self, phase: &Phase, obstacles: &[Obstacle]) {
        for agent in 0..self.n {
            let position = phase.coordinates[agent];
            match self.inside_obstacle[agent] {
                Some(which) => {
                    if !point_in_polygon(&position, &obstacles[which].vertices) {
                        self.inside_obstacle[agent] = None;
                    }
                }
                None => {
                    for (which, obstacle) in obstacles.iter().enumerate() {
                        if point_in_polygon(&position, &obstacle.vertices) {
                            self.obstacle += 1;
                            self.inside_obstacle[agent] = Some(which);
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Clears counters and re-arms every trigger (used on phase resets).
    pub fn reset(&mut self) {
        self.pairwise = 0;
        self.obstacle = 0;
        self.pair_active.fill(false);
        self.inside_obstacle.fill(None);
    }
}

/// Equilibrium distance while the coverage mode is spreading the swarm.
pub const COVERAGE_R0_INFLATED: f64 = 15_000.0;
/// Equilibrium distance restored when a coverage cycle completes.
pub const COVERAGE_R0_BASE: f64 = 4_000.0;
/// Ticks the swarm dwells in spread mode before advancing the target.
pub const COVERAGE_DWELL_TICKS: u32 = 1_000;
/// Agents that must be near the target to trigger spread mode.
pub const COVERAGE_QUORUM: usize = 4;

/// Strategy-3 spatial-coverage state machine.
///
/// The equilibrium-distance inflation is dynamic simulator state; the
/// parameter block stays immutable.
#[derive(Debug, Clone, Default)]
pub struct CoverageState {
    r0_override: Option<f64>,
    dwell: u32,
    pub active_target: usize,
}

impl CoverageState {
    /// Equilibrium distance the strategies should currently use.
    pub fn r0_effective(&self, configured_r0: f64) -> f64 {
        self.r0_override.unwrap_or(configured_r0)
    }

    /// Feeds one tick's near-target count. When the quorum holds the swarm
    /// in spread mode for the full dwell, the next target is selected and
    /// the base equilibrium distance restored.
    pub fn update(&mut self, near_target_count: usize, target_count: usize) {
        if near_target_count >= COVERAGE_QUORUM {
            self.r0_override = Some(COVERAGE_R0_INFLATED);
            self.dwell += 1;
            if self.dwell > COVERAGE_DWELL_TICKS {
                if target_count > 0 {
                    self.active_target = (self.active_target + 1) % target_count;
                }
                self.r0_override = Some(COVERAGE_R0_BASE);
                self.dwell = 0;
            }
        }
    }
}
