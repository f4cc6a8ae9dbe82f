//! First-order autoregressive GPS error model.
//!
//! Each agent carries a position-error and a velocity-error vector. On every
//! GPS tick the errors relax towards zero with coefficient `phi` and receive
//! a Gaussian innovation scaled by `sqrt(1 - phi^2)`, so the stationary
//! deviation equals the configured `Sigma_GPS_XY` / `Sigma_GPS_Z`. The XY
//! pair and the Z axis run as separate filters.
//!
//! Two independent instances exist per run: one sampled by agents for their
//! own state, one for the delayed neighbour observations.

use crate::vector::Vec3;
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Relaxation coefficient per GPS tick.
const GPS_AR_COEFF: f64 = 0.9;

#[derive(Debug, Clone)]
pub struct GpsNoise {
    position: Vec<Vec3>,
    velocity: Vec<Vec3>,
}

impl GpsNoise {
    pub fn new(n: usize) -> Self {
        GpsNoise {
            position: vec![Vec3::zero(); n],
            velocity: vec![Vec3::zero(); n],
        }
    }

    /// Advances every agent's error state by one GPS tick.
    pub fn step<R: Rng>(&mut self, sigma_xy: f64, sigma_z: f64, dim: u32, rng: &mut R) {
        let innovation = (1.0 - GPS_AR_COEFF * GPS_AR_COEFF).sqrt();
        let xy = Normal::new(0.0, (sigma_xy * innovation).max(f64::MIN_POSITIVE)).unwrap();
        let z = Normal::new(0.0, (sigma_z * innovation).max(f64::MIN_POSITIVE)).unwrap();

        for store in [&mut self.position, &mut self.velocity] {
            for err in store.iter_mut() {
                err.x = GPS_AR_COEFF * err.x + if sigma_xy > 0.0 { xy.sample(rng) } else { 0.0 };
                err.y = GPS_AR_COEFF * err.y + if sigma_xy > 0.0 { xy.sample(rng) } else { 0.0 };
                err.z = if dim == 2 {
                    0.0
                } else {
                    GPS_AR_COEFF * err.z + if sigma_z > 0.0 { z.sample(rng) } else { 0.0 }
                };
            }
        }
    }

    #[inline]
    pub fn position_error(&self, agent: usize) -> Vec3 {
        self.position[agent]
    }

    #[inline]
    pub fn velocity_error(&self, agent: usize) -> Vec3 {
        self.velocity[agent]
    }
}
