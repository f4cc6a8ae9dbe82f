//! Scalar transfer kernels of the interaction library.
//!
//! These are the shape functions every force term is built from: the linear
//! sigmoid gain of repulsion, its mirror for attraction, the linear-then-sqrt
//! braking curve for friction and shill agents, and the Olfati-Saber smooth
//! kernels (sigma-norm, bump, action function).

use super::Vec3;

/// Linear sigmoid gain, `clip(slope * (r - x), 0, v_max)`.
///
/// Maximal (`v_max`) deep inside the activation radius, decaying linearly to
/// zero at `x == r`. Drives the pairwise repulsion term.
#[inline]
pub fn sigmoid_lin(x: f64, slope: f64, v_max: f64, r: f64) -> f64 {
    (slope * (r - x)).clamp(0.0, v_max)
}

/// Attraction gain mirrored about the activation radius,
/// `clip(slope * (x - r), 0, v_max)`.
///
/// Zero inside `r`, growing linearly with distance beyond it and saturating
/// at `v_max`.
#[inline]
pub fn sigmoid_lin_att(x: f64, slope: f64, v_max: f64, r: f64) -> f64 {
    (slope * (x - r)).clamp(0.0, v_max)
}

/// Maximum allowed velocity difference at gap `x - r0` on the optimal
/// linear-then-square-root braking curve.
///
/// For gaps the agent can close while decelerating at `acc` within the
/// linear regime (`gap < acc / slope²`) the bound is `slope * gap`; beyond
/// that it follows the ideal braking envelope `sqrt(2·acc·gap - acc²/slope²)`.
/// Non-positive gaps allow no velocity difference at all, which is what makes
/// the shill terms compensate fully once an agent is outside the arena or
/// inside an obstacle.
pub fn vel_decay_lin_sqrt(x: f64, slope: f64, acc: f64, r0: f64) -> f64 {
    let gap = x - r0;
    if gap <= 0.0 || slope <= 0.0 || acc <= 0.0 {
        0.0
    } else if slope * gap < acc / slope {
        slope * gap
    } else {
        (2.0 * acc * gap - acc * acc / (slope * slope)).sqrt()
    }
}

/// Sigma-norm of a vector: `(sqrt(1 + eps·|x|²) - 1) / eps`.
///
/// A smooth, everywhere-differentiable surrogate for the Euclidean norm
/// (Olfati-Saber).
#[inline]
pub fn sigma_norm(v: &Vec3, epsilon: f64) -> f64 {
    ((1.0 + epsilon * v.norm_squared()).sqrt() - 1.0) / epsilon
}

/// Scalar sigma-norm of a non-negative distance.
#[inline]
pub fn sigma_norm_scalar(x: f64, epsilon: f64) -> f64 {
    ((1.0 + epsilon * x * x).sqrt() - 1.0) / epsilon
}

/// Gradient of the sigma-norm: `v / sqrt(1 + eps·|v|²)`.
#[inline]
pub fn sigma_grad(v: &Vec3, epsilon: f64) -> Vec3 {
    *v * (1.0 + epsilon * v.norm_squared()).sqrt().recip()
}

/// Bounded sigmoid `z / sqrt(1 + z²)`, the sigma_1 of the Olfati-Saber
/// action function.
#[inline]
pub fn sigma_one(z: f64) -> f64 {
    z / (1.0 + z * z).sqrt()
}

/// C¹ bump function: 1 on `[0, h]`, cosine taper on `(h, 1]`, 0 elsewhere.
pub fn bump_function(z: f64, h: f64) -> f64 {
    if (0.0..=h).contains(&z) {
        1.0
    } else if z > h && z <= 1.0 {
        0.5 * (1.0 + (std::f64::consts::PI * (z - h) / (1.0 - h)).cos())
    } else {
        0.0
    }
}

/// Uneven sigmoidal action function `phi(z)` of the gradient-based term,
/// with attractive strength `a` and repulsive strength `b` (`0 < a <= b`).
pub fn action_function(z: f64, a: f64, b: f64) -> f64 {
    let c = (a - b).abs() / (4.0 * a * b).sqrt();
    0.5 * ((a + b) * sigma_one(z + c) + (a - b))
}

/// Symmetric saturation, `clip(x, -k, k)`.
#[inline]
pub fn sat(x: f64, k: f64) -> f64 {
    x.clamp(-k, k)
}
