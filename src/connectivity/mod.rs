//! # Connectivity Layer
//!
//! Builds the weighted Laplacian of the communication graph from pairwise
//! distances once per tick, extracts the Fiedler pair (second-smallest
//! eigenvalue and its eigenvector) and caches both on the outgoing phase for
//! the connectivity controller.
//!
//! The Laplacian is symmetric positive-semidefinite by construction, so a
//! symmetric eigensolver is used. Solver failure or a NaN in the spectrum is
//! a fatal numerical breakdown.


use crate::error::SimError;
use crate::phase::Phase;
use nalgebra::DMatrix;

/// Gaussian edge weight, ~1 at close range and `exp(-2)` at the cut-off.
fn edge_weight(distance: f64, r_lambda: f64) -> f64 {
    let theta = 0.5 * r_lambda;
    (-(distance * distance) / (2.0 * theta * theta)).exp()
}

/// Weighted graph Laplacian `L = D - W` with `W[i][j] = w(d_ij)` for
/// `d_ij < r_lambda` and 0 otherwise.
pub fn weighted_laplacian(phase: &Phase, r_lambda: f64) -> Vec<Vec<f64>> {
    let n = phase.len();
    let mut laplacian = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in (i + 1)..n {
            let distance = (&phase.coordinates[i] - &phase.coordinates[j]).norm();
            if distance < r_lambda {
                let w = edge_weight(distance, r_lambda);
                laplacian[i][j] = -w;
                laplacian[j][i] = -w;
                laplacian[i][i] += w;
                laplacian[j][j] += w;
            }
        }
    }
    laplacian
}

/// The Fiedler pair of a Laplacian: eigenvalues sorted ascending, the second
/// one and its eigenvector returned.
pub fn fiedler_pair(laplacian: &[Vec<f64>], tick: u64) -> Result<(f64, Vec<f64>), SimError> {
    let n = laplacian.len();
    if n < 2 {
        return Ok((0.0, vec![0.0; n]));
    }

    let matrix = DMatrix::from_fn(n, n, |i, j| laplacian[i][j]);
    let eigen = nalgebra::SymmetricEigen::try_new(matrix, 1.0e-12, 10_000).ok_or_else(|| {
        SimError::Numerical {
            tick,
            reason: "symmetric eigensolver failed to converge on the Laplacian".into(),
        }
    })?;

    if eigen.eigenvalues.iter().any(|v| v.is_nan()) {
        return Err(SimError::Numerical {
            tick,
            reason: "NaN eigenvalue in the Laplacian spectrum".into(),
        });
    }

    // Sort ascending and pick the second-smallest.
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        eigen.eigenvalues[a]
            .partial_cmp(&eigen.eigenvalues[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let idx = order[1];
    let lambda2 = eigen.eigenvalues[idx];
    let vector: Vec<f64> = eigen.eigenvectors.column(idx).iter().copied().collect();
    Ok((lambda2, vector))
}

/// Runs the whole per-tick spectral step: Laplacian, Fiedler pair, cache on
/// the phase.
pub fn refresh_spectrum(phase: &mut Phase, r_lambda: f64, tick: u64) -> Result<(), SimError> {
    let laplacian = weighted_laplacian(phase, r_lambda);
    let (lambda2, vector) = fiedler_pair(&laplacian, tick)?;
    phase.laplacian = laplacian;
    phase.second_eigenvalue = lambda2;
    phase.second_eigenvector = vector;
    Ok(())
}
