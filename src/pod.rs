//! Proper Orthogonal Decomposition of stacked snapshot matrices.
//!
//! The snapshot subgrids are concatenated along the time axis into one
//! `dof × (n_grids · n_time)` matrix whose left singular vectors form the POD
//! basis. Truncating the basis to the leading modes gives a low-dimensional
//! coefficient representation of every subgrid; [`reconstruct_pod`] inverts
//! the projection up to the truncation error.
//!
//! Mode selection is a [`Truncation`] variant rather than a sentinel integer,
//! so the three policies are explicit at every call site.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::data::{CoeffSeries, SnapshotSet};
use crate::error::{Result, SurrogateError};

/// Mode-truncation policy for the POD basis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Truncation {
    /// Keep as many modes as there are cumulative-energy entries at or below
    /// `tolerance`.
    ///
    /// The count includes every entry `<= tolerance` rather than stopping at
    /// the first entry that exceeds it; with a cumulative curve that jumps
    /// past the tolerance this keeps one mode fewer than an
    /// exceeds-threshold rule would. Long-standing selection behavior,
    /// retained as-is.
    Auto {
        /// Fraction of cumulative normalized energy to capture, in `(0, 1]`.
        tolerance: f64,
    },
    /// Keep every mode; the rank is `min(dof, n_grids · n_time)`.
    Full,
    /// Keep exactly `k` leading modes.
    Fixed {
        /// Number of modes to retain.
        k: usize,
    },
}

/// Truncated POD basis with spectral diagnostics.
///
/// Owns the `dof × rank` mode matrix `R` (columns are left singular vectors)
/// and the truncated singular values. Once computed the basis is shared
/// read-only by reconstruction and prediction; recompute it instead of
/// mutating it when the snapshots or truncation change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PodBasis {
    modes: DMatrix<f64>,
    singular_values: DVector<f64>,
    cumulative_energy: Vec<f64>,
}

impl PodBasis {
    /// Number of retained modes.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.modes.ncols()
    }

    /// Spatial degrees of freedom.
    #[must_use]
    pub fn n_dof(&self) -> usize {
        self.modes.nrows()
    }

    /// The `dof × rank` orthonormal mode matrix.
    #[must_use]
    pub fn modes(&self) -> &DMatrix<f64> {
        &self.modes
    }

    /// Singular values truncated to the retained rank.
    #[must_use]
    pub fn singular_values(&self) -> &DVector<f64> {
        &self.singular_values
    }

    /// Full cumulative normalized energy curve (diagnostic).
    ///
    /// Non-decreasing, with the final entry equal to 1 up to rounding.
    #[must_use]
    pub fn cumulative_energy(&self) -> &[f64] {
        &self.cumulative_energy
    }

    /// Fraction of total energy captured by the retained modes.
    #[must_use]
    pub fn captured_energy(&self) -> f64 {
        if self.rank() == 0 {
            0.0
        } else {
            self.cumulative_energy[self.rank() - 1]
        }
    }

    /// Projects a `dof × time` snapshot block onto the basis: `Rᵀ · X`.
    ///
    /// # Errors
    ///
    /// Returns [`SurrogateError::ShapeMismatch`] if the dof count differs
    /// from the basis.
    pub fn project(&self, snapshots: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        if snapshots.nrows() != self.n_dof() {
            return Err(SurrogateError::ShapeMismatch {
                expected: vec![self.n_dof()],
                actual: vec![snapshots.nrows()],
            });
        }
        Ok(self.modes.transpose() * snapshots)
    }

    /// Reconstructs snapshots from coefficients: `R · coeffs`.
    ///
    /// Exact matrix product; the only approximation is whatever the
    /// truncation already discarded.
    ///
    /// # Errors
    ///
    /// Returns [`SurrogateError::ShapeMismatch`] if the coefficient row count
    /// differs from the basis rank.
    pub fn reconstruct(&self, coeffs: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        if coeffs.nrows() != self.rank() {
            return Err(SurrogateError::ShapeMismatch {
                expected: vec![self.rank()],
                actual: vec![coeffs.nrows()],
            });
        }
        Ok(&self.modes * coeffs)
    }
}

/// Computes POD coefficients and the truncated basis for a snapshot set.
///
/// All subgrids are stacked column-wise and decomposed with one SVD; the
/// coefficient series holds `Rᵀ · grid` for each subgrid, with
/// `rank × n_time` coefficients per grid.
///
/// # Errors
///
/// - [`SurrogateError::SvdFailed`] if the decomposition does not converge.
/// - [`SurrogateError::EmptyInput`] if every singular value is zero (the
///   normalized energy curve would be undefined).
/// - [`SurrogateError::InvalidConfig`] if [`Truncation::Fixed`] requests more
///   modes than the decomposition provides.
pub fn compute_pod(
    snapshots: &SnapshotSet,
    truncation: Truncation,
) -> Result<(CoeffSeries, PodBasis)> {
    let n_dof = snapshots.n_dof();
    let n_time = snapshots.n_time();
    let n_grids = snapshots.n_grids();

    let mut stacked = DMatrix::<f64>::zeros(n_dof, n_grids * n_time);
    for (i, grid) in snapshots.grids().iter().enumerate() {
        stacked.columns_mut(i * n_time, n_time).copy_from(grid);
    }

    let svd = stacked
        .try_svd(true, false, f64::EPSILON, 0)
        .ok_or_else(|| SurrogateError::SvdFailed("iteration did not converge".into()))?;
    let u = svd
        .u
        .ok_or_else(|| SurrogateError::SvdFailed("left singular vectors unavailable".into()))?;
    let s = svd.singular_values;

    let cumulative = cumulative_energy(&s)?;
    let rank = match truncation {
        Truncation::Auto { tolerance } => cumulative.iter().filter(|&&c| c <= tolerance).count(),
        Truncation::Full => s.len(),
        Truncation::Fixed { k } => {
            if k > s.len() {
                return Err(SurrogateError::InvalidConfig(format!(
                    "requested {k} modes but the decomposition has rank {}",
                    s.len()
                )));
            }
            k
        }
    };

    let basis = PodBasis {
        modes: u.columns(0, rank).into_owned(),
        singular_values: s.rows(0, rank).into_owned(),
        cumulative_energy: cumulative,
    };

    tracing::debug!(
        rank,
        captured_energy = basis.captured_energy(),
        "computed POD basis"
    );

    let coeffs = snapshots
        .grids()
        .iter()
        .map(|grid| basis.project(grid))
        .collect::<Result<Vec<_>>>()?;

    Ok((CoeffSeries::new(coeffs)?, basis))
}

/// Reconstructs a snapshot block from coefficients and a basis.
///
/// Free-function form of [`PodBasis::reconstruct`].
pub fn reconstruct_pod(coeffs: &DMatrix<f64>, basis: &PodBasis) -> Result<DMatrix<f64>> {
    basis.reconstruct(coeffs)
}

/// Cumulative normalized energy of a singular-value vector.
///
/// Running sum of the raw singular values divided by their total; the curve
/// is non-decreasing and ends at 1.
fn cumulative_energy(singular_values: &DVector<f64>) -> Result<Vec<f64>> {
    let total: f64 = singular_values.iter().sum();
    if total <= 0.0 {
        return Err(SurrogateError::EmptyInput(
            "all singular values are zero".into(),
        ));
    }
    let mut running = 0.0;
    Ok(singular_values
        .iter()
        .map(|&s| {
            running += s;
            running / total
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn random_snapshots(n_grids: usize, n_dof: usize, n_time: usize, seed: u64) -> SnapshotSet {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let grids = (0..n_grids)
            .map(|_| DMatrix::from_fn(n_dof, n_time, |_, _| rng.gen::<f64>() - 0.5))
            .collect();
        SnapshotSet::new(grids).unwrap()
    }

    #[test]
    fn full_rank_round_trip() {
        let snapshots = random_snapshots(3, 12, 6, 7);
        let (coeffs, basis) = compute_pod(&snapshots, Truncation::Full).unwrap();

        for (grid, coeff) in snapshots.grids().iter().zip(coeffs.grids()) {
            let rebuilt = reconstruct_pod(coeff, &basis).unwrap();
            let err = (grid - &rebuilt).abs().max();
            assert!(err < 1e-8, "round-trip error {err}");
        }
    }

    #[test]
    fn full_rank_equals_min_dimension() {
        let tall = random_snapshots(2, 20, 3, 1);
        let (_, basis) = compute_pod(&tall, Truncation::Full).unwrap();
        assert_eq!(basis.rank(), 6); // min(20, 2 * 3)

        let wide = random_snapshots(4, 5, 10, 2);
        let (_, basis) = compute_pod(&wide, Truncation::Full).unwrap();
        assert_eq!(basis.rank(), 5); // min(5, 40)
    }

    #[test]
    fn fixed_truncation_yields_exact_rank() {
        let snapshots = random_snapshots(3, 16, 8, 3);
        let (coeffs, basis) = compute_pod(&snapshots, Truncation::Fixed { k: 5 }).unwrap();
        assert_eq!(basis.rank(), 5);
        assert_eq!(basis.singular_values().len(), 5);
        for grid in coeffs.grids() {
            assert_eq!(grid.nrows(), 5);
            assert_eq!(grid.ncols(), 8);
        }
    }

    #[test]
    fn fixed_truncation_rejects_excess_rank() {
        let snapshots = random_snapshots(2, 6, 4, 4);
        let result = compute_pod(&snapshots, Truncation::Fixed { k: 100 });
        assert!(matches!(result, Err(SurrogateError::InvalidConfig(_))));
    }

    #[test]
    fn cumulative_energy_is_monotone_and_normalized() {
        let snapshots = random_snapshots(2, 10, 8, 5);
        let (_, basis) = compute_pod(&snapshots, Truncation::Full).unwrap();
        let curve = basis.cumulative_energy();
        for pair in curve.windows(2) {
            assert!(pair[1] >= pair[0] - 1e-12);
        }
        assert!((curve[curve.len() - 1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn auto_truncation_counts_entries_within_tolerance() {
        let snapshots = random_snapshots(3, 10, 6, 6);
        let tolerance = 0.9;
        let (_, full) = compute_pod(&snapshots, Truncation::Full).unwrap();
        let expected = full
            .cumulative_energy()
            .iter()
            .filter(|&&c| c <= tolerance)
            .count();

        let (_, auto) = compute_pod(&snapshots, Truncation::Auto { tolerance }).unwrap();
        assert_eq!(auto.rank(), expected);
        assert!(auto.rank() < full.rank());
    }

    #[test]
    fn zero_snapshots_are_rejected() {
        let grids = vec![DMatrix::zeros(4, 3), DMatrix::zeros(4, 3)];
        let snapshots = SnapshotSet::new(grids).unwrap();
        let result = compute_pod(&snapshots, Truncation::Full);
        assert!(matches!(result, Err(SurrogateError::EmptyInput(_))));
    }

    #[test]
    fn projection_rejects_wrong_dof() {
        let snapshots = random_snapshots(2, 8, 4, 8);
        let (_, basis) = compute_pod(&snapshots, Truncation::Full).unwrap();
        let wrong = DMatrix::<f64>::zeros(9, 4);
        assert!(matches!(
            basis.project(&wrong),
            Err(SurrogateError::ShapeMismatch { .. })
        ));
    }
}
