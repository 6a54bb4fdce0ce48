//! Validated container types for snapshot and coefficient data.
//!
//! All numerical state in the crate is `f64`. The containers here exist to
//! enforce the shape invariants once, at construction, so the numerical code
//! downstream can index without re-checking:
//!
//! - [`SnapshotSet`]: one dof × time matrix per subgrid, all sharing the same
//!   dof count and time length.
//! - [`CoeffSeries`]: one vars × time coefficient matrix per subgrid,
//!   produced by the POD projection and consumed by windowing, training, and
//!   rollout.
//! - [`CoeffScaler`]: per-variable min-max rescaling applied to coefficient
//!   series before training and inverted after prediction.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SurrogateError};

/// Ordered set of per-subgrid snapshot matrices.
///
/// Each subgrid is a `dof × time` matrix of scalar field values. Every
/// subgrid must share the same dof count and the same time length; violations
/// are rejected at construction rather than producing silently wrong output
/// downstream.
#[derive(Debug, Clone)]
pub struct SnapshotSet {
    grids: Vec<DMatrix<f64>>,
}

impl SnapshotSet {
    /// Builds a snapshot set, validating that all subgrids share one shape.
    ///
    /// # Errors
    ///
    /// Returns [`SurrogateError::EmptyInput`] for an empty list or zero-sized
    /// subgrids, and [`SurrogateError::ShapeMismatch`] if any subgrid differs
    /// in shape from the first.
    pub fn new(grids: Vec<DMatrix<f64>>) -> Result<Self> {
        let first = grids
            .first()
            .ok_or_else(|| SurrogateError::EmptyInput("snapshot set has no subgrids".into()))?;
        if first.nrows() == 0 || first.ncols() == 0 {
            return Err(SurrogateError::EmptyInput(
                "snapshot subgrids must be non-empty".into(),
            ));
        }
        let (n_dof, n_time) = first.shape();
        for grid in &grids {
            if grid.shape() != (n_dof, n_time) {
                return Err(SurrogateError::ShapeMismatch {
                    expected: vec![n_dof, n_time],
                    actual: vec![grid.nrows(), grid.ncols()],
                });
            }
        }
        Ok(Self { grids })
    }

    /// Number of subgrids.
    #[must_use]
    pub fn n_grids(&self) -> usize {
        self.grids.len()
    }

    /// Spatial degrees of freedom per subgrid.
    #[must_use]
    pub fn n_dof(&self) -> usize {
        self.grids[0].nrows()
    }

    /// Number of time levels per subgrid.
    #[must_use]
    pub fn n_time(&self) -> usize {
        self.grids[0].ncols()
    }

    /// The subgrid matrices, in order.
    #[must_use]
    pub fn grids(&self) -> &[DMatrix<f64>] {
        &self.grids
    }
}

/// Per-grid coefficient time series with shape `(n_grids, n_vars, n_time)`.
///
/// Stored as one `n_vars × n_time` matrix per subgrid. Derived data: a series
/// is recomputed whenever the basis or the input snapshots change, never
/// mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoeffSeries {
    grids: Vec<DMatrix<f64>>,
}

impl CoeffSeries {
    /// Builds a coefficient series, validating that all grids share one shape.
    ///
    /// # Errors
    ///
    /// Returns [`SurrogateError::EmptyInput`] for an empty list and
    /// [`SurrogateError::ShapeMismatch`] on inconsistent grid shapes.
    pub fn new(grids: Vec<DMatrix<f64>>) -> Result<Self> {
        let first = grids
            .first()
            .ok_or_else(|| SurrogateError::EmptyInput("coefficient series has no grids".into()))?;
        let (n_vars, n_time) = first.shape();
        for grid in &grids {
            if grid.shape() != (n_vars, n_time) {
                return Err(SurrogateError::ShapeMismatch {
                    expected: vec![n_vars, n_time],
                    actual: vec![grid.nrows(), grid.ncols()],
                });
            }
        }
        Ok(Self { grids })
    }

    /// Number of grids in the series.
    #[must_use]
    pub fn n_grids(&self) -> usize {
        self.grids.len()
    }

    /// Number of variables (coefficient rows) per grid.
    #[must_use]
    pub fn n_vars(&self) -> usize {
        self.grids[0].nrows()
    }

    /// Number of time levels per grid.
    #[must_use]
    pub fn n_time(&self) -> usize {
        self.grids[0].ncols()
    }

    /// The per-grid coefficient matrices, in order.
    #[must_use]
    pub fn grids(&self) -> &[DMatrix<f64>] {
        &self.grids
    }

    /// Coefficient matrix of a single grid.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn grid(&self, index: usize) -> &DMatrix<f64> {
        &self.grids[index]
    }

    /// Selects every `interval`-th time level starting at `phase`.
    ///
    /// The returned series has `ceil((n_time - phase) / interval)` time
    /// levels; zero when `phase >= n_time`.
    ///
    /// # Errors
    ///
    /// Returns [`SurrogateError::InvalidConfig`] when `interval` is zero.
    pub fn strided(&self, interval: usize, phase: usize) -> Result<CoeffSeries> {
        if interval == 0 {
            return Err(SurrogateError::InvalidConfig(
                "stride interval must be at least 1".into(),
            ));
        }
        let n_time = self.n_time();
        let n_samples = if phase >= n_time {
            0
        } else {
            (n_time - phase).div_ceil(interval)
        };
        let grids = self
            .grids
            .iter()
            .map(|grid| {
                DMatrix::from_fn(grid.nrows(), n_samples, |r, t| grid[(r, phase + t * interval)])
            })
            .collect();
        Ok(CoeffSeries { grids })
    }
}

/// Per-variable min-max rescaling of coefficient series to the unit interval.
///
/// Fitted over all grids and time levels of a training series, then applied
/// to training and validation series alike; [`CoeffScaler::inverse_transform`]
/// maps rollout predictions back to the original coefficient range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoeffScaler {
    min: Vec<f64>,
    max: Vec<f64>,
}

impl CoeffScaler {
    /// Fits the per-variable range over every grid and time level.
    pub fn fit(series: &CoeffSeries) -> Result<Self> {
        let n_vars = series.n_vars();
        if series.n_time() == 0 {
            return Err(SurrogateError::EmptyInput(
                "cannot fit a scaler on a series with no time levels".into(),
            ));
        }
        let mut min = vec![f64::INFINITY; n_vars];
        let mut max = vec![f64::NEG_INFINITY; n_vars];
        for grid in series.grids() {
            for r in 0..n_vars {
                for c in 0..grid.ncols() {
                    let value = grid[(r, c)];
                    min[r] = min[r].min(value);
                    max[r] = max[r].max(value);
                }
            }
        }
        Ok(Self { min, max })
    }

    /// Maps each variable into `[0, 1]` using the fitted range.
    ///
    /// A variable with zero range maps to 0.
    pub fn transform(&self, series: &CoeffSeries) -> Result<CoeffSeries> {
        self.apply(series, |value, min, range| (value - min) / range)
    }

    /// Inverts [`CoeffScaler::transform`].
    pub fn inverse_transform(&self, series: &CoeffSeries) -> Result<CoeffSeries> {
        self.apply(series, |value, min, range| value * range + min)
    }

    fn apply(
        &self,
        series: &CoeffSeries,
        op: impl Fn(f64, f64, f64) -> f64,
    ) -> Result<CoeffSeries> {
        if series.n_vars() != self.min.len() {
            return Err(SurrogateError::ShapeMismatch {
                expected: vec![self.min.len()],
                actual: vec![series.n_vars()],
            });
        }
        let grids = series
            .grids()
            .iter()
            .map(|grid| {
                DMatrix::from_fn(grid.nrows(), grid.ncols(), |r, c| {
                    let range = self.max[r] - self.min[r];
                    let range = if range == 0.0 { 1.0 } else { range };
                    op(grid[(r, c)], self.min[r], range)
                })
            })
            .collect();
        CoeffSeries::new(grids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[&[f64]]) -> CoeffSeries {
        let grids = values
            .iter()
            .map(|row| DMatrix::from_row_slice(1, row.len(), row))
            .collect();
        CoeffSeries::new(grids).unwrap()
    }

    #[test]
    fn snapshot_set_rejects_mismatched_shapes() {
        let grids = vec![DMatrix::zeros(4, 10), DMatrix::zeros(4, 9)];
        let result = SnapshotSet::new(grids);
        assert!(matches!(result, Err(SurrogateError::ShapeMismatch { .. })));
    }

    #[test]
    fn snapshot_set_rejects_empty() {
        assert!(matches!(
            SnapshotSet::new(Vec::new()),
            Err(SurrogateError::EmptyInput(_))
        ));
    }

    #[test]
    fn strided_selects_phase_offsets() {
        let s = series(&[&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]]);

        let phase0 = s.strided(3, 0).unwrap();
        assert_eq!(phase0.n_time(), 3);
        assert_eq!(phase0.grid(0)[(0, 1)], 3.0);

        let phase2 = s.strided(3, 2).unwrap();
        assert_eq!(phase2.n_time(), 2);
        assert_eq!(phase2.grid(0)[(0, 1)], 5.0);
    }

    #[test]
    fn strided_past_end_is_empty() {
        let s = series(&[&[1.0, 2.0]]);
        assert_eq!(s.strided(1, 5).unwrap().n_time(), 0);
    }

    #[test]
    fn scaler_round_trips() {
        let s = series(&[&[-2.0, 0.0, 2.0], &[1.0, 3.0, 5.0]]);
        let scaler = CoeffScaler::fit(&s).unwrap();
        let scaled = scaler.transform(&s).unwrap();
        for grid in scaled.grids() {
            for &value in grid.iter() {
                assert!((0.0..=1.0).contains(&value));
            }
        }
        let restored = scaler.inverse_transform(&scaled).unwrap();
        for (a, b) in s.grids().iter().zip(restored.grids()) {
            assert!((a - b).abs().max() < 1e-12);
        }
    }

    #[test]
    fn scaler_handles_constant_variable() {
        let s = series(&[&[4.0, 4.0, 4.0]]);
        let scaler = CoeffScaler::fit(&s).unwrap();
        let scaled = scaler.transform(&s).unwrap();
        assert_eq!(scaled.grid(0)[(0, 0)], 0.0);
    }
}
