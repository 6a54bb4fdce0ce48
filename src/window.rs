//! Time-series windowing of POD coefficient sequences.
//!
//! The coefficient stack `(n_grids, n_vars, n_time)` is split by a stride
//! `interval` into phase-offset sub-sequences. Within each phase, every
//! interior grid contributes one supervised pair per consecutive-timestep
//! transition:
//!
//! - the input window stacks the coefficients of grids `i-1`, `i`, `i+1`
//!   into a `3·n_vars` vector, where the flanking blocks carry the *next*
//!   time level (the most recent known neighbor values) and only the central
//!   block keeps the current one;
//! - the target is the central grid's coefficient vector at the next time
//!   level.
//!
//! Boundary grids are context only, never prediction targets. Pairs from all
//! grids and phases are concatenated into one flat dataset; consumers must
//! not rely on any ordering beyond `inputs[j]` pairing with `targets[j]`.

use nalgebra::DMatrix;

use crate::data::CoeffSeries;
use crate::error::{Result, SurrogateError};

/// Supervised training pairs; rows are samples.
#[derive(Debug, Clone)]
pub struct WindowedDataset {
    inputs: DMatrix<f64>,
    targets: DMatrix<f64>,
}

impl WindowedDataset {
    /// Input windows, `n_samples × 3·n_vars`.
    #[must_use]
    pub fn inputs(&self) -> &DMatrix<f64> {
        &self.inputs
    }

    /// Targets, `n_samples × n_vars`.
    #[must_use]
    pub fn targets(&self) -> &DMatrix<f64> {
        &self.targets
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inputs.nrows()
    }

    /// Whether the dataset is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inputs.nrows() == 0
    }

    /// Length of one input window.
    #[must_use]
    pub fn window_dim(&self) -> usize {
        self.inputs.ncols()
    }

    /// Length of one target vector.
    #[must_use]
    pub fn target_dim(&self) -> usize {
        self.targets.ncols()
    }

    /// Number of full batches of `batch_size`; the trailing partial batch is
    /// dropped.
    #[must_use]
    pub fn n_batches(&self, batch_size: usize) -> usize {
        if batch_size == 0 {
            0
        } else {
            self.len() / batch_size
        }
    }

    /// Iterates over fixed-size mini-batches in sample order.
    ///
    /// # Errors
    ///
    /// Returns [`SurrogateError::InvalidConfig`] when `batch_size` is zero.
    pub fn batches(&self, batch_size: usize) -> Result<Batches<'_>> {
        if batch_size == 0 {
            return Err(SurrogateError::InvalidConfig(
                "batch size must be at least 1".into(),
            ));
        }
        Ok(Batches {
            dataset: self,
            batch_size,
            cursor: 0,
        })
    }
}

/// Iterator over `(inputs, targets)` mini-batches.
#[derive(Debug)]
pub struct Batches<'a> {
    dataset: &'a WindowedDataset,
    batch_size: usize,
    cursor: usize,
}

impl Iterator for Batches<'_> {
    type Item = (DMatrix<f64>, DMatrix<f64>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor + self.batch_size > self.dataset.len() {
            return None;
        }
        let x = self
            .dataset
            .inputs
            .rows(self.cursor, self.batch_size)
            .into_owned();
        let y = self
            .dataset
            .targets
            .rows(self.cursor, self.batch_size)
            .into_owned();
        self.cursor += self.batch_size;
        Some((x, y))
    }
}

/// Builds supervised pairs from a coefficient series.
///
/// # Errors
///
/// - [`SurrogateError::InvalidConfig`] when `interval` is zero.
/// - [`SurrogateError::InsufficientGrids`] with fewer than 3 grids (at least
///   one interior grid is required).
/// - [`SurrogateError::InsufficientTimesteps`] when no phase retains at
///   least 2 time samples after striding.
pub fn window_series(series: &CoeffSeries, interval: usize) -> Result<WindowedDataset> {
    if interval == 0 {
        return Err(SurrogateError::InvalidConfig(
            "stride interval must be at least 1".into(),
        ));
    }
    let n_grids = series.n_grids();
    if n_grids < 3 {
        return Err(SurrogateError::InsufficientGrids {
            required: 3,
            actual: n_grids,
        });
    }
    let n_vars = series.n_vars();

    let mut phases = Vec::with_capacity(interval);
    let mut total = 0usize;
    let mut max_samples = 0usize;
    for phase in 0..interval {
        let strided = series.strided(interval, phase)?;
        let samples = strided.n_time();
        max_samples = max_samples.max(samples);
        if samples >= 2 {
            total += (n_grids - 2) * (samples - 1);
        }
        phases.push(strided);
    }
    if total == 0 {
        return Err(SurrogateError::InsufficientTimesteps {
            required: 2,
            actual: max_samples,
        });
    }

    let mut inputs = DMatrix::<f64>::zeros(total, 3 * n_vars);
    let mut targets = DMatrix::<f64>::zeros(total, n_vars);
    let mut row = 0usize;
    for strided in &phases {
        let samples = strided.n_time();
        if samples < 2 {
            continue;
        }
        for i in 1..n_grids - 1 {
            let prev = strided.grid(i - 1);
            let cur = strided.grid(i);
            let next = strided.grid(i + 1);
            for t in 0..samples - 1 {
                for v in 0..n_vars {
                    // Flanking context is the most recent known neighbor
                    // state; only the central block keeps the current level.
                    inputs[(row, v)] = prev[(v, t + 1)];
                    inputs[(row, n_vars + v)] = cur[(v, t)];
                    inputs[(row, 2 * n_vars + v)] = next[(v, t + 1)];
                    targets[(row, v)] = cur[(v, t + 1)];
                }
                row += 1;
            }
        }
    }
    debug_assert_eq!(row, total);

    Ok(WindowedDataset { inputs, targets })
}
