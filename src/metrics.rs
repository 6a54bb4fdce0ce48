//! Epoch-level training metrics and the sink abstraction.
//!
//! The trainer emits one [`EpochMetrics`] record per epoch to a
//! [`MetricsSink`]. Sinks are external collaborators (dashboards, experiment
//! trackers, files); a sink failure is logged and swallowed by the trainer so
//! a flaky logger can never abort a training run.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Scalar losses for one training epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Epoch index (0-based).
    pub epoch: usize,
    /// Batch-averaged discriminator loss on the training set.
    pub d_train_loss: f64,
    /// Update-averaged combined generator loss on the training set.
    pub g_train_loss: f64,
    /// Batch-averaged discriminator loss on the validation set, if one was
    /// supplied.
    pub d_valid_loss: Option<f64>,
    /// Batch-averaged generator loss on the validation set, if one was
    /// supplied.
    pub g_valid_loss: Option<f64>,
}

impl std::fmt::Display for EpochMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "epoch {} | d: {:.6} | g: {:.6}",
            self.epoch, self.d_train_loss, self.g_train_loss
        )?;
        if let (Some(d), Some(g)) = (self.d_valid_loss, self.g_valid_loss) {
            write!(f, " | d_val: {d:.6} | g_val: {g:.6}")?;
        }
        Ok(())
    }
}

/// Receives named scalar losses keyed by epoch.
///
/// Implementations may forward to any logging or visualization backend.
/// Errors returned from [`MetricsSink::record_epoch`] are reported via
/// `tracing` by the trainer and otherwise ignored.
pub trait MetricsSink {
    /// Records the metrics of one completed epoch.
    fn record_epoch(&mut self, metrics: &EpochMetrics) -> Result<()>;
}

/// In-memory metrics collector.
#[derive(Debug, Default, Clone)]
pub struct MetricsHistory {
    epochs: Vec<EpochMetrics>,
}

impl MetricsHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded epochs, in order.
    #[must_use]
    pub fn epochs(&self) -> &[EpochMetrics] {
        &self.epochs
    }

    /// The most recent epoch, if any.
    #[must_use]
    pub fn last(&self) -> Option<&EpochMetrics> {
        self.epochs.last()
    }

    /// Number of recorded epochs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    /// Whether no epochs have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }
}

impl MetricsSink for MetricsHistory {
    fn record_epoch(&mut self, metrics: &EpochMetrics) -> Result<()> {
        self.epochs.push(*metrics);
        Ok(())
    }
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl MetricsSink for NullSink {
    fn record_epoch(&mut self, _metrics: &EpochMetrics) -> Result<()> {
        Ok(())
    }
}
