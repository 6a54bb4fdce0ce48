//! # pod-surrogate-rs
//!
//! Reduced-order surrogate modeling for fluid simulations: compress snapshot
//! data with Proper Orthogonal Decomposition, regularize an autoencoder's
//! latent space adversarially against a Gaussian prior, and time-step the
//! resulting model to forecast future coefficient states from boundary and
//! initial conditions.
//!
//! ## Pipeline
//!
//! ```text
//!  raw snapshots          POD coefficients         supervised pairs
//! ┌──────────────┐  SVD  ┌────────────────┐ window ┌───────────────┐
//! │ SnapshotSet  │──────▶│  CoeffSeries   │───────▶│WindowedDataset│
//! └──────────────┘       └────────────────┘        └───────┬───────┘
//!         │                       ▲                        │ train
//!         │ basis R               │ reconstruct            ▼
//!         ▼                       │                ┌───────────────┐
//! ┌──────────────┐                └────────────────│  Predictive   │
//! │   PodBasis   │◀────────────────────────────────│  Adversarial  │
//! └──────────────┘        rollout prediction       └───────────────┘
//! ```
//!
//! The encoder, decoder, and discriminator are opaque collaborators: any
//! differentiable models satisfying the [`model::AdversarialAutoencoder`]
//! shape contracts can be trained and rolled out. This crate supplies the
//! decomposition, the windowing, the adversarial training loop, validation,
//! rollout prediction, and artifact persistence — not network layers.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use pod_surrogate_rs::prelude::*;
//!
//! // Compress snapshots (one dof × time matrix per subgrid).
//! let snapshots = SnapshotSet::new(subgrids)?;
//! let (coeffs, basis) = compute_pod(&snapshots, Truncation::Fixed { k: 10 })?;
//!
//! // Train an adversarial surrogate on the coefficient series.
//! let config = TrainingConfig::default().with_epochs(500).with_interval(5);
//! let mut trainer = PredictiveAdversarial::new(my_model, config)?;
//! let mut history = MetricsHistory::new();
//! let report = trainer.train(&coeffs, None, &mut history)?;
//!
//! // Forecast interior grids from boundaries and initial values.
//! let predicted = trainer.predict(&boundary_coeffs, &init_values, 20, 5)?;
//! let fields = reconstruct_pod(predicted.grid(1), &basis)?;
//! ```
//!
//! ## Modules
//!
//! - [`config`] — immutable training configuration with TOML round-trip
//! - [`data`] — validated snapshot/coefficient containers and rescaling
//! - [`error`] — error types with distinguishable precondition variants
//! - [`pod`] — truncated SVD basis computation and reconstruction
//! - [`window`] — stride-phased supervised pair assembly and batching
//! - [`model`] — collaborator traits and shared loss definitions
//! - [`trainer`] — alternating adversarial training loop and validation
//! - [`rollout`] — multi-step fixed-point rollout prediction
//! - [`metrics`] — epoch metrics and sink abstraction
//! - [`persist`] — artifact directory persistence
//!
//! Everything runs single-threaded and synchronously; the POD basis and
//! trained weights are shared read-only after training completes.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod model;
pub mod persist;
pub mod pod;
pub mod rollout;
pub mod trainer;
pub mod window;

pub use config::{GridSpacing, TrainingConfig};
pub use data::{CoeffScaler, CoeffSeries, SnapshotSet};
pub use error::{Result, SurrogateError};
pub use metrics::{EpochMetrics, MetricsHistory, MetricsSink, NullSink};
pub use model::{
    binary_cross_entropy, weighted_mse, AdversarialAutoencoder, ContinuityPenalty, LossWeights,
};
pub use persist::{load_basis, save_artifacts, save_basis, ModelArtifacts};
pub use pod::{compute_pod, reconstruct_pod, PodBasis, Truncation};
pub use trainer::{PredictiveAdversarial, TrainingReport};
pub use window::{window_series, WindowedDataset};

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```
/// use pod_surrogate_rs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        compute_pod, reconstruct_pod, window_series, AdversarialAutoencoder, CoeffScaler,
        CoeffSeries, EpochMetrics, LossWeights, MetricsHistory, MetricsSink, NullSink, PodBasis,
        PredictiveAdversarial, Result, SnapshotSet, SurrogateError, TrainingConfig,
        TrainingReport, Truncation, WindowedDataset,
    };
}
