//! Collaborator seam for the adversarial autoencoder.
//!
//! The encoder, decoder, and discriminator are opaque differentiable models
//! supplied by the caller; this crate never constructs network layers. One
//! object implementing [`AdversarialAutoencoder`] wires all three together —
//! encoder and decoder composed into the generator, discriminator judging
//! latent codes — and performs its own parameter updates when the trainer
//! calls the `train_*` methods. All wiring belongs in the implementor's
//! constructor; there is no separate compile or late-binding step.
//!
//! Tensor-shape contracts (`B` = batch size):
//!
//! - `encode`:        `B × window_dim`  →  `B × latent_dim`
//! - `forward`:       `B × window_dim`  →  `B × output_dim` (decode ∘ encode)
//! - `discriminate`:  `B × latent_dim`  →  `B` probabilities in `[0, 1]`
//!
//! During the combined generator update the discriminator participates with
//! frozen weights: only the encoder and decoder parameters move.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::config::GridSpacing;
use crate::error::{Result, SurrogateError};

/// Weighting of the combined generator objective.
///
/// The generator loss is
/// `reconstruction · err(decode(encode(x)), y) + adversarial · bce(disc(encode(x)), labels)`,
/// where `err` is the (optionally feature-weighted) mean squared error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LossWeights {
    /// Weight of the reconstruction term.
    pub reconstruction: f64,
    /// Weight of the adversarial term.
    pub adversarial: f64,
    /// Optional per-feature weights applied inside the reconstruction error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_weights: Option<Vec<f64>>,
}

impl Default for LossWeights {
    fn default() -> Self {
        Self {
            reconstruction: 0.999,
            adversarial: 0.001,
            feature_weights: None,
        }
    }
}

impl LossWeights {
    /// Validates the weighting.
    ///
    /// # Errors
    ///
    /// Returns [`SurrogateError::InvalidConfig`] for negative weights or an
    /// all-zero combination.
    pub fn validate(&self) -> Result<()> {
        if self.reconstruction < 0.0 || self.adversarial < 0.0 {
            return Err(SurrogateError::InvalidConfig(
                "loss weights must be non-negative".into(),
            ));
        }
        if self.reconstruction + self.adversarial <= 0.0 {
            return Err(SurrogateError::InvalidConfig(
                "at least one loss weight must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// An adversarial autoencoder as seen by the trainer and the predictor.
///
/// A note on naming: throughout the training loop, *fake* latents are the
/// encoder's outputs on real input windows, while *real* latents are draws
/// from the unit Gaussian prior. This matches adversarial-autoencoder
/// convention (the discriminator learns to recognize the prior) and is the
/// inverse of typical GAN naming.
pub trait AdversarialAutoencoder {
    /// Dimension of the latent code.
    fn latent_dim(&self) -> usize;

    /// Dimension of an input window.
    fn window_dim(&self) -> usize;

    /// Encodes a batch of input windows into latent codes.
    fn encode(&self, windows: &DMatrix<f64>) -> Result<DMatrix<f64>>;

    /// Full generator pass: decode the encoding of `windows`.
    fn forward(&self, windows: &DMatrix<f64>) -> Result<DMatrix<f64>>;

    /// Discriminator probabilities for a batch of latent codes.
    fn discriminate(&self, latents: &DMatrix<f64>) -> Result<DVector<f64>>;

    /// One discriminator gradient update on `(latents, labels)` with binary
    /// cross-entropy; returns the pre-update loss.
    ///
    /// Labels are 1 for prior samples and 0 for encoder outputs.
    fn train_discriminator(&mut self, latents: &DMatrix<f64>, labels: &DVector<f64>)
        -> Result<f64>;

    /// Discriminator binary cross-entropy without a weight update.
    fn evaluate_discriminator(&self, latents: &DMatrix<f64>, labels: &DVector<f64>) -> Result<f64>;

    /// One combined generator update: weighted reconstruction error against
    /// `targets` plus the adversarial term that pushes `discriminate(encode(x))`
    /// toward `labels`, with the discriminator frozen. Returns the combined
    /// loss.
    fn train_generator(
        &mut self,
        windows: &DMatrix<f64>,
        targets: &DMatrix<f64>,
        labels: &DVector<f64>,
        weights: &LossWeights,
    ) -> Result<f64>;

    /// Combined generator loss without a weight update.
    fn evaluate_generator(
        &self,
        windows: &DMatrix<f64>,
        targets: &DMatrix<f64>,
        labels: &DVector<f64>,
        weights: &LossWeights,
    ) -> Result<f64>;
}

/// Mean squared error with optional per-feature weights.
///
/// With weights `w`, the error is `mean((w_j · (p_ij - t_ij))²)`; without,
/// the plain MSE. Shared definition so trait implementors and the validator
/// agree on the metric.
///
/// # Errors
///
/// Returns [`SurrogateError::ShapeMismatch`] on inconsistent shapes.
pub fn weighted_mse(
    predicted: &DMatrix<f64>,
    target: &DMatrix<f64>,
    feature_weights: Option<&[f64]>,
) -> Result<f64> {
    if predicted.shape() != target.shape() {
        return Err(SurrogateError::ShapeMismatch {
            expected: vec![target.nrows(), target.ncols()],
            actual: vec![predicted.nrows(), predicted.ncols()],
        });
    }
    if let Some(weights) = feature_weights {
        if weights.len() != predicted.ncols() {
            return Err(SurrogateError::ShapeMismatch {
                expected: vec![predicted.ncols()],
                actual: vec![weights.len()],
            });
        }
    }
    let n = (predicted.nrows() * predicted.ncols()) as f64;
    if n == 0.0 {
        return Err(SurrogateError::EmptyInput("mse over empty matrices".into()));
    }
    let mut sum = 0.0;
    for r in 0..predicted.nrows() {
        for c in 0..predicted.ncols() {
            let w = feature_weights.map_or(1.0, |weights| weights[c]);
            let diff = w * (predicted[(r, c)] - target[(r, c)]);
            sum += diff * diff;
        }
    }
    Ok(sum / n)
}

/// Mean binary cross-entropy of probabilities against `{0, 1}` labels.
///
/// Probabilities are clamped away from 0 and 1 before taking logs.
///
/// # Errors
///
/// Returns [`SurrogateError::ShapeMismatch`] on length mismatch and
/// [`SurrogateError::EmptyInput`] for empty batches.
pub fn binary_cross_entropy(probs: &DVector<f64>, labels: &DVector<f64>) -> Result<f64> {
    if probs.len() != labels.len() {
        return Err(SurrogateError::ShapeMismatch {
            expected: vec![labels.len()],
            actual: vec![probs.len()],
        });
    }
    if probs.is_empty() {
        return Err(SurrogateError::EmptyInput(
            "cross-entropy over an empty batch".into(),
        ));
    }
    const EPS: f64 = 1e-12;
    let mut sum = 0.0;
    for (p, y) in probs.iter().zip(labels.iter()) {
        let p = p.clamp(EPS, 1.0 - EPS);
        sum -= y * p.ln() + (1.0 - y) * (1.0 - p).ln();
    }
    Ok(sum / probs.len() as f64)
}

/// Continuity-equation penalty over 2-D velocity reconstructions.
///
/// Accumulates the central-difference divergence
/// `∂u/∂x + ∂v/∂y` over every interior node of every sample and returns the
/// absolute value of the mean. Implementors of the physics-informed loss add
/// this to the reconstruction error.
#[derive(Debug, Clone, Copy)]
pub struct ContinuityPenalty {
    dx: f64,
    dy: f64,
}

impl ContinuityPenalty {
    /// Creates the penalty from grid spacing; spacing must be set and
    /// positive before any loss is evaluated.
    ///
    /// # Errors
    ///
    /// Returns [`SurrogateError::InvalidConfig`] for non-positive spacing.
    pub fn new(spacing: GridSpacing) -> Result<Self> {
        if spacing.dx <= 0.0 || spacing.dy <= 0.0 {
            return Err(SurrogateError::InvalidConfig(
                "grid spacing must be positive".into(),
            ));
        }
        Ok(Self {
            dx: spacing.dx,
            dy: spacing.dy,
        })
    }

    /// Penalty for a batch of `(u, v)` velocity component grids.
    ///
    /// # Errors
    ///
    /// Returns [`SurrogateError::ShapeMismatch`] if any pair disagrees in
    /// shape and [`SurrogateError::EmptyInput`] if no grid has interior
    /// nodes.
    pub fn penalty(&self, batch: &[(DMatrix<f64>, DMatrix<f64>)]) -> Result<f64> {
        let mut divergence = 0.0;
        let mut count = 0usize;
        for (u, v) in batch {
            if u.shape() != v.shape() {
                return Err(SurrogateError::ShapeMismatch {
                    expected: vec![u.nrows(), u.ncols()],
                    actual: vec![v.nrows(), v.ncols()],
                });
            }
            for i in 1..u.nrows().saturating_sub(1) {
                for j in 1..u.ncols().saturating_sub(1) {
                    divergence += (u[(i + 1, j)] - u[(i - 1, j)]) / (2.0 * self.dx)
                        + (v[(i, j + 1)] - v[(i, j - 1)]) / (2.0 * self.dy);
                    count += 1;
                }
            }
        }
        if count == 0 {
            return Err(SurrogateError::EmptyInput(
                "no interior nodes for the continuity penalty".into(),
            ));
        }
        Ok((divergence / count as f64).abs())
    }
}
