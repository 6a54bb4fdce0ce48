//! Adversarial training loop over windowed coefficient pairs.
//!
//! [`PredictiveAdversarial`] owns the model collaborator and a seeded RNG and
//! drives the epoch/batch state machine:
//!
//! 1. Per batch, encode the real input windows (`latent_fake` — the encoder's
//!    output on real data) and draw a reference sample from the unit Gaussian
//!    prior (`latent_real`).
//! 2. Discriminator step every batch: one update on the prior draw labelled
//!    valid, one on the encoder output labelled fake; the batch loss is the
//!    simple average of the two.
//! 3. Combined generator step on every `n_discriminator`-th batch (cadence
//!    control that keeps the discriminator from dominating): weighted
//!    reconstruction toward the central-block target plus the adversarial
//!    term that rewards fooling the discriminator.
//!
//! Epoch losses are the running sums normalized by the respective update
//! counts, emitted to the metrics sink keyed by epoch. Alternation is
//! structural: each update runs to completion before the next begins, and
//! nothing here retries or checkpoints mid-epoch — a failing batch aborts
//! the whole training call.

use nalgebra::{DMatrix, DVector};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::config::TrainingConfig;
use crate::data::CoeffSeries;
use crate::error::{Result, SurrogateError};
use crate::metrics::{EpochMetrics, MetricsSink};
use crate::model::AdversarialAutoencoder;
use crate::rollout;
use crate::window::{self, WindowedDataset};

/// Summary of a completed training run.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    /// Per-epoch losses, in order.
    pub epochs: Vec<EpochMetrics>,
    /// Number of supervised pairs in the training set.
    pub n_samples: usize,
    /// Full batches per epoch.
    pub n_batches: usize,
}

impl TrainingReport {
    /// Discriminator loss of the final epoch.
    #[must_use]
    pub fn final_d_loss(&self) -> Option<f64> {
        self.epochs.last().map(|m| m.d_train_loss)
    }

    /// Generator loss of the final epoch.
    #[must_use]
    pub fn final_g_loss(&self) -> Option<f64> {
        self.epochs.last().map(|m| m.g_train_loss)
    }
}

/// Trainer and predictor for an adversarial latent surrogate.
///
/// Single-threaded and synchronous: gradient steps, evaluation steps, and
/// rollout passes run strictly in sequence, so the discriminator and the
/// generator are never updated concurrently by construction.
pub struct PredictiveAdversarial<M: AdversarialAutoencoder> {
    model: M,
    config: TrainingConfig,
    rng: ChaCha8Rng,
}

impl<M: AdversarialAutoencoder> PredictiveAdversarial<M> {
    /// Creates a trainer, validating the configuration up front.
    ///
    /// # Errors
    ///
    /// Returns [`SurrogateError::InvalidConfig`] for an invalid
    /// configuration.
    pub fn new(model: M, config: TrainingConfig) -> Result<Self> {
        config.validate()?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Ok(Self { model, config, rng })
    }

    /// The wrapped model collaborator.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Mutable access to the wrapped model collaborator.
    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Consumes the trainer, returning the trained model.
    pub fn into_model(self) -> M {
        self.model
    }

    /// Trains the model on a coefficient series.
    ///
    /// The series is windowed with the configured stride; an optional
    /// validation series is windowed the same way and evaluated once per
    /// epoch. Metrics are pushed to `sink` keyed by epoch; a sink failure is
    /// logged and ignored.
    ///
    /// # Errors
    ///
    /// Precondition violations from windowing propagate unchanged. Training
    /// aborts with [`SurrogateError::NumericalInstability`] when an epoch
    /// loss turns non-finite, and with whatever error a model collaborator
    /// reports from a failed batch. Partial epoch progress is not persisted.
    pub fn train<S: MetricsSink>(
        &mut self,
        coeffs: &CoeffSeries,
        val_coeffs: Option<&CoeffSeries>,
        sink: &mut S,
    ) -> Result<TrainingReport> {
        let dataset = window::window_series(coeffs, self.config.interval)?;
        let val_dataset = val_coeffs
            .map(|v| window::window_series(v, self.config.interval))
            .transpose()?;

        if dataset.window_dim() != self.model.window_dim() {
            return Err(SurrogateError::ShapeMismatch {
                expected: vec![self.model.window_dim()],
                actual: vec![dataset.window_dim()],
            });
        }
        let n_batches = dataset.n_batches(self.config.batch_size);
        if n_batches == 0 {
            return Err(SurrogateError::EmptyInput(format!(
                "{} samples cannot fill one batch of {}",
                dataset.len(),
                self.config.batch_size
            )));
        }

        tracing::info!(
            samples = dataset.len(),
            batches = n_batches,
            epochs = self.config.epochs,
            latent_dim = self.model.latent_dim(),
            "starting adversarial training"
        );

        let batch_size = self.config.batch_size;
        let valid = DVector::from_element(batch_size, 1.0);
        let fake = DVector::from_element(batch_size, 0.0);

        let mut epochs = Vec::with_capacity(self.config.epochs);
        for epoch in 0..self.config.epochs {
            let mut d_loss_cum = 0.0;
            let mut g_loss_cum = 0.0;
            let mut g_steps = 0usize;

            for (step, (x, y)) in dataset.batches(batch_size)?.enumerate() {
                let latent_fake = self.model.encode(&x)?;
                let latent_real = self.sample_prior(batch_size);

                let d_loss_real = self.model.train_discriminator(&latent_real, &valid)?;
                let d_loss_fake = self.model.train_discriminator(&latent_fake, &fake)?;
                d_loss_cum += 0.5 * (d_loss_real + d_loss_fake);

                if step % self.config.n_discriminator == 0 {
                    g_loss_cum +=
                        self.model
                            .train_generator(&x, &y, &valid, &self.config.loss_weights)?;
                    g_steps += 1;
                }
            }

            let d_loss = d_loss_cum / n_batches as f64;
            let g_loss = if g_steps > 0 {
                g_loss_cum / g_steps as f64
            } else {
                0.0
            };
            if !d_loss.is_finite() || !g_loss.is_finite() {
                return Err(SurrogateError::NumericalInstability {
                    epoch,
                    detail: format!("d_loss={d_loss}, g_loss={g_loss}"),
                });
            }

            let (d_valid_loss, g_valid_loss) = match &val_dataset {
                Some(val) => {
                    let (d, g) = self.evaluate_windows(val)?;
                    (Some(d), Some(g))
                }
                None => (None, None),
            };

            let metrics = EpochMetrics {
                epoch,
                d_train_loss: d_loss,
                g_train_loss: g_loss,
                d_valid_loss,
                g_valid_loss,
            };
            if let Err(err) = sink.record_epoch(&metrics) {
                tracing::warn!(epoch, "metrics sink rejected epoch: {err}");
            }
            tracing::debug!(epoch, d_loss, g_loss, "epoch complete");
            epochs.push(metrics);
        }

        Ok(TrainingReport {
            epochs,
            n_samples: dataset.len(),
            n_batches,
        })
    }

    /// Evaluates held-out losses on an unseen coefficient series.
    ///
    /// Evaluation-only analog of the training loop: the same windowing
    /// convention and the same prior-versus-encoder contrastive scheme, no
    /// weight updates, losses averaged over all full batches.
    ///
    /// # Errors
    ///
    /// Propagates windowing precondition violations and collaborator
    /// failures; an empty batched dataset is [`SurrogateError::EmptyInput`].
    pub fn validate(&mut self, coeffs: &CoeffSeries) -> Result<(f64, f64)> {
        let dataset = window::window_series(coeffs, self.config.interval)?;
        self.evaluate_windows(&dataset)
    }

    fn evaluate_windows(&mut self, dataset: &WindowedDataset) -> Result<(f64, f64)> {
        let batch_size = self.config.val_batch_size;
        let n_batches = dataset.n_batches(batch_size);
        if n_batches == 0 {
            return Err(SurrogateError::EmptyInput(format!(
                "{} validation samples cannot fill one batch of {batch_size}",
                dataset.len()
            )));
        }
        let valid = DVector::from_element(batch_size, 1.0);
        let fake = DVector::from_element(batch_size, 0.0);

        let mut d_loss_cum = 0.0;
        let mut g_loss_cum = 0.0;
        for (x, y) in dataset.batches(batch_size)? {
            let latent_fake = self.model.encode(&x)?;
            let latent_real = self.sample_prior(batch_size);

            let d_loss_real = self.model.evaluate_discriminator(&latent_real, &valid)?;
            let d_loss_fake = self.model.evaluate_discriminator(&latent_fake, &fake)?;
            d_loss_cum += 0.5 * (d_loss_real + d_loss_fake);

            g_loss_cum += self
                .model
                .evaluate_generator(&x, &y, &valid, &self.config.loss_weights)?;
        }

        Ok((d_loss_cum / n_batches as f64, g_loss_cum / n_batches as f64))
    }

    /// Multi-step rollout prediction with the trained model.
    ///
    /// Delegates to [`rollout::predict`] with the configured stride, which
    /// must match the stride the model was trained with.
    ///
    /// # Errors
    ///
    /// See [`rollout::predict`].
    pub fn predict(
        &self,
        boundaries: &CoeffSeries,
        init_values: &DMatrix<f64>,
        timesteps: usize,
        iters: usize,
    ) -> Result<CoeffSeries> {
        rollout::predict(
            &self.model,
            boundaries,
            init_values,
            timesteps,
            iters,
            self.config.interval,
        )
    }

    /// Draws a batch of latent samples from the unit Gaussian prior.
    fn sample_prior(&mut self, n: usize) -> DMatrix<f64> {
        let latent_dim = self.model.latent_dim();
        let rng = &mut self.rng;
        DMatrix::from_fn(n, latent_dim, |_, _| StandardNormal.sample(&mut *rng))
    }
}
