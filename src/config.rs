//! Training configuration.
//!
//! One immutable [`TrainingConfig`] value carries every recognized option
//! into the trainer; there is no global mutable configuration. Configs are
//! serializable (TOML) so a run can be reproduced from the snapshot written
//! next to its artifacts.
//!
//! # Example
//!
//! ```rust
//! use pod_surrogate_rs::TrainingConfig;
//!
//! let config = TrainingConfig::default()
//!     .with_epochs(200)
//!     .with_batch_size(64)
//!     .with_interval(5)
//!     .with_seed(7);
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, SurrogateError};
use crate::model::LossWeights;

/// Uniform grid spacing for the continuity penalty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpacing {
    /// Spacing in the x direction.
    pub dx: f64,
    /// Spacing in the y direction.
    pub dy: f64,
}

/// Configuration for adversarial surrogate training.
///
/// # Defaults
///
/// | Parameter | Default | Description |
/// |-----------|---------|-------------|
/// | `epochs` | 100 | Training epochs |
/// | `batch_size` | 128 | Mini-batch size (trailing partial batch dropped) |
/// | `val_batch_size` | 128 | Validation mini-batch size |
/// | `interval` | 5 | Time-series stride for windowing and rollout |
/// | `n_discriminator` | 5 | Batches per combined generator update |
/// | `seed` | 42 | Seed for the Gaussian latent prior |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Number of training epochs.
    #[serde(default = "default_epochs")]
    pub epochs: usize,

    /// Mini-batch size; batches are fixed-size, the trailing partial batch
    /// is dropped.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Mini-batch size used during validation.
    #[serde(default = "default_batch_size")]
    pub val_batch_size: usize,

    /// Stride applied to the coefficient time series. Every `interval`-th
    /// sample forms an independent phase-offset sub-sequence; rollout
    /// prediction reuses the same stride.
    #[serde(default = "default_interval")]
    pub interval: usize,

    /// Discriminator-update cadence: the combined generator step runs on
    /// every batch index divisible by this value.
    #[serde(default = "default_n_discriminator")]
    pub n_discriminator: usize,

    /// Seed for the latent-prior random draws.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Weighting of the combined generator objective.
    #[serde(default)]
    pub loss_weights: LossWeights,

    /// Whether implementors should add the continuity penalty to the
    /// reconstruction loss. Requires `grid_spacing`.
    #[serde(default)]
    pub physics_informed: bool,

    /// Grid spacing for the continuity penalty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_spacing: Option<GridSpacing>,
}

fn default_epochs() -> usize {
    100
}
fn default_batch_size() -> usize {
    128
}
fn default_interval() -> usize {
    5
}
fn default_n_discriminator() -> usize {
    5
}
fn default_seed() -> u64 {
    42
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: default_epochs(),
            batch_size: default_batch_size(),
            val_batch_size: default_batch_size(),
            interval: default_interval(),
            n_discriminator: default_n_discriminator(),
            seed: default_seed(),
            loss_weights: LossWeights::default(),
            physics_informed: false,
            grid_spacing: None,
        }
    }
}

impl TrainingConfig {
    /// Builder: set the number of epochs.
    #[must_use]
    pub const fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Builder: set the training batch size.
    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Builder: set the validation batch size.
    #[must_use]
    pub const fn with_val_batch_size(mut self, batch_size: usize) -> Self {
        self.val_batch_size = batch_size;
        self
    }

    /// Builder: set the time-series stride.
    #[must_use]
    pub const fn with_interval(mut self, interval: usize) -> Self {
        self.interval = interval;
        self
    }

    /// Builder: set the discriminator-update cadence.
    #[must_use]
    pub const fn with_n_discriminator(mut self, n: usize) -> Self {
        self.n_discriminator = n;
        self
    }

    /// Builder: set the latent-prior seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder: set the generator loss weighting.
    #[must_use]
    pub fn with_loss_weights(mut self, weights: LossWeights) -> Self {
        self.loss_weights = weights;
        self
    }

    /// Builder: enable the continuity penalty with the given spacing.
    #[must_use]
    pub fn with_continuity_penalty(mut self, spacing: GridSpacing) -> Self {
        self.physics_informed = true;
        self.grid_spacing = Some(spacing);
        self
    }

    /// Validates that all parameters are in range and consistent.
    ///
    /// # Errors
    ///
    /// Returns [`SurrogateError::InvalidConfig`] describing the first
    /// violated constraint. In particular, enabling the physics-informed
    /// loss without grid spacing fails here, before any computation starts.
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(SurrogateError::InvalidConfig("epochs must be > 0".into()));
        }
        if self.batch_size == 0 || self.val_batch_size == 0 {
            return Err(SurrogateError::InvalidConfig(
                "batch sizes must be > 0".into(),
            ));
        }
        if self.interval == 0 {
            return Err(SurrogateError::InvalidConfig("interval must be > 0".into()));
        }
        if self.n_discriminator == 0 {
            return Err(SurrogateError::InvalidConfig(
                "n_discriminator must be > 0".into(),
            ));
        }
        self.loss_weights.validate()?;
        if self.physics_informed {
            match self.grid_spacing {
                None => {
                    return Err(SurrogateError::InvalidConfig(
                        "grid_spacing must be set when physics_informed is enabled".into(),
                    ))
                }
                Some(GridSpacing { dx, dy }) if dx <= 0.0 || dy <= 0.0 => {
                    return Err(SurrogateError::InvalidConfig(
                        "grid spacing must be positive".into(),
                    ))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Loads a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`SurrogateError::InvalidConfig`] if the file cannot be read
    /// or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&content).map_err(|e| {
            SurrogateError::InvalidConfig(format!("failed to parse config: {e}"))
        })
    }

    /// Writes the configuration to a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`SurrogateError::InvalidConfig`] on serialization failure or
    /// an I/O error on write failure.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            SurrogateError::InvalidConfig(format!("failed to serialize config: {e}"))
        })?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(TrainingConfig::default().validate().is_ok());
    }

    #[test]
    fn builder_sets_fields() {
        let config = TrainingConfig::default()
            .with_epochs(10)
            .with_batch_size(16)
            .with_interval(2)
            .with_n_discriminator(3)
            .with_seed(9);
        assert_eq!(config.epochs, 10);
        assert_eq!(config.batch_size, 16);
        assert_eq!(config.interval, 2);
        assert_eq!(config.n_discriminator, 3);
        assert_eq!(config.seed, 9);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let config = TrainingConfig::default().with_interval(0);
        assert!(matches!(
            config.validate(),
            Err(SurrogateError::InvalidConfig(_))
        ));
    }

    #[test]
    fn physics_informed_requires_spacing() {
        let config = TrainingConfig {
            physics_informed: true,
            grid_spacing: None,
            ..TrainingConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SurrogateError::InvalidConfig(_))
        ));

        let config = TrainingConfig::default()
            .with_continuity_penalty(GridSpacing { dx: 0.1, dy: 0.1 });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn toml_round_trip() {
        let config = TrainingConfig::default().with_epochs(42).with_seed(3);
        let text = toml::to_string(&config).unwrap();
        let parsed: TrainingConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.epochs, 42);
        assert_eq!(parsed.seed, 3);
        assert_eq!(parsed.batch_size, config.batch_size);
    }
}
