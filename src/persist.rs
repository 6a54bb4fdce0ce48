//! Artifact persistence for trained models and the POD basis.
//!
//! A training run writes three things into one artifact directory:
//!
//! - the model collaborator's weights, in whatever opaque format the
//!   implementor chooses ([`ModelArtifacts`]);
//! - the POD basis, which must live next to the weights because physical
//!   reconstruction needs both;
//! - a snapshot of the training configuration for reproducibility.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::config::TrainingConfig;
use crate::error::{Result, SurrogateError};
use crate::pod::PodBasis;

/// File name of the serialized POD basis inside an artifact directory.
pub const BASIS_FILE: &str = "pod_basis.json";

/// File name of the configuration snapshot inside an artifact directory.
pub const CONFIG_FILE: &str = "training_config.toml";

/// Opaque weight persistence implemented by model collaborators.
///
/// The crate does not prescribe a weight format; implementors write whatever
/// their framework uses into the given directory.
pub trait ModelArtifacts {
    /// Saves encoder, decoder, and discriminator weights into `dir`.
    fn save(&self, dir: &Path) -> Result<()>;
}

/// Writes model weights, the POD basis, and a config snapshot into `dir`.
///
/// The directory is created if missing.
///
/// # Errors
///
/// Propagates collaborator, serialization, and I/O failures.
pub fn save_artifacts<M: ModelArtifacts>(
    dir: impl AsRef<Path>,
    model: &M,
    basis: &PodBasis,
    config: &TrainingConfig,
) -> Result<()> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    model.save(dir)?;
    save_basis(dir, basis)?;
    config.to_file(dir.join(CONFIG_FILE))?;

    tracing::info!(dir = %dir.display(), "saved surrogate artifacts");
    Ok(())
}

/// Serializes the POD basis into `dir`.
///
/// # Errors
///
/// Returns [`SurrogateError::Artifact`] on serialization failure.
pub fn save_basis(dir: impl AsRef<Path>, basis: &PodBasis) -> Result<()> {
    let path = dir.as_ref().join(BASIS_FILE);
    let file = File::create(&path)?;
    serde_json::to_writer(BufWriter::new(file), basis)
        .map_err(|e| SurrogateError::Artifact(format!("failed to serialize basis: {e}")))
}

/// Loads a POD basis previously written by [`save_basis`].
///
/// # Errors
///
/// Returns [`SurrogateError::Artifact`] on deserialization failure.
pub fn load_basis(dir: impl AsRef<Path>) -> Result<PodBasis> {
    let path = dir.as_ref().join(BASIS_FILE);
    let file = File::open(&path)?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| SurrogateError::Artifact(format!("failed to parse basis: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SnapshotSet;
    use crate::pod::{compute_pod, Truncation};
    use nalgebra::DMatrix;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    struct MarkerModel;

    impl ModelArtifacts for MarkerModel {
        fn save(&self, dir: &Path) -> Result<()> {
            std::fs::write(dir.join("weights.bin"), b"opaque")?;
            Ok(())
        }
    }

    fn basis() -> PodBasis {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let grids = (0..2)
            .map(|_| DMatrix::from_fn(8, 5, |_, _| rng.gen::<f64>()))
            .collect();
        let snapshots = SnapshotSet::new(grids).unwrap();
        compute_pod(&snapshots, Truncation::Fixed { k: 3 }).unwrap().1
    }

    #[test]
    fn basis_round_trips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let original = basis();

        save_basis(dir.path(), &original).unwrap();
        let restored = load_basis(dir.path()).unwrap();

        assert_eq!(restored.rank(), original.rank());
        assert_eq!(restored.n_dof(), original.n_dof());
        let diff = (original.modes() - restored.modes()).abs().max();
        assert!(diff < 1e-15);
    }

    #[test]
    fn save_artifacts_writes_all_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = TrainingConfig::default();

        save_artifacts(dir.path(), &MarkerModel, &basis(), &config).unwrap();

        assert!(dir.path().join("weights.bin").exists());
        assert!(dir.path().join(BASIS_FILE).exists());
        assert!(dir.path().join(CONFIG_FILE).exists());

        let reloaded = TrainingConfig::from_file(dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(reloaded.epochs, config.epochs);
    }

    #[test]
    fn missing_basis_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_basis(dir.path()).is_err());
    }
}
