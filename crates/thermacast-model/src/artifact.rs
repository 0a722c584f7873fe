use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thermacast_common::{Result, ThermacastError};
use tracing::info;

use crate::model::SequenceModel;

/// Current on-disk artifact format.
pub const ARTIFACT_VERSION: u32 = 1;

/// Persisted training output: the model with its fitted normalization
/// statistics plus the feature names each weight column corresponds to.
/// Created once by training, loaded read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub version: u32,
    pub label_features: Vec<String>,
    pub control_features: Vec<String>,
    pub model: SequenceModel,
}

impl ModelArtifact {
    pub fn new(
        label_features: Vec<String>,
        control_features: Vec<String>,
        model: SequenceModel,
    ) -> Self {
        Self {
            version: ARTIFACT_VERSION,
            label_features,
            control_features,
            model,
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .map_err(|e| ThermacastError::ArtifactError(format!("cannot create {}: {e}", path.display())))?;
        serde_json::to_writer(BufWriter::new(file), self)
            .map_err(|e| ThermacastError::ArtifactError(format!("cannot encode artifact: {e}")))?;
        info!(path = %path.display(), "Saved model artifact");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| ThermacastError::ArtifactError(format!("cannot open {}: {e}", path.display())))?;
        let artifact: ModelArtifact = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| ThermacastError::ArtifactError(format!("cannot decode artifact: {e}")))?;
        artifact.validate()?;
        info!(
            path = %path.display(),
            labels = artifact.label_features.len(),
            controls = artifact.control_features.len(),
            "Loaded model artifact"
        );
        Ok(artifact)
    }

    fn validate(&self) -> Result<()> {
        if self.version != ARTIFACT_VERSION {
            return Err(ThermacastError::ArtifactError(format!(
                "unsupported artifact version {} (expected {ARTIFACT_VERSION})",
                self.version
            )));
        }
        if self.label_features.len() != self.model.n_labels() {
            return Err(ThermacastError::ArtifactError(format!(
                "artifact lists {} label features but the model expects {}",
                self.label_features.len(),
                self.model.n_labels()
            )));
        }
        if self.control_features.len() != self.model.n_controls() {
            return Err(ThermacastError::ArtifactError(format!(
                "artifact lists {} control features but the model expects {}",
                self.control_features.len(),
                self.model.n_controls()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use thermacast_scaler::{StandardScaler, VectorScaler};

    fn sample() -> ModelArtifact {
        let mut rng = StdRng::seed_from_u64(11);
        let model = SequenceModel::new(
            VectorScaler::from_stats(vec![20.0, 5.0], vec![2.0, 8.0]).unwrap(),
            VectorScaler::from_stats(vec![0.5], vec![0.5]).unwrap(),
            StandardScaler::from_stats(4.0, 6.0),
            &mut rng,
        );
        ModelArtifact::new(
            vec!["temperature_kitchen".into(), "temperature_outdoor".into()],
            vec!["hvac_state_heat_hp".into()],
            model,
        )
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let artifact = sample();
        artifact.save(&path).unwrap();

        let loaded = ModelArtifact::load(&path).unwrap();
        assert_eq!(loaded.version, ARTIFACT_VERSION);
        assert_eq!(loaded.label_features, artifact.label_features);

        // Loaded weights predict identically.
        let input = crate::model::RolloutInput {
            history: vec![vec![20.0, 4.0]; 3],
            control: vec![vec![1.0]; 2],
            forecasts: vec![5.0, 5.5],
        };
        assert_eq!(
            artifact.model.predict(&input).unwrap(),
            loaded.model.predict(&input).unwrap()
        );
    }

    #[test]
    fn test_load_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, b"not an artifact").unwrap();
        assert!(matches!(
            ModelArtifact::load(&path),
            Err(ThermacastError::ArtifactError(_))
        ));
    }

    #[test]
    fn test_load_rejects_feature_name_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let mut artifact = sample();
        artifact.label_features.pop();
        artifact.save(&path).unwrap();
        assert!(ModelArtifact::load(&path).is_err());
    }

    #[test]
    fn test_load_rejects_unknown_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let mut artifact = sample();
        artifact.version = 99;
        artifact.save(&path).unwrap();
        assert!(ModelArtifact::load(&path).is_err());
    }
}
