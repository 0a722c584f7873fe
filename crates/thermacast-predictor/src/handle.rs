use std::path::Path;

use thermacast_common::Result;
use thermacast_model::ModelArtifact;
use tracing::info;

use crate::pipeline::predict_single;
use crate::types::{ModelInput, Prediction};

/// A loaded, read-only model. Shareable across threads; prediction never
/// mutates the artifact.
#[derive(Debug, Clone)]
pub struct ModelHandle {
    artifact: ModelArtifact,
}

impl ModelHandle {
    /// Load the artifact at `path`. A corrupt or incompatible artifact is
    /// fatal here so a dependent service never starts with a broken model.
    pub fn load(path: &Path) -> Result<Self> {
        let artifact = ModelArtifact::load(path)?;
        info!(
            labels = artifact.label_features.len(),
            "Model handle ready"
        );
        Ok(Self { artifact })
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Self {
        Self { artifact }
    }

    pub fn artifact(&self) -> &ModelArtifact {
        &self.artifact
    }

    pub fn predict(&self, input: &ModelInput) -> Result<Prediction> {
        predict_single(&self.artifact, input)
    }
}
