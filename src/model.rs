//! Model artifacts on disk: the JSON formats, their validation, and loading
//! the four predictors the cascade runs.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::ModelError;
use crate::predictor::{Algorithm, KeywordPredictor, LinearPredictor, PatternGroup, Predictor};
use crate::tfidf::TfidfVectorizer;

/// A persisted classifier, tagged by how it predicts.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    Keyword(KeywordArtifact),
    Linear(LinearArtifact),
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct KeywordArtifact {
    pub groups: Vec<PatternGroup>,
    pub fallback: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LinearArtifact {
    pub algorithm: Algorithm,
    pub vectorizer: TfidfVectorizer,
    pub classes: Vec<String>,
    /// One row per class, or a single row for a two-class model.
    pub coef: Vec<Vec<f32>>,
    pub intercept: Vec<f32>,
}

impl ModelArtifact {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let path_ref = path.as_ref();
        if !path_ref.exists() {
            return Err(ModelError::Missing {
                path: path_ref.to_path_buf(),
            });
        }
        let artifact_json = std::fs::read_to_string(path_ref).map_err(|source| ModelError::Io {
            path: path_ref.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&artifact_json).map_err(|source| ModelError::Parse {
            path: path_ref.to_path_buf(),
            source,
        })
    }

    /// Validates the artifact and turns it into a shareable predictor.
    pub fn into_predictor(self, name: &str) -> Result<Arc<dyn Predictor>, ModelError> {
        match self {
            ModelArtifact::Keyword(artifact) => {
                let model = KeywordPredictor::new(name, artifact.groups, artifact.fallback)?;
                Ok(Arc::new(model))
            }
            ModelArtifact::Linear(artifact) => {
                let coef = to_array2(&artifact.coef)?;
                let intercept = Array1::from(artifact.intercept);
                let model = LinearPredictor::new(
                    name,
                    artifact.algorithm,
                    artifact.vectorizer,
                    artifact.classes,
                    coef,
                    intercept,
                )?;
                log::debug!("Model '{}' uses {}", name, model.algorithm());
                Ok(Arc::new(model))
            }
        }
    }
}

fn to_array2(rows: &[Vec<f32>]) -> Result<Array2<f32>, ModelError> {
    let n_rows = rows.len();
    let n_cols = rows.first().map(Vec::len).unwrap_or(0);
    if rows.iter().any(|r| r.len() != n_cols) {
        return Err(ModelError::Invalid(
            "coefficient rows have different lengths".to_string(),
        ));
    }
    let data: Vec<f32> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((n_rows, n_cols), data)
        .map_err(|e| ModelError::Invalid(format!("coefficient shape: {}", e)))
}

/// Resolved artifact locations for the four classifiers.
#[derive(Debug, Clone)]
pub struct ModelPaths {
    pub crisis_detector: PathBuf,
    pub crisis_classifier: PathBuf,
    pub flow_model: PathBuf,
    pub empathy_model: PathBuf,
}

impl ModelPaths {
    pub fn all(&self) -> [&Path; 4] {
        [
            self.crisis_detector.as_path(),
            self.crisis_classifier.as_path(),
            self.flow_model.as_path(),
            self.empathy_model.as_path(),
        ]
    }

    pub fn missing(&self) -> Vec<&Path> {
        self.all().into_iter().filter(|p| !p.exists()).collect()
    }
}

/// Every predictor the cascade needs, loaded and validated.
#[derive(Clone)]
pub struct LoadedModels {
    pub crisis_detector: Arc<dyn Predictor>,
    pub crisis_classifier: Arc<dyn Predictor>,
    pub flow_model: Arc<dyn Predictor>,
    pub empathy_model: Arc<dyn Predictor>,
}

impl LoadedModels {
    pub fn load(paths: &ModelPaths) -> Result<Self, ModelError> {
        Ok(Self {
            crisis_detector: load_predictor("crisis_detector", &paths.crisis_detector)?,
            crisis_classifier: load_predictor("crisis_classifier", &paths.crisis_classifier)?,
            flow_model: load_predictor("flow_model", &paths.flow_model)?,
            empathy_model: load_predictor("empathy_model", &paths.empathy_model)?,
        })
    }
}

fn load_predictor(name: &str, path: &Path) -> Result<Arc<dyn Predictor>, ModelError> {
    let predictor = ModelArtifact::load_from_file(path)?.into_predictor(name)?;
    log::info!("Loaded model '{}' from {:?}", name, path);
    Ok(predictor)
}
