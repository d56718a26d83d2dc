//! Road damage severity classification.
//!
//! The classifier is either backed by a trained model ([`Classifier::Loaded`])
//! or is a [`Classifier::Placeholder`] that answers `unknown` with zero
//! confidence. Which one the process runs with is decided once at startup by
//! [`Classifier::load`] and never changes afterwards.

mod onnx;
mod preprocess;

use std::{fmt, path::Path};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

pub use onnx::OnnxModel;
pub use preprocess::{preprocess_bytes, preprocess_path, PreprocessError, INPUT_SIZE};
pub use tract_onnx::prelude::tract_ndarray::Array4;

/// Severity labels in the order of the model's output vector.
///
/// Training exports the classes sorted by folder name, which is
/// `minor`, `moderate`, `major` for the dataset layout used here.
pub const LABELS: [Severity; 3] = [Severity::Minor, Severity::Moderate, Severity::Major];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Minor,
    Moderate,
    Major,
    Unknown,
}

impl Severity {
    pub fn from_index(idx: usize) -> Option<Self> {
        LABELS.get(idx).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Minor => "minor",
            Severity::Moderate => "moderate",
            Severity::Major => "major",
            Severity::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub category: Severity,
    /// Probability of `category`, in [0, 1].
    pub confidence: f32,
}

impl Prediction {
    pub fn unknown() -> Self {
        Self {
            category: Severity::Unknown,
            confidence: 0.0,
        }
    }

    /// Picks the most probable class out of a 3-way softmax output.
    pub fn from_probabilities(probs: &[f32]) -> anyhow::Result<Self> {
        anyhow::ensure!(
            probs.len() == LABELS.len(),
            "expected {} class probabilities, got {}",
            LABELS.len(),
            probs.len()
        );
        anyhow::ensure!(
            probs.iter().all(|p| p.is_finite()),
            "model produced non-finite probabilities"
        );

        let (idx, confidence) = probs
            .iter()
            .copied()
            .enumerate()
            // first maximum wins on ties
            .fold((0, f32::MIN), |best, (i, p)| if p > best.1 { (i, p) } else { best });

        let category = Severity::from_index(idx)
            .ok_or_else(|| anyhow::anyhow!("class index {} out of range", idx))?;
        Ok(Self {
            category,
            confidence,
        })
    }

    /// Confidence as a percentage rounded to two decimals.
    pub fn confidence_percent(&self) -> f64 {
        (self.confidence as f64 * 100.0 * 100.0).round() / 100.0
    }
}

/// A network mapping a `[1, 224, 224, 3]` image tensor to class probabilities.
pub trait SeverityModel: Send + Sync {
    fn predict(&self, input: &Array4<f32>) -> anyhow::Result<Vec<f32>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelStatus {
    Loaded,
    Placeholder,
}

pub enum Classifier {
    Loaded(Box<dyn SeverityModel>),
    Placeholder,
}

impl Classifier {
    /// Loads the trained model at `path`, falling back to the placeholder.
    pub fn load(path: &Path) -> Self {
        match OnnxModel::load(path) {
            Ok(model) => {
                info!(path = %path.display(), "trained classifier loaded");
                Classifier::Loaded(Box::new(model))
            }
            Err(e) => {
                error!(path = %path.display(), error = ?e, "could not load classifier model");
                warn!("SERVING PLACEHOLDER CLASSIFIER: every upload will be classified as 'unknown'");
                Classifier::Placeholder
            }
        }
    }

    pub fn with_model(model: impl SeverityModel + 'static) -> Self {
        Classifier::Loaded(Box::new(model))
    }

    pub fn status(&self) -> ModelStatus {
        match self {
            Classifier::Loaded(_) => ModelStatus::Loaded,
            Classifier::Placeholder => ModelStatus::Placeholder,
        }
    }

    pub fn classify(&self, input: &Array4<f32>) -> anyhow::Result<Prediction> {
        let model = match self {
            Classifier::Loaded(model) => model,
            Classifier::Placeholder => return Ok(Prediction::unknown()),
        };

        let probs = model.predict(input)?;
        let prediction = Prediction::from_probabilities(&probs)?;
        debug!(
            category = %prediction.category,
            confidence = prediction.confidence_percent(),
            "prediction"
        );
        Ok(prediction)
    }
}

impl fmt::Debug for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Classifier").field(&self.status()).finish()
    }
}
