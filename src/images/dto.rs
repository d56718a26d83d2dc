use serde::Serialize;

use crate::classifier::{ModelStatus, Severity};

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub filename: String,
    pub category: Severity,
    /// Percentage in [0, 100], two decimals.
    pub confidence: f64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model: ModelStatus,
}
