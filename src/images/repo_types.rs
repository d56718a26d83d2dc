use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// One classified upload.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ImageRecord {
    pub id: String,          // UUID v4
    pub filename: String,    // sanitized client filename
    pub storage_key: String, // file name under the upload dir
    #[serde(with = "time::serde::rfc3339")]
    pub upload_date: OffsetDateTime,
    pub category: String,
    pub confidence: f64,
}
