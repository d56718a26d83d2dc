use std::sync::Arc;

use anyhow::Context;
use bytes::Bytes;
use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{error, info};
use uuid::Uuid;

use super::{repo, repo_types::ImageRecord};
use crate::{
    classifier::{preprocess_bytes, Prediction},
    error::{ApiError, ApiResult},
    state::AppState,
};

pub const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Longest file name common filesystems accept, in bytes.
const MAX_KEY_BYTES: usize = 255;

/// Reduces a client-supplied filename to `[A-Za-z0-9_.-]` so it can be used
/// as a single path component. Returns `None` if nothing usable is left.
pub fn sanitize_filename(name: &str) -> Option<String> {
    lazy_static! {
        static ref UNSAFE_RE: Regex = Regex::new(r"[^A-Za-z0-9_.-]").unwrap();
    }
    let spaced = name.replace(['/', '\\'], " ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = UNSAFE_RE.replace_all(&joined, "");
    let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub fn is_allowed_extension(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Name of the stored file: `<id>-<filename>`, with the stem of `filename`
/// shortened so the whole key fits in a single path component. The extension
/// is kept.
pub fn storage_key(id: &Uuid, filename: &str) -> String {
    let prefix = format!("{}-", id);
    let budget = MAX_KEY_BYTES - prefix.len();
    if filename.len() <= budget {
        return prefix + filename;
    }

    let (stem, ext) = match filename.rsplit_once('.') {
        Some((stem, ext)) => (stem, Some(ext)),
        None => (filename, None),
    };
    let keep = budget.saturating_sub(ext.map_or(0, |e| e.len() + 1));
    let stem = truncate_at_char_boundary(stem, keep);
    match ext {
        Some(ext) => format!("{}{}.{}", prefix, stem, ext),
        None => format!("{}{}", prefix, stem),
    }
}

fn truncate_at_char_boundary(s: &str, max_bytes: usize) -> &str {
    let end = s
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take_while(|&end| end <= max_bytes)
        .last()
        .unwrap_or(0);
    &s[..end]
}

/// Decodes, classifies and persists one upload.
///
/// `filename` must already be sanitized and carry an allowed extension.
/// Nothing is written unless the bytes decode as an image.
pub async fn classify_and_store(
    state: &AppState,
    filename: String,
    body: Bytes,
) -> ApiResult<(ImageRecord, Prediction)> {
    let classifier = Arc::clone(&state.classifier);
    let bytes = body.clone();
    let prediction = tokio::task::spawn_blocking(move || {
        let input = preprocess_bytes(&bytes)?;
        Ok::<_, ApiError>(classifier.classify(&input)?)
    })
    .await
    .context("classification task")??;

    let id = Uuid::new_v4();
    let storage_key = storage_key(&id, &filename);
    state
        .storage
        .put_object(&storage_key, body)
        .await
        .with_context(|| format!("store upload {}", storage_key))?;

    let record = ImageRecord {
        id: id.to_string(),
        filename,
        storage_key,
        upload_date: OffsetDateTime::now_utc(),
        category: prediction.category.as_str().to_string(),
        confidence: prediction.confidence as f64,
    };

    if let Err(e) = repo::insert_image(&state.db, &record).await {
        if let Err(cleanup) = state.storage.delete_object(&record.storage_key).await {
            error!(error = ?cleanup, key = %record.storage_key, "could not remove orphaned upload");
        }
        return Err(e.into());
    }

    info!(
        image_id = %record.id,
        filename = %record.filename,
        category = %prediction.category,
        confidence = prediction.confidence_percent(),
        "image classified"
    );
    Ok((record, prediction))
}
