use std::path::PathBuf;

use serde::Deserialize;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://database/road_damage.db";
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
pub const DEFAULT_MODEL_PATH: &str = "model/road_damage_classifier.onnx";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub upload_dir: PathBuf,
    pub model_path: PathBuf,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset or unparsable values
    /// fall back to defaults, except `JWT_SECRET` which is required.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into());
        let jwt = JwtConfig {
            secret: var("JWT_SECRET")
                .filter(|s| !s.is_empty())
                .ok_or_else(|| anyhow::anyhow!("JWT_SECRET must be set"))?,
            issuer: var("JWT_ISSUER").unwrap_or_else(|| "roadscan".into()),
            audience: var("JWT_AUDIENCE").unwrap_or_else(|| "roadscan-users".into()),
            ttl_minutes: var("JWT_TTL_MINUTES")
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24),
        };
        let upload_dir = var("UPLOAD_DIR")
            .unwrap_or_else(|| DEFAULT_UPLOAD_DIR.into())
            .into();
        let model_path = var("MODEL_PATH")
            .unwrap_or_else(|| DEFAULT_MODEL_PATH.into())
            .into();
        let max_upload_bytes = var("MAX_UPLOAD_BYTES")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);
        Ok(Self {
            database_url,
            jwt,
            upload_dir,
            model_path,
            max_upload_bytes,
        })
    }
}
