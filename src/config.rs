use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    /// `None` issues tokens without an `exp` claim.
    pub ttl_minutes: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub enum StorageConfig {
    Local {
        root: PathBuf,
        public_base: String,
    },
    S3 {
        endpoint: String,
        bucket: String,
        access_key: String,
        secret_key: String,
        region: String,
        public_url: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub user_jwt: JwtConfig,
    pub admin_jwt: JwtConfig,
    pub google_client_id: Option<String>,
    pub storage: StorageConfig,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        let issuer = std::env::var("JWT_ISSUER").unwrap_or_else(|_| "sarvavyapi".into());

        let user_jwt = JwtConfig {
            secret: secret.clone(),
            issuer: issuer.clone(),
            audience: "sarvavyapi-users".into(),
            ttl_minutes: ttl_from_env("JWT_USER_TTL_MINUTES", 60 * 24 * 7)?,
        };
        let admin_jwt = JwtConfig {
            secret: std::env::var("ADMIN_JWT_SECRET").unwrap_or(secret),
            issuer,
            audience: "sarvavyapi-admins".into(),
            ttl_minutes: ttl_from_env("JWT_ADMIN_TTL_MINUTES", 60)?,
        };

        let storage = match std::env::var("STORAGE_BACKEND").as_deref() {
            Ok("s3") => StorageConfig::S3 {
                endpoint: std::env::var("S3_ENDPOINT").context("S3_ENDPOINT must be set")?,
                bucket: std::env::var("S3_BUCKET").context("S3_BUCKET must be set")?,
                access_key: std::env::var("S3_ACCESS_KEY").context("S3_ACCESS_KEY must be set")?,
                secret_key: std::env::var("S3_SECRET_KEY").context("S3_SECRET_KEY must be set")?,
                region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".into()),
                public_url: std::env::var("S3_PUBLIC_URL").context("S3_PUBLIC_URL must be set")?,
            },
            Ok("local") | Err(_) => StorageConfig::Local {
                root: std::env::var("UPLOAD_DIR").unwrap_or_else(|_| ".".into()).into(),
                public_base: std::env::var("PUBLIC_BASE_URL").unwrap_or_default(),
            },
            Ok(other) => anyhow::bail!("unknown STORAGE_BACKEND {other:?}"),
        };

        let max_upload_mb = std::env::var("MAX_UPLOAD_MB")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(10);

        Ok(Self {
            database_url,
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(5000),
            user_jwt,
            admin_jwt,
            google_client_id: std::env::var("GOOGLE_CLIENT_ID").ok().filter(|v| !v.is_empty()),
            storage,
            max_upload_bytes: max_upload_mb * 1024 * 1024,
        })
    }
}

// 0 disables expiry for the domain.
fn ttl_from_env(key: &str, default: i64) -> anyhow::Result<Option<i64>> {
    let minutes = match std::env::var(key) {
        Ok(v) => v
            .parse::<i64>()
            .with_context(|| format!("{key} must be an integer number of minutes"))?,
        Err(_) => default,
    };
    Ok((minutes > 0).then_some(minutes))
}
