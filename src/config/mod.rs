//! Application configuration management

use std::env;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Database URL (SQLite), e.g. `sqlite://./data/quillpad.db`
    pub database_url: String,

    /// JWT secret for credential signing and verification
    pub jwt_secret: String,

    /// Directory where uploaded blobs are written
    pub uploads_path: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://./data/quillpad.db".to_string());

        // JWT_SECRET should be set explicitly in production; generate a
        // random one for development so unsigned tokens never verify.
        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            use std::collections::hash_map::DefaultHasher;
            use std::hash::{Hash, Hasher};
            let mut hasher = DefaultHasher::new();
            std::time::SystemTime::now().hash(&mut hasher);
            format!("dev-secret-{}", hasher.finish())
        });

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .context("Invalid PORT")?,

            database_url,

            jwt_secret,

            uploads_path: env::var("UPLOADS_PATH").unwrap_or_else(|_| "./uploads".to_string()),
        })
    }
}
