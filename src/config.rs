//! Service Configuration
//!
//! Everything comes from environment variables with sensible local-dev
//! defaults, so the binary runs with no setup at all.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// SQLite database file.
    pub database_path: PathBuf,
    /// The human-editable CSV mirror of the companies table.
    pub mirror_path: PathBuf,
    /// Directory holding uploaded resume artifacts.
    pub upload_dir: PathBuf,
    /// Base used when deriving resume download URLs.
    pub public_base_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080);
        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://{}:{}", host, port));

        Self {
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "talent_registry.db".to_string())
                .into(),
            mirror_path: std::env::var("COMPANIES_CSV")
                .unwrap_or_else(|_| "companies.csv".to_string())
                .into(),
            upload_dir: std::env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "uploads".to_string())
                .into(),
            host,
            port,
            public_base_url,
        }
    }
}
