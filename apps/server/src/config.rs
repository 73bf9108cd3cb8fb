use std::{net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::Context;

/// Log line format of the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

pub struct Config {
    pub listen_addr: SocketAddr,
    /// Directory holding `directory.db` and one `snds_<code>.db` per tenant.
    pub data_dir: PathBuf,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    /// Optional JSON array of tenants upserted into the directory at boot.
    pub tenant_seed_file: Option<PathBuf>,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let listen_addr: SocketAddr = std::env::var("SNDS_LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .context("Invalid SNDS_LISTEN_ADDR")?;
        let data_dir = std::env::var("SNDS_DATA_DIR").unwrap_or_else(|_| "./db".into());
        let cors_allow = std::env::var("SNDS_CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let timeout_ms: u64 = std::env::var("SNDS_REQUEST_TIMEOUT_MS")
            .unwrap_or_else(|_| "30000".into())
            .parse()
            .unwrap_or(30000);
        let tenant_seed_file = std::env::var("SNDS_TENANT_SEED_FILE")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);
        let log_format = match std::env::var("SNDS_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };
        Ok(Self {
            listen_addr,
            data_dir: PathBuf::from(data_dir),
            cors_allow,
            request_timeout: Duration::from_millis(timeout_ms),
            tenant_seed_file,
            log_format,
        })
    }

    /// Configuration rooted at `data_dir` with every other value defaulted.
    pub fn for_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            data_dir: data_dir.into(),
            cors_allow: vec!["*".to_string()],
            request_timeout: Duration::from_secs(30),
            tenant_seed_file: None,
            log_format: LogFormat::Text,
        }
    }
}
