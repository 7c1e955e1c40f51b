use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;

/// Default address the HTTP server binds to.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";

/// Default directory holding the model artifact.
pub const DEFAULT_ARTIFACT_DIR: &str = "artifacts";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Address the HTTP server listens on
    pub bind_addr: SocketAddr,

    /// Directory the model artifact is read from and written to
    pub artifact_dir: PathBuf,

    /// Training CSV, if set
    pub dataset_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            artifact_dir: PathBuf::from(DEFAULT_ARTIFACT_DIR),
            dataset_path: None,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `LOAN_BIND_ADDR`: Server address (default: `0.0.0.0:5000`)
    /// - `LOAN_ARTIFACT_DIR`: Artifact directory (default: `artifacts`)
    /// - `LOAN_DATASET_PATH`: Training CSV
    ///
    /// # Errors
    ///
    /// Returns an error if `LOAN_BIND_ADDR` is not a socket address.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env file");
        }

        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from a variable lookup.
    ///
    /// Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns an error if `LOAN_BIND_ADDR` is not a socket address.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = var("LOAN_BIND_ADDR")
            .as_deref()
            .unwrap_or(DEFAULT_BIND_ADDR)
            .trim()
            .parse()
            .context("LOAN_BIND_ADDR is not a valid socket address")?;

        let artifact_dir = var("LOAN_ARTIFACT_DIR")
            .map_or_else(|| PathBuf::from(DEFAULT_ARTIFACT_DIR), PathBuf::from);

        let dataset_path = var("LOAN_DATASET_PATH").map(PathBuf::from);

        Ok(Self {
            bind_addr,
            artifact_dir,
            dataset_path,
        })
    }
}
