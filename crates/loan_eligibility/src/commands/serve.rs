//! Serve command - runs the HTTP prediction service.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::server::{self, AppState};

/// Runs the serve command.
///
/// # Errors
///
/// Returns an error if the server cannot bind or fails while running.
pub async fn run(addr: SocketAddr, artifact_dir: &Path) -> Result<()> {
    info!(
        %addr,
        artifacts = %artifact_dir.display(),
        "Starting loan eligibility server"
    );

    let state = Arc::new(AppState::load(artifact_dir));
    server::serve(addr, state).await
}
