//! Best-effort startup conveniences.

use canvass_core::config::PathsConfig;

/// Create the data and image directories if they do not exist yet.
///
/// Failures are logged at WARN and never block startup — the trial-table
/// load right after this is what decides whether the server can run.
pub fn ensure_layout(paths: &PathsConfig) {
    for dir in [paths.data_dir.clone(), paths.images_dir()] {
        if let Err(e) = std::fs::create_dir_all(&dir) {
            tracing::warn!("could not create {}: {}", dir.display(), e);
        }
    }
}
