//! Teardown of everything a pipeline run registered.

use std::path::{Path, PathBuf};

use crate::{
    artifacts::{ArtifactHandle, PipelineArtifacts},
    config::CleanupOptions,
    host::scene::{Removal, SceneHost},
};

/// A handle cleanup could not remove.
#[derive(Clone, Debug, PartialEq)]
pub struct CleanupFailure {
    /// The handle.
    pub handle: ArtifactHandle,
    /// Host or filesystem error.
    pub reason: String,
}

/// Outcome of one [`cleanup`] call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CleanupReport {
    /// Removed by this call.
    pub deleted: Vec<ArtifactHandle>,
    /// Already gone before this call.
    pub skipped: Vec<ArtifactHandle>,
    /// Could not be removed; left in place.
    pub failed: Vec<CleanupFailure>,
    /// Output files left on disk because file removal was not requested.
    pub kept_files: Vec<PathBuf>,
}

impl CleanupReport {
    /// Whether every registered artifact is gone or intentionally kept.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

fn remove_file(path: &Path) -> Result<Removal, String> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(Removal::Removed),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Removal::Missing),
        Err(e) => Err(e.to_string()),
    }
}

/// Remove every registered artifact, dependents first.
///
/// Never fails: handles that are already gone are recorded as skipped, handles the host refuses
/// to remove are recorded as failed and the walk continues. Safe to call repeatedly.
#[tracing::instrument(skip_all, fields(artifacts = artifacts.len(), remove_files = opts.remove_files))]
pub fn cleanup(
    host: &mut dyn SceneHost,
    artifacts: &PipelineArtifacts,
    opts: CleanupOptions,
) -> CleanupReport {
    let mut report = CleanupReport::default();

    for artifact in artifacts.teardown_order() {
        let handle = &artifact.handle;
        let outcome = match handle {
            ArtifactHandle::Modifier { object, modifier } => host
                .remove_modifier(*object, *modifier)
                .map_err(|e| e.to_string()),
            ArtifactHandle::Material(id) => host.delete_material(*id).map_err(|e| e.to_string()),
            ArtifactHandle::Image(id) => host.delete_image(*id).map_err(|e| e.to_string()),
            ArtifactHandle::Object(id) => host.delete_object(*id).map_err(|e| e.to_string()),
            ArtifactHandle::File(path) if !opts.remove_files => {
                report.kept_files.push(path.clone());
                continue;
            }
            ArtifactHandle::File(path) => remove_file(path),
        };

        match outcome {
            Ok(Removal::Removed) => {
                tracing::debug!(%handle, role = ?artifact.role, "deleted");
                report.deleted.push(handle.clone());
            }
            Ok(Removal::Missing) => {
                tracing::debug!(%handle, "already gone, skipped");
                report.skipped.push(handle.clone());
            }
            Err(reason) => {
                tracing::warn!(%handle, %reason, "could not delete");
                report.failed.push(CleanupFailure {
                    handle: handle.clone(),
                    reason,
                });
            }
        }
    }

    tracing::info!(
        deleted = report.deleted.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "cleanup finished"
    );
    report
}

#[cfg(test)]
#[path = "../tests/unit/cleanup/cleanup.rs"]
mod tests;
