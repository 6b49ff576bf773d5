use std::{
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use crate::{
    artifacts::PipelineArtifacts,
    capture::{
        driver::{CaptureResult, bake_channel},
        metadata::CaptureMetadata,
    },
    channel::ChannelKind,
    config::CaptureConfig,
    foundation::error::QuadgrabResult,
    host::{bake::BakeBackend, scene::ObjectId},
    preview::{PreviewAssembly, PreviewOptions, assemble_preview},
    surface::{ReferenceSurface, ensure_surface},
};

/// Overall outcome of a capture run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RunStatus {
    /// At least one channel was captured.
    Success,
    /// No channel was captured.
    Failed,
}

/// What happened to the preview requested by `build_preview`.
#[derive(Clone, Debug, PartialEq)]
pub enum PreviewStatus {
    /// `build_preview` was off.
    NotRequested,
    /// No channel succeeded, so no preview was attempted.
    Skipped,
    /// Preview built.
    Built(PreviewAssembly),
    /// Preview assembly failed; the capture itself is unaffected.
    Failed(String),
}

/// Full output of one capture run.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureResultSet {
    /// Surface the channels were captured from.
    pub surface: ReferenceSurface,
    /// One result per attempted channel, in capture order.
    pub results: Vec<CaptureResult>,
    /// `Success` iff at least one result succeeded.
    pub status: RunStatus,
    /// Whether the run stopped at a cancel checkpoint.
    pub cancelled: bool,
    /// Metadata file, if written.
    pub metadata_path: Option<PathBuf>,
    /// Preview outcome.
    pub preview: PreviewStatus,
}

impl CaptureResultSet {
    /// Assemble a set, deriving the overall status from `results`.
    pub fn new(surface: ReferenceSurface, results: Vec<CaptureResult>, cancelled: bool) -> Self {
        let status = if results.iter().any(CaptureResult::is_success) {
            RunStatus::Success
        } else {
            RunStatus::Failed
        };
        Self {
            surface,
            results,
            status,
            cancelled,
            metadata_path: None,
            preview: PreviewStatus::NotRequested,
        }
    }

    /// Successful results, in capture order.
    pub fn succeeded(&self) -> impl Iterator<Item = &CaptureResult> {
        self.results.iter().filter(|r| r.is_success())
    }

    /// Result for `kind`, if it was attempted.
    pub fn result(&self, kind: ChannelKind) -> Option<&CaptureResult> {
        self.results.iter().find(|r| r.kind == kind)
    }

    /// Built preview, if any.
    pub fn preview_assembly(&self) -> Option<&PreviewAssembly> {
        match &self.preview {
            PreviewStatus::Built(p) => Some(p),
            _ => None,
        }
    }
}

/// Cooperative cancellation flag, checked before each channel's bake.
///
/// Clones share the flag, so a token can be handed to another thread or a UI callback.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// New, not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Bakes already issued run to completion.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Progress callbacks of a capture run.
pub trait CaptureObserver {
    /// Called before `kind`'s bake; `index` counts from 0 over `total` requested channels.
    fn channel_started(&mut self, kind: ChannelKind, index: usize, total: usize) {
        let _ = (kind, index, total);
    }

    /// Called after each channel with its result.
    fn channel_finished(&mut self, result: &CaptureResult) {
        let _ = result;
    }
}

/// Observer that ignores every callback.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl CaptureObserver for NoopObserver {}

/// Capture every requested channel of the reference surface.
///
/// See [`run_capture_with`].
pub fn run_capture(
    host: &mut dyn BakeBackend,
    config: &CaptureConfig,
    surface_handle: Option<ObjectId>,
    artifacts: &mut PipelineArtifacts,
) -> QuadgrabResult<CaptureResultSet> {
    run_capture_with(
        host,
        config,
        surface_handle,
        artifacts,
        &CancelToken::new(),
        &mut NoopObserver,
    )
}

/// Capture every requested channel, with cancellation and progress callbacks.
///
/// The config is validated before the scene is touched. Channels run in [`ChannelKind`] order and
/// a failing channel never stops the rest. Cancellation is checked before each bake; the results
/// gathered so far are returned as a normal result set. A preview is built only when requested and
/// at least one channel succeeded.
#[tracing::instrument(skip_all, fields(resolution = config.resolution, channels = config.channels.len()))]
pub fn run_capture_with(
    host: &mut dyn BakeBackend,
    config: &CaptureConfig,
    surface_handle: Option<ObjectId>,
    artifacts: &mut PipelineArtifacts,
    cancel: &CancelToken,
    observer: &mut dyn CaptureObserver,
) -> QuadgrabResult<CaptureResultSet> {
    config.validate()?;
    let surface = ensure_surface(host, surface_handle, &config.surface_name, artifacts)?;
    tracing::info!(surface = %surface.name, "capture started");

    let total = config.channels.len();
    let mut results = Vec::with_capacity(total);
    let mut cancelled = false;
    for (index, &kind) in config.channels.iter().enumerate() {
        if cancel.is_cancelled() {
            tracing::info!(completed = index, total, "capture cancelled");
            cancelled = true;
            break;
        }
        observer.channel_started(kind, index, total);
        let result = bake_channel(host, &surface, kind, config, artifacts);
        observer.channel_finished(&result);
        results.push(result);
    }

    let mut set = CaptureResultSet::new(surface, results, cancelled);
    tracing::info!(
        status = ?set.status,
        succeeded = set.succeeded().count(),
        attempted = set.results.len(),
        "capture finished"
    );

    if config.write_metadata {
        let path = config.metadata_path(&set.surface.name);
        artifacts.register_file(&path);
        match CaptureMetadata::from_result_set(config, &set).write(&path) {
            Ok(()) => set.metadata_path = Some(path),
            Err(e) => tracing::warn!(error = %format!("{e:#}"), "capture metadata not written"),
        }
    }

    if config.build_preview {
        set.preview = match set.status {
            RunStatus::Failed => {
                tracing::info!("no channel succeeded, preview skipped");
                PreviewStatus::Skipped
            }
            RunStatus::Success => {
                let opts = PreviewOptions::from(config);
                match assemble_preview(host, &set, &opts, artifacts) {
                    Ok(p) => PreviewStatus::Built(p),
                    Err(e) => {
                        tracing::warn!(error = %e, "preview assembly failed");
                        PreviewStatus::Failed(e.to_string())
                    }
                }
            }
        };
    }

    Ok(set)
}

#[cfg(test)]
#[path = "../../tests/unit/capture/orchestrator.rs"]
mod tests;
