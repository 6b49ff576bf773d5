use std::path::{Path, PathBuf};

use crate::{
    artifacts::{ArtifactRole, PipelineArtifacts},
    capture::encode,
    channel::{ChannelKind, ColorSpace, PixelLayout},
    config::CaptureConfig,
    host::{
        bake::{BakeBackend, BakeError, BakedImage, PassSettings},
        scene::{HostError, MaterialDesc, MaterialId, MaterialKind, ObjectId},
    },
    surface::ReferenceSurface,
};

/// A channel image written to disk.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageArtifact {
    /// Captured channel.
    pub kind: ChannelKind,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Storage layout of the file.
    pub layout: PixelLayout,
    /// Color space to load the file with.
    pub color_space: ColorSpace,
    /// Written file.
    pub path: PathBuf,
    /// Raw scene-unit depth EXR, when one was requested and written.
    pub raw_path: Option<PathBuf>,
}

/// Why one channel could not be captured.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum BakeFailure {
    /// The backend bake call failed.
    #[error("bake failed: {0}")]
    Backend(#[from] BakeError),
    /// The bake completed but no pixel received a valid sample.
    #[error("bake produced no valid samples")]
    NoValidSamples,
    /// The backend returned an image that does not match the request.
    #[error("unexpected bake output: {0}")]
    UnexpectedImage(String),
    /// Encoding or writing the output file failed.
    #[error("write failed: {0}")]
    Write(String),
    /// The surface's prior material binding could not be put back.
    #[error("material binding could not be restored: {0}")]
    BindingRestore(String),
    /// A scene primitive needed to route the bake failed.
    #[error("host error: {0}")]
    Host(#[from] HostError),
}

/// Outcome of one channel.
#[derive(Clone, Debug, PartialEq)]
pub enum ChannelOutcome {
    /// Captured and written.
    Success(ImageArtifact),
    /// Not captured.
    Failed(BakeFailure),
}

/// Per-channel result of a capture run.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureResult {
    /// Channel.
    pub kind: ChannelKind,
    /// What happened.
    pub outcome: ChannelOutcome,
}

impl CaptureResult {
    /// Whether the channel was captured.
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ChannelOutcome::Success(_))
    }

    /// Image artifact, present iff successful.
    pub fn image(&self) -> Option<&ImageArtifact> {
        match &self.outcome {
            ChannelOutcome::Success(img) => Some(img),
            ChannelOutcome::Failed(_) => None,
        }
    }

    /// Failure reason, present iff failed.
    pub fn failure(&self) -> Option<&BakeFailure> {
        match &self.outcome {
            ChannelOutcome::Success(_) => None,
            ChannelOutcome::Failed(reason) => Some(reason),
        }
    }

    /// Written file, present iff successful.
    pub fn path(&self) -> Option<&Path> {
        self.image().map(|img| img.path.as_path())
    }
}

/// Name of the temporary material routing `kind` onto the reference surface.
pub(crate) fn routing_material_name(kind: ChannelKind) -> String {
    format!("QG_Bake_{}", kind.name())
}

/// Holds the surface's material binding for the duration of one bake.
///
/// The binding found at acquisition is put back by [`BindingScope::restore`], or on drop if the
/// scope is left early.
struct BindingScope<'a> {
    host: &'a mut dyn BakeBackend,
    surface: ObjectId,
    prior: Option<MaterialId>,
    restored: bool,
}

impl<'a> BindingScope<'a> {
    fn acquire(host: &'a mut dyn BakeBackend, surface: ObjectId) -> Result<Self, BakeFailure> {
        let prior = host.material_binding(surface)?;
        Ok(Self {
            host,
            surface,
            prior,
            restored: false,
        })
    }

    fn bind(&mut self, material: MaterialId) -> Result<(), BakeFailure> {
        self.host.bind_material(self.surface, Some(material))?;
        Ok(())
    }

    fn host(&mut self) -> &mut dyn BakeBackend {
        &mut *self.host
    }

    fn restore(mut self) -> Result<(), BakeFailure> {
        self.restored = true;
        self.host
            .bind_material(self.surface, self.prior)
            .map_err(|e| BakeFailure::BindingRestore(e.to_string()))
    }
}

impl Drop for BindingScope<'_> {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        if let Err(e) = self.host.bind_material(self.surface, self.prior) {
            tracing::warn!(surface = self.surface.0, error = %e, "failed to restore material binding");
        }
    }
}

/// Capture one channel of `surface` into `config.output_dir`.
///
/// Runs exactly one bake. Every failure is returned as data in the result; the surface's material
/// binding is the same on return as on entry.
#[tracing::instrument(
    skip(host, surface, config, artifacts),
    fields(surface = %surface.name, channel = %kind)
)]
pub fn bake_channel(
    host: &mut dyn BakeBackend,
    surface: &ReferenceSurface,
    kind: ChannelKind,
    config: &CaptureConfig,
    artifacts: &mut PipelineArtifacts,
) -> CaptureResult {
    let outcome = match capture(host, surface, kind, config, artifacts) {
        Ok(image) => {
            tracing::info!(path = %image.path.display(), "channel captured");
            ChannelOutcome::Success(image)
        }
        Err(reason) => {
            tracing::warn!(%reason, "channel failed");
            ChannelOutcome::Failed(reason)
        }
    };
    CaptureResult { kind, outcome }
}

fn capture(
    host: &mut dyn BakeBackend,
    surface: &ReferenceSurface,
    kind: ChannelKind,
    config: &CaptureConfig,
    artifacts: &mut PipelineArtifacts,
) -> Result<ImageArtifact, BakeFailure> {
    let spec = kind.spec();
    if !host.supports(spec.pass) {
        return Err(BakeError::Unsupported(spec.pass).into());
    }
    let settings = PassSettings {
        pass: spec.pass,
        components: spec.components,
        clip: config.depth,
    };

    let route = host.create_material(&MaterialDesc {
        name: routing_material_name(kind),
        kind: MaterialKind::BakeRoute { pass: spec.pass },
    })?;
    artifacts.register_material(ArtifactRole::BakeMaterial, route);

    let baked = bake_routed(host, surface.id, route, &settings, config.resolution);
    match host.delete_material(route) {
        Ok(_) => tracing::debug!(material = route.0, "routing material removed"),
        Err(e) => tracing::warn!(material = route.0, error = %e, "routing material left for cleanup"),
    }
    let baked = baked?;
    check_baked(&baked, &settings, config.resolution)?;

    let path = config.image_path(&surface.name, kind);
    artifacts.register_file(&path);
    encode::write_channel_png(&path, kind, &baked, config.depth)
        .map_err(|e| BakeFailure::Write(format!("{e:#}")))?;

    let raw_path = if kind == ChannelKind::Depth && config.write_depth_exr {
        let raw = config.raw_depth_path(&surface.name);
        artifacts.register_file(&raw);
        match encode::write_raw_depth_exr(&raw, &baked, config.depth) {
            Ok(()) => Some(raw),
            Err(e) => {
                tracing::warn!(path = %raw.display(), error = %format!("{e:#}"), "raw depth not written");
                None
            }
        }
    } else {
        None
    };

    Ok(ImageArtifact {
        kind,
        width: baked.width,
        height: baked.height,
        layout: spec.layout,
        color_space: spec.color_space,
        path,
        raw_path,
    })
}

fn bake_routed(
    host: &mut dyn BakeBackend,
    surface: ObjectId,
    route: MaterialId,
    settings: &PassSettings,
    resolution: u32,
) -> Result<BakedImage, BakeFailure> {
    let mut scope = BindingScope::acquire(host, surface)?;
    scope.bind(route)?;
    let baked = scope.host().bake(surface, settings, resolution);
    scope.restore()?;
    Ok(baked?)
}

fn check_baked(img: &BakedImage, settings: &PassSettings, resolution: u32) -> Result<(), BakeFailure> {
    if img.width != resolution || img.height != resolution {
        return Err(BakeFailure::UnexpectedImage(format!(
            "{}x{} image for a {resolution}x{resolution} request",
            img.width, img.height
        )));
    }
    if img.components != settings.components {
        return Err(BakeFailure::UnexpectedImage(format!(
            "{} components, expected {}",
            img.components, settings.components
        )));
    }
    if img.samples.len() != img.expected_len() {
        return Err(BakeFailure::UnexpectedImage(format!(
            "{} samples, expected {}",
            img.samples.len(),
            img.expected_len()
        )));
    }
    if img.valid_samples == 0 {
        return Err(BakeFailure::NoValidSamples);
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/capture/driver.rs"]
mod tests;
