//! Preview assembly: a new surface redisplaying a capture run's images.

use crate::{
    artifacts::{ArtifactHandle, ArtifactRole, PipelineArtifacts},
    capture::{
        metadata::DisplacementCalibration,
        orchestrator::{CaptureResultSet, RunStatus},
    },
    channel::ChannelKind,
    config::{CaptureConfig, DepthRange},
    foundation::error::{QuadgrabError, QuadgrabResult},
    host::scene::{
        BlendMode, ImageId, MaterialDesc, MaterialId, MaterialInput, MaterialKind, ModifierDesc,
        ModifierId, ObjectId, SceneHost, SurfaceDesc, Visibility,
    },
};

/// Grid cuts per side of a preview surface.
pub const DEFAULT_PREVIEW_GRID: u32 = 10;

/// Simple subdivision levels added under the displacement modifier.
pub const DEFAULT_SUBDIVISION_LEVELS: u8 = 4;

/// How [`assemble_preview`] builds its objects.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PreviewOptions {
    /// Attach subdivision + displacement when Depth was captured.
    pub displace: bool,
    /// Depth range the Depth image was remapped with.
    pub depth: DepthRange,
    /// Grid cuts per side of the preview surface.
    pub grid_subdivisions: u32,
    /// Subdivision levels under the displacement.
    pub subdivision_levels: u8,
}

impl PreviewOptions {
    /// Options for depth images remapped with `depth`, displacement on.
    pub fn new(depth: DepthRange) -> Self {
        Self {
            displace: true,
            depth,
            grid_subdivisions: DEFAULT_PREVIEW_GRID,
            subdivision_levels: DEFAULT_SUBDIVISION_LEVELS,
        }
    }
}

impl From<&CaptureConfig> for PreviewOptions {
    fn from(cfg: &CaptureConfig) -> Self {
        Self {
            displace: cfg.displace_preview,
            ..Self::new(cfg.depth)
        }
    }
}

/// Objects created by one [`assemble_preview`] call.
#[derive(Clone, Debug, PartialEq)]
pub struct PreviewAssembly {
    /// Preview surface.
    pub surface: ObjectId,
    /// Material bound to it.
    pub material: MaterialId,
    /// Loaded images, in capture order.
    pub images: Vec<(ChannelKind, ImageId)>,
    /// Modifier stack, bottom first. Empty without displacement.
    pub modifiers: Vec<ModifierId>,
    /// Blend mode of the material.
    pub blend: BlendMode,
    /// Displacement settings, when the stack was attached.
    pub displacement: Option<DisplacementCalibration>,
}

/// Build a preview surface for `result_set`.
///
/// The surface copies the reference surface's transform and size. Its material binds every
/// captured image to the matching shading input; failed channels are left out. When Depth was
/// captured and `opts.displace` is set, a subdivision + displacement stack reproduces the captured
/// relief. Every created object is registered in `artifacts`, so a failure halfway leaves nothing
/// cleanup cannot find.
///
/// Each call creates a new, independent preview.
#[tracing::instrument(skip_all, fields(surface = %result_set.surface.name))]
pub fn assemble_preview(
    host: &mut dyn SceneHost,
    result_set: &CaptureResultSet,
    opts: &PreviewOptions,
    artifacts: &mut PipelineArtifacts,
) -> QuadgrabResult<PreviewAssembly> {
    let reference = &result_set.surface;
    if result_set.status == RunStatus::Failed {
        return Err(QuadgrabError::no_usable_capture(format!(
            "none of the {} attempted channels of '{}' succeeded",
            result_set.results.len(),
            reference.name
        )));
    }

    let surface = host.create_surface(&SurfaceDesc {
        name: format!("{}_Preview", reference.name),
        transform: reference.transform,
        size: reference.size,
        subdivisions: opts.grid_subdivisions,
        visibility: Visibility::Hidden,
    })?;
    artifacts.register_object(ArtifactRole::PreviewSurface, surface);

    let mut images = Vec::new();
    let mut inputs = Vec::new();
    let mut depth_image = None;
    for result in result_set.succeeded() {
        let Some(img) = result.image() else {
            continue;
        };
        let spec = result.kind.spec();
        let wanted = spec.shading_input.is_some() || (opts.displace && result.kind == ChannelKind::Depth);
        if !wanted {
            continue;
        }

        let id = host.load_image(&img.path, img.color_space)?;
        artifacts.register(ArtifactRole::PreviewImage, ArtifactHandle::Image(id));
        images.push((result.kind, id));

        match spec.shading_input {
            Some(input) => inputs.push(MaterialInput {
                input,
                image: id,
                color_space: img.color_space,
            }),
            None => depth_image = Some(id),
        }
    }

    let blend = if result_set
        .result(ChannelKind::Alpha)
        .is_some_and(|r| r.is_success())
    {
        BlendMode::AlphaClip
    } else {
        BlendMode::Opaque
    };
    let material = host.create_material(&MaterialDesc {
        name: format!("{}_QG_Preview_Mat", reference.name),
        kind: MaterialKind::Preview { inputs, blend },
    })?;
    artifacts.register_material(ArtifactRole::PreviewMaterial, material);
    host.bind_material(surface, Some(material))?;

    let mut modifiers = Vec::new();
    let mut displacement = None;
    if let Some(image) = depth_image {
        let cal = DisplacementCalibration::for_depth(opts.depth);
        let stack = [
            ModifierDesc::Subdivision {
                levels: opts.subdivision_levels,
                simple: true,
            },
            ModifierDesc::Displace {
                image,
                mid_level: cal.mid_level,
                strength: cal.strength,
            },
        ];
        for desc in &stack {
            let id = host.add_modifier(surface, desc)?;
            artifacts.register(
                ArtifactRole::PreviewModifier,
                ArtifactHandle::Modifier {
                    object: surface,
                    modifier: id,
                },
            );
            modifiers.push(id);
        }
        displacement = Some(cal);
    }

    tracing::info!(
        preview = surface.0,
        images = images.len(),
        displaced = displacement.is_some(),
        "preview assembled"
    );
    Ok(PreviewAssembly {
        surface,
        material,
        images,
        modifiers,
        blend,
        displacement,
    })
}

#[cfg(test)]
#[path = "../tests/unit/preview/preview.rs"]
mod tests;
