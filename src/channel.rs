//! Channel enumeration and the per-channel lookup table.
//!
//! Every decision that depends on the channel (which backend pass to run, how many components the
//! backend returns, how the image is stored, which shading input it drives on the preview) is read
//! from [`ChannelSpec`] rather than branched on at each call site.

/// One captured surface-appearance attribute.
///
/// Declaration order is the fixed capture order: sets of channels iterate in this order and
/// capture results are reported in it.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum ChannelKind {
    /// Diffuse albedo, 3 components.
    BaseColor,
    /// Surface normal, 3 components.
    Normal,
    /// Roughness, 1 component.
    Roughness,
    /// Metallic, 1 component.
    Metallic,
    /// Specular level, 1 component.
    Specular,
    /// Ambient occlusion, 1 component.
    AmbientOcclusion,
    /// Coverage/alpha, 1 component.
    Alpha,
    /// Distance below the reference surface, 1 float component.
    Depth,
}

impl ChannelKind {
    /// All channels in capture order.
    pub const ALL: [ChannelKind; 8] = [
        ChannelKind::BaseColor,
        ChannelKind::Normal,
        ChannelKind::Roughness,
        ChannelKind::Metallic,
        ChannelKind::Specular,
        ChannelKind::AmbientOcclusion,
        ChannelKind::Alpha,
        ChannelKind::Depth,
    ];

    /// Stable name used in file names and reports.
    pub fn name(self) -> &'static str {
        self.spec().name
    }

    /// Lookup-table entry for this channel.
    pub fn spec(self) -> &'static ChannelSpec {
        &CHANNEL_TABLE[self as usize]
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Backend render pass selected for a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum BakePass {
    /// Diffuse color pass.
    DiffuseColor,
    /// Normal pass, tangent space of the reference surface.
    Normal,
    /// Roughness AOV.
    Roughness,
    /// Metallic AOV.
    Metallic,
    /// Specular AOV.
    Specular,
    /// Ambient occlusion pass.
    AmbientOcclusion,
    /// Coverage/alpha.
    Alpha,
    /// Z pass, distance along the surface's -Z in scene units.
    Depth,
}

/// Storage layout of a written channel image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PixelLayout {
    /// 8-bit RGB.
    Rgb8,
    /// 8-bit grayscale.
    Luma8,
    /// 16-bit grayscale, used for remapped depth.
    Luma16,
}

impl PixelLayout {
    /// Number of color components stored per pixel.
    pub fn components(self) -> u8 {
        match self {
            PixelLayout::Rgb8 => 3,
            PixelLayout::Luma8 | PixelLayout::Luma16 => 1,
        }
    }
}

/// Color space tag carried to the preview material's image inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ColorSpace {
    /// sRGB-encoded color data.
    Srgb,
    /// Linear data that must not be color managed.
    NonColor,
}

/// Shading input of the preview material driven by a channel image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ShadingInput {
    /// Base color input.
    BaseColor,
    /// Normal input (through a normal-map node on hosts that need one).
    Normal,
    /// Roughness input.
    Roughness,
    /// Metallic input.
    Metallic,
    /// Specular level input.
    Specular,
    /// Ambient occlusion multiplier.
    AmbientOcclusion,
    /// Alpha input.
    Alpha,
}

/// Static description of how one channel is baked, stored and previewed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelSpec {
    /// Channel this entry describes.
    pub kind: ChannelKind,
    /// Stable name used in file names.
    pub name: &'static str,
    /// Backend pass to run.
    pub pass: BakePass,
    /// Components the backend must return per pixel.
    pub components: u8,
    /// How the image is stored on disk.
    pub layout: PixelLayout,
    /// Color space of the stored image.
    pub color_space: ColorSpace,
    /// Preview material input; `None` for channels that drive geometry instead.
    pub shading_input: Option<ShadingInput>,
}

const fn entry(
    kind: ChannelKind,
    name: &'static str,
    pass: BakePass,
    layout: PixelLayout,
    color_space: ColorSpace,
    shading_input: Option<ShadingInput>,
) -> ChannelSpec {
    let components = match layout {
        PixelLayout::Rgb8 => 3,
        PixelLayout::Luma8 | PixelLayout::Luma16 => 1,
    };
    ChannelSpec {
        kind,
        name,
        pass,
        components,
        layout,
        color_space,
        shading_input,
    }
}

// Indexed by `ChannelKind as usize`.
static CHANNEL_TABLE: [ChannelSpec; 8] = [
    entry(
        ChannelKind::BaseColor,
        "BaseColor",
        BakePass::DiffuseColor,
        PixelLayout::Rgb8,
        ColorSpace::Srgb,
        Some(ShadingInput::BaseColor),
    ),
    entry(
        ChannelKind::Normal,
        "Normal",
        BakePass::Normal,
        PixelLayout::Rgb8,
        ColorSpace::NonColor,
        Some(ShadingInput::Normal),
    ),
    entry(
        ChannelKind::Roughness,
        "Roughness",
        BakePass::Roughness,
        PixelLayout::Luma8,
        ColorSpace::NonColor,
        Some(ShadingInput::Roughness),
    ),
    entry(
        ChannelKind::Metallic,
        "Metallic",
        BakePass::Metallic,
        PixelLayout::Luma8,
        ColorSpace::NonColor,
        Some(ShadingInput::Metallic),
    ),
    entry(
        ChannelKind::Specular,
        "Specular",
        BakePass::Specular,
        PixelLayout::Luma8,
        ColorSpace::NonColor,
        Some(ShadingInput::Specular),
    ),
    entry(
        ChannelKind::AmbientOcclusion,
        "AmbientOcclusion",
        BakePass::AmbientOcclusion,
        PixelLayout::Luma8,
        ColorSpace::NonColor,
        Some(ShadingInput::AmbientOcclusion),
    ),
    entry(
        ChannelKind::Alpha,
        "Alpha",
        BakePass::Alpha,
        PixelLayout::Luma8,
        ColorSpace::NonColor,
        Some(ShadingInput::Alpha),
    ),
    entry(
        ChannelKind::Depth,
        "Depth",
        BakePass::Depth,
        PixelLayout::Luma16,
        ColorSpace::NonColor,
        None,
    ),
];

#[cfg(test)]
#[path = "../tests/unit/channel/channel.rs"]
mod tests;
