use crate::{
    channel::BakePass,
    config::DepthRange,
    host::scene::{ObjectId, SceneHost},
};

/// Backend settings for one bake pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PassSettings {
    /// Pass to render.
    pub pass: BakePass,
    /// Components expected per pixel in the returned image.
    pub components: u8,
    /// Capture volume along the surface's -Z; geometry outside it is clipped.
    pub clip: DepthRange,
}

/// Raw bake output: linear `f32` samples, row-major, top row first.
///
/// Depth samples are scene-unit distances below the surface; normals are tangent-space vectors in
/// `[-1,1]`; everything else is already in `[0,1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct BakedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Components per pixel.
    pub components: u8,
    /// `width * height * components` samples.
    pub samples: Vec<f32>,
    /// Pixels that received at least one valid sample.
    pub valid_samples: u64,
}

impl BakedImage {
    /// Expected `samples.len()` for the declared dimensions.
    pub fn expected_len(&self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(usize::from(self.components))
    }
}

/// Failure reported by the bake primitive.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum BakeError {
    /// The render itself failed.
    #[error("render failed: {0}")]
    Render(String),
    /// The backend ran out of memory.
    #[error("out of memory")]
    OutOfMemory,
    /// The backend cannot produce this pass.
    #[error("pass {0:?} is not supported by this backend")]
    Unsupported(BakePass),
    /// The surface's bound material does not route the requested pass.
    #[error("surface is not routed for pass {0:?}")]
    NotRouted(BakePass),
}

/// The host's rendering/baking primitive.
///
/// `bake` is an opaque blocking call: it returns once the bake finished or failed, regardless of
/// how the host schedules the work internally.
pub trait BakeBackend: SceneHost {
    /// Whether `pass` can be baked at all.
    fn supports(&self, pass: BakePass) -> bool {
        let _ = pass;
        true
    }

    /// Bake one pass of `surface` at `resolution`x`resolution`.
    fn bake(
        &mut self,
        surface: ObjectId,
        settings: &PassSettings,
        resolution: u32,
    ) -> Result<BakedImage, BakeError>;
}
