use std::path::Path;

use crate::{
    channel::{BakePass, ColorSpace, ShadingInput},
    foundation::core::{Transform3D, Vec3},
};

pub use kurbo::Size;

/// Handle of a scene object.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ObjectId(pub u64);

/// Handle of a material.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct MaterialId(pub u64);

/// Handle of an image datablock loaded into the scene.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ImageId(pub u64);

/// Handle of a modifier-stack entry, scoped to its object.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ModifierId(pub u64);

/// Failure of a scene primitive.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The host ran out of a resource.
    #[error("resource exhaustion: {0}")]
    Exhausted(String),
    /// A handle the operation requires does not exist.
    #[error("unknown handle: {0}")]
    UnknownHandle(String),
    /// The host refused the operation.
    #[error("rejected: {0}")]
    Rejected(String),
}

/// Result type of scene primitives.
pub type HostResult<T> = Result<T, HostError>;

/// Outcome of a delete primitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Removal {
    /// The handle existed and was removed.
    Removed,
    /// The handle was already gone.
    Missing,
}

/// Render visibility of a created surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Visibility {
    /// Visible to camera and all ray types.
    #[default]
    Rendered,
    /// Excluded from renders and bakes of other objects; drawn as wire in viewports.
    Hidden,
}

/// Request to create a planar surface centered on its origin in the local XY plane.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceDesc {
    /// Display name. Hosts suffix it when another live object already uses it, since output files
    /// are named after the surface.
    pub name: String,
    /// Object-to-world transform.
    pub transform: Transform3D,
    /// Local width/height before scale.
    pub size: Size,
    /// Grid cuts per side; `0` is a single quad.
    pub subdivisions: u32,
    /// Render visibility.
    pub visibility: Visibility,
}

/// Geometry of an existing surface object as reported by the host.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceGeometry {
    /// Object name.
    pub name: String,
    /// Object-to-world transform.
    pub transform: Transform3D,
    /// Local-space vertices of the object's single face, in winding order.
    pub vertices: Vec<Vec3>,
}

/// Blend mode of a preview material.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlendMode {
    /// Fully opaque.
    #[default]
    Opaque,
    /// Alpha-clipped, back faces not shown through.
    AlphaClip,
}

/// One image bound to one shading input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaterialInput {
    /// Target shading input.
    pub input: ShadingInput,
    /// Image feeding it.
    pub image: ImageId,
    /// Color management of the image.
    pub color_space: ColorSpace,
}

/// What a material does.
#[derive(Clone, Debug, PartialEq)]
pub enum MaterialKind {
    /// Temporary material that routes one bake pass onto the surface it is bound to.
    BakeRoute {
        /// Routed pass.
        pass: BakePass,
    },
    /// Material redisplaying captured images.
    Preview {
        /// Image inputs, at most one per shading input.
        inputs: Vec<MaterialInput>,
        /// Blend mode.
        blend: BlendMode,
    },
}

/// Request to create a material.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialDesc {
    /// Display name.
    pub name: String,
    /// Behavior.
    pub kind: MaterialKind,
}

/// Request to append a modifier to an object's stack.
#[derive(Clone, Debug, PartialEq)]
pub enum ModifierDesc {
    /// Subdivision surface.
    Subdivision {
        /// Subdivision levels.
        levels: u8,
        /// Simple (non-smoothing) subdivision.
        simple: bool,
    },
    /// Displacement along local Z driven by an image through UV coordinates.
    Displace {
        /// Height image.
        image: ImageId,
        /// Image value producing zero displacement.
        mid_level: f64,
        /// Scene units per unit of image value.
        strength: f64,
    },
}

/// Scene object creation/deletion primitives of the host.
///
/// All methods are blocking. Implementations are driven from one thread; `&mut self` on every
/// mutating primitive means a host cannot be driven by two pipeline runs at once.
pub trait SceneHost {
    /// Geometry of `id`, or `None` if no such object exists.
    fn surface_geometry(&self, id: ObjectId) -> Option<SurfaceGeometry>;

    /// Create a planar surface object with a name no other live object uses.
    fn create_surface(&mut self, desc: &SurfaceDesc) -> HostResult<ObjectId>;

    /// Delete an object together with its modifier stack.
    fn delete_object(&mut self, id: ObjectId) -> HostResult<Removal>;

    /// Create a material.
    fn create_material(&mut self, desc: &MaterialDesc) -> HostResult<MaterialId>;

    /// Delete a material, unbinding it from any object using it.
    fn delete_material(&mut self, id: MaterialId) -> HostResult<Removal>;

    /// Material currently bound to `object`.
    fn material_binding(&self, object: ObjectId) -> HostResult<Option<MaterialId>>;

    /// Bind `material` to `object`, or clear the binding with `None`.
    fn bind_material(&mut self, object: ObjectId, material: Option<MaterialId>) -> HostResult<()>;

    /// Load an image file into the scene.
    fn load_image(&mut self, path: &Path, color_space: ColorSpace) -> HostResult<ImageId>;

    /// Delete an image datablock. Never touches the file on disk.
    fn delete_image(&mut self, id: ImageId) -> HostResult<Removal>;

    /// Append a modifier to `object`'s stack.
    fn add_modifier(&mut self, object: ObjectId, desc: &ModifierDesc) -> HostResult<ModifierId>;

    /// Remove one modifier from `object`'s stack.
    fn remove_modifier(&mut self, object: ObjectId, id: ModifierId) -> HostResult<Removal>;
}
