//! QuadGrab captures surface appearance channels from a 3D scene onto a planar reference surface
//! and assembles a preview object that redisplays them.
//!
//! # Pipeline overview
//!
//! 1. **Surface**: [`ensure_surface`] reuses or creates the reference quad.
//! 2. **Capture**: [`run_capture`] bakes every requested [`ChannelKind`] in a fixed order through
//!    [`bake_channel`], writing `<surface>_<Channel>.png` into the output directory.
//! 3. **Preview** (optional): [`assemble_preview`] builds a surface + material (+ displacement)
//!    from the successful channels.
//! 4. **Cleanup**: [`cleanup`] removes everything recorded in [`PipelineArtifacts`].
//!
//! The scene and the renderer are reached only through the [`SceneHost`] and [`BakeBackend`]
//! traits. [`MemoryScene`] is a complete in-memory host used by the CLI and the tests.
//!
//! Design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Failures are data per channel**: one channel's bake failure never aborts the run.
//! - **Registry-driven teardown**: every created object is registered the moment it exists.
//! - **Scoped bindings**: the reference surface's material binding is restored on every exit path.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod artifacts;
mod capture;
mod channel;
mod cleanup;
mod config;
mod foundation;
mod host;
mod preview;
mod surface;

pub use artifacts::{Artifact, ArtifactHandle, ArtifactRole, PipelineArtifacts};
pub use capture::driver::{
    BakeFailure, CaptureResult, ChannelOutcome, ImageArtifact, bake_channel,
};
pub use capture::metadata::{
    CaptureMetadata, ChannelRecord, ChannelStatus, DisplacementCalibration,
};
pub use capture::orchestrator::{
    CancelToken, CaptureObserver, CaptureResultSet, NoopObserver, PreviewStatus, RunStatus,
    run_capture, run_capture_with,
};
pub use channel::{BakePass, ChannelKind, ChannelSpec, ColorSpace, PixelLayout, ShadingInput};
pub use cleanup::{CleanupFailure, CleanupReport, cleanup};
pub use config::{
    CaptureConfig, CleanupOptions, DEFAULT_DEPTH_NEAR, DEFAULT_SURFACE_NAME, DepthRange,
    MAX_RESOLUTION,
};
pub use foundation::core::{Aabb, Point, Rect, Transform3D, Vec3};
pub use foundation::error::{QuadgrabError, QuadgrabResult};
pub use host::bake::{BakeBackend, BakeError, BakedImage, PassSettings};
pub use host::memory::{BakeRecord, MemoryScene, SceneDescription, SceneLayer};
pub use host::scene::{
    BlendMode, HostError, HostResult, ImageId, MaterialDesc, MaterialId, MaterialInput,
    MaterialKind, ModifierDesc, ModifierId, ObjectId, Removal, SceneHost, Size, SurfaceDesc,
    SurfaceGeometry, Visibility,
};
pub use preview::{
    DEFAULT_PREVIEW_GRID, DEFAULT_SUBDIVISION_LEVELS, PreviewAssembly, PreviewOptions,
    assemble_preview,
};
pub use surface::{ReferenceSurface, SurfacePlacement, ensure_surface, ensure_surface_at};
