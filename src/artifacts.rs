//! Append-only registry of everything a pipeline run created.
//!
//! Every create primitive the pipeline calls is followed immediately by a registration, so cleanup
//! walks this registry instead of searching the scene for strays.

use std::path::{Path, PathBuf};

use crate::host::scene::{ImageId, MaterialId, ModifierId, ObjectId};

/// Why an artifact exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub enum ArtifactRole {
    /// Capture target created by the surface manager.
    ReferenceSurface,
    /// Temporary routing material created by the bake driver.
    BakeMaterial,
    /// Surface created by the preview assembler.
    PreviewSurface,
    /// Material created by the preview assembler.
    PreviewMaterial,
    /// Image loaded by the preview assembler.
    PreviewImage,
    /// Modifier added by the preview assembler.
    PreviewModifier,
    /// File written to the output directory.
    OutputFile,
}

impl ArtifactRole {
    /// Teardown tier: lower tiers are deleted first, so dependents go before dependencies.
    pub fn teardown_tier(self) -> u8 {
        match self {
            ArtifactRole::PreviewModifier => 0,
            ArtifactRole::PreviewMaterial | ArtifactRole::BakeMaterial => 1,
            ArtifactRole::PreviewImage => 2,
            ArtifactRole::PreviewSurface => 3,
            ArtifactRole::ReferenceSurface => 4,
            ArtifactRole::OutputFile => 5,
        }
    }
}

/// Handle of a registered artifact.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ArtifactHandle {
    /// Scene object.
    Object(ObjectId),
    /// Material.
    Material(MaterialId),
    /// Image datablock.
    Image(ImageId),
    /// Modifier on an object's stack.
    Modifier {
        /// Owning object.
        object: ObjectId,
        /// Modifier handle.
        modifier: ModifierId,
    },
    /// File on disk.
    File(PathBuf),
}

impl std::fmt::Display for ArtifactHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactHandle::Object(id) => write!(f, "object#{}", id.0),
            ArtifactHandle::Material(id) => write!(f, "material#{}", id.0),
            ArtifactHandle::Image(id) => write!(f, "image#{}", id.0),
            ArtifactHandle::Modifier { object, modifier } => {
                write!(f, "modifier#{} on object#{}", modifier.0, object.0)
            }
            ArtifactHandle::File(p) => write!(f, "file '{}'", p.display()),
        }
    }
}

/// One registry entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    /// Registration order, starting at 0.
    pub seq: u64,
    /// Why it exists.
    pub role: ArtifactRole,
    /// What to delete.
    pub handle: ArtifactHandle,
}

/// Everything one or more pipeline runs created, in creation order.
#[derive(Clone, Debug, Default)]
pub struct PipelineArtifacts {
    entries: Vec<Artifact>,
}

impl PipelineArtifacts {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a created artifact. Registering the same handle twice keeps the first entry and
    /// returns `false`; reruns overwrite files at the same paths.
    pub fn register(&mut self, role: ArtifactRole, handle: ArtifactHandle) -> bool {
        if self.entries.iter().any(|a| a.handle == handle) {
            return false;
        }
        let seq = self.entries.len() as u64;
        self.entries.push(Artifact { seq, role, handle });
        true
    }

    pub(crate) fn register_object(&mut self, role: ArtifactRole, id: ObjectId) {
        self.register(role, ArtifactHandle::Object(id));
    }

    pub(crate) fn register_material(&mut self, role: ArtifactRole, id: MaterialId) {
        self.register(role, ArtifactHandle::Material(id));
    }

    pub(crate) fn register_file(&mut self, path: &Path) {
        self.register(ArtifactRole::OutputFile, ArtifactHandle::File(path.to_path_buf()));
    }

    /// Entries in creation order.
    pub fn entries(&self) -> &[Artifact] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries with `role`, in creation order.
    pub fn with_role(&self, role: ArtifactRole) -> impl Iterator<Item = &Artifact> {
        self.entries.iter().filter(move |a| a.role == role)
    }

    /// Entries in deletion order: by teardown tier, newest first within a tier.
    pub fn teardown_order(&self) -> Vec<&Artifact> {
        let mut order: Vec<&Artifact> = self.entries.iter().collect();
        order.sort_by(|a, b| {
            a.role
                .teardown_tier()
                .cmp(&b.role.teardown_tier())
                .then(b.seq.cmp(&a.seq))
        });
        order
    }
}

#[cfg(test)]
#[path = "../tests/unit/artifacts/artifacts.rs"]
mod tests;
