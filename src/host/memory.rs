use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    path::{Path, PathBuf},
};

use crate::{
    channel::{BakePass, ColorSpace},
    foundation::core::{Point, Rect, Transform3D, Vec3},
    host::{
        bake::{BakeBackend, BakeError, BakedImage, PassSettings},
        scene::{
            HostError, HostResult, ImageId, MaterialDesc, MaterialId, MaterialKind, ModifierDesc,
            ModifierId, ObjectId, Removal, SceneHost, SurfaceDesc, SurfaceGeometry, Visibility,
        },
    },
};

fn default_base_color() -> [f32; 3] {
    [0.8, 0.8, 0.8]
}

fn default_normal() -> [f32; 3] {
    [0.0, 0.0, 1.0]
}

fn default_half() -> f32 {
    0.5
}

fn default_one() -> f32 {
    1.0
}

/// A flat patch of material lying under the reference surface.
///
/// `footprint` is expressed in the surface's UV space (`[0,1]` on both axes, V up).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SceneLayer {
    /// Covered UV region.
    pub footprint: Rect,
    /// Distance below the surface in scene units.
    pub depth: f64,
    /// Linear base color.
    #[serde(default = "default_base_color")]
    pub base_color: [f32; 3],
    /// Tangent-space normal.
    #[serde(default = "default_normal")]
    pub normal: [f32; 3],
    /// Roughness.
    #[serde(default = "default_half")]
    pub roughness: f32,
    /// Metallic.
    #[serde(default)]
    pub metallic: f32,
    /// Specular level.
    #[serde(default = "default_half")]
    pub specular: f32,
    /// Ambient occlusion (1 = unoccluded).
    #[serde(default = "default_one")]
    pub occlusion: f32,
    /// Coverage.
    #[serde(default = "default_one")]
    pub alpha: f32,
}

impl SceneLayer {
    /// Layer with default material attributes.
    pub fn new(footprint: Rect, depth: f64) -> Self {
        Self {
            footprint,
            depth,
            base_color: default_base_color(),
            normal: default_normal(),
            roughness: default_half(),
            metallic: 0.0,
            specular: default_half(),
            occlusion: 1.0,
            alpha: 1.0,
        }
    }

    fn write_sample(&self, pass: BakePass, out: &mut [f32]) {
        match pass {
            BakePass::DiffuseColor => out.copy_from_slice(&self.base_color),
            BakePass::Normal => out.copy_from_slice(&self.normal),
            BakePass::Roughness => out[0] = self.roughness,
            BakePass::Metallic => out[0] = self.metallic,
            BakePass::Specular => out[0] = self.specular,
            BakePass::AmbientOcclusion => out[0] = self.occlusion,
            BakePass::Alpha => out[0] = self.alpha,
            BakePass::Depth => out[0] = self.depth as f32,
        }
    }
}

/// Serializable scene content for [`MemoryScene`].
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SceneDescription {
    /// Layers under the reference surface.
    pub layers: Vec<SceneLayer>,
}

fn pass_components(pass: BakePass) -> u8 {
    match pass {
        BakePass::DiffuseColor | BakePass::Normal => 3,
        _ => 1,
    }
}

fn background_sample(pass: BakePass, clip_far: f64, out: &mut [f32]) {
    match pass {
        BakePass::Normal => out.copy_from_slice(&default_normal()),
        BakePass::Depth => out[0] = clip_far as f32,
        BakePass::AmbientOcclusion => out[0] = 1.0,
        _ => out.fill(0.0),
    }
}

#[derive(Clone, Debug)]
struct ObjectRecord {
    name: String,
    transform: Transform3D,
    vertices: Vec<Vec3>,
    visibility: Visibility,
    material: Option<MaterialId>,
    modifiers: Vec<(ModifierId, ModifierDesc)>,
}

#[derive(Clone, Debug)]
struct ImageRecord {
    path: PathBuf,
    color_space: ColorSpace,
}

/// One call to [`BakeBackend::bake`] as observed by [`MemoryScene`].
#[derive(Clone, Debug, PartialEq)]
pub struct BakeRecord {
    /// Baked surface.
    pub surface: ObjectId,
    /// Requested settings.
    pub settings: PassSettings,
    /// Material bound to the surface while baking.
    pub bound_material: Option<MaterialId>,
}

/// In-memory host: a scene registry plus a CPU rasterizer over [`SceneLayer`]s.
///
/// Used as the reference host by the CLI and by tests. Bake failures and refused deletions can be
/// injected to exercise failure handling.
#[derive(Debug, Default)]
pub struct MemoryScene {
    next_id: u64,
    objects: BTreeMap<ObjectId, ObjectRecord>,
    materials: BTreeMap<MaterialId, MaterialDesc>,
    images: BTreeMap<ImageId, ImageRecord>,
    layers: Vec<SceneLayer>,
    faults: HashMap<BakePass, BakeError>,
    unsupported: HashSet<BakePass>,
    pinned: BTreeSet<u64>,
    bake_log: Vec<BakeRecord>,
}

impl MemoryScene {
    /// Empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scene holding `description`'s layers.
    pub fn from_description(description: SceneDescription) -> Self {
        Self {
            layers: description.layers,
            ..Self::default()
        }
    }

    /// Add a layer under the reference surface.
    pub fn add_layer(&mut self, layer: SceneLayer) {
        self.layers.push(layer);
    }

    /// Insert an arbitrary single-face object, bypassing [`SceneHost::create_surface`].
    pub fn insert_object(
        &mut self,
        name: impl Into<String>,
        transform: Transform3D,
        vertices: Vec<Vec3>,
    ) -> ObjectId {
        let id = ObjectId(self.alloc());
        self.objects.insert(
            id,
            ObjectRecord {
                name: name.into(),
                transform,
                vertices,
                visibility: Visibility::Rendered,
                material: None,
                modifiers: Vec::new(),
            },
        );
        id
    }

    /// Make every subsequent bake of `pass` fail with `err`.
    pub fn fail_pass(&mut self, pass: BakePass, err: BakeError) {
        self.faults.insert(pass, err);
    }

    /// Remove all injected bake failures.
    pub fn clear_faults(&mut self) {
        self.faults.clear();
    }

    /// Report `pass` as unsupported from [`BakeBackend::supports`].
    pub fn disable_pass(&mut self, pass: BakePass) {
        self.unsupported.insert(pass);
    }

    /// Make deletion of the handle with raw value `raw` fail with [`HostError::Rejected`].
    pub fn pin_handle(&mut self, raw: u64) {
        self.pinned.insert(raw);
    }

    /// Undo [`MemoryScene::pin_handle`].
    pub fn unpin_handle(&mut self, raw: u64) {
        self.pinned.remove(&raw);
    }

    /// Number of live objects.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Number of live materials.
    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    /// Number of loaded images.
    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Whether `id` is a live object.
    pub fn contains_object(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    /// Name of object `id`.
    pub fn object_name(&self, id: ObjectId) -> Option<&str> {
        self.objects.get(&id).map(|o| o.name.as_str())
    }

    /// Render visibility of object `id`.
    pub fn object_visibility(&self, id: ObjectId) -> Option<Visibility> {
        self.objects.get(&id).map(|o| o.visibility)
    }

    /// Modifier stack of object `id`, bottom first.
    pub fn modifiers(&self, id: ObjectId) -> Vec<ModifierDesc> {
        self.objects
            .get(&id)
            .map(|o| o.modifiers.iter().map(|(_, m)| m.clone()).collect())
            .unwrap_or_default()
    }

    /// Description of material `id`.
    pub fn material(&self, id: MaterialId) -> Option<&MaterialDesc> {
        self.materials.get(&id)
    }

    /// Source path of image `id`.
    pub fn image_path(&self, id: ImageId) -> Option<&Path> {
        self.images.get(&id).map(|i| i.path.as_path())
    }

    /// Color space image `id` was loaded with.
    pub fn image_color_space(&self, id: ImageId) -> Option<ColorSpace> {
        self.images.get(&id).map(|i| i.color_space)
    }

    /// Every bake request received so far, in call order.
    pub fn bake_log(&self) -> &[BakeRecord] {
        &self.bake_log
    }

    /// `base`, or `base.001`, `base.002`, ... when taken.
    fn unique_object_name(&self, base: &str) -> String {
        let taken = |name: &str| self.objects.values().any(|o| o.name == name);
        if !taken(base) {
            return base.to_string();
        }
        let mut n = 1u32;
        loop {
            let name = format!("{base}.{n:03}");
            if !taken(&name) {
                return name;
            }
            n += 1;
        }
    }

    fn alloc(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn check_pinned(&self, raw: u64, what: &str) -> HostResult<()> {
        if self.pinned.contains(&raw) {
            return Err(HostError::Rejected(format!("{what} {raw} is pinned")));
        }
        Ok(())
    }

    fn rasterize(&self, settings: &PassSettings, resolution: u32) -> BakedImage {
        let comps = usize::from(settings.components);
        let res = resolution as usize;
        let mut samples = vec![0.0f32; res * res * comps];
        let mut valid = 0u64;
        let inv = 1.0 / f64::from(resolution);

        for (py, row) in samples.chunks_mut(res * comps).enumerate() {
            // Row 0 is the top of the image, i.e. V = 1.
            let v = 1.0 - (py as f64 + 0.5) * inv;
            for (px, out) in row.chunks_mut(comps).enumerate() {
                let p = Point::new((px as f64 + 0.5) * inv, v);
                let hit = self
                    .layers
                    .iter()
                    .filter(|l| l.footprint.contains(p))
                    .filter(|l| l.depth >= settings.clip.near && l.depth <= settings.clip.far)
                    .min_by(|a, b| a.depth.total_cmp(&b.depth));
                match hit {
                    Some(layer) => {
                        layer.write_sample(settings.pass, out);
                        valid += 1;
                    }
                    None => background_sample(settings.pass, settings.clip.far, out),
                }
            }
        }

        BakedImage {
            width: resolution,
            height: resolution,
            components: settings.components,
            samples,
            valid_samples: valid,
        }
    }
}

impl SceneHost for MemoryScene {
    fn surface_geometry(&self, id: ObjectId) -> Option<SurfaceGeometry> {
        self.objects.get(&id).map(|o| SurfaceGeometry {
            name: o.name.clone(),
            transform: o.transform,
            vertices: o.vertices.clone(),
        })
    }

    fn create_surface(&mut self, desc: &SurfaceDesc) -> HostResult<ObjectId> {
        if !(desc.size.width > 0.0 && desc.size.height > 0.0) {
            return Err(HostError::Rejected(format!(
                "surface '{}' must have a positive size",
                desc.name
            )));
        }
        let hw = desc.size.width * 0.5;
        let hh = desc.size.height * 0.5;
        let name = self.unique_object_name(&desc.name);
        let id = ObjectId(self.alloc());
        self.objects.insert(
            id,
            ObjectRecord {
                name,
                transform: desc.transform,
                vertices: vec![
                    Vec3::new(-hw, -hh, 0.0),
                    Vec3::new(hw, -hh, 0.0),
                    Vec3::new(hw, hh, 0.0),
                    Vec3::new(-hw, hh, 0.0),
                ],
                visibility: desc.visibility,
                material: None,
                modifiers: Vec::new(),
            },
        );
        Ok(id)
    }

    fn delete_object(&mut self, id: ObjectId) -> HostResult<Removal> {
        if !self.objects.contains_key(&id) {
            return Ok(Removal::Missing);
        }
        self.check_pinned(id.0, "object")?;
        self.objects.remove(&id);
        Ok(Removal::Removed)
    }

    fn create_material(&mut self, desc: &MaterialDesc) -> HostResult<MaterialId> {
        if let MaterialKind::Preview { inputs, .. } = &desc.kind
            && let Some(missing) = inputs.iter().find(|i| !self.images.contains_key(&i.image))
        {
            return Err(HostError::UnknownHandle(format!(
                "image {} for material '{}'",
                missing.image.0, desc.name
            )));
        }
        let id = MaterialId(self.alloc());
        self.materials.insert(id, desc.clone());
        Ok(id)
    }

    fn delete_material(&mut self, id: MaterialId) -> HostResult<Removal> {
        if !self.materials.contains_key(&id) {
            return Ok(Removal::Missing);
        }
        self.check_pinned(id.0, "material")?;
        self.materials.remove(&id);
        for obj in self.objects.values_mut() {
            if obj.material == Some(id) {
                obj.material = None;
            }
        }
        Ok(Removal::Removed)
    }

    fn material_binding(&self, object: ObjectId) -> HostResult<Option<MaterialId>> {
        self.objects
            .get(&object)
            .map(|o| o.material)
            .ok_or_else(|| HostError::UnknownHandle(format!("object {}", object.0)))
    }

    fn bind_material(&mut self, object: ObjectId, material: Option<MaterialId>) -> HostResult<()> {
        if let Some(m) = material
            && !self.materials.contains_key(&m)
        {
            return Err(HostError::UnknownHandle(format!("material {}", m.0)));
        }
        let obj = self
            .objects
            .get_mut(&object)
            .ok_or_else(|| HostError::UnknownHandle(format!("object {}", object.0)))?;
        obj.material = material;
        Ok(())
    }

    fn load_image(&mut self, path: &Path, color_space: ColorSpace) -> HostResult<ImageId> {
        if !path.is_file() {
            return Err(HostError::UnknownHandle(format!(
                "image file '{}'",
                path.display()
            )));
        }
        let id = ImageId(self.alloc());
        self.images.insert(
            id,
            ImageRecord {
                path: path.to_path_buf(),
                color_space,
            },
        );
        Ok(id)
    }

    fn delete_image(&mut self, id: ImageId) -> HostResult<Removal> {
        if !self.images.contains_key(&id) {
            return Ok(Removal::Missing);
        }
        self.check_pinned(id.0, "image")?;
        self.images.remove(&id);
        Ok(Removal::Removed)
    }

    fn add_modifier(&mut self, object: ObjectId, desc: &ModifierDesc) -> HostResult<ModifierId> {
        if let ModifierDesc::Displace { image, .. } = desc
            && !self.images.contains_key(image)
        {
            return Err(HostError::UnknownHandle(format!("image {}", image.0)));
        }
        let id = ModifierId(self.alloc());
        let obj = self
            .objects
            .get_mut(&object)
            .ok_or_else(|| HostError::UnknownHandle(format!("object {}", object.0)))?;
        obj.modifiers.push((id, desc.clone()));
        Ok(id)
    }

    fn remove_modifier(&mut self, object: ObjectId, id: ModifierId) -> HostResult<Removal> {
        let Some(obj) = self.objects.get(&object) else {
            return Ok(Removal::Missing);
        };
        let Some(pos) = obj.modifiers.iter().position(|(m, _)| *m == id) else {
            return Ok(Removal::Missing);
        };
        self.check_pinned(id.0, "modifier")?;
        if let Some(obj) = self.objects.get_mut(&object) {
            obj.modifiers.remove(pos);
        }
        Ok(Removal::Removed)
    }
}

impl BakeBackend for MemoryScene {
    fn supports(&self, pass: BakePass) -> bool {
        !self.unsupported.contains(&pass)
    }

    fn bake(
        &mut self,
        surface: ObjectId,
        settings: &PassSettings,
        resolution: u32,
    ) -> Result<BakedImage, BakeError> {
        let bound_material = self
            .objects
            .get(&surface)
            .ok_or_else(|| BakeError::Render(format!("surface {} does not exist", surface.0)))?
            .material;
        self.bake_log.push(BakeRecord {
            surface,
            settings: *settings,
            bound_material,
        });

        if let Some(err) = self.faults.get(&settings.pass) {
            return Err(err.clone());
        }
        if !self.supports(settings.pass) {
            return Err(BakeError::Unsupported(settings.pass));
        }
        let routed = bound_material
            .and_then(|m| self.materials.get(&m))
            .is_some_and(|m| matches!(m.kind, MaterialKind::BakeRoute { pass } if pass == settings.pass));
        if !routed {
            return Err(BakeError::NotRouted(settings.pass));
        }
        if settings.components != pass_components(settings.pass) {
            return Err(BakeError::Render(format!(
                "pass {:?} produces {} components, {} requested",
                settings.pass,
                pass_components(settings.pass),
                settings.components
            )));
        }
        if resolution == 0 {
            return Err(BakeError::Render("resolution must be > 0".to_string()));
        }

        Ok(self.rasterize(settings, resolution))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/host/memory.rs"]
mod tests;
