//! Reference surface creation, reuse and validation.

use crate::{
    artifacts::{ArtifactRole, PipelineArtifacts},
    config::{DEFAULT_DEPTH_NEAR, DepthRange, validate_file_stem},
    foundation::core::{Aabb, Transform3D, Vec3},
    foundation::error::{QuadgrabError, QuadgrabResult},
    host::scene::{ObjectId, SceneHost, Size, SurfaceDesc, SurfaceGeometry, Visibility},
};

const MIN_FIT_EXTENT: f64 = 0.01;
const AREA_EPSILON: f64 = 1e-12;
const EDGE_EPSILON: f64 = 1e-9;
const PLANAR_TOLERANCE: f64 = 1e-6;

/// The planar quad used as bake target.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceSurface {
    /// Scene handle.
    pub id: ObjectId,
    /// Object name; prefixes every output file.
    pub name: String,
    /// Object-to-world transform.
    pub transform: Transform3D,
    /// Local edge lengths (first edge, last edge) before transform scale.
    pub size: Size,
}

impl ReferenceSurface {
    /// Edge lengths in scene units with the transform's scale applied.
    pub fn world_size(&self) -> Size {
        Size::new(
            self.size.width * self.transform.scale.x.abs(),
            self.size.height * self.transform.scale.y.abs(),
        )
    }
}

/// Where a new reference surface is created.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SurfacePlacement {
    /// Object-to-world transform.
    pub transform: Transform3D,
    /// Local width/height.
    pub size: Size,
}

impl Default for SurfacePlacement {
    /// Unit quad at the world origin facing +Z.
    fn default() -> Self {
        Self {
            transform: Transform3D::default(),
            size: Size::new(1.0, 1.0),
        }
    }
}

impl SurfacePlacement {
    /// Place a square surface flush with the top of `bounds`, lifted by `margin`.
    ///
    /// The side is the larger XY extent plus `margin` on each side. The returned depth range starts
    /// at [`DEFAULT_DEPTH_NEAR`] and reaches the bottom of the bounds plus `margin`.
    pub fn fit_to_bounds(bounds: &[Aabb], margin: f64) -> QuadgrabResult<(Self, DepthRange)> {
        if !margin.is_finite() || margin < 0.0 {
            return Err(QuadgrabError::configuration(format!(
                "fit margin must be finite and >= 0, got {margin}"
            )));
        }
        let Some(total) = bounds.iter().copied().reduce(Aabb::union) else {
            return Err(QuadgrabError::configuration(
                "fit requires at least one bounding box",
            ));
        };

        let ext = total.extents();
        let center = total.center();
        let side = ext.x.max(ext.y).max(MIN_FIT_EXTENT) + 2.0 * margin;
        let far = ext.z.max(MIN_FIT_EXTENT) + 2.0 * margin;

        let placement = Self {
            transform: Transform3D::at(Vec3::new(center.x, center.y, total.max.z + margin)),
            size: Size::new(side, side),
        };
        Ok((placement, DepthRange::new(DEFAULT_DEPTH_NEAR, far)?))
    }
}

/// Return the surface behind `existing`, or create a unit quad at the default placement.
pub fn ensure_surface(
    host: &mut dyn SceneHost,
    existing: Option<ObjectId>,
    name: &str,
    artifacts: &mut PipelineArtifacts,
) -> QuadgrabResult<ReferenceSurface> {
    ensure_surface_at(host, existing, name, &SurfacePlacement::default(), artifacts)
}

/// Like [`ensure_surface`], creating new surfaces at `placement`.
///
/// A handle that still exists is reused unchanged if it is a usable quad and rejected with
/// [`QuadgrabError::InvalidSurface`] otherwise. A handle that no longer exists is treated like no
/// handle at all. Newly created surfaces are hidden from renders and registered in `artifacts`.
pub fn ensure_surface_at(
    host: &mut dyn SceneHost,
    existing: Option<ObjectId>,
    name: &str,
    placement: &SurfacePlacement,
    artifacts: &mut PipelineArtifacts,
) -> QuadgrabResult<ReferenceSurface> {
    if let Some(id) = existing {
        match host.surface_geometry(id) {
            Some(geom) => {
                let surface = validate_quad(id, &geom)?;
                tracing::debug!(surface = %surface.name, id = id.0, "reusing reference surface");
                return Ok(surface);
            }
            None => {
                tracing::info!(id = id.0, "reference surface no longer exists, creating a new one");
            }
        }
    }

    let desc = SurfaceDesc {
        name: name.to_string(),
        transform: placement.transform,
        size: placement.size,
        subdivisions: 0,
        visibility: Visibility::Hidden,
    };
    let id = host.create_surface(&desc)?;
    artifacts.register_object(ArtifactRole::ReferenceSurface, id);

    let geom = host.surface_geometry(id).ok_or_else(|| {
        QuadgrabError::invalid_surface(format!("created surface '{name}' is not queryable"))
    })?;
    let surface = validate_quad(id, &geom)?;
    tracing::info!(surface = %surface.name, id = id.0, "created reference surface");
    Ok(surface)
}

/// Check that `geom` is a single planar, non-degenerate quad whose name can prefix output files.
pub(crate) fn validate_quad(id: ObjectId, geom: &SurfaceGeometry) -> QuadgrabResult<ReferenceSurface> {
    validate_file_stem(&geom.name).map_err(|e| {
        QuadgrabError::invalid_surface(format!("'{}' cannot name output files: {e}", geom.name))
    })?;
    if geom.vertices.len() != 4 {
        return Err(QuadgrabError::invalid_surface(format!(
            "'{}' has {} vertices, expected 4",
            geom.name,
            geom.vertices.len()
        )));
    }
    if !geom.vertices.iter().all(|v| v.is_finite()) {
        return Err(QuadgrabError::invalid_surface(format!(
            "'{}' has non-finite vertices",
            geom.name
        )));
    }

    let scale = geom.transform.scale;
    let v: Vec<Vec3> = geom.vertices.iter().map(|p| p.mul_elem(scale)).collect();

    // Quad area is half the cross product of its diagonals.
    let normal = (v[2] - v[0]).cross(v[3] - v[1]);
    let area = 0.5 * normal.length();
    if area <= AREA_EPSILON {
        return Err(QuadgrabError::invalid_surface(format!(
            "'{}' has zero area",
            geom.name
        )));
    }

    // A collapsed edge leaves a triangle whose diagonals still span an area.
    if (0..4).any(|i| (v[(i + 1) % 4] - v[i]).length() <= EDGE_EPSILON) {
        return Err(QuadgrabError::invalid_surface(format!(
            "'{}' has a collapsed edge",
            geom.name
        )));
    }

    let n = normal * (1.0 / normal.length());
    let extent = v
        .iter()
        .map(|p| (*p - v[0]).length())
        .fold(0.0f64, f64::max);
    if v.iter().any(|p| (*p - v[0]).dot(n).abs() > PLANAR_TOLERANCE * extent.max(1.0)) {
        return Err(QuadgrabError::invalid_surface(format!(
            "'{}' is not planar",
            geom.name
        )));
    }

    let local = &geom.vertices;
    let size = Size::new((local[1] - local[0]).length(), (local[3] - local[0]).length());
    if size.width <= EDGE_EPSILON || size.height <= EDGE_EPSILON {
        return Err(QuadgrabError::invalid_surface(format!(
            "'{}' has zero size {}x{}",
            geom.name, size.width, size.height
        )));
    }
    Ok(ReferenceSurface {
        id,
        name: geom.name.clone(),
        transform: geom.transform,
        size,
    })
}

#[cfg(test)]
#[path = "../tests/unit/surface/surface.rs"]
mod tests;
