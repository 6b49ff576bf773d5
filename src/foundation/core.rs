use crate::foundation::error::{QuadgrabError, QuadgrabResult};

pub use kurbo::{Point, Rect};

/// 3D vector in scene units.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Vec3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vec3 {
    /// The zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    /// The `(1, 1, 1)` vector.
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0);

    /// Build a vector from components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Dot product.
    pub fn dot(self, o: Self) -> f64 {
        self.x * o.x + self.y * o.y + self.z * o.z
    }

    /// Cross product.
    pub fn cross(self, o: Self) -> Self {
        Self::new(
            self.y * o.z - self.z * o.y,
            self.z * o.x - self.x * o.z,
            self.x * o.y - self.y * o.x,
        )
    }

    /// Euclidean length.
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Component-wise product.
    pub fn mul_elem(self, o: Self) -> Self {
        Self::new(self.x * o.x, self.y * o.y, self.z * o.z)
    }

    /// Component-wise minimum.
    pub fn min(self, o: Self) -> Self {
        Self::new(self.x.min(o.x), self.y.min(o.y), self.z.min(o.z))
    }

    /// Component-wise maximum.
    pub fn max(self, o: Self) -> Self {
        Self::new(self.x.max(o.x), self.y.max(o.y), self.z.max(o.z))
    }

    /// Whether every component is finite.
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;

    fn add(self, o: Self) -> Self {
        Self::new(self.x + o.x, self.y + o.y, self.z + o.z)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;

    fn sub(self, o: Self) -> Self {
        Self::new(self.x - o.x, self.y - o.y, self.z - o.z)
    }
}

impl std::ops::Mul<f64> for Vec3 {
    type Output = Self;

    fn mul(self, s: f64) -> Self {
        Self::new(self.x * s, self.y * s, self.z * s)
    }
}

/// Object-to-world transform: location, XYZ euler rotation (radians), scale.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transform3D {
    /// World-space location of the object origin.
    pub location: Vec3,
    /// XYZ euler rotation in radians.
    pub rotation_euler: Vec3,
    /// Per-axis scale; default `(1,1,1)`.
    pub scale: Vec3,
}

impl Default for Transform3D {
    fn default() -> Self {
        Self {
            location: Vec3::ZERO,
            rotation_euler: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform3D {
    /// Identity rotation and scale at `location`.
    pub fn at(location: Vec3) -> Self {
        Self {
            location,
            ..Self::default()
        }
    }
}

/// World-space axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// Build a box, rejecting inverted or non-finite corners.
    pub fn new(min: Vec3, max: Vec3) -> QuadgrabResult<Self> {
        if !min.is_finite() || !max.is_finite() {
            return Err(QuadgrabError::configuration(
                "bounding box corners must be finite",
            ));
        }
        if min.x > max.x || min.y > max.y || min.z > max.z {
            return Err(QuadgrabError::configuration(
                "bounding box min must be <= max on every axis",
            ));
        }
        Ok(Self { min, max })
    }

    /// Smallest box containing both `self` and `o`.
    pub fn union(self, o: Self) -> Self {
        Self {
            min: self.min.min(o.min),
            max: self.max.max(o.max),
        }
    }

    /// Per-axis size.
    pub fn extents(self) -> Vec3 {
        self.max - self.min
    }

    /// Box center.
    pub fn center(self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
