//! Poses, colliders and ray intersection
//!
//! Conventions: +Y is up, an object's local forward is +Z. A yaw of θ degrees
//! turns forward toward +X, so yaw 90° faces +X.
//!
//! Colliders are convex. A ray that starts inside a collider reports the far
//! surface, which is how the beam finds the point where it leaves a deflector.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Position + orientation of a scene object
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Pose {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Pose facing `yaw_degrees` around the vertical axis
    pub fn from_yaw_degrees(position: Vec3, yaw_degrees: f32) -> Self {
        Self {
            position,
            rotation: Quat::from_rotation_y(yaw_degrees.to_radians()),
        }
    }

    /// World-space forward (+Z rotated by the pose)
    #[inline]
    pub fn forward(&self) -> Vec3 {
        (self.rotation * Vec3::Z).normalize_or_zero()
    }

    /// Transform a world point into this pose's local frame
    #[inline]
    fn to_local_point(&self, p: Vec3) -> Vec3 {
        self.rotation.inverse() * (p - self.position)
    }

    #[inline]
    fn to_local_dir(&self, d: Vec3) -> Vec3 {
        self.rotation.inverse() * d
    }
}

/// Bitmask of collision layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const ALL: LayerMask = LayerMask(u32::MAX);
    pub const NONE: LayerMask = LayerMask(0);
    pub const DEFAULT: LayerMask = LayerMask(1);

    /// Mask with a single layer bit set
    pub const fn layer(index: u32) -> Self {
        LayerMask(1 << index)
    }

    #[inline]
    pub fn intersects(self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        LayerMask::DEFAULT
    }
}

/// Convex collision shape, centered on its owner's pose
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Collider {
    Sphere { radius: f32 },
    /// Oriented box with the owner's rotation
    Box { half_extents: Vec3 },
}

impl Collider {
    pub fn sphere(radius: f32) -> Self {
        Collider::Sphere { radius }
    }

    pub fn cuboid(half_extents: Vec3) -> Self {
        Collider::Box { half_extents }
    }

    /// Radius of the smallest origin-centered sphere enclosing the shape
    pub fn bounding_radius(&self) -> f32 {
        match *self {
            Collider::Sphere { radius } => radius,
            Collider::Box { half_extents } => half_extents.length(),
        }
    }

    /// Entry/exit distances of a ray through the shape placed at `pose`.
    ///
    /// `dir` must be normalized. Returns `None` when the line misses the
    /// shape or the whole overlap lies behind the origin.
    pub fn intersect(&self, pose: &Pose, origin: Vec3, dir: Vec3) -> Option<(f32, f32)> {
        let (t_near, t_far) = match *self {
            Collider::Sphere { radius } => ray_sphere_intersect(origin, dir, pose.position, radius)?,
            Collider::Box { half_extents } => {
                let o = pose.to_local_point(origin);
                let d = pose.to_local_dir(dir);
                ray_aabb_intersect(o, d, -half_extents, half_extents)?
            }
        };
        if t_far < 0.0 {
            return None;
        }
        Some((t_near, t_far))
    }

    /// Distance to the first surface crossing within `max_distance`.
    ///
    /// From inside the shape this is the exit surface.
    pub fn raycast(&self, pose: &Pose, origin: Vec3, dir: Vec3, max_distance: f32) -> Option<f32> {
        let (t_near, t_far) = self.intersect(pose, origin, dir)?;
        let t = if t_near >= 0.0 { t_near } else { t_far };
        (t <= max_distance).then_some(t)
    }

    /// Distance to the entry surface, ignoring shapes that contain the origin
    pub fn raycast_outside(
        &self,
        pose: &Pose,
        origin: Vec3,
        dir: Vec3,
        max_distance: f32,
    ) -> Option<f32> {
        let (t_near, _) = self.intersect(pose, origin, dir)?;
        (t_near >= 0.0 && t_near <= max_distance).then_some(t_near)
    }
}

/// Ray-sphere intersection, returns (t_near, t_far) along a normalized ray
pub fn ray_sphere_intersect(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<(f32, f32)> {
    let oc = origin - center;
    let b = oc.dot(dir);
    let c = oc.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    Some((-b - sq, -b + sq))
}

/// Ray-AABB intersection using the slab method, returns (t_min, t_max)
pub fn ray_aabb_intersect(origin: Vec3, dir: Vec3, aabb_min: Vec3, aabb_max: Vec3) -> Option<(f32, f32)> {
    let mut t_min = f32::NEG_INFINITY;
    let mut t_max = f32::INFINITY;

    for axis in 0..3 {
        let o = origin[axis];
        let d = dir[axis];
        let (lo, hi) = (aabb_min[axis], aabb_max[axis]);

        if d.abs() < 1e-8 {
            // Parallel to this slab: must already be between the planes
            if o < lo || o > hi {
                return None;
            }
            continue;
        }

        let inv = 1.0 / d;
        let mut t1 = (lo - o) * inv;
        let mut t2 = (hi - o) * inv;
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
        }
        t_min = t_min.max(t1);
        t_max = t_max.min(t2);
        if t_min > t_max {
            return None;
        }
    }

    Some((t_min, t_max))
}
