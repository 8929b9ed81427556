use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::resources::BoundingBox;

/// Smallest extent allowed on any axis of a shadow frustum.
pub const MIN_SHADOW_EXTENT: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowConfig {
    pub bias: f32,
    pub normal_bias: f32,
    pub map_size: u32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            bias: 0.0005,
            normal_bias: 0.02,
            map_size: 2048,
        }
    }
}

/// Light-space orthographic bounds of a directional shadow.
///
/// `near` and `far` are distances along the light's view direction, as taken by
/// [`Mat4::orthographic_rh`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowFrustum {
    left: f32,
    right: f32,
    bottom: f32,
    top: f32,
    near: f32,
    far: f32,
    projection: Mat4,
}

impl Default for ShadowFrustum {
    fn default() -> Self {
        Self::new(-5.0, 5.0, -5.0, 5.0, 0.5, 500.0)
    }
}

impl ShadowFrustum {
    #[must_use]
    pub fn new(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Self {
        let mut frustum = Self {
            left: 0.0,
            right: 0.0,
            bottom: 0.0,
            top: 0.0,
            near: 0.0,
            far: 0.0,
            projection: Mat4::IDENTITY,
        };
        frustum.set_bounds(left, right, bottom, top, near, far);
        frustum
    }

    /// Sets all six bounds and recomputes the projection.
    ///
    /// An axis whose extent is below [`MIN_SHADOW_EXTENT`] is widened symmetrically to it
    /// so the projection stays invertible. All other bounds are kept exactly.
    pub fn set_bounds(&mut self, left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) {
        let (left, right) = pad_axis(left.min(right), right.max(left));
        let (bottom, top) = pad_axis(bottom.min(top), top.max(bottom));
        let (near, far) = pad_axis(near.min(far), far.max(near));

        self.left = left;
        self.right = right;
        self.bottom = bottom;
        self.top = top;
        self.near = near;
        self.far = far;
        self.projection = Mat4::orthographic_rh(left, right, bottom, top, near, far);
    }

    #[inline]
    #[must_use]
    pub fn left(&self) -> f32 {
        self.left
    }

    #[inline]
    #[must_use]
    pub fn right(&self) -> f32 {
        self.right
    }

    #[inline]
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.bottom
    }

    #[inline]
    #[must_use]
    pub fn top(&self) -> f32 {
        self.top
    }

    #[inline]
    #[must_use]
    pub fn near(&self) -> f32 {
        self.near
    }

    #[inline]
    #[must_use]
    pub fn far(&self) -> f32 {
        self.far
    }

    #[inline]
    #[must_use]
    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// The bounds as a box in light view space (where the light looks down -Z).
    #[must_use]
    pub fn light_space_bounds(&self) -> BoundingBox {
        BoundingBox::new(
            Vec3::new(self.left, self.bottom, -self.far),
            Vec3::new(self.right, self.top, -self.near),
        )
    }

    /// True when any axis is thinner than [`MIN_SHADOW_EXTENT`] or the projection is
    /// not finite.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        !(self.right - self.left >= MIN_SHADOW_EXTENT
            && self.top - self.bottom >= MIN_SHADOW_EXTENT
            && self.far - self.near >= MIN_SHADOW_EXTENT
            && self.projection.is_finite())
    }
}

/// Widens a thin axis around its center until the stored extent reaches
/// [`MIN_SHADOW_EXTENT`].
///
/// The pad grows with the magnitude of the center: far from the origin the f32 spacing
/// exceeds the minimum extent and a fixed pad would round back to zero.
fn pad_axis(min: f32, max: f32) -> (f32, f32) {
    if max - min >= MIN_SHADOW_EXTENT || !(min.is_finite() && max.is_finite()) {
        return (min, max);
    }
    let center = (min + max) * 0.5;
    let extent = MIN_SHADOW_EXTENT.max(center.abs() * 8.0 * f32::EPSILON);
    let lo = center - extent * 0.5;
    let mut hi = lo + extent;
    while hi - lo < MIN_SHADOW_EXTENT {
        hi = hi.next_up();
    }
    (lo, hi)
}

/// The single shadow-casting sun light.
#[derive(Debug, Clone)]
pub struct DirectionalLight {
    pub position: Vec3,
    pub target: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub shadow: ShadowConfig,
    pub shadow_frustum: ShadowFrustum,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self::new(Vec3::new(50.0, 100.0, 50.0), Vec3::ZERO)
    }
}

impl DirectionalLight {
    #[must_use]
    pub fn new(position: Vec3, target: Vec3) -> Self {
        Self {
            position,
            target,
            color: Vec3::ONE,
            intensity: 1.0,
            shadow: ShadowConfig::default(),
            shadow_frustum: ShadowFrustum::default(),
        }
    }

    #[must_use]
    pub fn direction(&self) -> Vec3 {
        let dir = self.target - self.position;
        if dir.length_squared() > 1e-6 {
            dir.normalize()
        } else {
            -Vec3::Z
        }
    }

    /// World to light view transform.
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        let dir = self.direction();
        let up = if dir.y.abs() > 0.99 { Vec3::X } else { Vec3::Y };
        Mat4::look_at_rh(self.position, self.position + dir, up)
    }

    #[must_use]
    pub fn view_projection(&self) -> Mat4 {
        *self.shadow_frustum.projection() * self.view_matrix()
    }
}
