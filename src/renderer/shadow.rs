use crate::resources::BoundingBox;
use crate::scene::{DirectionalLight, Frustum};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FitOutcome {
    /// Bounds now match the light-space box of `visible` objects.
    Fitted { visible: usize, bounds: BoundingBox },
    /// Nothing was visible; the previous bounds were kept.
    Retained,
}

/// Fits a directional light's orthographic shadow bounds to the visible scene.
///
/// Run once per frame on tiers with shadows. The union of every world-space box that
/// touches the camera frustum is moved into light view space and its extents become
/// the new left/right/bottom/top/near/far. When nothing is visible the light keeps the
/// previous frame's bounds.
#[derive(Debug, Clone, Default)]
pub struct ShadowFrustumFitter {
    frames_fitted: u64,
    frames_retained: u64,
}

impl ShadowFrustumFitter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `objects` are world-space bounds of every shadow-relevant object in the scene.
    pub fn fit<'a>(
        &mut self,
        camera_frustum: &Frustum,
        light: &mut DirectionalLight,
        objects: impl IntoIterator<Item = &'a BoundingBox>,
    ) -> FitOutcome {
        let mut visible = 0usize;
        let mut union = BoundingBox::EMPTY;
        for bounds in objects {
            if camera_frustum.intersects_box(bounds) {
                union = union.union(bounds);
                visible += 1;
            }
        }

        if visible == 0 || union.is_empty() {
            self.frames_retained += 1;
            return FitOutcome::Retained;
        }

        let light_space = union.transform_mat4(&light.view_matrix());

        // Light view looks down -Z: the largest z is nearest to the light.
        light.shadow_frustum.set_bounds(
            light_space.min.x,
            light_space.max.x,
            light_space.min.y,
            light_space.max.y,
            -light_space.max.z,
            -light_space.min.z,
        );

        self.frames_fitted += 1;
        FitOutcome::Fitted {
            visible,
            bounds: light_space,
        }
    }

    #[inline]
    #[must_use]
    pub fn frames_fitted(&self) -> u64 {
        self.frames_fitted
    }

    #[inline]
    #[must_use]
    pub fn frames_retained(&self) -> u64 {
        self.frames_retained
    }
}
