pub mod camera;
pub mod light;

pub use camera::{Camera, Frustum};
pub use light::{DirectionalLight, MIN_SHADOW_EXTENT, ShadowConfig, ShadowFrustum};
