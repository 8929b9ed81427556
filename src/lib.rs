#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! # Atrium
//!
//! Adaptive rendering core for large architectural scenes. It classifies the device
//! once, picks a [`QualityTier`], degrades geometry and materials to the tier budget,
//! fits the shadow frustum to what is visible every frame, watches frame timing, and
//! owns the GPU context lifecycle including loss and restart.
//!
//! Asset decoding, UI and business data live elsewhere; this crate only consumes
//! decoded meshes and material descriptors.

pub mod degrade;
pub mod device;
pub mod engine;
pub mod errors;
pub mod platform;
pub mod quality;
pub mod renderer;
pub mod resources;
pub mod scene;
pub mod settings;
pub mod utils;

pub use degrade::{DegradationPass, GeometryDecimator, MaterialDowngrader};
pub use device::{DeviceProfile, DeviceSignals, classify};
pub use engine::Engine;
pub use errors::{AtriumError, Result};
pub use quality::{QualityTier, SessionQuality, TierConfig};
pub use renderer::governor::{DegradationStage, FramePerformanceGovernor, FrameSample};
pub use renderer::lifecycle::{LifecycleState, RendererLifecycleManager};
pub use renderer::shadow::ShadowFrustumFitter;
pub use resources::{BoundingBox, MaterialDescriptor, MeshAsset};
pub use scene::{Camera, DirectionalLight, Frustum, ShadowFrustum};
pub use settings::AdaptiveSettings;
