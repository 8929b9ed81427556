//! Rendering runtime: context lifecycle, per-frame shadow fitting and the frame governor.
//!
//! - [`lifecycle`]: [`RendererLifecycleManager`](lifecycle::RendererLifecycleManager) state machine
//! - [`gpu`]: traits a GPU API implements for the manager
//! - [`core`]: the wgpu implementation
//! - [`shadow`]: per-frame shadow frustum fitting
//! - [`governor`]: jank monitor and degradation ladder

pub mod backend;
pub mod context;
pub mod core;
pub mod events;
pub mod governor;
pub mod gpu;
pub mod lifecycle;
pub mod shadow;

pub use backend::BackendKind;
pub use context::RenderContext;
pub use events::{
    ContextId, ContextLostEvent, ContextRestoredEvent, LifecycleNotice, NoticeBus, PlatformEvent,
};
pub use gpu::{GpuContext, GpuPlatform, SmokeTestStatus};
pub use lifecycle::FrameToken;
pub use shadow::FitOutcome;
