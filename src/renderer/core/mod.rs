//! wgpu implementation of the GPU platform seams.

pub mod context;

pub use context::{WgpuContext, WgpuPlatform};
