use std::fmt;

use serde::{Deserialize, Serialize};

/// Which GPU backend family a context runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendKind {
    /// High-throughput native API (Vulkan, Metal, DX12, WebGPU).
    Preferred,
    /// Broadly available GL / WebGL2 path.
    Fallback,
}

impl BackendKind {
    /// wgpu backend set used when creating an instance of this kind.
    #[must_use]
    pub fn backends(self) -> wgpu::Backends {
        match self {
            Self::Preferred => wgpu::Backends::PRIMARY,
            Self::Fallback => wgpu::Backends::GL,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Preferred => f.write_str("preferred"),
            Self::Fallback => f.write_str("fallback"),
        }
    }
}
