//! Error Types
//!
//! This module defines the error types used throughout the adaptive rendering core.
//!
//! # Overview
//!
//! The main error type [`AtriumError`] covers the failure modes that are surfaced to
//! callers:
//! - GPU backend creation and smoke-test failures
//! - Context loss and lifecycle misuse
//! - Invalid decoded asset data
//! - Settings and persisted-flag I/O
//!
//! Budget decisions (tier selection, skipped decimation) are resolved locally and never
//! appear here.
//!
//! # Usage
//!
//! ```rust,ignore
//! use atrium::errors::{AtriumError, Result};
//!
//! fn prepare() -> Result<()> {
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::renderer::backend::BackendKind;
use crate::renderer::lifecycle::LifecycleState;

/// The main error type for the adaptive rendering core.
#[derive(Error, Debug)]
pub enum AtriumError {
    // ========================================================================
    // GPU & Backend Errors
    // ========================================================================
    /// Failed to request a compatible GPU adapter.
    #[error("Failed to request WGPU adapter: {0}")]
    AdapterRequestFailed(String),

    /// Failed to create the GPU device.
    #[error("Failed to create WGPU device: {0}")]
    DeviceCreateFailed(#[from] wgpu::RequestDeviceError),

    /// The preferred backend could not be created or failed its smoke test.
    ///
    /// Non-fatal: the lifecycle manager logs it and falls back.
    #[error("Backend {backend} is unsupported on this device: {reason}")]
    UnsupportedBackend {
        /// The backend that was attempted
        backend: BackendKind,
        /// What went wrong
        reason: String,
    },

    /// No backend, including the fallback, could be brought up.
    #[error("Backend {backend} is unavailable: {reason}")]
    BackendUnavailable {
        /// The backend that was attempted
        backend: BackendKind,
        /// What went wrong
        reason: String,
    },

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// The GPU context was lost. Only a full restart recovers.
    #[error("GPU context lost: {0}")]
    ContextLost(String),

    /// The context cannot accept work in its current state.
    #[error("Render context is not ready (state: {0:?})")]
    ContextNotReady(LifecycleState),

    /// A frame token minted for an earlier context generation was submitted.
    #[error("Frame token belongs to an invalidated context generation")]
    StaleFrame,

    /// A lifecycle operation was invoked from a state that does not allow it.
    #[error("Cannot {action} while in state {from:?}")]
    InvalidTransition {
        /// State the manager was in
        from: LifecycleState,
        /// The rejected operation
        action: &'static str,
    },

    /// The session restart could not be triggered or did not complete.
    #[error("Session restart failed: {0}")]
    RestartFailed(String),

    // ========================================================================
    // Asset Errors
    // ========================================================================
    /// Decoded mesh data violates the triangle-list contract.
    #[error("Invalid mesh '{name}': {reason}")]
    InvalidMesh {
        /// Mesh name for diagnostics
        name: String,
        /// The violated constraint
        reason: String,
    },

    // ========================================================================
    // Settings & Persistence Errors
    // ========================================================================
    /// Settings failed validation.
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// Durable storage for the loss flag is unavailable.
    #[error("Storage error: {0}")]
    Storage(String),

    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    // ========================================================================
    // Platform-Specific Errors
    // ========================================================================
    /// WASM-specific error.
    #[cfg(target_arch = "wasm32")]
    #[error("WASM error: {0}")]
    WasmError(String),
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for AtriumError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        AtriumError::WasmError(format!("{value:?}"))
    }
}

/// Alias for `Result<T, AtriumError>`.
pub type Result<T> = std::result::Result<T, AtriumError>;
