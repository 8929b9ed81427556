//! Host services the lifecycle manager depends on.
//!
//! - [`FrameClock`]: cooperative per-frame scheduling
//! - [`LossFlagStore`]: the durable "previous session lost its context" flag
//! - [`SessionRestarter`]: full restart after a context restore
//!
//! Implementations exist for native hosts, the browser, and headless test runs.

mod headless;
#[cfg(not(target_arch = "wasm32"))]
mod native;
#[cfg(target_arch = "wasm32")]
mod web;

pub use headless::{MemoryLossFlagStore, RecordingRestarter, SteppedFrameClock};
#[cfg(not(target_arch = "wasm32"))]
pub use native::{FileLossFlagStore, InProcessRestarter, IntervalFrameClock};
#[cfg(target_arch = "wasm32")]
pub use web::{AnimationFrameClock, CanvasContextEvents, PageReloadRestarter, WebStorageLossFlagStore};

use crate::errors::Result;
use crate::utils::time::Instant;

/// Yields once per displayed frame.
#[allow(async_fn_in_trait)]
pub trait FrameClock {
    fn now(&self) -> Instant;

    /// Resolves at the next frame callback and returns its timestamp.
    async fn next_frame(&mut self) -> Instant;
}

/// Durable storage for a single boolean.
pub trait LossFlagStore {
    fn read(&self) -> Result<bool>;
    fn write(&mut self, lost: bool) -> Result<()>;
}

/// How a restart request was carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartOutcome {
    /// The host is reloading the whole page; this process will not continue.
    Reloading,
    /// The caller must tear down and re-run initialization in this process.
    InProcess,
}

pub trait SessionRestarter {
    fn restart(&mut self) -> Result<RestartOutcome>;
}
