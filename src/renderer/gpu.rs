//! Seams between the lifecycle manager and a concrete GPU API.

use super::backend::BackendKind;
use super::events::{ContextId, PlatformEvent};
use crate::errors::Result;
use crate::quality::TierConfig;

/// Progress of a submitted smoke test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmokeTestStatus {
    Pending,
    Passed,
    Failed(String),
}

/// Creates GPU contexts for a backend family.
#[allow(async_fn_in_trait)]
pub trait GpuPlatform {
    type Context: GpuContext;

    /// Whether the platform claims support for `kind` at all.
    fn advertises(&self, kind: BackendKind) -> bool;

    /// Creates a context. Loss notifications for it must be sent on `events`, tagged
    /// with `id`.
    async fn create_context(
        &mut self,
        kind: BackendKind,
        id: ContextId,
        config: &TierConfig,
        events: flume::Sender<PlatformEvent>,
    ) -> Result<Self::Context>;
}

/// One live GPU context.
pub trait GpuContext {
    /// Records and submits a minimal draw through the full pipeline.
    fn submit_smoke_test(&mut self) -> Result<()>;

    /// Non-blocking check of the submitted smoke test.
    fn poll_smoke_test(&mut self) -> SmokeTestStatus;

    /// Ends a frame: processes completed GPU work and reports a dead context.
    fn present_frame(&mut self) -> Result<()>;

    /// Releases every GPU object. Called exactly once.
    fn dispose(&mut self);
}
