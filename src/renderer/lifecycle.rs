//! GPU context lifecycle.
//!
//! ```text
//! Uninitialized -> Initializing -> Ready <-> Lost -> Restoring -> Ready | Failed
//! ```
//!
//! - **Initializing** tries the preferred backend when the platform advertises it and the
//!   tier asks for it, and proves it with a one-triangle smoke test. Any failure there
//!   disposes the attempt and falls back; the preferred backend is not tried again in
//!   this session.
//! - **Lost** is entered from a platform notification. The platform's default recovery
//!   is suppressed before anything else happens, then the durable loss flag is written
//!   and a notice is published. Frame tokens minted before the loss become stale.
//! - **Restoring** clears the flag and asks the [`SessionRestarter`] for a full restart.
//!   Nothing is re-uploaded piecemeal.
//!
//! Initializing and Restoring are both bounded by timeouts from [`AdaptiveSettings`].

use crate::errors::{AtriumError, Result};
use crate::platform::{FrameClock, LossFlagStore, RestartOutcome, SessionRestarter};
use crate::quality::TierConfig;
use crate::settings::AdaptiveSettings;
use crate::utils::time::{Duration, Instant};

use super::backend::BackendKind;
use super::context::RenderContext;
use super::events::{
    ContextId, ContextLostEvent, ContextRestoredEvent, LifecycleNotice, NoticeBus, PlatformEvent,
};
use super::gpu::{GpuContext, GpuPlatform, SmokeTestStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    Uninitialized,
    Initializing,
    Ready,
    Lost,
    Restoring,
    Failed,
}

/// Permission to record one frame on the current context generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a frame token must be submitted"]
pub struct FrameToken {
    generation: u64,
}

impl FrameToken {
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

pub struct RendererLifecycleManager<P: GpuPlatform> {
    platform: P,
    flag_store: Box<dyn LossFlagStore>,
    restarter: Box<dyn SessionRestarter>,

    state: LifecycleState,
    context: Option<RenderContext<P::Context>>,
    config: Option<TierConfig>,

    preferred_disabled: bool,
    previous_session_lost: bool,
    next_context_id: u64,
    generation: u64,

    smoke_test_timeout: Duration,
    restore_timeout: Duration,
    restore_deadline: Option<Instant>,
    restart_outcome: Option<RestartOutcome>,

    events_tx: flume::Sender<PlatformEvent>,
    events_rx: flume::Receiver<PlatformEvent>,
    notices: NoticeBus,
}

impl<P: GpuPlatform> RendererLifecycleManager<P> {
    /// Reads the persisted loss flag once; see [`previous_session_lost`](Self::previous_session_lost).
    pub fn new(
        platform: P,
        flag_store: impl LossFlagStore + 'static,
        restarter: impl SessionRestarter + 'static,
        settings: &AdaptiveSettings,
    ) -> Self {
        let previous_session_lost = flag_store.read().unwrap_or_else(|e| {
            log::warn!("Could not read the context-loss flag: {e}");
            false
        });
        if previous_session_lost {
            log::warn!("The previous session ended with a lost GPU context");
        }

        let (events_tx, events_rx) = flume::unbounded();

        Self {
            platform,
            flag_store: Box::new(flag_store),
            restarter: Box::new(restarter),
            state: LifecycleState::Uninitialized,
            context: None,
            config: None,
            preferred_disabled: false,
            previous_session_lost,
            next_context_id: 1,
            generation: 0,
            smoke_test_timeout: settings.smoke_test_timeout(),
            restore_timeout: settings.restore_timeout(),
            restore_deadline: None,
            restart_outcome: None,
            events_tx,
            events_rx,
            notices: NoticeBus::new(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    #[must_use]
    pub fn backend(&self) -> Option<BackendKind> {
        self.context.as_ref().map(RenderContext::backend)
    }

    #[must_use]
    pub fn context(&self) -> Option<&RenderContext<P::Context>> {
        self.context.as_ref()
    }

    #[must_use]
    pub fn context_id(&self) -> Option<ContextId> {
        self.context.as_ref().map(RenderContext::id)
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the preferred backend has been ruled out for this session.
    #[must_use]
    pub fn preferred_disabled(&self) -> bool {
        self.preferred_disabled
    }

    /// The flag value found at startup.
    #[must_use]
    pub fn previous_session_lost(&self) -> bool {
        self.previous_session_lost
    }

    /// `true` while in `Restoring` and the host must call [`restart`](Self::restart).
    #[must_use]
    pub fn needs_restart(&self) -> bool {
        self.state == LifecycleState::Restoring
            && self.restart_outcome == Some(RestartOutcome::InProcess)
    }

    #[must_use]
    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    /// Sender the platform (or a test) uses to deliver loss and restore events.
    #[must_use]
    pub fn event_sender(&self) -> flume::Sender<PlatformEvent> {
        self.events_tx.clone()
    }

    pub fn subscribe(&mut self) -> flume::Receiver<LifecycleNotice> {
        self.notices.subscribe()
    }

    // ========================================================================
    // Initialization
    // ========================================================================

    /// Brings up a context for `config`.
    ///
    /// Returns the backend that passed its smoke test. Fails only when the fallback also
    /// fails, leaving the manager in `Failed`.
    pub async fn initialize(
        &mut self,
        config: &TierConfig,
        clock: &mut impl FrameClock,
    ) -> Result<BackendKind> {
        if self.state != LifecycleState::Uninitialized {
            return Err(AtriumError::InvalidTransition {
                from: self.state,
                action: "initialize",
            });
        }
        self.state = LifecycleState::Initializing;
        self.config = Some(config.clone());
        self.bring_up(config, clock).await
    }

    async fn bring_up(
        &mut self,
        config: &TierConfig,
        clock: &mut impl FrameClock,
    ) -> Result<BackendKind> {
        let try_preferred = config.prefer_high_throughput_backend
            && !self.preferred_disabled
            && self.platform.advertises(BackendKind::Preferred);

        if try_preferred {
            match self.try_backend(BackendKind::Preferred, config, clock).await {
                Ok(context) => return Ok(self.commit(context)),
                Err(e) => {
                    log::warn!("{e}; falling back to the standard backend");
                    self.preferred_disabled = true;
                }
            }
        }

        match self.try_backend(BackendKind::Fallback, config, clock).await {
            Ok(context) => Ok(self.commit(context)),
            Err(e) => {
                let reason = e.to_string();
                log::error!("No usable GPU backend: {reason}");
                self.fail(reason.clone());
                Err(AtriumError::BackendUnavailable {
                    backend: BackendKind::Fallback,
                    reason,
                })
            }
        }
    }

    /// Creates a context and waits, frame by frame, for its smoke test.
    async fn try_backend(
        &mut self,
        kind: BackendKind,
        config: &TierConfig,
        clock: &mut impl FrameClock,
    ) -> Result<RenderContext<P::Context>> {
        let id = ContextId::new(self.next_context_id);
        self.next_context_id += 1;

        let unsupported = |reason: String| AtriumError::UnsupportedBackend {
            backend: kind,
            reason,
        };

        let inner = self
            .platform
            .create_context(kind, id, config, self.events_tx.clone())
            .await
            .map_err(|e| unsupported(e.to_string()))?;
        // Dropping the wrapper disposes the attempt on every early return below.
        let mut context = RenderContext::new(id, kind, inner);

        context
            .inner_mut()
            .submit_smoke_test()
            .map_err(|e| unsupported(format!("smoke test submission failed: {e}")))?;

        let deadline = clock.now() + self.smoke_test_timeout;
        loop {
            match context.inner_mut().poll_smoke_test() {
                SmokeTestStatus::Passed => {
                    log::info!("Smoke test passed on the {kind} backend ({id})");
                    return Ok(context);
                }
                SmokeTestStatus::Failed(reason) => {
                    return Err(unsupported(format!("smoke test failed: {reason}")));
                }
                SmokeTestStatus::Pending => {
                    if clock.next_frame().await >= deadline {
                        return Err(unsupported(format!(
                            "smoke test did not complete within {:?}",
                            self.smoke_test_timeout
                        )));
                    }
                }
            }
        }
    }

    fn commit(&mut self, context: RenderContext<P::Context>) -> BackendKind {
        let backend = context.backend();
        self.context = Some(context);
        self.generation += 1;
        self.state = LifecycleState::Ready;
        self.restore_deadline = None;
        self.restart_outcome = None;
        log::info!("Renderer ready on the {backend} backend");
        backend
    }

    fn fail(&mut self, reason: String) {
        if let Some(mut context) = self.context.take() {
            context.dispose();
        }
        self.state = LifecycleState::Failed;
        self.restore_deadline = None;
        self.restart_outcome = None;
        self.notices.publish(&LifecycleNotice::RecoveryFailed { reason });
    }

    // ========================================================================
    // Per-frame
    // ========================================================================

    /// Drains platform events and enforces the restore deadline. Call once per frame.
    pub fn tick(&mut self, now: Instant) {
        let pending: Vec<PlatformEvent> = self.events_rx.try_iter().collect();
        for event in pending {
            match event {
                PlatformEvent::ContextLost(ev) => self.handle_context_lost(ev),
                PlatformEvent::ContextRestored(ev) => self.handle_context_restored(ev, now),
            }
        }

        if self.state == LifecycleState::Restoring
            && let Some(deadline) = self.restore_deadline
            && now >= deadline
        {
            log::error!("Restore did not complete within {:?}", self.restore_timeout);
            self.fail(format!(
                "the renderer did not restart within {:?}",
                self.restore_timeout
            ));
        }
    }

    pub fn begin_frame(&self) -> Result<FrameToken> {
        match self.state {
            LifecycleState::Ready => Ok(FrameToken {
                generation: self.generation,
            }),
            state => Err(AtriumError::ContextNotReady(state)),
        }
    }

    /// Submits a frame. Tokens from before a loss are rejected with `StaleFrame`.
    pub fn submit_frame(&mut self, token: FrameToken) -> Result<()> {
        if token.generation != self.generation {
            return Err(AtriumError::StaleFrame);
        }
        if self.state != LifecycleState::Ready {
            return Err(AtriumError::ContextNotReady(self.state));
        }
        match self.context.as_mut() {
            Some(context) => context.inner_mut().present_frame(),
            None => Err(AtriumError::ContextNotReady(self.state)),
        }
    }

    // ========================================================================
    // Loss & restore
    // ========================================================================

    /// Suppresses the platform default first, then records the loss.
    pub fn handle_context_lost(&mut self, mut event: ContextLostEvent) {
        event.prevent_default();

        let current = self.context_id();
        if current != Some(event.context) || self.state != LifecycleState::Ready {
            log::debug!(
                "Ignoring loss of {} (current {:?}, state {:?})",
                event.context,
                current,
                self.state
            );
            return;
        }

        log::error!("GPU context {} lost: {}", event.context, event.reason);
        self.state = LifecycleState::Lost;
        // Everything recorded for the old generation is void.
        self.generation += 1;
        if let Some(context) = self.context.as_mut() {
            context.mark_lost();
        }

        if let Err(e) = self.flag_store.write(true) {
            log::error!("Could not persist the context-loss flag: {e}");
        }

        self.notices.publish(&LifecycleNotice::ContextLost {
            reason: event.reason,
            reload_available: true,
        });
    }

    /// Clears the loss flag and requests a full restart.
    pub fn handle_context_restored(&mut self, event: ContextRestoredEvent, now: Instant) {
        if self.state != LifecycleState::Lost || self.context_id() != Some(event.context) {
            log::debug!("Ignoring restore of {} in state {:?}", event.context, self.state);
            return;
        }

        log::info!("GPU context {} restored; restarting the session", event.context);
        self.begin_restore(now);
    }

    /// The manual reload offered by the loss notice. Allowed from `Lost` and `Failed`.
    pub fn request_reload(&mut self, now: Instant) -> Result<()> {
        if !matches!(self.state, LifecycleState::Lost | LifecycleState::Failed) {
            return Err(AtriumError::InvalidTransition {
                from: self.state,
                action: "reload",
            });
        }
        log::info!("Reload requested by the user");
        self.begin_restore(now);
        Ok(())
    }

    fn begin_restore(&mut self, now: Instant) {
        self.state = LifecycleState::Restoring;
        self.restore_deadline = Some(now + self.restore_timeout);

        if let Err(e) = self.flag_store.write(false) {
            log::error!("Could not clear the context-loss flag: {e}");
        }
        self.notices.publish(&LifecycleNotice::ContextRestored);

        match self.restarter.restart() {
            Ok(outcome) => self.restart_outcome = Some(outcome),
            Err(e) => {
                log::error!("Restart request failed: {e}");
                self.fail(e.to_string());
            }
        }
    }

    /// Completes an in-process restart: the old context is dropped and initialization runs
    /// again from scratch.
    pub async fn restart(&mut self, clock: &mut impl FrameClock) -> Result<BackendKind> {
        if !self.needs_restart() {
            return Err(AtriumError::InvalidTransition {
                from: self.state,
                action: "restart",
            });
        }
        let Some(config) = self.config.clone() else {
            return Err(AtriumError::RestartFailed(
                "no configuration from a previous initialization".to_string(),
            ));
        };

        if let Some(mut context) = self.context.take() {
            context.dispose();
        }
        // A restart is a fresh session.
        self.preferred_disabled = false;

        let deadline = self.restore_deadline;
        let result = self.bring_up(&config, clock).await;

        if result.is_ok()
            && let Some(deadline) = deadline
            && clock.now() > deadline
        {
            log::warn!("Restart completed after the restore deadline");
        }
        result.map_err(|e| AtriumError::RestartFailed(e.to_string()))
    }

    /// Releases the context. The manager can be initialized again afterwards.
    pub fn shutdown(&mut self) {
        if let Some(mut context) = self.context.take() {
            context.dispose();
        }
        self.state = LifecycleState::Uninitialized;
        self.generation += 1;
        self.restore_deadline = None;
        self.restart_outcome = None;
    }
}
