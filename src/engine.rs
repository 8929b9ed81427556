//! Engine Core Module
//!
//! [`Engine`] wires the adaptive components together for a host frame loop. It owns no
//! window and no scene graph; the host hands it decoded assets, camera and light state,
//! and frame timestamps.
//!
//! # Lifecycle
//!
//! 1. [`Engine::new`] classifies the device once and fixes the tier for the session
//! 2. [`Engine::init`] brings up the GPU context
//! 3. [`Engine::prepare_assets`] degrades each decoded batch once, at load time
//! 4. Per frame: [`begin_frame`](Engine::begin_frame),
//!    [`update_shadows`](Engine::update_shadows), host draw calls,
//!    [`end_frame`](Engine::end_frame)
//! 5. After a context restore on native hosts: [`Engine::restart`]
//!
//! # Example
//!
//! ```rust,ignore
//! use atrium::{AdaptiveSettings, DeviceSignals, Engine};
//! use atrium::platform::{FileLossFlagStore, InProcessRestarter, IntervalFrameClock};
//! use atrium::renderer::core::WgpuPlatform;
//!
//! let settings = AdaptiveSettings::default();
//! let store = FileLossFlagStore::in_dir(".", &settings.loss_flag_key);
//! let mut engine = Engine::new(&signals, settings, WgpuPlatform::new(), store, InProcessRestarter)?;
//!
//! let mut clock = IntervalFrameClock::from_hz(60);
//! engine.init(&mut clock).await?;
//!
//! loop {
//!     let now = clock.next_frame().await;
//!     let token = engine.begin_frame(now)?;
//!     engine.update_shadows(&camera, &mut sun, &visible_bounds);
//!     // ... draw ...
//!     engine.end_frame(token, now)?;
//! }
//! ```

use crate::degrade::{DegradationPass, PreparedAssets};
use crate::device::DeviceSignals;
use crate::errors::Result;
use crate::platform::{FrameClock, LossFlagStore, SessionRestarter};
use crate::quality::{QualityTier, SessionQuality, TierConfig};
use crate::renderer::backend::BackendKind;
use crate::renderer::events::LifecycleNotice;
use crate::renderer::governor::{DegradationStage, FramePerformanceGovernor};
use crate::renderer::gpu::GpuPlatform;
use crate::renderer::lifecycle::{FrameToken, RendererLifecycleManager};
use crate::renderer::shadow::{FitOutcome, ShadowFrustumFitter};
use crate::resources::{BoundingBox, MaterialDescriptor, MeshAsset};
use crate::scene::{Camera, DirectionalLight};
use crate::settings::AdaptiveSettings;
use crate::utils::time::{FrameTimer, Instant};

/// Central coordinator of the adaptive rendering core.
pub struct Engine<P: GpuPlatform> {
    settings: AdaptiveSettings,
    quality: SessionQuality,
    effective: TierConfig,

    lifecycle: RendererLifecycleManager<P>,
    degradation: DegradationPass,
    shadows: ShadowFrustumFitter,
    governor: FramePerformanceGovernor,
    timer: FrameTimer,
}

impl<P: GpuPlatform> Engine<P> {
    /// Classifies `signals` and builds every component for the resulting tier.
    pub fn new(
        signals: &DeviceSignals,
        settings: AdaptiveSettings,
        platform: P,
        flag_store: impl LossFlagStore + 'static,
        restarter: impl SessionRestarter + 'static,
    ) -> Result<Self> {
        settings.validate()?;
        let quality = SessionQuality::from_signals(signals, &settings);
        Ok(Self::with_quality(quality, settings, platform, flag_store, restarter))
    }

    /// Uses an already-made quality decision.
    pub fn with_quality(
        quality: SessionQuality,
        settings: AdaptiveSettings,
        platform: P,
        flag_store: impl LossFlagStore + 'static,
        restarter: impl SessionRestarter + 'static,
    ) -> Self {
        let lifecycle = RendererLifecycleManager::new(platform, flag_store, restarter, &settings);
        let governor = FramePerformanceGovernor::for_config(quality.config(), settings.governor.clone());

        log::info!(
            "Session quality: {} (governor {})",
            quality.tier(),
            if governor.is_enabled() { "on" } else { "off" }
        );

        Self {
            effective: quality.config().clone(),
            degradation: DegradationPass::new(&settings),
            settings,
            quality,
            lifecycle,
            shadows: ShadowFrustumFitter::new(),
            governor,
            timer: FrameTimer::new(),
        }
    }

    pub async fn init(&mut self, clock: &mut impl FrameClock) -> Result<BackendKind> {
        let config = self.quality.config().clone();
        self.lifecycle.initialize(&config, clock).await
    }

    /// Degrades a freshly decoded batch against the current effective budget.
    #[must_use]
    pub fn prepare_assets(
        &self,
        meshes: Vec<MeshAsset>,
        materials: &[MaterialDescriptor],
    ) -> PreparedAssets {
        self.degradation.prepare(meshes, materials, &self.effective)
    }

    /// Frame boundary: handles platform events, commits a pending governor stage, then
    /// mints the token for this frame.
    pub fn begin_frame(&mut self, now: Instant) -> Result<FrameToken> {
        self.lifecycle.tick(now);

        if let Some(stage) = self.governor.apply_pending() {
            self.effective = stage.apply_to(self.quality.config());
        }

        self.lifecycle.begin_frame()
    }

    /// Fits the sun's shadow bounds to the visible objects. `None` when the effective
    /// budget has no shadows.
    pub fn update_shadows<'a>(
        &mut self,
        camera: &Camera,
        light: &mut DirectionalLight,
        objects: impl IntoIterator<Item = &'a BoundingBox>,
    ) -> Option<FitOutcome> {
        if !self.effective.shadow_enabled {
            return None;
        }
        light.shadow.map_size = self.effective.shadow_map_size;
        Some(self.shadows.fit(camera.frustum(), light, objects))
    }

    /// Submits the frame and feeds its duration to the governor.
    ///
    /// Returns a stage that will take effect at the next [`begin_frame`](Self::begin_frame).
    pub fn end_frame(&mut self, token: FrameToken, now: Instant) -> Result<Option<DegradationStage>> {
        self.lifecycle.submit_frame(token)?;
        Ok(self
            .timer
            .tick_at(now)
            .and_then(|sample| self.governor.record(sample)))
    }

    /// Finishes an in-process restart after a context restore or a user reload.
    ///
    /// The restarted session starts like a fresh load: the tier is kept, while governor
    /// stage, effective budget, shadow bounds and frame timing start over.
    pub async fn restart(&mut self, clock: &mut impl FrameClock) -> Result<BackendKind> {
        let backend = self.lifecycle.restart(clock).await?;
        self.governor =
            FramePerformanceGovernor::for_config(self.quality.config(), self.settings.governor.clone());
        self.effective = self.quality.config().clone();
        self.shadows = ShadowFrustumFitter::new();
        self.timer = FrameTimer::new();
        log::info!("Session restarted on {backend:?} at full {} quality", self.quality.tier());
        Ok(backend)
    }

    pub fn subscribe(&mut self) -> flume::Receiver<LifecycleNotice> {
        self.lifecycle.subscribe()
    }

    #[inline]
    #[must_use]
    pub fn tier(&self) -> QualityTier {
        self.quality.tier()
    }

    #[inline]
    #[must_use]
    pub fn quality(&self) -> &SessionQuality {
        &self.quality
    }

    /// Tier budget with the current governor stage applied.
    #[inline]
    #[must_use]
    pub fn effective_config(&self) -> &TierConfig {
        &self.effective
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &AdaptiveSettings {
        &self.settings
    }

    #[inline]
    #[must_use]
    pub fn lifecycle(&self) -> &RendererLifecycleManager<P> {
        &self.lifecycle
    }

    pub fn lifecycle_mut(&mut self) -> &mut RendererLifecycleManager<P> {
        &mut self.lifecycle
    }

    #[inline]
    #[must_use]
    pub fn governor(&self) -> &FramePerformanceGovernor {
        &self.governor
    }

    #[inline]
    #[must_use]
    pub fn shadows(&self) -> &ShadowFrustumFitter {
        &self.shadows
    }
}
