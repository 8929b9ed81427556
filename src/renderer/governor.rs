//! Runtime frame governor.
//!
//! Watches a rolling window of frame durations on constrained tiers and escalates a
//! fixed ladder of degradation stages when too many frames are janky:
//!
//! | Stage                   | Effect on the tier budget                               |
//! |-------------------------|---------------------------------------------------------|
//! | `Full`                  | none                                                    |
//! | `PostProcessingOff`     | bloom and ambient occlusion off                         |
//! | `TextureQualityReduced` | + texture cap halved, anisotropy 1                      |
//! | `GeometrySimplified`    | + decimation ratio halved for meshes prepared afterward |
//!
//! The ladder only goes up. A requested stage becomes pending and is applied by
//! [`FramePerformanceGovernor::apply_pending`], which the frame loop calls between
//! frames.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::quality::TierConfig;
use crate::utils::time::{Duration, Instant};

/// Smallest texture cap the `TextureQualityReduced` stage will go down to.
const MIN_REDUCED_TEXTURE_DIMENSION: u32 = 256;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernorSettings {
    /// Number of most recent frames considered.
    pub window_size: usize,
    /// A frame longer than this (milliseconds) is janky.
    pub jank_threshold_ms: f32,
    /// Escalate when the window holds MORE than this many janky frames.
    pub jank_tolerance: usize,
}

impl Default for GovernorSettings {
    fn default() -> Self {
        Self {
            window_size: 60,
            jank_threshold_ms: 50.0,
            jank_tolerance: 8,
        }
    }
}

impl GovernorSettings {
    #[must_use]
    pub fn jank_threshold(&self) -> Duration {
        Duration::from_secs_f32(self.jank_threshold_ms.max(0.0) / 1000.0)
    }
}

/// One presented frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSample {
    pub timestamp: Instant,
    pub duration: Duration,
}

impl FrameSample {
    #[must_use]
    pub fn new(timestamp: Instant, duration: Duration) -> Self {
        Self { timestamp, duration }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum DegradationStage {
    #[default]
    Full,
    PostProcessingOff,
    TextureQualityReduced,
    GeometrySimplified,
}

impl DegradationStage {
    pub const LADDER: [DegradationStage; 4] = [
        Self::Full,
        Self::PostProcessingOff,
        Self::TextureQualityReduced,
        Self::GeometrySimplified,
    ];

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The next stage up, or `None` at the top of the ladder.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::LADDER.get(self.index() + 1).copied()
    }

    /// Effective budget for this stage. `base` is left untouched.
    #[must_use]
    pub fn apply_to(self, base: &TierConfig) -> TierConfig {
        let mut config = base.clone();
        if self >= Self::PostProcessingOff {
            config.bloom_enabled = false;
            config.ambient_occlusion_enabled = false;
        }
        if self >= Self::TextureQualityReduced {
            config.max_texture_dimension =
                (config.max_texture_dimension / 2).max(MIN_REDUCED_TEXTURE_DIMENSION);
            config.anisotropy_level = 1;
        }
        if self >= Self::GeometrySimplified {
            config.decimation_ratio = config.decimation_ratio.map(|r| r * 0.5);
        }
        config
    }
}

impl fmt::Display for DegradationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Full => "full quality",
            Self::PostProcessingOff => "post-processing off",
            Self::TextureQualityReduced => "texture quality reduced",
            Self::GeometrySimplified => "geometry simplified",
        };
        f.write_str(name)
    }
}

/// Rolling-window jank monitor with a one-way degradation ladder.
#[derive(Debug, Clone)]
pub struct FramePerformanceGovernor {
    settings: GovernorSettings,
    jank_threshold: Duration,
    enabled: bool,
    window: VecDeque<FrameSample>,
    janky_in_window: usize,
    stage: DegradationStage,
    pending: Option<DegradationStage>,
}

impl FramePerformanceGovernor {
    #[must_use]
    pub fn new(settings: GovernorSettings, enabled: bool) -> Self {
        Self {
            jank_threshold: settings.jank_threshold(),
            window: VecDeque::with_capacity(settings.window_size),
            settings,
            enabled,
            janky_in_window: 0,
            stage: DegradationStage::Full,
            pending: None,
        }
    }

    /// Enabled only when the tier config asks for it.
    #[must_use]
    pub fn for_config(config: &TierConfig, settings: GovernorSettings) -> Self {
        Self::new(settings, config.frame_governor)
    }

    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    #[must_use]
    pub fn stage(&self) -> DegradationStage {
        self.stage
    }

    #[inline]
    #[must_use]
    pub fn pending(&self) -> Option<DegradationStage> {
        self.pending
    }

    #[inline]
    #[must_use]
    pub fn janky_frames(&self) -> usize {
        self.janky_in_window
    }

    #[inline]
    #[must_use]
    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    #[must_use]
    pub fn is_janky(&self, sample: &FrameSample) -> bool {
        sample.duration > self.jank_threshold
    }

    /// Adds a sample. Returns the stage that became pending, if this sample tipped the
    /// window over the tolerance.
    pub fn record(&mut self, sample: FrameSample) -> Option<DegradationStage> {
        if !self.enabled {
            return None;
        }

        if self.window.len() == self.settings.window_size
            && let Some(old) = self.window.pop_front()
            && self.is_janky(&old)
        {
            self.janky_in_window -= 1;
        }
        if self.is_janky(&sample) {
            self.janky_in_window += 1;
        }
        self.window.push_back(sample);

        if self.pending.is_some() || self.janky_in_window <= self.settings.jank_tolerance {
            return None;
        }

        let next = self.stage.next()?;
        log::debug!(
            "{} janky frames in the last {}; scheduling '{next}'",
            self.janky_in_window,
            self.window.len()
        );
        self.pending = Some(next);
        Some(next)
    }

    /// Commits the pending stage. Call only between frames.
    ///
    /// The window is cleared so the new stage is judged on its own frames.
    pub fn apply_pending(&mut self) -> Option<DegradationStage> {
        let next = self.pending.take()?;
        if next <= self.stage {
            return None;
        }
        log::warn!("Frame governor: {} -> {}", self.stage, next);
        self.stage = next;
        self.window.clear();
        self.janky_in_window = 0;
        Some(next)
    }

    /// The tier budget with the current stage applied.
    #[must_use]
    pub fn effective_config(&self, base: &TierConfig) -> TierConfig {
        self.stage.apply_to(base)
    }
}
