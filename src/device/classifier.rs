use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::signals::DeviceSignals;
use crate::quality::QualityTier;

/// User-agent fragments that identify handheld devices (matched case-insensitively).
const HANDHELD_USER_AGENT_MARKERS: &[&str] = &[
    "android",
    "iphone",
    "ipad",
    "ipod",
    "mobile",
    "blackberry",
    "iemobile",
    "opera mini",
    "webos",
];

bitflags! {
    /// Which constrained-device signals fired during classification.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct ConstraintSignals: u8 {
        const HANDHELD_USER_AGENT   = 1 << 0;
        const NARROW_TOUCH_VIEWPORT = 1 << 1;
        const LOW_MEMORY            = 1 << 2;
        const SIMULATOR_VIEWPORT    = 1 << 3;
    }
}

/// Thresholds used by the OR-rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierThresholds {
    /// Touch devices narrower than this are treated as handheld.
    pub narrow_viewport_width: u32,
    /// Reported memory at or below this (GiB) is constrained.
    pub low_memory_gb: f32,
    /// Viewports smaller than this in either dimension look like an emulated device.
    pub simulator_viewport: u32,
    /// Unconstrained devices reporting less memory than this (GiB) get `Balanced`.
    pub balanced_memory_gb: f32,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            narrow_viewport_width: 768,
            low_memory_gb: 4.0,
            simulator_viewport: 480,
            balanced_memory_gb: 8.0,
        }
    }
}

/// Immutable snapshot of the device signals taken at startup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceProfile {
    handheld_user_agent: bool,
    touch_capable: bool,
    viewport_width: u32,
    viewport_height: u32,
    device_memory_gb: Option<f32>,
    simulator_sized: bool,
    device_pixel_ratio: f32,
    #[serde(skip)]
    constraints: ConstraintSignals,
}

impl DeviceProfile {
    #[must_use]
    pub fn handheld_user_agent(&self) -> bool {
        self.handheld_user_agent
    }

    #[must_use]
    pub fn touch_capable(&self) -> bool {
        self.touch_capable
    }

    #[must_use]
    pub fn viewport(&self) -> (u32, u32) {
        (self.viewport_width, self.viewport_height)
    }

    #[must_use]
    pub fn device_memory_gb(&self) -> Option<f32> {
        self.device_memory_gb
    }

    #[must_use]
    pub fn simulator_sized(&self) -> bool {
        self.simulator_sized
    }

    #[must_use]
    pub fn device_pixel_ratio(&self) -> f32 {
        self.device_pixel_ratio
    }

    /// The constrained-device signals that fired. Empty for unconstrained devices.
    #[must_use]
    pub fn constraints(&self) -> ConstraintSignals {
        self.constraints
    }

    #[must_use]
    pub fn is_constrained(&self) -> bool {
        !self.constraints.is_empty()
    }
}

/// Classifies with the default thresholds.
#[must_use]
pub fn classify(signals: &DeviceSignals) -> (DeviceProfile, QualityTier) {
    classify_with(signals, &ClassifierThresholds::default())
}

/// Pure classification: identical signals and thresholds always give the same tier.
///
/// `Low` is chosen when ANY constrained signal fires; conflicting signals (a desktop
/// user agent on a phone-sized touch viewport, say) therefore resolve toward the
/// constrained tier. Unconstrained devices get `Balanced` when they are touch-capable or
/// report modest memory, and `High` otherwise.
#[must_use]
pub fn classify_with(
    signals: &DeviceSignals,
    thresholds: &ClassifierThresholds,
) -> (DeviceProfile, QualityTier) {
    let user_agent = signals.user_agent.to_ascii_lowercase();
    let handheld_user_agent = HANDHELD_USER_AGENT_MARKERS
        .iter()
        .any(|marker| user_agent.contains(marker));

    let simulator_sized = signals.viewport_width < thresholds.simulator_viewport
        || signals.viewport_height < thresholds.simulator_viewport;

    let mut constraints = ConstraintSignals::empty();
    constraints.set(ConstraintSignals::HANDHELD_USER_AGENT, handheld_user_agent);
    constraints.set(
        ConstraintSignals::NARROW_TOUCH_VIEWPORT,
        signals.touch_capable && signals.viewport_width < thresholds.narrow_viewport_width,
    );
    constraints.set(
        ConstraintSignals::LOW_MEMORY,
        signals
            .device_memory_gb
            .is_some_and(|gb| gb <= thresholds.low_memory_gb),
    );
    constraints.set(ConstraintSignals::SIMULATOR_VIEWPORT, simulator_sized);

    let profile = DeviceProfile {
        handheld_user_agent,
        touch_capable: signals.touch_capable,
        viewport_width: signals.viewport_width,
        viewport_height: signals.viewport_height,
        device_memory_gb: signals.device_memory_gb,
        simulator_sized,
        device_pixel_ratio: signals.device_pixel_ratio,
        constraints,
    };

    let tier = if profile.is_constrained() {
        QualityTier::Low
    } else if signals.touch_capable
        || signals
            .device_memory_gb
            .is_some_and(|gb| gb < thresholds.balanced_memory_gb)
    {
        QualityTier::Balanced
    } else {
        QualityTier::High
    };

    log::info!(
        "Device classified as {tier} (viewport {}x{}, memory {:?} GiB, signals {:?})",
        profile.viewport_width,
        profile.viewport_height,
        profile.device_memory_gb,
        profile.constraints,
    );

    (profile, tier)
}
