use std::fmt;

use serde::{Deserialize, Serialize};

use crate::device::{DeviceProfile, DeviceSignals, classify_with};
use crate::settings::AdaptiveSettings;

// ---------------------------------------------------------------------------
// QualityTier
// ---------------------------------------------------------------------------

/// Discrete quality level assigned once per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QualityTier {
    /// Constrained devices: phones, emulated viewports, low-memory hardware.
    Low,
    /// Unconstrained but modest devices (tablets, mid-range laptops).
    Balanced,
    /// Desktop-class devices.
    High,
}

impl QualityTier {
    /// All tiers in ascending cost order.
    pub const ALL: [QualityTier; 3] = [Self::Low, Self::Balanced, Self::High];

    /// Only `Low` is constrained: it alone enables decimation, material downgrade and
    /// the frame governor.
    #[inline]
    #[must_use]
    pub fn is_constrained(self) -> bool {
        matches!(self, Self::Low)
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Low => "Low",
            Self::Balanced => "Balanced",
            Self::High => "High",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// TierConfig
// ---------------------------------------------------------------------------

/// Concrete resource budgets for one tier.
///
/// | Field                         | Low        | Balanced   | High       |
/// |-------------------------------|------------|------------|------------|
/// | `pixel_ratio_cap`             | 1.0        | 1.5        | 2.0        |
/// | `shadow_enabled`              | no         | yes        | yes        |
/// | `shadow_map_size`             | 512        | 1024       | 2048       |
/// | `max_texture_dimension`       | 1024       | 2048       | 4096       |
/// | `anisotropy_level`            | 1          | 4          | 16         |
/// | `bloom_enabled`               | no         | yes        | yes        |
/// | `ambient_occlusion_enabled`   | no         | no         | yes        |
/// | `max_canvas_pixel_budget`     | 1.5 MP     | 3.7 MP     | 8.3 MP     |
/// | `prefer_high_throughput_backend` | no      | yes        | yes        |
/// | `decimation_ratio`            | 0.3        | none       | none       |
/// | `material_downgrade`          | yes        | no         | no         |
/// | `frame_governor`              | yes        | no         | no         |
///
/// For every resource-cost field, `Low <= Balanced <= High`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierConfig {
    /// Upper bound on the device pixel ratio used for the drawing buffer.
    pub pixel_ratio_cap: f32,
    /// Whether shadow-casting lights are mounted at all.
    pub shadow_enabled: bool,
    /// Edge length of the shadow map in texels.
    pub shadow_map_size: u32,
    /// Largest texture edge uploaded to the GPU.
    pub max_texture_dimension: u32,
    /// Anisotropic filtering clamp.
    pub anisotropy_level: u16,
    /// Bloom post-processing stage.
    pub bloom_enabled: bool,
    /// Screen-space ambient occlusion stage.
    pub ambient_occlusion_enabled: bool,
    /// Maximum drawing-buffer pixel count (width x height).
    pub max_canvas_pixel_budget: u32,
    /// Attempt the high-throughput backend before the standard one.
    pub prefer_high_throughput_backend: bool,
    /// Target triangle ratio for oversized meshes; `None` disables decimation.
    pub decimation_ratio: Option<f32>,
    /// Strip optional material channels and clamp filtering.
    pub material_downgrade: bool,
    /// Run the runtime frame governor.
    pub frame_governor: bool,
}

impl TierConfig {
    /// Static, side-effect-free budget lookup.
    #[must_use]
    pub fn for_tier(tier: QualityTier) -> Self {
        match tier {
            QualityTier::Low => Self {
                pixel_ratio_cap: 1.0,
                shadow_enabled: false,
                shadow_map_size: 512,
                max_texture_dimension: 1024,
                anisotropy_level: 1,
                bloom_enabled: false,
                ambient_occlusion_enabled: false,
                max_canvas_pixel_budget: 1_500_000,
                prefer_high_throughput_backend: false,
                decimation_ratio: Some(0.3),
                material_downgrade: true,
                frame_governor: true,
            },
            QualityTier::Balanced => Self {
                pixel_ratio_cap: 1.5,
                shadow_enabled: true,
                shadow_map_size: 1024,
                max_texture_dimension: 2048,
                anisotropy_level: 4,
                bloom_enabled: true,
                ambient_occlusion_enabled: false,
                max_canvas_pixel_budget: 3_686_400,
                prefer_high_throughput_backend: true,
                decimation_ratio: None,
                material_downgrade: false,
                frame_governor: false,
            },
            QualityTier::High => Self {
                pixel_ratio_cap: 2.0,
                shadow_enabled: true,
                shadow_map_size: 2048,
                max_texture_dimension: 4096,
                anisotropy_level: 16,
                bloom_enabled: true,
                ambient_occlusion_enabled: true,
                max_canvas_pixel_budget: 8_294_400,
                prefer_high_throughput_backend: true,
                decimation_ratio: None,
                material_downgrade: false,
                frame_governor: false,
            },
        }
    }

    /// Pixel ratio for a drawing buffer of `width` x `height` logical pixels.
    ///
    /// The device ratio is first capped by `pixel_ratio_cap`, then lowered further so
    /// the physical pixel count stays within `max_canvas_pixel_budget`.
    #[must_use]
    pub fn effective_pixel_ratio(&self, device_pixel_ratio: f32, width: u32, height: u32) -> f32 {
        let mut ratio = device_pixel_ratio.clamp(0.25, self.pixel_ratio_cap.max(0.25));

        let logical_pixels = f64::from(width) * f64::from(height);
        if logical_pixels > 0.0 {
            let physical = logical_pixels * f64::from(ratio) * f64::from(ratio);
            let budget = f64::from(self.max_canvas_pixel_budget);
            if physical > budget {
                ratio = (budget / logical_pixels).sqrt().max(0.25) as f32;
            }
        }

        ratio
    }
}

// ---------------------------------------------------------------------------
// SessionQuality
// ---------------------------------------------------------------------------

/// The immutable quality decision for a session.
///
/// Built once at startup and handed by reference to every component that needs a
/// budget.
#[derive(Debug, Clone)]
pub struct SessionQuality {
    profile: DeviceProfile,
    tier: QualityTier,
    config: TierConfig,
}

impl SessionQuality {
    /// Classifies `signals` and resolves the tier budgets.
    #[must_use]
    pub fn from_signals(signals: &DeviceSignals, settings: &AdaptiveSettings) -> Self {
        let (profile, tier) = classify_with(signals, &settings.classifier);
        Self::new(profile, tier)
    }

    #[must_use]
    pub fn new(profile: DeviceProfile, tier: QualityTier) -> Self {
        Self {
            profile,
            tier,
            config: TierConfig::for_tier(tier),
        }
    }

    #[inline]
    #[must_use]
    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    #[inline]
    #[must_use]
    pub fn tier(&self) -> QualityTier {
        self.tier
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &TierConfig {
        &self.config
    }
}
