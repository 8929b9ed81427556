//! Adaptive Settings
//!
//! Every tunable constant of the adaptive core lives in [`AdaptiveSettings`]. The
//! defaults are production values; hosts may override any subset from JSON.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use atrium::AdaptiveSettings;
//!
//! // Defaults
//! let settings = AdaptiveSettings::default();
//!
//! // Partial override, everything else keeps its default
//! let settings = AdaptiveSettings::from_json(r#"{ "smoke_test_timeout_ms": 1500 }"#)?;
//! ```
//!
//! # Fields
//!
//! | Field                          | Description                                  | Default                  |
//! |--------------------------------|----------------------------------------------|--------------------------|
//! | `classifier`                   | OR-rule thresholds                           | see [`ClassifierThresholds`] |
//! | `smoke_test_timeout_ms`        | Max wait for the preferred-backend smoke test | 2000                    |
//! | `restore_timeout_ms`           | Max time in `Restoring` before `Failed`      | 5000                     |
//! | `governor`                     | Jank window / threshold / tolerance          | see [`GovernorSettings`] |
//! | `decimation_vertex_threshold`  | Meshes at or below this are never decimated  | 10000                    |
//! | `loss_flag_key`                | Durable key of the "context lost" flag       | `atrium.context-lost`    |

use serde::{Deserialize, Serialize};

use crate::device::ClassifierThresholds;
use crate::errors::{AtriumError, Result};
use crate::renderer::governor::GovernorSettings;
use crate::utils::time::Duration;

/// Tunables for the adaptive rendering core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveSettings {
    /// Device classification thresholds.
    pub classifier: ClassifierThresholds,

    /// Upper bound on the preferred-backend smoke test, in milliseconds.
    pub smoke_test_timeout_ms: u64,

    /// Upper bound on the `Restoring` state, in milliseconds.
    pub restore_timeout_ms: u64,

    /// Runtime frame governor configuration.
    pub governor: GovernorSettings,

    /// Meshes with this many vertices or fewer are returned unchanged by the decimator.
    pub decimation_vertex_threshold: u32,

    /// Key (web) or file stem (native) of the persisted "context lost" flag.
    pub loss_flag_key: String,
}

impl Default for AdaptiveSettings {
    fn default() -> Self {
        Self {
            classifier: ClassifierThresholds::default(),
            smoke_test_timeout_ms: 2_000,
            restore_timeout_ms: 5_000,
            governor: GovernorSettings::default(),
            decimation_vertex_threshold: 10_000,
            loss_flag_key: "atrium.context-lost".to_string(),
        }
    }
}

impl AdaptiveSettings {
    /// Parses settings from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Rejects values that would make a component misbehave.
    pub fn validate(&self) -> Result<()> {
        if self.smoke_test_timeout_ms == 0 {
            return Err(AtriumError::InvalidSettings(
                "smoke_test_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.restore_timeout_ms == 0 {
            return Err(AtriumError::InvalidSettings(
                "restore_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.governor.window_size == 0 {
            return Err(AtriumError::InvalidSettings(
                "governor.window_size must be greater than zero".to_string(),
            ));
        }
        if self.governor.jank_tolerance >= self.governor.window_size {
            return Err(AtriumError::InvalidSettings(format!(
                "governor.jank_tolerance ({}) must be below governor.window_size ({})",
                self.governor.jank_tolerance, self.governor.window_size
            )));
        }
        if self.loss_flag_key.trim().is_empty() {
            return Err(AtriumError::InvalidSettings(
                "loss_flag_key must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn smoke_test_timeout(&self) -> Duration {
        Duration::from_millis(self.smoke_test_timeout_ms)
    }

    #[inline]
    #[must_use]
    pub fn restore_timeout(&self) -> Duration {
        Duration::from_millis(self.restore_timeout_ms)
    }
}
