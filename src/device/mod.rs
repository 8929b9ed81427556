//! Device Capability Classification
//!
//! Runtime device signals are read once at startup ([`DeviceSignals`]), frozen into an
//! immutable [`DeviceProfile`], and mapped to a [`QualityTier`](crate::QualityTier) by
//! [`classify`].
//!
//! The tier is never re-evaluated during a session: a foldable or resizable device that
//! crosses a viewport threshold after startup keeps the tier it started with.

mod classifier;
mod signals;

pub use classifier::{ClassifierThresholds, ConstraintSignals, DeviceProfile, classify, classify_with};
pub use signals::DeviceSignals;
