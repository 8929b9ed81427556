//! Quality Tiers & Budgets
//!
//! [`TierConfig::for_tier`] is the single source of budget truth. Every downstream
//! component reads its budgets from the [`SessionQuality`] built once at startup and
//! passed by reference; nothing re-derives budgets from raw device signals.

mod tier;

pub use tier::{QualityTier, SessionQuality, TierConfig};
