//! Quality Tier & Settings Tests
//!
//! Tests for:
//! - Per-tier budgets and their ordering
//! - Pixel ratio capping against the canvas budget
//! - Session quality resolution
//! - AdaptiveSettings JSON parsing and validation

use atrium::errors::AtriumError;
use atrium::{AdaptiveSettings, DeviceSignals, QualityTier, SessionQuality, TierConfig};

const EPSILON: f32 = 1e-4;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

// ============================================================================
// TierConfig
// ============================================================================

#[test]
fn cost_fields_never_decrease_with_tier() {
    for pair in QualityTier::ALL.windows(2) {
        let lower = TierConfig::for_tier(pair[0]);
        let higher = TierConfig::for_tier(pair[1]);

        assert!(lower.pixel_ratio_cap <= higher.pixel_ratio_cap);
        assert!(lower.shadow_map_size <= higher.shadow_map_size);
        assert!(lower.max_texture_dimension <= higher.max_texture_dimension);
        assert!(lower.anisotropy_level <= higher.anisotropy_level);
        assert!(lower.max_canvas_pixel_budget <= higher.max_canvas_pixel_budget);
        assert!(!lower.shadow_enabled || higher.shadow_enabled);
        assert!(!lower.bloom_enabled || higher.bloom_enabled);
        assert!(!lower.ambient_occlusion_enabled || higher.ambient_occlusion_enabled);
    }
}

#[test]
fn only_low_tier_is_constrained() {
    for tier in QualityTier::ALL {
        let config = TierConfig::for_tier(tier);
        let constrained = tier.is_constrained();

        assert_eq!(config.decimation_ratio.is_some(), constrained, "{tier}");
        assert_eq!(config.material_downgrade, constrained, "{tier}");
        assert_eq!(config.frame_governor, constrained, "{tier}");
        assert_eq!(config.prefer_high_throughput_backend, !constrained, "{tier}");
    }
}

#[test]
fn low_tier_budget() {
    let config = TierConfig::for_tier(QualityTier::Low);
    assert!(!config.shadow_enabled);
    assert_eq!(config.max_texture_dimension, 1024);
    assert_eq!(config.decimation_ratio, Some(0.3));
    assert!(approx(config.pixel_ratio_cap, 1.0));
}

#[test]
fn high_tier_budget() {
    let config = TierConfig::for_tier(QualityTier::High);
    assert!(config.shadow_enabled);
    assert_eq!(config.shadow_map_size, 2048);
    assert!(config.ambient_occlusion_enabled);
}

#[test]
fn lookup_is_stable() {
    for tier in QualityTier::ALL {
        assert_eq!(TierConfig::for_tier(tier), TierConfig::for_tier(tier));
    }
}

#[test]
fn tiers_are_ordered() {
    assert!(QualityTier::Low < QualityTier::Balanced);
    assert!(QualityTier::Balanced < QualityTier::High);
    assert_eq!(QualityTier::Balanced.to_string(), "Balanced");
}

// ============================================================================
// Pixel ratio
// ============================================================================

#[test]
fn pixel_ratio_is_capped_by_tier() {
    let config = TierConfig::for_tier(QualityTier::Low);
    assert!(approx(config.effective_pixel_ratio(3.0, 375, 667), 1.0));

    let config = TierConfig::for_tier(QualityTier::High);
    assert!(approx(config.effective_pixel_ratio(1.0, 1920, 1080), 1.0));
}

#[test]
fn pixel_ratio_respects_canvas_budget() {
    let config = TierConfig::for_tier(QualityTier::High);
    // 2560x1440 at 2x would be 14.7 MP, over the 8.3 MP budget.
    let ratio = config.effective_pixel_ratio(2.0, 2560, 1440);

    assert!(ratio < 2.0);
    let physical = 2560.0 * 1440.0 * ratio * ratio;
    assert!(physical <= config.max_canvas_pixel_budget as f32 * 1.001);
}

#[test]
fn pixel_ratio_handles_empty_viewport() {
    let config = TierConfig::for_tier(QualityTier::Balanced);
    assert!(approx(config.effective_pixel_ratio(1.25, 0, 0), 1.25));
}

// ============================================================================
// SessionQuality
// ============================================================================

#[test]
fn session_quality_matches_lookup() {
    let signals = DeviceSignals::new("Mozilla/5.0 (iPhone)", true, 390, 844);
    let quality = SessionQuality::from_signals(&signals, &AdaptiveSettings::default());

    assert_eq!(quality.tier(), QualityTier::Low);
    assert_eq!(quality.config(), &TierConfig::for_tier(QualityTier::Low));
    assert!(quality.profile().handheld_user_agent());
}

#[test]
fn session_quality_uses_settings_thresholds() {
    let mut settings = AdaptiveSettings::default();
    settings.classifier.simulator_viewport = 2000;
    let signals = DeviceSignals::new("Desktop", false, 1920, 1080);

    let quality = SessionQuality::from_signals(&signals, &settings);
    assert_eq!(quality.tier(), QualityTier::Low);
}

// ============================================================================
// AdaptiveSettings
// ============================================================================

#[test]
fn default_settings_are_valid() {
    let settings = AdaptiveSettings::default();
    assert!(settings.validate().is_ok());
    assert_eq!(settings.smoke_test_timeout().as_millis(), 2000);
    assert_eq!(settings.restore_timeout().as_millis(), 5000);
    assert_eq!(settings.governor.window_size, 60);
    assert_eq!(settings.decimation_vertex_threshold, 10_000);
}

#[test]
fn partial_json_keeps_defaults() {
    let settings = AdaptiveSettings::from_json(
        r#"{ "smoke_test_timeout_ms": 1500, "governor": { "jank_tolerance": 4 } }"#,
    )
    .unwrap();

    assert_eq!(settings.smoke_test_timeout_ms, 1500);
    assert_eq!(settings.governor.jank_tolerance, 4);
    assert_eq!(settings.governor.window_size, 60);
    assert_eq!(settings.restore_timeout_ms, 5000);
}

#[test]
fn malformed_json_is_an_error() {
    let err = AdaptiveSettings::from_json("{ not json").unwrap_err();
    assert!(matches!(err, AtriumError::JsonError(_)));
}

#[test]
fn invalid_values_are_rejected() {
    let cases = [
        r#"{ "smoke_test_timeout_ms": 0 }"#,
        r#"{ "restore_timeout_ms": 0 }"#,
        r#"{ "governor": { "window_size": 0 } }"#,
        r#"{ "governor": { "window_size": 10, "jank_tolerance": 10 } }"#,
        r#"{ "loss_flag_key": "  " }"#,
    ];
    for json in cases {
        let err = AdaptiveSettings::from_json(json).unwrap_err();
        assert!(matches!(err, AtriumError::InvalidSettings(_)), "{json}");
    }
}
