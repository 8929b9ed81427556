use crate::quality::TierConfig;
use crate::resources::{MaterialChannels, MaterialDescriptor};

/// What a downgrade changed on one material.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DowngradeSummary {
    pub removed_channels: MaterialChannels,
    pub anisotropy_clamped: bool,
}

impl DowngradeSummary {
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.removed_channels.is_empty() || self.anisotropy_clamped
    }
}

/// Projects materials onto a tier's budget.
///
/// On tiers with `material_downgrade`, the normal, roughness and metalness maps are
/// dropped and anisotropy is clamped. This is one-way: the stripped textures are not
/// kept anywhere. The upload cap from `max_texture_dimension` applies on every tier and
/// is non-destructive.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialDowngrader;

impl MaterialDowngrader {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Returns a downgraded copy and leaves `material` untouched.
    #[must_use]
    pub fn project(&self, material: &MaterialDescriptor, config: &TierConfig) -> MaterialDescriptor {
        let mut projected = material.clone();
        self.downgrade(&mut projected, config);
        projected
    }

    /// Downgrades `material` in place.
    pub fn downgrade(&self, material: &mut MaterialDescriptor, config: &TierConfig) -> DowngradeSummary {
        material.max_texture_dimension = Some(
            material
                .max_texture_dimension
                .map_or(config.max_texture_dimension, |cap| cap.min(config.max_texture_dimension)),
        );

        if !config.material_downgrade {
            return DowngradeSummary::default();
        }

        let removed_channels = material.channels() & MaterialChannels::OPTIONAL;
        material.normal_map = None;
        material.roughness_map = None;
        material.metalness_map = None;

        let anisotropy_clamped = material.anisotropy > config.anisotropy_level;
        material.anisotropy = material.anisotropy.min(config.anisotropy_level);

        let summary = DowngradeSummary {
            removed_channels,
            anisotropy_clamped,
        };

        if summary.changed() {
            material.invalidate_layout();
            log::debug!(
                "Downgraded material '{}': removed {:?}, anisotropy {}",
                material.name,
                removed_channels,
                material.anisotropy
            );
        }
        material.mark_downgraded();

        summary
    }
}
