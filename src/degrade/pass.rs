use super::decimator::{DecimationOutcome, DecimationSkipped, GeometryDecimator};
use super::material::MaterialDowngrader;
use crate::quality::TierConfig;
use crate::resources::{MaterialDescriptor, MeshAsset};
use crate::settings::AdaptiveSettings;

/// Totals from one [`DegradationPass::prepare`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DegradationReport {
    pub meshes_decimated: usize,
    pub meshes_below_threshold: usize,
    pub meshes_already_decimated: usize,
    pub triangles_before: usize,
    pub triangles_after: usize,
    pub materials_downgraded: usize,
    pub channels_removed: usize,
}

#[derive(Debug, Clone)]
pub struct PreparedAssets {
    pub meshes: Vec<MeshAsset>,
    pub materials: Vec<MaterialDescriptor>,
    pub report: DegradationReport,
}

/// Load-time reduction of a decoded asset batch.
///
/// Runs once per batch when it arrives, never on the per-frame path.
#[derive(Debug, Clone, Default)]
pub struct DegradationPass {
    decimator: GeometryDecimator,
    downgrader: MaterialDowngrader,
}

impl DegradationPass {
    #[must_use]
    pub fn new(settings: &AdaptiveSettings) -> Self {
        Self {
            decimator: GeometryDecimator::new(settings.decimation_vertex_threshold),
            downgrader: MaterialDowngrader::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn decimator(&self) -> &GeometryDecimator {
        &self.decimator
    }

    /// Decimates meshes (when the config has a ratio) and projects materials.
    ///
    /// Materials are taken by reference because decoded descriptors may be shared with
    /// other views of the asset cache; the prepared copies are new descriptors.
    #[must_use]
    pub fn prepare(
        &self,
        meshes: Vec<MeshAsset>,
        materials: &[MaterialDescriptor],
        config: &TierConfig,
    ) -> PreparedAssets {
        let mut report = DegradationReport::default();

        let meshes = meshes
            .into_iter()
            .map(|mesh| {
                report.triangles_before += mesh.triangle_count();
                let mesh = match config.decimation_ratio {
                    Some(ratio) => {
                        let (mesh, outcome) = self.decimator.decimate(mesh, ratio);
                        match outcome {
                            DecimationOutcome::Reduced { .. } => report.meshes_decimated += 1,
                            DecimationOutcome::Skipped(DecimationSkipped::BelowThreshold { .. }) => {
                                report.meshes_below_threshold += 1;
                            }
                            DecimationOutcome::Skipped(DecimationSkipped::AlreadyDecimated) => {
                                report.meshes_already_decimated += 1;
                            }
                            DecimationOutcome::Skipped(DecimationSkipped::RatioOutOfRange { ratio }) => {
                                log::warn!("Decimation ratio {ratio} is out of range; mesh kept");
                            }
                        }
                        mesh
                    }
                    None => mesh,
                };
                report.triangles_after += mesh.triangle_count();
                mesh
            })
            .collect();

        let materials = materials
            .iter()
            .map(|material| {
                let mut projected = material.clone();
                let summary = self.downgrader.downgrade(&mut projected, config);
                if summary.changed() {
                    report.materials_downgraded += 1;
                    report.channels_removed += summary.removed_channels.bits().count_ones() as usize;
                }
                projected
            })
            .collect();

        log::info!(
            "Degradation pass: {} meshes decimated ({} -> {} triangles), {} materials downgraded",
            report.meshes_decimated,
            report.triangles_before,
            report.triangles_after,
            report.materials_downgraded,
        );

        PreparedAssets {
            meshes,
            materials,
            report,
        }
    }
}
