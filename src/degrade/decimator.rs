use glam::{Vec2, Vec3};

use crate::resources::MeshAsset;

/// Default guard: meshes with this many vertices or fewer are left alone.
pub const DEFAULT_VERTEX_THRESHOLD: u32 = 10_000;

/// Why a mesh came back unchanged. Not an error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecimationSkipped {
    BelowThreshold { vertex_count: usize },
    AlreadyDecimated,
    /// Ratio not in `(0, 1)`.
    RatioOutOfRange { ratio: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecimationOutcome {
    Reduced {
        triangles_before: usize,
        triangles_after: usize,
    },
    Skipped(DecimationSkipped),
}

impl DecimationOutcome {
    #[must_use]
    pub fn is_reduced(&self) -> bool {
        matches!(self, Self::Reduced { .. })
    }
}

/// Stride-based triangle decimator.
///
/// The index buffer is treated as a flat triangle list. Triangles are kept at evenly
/// spaced positions so the retained count is `round(total * ratio)`; every other
/// triangle is dropped. This ignores topology and can open holes in dense curved
/// surfaces. It is only meant for planar architectural meshes seen from a distance.
#[derive(Debug, Clone)]
pub struct GeometryDecimator {
    vertex_threshold: u32,
}

impl Default for GeometryDecimator {
    fn default() -> Self {
        Self::new(DEFAULT_VERTEX_THRESHOLD)
    }
}

impl GeometryDecimator {
    #[must_use]
    pub fn new(vertex_threshold: u32) -> Self {
        Self { vertex_threshold }
    }

    #[inline]
    #[must_use]
    pub fn vertex_threshold(&self) -> u32 {
        self.vertex_threshold
    }

    /// Reduces `mesh` to roughly `ratio` of its triangles.
    ///
    /// Returns the mesh unchanged when it is at or below the vertex threshold, was already
    /// decimated, or `ratio` would not reduce anything.
    #[must_use]
    pub fn decimate(&self, mesh: MeshAsset, ratio: f32) -> (MeshAsset, DecimationOutcome) {
        if mesh.vertex_count() <= self.vertex_threshold as usize {
            let skipped = DecimationSkipped::BelowThreshold {
                vertex_count: mesh.vertex_count(),
            };
            return (mesh, DecimationOutcome::Skipped(skipped));
        }
        if mesh.is_decimated() {
            log::warn!("Mesh '{}' was already decimated; skipping", mesh.name());
            return (mesh, DecimationOutcome::Skipped(DecimationSkipped::AlreadyDecimated));
        }
        if !(ratio > 0.0 && ratio < 1.0) {
            return (
                mesh,
                DecimationOutcome::Skipped(DecimationSkipped::RatioOutOfRange { ratio }),
            );
        }

        let triangles_before = mesh.triangle_count();
        let kept_triangles = retained_triangles(triangles_before, ratio);
        let reduced = compact(&mesh, &kept_triangles);
        let triangles_after = reduced.triangle_count();

        log::debug!(
            "Decimated '{}': {} -> {} triangles, {} -> {} vertices",
            mesh.name(),
            triangles_before,
            triangles_after,
            mesh.vertex_count(),
            reduced.vertex_count(),
        );

        (
            reduced,
            DecimationOutcome::Reduced {
                triangles_before,
                triangles_after,
            },
        )
    }
}

/// Indices of the triangles kept for a given ratio, in ascending order.
fn retained_triangles(total: usize, ratio: f32) -> Vec<usize> {
    if total == 0 {
        return Vec::new();
    }
    let target = ((total as f64 * f64::from(ratio)).round() as usize).clamp(1, total);
    let stride = total as f64 / target as f64;

    (0..target)
        .map(|k| ((k as f64 * stride).floor() as usize).min(total - 1))
        .collect()
}

/// Builds a mesh from the kept triangles, dropping vertices no longer referenced.
fn compact(mesh: &MeshAsset, kept_triangles: &[usize]) -> MeshAsset {
    let source_indices = mesh.indices();
    let source_positions = mesh.positions();
    let source_uvs = mesh.uvs();

    let mut remap = vec![u32::MAX; source_positions.len()];
    let mut positions: Vec<Vec3> = Vec::new();
    let mut uvs: Option<Vec<Vec2>> = source_uvs.map(|_| Vec::new());
    let mut indices = Vec::with_capacity(kept_triangles.len() * 3);

    for &tri in kept_triangles {
        for &old in &source_indices[tri * 3..tri * 3 + 3] {
            let slot = &mut remap[old as usize];
            if *slot == u32::MAX {
                *slot = positions.len() as u32;
                positions.push(source_positions[old as usize]);
                if let (Some(dst), Some(src)) = (uvs.as_mut(), source_uvs) {
                    dst.push(src[old as usize]);
                }
            }
            indices.push(*slot);
        }
    }

    MeshAsset::rebuilt(mesh, positions, uvs, indices)
}

#[cfg(test)]
mod tests {
    use super::retained_triangles;

    #[test]
    fn retained_count_follows_ratio() {
        assert_eq!(retained_triangles(1000, 0.3).len(), 300);
        assert_eq!(retained_triangles(10, 0.01).len(), 1);
        assert!(retained_triangles(0, 0.5).is_empty());
    }

    #[test]
    fn retained_indices_are_strictly_increasing() {
        let kept = retained_triangles(997, 0.37);
        assert!(kept.windows(2).all(|w| w[0] < w[1]));
        assert!(*kept.last().unwrap() < 997);
    }
}
