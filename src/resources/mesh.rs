use glam::{Affine3A, Vec2, Vec3};
use uuid::Uuid;

use super::geometry::{BoundingBox, BoundingSphere};
use crate::errors::{AtriumError, Result};

/// A decoded triangle-list mesh.
///
/// Produced by the asset decoder and modified only during the degradation pass. Normals
/// and bounds are always kept in sync with the positions and indices.
#[derive(Debug, Clone)]
pub struct MeshAsset {
    pub uuid: Uuid,
    name: String,
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    uvs: Option<Vec<Vec2>>,
    indices: Vec<u32>,
    bounding_box: BoundingBox,
    bounding_sphere: BoundingSphere,
    decimated: bool,
}

impl MeshAsset {
    /// Validates the buffers and derives normals and bounds.
    pub fn new(name: impl Into<String>, positions: Vec<Vec3>, indices: Vec<u32>) -> Result<Self> {
        let name = name.into();
        validate_indices(&name, positions.len(), &indices)?;

        let mut mesh = Self {
            uuid: Uuid::new_v4(),
            name,
            normals: Vec::new(),
            positions,
            uvs: None,
            indices,
            bounding_box: BoundingBox::EMPTY,
            bounding_sphere: BoundingSphere::default(),
            decimated: false,
        };
        mesh.compute_vertex_normals();
        mesh.compute_bounding_volume();
        Ok(mesh)
    }

    /// Attaches texture coordinates; one per vertex.
    pub fn with_uvs(mut self, uvs: Vec<Vec2>) -> Result<Self> {
        if uvs.len() != self.positions.len() {
            return Err(AtriumError::InvalidMesh {
                name: self.name.clone(),
                reason: format!(
                    "{} texture coordinates for {} vertices",
                    uvs.len(),
                    self.positions.len()
                ),
            });
        }
        self.uvs = Some(uvs);
        Ok(self)
    }

    /// Rebuilds a mesh from reduced buffers. Used by the decimator only.
    pub(crate) fn rebuilt(
        source: &MeshAsset,
        positions: Vec<Vec3>,
        uvs: Option<Vec<Vec2>>,
        indices: Vec<u32>,
    ) -> Self {
        let mut mesh = Self {
            uuid: source.uuid,
            name: source.name.clone(),
            normals: Vec::new(),
            positions,
            uvs,
            indices,
            bounding_box: BoundingBox::EMPTY,
            bounding_sphere: BoundingSphere::default(),
            decimated: true,
        };
        mesh.compute_vertex_normals();
        mesh.compute_bounding_volume();
        mesh
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    #[inline]
    #[must_use]
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    #[inline]
    #[must_use]
    pub fn uvs(&self) -> Option<&[Vec2]> {
        self.uvs.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }

    #[inline]
    #[must_use]
    pub fn bounding_sphere(&self) -> BoundingSphere {
        self.bounding_sphere
    }

    /// World-space box for an instance placed at `transform`.
    #[must_use]
    pub fn world_bounds(&self, transform: &Affine3A) -> BoundingBox {
        self.bounding_box.transform(transform)
    }

    /// Set once the decimator has reduced this mesh. A decimated mesh is never reduced again.
    #[inline]
    #[must_use]
    pub fn is_decimated(&self) -> bool {
        self.decimated
    }

    /// Area-weighted vertex normals.
    ///
    /// The cross product of two triangle edges has a length of twice the triangle area,
    /// so summing unnormalized face normals weights large faces more.
    pub fn compute_vertex_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];

        for tri in self.indices.chunks_exact(3) {
            let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
            let v0 = self.positions[i0];
            let face_normal = (self.positions[i1] - v0).cross(self.positions[i2] - v0);

            normals[i0] += face_normal;
            normals[i1] += face_normal;
            normals[i2] += face_normal;
        }

        for n in &mut normals {
            *n = n.normalize_or_zero();
        }

        self.normals = normals;
    }

    /// Recomputes the box and a sphere centred on the box.
    pub fn compute_bounding_volume(&mut self) {
        self.bounding_box = BoundingBox::from_points(self.positions.iter().copied());
        if self.bounding_box.is_empty() {
            self.bounding_sphere = BoundingSphere::default();
            return;
        }

        let center = self.bounding_box.center();
        let max_dist_sq = self
            .positions
            .iter()
            .map(|p| p.distance_squared(center))
            .fold(0.0_f32, f32::max);

        self.bounding_sphere = BoundingSphere {
            center,
            radius: max_dist_sq.sqrt(),
        };
    }
}

fn validate_indices(name: &str, vertex_count: usize, indices: &[u32]) -> Result<()> {
    if indices.len() % 3 != 0 {
        return Err(AtriumError::InvalidMesh {
            name: name.to_string(),
            reason: format!("index count {} is not divisible by 3", indices.len()),
        });
    }
    if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(AtriumError::InvalidMesh {
            name: name.to_string(),
            reason: format!("index {bad} out of range for {vertex_count} vertices"),
        });
    }
    Ok(())
}
