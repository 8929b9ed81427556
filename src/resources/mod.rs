//! Decoded asset data consumed by the adaptive core.
//!
//! - [`MeshAsset`]: triangle-list mesh with normals and bounds
//! - [`MaterialDescriptor`]: material with explicit optional texture channels
//! - [`BoundingBox`] / [`BoundingSphere`]: bounding volumes

pub mod geometry;
pub mod material;
pub mod mesh;

pub use geometry::{BoundingBox, BoundingSphere};
pub use material::{MaterialChannels, MaterialDescriptor, TextureRef};
pub use mesh::MeshAsset;
