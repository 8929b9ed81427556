use bitflags::bitflags;
use glam::Vec4;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

bitflags! {
    /// Texture channels present on a material.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct MaterialChannels: u8 {
        const BASE_COLOR_MAP = 1 << 0;
        const NORMAL_MAP     = 1 << 1;
        const ROUGHNESS_MAP  = 1 << 2;
        const METALNESS_MAP  = 1 << 3;
    }
}

impl MaterialChannels {
    /// Channels a constrained tier strips.
    pub const OPTIONAL: Self = Self::NORMAL_MAP
        .union(Self::ROUGHNESS_MAP)
        .union(Self::METALNESS_MAP);
}

/// Reference to a decoded texture owned by the asset cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureRef {
    pub id: Uuid,
    pub width: u32,
    pub height: u32,
}

impl TextureRef {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            width,
            height,
        }
    }

    /// Upload extent with the longest edge clamped to `max_dimension`, aspect preserved.
    #[must_use]
    pub fn extent_within(&self, max_dimension: u32) -> (u32, u32) {
        let longest = self.width.max(self.height);
        if longest <= max_dimension || longest == 0 {
            return (self.width, self.height);
        }
        let scale = f64::from(max_dimension) / f64::from(longest);
        let scaled = |v: u32| ((f64::from(v) * scale).round() as u32).max(1);
        (scaled(self.width), scaled(self.height))
    }
}

/// Material with explicit optional channels.
///
/// Channel presence is the `Option` itself; [`channels`](Self::channels) reports it as
/// flags. Any change that alters the set of channels bumps
/// [`layout_version`](Self::layout_version) and flags the material for pipeline
/// recompilation.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialDescriptor {
    pub uuid: Uuid,
    pub name: String,

    pub base_color: Vec4,
    pub base_color_map: Option<TextureRef>,
    pub normal_map: Option<TextureRef>,
    pub roughness_map: Option<TextureRef>,
    pub metalness_map: Option<TextureRef>,

    /// Scalar used when `roughness_map` is absent.
    pub roughness: f32,
    /// Scalar used when `metalness_map` is absent.
    pub metalness: f32,

    pub anisotropy: u16,
    /// Longest texture edge allowed at upload; `None` uploads at source size.
    pub max_texture_dimension: Option<u32>,

    layout_version: u64,
    needs_recompile: bool,
    downgraded: bool,
}

impl Default for MaterialDescriptor {
    fn default() -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: "Material".to_string(),
            base_color: Vec4::ONE,
            base_color_map: None,
            normal_map: None,
            roughness_map: None,
            metalness_map: None,
            roughness: 1.0,
            metalness: 0.0,
            anisotropy: 16,
            max_texture_dimension: None,
            layout_version: 0,
            needs_recompile: false,
            downgraded: false,
        }
    }
}

impl MaterialDescriptor {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_base_color_map(mut self, texture: TextureRef) -> Self {
        self.base_color_map = Some(texture);
        self
    }

    #[must_use]
    pub fn with_normal_map(mut self, texture: TextureRef) -> Self {
        self.normal_map = Some(texture);
        self
    }

    #[must_use]
    pub fn with_roughness_map(mut self, texture: TextureRef) -> Self {
        self.roughness_map = Some(texture);
        self
    }

    #[must_use]
    pub fn with_metalness_map(mut self, texture: TextureRef) -> Self {
        self.metalness_map = Some(texture);
        self
    }

    #[must_use]
    pub fn with_anisotropy(mut self, anisotropy: u16) -> Self {
        self.anisotropy = anisotropy;
        self
    }

    #[must_use]
    pub fn channels(&self) -> MaterialChannels {
        let mut channels = MaterialChannels::empty();
        channels.set(MaterialChannels::BASE_COLOR_MAP, self.base_color_map.is_some());
        channels.set(MaterialChannels::NORMAL_MAP, self.normal_map.is_some());
        channels.set(MaterialChannels::ROUGHNESS_MAP, self.roughness_map.is_some());
        channels.set(MaterialChannels::METALNESS_MAP, self.metalness_map.is_some());
        channels
    }

    #[inline]
    #[must_use]
    pub fn layout_version(&self) -> u64 {
        self.layout_version
    }

    #[inline]
    #[must_use]
    pub fn needs_recompile(&self) -> bool {
        self.needs_recompile
    }

    /// Called by the pipeline cache once the new shader variant is built.
    pub fn mark_compiled(&mut self) {
        self.needs_recompile = false;
    }

    /// True once a constrained-tier downgrade has been applied. There is no way back.
    #[inline]
    #[must_use]
    pub fn is_downgraded(&self) -> bool {
        self.downgraded
    }

    pub(crate) fn mark_downgraded(&mut self) {
        self.downgraded = true;
    }

    pub(crate) fn invalidate_layout(&mut self) {
        self.layout_version = self.layout_version.wrapping_add(1);
        self.needs_recompile = true;
    }
}
