//! Style identity and the per-style glyph cache.
//!
//! A style is the combination of face, size, rendering mode, and outline
//! thickness. Each style owns its own texture atlas and lazily rasterizes
//! glyphs into it on first use.

use std::collections::HashMap;

use swash::FontRef;

use crate::atlas::TextureAtlas;
use crate::error::{Error, Result};
use crate::raster::{LoadFlags, Rasterizer, RenderMode};

/// Atlas dimensions given to every new style.
pub const DEFAULT_ATLAS_SIZE: (u32, u32) = (1024, 1024);

/// Engine-default atlas depth (single-channel coverage).
const DEFAULT_ATLAS_DEPTH: u8 = 1;

/// Packed style identity.
///
/// Bit layout: 0..15 face index, 16..47 `round(point_size * 1000)`,
/// 48..55 rendering mode discriminant, 56..63 outline thickness in tenths
/// (0 for normal rendering). Equal keys always resolve to the same
/// [`FontStyle`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StyleKey(u64);

/// Millipoint size stored inside a [`StyleKey`].
pub fn stored_face_size(point_size: f32) -> u32 {
    (point_size * 1000.0).round() as u32
}

impl StyleKey {
    pub fn new(face_index: u32, point_size: f32, mode: RenderMode, thickness: f32) -> Self {
        let tenths = match mode {
            RenderMode::Normal => 0,
            RenderMode::Outline => (thickness * 10.0).round().clamp(0.0, 255.0) as u64,
        };
        Self(
            (face_index as u64 & 0xFFFF)
                | ((stored_face_size(point_size) as u64) << 16)
                | (((mode as u64) & 0xFF) << 48)
                | (tenths << 56),
        )
    }

    pub fn face_index(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }

    /// Size in millipoints.
    pub fn stored_size(self) -> u32 {
        (self.0 >> 16) as u32
    }

    pub fn rendering(self) -> Option<RenderMode> {
        RenderMode::from_u8((self.0 >> 48) as u8)
    }

    pub fn thickness_tenths(self) -> u8 {
        (self.0 >> 56) as u8
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Debug for StyleKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StyleKey")
            .field("face", &self.face_index())
            .field("millisize", &self.stored_size())
            .field("rendering", &self.rendering())
            .field("thickness_tenths", &self.thickness_tenths())
            .finish()
    }
}

/// A cached glyph: pixel extent, bearing from the baseline, and UV corners
/// (top-left, bottom-right) pre-divided by the atlas dimensions.
#[derive(Debug, Clone)]
pub struct Glyph {
    pub index: u32,
    pub width: u32,
    pub height: u32,
    pub bearing: (i32, i32),
    pub coords: [[f32; 2]; 2],
}

/// Glyph cache plus owning atlas for one style.
pub struct FontStyle {
    key: StyleKey,
    rendering: RenderMode,
    thickness: f32,
    size: f32,
    atlas: TextureAtlas,
    glyphs: HashMap<u32, Glyph>,
}

impl FontStyle {
    /// Create a style with a fresh atlas and seed the empty glyph.
    pub(crate) fn new(
        key: StyleKey,
        point_size: f32,
        atlas_size: (u32, u32),
        rendering: RenderMode,
        thickness: f32,
    ) -> Result<Self> {
        let mut style = Self {
            key,
            rendering,
            thickness,
            size: point_size,
            atlas: TextureAtlas::new(atlas_size, DEFAULT_ATLAS_DEPTH),
            glyphs: HashMap::new(),
        };
        style.init_empty_glyph()?;
        Ok(style)
    }

    /// Seed glyph index 0 with a solid-white texel.
    ///
    /// Control characters and non-drawing glyphs resolve to index 0, so UV
    /// fetches against the atlas are always valid. The 4x4 white block sits
    /// inside a 5x5 region and the stored UVs address its 1-pixel interior,
    /// keeping bilinear samples fully white.
    fn init_empty_glyph(&mut self) -> Result<()> {
        let region = self.atlas.get_region(5, 5).ok_or(Error::AtlasFull)?;

        let block = vec![0xFF; 4 * self.atlas.depth() as usize];
        self.atlas.set_region(region.x as u32, region.y as u32, 4, 4, &block, 0);

        let (w, h) = self.atlas.dimensions();
        self.glyphs.insert(
            0,
            Glyph {
                index: 0,
                width: 0,
                height: 0,
                bearing: (0, 0),
                coords: [
                    [(region.x + 2) as f32 / w as f32, (region.y + 2) as f32 / h as f32],
                    [(region.x + 3) as f32 / w as f32, (region.y + 3) as f32 / h as f32],
                ],
            },
        );

        Ok(())
    }

    pub fn key(&self) -> StyleKey {
        self.key
    }

    pub fn rendering(&self) -> RenderMode {
        self.rendering
    }

    pub fn thickness(&self) -> f32 {
        self.thickness
    }

    /// The atlas texture backing this style.
    pub fn texture(&self) -> &TextureAtlas {
        &self.atlas
    }

    pub fn texture_mut(&mut self) -> &mut TextureAtlas {
        &mut self.atlas
    }

    /// Whether the atlas changed since the host last uploaded it.
    pub fn dirty(&self) -> bool {
        self.atlas.dirty()
    }

    pub fn mark_clean(&mut self) {
        self.atlas.mark_clean();
    }

    /// Number of cached glyphs, including the empty glyph.
    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// Look up a cached glyph without triggering rasterization.
    pub fn cached_glyph(&self, index: u32) -> Option<&Glyph> {
        self.glyphs.get(&index)
    }

    /// Fetch a glyph, rasterizing it into the atlas on first use.
    pub(crate) fn get_glyph(
        &mut self,
        raster: &mut Rasterizer,
        font: FontRef<'_>,
        index: u32,
    ) -> Result<Option<&Glyph>> {
        if !self.glyphs.contains_key(&index) {
            self.load_glyph(raster, font, index, true)?;
        }
        Ok(self.glyphs.get(&index))
    }

    /// Rasterize one glyph and pack it into the atlas.
    ///
    /// The allocated region is one pixel wider and taller than the bitmap;
    /// the dead column and row keep bilinear lookups of adjacent glyphs
    /// from bleeding into each other.
    fn load_glyph(
        &mut self,
        raster: &mut Rasterizer,
        font: FontRef<'_>,
        index: u32,
        hinting: bool,
    ) -> Result<()> {
        let mut flags = if hinting {
            LoadFlags::FORCE_AUTOHINT
        } else {
            LoadFlags::NO_HINTING | LoadFlags::NO_AUTOHINT
        };
        if self.atlas.depth() == 3 {
            flags |= LoadFlags::TARGET_LCD;
        }

        let bitmap = raster.load_glyph(
            font,
            self.size,
            index as u16,
            self.rendering,
            self.thickness,
            self.atlas.depth(),
            flags,
        );

        let region = self
            .atlas
            .get_region(bitmap.width + 1, bitmap.height + 1)
            .ok_or(Error::AtlasFull)?;

        if bitmap.width > 0 && bitmap.height > 0 {
            let stride = bitmap.width as usize * self.atlas.depth() as usize;
            self.atlas.set_region(
                region.x as u32,
                region.y as u32,
                bitmap.width,
                bitmap.height,
                &bitmap.data,
                stride,
            );
        }

        let (aw, ah) = self.atlas.dimensions();
        let (aw, ah) = (aw as f32, ah as f32);
        self.glyphs.insert(
            index,
            Glyph {
                index,
                width: bitmap.width,
                height: bitmap.height,
                bearing: (bitmap.left, bitmap.top),
                coords: [
                    [region.x as f32 / aw, region.y as f32 / ah],
                    [
                        (region.x as f32 + bitmap.width as f32) / aw,
                        (region.y as f32 + bitmap.height as f32) / ah,
                    ],
                ],
            },
        );

        log::debug!(
            "cached glyph {index} ({}x{}) in style {:?}",
            bitmap.width,
            bitmap.height,
            self.key
        );

        Ok(())
    }
}

impl std::fmt::Debug for FontStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontStyle")
            .field("key", &self.key)
            .field("glyphs", &self.glyphs.len())
            .field("atlas", &self.atlas)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_key_is_injective_over_components() {
        let a = StyleKey::new(0, 16.0, RenderMode::Normal, 0.0);
        let b = StyleKey::new(0, 16.0, RenderMode::Normal, 0.0);
        assert_eq!(a, b);

        assert_ne!(a, StyleKey::new(1, 16.0, RenderMode::Normal, 0.0));
        assert_ne!(a, StyleKey::new(0, 16.001, RenderMode::Normal, 0.0));
        assert_ne!(a, StyleKey::new(0, 16.0, RenderMode::Outline, 0.0));
        assert_ne!(
            StyleKey::new(0, 16.0, RenderMode::Outline, 1.0),
            StyleKey::new(0, 16.0, RenderMode::Outline, 1.1),
        );
    }

    #[test]
    fn normal_mode_zeroes_thickness() {
        // Thickness is ignored for normal rendering, so these collapse.
        let a = StyleKey::new(0, 12.0, RenderMode::Normal, 0.0);
        let b = StyleKey::new(0, 12.0, RenderMode::Normal, 2.5);
        assert_eq!(a, b);
        assert_eq!(a.thickness_tenths(), 0);
    }

    #[test]
    fn style_key_unpacks_components() {
        let key = StyleKey::new(3, 14.5, RenderMode::Outline, 2.5);
        assert_eq!(key.face_index(), 3);
        assert_eq!(key.stored_size(), 14_500);
        assert_eq!(key.rendering(), Some(RenderMode::Outline));
        assert_eq!(key.thickness_tenths(), 25);
    }

    #[test]
    fn face_index_masks_to_16_bits() {
        let key = StyleKey::new(0x1_0002, 10.0, RenderMode::Normal, 0.0);
        assert_eq!(key.face_index(), 2);
    }

    #[test]
    fn empty_glyph_seed_in_tiny_atlas() {
        let key = StyleKey::new(0, 16.0, RenderMode::Normal, 0.0);
        let style = FontStyle::new(key, 16.0, (32, 32), RenderMode::Normal, 0.0)
            .expect("seed fits in 32x32");

        assert_eq!(style.texture().used(), 25);
        assert!(style.dirty());

        let glyph = style.cached_glyph(0).expect("empty glyph seeded");
        assert_eq!(glyph.index, 0);
        assert_eq!((glyph.width, glyph.height), (0, 0));
        assert_eq!(glyph.coords[0], [3.0 / 32.0, 3.0 / 32.0]);
        assert_eq!(glyph.coords[1], [4.0 / 32.0, 4.0 / 32.0]);

        // The 4x4 block is solid white; the interior texel samples white.
        let data = style.texture().data();
        assert_eq!(data[3 * 32 + 3], 0xFF);
    }

    #[test]
    fn seed_fails_in_hopeless_atlas() {
        let key = StyleKey::new(0, 16.0, RenderMode::Normal, 0.0);
        let result = FontStyle::new(key, 16.0, (4, 4), RenderMode::Normal, 0.0);
        assert!(matches!(result, Err(Error::AtlasFull)));
    }
}
