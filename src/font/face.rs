//! An opened scalable face at a fixed point size.
//!
//! The face owns its own copy of the font bytes. Rasterizer (`swash`) and
//! shaper (`rustybuzz`) views borrow from those bytes and are created
//! transiently per call, so the face never holds a self-referential parse.

use std::collections::HashMap;
use std::sync::Arc;

use swash::FontRef;

use super::style::{DEFAULT_ATLAS_SIZE, FontStyle, StyleKey};
use crate::error::{Error, Result};
use crate::raster::RenderMode;

/// One typeface inside a font file, opened at a point size.
///
/// The engine runs at a fixed 72 DPI, so point size and pixel size
/// coincide. Metrics are scaled to pixels at construction.
pub struct FontFace {
    index: u32,
    data: Arc<Vec<u8>>,
    point_size: f32,
    ascender: f32,
    descender: f32,
    height: f32,
    styles: HashMap<StyleKey, FontStyle>,
}

impl FontFace {
    /// Open face `index` from the owned byte buffer.
    ///
    /// Both the rasterizer and the shaper parse the face here, so later
    /// per-glyph and per-shape view creation cannot fail.
    pub(crate) fn open(data: Arc<Vec<u8>>, index: u32, point_size: f32) -> Result<Self> {
        let font = FontRef::from_index(&data, index as usize)
            .ok_or_else(|| Error::Rasterizer(format!("face {index} could not be opened")))?;
        rustybuzz::Face::from_slice(&data, index)
            .ok_or_else(|| Error::Rasterizer(format!("face {index} rejected by the shaper")))?;

        let metrics = font.metrics(&[]);
        let scale = point_size / metrics.units_per_em as f32;
        let ascender = (metrics.ascent * scale).round();
        // swash reports descent as a positive distance below the baseline.
        let descender = -(metrics.descent * scale).round();
        let height = ((metrics.ascent + metrics.descent + metrics.leading) * scale).round();

        Ok(Self {
            index,
            data,
            point_size,
            ascender,
            descender,
            height,
            styles: HashMap::new(),
        })
    }

    /// Face index within the font file.
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn point_size(&self) -> f32 {
        self.point_size
    }

    /// Scaled ascender in pixels, non-negative.
    pub fn ascender(&self) -> f32 {
        self.ascender
    }

    /// Scaled descender in pixels, non-positive.
    pub fn descender(&self) -> f32 {
        self.descender
    }

    /// Scaled line height in pixels.
    pub fn height(&self) -> f32 {
        self.height
    }

    pub(crate) fn data_arc(&self) -> Arc<Vec<u8>> {
        Arc::clone(&self.data)
    }

    /// The style key this face assigns to a (mode, thickness) request.
    pub fn style_key(&self, mode: RenderMode, thickness: f32) -> StyleKey {
        StyleKey::new(self.index, self.point_size, mode, thickness)
    }

    /// Load (or return the already loaded) style for a rendering mode and
    /// outline thickness. Identical requests dedup to the same key.
    pub fn load_style(&mut self, mode: RenderMode, thickness: f32) -> Result<StyleKey> {
        let key = self.style_key(mode, thickness);
        if self.styles.contains_key(&key) {
            return Ok(key);
        }

        let style = FontStyle::new(key, self.point_size, DEFAULT_ATLAS_SIZE, mode, thickness)?;
        self.styles.insert(key, style);
        log::debug!("loaded style {key:?} on face {}", self.index);
        Ok(key)
    }

    pub fn style(&self, key: StyleKey) -> Option<&FontStyle> {
        self.styles.get(&key)
    }

    pub(crate) fn style_mut(&mut self, key: StyleKey) -> Option<&mut FontStyle> {
        self.styles.get_mut(&key)
    }

    pub fn styles(&self) -> impl Iterator<Item = &FontStyle> {
        self.styles.values()
    }

    pub fn style_count(&self) -> usize {
        self.styles.len()
    }
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("index", &self.index)
            .field("point_size", &self.point_size)
            .field("ascender", &self.ascender)
            .field("descender", &self.descender)
            .field("styles", &self.styles.len())
            .finish()
    }
}
