//! Engine facade: fonts, texts, and the layout pass.
//!
//! The manager owns every font and text object plus the shared rasterizer,
//! and is the single mutation point of the engine. Hosts observe atlas
//! lifetimes through the [`Host`] trait and poll dirty flags to decide what
//! to re-upload; the engine never talks to a GPU itself.

use std::collections::HashMap;

use swash::FontRef;

use crate::atlas::TextureAtlas;
use crate::error::{Error, Result};
use crate::font::style::StyleKey;
use crate::font::{Font, FontFace, FontId};
use crate::raster::{Rasterizer, RenderMode};
use crate::shaper::{self, FeatureFlags};
use crate::text::{Text, Vertex};

/// ABI revision of the engine surface. Bumped on breaking changes.
pub const ABI_VERSION: u32 = 1;

/// Engine version as reported to the host.
pub fn version_string() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Host-side callbacks for atlas texture lifetimes.
///
/// `font_texture_created` fires once per style, right after its atlas is
/// allocated and seeded. `font_texture_destroyed` fires before the atlas is
/// dropped, during [`Manager::unload_font`] or [`Manager::shutdown`]. The
/// host typically mirrors these with GPU texture create/destroy calls.
pub trait Host {
    fn font_texture_created(&self, font: FontId, style: StyleKey, atlas: &TextureAtlas);
    fn font_texture_destroyed(&self, font: FontId, style: StyleKey, atlas: &TextureAtlas);
}

/// Validate the requested ABI revision and construct the engine.
pub fn initialize(abi_version: u32, host: Box<dyn Host>) -> Result<Manager> {
    if abi_version != ABI_VERSION {
        return Err(Error::AbiMismatch {
            engine: ABI_VERSION,
            requested: abi_version,
        });
    }
    log::debug!("engine {} initialized", version_string());
    Ok(Manager::new(host))
}

/// Owner of all engine state.
pub struct Manager {
    host: Box<dyn Host>,
    raster: Rasterizer,
    fonts: HashMap<FontId, Font>,
    texts: HashMap<u32, Text>,
    next_font: u32,
    next_text: u32,
}

impl Manager {
    fn new(host: Box<dyn Host>) -> Self {
        Self {
            host,
            raster: Rasterizer::new(),
            fonts: HashMap::new(),
            texts: HashMap::new(),
            next_font: 0,
            next_text: 0,
        }
    }

    /// Register a new, empty font and return its id.
    pub fn create_font(&mut self) -> FontId {
        let id = FontId(self.next_font);
        self.next_font += 1;
        self.fonts.insert(id, Font::new(id));
        id
    }

    pub fn font(&self, id: FontId) -> Option<&Font> {
        self.fonts.get(&id)
    }

    pub fn font_mut(&mut self, id: FontId) -> Option<&mut Font> {
        self.fonts.get_mut(&id)
    }

    pub fn fonts(&self) -> impl Iterator<Item = &Font> {
        self.fonts.values()
    }

    /// Open a face from caller-supplied bytes and attach it to a font.
    pub fn load_face(
        &mut self,
        font: FontId,
        bytes: &[u8],
        face_index: u32,
        point_size: f32,
    ) -> Result<()> {
        let entry = self.fonts.get_mut(&font).ok_or(Error::FontMissing(font))?;
        entry.load_face(bytes, face_index, point_size)?;
        Ok(())
    }

    /// Load a style on a face, creating its atlas on first request.
    ///
    /// Identical (mode, thickness) requests dedup to the same key and only
    /// the first one notifies the host of the new texture.
    pub fn load_style(
        &mut self,
        font: FontId,
        face_index: u32,
        mode: RenderMode,
        thickness: f32,
    ) -> Result<StyleKey> {
        let entry = self.fonts.get_mut(&font).ok_or(Error::FontMissing(font))?;
        let face = entry
            .face_mut(face_index)
            .ok_or(Error::FaceMissing(face_index))?;

        let key = face.style_key(mode, thickness);
        let fresh = face.style(key).is_none();
        let key = face.load_style(mode, thickness)?;

        if fresh {
            let style = face.style(key).ok_or(Error::StyleMissing(key))?;
            self.host.font_texture_created(font, key, style.texture());
        }
        Ok(key)
    }

    /// Drop a font's faces, styles, and atlases, notifying the host of each
    /// texture before it goes away. The id stays valid for reloading.
    pub fn unload_font(&mut self, font: FontId) -> Result<()> {
        let entry = self.fonts.get_mut(&font).ok_or(Error::FontMissing(font))?;
        for face in entry.faces() {
            for style in face.styles() {
                self.host
                    .font_texture_destroyed(font, style.key(), style.texture());
            }
        }
        entry.unload();
        Ok(())
    }

    /// Create a text object bound to an already loaded style.
    pub fn create_text(
        &mut self,
        font: FontId,
        face_index: u32,
        style: StyleKey,
        features: FeatureFlags,
    ) -> Result<u32> {
        let entry = self.fonts.get(&font).ok_or(Error::FontMissing(font))?;
        let face = entry
            .face(face_index)
            .ok_or(Error::FaceMissing(face_index))?;
        if face.style(style).is_none() {
            return Err(Error::StyleMissing(style));
        }

        let id = self.next_text;
        self.next_text += 1;
        self.texts
            .insert(id, Text::new(id, font, face_index, style, features));
        Ok(id)
    }

    pub fn text(&self, id: u32) -> Option<&Text> {
        self.texts.get(&id)
    }

    pub fn text_mut(&mut self, id: u32) -> Option<&mut Text> {
        self.texts.get_mut(&id)
    }

    pub fn destroy_text(&mut self, id: u32) {
        self.texts.remove(&id);
    }

    /// Regenerate a text's mesh if it is dirty.
    ///
    /// Shapes the whole string, rasterizes any uncached glyphs into the
    /// style's atlas, and emits one quad per non-control glyph. Glyphs
    /// without pixels (spaces) produce degenerate quads, so vertex and
    /// index counts track the shaped glyph count. A text whose font has no
    /// loaded data is skipped without error; it lays out once the data
    /// arrives.
    pub fn update_text(&mut self, id: u32) -> Result<()> {
        let Self {
            raster,
            fonts,
            texts,
            ..
        } = self;

        let text = texts.get_mut(&id).ok_or(Error::TextMissing(id))?;
        if !text.dirty {
            return Ok(());
        }

        let font_id = text.font();
        let entry = fonts.get_mut(&font_id).ok_or(Error::FontMissing(font_id))?;
        if !entry.is_loaded() {
            log::debug!("text {id} deferred: font {font_id:?} has no data");
            return Ok(());
        }

        let face_index = text.face_index();
        let face = entry
            .face_mut(face_index)
            .ok_or(Error::FaceMissing(face_index))?;

        // Keep the face bytes alive independently of the style borrow.
        let data = face.data_arc();
        let point_size = face.point_size();
        let ascender = face.ascender();
        let descender = face.descender();

        let style_key = text.style();
        let style = face
            .style_mut(style_key)
            .ok_or(Error::StyleMissing(style_key))?;

        // Both views parsed successfully when the face was opened.
        let font_ref = FontRef::from_index(&data, face_index as usize)
            .ok_or_else(|| Error::Rasterizer(format!("face {face_index} vanished from data")))?;
        let shaper_face = rustybuzz::Face::from_slice(&data, face_index)
            .ok_or_else(|| Error::Rasterizer(format!("face {face_index} rejected by the shaper")))?;

        let taken = text.buffer.take();
        let (shaped, buffer) = shaper::shape_text(
            &shaper_face,
            &text.text,
            &text.settings,
            &text.features,
            taken,
            point_size,
        );
        text.buffer = Some(buffer);

        text.mesh.vertices.clear();
        text.mesh.indices.clear();

        let pen = text.pen();
        // The first baseline sits one "ascender + descender" below the pen,
        // so the top of the first line touches the pen's y.
        let mut cursor = [pen[0], pen[1] + ascender + descender];
        let white = [1.0, 1.0, 1.0, 1.0];

        for g in &shaped {
            // The shaper maps control characters to glyph 0; the cluster is
            // the byte offset of the source character.
            let control = g.glyph_id == 0
                && text
                    .text
                    .get(g.cluster as usize..)
                    .and_then(|s| s.chars().next())
                    .is_some_and(char::is_control);
            if control {
                cursor[0] = pen[0];
                cursor[1] += ascender - descender;
                continue;
            }

            let Some(glyph) = style.get_glyph(raster, font_ref, g.glyph_id)? else {
                log::warn!("glyph {} missing after load, skipped", g.glyph_id);
                continue;
            };

            // Zero-extent glyphs collapse to a degenerate quad here; the
            // cached UVs still address a valid texel.
            let x0 = cursor[0] + g.x_offset + glyph.bearing.0 as f32;
            // Snap the quad top to the pixel grid; unsnapped tops smear
            // single-channel glyphs across two texel rows.
            let y0 = (cursor[1] - g.y_offset - glyph.bearing.1 as f32).floor();
            let x1 = x0 + glyph.width as f32;
            let y1 = y0 + glyph.height as f32;
            let [[u0, v0], [u1, v1]] = glyph.coords;
            let z = pen[2];

            let base = text.mesh.vertices.len() as u32;
            for (position, texcoord) in [
                ([x0, y0, z], [u0, v0]),
                ([x0, y1, z], [u0, v1]),
                ([x1, y1, z], [u1, v1]),
                ([x1, y0, z], [u1, v0]),
            ] {
                text.mesh.vertices.push(Vertex {
                    position,
                    texcoord,
                    color: white,
                });
            }
            text.mesh
                .indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);

            cursor[0] += g.x_advance;
            cursor[1] += g.y_advance;
        }

        text.mesh.mark_dirty();
        text.dirty = false;

        log::debug!(
            "text {id} regenerated: {} glyphs, {} quads",
            shaped.len(),
            text.mesh.indices.len() / 6
        );
        Ok(())
    }

    /// Run [`Self::update_text`] over every text object.
    pub fn update_all(&mut self) -> Result<()> {
        let ids: Vec<u32> = self.texts.keys().copied().collect();
        for id in ids {
            self.update_text(id)?;
        }
        Ok(())
    }

    /// Resolve a style's atlas for texture upload.
    pub fn style_texture(
        &self,
        font: FontId,
        face_index: u32,
        style: StyleKey,
    ) -> Result<&TextureAtlas> {
        let face = self.face(font, face_index)?;
        let style = face.style(style).ok_or(Error::StyleMissing(style))?;
        Ok(style.texture())
    }

    /// Clear a style's atlas dirty flag after the host uploaded it.
    pub fn mark_style_clean(
        &mut self,
        font: FontId,
        face_index: u32,
        style: StyleKey,
    ) -> Result<()> {
        let entry = self.fonts.get_mut(&font).ok_or(Error::FontMissing(font))?;
        let face = entry
            .face_mut(face_index)
            .ok_or(Error::FaceMissing(face_index))?;
        let style = face.style_mut(style).ok_or(Error::StyleMissing(style))?;
        style.mark_clean();
        Ok(())
    }

    fn face(&self, font: FontId, face_index: u32) -> Result<&FontFace> {
        self.fonts
            .get(&font)
            .ok_or(Error::FontMissing(font))?
            .face(face_index)
            .ok_or(Error::FaceMissing(face_index))
    }

    /// Tear the engine down, notifying the host of every live atlas.
    pub fn shutdown(self) {
        for font in self.fonts.values() {
            for face in font.faces() {
                for style in face.styles() {
                    self.host
                        .font_texture_destroyed(font.id(), style.key(), style.texture());
                }
            }
        }
        log::debug!("engine shut down");
    }
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("fonts", &self.fonts.len())
            .field("texts", &self.texts.len())
            .finish()
    }
}
