//! Text shaping via rustybuzz.
//!
//! Shapes a whole string against one face and converts the shaper's
//! font-unit positions into pixel floats. The `UnicodeBuffer` is recycled
//! between calls: `shape_text` consumes one (or allocates) and hands it
//! back after shaping so repeated layout of the same text object does not
//! reallocate.

use rustybuzz::ttf_parser::Tag;
use rustybuzz::{BufferFlags, Direction, Face, Feature, Language, Script, UnicodeBuffer};

/// OpenType feature toggles applied at text creation.
#[derive(Debug, Clone, Copy)]
pub struct FeatureFlags {
    pub kerning: bool,
    pub ligatures: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            kerning: true,
            ligatures: true,
        }
    }
}

impl FeatureFlags {
    /// Expand to the shaper feature array: `kern`, `liga`, and `clig`
    /// (contextual ligatures follow the ligature toggle).
    pub fn to_features(self) -> Vec<Feature> {
        let on_off = |enabled: bool| u32::from(enabled);
        vec![
            Feature::new(Tag::from_bytes(b"kern"), on_off(self.kerning), ..),
            Feature::new(Tag::from_bytes(b"liga"), on_off(self.ligatures), ..),
            Feature::new(Tag::from_bytes(b"clig"), on_off(self.ligatures), ..),
        ]
    }
}

/// Buffer-level shaping settings fixed at text creation.
#[derive(Debug, Clone)]
pub struct ShapeSettings {
    pub direction: Direction,
    pub script: Script,
    pub language: String,
}

impl Default for ShapeSettings {
    fn default() -> Self {
        Self {
            direction: Direction::LeftToRight,
            script: rustybuzz::script::LATIN,
            language: String::from("en"),
        }
    }
}

/// One shaped glyph: index, source cluster (byte offset into the shaped
/// string), and pixel-space offset/advance.
#[derive(Debug, Clone, Copy)]
pub struct ShapedGlyph {
    pub glyph_id: u32,
    pub cluster: u32,
    pub x_offset: f32,
    pub y_offset: f32,
    pub x_advance: f32,
    pub y_advance: f32,
}

/// Shape `text` against `face` at `size` pixels.
///
/// Returns the shaped glyphs and the cleared buffer for reuse.
pub fn shape_text(
    face: &Face<'_>,
    text: &str,
    settings: &ShapeSettings,
    features: &[Feature],
    buffer: Option<UnicodeBuffer>,
    size: f32,
) -> (Vec<ShapedGlyph>, UnicodeBuffer) {
    let mut buffer = buffer.unwrap_or_else(UnicodeBuffer::new);
    buffer.push_str(text);
    buffer.set_direction(settings.direction);
    buffer.set_script(settings.script);
    if let Ok(language) = settings.language.parse::<Language>() {
        buffer.set_language(language);
    }
    buffer.set_flags(BufferFlags::BEGINNING_OF_TEXT | BufferFlags::END_OF_TEXT);

    let glyph_buffer = rustybuzz::shape(face, features, buffer);

    let upem = face.units_per_em() as f32;
    let scale = size / upem;

    let shaped = glyph_buffer
        .glyph_infos()
        .iter()
        .zip(glyph_buffer.glyph_positions())
        .map(|(info, pos)| ShapedGlyph {
            glyph_id: info.glyph_id,
            cluster: info.cluster,
            x_offset: pos.x_offset as f32 * scale,
            y_offset: pos.y_offset as f32 * scale,
            x_advance: pos.x_advance as f32 * scale,
            y_advance: pos.y_advance as f32 * scale,
        })
        .collect();

    (shaped, glyph_buffer.clear())
}
