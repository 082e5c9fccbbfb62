//! Glyph rasterization via swash.
//!
//! Wraps a `swash::scale::ScaleContext` behind the small surface the glyph
//! cache needs: load a glyph by index at a pixel size, in normal or
//! stroked-outline mode, producing a tightly packed bitmap at the atlas
//! depth. Stroked outlines use round caps and joins. Subpixel (LCD) output
//! is rendered as an RGBA mask and repacked to 3 bytes per pixel.

use bitflags::bitflags;
use swash::FontRef;
use swash::scale::{Render, ScaleContext, Source};
use swash::zeno::{Cap, Format, Join, Stroke, Style};

bitflags! {
    /// Glyph-load switches passed down to the scaler.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LoadFlags: u32 {
        const FORCE_AUTOHINT = 1;
        const NO_HINTING = 1 << 1;
        const NO_AUTOHINT = 1 << 2;
        const TARGET_LCD = 1 << 3;
    }
}

/// How a style renders its glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Filled outline.
    #[default]
    Normal = 0,
    /// Expanded (stroked) outline of the style's thickness.
    Outline = 1,
}

impl RenderMode {
    /// Reverse of the style-key discriminant.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Normal),
            1 => Some(Self::Outline),
            _ => None,
        }
    }
}

/// A rasterized glyph bitmap, tightly packed at the requested depth.
///
/// `width`/`height` are pixel extents; `left`/`top` are the bearing from
/// the pen baseline to the bitmap's top-left corner. Whitespace and other
/// non-drawing glyphs come back as 0x0 with empty data.
#[derive(Debug, Clone)]
pub struct GlyphBitmap {
    pub width: u32,
    pub height: u32,
    pub left: i32,
    pub top: i32,
    pub data: Vec<u8>,
}

/// Rasterizer state shared by every style of every font.
///
/// The scale context caches hinting and outline state between glyphs, so a
/// single instance lives on the manager for the lifetime of the engine.
pub struct Rasterizer {
    context: ScaleContext,
}

impl Rasterizer {
    pub fn new() -> Self {
        Self {
            context: ScaleContext::new(),
        }
    }

    /// Rasterize one glyph.
    ///
    /// `depth` selects the output packing: 1 = alpha coverage, 3 = subpixel
    /// RGB, 4 = subpixel RGBA. `thickness` is the stroke radius in pixels
    /// and is only read in [`RenderMode::Outline`].
    pub fn load_glyph(
        &mut self,
        font: FontRef<'_>,
        size: f32,
        glyph_id: u16,
        mode: RenderMode,
        thickness: f32,
        depth: u8,
        flags: LoadFlags,
    ) -> GlyphBitmap {
        let mut scaler = self
            .context
            .builder(font)
            .size(size)
            .hint(flags.contains(LoadFlags::FORCE_AUTOHINT))
            .build();

        let subpixel = flags.contains(LoadFlags::TARGET_LCD) || depth == 4;
        let mut render = Render::new(&[Source::Outline]);
        render.format(if subpixel { Format::Subpixel } else { Format::Alpha });

        if mode == RenderMode::Outline {
            // The stroke width straddles the path; doubling it expands the
            // border by the full thickness on each side.
            let mut stroke = Stroke::new(2.0 * thickness);
            stroke.cap(Cap::Round).join(Join::Round);
            render.style(Style::Stroke(stroke));
        }

        match render.render(&mut scaler, glyph_id) {
            Some(image) if image.placement.width > 0 && image.placement.height > 0 => {
                let data = if depth == 3 {
                    repack_rgba_to_rgb(&image.data)
                } else {
                    image.data
                };
                GlyphBitmap {
                    width: image.placement.width,
                    height: image.placement.height,
                    left: image.placement.left,
                    top: image.placement.top,
                    data,
                }
            }
            // Whitespace, zero-extent outlines, and unresolvable glyphs all
            // produce an empty bitmap; the cache still records them so the
            // layout can advance past them.
            _ => {
                log::debug!("glyph {glyph_id} rendered empty");
                GlyphBitmap {
                    width: 0,
                    height: 0,
                    left: 0,
                    top: 0,
                    data: Vec::new(),
                }
            }
        }
    }
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop the alpha channel of a subpixel RGBA mask, leaving per-channel
/// coverage at 3 bytes per pixel.
fn repack_rgba_to_rgb(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() / 4 * 3);
    for px in data.chunks_exact(4) {
        out.extend_from_slice(&px[..3]);
    }
    out
}
