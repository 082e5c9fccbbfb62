//! Text shaping and glyph-atlas engine.
//!
//! The engine turns strings into renderable vertex/index meshes. Fonts are
//! loaded from in-memory bytes, each (face, size, mode, thickness) style
//! owns a shelf-packed texture atlas, and glyphs are rasterized into it
//! lazily on first use. The host uploads atlases and meshes when their
//! dirty flags say so; the engine itself never touches a GPU.
//!
//! Typical flow:
//!
//! ```no_run
//! use textmesh::{initialize, ABI_VERSION, FeatureFlags, RenderMode};
//! # struct NoopHost;
//! # impl textmesh::Host for NoopHost {
//! #     fn font_texture_created(&self, _: textmesh::FontId, _: textmesh::StyleKey, _: &textmesh::TextureAtlas) {}
//! #     fn font_texture_destroyed(&self, _: textmesh::FontId, _: textmesh::StyleKey, _: &textmesh::TextureAtlas) {}
//! # }
//!
//! # fn run(font_bytes: &[u8]) -> textmesh::Result<()> {
//! let mut engine = initialize(ABI_VERSION, Box::new(NoopHost))?;
//! let font = engine.create_font();
//! engine.load_face(font, font_bytes, 0, 16.0)?;
//! let style = engine.load_style(font, 0, RenderMode::Normal, 0.0)?;
//!
//! let text = engine.create_text(font, 0, style, FeatureFlags::default())?;
//! if let Some(t) = engine.text_mut(text) {
//!     t.set_text("hello");
//!     t.set_pen([10.0, 10.0, 0.0]);
//! }
//! engine.update_text(text)?;
//! # Ok(())
//! # }
//! ```

pub mod atlas;
pub mod error;
pub mod font;
pub mod manager;
pub mod raster;
pub mod shaper;
pub mod text;

pub use atlas::{Region, TextureAtlas, TextureFormat};
pub use error::{Error, Result};
pub use font::style::{FontStyle, Glyph, StyleKey};
pub use font::{Font, FontFace, FontId, LoadState};
pub use manager::{ABI_VERSION, Host, Manager, initialize, version_string};
pub use raster::{GlyphBitmap, LoadFlags, Rasterizer, RenderMode};
pub use shaper::{FeatureFlags, ShapeSettings, ShapedGlyph};
pub use text::{Mesh, Text, Vertex};
