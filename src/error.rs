//! Error types for the engine.

use thiserror::Error;

use crate::font::FontId;
use crate::font::style::StyleKey;

/// Errors that can occur during font loading, glyph caching, and layout.
///
/// All failures are fail-fast: nothing is retried internally, and state that
/// was already committed (cached glyphs, filled atlas rows) remains valid.
#[derive(Error, Debug)]
pub enum Error {
    /// The host requested an incompatible engine ABI version.
    #[error("ABI version mismatch: engine {engine}, requested {requested}")]
    AbiMismatch { engine: u32, requested: u32 },

    /// An underlying rasterizer or font-parsing call failed.
    #[error("rasterizer failure: {0}")]
    Rasterizer(String),

    /// The texture atlas has no room for a requested region.
    #[error("texture atlas is full")]
    AtlasFull,

    /// A text referenced a style that was never loaded on its face.
    #[error("style {0:?} is not loaded")]
    StyleMissing(StyleKey),

    /// No font exists under the given id.
    #[error("unknown font {0:?}")]
    FontMissing(FontId),

    /// No face exists under the given index within the font.
    #[error("unknown face index {0}")]
    FaceMissing(u32),

    /// No text exists under the given id.
    #[error("unknown text {0}")]
    TextMissing(u32),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
