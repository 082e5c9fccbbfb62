//! Text objects: a shaped string bound to a face and style, and the
//! vertex/index mesh generated from it.
//!
//! A `Text` holds non-owning handles to its font, face, and style; the
//! manager resolves them during [`crate::Manager::update_text`]. Mutations
//! only raise a dirty flag; nothing is shaped or rasterized until the
//! next update.

use rustybuzz::{Feature, UnicodeBuffer};

use crate::font::FontId;
use crate::font::style::StyleKey;
use crate::shaper::{FeatureFlags, ShapeSettings};

/// Pen moves smaller than this (per axis) do not mark the text dirty.
pub const PEN_EPSILON: f32 = 0.01;

/// One mesh vertex: position, atlas UV, color. Packed to 36 bytes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
    pub texcoord: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    /// Byte size of one serialized vertex.
    pub const STRIDE: usize = (3 + 2 + 4) * 4;

    /// Append the packed little-endian bytes of this vertex.
    pub fn write(&self, out: &mut Vec<u8>) {
        for v in self.position {
            out.extend_from_slice(&v.to_le_bytes());
        }
        for v in self.texcoord {
            out.extend_from_slice(&v.to_le_bytes());
        }
        for v in self.color {
            out.extend_from_slice(&v.to_le_bytes());
        }
    }
}

/// Generated glyph quads: four vertices and six indices per glyph.
#[derive(Debug, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    dirty: bool,
}

impl Mesh {
    /// Whether the mesh changed since the host last uploaded it.
    pub fn dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Serialize vertices for buffer upload, 36 bytes each.
    pub fn vertex_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.vertices.len() * Vertex::STRIDE);
        for vertex in &self.vertices {
            vertex.write(&mut out);
        }
        out
    }

    /// Serialize indices for buffer upload, 4 bytes each.
    pub fn index_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.indices.len() * 4);
        for index in &self.indices {
            out.extend_from_slice(&index.to_le_bytes());
        }
        out
    }
}

/// A string bound to a (font, face, style) triple, laid out into a mesh.
pub struct Text {
    id: u32,
    font: FontId,
    face: u32,
    style: StyleKey,
    pen: [f32; 3],
    pub(crate) text: String,
    pub(crate) features: Vec<Feature>,
    pub(crate) settings: ShapeSettings,
    /// Recycled between shaping calls.
    pub(crate) buffer: Option<UnicodeBuffer>,
    pub(crate) mesh: Mesh,
    pub(crate) dirty: bool,
}

impl Text {
    pub(crate) fn new(
        id: u32,
        font: FontId,
        face: u32,
        style: StyleKey,
        features: FeatureFlags,
    ) -> Self {
        Self {
            id,
            font,
            face,
            style,
            pen: [0.0; 3],
            text: String::new(),
            features: features.to_features(),
            settings: ShapeSettings::default(),
            buffer: None,
            mesh: Mesh::default(),
            dirty: false,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn font(&self) -> FontId {
        self.font
    }

    pub fn face_index(&self) -> u32 {
        self.face
    }

    pub fn style(&self) -> StyleKey {
        self.style
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the string; no-op when unchanged.
    pub fn set_text(&mut self, text: &str) {
        if self.text != text {
            self.text.clear();
            self.text.push_str(text);
            self.dirty = true;
        }
    }

    /// Drop the stored string (the mesh empties on the next update).
    pub fn clear_text(&mut self) {
        if !self.text.is_empty() {
            self.text.clear();
            self.dirty = true;
        }
    }

    pub fn pen(&self) -> [f32; 3] {
        self.pen
    }

    /// Move the pen origin. Sub-epsilon moves on every axis are ignored.
    pub fn set_pen(&mut self, pen: [f32; 3]) {
        let moved = pen
            .iter()
            .zip(&self.pen)
            .any(|(a, b)| (a - b).abs() >= PEN_EPSILON);
        if moved {
            self.pen = pen;
            self.dirty = true;
        }
    }

    /// Whether the next update will regenerate the mesh.
    pub fn dirty(&self) -> bool {
        self.dirty
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn mesh_mut(&mut self) -> &mut Mesh {
        &mut self.mesh
    }
}

impl std::fmt::Debug for Text {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Text")
            .field("id", &self.id)
            .field("font", &self.font)
            .field("face", &self.face)
            .field("style", &self.style)
            .field("text", &self.text)
            .field("dirty", &self.dirty)
            .finish()
    }
}
