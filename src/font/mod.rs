//! Font objects: owned byte blobs and the faces opened from them.
//!
//! A `Font` is a container of one or more faces loaded from in-memory font
//! data. Each face keeps its own copy of the bytes it was opened from, so
//! a face loaded later from a different blob never invalidates an earlier
//! one.

mod face;
pub mod style;

pub use face::FontFace;

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;

/// Engine-assigned font identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontId(pub u32);

/// Whether a font currently has loaded face data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    NotReady,
    Loaded,
}

/// Owning container of faces loaded from caller-supplied font bytes.
pub struct Font {
    id: FontId,
    state: LoadState,
    faces: HashMap<u32, FontFace>,
}

impl Font {
    pub(crate) fn new(id: FontId) -> Self {
        Self {
            id,
            state: LoadState::default(),
            faces: HashMap::new(),
        }
    }

    pub fn id(&self) -> FontId {
        self.id
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.state == LoadState::Loaded
    }

    /// Open face `face_index` from `bytes` at `point_size` and store it.
    ///
    /// The bytes are copied into an allocation owned by the face; the
    /// caller may free its buffer immediately. A parse failure propagates
    /// and leaves the font's state untouched.
    pub fn load_face(&mut self, bytes: &[u8], face_index: u32, point_size: f32) -> Result<&FontFace> {
        let data = Arc::new(bytes.to_vec());
        let face = FontFace::open(data, face_index, point_size)?;
        self.faces.insert(face_index, face);
        self.state = LoadState::Loaded;
        Ok(self.faces.get(&face_index).expect("face just inserted"))
    }

    /// Drop all faces (and with them every style and atlas).
    pub fn unload(&mut self) {
        self.faces.clear();
        self.state = LoadState::NotReady;
    }

    pub fn face(&self, index: u32) -> Option<&FontFace> {
        self.faces.get(&index)
    }

    pub(crate) fn face_mut(&mut self, index: u32) -> Option<&mut FontFace> {
        self.faces.get_mut(&index)
    }

    pub fn faces(&self) -> impl Iterator<Item = &FontFace> {
        self.faces.values()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }
}

impl std::fmt::Debug for Font {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Font")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("faces", &self.faces.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_font_is_not_ready() {
        let font = Font::new(FontId(0));
        assert_eq!(font.state(), LoadState::NotReady);
        assert!(!font.is_loaded());
        assert_eq!(font.face_count(), 0);
    }

    #[test]
    fn garbage_bytes_fail_and_leave_state() {
        let mut font = Font::new(FontId(0));
        let result = font.load_face(b"definitely not a font", 0, 16.0);
        assert!(result.is_err());
        assert_eq!(font.state(), LoadState::NotReady);
        assert_eq!(font.face_count(), 0);
    }

    #[test]
    fn unload_resets_state() {
        let mut font = Font::new(FontId(3));
        font.unload();
        assert_eq!(font.state(), LoadState::NotReady);
        assert_eq!(font.face_count(), 0);
    }
}
