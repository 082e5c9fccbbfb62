//! Shelf-packing texture atlas for glyph bitmap storage.
//!
//! Skyline bin packer: the free space above the packed glyphs is tracked as
//! an ordered list of skyline nodes, each covering an `x` range at a given
//! top `y`. Insertions pick the node that keeps the skyline lowest, then
//! shrink or absorb the nodes they shadow. Adjacent nodes at the same
//! height are always coalesced.
//!
//! A 1-pixel guard border around the whole atlas is reserved forever so
//! bilinear sampling at region edges never reads a neighbor glyph.

/// A skyline segment: starts at `x`, top edge at `y`, `width` pixels wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AtlasNode {
    x: i32,
    y: i32,
    width: i32,
}

/// Pixel format of the atlas backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    /// Single-channel 8-bit coverage.
    R8,
    /// 3-channel subpixel coverage.
    Rgb8,
    /// 4-channel color.
    Rgba8,
}

/// A region handed out by [`TextureAtlas::get_region`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// CPU-side texture atlas with skyline shelf packing.
///
/// The host uploads `data()` to the GPU whenever `dirty()` is observed and
/// calls `mark_clean()` after a successful upload.
pub struct TextureAtlas {
    size: (u32, u32),
    depth: u8,
    nodes: Vec<AtlasNode>,
    data: Vec<u8>,
    used: usize,
    dirty: bool,
}

impl TextureAtlas {
    /// Create a zeroed atlas. `depth` must be 1, 3 or 4 bytes per pixel.
    pub fn new(size: (u32, u32), depth: u8) -> Self {
        assert!(depth == 1 || depth == 3 || depth == 4, "unsupported atlas depth {depth}");
        assert!(size.0 >= 3 && size.1 >= 3, "atlas too small for guard border");

        Self {
            size,
            depth,
            nodes: vec![AtlasNode {
                x: 1,
                y: 1,
                width: size.0 as i32 - 2,
            }],
            data: vec![0; size.0 as usize * size.1 as usize * depth as usize],
            used: 0,
            dirty: true,
        }
    }

    pub fn format(&self) -> TextureFormat {
        match self.depth {
            1 => TextureFormat::R8,
            3 => TextureFormat::Rgb8,
            _ => TextureFormat::Rgba8,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.size
    }

    /// Bytes per pixel.
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Raw backing store, `width * height * depth` bytes, row-major.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn bytesize(&self) -> usize {
        self.data.len()
    }

    /// Total area of all regions handed out since the last `clear`.
    pub fn used(&self) -> usize {
        self.used
    }

    pub fn dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Test whether a `width`×`height` region fits with its left edge at
    /// node `index`. Returns the raised top `y` of the placement.
    fn fit(&self, index: usize, width: u32, height: u32) -> Option<i32> {
        let x = self.nodes[index].x;
        let mut y = self.nodes[index].y;

        if x + width as i32 > self.size.0 as i32 - 1 {
            return None;
        }

        let mut width_left = width as i64;
        let mut i = index;
        while width_left > 0 {
            let node = self.nodes.get(i)?;
            if node.y > y {
                y = node.y;
            }
            if y + height as i32 > self.size.1 as i32 - 1 {
                return None;
            }
            width_left -= node.width as i64;
            i += 1;
        }

        Some(y)
    }

    /// Coalesce adjacent nodes that share the same top edge.
    fn merge(&mut self) {
        let mut i = 0;
        while i + 1 < self.nodes.len() {
            if self.nodes[i].y == self.nodes[i + 1].y {
                self.nodes[i].width += self.nodes[i + 1].width;
                self.nodes.remove(i + 1);
            } else {
                i += 1;
            }
        }
    }

    /// Allocate a `width`×`height` region.
    ///
    /// Scans every skyline node, picks the fit that keeps the skyline
    /// lowest (ties broken by narrower node), raises the skyline over the
    /// placed region, and coalesces. Returns `None` when nothing fits;
    /// the atlas is unchanged in that case.
    pub fn get_region(&mut self, width: u32, height: u32) -> Option<Region> {
        // A zero-extent region would insert a zero-width skyline node that
        // merge never coalesces away.
        if width == 0 || height == 0 {
            return None;
        }

        let mut best_index = None;
        let mut best_height = i32::MAX;
        let mut best_width = i32::MAX;
        let mut pos = (0, 0);

        for i in 0..self.nodes.len() {
            let Some(y) = self.fit(i, width, height) else {
                continue;
            };
            let node = self.nodes[i];
            let top = y + height as i32;
            if top < best_height
                || (top == best_height && node.width > 0 && node.width < best_width)
            {
                best_height = top;
                best_width = node.width;
                best_index = Some(i);
                pos = (node.x, y);
            }
        }

        let best_index = best_index?;

        // Raise the skyline: new node on top of the placed region.
        self.nodes.insert(
            best_index,
            AtlasNode {
                x: pos.0,
                y: pos.1 + height as i32,
                width: width as i32,
            },
        );

        // Shrink or absorb the nodes shadowed by the insertion.
        let mut i = best_index + 1;
        while i < self.nodes.len() {
            let prev_end = self.nodes[i - 1].x + self.nodes[i - 1].width;
            if self.nodes[i].x >= prev_end {
                break;
            }
            let shrink = prev_end - self.nodes[i].x;
            self.nodes[i].x += shrink;
            self.nodes[i].width -= shrink;
            if self.nodes[i].width <= 0 {
                self.nodes.remove(i);
            } else {
                break;
            }
        }

        self.merge();
        self.used += width as usize * height as usize;

        Some(Region {
            x: pos.0,
            y: pos.1,
            width,
            height,
        })
    }

    /// Copy `height` rows of `width * depth` bytes from `src` into the
    /// atlas at `(x, y)`.
    ///
    /// `stride` is the source row stride in bytes; a stride of 0 re-reads
    /// the same row (used for solid fills). The region must lie inside the
    /// guard border.
    pub fn set_region(&mut self, x: u32, y: u32, width: u32, height: u32, src: &[u8], stride: usize) {
        assert!(x >= 1 && y >= 1, "region outside guard border");
        assert!(
            x + width <= self.size.0 - 1 && y + height <= self.size.1 - 1,
            "region outside guard border"
        );

        let depth = self.depth as usize;
        let row_bytes = width as usize * depth;
        let atlas_row = self.size.0 as usize * depth;

        for row in 0..height as usize {
            let dst = (y as usize + row) * atlas_row + x as usize * depth;
            let s = row * stride;
            self.data[dst..dst + row_bytes].copy_from_slice(&src[s..s + row_bytes]);
        }

        self.dirty = true;
    }

    /// Drop all regions, zero the bitmap, and restore the initial skyline.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.nodes.push(AtlasNode {
            x: 1,
            y: 1,
            width: self.size.0 as i32 - 2,
        });
        self.data.fill(0);
        self.used = 0;
        self.dirty = true;
    }
}

impl std::fmt::Debug for TextureAtlas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureAtlas")
            .field("size", &self.size)
            .field("depth", &self.depth)
            .field("nodes", &self.nodes.len())
            .field("used", &self.used)
            .field("dirty", &self.dirty)
            .finish()
    }
}
