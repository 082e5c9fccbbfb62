//! End-to-end tests against a real system font.
//!
//! These shape and rasterize with whatever scalable font the machine
//! provides. When none of the candidate paths exist the tests skip rather
//! than fail, so CI images without fonts stay green.

use std::cell::Cell;
use std::rc::Rc;

use textmesh::{
    ABI_VERSION, FeatureFlags, FontId, Host, Manager, RenderMode, StyleKey, TextureAtlas,
    initialize,
};

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

fn test_font() -> Option<Vec<u8>> {
    FONT_CANDIDATES
        .iter()
        .find_map(|path| std::fs::read(path).ok())
}

macro_rules! require_font {
    () => {
        match test_font() {
            Some(bytes) => bytes,
            None => {
                eprintln!("skipping: no system font found");
                return;
            }
        }
    };
}

#[derive(Default)]
struct Recorder {
    created: Cell<usize>,
    destroyed: Cell<usize>,
}

struct RecordingHost(Rc<Recorder>);

impl Host for RecordingHost {
    fn font_texture_created(&self, _: FontId, _: StyleKey, atlas: &TextureAtlas) {
        self.0.created.set(self.0.created.get() + 1);
        // The empty glyph is seeded before the host hears about the atlas.
        assert!(atlas.used() > 0);
    }

    fn font_texture_destroyed(&self, _: FontId, _: StyleKey, _: &TextureAtlas) {
        self.0.destroyed.set(self.0.destroyed.get() + 1);
    }
}

fn engine_with_font(bytes: &[u8]) -> (Manager, FontId, StyleKey, Rc<Recorder>) {
    let recorder = Rc::new(Recorder::default());
    let mut engine = initialize(ABI_VERSION, Box::new(RecordingHost(Rc::clone(&recorder))))
        .expect("matching ABI");

    let font = engine.create_font();
    engine.load_face(font, bytes, 0, 16.0).expect("valid font");
    let style = engine
        .load_style(font, 0, RenderMode::Normal, 0.0)
        .expect("atlas fits seed");

    (engine, font, style, recorder)
}

#[test]
fn face_metrics_are_scaled_to_pixels() {
    let bytes = require_font!();
    let (engine, font, _, _) = engine_with_font(&bytes);

    let face = engine.font(font).and_then(|f| f.face(0)).expect("face 0");
    assert_eq!(face.point_size(), 16.0);
    assert!(face.ascender() > 0.0);
    assert!(face.descender() <= 0.0);
    // Line height covers at least the ascender-to-descender span, give or
    // take the per-metric rounding.
    assert!(face.height() >= face.ascender() - face.descender() - 1.0);
}

#[test]
fn styles_dedup_and_notify_once() {
    let bytes = require_font!();
    let (mut engine, font, style, recorder) = engine_with_font(&bytes);
    assert_eq!(recorder.created.get(), 1);

    let again = engine
        .load_style(font, 0, RenderMode::Normal, 0.0)
        .expect("reload");
    assert_eq!(again, style);
    assert_eq!(recorder.created.get(), 1, "dedup must not re-notify");

    let outlined = engine
        .load_style(font, 0, RenderMode::Outline, 2.0)
        .expect("outline style");
    assert_ne!(outlined, style);
    assert_eq!(recorder.created.get(), 2);

    engine.unload_font(font).expect("known font");
    assert_eq!(recorder.destroyed.get(), 2);
    assert!(engine.font(font).is_some_and(|f| !f.is_loaded()));
}

#[test]
fn two_letter_text_yields_two_quads() {
    let bytes = require_font!();
    let (mut engine, font, style, _) = engine_with_font(&bytes);

    let id = engine
        .create_text(font, 0, style, FeatureFlags::default())
        .expect("style is loaded");
    let text = engine.text_mut(id).expect("just created");
    text.set_text("AV");
    text.set_pen([5.0, 5.0, 0.0]);

    engine.update_text(id).expect("layout succeeds");

    let text = engine.text(id).expect("text lives");
    assert!(!text.dirty());
    let mesh = text.mesh();
    assert!(mesh.dirty());
    assert_eq!(mesh.vertices.len(), 8);
    assert_eq!(mesh.indices.len(), 12);

    // The second quad starts after the first glyph's advance.
    assert!(mesh.vertices[4].position[0] > mesh.vertices[0].position[0]);

    for vertex in &mesh.vertices {
        assert!((0.0..=1.0).contains(&vertex.texcoord[0]));
        assert!((0.0..=1.0).contains(&vertex.texcoord[1]));
        assert_eq!(vertex.color, [1.0, 1.0, 1.0, 1.0]);
    }

    // Quad corners are ordered top-left, bottom-left, bottom-right,
    // top-right in a y-down space.
    let quad = &mesh.vertices[0..4];
    assert!(quad[1].position[1] > quad[0].position[1]);
    assert!(quad[2].position[0] > quad[1].position[0]);

    // The atlas gained real glyphs and wants an upload.
    let atlas = engine
        .style_texture(font, 0, style)
        .expect("style texture");
    assert!(atlas.dirty());
    assert!(atlas.used() > 25);
}

#[test]
fn newline_starts_a_new_line_at_pen_x() {
    let bytes = require_font!();
    let (mut engine, font, style, _) = engine_with_font(&bytes);

    let id = engine
        .create_text(font, 0, style, FeatureFlags::default())
        .expect("style is loaded");
    let text = engine.text_mut(id).expect("just created");
    text.set_text("A\nA");
    text.set_pen([12.0, 0.0, 0.0]);

    engine.update_text(id).expect("layout succeeds");

    let mesh = engine.text(id).expect("text lives").mesh();
    // The newline itself draws nothing.
    assert_eq!(mesh.vertices.len(), 8);

    let first = mesh.vertices[0].position;
    let second = mesh.vertices[4].position;
    assert!(
        second[1] > first[1],
        "second line must sit below the first"
    );
    assert!(
        (second[0] - first[0]).abs() < 0.5,
        "x resets to the pen origin on a line break"
    );
}

#[test]
fn repeated_glyphs_hit_the_cache() {
    let bytes = require_font!();
    let (mut engine, font, style, _) = engine_with_font(&bytes);

    let id = engine
        .create_text(font, 0, style, FeatureFlags::default())
        .expect("style is loaded");
    engine
        .text_mut(id)
        .expect("just created")
        .set_text("AAAA");
    engine.update_text(id).expect("layout succeeds");

    let cached = engine
        .font(font)
        .and_then(|f| f.face(0))
        .and_then(|f| f.style(style))
        .expect("style lives")
        .glyph_count();
    // The empty glyph plus one entry for 'A'.
    assert_eq!(cached, 2);
    assert_eq!(engine.text(id).expect("text lives").mesh().vertices.len(), 16);
}

#[test]
fn whitespace_emits_a_degenerate_quad() {
    let bytes = require_font!();
    let (mut engine, font, style, _) = engine_with_font(&bytes);

    let id = engine
        .create_text(font, 0, style, FeatureFlags::default())
        .expect("style is loaded");
    engine.text_mut(id).expect("just created").set_text("A A");
    engine.update_text(id).expect("layout succeeds");

    // Every non-control glyph emits a quad, the space included, so the
    // host sees 4 vertices and 6 indices per glyph.
    let mesh = engine.text(id).expect("text lives").mesh();
    assert_eq!(mesh.vertices.len(), 12);
    assert_eq!(mesh.indices.len(), 18);

    // The space has no pixels; its quad collapses to a point whose UVs
    // still address a valid atlas texel.
    let space = &mesh.vertices[4..8];
    for vertex in space {
        assert_eq!(vertex.position, space[0].position);
        assert!((0.0..=1.0).contains(&vertex.texcoord[0]));
        assert!((0.0..=1.0).contains(&vertex.texcoord[1]));
    }

    // The second 'A' still sits past the space's advance.
    assert!(mesh.vertices[8].position[0] > mesh.vertices[3].position[0]);

    let cached = engine
        .font(font)
        .and_then(|f| f.face(0))
        .and_then(|f| f.style(style))
        .expect("style lives")
        .glyph_count();
    // Empty glyph, 'A', and the (blank) space glyph.
    assert_eq!(cached, 3);
}

#[test]
fn clean_text_update_is_a_no_op() {
    let bytes = require_font!();
    let (mut engine, font, style, _) = engine_with_font(&bytes);

    let id = engine
        .create_text(font, 0, style, FeatureFlags::default())
        .expect("style is loaded");
    engine.text_mut(id).expect("just created").set_text("hi");
    engine.update_text(id).expect("first layout");

    let count = engine.text(id).expect("text lives").mesh().vertices.len();
    engine.text_mut(id).expect("text lives").mesh_mut().mark_clean();

    engine.update_text(id).expect("second update");
    let text = engine.text(id).expect("text lives");
    assert_eq!(text.mesh().vertices.len(), count);
    assert!(
        !text.mesh().dirty(),
        "a clean text must not regenerate its mesh"
    );

    engine.mark_style_clean(font, 0, style).expect("style lives");
    assert!(!engine.style_texture(font, 0, style).expect("style lives").dirty());
}

#[test]
fn outline_expands_by_the_full_thickness_per_side() {
    let bytes = require_font!();
    let (mut engine, font, filled, _) = engine_with_font(&bytes);
    let outlined = engine
        .load_style(font, 0, RenderMode::Outline, 2.0)
        .expect("outline style");

    let quad_width = |engine: &mut Manager, style: StyleKey| {
        let id = engine
            .create_text(font, 0, style, FeatureFlags::default())
            .expect("style is loaded");
        engine.text_mut(id).expect("just created").set_text("O");
        engine.update_text(id).expect("layout succeeds");
        let mesh = engine.text(id).expect("text lives").mesh();
        assert_eq!(mesh.vertices.len(), 4);
        mesh.vertices[2].position[0] - mesh.vertices[0].position[0]
    };

    let filled_width = quad_width(&mut engine, filled);
    let stroked_width = quad_width(&mut engine, outlined);

    // A 2 px border on each side widens the glyph by about 4 px; anything
    // under 3 means the stroke only straddled the path.
    assert!(
        stroked_width >= filled_width + 3.0,
        "stroked {stroked_width} vs filled {filled_width}"
    );

    let cached = engine
        .font(font)
        .and_then(|f| f.face(0))
        .and_then(|f| f.style(outlined))
        .expect("style lives")
        .glyph_count();
    assert_eq!(cached, 2, "empty glyph plus the stroked 'O'");
}

#[test]
fn shutdown_notifies_every_texture() {
    let bytes = require_font!();
    let (mut engine, font, _, recorder) = engine_with_font(&bytes);
    engine
        .load_style(font, 0, RenderMode::Outline, 1.0)
        .expect("outline style");

    engine.shutdown();
    assert_eq!(recorder.destroyed.get(), 2);
}
