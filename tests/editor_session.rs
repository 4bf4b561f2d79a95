use std::cell::Cell;
use std::io::Cursor;
use std::rc::Rc;
use std::time::Duration;

use skinpaint::brush::{Brush, BrushShape, RgbColor};
use skinpaint::editor::{TextureEditor, TextureEditorSettings};
use skinpaint::pointer::{PointerEvent, PointerKind};
use skinpaint::texture::{png_data_uri, resolve_texture_uri};

fn temp_dir(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "skinpaint_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn png_bytes(width: u32, height: u32, rgba: &[u8]) -> Vec<u8> {
    let img = image::RgbaImage::from_raw(width, height, rgba.to_vec()).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

/// 2x2 opaque texture with four distinct pixels, as a data URI.
fn quad_texture_uri() -> String {
    let rgba = [
        255, 0, 0, 255, //
        0, 255, 0, 255, //
        0, 0, 255, 255, //
        255, 255, 0, 255,
    ];
    png_data_uri(&png_bytes(2, 2, &rgba))
}

fn editor_with(width: u32, height: u32) -> TextureEditor {
    TextureEditor::new(TextureEditorSettings::new(
        "test-editor",
        width,
        height,
        quad_texture_uri(),
    ))
    .unwrap()
}

#[test]
fn construction_fires_on_load_once() {
    let loaded = Rc::new(Cell::new(0u32));
    let loaded2 = Rc::clone(&loaded);

    let editor = TextureEditor::new(
        TextureEditorSettings::new("test-editor", 4, 4, quad_texture_uri())
            .with_on_load(Box::new(move || loaded2.set(loaded2.get() + 1))),
    )
    .unwrap();

    assert_eq!(loaded.get(), 1);
    assert_eq!((editor.width(), editor.height()), (4, 4));
    assert!(editor.blocks_context_menu());
}

#[test]
fn construction_fails_fast_on_bad_settings() {
    let err = TextureEditor::new(TextureEditorSettings::new("", 4, 4, quad_texture_uri()));
    assert!(err.is_err());
}

#[test]
fn construction_propagates_load_failure_without_on_load() {
    let loaded = Rc::new(Cell::new(0u32));
    let loaded2 = Rc::clone(&loaded);

    let result = TextureEditor::new(
        TextureEditorSettings::new("test-editor", 4, 4, "/definitely/not/here.png")
            .with_on_load(Box::new(move || loaded2.set(loaded2.get() + 1))),
    );
    assert!(result.is_err());
    assert_eq!(loaded.get(), 0);
}

#[test]
fn fresh_export_equals_texture_scaled_to_target() {
    let editor = editor_with(4, 4);
    let exported = resolve_texture_uri(&editor.to_uri().unwrap()).unwrap();
    assert_eq!((exported.width, exported.height), (4, 4));

    // Nearest-neighbor doubling of the 2x2 quad.
    let px = |r: u8, g: u8, b: u8| [r, g, b, 255];
    let rows = [
        [px(255, 0, 0), px(255, 0, 0), px(0, 255, 0), px(0, 255, 0)],
        [px(255, 0, 0), px(255, 0, 0), px(0, 255, 0), px(0, 255, 0)],
        [px(0, 0, 255), px(0, 0, 255), px(255, 255, 0), px(255, 255, 0)],
        [px(0, 0, 255), px(0, 0, 255), px(255, 255, 0), px(255, 255, 0)],
    ];
    let expected: Vec<u8> = rows.iter().flatten().flatten().copied().collect();
    assert_eq!(exported.rgba8_premul.as_slice(), expected.as_slice());
}

#[test]
fn paint_stroke_changes_only_its_region() {
    let mut editor = editor_with(16, 16);
    let before = editor.composite().unwrap();

    editor.set_brush(Brush {
        shape: BrushShape::Circle,
        size: 4.0,
        color: RgbColor::new(0, 0, 0),
    })
    .unwrap();
    let down = PointerEvent::new(PointerKind::Down, 3.0, 3.0).with_primary_down();
    assert!(editor.handle_pointer(&down));

    let after = editor.composite().unwrap();
    assert_ne!(before, after);

    // Outside the stroke's bounding region nothing moved.
    for y in 0..16usize {
        for x in 0..16usize {
            if x > 6 || y > 6 {
                let i = (y * 16 + x) * 4;
                assert_eq!(&before[i..i + 4], &after[i..i + 4], "pixel ({x},{y})");
            }
        }
    }
}

#[test]
fn export_excludes_outline_and_cursor_layers() {
    let mut editor = editor_with(8, 8);
    // Put the cursor somewhere over the surface.
    editor.handle_pointer(&PointerEvent::new(PointerKind::Enter, 4.0, 4.0));
    assert!(editor.outline_visible());

    let with_aids = editor.composite().unwrap();
    editor.toggle_texture_outline();
    let without_aids = editor.composite().unwrap();
    assert_eq!(with_aids, without_aids);
}

#[test]
fn overlapping_loads_resolve_last_issued_wins() {
    let mut editor = editor_with(8, 8);

    let red = png_data_uri(&png_bytes(1, 1, &[255, 0, 0, 255]));
    let blue = png_data_uri(&png_bytes(4, 4, &[0, 0, 255, 255].repeat(16)));

    // A issued first but resolving last must lose to B.
    let ticket_a = editor.begin_texture_load();
    let ticket_b = editor.begin_texture_load();
    let texture_a = resolve_texture_uri(&red).unwrap();
    let texture_b = resolve_texture_uri(&blue).unwrap();

    editor.install_texture(ticket_b, texture_b).unwrap();
    editor.install_texture(ticket_a, texture_a).unwrap();

    let installed = editor.texture().unwrap();
    assert_eq!((installed.width, installed.height), (4, 4));

    // The outline matches B's geometry too: 4x4 source into an 8x8 target
    // scales by 2, and B's outline extent is 6x6.
    assert_eq!(editor.outline_display_size(), (12.0, 12.0));
    assert_eq!(editor.outline_offset(), (2.0, 2.0));
}

#[test]
fn outline_rescales_to_target_dimensions() {
    // 2x2 texture into a 10x6 target: scale (5, 3); outline extent 4x4.
    let editor = editor_with(10, 6);
    assert_eq!(editor.outline_display_size(), (20.0, 12.0));
    assert_eq!(editor.outline_offset(), (5.0, 3.0));
}

#[test]
fn texture_swap_failure_keeps_previous_state() {
    let mut editor = editor_with(4, 4);
    let before = editor.to_uri().unwrap();

    assert!(editor.set_texture_by_uri("/definitely/not/here.png").is_err());
    assert_eq!(editor.texture().unwrap().width, 2);
    assert_eq!(editor.to_uri().unwrap(), before);
}

#[test]
fn set_texture_by_file_round_trips() {
    let dir = temp_dir("by_file");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("skin.png");
    std::fs::write(&path, png_bytes(3, 3, &[9, 9, 9, 255].repeat(9))).unwrap();

    let mut editor = editor_with(6, 6);
    editor.set_texture_by_file(&path).unwrap();
    assert_eq!(editor.texture().unwrap().width, 3);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn rapid_changes_collapse_to_one_notification() {
    let mut editor = editor_with(4, 4);
    let calls = Rc::new(Cell::new(0u32));
    let calls2 = Rc::clone(&calls);
    editor.set_on_change(Box::new(move || calls2.set(calls2.get() + 1)));

    for _ in 0..10 {
        editor.clear_paint();
    }

    // Inside the throttle window nothing has been delivered yet.
    assert!(!editor.pump());
    assert_eq!(calls.get(), 0);

    // After the throttle window plus the grace delay exactly one call lands.
    std::thread::sleep(Duration::from_millis(45));
    editor.pump();
    std::thread::sleep(Duration::from_millis(45));
    editor.pump();
    assert_eq!(calls.get(), 1);
}

#[test]
fn outline_toggle_round_trips_without_notification() {
    let mut editor = editor_with(4, 4);
    let calls = Rc::new(Cell::new(0u32));
    let calls2 = Rc::clone(&calls);
    editor.set_on_change(Box::new(move || calls2.set(calls2.get() + 1)));

    assert!(editor.outline_visible());
    editor.toggle_texture_outline();
    assert!(!editor.outline_visible());
    editor.toggle_texture_outline();
    assert!(editor.outline_visible());

    std::thread::sleep(Duration::from_millis(45));
    editor.pump();
    assert_eq!(calls.get(), 0);
}

#[test]
fn set_brush_updates_paint_and_cursor_together() {
    let mut editor = editor_with(8, 8);
    assert_eq!(editor.cursor_hotspot(), (10.0, 10.0));

    editor
        .set_brush(Brush {
            shape: BrushShape::Square,
            size: 10.0,
            color: RgbColor::new(0, 255, 0),
        })
        .unwrap();

    assert_eq!(editor.paint_surface().brush().size, 10.0);
    assert_eq!(editor.paint_surface().brush().shape, BrushShape::Square);
    assert_eq!(editor.cursor_hotspot(), (5.0, 5.0));
    assert!(editor.cursor_value().contains(" 5 5, auto"));
}

#[test]
fn default_brush_cursor_matches_contract() {
    let editor = editor_with(8, 8);
    // Circle, size 20, #ff0000.
    assert_eq!(editor.brush().size, 20.0);
    assert_eq!(editor.cursor_hotspot(), (10.0, 10.0));
    let value = editor.cursor_value();
    assert!(value.starts_with("url(data:image/png;base64,"));
    assert!(value.ends_with(", auto"));
}

#[test]
fn invalid_brush_is_rejected_atomically() {
    let mut editor = editor_with(8, 8);
    let before = editor.cursor_value().to_string();

    let result = editor.set_brush(Brush {
        size: -1.0,
        ..Brush::default()
    });
    assert!(result.is_err());
    assert_eq!(editor.brush().size, 20.0);
    assert_eq!(editor.cursor_value(), before);
}

#[test]
fn download_writes_a_decodable_png() {
    let dir = temp_dir("download");
    std::fs::create_dir_all(&dir).unwrap();
    let out = dir.join("export.png");

    let editor = editor_with(4, 4);
    let written = editor.download(Some(out.as_path())).unwrap();
    assert_eq!(written, out);

    let decoded = resolve_texture_uri(out.to_str().unwrap()).unwrap();
    assert_eq!((decoded.width, decoded.height), (4, 4));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn preview_includes_outline_but_export_does_not() {
    // Texture with a transparent border so the outline lands inside the
    // target: 4x4 with a 2x2 opaque core.
    let mut rgba = vec![0u8; 4 * 4 * 4];
    for y in 1..3 {
        for x in 1..3 {
            let i = (y * 4 + x) * 4;
            rgba[i..i + 4].copy_from_slice(&[200, 200, 200, 255]);
        }
    }
    let uri = png_data_uri(&png_bytes(4, 4, &rgba));
    let editor = TextureEditor::new(TextureEditorSettings::new("t", 4, 4, uri)).unwrap();

    let preview = editor.render_preview().unwrap();
    let export = editor.composite().unwrap();
    assert_ne!(preview, export, "outline pixels must show up in the preview");
}
