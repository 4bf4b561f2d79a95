use vello_cpu::kurbo::{Circle, Rect, Shape as _, Stroke};

use crate::brush::{Brush, BrushShape};
use crate::composite::unpremultiply_rgba8_in_place;
use crate::error::SkinpaintResult;
use crate::pointer::{PointerEvent, PointerKind};
use crate::surface::{RasterSurface, surface_extent};
use crate::texture::{encode_png_rgba8, png_data_uri};

const STROKE_WIDTH: f64 = 2.0;
/// Padding around the shape so the stroke is not clipped at the bitmap edge.
const MARGIN: f64 = 2.0;

/// Rasterize a brush into its cursor preview: the brush shape, outlined only,
/// stroke width 2, stroke color = brush color.
pub fn render_cursor_preview(brush: &Brush) -> SkinpaintResult<vello_cpu::Pixmap> {
    brush.validate()?;

    let side = (brush.size + 2.0 * MARGIN).ceil() as u32;
    let (w, h) = surface_extent(side, side)?;

    let mut ctx = vello_cpu::RenderContext::new(w, h);
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
        brush.color.r,
        brush.color.g,
        brush.color.b,
        255,
    ));
    ctx.set_stroke(Stroke::new(STROKE_WIDTH));

    let half = brush.size / 2.0;
    let center = half + MARGIN;
    match brush.shape {
        BrushShape::Circle => {
            let path = Circle::new((center, center), half).to_path(0.1);
            ctx.stroke_path(&path);
        }
        BrushShape::Square => {
            let path = Rect::new(MARGIN, MARGIN, MARGIN + brush.size, MARGIN + brush.size)
                .to_path(0.1);
            ctx.stroke_path(&path);
        }
    }

    ctx.flush();
    let mut pixmap = vello_cpu::Pixmap::new(w, h);
    ctx.render_to_pixmap(&mut pixmap);
    Ok(pixmap)
}

/// Half the brush size on both axes, centering the rendered cursor on the
/// actual pointer position.
pub fn cursor_hotspot(brush: &Brush) -> (f64, f64) {
    (brush.size / 2.0, brush.size / 2.0)
}

/// CSS `cursor` property value: the preview as a PNG data URI plus the
/// hotspot, with the `auto` keyword as fallback for runtimes that reject
/// custom cursor images.
pub fn native_cursor_value(
    pixmap: &vello_cpu::Pixmap,
    hotspot: (f64, f64),
) -> SkinpaintResult<String> {
    let mut rgba = pixmap.data_as_u8_slice().to_vec();
    unpremultiply_rgba8_in_place(&mut rgba);
    let png = encode_png_rgba8(
        u32::from(pixmap.width()),
        u32::from(pixmap.height()),
        &rgba,
    )?;
    Ok(format!(
        "url({}) {} {}, auto",
        png_data_uri(&png),
        hotspot.0,
        hotspot.1
    ))
}

/// Topmost, non-interactive layer: the brush preview following the pointer.
pub struct CursorLayer {
    surface: RasterSurface,
    hotspot: (f64, f64),
    value: String,
    pointer: Option<kurbo::Point>,
}

impl CursorLayer {
    pub fn new(brush: &Brush) -> SkinpaintResult<Self> {
        let preview = render_cursor_preview(brush)?;
        let hotspot = cursor_hotspot(brush);
        let value = native_cursor_value(&preview, hotspot)?;

        let mut surface = RasterSurface::new(
            u32::from(preview.width()),
            u32::from(preview.height()),
        )?;
        surface.install_pixmap(preview);
        surface.set_visible(false);

        Ok(Self {
            surface,
            hotspot,
            value,
            pointer: None,
        })
    }

    /// Clear-and-redraw for the new brush; the previous preview bitmap never
    /// survives a shape, size or color change.
    pub fn set_brush(&mut self, brush: &Brush) -> SkinpaintResult<()> {
        let preview = render_cursor_preview(brush)?;
        self.hotspot = cursor_hotspot(brush);
        self.value = native_cursor_value(&preview, self.hotspot)?;
        self.surface.set_display_size(
            f64::from(preview.width()),
            f64::from(preview.height()),
        );
        self.surface.install_pixmap(preview);
        self.place();
        Ok(())
    }

    pub fn handle_pointer(&mut self, event: &PointerEvent) {
        match event.kind {
            PointerKind::Move | PointerKind::Enter => {
                self.pointer = Some(event.pos);
                self.surface.set_visible(true);
                self.place();
            }
            PointerKind::Leave => {
                self.pointer = None;
                self.surface.set_visible(false);
            }
            PointerKind::Down | PointerKind::Up => {}
        }
    }

    fn place(&mut self) {
        if let Some(p) = self.pointer {
            // Drawn at pointer minus hotspot; surfaces render at -offset.
            self.surface
                .set_offset(self.hotspot.0 - p.x, self.hotspot.1 - p.y);
        }
    }

    pub fn cursor_value(&self) -> &str {
        &self.value
    }

    pub fn hotspot(&self) -> (f64, f64) {
        self.hotspot
    }

    pub fn surface(&self) -> &RasterSurface {
        &self.surface
    }
}

#[cfg(test)]
mod tests {
    use crate::brush::RgbColor;

    use super::*;

    fn alpha_at(pixmap: &vello_cpu::Pixmap, x: usize, y: usize) -> u8 {
        let w = pixmap.width() as usize;
        pixmap.data_as_u8_slice()[(y * w + x) * 4 + 3]
    }

    #[test]
    fn circle_hotspot_is_half_size() {
        let brush = Brush {
            shape: BrushShape::Circle,
            size: 20.0,
            color: RgbColor::new(255, 0, 0),
        };
        assert_eq!(cursor_hotspot(&brush), (10.0, 10.0));
    }

    #[test]
    fn cursor_value_carries_data_uri_hotspot_and_fallback() {
        let brush = Brush::default();
        let preview = render_cursor_preview(&brush).unwrap();
        let value = native_cursor_value(&preview, cursor_hotspot(&brush)).unwrap();
        assert!(value.starts_with("url(data:image/png;base64,"));
        assert!(value.ends_with(") 10 10, auto"));
    }

    #[test]
    fn circle_preview_is_outline_only() {
        let brush = Brush::default(); // circle, size 20
        let preview = render_cursor_preview(&brush).unwrap();
        let c = (20.0 / 2.0 + MARGIN) as usize;
        // Hollow center, stroked rim.
        assert_eq!(alpha_at(&preview, c, c), 0);
        assert!(alpha_at(&preview, c + 10, c) > 0);
    }

    #[test]
    fn square_preview_strokes_the_corners() {
        let brush = Brush {
            shape: BrushShape::Square,
            size: 16.0,
            color: RgbColor::new(0, 255, 0),
        };
        let preview = render_cursor_preview(&brush).unwrap();
        assert!(alpha_at(&preview, MARGIN as usize, MARGIN as usize) > 0);
        let c = (16.0 / 2.0 + MARGIN) as usize;
        assert_eq!(alpha_at(&preview, c, c), 0);
    }

    #[test]
    fn preview_stroke_uses_brush_color() {
        let brush = Brush {
            shape: BrushShape::Circle,
            size: 12.0,
            color: RgbColor::new(0, 0, 255),
        };
        let preview = render_cursor_preview(&brush).unwrap();
        let c = (12.0 / 2.0 + MARGIN) as usize;
        let w = preview.width() as usize;
        let idx = (c * w + c + 6) * 4;
        let px = &preview.data_as_u8_slice()[idx..idx + 4];
        assert!(px[2] > 0, "rim pixel must carry the brush blue");
        assert_eq!(px[0], 0);
    }

    #[test]
    fn set_brush_replaces_the_preview_bitmap() {
        let mut layer = CursorLayer::new(&Brush::default()).unwrap();
        let small = layer.surface().width();

        layer
            .set_brush(&Brush {
                size: 40.0,
                ..Brush::default()
            })
            .unwrap();
        assert!(layer.surface().width() > small);
        assert!(layer.cursor_value().contains(" 20 20, auto"));
    }

    #[test]
    fn pointer_tracking_shows_hides_and_places() {
        let mut layer = CursorLayer::new(&Brush::default()).unwrap();
        assert!(!layer.surface().is_visible());

        layer.handle_pointer(&PointerEvent::new(PointerKind::Move, 50.0, 30.0));
        assert!(layer.surface().is_visible());
        let (ox, oy) = layer.surface().offset();
        assert_eq!((ox, oy), (10.0 - 50.0, 10.0 - 30.0));

        layer.handle_pointer(&PointerEvent::new(PointerKind::Leave, 0.0, 0.0));
        assert!(!layer.surface().is_visible());
    }
}
