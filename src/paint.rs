use vello_cpu::kurbo::{Circle, Rect, Shape as _};

use crate::brush::{Brush, BrushShape};
use crate::error::SkinpaintResult;
use crate::pointer::{PointerEvent, PointerKind};
use crate::surface::surface_extent;

/// Contract of the drawable overlay the editor stacks above the texture.
///
/// The orchestrator is the only consumer: it forwards raw pointer events and
/// reacts to the returned changed-flag by funneling one change notification.
/// Implementations own the stroke algorithm; [`FreehandPaint`] is the
/// default.
pub trait PaintSurface {
    fn set_size(&mut self, width: u32, height: u32) -> SkinpaintResult<()>;

    fn set_brush(&mut self, brush: Brush);

    fn brush(&self) -> Brush;

    /// Feed one raw pointer event. Returns whether any pixels changed.
    fn handle_pointer(&mut self, event: &PointerEvent) -> bool;

    /// Remove all painted content.
    fn clear(&mut self);

    /// Readable raster snapshot of the painted overlay (premultiplied RGBA8).
    fn pixmap(&self) -> &vello_cpu::Pixmap;
}

/// Freehand stamping painter: the primary button lays brush stamps along the
/// pointer path, interpolated so fast motion leaves no gaps.
pub struct FreehandPaint {
    pixmap: vello_cpu::Pixmap,
    width: u16,
    height: u16,
    brush: Brush,
    last_stamp: Option<kurbo::Point>,
}

impl FreehandPaint {
    pub fn new(width: u32, height: u32) -> SkinpaintResult<Self> {
        let (w, h) = surface_extent(width, height)?;
        Ok(Self {
            pixmap: vello_cpu::Pixmap::new(w, h),
            width: w,
            height: h,
            brush: Brush::default(),
            last_stamp: None,
        })
    }

    fn stamp_segment(&mut self, to: kurbo::Point) {
        let from = self.last_stamp.unwrap_or(to);
        let step = (self.brush.size * 0.25).max(0.5);
        let n = ((from.distance(to) / step).ceil() as usize).max(1);

        let mut points = Vec::with_capacity(n);
        for i in 1..=n {
            points.push(from.lerp(to, i as f64 / n as f64));
        }
        self.render_stamps(&points);
        self.last_stamp = Some(to);
    }

    fn render_stamps(&mut self, points: &[kurbo::Point]) {
        let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);
        let color = self.brush.color;
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            color.r, color.g, color.b, 255,
        ));

        let half = self.brush.size / 2.0;
        for p in points {
            match self.brush.shape {
                BrushShape::Circle => {
                    let path = Circle::new((p.x, p.y), half).to_path(0.1);
                    ctx.fill_path(&path);
                }
                BrushShape::Square => {
                    ctx.fill_rect(&Rect::new(p.x - half, p.y - half, p.x + half, p.y + half));
                }
            }
        }

        ctx.flush();
        ctx.render_to_pixmap(&mut self.pixmap);
    }
}

impl PaintSurface for FreehandPaint {
    fn set_size(&mut self, width: u32, height: u32) -> SkinpaintResult<()> {
        let (w, h) = surface_extent(width, height)?;
        self.pixmap = vello_cpu::Pixmap::new(w, h);
        self.width = w;
        self.height = h;
        self.last_stamp = None;
        Ok(())
    }

    fn set_brush(&mut self, brush: Brush) {
        self.brush = brush;
    }

    fn brush(&self) -> Brush {
        self.brush
    }

    fn handle_pointer(&mut self, event: &PointerEvent) -> bool {
        match event.kind {
            PointerKind::Down => {
                if !event.primary_down {
                    return false;
                }
                self.last_stamp = Some(event.pos);
                self.stamp_segment(event.pos);
                true
            }
            PointerKind::Move => {
                if !event.primary_down {
                    self.last_stamp = None;
                    return false;
                }
                self.stamp_segment(event.pos);
                true
            }
            PointerKind::Enter => {
                // Resume a stroke dragged back onto the surface.
                if !event.primary_down {
                    return false;
                }
                self.last_stamp = Some(event.pos);
                self.stamp_segment(event.pos);
                true
            }
            PointerKind::Up | PointerKind::Leave => {
                self.last_stamp = None;
                false
            }
        }
    }

    fn clear(&mut self) {
        self.pixmap.data_as_u8_slice_mut().fill(0);
    }

    fn pixmap(&self) -> &vello_cpu::Pixmap {
        &self.pixmap
    }
}
