use crate::composite::over;
use crate::error::{SkinpaintError, SkinpaintResult};

/// One drawing surface in the editor's stack: an owned pixmap plus the
/// placement it is composited with.
///
/// `display_width`/`display_height` may differ from the pixmap's natural
/// extent (the outline layer is rescaled to the editor's target size), and
/// the placement origin is shifted by minus `offset` (the outline layer uses
/// this to compensate its stroke thickness).
pub struct RasterSurface {
    pixmap: vello_cpu::Pixmap,
    visible: bool,
    display_width: f64,
    display_height: f64,
    offset_x: f64,
    offset_y: f64,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> SkinpaintResult<Self> {
        let (w, h) = surface_extent(width, height)?;
        Ok(Self {
            pixmap: vello_cpu::Pixmap::new(w, h),
            visible: true,
            display_width: f64::from(width),
            display_height: f64::from(height),
            offset_x: 0.0,
            offset_y: 0.0,
        })
    }

    pub fn width(&self) -> u32 {
        u32::from(self.pixmap.width())
    }

    pub fn height(&self) -> u32 {
        u32::from(self.pixmap.height())
    }

    pub fn pixmap(&self) -> &vello_cpu::Pixmap {
        &self.pixmap
    }

    pub fn pixmap_mut(&mut self) -> &mut vello_cpu::Pixmap {
        &mut self.pixmap
    }

    /// Replace the surface content with an already-rendered pixmap. The
    /// display size and offset are left untouched; placement is the
    /// orchestrator's concern.
    pub fn install_pixmap(&mut self, pixmap: vello_cpu::Pixmap) {
        self.pixmap = pixmap;
    }

    /// Replace the surface content with a premultiplied RGBA8 raster. The
    /// display size and offset are left untouched; placement is the
    /// orchestrator's concern.
    pub fn install_premul_bytes(
        &mut self,
        rgba8_premul: &[u8],
        width: u32,
        height: u32,
    ) -> SkinpaintResult<()> {
        self.pixmap = pixmap_from_premul_bytes(rgba8_premul, width, height)?;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.pixmap.data_as_u8_slice_mut().fill(0);
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn toggle_visible(&mut self) {
        self.visible = !self.visible;
    }

    pub fn display_size(&self) -> (f64, f64) {
        (self.display_width, self.display_height)
    }

    pub fn set_display_size(&mut self, width: f64, height: f64) {
        self.display_width = width;
        self.display_height = height;
    }

    pub fn offset(&self) -> (f64, f64) {
        (self.offset_x, self.offset_y)
    }

    pub fn set_offset(&mut self, x: f64, y: f64) {
        self.offset_x = x;
        self.offset_y = y;
    }

    /// Source-over this surface into a premultiplied RGBA8 destination,
    /// honoring visibility, display size and offset. Nearest-neighbor
    /// sampling; surfaces at their natural size degenerate to a straight
    /// per-pixel blend.
    pub fn composite_into(
        &self,
        dst: &mut [u8],
        dst_width: u32,
        dst_height: u32,
    ) -> SkinpaintResult<()> {
        let expected_len = (dst_width as usize)
            .checked_mul(dst_height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| SkinpaintError::render("composite buffer size overflow"))?;
        if dst.len() != expected_len {
            return Err(SkinpaintError::render(
                "composite_into expects dst matching width*height*4",
            ));
        }
        if !self.visible || self.display_width <= 0.0 || self.display_height <= 0.0 {
            return Ok(());
        }

        let src = self.pixmap.data_as_u8_slice();
        let src_w = self.width() as usize;
        let src_h = self.height() as usize;
        if src_w == 0 || src_h == 0 {
            return Ok(());
        }

        let origin_x = -self.offset_x;
        let origin_y = -self.offset_y;

        let x0 = origin_x.floor().max(0.0) as usize;
        let y0 = origin_y.floor().max(0.0) as usize;
        let x1 = ((origin_x + self.display_width).ceil().min(f64::from(dst_width))) as usize;
        let y1 = ((origin_y + self.display_height).ceil().min(f64::from(dst_height))) as usize;

        for dy in y0..y1 {
            for dx in x0..x1 {
                let u = (dx as f64 + 0.5 - origin_x) / self.display_width;
                let v = (dy as f64 + 0.5 - origin_y) / self.display_height;
                if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
                    continue;
                }
                let sx = ((u * src_w as f64) as usize).min(src_w - 1);
                let sy = ((v * src_h as f64) as usize).min(src_h - 1);

                let si = (sy * src_w + sx) * 4;
                let di = (dy * dst_width as usize + dx) * 4;
                let blended = over(
                    [dst[di], dst[di + 1], dst[di + 2], dst[di + 3]],
                    [src[si], src[si + 1], src[si + 2], src[si + 3]],
                );
                dst[di..di + 4].copy_from_slice(&blended);
            }
        }
        Ok(())
    }
}

/// Editor surfaces are vello_cpu pixmaps, which index with u16.
pub(crate) fn surface_extent(width: u32, height: u32) -> SkinpaintResult<(u16, u16)> {
    if width == 0 || height == 0 {
        return Err(SkinpaintError::validation("surface extent must be > 0"));
    }
    let w: u16 = width
        .try_into()
        .map_err(|_| SkinpaintError::validation("surface width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| SkinpaintError::validation("surface height exceeds u16"))?;
    Ok((w, h))
}

pub(crate) fn pixmap_from_premul_bytes(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> SkinpaintResult<vello_cpu::Pixmap> {
    let (w, h) = surface_extent(width, height)?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(SkinpaintError::render("raster byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}
