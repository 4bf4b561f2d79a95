use crate::error::{SkinpaintError, SkinpaintResult};
use crate::texture::TextureImage;

/// Stroke configuration for the silhouette outline. The editor pins this to
/// 1px black; the extractor itself takes it as a parameter.
#[derive(Clone, Copy, Debug)]
pub struct OutlineStroke {
    pub thickness: u32,
    /// Straight-alpha RGBA.
    pub color: [u8; 4],
}

impl Default for OutlineStroke {
    fn default() -> Self {
        Self {
            thickness: 1,
            color: [0, 0, 0, 255],
        }
    }
}

/// Rasterized silhouette outline. Premultiplied RGBA8; the extent exceeds the
/// source texture by `thickness` on every side so the stroke never clips.
#[derive(Clone, Debug)]
pub struct OutlineImage {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Vec<u8>,
}

/// Trace the silhouette of the texture's non-transparent pixels.
///
/// A pixel of the output is stroke-colored iff it lies within `thickness`
/// (Chebyshev distance) of an opaque source pixel without being opaque
/// itself, which yields a ring hugging the outside of the alpha boundary.
pub fn outline_from_alpha(
    texture: &TextureImage,
    stroke: &OutlineStroke,
) -> SkinpaintResult<OutlineImage> {
    if stroke.thickness == 0 {
        return Err(SkinpaintError::validation(
            "outline thickness must be > 0",
        ));
    }

    let w = texture.width as usize;
    let h = texture.height as usize;
    let t = stroke.thickness as usize;
    let expected_len = w
        .checked_mul(h)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| SkinpaintError::render("outline source size overflow"))?;
    if texture.rgba8_premul.len() != expected_len {
        return Err(SkinpaintError::render(
            "outline source byte length mismatch",
        ));
    }

    let ow = w + 2 * t;
    let oh = h + 2 * t;

    let mut opaque = vec![false; w * h];
    for (i, px) in texture.rgba8_premul.chunks_exact(4).enumerate() {
        opaque[i] = px[3] != 0;
    }

    let mut dilated = vec![false; ow * oh];
    for y in 0..h {
        for x in 0..w {
            if !opaque[y * w + x] {
                continue;
            }
            for dy in 0..=(2 * t) {
                let oy = y + dy;
                let row = oy * ow + x;
                dilated[row..row + 2 * t + 1].fill(true);
            }
        }
    }

    let premul_color = premul(stroke.color);
    let mut out = vec![0u8; ow * oh * 4];
    for oy in 0..oh {
        for ox in 0..ow {
            if !dilated[oy * ow + ox] {
                continue;
            }
            let inside = ox >= t
                && oy >= t
                && ox - t < w
                && oy - t < h
                && opaque[(oy - t) * w + (ox - t)];
            if inside {
                continue;
            }
            let idx = (oy * ow + ox) * 4;
            out[idx..idx + 4].copy_from_slice(&premul_color);
        }
    }

    Ok(OutlineImage {
        width: ow as u32,
        height: oh as u32,
        rgba8_premul: out,
    })
}

fn premul(color: [u8; 4]) -> [u8; 4] {
    let a = color[3] as u16;
    [
        ((color[0] as u16 * a + 127) / 255) as u8,
        ((color[1] as u16 * a + 127) / 255) as u8,
        ((color[2] as u16 * a + 127) / 255) as u8,
        color[3],
    ]
}
