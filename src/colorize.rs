//! Compositing colorize filter.
//!
//! The CSS filter chain can shift hue but can not replace it outright, so
//! colorization runs as a raster post-process over a cached snapshot of the
//! texture layer instead of as a live filter string.

/// Saturation given to every recolored pixel. Hue replacement alone is
/// invisible on gray pixels, which model skins are full of.
const COLORIZE_SATURATION: f64 = 0.5;

/// Replace the hue of every non-transparent pixel with `hue_deg`, preserving
/// lightness and alpha. Operates on straight-alpha RGBA8.
pub fn colorize_rgba8(buf: &mut [u8], hue_deg: f64) {
    let h = hue_deg.rem_euclid(360.0) / 360.0;
    for px in buf.chunks_exact_mut(4) {
        if px[3] == 0 {
            continue;
        }
        let (_, _, l) = rgb_to_hsl(
            f64::from(px[0]) / 255.0,
            f64::from(px[1]) / 255.0,
            f64::from(px[2]) / 255.0,
        );
        let (r, g, b) = hsl_to_rgb(h, COLORIZE_SATURATION, l);
        px[0] = (r * 255.0).round().clamp(0.0, 255.0) as u8;
        px[1] = (g * 255.0).round().clamp(0.0, 255.0) as u8;
        px[2] = (b * 255.0).round().clamp(0.0, 255.0) as u8;
    }
}

/// RGB in 0..1 to HSL in 0..1 (hue as a fraction of a turn).
pub(crate) fn rgb_to_hsl(r: f64, g: f64, b: f64) -> (f64, f64, f64) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if max == min {
        return (0.0, 0.0, l);
    }

    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };

    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };

    (h / 6.0, s, l)
}

/// HSL in 0..1 back to RGB in 0..1.
pub(crate) fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (f64, f64, f64) {
    if s == 0.0 {
        return (l, l, l);
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    (
        hue_to_channel(p, q, h + 1.0 / 3.0),
        hue_to_channel(p, q, h),
        hue_to_channel(p, q, h - 1.0 / 3.0),
    )
}

fn hue_to_channel(p: f64, q: f64, t: f64) -> f64 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 1.0 / 2.0 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}
