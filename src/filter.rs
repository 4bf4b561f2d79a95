use crate::colorize::{hsl_to_rgb, rgb_to_hsl};

/// Hue adjustment. `colorize` is not a CSS filter: when set (and the entry is
/// enabled) the editor recolors a cached raster of the texture layer instead,
/// and `rotate_deg` becomes the target hue.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct HueFilter {
    pub enabled: bool,
    pub rotate_deg: f64,
    #[serde(default)]
    pub colorize: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SaturationFilter {
    pub enabled: bool,
    pub percent: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BrightnessFilter {
    pub enabled: bool,
    pub percent: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ContrastFilter {
    pub enabled: bool,
    pub percent: f64,
}

impl Default for HueFilter {
    fn default() -> Self {
        Self {
            enabled: false,
            rotate_deg: 0.0,
            colorize: false,
        }
    }
}

impl Default for SaturationFilter {
    fn default() -> Self {
        Self {
            enabled: false,
            percent: 100.0,
        }
    }
}

impl Default for BrightnessFilter {
    fn default() -> Self {
        Self {
            enabled: false,
            percent: 100.0,
        }
    }
}

impl Default for ContrastFilter {
    fn default() -> Self {
        Self {
            enabled: false,
            percent: 100.0,
        }
    }
}

impl HueFilter {
    pub fn to_css_string(&self) -> String {
        format!("hue-rotate({}deg)", self.rotate_deg)
    }

    fn apply(&self, buf: &mut [u8]) {
        let shift = self.rotate_deg / 360.0;
        per_pixel_hsl(buf, |h, s, l| ((h + shift).rem_euclid(1.0), s, l));
    }
}

impl SaturationFilter {
    pub fn to_css_string(&self) -> String {
        format!("saturate({}%)", self.percent)
    }

    fn apply(&self, buf: &mut [u8]) {
        let factor = (self.percent / 100.0).max(0.0);
        per_pixel_hsl(buf, move |h, s, l| (h, (s * factor).clamp(0.0, 1.0), l));
    }
}

impl BrightnessFilter {
    pub fn to_css_string(&self) -> String {
        format!("brightness({}%)", self.percent)
    }

    fn apply(&self, buf: &mut [u8]) {
        let factor = (self.percent / 100.0).max(0.0);
        per_channel(buf, move |c| c * factor);
    }
}

impl ContrastFilter {
    pub fn to_css_string(&self) -> String {
        format!("contrast({}%)", self.percent)
    }

    fn apply(&self, buf: &mut [u8]) {
        let factor = (self.percent / 100.0).max(0.0);
        per_channel(buf, move |c| (c - 127.5) * factor + 127.5);
    }
}

/// Independent visual adjustments reducible to one CSS filter expression.
///
/// Field order is the declared application order; adjacent filters act on the
/// same channels, so reordering changes the result.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CssFilterSettings {
    pub hue: HueFilter,
    pub saturation: SaturationFilter,
    pub brightness: BrightnessFilter,
    pub contrast: ContrastFilter,
}

impl CssFilterSettings {
    /// `"none"` when nothing is enabled, otherwise the enabled entries'
    /// string forms joined by single spaces, in declared order.
    pub fn to_css_filter(&self) -> String {
        let mut parts = Vec::new();
        if self.hue.enabled {
            parts.push(self.hue.to_css_string());
        }
        if self.saturation.enabled {
            parts.push(self.saturation.to_css_string());
        }
        if self.brightness.enabled {
            parts.push(self.brightness.to_css_string());
        }
        if self.contrast.enabled {
            parts.push(self.contrast.to_css_string());
        }

        if parts.is_empty() {
            "none".to_string()
        } else {
            parts.join(" ")
        }
    }

    /// Whether the editor must take the rasterized-composite path.
    pub fn wants_colorize(&self) -> bool {
        self.hue.enabled && self.hue.colorize
    }

    pub fn any_enabled(&self) -> bool {
        self.hue.enabled
            || self.saturation.enabled
            || self.brightness.enabled
            || self.contrast.enabled
    }

    /// Apply the enabled adjustments to a straight-alpha RGBA8 buffer, in
    /// declared order. The colorize path is handled separately by the editor.
    pub fn apply_to_rgba8(&self, buf: &mut [u8]) {
        if self.hue.enabled && !self.hue.colorize {
            self.hue.apply(buf);
        }
        if self.saturation.enabled {
            self.saturation.apply(buf);
        }
        if self.brightness.enabled {
            self.brightness.apply(buf);
        }
        if self.contrast.enabled {
            self.contrast.apply(buf);
        }
    }
}

fn per_pixel_hsl(buf: &mut [u8], f: impl Fn(f64, f64, f64) -> (f64, f64, f64)) {
    for px in buf.chunks_exact_mut(4) {
        if px[3] == 0 {
            continue;
        }
        let (h, s, l) = rgb_to_hsl(
            f64::from(px[0]) / 255.0,
            f64::from(px[1]) / 255.0,
            f64::from(px[2]) / 255.0,
        );
        let (h, s, l) = f(h, s, l);
        let (r, g, b) = hsl_to_rgb(h, s, l);
        px[0] = (r * 255.0).round().clamp(0.0, 255.0) as u8;
        px[1] = (g * 255.0).round().clamp(0.0, 255.0) as u8;
        px[2] = (b * 255.0).round().clamp(0.0, 255.0) as u8;
    }
}

fn per_channel(buf: &mut [u8], f: impl Fn(f64) -> f64) {
    for px in buf.chunks_exact_mut(4) {
        if px[3] == 0 {
            continue;
        }
        for c in &mut px[0..3] {
            *c = f(f64::from(*c)).round().clamp(0.0, 255.0) as u8;
        }
    }
}
