use crate::error::{SkinpaintError, SkinpaintResult};

/// Shape stamped by the paint surface and previewed by the cursor renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrushShape {
    Circle,
    Square,
}

/// RGB value carried as `#rrggbb` hex in serialized form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl RgbColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn from_hex(hex: &str) -> SkinpaintResult<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(SkinpaintError::validation(format!(
                "color must be #rrggbb, got '{hex}'"
            )));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map_err(|_| SkinpaintError::validation("color channel out of range"))
        };
        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for RgbColor {
    type Error = SkinpaintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<RgbColor> for String {
    fn from(value: RgbColor) -> Self {
        value.to_hex()
    }
}

/// Brush descriptor shared by the paint surface and the cursor renderer.
///
/// Immutable value: replaced wholesale through
/// [`TextureEditor::set_brush`](crate::editor::TextureEditor::set_brush),
/// never mutated in place, so stroke and cursor can not drift apart.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Brush {
    pub shape: BrushShape,
    /// Diameter (circle) or side length (square), in surface-space units.
    pub size: f64,
    pub color: RgbColor,
}

impl Brush {
    pub fn validate(&self) -> SkinpaintResult<()> {
        if !self.size.is_finite() || self.size <= 0.0 {
            return Err(SkinpaintError::validation(
                "brush size must be finite and > 0",
            ));
        }
        Ok(())
    }
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            shape: BrushShape::Circle,
            size: 20.0,
            color: RgbColor::new(0xff, 0x00, 0x00),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        let c = RgbColor::from_hex("#1a2b3c").unwrap();
        assert_eq!(c, RgbColor::new(0x1a, 0x2b, 0x3c));
        assert_eq!(c.to_hex(), "#1a2b3c");
    }

    #[test]
    fn hex_without_hash_is_accepted() {
        assert_eq!(
            RgbColor::from_hex("ff0000").unwrap(),
            RgbColor::new(255, 0, 0)
        );
    }

    #[test]
    fn hex_rejects_malformed_input() {
        assert!(RgbColor::from_hex("#fff").is_err());
        assert!(RgbColor::from_hex("#zzzzzz").is_err());
        assert!(RgbColor::from_hex("").is_err());
    }

    #[test]
    fn serde_uses_hex_form() {
        let brush = Brush::default();
        let s = serde_json::to_string(&brush).unwrap();
        assert!(s.contains("\"#ff0000\""));
        assert!(s.contains("\"circle\""));

        let de: Brush = serde_json::from_str(&s).unwrap();
        assert_eq!(de, brush);
    }

    #[test]
    fn validate_rejects_bad_sizes() {
        let mut brush = Brush::default();
        brush.size = 0.0;
        assert!(brush.validate().is_err());
        brush.size = f64::NAN;
        assert!(brush.validate().is_err());
        brush.size = 12.5;
        assert!(brush.validate().is_ok());
    }
}
