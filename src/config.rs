use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::error::Error;

/// Points per millimetre.
pub const MM: f32 = 72.0 / 25.4;

pub const A4_WIDTH: f32 = 595.2756;
pub const A4_HEIGHT: f32 = 841.8898;

pub type Rgb = [u8; 3];

pub(crate) fn parse_hex_color(val: &str) -> Option<Rgb> {
    let val = val.strip_prefix('#').unwrap_or(val);
    if val.len() != 6 || !val.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let r = u8::from_str_radix(&val[0..2], 16).ok()?;
    let g = u8::from_str_radix(&val[2..4], 16).ok()?;
    let b = u8::from_str_radix(&val[4..6], 16).ok()?;
    Some([r, g, b])
}

fn hex_color<'de, D: Deserializer<'de>>(de: D) -> Result<Rgb, D::Error> {
    let s = String::deserialize(de)?;
    parse_hex_color(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid colour {s:?}")))
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Palette {
    #[serde(deserialize_with = "hex_color")]
    pub primary: Rgb,
    #[serde(deserialize_with = "hex_color")]
    pub secondary: Rgb,
    #[serde(deserialize_with = "hex_color")]
    pub accent: Rgb,
    #[serde(deserialize_with = "hex_color")]
    pub header_bg: Rgb,
    #[serde(deserialize_with = "hex_color")]
    pub alt_row_bg: Rgb,
    #[serde(deserialize_with = "hex_color")]
    pub border: Rgb,
    #[serde(deserialize_with = "hex_color")]
    pub text_dark: Rgb,
    #[serde(deserialize_with = "hex_color")]
    pub text_light: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            primary: [0x00, 0x97, 0xA7],
            secondary: [0x1E, 0x3A, 0x8A],
            accent: [0xDD, 0x09, 0x09],
            header_bg: [0xF9, 0xFA, 0xFB],
            alt_row_bg: [0xF3, 0xF4, 0xF6],
            border: [0x36, 0xCF, 0xEE],
            text_dark: [0x11, 0x18, 0x27],
            text_light: [0x6B, 0x72, 0x80],
        }
    }
}

/// Page size and margins, in points.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_side: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            width: A4_WIDTH,
            height: A4_HEIGHT,
            margin_top: 15.0 * MM,
            margin_bottom: 25.0 * MM,
            margin_side: 15.0 * MM,
        }
    }
}

impl PageGeometry {
    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin_side
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        let dims = [self.width, self.height, self.margin_top, self.margin_bottom, self.margin_side];
        if dims.iter().any(|d| !d.is_finite() || *d < 0.0) || self.width <= 0.0 || self.height <= 0.0 {
            return Err(Error::violation(format!("invalid page geometry {self:?}")));
        }
        if self.content_width() <= 0.0 || self.height - self.margin_top - self.margin_bottom <= 0.0 {
            return Err(Error::violation(format!("margins leave no printable area: {self:?}")));
        }
        Ok(())
    }
}

/// Immutable rendering configuration shared by every block of one export.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub clinic_name: String,
    pub subtitle: String,
    pub disclaimer: String,
    pub palette: Palette,
    pub page: PageGeometry,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            clinic_name: "Crown Med Asia".to_string(),
            subtitle: "Patient Medical Record".to_string(),
            disclaimer: "CONFIDENTIAL MEDICAL RECORD - For authorized personnel only. \
                         Unauthorized access or disclosure is prohibited."
                .to_string(),
            palette: Palette::default(),
            page: PageGeometry::default(),
        }
    }
}

impl RenderConfig {
    pub fn from_json_str(s: &str) -> Result<Self, Error> {
        let config: RenderConfig = serde_json::from_str(s)?;
        config.page.validate().map_err(|e| Error::Config(e.to_string()))?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())))
        })?;
        Self::from_json_str(&text)
    }
}
