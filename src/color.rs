//! Series colors: parsing user-supplied color strings and the default palette.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default series palette, assigned to groups in first-seen order.
pub const DEFAULT_PALETTE: &[&str] = &[
    "#3EB0D5", "#B1399E", "#C2DD67", "#592EC2", "#4276BE", "#72D16D", "#FFD95F", "#B32F37",
    "#9174F0", "#E57947", "#75E2E2", "#FBB555",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("invalid hex color '{0}', expected #rgb or #rrggbb")]
    InvalidHex(String),
    #[error("invalid rgb() color '{0}'")]
    InvalidRgb(String),
    #[error("unknown color name '{0}'")]
    UnknownName(String),
}

/// An opaque sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb`, `#rgb`, `rgb(r, g, b)` or a basic color name (case-insensitive).
    pub fn parse(s: &str) -> Result<Self, ColorError> {
        let trimmed = s.trim();

        if trimmed.starts_with('#') {
            return parse_hex(trimmed);
        }

        let lower = trimmed.to_lowercase();
        if let Some(inner) = lower
            .strip_prefix("rgb(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return parse_rgb_fn(inner).ok_or_else(|| ColorError::InvalidRgb(trimmed.to_string()));
        }

        match lower.as_str() {
            "black" => Ok(Self::new(0, 0, 0)),
            "white" => Ok(Self::new(255, 255, 255)),
            "red" => Ok(Self::new(255, 0, 0)),
            "green" => Ok(Self::new(0, 128, 0)),
            "blue" => Ok(Self::new(0, 0, 255)),
            "yellow" => Ok(Self::new(255, 255, 0)),
            "cyan" => Ok(Self::new(0, 255, 255)),
            "magenta" => Ok(Self::new(255, 0, 255)),
            "orange" => Ok(Self::new(255, 165, 0)),
            "purple" => Ok(Self::new(128, 0, 128)),
            "gray" | "grey" => Ok(Self::new(128, 128, 128)),
            "dark_gray" | "dark gray" | "darkgray" | "dark_grey" | "darkgrey" => {
                Ok(Self::new(169, 169, 169))
            }
            "light_gray" | "light gray" | "lightgray" | "light_grey" | "lightgrey" => {
                Ok(Self::new(211, 211, 211))
            }
            _ => Err(ColorError::UnknownName(trimmed.to_string())),
        }
    }

    /// Lowercase `#rrggbb`.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// CSS `rgba()` string, used for the translucent confidence band fill.
    pub fn to_rgba(&self, alpha: f64) -> String {
        format!(
            "rgba({}, {}, {}, {})",
            self.r,
            self.g,
            self.b,
            alpha.clamp(0.0, 1.0)
        )
    }
}

fn parse_hex(s: &str) -> Result<Rgb, ColorError> {
    let digits = &s[1..];
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ColorError::InvalidHex(s.to_string()));
    }
    let channel =
        |h: &str| u8::from_str_radix(h, 16).map_err(|_| ColorError::InvalidHex(s.to_string()));
    match digits.len() {
        6 => Ok(Rgb::new(
            channel(&digits[0..2])?,
            channel(&digits[2..4])?,
            channel(&digits[4..6])?,
        )),
        3 => {
            // #abc is shorthand for #aabbcc
            let expand = |i: usize| channel(&digits[i..i + 1].repeat(2));
            Ok(Rgb::new(expand(0)?, expand(1)?, expand(2)?))
        }
        _ => Err(ColorError::InvalidHex(s.to_string())),
    }
}

fn parse_rgb_fn(inner: &str) -> Option<Rgb> {
    let parts: Vec<u8> = inner
        .split(',')
        .map(|p| p.trim().parse::<u8>().ok())
        .collect::<Option<_>>()?;
    match parts.as_slice() {
        [r, g, b] => Some(Rgb::new(*r, *g, *b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_forms() {
        assert_eq!(Rgb::parse("#ff0000").unwrap(), Rgb::new(255, 0, 0));
        assert_eq!(Rgb::parse("#FF8000").unwrap(), Rgb::new(255, 128, 0));
        assert_eq!(Rgb::parse("#0f0").unwrap(), Rgb::new(0, 255, 0));
        assert!(matches!(Rgb::parse("#12"), Err(ColorError::InvalidHex(_))));
        assert!(matches!(Rgb::parse("#gg0000"), Err(ColorError::InvalidHex(_))));
    }

    #[test]
    fn rgb_function() {
        assert_eq!(Rgb::parse("rgb(1, 2, 3)").unwrap(), Rgb::new(1, 2, 3));
        assert_eq!(Rgb::parse("RGB(10,20,30)").unwrap(), Rgb::new(10, 20, 30));
        assert!(matches!(Rgb::parse("rgb(1,2)"), Err(ColorError::InvalidRgb(_))));
        assert!(matches!(Rgb::parse("rgb(1,2,300)"), Err(ColorError::InvalidRgb(_))));
    }

    #[test]
    fn names_are_case_insensitive() {
        assert_eq!(Rgb::parse("Red").unwrap(), Rgb::new(255, 0, 0));
        assert_eq!(Rgb::parse("dark gray").unwrap(), Rgb::parse("darkgrey").unwrap());
        assert!(matches!(Rgb::parse("chartreuse-ish"), Err(ColorError::UnknownName(_))));
    }

    #[test]
    fn output_forms() {
        let c = Rgb::new(62, 176, 213);
        assert_eq!(c.to_hex(), "#3eb0d5");
        assert_eq!(c.to_rgba(0.25), "rgba(62, 176, 213, 0.25)");
        assert_eq!(c.to_rgba(3.0), "rgba(62, 176, 213, 1)");
    }

    #[test]
    fn default_palette_parses() {
        for c in DEFAULT_PALETTE {
            assert!(Rgb::parse(c).is_ok(), "{c}");
        }
    }
}
