use crate::errors::{JaxpError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static HEX_COLOUR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#?([0-9a-fA-F]{2})([0-9a-fA-F]{2})([0-9a-fA-F]{2})$").expect("colour pattern"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb` (the `#` is optional).
    pub fn from_hex(text: &str) -> Result<Self> {
        let caps = HEX_COLOUR
            .captures(text.trim())
            .ok_or_else(|| JaxpError::invalid_argument(&format!("not a hex colour: '{}'", text)))?;
        let channel = |i: usize| {
            u8::from_str_radix(&caps[i], 16)
                .map_err(|e| JaxpError::invalid_argument(&format!("bad colour channel: {}", e)))
        };
        Ok(Self::new(channel(1)?, channel(2)?, channel(3)?))
    }

    /// Lowercase `#rrggbb`.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Each channel as a percentage of 255.
    pub fn to_percentages(&self) -> (f64, f64, f64) {
        let pct = |c: u8| f64::from(c) / 255.0 * 100.0;
        (pct(self.r), pct(self.g), pct(self.b))
    }

    pub fn luminance(&self) -> f64 {
        let unit = |c: u8| f64::from(c) / 255.0;
        0.213 * unit(self.r) + 0.715 * unit(self.g) + 0.072 * unit(self.b)
    }

    /// `"FFFFFF"` over dark backgrounds, `"000000"` over light ones.
    pub fn readable_foreground(&self) -> &'static str {
        if self.luminance() < 0.5 {
            "FFFFFF"
        } else {
            "000000"
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip() {
        let colour = Rgb::from_hex("#1A2b3C").unwrap();
        assert_eq!(colour, Rgb::new(0x1a, 0x2b, 0x3c));
        assert_eq!(colour.to_hex(), "#1a2b3c");
        assert_eq!(Rgb::from_hex("ff0000").unwrap(), Rgb::new(255, 0, 0));
    }

    #[test]
    fn test_invalid_hex() {
        assert!(Rgb::from_hex("#12345").is_err());
        assert!(Rgb::from_hex("#gg0000").is_err());
        assert!(Rgb::from_hex("").is_err());
    }

    #[test]
    fn test_percentages() {
        let (r, g, b) = Rgb::new(255, 0, 51).to_percentages();
        assert_eq!(r, 100.0);
        assert_eq!(g, 0.0);
        assert!((b - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_readable_foreground() {
        assert_eq!(Rgb::new(0, 0, 0).readable_foreground(), "FFFFFF");
        assert_eq!(Rgb::new(255, 255, 255).readable_foreground(), "000000");
        // pure green is bright, pure blue is dark
        assert_eq!(Rgb::new(0, 255, 0).readable_foreground(), "000000");
        assert_eq!(Rgb::new(0, 0, 255).readable_foreground(), "FFFFFF");
    }
}
