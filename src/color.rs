//! Colour values as they travel through config and spawn messages.
//!
//! Colours stay strings on the wire (the way the widget forwards its
//! `scratch-fill` property) and are parsed only where pixels get written.

use std::fmt;

/// Fallback for anything we can't parse; matches the `#BBB` default fill.
pub const DEFAULT_FILL: Rgb = Rgb { r: 0xBB, g: 0xBB, b: 0xBB };

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rgb`, `#rrggbb`, `rgb(r, g, b)` or a handful of CSS names.
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }
        let lower = s.to_ascii_lowercase();
        if let Some(args) = lower.strip_prefix("rgb(").and_then(|r| r.strip_suffix(')')) {
            let mut parts = args.split(',').map(|p| p.trim().parse::<i64>().ok());
            let (r, g, b) = (parts.next()??, parts.next()??, parts.next()??);
            if parts.next().is_some() {
                return None;
            }
            return Some(Self::new(clamp_u8(r), clamp_u8(g), clamp_u8(b)));
        }
        match lower.as_str() {
            "black" => Some(Self::new(0, 0, 0)),
            "white" => Some(Self::new(255, 255, 255)),
            "gray" | "grey" => Some(Self::new(128, 128, 128)),
            "silver" => Some(Self::new(192, 192, 192)),
            "gold" => Some(Self::new(255, 215, 0)),
            "red" => Some(Self::new(255, 0, 0)),
            "lime" => Some(Self::new(0, 255, 0)),
            "blue" => Some(Self::new(0, 0, 255)),
            _ => None,
        }
    }

    pub fn parse_or_default(input: &str) -> Self {
        Self::parse(input).unwrap_or(DEFAULT_FILL)
    }

    /// Shift every channel by `delta`, saturating at 0 and 255.
    pub fn offset(self, delta: f32) -> Self {
        let shift = |c: u8| (c as f32 + delta).round().clamp(0.0, 255.0) as u8;
        Self::new(shift(self.r), shift(self.g), shift(self.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => {
            let v = u16::from_str_radix(hex, 16).ok()?;
            let expand = |n: u16| ((n & 0xF) as u8) * 0x11;
            Some(Rgb::new(expand(v >> 8), expand(v >> 4), expand(v)))
        }
        6 => {
            let v = u32::from_str_radix(hex, 16).ok()?;
            Some(Rgb::new((v >> 16) as u8, (v >> 8) as u8, v as u8))
        }
        _ => None,
    }
}

fn clamp_u8(v: i64) -> u8 {
    v.clamp(0, 255) as u8
}

#[inline]
pub fn pack_argb(a: u8, r: u8, g: u8, b: u8) -> u32 {
    ((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// (a, r, g, b) from a 0xAARRGGBB word.
#[inline]
pub fn unpack_argb(px: u32) -> (u8, u8, u8, u8) {
    ((px >> 24) as u8, (px >> 16) as u8, (px >> 8) as u8, px as u8)
}

#[inline]
pub fn alpha_of(px: u32) -> u8 {
    (px >> 24) as u8
}
