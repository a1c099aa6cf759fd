//! Scratch-card configuration.
//!
//! Properties are resolved by name the way the card widget reads them: an
//! explicit attribute wins, then the style layer (here: a JSON file), then the
//! built-in default. Malformed values never error; they fall back.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::color::Rgb;
use crate::error::Error;
use crate::fx::EngineTuning;

pub const DEFAULT_FILL: &str = "#BBB";
pub const DEFAULT_SCRATCH_SIZE: u32 = 10;
pub const DEFAULT_NOISE_FACTOR: u32 = 20;
pub const DEFAULT_WIDTH: u32 = 480;
pub const DEFAULT_HEIGHT: u32 = 280;

pub const PROP_FILL: &str = "scratch-fill";
pub const PROP_SIZE: &str = "scratch-size";
pub const PROP_NOISE: &str = "noise-factor";
pub const PROP_CODE: &str = "code";

/// Read-only snapshot of the values the mask needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ScratchConfig {
    /// Colour string as configured; forwarded verbatim in spawn requests.
    pub fill: String,
    pub scratch_size: u32,
    pub noise_factor: u32,
    pub code: Option<String>,
}

impl Default for ScratchConfig {
    fn default() -> Self {
        Self {
            fill: DEFAULT_FILL.to_string(),
            scratch_size: DEFAULT_SCRATCH_SIZE,
            noise_factor: DEFAULT_NOISE_FACTOR,
            code: None,
        }
    }
}

impl ScratchConfig {
    pub fn from_props(props: &Props) -> Self {
        let fill = match props.get(PROP_FILL) {
            Some(raw) if Rgb::parse(raw).is_some() => raw.trim().to_string(),
            Some(raw) => {
                warn!(value = raw, "unparseable {PROP_FILL}; using {DEFAULT_FILL}");
                DEFAULT_FILL.to_string()
            }
            None => DEFAULT_FILL.to_string(),
        };

        let scratch_size = match props.get(PROP_SIZE).map(|raw| (raw, parse_int_prefix(raw))) {
            Some((_, Some(n))) if n > 0 => n.min(i32::MAX as i64) as u32,
            Some((raw, _)) => {
                warn!(value = raw, "bad {PROP_SIZE}; using {DEFAULT_SCRATCH_SIZE}");
                DEFAULT_SCRATCH_SIZE
            }
            None => DEFAULT_SCRATCH_SIZE,
        };

        let noise_factor = match props.get(PROP_NOISE).map(|raw| (raw, parse_int_prefix(raw))) {
            Some((_, Some(n))) if n >= 0 => n.min(u32::MAX as i64) as u32,
            Some((raw, _)) => {
                warn!(value = raw, "bad {PROP_NOISE}; using {DEFAULT_NOISE_FACTOR}");
                DEFAULT_NOISE_FACTOR
            }
            None => DEFAULT_NOISE_FACTOR,
        };

        let code = props.get(PROP_CODE).map(str::to_string);

        Self { fill, scratch_size, noise_factor, code }
    }

    pub fn fill_rgb(&self) -> Rgb {
        Rgb::parse_or_default(&self.fill)
    }
}

/// Two name → value layers; attributes shadow style values.
#[derive(Debug, Clone, Default)]
pub struct Props {
    attributes: HashMap<String, String>,
    style: HashMap<String, String>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    pub fn set_style(&mut self, name: &str, value: impl Into<String>) {
        self.style.insert(name.to_string(), value.into());
    }

    /// Empty strings count as unset, like `getAttribute(..) || ...`.
    pub fn get(&self, name: &str) -> Option<&str> {
        [&self.attributes, &self.style]
            .into_iter()
            .filter_map(|layer| layer.get(name))
            .map(|v| v.as_str())
            .find(|v| !v.trim().is_empty())
    }
}

/// Leading integer of a string, `parseInt` style: `" 12px"` → 12, `"px"` → None.
pub fn parse_int_prefix(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (sign, digits) = match s.as_bytes().first() {
        Some(b'-') => (-1, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let end = digits.bytes().take_while(u8::is_ascii_digit).count();
    if end == 0 {
        return None;
    }
    // saturate absurdly long numbers instead of failing
    let value = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(sign * value)
}

/// The JSON style file: the same property names plus layout and particle tuning.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StyleFile {
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub scale: Option<f32>,
    #[serde(default)]
    pub particles: Option<EngineTuning>,
    #[serde(flatten)]
    pub properties: HashMap<String, Value>,
}

impl StyleFile {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("read {}: {e}", path.display())))?;
        let file: StyleFile = serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("parse {}: {e}", path.display())))?;
        debug!(path = %path.display(), "style file loaded");
        Ok(file)
    }

    /// Scalar properties as strings; arrays/objects are ignored.
    pub fn style_values(&self) -> impl Iterator<Item = (&str, String)> {
        self.properties.iter().filter_map(|(k, v)| {
            let s = match v {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((k.as_str(), s))
        })
    }
}

/// Window size in logical pixels plus device pixel scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    pub scale: f32,
}

impl Default for Layout {
    fn default() -> Self {
        Self { width: DEFAULT_WIDTH, height: DEFAULT_HEIGHT, scale: 1.0 }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutOverrides {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub scale: Option<f32>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub scratch: ScratchConfig,
    pub tuning: EngineTuning,
    pub layout: Layout,
}

impl AppConfig {
    /// Merge attributes (highest), the optional style file, and defaults.
    pub fn resolve(
        attributes: &[(&str, Option<String>)],
        style: Option<&StyleFile>,
        overrides: LayoutOverrides,
    ) -> Self {
        let mut props = Props::new();
        for (name, value) in attributes {
            if let Some(v) = value {
                props.set_attribute(name, v.clone());
            }
        }
        if let Some(file) = style {
            for (name, value) in file.style_values() {
                props.set_style(name, value);
            }
        }

        let defaults = Layout::default();
        let pick = |cli: Option<u32>, file: Option<u32>, fallback: u32| {
            cli.or(file).filter(|&v| v > 0).unwrap_or(fallback)
        };
        let scale = overrides
            .scale
            .or(style.and_then(|f| f.scale))
            .unwrap_or(defaults.scale);
        let scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            warn!(scale, "device scale must be positive; using 1.0");
            1.0
        };
        let layout = Layout {
            width: pick(overrides.width, style.and_then(|f| f.width), defaults.width),
            height: pick(overrides.height, style.and_then(|f| f.height), defaults.height),
            scale,
        };

        let tuning = style.and_then(|f| f.particles.clone()).unwrap_or_default();

        Self { scratch: ScratchConfig::from_props(&props), tuning, layout }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_when_nothing_is_set() {
        assert_eq!(ScratchConfig::from_props(&Props::new()), ScratchConfig::default());
    }

    #[test]
    fn attributes_shadow_style_values() {
        let mut props = Props::new();
        props.set_style(PROP_SIZE, "30");
        props.set_style(PROP_FILL, "#00FF00");
        props.set_attribute(PROP_SIZE, "12px");
        props.set_attribute(PROP_FILL, "");
        let cfg = ScratchConfig::from_props(&props);
        assert_eq!(cfg.scratch_size, 12);
        assert_eq!(cfg.fill, "#00FF00", "empty attribute falls through to style");
    }

    #[test]
    fn malformed_values_fall_back_to_defaults() {
        let mut props = Props::new();
        props.set_attribute(PROP_SIZE, "huge");
        props.set_attribute(PROP_NOISE, "-3");
        props.set_attribute(PROP_FILL, "sparkly");
        let cfg = ScratchConfig::from_props(&props);
        assert_eq!(cfg.scratch_size, DEFAULT_SCRATCH_SIZE);
        assert_eq!(cfg.noise_factor, DEFAULT_NOISE_FACTOR);
        assert_eq!(cfg.fill, DEFAULT_FILL);

        props.set_attribute(PROP_SIZE, "0");
        assert_eq!(ScratchConfig::from_props(&props).scratch_size, DEFAULT_SCRATCH_SIZE);
        props.set_attribute(PROP_NOISE, "0");
        assert_eq!(ScratchConfig::from_props(&props).noise_factor, 0);
    }

    #[test]
    fn oversized_numbers_stay_in_range() {
        let mut props = Props::new();
        props.set_attribute(PROP_SIZE, "3000000000");
        props.set_attribute(PROP_NOISE, "1000");
        let cfg = ScratchConfig::from_props(&props);
        assert_eq!(cfg.scratch_size, i32::MAX as u32);
        assert_eq!(cfg.noise_factor, 1000, "noise saturates per channel, not here");
    }

    #[test]
    fn parse_int_prefix_behaves_like_parse_int() {
        assert_eq!(parse_int_prefix("10"), Some(10));
        assert_eq!(parse_int_prefix("  7.9em"), Some(7));
        assert_eq!(parse_int_prefix("-4"), Some(-4));
        assert_eq!(parse_int_prefix("px10"), None);
        assert_eq!(parse_int_prefix("-"), None);
    }

    #[test]
    fn style_file_feeds_props_layout_and_tuning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("card.json");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(
            f,
            r#"{{
                "scratch-fill": "gold",
                "scratch-size": 16,
                "code": "WIN-42",
                "width": 300,
                "scale": 2,
                "particles": {{ "batch_size": 5, "max_particles": 600 }}
            }}"#
        )
        .unwrap();

        let style = StyleFile::load(&path).unwrap();
        let cfg = AppConfig::resolve(
            &[(PROP_SIZE, Some("8".into())), (PROP_NOISE, None)],
            Some(&style),
            LayoutOverrides { height: Some(100), ..Default::default() },
        );
        assert_eq!(cfg.scratch.fill, "gold");
        assert_eq!(cfg.scratch.scratch_size, 8);
        assert_eq!(cfg.scratch.noise_factor, DEFAULT_NOISE_FACTOR);
        assert_eq!(cfg.scratch.code.as_deref(), Some("WIN-42"));
        assert_eq!(cfg.layout, Layout { width: 300, height: 100, scale: 2.0 });
        assert_eq!(cfg.tuning.batch_size, 5);
        assert_eq!(cfg.tuning.max_particles, 600);
        assert_eq!(cfg.tuning.lifetime_ms, 1500);
    }

    #[test]
    fn missing_or_broken_style_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = StyleFile::load(&dir.path().join("nope.json"));
        assert!(matches!(missing, Err(Error::Config(_))));

        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(StyleFile::load(&path), Err(Error::Config(_))));
    }

    #[test]
    fn bad_scale_falls_back_to_one() {
        let cfg = AppConfig::resolve(
            &[],
            None,
            LayoutOverrides { scale: Some(-2.0), width: Some(0), ..Default::default() },
        );
        assert_eq!(cfg.layout, Layout { width: DEFAULT_WIDTH, height: DEFAULT_HEIGHT, scale: 1.0 });
    }
}
