// Command-line flags for the scratch-card window. Card properties given here
// act like element attributes: they win over the same names in --config.

use std::path::PathBuf;

use clap::Parser;

use crate::config::{LayoutOverrides, PROP_CODE, PROP_FILL, PROP_NOISE, PROP_SIZE};

/// Scratch the foil off a card with the mouse.
#[derive(Parser, Debug)]
#[command(name = "scratch-foil", about = "Interactive scratch card with flaking foil")]
pub struct CliArgs {
    /// JSON file with card properties, layout and particle tuning.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Picture hidden under the foil (defaults to a ticket showing --code).
    #[arg(short, long, value_name = "FILE")]
    pub image: Option<PathBuf>,

    /// Card width in logical pixels.
    #[arg(long)]
    pub width: Option<u32>,

    /// Card height in logical pixels.
    #[arg(long)]
    pub height: Option<u32>,

    /// Device pixel scale.
    #[arg(long)]
    pub scale: Option<f32>,

    /// Foil colour (#rgb, #rrggbb, rgb(r, g, b) or a name).
    #[arg(long)]
    pub scratch_fill: Option<String>,

    /// Brush size in logical pixels. Kept as text: bad values fall back.
    #[arg(long)]
    pub scratch_size: Option<String>,

    /// Per-pixel brightness jitter of the foil.
    #[arg(long)]
    pub noise_factor: Option<String>,

    /// Text printed under the foil.
    #[arg(long)]
    pub code: Option<String>,

    /// Verbose logging (RUST_LOG is honoured).
    #[arg(long)]
    pub debug: bool,
}

impl CliArgs {
    /// Card properties as attribute name/value pairs.
    pub fn attributes(&self) -> [(&'static str, Option<String>); 4] {
        [
            (PROP_FILL, self.scratch_fill.clone()),
            (PROP_SIZE, self.scratch_size.clone()),
            (PROP_NOISE, self.noise_factor.clone()),
            (PROP_CODE, self.code.clone()),
        ]
    }

    pub fn layout_overrides(&self) -> LayoutOverrides {
        LayoutOverrides { width: self.width, height: self.height, scale: self.scale }
    }
}
