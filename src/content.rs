// What sits under the foil: either a picture from disk, scaled to the card,
// or a plain ticket with the prize code printed in the middle.
use std::path::Path;

use image::imageops::{self, FilterType};
use image::RgbImage;
use tracing::debug;

use crate::draw::{draw_text, fit_scale, text_height, text_width};
use crate::error::Error;
use crate::types::FrameBuffer;

const TICKET_PAPER: u32 = 0x00F4_EBD0;
const TICKET_INK: u32 = 0x0030_2A24;

/// Decode `path` and stretch it to `width x height` device pixels.
pub fn load_image(path: &Path, width: usize, height: usize) -> Result<FrameBuffer, Error> {
    let img = image::open(path)
        .map_err(|e| Error::ContentLoad(format!("{}: {e}", path.display())))?
        .to_rgb8();
    debug!(path = %path.display(), w = img.width(), h = img.height(), "hidden image decoded");
    let resized = imageops::resize(&img, width as u32, height as u32, FilterType::Triangle);
    Ok(from_rgb_image(&resized))
}

/// Pack an RGB image as 0x00RRGGBB.
pub fn from_rgb_image(img: &RgbImage) -> FrameBuffer {
    let (w, h) = img.dimensions();
    let pixels = img
        .pixels()
        .map(|p| ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32)
        .collect();
    FrameBuffer { width: w as usize, height: h as usize, pixels }
}

/// Paper-coloured ticket with `code` centered as large as fits.
pub fn ticket(width: usize, height: usize, code: Option<&str>) -> FrameBuffer {
    let mut fb = FrameBuffer::filled(width, height, TICKET_PAPER);
    let Some(code) = code.map(str::trim).filter(|c| !c.is_empty()) else {
        return fb;
    };
    let (w, h) = (width as i32, height as i32);
    let by_width = fit_scale(code, w * 9 / 10);
    let by_height = (h * 6 / 10 / text_height(1)).max(1);
    let scale = by_width.min(by_height);
    let x = (w - text_width(code, scale)) / 2;
    let y = (h - text_height(scale)) / 2;
    draw_text(&mut fb, x, y, code, TICKET_INK, scale);
    fb
}
