// Pixel-buffer primitives used by the mask and the particle layer.
// Everything here works on device pixels; a pixel is "inside" a shape when
// its center (x + 0.5, y + 0.5) is.
use crate::color::{Rgb, alpha_of, pack_argb, unpack_argb};
use crate::types::{Point, RgbaBuffer};

/// Scan-convert a closed polygon with the even-odd rule and hand every covered
/// pixel to `op`. Returns how many pixels were visited.
/// Degenerate input (fewer than 3 points, NaN/inf coordinates) covers nothing.
pub fn fill_polygon_even_odd(
    buf: &mut RgbaBuffer,
    poly: &[Point],
    mut op: impl FnMut(&mut u32),
) -> usize {
    if poly.len() < 3 || buf.is_empty() || !poly.iter().all(Point::is_finite) {
        return 0;
    }

    let (mut min_y, mut max_y) = (f32::INFINITY, f32::NEG_INFINITY);
    for p in poly {
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }
    let first_row = (min_y - 0.5).ceil().max(0.0);
    let last_row = (max_y - 0.5).floor().min(buf.height as f32 - 1.0);
    if last_row < first_row {
        return 0;
    }

    let n = poly.len();
    let mut crossings: Vec<f32> = Vec::with_capacity(n);
    let mut visited = 0;

    for y in first_row as usize..=last_row as usize {
        let sy = y as f32 + 0.5;

        // Half-open edge test: never counts a vertex twice and never divides by 0.
        crossings.clear();
        for i in 0..n {
            let a = poly[i];
            let b = poly[(i + 1) % n];
            if (a.y <= sy) != (b.y <= sy) {
                let t = (sy - a.y) / (b.y - a.y);
                crossings.push(a.x + t * (b.x - a.x));
            }
        }
        crossings.sort_by(f32::total_cmp);

        // Even-odd: inside between crossing 0-1, 2-3, ...
        let row = y * buf.width;
        for span in crossings.chunks_exact(2) {
            let start = (span[0] - 0.5).ceil().max(0.0);
            let end = (span[1] - 0.5).ceil().min(buf.width as f32);
            if end <= start {
                continue;
            }
            for x in start as usize..end as usize {
                op(&mut buf.pixels[row + x]);
                visited += 1;
            }
        }
    }
    visited
}

/// "destination-out" with an opaque source: covered pixels become fully
/// transparent. Returns how many pixels actually changed, so re-erasing an
/// already clear region reports 0.
pub fn erase_polygon(buf: &mut RgbaBuffer, poly: &[Point]) -> usize {
    let mut changed = 0;
    fill_polygon_even_odd(buf, poly, |px| {
        if *px != 0 {
            *px = 0;
            changed += 1;
        }
    });
    changed
}

/// Alpha at a device pixel, or None outside the buffer.
#[inline]
pub fn alpha_at(buf: &RgbaBuffer, x: i64, y: i64) -> Option<u8> {
    buf.index(x, y).map(|i| alpha_of(buf.pixels[i]))
}

/// Number of pixels whose alpha is exactly 0.
pub fn count_transparent(buf: &RgbaBuffer) -> usize {
    buf.pixels.iter().filter(|&&px| alpha_of(px) == 0).count()
}

/// Fraction of fully transparent pixels in [0, 1]; an empty buffer is 0.
pub fn revealed_fraction(buf: &RgbaBuffer) -> f32 {
    if buf.is_empty() {
        return 0.0;
    }
    count_transparent(buf) as f32 / buf.len() as f32
}

/// Source-over fill of an axis-aligned rectangle (straight alpha).
/// `alpha` is clamped to [0, 1]; the rectangle is clipped to the buffer.
pub fn fill_rect_over(
    buf: &mut RgbaBuffer,
    x: i64,
    y: i64,
    w: i64,
    h: i64,
    color: Rgb,
    alpha: f32,
) {
    let sa = alpha.clamp(0.0, 1.0);
    if sa <= 0.0 || w <= 0 || h <= 0 {
        return;
    }
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + w).min(buf.width as i64);
    let y1 = (y + h).min(buf.height as i64);

    for py in y0..y1 {
        let row = py as usize * buf.width;
        for px in x0..x1 {
            let slot = &mut buf.pixels[row + px as usize];
            *slot = source_over(*slot, color, sa);
        }
    }
}

#[inline]
fn source_over(dst: u32, src: Rgb, sa: f32) -> u32 {
    let (da, dr, dg, db) = unpack_argb(dst);
    let da = da as f32 / 255.0;
    let keep = da * (1.0 - sa);
    let out_a = sa + keep;
    if out_a <= 0.0 {
        return 0;
    }
    let mix = |s: u8, d: u8| ((s as f32 * sa + d as f32 * keep) / out_a).round().clamp(0.0, 255.0) as u8;
    pack_argb(
        (out_a * 255.0).round() as u8,
        mix(src.r, dr),
        mix(src.g, dg),
        mix(src.b, db),
    )
}
