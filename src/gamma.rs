// sRGB <-> linear lookup tables so layer blending happens in linear light
// without a powf per channel. Visual: foil edges and fading flakes blend into
// the hidden content without dark halos.
use crate::color::{pack_argb, unpack_argb};

const LINEAR_STEPS: usize = 4096;

pub struct GammaLut {
    to_linear: [f32; 256],          // sRGB byte -> linear 0..1
    to_srgb: [u8; LINEAR_STEPS],    // quantized linear -> sRGB byte
}

impl GammaLut {
    pub fn new() -> Self {
        let mut to_linear = [0.0f32; 256];
        for (v, slot) in to_linear.iter_mut().enumerate() {
            *slot = srgb_to_linear(v as f32 / 255.0);
        }
        let mut to_srgb = [0u8; LINEAR_STEPS];
        for (i, slot) in to_srgb.iter_mut().enumerate() {
            let l = i as f32 / (LINEAR_STEPS - 1) as f32;
            *slot = (linear_to_srgb(l) * 255.0).round().clamp(0.0, 255.0) as u8;
        }
        Self { to_linear, to_srgb }
    }

    #[inline]
    pub fn linear(&self, v: u8) -> f32 {
        self.to_linear[v as usize]
    }

    #[inline]
    pub fn srgb(&self, l: f32) -> u8 {
        let idx = (l.clamp(0.0, 1.0) * (LINEAR_STEPS - 1) as f32).round() as usize;
        self.to_srgb[idx]
    }

    /// Straight-alpha `src` (0xAARRGGBB) over opaque `dst` (0x00RRGGBB).
    #[inline]
    pub fn over(&self, dst: u32, src: u32) -> u32 {
        let (a, sr, sg, sb) = unpack_argb(src);
        match a {
            0 => dst,
            255 => src & 0x00FF_FFFF,
            _ => {
                let (_, dr, dg, db) = unpack_argb(dst);
                let t = a as f32 / 255.0;
                let mix = |s: u8, d: u8| self.srgb(t * self.linear(s) + (1.0 - t) * self.linear(d));
                pack_argb(0, mix(sr, dr), mix(sg, dg), mix(sb, db))
            }
        }
    }
}

impl Default for GammaLut {
    fn default() -> Self {
        Self::new()
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 { c / 12.92 } else { ((c + 0.055) / 1.055).powf(2.4) }
}

fn linear_to_srgb(l: f32) -> f32 {
    if l <= 0.003_130_8 { 12.92 * l } else { 1.055 * l.powf(1.0 / 2.4) - 0.055 }
}
