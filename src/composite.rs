// Stack the card for display: hidden content at the bottom, then the foil
// mask, then the particle layer, blended in linear light.
use crate::error::Error;
use crate::gamma::GammaLut;
use crate::types::{FrameBuffer, RgbaBuffer};

pub fn compose(
    screen: &mut FrameBuffer,
    content: &FrameBuffer,
    layers: &[&RgbaBuffer],
    lut: &GammaLut,
) -> Result<(), Error> {
    if screen.width != content.width || screen.height != content.height {
        return Err(Error::Composite(format!(
            "content {}x{} vs screen {}x{}",
            content.width, content.height, screen.width, screen.height
        )));
    }
    for (i, layer) in layers.iter().enumerate() {
        if layer.width != screen.width || layer.height != screen.height {
            return Err(Error::Composite(format!(
                "layer {i} is {}x{}, screen is {}x{}",
                layer.width, layer.height, screen.width, screen.height
            )));
        }
    }

    screen.pixels.copy_from_slice(&content.pixels);
    for layer in layers {
        for (dst, &src) in screen.pixels.iter_mut().zip(&layer.pixels) {
            *dst = lut.over(*dst, src);
        }
    }
    Ok(())
}
