use crate::{Image, RGBA};
use ::image::RgbaImage;

impl Image {
    pub fn frame(&self) -> &RgbaImage {
        &self.inner
    }

    pub fn frame_mut(&mut self) -> &mut RgbaImage {
        &mut self.inner
    }

    pub fn raw_data(&self) -> &[u8] {
        self.inner.as_raw()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<RGBA> {
        self.inner.get_pixel_checked(x, y).map(|pixel| RGBA::from(pixel.0))
    }
}
