use ::image::RgbaImage;

/// Decoded picture held as straight (non-premultiplied) RGBA8.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub(crate) inner: RgbaImage,
}

impl Image {
    pub fn new_with_empty(size: (u32, u32)) -> Self {
        Image {
            inner: RgbaImage::new(size.0, size.1),
        }
    }

    /// Wraps a packed RGBA8 buffer; `None` when it is too small for the size.
    pub fn from_raw(width: u32, height: u32, buffer: Vec<u8>) -> Option<Self> {
        RgbaImage::from_raw(width, height, buffer).map(Image::from_rgba)
    }

    pub fn from_rgba(inner: RgbaImage) -> Self {
        Image { inner }
    }
}
