use crate::Image;
use ::image::ImageFormat;
use anyhow::{Context, Result};
use std::io::Cursor;
use std::path::Path;

impl Image {
    /// Saves using the format implied by the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.inner
            .save(path)
            .with_context(|| format!("Failed to save image to {}", path.display()))
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        self.inner.write_to(&mut buffer, ImageFormat::Png)?;
        Ok(buffer.into_inner())
    }
}
