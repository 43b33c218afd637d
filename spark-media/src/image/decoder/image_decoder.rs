use crate::Image;
use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::debug;

const BASE64_MARKER: &str = ";base64,";

impl Image {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let format = ::image::guess_format(bytes).context("Unrecognised image format")?;
        let decoded = ::image::load_from_memory_with_format(bytes, format)?;
        debug!(
            "Decoded {:?} image of {}x{}",
            format,
            decoded.width(),
            decoded.height()
        );

        Ok(Image::from_rgba(decoded.into_rgba8()))
    }
}

/// Extracts the binary payload of a `data:<mime>;base64,<payload>` URI.
pub fn data_uri_to_binary(uri: &str) -> Result<Vec<u8>> {
    let index = uri
        .find(BASE64_MARKER)
        .ok_or(anyhow!("Data URI is not base64 encoded"))?;
    let payload = &uri[index + BASE64_MARKER.len()..];

    Ok(STANDARD.decode(payload.trim())?)
}
