use super::EMBEDDING_SHAPE;
use crate::error::CodecError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ndarray::{Array4, ArrayView4};
use std::mem::size_of;
use std::sync::Arc;

/// Image embedding shared by every click on the same image.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding(Arc<Array4<f32>>);

impl Embedding {
    /// Decodes a base64 blob of little-endian `f32` values.
    pub fn from_base64(blob: &str) -> Result<Self, CodecError> {
        let bytes = STANDARD.decode(blob.trim())?;
        Self::from_le_bytes(&bytes)
    }

    pub fn from_le_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let expected = EMBEDDING_SHAPE.iter().product::<usize>() * size_of::<f32>();
        if bytes.len() != expected {
            return Err(CodecError::EmbeddingLength {
                expected,
                actual: bytes.len(),
            });
        }

        let values = bytes
            .chunks_exact(size_of::<f32>())
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect::<Vec<_>>();

        Ok(Self(Arc::new(Array4::from_shape_vec(EMBEDDING_SHAPE, values)?)))
    }

    pub fn from_array(array: Array4<f32>) -> Result<Self, CodecError> {
        if array.shape() != EMBEDDING_SHAPE {
            return Err(CodecError::TensorShape {
                expected: EMBEDDING_SHAPE.to_vec(),
                actual: array.shape().to_vec(),
            });
        }
        Ok(Self(Arc::new(array)))
    }

    pub fn view(&self) -> ArrayView4<'_, f32> {
        self.0.view()
    }
}
