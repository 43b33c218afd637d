use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Embedding is not valid base64: {0}")]
    EmbeddingBase64(#[from] base64::DecodeError),

    #[error("Embedding holds {actual} bytes, expected {expected}")]
    EmbeddingLength { expected: usize, actual: usize },

    #[error("Tensor has shape {actual:?}, expected {expected:?}")]
    TensorShape {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Score map holds {actual} values, expected {width}x{height}")]
    ScoreLength {
        width: u32,
        height: u32,
        actual: usize,
    },

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
}
