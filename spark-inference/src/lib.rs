pub mod engine;
pub mod error;
pub mod inference;
pub mod utils;

pub use engine::SegmentEngine;
pub use error::CodecError;
