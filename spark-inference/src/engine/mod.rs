use crate::inference::sam::{ModelInput, ModelOutput};
use anyhow::Result;

pub mod inference_engine;

/// Black-box mask decoder: named input tensors in, named output tensors out.
pub trait SegmentEngine: Send + Sync {
    fn run(&self, input: &ModelInput) -> Result<ModelOutput>;
}

impl<T: SegmentEngine + ?Sized> SegmentEngine for std::sync::Arc<T> {
    fn run(&self, input: &ModelInput) -> Result<ModelOutput> {
        (**self).run(input)
    }
}
