#![allow(dead_code)]

use anyhow::{bail, Result};
use bytes::Bytes;
use ndarray::{Array2, Array4};
use parking_lot::Mutex;
use spark_inference::inference::sam::{
    Embedding, ModelInput, ModelOutput, EMBEDDING_SHAPE, LOW_RES_MASK_SHAPE,
};
use spark_inference::SegmentEngine;
use spark_media::{Canvas, Image};
use spark_segment::embedding::{EmbeddingError, EmbeddingSource};
use spark_segment::helper::PredictionHelper;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Records every decoder input and marks the left half of the image as foreground.
#[derive(Default)]
pub struct RecordingEngine {
    pub calls: Mutex<Vec<ModelInput>>,
    pub fail: AtomicBool,
}

impl RecordingEngine {
    pub fn failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn last_call(&self) -> Option<ModelInput> {
        self.calls.lock().last().cloned()
    }
}

impl SegmentEngine for RecordingEngine {
    fn run(&self, input: &ModelInput) -> Result<ModelOutput> {
        if self.fail.load(Ordering::SeqCst) {
            bail!("decoder unavailable");
        }
        self.calls.lock().push(input.clone());

        let (height, width) = (input.image_size[0] as usize, input.image_size[1] as usize);
        let output = Array2::from_shape_fn((height, width), |(_, x)| {
            if x < width / 2 {
                4.0
            } else {
                -4.0
            }
        });

        Ok(ModelOutput {
            mask: Array4::from_elem(LOW_RES_MASK_SHAPE, 0.25),
            output,
        })
    }
}

/// Answers every fetch with the same embedding, or fails when it has none.
pub struct FixedSource(pub Option<Embedding>);

impl FixedSource {
    pub fn ok() -> Self {
        Self(Some(zero_embedding()))
    }

    pub fn offline() -> Self {
        Self(None)
    }
}

impl EmbeddingSource for FixedSource {
    async fn fetch(&self, _image: Bytes) -> Result<Embedding, EmbeddingError> {
        self.0
            .clone()
            .ok_or_else(|| EmbeddingError::Payload("offline".to_string()))
    }
}

pub fn zero_embedding() -> Embedding {
    Embedding::from_array(Array4::zeros(EMBEDDING_SHAPE)).unwrap()
}

/// Opaque grey PNG.
pub fn png(width: u32, height: u32) -> Bytes {
    let buffer = [128u8, 128, 128, 255].repeat((width * height) as usize);
    let image = Image::from_raw(width, height, buffer).unwrap();
    Bytes::from(image.encode_png().unwrap())
}

pub fn helper() -> (Arc<RecordingEngine>, PredictionHelper) {
    let engine = Arc::new(RecordingEngine::default());
    let helper = PredictionHelper::new(engine.clone(), Canvas::new().with_marker_radius(1));
    (engine, helper)
}
