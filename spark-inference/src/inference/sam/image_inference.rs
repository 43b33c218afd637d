use super::{ModelInput, ModelOutput, TensorNames, LOW_RES_MASK_SHAPE};
use crate::engine::inference_engine::{ExecutionProvider, OnnxSession};
use crate::engine::SegmentEngine;
use anyhow::{ensure, Result};
use log::{debug, info};
use ndarray::prelude::*;
use ort::inputs;
use ort::value::TensorRef;
use parking_lot::Mutex;
use std::path::Path;
use std::time::Instant;

/// Mask decoder backed by an ONNX Runtime session.
pub struct SamInteractiveSession {
    pub(super) decoder: Mutex<OnnxSession>,
    pub(super) names: TensorNames,
}

impl SamInteractiveSession {
    pub fn new(
        model_path: impl AsRef<Path>,
        executor: ExecutionProvider,
        intra_threads: usize,
        names: TensorNames,
    ) -> Result<Self> {
        let decoder = OnnxSession::new(model_path, executor, intra_threads)?;
        info!("SAM interactive decoder session created on {:?}", decoder.executor());

        Ok(Self {
            decoder: Mutex::new(decoder),
            names,
        })
    }
}

impl SegmentEngine for SamInteractiveSession {
    fn run(&self, input: &ModelInput) -> Result<ModelOutput> {
        let names = &self.names;
        let started = Instant::now();

        let mut decoder = self.decoder.lock();
        let outputs = decoder.run(inputs![
            names.image_embeddings  => TensorRef::from_array_view(input.image_embeddings.view())?,
            names.point_coords      => TensorRef::from_array_view(input.point_coords.view())?,
            names.point_labels      => TensorRef::from_array_view(input.point_labels.view())?,
            names.image_size        => TensorRef::from_array_view(input.image_size.view())?,
            names.prior_mask        => TensorRef::from_array_view(input.last_pred_mask.view())?,
            names.has_prior         => TensorRef::from_array_view(input.has_last_pred.view())?,
        ])?;

        let best = match names.iou_predictions {
            Some(name) => {
                let iou = outputs[name].try_extract_array::<f32>()?;
                best_candidate(iou.iter().copied())
            }
            None => 0,
        };

        let low_res = outputs[names.low_res_mask]
            .try_extract_array::<f32>()?
            .into_dimensionality::<Ix4>()?;
        let scores = outputs[names.scores]
            .try_extract_array::<f32>()?
            .into_dimensionality::<Ix4>()?;
        ensure!(
            best < low_res.shape()[1] && best < scores.shape()[1],
            "Mask candidate {} out of range for {:?} / {:?}",
            best,
            low_res.shape(),
            scores.shape()
        );

        let mask = low_res
            .slice(s![0..1, best..best + 1, .., ..])
            .to_owned()
            .into_shape_with_order(LOW_RES_MASK_SHAPE)?;
        let output = scores.slice(s![0, best, .., ..]).to_owned();

        debug!(
            "Decoder ran with {} points (prior: {}) in {:?}, score map {:?}",
            input.point_count(),
            input.has_prior(),
            started.elapsed(),
            output.dim()
        );

        Ok(ModelOutput { mask, output })
    }
}

/// Index of the highest IoU prediction; NaN never wins.
pub(crate) fn best_candidate(iou: impl Iterator<Item = f32>) -> usize {
    iou.enumerate()
        .filter(|(_, score)| !score.is_nan())
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_candidate_picks_highest_iou() {
        assert_eq!(best_candidate([0.2, 0.9, 0.5].into_iter()), 1);
        assert_eq!(best_candidate([f32::NAN, 0.1].into_iter()), 1);
        assert_eq!(best_candidate(std::iter::empty()), 0);
    }
}
