use super::{Embedding, ModelInput, ModelScale, LOW_RES_MASK_SHAPE};
use crate::error::CodecError;
use crate::utils::graph::{BoundingBox, ClickPoint};
use ndarray::{array, Array2, Array3, Array4};

/// Label of the padding point appended when no box is supplied.
pub const PADDING_LABEL: f32 = -1.0;
pub const BOX_TOP_LEFT_LABEL: f32 = 2.0;
pub const BOX_BOTTOM_RIGHT_LABEL: f32 = 3.0;

/// Builds the decoder input for the accumulated clicks.
///
/// Returns `None` for an empty click list; no inference should be issued then.
/// The coordinate and label tensors always carry one more entry than there are
/// clicks: a `(0, 0)` point labelled `-1`. When `previous_mask` is given it is
/// passed as the prior and the has-prior flag is set to `1`.
pub fn encode(
    clicks: &[ClickPoint],
    embedding: &Embedding,
    scale: &ModelScale,
    previous_mask: Option<&Array4<f32>>,
) -> Result<Option<ModelInput>, CodecError> {
    encode_with_box(clicks, None, embedding, scale, previous_mask)
}

/// Like [`encode`], with an optional box prompt.
///
/// A box contributes its two corners (labels `2` and `3`) and replaces the
/// padding point.
pub fn encode_with_box(
    clicks: &[ClickPoint],
    bbox: Option<BoundingBox<f32>>,
    embedding: &Embedding,
    scale: &ModelScale,
    previous_mask: Option<&Array4<f32>>,
) -> Result<Option<ModelInput>, CodecError> {
    if clicks.is_empty() && bbox.is_none() {
        return Ok(None);
    }

    let mut coords = Vec::with_capacity((clicks.len() + 2) * 2);
    let mut labels = Vec::with_capacity(clicks.len() + 2);

    for click in clicks {
        coords.extend([click.x * scale.sam_scale, click.y * scale.sam_scale]);
        labels.push(click.kind.label());
    }

    match bbox {
        Some(bbox) => {
            let (top_left, bottom_right) = (bbox.top_left(), bbox.bottom_right());
            coords.extend([top_left.x * scale.sam_scale, top_left.y * scale.sam_scale]);
            coords.extend([
                bottom_right.x * scale.sam_scale,
                bottom_right.y * scale.sam_scale,
            ]);
            labels.extend([BOX_TOP_LEFT_LABEL, BOX_BOTTOM_RIGHT_LABEL]);
        }
        None => {
            coords.extend([0.0, 0.0]);
            labels.push(PADDING_LABEL);
        }
    }

    let count = labels.len();
    let point_coords = Array3::from_shape_vec((1, count, 2), coords)?;
    let point_labels = Array2::from_shape_vec((1, count), labels)?;

    let (last_pred_mask, has_last_pred) = match previous_mask {
        Some(mask) if mask.shape() == LOW_RES_MASK_SHAPE => (mask.clone(), array![1_f32]),
        Some(mask) => {
            return Err(CodecError::TensorShape {
                expected: LOW_RES_MASK_SHAPE.to_vec(),
                actual: mask.shape().to_vec(),
            })
        }
        None => (Array4::zeros(LOW_RES_MASK_SHAPE), array![0_f32]),
    };

    Ok(Some(ModelInput {
        image_embeddings: embedding.clone(),
        point_coords,
        point_labels,
        image_size: array![scale.height as f32, scale.width as f32],
        last_pred_mask,
        has_last_pred,
    }))
}
