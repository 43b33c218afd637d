use ndarray::{Array1, Array2, Array3, Array4};

pub mod embedding;
pub mod image_inference;
pub mod mask;
pub mod prompt;

pub use embedding::Embedding;

/// `1 x 256 x 64 x 64` image embedding.
pub const EMBEDDING_SHAPE: [usize; 4] = [1, 256, 64, 64];
/// `1 x 1 x 256 x 256` low-resolution mask fed back as a prior.
pub const LOW_RES_MASK_SHAPE: [usize; 4] = [1, 1, 256, 256];

/// Input bundle of the mask decoder, one entry per named tensor.
#[derive(Debug, Clone)]
pub struct ModelInput {
    pub image_embeddings: Embedding,
    pub point_coords: Array3<f32>,
    pub point_labels: Array2<f32>,
    /// `[height, width]`
    pub image_size: Array1<f32>,
    pub last_pred_mask: Array4<f32>,
    pub has_last_pred: Array1<f32>,
}

impl ModelInput {
    pub fn point_count(&self) -> usize {
        self.point_labels.len()
    }

    pub fn has_prior(&self) -> bool {
        self.has_last_pred[0] > 0.0
    }
}

#[derive(Debug, Clone)]
pub struct ModelOutput {
    /// Low-resolution mask, the prior of the next call.
    pub mask: Array4<f32>,
    /// Full-resolution per-pixel scores, `height x width`.
    pub output: Array2<f32>,
}

/// Image dimensions plus the factor applied to click coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ModelScale {
    pub height: u32,
    pub width: u32,
    pub sam_scale: f32,
}

impl ModelScale {
    /// Prompts are passed in source-image pixels.
    pub fn new(height: u32, width: u32) -> Self {
        Self {
            height,
            width,
            sam_scale: 1.0,
        }
    }

    /// Prompts are rescaled as if the longest side were resized to `target`.
    pub fn longest_side(height: u32, width: u32, target: u32) -> Self {
        let longest = height.max(width).max(1);
        Self {
            height,
            width,
            sam_scale: target as f32 / longest as f32,
        }
    }
}

/// Names of the decoder's input and output tensors.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TensorNames {
    pub image_embeddings: &'static str,
    pub point_coords: &'static str,
    pub point_labels: &'static str,
    pub image_size: &'static str,
    pub prior_mask: &'static str,
    pub has_prior: &'static str,

    pub low_res_mask: &'static str,
    pub scores: &'static str,
    pub iou_predictions: Option<&'static str>,
}

impl TensorNames {
    /// Interactive decoder that reports `{mask, output}`.
    pub const fn interactive() -> Self {
        Self {
            image_embeddings: "image_embeddings",
            point_coords: "point_coords",
            point_labels: "point_labels",
            image_size: "image_size",
            prior_mask: "last_pred_mask",
            has_prior: "has_last_pred",
            low_res_mask: "mask",
            scores: "output",
            iou_predictions: None,
        }
    }

    /// Stock SAM ONNX export.
    pub const fn sam_export() -> Self {
        Self {
            image_embeddings: "image_embeddings",
            point_coords: "point_coords",
            point_labels: "point_labels",
            image_size: "orig_im_size",
            prior_mask: "mask_input",
            has_prior: "has_mask_input",
            low_res_mask: "low_res_masks",
            scores: "masks",
            iou_predictions: Some("iou_predictions"),
        }
    }
}

impl Default for TensorNames {
    fn default() -> Self {
        Self::interactive()
    }
}
