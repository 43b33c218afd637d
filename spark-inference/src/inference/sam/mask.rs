use crate::error::CodecError;
use crate::inference::linear_interpolate;
use bitvec::prelude::*;
use log::debug;
use ndarray::ArrayView2;
use rayon::prelude::*;
use spark_media::{Image, RGBA};

/// Translucent blue painted over foreground pixels.
pub const DEFAULT_MASK_COLOR: RGBA = RGBA(0, 114, 189, 128);

/// A pixel belongs to the mask when its score is strictly positive.
/// Zero, negative zero and NaN are background.
#[inline]
pub fn is_foreground(score: f32) -> bool {
    score > 0.0
}

pub fn threshold_mask(scores: &[f32]) -> BitVec {
    scores.iter().map(|&score| is_foreground(score)).collect()
}

/// Converts a row-major score map into an RGBA overlay of `width x height`.
pub fn decode(scores: &[f32], width: u32, height: u32) -> Result<Image, CodecError> {
    decode_with_color(scores, width, height, DEFAULT_MASK_COLOR)
}

pub fn decode_with_color(
    scores: &[f32],
    width: u32,
    height: u32,
    color: RGBA,
) -> Result<Image, CodecError> {
    let length_error = || CodecError::ScoreLength {
        width,
        height,
        actual: scores.len(),
    };
    if scores.len() != width as usize * height as usize {
        return Err(length_error());
    }

    let (foreground, background) = (color.to_array(), RGBA::TRANSPARENT.to_array());
    let mut buffer = vec![0u8; scores.len() * 4];
    buffer
        .par_chunks_exact_mut(4)
        .zip(scores.par_iter())
        .for_each(|(pixel, &score)| {
            pixel.copy_from_slice(if is_foreground(score) {
                &foreground
            } else {
                &background
            })
        });

    Image::from_raw(width, height, buffer).ok_or_else(length_error)
}

/// Row-major scores of `width x height`, bilinearly resized when the map differs.
pub fn resize_scores(scores: ArrayView2<f32>, width: u32, height: u32) -> Vec<f32> {
    let target = (height as usize, width as usize);
    if scores.dim() == target {
        scores.iter().copied().collect()
    } else {
        debug!("Resizing mask from {:?} to {:?}", scores.dim(), target);
        linear_interpolate(scores, target).into_iter().collect()
    }
}

/// Decodes a score map of any resolution, resizing it to `width x height` first.
pub fn decode_resized(
    scores: ArrayView2<f32>,
    width: u32,
    height: u32,
    color: RGBA,
) -> Result<Image, CodecError> {
    decode_with_color(&resize_scores(scores, width, height), width, height, color)
}
