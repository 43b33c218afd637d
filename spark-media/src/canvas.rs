use crate::{Image, RGBA};
use ::image::imageops;
use anyhow::{ensure, Result};
use log::debug;
use rayon::prelude::*;

const DEFAULT_MARKER_RADIUS: u32 = 6;

/// Drawing surface sized to the native resolution of the image painted on it.
///
/// On-screen presentations may scale the surface, so pointer positions must go
/// through [`Canvas::to_image_coords`] before they are used as prompts.
#[derive(Debug, Clone)]
pub struct Canvas {
    surface: Image,
    marker_radius: u32,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    pub fn new() -> Self {
        Canvas {
            surface: Image::new_with_empty((0, 0)),
            marker_radius: DEFAULT_MARKER_RADIUS,
        }
    }

    pub fn with_marker_radius(mut self, radius: u32) -> Self {
        self.marker_radius = radius;
        self
    }

    pub fn width(&self) -> u32 {
        self.surface.get_width()
    }

    pub fn height(&self) -> u32 {
        self.surface.get_height()
    }

    pub fn snapshot(&self) -> &Image {
        &self.surface
    }

    /// True when every pixel is fully transparent.
    pub fn is_blank(&self) -> bool {
        self.surface
            .raw_data()
            .par_chunks_exact(4)
            .all(|pixel| pixel[3] == 0)
    }

    /// Resizes the surface to the image and draws it at the origin.
    pub fn paint_image(&mut self, image: &Image) {
        debug!("Painting {}x{} image", image.get_width(), image.get_height());
        self.surface = image.clone();
    }

    /// Wipes every pixel, keeping the current dimensions.
    pub fn clear(&mut self) {
        self.surface
            .frame_mut()
            .par_chunks_exact_mut(4)
            .for_each(|pixel| pixel.copy_from_slice(&RGBA::TRANSPARENT.to_array()));
    }

    /// Alpha-composites `overlay` over the surface.
    pub fn overlay(&mut self, overlay: &Image) -> Result<()> {
        ensure!(
            overlay.get_size() == self.surface.get_size(),
            "Overlay of {:?} does not match canvas of {:?}",
            overlay.get_size(),
            self.surface.get_size()
        );
        imageops::overlay(self.surface.frame_mut(), overlay.frame(), 0, 0);
        Ok(())
    }

    /// Draws a filled disc centred on `(x, y)`, clipped to the surface.
    ///
    /// Markers entirely outside the surface, or with a non-finite centre, are skipped.
    pub fn draw_marker(&mut self, x: f32, y: f32, color: RGBA) {
        let radius = self.marker_radius as i64;
        let (width, height) = (self.width() as i64, self.height() as i64);
        let reach = self.marker_radius as f32;
        let visible = |value: f32, extent: i64| {
            value.is_finite() && value >= -reach && value <= extent as f32 + reach
        };
        if !visible(x, width) || !visible(y, height) {
            debug!("Skipping marker at ({}, {}) outside the canvas", x, y);
            return;
        }

        let (cx, cy) = (x.round() as i64, y.round() as i64);
        let frame = self.surface.frame_mut();

        for py in (cy - radius).max(0)..=(cy + radius).min(height - 1) {
            for px in (cx - radius).max(0)..=(cx + radius).min(width - 1) {
                let (dx, dy) = (px - cx, py - cy);
                if dx * dx + dy * dy <= radius * radius {
                    frame.put_pixel(px as u32, py as u32, color.into());
                }
            }
        }
    }

    /// Outlines the box spanning `(x, y)` to `(x + width, y + height)`, clipped to the surface.
    pub fn draw_box(&mut self, x: f32, y: f32, width: f32, height: f32, color: RGBA) {
        if ![x, y, width, height].iter().all(|value| value.is_finite()) {
            debug!("Skipping non-finite box");
            return;
        }
        let (surface_width, surface_height) = (self.width() as i64, self.height() as i64);
        let clamp = |value: f32, extent: i64| value.round().clamp(-1.0, extent as f32) as i64;
        let (left, right) = (
            clamp(x.min(x + width), surface_width),
            clamp(x.max(x + width), surface_width),
        );
        let (top, bottom) = (
            clamp(y.min(y + height), surface_height),
            clamp(y.max(y + height), surface_height),
        );

        let frame = self.surface.frame_mut();
        let mut put = |px: i64, py: i64| {
            if (0..surface_width).contains(&px) && (0..surface_height).contains(&py) {
                frame.put_pixel(px as u32, py as u32, color.into());
            }
        };
        for px in left..=right {
            put(px, top);
            put(px, bottom);
        }
        for py in top..=bottom {
            put(left, py);
            put(right, py);
        }
    }

    /// Ratio between native and displayed width; `1.0` when nothing is displayed.
    pub fn display_scale(&self, displayed_width: f32) -> f32 {
        if displayed_width > 0.0 && self.width() > 0 {
            self.width() as f32 / displayed_width
        } else {
            1.0
        }
    }

    pub fn to_image_coords(&self, x: f32, y: f32, displayed_width: f32) -> (f32, f32) {
        let scale = self.display_scale(displayed_width);
        (x * scale, y * scale)
    }
}
