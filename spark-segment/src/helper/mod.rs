mod event;
mod status;

pub use event::{HelperEvent, Listener};
pub use status::EmbeddingStatus;

use crate::config::RenderConfig;
use crate::embedding::{EmbeddingError, EmbeddingSource};
use anyhow::Result;
use bitvec::vec::BitVec;
use bytes::Bytes;
use event::Listeners;
use log::{debug, error, info, warn};
use ndarray::Array4;
use serde::{Deserialize, Serialize};
use spark_inference::inference::sam::mask::{decode_with_color, resize_scores, threshold_mask};
use spark_inference::inference::sam::prompt::encode_with_box;
use spark_inference::inference::sam::{Embedding, ModelScale};
use spark_inference::utils::graph::{BoundingBox, ClickKind, ClickPoint};
use spark_inference::SegmentEngine;
use spark_media::{Canvas, Image, RGBA};
use std::sync::Arc;

/// Identifies one image load so a late embedding for a replaced image is dropped.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickOutcome {
    /// No embedding is ready; nothing ran.
    Ignored,
    /// The mask and canvas were refreshed.
    Updated,
    /// The engine or codec failed; state is as before the click.
    InferenceFailed,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderOptions {
    pub mask_color: RGBA,
    pub add_marker_color: RGBA,
    pub remove_marker_color: RGBA,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions::from(&RenderConfig::default())
    }
}

impl From<&RenderConfig> for RenderOptions {
    fn from(value: &RenderConfig) -> Self {
        Self {
            mask_color: value.mask_color(),
            add_marker_color: value.add_marker_color(),
            remove_marker_color: value.remove_marker_color(),
        }
    }
}

/// Interaction state around one loaded image: its embedding, the accumulated
/// clicks, the last low-resolution mask and the drawing surface.
pub struct PredictionHelper {
    engine: Arc<dyn SegmentEngine>,
    canvas: Canvas,
    render: RenderOptions,
    prompt_longest_side: Option<u32>,

    image: Option<Image>,
    embedding: Option<Embedding>,
    status: EmbeddingStatus,
    clicks: Vec<ClickPoint>,
    prompt_box: Option<BoundingBox<f32>>,
    last_mask: Option<Array4<f32>>,
    mask_bits: Option<BitVec>,
    overlay: Option<Image>,

    generation: u64,
    listeners: Listeners,
}

impl PredictionHelper {
    pub fn new(engine: Arc<dyn SegmentEngine>, canvas: Canvas) -> Self {
        Self {
            engine,
            canvas,
            render: RenderOptions::default(),
            prompt_longest_side: None,
            image: None,
            embedding: None,
            status: EmbeddingStatus::NotLoaded,
            clicks: Vec::new(),
            prompt_box: None,
            last_mask: None,
            mask_bits: None,
            overlay: None,
            generation: 0,
            listeners: Listeners::default(),
        }
    }

    pub fn with_render_options(mut self, render: RenderOptions) -> Self {
        self.render = render;
        self
    }

    pub fn with_prompt_longest_side(mut self, longest_side: Option<u32>) -> Self {
        self.prompt_longest_side = longest_side;
        self
    }

    pub fn subscribe(&mut self, listener: impl Fn(&HelperEvent) + Send + Sync + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn status(&self) -> EmbeddingStatus {
        self.status
    }

    pub fn clicks(&self) -> &[ClickPoint] {
        &self.clicks
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn prompt_box(&self) -> Option<BoundingBox<f32>> {
        self.prompt_box
    }

    pub fn image(&self) -> Option<&Image> {
        self.image.as_ref()
    }

    pub fn embedding(&self) -> Option<&Embedding> {
        self.embedding.as_ref()
    }

    pub fn last_mask(&self) -> Option<&Array4<f32>> {
        self.last_mask.as_ref()
    }

    pub fn overlay(&self) -> Option<&Image> {
        self.overlay.as_ref()
    }

    /// Thresholded scores of the last prediction, row-major at image resolution.
    pub fn mask_bits(&self) -> Option<&BitVec> {
        self.mask_bits.as_ref()
    }

    /// Decodes and paints the image right away, then waits for its embedding.
    pub async fn load_image<S: EmbeddingSource>(
        &mut self,
        bytes: Bytes,
        source: &S,
    ) -> Result<EmbeddingStatus> {
        let ticket = self.begin_load(&bytes)?;
        let result = source.fetch(bytes).await;
        self.finish_load(ticket, result);
        Ok(self.status)
    }

    /// Paints the new image and resets every per-image field.
    ///
    /// The previous state is kept when the bytes cannot be decoded.
    pub fn begin_load(&mut self, bytes: &[u8]) -> Result<LoadTicket> {
        let image = Image::from_bytes(bytes)?;
        info!("Loaded {}x{} image", image.get_width(), image.get_height());

        self.generation += 1;
        self.image = Some(image);
        self.embedding = None;
        self.reset_prompts();
        self.repaint();
        self.set_status(EmbeddingStatus::Loading);

        Ok(LoadTicket {
            generation: self.generation,
        })
    }

    /// Stores the embedding fetched for `ticket`. Returns false when the image
    /// was replaced or removed in the meantime.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Embedding, EmbeddingError>,
    ) -> bool {
        if ticket.generation != self.generation || self.image.is_none() {
            warn!(
                "Discarding embedding of load {} (current load {})",
                ticket.generation, self.generation
            );
            return false;
        }

        match result {
            Ok(embedding) => {
                self.embedding = Some(embedding);
                self.set_status(EmbeddingStatus::Loaded);
            }
            Err(e) => {
                error!("Failed to get embedding: {}", e);
                self.set_status(EmbeddingStatus::Failed);
            }
        }
        true
    }

    /// Adds a point prompt and refreshes the mask.
    pub fn click(&mut self, click: ClickPoint) -> ClickOutcome {
        let Some(embedding) = self.ready_embedding() else {
            return ClickOutcome::Ignored;
        };

        self.clicks.push(click);
        match self.predict(&embedding) {
            Ok(()) => {
                self.listeners
                    .emit(HelperEvent::ClicksChanged(self.clicks.len()));
                self.repaint();
                ClickOutcome::Updated
            }
            Err(e) => {
                self.clicks.pop();
                error!("Inference failed: {:#}", e);
                ClickOutcome::InferenceFailed
            }
        }
    }

    /// Same as [`click`](Self::click) for a position on a surface displayed
    /// `displayed_width` pixels wide.
    pub fn click_on_display(
        &mut self,
        x: f32,
        y: f32,
        displayed_width: f32,
        kind: ClickKind,
    ) -> ClickOutcome {
        let (x, y) = self.canvas.to_image_coords(x, y, displayed_width);
        self.click(ClickPoint::new(x, y, kind))
    }

    /// Sets the box prompt, replacing any previous one, and refreshes the mask.
    pub fn set_box(&mut self, prompt_box: BoundingBox<f32>) -> ClickOutcome {
        let Some(embedding) = self.ready_embedding() else {
            return ClickOutcome::Ignored;
        };

        let previous = self.prompt_box.replace(prompt_box);
        match self.predict(&embedding) {
            Ok(()) => {
                self.repaint();
                ClickOutcome::Updated
            }
            Err(e) => {
                self.prompt_box = previous;
                error!("Inference failed: {:#}", e);
                ClickOutcome::InferenceFailed
            }
        }
    }

    /// Same as [`set_box`](Self::set_box) for a box drawn on a surface displayed
    /// `displayed_width` pixels wide.
    pub fn box_on_display(
        &mut self,
        prompt_box: BoundingBox<f32>,
        displayed_width: f32,
    ) -> ClickOutcome {
        let scale = self.canvas.display_scale(displayed_width);
        self.set_box(BoundingBox {
            x: prompt_box.x * scale,
            y: prompt_box.y * scale,
            width: prompt_box.width * scale,
            height: prompt_box.height * scale,
        })
    }

    /// Drops every prompt and the mask but keeps the embedding.
    pub fn clear(&mut self) {
        self.reset_prompts();
        self.repaint();
    }

    /// Clears the canvas and forgets the image together with its embedding.
    pub fn remove_image(&mut self) {
        self.generation += 1;
        self.image = None;
        self.embedding = None;
        self.reset_prompts();
        self.canvas.clear();
        self.listeners.emit(HelperEvent::Repainted);
        self.set_status(EmbeddingStatus::NotLoaded);
    }

    fn predict(&mut self, embedding: &Embedding) -> Result<()> {
        let (width, height) = self.canvas_size()?;
        let scale = match self.prompt_longest_side {
            Some(side) => ModelScale::longest_side(height, width, side),
            None => ModelScale::new(height, width),
        };

        let Some(input) = encode_with_box(
            &self.clicks,
            self.prompt_box,
            embedding,
            &scale,
            self.last_mask.as_ref(),
        )?
        else {
            return Ok(());
        };
        let output = self.engine.run(&input)?;
        let scores = resize_scores(output.output.view(), width, height);
        let overlay = decode_with_color(&scores, width, height, self.render.mask_color)?;

        self.last_mask = Some(output.mask);
        self.mask_bits = Some(threshold_mask(&scores));
        self.overlay = Some(overlay);
        Ok(())
    }

    fn ready_embedding(&self) -> Option<Embedding> {
        match (&self.embedding, self.status.accepts_clicks()) {
            (Some(embedding), true) => Some(embedding.clone()),
            _ => {
                debug!("Ignoring prompt while embedding is {}", self.status);
                None
            }
        }
    }

    fn canvas_size(&self) -> Result<(u32, u32)> {
        self.image
            .as_ref()
            .map(Image::get_size)
            .ok_or_else(|| anyhow::anyhow!("No image is loaded"))
    }

    fn reset_prompts(&mut self) {
        let had_clicks = !self.clicks.is_empty();
        self.clicks.clear();
        self.prompt_box = None;
        self.last_mask = None;
        self.mask_bits = None;
        self.overlay = None;
        if had_clicks {
            self.listeners.emit(HelperEvent::ClicksChanged(0));
        }
    }

    /// Image, then mask, then the box outline and one marker per click.
    fn repaint(&mut self) {
        let Some(image) = &self.image else {
            return;
        };
        self.canvas.paint_image(image);

        if let Some(overlay) = &self.overlay {
            if let Err(e) = self.canvas.overlay(overlay) {
                warn!("Skipping stale overlay: {}", e);
            }
        }

        if let Some(prompt_box) = self.prompt_box {
            self.canvas.draw_box(
                prompt_box.x,
                prompt_box.y,
                prompt_box.width,
                prompt_box.height,
                self.render.add_marker_color,
            );
        }

        for click in &self.clicks {
            let color = match click.kind {
                ClickKind::Add => self.render.add_marker_color,
                ClickKind::Remove => self.render.remove_marker_color,
            };
            self.canvas.draw_marker(click.x, click.y, color);
        }
        self.listeners.emit(HelperEvent::Repainted);
    }

    fn set_status(&mut self, status: EmbeddingStatus) {
        if self.status != status {
            info!("Embedding status: {} -> {}", self.status, status);
            self.status = status;
            self.listeners.emit(HelperEvent::StatusChanged(status));
        }
    }
}
