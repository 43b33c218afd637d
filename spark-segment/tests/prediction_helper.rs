mod common;

use common::{helper, png, zero_embedding, FixedSource};
use ndarray::array;
use parking_lot::Mutex;
use spark_inference::inference::sam::mask::DEFAULT_MASK_COLOR;
use spark_inference::utils::graph::{BoundingBox, ClickKind, ClickPoint};
use spark_media::RGBA;
use spark_segment::helper::{ClickOutcome, EmbeddingStatus, HelperEvent, RenderOptions};
use std::sync::Arc;

const GREY: RGBA = RGBA(128, 128, 128, 255);

#[test]
fn clicks_are_ignored_without_an_image() {
    let (engine, mut helper) = helper();

    assert_eq!(helper.status(), EmbeddingStatus::NotLoaded);
    assert_eq!(helper.click(ClickPoint::add(1.0, 1.0)), ClickOutcome::Ignored);
    assert!(helper.clicks().is_empty());
    assert_eq!(engine.call_count(), 0);
}

#[tokio::test]
async fn failed_embedding_keeps_image_but_ignores_clicks() {
    let (engine, mut helper) = helper();

    let status = helper.load_image(png(8, 4), &FixedSource::offline()).await.unwrap();
    assert_eq!(status, EmbeddingStatus::Failed);
    assert_eq!(helper.canvas().snapshot().get_size(), (8, 4));
    assert_eq!(helper.canvas().snapshot().pixel(7, 3), Some(GREY));

    assert_eq!(helper.click(ClickPoint::add(1.0, 1.0)), ClickOutcome::Ignored);
    assert_eq!(engine.call_count(), 0);
}

#[tokio::test]
async fn first_click_sends_padded_prompt_without_prior() {
    let (engine, mut helper) = helper();
    let status = helper.load_image(png(8, 4), &FixedSource::ok()).await.unwrap();
    assert_eq!(status, EmbeddingStatus::Loaded);

    assert_eq!(helper.click(ClickPoint::add(2.0, 1.0)), ClickOutcome::Updated);

    let input = engine.last_call().unwrap();
    assert_eq!(input.point_coords, array![[[2.0_f32, 1.0], [0.0, 0.0]]]);
    assert_eq!(input.point_labels, array![[1.0_f32, -1.0]]);
    assert_eq!(input.image_size, array![4.0_f32, 8.0]);
    assert_eq!(input.has_last_pred, array![0.0_f32]);
    assert!(input.last_pred_mask.iter().all(|&v| v == 0.0));

    let bits = helper.mask_bits().unwrap().clone();
    assert_eq!(bits.len(), 32);
    assert_eq!(bits.count_ones(), 16);
    assert_eq!(helper.overlay().unwrap().pixel(0, 3), Some(DEFAULT_MASK_COLOR));
    assert!(helper.last_mask().is_some());

    let canvas = helper.canvas().snapshot();
    assert_eq!(canvas.pixel(7, 3), Some(GREY));
    assert_ne!(canvas.pixel(0, 3), Some(GREY));
}

#[tokio::test]
async fn later_clicks_carry_the_previous_mask() {
    let (engine, mut helper) = helper();
    helper.load_image(png(8, 4), &FixedSource::ok()).await.unwrap();

    helper.click(ClickPoint::add(2.0, 1.0));
    assert_eq!(helper.click(ClickPoint::remove(6.0, 2.0)), ClickOutcome::Updated);

    let input = engine.last_call().unwrap();
    assert_eq!(
        input.point_coords,
        array![[[2.0_f32, 1.0], [6.0, 2.0], [0.0, 0.0]]]
    );
    assert_eq!(input.point_labels, array![[1.0_f32, 0.0, -1.0]]);
    assert_eq!(input.has_last_pred, array![1.0_f32]);
    assert!(input.last_pred_mask.iter().all(|&v| v == 0.25));
    assert_eq!(helper.clicks().len(), 2);
}

#[tokio::test]
async fn prompt_coordinates_follow_the_longest_side() {
    let (engine, helper) = helper();
    let mut helper = helper.with_prompt_longest_side(Some(16));
    helper.load_image(png(8, 4), &FixedSource::ok()).await.unwrap();

    helper.click(ClickPoint::add(2.0, 1.0));

    let input = engine.last_call().unwrap();
    assert_eq!(input.point_coords, array![[[4.0_f32, 2.0], [0.0, 0.0]]]);
    assert_eq!(input.image_size, array![4.0_f32, 8.0]);
}

#[test]
fn stale_embedding_is_discarded() {
    let (_, mut helper) = helper();

    let first = helper.begin_load(&png(8, 4)).unwrap();
    let second = helper.begin_load(&png(4, 4)).unwrap();

    assert!(!helper.finish_load(first, Ok(zero_embedding())));
    assert_eq!(helper.status(), EmbeddingStatus::Loading);
    assert!(helper.embedding().is_none());

    assert!(helper.finish_load(second, Ok(zero_embedding())));
    assert_eq!(helper.status(), EmbeddingStatus::Loaded);
    assert_eq!(helper.canvas().snapshot().get_size(), (4, 4));
}

#[test]
fn embedding_arriving_after_removal_is_dropped() {
    let (_, mut helper) = helper();

    let ticket = helper.begin_load(&png(8, 4)).unwrap();
    helper.remove_image();

    assert!(!helper.finish_load(ticket, Ok(zero_embedding())));
    assert_eq!(helper.status(), EmbeddingStatus::NotLoaded);
    assert!(helper.embedding().is_none());
    assert!(helper.canvas().is_blank());
}

#[test]
fn undecodable_image_keeps_previous_state() {
    let (_, mut helper) = helper();
    let ticket = helper.begin_load(&png(8, 4)).unwrap();
    assert!(helper.finish_load(ticket, Ok(zero_embedding())));

    assert!(helper.begin_load(b"not an image").is_err());
    assert_eq!(helper.status(), EmbeddingStatus::Loaded);
    assert_eq!(helper.image().unwrap().get_size(), (8, 4));
}

#[tokio::test]
async fn clear_keeps_the_embedding() {
    let (engine, mut helper) = helper();
    helper.load_image(png(8, 4), &FixedSource::ok()).await.unwrap();
    helper.click(ClickPoint::add(2.0, 1.0));

    helper.clear();
    assert!(helper.clicks().is_empty());
    assert!(helper.overlay().is_none());
    assert!(helper.last_mask().is_none());
    assert!(helper.embedding().is_some());
    assert_eq!(helper.status(), EmbeddingStatus::Loaded);
    assert_eq!(helper.canvas().snapshot().pixel(0, 3), Some(GREY));

    assert_eq!(helper.click(ClickPoint::add(1.0, 1.0)), ClickOutcome::Updated);
    assert_eq!(engine.last_call().unwrap().has_last_pred, array![0.0_f32]);
}

#[tokio::test]
async fn remove_forgets_image_and_embedding() {
    let (_, mut helper) = helper();
    helper.load_image(png(8, 4), &FixedSource::ok()).await.unwrap();
    helper.click(ClickPoint::add(2.0, 1.0));

    helper.remove_image();
    assert_eq!(helper.status(), EmbeddingStatus::NotLoaded);
    assert!(helper.image().is_none());
    assert!(helper.embedding().is_none());
    assert!(helper.clicks().is_empty());
    assert!(helper.canvas().is_blank());
    assert_eq!(helper.click(ClickPoint::add(1.0, 1.0)), ClickOutcome::Ignored);
}

#[tokio::test]
async fn reloading_resets_prompts() {
    let (engine, mut helper) = helper();
    helper.load_image(png(8, 4), &FixedSource::ok()).await.unwrap();
    helper.click(ClickPoint::add(2.0, 1.0));

    helper.load_image(png(6, 6), &FixedSource::ok()).await.unwrap();
    assert!(helper.clicks().is_empty());
    assert!(helper.last_mask().is_none());

    helper.click(ClickPoint::add(1.0, 1.0));
    let input = engine.last_call().unwrap();
    assert_eq!(input.has_last_pred, array![0.0_f32]);
    assert_eq!(input.image_size, array![6.0_f32, 6.0]);
}

#[tokio::test]
async fn inference_failure_rolls_back_the_click() {
    let (engine, mut helper) = helper();
    helper.load_image(png(8, 4), &FixedSource::ok()).await.unwrap();

    engine.failing(true);
    assert_eq!(helper.click(ClickPoint::add(2.0, 1.0)), ClickOutcome::InferenceFailed);
    assert!(helper.clicks().is_empty());
    assert!(helper.overlay().is_none());

    engine.failing(false);
    helper.click(ClickPoint::add(2.0, 1.0));
    let mask_before = helper.last_mask().cloned();

    engine.failing(true);
    assert_eq!(helper.click(ClickPoint::remove(6.0, 1.0)), ClickOutcome::InferenceFailed);
    assert_eq!(helper.clicks(), &[ClickPoint::add(2.0, 1.0)]);
    assert_eq!(helper.last_mask().cloned(), mask_before);
    assert_eq!(helper.status(), EmbeddingStatus::Loaded);
}

#[tokio::test]
async fn listeners_observe_status_and_clicks() {
    let (_, mut helper) = helper();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    helper.subscribe(move |event| sink.lock().push(event.clone()));

    helper.load_image(png(8, 4), &FixedSource::ok()).await.unwrap();
    helper.click(ClickPoint::add(2.0, 1.0));
    helper.clear();

    let events = events.lock();
    let status_changes = events
        .iter()
        .filter_map(|event| match event {
            HelperEvent::StatusChanged(status) => Some(*status),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(
        status_changes,
        vec![EmbeddingStatus::Loading, EmbeddingStatus::Loaded]
    );
    assert!(events.contains(&HelperEvent::ClicksChanged(1)));
    assert!(events.contains(&HelperEvent::ClicksChanged(0)));
    assert!(events.contains(&HelperEvent::Repainted));
}

#[tokio::test]
async fn display_clicks_are_mapped_to_image_pixels() {
    let (engine, mut helper) = helper();
    helper.load_image(png(8, 4), &FixedSource::ok()).await.unwrap();

    let outcome = helper.click_on_display(1.0, 1.0, 4.0, ClickKind::Add);
    assert_eq!(outcome, ClickOutcome::Updated);
    assert_eq!(helper.clicks(), &[ClickPoint::add(2.0, 2.0)]);
    assert_eq!(
        engine.last_call().unwrap().point_coords,
        array![[[2.0_f32, 2.0], [0.0, 0.0]]]
    );
}

#[tokio::test]
async fn clicks_far_outside_the_image_do_not_break_the_session() {
    let (engine, mut helper) = helper();
    helper.load_image(png(8, 4), &FixedSource::ok()).await.unwrap();

    assert_eq!(helper.click(ClickPoint::add(1e19, 0.0)), ClickOutcome::Updated);
    assert_eq!(helper.click(ClickPoint::remove(0.0, -1e19)), ClickOutcome::Updated);
    assert_eq!(helper.click(ClickPoint::add(1.0, 1.0)), ClickOutcome::Updated);

    assert_eq!(helper.clicks().len(), 3);
    assert_eq!(engine.call_count(), 3);
    assert_eq!(helper.canvas().snapshot().pixel(7, 3), Some(GREY));
}

#[tokio::test]
async fn mask_bits_follow_scores_not_overlay_alpha() {
    let (_, helper) = helper();
    let mut helper = helper.with_render_options(RenderOptions {
        mask_color: RGBA(0, 114, 189, 0),
        ..RenderOptions::default()
    });
    helper.load_image(png(8, 4), &FixedSource::ok()).await.unwrap();
    helper.click(ClickPoint::add(2.0, 1.0));

    let bits = helper.mask_bits().unwrap();
    assert_eq!(bits.count_ones(), 16);
    assert!(bits[0]);
    assert!(!bits[7]);

    helper.clear();
    assert!(helper.mask_bits().is_none());
}

fn sample_box() -> BoundingBox<f32> {
    BoundingBox {
        x: 1.0,
        y: 1.0,
        width: 4.0,
        height: 2.0,
    }
}

#[tokio::test]
async fn box_prompt_replaces_the_padding_point() {
    let (engine, mut helper) = helper();
    assert_eq!(helper.set_box(sample_box()), ClickOutcome::Ignored);

    helper.load_image(png(8, 4), &FixedSource::ok()).await.unwrap();
    assert_eq!(helper.set_box(sample_box()), ClickOutcome::Updated);
    let input = engine.last_call().unwrap();
    assert_eq!(input.point_coords, array![[[1.0_f32, 1.0], [5.0, 3.0]]]);
    assert_eq!(input.point_labels, array![[2.0_f32, 3.0]]);

    helper.click(ClickPoint::add(2.0, 2.0));
    let input = engine.last_call().unwrap();
    assert_eq!(input.point_labels, array![[1.0_f32, 2.0, 3.0]]);
    assert_eq!(input.has_last_pred, array![1.0_f32]);
    assert_eq!(helper.prompt_box(), Some(sample_box()));

    helper.clear();
    assert_eq!(helper.prompt_box(), None);
}

#[tokio::test]
async fn box_on_display_is_scaled_and_rolled_back_on_failure() {
    let (engine, mut helper) = helper();
    helper.load_image(png(8, 4), &FixedSource::ok()).await.unwrap();

    let displayed = BoundingBox {
        x: 0.5,
        y: 0.5,
        width: 2.0,
        height: 1.0,
    };
    assert_eq!(helper.box_on_display(displayed, 4.0), ClickOutcome::Updated);
    assert_eq!(helper.prompt_box(), Some(sample_box()));

    engine.failing(true);
    let other = BoundingBox {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };
    assert_eq!(helper.set_box(other), ClickOutcome::InferenceFailed);
    assert_eq!(helper.prompt_box(), Some(sample_box()));
}
