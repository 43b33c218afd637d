#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use actix_web::{web, App, HttpServer};
use anyhow::{bail, ensure, Result};
use bytes::Bytes;
use clap::Parser;
use log::info;
use spark_inference::inference::sam::image_inference::SamInteractiveSession;
use spark_media::Canvas;
use spark_segment::cli::{Cli, Command, ModelArgs, RunArgs, ServeArgs};
use spark_segment::config::SegmentConfig;
use spark_segment::embedding::{FileEmbeddingSource, HttpEmbeddingSource};
use spark_segment::helper::{ClickOutcome, EmbeddingStatus, PredictionHelper, RenderOptions};
use spark_segment::log_init;
use spark_segment::server::{routes, AppState};
use std::sync::Arc;
use std::time::Duration;

#[actix_web::main]
async fn main() -> Result<()> {
    log_init();
    let cli = Cli::parse();
    let mut config = SegmentConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Run(args) => {
            apply_model_args(&mut config, &args.model);
            run(config, args).await
        }
        Command::Serve(args) => {
            apply_model_args(&mut config, &args.model);
            serve(config, args).await
        }
    }
}

fn apply_model_args(config: &mut SegmentConfig, args: &ModelArgs) {
    if let Some(model) = &args.model {
        config.model.path = model.clone();
    }
    if let Some(provider) = &args.provider {
        config.model.execution_provider = provider.clone();
    }
    if let Some(endpoint) = &args.endpoint {
        config.embedding.url = endpoint.clone();
    }
}

fn build_helper(config: &SegmentConfig) -> Result<PredictionHelper> {
    let engine = SamInteractiveSession::new(
        &config.model.path,
        config.model.execution_provider()?,
        config.model.intra_threads,
        config.model.tensors.names(),
    )?;
    let canvas = Canvas::new().with_marker_radius(config.render.marker_radius);

    Ok(PredictionHelper::new(Arc::new(engine), canvas)
        .with_render_options(RenderOptions::from(&config.render))
        .with_prompt_longest_side(config.model.prompt_longest_side))
}

fn http_source(config: &SegmentConfig) -> Result<HttpEmbeddingSource> {
    Ok(HttpEmbeddingSource::new(
        config.embedding.url.clone(),
        Duration::from_secs(config.embedding.timeout_secs),
    )?)
}

async fn run(config: SegmentConfig, args: RunArgs) -> Result<()> {
    let mut helper = build_helper(&config)?;
    let bytes = Bytes::from(tokio::fs::read(&args.image).await?);

    let status = match &args.embedding_file {
        Some(path) => helper.load_image(bytes, &FileEmbeddingSource::new(path)).await?,
        None => helper.load_image(bytes, &http_source(&config)?).await?,
    };
    ensure!(
        status == EmbeddingStatus::Loaded,
        "Embedding for {} is {}",
        args.image.display(),
        status
    );

    if let Some(prompt_box) = args.prompt_box {
        if helper.set_box(prompt_box) == ClickOutcome::InferenceFailed {
            bail!("Inference failed for box {:?}", prompt_box);
        }
    }
    for click in &args.clicks {
        if helper.click(*click) == ClickOutcome::InferenceFailed {
            bail!("Inference failed for click {:?}", click);
        }
    }
    if let Some(bits) = helper.mask_bits() {
        info!("Mask covers {} of {} pixels", bits.count_ones(), bits.len());
    }

    if let Some(parent) = args.out.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    helper.canvas().snapshot().save(&args.out)?;
    info!("Saved {}", args.out.display());

    Ok(())
}

async fn serve(config: SegmentConfig, args: ServeArgs) -> Result<()> {
    let listen = args.listen.unwrap_or_else(|| config.server.listen.clone());
    let source = http_source(&config)?;
    info!("Embeddings are requested from {}", source.url());
    let state = web::Data::new(AppState::new(build_helper(&config)?, source));

    info!("Listening on {}", listen);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(routes::<HttpEmbeddingSource>)
    })
    .bind(listen)?
    .run()
    .await?;

    Ok(())
}
