use clap::{Args, Parser, Subcommand};
use spark_inference::utils::graph::{BoundingBox, ClickKind, ClickPoint};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "spark-segment", version, about = "Point-prompt image segmentation")]
pub struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Segment one image with a fixed list of clicks and save the canvas.
    Run(RunArgs),
    /// Serve the interactive session over HTTP.
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
pub struct ModelArgs {
    /// ONNX mask decoder.
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// `cpu`, `cuda[:id]` or `tensorrt[:id]`.
    #[arg(long)]
    pub provider: Option<String>,

    /// Embedding service URL.
    #[arg(long)]
    pub endpoint: Option<String>,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[arg(long)]
    pub image: PathBuf,

    /// `x,y` or `x,y,add|remove`, in image pixels. Repeatable.
    #[arg(long = "click", value_parser = parse_click)]
    pub clicks: Vec<ClickPoint>,

    /// `x,y,width,height` box prompt, in image pixels.
    #[arg(long = "box", value_parser = parse_box)]
    pub prompt_box: Option<BoundingBox<f32>>,

    #[arg(long, default_value = "./data/out/segment.png")]
    pub out: PathBuf,

    /// Read the embedding from a file instead of the service.
    #[arg(long)]
    pub embedding_file: Option<PathBuf>,

    #[command(flatten)]
    pub model: ModelArgs,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(long)]
    pub listen: Option<String>,

    #[command(flatten)]
    pub model: ModelArgs,
}

pub fn parse_click(value: &str) -> Result<ClickPoint, String> {
    let parts = value.split(',').map(str::trim).collect::<Vec<_>>();
    let coordinate = |text: &str| {
        text.parse::<f32>()
            .map_err(|e| format!("Invalid coordinate {:?}: {}", text, e))
    };

    let kind = match parts.get(2).map(|kind| kind.to_ascii_lowercase()) {
        None => ClickKind::Add,
        Some(kind) if kind == "add" || kind == "+" => ClickKind::Add,
        Some(kind) if kind == "remove" || kind == "-" => ClickKind::Remove,
        Some(kind) => return Err(format!("Unknown click kind {:?}", kind)),
    };

    match parts.as_slice() {
        [x, y] | [x, y, _] => Ok(ClickPoint::new(coordinate(*x)?, coordinate(*y)?, kind)),
        _ => Err(format!("Expected x,y[,add|remove], got {:?}", value)),
    }
}

pub fn parse_box(value: &str) -> Result<BoundingBox<f32>, String> {
    let values = value
        .split(',')
        .map(|text| {
            text.trim()
                .parse::<f32>()
                .map_err(|e| format!("Invalid box value {:?}: {}", text, e))
        })
        .collect::<Result<Vec<_>, _>>()?;

    match values.as_slice() {
        &[x, y, width, height] => Ok(BoundingBox {
            x,
            y,
            width,
            height,
        }),
        _ => Err(format!("Expected x,y,width,height, got {:?}", value)),
    }
}
