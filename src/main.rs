//! `augmask` CLI - augment a folder of images and their masks.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use augmask::image::OutputFormat;
use augmask::transform::{DEFAULT_CROP_FACTOR, DEFAULT_NOISE_FACTOR};
use augmask::{Config, MaskPolicy, Session, TransformKind, TransformParams};

/// Augment a folder of images, and optionally their segmentation masks, with random transforms.
#[derive(Parser, Debug)]
#[command(name = "augmask")]
#[command(version, about, long_about = None)]
struct Args {
    /// Folder of .jpg/.png images to augment.
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Folder receiving the augmented files. Created if missing.
    #[arg(short, long, value_name = "DIR")]
    output: PathBuf,

    /// Folder of masks named `<image stem>_mask.<ext>`.
    #[arg(short, long, value_name = "DIR")]
    masks: Option<PathBuf>,

    /// Rotate by a random angle in [-30, 30] degrees.
    #[arg(long)]
    rotate: bool,

    /// Mirror left-right.
    #[arg(long)]
    flip_horizontal: bool,

    /// Mirror top-bottom.
    #[arg(long)]
    flip_vertical: bool,

    /// Scale brightness by a random factor in [0.5, 1.5].
    #[arg(long)]
    brightness: bool,

    /// Add Gaussian noise.
    #[arg(long)]
    noise: bool,

    /// Crop a random window and resize it back to the original size.
    #[arg(long)]
    crop: bool,

    /// Enable every transform.
    #[arg(long)]
    all: bool,

    /// Noise standard deviation as a fraction of 255.
    #[arg(long, default_value_t = DEFAULT_NOISE_FACTOR, value_name = "FLOAT")]
    noise_factor: f32,

    /// Crop window size as a fraction of the image, in (0, 1].
    #[arg(long, default_value_t = DEFAULT_CROP_FACTOR, value_name = "FLOAT")]
    crop_factor: f32,

    /// How masks follow their images.
    #[arg(long, value_enum, default_value_t = MaskPolicyArg::Geometric)]
    mask_policy: MaskPolicyArg,

    /// Output file format.
    #[arg(long, value_enum, default_value_t = FormatArg::Jpg)]
    format: FormatArg,

    /// Output JPEG quality (1-100).
    #[arg(short, long, default_value = "95", value_name = "INT")]
    quality: u8,

    /// Random seed for reproducibility.
    #[arg(long, value_name = "INT")]
    seed: Option<u64>,

    /// Write a thumbnail of the first augmented image to this path.
    #[arg(long, value_name = "FILE")]
    preview: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MaskPolicyArg {
    /// Masks receive the image's geometric transforms with identical parameters.
    Geometric,
    /// Masks receive every transform with identical parameters.
    Mirror,
    /// Masks draw their own random parameters.
    Independent,
}

impl From<MaskPolicyArg> for MaskPolicy {
    fn from(arg: MaskPolicyArg) -> Self {
        match arg {
            MaskPolicyArg::Geometric => Self::GeometricOnly,
            MaskPolicyArg::Mirror => Self::Mirror,
            MaskPolicyArg::Independent => Self::Independent,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Jpg,
    Png,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Jpg => Self::Jpeg,
            FormatArg::Png => Self::Png,
        }
    }
}

impl Args {
    fn enabled(&self) -> Vec<TransformKind> {
        if self.all {
            return TransformKind::ALL.to_vec();
        }

        [
            (self.rotate, TransformKind::Rotate),
            (self.flip_horizontal, TransformKind::FlipHorizontal),
            (self.flip_vertical, TransformKind::FlipVertical),
            (self.brightness, TransformKind::AdjustBrightness),
            (self.noise, TransformKind::AddNoise),
            (self.crop, TransformKind::RandomCropAndResize),
        ]
        .into_iter()
        .filter_map(|(on, kind)| on.then_some(kind))
        .collect()
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("augmask={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(err) = run(&args) {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(args: &Args) -> Result<()> {
    // Build configuration
    let config = Config {
        enabled: args.enabled().into_iter().collect(),
        params: TransformParams {
            noise_factor: args.noise_factor,
            crop_factor: args.crop_factor,
        },
        mask_policy: args.mask_policy.into(),
        output_format: args.format.into(),
        output_quality: args.quality,
        seed: args.seed,
    };
    config.validate().context("Invalid options")?;

    let mut session = Session::new();

    let count = session
        .select_folder(&args.input)
        .with_context(|| format!("Failed to load images from {}", args.input.display()))?;
    tracing::info!("Found {count} images");

    if let Some(masks) = &args.masks {
        let count = session
            .select_mask_folder(masks)
            .with_context(|| format!("Failed to load masks from {}", masks.display()))?;
        tracing::info!("Found {count} masks");
    }

    session.augment(&config).context("Failed to augment images")?;

    if let Some(path) = &args.preview {
        if let Some(thumb) = session.preview() {
            thumb
                .save(path)
                .with_context(|| format!("Failed to write preview {}", path.display()))?;
        }
    }

    std::fs::create_dir_all(&args.output).with_context(|| {
        format!("Failed to create output folder {}", args.output.display())
    })?;

    let report = session
        .save(&args.output, &config)
        .context("Failed to save augmented images")?;

    println!(
        "Run {}: saved {} images and {} masks to {}",
        report.run_id,
        report.images.len(),
        report.masks.len(),
        args.output.display()
    );

    Ok(())
}
