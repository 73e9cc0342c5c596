use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use telaura_relay::RelayConfig;
use tracing_subscriber::EnvFilter;

mod catalogue;
mod fetch;
mod preview;

use preview::PreviewOptions;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { static_dir } => run_serve(static_dir),
        Commands::Preview {
            manifest,
            config,
            font,
            width,
            height,
            dpr,
            frames,
            wheel_per_frame,
            snapshot_every,
            output_dir,
            realtime,
        } => preview::run(PreviewOptions {
            manifest,
            config,
            font,
            width,
            height,
            device_pixel_ratio: dpr,
            frames,
            wheel_per_frame,
            snapshot_every,
            output_dir,
            realtime,
        }),
    }
}

fn run_serve(static_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let config = RelayConfig::from_env().context("loading relay configuration")?;
    tracing::info!(bind = %config.bind, ?static_dir, "starting contact relay");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(telaura_relay::serve(config, static_dir))?;
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Telaura storefront services", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the contact-form relay over HTTP.
    Serve {
        /// Directory of static site files served for unmatched paths.
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
    /// Drive the product carousel headlessly and write PNG snapshots.
    Preview {
        /// JSON manifest of `{ "image", "title" }` entries. Defaults to the product catalogue.
        #[arg(short, long)]
        manifest: Option<PathBuf>,
        /// JSON file overriding carousel and render settings.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// TrueType/OpenType font used for tile captions.
        #[arg(long)]
        font: Option<PathBuf>,
        #[arg(long, default_value_t = 1280.0)]
        width: f64,
        #[arg(long, default_value_t = 720.0)]
        height: f64,
        /// Device pixel ratio reported by the host.
        #[arg(long, default_value_t = 1.0)]
        dpr: f32,
        /// Number of frames to run.
        #[arg(long, default_value_t = 240)]
        frames: u32,
        /// Wheel delta injected before every frame.
        #[arg(long, default_value_t = 20.0, allow_hyphen_values = true)]
        wheel_per_frame: f64,
        /// Write a snapshot every K frames; 0 writes only the final frame.
        #[arg(long, default_value_t = 60)]
        snapshot_every: u32,
        #[arg(short, long, default_value = "preview")]
        output_dir: PathBuf,
        /// Pace frames against the wall clock instead of simulated time.
        #[arg(long)]
        realtime: bool,
    },
}
