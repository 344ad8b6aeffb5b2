//! Mirror Vision CLI
//!
//! Connects to a local screen-mirroring server, decodes the video
//! stream and runs the configured background-subtraction pipeline,
//! reporting candidate objects and stage timings through the log.

use clap::{Parser, ValueEnum};
use mirror_vision::{
    analysis::{AdaptiveBackgroundModel, MaskPostProcessor, MaskProducer, ReferenceModel, Roi},
    config::{AnalysisMode, FileConfig},
    decode::H264Decoder,
    pipeline::{FrameLoopController, LoopStats, TracingSink},
    transport,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "mirror-vision", version, about)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Mirroring server host (overrides the config file).
    #[arg(long)]
    host: Option<String>,

    /// Mirroring server port (overrides the config file).
    #[arg(long)]
    port: Option<u16>,

    /// Analysis strategy (overrides the config file).
    #[arg(long, value_enum)]
    mode: Option<CliMode>,

    /// Background reference image for static mode.
    #[arg(long)]
    reference: Option<PathBuf>,

    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<u64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMode {
    /// Diff against a static background snapshot.
    Static,
    /// Adaptive statistical background model.
    Adaptive,
}

impl From<CliMode> for AnalysisMode {
    fn from(mode: CliMode) -> Self {
        match mode {
            CliMode::Static => AnalysisMode::Static,
            CliMode::Adaptive => AnalysisMode::Adaptive,
        }
    }
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!(
        version = mirror_vision::VERSION,
        started_at = %chrono::Utc::now().to_rfc3339(),
        "mirror-vision starting"
    );

    let cli = Cli::parse();
    match run(cli) {
        Ok(stats) => {
            info!(
                frames = stats.frames,
                candidates = stats.candidates,
                mean_frame_ms = stats
                    .mean_frame_time()
                    .map(|d| d.as_millis() as u64)
                    .unwrap_or(0),
                "done"
            );
        }
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<LoopStats, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };

    // CLI flags override the file.
    if let Some(host) = cli.host {
        config.transport.host = host;
    }
    if let Some(port) = cli.port {
        config.transport.port = port;
    }
    if let Some(mode) = cli.mode {
        config.run.mode = mode.into();
    }
    if let Some(reference) = cli.reference {
        config.reference_image = Some(reference);
    }
    if let Some(max_frames) = cli.max_frames {
        config.run.max_frames = Some(max_frames);
    }
    config.validate()?;

    // Cooperative stop, polled once per frame by the loop.
    let stop = Arc::new(AtomicBool::new(false));
    let stop_handle = stop.clone();
    ctrlc::set_handler(move || {
        stop_handle.store(true, Ordering::Relaxed);
    })?;

    let session = transport::connect(&config.transport)?;
    let header = session.header();
    let roi = config
        .roi
        .unwrap_or_else(|| Roi::full_frame(header.width, header.height));
    roi.validate_within(header.width, header.height)?;

    let producer = match config.run.mode {
        AnalysisMode::Static => {
            let reference = config.load_reference()?;
            MaskProducer::Static(ReferenceModel::new(
                reference,
                roi,
                config.analysis.diff_threshold,
            ))
        }
        AnalysisMode::Adaptive => MaskProducer::Adaptive(AdaptiveBackgroundModel::new(
            config.analysis.adaptive.clone(),
        )),
    };

    let mut source = H264Decoder::spawn(session.into_video_reader(), header.width, header.height)?;

    let mut controller = FrameLoopController::new(
        producer,
        MaskPostProcessor::new(config.analysis.dilate_iterations),
        config.analysis.min_area,
        stop,
    );
    if let Some(limit) = config.run.max_frames {
        controller = controller.with_frame_limit(limit);
    }

    let mut sink = TracingSink;
    let (stats, reason) = controller.run(&mut source, &mut sink)?;
    info!(reason = ?reason, "session ended");
    Ok(stats)
}
