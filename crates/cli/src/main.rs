use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;

use face_overlay_core::detection::infrastructure::http_face_detector::HttpFaceDetector;
use face_overlay_core::matching::infrastructure::http_face_matcher::HttpFaceMatcher;
use face_overlay_core::rendering::domain::frame_presenter::FramePresenter;
use face_overlay_core::rendering::domain::overlay_renderer::OverlayRenderer;
use face_overlay_core::rendering::infrastructure::raster_surface::{load_font, RasterSurface};
use face_overlay_core::rendering::infrastructure::snapshot_presenter::{
    NullPresenter, SnapshotPresenter,
};
use face_overlay_core::runtime::overlay_session::{OverlaySession, SessionParts};
use face_overlay_core::shared::overlay_config::OverlayConfig;
use face_overlay_core::shared::service_client::ServiceClient;
use face_overlay_core::video::infrastructure::image_file_writer::ImageFileWriter;
use face_overlay_core::video::infrastructure::image_sequence_source::ImageSequenceSource;

/// Live face annotation overlay backed by a detection/matching service.
#[derive(Parser)]
#[command(name = "face-overlay")]
struct Cli {
    /// Image file or directory of images played back as the live stream.
    #[arg(long)]
    source: PathBuf,

    /// Base URL of the face service (overrides the config file).
    #[arg(long)]
    service_url: Option<String>,

    /// JSON settings file (defaults to the per-user config).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Playback rate of the source.
    #[arg(long, default_value = "30")]
    fps: f64,

    /// Surface width in pixels.
    #[arg(long)]
    width: Option<u32>,

    /// Surface height in pixels.
    #[arg(long)]
    height: Option<u32>,

    /// Milliseconds between rendered frames.
    #[arg(long)]
    render_interval_ms: Option<u64>,

    /// TrueType/OpenType font for label text.
    #[arg(long)]
    font: Option<PathBuf>,

    /// Write the composed overlay to <dir>/latest.png.
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Write a snapshot every Nth rendered frame.
    #[arg(long, default_value = "30")]
    snapshot_every: usize,

    /// Stop after this many seconds instead of waiting for Enter.
    #[arg(long)]
    duration_secs: Option<u64>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;
    let config = resolve_config(&cli)?;

    let client = ServiceClient::new(&config.service_url, config.request_timeout())?;
    let source = ImageSequenceSource::open(&cli.source, cli.fps)?;

    let font = match &config.style.font_path {
        Some(path) => Some(load_font(path)?),
        None => {
            log::warn!("No font configured; labels are drawn without text");
            None
        }
    };

    let presenter: Box<dyn FramePresenter> = match &cli.snapshot_dir {
        Some(dir) => Box::new(SnapshotPresenter::new(
            Box::new(ImageFileWriter::new()),
            dir.clone(),
            cli.snapshot_every,
        )),
        None => Box::new(NullPresenter),
    };

    let handle = OverlaySession::spawn(SessionParts {
        source: Box::new(source),
        detector: Box::new(HttpFaceDetector::new(client.clone())),
        matcher: Box::new(HttpFaceMatcher::new(client)),
        renderer: OverlayRenderer::new(&config.style),
        surface: RasterSurface::new(config.surface_width, config.surface_height, font),
        presenter,
        render_interval: config.render_interval(),
    })?;

    log::info!("Annotating faces via {}", config.service_url);
    handle.start();

    match cli.duration_secs {
        Some(secs) => std::thread::sleep(Duration::from_secs(secs)),
        None => {
            eprintln!("Press Enter to stop");
            let mut line = String::new();
            std::io::stdin().read_line(&mut line)?;
        }
    }

    handle.stop();
    let stats = handle.shutdown()?;
    log::info!(
        "Rendered {} frames; {} detection and {} match requests ({} failed)",
        stats.frames_rendered,
        stats.detections,
        stats.matches,
        stats.failures
    );
    log::info!(
        "Saw up to {} face(s) at once; identified {} face(s)",
        stats.peak_boxes,
        stats.identified
    );
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<OverlayConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => OverlayConfig::load_from(path)?,
        None => OverlayConfig::load(),
    };

    if let Some(url) = &cli.service_url {
        config.service_url = url.clone();
    }
    if let Some(width) = cli.width {
        config.surface_width = width;
    }
    if let Some(height) = cli.height {
        config.surface_height = height;
    }
    if let Some(ms) = cli.render_interval_ms {
        config.render_interval_ms = ms;
    }
    if let Some(font) = &cli.font {
        config.style.font_path = Some(font.clone());
    }
    Ok(config)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.source.exists() {
        return Err(format!("Source not found: {}", cli.source.display()).into());
    }
    if !(cli.fps > 0.0 && cli.fps.is_finite()) {
        return Err(format!("FPS must be positive, got {}", cli.fps).into());
    }
    if cli.width == Some(0) || cli.height == Some(0) {
        return Err("Surface dimensions must be positive".into());
    }
    if cli.snapshot_every == 0 {
        return Err("--snapshot-every must be at least 1".into());
    }
    if let Some(font) = &cli.font {
        if !font.exists() {
            return Err(format!("Font not found: {}", font.display()).into());
        }
    }
    Ok(())
}
