use std::path::{Path, PathBuf};
use std::process;

use chrono::Local;
use clap::{Args, Parser, Subcommand};

use breakaboo_core::capture::domain::capture_exporter::CaptureExporter;
use breakaboo_core::capture::infrastructure::download_exporter::DownloadExporter;
use breakaboo_core::capture::infrastructure::share_exporter::ShareExporter;
use breakaboo_core::compositing::infrastructure::cpu_frame_compositor::CpuFrameCompositor;
use breakaboo_core::filters::domain::filter::FilterCatalog;
use breakaboo_core::filters::infrastructure::file_mask_loader::FileMaskLoader;
use breakaboo_core::landmarks::infrastructure::landmark_source_factory::{
    create_landmark_source, LandmarkFeed,
};
use breakaboo_core::pipeline::capture_still_use_case::CaptureStillUseCase;
use breakaboo_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use breakaboo_core::pipeline::render_session::{RenderSession, SessionConfig};
use breakaboo_core::pipeline::render_video_use_case::RenderVideoUseCase;
use breakaboo_core::placement::domain::mask_size;
use breakaboo_core::shared::constants::{
    CAMERA_PERMISSION_MESSAGE, IMAGE_EXTENSIONS, MAX_MASK_SIZE, MIN_MASK_SIZE,
    OVERLAY_FADE_SECONDS,
};
use breakaboo_core::shared::settings::Settings;
use breakaboo_core::video::domain::video_reader::VideoReader;
use breakaboo_core::video::domain::video_source::{CameraError, VideoSource};
use breakaboo_core::video::domain::video_writer::VideoWriter;
use breakaboo_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use breakaboo_core::video::infrastructure::ffmpeg_writer::FfmpegWriter;
use breakaboo_core::video::infrastructure::image_file_reader::ImageFileReader;

/// Face-tracked Halloween masks over a camera or video.
#[derive(Parser)]
#[command(name = "breakaboo")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the masked preview, optionally recording it to a video file.
    Render(RenderArgs),
    /// Render up to a frame and save (or share) it as a PNG.
    Capture(CaptureArgs),
    /// List the available filters.
    Filters,
}

#[derive(Args)]
struct SourceArgs {
    /// Video or image file standing in for the camera.
    input: Option<PathBuf>,

    /// Read from a camera instead of a file. Without a value the platform
    /// default device (or the one in settings) is used.
    #[arg(long, num_args = 0..=1, default_missing_value = "")]
    camera: Option<String>,

    /// Landmark feed: a JSON Lines recording, or `-` for a detector piped
    /// into stdin. Without it the mask is placed untracked.
    #[arg(long)]
    landmarks: Option<String>,

    /// Filter id (see `breakaboo filters`).
    #[arg(long)]
    filter: Option<String>,

    /// Mask size multiplier (0.5-2.0, snapped to 0.05).
    #[arg(long)]
    size: Option<f64>,

    /// Smoothing factor (0-1]; higher follows the face faster.
    #[arg(long)]
    smoothing: Option<f64>,

    /// Size the preview is displayed at, as WIDTHxHEIGHT.
    #[arg(long)]
    display_size: Option<String>,

    /// Directory that relative mask assets resolve against.
    #[arg(long)]
    assets_dir: Option<PathBuf>,

    /// Persist the effective filter, size and smoothing as new defaults.
    #[arg(long)]
    save_settings: bool,
}

#[derive(Args)]
struct RenderArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Record the presented frames to this video file.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Stop after this many frames (required when recording a camera).
    #[arg(long)]
    frames: Option<usize>,
}

#[derive(Args)]
struct CaptureArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Frame index to capture (default: first frame, or 30 for cameras so
    /// exposure and tracking can settle).
    #[arg(long)]
    at_frame: Option<usize>,

    /// Hand the PNG to the system's default handler instead of saving it.
    #[arg(long)]
    share: bool,

    /// Directory for saved captures.
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

const CAMERA_WARMUP_FRAMES: usize = 30;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        match e.downcast_ref::<CameraError>() {
            Some(camera) if camera.is_permission_denied() => {
                eprintln!("{CAMERA_PERMISSION_MESSAGE}");
            }
            _ => eprintln!("Error: {e}"),
        }
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut settings = Settings::load();

    match cli.command {
        Command::Render(args) => {
            validate_source(&args.source)?;
            if args.source.camera.is_some() && args.output.is_some() && args.frames.is_none() {
                return Err("--frames is required when recording a camera".into());
            }
            apply_overrides(&mut settings, &args.source)?;
            run_render(&args, &settings)
        }
        Command::Capture(args) => {
            validate_source(&args.source)?;
            apply_overrides(&mut settings, &args.source)?;
            run_capture(&args, &settings)
        }
        Command::Filters => {
            list_filters(&settings);
            Ok(())
        }
    }
}

fn run_render(args: &RenderArgs, settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let source = video_source(&args.source, settings);
    let session = build_session(&args.source, settings)?;
    let writer: Option<Box<dyn VideoWriter>> = args
        .output
        .as_ref()
        .map(|_| Box::new(FfmpegWriter::new()) as Box<dyn VideoWriter>);

    let progress: Box<dyn Fn(usize, usize) -> bool + Send> = Box::new(|current, total| {
        if total > 0 {
            eprint!("\rRendering frame {current}/{total}");
        } else {
            eprint!("\rRendering frame {current}");
        }
        true
    });

    let mut use_case = RenderVideoUseCase::new(
        open_reader(&source),
        writer,
        session,
        Box::new(StdoutPipelineLogger::default()),
    )
    .with_progress(progress)
    .with_max_frames(args.frames);

    let stats = use_case.execute(&source, args.output.as_deref())?;
    eprintln!();
    log::info!(
        "Rendered {} frames, mask shown on {}",
        stats.frames,
        stats.overlay_frames
    );
    if let Some(output) = &args.output {
        log::info!("Output written to {}", output.display());
    }
    Ok(())
}

fn run_capture(args: &CaptureArgs, settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let source = video_source(&args.source, settings);
    let session = build_session(&args.source, settings)?;

    let dir = args
        .out_dir
        .clone()
        .or_else(|| settings.capture_dir.clone())
        .unwrap_or_else(DownloadExporter::default_dir);
    let download = DownloadExporter::new(dir);
    let exporter: Box<dyn CaptureExporter> = if args.share {
        Box::new(ShareExporter::new(download))
    } else {
        Box::new(download)
    };

    let at_frame = args
        .at_frame
        .or_else(|| source.is_camera().then_some(CAMERA_WARMUP_FRAMES));

    let mut use_case = CaptureStillUseCase::new(open_reader(&source), session, exporter);
    let outcome = use_case.execute(&source, at_frame, Local::now())?;
    println!("{}", outcome.path().display());
    Ok(())
}

fn build_session(
    args: &SourceArgs,
    settings: &Settings,
) -> Result<RenderSession, Box<dyn std::error::Error>> {
    let catalog = FilterCatalog::default_masks().with_extra(settings.extra_filters.clone());
    let filter = catalog
        .get(&settings.filter)
        .ok_or_else(|| format!("Unknown filter '{}' (see `breakaboo filters`)", settings.filter))?
        .clone();

    let landmarks = create_landmark_source(&LandmarkFeed::from_arg(args.landmarks.as_deref()));
    let config = SessionConfig {
        smoothing: settings.smoothing,
        mask_size: settings.mask_size,
        display_size: settings.display_size,
        fade_seconds: OVERLAY_FADE_SECONDS,
    };
    let mut session = RenderSession::new(
        Box::new(CpuFrameCompositor::new()),
        landmarks,
        Box::new(FileMaskLoader::new(&settings.assets_dir)),
        config,
    );
    if session.select_filter(&filter).is_err() {
        eprintln!("Mask for filter '{}' could not be loaded; continuing without it", filter.id);
    }
    log::info!("Mask size {}%", mask_size::percent(session.mask_size()));

    if args.save_settings {
        let path = settings.save()?;
        log::info!("Settings saved to {}", path.display());
    }
    Ok(session)
}

fn list_filters(settings: &Settings) {
    let catalog = FilterCatalog::default_masks().with_extra(settings.extra_filters.clone());
    for filter in catalog.iter() {
        let marker = if filter.id == settings.filter { "*" } else { " " };
        let kind = if filter.full_frame { " (full frame)" } else { "" };
        println!("{marker} {:<10} {}{kind}  {}", filter.id, filter.name, filter.asset);
    }
}

fn apply_overrides(
    settings: &mut Settings,
    args: &SourceArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(filter) = &args.filter {
        settings.filter = filter.clone();
    }
    if let Some(size) = args.size {
        settings.mask_size = mask_size::snap(size);
    }
    if let Some(smoothing) = args.smoothing {
        settings.smoothing = smoothing;
    }
    if let Some(display) = &args.display_size {
        settings.display_size = Some(parse_display_size(display)?);
    }
    if let Some(dir) = &args.assets_dir {
        settings.assets_dir = dir.clone();
    }
    match args.camera.as_deref() {
        Some("") | None => {}
        Some(device) => settings.camera_device = Some(device.to_string()),
    }
    Ok(())
}

fn validate_source(args: &SourceArgs) -> Result<(), Box<dyn std::error::Error>> {
    match (&args.input, &args.camera) {
        (Some(_), Some(_)) => return Err("Give either an input file or --camera, not both".into()),
        (None, None) => return Err("An input file or --camera is required".into()),
        (Some(input), None) if !input.exists() => {
            return Err(format!("Input file not found: {}", input.display()).into());
        }
        _ => {}
    }
    if let Some(size) = args.size {
        if !(MIN_MASK_SIZE..=MAX_MASK_SIZE).contains(&size) {
            log::warn!("Mask size {size} is outside {MIN_MASK_SIZE}-{MAX_MASK_SIZE}; clamping");
        }
    }
    if let Some(smoothing) = args.smoothing {
        if !(smoothing > 0.0 && smoothing <= 1.0) {
            return Err(format!("Smoothing must be in (0.0, 1.0], got {smoothing}").into());
        }
    }
    Ok(())
}

fn video_source(args: &SourceArgs, settings: &Settings) -> VideoSource {
    if let Some(input) = &args.input {
        return VideoSource::File(input.clone());
    }
    match &settings.camera_device {
        Some(device) => VideoSource::Camera(device.clone()),
        None => VideoSource::default_camera(),
    }
}

fn parse_display_size(value: &str) -> Result<(f64, f64), Box<dyn std::error::Error>> {
    let invalid = || format!("Display size must look like 390x844, got '{value}'");
    let (w, h) = value.split_once(['x', 'X']).ok_or_else(invalid)?;
    let w: f64 = w.trim().parse().map_err(|_| invalid())?;
    let h: f64 = h.trim().parse().map_err(|_| invalid())?;
    if w <= 0.0 || h <= 0.0 {
        return Err(invalid().into());
    }
    Ok((w, h))
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn open_reader(source: &VideoSource) -> Box<dyn VideoReader> {
    match source {
        VideoSource::File(path) if is_image(path) => Box::new(ImageFileReader::new()),
        _ => Box::new(FfmpegReader::new()),
    }
}
