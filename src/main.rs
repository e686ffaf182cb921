use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, anyhow};
use capview::acquisition::exit_process_handler;
use capview::capture::{Pattern, SourceKind, opener_for};
use capview::config::{SurfaceKind, ViewerConfig};
use capview::eprintln_and_exit;
use capview::error::CaptureResult;
use capview::render::HeadlessSurface;
use capview::session::{SessionReport, ViewerSession};
use clap::{Parser, ValueEnum};
use log::info;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SourceArg {
    /// Generated test pattern
    Synthetic,
    /// Webcam (needs the `camera` feature)
    Camera,
    /// Desktop capture (needs the `screen-capture` feature)
    Screen,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SurfaceArg {
    Window,
    Headless,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PatternArg {
    Bar,
    Solid,
}

/// Live viewer: capture frames on one thread, show the latest one on a
/// fixed timer.
#[derive(Parser, Debug)]
#[command(name = "capview")]
#[command(about = "Show a live frame source in a window")]
#[command(long_about = "Show a live frame source in a window.
Frames are captured on a background thread and the window shows the most recent one \
every timer tick. Use --surface headless to run without a window.")]
struct Args {
    /// Frame source backend
    #[arg(short, long, value_enum, default_value = "synthetic")]
    source: SourceArg,

    /// Device index: camera or display number
    #[arg(short = 'i', long, default_value_t = 0)]
    device: usize,

    /// Requested frame width
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Requested frame height
    #[arg(long, default_value_t = 480)]
    height: u32,

    /// Rendering timer period in milliseconds
    #[arg(short, long, default_value_t = 30)]
    timer_ms: u64,

    /// Where to show frames
    #[arg(long, value_enum, default_value = "window")]
    surface: SurfaceArg,

    /// Headless run time (supports seconds, minutes, hours)
    #[arg(short, long,
          help = "Headless run time: 30s (30 seconds), 2m (2 minutes), 1h (1 hour)")]
    duration: Option<String>,

    /// Headless run length in timer ticks
    #[arg(long)]
    ticks: Option<u64>,

    /// Headless: write the last image shown to this PNG file
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Synthetic source: end the stream after this many frames
    #[arg(long)]
    frames: Option<u64>,

    /// Synthetic source: milliseconds each frame takes to capture
    #[arg(long, default_value_t = 33)]
    frame_delay_ms: u64,

    /// Synthetic source: what to draw
    #[arg(long, value_enum, default_value = "bar")]
    pattern: PatternArg,
}

impl Args {
    fn into_config(self) -> Result<ViewerConfig> {
        let source = match self.source {
            SourceArg::Synthetic => SourceKind::Synthetic,
            SourceArg::Camera => SourceKind::Camera,
            SourceArg::Screen => SourceKind::Screen,
        };
        let mut config = ViewerConfig::new(source, self.device, self.width, self.height);
        config.timer_period_ms = self.timer_ms;
        config.surface = match self.surface {
            SurfaceArg::Window => SurfaceKind::Window,
            SurfaceArg::Headless => SurfaceKind::Headless,
        };
        config.duration = self
            .duration
            .as_deref()
            .map(parse_duration)
            .transpose()?
            .map(|secs| Duration::from_secs(secs.into()));
        config.ticks = self.ticks;
        config.snapshot = self.snapshot;
        config.frame_limit = self.frames;
        config.frame_delay_ms = self.frame_delay_ms;
        config.pattern = match self.pattern {
            PatternArg::Bar => Pattern::MovingBar,
            PatternArg::Solid => Pattern::SolidCycle,
        };
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Args::parse().into_config()?;
    config.validate().map_err(anyhow::Error::msg)?;

    let session = ViewerSession::builder()
        .with_source_opener(opener_for(config.to_source_config()))
        .with_timer_period(config.timer_period())
        .with_fatal_handler(exit_process_handler())
        .build()?;

    let report = match config.surface {
        SurfaceKind::Headless => run_headless(session, &config),
        SurfaceKind::Window => run_window(session),
    };
    let report = or_exit(report);
    info!(
        "{} ticks, {} new frames, {} repeated",
        report.presenter.ticks, report.presenter.fresh, report.presenter.repeated
    );
    Ok(())
}

/// Startup and acquisition failures carry their own exit codes.
fn or_exit<T>(result: CaptureResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(error) => eprintln_and_exit!(error),
    }
}

fn run_headless(session: ViewerSession, config: &ViewerConfig) -> CaptureResult<SessionReport> {
    let mut surface = HeadlessSurface::new();
    if let Some(ticks) = config.ticks {
        surface = surface.with_max_ticks(ticks);
    }
    if let Some(duration) = config.duration {
        surface = surface.with_max_duration(duration);
    }
    let report = session.run(&mut surface)?;

    if let (Some(path), Some(display)) = (&config.snapshot, surface.display_image()) {
        display.save(path)?;
        info!("snapshot written to {}", path.display());
    }
    Ok(report)
}

#[cfg(feature = "egui-surface")]
fn run_window(session: ViewerSession) -> CaptureResult<SessionReport> {
    let mut surface = capview::render::EguiSurface::new("capview");
    session.run(&mut surface)
}

#[cfg(not(feature = "egui-surface"))]
fn run_window(_session: ViewerSession) -> CaptureResult<SessionReport> {
    Err(capview::CaptureError::config(
        "surface",
        "window",
        "window support is not compiled in",
    )
    .with_recovery_suggestion("use --surface headless or rebuild with --features egui-surface"))
}

/// Parse duration string like "30s", "2m", "1h" into seconds
fn parse_duration(duration: &str) -> Result<u32> {
    if let Ok(seconds) = duration.parse::<u32>() {
        return Ok(seconds);
    }

    let Some((split, unit)) = duration.char_indices().last() else {
        return Err(anyhow!("Invalid duration format: {}", duration));
    };
    if split == 0 {
        return Err(anyhow!("Invalid duration format: {}", duration));
    }

    let num_str = &duration[..split];
    let num: u32 = num_str
        .parse()
        .map_err(|_| anyhow!("Invalid number in duration: {}", num_str))?;

    let scale = match unit {
        's' => 1,
        'm' => 60,
        'h' => 3600,
        _ => {
            return Err(anyhow!(
                "Invalid duration unit: {}. Use 's' for seconds, 'm' for minutes, 'h' for hours",
                unit
            ));
        }
    };
    num.checked_mul(scale)
        .ok_or_else(|| anyhow!("Duration too long: {}", duration))
}
