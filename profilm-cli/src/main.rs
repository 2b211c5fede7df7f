use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use profilm::{Canvas, Fps, FrameIndex, ProfileRecord, RenderConfig, RenderSession, ScriptVariant};

#[derive(Parser, Debug)]
#[command(name = "profilm", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Render the full film as an MP4 (requires `ffmpeg` on PATH).
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input profile JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Frame index (0-based).
    #[arg(long)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input profile JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Overwrite output if it already exists.
    #[arg(long, default_value_t = false)]
    overwrite: bool,

    /// Skip the synthesized score and ship the video silent.
    #[arg(long, default_value_t = false)]
    no_audio: bool,

    /// Cap the film length in seconds.
    #[arg(long)]
    duration_cap: Option<f64>,

    /// Kill a hung audio mux after this many seconds.
    #[arg(long, default_value_t = 60)]
    mux_timeout: u64,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Parser, Debug)]
struct CommonArgs {
    /// Script variant: full, essential or trailer.
    #[arg(long, default_value = "full")]
    variant: String,

    /// Explicit font file (otherwise common system locations are probed).
    #[arg(long)]
    font: Option<PathBuf>,

    /// Output width in pixels (must be even).
    #[arg(long, default_value_t = 1920)]
    width: u32,

    /// Output height in pixels (must be even).
    #[arg(long, default_value_t = 1080)]
    height: u32,

    /// Output frame rate.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Drop the corner watermark.
    #[arg(long, default_value_t = false)]
    no_watermark: bool,
}

impl CommonArgs {
    fn to_config(&self) -> anyhow::Result<RenderConfig> {
        Ok(RenderConfig {
            canvas: Canvas { width: self.width, height: self.height },
            fps: Fps::new(self.fps, 1)?,
            variant: parse_variant(&self.variant)?,
            font_path: self.font.clone(),
            watermark: !self.no_watermark,
            ..RenderConfig::default()
        })
    }
}

fn parse_variant(s: &str) -> anyhow::Result<ScriptVariant> {
    match s {
        "full" => Ok(ScriptVariant::Full),
        "essential" => Ok(ScriptVariant::Essential),
        "trailer" => Ok(ScriptVariant::Trailer),
        other => anyhow::bail!("unknown variant '{other}' (expected full, essential or trailer)"),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing_subscriber::filter::LevelFilter::INFO)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let record = ProfileRecord::from_path(&args.in_path)?;
    let sess = RenderSession::new(record, args.common.to_config()?)?;
    let frame = sess.render_frame(FrameIndex(args.frame))?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        frame.data(),
        frame.width(),
        frame.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let record = ProfileRecord::from_path(&args.in_path)?;
    let mut config = args.common.to_config()?;
    config.overwrite = args.overwrite;
    config.enable_audio = !args.no_audio;
    config.duration_cap_secs = args.duration_cap;
    config.mux_timeout = Duration::from_secs(args.mux_timeout);

    let sess = RenderSession::new(record, config)?;
    let report = sess.render_to_file(&args.out)?;

    eprintln!(
        "wrote {} ({} frames, {:.1}s{})",
        report.out_path.display(),
        report.frames,
        report.wall_secs,
        if report.audio_muxed { "" } else { ", silent" }
    );
    Ok(())
}
