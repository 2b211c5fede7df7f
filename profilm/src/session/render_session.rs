use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, ensure_parent_dir};
use crate::encode::mux::mux_with_audio;
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{Canvas, Fps, FrameIndex, FrameRange};
use crate::foundation::error::{ProfilmError, ProfilmResult};
use crate::profile::record::ProfileRecord;
use crate::render::frame::Frame;
use crate::render::paint::{PaintCtx, SceneParams, paint_frame};
use crate::render::text::Typeface;
use crate::session::progress::ProgressReporter;
use crate::timeline::builder::{ScriptVariant, build};
use crate::timeline::schedule::Schedule;
use crate::world::graph::World;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

/// Everything a render pass needs besides the profile record.
#[derive(Clone, Debug)]
pub struct RenderConfig {
    /// Output geometry. Both sides must be even for yuv420p output.
    pub canvas: Canvas,
    /// Output frame rate.
    pub fps: Fps,
    /// Which block set the film uses.
    pub variant: ScriptVariant,
    /// Explicit font file; `None` walks the discovery list.
    pub font_path: Option<PathBuf>,
    /// Print the visitor id and frame counter in the corner.
    pub watermark: bool,
    /// Synthesize and mux the score.
    pub enable_audio: bool,
    /// Overwrite the output file if it already exists.
    pub overwrite: bool,
    /// Kill the mux child past this bound. Zero fails the mux outright,
    /// which downgrades to a silent delivery.
    pub mux_timeout: Duration,
    /// Fail the render when the encoder accepts nothing for this long.
    pub stall_timeout: Duration,
    /// Bounded frame queue depth between producer and encoder thread.
    pub channel_capacity: usize,
    /// Log progress every N frames; zero disables the reports.
    pub progress_every: u64,
    /// Optional hard cap on film length in seconds.
    pub duration_cap_secs: Option<f64>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas { width: 1920, height: 1080 },
            fps: Fps { num: 30, den: 1 },
            variant: ScriptVariant::Full,
            font_path: None,
            watermark: true,
            enable_audio: true,
            overwrite: false,
            mux_timeout: Duration::from_secs(60),
            stall_timeout: Duration::from_secs(30),
            channel_capacity: 4,
            progress_every: 150,
            duration_cap_secs: None,
        }
    }
}

impl RenderConfig {
    /// Check the geometry, rate and pipeline knobs.
    pub fn validate(&self) -> ProfilmResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(ProfilmError::validation("canvas width/height must be non-zero"));
        }
        if !self.canvas.width.is_multiple_of(2) || !self.canvas.height.is_multiple_of(2) {
            return Err(ProfilmError::validation(
                "canvas width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if self.fps.num == 0 || self.fps.den == 0 {
            return Err(ProfilmError::validation("fps must be non-zero"));
        }
        if self.channel_capacity == 0 {
            return Err(ProfilmError::validation("channel_capacity must be >= 1"));
        }
        if self.stall_timeout.is_zero() {
            return Err(ProfilmError::validation("stall_timeout must be non-zero"));
        }
        if let Some(cap) = self.duration_cap_secs
            && !(cap > 0.0 && cap.is_finite())
        {
            return Err(ProfilmError::validation(
                "duration_cap_secs must be positive and finite when set",
            ));
        }
        Ok(())
    }
}

/// Counters for one sink pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderStats {
    /// Frames produced and delivered.
    pub frames: u64,
    /// Wall-clock seconds for the pass.
    pub wall_secs: f64,
}

/// Summary of a finished file render.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderReport {
    /// Final artifact path.
    pub out_path: PathBuf,
    /// Artifact size in bytes.
    pub bytes: u64,
    /// Frames in the artifact.
    pub frames: u64,
    /// Wall-clock seconds end to end.
    pub wall_secs: f64,
    /// `false` when the score failed and the silent video shipped instead.
    pub audio_muxed: bool,
}

/// One profile rendered as a film.
///
/// A session owns the derived schedule, the loaded typeface and the scene
/// constants; each render pass grows its own [`World`] from the schedule
/// seed, so passes never contaminate each other.
pub struct RenderSession {
    record: ProfileRecord,
    config: RenderConfig,
    schedule: Schedule,
    face: Typeface,
    params: SceneParams,
    watermark: Option<String>,
}

impl RenderSession {
    /// Build a session: validate the config, derive the schedule from the
    /// record and load a typeface.
    pub fn new(record: ProfileRecord, config: RenderConfig) -> ProfilmResult<Self> {
        config.validate()?;
        let schedule = build(&record, config.variant, config.fps)?;
        let face = Typeface::load(config.font_path.as_deref())?;
        let params = SceneParams {
            price_usd: record.pricing.price_usd,
            total_bits: record.entropy.total_bits,
        };
        let watermark = if config.watermark {
            record.visitor_id.clone().filter(|id| !id.is_empty())
        } else {
            None
        };
        Ok(Self { record, config, schedule, face, params, watermark })
    }

    /// The derived block schedule.
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// The session configuration.
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Film length in frames, after the optional duration cap.
    pub fn frames_total(&self) -> u64 {
        let total = self.schedule.total_frames();
        match self.config.duration_cap_secs {
            Some(cap) => total.min(self.config.fps.secs_to_frames_round(cap).max(1)),
            None => total,
        }
    }

    /// Render a single frame.
    ///
    /// The world is regrown and stepped frame by frame up to `frame`, so the
    /// result is pixel-identical to the same frame of a streaming pass.
    pub fn render_frame(&self, frame: FrameIndex) -> ProfilmResult<Frame> {
        if frame.0 >= self.frames_total() {
            return Err(ProfilmError::validation(format!(
                "frame {} is out of range (film is {} frames)",
                frame.0,
                self.frames_total()
            )));
        }

        let mut world = World::generate(&self.record, self.schedule.seed(), self.config.canvas);
        for f in 0..=frame.0 {
            world.advance(self.config.fps.frames_to_secs(f));
        }
        let mut out = Frame::new(self.config.canvas);
        paint_frame(&mut out, &world, &self.paint_ctx(), frame);
        Ok(out)
    }

    /// Render a frame range and stream the frames into a sink.
    ///
    /// The producer paints sequentially while a dedicated thread drains the
    /// bounded channel into the sink, so a slow encoder suspends painting
    /// instead of buffering the film. A queue that stays full past
    /// `stall_timeout` fails the pass with an encode error. Frames arrive at
    /// the sink in submission order, none skipped or duplicated.
    pub fn render_to_sink(
        &self,
        range: FrameRange,
        sink: &mut dyn FrameSink,
    ) -> ProfilmResult<RenderStats> {
        if range.is_empty() {
            return Err(ProfilmError::validation("render range must be non-empty"));
        }
        if range.end.0 > self.frames_total() {
            return Err(ProfilmError::validation(
                "render range must be within the film duration",
            ));
        }

        let cfg = SinkConfig { canvas: self.config.canvas, fps: self.config.fps };
        let cap = self.config.channel_capacity.max(1);
        let stall = self.config.stall_timeout;
        let started = Instant::now();

        std::thread::scope(|scope| -> ProfilmResult<RenderStats> {
            let (tx, rx) = mpsc::sync_channel::<FrameMsg>(cap);
            let sink_ref: &mut dyn FrameSink = sink;

            let enc = scope.spawn(move || -> ProfilmResult<()> {
                sink_ref.begin(cfg)?;
                while let Ok(msg) = rx.recv() {
                    sink_ref.push_frame(msg.idx, &msg.frame)?;
                }
                sink_ref.end()
            });

            let produce = (|| -> ProfilmResult<u64> {
                let mut world =
                    World::generate(&self.record, self.schedule.seed(), self.config.canvas);
                let ctx = self.paint_ctx();
                let reporter = ProgressReporter::new(range.len_frames(), self.config.progress_every);
                for f in range.start.0..range.end.0 {
                    world.advance(self.config.fps.frames_to_secs(f));
                    let mut frame = Frame::new(self.config.canvas);
                    paint_frame(&mut frame, &world, &ctx, FrameIndex(f));
                    send_with_deadline(&tx, FrameMsg { idx: FrameIndex(f), frame }, stall)?;

                    if let Some(p) = reporter.tick(f - range.start.0 + 1) {
                        tracing::info!(
                            "rendered {}/{} frames ({:.0}%, {:.1} fps, eta {:.0}s)",
                            p.frames_done,
                            p.frames_total,
                            p.percent,
                            p.effective_fps,
                            p.eta_secs
                        );
                    }
                }
                Ok(range.len_frames())
            })();

            drop(tx);
            let enc_res = enc
                .join()
                .map_err(|_| ProfilmError::encode("encoder thread panicked"))?;

            match (produce, enc_res) {
                (Ok(frames), Ok(())) => {
                    Ok(RenderStats { frames, wall_secs: started.elapsed().as_secs_f64() })
                }
                (Err(p), Ok(())) => Err(p),
                // Encoder failures carry the ffmpeg stderr; the producer only
                // ever sees a closed channel.
                (Ok(_), Err(e)) | (Err(_), Err(e)) => Err(e),
            }
        })
    }

    /// Render the whole film to an MP4 at `out_path`.
    ///
    /// The silent video encodes to a staging file beside the target and is
    /// renamed into place only when complete, so interruption never leaves a
    /// partial artifact at `out_path`. A failed score downgrades to shipping
    /// the silent video under a warning.
    pub fn render_to_file(&self, out_path: impl AsRef<Path>) -> ProfilmResult<RenderReport> {
        let out_path = out_path.as_ref();
        let started = Instant::now();
        if !self.config.overwrite && out_path.exists() {
            return Err(ProfilmError::validation(format!(
                "output file '{}' already exists",
                out_path.display()
            )));
        }
        ensure_parent_dir(out_path)?;

        let video_stage = stage_path(out_path, "video");
        let mut video_guard = TempFileGuard(Some(video_stage.clone()));
        let range = FrameRange::new(FrameIndex(0), FrameIndex(self.frames_total()))?;
        let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(&video_stage));
        let stats = self.render_to_sink(range, &mut sink)?;

        let mut mux_guard = TempFileGuard(None);
        let mut audio_muxed = false;
        let finalized = if self.config.enable_audio {
            match self.stage_score(out_path, &video_stage) {
                Ok(muxed) => {
                    mux_guard.0 = Some(muxed.clone());
                    audio_muxed = true;
                    muxed
                }
                Err(e) if e.is_recoverable() => {
                    tracing::warn!("score failed, shipping silent video: {e}");
                    video_stage.clone()
                }
                Err(e) => return Err(e),
            }
        } else {
            video_stage.clone()
        };

        promote(&finalized, out_path)?;
        if finalized == video_stage {
            video_guard.0 = None;
        } else {
            mux_guard.0 = None;
        }

        let bytes = std::fs::metadata(out_path)
            .map_err(|e| ProfilmError::io(format!("failed to stat '{}'", out_path.display()), e))?
            .len();
        let wall_secs = started.elapsed().as_secs_f64();
        tracing::info!(
            "wrote {} ({} frames, {} bytes, {:.1}s{})",
            out_path.display(),
            stats.frames,
            bytes,
            wall_secs,
            if audio_muxed { "" } else { ", silent" }
        );
        Ok(RenderReport {
            out_path: out_path.to_path_buf(),
            bytes,
            frames: stats.frames,
            wall_secs,
            audio_muxed,
        })
    }

    /// Synthesize the score, write it to a temp PCM file and mux it with the
    /// staged video. Returns the muxed staging path.
    fn stage_score(&self, out_path: &Path, video: &Path) -> ProfilmResult<PathBuf> {
        let track = crate::audio::synth::synthesize(&self.schedule)?;
        let pcm = std::env::temp_dir().join(format!(
            "profilm_score_{}_{}.s16le",
            std::process::id(),
            unix_nanos()
        ));
        let _pcm_guard = TempFileGuard(Some(pcm.clone()));
        track.write_s16le(&pcm)?;

        let muxed = stage_path(out_path, "muxed");
        let report =
            mux_with_audio(video, &pcm, &muxed, track.sample_rate, self.config.mux_timeout)?;
        tracing::debug!("muxed score (exit code {:?})", report.exit_code);
        Ok(muxed)
    }

    fn paint_ctx(&self) -> PaintCtx<'_> {
        PaintCtx {
            schedule: &self.schedule,
            face: &self.face,
            params: self.params,
            watermark: self.watermark.as_deref(),
        }
    }
}

#[derive(Debug)]
struct FrameMsg {
    idx: FrameIndex,
    frame: Frame,
}

/// Offer `msg` to the bounded channel, waiting at most `stall` for space.
fn send_with_deadline(
    tx: &mpsc::SyncSender<FrameMsg>,
    msg: FrameMsg,
    stall: Duration,
) -> ProfilmResult<()> {
    let deadline = Instant::now() + stall;
    let mut msg = msg;
    loop {
        match tx.try_send(msg) {
            Ok(()) => return Ok(()),
            Err(mpsc::TrySendError::Full(back)) => {
                if Instant::now() >= deadline {
                    return Err(ProfilmError::encode(format!(
                        "encoder stalled: frame queue stayed full for {:.1}s",
                        stall.as_secs_f64()
                    )));
                }
                msg = back;
                std::thread::sleep(Duration::from_millis(5));
            }
            Err(mpsc::TrySendError::Disconnected(_)) => {
                return Err(ProfilmError::encode("encoder thread is not accepting frames"));
            }
        }
    }
}

/// Staging path beside `out`, shielded from globbers with a dot prefix.
fn stage_path(out: &Path, tag: &str) -> PathBuf {
    let stem = out.file_stem().and_then(|s| s.to_str()).unwrap_or("profilm");
    out.with_file_name(format!(".{stem}.{}.{tag}.mp4", std::process::id()))
}

/// Move a finished staging file into place. Same-directory rename keeps the
/// swap atomic on the target filesystem.
fn promote(src: &Path, dst: &Path) -> ProfilmResult<()> {
    std::fs::rename(src, dst).map_err(|e| {
        ProfilmError::io(
            format!("failed to move '{}' into place at '{}'", src.display(), dst.display()),
            e,
        )
    })
}

fn unix_nanos() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0)
}

struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::sink::InMemorySink;

    fn record() -> ProfileRecord {
        ProfileRecord {
            visitor_id: Some("v-1".to_owned()),
            device: crate::profile::record::DeviceFacts {
                browser: "Chrome 120".to_owned(),
                platform: "macOS".to_owned(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn config() -> RenderConfig {
        RenderConfig {
            canvas: Canvas { width: 64, height: 36 },
            progress_every: 0,
            ..RenderConfig::default()
        }
    }

    fn font_available() -> bool {
        Typeface::load(None).is_ok()
    }

    #[test]
    fn config_rejects_odd_dimensions() {
        let cfg = RenderConfig {
            canvas: Canvas { width: 63, height: 36 },
            ..RenderConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn config_rejects_zero_capacity_and_zero_stall() {
        let cfg = RenderConfig { channel_capacity: 0, ..RenderConfig::default() };
        assert!(cfg.validate().is_err());
        let cfg = RenderConfig { stall_timeout: Duration::ZERO, ..RenderConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn stage_path_lands_beside_the_target() {
        let p = stage_path(Path::new("/tmp/out/film.mp4"), "video");
        assert_eq!(p.parent(), Some(Path::new("/tmp/out")));
        let name = p.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with(".film."));
        assert!(name.ends_with(".video.mp4"));
    }

    #[test]
    fn promote_renames_bytes_unchanged() {
        let dir = std::env::temp_dir().join(format!("profilm-promote-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let src = dir.join("stage.mp4");
        let dst = dir.join("final.mp4");
        std::fs::write(&src, b"silent-video-bytes").unwrap();

        promote(&src, &dst).unwrap();

        assert!(!src.exists());
        assert_eq!(std::fs::read(&dst).unwrap(), b"silent-video-bytes");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn duration_cap_limits_the_frame_count() {
        if !font_available() {
            eprintln!("skipping: no system font available");
            return;
        }
        let uncapped = RenderSession::new(record(), config()).unwrap();
        let capped = RenderSession::new(
            record(),
            RenderConfig { duration_cap_secs: Some(1.0), ..config() },
        )
        .unwrap();
        assert!(uncapped.frames_total() > 30);
        assert_eq!(capped.frames_total(), 30);
    }

    #[test]
    fn render_to_sink_delivers_every_frame_in_order() {
        if !font_available() {
            eprintln!("skipping: no system font available");
            return;
        }
        let sess = RenderSession::new(record(), config()).unwrap();
        let range = FrameRange::new(FrameIndex(0), FrameIndex(16)).unwrap();
        let mut sink = InMemorySink::new();
        let stats = sess.render_to_sink(range, &mut sink).unwrap();

        assert_eq!(stats.frames, 16);
        assert_eq!(sink.frames.len(), 16);
        for (i, (idx, frame)) in sink.frames.iter().enumerate() {
            assert_eq!(idx.0, i as u64);
            assert_eq!(frame.canvas(), Canvas { width: 64, height: 36 });
        }
        assert_eq!(
            sink.config().map(|c| c.fps),
            Some(Fps { num: 30, den: 1 })
        );
    }

    #[test]
    fn render_frame_matches_the_streaming_pass() {
        if !font_available() {
            eprintln!("skipping: no system font available");
            return;
        }
        let sess = RenderSession::new(record(), config()).unwrap();
        let range = FrameRange::new(FrameIndex(0), FrameIndex(12)).unwrap();
        let mut sink = InMemorySink::new();
        sess.render_to_sink(range, &mut sink).unwrap();

        let single = sess.render_frame(FrameIndex(11)).unwrap();
        assert_eq!(single.data(), sink.frames[11].1.data());
    }

    #[test]
    fn render_frame_rejects_out_of_range() {
        if !font_available() {
            eprintln!("skipping: no system font available");
            return;
        }
        let sess = RenderSession::new(record(), config()).unwrap();
        let past_end = sess.frames_total();
        assert!(sess.render_frame(FrameIndex(past_end)).is_err());
    }

    /// Accepts every frame but naps first on every other push, so the
    /// bounded queue repeatedly fills while the producer is still painting.
    struct StutterSink {
        inner: InMemorySink,
        pushes: u64,
    }

    impl FrameSink for StutterSink {
        fn begin(&mut self, cfg: SinkConfig) -> ProfilmResult<()> {
            self.inner.begin(cfg)
        }

        fn push_frame(&mut self, idx: FrameIndex, frame: &Frame) -> ProfilmResult<()> {
            if self.pushes.is_multiple_of(2) {
                std::thread::sleep(Duration::from_millis(3));
            }
            self.pushes += 1;
            self.inner.push_frame(idx, frame)
        }

        fn end(&mut self) -> ProfilmResult<()> {
            self.inner.end()
        }
    }

    #[test]
    fn slow_sink_backpressure_drops_and_reorders_nothing() {
        if !font_available() {
            eprintln!("skipping: no system font available");
            return;
        }
        let sess = RenderSession::new(
            record(),
            RenderConfig { channel_capacity: 2, ..config() },
        )
        .unwrap();
        let range = FrameRange::new(FrameIndex(0), FrameIndex(24)).unwrap();
        let mut sink = StutterSink { inner: InMemorySink::new(), pushes: 0 };
        sess.render_to_sink(range, &mut sink).unwrap();

        assert_eq!(sink.inner.frames.len(), 24);
        for (i, (idx, _)) in sink.inner.frames.iter().enumerate() {
            assert_eq!(idx.0, i as u64, "frame order must survive backpressure");
        }
    }

    /// Swallows the channel whole: never returns from the nap quickly
    /// enough for the queue to drain.
    struct FrozenSink {
        nap: Duration,
    }

    impl FrameSink for FrozenSink {
        fn begin(&mut self, _cfg: SinkConfig) -> ProfilmResult<()> {
            Ok(())
        }

        fn push_frame(&mut self, _idx: FrameIndex, _frame: &Frame) -> ProfilmResult<()> {
            std::thread::sleep(self.nap);
            Ok(())
        }

        fn end(&mut self) -> ProfilmResult<()> {
            Ok(())
        }
    }

    #[test]
    fn stalled_encoder_fails_with_an_encode_error() {
        if !font_available() {
            eprintln!("skipping: no system font available");
            return;
        }
        let sess = RenderSession::new(
            record(),
            RenderConfig {
                channel_capacity: 1,
                stall_timeout: Duration::from_millis(120),
                ..config()
            },
        )
        .unwrap();
        let range = FrameRange::new(FrameIndex(0), FrameIndex(8)).unwrap();
        let mut sink = FrozenSink { nap: Duration::from_millis(400) };
        let err = sess.render_to_sink(range, &mut sink).unwrap_err();
        assert!(err.to_string().contains("stalled"), "{err}");
    }

    struct FailingSink {
        fail_at: u64,
    }

    impl FrameSink for FailingSink {
        fn begin(&mut self, _cfg: SinkConfig) -> ProfilmResult<()> {
            Ok(())
        }

        fn push_frame(&mut self, idx: FrameIndex, _frame: &Frame) -> ProfilmResult<()> {
            if idx.0 >= self.fail_at {
                return Err(ProfilmError::encode("sink gave up"));
            }
            Ok(())
        }

        fn end(&mut self) -> ProfilmResult<()> {
            Ok(())
        }
    }

    #[test]
    fn sink_failure_surfaces_the_sink_error() {
        if !font_available() {
            eprintln!("skipping: no system font available");
            return;
        }
        let sess = RenderSession::new(record(), config()).unwrap();
        let range = FrameRange::new(FrameIndex(0), FrameIndex(8)).unwrap();
        let mut sink = FailingSink { fail_at: 3 };
        let err = sess.render_to_sink(range, &mut sink).unwrap_err();
        assert!(err.to_string().contains("sink gave up"), "{err}");
    }
}
