//! Profilm renders a browser fingerprint profile into a deterministic short
//! film: a few minutes of monologue and set-piece scenes over a seeded
//! constellation of the profile's identifying signals, encoded to MP4 with a
//! synthesized score.
//!
//! Everything on screen is a pure function of the profile record and the
//! seed derived from its visitor id. The public API is session-oriented:
//!
//! - Load and validate a [`ProfileRecord`]
//! - Create a [`RenderSession`]
//! - Render single frames, stream a range into a [`FrameSink`], or produce
//!   the finished artifact with [`RenderSession::render_to_file`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Score synthesis keyed to the block schedule.
pub mod audio;
/// Encoding sinks and the audio mux step.
pub mod encode;
/// Shared vocabulary: frame/time types, errors, easing, deterministic RNG.
pub mod foundation;
/// Profile record boundary model.
pub mod profile;
/// CPU rasterizer: frame buffer, primitives, text, painters.
pub mod render;
/// Session-oriented rendering API.
pub mod session;
/// Script construction: record in, timed block schedule out.
pub mod timeline;
/// The seeded ambient world.
pub mod world;

pub use crate::foundation::core::{Canvas, Fps, FrameIndex, FrameRange, Point, Rgb8, Vec2};
pub use crate::foundation::error::{ProfilmError, ProfilmResult};
pub use crate::foundation::math::{DEFAULT_SEED, derive_seed};

pub use crate::audio::synth::{AudioTrack, synthesize};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path};
pub use crate::encode::mux::{MuxReport, mux_with_audio};
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use crate::profile::record::ProfileRecord;
pub use crate::render::frame::Frame;
pub use crate::render::text::Typeface;
pub use crate::session::progress::Progress;
pub use crate::session::render_session::{
    RenderConfig, RenderReport, RenderSession, RenderStats,
};
pub use crate::timeline::builder::{ScriptVariant, build as build_schedule};
pub use crate::timeline::schedule::Schedule;
pub use crate::world::graph::World;
