//! Encoding sinks and the audio mux step.
//!
//! Sinks consume rendered frames in timeline order and are driven by
//! `RenderSession::render_to_sink`.

/// `ffmpeg`-backed MP4 sink and subprocess helpers.
pub mod ffmpeg;
/// The bounded audio mux step.
pub mod mux;
/// Generic frame sink trait and built-in sinks.
pub mod sink;
