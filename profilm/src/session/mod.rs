//! The render session: owns a profile's schedule and drives full passes.

/// Progress snapshots and the periodic reporter.
pub mod progress;
/// The session type, its config and the streaming render passes.
pub mod render_session;
