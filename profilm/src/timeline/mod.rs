//! Script construction: profile record in, timed block schedule out.

/// Blocks, their pacing constants and alpha envelopes.
pub mod block;
/// The configurable script builder.
pub mod builder;
/// The frame-addressable block schedule.
pub mod schedule;
