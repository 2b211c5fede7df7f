//! Score synthesis keyed to the block schedule.

/// The layered synthesizer and raw PCM output.
pub mod synth;
