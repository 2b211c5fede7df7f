//! Shared vocabulary: frame/time types, errors, easing, deterministic RNG.

/// Frame indices, ranges, rational FPS, canvas and color types.
pub mod core;
/// Easing curves for appearance and fade envelopes.
pub mod ease;
/// Crate-wide error type and result alias.
pub mod error;
/// Seed derivation, the deterministic LCG and small numeric helpers.
pub mod math;
