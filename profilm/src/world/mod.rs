//! The seeded node/connection/particle/ring state behind every frame.

/// World generation and per-frame advancement.
pub mod graph;
