//! CPU rasterizer: frame buffer, primitives, text and the frame painter.

/// The opaque RGBA8 frame buffer.
pub mod frame;
/// The per-frame painter and palette.
pub mod paint;
/// Coverage-based drawing primitives.
pub mod raster;
/// Scene set-piece painters.
pub mod scene;
/// Font loading, measurement and glyph drawing.
pub mod text;
