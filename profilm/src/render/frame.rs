use crate::foundation::core::{Canvas, Rgb8};

/// One opaque RGBA8 output frame, row-major, alpha fixed at 255.
///
/// Fully overwritten every frame; the session reuses the allocation.
#[derive(Clone, Debug)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    /// Allocate an opaque black frame for `canvas`.
    pub fn new(canvas: Canvas) -> Self {
        let len = canvas.width as usize * canvas.height as usize * 4;
        let mut frame = Self { width: canvas.width, height: canvas.height, data: vec![0; len] };
        frame.clear(Rgb8::new(0, 0, 0));
        frame
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Canvas geometry of this frame.
    pub fn canvas(&self) -> Canvas {
        Canvas { width: self.width, height: self.height }
    }

    /// Raw RGBA8 bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Fill the whole frame with an opaque color.
    pub fn clear(&mut self, color: Rgb8) {
        for px in self.data.chunks_exact_mut(4) {
            px[0] = color.r;
            px[1] = color.g;
            px[2] = color.b;
            px[3] = 255;
        }
    }

    fn idx(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * 4)
    }

    /// Blend `color` over the pixel at `(x, y)` with coverage `cov` in
    /// `[0, 1]`. Out-of-bounds coordinates are ignored.
    pub fn blend_px(&mut self, x: i64, y: i64, color: Rgb8, cov: f64) {
        if cov <= 0.0 {
            return;
        }
        let Some(i) = self.idx(x, y) else { return };
        let c = ((cov.min(1.0) * 255.0).round() as u32).min(255) as u16;
        let inv = 255 - c;
        let px = &mut self.data[i..i + 4];
        px[0] = mul_div255(u16::from(color.r), c) + mul_div255(u16::from(px[0]), inv);
        px[1] = mul_div255(u16::from(color.g), c) + mul_div255(u16::from(px[1]), inv);
        px[2] = mul_div255(u16::from(color.b), c) + mul_div255(u16::from(px[2]), inv);
    }

    /// Additively brighten the pixel at `(x, y)` by `color` scaled by `cov`.
    /// Saturates per channel; out-of-bounds coordinates are ignored.
    pub fn add_px(&mut self, x: i64, y: i64, color: Rgb8, cov: f64) {
        if cov <= 0.0 {
            return;
        }
        let Some(i) = self.idx(x, y) else { return };
        let c = ((cov.min(1.0) * 255.0).round() as u32).min(255) as u16;
        let px = &mut self.data[i..i + 4];
        px[0] = px[0].saturating_add(mul_div255(u16::from(color.r), c));
        px[1] = px[1].saturating_add(mul_div255(u16::from(color.g), c));
        px[2] = px[2].saturating_add(mul_div255(u16::from(color.b), c));
    }

    /// Multiply the pixel's channels by `k` in `[0, 1]`. Used by the vignette.
    pub fn scale_px(&mut self, x: i64, y: i64, k: f64) {
        let Some(i) = self.idx(x, y) else { return };
        let kq = ((k.clamp(0.0, 1.0) * 255.0).round() as u32).min(255) as u16;
        let px = &mut self.data[i..i + 4];
        px[0] = mul_div255(u16::from(px[0]), kq);
        px[1] = mul_div255(u16::from(px[1]), kq);
        px[2] = mul_div255(u16::from(px[2]), kq);
    }

    /// Read back a pixel's color. `None` when out of bounds.
    pub fn get_px(&self, x: i64, y: i64) -> Option<Rgb8> {
        let i = self.idx(x, y)?;
        Some(Rgb8::new(self.data[i], self.data[i + 1], self.data[i + 2]))
    }
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}
