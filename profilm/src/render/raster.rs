//! Analytic anti-aliased primitives over an opaque frame.
//!
//! Coverage at a pixel is the signed distance to the shape edge pushed
//! through a half-pixel ramp, scaled by the caller's alpha.

use crate::foundation::core::{Point, Rgb8, Vec2};
use crate::render::frame::Frame;
use std::f64::consts::TAU;

fn edge_cov(signed_dist_inside: f64) -> f64 {
    (signed_dist_inside + 0.5).clamp(0.0, 1.0)
}

/// Solid anti-aliased disc.
pub fn fill_circle(frame: &mut Frame, center: Point, radius: f64, color: Rgb8, alpha: f64) {
    if alpha <= 0.0 || radius <= 0.0 {
        return;
    }
    let x0 = (center.x - radius - 1.0).floor() as i64;
    let x1 = (center.x + radius + 1.0).ceil() as i64;
    let y0 = (center.y - radius - 1.0).floor() as i64;
    let y1 = (center.y + radius + 1.0).ceil() as i64;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let d = (Point::new(x as f64, y as f64) - center).hypot();
            frame.blend_px(x, y, color, edge_cov(radius - d) * alpha);
        }
    }
}

/// Additive radial glow with quadratic falloff, `radius` wide.
pub fn glow_circle(frame: &mut Frame, center: Point, radius: f64, color: Rgb8, alpha: f64) {
    if alpha <= 0.0 || radius <= 0.0 {
        return;
    }
    let x0 = (center.x - radius).floor() as i64;
    let x1 = (center.x + radius).ceil() as i64;
    let y0 = (center.y - radius).floor() as i64;
    let y1 = (center.y + radius).ceil() as i64;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let d = (Point::new(x as f64, y as f64) - center).hypot();
            if d < radius {
                let k = 1.0 - d / radius;
                frame.add_px(x, y, color, alpha * k * k);
            }
        }
    }
}

fn dist_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len2 = ab.hypot2();
    if len2 == 0.0 {
        return (p - a).hypot();
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).hypot()
}

/// Anti-aliased line segment of the given stroke width.
pub fn stroke_line(frame: &mut Frame, a: Point, b: Point, width: f64, color: Rgb8, alpha: f64) {
    if alpha <= 0.0 || width <= 0.0 {
        return;
    }
    let pad = width / 2.0 + 1.0;
    let x0 = (a.x.min(b.x) - pad).floor() as i64;
    let x1 = (a.x.max(b.x) + pad).ceil() as i64;
    let y0 = (a.y.min(b.y) - pad).floor() as i64;
    let y1 = (a.y.max(b.y) + pad).ceil() as i64;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let d = dist_to_segment(Point::new(x as f64, y as f64), a, b);
            frame.blend_px(x, y, color, edge_cov(width / 2.0 - d) * alpha);
        }
    }
}

/// Anti-aliased circle outline.
pub fn stroke_ring(frame: &mut Frame, center: Point, radius: f64, width: f64, color: Rgb8, alpha: f64) {
    if alpha <= 0.0 || radius <= 0.0 {
        return;
    }
    let outer = radius + width / 2.0 + 1.0;
    let inner = (radius - width / 2.0 - 1.0).max(0.0);
    let x0 = (center.x - outer).floor() as i64;
    let x1 = (center.x + outer).ceil() as i64;
    let y0 = (center.y - outer).floor() as i64;
    let y1 = (center.y + outer).ceil() as i64;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let d = (Point::new(x as f64, y as f64) - center).hypot();
            if d < inner || d > outer {
                continue;
            }
            frame.blend_px(x, y, color, edge_cov(width / 2.0 - (d - radius).abs()) * alpha);
        }
    }
}

/// Short radial tick marks around a circle, rotated by `phase`.
pub fn ring_ticks(
    frame: &mut Frame,
    center: Point,
    radius: f64,
    phase: f64,
    count: u32,
    len: f64,
    color: Rgb8,
    alpha: f64,
) {
    if alpha <= 0.0 || count == 0 {
        return;
    }
    for i in 0..count {
        let angle = phase + f64::from(i) * TAU / f64::from(count);
        let dir = Vec2::new(angle.cos(), angle.sin());
        let a = center + dir * (radius - len / 2.0);
        let b = center + dir * (radius + len / 2.0);
        stroke_line(frame, a, b, 1.0, color, alpha);
    }
}

/// Solid anti-aliased diamond (L1 ball) of "radius" `r`.
pub fn fill_diamond(frame: &mut Frame, center: Point, r: f64, color: Rgb8, alpha: f64) {
    if alpha <= 0.0 || r <= 0.0 {
        return;
    }
    let x0 = (center.x - r - 1.0).floor() as i64;
    let x1 = (center.x + r + 1.0).ceil() as i64;
    let y0 = (center.y - r - 1.0).floor() as i64;
    let y1 = (center.y + r + 1.0).ceil() as i64;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let d = (x as f64 - center.x).abs() + (y as f64 - center.y).abs();
            // L1 edge distance scaled so diagonals are as crisp as axes.
            frame.blend_px(x, y, color, edge_cov((r - d) * std::f64::consts::FRAC_1_SQRT_2) * alpha);
        }
    }
}

/// Soft-edged filled rectangle, feathered `feather` pixels outward.
/// Used as the backdrop glow behind text.
pub fn fill_rect_soft(
    frame: &mut Frame,
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    feather: f64,
    color: Rgb8,
    alpha: f64,
) {
    if alpha <= 0.0 || x1 <= x0 || y1 <= y0 {
        return;
    }
    let feather = feather.max(0.5);
    let px0 = (x0 - feather).floor() as i64;
    let px1 = (x1 + feather).ceil() as i64;
    let py0 = (y0 - feather).floor() as i64;
    let py1 = (y1 + feather).ceil() as i64;
    for y in py0..=py1 {
        for x in px0..=px1 {
            let fx = x as f64;
            let fy = y as f64;
            let inside = (fx - x0).min(x1 - fx).min(fy - y0).min(y1 - fy);
            let cov = ((inside + feather) / feather).clamp(0.0, 1.0);
            frame.blend_px(x, y, color, cov * alpha);
        }
    }
}

/// Darken toward the frame edges. `strength` is the corner darkening in
/// `[0, 1]`; the center is untouched.
pub fn vignette(frame: &mut Frame, strength: f64) {
    if strength <= 0.0 {
        return;
    }
    let w = frame.width() as i64;
    let h = frame.height() as i64;
    let hw = w as f64 / 2.0;
    let hh = h as f64 / 2.0;
    for y in 0..h {
        let ny = (y as f64 - hh) / hh;
        for x in 0..w {
            let nx = (x as f64 - hw) / hw;
            let d2 = (nx * nx + ny * ny) / 2.0;
            let k = 1.0 - strength * d2;
            if k < 0.999 {
                frame.scale_px(x, y, k);
            }
        }
    }
}
