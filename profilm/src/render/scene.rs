//! Per-kind scene painters.
//!
//! Each painter is a pure function of the world, the block-relative frame
//! and profile-derived constants; all state lives in the caller.

use crate::foundation::core::{Rgb8, Vec2};
use crate::foundation::ease::Ease;
use crate::foundation::math::lerp;
use crate::render::frame::Frame;
use crate::render::paint::{PaintCtx, ACCENT, EDGE, NODE_INFO, TEXT, VALUE};
use crate::render::raster;
use crate::render::text::Typeface;
use crate::timeline::block::{Block, SceneKind, BLOCK_BLACK};
use crate::world::graph::{NodeKind, World};
use std::f64::consts::TAU;

/// Radius where constellation bars start.
const BAR_BASE: f64 = 110.0;
/// Full-strength bar length.
const BAR_SPAN: f64 = 170.0;
/// Horizontal spacing of rain columns.
const RAIN_COL_W: f64 = 48.0;
/// Vertical spacing of rain glyphs.
const RAIN_STEP: f64 = 26.0;
const RAIN_TRAIL: usize = 14;
const RAIN_CHARS: &[u8] = b"0123456789$#%&*+=<>/";

/// Dispatch the active scene block to its painter.
pub(crate) fn paint_scene(
    frame: &mut Frame,
    world: &World,
    ctx: &PaintCtx<'_>,
    kind: SceneKind,
    block: &Block,
    local: u64,
) {
    let entrance = block.line_alpha(local, 0);
    if entrance <= 0.0 {
        return;
    }
    let span = (block.duration_frames() - BLOCK_BLACK).max(1);
    let t = (local as f64 / span as f64).clamp(0.0, 1.0);
    match kind {
        SceneKind::Emergence => emergence(frame, world, t, entrance),
        SceneKind::Identity => identity(frame, world, t, entrance),
        SceneKind::EntropyConstellation => {
            constellation(frame, world, ctx.face, ctx.params.total_bits, t, entrance);
        }
        SceneKind::Valuation => {
            valuation(frame, world, ctx.face, ctx.params.price_usd, t, entrance);
        }
        SceneKind::DataRain => {
            data_rain(frame, ctx.face, ctx.schedule.seed(), world.time(), entrance);
        }
        SceneKind::Outro => outro(frame, world, t, entrance),
    }
}

fn node_color(kind: &NodeKind) -> Rgb8 {
    match kind {
        NodeKind::Ambient => EDGE,
        _ => NODE_INFO,
    }
}

/// Nodes converge from far outside onto their constellation positions.
fn emergence(frame: &mut Frame, world: &World, t: f64, alpha: f64) {
    let center = world.canvas().center();
    let k = lerp(2.4, 1.0, Ease::InOutCubic.apply(t));
    for node in world.nodes().iter().skip(1) {
        let echo = center + (node.pos - center) * k;
        let color = node_color(&node.kind);
        raster::glow_circle(frame, echo, node.size * 2.4, color, 0.30 * alpha);
        raster::fill_circle(frame, echo, node.size * 0.8, color, 0.7 * alpha);
    }
    let ring_r = 420.0 * Ease::OutCubic.apply(t);
    raster::stroke_ring(frame, center, ring_r, 2.0, ACCENT, 0.18 * (1.0 - t) * alpha);
}

/// A breathing reticle locks onto the subject's center node.
fn identity(frame: &mut Frame, world: &World, _t: f64, alpha: f64) {
    let center = world.canvas().center();
    let time = world.time();
    let breath = 110.0 + 10.0 * (TAU * 0.25 * time).sin();
    raster::glow_circle(frame, center, breath, ACCENT, 0.30 * alpha);
    raster::stroke_ring(frame, center, 64.0, 1.5, ACCENT, 0.5 * alpha);
    for i in 0..4u32 {
        let angle = time * 0.3 + f64::from(i) * TAU / 4.0;
        let dir = Vec2::new(angle.cos(), angle.sin());
        raster::stroke_line(
            frame,
            center + dir * 56.0,
            center + dir * 78.0,
            2.0,
            ACCENT,
            0.6 * alpha,
        );
    }
}

/// Radial bars grow out of the base ring, one per signal, sized by bits.
fn constellation(
    frame: &mut Frame,
    world: &World,
    face: &Typeface,
    total_bits: f64,
    t: f64,
    alpha: f64,
) {
    let center = world.canvas().center();
    let grow = Ease::InOutCubic.apply((t * 1.4).min(1.0));
    raster::stroke_ring(frame, center, BAR_BASE, 1.0, EDGE, 0.3 * alpha);

    for node in world.signals() {
        let NodeKind::Signal { label, bits_norm } = &node.kind else { continue };
        let v = node.pos - center;
        let len = v.hypot();
        if len < 1e-9 {
            continue;
        }
        let dir = v / len;
        let bar = BAR_SPAN * bits_norm * grow;
        raster::stroke_line(
            frame,
            center + dir * BAR_BASE,
            center + dir * (BAR_BASE + bar),
            3.0,
            NODE_INFO,
            0.65 * alpha,
        );
        let anchor = center + dir * (BAR_BASE + bar + 22.0);
        face.draw_centered(frame, label, anchor.x, anchor.y + 5.0, 16.0, TEXT, 0.7 * alpha * grow);
    }

    let headline = format!("{total_bits:.1} bits");
    face.draw_centered(frame, &headline, center.x, center.y - 128.0, 30.0, ACCENT, 0.85 * alpha);
}

/// The price counts up from zero under a pulsing ring.
fn valuation(frame: &mut Frame, world: &World, face: &Typeface, price: f64, t: f64, alpha: f64) {
    let center = world.canvas().center();
    let u = Ease::InOutCubic.apply((t / 0.7).min(1.0));
    let shown = price * u;

    let pulse = 180.0 + 10.0 * (TAU * 0.8 * world.time()).sin();
    raster::stroke_ring(frame, center, pulse, 1.5, VALUE, 0.25 * alpha);
    raster::ring_ticks(frame, center, 206.0, world.time() * 0.2, 48, 8.0, VALUE, 0.18 * alpha);

    let headline = format!("${shown:.2}");
    let w = f64::from(frame.width());
    let px = face.fit_px(&headline, 120.0, w * 0.6);
    face.draw_centered(frame, &headline, center.x, center.y + 40.0, px, VALUE, alpha);
    face.draw_centered(
        frame,
        "estimated value per thousand impressions",
        center.x,
        center.y + 92.0,
        20.0,
        TEXT,
        0.55 * alpha,
    );
}

fn cell_hash(seed: u64, a: u64, b: u64) -> u64 {
    let mut x = seed
        ^ a.wrapping_mul(0xD6E8_FEB8_6659_FD93)
        ^ b.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    x ^= x >> 33;
    x = x.wrapping_mul(0xFF51_AFD7_ED55_8CCD);
    x ^ (x >> 29)
}

fn hash_unit(seed: u64, a: u64, b: u64) -> f64 {
    (cell_hash(seed, a, b) >> 11) as f64 / (1u64 << 53) as f64
}

/// Columns of glyphs stream downward, seeded per column.
fn data_rain(frame: &mut Frame, face: &Typeface, seed: u64, time: f64, alpha: f64) {
    let w = f64::from(frame.width());
    let h = f64::from(frame.height());
    let wrap_span = h + 400.0;
    let cols = (w / RAIN_COL_W).ceil() as u64;

    for col in 0..cols {
        let speed = 140.0 + 280.0 * hash_unit(seed, col, 1);
        let offset = wrap_span * hash_unit(seed, col, 2);
        let head = (offset + time * speed).rem_euclid(wrap_span) - 200.0;
        let x = col as f64 * RAIN_COL_W + 12.0;

        for j in 0..RAIN_TRAIL {
            let y = head - j as f64 * RAIN_STEP;
            if !(-30.0..h + 10.0).contains(&y) {
                continue;
            }
            // Glyphs are keyed to stream slots so they churn as the
            // column falls.
            let slot = (y / RAIN_STEP).floor() as i64 + 4096;
            let glyph = RAIN_CHARS[(cell_hash(seed, col, slot as u64)
                % RAIN_CHARS.len() as u64) as usize] as char;
            let fade = 1.0 - j as f64 / RAIN_TRAIL as f64;
            let a = alpha * (0.12 + 0.78 * fade * fade);
            let color = if j == 0 { TEXT } else { ACCENT };
            face.draw(frame, &glyph.to_string(), x, y, 22.0, color, a);
        }
    }
}

/// Everything falls back into the center and swells into a single point.
fn outro(frame: &mut Frame, world: &World, t: f64, alpha: f64) {
    let center = world.canvas().center();
    let fall = Ease::InCubic.apply(t);
    let k = 1.0 - fall;
    for node in world.nodes().iter().skip(1) {
        let echo = center + (node.pos - center) * k;
        let color = node_color(&node.kind);
        raster::fill_circle(frame, echo, (node.size * 0.8 * k).max(0.5), color, 0.8 * alpha);
    }
    raster::stroke_ring(frame, center, 420.0 * k + 8.0, 1.5, EDGE, 0.2 * k * alpha);
    raster::fill_circle(frame, center, 4.0 + 26.0 * fall, TEXT, 0.9 * alpha);
    raster::glow_circle(frame, center, 60.0 + 80.0 * fall, ACCENT, 0.4 * alpha);
}
