use crate::foundation::core::{FrameIndex, Point, Rgb8};
use crate::foundation::ease::Ease;
use crate::render::frame::Frame;
use crate::render::raster;
use crate::render::scene;
use crate::render::text::Typeface;
use crate::timeline::block::{Block, BlockBody, LINE_FADE, LINE_GAP};
use crate::timeline::schedule::Schedule;
use crate::world::graph::{NodeKind, World};

pub(crate) const BG: Rgb8 = Rgb8 { r: 8, g: 10, b: 16 };
pub(crate) const TEXT: Rgb8 = Rgb8 { r: 212, g: 222, b: 235 };
pub(crate) const ACCENT: Rgb8 = Rgb8 { r: 96, g: 200, b: 255 };
pub(crate) const VALUE: Rgb8 = Rgb8 { r: 136, g: 242, b: 176 };
pub(crate) const NODE_INFO: Rgb8 = Rgb8 { r: 140, g: 220, b: 255 };
pub(crate) const NODE_AMBIENT: Rgb8 = Rgb8 { r: 96, g: 114, b: 150 };
pub(crate) const EDGE: Rgb8 = Rgb8 { r: 70, g: 110, b: 160 };
const PARTICLE: Rgb8 = Rgb8 { r: 180, g: 200, b: 230 };
const BACKDROP: Rgb8 = Rgb8 { r: 14, g: 18, b: 28 };

const VIGNETTE: f64 = 0.32;
/// Fraction of the canvas width text may occupy.
const SAFE_WIDTH_FRAC: f64 = 0.78;
const LINE_HEIGHT: f64 = 64.0;
const BODY_PX: f32 = 40.0;
/// Pulse travel speed along a connection, cycles per second.
const PULSE_SPEED: f64 = 0.35;

/// Profile-derived constants the scene painters need.
#[derive(Clone, Copy, Debug)]
pub struct SceneParams {
    /// Estimated CPM shown by the valuation scene.
    pub price_usd: f64,
    /// Total entropy bits shown by the constellation scene.
    pub total_bits: f64,
}

/// Everything the rasterizer reads besides the world.
pub struct PaintCtx<'a> {
    /// The block schedule.
    pub schedule: &'a Schedule,
    /// Face used for monologue, labels and the watermark.
    pub face: &'a Typeface,
    /// Profile-derived scene constants.
    pub params: SceneParams,
    /// Identifier printed in the corner watermark, if any.
    pub watermark: Option<&'a str>,
}

/// Paint one full frame.
///
/// Fixed order: clear, rings and ticks, connections with pulses, nodes,
/// particles, the active block's foreground, vignette, watermark. Writes
/// only into `frame`; no state is retained between calls.
pub fn paint_frame(frame: &mut Frame, world: &World, ctx: &PaintCtx<'_>, global: FrameIndex) {
    frame.clear(BG);
    paint_backdrop(frame, world);

    let active = ctx.schedule.block_at(global);
    match &active.block.body {
        BlockBody::Lines(lines) => {
            paint_monologue(frame, ctx.face, active.block, lines, active.local);
        }
        BlockBody::Scene(kind) => {
            scene::paint_scene(frame, world, ctx, *kind, active.block, active.local);
        }
    }

    raster::vignette(frame, VIGNETTE);
    if let Some(id) = ctx.watermark {
        paint_watermark(frame, ctx.face, id, global);
    }
}

fn paint_backdrop(frame: &mut Frame, world: &World) {
    let center = world.canvas().center();

    for ring in world.rings() {
        raster::stroke_ring(frame, center, ring.radius, 1.0, EDGE, 0.05);
        raster::ring_ticks(frame, center, ring.radius, ring.phase, ring.ticks, 5.0, EDGE, 0.10);
    }

    for c in world.connections() {
        let a = world.nodes()[c.a].pos;
        let b = world.nodes()[c.b].pos;
        let alpha = if c.info { 0.12 } else { 0.07 };
        raster::stroke_line(frame, a, b, 1.0, EDGE, alpha);

        let s = (world.time() * PULSE_SPEED + c.phase).fract();
        let dot = Point::new(a.x + (b.x - a.x) * s, a.y + (b.y - a.y) * s);
        raster::fill_circle(frame, dot, 1.6, ACCENT, if c.info { 0.45 } else { 0.25 });
    }

    for node in world.nodes() {
        let (color, core_alpha) = match node.kind {
            NodeKind::Ambient => (NODE_AMBIENT, 0.55),
            _ => (NODE_INFO, 0.9),
        };
        raster::glow_circle(frame, node.pos, node.size * 3.2, color, 0.28);
        if let NodeKind::Signal { .. } = node.kind {
            raster::fill_diamond(frame, node.pos, node.size * 1.8, color, 0.18);
        }
        raster::fill_circle(frame, node.pos, node.size, color, core_alpha);
    }

    for p in world.particles() {
        raster::fill_circle(frame, p.pos, p.size, PARTICLE.scaled(p.shade), 0.5 * p.shade);
    }
}

fn paint_monologue(frame: &mut Frame, face: &Typeface, block: &Block, lines: &[String], local: u64) {
    let block_alpha = block.block_alpha(local);
    if block_alpha <= 0.0 {
        return;
    }
    let w = f64::from(frame.width());
    let cx = w / 2.0;
    let cy = f64::from(frame.height()) / 2.0;
    let safe = w * SAFE_WIDTH_FRAC;
    let total_h = lines.len() as f64 * LINE_HEIGHT;
    let top = cy - total_h / 2.0;

    let max_width = lines
        .iter()
        .map(|l| {
            let px = face.fit_px(l, BODY_PX, safe);
            face.measure(l, px)
        })
        .fold(0.0, f64::max);
    // Backdrop opacity follows the brightest line.
    let lead = (0..lines.len())
        .map(|i| block.line_alpha(local, i))
        .fold(0.0, f64::max);
    if max_width > 0.0 && lead > 0.0 {
        raster::fill_rect_soft(
            frame,
            cx - max_width / 2.0 - 48.0,
            top - 24.0,
            cx + max_width / 2.0 + 48.0,
            top + total_h + 8.0,
            60.0,
            BACKDROP,
            0.55 * lead,
        );
    }

    for (i, line) in lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        let alpha = block.line_alpha(local, i);
        if alpha <= 0.0 {
            continue;
        }
        // Lines drift up a touch as they appear, on the same curve as
        // their fade.
        let start = i as u64 * LINE_GAP;
        let t = (local.saturating_sub(start)) as f64 / LINE_FADE as f64;
        let rise = (1.0 - Ease::OutCubic.apply(t)) * 16.0;
        let baseline = top + i as f64 * LINE_HEIGHT + LINE_HEIGHT * 0.75 + rise;

        let px = face.fit_px(line, BODY_PX, safe);
        face.draw_centered(frame, line, cx, baseline, px, TEXT, alpha);
    }
}

fn paint_watermark(frame: &mut Frame, face: &Typeface, id: &str, global: FrameIndex) {
    let label = format!("{:06} \u{b7} {id}", global.0);
    let px = 15.0;
    let width = face.measure(&label, px);
    let x = f64::from(frame.width()) - width - 28.0;
    let y = f64::from(frame.height()) - 24.0;
    face.draw(frame, &label, x, y, px, TEXT, 0.20);
}
