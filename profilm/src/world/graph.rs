use crate::foundation::core::{Canvas, Point, Vec2};
use crate::foundation::math::{lerp, wrap, Lcg64};
use crate::profile::record::ProfileRecord;
use std::f64::consts::TAU;

/// Signal nodes per concentric layer.
const SLOTS_PER_LAYER: usize = 6;
/// Innermost signal-layer radius.
const SIGNAL_BASE_RADIUS: f64 = 140.0;
/// Radius added per layer.
const LAYER_STEP: f64 = 90.0;
/// Extra radius granted to the strongest signal.
const BITS_RADIUS_SPAN: f64 = 70.0;
/// Decorative node count.
const AMBIENT_COUNT: usize = 28;
/// Ambient annulus bounds.
const AMBIENT_INNER: f64 = 260.0;
const AMBIENT_OUTER: f64 = 470.0;
/// Maximum distance for a connection candidate.
const CONNECT_DIST: f64 = 150.0;
/// Retention probability when an endpoint carries information.
const KEEP_INFO: f64 = 0.9;
/// Retention probability for purely ambient pairs.
const KEEP_AMBIENT: f64 = 0.4;
/// Drifting particle count.
const PARTICLE_COUNT: usize = 90;
/// Concentric ring count.
const RING_COUNT: usize = 4;

/// What a node stands for.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    /// The subject. Sits at canvas center and does not orbit.
    Center,
    /// One present entropy contribution.
    Signal {
        /// Signal label from the profile.
        label: String,
        /// Bits normalized against the strongest signal, in `[0, 1]`.
        bits_norm: f64,
    },
    /// Decoration only.
    Ambient,
}

impl NodeKind {
    /// Whether the node carries non-zero information weight.
    pub fn is_info(&self) -> bool {
        matches!(self, Self::Center | Self::Signal { .. })
    }
}

/// One orbiting point of the constellation.
///
/// Orbit parameters are fixed at generation; only `pos` changes afterwards.
#[derive(Clone, Debug)]
pub struct Node {
    /// Role of the node.
    pub kind: NodeKind,
    /// Orbit radius around canvas center (zero for the center node).
    pub orbit_radius: f64,
    /// Orbit angle at time zero, radians.
    pub base_angle: f64,
    /// Signed angular speed, radians per second.
    pub angular_speed: f64,
    /// Dot radius in pixels.
    pub size: f64,
    /// Current position. Pure function of elapsed time.
    pub pos: Point,
}

impl Node {
    fn position_at(&self, center: Point, t: f64) -> Point {
        if self.orbit_radius == 0.0 {
            return center;
        }
        let angle = self.base_angle + self.angular_speed * t;
        center + Vec2::new(angle.cos(), angle.sin()) * self.orbit_radius
    }
}

/// A fixed edge between two nodes, drawn with a traveling pulse dot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Connection {
    /// Index of the first endpoint.
    pub a: usize,
    /// Index of the second endpoint.
    pub b: usize,
    /// Whether either endpoint carries information weight.
    pub info: bool,
    /// Phase offset of the pulse dot, in cycles.
    pub phase: f64,
}

/// One drifting background particle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    /// Current position.
    pub pos: Point,
    /// Velocity in pixels per second.
    pub vel: Vec2,
    /// Dot radius in pixels.
    pub size: f64,
    /// Brightness factor in `[0, 1]`.
    pub shade: f64,
}

/// One ambient ring with tick marks; radius fixed, phase advances with time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ring {
    /// Ring radius in pixels.
    pub radius: f64,
    /// Phase speed in radians per second.
    pub speed: f64,
    /// Current phase, radians.
    pub phase: f64,
    /// Number of tick marks.
    pub ticks: u32,
}

/// The persistent procedural state behind every frame.
///
/// Generated once from the profile and seed; node, connection, particle and
/// ring sets never change afterwards. [`World::advance`] only moves
/// coordinates and phases.
#[derive(Clone, Debug)]
pub struct World {
    canvas: Canvas,
    time: f64,
    nodes: Vec<Node>,
    connections: Vec<Connection>,
    particles: Vec<Particle>,
    rings: Vec<Ring>,
}

impl World {
    /// Generate the world for `record` on `canvas`.
    ///
    /// Every random draw comes from one LCG seeded with `seed`, in a fixed
    /// order, so an identical record and seed reproduce identical geometry.
    pub fn generate(record: &ProfileRecord, seed: u64, canvas: Canvas) -> Self {
        let mut rng = Lcg64::new(seed);
        let center = canvas.center();

        let mut nodes = vec![Node {
            kind: NodeKind::Center,
            orbit_radius: 0.0,
            base_angle: 0.0,
            angular_speed: 0.0,
            size: 7.0,
            pos: center,
        }];

        let max_bits = record.max_contribution_bits().max(f64::EPSILON);
        for (i, c) in record.present_contributions().enumerate() {
            let layer = i / SLOTS_PER_LAYER;
            let slot = i % SLOTS_PER_LAYER;
            let bits_norm = (c.bits / max_bits).clamp(0.0, 1.0);
            let orbit_radius =
                SIGNAL_BASE_RADIUS + layer as f64 * LAYER_STEP + bits_norm * BITS_RADIUS_SPAN;
            let base_angle = slot as f64 * TAU / SLOTS_PER_LAYER as f64
                + layer as f64 * 0.35
                + rng.next_range(-0.12, 0.12);
            let dir = if rng.next_f64_01() < 0.5 { -1.0 } else { 1.0 };
            let angular_speed = dir * rng.next_range(0.04, 0.14);
            let mut node = Node {
                kind: NodeKind::Signal { label: c.label.clone(), bits_norm },
                orbit_radius,
                base_angle,
                angular_speed,
                size: 5.0 + bits_norm * 9.0,
                pos: Point::ZERO,
            };
            node.pos = node.position_at(center, 0.0);
            nodes.push(node);
        }

        for _ in 0..AMBIENT_COUNT {
            // Uniform density over the annulus area.
            let u = rng.next_f64_01();
            let orbit_radius =
                lerp(AMBIENT_INNER * AMBIENT_INNER, AMBIENT_OUTER * AMBIENT_OUTER, u).sqrt();
            let base_angle = rng.next_range(0.0, TAU);
            let dir = if rng.next_f64_01() < 0.5 { -1.0 } else { 1.0 };
            let angular_speed = dir * rng.next_range(0.02, 0.10);
            let mut node = Node {
                kind: NodeKind::Ambient,
                orbit_radius,
                base_angle,
                angular_speed,
                size: 1.5 + rng.next_f64_01() * 2.5,
                pos: Point::ZERO,
            };
            node.pos = node.position_at(center, 0.0);
            nodes.push(node);
        }

        let mut connections = Vec::new();
        for a in 0..nodes.len() {
            for b in (a + 1)..nodes.len() {
                let dist = (nodes[a].pos - nodes[b].pos).hypot();
                if dist > CONNECT_DIST {
                    continue;
                }
                let info = nodes[a].kind.is_info() || nodes[b].kind.is_info();
                let keep = if info { KEEP_INFO } else { KEEP_AMBIENT };
                // Draw even for rejected pairs to keep the stream aligned.
                let roll = rng.next_f64_01();
                let phase = rng.next_f64_01();
                if roll < keep {
                    connections.push(Connection { a, b, info, phase });
                }
            }
        }

        let particles = (0..PARTICLE_COUNT)
            .map(|_| {
                let pos = Point::new(
                    rng.next_range(0.0, f64::from(canvas.width)),
                    rng.next_range(0.0, f64::from(canvas.height)),
                );
                let angle = rng.next_range(0.0, TAU);
                let speed = rng.next_range(6.0, 26.0);
                Particle {
                    pos,
                    vel: Vec2::new(angle.cos(), angle.sin()) * speed,
                    size: 0.8 + rng.next_f64_01() * 1.6,
                    shade: 0.25 + rng.next_f64_01() * 0.5,
                }
            })
            .collect();

        let rings = (0..RING_COUNT)
            .map(|i| Ring {
                radius: 180.0 + i as f64 * 110.0 + rng.next_range(-14.0, 14.0),
                speed: 0.05 + 0.04 * i as f64,
                phase: rng.next_range(0.0, TAU),
                ticks: 72 + 24 * i as u32,
            })
            .collect();

        Self { canvas, time: 0.0, nodes, connections, particles, rings }
    }

    /// Move the world to absolute `frame_time` seconds.
    ///
    /// Orbits and ring phases are pure functions of time; particles integrate
    /// by the elapsed delta and wrap at the canvas bounds. Call once per
    /// frame with non-decreasing times.
    pub fn advance(&mut self, frame_time: f64) {
        let dt = (frame_time - self.time).max(0.0);
        let center = self.canvas.center();

        for node in &mut self.nodes {
            node.pos = node.position_at(center, frame_time);
        }
        for ring in &mut self.rings {
            ring.phase += ring.speed * dt;
        }
        let (w, h) = (f64::from(self.canvas.width), f64::from(self.canvas.height));
        for p in &mut self.particles {
            p.pos = Point::new(wrap(p.pos.x + p.vel.x * dt, w), wrap(p.pos.y + p.vel.y * dt, h));
        }
        self.time = frame_time;
    }

    /// Canvas the world was generated for.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Seconds the world has been advanced to.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// All nodes; index 0 is always the center node.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// The fixed edge set.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// The drifting particle set.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// The ambient ring set.
    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }

    /// Signal nodes only, in profile order.
    pub fn signals(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| matches!(n.kind, NodeKind::Signal { .. }))
    }
}
