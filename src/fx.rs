// FX: foil flakes that trail behind the scratch.
// The engine only knows what spawn requests tell it. It owns its surface once
// the setup message delivers one, keeps a pool of dead particle records for
// reuse, and only asks for frames while something is alive.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::channel::{EngineMsg, SpawnRequest};
use crate::color::Rgb;
use crate::raster::fill_rect_over;
use crate::surface::OffscreenSurface;

fn default_batch_size() -> usize {
    4
}

fn default_max_particles() -> usize {
    5000
}

fn default_lifetime_ms() -> u64 {
    1500
}

fn default_speed_decay() -> f32 {
    0.98
}

fn default_max_speed() -> f32 {
    1.5
}

fn default_color_jitter() -> f32 {
    100.0
}

/// Engine constants. Deserializable so alternate profiles can come from config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineTuning {
    /// Particles created per spawn request.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Hard cap on live particles; spawns beyond it are dropped.
    #[serde(default = "default_max_particles")]
    pub max_particles: usize,
    #[serde(default = "default_lifetime_ms")]
    pub lifetime_ms: u64,
    /// Multiplier applied to speed once per frame.
    #[serde(default = "default_speed_decay")]
    pub speed_decay: f32,
    /// Initial speed is uniform in [0, max_speed).
    #[serde(default = "default_max_speed")]
    pub max_speed: f32,
    /// Width of the per-particle brightness offset, centered on 0.
    #[serde(default = "default_color_jitter")]
    pub color_jitter: f32,
}

impl Default for EngineTuning {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_particles: default_max_particles(),
            lifetime_ms: default_lifetime_ms(),
            speed_decay: default_speed_decay(),
            max_speed: default_max_speed(),
            color_jitter: default_color_jitter(),
        }
    }
}

impl EngineTuning {
    pub fn lifetime(&self) -> Duration {
        Duration::from_millis(self.lifetime_ms)
    }
}

/// One flake. Position is in logical pixels of the target surface.
#[derive(Debug, Clone)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub speed: f32,
    pub created: Instant,
    pub lifetime: Duration,
    pub fill: Rgb,
    pub fill_offset: f32,
}

impl Particle {
    #[inline]
    fn expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created) > self.lifetime
    }

    /// 1 at birth, 0 at end of life.
    #[inline]
    fn remaining(&self, now: Instant) -> f32 {
        let age = now.saturating_duration_since(self.created).as_secs_f32();
        let life = self.lifetime.as_secs_f32();
        if life <= 0.0 {
            return 0.0;
        }
        (1.0 - age / life).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Nothing alive, no frame scheduled.
    Idle,
    /// At least one particle alive; a frame is due.
    Running,
}

/// Counters the worker hands back when it stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub frames_rendered: u64,
    pub spawns_accepted: u64,
    pub dropped_before_setup: u64,
    pub dropped_at_cap: u64,
}

/// Where the last spawn request says to draw.
#[derive(Debug, Clone, Copy)]
struct Target {
    width: usize,
    height: usize,
    scale: f32,
}

pub struct ParticleEngine {
    tuning: EngineTuning,
    rng: StdRng,
    surface: Option<OffscreenSurface>,
    target: Target,
    active: Vec<Particle>,
    pool: Vec<Particle>,
    state: EngineState,
    stats: EngineStats,
}

impl ParticleEngine {
    pub fn new(tuning: EngineTuning) -> Self {
        Self::with_rng(tuning, StdRng::from_entropy())
    }

    /// Deterministic engine for tests.
    pub fn from_seed(tuning: EngineTuning, seed: u64) -> Self {
        Self::with_rng(tuning, StdRng::seed_from_u64(seed))
    }

    fn with_rng(tuning: EngineTuning, rng: StdRng) -> Self {
        Self {
            active: Vec::with_capacity(tuning.max_particles.min(1024)),
            pool: Vec::new(),
            tuning,
            rng,
            surface: None,
            target: Target { width: 0, height: 0, scale: 1.0 },
            state: EngineState::Idle,
            stats: EngineStats::default(),
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn pooled_count(&self) -> usize {
        self.pool.len()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.active
    }

    pub fn surface(&self) -> Option<&OffscreenSurface> {
        self.surface.as_ref()
    }

    pub fn handle(&mut self, msg: EngineMsg, now: Instant) {
        match msg {
            EngineMsg::Setup(surface) => self.on_transfer_surface(surface),
            EngineMsg::Spawn(req) => {
                self.on_spawn_request(&req, now);
            }
        }
    }

    pub fn on_transfer_surface(&mut self, surface: OffscreenSurface) {
        if self.surface.is_some() {
            warn!("particle engine already has a surface; ignoring setup");
            return;
        }
        let (w, h) = surface.size();
        debug!(width = w, height = h, "particle surface bound");
        self.surface = Some(surface);
    }

    /// Adds a batch of particles. Returns how many were created; requests
    /// before setup or at the cap create none.
    pub fn on_spawn_request(&mut self, req: &SpawnRequest, now: Instant) -> usize {
        if self.surface.is_none() {
            self.stats.dropped_before_setup += 1;
            debug!("spawn request before surface setup dropped");
            return 0;
        }
        let room = self.tuning.max_particles.saturating_sub(self.active.len());
        if room == 0 {
            self.stats.dropped_at_cap += 1;
            trace!(cap = self.tuning.max_particles, "particle cap reached; spawn dropped");
            return 0;
        }

        self.target = Target {
            width: req.size.width as usize,
            height: req.size.height as usize,
            scale: sanitize_scale(req.scale),
        };

        let fill = Rgb::parse_or_default(&req.fill);
        let spread = req.offset as f32;
        let count = self.tuning.batch_size.min(room);

        for _ in 0..count {
            let dx = self.rng.gen_range(-0.5f32..0.5);
            let dy = self.rng.gen_range(-0.5f32..0.5);
            let speed = if self.tuning.max_speed > 0.0 {
                self.rng.gen_range(0.0..self.tuning.max_speed)
            } else {
                0.0
            };
            let fill_offset = if self.tuning.color_jitter > 0.0 {
                self.rng.gen_range(-0.5f32..0.5) * self.tuning.color_jitter
            } else {
                0.0
            };

            let mut p = self.pool.pop().unwrap_or_else(|| Particle {
                x: 0.0,
                y: 0.0,
                vx: 0.0,
                vy: 0.0,
                speed: 0.0,
                created: now,
                lifetime: Duration::ZERO,
                fill,
                fill_offset: 0.0,
            });
            p.x = req.position.x as f32 + dx * spread;
            p.y = req.position.y as f32 + dy * spread;
            p.vx = dx;
            p.vy = dy;
            p.speed = speed;
            p.created = now;
            p.lifetime = self.tuning.lifetime();
            p.fill = fill;
            p.fill_offset = fill_offset;
            self.active.push(p);
        }

        self.stats.spawns_accepted += 1;
        if self.state == EngineState::Idle {
            debug!("particle loop started");
            self.state = EngineState::Running;
        }
        count
    }

    /// One frame: drop expired particles, move the rest, redraw the surface
    /// from scratch and present it. Does nothing while Idle. Returns the state
    /// after the frame; Running means another frame should be scheduled.
    pub fn advance_frame(&mut self, now: Instant) -> EngineState {
        if self.state == EngineState::Idle {
            return EngineState::Idle;
        }
        self.stats.frames_rendered += 1;

        let cap = self.tuning.max_particles;
        let mut i = 0;
        while i < self.active.len() {
            if self.active[i].expired(now) {
                let dead = self.active.swap_remove(i);
                if self.pool.len() < cap {
                    self.pool.push(dead);
                }
            } else {
                i += 1;
            }
        }

        let decay = self.tuning.speed_decay;
        for p in &mut self.active {
            p.x += p.vx * p.speed;
            p.y += p.vy * p.speed;
            p.speed *= decay;
        }

        if let Some(surface) = self.surface.as_mut() {
            render(surface, self.target, &self.active, now);
        }

        if self.active.is_empty() {
            debug!(frames = self.stats.frames_rendered, "particle loop idle");
            self.state = EngineState::Idle;
        }
        self.state
    }
}

fn sanitize_scale(scale: f32) -> f32 {
    if scale.is_finite() && scale > 0.0 { scale } else { 1.0 }
}

fn render(surface: &mut OffscreenSurface, target: Target, particles: &[Particle], now: Instant) {
    surface.set_size(target.width, target.height);
    let buf = surface.buffer_mut();
    for p in particles {
        let alpha = p.remaining(now);
        let px = (p.x * target.scale).floor();
        let py = (p.y * target.scale).floor();
        if !px.is_finite() || !py.is_finite() {
            continue;
        }
        fill_rect_over(buf, px as i64, py as i64, 1, 1, p.fill.offset(p.fill_offset), alpha);
    }
    surface.present();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{SpawnPoint, SurfaceSize};
    use crate::surface::offscreen_surface;

    fn spawn_at(x: i32, y: i32) -> SpawnRequest {
        SpawnRequest {
            position: SpawnPoint { x, y },
            scale: 1.0,
            fill: "#00FF00".into(),
            offset: 20,
            size: SurfaceSize { width: 64, height: 64 },
        }
    }

    fn ready_engine(tuning: EngineTuning) -> ParticleEngine {
        let mut engine = ParticleEngine::from_seed(tuning, 7);
        let (surface, _view) = offscreen_surface(64, 64);
        engine.handle(EngineMsg::Setup(surface), Instant::now());
        engine
    }

    #[test]
    fn spawn_adds_one_batch_jittered_by_the_offset() {
        let mut engine = ready_engine(EngineTuning::default());
        let now = Instant::now();
        assert_eq!(engine.on_spawn_request(&spawn_at(10, 10), now), 4);
        assert_eq!(engine.active_count(), 4);
        assert_eq!(engine.state(), EngineState::Running);
        for p in engine.particles() {
            assert!((p.x - 10.0).abs() <= 10.0 && (p.y - 10.0).abs() <= 10.0);
            assert!(p.speed >= 0.0 && p.speed < 1.5);
            assert!(p.fill_offset.abs() <= 50.0);
            assert_eq!(p.fill, Rgb::new(0, 255, 0));
        }
    }

    #[test]
    fn spawns_before_setup_are_dropped_not_buffered() {
        let mut engine = ParticleEngine::from_seed(EngineTuning::default(), 1);
        let now = Instant::now();
        for _ in 0..100 {
            engine.handle(EngineMsg::Spawn(spawn_at(5, 5)), now);
        }
        assert_eq!(engine.active_count(), 0);
        assert_eq!(engine.state(), EngineState::Idle);
        assert_eq!(engine.stats().dropped_before_setup, 100);

        let (surface, _view) = offscreen_surface(64, 64);
        engine.handle(EngineMsg::Setup(surface), now);
        assert_eq!(engine.active_count(), 0, "nothing replayed after setup");
        engine.handle(EngineMsg::Spawn(spawn_at(5, 5)), now);
        assert_eq!(engine.active_count(), 4);
    }

    #[test]
    fn population_never_exceeds_the_cap() {
        let tuning = EngineTuning { batch_size: 3, max_particles: 10, ..EngineTuning::default() };
        let mut engine = ready_engine(tuning);
        let now = Instant::now();
        for _ in 0..20 {
            engine.on_spawn_request(&spawn_at(1, 1), now);
            assert!(engine.active_count() <= 10);
        }
        assert_eq!(engine.active_count(), 10);
        assert_eq!(engine.stats().spawns_accepted, 4);
        assert_eq!(engine.stats().dropped_at_cap, 16);
    }

    #[test]
    fn loop_stops_itself_when_the_last_particle_expires() {
        let mut engine = ready_engine(EngineTuning::default());
        let t0 = Instant::now();
        engine.on_spawn_request(&spawn_at(10, 10), t0);

        assert_eq!(engine.advance_frame(t0 + Duration::from_millis(16)), EngineState::Running);
        assert_eq!(engine.advance_frame(t0 + Duration::from_millis(1501)), EngineState::Idle);
        assert_eq!(engine.active_count(), 0);
        assert_eq!(engine.pooled_count(), 4);
        assert_eq!(engine.stats().frames_rendered, 2);

        // idle: frames requested by nobody are not rendered
        for _ in 0..5 {
            assert_eq!(engine.advance_frame(t0 + Duration::from_secs(3)), EngineState::Idle);
        }
        assert_eq!(engine.stats().frames_rendered, 2);

        // the next spawn restarts the loop and reuses pooled records
        engine.on_spawn_request(&spawn_at(3, 3), t0 + Duration::from_secs(4));
        assert_eq!(engine.state(), EngineState::Running);
        assert_eq!(engine.pooled_count(), 0);
    }

    #[test]
    fn speed_decays_and_position_integrates() {
        let mut engine = ready_engine(EngineTuning::default());
        let t0 = Instant::now();
        engine.on_spawn_request(&spawn_at(30, 30), t0);
        let before: Vec<(f32, f32, f32)> =
            engine.particles().iter().map(|p| (p.x, p.y, p.speed)).collect();
        engine.advance_frame(t0 + Duration::from_millis(16));
        for (p, (x, y, speed)) in engine.particles().iter().zip(before) {
            assert!((p.x - (x + p.vx * speed)).abs() < 1e-4);
            assert!((p.y - (y + p.vy * speed)).abs() < 1e-4);
            assert!((p.speed - speed * 0.98).abs() < 1e-6);
        }
    }

    #[test]
    fn frame_draws_fading_squares_on_a_fresh_surface() {
        let tuning = EngineTuning { max_speed: 0.0, color_jitter: 0.0, ..EngineTuning::default() };
        let mut engine = ready_engine(tuning);
        let t0 = Instant::now();
        let mut req = spawn_at(10, 10);
        req.offset = 0;
        req.scale = 2.0;
        req.size = SurfaceSize { width: 40, height: 30 };
        engine.on_spawn_request(&req, t0);
        engine.advance_frame(t0 + Duration::from_millis(750));

        let surface = engine.surface().unwrap();
        assert_eq!(surface.size(), (40, 30));
        let buf = surface.buffer();
        let (a, r, g, b) = crate::color::unpack_argb(buf.pixels[20 * 40 + 20]);
        assert_eq!((r, g, b), (0, 255, 0));
        // four stacked half-faded squares
        assert!(a > 200, "alpha {a}");
        // one device pixel, whatever the scale
        assert_eq!(buf.pixels[20 * 40 + 21], 0);
        assert_eq!(buf.pixels[21 * 40 + 20], 0);
        assert_eq!(buf.pixels[21 * 40 + 21], 0);
    }

    #[test]
    fn second_setup_keeps_the_first_surface() {
        let mut engine = ready_engine(EngineTuning::default());
        let (other, _view) = offscreen_surface(3, 3);
        engine.handle(EngineMsg::Setup(other), Instant::now());
        assert_eq!(engine.surface().unwrap().size(), (64, 64));
    }
}
