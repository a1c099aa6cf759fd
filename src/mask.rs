// The scratch mask: an opaque noisy foil that pointer strokes erase for good.
// Visual: the foil sits over the hidden content; every erasure step punches a
// jagged hole, may ask the particle worker for flakes, and (after a pause in
// scratching) reports how much of the card is uncovered.
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, trace};

use crate::channel::{SpawnPoint, SpawnRequest, SpawnSink, SurfaceSize};
use crate::color::pack_argb;
use crate::config::ScratchConfig;
use crate::debounce::Debounce;
use crate::raster;
use crate::types::{Point, RgbaBuffer};

/// Vertices of the jagged erase polygon (one move-to plus twenty line-tos).
pub const POLYGON_VERTICES: usize = 21;

/// A sampled pixel counts as "mostly erased" above this level (255 - alpha).
pub const SPAWN_ERASED_LEVEL: u8 = 205;

/// Emitted whenever a debounced scan settles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScratchedEvent {
    /// Fully transparent pixels / all pixels, in [0, 1].
    pub fraction: f32,
}

pub struct MaskSurface<S: SpawnSink> {
    config: ScratchConfig,
    logical: (u32, u32),
    scale: f32,
    mask: RgbaBuffer,
    pointer: Point,
    anchor: Option<Point>, // stroke in progress
    erasing: bool,
    rng: StdRng,
    sink: S,
    debounce: Debounce,
    scratched: f32,
    events: Vec<ScratchedEvent>,
    scans: u64,
    spawns_sent: u64,
}

impl<S: SpawnSink> MaskSurface<S> {
    /// Allocate and paint the foil at `width x height` logical pixels.
    pub fn new(config: ScratchConfig, width: u32, height: u32, scale: f32, sink: S) -> Self {
        Self::with_rng(config, width, height, scale, sink, StdRng::from_entropy())
    }

    /// Same as `new` with a fixed random seed (reproducible noise and jitter).
    pub fn from_seed(config: ScratchConfig, width: u32, height: u32, scale: f32, sink: S, seed: u64) -> Self {
        Self::with_rng(config, width, height, scale, sink, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: ScratchConfig, width: u32, height: u32, scale: f32, sink: S, rng: StdRng) -> Self {
        let mut surface = Self {
            config,
            logical: (0, 0),
            scale: 1.0,
            mask: RgbaBuffer::new(0, 0),
            pointer: Point::default(),
            anchor: None,
            erasing: false,
            rng,
            sink,
            debounce: Debounce::default(),
            scratched: 0.0,
            events: Vec::new(),
            scans: 0,
            spawns_sent: 0,
        };
        surface.initialize(width, height, scale);
        surface
    }

    /// (Re)allocate the mask at device resolution and paint fresh foil:
    /// the fill colour with one random offset in [-noise/2, noise/2] per pixel,
    /// shared by its three channels and clamped. Everything is opaque after.
    pub fn initialize(&mut self, width: u32, height: u32, scale: f32) {
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        let dw = (width as f32 * scale).round() as usize;
        let dh = (height as f32 * scale).round() as usize;
        self.logical = (width, height);
        self.scale = scale;
        self.mask.reset(dw, dh);

        let fill = self.config.fill_rgb();
        let noise = self.config.noise_factor as f32;
        for px in &mut self.mask.pixels {
            let n = if noise > 0.0 { self.rng.gen_range(-0.5f32..0.5) * noise } else { 0.0 };
            let c = fill.offset(n);
            *px = pack_argb(255, c.r, c.g, c.b);
        }

        self.anchor = None;
        self.debounce.cancel();
        self.scratched = 0.0;
        debug!(width = dw, height = dh, scale, fill = %fill, "foil painted");
    }

    /// Reallocate for a new layout; erasure progress is discarded and a
    /// fresh reveal scan is scheduled so listeners see the new fraction.
    pub fn resize(&mut self, width: u32, height: u32, scale: f32, now: Instant) {
        self.initialize(width, height, scale);
        self.debounce.schedule(now);
    }

    /// Repaint the foil at the current size.
    pub fn reset(&mut self, now: Instant) {
        let (w, h) = self.logical;
        self.resize(w, h, self.scale, now);
    }

    /* ---------------------------- pointer input ---------------------------- */

    /// Strokes start from `at`, never from wherever the last stroke ended.
    pub fn start_erasing(&mut self, at: Point) {
        self.erasing = true;
        if at.is_finite() {
            self.pointer = at;
            self.anchor = Some(at);
        } else {
            self.anchor = None;
        }
    }

    pub fn stop_erasing(&mut self) {
        self.erasing = false;
        self.anchor = None;
    }

    pub fn is_erasing(&self) -> bool {
        self.erasing
    }

    /// Every movement updates the pointer; only erasing movement cuts foil.
    pub fn pointer_moved(&mut self, to: Point, now: Instant) {
        if !to.is_finite() {
            trace!(?to, "ignoring non-finite pointer position");
            return;
        }
        if self.erasing {
            let from = self.anchor.unwrap_or(to);
            let brush = self.config.scratch_size as f32;
            self.stroke_segment(from, to, brush, now);
            self.anchor = Some(to);
        }
        self.pointer = to;
    }

    /// Touch start only records where the finger landed.
    pub fn touch_start(&mut self, at: Point) {
        self.start_erasing(at);
    }

    pub fn touch_move(&mut self, to: Point, now: Instant) {
        self.pointer_moved(to, now);
    }

    pub fn touch_end(&mut self) {
        self.stop_erasing();
    }

    pub fn pointer(&self) -> Point {
        self.pointer
    }

    /* ------------------------------- erosion ------------------------------- */

    /// Erase along `from → to` in steps of `brush / 2`, finishing exactly on
    /// `to`. A segment shorter than one step erases once, at `to`. Zero-length
    /// or non-finite segments do nothing. Returns the number of steps taken.
    pub fn stroke_segment(&mut self, from: Point, to: Point, brush: f32, now: Instant) -> usize {
        if !from.is_finite() || !to.is_finite() || !(brush > 0.0) || !brush.is_finite() {
            trace!(?from, ?to, brush, "degenerate stroke segment ignored");
            return 0;
        }
        let (dx, dy) = (to.x - from.x, to.y - from.y);
        let length = dx.hypot(dy);
        if !(length > 0.0) || !length.is_finite() {
            return 0;
        }
        let (ux, uy) = (dx / length, dy / length);
        let step = brush / 2.0;

        let mut steps = 0;
        let mut offset = step;
        while offset < length {
            self.erase_step(Point::new(from.x + ux * offset, from.y + uy * offset), brush, now);
            offset += step;
            steps += 1;
        }
        self.erase_step(to, brush, now);
        steps + 1
    }

    /// One jagged even-odd polygon punched out of the foil, then the particle
    /// trigger, then a restart of the reveal timer.
    fn erase_step(&mut self, center: Point, brush: f32, now: Instant) {
        let scale = self.scale;
        let mut poly = [Point::default(); POLYGON_VERTICES];
        for v in &mut poly {
            v.x = (center.x + self.rng.gen_range(-brush..=brush)) * scale;
            v.y = (center.y + self.rng.gen_range(-brush..=brush)) * scale;
        }
        raster::erase_polygon(&mut self.mask, &poly);

        self.maybe_spawn(center);
        self.debounce.schedule(now);
    }

    /// Sample the 2x2 pixel block at the step; if all four are mostly erased,
    /// ask for flakes. Sampling after erasure keeps debris behind the brush.
    fn maybe_spawn(&mut self, center: Point) {
        let sx = (center.x * self.scale).floor() as i64;
        let sy = (center.y * self.scale).floor() as i64;
        let cleared = |x: i64, y: i64| {
            raster::alpha_at(&self.mask, x, y).is_some_and(|a| 255 - a > SPAWN_ERASED_LEVEL)
        };
        if !(cleared(sx, sy) && cleared(sx + 1, sy) && cleared(sx, sy + 1) && cleared(sx + 1, sy + 1)) {
            return;
        }

        let request = SpawnRequest {
            position: SpawnPoint { x: center.x.floor() as i32, y: center.y.floor() as i32 },
            scale: self.scale,
            fill: self.config.fill.clone(),
            offset: i32::try_from(self.config.scratch_size).unwrap_or(i32::MAX),
            size: SurfaceSize { width: self.mask.width as u32, height: self.mask.height as u32 },
        };
        self.sink.send_spawn(request);
        self.spawns_sent += 1;
    }

    /* --------------------------- reveal progress --------------------------- */

    /// Event-loop hook: runs the scan once the debounce window has passed
    /// without another erasure step.
    pub fn tick(&mut self, now: Instant) -> Option<f32> {
        if self.debounce.take_expired(now) {
            Some(self.compute_revealed_fraction())
        } else {
            None
        }
    }

    /// Full scan of the mask. Linear in pixel count, so normally reached
    /// through `tick`. Emits a `ScratchedEvent` and updates `scratched()`.
    pub fn compute_revealed_fraction(&mut self) -> f32 {
        let fraction = raster::revealed_fraction(&self.mask);
        self.scans += 1;
        self.scratched = (fraction * 1000.0).round() / 1000.0;
        self.events.push(ScratchedEvent { fraction });
        info!(scratched = self.scratched, "scratched");
        fraction
    }

    /// Last settled fraction rounded to 3 decimals.
    pub fn scratched(&self) -> f32 {
        self.scratched
    }

    pub fn take_events(&mut self) -> Vec<ScratchedEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn reveal_pending(&self) -> bool {
        self.debounce.is_pending()
    }

    /// How many full scans have run.
    pub fn scans(&self) -> u64 {
        self.scans
    }

    pub fn spawns_sent(&self) -> u64 {
        self.spawns_sent
    }

    /* ------------------------------ accessors ------------------------------ */

    pub fn mask(&self) -> &RgbaBuffer {
        &self.mask
    }

    pub fn logical_size(&self) -> (u32, u32) {
        self.logical
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}
