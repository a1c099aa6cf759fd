//! One-way, ordered message queue from the mask to the particle worker.
//!
//! Two message shapes cross the boundary: a one-time setup carrying the
//! drawing surface (moved, never shared) and any number of spawn requests.
//! Nothing ever comes back; a dead worker just means sends go nowhere.

use crossbeam_channel::{Receiver, Sender, TrySendError, unbounded};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::surface::OffscreenSurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

/// `{ position: {x, y}, scale, fill, offset, size: {width, height} }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnRequest {
    /// Floored logical position of the erasure step.
    pub position: SpawnPoint,
    /// Device pixel scale.
    pub scale: f32,
    /// Colour string exactly as configured (`#BBB`, `rgb(..)`, ...).
    pub fill: String,
    /// Spread radius around `position`, the brush size.
    pub offset: i32,
    /// Target surface size in device pixels.
    pub size: SurfaceSize,
}

pub enum EngineMsg {
    Setup(OffscreenSurface),
    Spawn(SpawnRequest),
}

impl std::fmt::Debug for EngineMsg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineMsg::Setup(surface) => f.debug_tuple("Setup").field(&surface.size()).finish(),
            EngineMsg::Spawn(req) => f.debug_tuple("Spawn").field(req).finish(),
        }
    }
}

/// Where the mask sends spawn requests. Fire-and-forget: no result.
pub trait SpawnSink {
    fn send_spawn(&mut self, request: SpawnRequest);
}

/// Collects requests in memory; handy for driving the mask without a worker.
impl SpawnSink for Vec<SpawnRequest> {
    fn send_spawn(&mut self, request: SpawnRequest) {
        self.push(request);
    }
}

/// Discards every request (particles disabled).
impl SpawnSink for () {
    fn send_spawn(&mut self, _request: SpawnRequest) {}
}

pub struct ParticleChannel {
    tx: Sender<EngineMsg>,
    surface_sent: bool,
    gone: bool,
}

pub fn particle_channel() -> (ParticleChannel, Receiver<EngineMsg>) {
    let (tx, rx) = unbounded();
    (ParticleChannel { tx, surface_sent: false, gone: false }, rx)
}

impl ParticleChannel {
    /// Move the surface to the worker. Only the first call sends anything;
    /// later surfaces are dropped on this side.
    pub fn transfer_surface(&mut self, surface: OffscreenSurface) -> bool {
        if self.surface_sent {
            warn!("particle surface already transferred; ignoring another one");
            return false;
        }
        self.surface_sent = true;
        self.send(EngineMsg::Setup(surface));
        true
    }

    fn send(&mut self, msg: EngineMsg) {
        match self.tx.try_send(msg) {
            Ok(()) => {}
            Err(TrySendError::Disconnected(_)) => {
                if !self.gone {
                    debug!("particle worker is gone; further messages are discarded");
                    self.gone = true;
                }
            }
            // unbounded: never full
            Err(TrySendError::Full(_)) => {}
        }
    }
}

impl SpawnSink for ParticleChannel {
    fn send_spawn(&mut self, request: SpawnRequest) {
        self.send(EngineMsg::Spawn(request));
    }
}
