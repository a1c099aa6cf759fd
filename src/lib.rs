//! Scratch card: a noisy foil mask erased by pointer strokes, plus a particle
//! worker that animates foil flakes from spawn requests sent across a
//! one-way channel.

pub mod channel;
pub mod cli;
pub mod color;
pub mod composite;
pub mod config;
pub mod content;
pub mod debounce;
pub mod draw;
pub mod error;
pub mod fx;
pub mod gamma;
pub mod logging;
pub mod mask;
pub mod raster;
pub mod surface;
pub mod types;
pub mod worker;

pub use channel::{EngineMsg, ParticleChannel, SpawnRequest, SpawnSink, particle_channel};
pub use config::{AppConfig, ScratchConfig};
pub use error::Error;
pub use fx::{EngineState, EngineStats, EngineTuning, ParticleEngine};
pub use mask::{MaskSurface, ScratchedEvent};
pub use surface::{OffscreenSurface, SurfaceView, offscreen_surface};
pub use types::{FrameBuffer, Point, RgbaBuffer};
pub use worker::ParticleWorker;
