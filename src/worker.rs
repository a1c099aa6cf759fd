//! The background execution context for the particle engine.
//!
//! A dedicated thread owns the engine outright. While Idle it blocks on the
//! channel; while Running it drains messages until the next frame is due and
//! then renders one frame. Dropping every sender ends the thread, and `join`
//! returns the engine's counters.

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use tracing::{debug, info};

use crate::channel::EngineMsg;
use crate::error::Error;
use crate::fx::{EngineState, EngineStats, EngineTuning, ParticleEngine};

/// ~60 frames per second, the cadence of an animation-frame callback.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

pub struct ParticleWorker {
    handle: JoinHandle<EngineStats>,
}

impl ParticleWorker {
    pub fn spawn(rx: Receiver<EngineMsg>, tuning: EngineTuning) -> Result<Self, Error> {
        Self::spawn_engine(rx, ParticleEngine::new(tuning))
    }

    pub fn spawn_engine(rx: Receiver<EngineMsg>, engine: ParticleEngine) -> Result<Self, Error> {
        let handle = thread::Builder::new()
            .name("particle-engine".into())
            .spawn(move || run(rx, engine, FRAME_INTERVAL))
            .map_err(|e| Error::Worker(format!("spawn thread: {e}")))?;
        Ok(Self { handle })
    }

    /// Wait for the thread to finish; it does once all senders are dropped.
    pub fn join(self) -> Result<EngineStats, Error> {
        self.handle
            .join()
            .map_err(|_| Error::Worker("particle thread panicked".into()))
    }
}

/// The worker's cooperative loop. Each frame processes the whole active set
/// before the next one is scheduled; nothing is scheduled while Idle.
pub fn run(rx: Receiver<EngineMsg>, mut engine: ParticleEngine, interval: Duration) -> EngineStats {
    debug!("particle worker started");
    let mut next_frame = Instant::now();

    loop {
        match engine.state() {
            EngineState::Idle => match rx.recv() {
                Ok(msg) => {
                    let now = Instant::now();
                    engine.handle(msg, now);
                    // first frame runs right away
                    next_frame = now;
                }
                Err(_) => break,
            },
            EngineState::Running => match rx.recv_deadline(next_frame) {
                Ok(msg) => engine.handle(msg, Instant::now()),
                Err(RecvTimeoutError::Timeout) => {
                    let now = Instant::now();
                    engine.advance_frame(now);
                    next_frame = now + interval;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            },
        }
    }

    let stats = engine.stats();
    info!(
        frames = stats.frames_rendered,
        spawns = stats.spawns_accepted,
        dropped_before_setup = stats.dropped_before_setup,
        dropped_at_cap = stats.dropped_at_cap,
        "particle worker stopped"
    );
    stats
}
