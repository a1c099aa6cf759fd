// One error type for the whole crate; no anyhow/thiserror.
// Every variant states *where* things went wrong. The scratch core itself
// (mask, raster, particles) never fails; only the edges do.
use std::fmt::{self, Display};

#[derive(Debug)]
pub enum Error {
    WindowInit(String),   // Creating the window failed
    WindowUpdate(String), // Pushing a frame to the window failed
    ContentLoad(String),  // Reading/decoding the hidden image failed
    Config(String),       // Reading/parsing the config file failed
    Worker(String),       // Starting/joining the particle thread failed
    Composite(String),    // Layer sizes disagree while compositing
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::WindowInit(s) => write!(f, "Window init error: {s}"),
            Error::WindowUpdate(s) => write!(f, "Window update error: {s}"),
            Error::ContentLoad(s) => write!(f, "Content load error: {s}"),
            Error::Config(s) => write!(f, "Config error: {s}"),
            Error::Worker(s) => write!(f, "Particle worker error: {s}"),
            Error::Composite(s) => write!(f, "Composite error: {s}"),
        }
    }
}

impl std::error::Error for Error {}
