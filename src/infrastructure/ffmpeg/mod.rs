//! External rendering engine (ffmpeg / ffprobe).
//!
//! The render pipeline only talks to [`MediaEngine`], so tests can swap the real
//! process-spawning [`FfmpegEngine`] for a recording fake.

mod command;
mod engine;
mod probe;

pub use command::FfmpegCommand;
pub use engine::FfmpegEngine;
pub use probe::{parse_probe_output, MediaInfo};

use async_trait::async_trait;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with status {code}: {stderr}")]
    Failed {
        program: String,
        code: String,
        stderr: String,
    },

    #[error("Probe error: {0}")]
    Probe(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Runs one encode to completion. There is no timeout around encodes.
    async fn run(&self, command: &FfmpegCommand) -> EngineResult<()>;

    async fn probe(&self, path: &Path) -> EngineResult<MediaInfo>;
}
