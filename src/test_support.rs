use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use crate::infrastructure::ffmpeg::{EngineError, EngineResult, FfmpegCommand, MediaEngine, MediaInfo};

/// Records every command and writes a placeholder output instead of encoding.
///
/// Probing a file this engine produced reports the `-t` of the command as duration and
/// an audio stream when an audio label was mapped.
#[derive(Default)]
pub struct FakeEngine {
    commands: Mutex<Vec<FfmpegCommand>>,
    media: Mutex<HashMap<PathBuf, MediaInfo>>,
    fail_on: Option<String>,
    delay: Option<Duration>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails any command whose output path contains `pattern`.
    pub fn failing_on(pattern: &str) -> Self {
        Self {
            fail_on: Some(pattern.to_string()),
            ..Self::default()
        }
    }

    /// Makes every encode take `delay`, so concurrent runs overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn register(&self, path: &Path, duration: f64, has_audio: bool) {
        self.media.lock().unwrap().insert(
            path.to_path_buf(),
            MediaInfo {
                duration_seconds: duration,
                has_video: true,
                has_audio,
                width: Some(1080),
                height: Some(1920),
            },
        );
    }

    pub fn commands(&self) -> Vec<FfmpegCommand> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaEngine for FakeEngine {
    async fn run(&self, command: &FfmpegCommand) -> EngineResult<()> {
        self.commands.lock().unwrap().push(command.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let output = command.output();
        if let Some(pattern) = &self.fail_on {
            if output.to_string_lossy().contains(pattern.as_str()) {
                return Err(EngineError::Failed {
                    program: "ffmpeg".to_string(),
                    code: "1".to_string(),
                    stderr: "simulated failure".to_string(),
                });
            }
        }

        tokio::fs::write(output, b"fake media")
            .await
            .map_err(|e| EngineError::Spawn {
                program: "ffmpeg".to_string(),
                source: e,
            })?;

        let has_audio = command
            .maps()
            .iter()
            .any(|m| m == "[a]" || m.ends_with(":a"));
        let duration = command
            .output_arg("-t")
            .and_then(|t| t.parse().ok())
            .unwrap_or_default();
        self.register(output, duration, has_audio);
        Ok(())
    }

    async fn probe(&self, path: &Path) -> EngineResult<MediaInfo> {
        if let Some(info) = self.media.lock().unwrap().get(path) {
            return Ok(info.clone());
        }
        if path.exists() {
            Ok(MediaInfo {
                has_video: true,
                ..MediaInfo::default()
            })
        } else {
            Err(EngineError::Probe(format!("missing {}", path.display())))
        }
    }
}
