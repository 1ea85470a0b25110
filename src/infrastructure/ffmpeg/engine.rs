use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

use super::{parse_probe_output, EngineError, EngineResult, FfmpegCommand, MediaEngine, MediaInfo};

// Only the end of stderr is kept in job errors.
const STDERR_TAIL_LINES: usize = 20;

/// Spawns the system ffmpeg/ffprobe binaries, one child process per call.
#[derive(Clone, Debug)]
pub struct FfmpegEngine {
    ffmpeg_path: String,
    ffprobe_path: String,
}

impl FfmpegEngine {
    pub fn new(ffmpeg_path: &str, ffprobe_path: &str) -> Self {
        info!("🎞️ Using ffmpeg at '{}' and ffprobe at '{}'", ffmpeg_path, ffprobe_path);
        Self {
            ffmpeg_path: ffmpeg_path.to_string(),
            ffprobe_path: ffprobe_path.to_string(),
        }
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

#[async_trait]
impl MediaEngine for FfmpegEngine {
    async fn run(&self, command: &FfmpegCommand) -> EngineResult<()> {
        let args = command.args();
        debug!("ffmpeg {} (-> {})", args.join(" "), command.output().display());

        let output = Command::new(&self.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| EngineError::Spawn {
                program: self.ffmpeg_path.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(EngineError::Failed {
                program: self.ffmpeg_path.clone(),
                code: output
                    .status
                    .code()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string()),
                stderr: stderr_tail(&output.stderr),
            });
        }

        Ok(())
    }

    async fn probe(&self, path: &Path) -> EngineResult<MediaInfo> {
        if !path.exists() {
            return Err(EngineError::Probe(format!(
                "Input file does not exist: {}",
                path.display()
            )));
        }

        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| EngineError::Spawn {
                program: self.ffprobe_path.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(EngineError::Probe(format!(
                "ffprobe failed: {}",
                stderr_tail(&output.stderr)
            )));
        }

        parse_probe_output(&String::from_utf8_lossy(&output.stdout))
    }
}
