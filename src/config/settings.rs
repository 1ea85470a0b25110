use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::config::env::{self, EnvKey};

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub server_port: u16,
    pub output_dir: PathBuf,
    pub public_base_url: String,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub fonts_dir: PathBuf,
    pub fetch_timeout_secs: u64,
    pub scene_concurrency: usize,
    pub max_concurrent_jobs: usize,
    pub job_retention_hours: u64,
    pub sweep_interval_secs: u64,
    pub final_video_copy: bool,
}

impl AppConfig {
    pub fn new() -> Self {
        let server_port = env::get_parsed(EnvKey::ServerPort, 3000);
        let default_base_url = format!("http://localhost:{}", server_port);

        Self {
            server_port,
            output_dir: absolute_root(env::get_or(EnvKey::OutputDir, "/tmp/outputs")),
            public_base_url: env::get_or(EnvKey::PublicBaseUrl, &default_base_url)
                .trim_end_matches('/')
                .to_string(),
            ffmpeg_path: env::get_or(EnvKey::FfmpegPath, "ffmpeg"),
            ffprobe_path: env::get_or(EnvKey::FfprobePath, "ffprobe"),
            fonts_dir: PathBuf::from(env::get_or(EnvKey::FontsDir, "fonts")),
            fetch_timeout_secs: env::get_parsed(EnvKey::FetchTimeoutSecs, 60),
            scene_concurrency: env::get_parsed(EnvKey::SceneConcurrency, 1).max(1),
            max_concurrent_jobs: env::get_parsed(EnvKey::MaxConcurrentJobs, 0),
            job_retention_hours: env::get_parsed(EnvKey::JobRetentionHours, 24),
            sweep_interval_secs: env::get_parsed(EnvKey::SweepIntervalSecs, 3600).max(1),
            final_video_copy: env::get_parsed(EnvKey::FinalVideoCopy, false),
        }
    }

    /// Config rooted at `output_dir` with every other value at its default.
    #[cfg(test)]
    pub fn with_output_dir(output_dir: impl AsRef<Path>) -> Self {
        Self {
            server_port: 3000,
            output_dir: absolute_root(output_dir),
            public_base_url: "http://localhost:3000".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            fonts_dir: PathBuf::from("fonts"),
            fetch_timeout_secs: 60,
            scene_concurrency: 1,
            max_concurrent_jobs: 0,
            job_retention_hours: 24,
            sweep_interval_secs: 3600,
            final_video_copy: false,
        }
    }

    /// Published videos, served under `/outputs/videos`.
    pub fn videos_dir(&self) -> PathBuf {
        self.output_dir.join("videos")
    }

    /// Parent of every job working directory.
    pub fn temp_dir(&self) -> PathBuf {
        self.output_dir.join("temp")
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn retention(&self) -> time::Duration {
        time::Duration::hours(self.job_retention_hours as i64)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub async fn ensure_dirs(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(self.videos_dir()).await?;
        tokio::fs::create_dir_all(self.temp_dir()).await?;
        Ok(())
    }
}

/// Anchors a relative root at the working directory.
fn absolute_root(dir: impl AsRef<Path>) -> PathBuf {
    let dir = dir.as_ref();
    std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf())
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}
