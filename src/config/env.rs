use std::env;
use std::str::FromStr;

pub enum EnvKey {
    ServerPort,
    OutputDir,
    PublicBaseUrl,
    FfmpegPath,
    FfprobePath,
    FontsDir,
    FetchTimeoutSecs,
    SceneConcurrency,
    MaxConcurrentJobs,
    JobRetentionHours,
    SweepIntervalSecs,
    FinalVideoCopy,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ServerPort => "APP_PORT",
            EnvKey::OutputDir => "OUTPUT_DIR",
            EnvKey::PublicBaseUrl => "PUBLIC_BASE_URL",
            EnvKey::FfmpegPath => "FFMPEG_PATH",
            EnvKey::FfprobePath => "FFPROBE_PATH",
            EnvKey::FontsDir => "FONTS_DIR",
            EnvKey::FetchTimeoutSecs => "FETCH_TIMEOUT_SECS",
            EnvKey::SceneConcurrency => "SCENE_CONCURRENCY",
            EnvKey::MaxConcurrentJobs => "MAX_CONCURRENT_JOBS",
            EnvKey::JobRetentionHours => "JOB_RETENTION_HOURS",
            EnvKey::SweepIntervalSecs => "SWEEP_INTERVAL_SECS",
            EnvKey::FinalVideoCopy => "FINAL_VIDEO_COPY",
        }
    }
}

pub fn get(key: EnvKey) -> Result<String, env::VarError> {
    env::var(key.as_str())
}

pub fn get_or(key: EnvKey, default: &str) -> String {
    env::var(key.as_str()).unwrap_or_else(|_| default.to_string())
}

pub fn get_parsed<T: FromStr>(key: EnvKey, default: T) -> T {
    match get(key) {
        Ok(val) => val.trim().parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}
