use rand::distr::Alphanumeric;
use rand::Rng;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

const WORKSPACE_PREFIX: &str = "job";

/// `<prefix>_<unix-millis>_<6 random lowercase alphanumerics>`.
pub fn timestamped_id(prefix: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("{}_{}_{}", prefix, millis, suffix)
}

/// Private scratch directory for one render job.
#[derive(Debug)]
pub struct JobWorkspace {
    dir: PathBuf,
}

impl JobWorkspace {
    pub async fn create(temp_root: &Path) -> io::Result<Self> {
        let dir = temp_root.join(timestamped_id(WORKSPACE_PREFIX));
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    pub async fn remove(self) -> io::Result<()> {
        tokio::fs::remove_dir_all(&self.dir).await?;
        info!("🧹 Removed workspace {}", self.dir.display());
        Ok(())
    }
}

/// Deletes job workspaces under `temp_root` last modified more than `max_age` ago.
/// Returns how many were removed. A missing root counts as empty.
pub async fn sweep_stale(temp_root: &Path, max_age: Duration) -> io::Result<usize> {
    let mut entries = match tokio::fs::read_dir(temp_root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let marker = format!("{}_", WORKSPACE_PREFIX);
    let now = SystemTime::now();
    let mut removed = 0;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with(&marker) {
            continue;
        }

        let metadata = entry.metadata().await?;
        let age = metadata
            .modified()
            .ok()
            .and_then(|m| now.duration_since(m).ok())
            .unwrap_or_default();
        if !metadata.is_dir() || age < max_age {
            continue;
        }

        match tokio::fs::remove_dir_all(entry.path()).await {
            Ok(()) => removed += 1,
            Err(e) => warn!("Failed to remove stale workspace {:?}: {}", name, e),
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_have_prefix_timestamp_and_suffix() {
        let id = timestamped_id("video");
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "video");
        assert!(parts[1].parse::<u128>().is_ok());
        assert_eq!(parts[2].len(), 6);
        assert!(parts[2].chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        assert_ne!(timestamped_id("video"), timestamped_id("video"));
    }

    #[tokio::test]
    async fn workspace_is_created_and_removed() {
        let root = tempfile::tempdir().unwrap();
        let ws = JobWorkspace::create(root.path()).await.unwrap();
        let dir = ws.path().to_path_buf();
        assert!(dir.is_dir());
        assert!(dir.file_name().unwrap().to_string_lossy().starts_with("job_"));
        assert_eq!(ws.file("scene_0.mp4"), dir.join("scene_0.mp4"));

        ws.remove().await.unwrap();
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn sweep_only_touches_old_job_directories() {
        let root = tempfile::tempdir().unwrap();
        let ws = JobWorkspace::create(root.path()).await.unwrap();
        tokio::fs::create_dir(root.path().join("keep_me")).await.unwrap();

        assert_eq!(sweep_stale(root.path(), Duration::from_secs(3600)).await.unwrap(), 0);
        assert!(ws.path().exists());

        assert_eq!(sweep_stale(root.path(), Duration::ZERO).await.unwrap(), 1);
        assert!(!ws.path().exists());
        assert!(root.path().join("keep_me").exists());
    }

    #[tokio::test]
    async fn sweep_of_missing_root_is_a_no_op() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("absent");
        assert_eq!(sweep_stale(&missing, Duration::ZERO).await.unwrap(), 0);
    }
}
