use futures_util::StreamExt;
use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;

use crate::infrastructure::http::client::HttpFetcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Image,
    Audio,
}

impl AssetKind {
    fn default_extension(&self) -> &'static str {
        match self {
            AssetKind::Image => "jpg",
            AssetKind::Audio => "mp3",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("Invalid asset reference '{0}'")]
    InvalidReference(String),

    #[error("HTTP {status} fetching {url}")]
    Status { url: String, status: u16 },

    #[error("Timed out fetching {url}")]
    Timeout { url: String },

    #[error("Network error fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Local asset not found: {}", .0.display())]
    MissingLocal(PathBuf),

    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
enum AssetSource {
    Remote(Url),
    Local(PathBuf),
}

/// Turns an asset reference from a render request into a local file inside a job's
/// working directory.
///
/// References may be absolute `http(s)` URLs, paths under this service's own `/api/`
/// (fetched through the public base URL), paths under `/outputs/` (read straight from
/// the output root), or plain filesystem paths.
#[derive(Clone)]
pub struct AssetResolver {
    http: HttpFetcher,
    public_base_url: String,
    output_dir: PathBuf,
}

impl AssetResolver {
    pub fn new(http: HttpFetcher, public_base_url: &str, output_dir: impl AsRef<Path>) -> Self {
        Self {
            http,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    fn classify(&self, reference: &str) -> Result<AssetSource, AssetError> {
        let reference = reference.trim();
        let invalid = || AssetError::InvalidReference(reference.to_string());

        if reference.is_empty() {
            return Err(invalid());
        }

        if reference.starts_with("http://") || reference.starts_with("https://") {
            return Url::parse(reference)
                .map(AssetSource::Remote)
                .map_err(|_| invalid());
        }

        if reference.starts_with("/api/") {
            return Url::parse(&format!("{}{}", self.public_base_url, reference))
                .map(AssetSource::Remote)
                .map_err(|_| invalid());
        }

        if let Some(relative) = reference.strip_prefix("/outputs/") {
            let relative = Path::new(relative);
            let escapes = relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)));
            if escapes {
                return Err(invalid());
            }
            return Ok(AssetSource::Local(self.output_dir.join(relative)));
        }

        Ok(AssetSource::Local(PathBuf::from(reference)))
    }

    /// Materializes `reference` as `<dest_dir>/<stem>.<ext>` and returns its path.
    pub async fn fetch(
        &self,
        reference: &str,
        kind: AssetKind,
        dest_dir: &Path,
        stem: &str,
    ) -> Result<PathBuf, AssetError> {
        match self.classify(reference)? {
            AssetSource::Remote(url) => self.download(url, kind, dest_dir, stem).await,
            AssetSource::Local(path) => copy_local(&path, kind, dest_dir, stem).await,
        }
    }

    async fn download(
        &self,
        url: Url,
        kind: AssetKind,
        dest_dir: &Path,
        stem: &str,
    ) -> Result<PathBuf, AssetError> {
        let url_str = url.to_string();
        let network = |e: reqwest::Error| {
            if e.is_timeout() {
                AssetError::Timeout {
                    url: url_str.clone(),
                }
            } else {
                AssetError::Network {
                    url: url_str.clone(),
                    source: e,
                }
            }
        };

        let response = self
            .http
            .client()
            .get(url.clone())
            .send()
            .await
            .map_err(&network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssetError::Status {
                url: url_str.clone(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<mime::Mime>().ok());

        let ext = extension_of(Path::new(url.path()))
            .or_else(|| content_type.as_ref().and_then(extension_for_mime))
            .unwrap_or_else(|| kind.default_extension().to_string());

        let dest = dest_dir.join(format!("{}.{}", stem, ext));
        let io_err = |source: io::Error| AssetError::Io {
            path: dest.clone(),
            source,
        };

        let mut file = tokio::fs::File::create(&dest).await.map_err(io_err)?;
        let mut stream = response.bytes_stream();
        let mut written = 0usize;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(&network)?;
            written += chunk.len();
            file.write_all(&chunk).await.map_err(io_err)?;
        }
        file.flush().await.map_err(io_err)?;

        info!("⬇️ Downloaded {} ({} bytes) -> {}", url_str, written, dest.display());
        Ok(dest)
    }
}

async fn copy_local(
    source: &Path,
    kind: AssetKind,
    dest_dir: &Path,
    stem: &str,
) -> Result<PathBuf, AssetError> {
    let is_file = tokio::fs::metadata(source)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false);
    if !is_file {
        return Err(AssetError::MissingLocal(source.to_path_buf()));
    }

    let ext = extension_of(source).unwrap_or_else(|| kind.default_extension().to_string());
    let dest = dest_dir.join(format!("{}.{}", stem, ext));
    tokio::fs::copy(source, &dest)
        .await
        .map_err(|source| AssetError::Io {
            path: dest.clone(),
            source,
        })?;

    debug!("Copied {} -> {}", source.display(), dest.display());
    Ok(dest)
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 5 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| e.to_ascii_lowercase())
}

fn extension_for_mime(content_type: &mime::Mime) -> Option<String> {
    let preferred = match content_type.essence_str() {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "audio/mpeg" => Some("mp3"),
        "audio/wav" | "audio/x-wav" => Some("wav"),
        "audio/mp4" => Some("m4a"),
        _ => None,
    };
    preferred
        .or_else(|| {
            mime_guess::get_mime_extensions(content_type).and_then(|exts| exts.first().copied())
        })
        .map(str::to_string)
}
