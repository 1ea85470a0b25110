use crate::infrastructure::ffmpeg::EngineError;
use crate::media::assembler::AssemblyError;
use crate::media::assets::AssetError;

/// Everything that can fail a render job. Scene numbers are 1-based, matching the
/// order in the request.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Invalid render request: {0}")]
    InvalidRequest(String),

    #[error("Job not found")]
    JobNotFound,

    #[error("Job is still processing")]
    JobInProgress,

    #[error("Scene {scene}: failed to fetch asset: {source}")]
    AssetFetch {
        scene: usize,
        #[source]
        source: AssetError,
    },

    #[error("Failed to fetch {asset}: {source}")]
    SharedAssetFetch {
        asset: &'static str,
        #[source]
        source: AssetError,
    },

    #[error("Invalid filter graph input: {0}")]
    FilterGraph(String),

    #[error("Scene {scene}: render failed: {source}")]
    EngineInvocation {
        scene: usize,
        #[source]
        source: EngineError,
    },

    #[error("Concatenation failed: {0}")]
    Concatenation(#[from] AssemblyError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
