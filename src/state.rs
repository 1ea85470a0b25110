use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::config::settings::AppConfig;
use crate::infrastructure::ffmpeg::MediaEngine;
use crate::infrastructure::http::client::HttpFetcher;
use crate::infrastructure::jobs::store::InMemoryJobStore;
use crate::infrastructure::jobs::tracker::JobTracker;
use crate::media::assets::AssetResolver;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub jobs: JobTracker,
    pub engine: Arc<dyn MediaEngine>,
    pub assets: AssetResolver,
    /// Caps concurrently running jobs; `None` when unlimited.
    pub render_slots: Option<Arc<Semaphore>>,
}

impl AppState {
    pub fn new(config: AppConfig, engine: Arc<dyn MediaEngine>, http: HttpFetcher) -> Self {
        let assets = AssetResolver::new(http, &config.public_base_url, &config.output_dir);
        let render_slots = match config.max_concurrent_jobs {
            0 => None,
            n => Some(Arc::new(Semaphore::new(n))),
        };

        Self {
            jobs: JobTracker::new(Arc::new(InMemoryJobStore::new())),
            config,
            engine,
            assets,
            render_slots,
        }
    }
}
