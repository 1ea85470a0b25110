use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use super::store::{JobStore, JobUpdate};
use crate::modules::render::model::{RenderJob, RenderResult};

/// State transitions for render jobs on top of an injected [`JobStore`]. Every
/// transition runs inside the store's atomic `update`.
#[derive(Clone)]
pub struct JobTracker {
    store: Arc<dyn JobStore>,
}

impl JobTracker {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, scene_count: usize) -> RenderJob {
        let job = RenderJob::new(Uuid::new_v4(), scene_count);
        self.store.put(job.clone()).await;
        job
    }

    pub async fn get(&self, id: Uuid) -> Option<RenderJob> {
        self.store.get(id).await
    }

    /// All jobs, newest first.
    pub async fn list(&self) -> Vec<RenderJob> {
        let mut jobs = self.store.list().await;
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }

    pub async fn remove(&self, id: Uuid) -> Option<RenderJob> {
        self.store.remove(id).await
    }

    async fn update(&self, id: Uuid, apply: JobUpdate) -> bool {
        match self.store.update(id, apply).await {
            Some(changed) => changed,
            None => {
                warn!("Job {} vanished before it could be updated", id);
                false
            }
        }
    }

    pub async fn progress(&self, id: Uuid, progress: u8, message: &str) -> bool {
        let message = message.to_string();
        self.update(id, Box::new(move |job| job.advance(progress, &message)))
            .await
    }

    pub async fn complete(&self, id: Uuid, result: RenderResult) -> bool {
        self.update(id, Box::new(move |job| job.complete(result))).await
    }

    pub async fn fail(&self, id: Uuid, error: String) -> bool {
        self.update(id, Box::new(move |job| job.fail(error))).await
    }

    /// Drops terminal jobs older than `retention`.
    pub async fn sweep(&self, retention: time::Duration) -> usize {
        let cutoff = OffsetDateTime::now_utc() - retention;
        let removed = self.store.remove_terminal_before(cutoff).await;
        if removed > 0 {
            info!("🗑️ Removed {} expired render jobs", removed);
        }
        removed
    }
}
