use async_trait::async_trait;
use std::collections::HashMap;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::modules::render::model::RenderJob;

/// In-place mutation of one stored job; returns whether the job changed.
pub type JobUpdate = Box<dyn FnOnce(&mut RenderJob) -> bool + Send>;

/// Key-value storage for render jobs. The in-memory default loses everything on restart;
/// a persistent implementation can be injected through `AppState` instead.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn put(&self, job: RenderJob);

    async fn get(&self, id: Uuid) -> Option<RenderJob>;

    async fn remove(&self, id: Uuid) -> Option<RenderJob>;

    /// Applies `apply` to the stored job atomically. `None` when the id is unknown.
    async fn update(&self, id: Uuid, apply: JobUpdate) -> Option<bool>;

    async fn list(&self) -> Vec<RenderJob>;

    /// Deletes terminal jobs created before `cutoff` and returns how many were removed.
    async fn remove_terminal_before(&self, cutoff: OffsetDateTime) -> usize;
}

#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<Uuid, RenderJob>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn put(&self, job: RenderJob) {
        self.jobs.write().await.insert(job.id, job);
    }

    async fn get(&self, id: Uuid) -> Option<RenderJob> {
        self.jobs.read().await.get(&id).cloned()
    }

    async fn remove(&self, id: Uuid) -> Option<RenderJob> {
        self.jobs.write().await.remove(&id)
    }

    async fn update(&self, id: Uuid, apply: JobUpdate) -> Option<bool> {
        let mut jobs = self.jobs.write().await;
        jobs.get_mut(&id).map(apply)
    }

    async fn list(&self) -> Vec<RenderJob> {
        self.jobs.read().await.values().cloned().collect()
    }

    async fn remove_terminal_before(&self, cutoff: OffsetDateTime) -> usize {
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, job| !job.is_expired(cutoff));
        before - jobs.len()
    }
}
