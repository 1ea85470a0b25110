use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenderResult {
    pub video_id: String,
    pub path: String,
    pub url: String,
    pub size_bytes: u64,
    pub duration_seconds: f64,
    pub processing_seconds: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenderJob {
    pub id: Uuid,
    pub status: JobStatus,
    pub progress: u8,
    pub message: String,
    pub scene_count: usize,
    #[serde(with = "time::serde::iso8601")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::iso8601")]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: OffsetDateTime,
    pub result: Option<RenderResult>,
    pub error: Option<String>,
}

impl RenderJob {
    pub fn new(id: Uuid, scene_count: usize) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id,
            status: JobStatus::Processing,
            progress: 0,
            message: "Preparing render".to_string(),
            scene_count,
            created_at: now,
            updated_at: now,
            result: None,
            error: None,
        }
    }

    /// Records a progress checkpoint. Progress never moves backwards and terminal jobs
    /// are left untouched; returns whether the job changed.
    pub fn advance(&mut self, progress: u8, message: &str) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.progress = self.progress.max(progress.min(99));
        self.message = message.to_string();
        self.updated_at = OffsetDateTime::now_utc();
        true
    }

    pub fn complete(&mut self, result: RenderResult) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = JobStatus::Completed;
        self.progress = 100;
        self.message = "Render completed".to_string();
        self.result = Some(result);
        self.updated_at = OffsetDateTime::now_utc();
        true
    }

    pub fn fail(&mut self, error: String) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = JobStatus::Failed;
        self.message = "Render failed".to_string();
        self.error = Some(error);
        self.updated_at = OffsetDateTime::now_utc();
        true
    }

    /// Terminal and created before `cutoff`.
    pub fn is_expired(&self, cutoff: OffsetDateTime) -> bool {
        self.status.is_terminal() && self.created_at < cutoff
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> RenderResult {
        RenderResult {
            video_id: "video_1".to_string(),
            path: "/tmp/outputs/videos/video_1.mp4".to_string(),
            url: "/outputs/videos/video_1.mp4".to_string(),
            size_bytes: 1024,
            duration_seconds: 10.5,
            processing_seconds: 2.0,
        }
    }

    #[test]
    fn progress_is_monotonic_and_capped_below_completion() {
        let mut job = RenderJob::new(Uuid::new_v4(), 3);
        assert!(job.advance(40, "Rendering scene 2/3"));
        job.advance(10, "late checkpoint");
        assert_eq!(job.progress, 40);
        job.advance(120, "overflow");
        assert_eq!(job.progress, 99);
    }

    #[test]
    fn terminal_states_accept_no_further_transitions() {
        let mut job = RenderJob::new(Uuid::new_v4(), 1);
        assert!(job.complete(sample_result()));
        assert!(!job.fail("too late".to_string()));
        assert!(!job.advance(50, "too late"));
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100);
        assert!(job.error.is_none());

        let mut failed = RenderJob::new(Uuid::new_v4(), 1);
        assert!(failed.fail("boom".to_string()));
        assert!(!failed.complete(sample_result()));
        assert_eq!(failed.status, JobStatus::Failed);
        assert!(failed.result.is_none());
    }

    #[test]
    fn only_terminal_jobs_expire() {
        let mut job = RenderJob::new(Uuid::new_v4(), 1);
        let future = OffsetDateTime::now_utc() + time::Duration::hours(1);
        assert!(!job.is_expired(future));
        job.fail("boom".to_string());
        assert!(job.is_expired(future));
        assert!(!job.is_expired(job.created_at));
    }

    #[test]
    fn serializes_with_camel_case_and_lowercase_status() {
        let job = RenderJob::new(Uuid::new_v4(), 2);
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["status"], "processing");
        assert_eq!(json["sceneCount"], 2);
        assert!(json["createdAt"].is_string());
    }
}
