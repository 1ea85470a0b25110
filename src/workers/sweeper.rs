use serde::Serialize;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::media::workspace;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub removed_jobs: usize,
    pub removed_workspaces: usize,
}

/// Drops expired terminal jobs and stale job workspaces.
pub async fn sweep_once(state: &AppState) -> SweepReport {
    let removed_jobs = state.jobs.sweep(state.config.retention()).await;

    let max_age = Duration::from_secs(state.config.job_retention_hours.saturating_mul(3600));
    let removed_workspaces = match workspace::sweep_stale(&state.config.temp_dir(), max_age).await
    {
        Ok(n) => n,
        Err(e) => {
            warn!("Temp sweep failed: {}", e);
            0
        }
    };

    SweepReport {
        removed_jobs,
        removed_workspaces,
    }
}

pub async fn start_sweeper(state: AppState) {
    let period = state.config.sweep_interval();
    info!("🧽 Starting sweeper (every {:?})", period);

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; nothing can have expired yet.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let report = sweep_once(&state).await;
        if report != SweepReport::default() {
            info!(
                "🧽 Sweep removed {} jobs and {} workspaces",
                report.removed_jobs, report.removed_workspaces
            );
        }
    }
}
