use futures_util::{stream, StreamExt, TryStreamExt};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::media::assembler::{MusicBed, SequenceAssembler};
use crate::media::assets::AssetKind;
use crate::media::fonts::FontCatalog;
use crate::media::profile::RenderProfile;
use crate::media::scene::{Backdrop, SceneLook, ScenePlan, SceneRenderer};
use crate::media::workspace::{timestamped_id, JobWorkspace};
use crate::modules::render::dto::{RenderRequest, SceneRequest};
use crate::modules::render::error::RenderError;
use crate::modules::render::model::RenderResult;
use crate::state::AppState;

/// Progress after `done` of `total` scenes have rendered: 10 → 85.
fn scene_progress(done: usize, total: usize) -> u8 {
    (10 + 75 * done / total.max(1)) as u8
}

/// Runs one accepted job to a terminal state. Meant to be spawned; never returns an
/// error, the outcome is recorded on the job instead.
pub async fn run_render_job(state: AppState, job_id: Uuid, request: RenderRequest) {
    let _permit = match &state.render_slots {
        Some(slots) => slots.clone().acquire_owned().await.ok(),
        None => None,
    };

    let started = Instant::now();
    info!(
        "🎬 Job {} started ({} scenes, effect {})",
        job_id,
        request.scenes.len(),
        request.settings.effect().as_str()
    );

    match render(&state, job_id, &request).await {
        Ok(mut result) => {
            result.processing_seconds = started.elapsed().as_secs_f64();
            info!(
                "✅ Job {} completed in {:.1}s -> {}",
                job_id, result.processing_seconds, result.url
            );
            state.jobs.complete(job_id, result).await;
        }
        Err(e) => {
            error!("❌ Job {} failed: {}", job_id, e);
            state.jobs.fail(job_id, e.to_string()).await;
        }
    }
}

async fn render(
    state: &AppState,
    job_id: Uuid,
    request: &RenderRequest,
) -> Result<RenderResult, RenderError> {
    if request.scenes.is_empty() {
        return Err(RenderError::FilterGraph("no scenes to render".to_string()));
    }
    if let Some(i) = request
        .scenes
        .iter()
        .position(|s| !s.duration_seconds.is_finite() || s.duration_seconds <= 0.0)
    {
        return Err(RenderError::FilterGraph(format!(
            "scene {} has non-positive duration",
            i + 1
        )));
    }

    let workspace = JobWorkspace::create(&state.config.temp_dir()).await?;
    match render_in(state, job_id, request, &workspace).await {
        Ok(result) => {
            if let Err(e) = workspace.remove().await {
                warn!("Job {}: failed to remove workspace: {}", job_id, e);
            }
            Ok(result)
        }
        Err(e) => {
            warn!(
                "Job {}: keeping workspace {} for inspection",
                job_id,
                workspace.path().display()
            );
            Err(e)
        }
    }
}

async fn render_in(
    state: &AppState,
    job_id: Uuid,
    request: &RenderRequest,
    workspace: &JobWorkspace,
) -> Result<RenderResult, RenderError> {
    let settings = &request.settings;

    let backdrop = match settings.backdrop() {
        Some(bg) => {
            let image = state
                .assets
                .fetch(&bg.source, AssetKind::Image, workspace.path(), "background")
                .await
                .map_err(|source| RenderError::SharedAssetFetch {
                    asset: "background image",
                    source,
                })?;
            Some(Backdrop {
                image,
                opacity: bg.opacity,
                position: settings.backdrop_position(),
            })
        }
        None => None,
    };

    let look = SceneLook {
        effect: settings.effect(),
        intensity: settings.intensity(),
        subtitle_style: settings.subtitle_style(),
        title_style: settings.title_style(),
        backdrop,
    };
    let pad_silence = request.scenes.iter().any(|s| s.narration().is_some());
    let renderer = SceneRenderer::new(
        RenderProfile::shorts_scene(),
        FontCatalog::new(&state.config.fonts_dir),
        look,
        pad_silence,
    );

    let scenes = request.ordered_scenes();
    let total = scenes.len();
    let done = AtomicUsize::new(0);
    let renderer = &renderer;
    let done = &done;

    let clips: Vec<PathBuf> = stream::iter(scenes.into_iter().enumerate())
        .map(|(index, (number, scene))| async move {
            let clip = render_scene(state, renderer, workspace, index, number, &scene).await?;
            let finished = done.fetch_add(1, Ordering::SeqCst) + 1;
            state
                .jobs
                .progress(
                    job_id,
                    scene_progress(finished, total),
                    &format!("Rendered scene {}/{}", finished, total),
                )
                .await;
            Ok::<_, RenderError>(clip)
        })
        .buffered(state.config.scene_concurrency.max(1))
        .try_collect()
        .await?;

    state.jobs.progress(job_id, 90, "Assembling video").await;

    let music = match settings.music() {
        Some(m) => {
            let track = state
                .assets
                .fetch(&m.source, AssetKind::Audio, workspace.path(), "music")
                .await
                .map_err(|source| RenderError::SharedAssetFetch {
                    asset: "background music",
                    source,
                })?;
            Some(MusicBed {
                track,
                volume: m.volume,
            })
        }
        None => None,
    };

    let total_duration = request.total_duration();
    let video_id = timestamped_id("video");
    let output = state
        .config
        .videos_dir()
        .join(format!("{}.mp4", video_id));

    let assembler = SequenceAssembler::new(
        RenderProfile::shorts_final(),
        state.config.final_video_copy,
    );
    let video = assembler
        .assemble(
            state.engine.as_ref(),
            &clips,
            music.as_ref(),
            total_duration,
            workspace.path(),
            &output,
        )
        .await?;

    Ok(RenderResult {
        url: format!("/outputs/videos/{}.mp4", video_id),
        video_id,
        path: video.path.to_string_lossy().to_string(),
        size_bytes: video.size_bytes,
        duration_seconds: video.duration_seconds,
        processing_seconds: 0.0,
    })
}

async fn render_scene(
    state: &AppState,
    renderer: &SceneRenderer,
    workspace: &JobWorkspace,
    index: usize,
    number: usize,
    scene: &SceneRequest,
) -> Result<PathBuf, RenderError> {
    let fetch_err = |source| RenderError::AssetFetch {
        scene: number,
        source,
    };

    let image = state
        .assets
        .fetch(
            &scene.image_source,
            AssetKind::Image,
            workspace.path(),
            &format!("image_{}", index),
        )
        .await
        .map_err(fetch_err)?;

    let narration = match scene.narration() {
        Some(audio) => Some(
            state
                .assets
                .fetch(
                    audio,
                    AssetKind::Audio,
                    workspace.path(),
                    &format!("audio_{}", index),
                )
                .await
                .map_err(fetch_err)?,
        ),
        None => None,
    };

    let plan = ScenePlan {
        index,
        image,
        narration,
        duration: scene.duration_seconds,
        subtitle: scene.subtitle_text.clone(),
        title: scene.title_text.clone(),
    };
    let output = workspace.file(&format!("scene_{}.mp4", index));

    renderer
        .render(state.engine.as_ref(), &plan, &output)
        .await
        .map_err(|source| RenderError::EngineInvocation {
            scene: number,
            source,
        })
}
