use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::model::{JobStatus, RenderJob, RenderResult};
use crate::media::effects::{EffectIntensity, MotionEffect};
use crate::media::scene::BackdropPosition;
use crate::media::text::TextStyle;

fn default_scene_duration() -> f64 {
    3.5
}

fn default_music_volume() -> f64 {
    0.3
}

fn default_opacity() -> f64 {
    1.0
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Image source is required".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SceneRequest {
    /// 1-based position in the video. Scenes without one keep their place in the list.
    #[serde(default)]
    #[validate(range(min = 1, message = "Scene order starts at 1"))]
    pub order: Option<u32>,
    #[serde(alias = "imageUrl", alias = "image")]
    #[validate(custom(function = "not_blank"))]
    pub image_source: String,
    #[serde(default, alias = "audioUrl", alias = "audio")]
    pub narration_audio: Option<String>,
    #[serde(default, alias = "subtitle")]
    pub subtitle_text: Option<String>,
    #[serde(default, alias = "title")]
    pub title_text: Option<String>,
    /// Seconds; defaults to 3.5.
    #[serde(default = "default_scene_duration", alias = "duration")]
    #[validate(range(exclusive_min = 0.0, message = "Scene duration must be positive"))]
    pub duration_seconds: f64,
}

impl SceneRequest {
    /// Narration source, treating a blank one as absent.
    pub fn narration(&self) -> Option<&str> {
        self.narration_audio.as_deref().filter(|a| !a.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TextStyleRequest {
    #[serde(default, alias = "fontFamily")]
    pub font: Option<String>,
    #[serde(default, alias = "fontSize")]
    pub size: Option<u32>,
    #[serde(default, alias = "fontColor")]
    pub color: Option<String>,
    /// Distance from the anchoring edge in pixels.
    #[serde(default, alias = "yPosition")]
    pub y_offset: Option<u32>,
    #[serde(default, alias = "borderWidth")]
    pub stroke_width: Option<u32>,
    #[serde(default, alias = "borderColor")]
    pub stroke_color: Option<String>,
}

impl TextStyleRequest {
    /// Fills unset fields from `defaults`.
    pub fn resolve(&self, defaults: TextStyle) -> TextStyle {
        let pick = |value: &Option<String>, fallback: String| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .unwrap_or(fallback)
        };
        TextStyle {
            font: pick(&self.font, defaults.font),
            size: self.size.filter(|s| *s > 0).unwrap_or(defaults.size),
            color: pick(&self.color, defaults.color),
            offset: self.y_offset.unwrap_or(defaults.offset),
            stroke_width: self.stroke_width.unwrap_or(defaults.stroke_width),
            stroke_color: pick(&self.stroke_color, defaults.stroke_color),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MusicRequest {
    #[serde(alias = "url")]
    pub source: String,
    #[serde(default = "default_music_volume")]
    #[validate(range(min = 0.0, max = 1.0, message = "Music volume must be within [0, 1]"))]
    pub volume: f64,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackdropRequest {
    #[serde(alias = "url")]
    pub source: String,
    #[serde(default = "default_opacity")]
    #[validate(range(min = 0.0, max = 1.0, message = "Backdrop opacity must be within [0, 1]"))]
    pub opacity: f64,
    /// `center` (default), `top` or `bottom`.
    #[serde(default)]
    pub position: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRequest {
    /// Motion effect name, e.g. `zoom-in` or `ken-burns`. Unknown names mean `none`.
    #[serde(default)]
    pub image_effect: Option<String>,
    /// `low`, `medium` (default) or `high`.
    #[serde(default)]
    pub effect_intensity: Option<String>,
    #[serde(default, alias = "subtitleSettings")]
    pub subtitle_style: Option<TextStyleRequest>,
    #[serde(default, alias = "titleSettings")]
    pub title_style: Option<TextStyleRequest>,
    #[serde(default, alias = "bgMusic")]
    #[validate(nested)]
    pub background_music: Option<MusicRequest>,
    #[serde(default, alias = "bgImage")]
    #[validate(nested)]
    pub background_image: Option<BackdropRequest>,
}

impl SettingsRequest {
    pub fn effect(&self) -> MotionEffect {
        self.image_effect
            .as_deref()
            .map(MotionEffect::from_name)
            .unwrap_or_default()
    }

    pub fn intensity(&self) -> EffectIntensity {
        self.effect_intensity
            .as_deref()
            .map(EffectIntensity::from_name)
            .unwrap_or_default()
    }

    pub fn subtitle_style(&self) -> TextStyle {
        self.subtitle_style
            .clone()
            .unwrap_or_default()
            .resolve(TextStyle::subtitle_default())
    }

    pub fn title_style(&self) -> TextStyle {
        self.title_style
            .clone()
            .unwrap_or_default()
            .resolve(TextStyle::title_default())
    }

    /// Music with a blank source counts as not configured.
    pub fn music(&self) -> Option<&MusicRequest> {
        self.background_music
            .as_ref()
            .filter(|m| !m.source.trim().is_empty())
    }

    pub fn backdrop(&self) -> Option<&BackdropRequest> {
        self.background_image
            .as_ref()
            .filter(|b| !b.source.trim().is_empty())
    }

    pub fn backdrop_position(&self) -> BackdropPosition {
        self.backdrop()
            .and_then(|b| b.position.as_deref())
            .map(BackdropPosition::from_name)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    #[validate(length(min = 1, message = "At least one scene is required"), nested)]
    pub scenes: Vec<SceneRequest>,
    #[serde(default)]
    #[validate(nested)]
    pub settings: SettingsRequest,
}

impl RenderRequest {
    /// Scenes stably sorted by `order`; a scene without one sorts at its list position.
    /// Each scene is paired with the number used to name it in errors.
    pub fn ordered_scenes(&self) -> Vec<(usize, SceneRequest)> {
        let mut scenes: Vec<(usize, SceneRequest)> = self
            .scenes
            .iter()
            .enumerate()
            .map(|(i, scene)| {
                let number = scene.order.map(|o| o as usize).unwrap_or(i + 1);
                (number, scene.clone())
            })
            .collect();
        scenes.sort_by_key(|(number, _)| *number);
        scenes
    }

    pub fn total_duration(&self) -> f64 {
        self.scenes.iter().map(|s| s.duration_seconds).sum()
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RenderAccepted {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub message: String,
    pub estimated_seconds: u64,
    pub check_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    pub job_id: String,
    /// `processing`, `completed`, `failed` or `not_found`.
    pub status: String,
    pub progress: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<RenderResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobStatusResponse {
    pub fn not_found(job_id: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            status: "not_found".to_string(),
            progress: 0,
            message: "Job not found".to_string(),
            result: None,
            error: None,
        }
    }
}

impl From<RenderJob> for JobStatusResponse {
    fn from(job: RenderJob) -> Self {
        Self {
            job_id: job.id.to_string(),
            status: job.status.to_string(),
            progress: job.progress,
            message: job.message,
            result: job.result,
            error: job.error,
        }
    }
}
