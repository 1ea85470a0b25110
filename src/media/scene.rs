//! One scene → one normalized clip.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::effects::{motion_chain, EffectIntensity, Geometry, MotionEffect};
use super::filters::{fmt_num, Expr, Filter, FilterChain, FilterGraph, ScaleFit};
use super::fonts::FontCatalog;
use super::profile::RenderProfile;
use super::text::{text_overlay, Anchor, TextStyle};
use crate::infrastructure::ffmpeg::{EngineResult, FfmpegCommand, MediaEngine};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackdropPosition {
    #[default]
    Center,
    Top,
    Bottom,
}

impl BackdropPosition {
    /// Unknown names map to [`BackdropPosition::Center`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "top" => Self::Top,
            "bottom" => Self::Bottom,
            _ => Self::Center,
        }
    }

    fn crop_y(&self, height: u32) -> Expr {
        match self {
            Self::Center => Expr::new(format!("(ih-{})/2", height)),
            Self::Top => Expr::num(0.0),
            Self::Bottom => Expr::new(format!("ih-{}", height)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Backdrop {
    pub image: PathBuf,
    pub opacity: f64,
    pub position: BackdropPosition,
}

/// Presentation shared by every scene of a job.
#[derive(Debug, Clone)]
pub struct SceneLook {
    pub effect: MotionEffect,
    pub intensity: EffectIntensity,
    pub subtitle_style: TextStyle,
    pub title_style: TextStyle,
    pub backdrop: Option<Backdrop>,
}

/// Local inputs and text for one scene.
#[derive(Debug, Clone)]
pub struct ScenePlan {
    pub index: usize,
    pub image: PathBuf,
    pub narration: Option<PathBuf>,
    pub duration: f64,
    pub subtitle: Option<String>,
    pub title: Option<String>,
}

pub struct SceneRenderer {
    profile: RenderProfile,
    fonts: FontCatalog,
    look: SceneLook,
    /// Give narration-less scenes a silent track so every clip has the same streams.
    pad_silence: bool,
}

impl SceneRenderer {
    pub fn new(profile: RenderProfile, fonts: FontCatalog, look: SceneLook, pad_silence: bool) -> Self {
        Self {
            profile,
            fonts,
            look,
            pad_silence,
        }
    }

    fn backdrop_chain(&self, backdrop: &Backdrop) -> FilterChain {
        let (w, h) = (self.profile.width, self.profile.height);
        let mut chain = FilterChain::of(vec![
            Filter::Scale {
                width: w,
                height: h,
                fit: Some(ScaleFit::Cover),
            },
            Filter::Crop {
                width: w,
                height: h,
                x: Expr::new(format!("(iw-{})/2", w)),
                y: backdrop.position.crop_y(h),
            },
        ]);
        if backdrop.opacity < 1.0 {
            chain.push(Filter::Dim(backdrop.opacity));
        }
        chain.push(Filter::SetSar);
        chain
    }

    fn text_chain(&self, plan: &ScenePlan) -> FilterChain {
        let mut chain = FilterChain::new();
        if let Some(subtitle) = plan.subtitle.as_deref() {
            chain.extend(text_overlay(
                subtitle,
                &self.look.subtitle_style,
                Anchor::Bottom,
                &self.fonts,
            ));
        }
        if let Some(title) = plan.title.as_deref() {
            chain.extend(text_overlay(
                title,
                &self.look.title_style,
                Anchor::Top,
                &self.fonts,
            ));
        }
        chain
    }

    /// Builds the single engine invocation that renders `plan` into `output`.
    pub fn command(&self, plan: &ScenePlan, output: &Path) -> FfmpegCommand {
        let fps = self.profile.fps.to_string();
        let still = ["-loop", "1", "-framerate", fps.as_str()];
        let duration = fmt_num(plan.duration);

        let mut cmd = FfmpegCommand::new(output);
        let mut graph = FilterGraph::new();

        let mut video = match &self.look.backdrop {
            Some(backdrop) => {
                let bg = cmd.input_path(&backdrop.image, &still);
                let fg = cmd.input_path(&plan.image, &still);
                graph.chain(&[format!("{}:v", bg).as_str()], self.backdrop_chain(backdrop), "bg");
                graph.chain(
                    &[format!("{}:v", fg).as_str()],
                    motion_chain(
                        self.look.effect,
                        self.look.intensity,
                        plan.duration,
                        Geometry::Overlay,
                        &self.profile,
                    ),
                    "fg",
                );
                FilterChain::of(vec![Filter::Overlay {
                    x: Expr::new("(W-w)/2"),
                    y: Expr::new("(H-h)/2"),
                }])
            }
            None => {
                cmd.input_path(&plan.image, &still);
                motion_chain(
                    self.look.effect,
                    self.look.intensity,
                    plan.duration,
                    Geometry::Fill,
                    &self.profile,
                )
            }
        };
        video.extend(self.text_chain(plan));
        video.push(Filter::Format(self.profile.pixel_format));

        if self.look.backdrop.is_some() {
            graph.chain(&["bg", "fg"], video, "v");
        } else {
            graph.chain(&["0:v"], video, "v");
        }

        let audio_input = match &plan.narration {
            Some(narration) => Some(cmd.input_path(narration, &[])),
            None if self.pad_silence => Some(cmd.input(
                format!(
                    "anullsrc=r={}:cl={}",
                    self.profile.sample_rate,
                    if self.profile.channels == 1 { "mono" } else { "stereo" }
                ),
                &["-f", "lavfi"],
            )),
            None => None,
        };

        if let Some(index) = audio_input {
            graph.chain(
                &[format!("{}:a", index).as_str()],
                FilterChain::of(vec![Filter::Aresample(self.profile.sample_rate), Filter::Apad]),
                "a",
            );
        }

        cmd.filter_graph(graph.to_string()).map("[v]");
        cmd.output_args(self.profile.video_args());
        if audio_input.is_some() {
            cmd.map("[a]").output_args(self.profile.audio_args());
        } else {
            cmd.output_args(["-an"]);
        }
        // Looped stills and padded audio never end on their own.
        cmd.output_args(["-t", duration.as_str()]);
        cmd
    }

    /// Renders one clip, then deletes the scene's own inputs. Inputs are kept when the
    /// engine fails.
    pub async fn render(
        &self,
        engine: &dyn MediaEngine,
        plan: &ScenePlan,
        output: &Path,
    ) -> EngineResult<PathBuf> {
        let cmd = self.command(plan, output);
        debug!("Scene {} graph: {}", plan.index, cmd.graph().unwrap_or_default());

        engine.run(&cmd).await?;

        for input in std::iter::once(&plan.image).chain(plan.narration.as_ref()) {
            if let Err(e) = tokio::fs::remove_file(input).await {
                debug!("Could not remove scene input {}: {}", input.display(), e);
            }
        }

        info!(
            "🎞️ Scene {} rendered ({}s) -> {}",
            plan.index + 1,
            fmt_num(plan.duration),
            output.display()
        );
        Ok(output.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeEngine;

    fn look(backdrop: Option<Backdrop>) -> SceneLook {
        SceneLook {
            effect: MotionEffect::ZoomIn,
            intensity: EffectIntensity::Medium,
            subtitle_style: TextStyle::subtitle_default(),
            title_style: TextStyle::title_default(),
            backdrop,
        }
    }

    fn renderer(backdrop: Option<Backdrop>, pad_silence: bool) -> SceneRenderer {
        SceneRenderer::new(
            RenderProfile::shorts_scene(),
            FontCatalog::new("fonts"),
            look(backdrop),
            pad_silence,
        )
    }

    fn plan(narration: Option<&str>) -> ScenePlan {
        ScenePlan {
            index: 0,
            image: PathBuf::from("/w/image_0.jpg"),
            narration: narration.map(PathBuf::from),
            duration: 3.5,
            subtitle: Some("hello".to_string()),
            title: Some("Title".to_string()),
        }
    }

    #[test]
    fn fill_scene_with_narration() {
        let cmd = renderer(None, true).command(&plan(Some("/w/audio_0.mp3")), Path::new("/w/scene_0.mp4"));
        let args = cmd.args();
        let graph = cmd.graph().unwrap();

        assert_eq!(cmd.input_count(), 2);
        assert!(graph.starts_with("[0:v]scale=1080:1920:force_original_aspect_ratio=increase"));
        assert!(graph.contains("zoompan="));
        assert!(graph.contains("format=yuv420p[v]"));
        assert!(graph.contains("[1:a]aresample=44100,apad[a]"));
        // subtitle is drawn before the title
        let subtitle = graph.find("text='hello'").unwrap();
        let title = graph.find("text='Title'").unwrap();
        assert!(subtitle < title);

        assert_eq!(cmd.maps(), ["[v]", "[a]"]);
        assert_eq!(cmd.output_arg("-t"), Some("3.5"));
        assert_eq!(cmd.output_arg("-c:v"), Some("libx264"));
        assert_eq!(cmd.output_arg("-pix_fmt"), Some("yuv420p"));
        assert_eq!(cmd.output_arg("-r"), Some("30"));
        assert_eq!(cmd.output_arg("-ar"), Some("44100"));
        assert!(!args.iter().any(|a| a == "-shortest"));
        assert_eq!(args.iter().filter(|a| *a == "-loop").count(), 1);
    }

    #[test]
    fn narrationless_scene_gets_silence_when_padding() {
        let cmd = renderer(None, true).command(&plan(None), Path::new("/w/scene_0.mp4"));
        let sources: Vec<&str> = cmd.input_sources().collect();
        assert_eq!(sources[1], "anullsrc=r=44100:cl=stereo");
        assert!(cmd.args().windows(2).any(|w| w == ["-f", "lavfi"]));
        assert_eq!(cmd.maps(), ["[v]", "[a]"]);
    }

    #[test]
    fn narrationless_scene_is_video_only_without_padding() {
        let cmd = renderer(None, false).command(&plan(None), Path::new("/w/scene_0.mp4"));
        assert_eq!(cmd.input_count(), 1);
        assert_eq!(cmd.maps(), ["[v]"]);
        assert!(cmd.args().iter().any(|a| a == "-an"));
        assert_eq!(cmd.output_arg("-c:a"), None);
    }

    #[test]
    fn backdrop_is_dimmed_and_foreground_centered() {
        let backdrop = Backdrop {
            image: PathBuf::from("/w/background.png"),
            opacity: 0.6,
            position: BackdropPosition::Top,
        };
        let cmd = renderer(Some(backdrop), false).command(&plan(None), Path::new("/w/scene_0.mp4"));
        let graph = cmd.graph().unwrap();
        let sources: Vec<&str> = cmd.input_sources().collect();

        assert_eq!(sources, ["/w/background.png", "/w/image_0.jpg"]);
        assert!(graph.contains("crop=1080:1920:'(iw-1080)/2':0,colorchannelmixer=rr=0.6:gg=0.6:bb=0.6,setsar=1[bg]"));
        assert!(graph.contains("[1:v]scale=1080:1920:force_original_aspect_ratio=decrease"));
        assert!(graph.contains("[bg][fg]overlay=x='(W-w)/2':y='(H-h)/2'"));
    }

    #[tokio::test]
    async fn successful_render_deletes_scene_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("image_0.jpg");
        let audio = dir.path().join("audio_0.mp3");
        tokio::fs::write(&image, b"img").await.unwrap();
        tokio::fs::write(&audio, b"mp3").await.unwrap();

        let plan = ScenePlan {
            image: image.clone(),
            narration: Some(audio.clone()),
            ..plan(None)
        };
        let engine = FakeEngine::new();
        let output = dir.path().join("scene_0.mp4");
        renderer(None, true).render(&engine, &plan, &output).await.unwrap();

        assert!(output.exists());
        assert!(!image.exists());
        assert!(!audio.exists());
        assert_eq!(engine.commands().len(), 1);
    }

    #[tokio::test]
    async fn failed_render_keeps_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("image_0.jpg");
        tokio::fs::write(&image, b"img").await.unwrap();

        let plan = ScenePlan {
            image: image.clone(),
            ..plan(None)
        };
        let engine = FakeEngine::failing_on("scene_0");
        let err = renderer(None, true)
            .render(&engine, &plan, &dir.path().join("scene_0.mp4"))
            .await;
        assert!(err.is_err());
        assert!(image.exists());
    }
}
