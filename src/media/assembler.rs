//! Ordered clips → one published video.

use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::filters::{fmt_num, Filter, FilterChain, FilterGraph};
use super::profile::RenderProfile;
use crate::infrastructure::ffmpeg::{EngineError, FfmpegCommand, MediaEngine};

/// Music is this much louder when it plays alone than when mixed under narration.
const SOLO_MUSIC_BOOST: f64 = 5.0 / 3.0;

#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    #[error("No clips to assemble")]
    NoClips,

    #[error("Failed to write concat manifest: {0}")]
    Manifest(#[source] io::Error),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Failed to publish {}: {source}", .path.display())]
    Publish {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MusicBed {
    pub track: PathBuf,
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FinalVideo {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub duration_seconds: f64,
}

/// Escapes a path for a `file '...'` line of the concat demuxer. The demuxer resolves
/// relative entries against the manifest's own directory, so entries are made absolute.
fn manifest_line(path: &Path) -> String {
    let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    format!("file '{}'", path.to_string_lossy().replace('\'', r"'\''"))
}

pub fn concat_manifest(clips: &[PathBuf]) -> String {
    let mut manifest = clips
        .iter()
        .map(|c| manifest_line(c))
        .collect::<Vec<_>>()
        .join("\n");
    manifest.push('\n');
    manifest
}

pub struct SequenceAssembler {
    profile: RenderProfile,
    copy_video: bool,
}

impl SequenceAssembler {
    pub fn new(profile: RenderProfile, copy_video: bool) -> Self {
        Self {
            profile,
            copy_video,
        }
    }

    /// `clips_have_audio` comes from probing the first clip; scene rendering keeps every
    /// clip's stream layout identical.
    pub fn command(
        &self,
        manifest: &Path,
        clips_have_audio: bool,
        music: Option<&MusicBed>,
        total_duration: f64,
        output: &Path,
    ) -> FfmpegCommand {
        let mut cmd = FfmpegCommand::new(output);
        cmd.input_path(manifest, &["-f", "concat", "-safe", "0"]);

        let mut graph = FilterGraph::new();
        let has_audio = match music {
            Some(bed) => {
                let index = cmd.input_path(&bed.track, &["-stream_loop", "-1"]);
                let music_in = format!("{}:a", index);
                if clips_have_audio {
                    graph.chain(&["0:a"], FilterChain::of(vec![Filter::Volume(1.0)]), "narration");
                    graph.chain(
                        &[music_in.as_str()],
                        FilterChain::of(vec![Filter::Volume(bed.volume)]),
                        "music",
                    );
                    graph.chain(
                        &["narration", "music"],
                        FilterChain::of(vec![Filter::Amix {
                            inputs: 2,
                            duration: "first",
                        }]),
                        "a",
                    );
                } else {
                    let boosted = (bed.volume * SOLO_MUSIC_BOOST).min(1.0);
                    graph.chain(
                        &[music_in.as_str()],
                        FilterChain::of(vec![Filter::Volume(boosted)]),
                        "a",
                    );
                }
                true
            }
            None => clips_have_audio,
        };

        cmd.map("0:v");
        if !graph.is_empty() {
            cmd.filter_graph(graph.to_string()).map("[a]");
        } else if has_audio {
            cmd.map("0:a");
        }

        if self.copy_video {
            cmd.output_args(["-c:v", "copy"]);
        } else {
            cmd.output_args(self.profile.video_args());
        }
        if has_audio {
            cmd.output_args(self.profile.audio_args());
        } else {
            cmd.output_args(["-an"]);
        }
        cmd.output_args(["-t".to_string(), fmt_num(total_duration)]);
        cmd.output_args(["-movflags", "+faststart"]);
        cmd
    }

    /// Concatenates `clips` into `output`. The encode goes to a scratch file in `workdir`
    /// which is only moved to `output` once the engine succeeds. Manifest and clips are
    /// deleted afterwards.
    pub async fn assemble(
        &self,
        engine: &dyn MediaEngine,
        clips: &[PathBuf],
        music: Option<&MusicBed>,
        total_duration: f64,
        workdir: &Path,
        output: &Path,
    ) -> Result<FinalVideo, AssemblyError> {
        let first = clips.first().ok_or(AssemblyError::NoClips)?;

        let manifest = workdir.join("concat.txt");
        tokio::fs::write(&manifest, concat_manifest(clips))
            .await
            .map_err(AssemblyError::Manifest)?;

        let clips_have_audio = engine.probe(first).await?.has_audio;
        debug!(
            "Assembling {} clips (audio: {}, music: {})",
            clips.len(),
            clips_have_audio,
            music.is_some()
        );

        let scratch = workdir.join("final.mp4");
        let cmd = self.command(&manifest, clips_have_audio, music, total_duration, &scratch);
        engine.run(&cmd).await?;

        publish(&scratch, output)
            .await
            .map_err(|source| AssemblyError::Publish {
                path: output.to_path_buf(),
                source,
            })?;

        let size_bytes = tokio::fs::metadata(output)
            .await
            .map(|m| m.len())
            .unwrap_or_default();
        let duration_seconds = match engine.probe(output).await {
            Ok(info) if info.duration_seconds > 0.0 => info.duration_seconds,
            Ok(_) => total_duration,
            Err(e) => {
                warn!("Could not probe {}: {}", output.display(), e);
                total_duration
            }
        };

        for path in std::iter::once(&manifest).chain(clips) {
            if let Err(e) = tokio::fs::remove_file(path).await {
                debug!("Could not remove {}: {}", path.display(), e);
            }
        }

        info!(
            "📼 Final video {} ({} bytes, {}s)",
            output.display(),
            size_bytes,
            fmt_num(duration_seconds)
        );
        Ok(FinalVideo {
            path: output.to_path_buf(),
            size_bytes,
            duration_seconds,
        })
    }
}

/// Moves `from` to `to`, copying when they live on different filesystems.
async fn publish(from: &Path, to: &Path) -> io::Result<()> {
    if let Some(parent) = to.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    if tokio::fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    tokio::fs::copy(from, to).await?;
    tokio::fs::remove_file(from).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeEngine;

    fn assembler() -> SequenceAssembler {
        SequenceAssembler::new(RenderProfile::shorts_final(), false)
    }

    fn bed(volume: f64) -> MusicBed {
        MusicBed {
            track: PathBuf::from("/w/music.mp3"),
            volume,
        }
    }

    #[test]
    fn manifest_quotes_paths() {
        let manifest = concat_manifest(&[
            PathBuf::from("/w/scene_0.mp4"),
            PathBuf::from("/w/it's/scene_1.mp4"),
        ]);
        assert_eq!(
            manifest,
            "file '/w/scene_0.mp4'\nfile '/w/it'\\''s/scene_1.mp4'\n"
        );
    }

    #[test]
    fn manifest_entries_are_absolute_for_relative_clips() {
        let relative = PathBuf::from("outputs/temp/job_1_abcdef/scene_0.mp4");
        let manifest = concat_manifest(&[relative.clone()]);
        let expected = std::env::current_dir().unwrap().join(&relative);
        assert_eq!(manifest, format!("file '{}'\n", expected.display()));
    }

    #[test]
    fn narration_is_mixed_with_looped_music() {
        let cmd = assembler().command(
            Path::new("/w/concat.txt"),
            true,
            Some(&bed(0.3)),
            12.5,
            Path::new("/w/final.mp4"),
        );
        let args = cmd.args();
        assert_eq!(
            cmd.graph(),
            Some(
                "[0:a]volume=1[narration];[1:a]volume=0.3[music];\
                 [narration][music]amix=inputs=2:duration=first:dropout_transition=0:normalize=0[a]"
            )
        );
        assert!(args.windows(2).any(|w| w == ["-stream_loop", "-1"]));
        assert!(args.windows(2).any(|w| w == ["-safe", "0"]));
        assert_eq!(cmd.maps(), ["0:v", "[a]"]);
        assert_eq!(cmd.output_arg("-t"), Some("12.5"));
        assert_eq!(cmd.output_arg("-crf"), Some("20"));
        assert_eq!(cmd.output_arg("-b:a"), Some("192k"));
    }

    #[test]
    fn music_alone_is_boosted_and_capped() {
        let cmd = assembler().command(
            Path::new("/w/concat.txt"),
            false,
            Some(&bed(0.3)),
            5.0,
            Path::new("/w/final.mp4"),
        );
        assert_eq!(cmd.graph(), Some("[1:a]volume=0.5[a]"));

        let loud = assembler().command(
            Path::new("/w/concat.txt"),
            false,
            Some(&bed(0.9)),
            5.0,
            Path::new("/w/final.mp4"),
        );
        assert_eq!(loud.graph(), Some("[1:a]volume=1[a]"));
    }

    #[test]
    fn without_music_audio_passes_through_or_is_dropped() {
        let with_audio =
            assembler().command(Path::new("/w/c.txt"), true, None, 5.0, Path::new("/w/f.mp4"));
        assert_eq!(with_audio.graph(), None);
        assert_eq!(with_audio.maps(), ["0:v", "0:a"]);
        assert_eq!(with_audio.output_arg("-c:a"), Some("aac"));

        let silent =
            assembler().command(Path::new("/w/c.txt"), false, None, 5.0, Path::new("/w/f.mp4"));
        assert_eq!(silent.maps(), ["0:v"]);
        assert!(silent.args().iter().any(|a| a == "-an"));
    }

    #[test]
    fn stream_copy_skips_video_encode() {
        let cmd = SequenceAssembler::new(RenderProfile::shorts_final(), true).command(
            Path::new("/w/c.txt"),
            true,
            None,
            5.0,
            Path::new("/w/f.mp4"),
        );
        assert_eq!(cmd.output_arg("-c:v"), Some("copy"));
        assert_eq!(cmd.output_arg("-crf"), None);
    }

    #[tokio::test]
    async fn assemble_publishes_and_cleans_up() {
        let work = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let engine = FakeEngine::new();

        let mut clips = Vec::new();
        for i in 0..2 {
            let clip = work.path().join(format!("scene_{}.mp4", i));
            tokio::fs::write(&clip, b"clip").await.unwrap();
            engine.register(&clip, 2.0, true);
            clips.push(clip);
        }

        let output = out.path().join("videos/video_1.mp4");
        let video = assembler()
            .assemble(&engine, &clips, None, 4.0, work.path(), &output)
            .await
            .unwrap();

        assert_eq!(video.path, output);
        assert!(output.exists());
        assert!(video.size_bytes > 0);
        assert_eq!(video.duration_seconds, 4.0);
        assert!(!work.path().join("final.mp4").exists());
        assert!(!work.path().join("concat.txt").exists());
        assert!(clips.iter().all(|c| !c.exists()));
    }

    #[tokio::test]
    async fn failed_assembly_publishes_nothing() {
        let work = tempfile::tempdir().unwrap();
        let engine = FakeEngine::failing_on("final.mp4");
        let clip = work.path().join("scene_0.mp4");
        tokio::fs::write(&clip, b"clip").await.unwrap();
        engine.register(&clip, 2.0, false);

        let output = work.path().join("published.mp4");
        let err = assembler()
            .assemble(&engine, &[clip.clone()], None, 2.0, work.path(), &output)
            .await
            .unwrap_err();

        assert!(matches!(err, AssemblyError::Engine(_)));
        assert!(!output.exists());
        assert!(clip.exists());
    }

    #[tokio::test]
    async fn empty_clip_list_is_rejected() {
        let work = tempfile::tempdir().unwrap();
        let err = assembler()
            .assemble(&FakeEngine::new(), &[], None, 0.0, work.path(), &work.path().join("x.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, AssemblyError::NoClips));
    }
}
