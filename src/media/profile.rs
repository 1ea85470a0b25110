/// Encoding parameters shared by every clip of a job.
///
/// Scene clips must agree on all of these or the concat demuxer produces broken output.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderProfile {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub video_codec: &'static str,
    pub pixel_format: &'static str,
    pub preset: &'static str,
    pub crf: u8,
    pub audio_codec: &'static str,
    pub audio_bitrate: &'static str,
    pub sample_rate: u32,
    pub channels: u8,
}

impl RenderProfile {
    /// Vertical 1080x1920 intermediates, one per scene.
    pub fn shorts_scene() -> Self {
        Self {
            width: 1080,
            height: 1920,
            fps: 30,
            video_codec: "libx264",
            pixel_format: "yuv420p",
            preset: "medium",
            crf: 23,
            audio_codec: "aac",
            audio_bitrate: "128k",
            sample_rate: 44100,
            channels: 2,
        }
    }

    /// Final assembly pass; higher quality than the intermediates.
    pub fn shorts_final() -> Self {
        Self {
            crf: 20,
            audio_bitrate: "192k",
            ..Self::shorts_scene()
        }
    }

    pub fn video_args(&self) -> Vec<String> {
        vec![
            "-c:v".to_string(),
            self.video_codec.to_string(),
            "-preset".to_string(),
            self.preset.to_string(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-pix_fmt".to_string(),
            self.pixel_format.to_string(),
            "-r".to_string(),
            self.fps.to_string(),
        ]
    }

    pub fn audio_args(&self) -> Vec<String> {
        vec![
            "-c:a".to_string(),
            self.audio_codec.to_string(),
            "-b:a".to_string(),
            self.audio_bitrate.to_string(),
            "-ar".to_string(),
            self.sample_rate.to_string(),
            "-ac".to_string(),
            self.channels.to_string(),
        ]
    }
}
