use serde::Deserialize;

use super::{EngineError, EngineResult};

/// The subset of ffprobe output the pipeline cares about.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaInfo {
    pub duration_seconds: f64,
    pub has_video: bool,
    pub has_audio: bool,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Parses `ffprobe -print_format json -show_format -show_streams` output.
pub fn parse_probe_output(json: &str) -> EngineResult<MediaInfo> {
    let output: ProbeOutput = serde_json::from_str(json)
        .map_err(|e| EngineError::Probe(format!("Failed to parse ffprobe output: {}", e)))?;

    let duration_seconds = output
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    let mut info = MediaInfo {
        duration_seconds,
        ..MediaInfo::default()
    };

    for stream in output.streams {
        match stream.codec_type.as_deref() {
            Some("video") if !info.has_video => {
                info.has_video = true;
                info.width = stream.width;
                info.height = stream.height;
            }
            Some("audio") => info.has_audio = true,
            _ => {}
        }
    }

    Ok(info)
}
