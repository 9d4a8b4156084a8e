//! ffmpeg, ffprobe and separator invocation.
//!
//! Argument lists are built by plain functions so they can be checked
//! without the tools installed; [`run_tool`] is the only place a process
//! is spawned.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde::Deserialize;

use super::transcode::TranscodeSpec;
use super::{MediaError, MediaResult};
use crate::logging::UnitLogger;
use crate::orchestrator::DurationProvider;

pub const FFMPEG: &str = "ffmpeg";
pub const FFPROBE: &str = "ffprobe";
pub const SPLEETER: &str = "spleeter";

/// stderr lines kept in a `CommandFailed` message when no unit log is open.
const FALLBACK_TAIL_LINES: usize = 20;

/// Run an external tool to completion.
///
/// stderr is fed to the unit log line by line. A non-zero exit becomes
/// `CommandFailed` carrying the last lines of stderr.
pub fn run_tool(tool: &str, args: &[String], logger: Option<&UnitLogger>) -> MediaResult<Output> {
    let command_line = format!("{} {}", tool, args.join(" "));
    tracing::debug!("Running: {}", command_line);
    if let Some(logger) = logger {
        logger.clear_tail();
        logger.command(&command_line);
    }

    let output = Command::new(tool)
        .args(args)
        .output()
        .map_err(|e| MediaError::spawn(tool, e))?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    if let Some(logger) = logger {
        for line in stderr.lines() {
            logger.output_line(line, true);
        }
    }

    if !output.status.success() {
        let message = match logger {
            Some(logger) => {
                logger.show_tail(tool);
                logger.tail().join("\n")
            }
            None => tail_lines(&stderr, FALLBACK_TAIL_LINES),
        };
        return Err(MediaError::command_failed(
            tool,
            output.status.code().unwrap_or(-1),
            message,
        ));
    }

    Ok(output)
}

fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

fn arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Contents of a concat demuxer list: one `file '<abs>'` line per segment.
pub fn concat_list(segments: &[PathBuf]) -> String {
    segments
        .iter()
        .map(|p| {
            let abs = std::path::absolute(p).unwrap_or_else(|_| p.clone());
            // Single quotes inside a quoted concat path are written as '\''
            format!("file '{}'\n", arg(&abs).replace('\'', r"'\''"))
        })
        .collect()
}

/// Lossless concatenation through the concat demuxer.
pub fn concat_args(list: &Path, output: &Path) -> Vec<String> {
    let mut args: Vec<String> = ["-f", "concat", "-safe", "0", "-i"]
        .map(String::from)
        .to_vec();
    args.push(arg(list));
    args.extend(["-c", "copy", "-y"].map(String::from));
    args.push(arg(output));
    args
}

/// Extract the audio track as 16-bit 44.1 kHz stereo WAV.
pub fn extract_wav_args(input: &Path, output: &Path) -> Vec<String> {
    let mut args = vec!["-i".to_string(), arg(input)];
    args.extend(
        ["-vn", "-acodec", "pcm_s16le", "-ar", "44100", "-ac", "2", "-y"].map(String::from),
    );
    args.push(arg(output));
    args
}

/// `spleeter separate` arguments. `duration` is passed as `-d` so long
/// inputs are not truncated at the tool's default limit.
pub fn separate_args(model: &str, out_dir: &Path, duration: Option<u64>, wav: &Path) -> Vec<String> {
    let mut args = vec![
        "separate".to_string(),
        "-p".to_string(),
        model.to_string(),
        "-o".to_string(),
        arg(out_dir),
    ];
    if let Some(d) = duration {
        args.push("-d".to_string());
        args.push(d.to_string());
    }
    args.push(arg(wav));
    args
}

/// Mix vocals at full level with the accompaniment at `volume`.
pub fn mix_args(vocals: &Path, accompaniment: &Path, volume: f64, output: &Path) -> Vec<String> {
    let mut args = vec![
        "-i".to_string(),
        arg(vocals),
        "-i".to_string(),
        arg(accompaniment),
        "-filter_complex".to_string(),
        format!(
            "[0:a]volume=1.0[v];[1:a]volume={}[b];[v][b]amix=inputs=2:duration=first",
            volume
        ),
    ];
    args.extend(["-acodec", "pcm_s16le", "-ar", "44100", "-ac", "2", "-y"].map(String::from));
    args.push(arg(output));
    args
}

/// Keep the video stream of `video` and take audio from `audio`.
pub fn replace_audio_args(video: &Path, audio: &Path, output: &Path) -> Vec<String> {
    let mut args = vec!["-i".to_string(), arg(video), "-i".to_string(), arg(audio)];
    args.extend(
        [
            "-map", "0:v", "-map", "1:a", "-c:v", "copy", "-c:a", "aac", "-b:a", "192k", "-y",
        ]
        .map(String::from),
    );
    args.push(arg(output));
    args
}

/// x264 transcode to fit within `spec`, keeping aspect ratio.
pub fn transcode_args(input: &Path, spec: &TranscodeSpec, preset: &str, output: &Path) -> Vec<String> {
    let mut args = vec![
        "-i".to_string(),
        arg(input),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        preset.to_string(),
        "-crf".to_string(),
        "23".to_string(),
        "-vf".to_string(),
        format!(
            "scale={}:{}:force_original_aspect_ratio=decrease",
            spec.width, spec.height
        ),
    ];
    args.extend(
        [
            "-c:a", "aac", "-b:a", "128k", "-pix_fmt", "yuv420p", "-movflags", "+faststart", "-y",
        ]
        .map(String::from),
    );
    args.push(arg(output));
    args
}

fn probe_args(path: &Path) -> Vec<String> {
    let mut args: Vec<String> = [
        "-v",
        "quiet",
        "-print_format",
        "json",
        "-show_format",
        "-show_streams",
    ]
    .map(String::from)
    .to_vec();
    args.push(arg(path));
    args
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    format: Option<ProbeFormat>,
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    /// ffprobe prints numbers in `format` as strings.
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// Raw `ffprobe` JSON for a file.
fn probe_json(path: &Path) -> MediaResult<Vec<u8>> {
    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }
    Ok(run_tool(FFPROBE, &probe_args(path), None)?.stdout)
}

fn parse_probe(json: &[u8], path: &Path) -> MediaResult<ProbeOutput> {
    serde_json::from_slice(json)
        .map_err(|e| MediaError::probe_failed(path, format!("invalid ffprobe JSON: {}", e)))
}

/// Container duration in seconds from ffprobe JSON.
pub fn parse_duration(json: &[u8], path: &Path) -> MediaResult<f64> {
    let probe = parse_probe(json, path)?;
    let raw = probe
        .format
        .and_then(|f| f.duration)
        .ok_or_else(|| MediaError::probe_failed(path, "no format.duration"))?;
    let seconds: f64 = raw
        .trim()
        .parse()
        .map_err(|_| MediaError::probe_failed(path, format!("unparseable duration '{}'", raw)))?;
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(MediaError::probe_failed(
            path,
            format!("invalid duration {}", seconds),
        ));
    }
    Ok(seconds)
}

/// Width and height of the first video stream from ffprobe JSON.
pub fn parse_resolution(json: &[u8], path: &Path) -> MediaResult<(u32, u32)> {
    let probe = parse_probe(json, path)?;
    probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .and_then(|s| Some((s.width?, s.height?)))
        .ok_or_else(|| MediaError::probe_failed(path, "no video stream with dimensions"))
}

/// Probe the resolution of a video file.
pub fn probe_resolution(path: &Path) -> MediaResult<(u32, u32)> {
    parse_resolution(&probe_json(path)?, path)
}

/// Durations from `ffprobe -show_format`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfprobeDuration;

impl DurationProvider for FfprobeDuration {
    fn duration(&self, path: &Path) -> MediaResult<f64> {
        parse_duration(&probe_json(path)?, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROBE_JSON: &str = r#"{
        "streams": [
            {"index": 0, "codec_type": "audio", "sample_rate": "44100"},
            {"index": 1, "codec_type": "video", "width": 1280, "height": 720}
        ],
        "format": {"filename": "ep1.mp4", "duration": "95.480000", "bit_rate": "1200000"}
    }"#;

    #[test]
    fn parses_duration_from_format() {
        let d = parse_duration(PROBE_JSON.as_bytes(), Path::new("ep1.mp4")).unwrap();
        assert!((d - 95.48).abs() < 1e-9);
    }

    #[test]
    fn missing_duration_is_probe_failure() {
        let err = parse_duration(br#"{"format": {}}"#, Path::new("x.mp4")).unwrap_err();
        assert!(matches!(err, MediaError::ProbeFailed { .. }));
    }

    #[test]
    fn garbage_duration_is_probe_failure() {
        let json = br#"{"format": {"duration": "N/A"}}"#;
        assert!(parse_duration(json, Path::new("x.mp4")).is_err());
    }

    #[test]
    fn parses_first_video_stream_resolution() {
        let res = parse_resolution(PROBE_JSON.as_bytes(), Path::new("ep1.mp4")).unwrap();
        assert_eq!(res, (1280, 720));
    }

    #[test]
    fn audio_only_has_no_resolution() {
        let json = br#"{"streams": [{"codec_type": "audio"}]}"#;
        assert!(parse_resolution(json, Path::new("a.m4a")).is_err());
    }

    #[test]
    fn concat_list_uses_absolute_quoted_paths() {
        let list = concat_list(&[PathBuf::from("/v/ep 1.mp4"), PathBuf::from("/v/it's.mp4")]);
        let lines: Vec<&str> = list.lines().collect();
        assert_eq!(lines[0], "file '/v/ep 1.mp4'");
        assert_eq!(lines[1], r"file '/v/it'\''s.mp4'");
    }

    #[test]
    fn concat_args_copy_streams() {
        let args = concat_args(Path::new("/m/concat_list.txt"), Path::new("/m/merged.mp4"));
        assert_eq!(
            args,
            vec![
                "-f", "concat", "-safe", "0", "-i", "/m/concat_list.txt", "-c", "copy", "-y",
                "/m/merged.mp4"
            ]
        );
    }

    #[test]
    fn separate_args_include_duration_when_known() {
        let args = separate_args("spleeter:2stems", Path::new("/t/out"), Some(96), Path::new("/t/a.wav"));
        assert_eq!(args[..3], ["separate", "-p", "spleeter:2stems"]);
        let d = args.iter().position(|a| a == "-d").unwrap();
        assert_eq!(args[d + 1], "96");
        assert_eq!(args.last().unwrap(), "/t/a.wav");

        let args = separate_args("spleeter:2stems", Path::new("/t/out"), None, Path::new("/t/a.wav"));
        assert!(!args.iter().any(|a| a == "-d"));
    }

    #[test]
    fn mix_filter_scales_accompaniment() {
        let args = mix_args(Path::new("v.wav"), Path::new("a.wav"), 0.3, Path::new("m.wav"));
        assert!(args.contains(
            &"[0:a]volume=1.0[v];[1:a]volume=0.3[b];[v][b]amix=inputs=2:duration=first".to_string()
        ));
    }

    #[test]
    fn replace_audio_maps_streams() {
        let args = replace_audio_args(Path::new("in.mp4"), Path::new("v.wav"), Path::new("out.mp4"));
        let joined = args.join(" ");
        assert!(joined.contains("-map 0:v -map 1:a -c:v copy -c:a aac -b:a 192k"));
    }

    #[test]
    fn transcode_args_scale_and_quality() {
        let spec = TranscodeSpec::new(1280, 720);
        let args = transcode_args(Path::new("in.mp4"), &spec, "medium", Path::new("out.mp4"));
        let joined = args.join(" ");
        assert!(joined.contains("-preset medium -crf 23"));
        assert!(joined.contains("scale=1280:720:force_original_aspect_ratio=decrease"));
        assert!(joined.contains("-c:a aac -b:a 128k -pix_fmt yuv420p -movflags +faststart"));
    }

    #[test]
    fn tail_keeps_last_lines() {
        assert_eq!(tail_lines("a\nb\nc\nd", 2), "c\nd");
        assert_eq!(tail_lines("a", 5), "a");
    }

    #[test]
    fn missing_binary_is_spawn_error() {
        let err = run_tool("definitely-not-a-real-tool-xyz", &[], None).unwrap_err();
        assert!(matches!(err, MediaError::Spawn { .. }));
    }
}
