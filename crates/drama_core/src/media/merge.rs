//! Merge: concatenate video segments and their subtitles into one episode.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::ffmpeg::{self, FFMPEG};
use super::files;
use super::{with_unit_log, LogTarget, MediaError, MediaResult};
use crate::logging::UnitLogger;
use crate::models::{OperationKind, WorkUnit};
use crate::orchestrator::{
    DurationProvider, ExecResult, MediaOperation, OperationOutput, TaskError,
};
use crate::scanner::{resolve_subdir, MERGED_DIR, SRT_DIR, VIDEO_DIR};
use crate::sequencer::{self, SequenceError, SequencedFile};
use crate::timeline::{self, TimelineError, TimelineFormat, TimelineResult};

const MERGED_STEM: &str = "merged";
const CONCAT_LIST: &str = "concat_list.txt";

/// Joins `video/*.mp4` into `merged/merged.mp4` and, when present,
/// `srt/*.{srt,ass}` into `merged/merged.<ext>` with shifted timings.
///
/// Segment order gaps and duplicates are logged and tolerated. A subtitle
/// problem never fails the unit once the video is merged.
pub struct MergeOperation {
    durations: Arc<dyn DurationProvider>,
    log_target: Option<LogTarget>,
}

impl MergeOperation {
    pub fn new(durations: Arc<dyn DurationProvider>) -> Self {
        Self {
            durations,
            log_target: None,
        }
    }

    pub fn with_log_target(mut self, target: LogTarget) -> Self {
        self.log_target = Some(target);
        self
    }

    fn merge_unit(
        &self,
        unit: &WorkUnit,
        logger: Option<&UnitLogger>,
    ) -> ExecResult<OperationOutput> {
        let video_dir = resolve_subdir(unit.path(), VIDEO_DIR).ok_or_else(|| {
            TaskError::invalid_input(format!(
                "no {}/ directory in {}",
                VIDEO_DIR,
                unit.path().display()
            ))
        })?;

        let segments = sequenced(unit, &video_dir, &["mp4"], logger)?;
        if segments.is_empty() {
            return Err(SequenceError::EmptySequence.into());
        }

        let durations = segments
            .iter()
            .map(|p| self.durations.duration(p))
            .collect::<MediaResult<Vec<f64>>>()?;
        let total: f64 = durations.iter().sum();
        tracing::debug!(
            "[{}] {} segments, {:.2}s total",
            unit.id(),
            segments.len(),
            total
        );

        let merged_dir = unit.path().join(MERGED_DIR);
        files::ensure_dir(&merged_dir)?;

        let video_out = files::unique_path(&merged_dir.join(format!("{}.mp4", MERGED_STEM)));
        concat_videos(&segments, &video_out, logger)?;
        let mut outputs = vec![video_out];

        match resolve_subdir(unit.path(), SRT_DIR) {
            Some(srt_dir) => {
                match merge_subtitles(unit, &srt_dir, &durations, &merged_dir, logger) {
                    Ok(Some(path)) => outputs.push(path),
                    Ok(None) => tracing::info!("[{}] No subtitle files, video only", unit.id()),
                    Err(e) => {
                        tracing::warn!(
                            "[{}] Subtitle merge failed (video was merged): {}",
                            unit.id(),
                            e
                        );
                        if let Some(logger) = logger {
                            logger.warn(&format!("Subtitle merge failed: {}", e));
                        }
                    }
                }
            }
            None => tracing::info!("[{}] No {}/ directory, video only", unit.id(), SRT_DIR),
        }

        Ok(OperationOutput::new(outputs).with_duration(total))
    }
}

impl MediaOperation for MergeOperation {
    fn execute(&self, unit: &WorkUnit, _op: OperationKind) -> ExecResult<OperationOutput> {
        with_unit_log(
            self.log_target.as_ref(),
            unit,
            OperationKind::Merge,
            |logger| self.merge_unit(unit, logger),
        )
    }
}

/// Files in `dir` in natural order. An imperfect sequence is only a warning.
fn sequenced(
    unit: &WorkUnit,
    dir: &Path,
    extensions: &[&str],
    logger: Option<&UnitLogger>,
) -> ExecResult<Vec<PathBuf>> {
    let files = sequencer::list_sorted(dir, extensions)
        .map_err(|e| TaskError::io(format!("listing {}", dir.display()), e))?;
    if !files.is_empty() {
        if let Err(e) = sequencer::validate(&files) {
            tracing::warn!("[{}] {} in {}", unit.id(), e, dir.display());
            if let Some(logger) = logger {
                logger.warn(&format!("{} in {}", e, dir.display()));
            }
        }
    }
    Ok(files.into_iter().map(SequencedFile::into_path).collect())
}

fn concat_videos(
    segments: &[PathBuf],
    output: &Path,
    logger: Option<&UnitLogger>,
) -> MediaResult<()> {
    if let [single] = segments {
        fs::copy(single, output).map_err(|e| MediaError::io(output, e))?;
        return Ok(());
    }

    let dir = output.parent().unwrap_or_else(|| Path::new("."));
    let list = dir.join(CONCAT_LIST);
    fs::write(&list, ffmpeg::concat_list(segments)).map_err(|e| MediaError::io(&list, e))?;

    let result = ffmpeg::run_tool(FFMPEG, &ffmpeg::concat_args(&list, output), logger);
    let _ = fs::remove_file(&list);
    result?;

    if !output.exists() {
        return Err(MediaError::OutputMissing(output.to_path_buf()));
    }
    Ok(())
}

/// Merge subtitle segments with offsets from the video `durations`.
///
/// Returns `None` when there are no subtitle files. A single file is
/// copied verbatim.
fn merge_subtitles(
    unit: &WorkUnit,
    srt_dir: &Path,
    durations: &[f64],
    merged_dir: &Path,
    logger: Option<&UnitLogger>,
) -> ExecResult<Option<PathBuf>> {
    let files = sequenced(unit, srt_dir, &["srt", "ass"], logger)?;
    let Some(first) = files.first() else {
        return Ok(None);
    };
    let format = TimelineFormat::from_extension(first)
        .ok_or_else(|| TimelineError::UnknownFormat(first.clone()))?;
    let output = files::unique_path(
        &merged_dir.join(format!("{}.{}", MERGED_STEM, format.extension())),
    );

    if files.len() == 1 {
        fs::copy(first, &output).map_err(|e| MediaError::io(&output, e))?;
        return Ok(Some(output));
    }

    let documents = files
        .iter()
        .map(timeline::parse_file)
        .collect::<TimelineResult<Vec<_>>>()?;
    let merged = timeline::merge_documents(documents, durations)?;
    timeline::write_file(&merged, &output)?;
    tracing::info!(
        "[{}] Merged {} subtitle files ({} entries) into {}",
        unit.id(),
        files.len(),
        merged.len(),
        output.display()
    );
    Ok(Some(output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Capabilities;
    use std::collections::HashMap;
    use tempfile::tempdir;

    struct FixedDurations(HashMap<String, f64>);

    impl DurationProvider for FixedDurations {
        fn duration(&self, path: &Path) -> MediaResult<f64> {
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            self.0
                .get(&name)
                .copied()
                .ok_or_else(|| MediaError::probe_failed(path, "unknown"))
        }
    }

    fn srt(start: &str, end: &str, text: &str) -> String {
        format!("1\n{} --> {}\n{}\n", start, end, text)
    }

    fn unit_at(path: &Path) -> WorkUnit {
        WorkUnit::new("drama-0001", path, Capabilities::default())
    }

    #[test]
    fn subtitles_are_offset_by_video_durations() {
        let dir = tempdir().unwrap();
        let srt_dir = dir.path().join("srt");
        let merged_dir = dir.path().join("merged");
        fs::create_dir_all(&srt_dir).unwrap();
        fs::create_dir_all(&merged_dir).unwrap();
        for (i, text) in ["one", "two", "three"].iter().enumerate() {
            fs::write(
                srt_dir.join(format!("{}.srt", i + 1)),
                srt("00:00:00,000", "00:00:02,000", text),
            )
            .unwrap();
        }

        let out = merge_subtitles(
            &unit_at(dir.path()),
            &srt_dir,
            &[10.0, 15.5, 8.25],
            &merged_dir,
            None,
        )
        .unwrap()
        .unwrap();

        assert_eq!(out, merged_dir.join("merged.srt"));
        let doc = timeline::parse_file(&out).unwrap();
        let starts: Vec<u64> = doc.entries.iter().map(|e| e.start_ms).collect();
        assert_eq!(starts, vec![0, 10_000, 25_500]);
        let indices: Vec<usize> = doc.entries.iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }

    #[test]
    fn single_subtitle_is_copied() {
        let dir = tempdir().unwrap();
        let srt_dir = dir.path().join("srt");
        fs::create_dir_all(&srt_dir).unwrap();
        let body = srt("00:00:01,000", "00:00:02,000", "only");
        fs::write(srt_dir.join("ep1.srt"), &body).unwrap();

        let out = merge_subtitles(&unit_at(dir.path()), &srt_dir, &[5.0], dir.path(), None)
            .unwrap()
            .unwrap();
        assert_eq!(fs::read_to_string(out).unwrap(), body);
    }

    #[test]
    fn no_subtitle_files_is_none() {
        let dir = tempdir().unwrap();
        let result =
            merge_subtitles(&unit_at(dir.path()), dir.path(), &[], dir.path(), None).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn subtitle_count_must_match_segments() {
        let dir = tempdir().unwrap();
        let srt_dir = dir.path().join("srt");
        fs::create_dir_all(&srt_dir).unwrap();
        for i in 1..=2 {
            fs::write(
                srt_dir.join(format!("{}.srt", i)),
                srt("00:00:00,000", "00:00:01,000", "x"),
            )
            .unwrap();
        }
        let err = merge_subtitles(&unit_at(dir.path()), &srt_dir, &[3.0], dir.path(), None)
            .unwrap_err();
        assert!(matches!(
            err,
            TaskError::Timeline(TimelineError::DurationCountMismatch { .. })
        ));
    }

    #[test]
    fn single_segment_unit_merges_without_ffmpeg() {
        let dir = tempdir().unwrap();
        let unit_dir = dir.path().join("drama-0001");
        let video = unit_dir.join("original").join("video");
        let subs = unit_dir.join("original").join("srt");
        fs::create_dir_all(&video).unwrap();
        fs::create_dir_all(&subs).unwrap();
        fs::write(video.join("1.mp4"), b"video-bytes").unwrap();
        fs::write(subs.join("1.srt"), srt("00:00:00,500", "00:00:01,000", "hi")).unwrap();

        let durations = FixedDurations(HashMap::from([("1.mp4".to_string(), 12.0)]));
        let op = MergeOperation::new(Arc::new(durations));
        let out = op.execute(&unit_at(&unit_dir), OperationKind::Merge).unwrap();

        let merged = unit_dir.join(MERGED_DIR);
        assert_eq!(
            out.output_paths,
            vec![merged.join("merged.mp4"), merged.join("merged.srt")]
        );
        assert_eq!(out.duration_seconds, Some(12.0));
        assert_eq!(fs::read(merged.join("merged.mp4")).unwrap(), b"video-bytes");
    }

    #[test]
    fn existing_outputs_are_not_overwritten() {
        let dir = tempdir().unwrap();
        let unit_dir = dir.path().join("drama-0001");
        let video = unit_dir.join("video");
        fs::create_dir_all(&video).unwrap();
        fs::create_dir_all(unit_dir.join(MERGED_DIR)).unwrap();
        fs::write(video.join("1.mp4"), b"new").unwrap();
        fs::write(unit_dir.join(MERGED_DIR).join("merged.mp4"), b"old").unwrap();

        let durations = FixedDurations(HashMap::from([("1.mp4".to_string(), 1.0)]));
        let out = MergeOperation::new(Arc::new(durations))
            .execute(&unit_at(&unit_dir), OperationKind::Merge)
            .unwrap();
        assert_eq!(
            out.output_paths,
            vec![unit_dir.join(MERGED_DIR).join("merged_1.mp4")]
        );
    }

    #[test]
    fn missing_video_dir_is_invalid_input() {
        let dir = tempdir().unwrap();
        let op = MergeOperation::new(Arc::new(FixedDurations(HashMap::new())));
        let err = op
            .execute(&unit_at(dir.path()), OperationKind::Merge)
            .unwrap_err();
        assert!(matches!(err, TaskError::InvalidInput(_)));
    }

    #[test]
    fn empty_video_dir_is_sequence_error() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(VIDEO_DIR)).unwrap();
        let op = MergeOperation::new(Arc::new(FixedDurations(HashMap::new())));
        let err = op
            .execute(&unit_at(dir.path()), OperationKind::Merge)
            .unwrap_err();
        assert!(matches!(
            err,
            TaskError::Sequence(SequenceError::EmptySequence)
        ));
    }

    #[test]
    fn probe_failure_fails_unit() {
        let dir = tempdir().unwrap();
        let video = dir.path().join(VIDEO_DIR);
        fs::create_dir_all(&video).unwrap();
        fs::write(video.join("1.mp4"), b"x").unwrap();
        let op = MergeOperation::new(Arc::new(FixedDurations(HashMap::new())));
        let err = op
            .execute(&unit_at(dir.path()), OperationKind::Merge)
            .unwrap_err();
        assert!(matches!(err, TaskError::Media(MediaError::ProbeFailed { .. })));
    }
}
