//! Separate: strip background music from the merged episode.
//!
//! Audio is extracted, split into vocals and accompaniment by the external
//! separator, optionally re-mixed with a little accompaniment, and muxed
//! back over the untouched video stream.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::ffmpeg::{self, FFMPEG, SPLEETER};
use super::files;
use super::{with_unit_log, LogTarget, MediaError};
use crate::logging::UnitLogger;
use crate::models::{OperationKind, WorkUnit};
use crate::orchestrator::{
    DurationProvider, ExecResult, MediaOperation, OperationOutput, TaskError,
};
use crate::scanner::{resolve_subdir, CLEARED_DIR, MERGED_DIR};

pub const DEFAULT_SEPARATOR_MODEL: &str = "spleeter:2stems";

const WORK_DIR: &str = ".separate_work";
const SUBTITLE_EXTENSIONS: [&str; 2] = ["srt", "ass"];

pub struct SeparateOperation {
    model: String,
    /// Accompaniment level mixed back under the vocals, in `[0, 1]`.
    accompaniment_volume: f64,
    durations: Arc<dyn DurationProvider>,
    log_target: Option<LogTarget>,
}

impl SeparateOperation {
    pub fn new(durations: Arc<dyn DurationProvider>) -> Self {
        Self {
            model: DEFAULT_SEPARATOR_MODEL.to_string(),
            accompaniment_volume: 0.0,
            durations,
            log_target: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Values outside `[0, 1]` are clamped.
    pub fn with_accompaniment_volume(mut self, volume: f64) -> Self {
        self.accompaniment_volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self
    }

    pub fn with_log_target(mut self, target: LogTarget) -> Self {
        self.log_target = Some(target);
        self
    }

    pub fn accompaniment_volume(&self) -> f64 {
        self.accompaniment_volume
    }

    fn separate_unit(
        &self,
        unit: &WorkUnit,
        logger: Option<&UnitLogger>,
    ) -> ExecResult<OperationOutput> {
        let merged_dir = resolve_subdir(unit.path(), MERGED_DIR).ok_or_else(|| {
            TaskError::invalid_input(format!("no {}/ directory in {}", MERGED_DIR, unit.path().display()))
        })?;
        let input = files::first_with_extension(&merged_dir, "mp4")?.ok_or_else(|| {
            TaskError::invalid_input(format!("no .mp4 file in {}", merged_dir.display()))
        })?;

        let cleared_dir = unit.path().join(CLEARED_DIR);
        files::ensure_dir(&cleared_dir)?;
        let file_name = input
            .file_name()
            .ok_or_else(|| TaskError::invalid_input(format!("bad input path {}", input.display())))?;
        let output = files::unique_path(&cleared_dir.join(file_name));

        let work = WorkDir::create(unit.path().join(WORK_DIR))?;
        let audio = self.isolate_vocals(unit, &input, work.path(), logger)?;
        ffmpeg::run_tool(
            FFMPEG,
            &ffmpeg::replace_audio_args(&input, &audio, &output),
            logger,
        )?;
        if !output.exists() {
            return Err(MediaError::OutputMissing(output).into());
        }

        let mut outputs = vec![output];
        let stem = input.file_stem().map(|s| s.to_os_string()).unwrap_or_default();
        for ext in SUBTITLE_EXTENSIONS {
            let mut name = stem.clone();
            name.push(".");
            name.push(ext);
            let subtitle = merged_dir.join(name);
            if subtitle.is_file() {
                outputs.push(files::copy_to_unique(&subtitle, &cleared_dir)?);
            }
        }

        Ok(OperationOutput::new(outputs))
    }

    /// Produce the replacement audio track inside `work`.
    fn isolate_vocals(
        &self,
        unit: &WorkUnit,
        input: &Path,
        work: &Path,
        logger: Option<&UnitLogger>,
    ) -> ExecResult<PathBuf> {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());
        let wav = work.join(format!("{}.wav", stem));
        ffmpeg::run_tool(FFMPEG, &ffmpeg::extract_wav_args(input, &wav), logger)?;

        // Passing the length explicitly stops the separator cutting long
        // episodes at its default limit.
        let duration = match self.durations.duration(&wav) {
            Ok(seconds) => Some(seconds as u64 + 1),
            Err(e) => {
                tracing::warn!("[{}] Could not measure extracted audio: {}", unit.id(), e);
                None
            }
        };

        let separated = work.join("separated");
        ffmpeg::run_tool(
            SPLEETER,
            &ffmpeg::separate_args(&self.model, &separated, duration, &wav),
            logger,
        )?;
        let (vocals, accompaniment) = stem_outputs(&separated, &wav);
        for path in [&vocals, &accompaniment] {
            if !path.exists() {
                return Err(MediaError::OutputMissing(path.clone()).into());
            }
        }

        if self.accompaniment_volume <= 0.0 {
            return Ok(vocals);
        }

        tracing::debug!(
            "[{}] Mixing accompaniment back at {:.0}%",
            unit.id(),
            self.accompaniment_volume * 100.0
        );
        let mixed = work.join("mixed.wav");
        ffmpeg::run_tool(
            FFMPEG,
            &ffmpeg::mix_args(&vocals, &accompaniment, self.accompaniment_volume, &mixed),
            logger,
        )?;
        Ok(mixed)
    }
}

impl MediaOperation for SeparateOperation {
    fn execute(&self, unit: &WorkUnit, _op: OperationKind) -> ExecResult<OperationOutput> {
        with_unit_log(
            self.log_target.as_ref(),
            unit,
            OperationKind::Separate,
            |logger| self.separate_unit(unit, logger),
        )
    }
}

/// Where the separator writes its stems: `<out>/<wav stem>/{vocals,accompaniment}.wav`.
fn stem_outputs(out_dir: &Path, wav: &Path) -> (PathBuf, PathBuf) {
    let dir = out_dir.join(wav.file_stem().unwrap_or_default());
    (dir.join("vocals.wav"), dir.join("accompaniment.wav"))
}

/// Scratch directory removed on drop.
struct WorkDir(PathBuf);

impl WorkDir {
    fn create(path: PathBuf) -> ExecResult<Self> {
        if path.exists() {
            fs::remove_dir_all(&path)
                .map_err(|e| TaskError::io(format!("clearing {}", path.display()), e))?;
        }
        fs::create_dir_all(&path)
            .map_err(|e| TaskError::io(format!("creating {}", path.display()), e))?;
        Ok(Self(path))
    }

    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.0) {
            tracing::debug!("Could not remove {}: {}", self.0.display(), e);
        }
    }
}
