//! Transcode: render the cleared episode at each configured resolution.

use serde::{Deserialize, Serialize};

use super::ffmpeg::{self, FFMPEG};
use super::files;
use super::{with_unit_log, LogTarget, MediaError};
use crate::logging::UnitLogger;
use crate::models::{OperationKind, WorkUnit};
use crate::orchestrator::{ExecResult, MediaOperation, OperationOutput, TaskError};
use crate::scanner::{resolve_subdir, CLEARED_DIR, ENCODED_DIR};

pub const DEFAULT_PRESET: &str = "medium";

/// Target bounding box for one output rendition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscodeSpec {
    pub width: u32,
    pub height: u32,
}

impl TranscodeSpec {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `"720p"` style name used in output file names.
    pub fn resolution_name(&self) -> String {
        format!("{}p", self.height)
    }

    /// 1080p, 720p and 480p.
    pub fn defaults() -> Vec<Self> {
        vec![Self::new(1920, 1080), Self::new(1280, 720), Self::new(854, 480)]
    }
}

pub struct TranscodeOperation {
    specs: Vec<TranscodeSpec>,
    preset: String,
    log_target: Option<LogTarget>,
}

impl TranscodeOperation {
    pub fn new(specs: Vec<TranscodeSpec>) -> Self {
        Self {
            specs,
            preset: DEFAULT_PRESET.to_string(),
            log_target: None,
        }
    }

    pub fn with_preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = preset.into();
        self
    }

    pub fn with_log_target(mut self, target: LogTarget) -> Self {
        self.log_target = Some(target);
        self
    }

    /// Specs that do not upscale an input of `input_height` lines.
    pub fn applicable_specs(&self, input_height: u32) -> Vec<TranscodeSpec> {
        self.specs
            .iter()
            .copied()
            .filter(|spec| spec.height <= input_height)
            .collect()
    }

    fn transcode_unit(
        &self,
        unit: &WorkUnit,
        logger: Option<&UnitLogger>,
    ) -> ExecResult<OperationOutput> {
        let cleared_dir = resolve_subdir(unit.path(), CLEARED_DIR).ok_or_else(|| {
            TaskError::invalid_input(format!("no {}/ directory in {}", CLEARED_DIR, unit.path().display()))
        })?;
        let input = files::first_with_extension(&cleared_dir, "mp4")?.ok_or_else(|| {
            TaskError::invalid_input(format!("no .mp4 file in {}", cleared_dir.display()))
        })?;

        let (width, height) = ffmpeg::probe_resolution(&input)?;
        tracing::info!("[{}] Input resolution {}x{}", unit.id(), width, height);

        let encoded_dir = unit.path().join(ENCODED_DIR);
        files::ensure_dir(&encoded_dir)?;
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let targets = self.applicable_specs(height);
        for spec in self.specs.iter().filter(|s| !targets.contains(s)) {
            tracing::warn!(
                "[{}] Skipping {}: input is only {}p",
                unit.id(),
                spec.resolution_name(),
                height
            );
        }

        let mut outputs = Vec::new();
        for spec in &targets {
            let output = files::unique_path(
                &encoded_dir.join(format!("{}_{}.mp4", stem, spec.resolution_name())),
            );
            if let Some(logger) = logger {
                logger.phase(&format!("Transcode {}", spec.resolution_name()));
            }
            ffmpeg::run_tool(
                FFMPEG,
                &ffmpeg::transcode_args(&input, spec, &self.preset, &output),
                logger,
            )?;
            if !output.exists() {
                return Err(MediaError::OutputMissing(output).into());
            }
            outputs.push(output);
        }

        for ext in ["srt", "ass"] {
            for subtitle in files::files_with_extension(&cleared_dir, ext)? {
                outputs.push(files::copy_to_unique(&subtitle, &encoded_dir)?);
            }
        }

        Ok(OperationOutput::new(outputs))
    }
}

impl MediaOperation for TranscodeOperation {
    fn execute(&self, unit: &WorkUnit, _op: OperationKind) -> ExecResult<OperationOutput> {
        with_unit_log(
            self.log_target.as_ref(),
            unit,
            OperationKind::Transcode,
            |logger| self.transcode_unit(unit, logger),
        )
    }
}
