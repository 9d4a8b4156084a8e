//! Work units: one episode bundle directory each.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::enums::OperationKind;

/// Which input subdirectories a unit has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    /// `video/` segments exist.
    pub has_video: bool,
    /// `srt/` subtitle segments exist.
    pub has_srt: bool,
    /// `merged/` output of the merge stage exists.
    pub has_merged: bool,
    /// `cleared/` output of the separate stage exists.
    pub has_cleared: bool,
}

impl Capabilities {
    /// Whether the inputs needed by `op` are present.
    pub fn supports(&self, op: OperationKind) -> bool {
        match op {
            OperationKind::Merge => self.has_video,
            OperationKind::Separate => self.has_merged,
            OperationKind::Transcode => self.has_cleared,
        }
    }
}

/// One processing target. Immutable once discovered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkUnit {
    id: String,
    path: PathBuf,
    capabilities: Capabilities,
}

impl WorkUnit {
    pub fn new(id: impl Into<String>, path: impl Into<PathBuf>, capabilities: Capabilities) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            capabilities,
        }
    }

    /// Stable identifier (the directory name).
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supports_follows_stage_inputs() {
        let caps = Capabilities {
            has_video: true,
            has_merged: true,
            ..Default::default()
        };
        assert!(caps.supports(OperationKind::Merge));
        assert!(caps.supports(OperationKind::Separate));
        assert!(!caps.supports(OperationKind::Transcode));
    }
}
