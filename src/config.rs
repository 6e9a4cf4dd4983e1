//! Process-wide pipeline configuration, passed explicitly into the
//! orchestrator at construction rather than read from ambient state.

use camino::Utf8PathBuf;

use crate::drilldown::DEFAULT_QUEUE_CAPACITY;
use crate::mpcgrid_errors::MpcGridError;

/// Default process-wide budget of drill-down file handles, split across the
/// per-dimension workers.
pub const DEFAULT_MAX_OPEN_FILES: usize = 256;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root directory every output file lands under.
    pub output_root: Utf8PathBuf,
    /// Open-handle budget shared by all drill-down workers.
    pub max_open_files: usize,
    /// Bounded depth of each drill-down worker's queue.
    pub queue_capacity: usize,
}

impl PipelineConfig {
    pub fn new(output_root: Utf8PathBuf) -> Self {
        Self {
            output_root,
            max_open_files: DEFAULT_MAX_OPEN_FILES,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    /// Checked at startup, before any record is processed.
    pub fn validate(&self) -> Result<(), MpcGridError> {
        if self.output_root.as_str().is_empty() {
            return Err(MpcGridError::InvalidConfig("output root is empty".into()));
        }
        if self.max_open_files == 0 {
            return Err(MpcGridError::InvalidConfig(
                "max_open_files must be > 0".into(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(MpcGridError::InvalidConfig(
                "queue_capacity must be > 0".into(),
            ));
        }
        Ok(())
    }
}
