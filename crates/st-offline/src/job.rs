//! Render jobs and progress reporting.

use serde::{Deserialize, Serialize};
use st_core::StemSet;

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Routing,
    Mixing,
    Normalizing,
    Downmixing,
    Encoding,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Routing => "routing",
            Self::Mixing => "mixing",
            Self::Normalizing => "normalizing",
            Self::Downmixing => "downmixing",
            Self::Encoding => "encoding",
        }
    }
}

/// One track queued for rendering
#[derive(Debug, Clone)]
pub struct UpmixJob {
    pub id: String,
    pub stems: StemSet,
}

impl UpmixJob {
    pub fn new(id: impl Into<String>, stems: StemSet) -> Self {
        Self {
            id: id.into(),
            stems,
        }
    }
}

/// Emitted on entry to each stage of a job
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub job_id: String,
    pub stage: Stage,
}
