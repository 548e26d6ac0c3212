// src/mirror/report.rs
// =============================================================================
// Summary of a finished mirror run.
//
// The report is informational only: a run that hit failures still counts as
// completed. It can be printed as a table or serialized to JSON.
// =============================================================================

use serde::Serialize;
use std::path::PathBuf;

use super::error::{FailureKind, MirrorError};

// One URL that could not be mirrored
#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub url: String,
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MirrorReport {
    pub base_url: String,
    pub output_dir: PathBuf,
    /// Directory listings fetched and expanded
    pub directories_crawled: usize,
    pub files_downloaded: usize,
    /// Files whose destination already existed
    pub files_skipped: usize,
    pub bytes_downloaded: u64,
    /// Links dropped by the scope pipeline
    pub links_discarded: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<Failure>,
}

impl MirrorReport {
    pub fn new(base_url: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        MirrorReport {
            base_url: base_url.into(),
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }

    pub fn record_failure(&mut self, url: &str, error: &MirrorError) {
        self.failures.push(Failure {
            url: url.to_string(),
            kind: error.kind(),
            message: error.to_string(),
        });
    }

    /// True when every URL reached was mirrored or skipped
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
