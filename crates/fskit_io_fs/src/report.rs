//! Sync report model and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;

use crate::spec::EnumCopyOutcome;

/// Counters for one successful `sync_tree` run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportSync {
    /// Destination directories created by this run.
    pub cnt_dirs_created: u64,
    /// Destination directories that already existed and were reused as-is.
    pub cnt_dirs_existing: u64,
    /// Files materialized as hard links.
    pub cnt_files_linked: u64,
    /// Files materialized by streaming bytes.
    pub cnt_files_streamed: u64,
    /// Files already sharing identity with their source.
    pub cnt_files_unchanged: u64,
}

impl ReportSync {
    /// Files visited, whatever the outcome.
    pub fn file_count(&self) -> u64 {
        self.cnt_files_linked + self.cnt_files_streamed + self.cnt_files_unchanged
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_dirs_created".to_string(), self.cnt_dirs_created);
        dict_counts.insert("cnt_dirs_existing".to_string(), self.cnt_dirs_existing);
        dict_counts.insert("cnt_files_linked".to_string(), self.cnt_files_linked);
        dict_counts.insert("cnt_files_streamed".to_string(), self.cnt_files_streamed);
        dict_counts.insert("cnt_files_unchanged".to_string(), self.cnt_files_unchanged);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} dirs_created={} dirs_existing={} linked={} streamed={} unchanged={}",
            self.cnt_dirs_created,
            self.cnt_dirs_existing,
            self.cnt_files_linked,
            self.cnt_files_streamed,
            self.cnt_files_unchanged
        )
    }
}

impl fmt::Display for ReportSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[SYNC]"))
    }
}

/// Mutable accumulator threaded through the tree walk.
#[derive(Debug, Default, Clone)]
pub struct ReportSyncBuilder {
    report: ReportSync,
}

impl ReportSyncBuilder {
    pub fn add_dir_created(&mut self) {
        self.report.cnt_dirs_created += 1;
    }

    pub fn add_dir_existing(&mut self) {
        self.report.cnt_dirs_existing += 1;
    }

    /// Count one file by the way it was materialized.
    pub fn add_file_outcome(&mut self, enum_outcome: EnumCopyOutcome) {
        match enum_outcome {
            EnumCopyOutcome::Unchanged => self.report.cnt_files_unchanged += 1,
            EnumCopyOutcome::Linked => self.report.cnt_files_linked += 1,
            EnumCopyOutcome::Streamed => self.report.cnt_files_streamed += 1,
        }
    }

    pub fn build(self) -> ReportSync {
        self.report
    }
}
