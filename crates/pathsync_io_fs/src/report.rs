//! Sync report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;

use crate::spec::{EnumCopyStatus, EnumSyncStatus, SpecCopyFailure, SpecCopyOutcome, SpecPathWarning};

/// One failed copy with the source it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSyncFailure {
    pub path: std::path::PathBuf,
    pub failure: SpecCopyFailure,
}

/// Aggregate counters and diagnostics for one sync run.
#[derive(Debug, Default, Clone)]
pub struct ReportSync {
    pub status: EnumSyncStatus,
    /// Regular files found under the source root.
    pub cnt_discovered: u64,
    /// Files that passed the cutoff and exclusion filters.
    pub cnt_filtered: u64,
    pub cnt_copied: u64,
    pub cnt_failed: u64,
    /// Tasks never started because the run was cancelled.
    pub cnt_cancelled: u64,
    pub bytes_copied: u64,
    /// Over-long path advisories.
    pub warnings: Vec<SpecPathWarning>,
    /// Per-file failures.
    pub failures: Vec<SpecSyncFailure>,
}

impl ReportSync {
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// `true` when the run finished and nothing failed.
    pub fn is_clean(&self) -> bool {
        self.cnt_failed == 0 && self.status != EnumSyncStatus::Cancelled
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_discovered".to_string(), self.cnt_discovered);
        dict_counts.insert("cnt_filtered".to_string(), self.cnt_filtered);
        dict_counts.insert("cnt_copied".to_string(), self.cnt_copied);
        dict_counts.insert("cnt_failed".to_string(), self.cnt_failed);
        dict_counts.insert("cnt_cancelled".to_string(), self.cnt_cancelled);
        dict_counts.insert("bytes_copied".to_string(), self.bytes_copied);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} status={} discovered={} filtered={} copied={} failed={} cancelled={} bytes={} warnings={}",
            self.status.as_str(),
            dict_counts["cnt_discovered"],
            dict_counts["cnt_filtered"],
            dict_counts["cnt_copied"],
            dict_counts["cnt_failed"],
            dict_counts["cnt_cancelled"],
            dict_counts["bytes_copied"],
            dict_counts["cnt_warnings"]
        )
    }
}

impl fmt::Display for ReportSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[SYNC]"))
    }
}

/// Mutable accumulator for sync statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportSyncBuilder {
    status: EnumSyncStatus,
    cnt_discovered: u64,
    cnt_filtered: u64,
    cnt_copied: u64,
    cnt_failed: u64,
    cnt_cancelled: u64,
    bytes_copied: u64,
    warnings: Vec<SpecPathWarning>,
    failures: Vec<SpecSyncFailure>,
}

impl ReportSyncBuilder {
    pub fn new(cnt_discovered: u64, cnt_filtered: u64) -> Self {
        Self {
            cnt_discovered,
            cnt_filtered,
            ..Self::default()
        }
    }

    pub fn set_status(&mut self, status: EnumSyncStatus) {
        self.status = status;
    }

    pub fn add_warnings(&mut self, warnings: impl IntoIterator<Item = SpecPathWarning>) {
        self.warnings.extend(warnings);
    }

    /// Fold copy outcomes into the counters.
    pub fn add_outcomes(&mut self, l_outcomes: Vec<SpecCopyOutcome>) {
        for spec_outcome in l_outcomes {
            match spec_outcome.status {
                EnumCopyStatus::Copied { n_bytes } => {
                    self.cnt_copied += 1;
                    self.bytes_copied += n_bytes;
                }
                EnumCopyStatus::Failed(failure) => {
                    self.cnt_failed += 1;
                    self.failures.push(SpecSyncFailure {
                        path: spec_outcome.task.path_file_src,
                        failure,
                    });
                }
                EnumCopyStatus::Cancelled => self.cnt_cancelled += 1,
            }
        }
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportSync {
        ReportSync {
            status: self.status,
            cnt_discovered: self.cnt_discovered,
            cnt_filtered: self.cnt_filtered,
            cnt_copied: self.cnt_copied,
            cnt_failed: self.cnt_failed,
            cnt_cancelled: self.cnt_cancelled,
            bytes_copied: self.bytes_copied,
            warnings: self.warnings,
            failures: self.failures,
        }
    }
}
