//! Structured run events and the sinks that receive them.
//!
//! Components never log directly; they emit [`EnumSyncEvent`] values into a
//! [`SinkSyncEvent`] supplied by the caller. [`SinkNoop`] is the default,
//! [`SinkTracing`] forwards to the `tracing` facade and [`SinkCollect`] keeps
//! everything in memory.

use std::path::PathBuf;
use std::sync::Mutex;
use std::time::SystemTime;

use crate::spec::{EnumPathSide, SpecCopyFailure};

/// Severity attached to each event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EnumEventLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// One observable step of an enumerate / sync / archive run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumSyncEvent {
    EnumerateStarted {
        path_root: PathBuf,
    },
    EnumerateProgress {
        n_files: usize,
    },
    /// An entry could not be inspected and was left out of the walk.
    EnumerateSkipped {
        path: PathBuf,
        message: String,
    },
    EnumerateSymlinkSkipped {
        path: PathBuf,
    },
    EnumerateFinished {
        path_root: PathBuf,
        n_files: usize,
    },
    FilterFinished {
        n_total: usize,
        n_kept: usize,
    },
    PathTooLong {
        path: PathBuf,
        side: EnumPathSide,
        n_chars: usize,
        n_limit: usize,
    },
    NothingToCopy {
        time_cutoff: SystemTime,
    },
    ResetDeclined {
        path_dir_dst: PathBuf,
    },
    DestinationReset {
        path_dir_dst: PathBuf,
        if_existed: bool,
    },
    CopyBatchStarted {
        n_total: usize,
        n_workers: usize,
    },
    /// Only emitted in sequential mode.
    CopyStarted {
        index: usize,
        total: usize,
        path_file_src: PathBuf,
    },
    CopyFinished {
        index: usize,
        total: usize,
        path_file_dst: PathBuf,
        n_bytes: u64,
    },
    CopyFailed {
        index: usize,
        total: usize,
        path_file_src: PathBuf,
        failure: SpecCopyFailure,
    },
    CopyBatchFinished {
        n_copied: usize,
        n_failed: usize,
        n_cancelled: usize,
    },
    WorkerPoolFallback {
        n_workers: usize,
        message: String,
    },
    ArchiveStarted {
        path_archive: PathBuf,
    },
    ArchiveReplaced {
        path_archive: PathBuf,
    },
    ArchiveEntry {
        path_file: PathBuf,
        name_entry: String,
    },
    ArchiveFinished {
        path_archive: PathBuf,
        n_files: usize,
    },
}

impl EnumSyncEvent {
    pub fn level(&self) -> EnumEventLevel {
        match self {
            Self::EnumerateProgress { .. }
            | Self::EnumerateSymlinkSkipped { .. }
            | Self::CopyStarted { .. }
            | Self::CopyFinished { .. }
            | Self::ArchiveEntry { .. } => EnumEventLevel::Debug,
            Self::EnumerateSkipped { .. }
            | Self::PathTooLong { .. }
            | Self::WorkerPoolFallback { .. } => EnumEventLevel::Warn,
            Self::CopyFailed { .. } => EnumEventLevel::Error,
            _ => EnumEventLevel::Info,
        }
    }
}

/// Receiver of run events. Shared by copy workers, hence `Send + Sync`.
pub trait SinkSyncEvent: Send + Sync {
    fn emit(&self, event: &EnumSyncEvent);
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct SinkNoop;

impl SinkSyncEvent for SinkNoop {
    fn emit(&self, _event: &EnumSyncEvent) {}
}

/// Keeps every event in emission order.
#[derive(Debug, Default)]
pub struct SinkCollect {
    l_events: Mutex<Vec<EnumSyncEvent>>,
}

impl SinkCollect {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far.
    pub fn events(&self) -> Vec<EnumSyncEvent> {
        match self.l_events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn count_level(&self, level: EnumEventLevel) -> usize {
        self.events().iter().filter(|e| e.level() == level).count()
    }
}

impl SinkSyncEvent for SinkCollect {
    fn emit(&self, event: &EnumSyncEvent) {
        match self.l_events.lock() {
            Ok(mut guard) => guard.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}

/// Forwards events to `tracing` with structured fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct SinkTracing;

impl SinkSyncEvent for SinkTracing {
    fn emit(&self, event: &EnumSyncEvent) {
        use tracing::{debug, error, info, warn};

        match event {
            EnumSyncEvent::EnumerateStarted { path_root } => {
                info!(path = %path_root.display(), "collecting files");
            }
            EnumSyncEvent::EnumerateProgress { n_files } => {
                debug!(count = n_files, "collecting files");
            }
            EnumSyncEvent::EnumerateSkipped { path, message } => {
                warn!(path = %path.display(), error = %message, "entry skipped");
            }
            EnumSyncEvent::EnumerateSymlinkSkipped { path } => {
                debug!(path = %path.display(), "symlink skipped");
            }
            EnumSyncEvent::EnumerateFinished { path_root, n_files } => {
                info!(path = %path_root.display(), count = n_files, "collected files");
            }
            EnumSyncEvent::FilterFinished { n_total, n_kept } => {
                info!(total = n_total, kept = n_kept, "filtered files");
            }
            EnumSyncEvent::PathTooLong {
                path,
                side,
                n_chars,
                n_limit,
            } => {
                warn!(
                    path = %path.display(),
                    side = side.as_str(),
                    chars = n_chars,
                    limit = n_limit,
                    "path too long"
                );
            }
            EnumSyncEvent::NothingToCopy { time_cutoff } => {
                info!(cutoff = ?time_cutoff, "no files changed since cutoff");
            }
            EnumSyncEvent::ResetDeclined { path_dir_dst } => {
                info!(path = %path_dir_dst.display(), "destination reset declined");
            }
            EnumSyncEvent::DestinationReset {
                path_dir_dst,
                if_existed,
            } => {
                info!(
                    path = %path_dir_dst.display(),
                    existed = if_existed,
                    "destination reset"
                );
            }
            EnumSyncEvent::CopyBatchStarted { n_total, n_workers } => {
                info!(total = n_total, workers = n_workers, "copying files");
            }
            EnumSyncEvent::CopyStarted {
                index,
                total,
                path_file_src,
            } => {
                debug!(index, total, path = %path_file_src.display(), "copying");
            }
            EnumSyncEvent::CopyFinished {
                index,
                total,
                path_file_dst,
                n_bytes,
            } => {
                debug!(
                    index,
                    total,
                    bytes = n_bytes,
                    path = %path_file_dst.display(),
                    "copied"
                );
            }
            EnumSyncEvent::CopyFailed {
                index,
                total,
                path_file_src,
                failure,
            } => {
                error!(
                    index,
                    total,
                    path = %path_file_src.display(),
                    kind = ?failure.kind,
                    error = %failure.message,
                    "copy failed"
                );
            }
            EnumSyncEvent::CopyBatchFinished {
                n_copied,
                n_failed,
                n_cancelled,
            } => {
                info!(
                    copied = n_copied,
                    failed = n_failed,
                    cancelled = n_cancelled,
                    "finished copying"
                );
            }
            EnumSyncEvent::WorkerPoolFallback { n_workers, message } => {
                warn!(workers = n_workers, error = %message, "worker pool unavailable; copying serially");
            }
            EnumSyncEvent::ArchiveStarted { path_archive } => {
                info!(path = %path_archive.display(), "zipping");
            }
            EnumSyncEvent::ArchiveReplaced { path_archive } => {
                info!(path = %path_archive.display(), "deleting preexisting archive");
            }
            EnumSyncEvent::ArchiveEntry {
                path_file,
                name_entry,
            } => {
                debug!(path = %path_file.display(), entry = %name_entry, "zipping file");
            }
            EnumSyncEvent::ArchiveFinished {
                path_archive,
                n_files,
            } => {
                info!(path = %path_archive.display(), count = n_files, "zipping done");
            }
        }
    }
}
