//! Sync specification models, per-file records, and top-level error types.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use thiserror::Error;

/// Marker substring for generated metadata directories that are never synced.
pub const C_EXCLUDE_MARKER_DEFAULT: &str = "_gsdata_";
/// Path length above which a warning is emitted.
pub const N_PATH_LEN_MAX_DEFAULT: usize = 255;
/// Copy workers used when the caller does not choose.
pub const N_WORKERS_DEFAULT: usize = 4;
/// Extension applied to the archive base path.
pub const C_ARCHIVE_EXTENSION: &str = "zip";

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Symlink handling policy during enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumSymlinkStrategy {
    /// Follow the link and treat it as its target type.
    Dereference,
    /// Ignore symlink entries entirely.
    #[default]
    SkipSymlinks,
}

/// Pattern matching mode for exclusion patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumPatternMode {
    /// Shell-like wildcards matched against the full path.
    Glob,
    /// Regular expression searched anywhere in the full path.
    Regex,
    /// Plain substring of the full path.
    #[default]
    Literal,
}

/// Which side of a copy task a path belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumPathSide {
    Source,
    Destination,
}

impl EnumPathSide {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Destination => "destination",
        }
    }
}

/// Coarse classification of a failed copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumCopyFailureKind {
    /// Source vanished between enumeration and copy.
    SourceMissing,
    PermissionDenied,
    StorageFull,
    Other,
}

impl EnumCopyFailureKind {
    pub(crate) fn from_io(error: &io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::SourceMissing,
            io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            io::ErrorKind::StorageFull => Self::StorageFull,
            _ => Self::Other,
        }
    }
}

/// Terminal state of one copy task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumCopyStatus {
    /// Bytes were written to the destination.
    Copied { n_bytes: u64 },
    /// The task failed; siblings were not affected.
    Failed(SpecCopyFailure),
    /// The task was never started because the run was cancelled.
    Cancelled,
}

/// How a `sync_filtered` run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumSyncStatus {
    /// No file passed the filter; destination left untouched.
    #[default]
    NothingToDo,
    /// The destination reset was not confirmed; destination left untouched.
    Declined,
    /// Every task reached a terminal state.
    Completed,
    /// Cancellation was requested before all tasks were dispatched.
    Cancelled,
}

impl EnumSyncStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NothingToDo => "nothing-to-do",
            Self::Declined => "declined",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Options

/// Input options for `plan_sync` / `execute_plan` / `sync_filtered`.
#[derive(Debug, Clone)]
pub struct SpecSyncOptions {
    /// Paths matching any of these are never copied.
    pub patterns_exclude: Vec<String>,
    /// Interpretation of `patterns_exclude`.
    pub rule_pattern: EnumPatternMode,
    /// Symlink handling during enumeration.
    pub rule_symlink: EnumSymlinkStrategy,
    /// Copy worker count. `1` copies sequentially with per-file detail events.
    pub num_workers: usize,
    /// Maximum path length before a warning is emitted.
    pub n_path_len_max: usize,
    /// Copy permissions, timestamps and xattrs along with file bytes.
    pub if_preserve_metadata: bool,
}

impl Default for SpecSyncOptions {
    fn default() -> Self {
        Self {
            patterns_exclude: vec![C_EXCLUDE_MARKER_DEFAULT.to_string()],
            rule_pattern: EnumPatternMode::Literal,
            rule_symlink: EnumSymlinkStrategy::SkipSymlinks,
            num_workers: N_WORKERS_DEFAULT,
            n_path_len_max: N_PATH_LEN_MAX_DEFAULT,
            if_preserve_metadata: false,
        }
    }
}

/// Input options for `create_archive`.
#[derive(Debug, Clone)]
pub struct SpecArchiveOptions {
    /// Only archive files whose name contains a `.`.
    pub if_require_extension: bool,
    /// Symlink handling during enumeration.
    pub rule_symlink: EnumSymlinkStrategy,
}

impl Default for SpecArchiveOptions {
    fn default() -> Self {
        Self {
            if_require_extension: true,
            rule_symlink: EnumSymlinkStrategy::SkipSymlinks,
        }
    }
}

/// Cooperative cancellation flag shared between the caller and copy workers.
///
/// Checked before each task starts; tasks already in flight run to completion.
#[derive(Debug, Clone, Default)]
pub struct SpecCancelToken {
    flag: Arc<AtomicBool>,
}

impl SpecCancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Records

/// One regular file found during enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecFileEntry {
    /// Absolute path of the file.
    pub path_file_src: PathBuf,
    /// Modification time read when the file was visited.
    pub time_modified: SystemTime,
}

/// One file scheduled for copying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecCopyTask {
    pub path_file_src: PathBuf,
    /// Always a proper descendant of the destination root.
    pub path_file_dst: PathBuf,
}

/// Failure detail for one copy task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecCopyFailure {
    pub kind: EnumCopyFailureKind,
    /// User-facing error text.
    pub message: String,
}

impl SpecCopyFailure {
    pub(crate) fn from_io(error: &io::Error) -> Self {
        Self {
            kind: EnumCopyFailureKind::from_io(error),
            message: error.to_string(),
        }
    }
}

/// Result of one copy attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecCopyOutcome {
    pub task: SpecCopyTask,
    pub status: EnumCopyStatus,
}

impl SpecCopyOutcome {
    pub fn is_copied(&self) -> bool {
        matches!(self.status, EnumCopyStatus::Copied { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, EnumCopyStatus::Failed(_))
    }
}

/// Advisory for a path longer than the configured limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecPathWarning {
    pub path: PathBuf,
    pub side: EnumPathSide,
    pub n_chars: usize,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// "Top-level call failed" errors for the sync pipeline.
#[derive(Debug, Error)]
pub enum SyncTreeError {
    /// Invalid exclusion pattern.
    #[error("{0}")]
    InvalidPattern(String),
    /// Source path is not a directory.
    #[error("Source is not a directory: {}", .0.display())]
    SourceNotDirectory(PathBuf),
    /// Source and destination overlap (`src` contains `dst` or vice versa).
    #[error(
        "Source and destination directories overlap: {} <-> {}",
        path_dir_src.display(),
        path_dir_dst.display()
    )]
    SourceDestinationOverlap {
        path_dir_src: PathBuf,
        path_dir_dst: PathBuf,
    },
    /// Destination root is a symbolic link.
    #[error("Destination root path must not be a symbolic link: {}", .0.display())]
    DestinationIsSymlink(PathBuf),
    /// Destination root exists but is not a directory.
    #[error("Destination exists and is not a directory: {}", .0.display())]
    DestinationNotDirectory(PathBuf),
    /// Deleting or recreating the destination root failed.
    #[error("Failed to reset destination {}: {error}", path.display())]
    DestinationResetFailed {
        path: PathBuf,
        #[source]
        error: io::Error,
    },
    /// A file path is not located under the declared root.
    #[error("Path {} is not under root {}", path.display(), root.display())]
    PathOutsideRoot { path: PathBuf, root: PathBuf },
    /// Reading the root directory itself failed.
    #[error("Failed to read {}: {error}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        error: io::Error,
    },
}

/// Errors produced by `create_archive`.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Folder to archive is not a directory.
    #[error("Source is not a directory: {}", .0.display())]
    SourceNotDirectory(PathBuf),
    /// Nothing matched; no archive was written.
    #[error("No files found to archive in: {}", .0.display())]
    NoFilesFound(PathBuf),
    /// Enumerating the folder failed.
    #[error(transparent)]
    Enumerate(#[from] SyncTreeError),
    #[error("Archive io failure at {}: {error}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        error: io::Error,
    },
    #[error("Archive write failure at {}: {error}", path.display())]
    Zip {
        path: PathBuf,
        #[source]
        error: zip::result::ZipError,
    },
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
