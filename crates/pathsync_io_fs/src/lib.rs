//! `pathsync_io_fs` v1:
//! Incremental filtered sync engine with optional zip archival.
//!
//! Module map:
//! - `enumerate` : directory walk into file entries
//! - `filter`    : cutoff + exclusion filtering, destination projection
//! - `validate`  : path length advisories
//! - `reset`     : destructive destination reset
//! - `copy`      : bounded-pool copy execution
//! - `archive`   : folder to `.zip`
//! - `sync`      : orchestration of the above
//! - `spec`      : enums/options/records/errors
//! - `event`     : structured events and sinks
//! - `report`    : run-time report model
//! - `util`      : shared helper functions

pub mod archive;
pub mod copy;
pub mod enumerate;
pub mod event;
pub mod filter;
pub mod report;
pub mod reset;
pub mod spec;
pub mod sync;
mod util;
pub mod validate;

pub use archive::create_archive;
pub use copy::copy_all;
pub use enumerate::{N_ENUMERATE_PROGRESS_EVERY, enumerate_files};
pub use event::{EnumEventLevel, EnumSyncEvent, SinkCollect, SinkNoop, SinkSyncEvent, SinkTracing};
pub use filter::{SpecExcludePatterns, filter_entries};
pub use report::{ReportSync, ReportSyncBuilder, SpecSyncFailure};
pub use reset::reset_destination;
pub use spec::{
    ArchiveError, C_ARCHIVE_EXTENSION, C_EXCLUDE_MARKER_DEFAULT, EnumCopyFailureKind,
    EnumCopyStatus, EnumPathSide, EnumPatternMode, EnumSymlinkStrategy, EnumSyncStatus,
    N_PATH_LEN_MAX_DEFAULT, N_WORKERS_DEFAULT, SpecArchiveOptions, SpecCancelToken,
    SpecCopyFailure, SpecCopyOutcome, SpecCopyTask, SpecFileEntry, SpecPathWarning,
    SpecSyncOptions, SyncTreeError,
};
pub use sync::{ConfirmAlways, Confirmer, SpecSyncPlan, execute_plan, plan_sync, sync_filtered};
pub use validate::validate_path_lengths;
