//! Bounded-pool copy execution with per-task failure isolation.

use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

use crate::event::{EnumSyncEvent, SinkSyncEvent};
use crate::spec::{
    EnumCopyStatus, SpecCancelToken, SpecCopyFailure, SpecCopyOutcome, SpecCopyTask,
    SpecSyncOptions,
};
use crate::util::{calculate_worker_limit, copy_file_with_metadata};

struct SpecCopyContext<'a> {
    n_total: usize,
    if_preserve_metadata: bool,
    if_detail_events: bool,
    n_done: AtomicUsize,
    cancel: &'a SpecCancelToken,
    sink: &'a dyn SinkSyncEvent,
}

/// Copy every task and return one outcome per task.
///
/// Runs on a pool of `spec_sync_options.num_workers` threads, or
/// sequentially with per-file start events when that is `1`. Parent
/// directories are created on demand; concurrent creation of a shared
/// parent is not an error. A failing task is recorded and never stops its
/// siblings. Returns only after every task reached a terminal state.
///
/// `cancel` is checked before each task starts; tasks not yet started when
/// it fires end as [`EnumCopyStatus::Cancelled`].
pub fn copy_all(
    l_tasks: Vec<SpecCopyTask>,
    spec_sync_options: &SpecSyncOptions,
    cancel: &SpecCancelToken,
    sink: &dyn SinkSyncEvent,
) -> Vec<SpecCopyOutcome> {
    let n_workers = calculate_worker_limit(spec_sync_options.num_workers);
    let spec_cp_ctx = SpecCopyContext {
        n_total: l_tasks.len(),
        if_preserve_metadata: spec_sync_options.if_preserve_metadata,
        if_detail_events: n_workers <= 1,
        n_done: AtomicUsize::new(0),
        cancel,
        sink,
    };
    sink.emit(&EnumSyncEvent::CopyBatchStarted {
        n_total: spec_cp_ctx.n_total,
        n_workers,
    });

    let l_outcomes = if n_workers <= 1 {
        copy_serial(l_tasks, &spec_cp_ctx)
    } else {
        match ThreadPoolBuilder::new().num_threads(n_workers).build() {
            Ok(thread_pool) => thread_pool.install(|| {
                l_tasks
                    .into_par_iter()
                    .map(|spec_task| copy_task(spec_task, &spec_cp_ctx))
                    .collect::<Vec<_>>()
            }),
            Err(e) => {
                sink.emit(&EnumSyncEvent::WorkerPoolFallback {
                    n_workers,
                    message: e.to_string(),
                });
                copy_serial(l_tasks, &spec_cp_ctx)
            }
        }
    };

    let (mut n_copied, mut n_failed, mut n_cancelled) = (0, 0, 0);
    for spec_outcome in &l_outcomes {
        match spec_outcome.status {
            EnumCopyStatus::Copied { .. } => n_copied += 1,
            EnumCopyStatus::Failed(_) => n_failed += 1,
            EnumCopyStatus::Cancelled => n_cancelled += 1,
        }
    }
    sink.emit(&EnumSyncEvent::CopyBatchFinished {
        n_copied,
        n_failed,
        n_cancelled,
    });
    l_outcomes
}

fn copy_serial(l_tasks: Vec<SpecCopyTask>, spec_cp_ctx: &SpecCopyContext<'_>) -> Vec<SpecCopyOutcome> {
    l_tasks
        .into_iter()
        .map(|spec_task| copy_task(spec_task, spec_cp_ctx))
        .collect()
}

fn copy_task(spec_task: SpecCopyTask, spec_cp_ctx: &SpecCopyContext<'_>) -> SpecCopyOutcome {
    if spec_cp_ctx.cancel.is_cancelled() {
        return SpecCopyOutcome {
            task: spec_task,
            status: EnumCopyStatus::Cancelled,
        };
    }

    if spec_cp_ctx.if_detail_events {
        spec_cp_ctx.sink.emit(&EnumSyncEvent::CopyStarted {
            index: spec_cp_ctx.n_done.load(Ordering::SeqCst) + 1,
            total: spec_cp_ctx.n_total,
            path_file_src: spec_task.path_file_src.clone(),
        });
    }

    let res_copy = copy_one(&spec_task, spec_cp_ctx.if_preserve_metadata);
    let index = spec_cp_ctx.n_done.fetch_add(1, Ordering::SeqCst) + 1;
    let status = match res_copy {
        Ok(n_bytes) => {
            spec_cp_ctx.sink.emit(&EnumSyncEvent::CopyFinished {
                index,
                total: spec_cp_ctx.n_total,
                path_file_dst: spec_task.path_file_dst.clone(),
                n_bytes,
            });
            EnumCopyStatus::Copied { n_bytes }
        }
        Err(failure) => {
            spec_cp_ctx.sink.emit(&EnumSyncEvent::CopyFailed {
                index,
                total: spec_cp_ctx.n_total,
                path_file_src: spec_task.path_file_src.clone(),
                failure: failure.clone(),
            });
            EnumCopyStatus::Failed(failure)
        }
    };
    SpecCopyOutcome {
        task: spec_task,
        status,
    }
}

fn copy_one(spec_task: &SpecCopyTask, if_preserve_metadata: bool) -> Result<u64, SpecCopyFailure> {
    if let Some(path_parent_dst) = spec_task.path_file_dst.parent() {
        // `create_dir_all` treats a directory created concurrently as success.
        fs::create_dir_all(path_parent_dst).map_err(|e| SpecCopyFailure::from_io(&e))?;
    }
    copy_file_with_metadata(
        &spec_task.path_file_src,
        &spec_task.path_file_dst,
        if_preserve_metadata,
    )
    .map_err(|e| SpecCopyFailure::from_io(&e))
}
