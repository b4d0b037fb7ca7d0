//! Orchestration: plan, gate, reset, copy.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::copy::copy_all;
use crate::enumerate::enumerate_files;
use crate::event::{EnumSyncEvent, SinkSyncEvent};
use crate::filter::{SpecExcludePatterns, filter_entries};
use crate::report::{ReportSync, ReportSyncBuilder};
use crate::reset::reset_destination;
use crate::spec::{
    EnumCopyStatus, EnumSyncStatus, SpecCancelToken, SpecCopyTask, SpecPathWarning,
    SpecSyncOptions, SyncTreeError,
};
use crate::util::{absolutize_path, is_overlap};
use crate::validate::validate_path_lengths;

/// Yes/no gate in front of the destructive destination reset.
pub trait Confirmer {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Approves every prompt (non-interactive runs).
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfirmAlways;

impl Confirmer for ConfirmAlways {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

impl<F> Confirmer for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Everything decided before the destination is touched.
#[derive(Debug, Clone)]
pub struct SpecSyncPlan {
    pub path_dir_src: PathBuf,
    pub path_dir_dst: PathBuf,
    pub time_cutoff: SystemTime,
    pub cnt_discovered: u64,
    pub l_tasks: Vec<SpecCopyTask>,
    pub l_warnings: Vec<SpecPathWarning>,
}

impl SpecSyncPlan {
    pub fn is_empty(&self) -> bool {
        self.l_tasks.is_empty()
    }
}

/// Enumerate, filter and validate without mutating anything.
///
/// Fails on a missing source, overlapping roots or invalid exclusion
/// patterns; per-file problems only surface as events.
pub fn plan_sync<P, Q>(
    dir_source: P,
    dir_destination: Q,
    time_cutoff: SystemTime,
    spec_sync_options: &SpecSyncOptions,
    sink: &dyn SinkSyncEvent,
) -> Result<SpecSyncPlan, SyncTreeError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_dir_src = absolutize_path(dir_source.as_ref());
    let path_dir_dst = absolutize_path(dir_destination.as_ref());

    if !path_dir_src.is_dir() {
        return Err(SyncTreeError::SourceNotDirectory(path_dir_src));
    }
    if is_overlap(&path_dir_src, &path_dir_dst) {
        return Err(SyncTreeError::SourceDestinationOverlap {
            path_dir_src,
            path_dir_dst,
        });
    }
    let spec_exclude = SpecExcludePatterns::compile(
        &spec_sync_options.patterns_exclude,
        spec_sync_options.rule_pattern,
    )?;

    let l_entries = enumerate_files(&path_dir_src, spec_sync_options.rule_symlink, sink)?;
    let l_tasks = filter_entries(
        &l_entries,
        &path_dir_src,
        &path_dir_dst,
        time_cutoff,
        &spec_exclude,
        sink,
    )?;
    let l_warnings = validate_path_lengths(&l_tasks, spec_sync_options.n_path_len_max, sink);

    Ok(SpecSyncPlan {
        path_dir_src,
        path_dir_dst,
        time_cutoff,
        cnt_discovered: l_entries.len() as u64,
        l_tasks,
        l_warnings,
    })
}

/// Reset the destination and copy every planned task.
///
/// An empty plan is a no-op: the destination is neither deleted nor
/// recreated and the report says [`EnumSyncStatus::NothingToDo`].
pub fn execute_plan(
    spec_plan: SpecSyncPlan,
    spec_sync_options: &SpecSyncOptions,
    cancel: &SpecCancelToken,
    sink: &dyn SinkSyncEvent,
) -> Result<ReportSync, SyncTreeError> {
    let mut builder_sync_report =
        ReportSyncBuilder::new(spec_plan.cnt_discovered, spec_plan.l_tasks.len() as u64);
    builder_sync_report.add_warnings(spec_plan.l_warnings);

    if spec_plan.l_tasks.is_empty() {
        sink.emit(&EnumSyncEvent::NothingToCopy {
            time_cutoff: spec_plan.time_cutoff,
        });
        builder_sync_report.set_status(EnumSyncStatus::NothingToDo);
        return Ok(builder_sync_report.build());
    }

    reset_destination(&spec_plan.path_dir_dst, sink)?;
    let l_outcomes = copy_all(spec_plan.l_tasks, spec_sync_options, cancel, sink);

    let b_cancelled = l_outcomes
        .iter()
        .any(|o| o.status == EnumCopyStatus::Cancelled);
    builder_sync_report.add_outcomes(l_outcomes);
    builder_sync_report.set_status(if b_cancelled {
        EnumSyncStatus::Cancelled
    } else {
        EnumSyncStatus::Completed
    });
    Ok(builder_sync_report.build())
}

/// Incrementally copy files modified after `time_cutoff` from `dir_source`
/// into a freshly reset `dir_destination`.
///
/// `confirmer` is asked once, only when there is something to copy, before
/// the destination is deleted. A declined prompt leaves the destination
/// untouched and yields [`EnumSyncStatus::Declined`].
pub fn sync_filtered<P, Q>(
    dir_source: P,
    dir_destination: Q,
    time_cutoff: SystemTime,
    spec_sync_options: &SpecSyncOptions,
    confirmer: &dyn Confirmer,
    cancel: &SpecCancelToken,
    sink: &dyn SinkSyncEvent,
) -> Result<ReportSync, SyncTreeError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let spec_plan = plan_sync(
        dir_source,
        dir_destination,
        time_cutoff,
        spec_sync_options,
        sink,
    )?;
    if spec_plan.is_empty() {
        return execute_plan(spec_plan, spec_sync_options, cancel, sink);
    }

    let c_prompt = format!(
        "Delete {} and copy {} files into it?",
        spec_plan.path_dir_dst.display(),
        spec_plan.l_tasks.len()
    );
    if !confirmer.confirm(&c_prompt) {
        sink.emit(&EnumSyncEvent::ResetDeclined {
            path_dir_dst: spec_plan.path_dir_dst.clone(),
        });
        let mut builder_sync_report =
            ReportSyncBuilder::new(spec_plan.cnt_discovered, spec_plan.l_tasks.len() as u64);
        builder_sync_report.add_warnings(spec_plan.l_warnings);
        builder_sync_report.set_status(EnumSyncStatus::Declined);
        return Ok(builder_sync_report.build());
    }

    execute_plan(spec_plan, spec_sync_options, cancel, sink)
}
