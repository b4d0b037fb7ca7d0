//! Directory walk producing one [`SpecFileEntry`] per regular file.

use std::fs;
use std::path::{Path, PathBuf};

use crate::event::{EnumSyncEvent, SinkSyncEvent};
use crate::spec::{EnumSymlinkStrategy, SpecFileEntry, SyncTreeError};
use crate::util::absolutize_path;

/// A progress event is emitted every this many collected files.
pub const N_ENUMERATE_PROGRESS_EVERY: usize = 1000;

struct SpecWalkContext<'a> {
    rule_symlink: EnumSymlinkStrategy,
    sink: &'a dyn SinkSyncEvent,
    /// `(dev, ino)` of the directories on the current descent path.
    l_dir_stack: Vec<(u64, u64)>,
    l_entries: Vec<SpecFileEntry>,
}

/// Recursively collect every regular file below `dir_root`.
///
/// Directories, special files and entries that cannot be inspected are
/// skipped; the latter produce an [`EnumSyncEvent::EnumerateSkipped`] warning.
/// Symlinks follow `rule_symlink`: skipped entirely, or treated as their
/// target type (with loop detection on Unix).
///
/// Only a missing or non-directory root is fatal. Order follows the walk
/// (sorted per directory, subdirectories first) and carries no meaning.
pub fn enumerate_files<P>(
    dir_root: P,
    rule_symlink: EnumSymlinkStrategy,
    sink: &dyn SinkSyncEvent,
) -> Result<Vec<SpecFileEntry>, SyncTreeError>
where
    P: AsRef<Path>,
{
    let path_dir_root = absolutize_path(dir_root.as_ref());
    let meta_root = fs::metadata(&path_dir_root).map_err(|e| SyncTreeError::Io {
        path: path_dir_root.clone(),
        error: e,
    })?;
    if !meta_root.is_dir() {
        return Err(SyncTreeError::SourceNotDirectory(path_dir_root));
    }

    sink.emit(&EnumSyncEvent::EnumerateStarted {
        path_root: path_dir_root.clone(),
    });

    let mut spec_walk_ctx = SpecWalkContext {
        rule_symlink,
        sink,
        l_dir_stack: Vec::new(),
        l_entries: Vec::new(),
    };
    walk_directory(&path_dir_root, &mut spec_walk_ctx);

    let n_files = spec_walk_ctx.l_entries.len();
    sink.emit(&EnumSyncEvent::EnumerateFinished {
        path_root: path_dir_root,
        n_files,
    });
    Ok(spec_walk_ctx.l_entries)
}

fn walk_directory(path_root: &Path, spec_walk_ctx: &mut SpecWalkContext<'_>) {
    if spec_walk_ctx.rule_symlink != EnumSymlinkStrategy::Dereference {
        walk_directory_entries(path_root, spec_walk_ctx);
        return;
    }
    // Only an ancestor on the current path is a cycle; the same directory
    // reached through two links (alias and real path) is walked twice.
    if !enter_directory(path_root, spec_walk_ctx) {
        return;
    }
    walk_directory_entries(path_root, spec_walk_ctx);
    spec_walk_ctx.l_dir_stack.pop();
}

fn walk_directory_entries(path_root: &Path, spec_walk_ctx: &mut SpecWalkContext<'_>) {
    let iter_entries = match fs::read_dir(path_root) {
        Ok(iter) => iter,
        Err(e) => {
            emit_skipped(spec_walk_ctx, path_root, format!("Failed to read directory ({e})"));
            return;
        }
    };

    let mut l_dirs: Vec<PathBuf> = Vec::new();
    let mut l_files: Vec<(PathBuf, fs::Metadata)> = Vec::new();

    for _entry_res in iter_entries {
        let entry = match _entry_res {
            Ok(v) => v,
            Err(e) => {
                emit_skipped(
                    spec_walk_ctx,
                    path_root,
                    format!("Failed to read directory entry ({e})"),
                );
                continue;
            }
        };

        let path_entry = entry.path();
        let cfg_file_type = match entry.file_type() {
            Ok(v) => v,
            Err(e) => {
                emit_skipped(spec_walk_ctx, &path_entry, format!("Failed to inspect ({e})"));
                continue;
            }
        };

        if cfg_file_type.is_symlink() {
            if spec_walk_ctx.rule_symlink == EnumSymlinkStrategy::SkipSymlinks {
                spec_walk_ctx
                    .sink
                    .emit(&EnumSyncEvent::EnumerateSymlinkSkipped { path: path_entry });
                continue;
            }
            match fs::metadata(&path_entry) {
                Ok(meta_target) if meta_target.is_dir() => l_dirs.push(path_entry),
                Ok(meta_target) if meta_target.is_file() => l_files.push((path_entry, meta_target)),
                Ok(_) => {
                    emit_skipped(
                        spec_walk_ctx,
                        &path_entry,
                        "Special file target skipped".to_string(),
                    );
                }
                Err(e) => {
                    emit_skipped(spec_walk_ctx, &path_entry, format!("Broken symlink ({e})"));
                }
            }
        } else if cfg_file_type.is_dir() {
            l_dirs.push(path_entry);
        } else if cfg_file_type.is_file() {
            match entry.metadata() {
                Ok(meta_file) => l_files.push((path_entry, meta_file)),
                Err(e) => {
                    emit_skipped(spec_walk_ctx, &path_entry, format!("Failed to stat ({e})"));
                }
            }
        } else {
            emit_skipped(spec_walk_ctx, &path_entry, "Special file skipped".to_string());
        }
    }

    l_dirs.sort();
    l_files.sort_by(|a, b| a.0.cmp(&b.0));

    for path_dir_sub in l_dirs {
        walk_directory(&path_dir_sub, spec_walk_ctx);
    }

    for (path_file_src, meta_file) in l_files {
        let time_modified = match meta_file.modified() {
            Ok(v) => v,
            Err(e) => {
                emit_skipped(
                    spec_walk_ctx,
                    &path_file_src,
                    format!("Modification time unavailable ({e})"),
                );
                continue;
            }
        };
        spec_walk_ctx.l_entries.push(SpecFileEntry {
            path_file_src,
            time_modified,
        });

        let n_files = spec_walk_ctx.l_entries.len();
        if n_files % N_ENUMERATE_PROGRESS_EVERY == 0 {
            spec_walk_ctx
                .sink
                .emit(&EnumSyncEvent::EnumerateProgress { n_files });
        }
    }
}

/// Push `path_dir` onto the descent path. Returns `false` when it is already
/// an ancestor of itself (symlink loop).
#[cfg(unix)]
fn enter_directory(path_dir: &Path, spec_walk_ctx: &mut SpecWalkContext<'_>) -> bool {
    use std::os::unix::fs::MetadataExt;

    match fs::metadata(path_dir) {
        Ok(stat_dir) => {
            let key_dir = (stat_dir.dev(), stat_dir.ino());
            if spec_walk_ctx.l_dir_stack.contains(&key_dir) {
                emit_skipped(spec_walk_ctx, path_dir, "Symlink loop detected".to_string());
                return false;
            }
            spec_walk_ctx.l_dir_stack.push(key_dir);
            true
        }
        Err(e) => {
            emit_skipped(spec_walk_ctx, path_dir, format!("Failed to stat directory ({e})"));
            false
        }
    }
}

#[cfg(not(unix))]
fn enter_directory(_path_dir: &Path, spec_walk_ctx: &mut SpecWalkContext<'_>) -> bool {
    spec_walk_ctx.l_dir_stack.push((0, 0));
    true
}

fn emit_skipped(spec_walk_ctx: &SpecWalkContext<'_>, path: &Path, message: String) {
    spec_walk_ctx.sink.emit(&EnumSyncEvent::EnumerateSkipped {
        path: path.to_path_buf(),
        message,
    });
}
