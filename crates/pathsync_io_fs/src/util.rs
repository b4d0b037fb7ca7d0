use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

const N_WORKERS_CEILING: usize = 64;

////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

/// Canonical form of `path` even when its tail does not exist yet: the
/// deepest existing ancestor is canonicalized and the rest is appended.
fn _normalize_path(path: &Path) -> PathBuf {
    let path_lexical = normalize_lexically(&absolutize_path(path));
    let mut l_tail: Vec<&std::ffi::OsStr> = Vec::new();
    let mut path_existing = path_lexical.as_path();
    loop {
        if let Ok(resolved) = fs::canonicalize(path_existing) {
            return l_tail.iter().rev().fold(resolved, |acc, name| acc.join(name));
        }
        match (path_existing.parent(), path_existing.file_name()) {
            (Some(parent), Some(name)) => {
                l_tail.push(name);
                path_existing = parent;
            }
            _ => return path_lexical,
        }
    }
}

/// Resolve `.` and `..` without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut path_out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !path_out.pop() && !path_out.has_root() {
                    path_out.push(component);
                }
            }
            _ => path_out.push(component),
        }
    }
    path_out
}

pub(crate) fn absolutize_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(path)
}

pub(crate) fn is_overlap(src: &Path, dst: &Path) -> bool {
    let src_resolved = _normalize_path(src);
    let dst_resolved = _normalize_path(dst);
    dst_resolved.starts_with(&src_resolved) || src_resolved.starts_with(&dst_resolved)
}

/// Relative path of `path` below `root`, or `None` when `path` is not a
/// proper descendant.
pub(crate) fn relative_to_root<'a>(path: &'a Path, root: &Path) -> Option<&'a Path> {
    let path_rel = path.strip_prefix(root).ok()?;
    if path_rel.as_os_str().is_empty() {
        return None;
    }
    if path_rel
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return None;
    }
    Some(path_rel)
}

/// Archive entry name: relative components joined with `/`.
pub(crate) fn derive_entry_name(path_rel: &Path) -> String {
    path_rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FileCopy

/// Copy file bytes; optionally carry permissions, timestamps and xattrs.
///
/// Returns the number of bytes written.
pub(crate) fn copy_file_with_metadata(
    path_file_src: &Path,
    path_file_dst: &Path,
    if_preserve_metadata: bool,
) -> Result<u64, io::Error> {
    let n_bytes = fs::copy(path_file_src, path_file_dst)?;
    if if_preserve_metadata {
        apply_metadata(path_file_src, path_file_dst)?;
    }
    Ok(n_bytes)
}

fn apply_metadata(path_file_src: &Path, path_file_dst: &Path) -> Result<(), io::Error> {
    use filetime::{FileTime, set_file_times};

    let stat_src = fs::metadata(path_file_src)?;
    fs::set_permissions(path_file_dst, stat_src.permissions())?;

    let file_time_access = FileTime::from_last_access_time(&stat_src);
    let file_time_modify = FileTime::from_last_modification_time(&stat_src);
    set_file_times(path_file_dst, file_time_access, file_time_modify)?;

    #[cfg(target_os = "linux")]
    copy_xattrs_linux(path_file_src, path_file_dst);
    Ok(())
}

#[cfg(target_os = "linux")]
fn copy_xattrs_linux(path_file_src: &Path, path_file_dst: &Path) {
    let iter_xattr_names = match xattr::list(path_file_src) {
        Ok(v) => v,
        Err(_) => return,
    };

    for name in iter_xattr_names {
        let Some(raw_value) = xattr::get(path_file_src, &name).ok().flatten() else {
            continue;
        };
        let _ = xattr::set(path_file_dst, &name, &raw_value);
    }
}

pub(crate) fn calculate_worker_limit(num_workers: usize) -> usize {
    num_workers.clamp(1, N_WORKERS_CEILING)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
