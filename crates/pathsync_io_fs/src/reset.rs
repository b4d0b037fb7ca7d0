//! Destructive destination reset.

use std::fs;
use std::io;
use std::path::Path;

use crate::event::{EnumSyncEvent, SinkSyncEvent};
use crate::spec::SyncTreeError;
use crate::util::absolutize_path;

/// Delete `dir_destination` recursively if present, then recreate it with
/// all missing parents.
///
/// Irreversible. Callers gate this behind confirmation and skip it entirely
/// when there is nothing to copy. A symlinked or non-directory destination
/// root is refused untouched.
pub fn reset_destination<P>(dir_destination: P, sink: &dyn SinkSyncEvent) -> Result<(), SyncTreeError>
where
    P: AsRef<Path>,
{
    let path_dir_dst = absolutize_path(dir_destination.as_ref());

    let if_existed = match fs::symlink_metadata(&path_dir_dst) {
        Ok(meta_dir_dst) => {
            if meta_dir_dst.file_type().is_symlink() {
                return Err(SyncTreeError::DestinationIsSymlink(path_dir_dst));
            }
            if !meta_dir_dst.is_dir() {
                return Err(SyncTreeError::DestinationNotDirectory(path_dir_dst));
            }
            fs::remove_dir_all(&path_dir_dst).map_err(|e| SyncTreeError::DestinationResetFailed {
                path: path_dir_dst.clone(),
                error: e,
            })?;
            true
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => false,
        Err(e) => {
            return Err(SyncTreeError::DestinationResetFailed {
                path: path_dir_dst,
                error: e,
            });
        }
    };

    fs::create_dir_all(&path_dir_dst).map_err(|e| SyncTreeError::DestinationResetFailed {
        path: path_dir_dst.clone(),
        error: e,
    })?;

    sink.emit(&EnumSyncEvent::DestinationReset {
        path_dir_dst,
        if_existed,
    });
    Ok(())
}
