//! Path length advisories for planned copy tasks.

use std::path::Path;

use crate::event::{EnumSyncEvent, SinkSyncEvent};
use crate::spec::{EnumPathSide, SpecCopyTask, SpecPathWarning};

/// Warn about every source or destination path longer than `n_len_max`
/// characters.
///
/// Tasks are left untouched: an over-long path is still copied and may fail
/// later at the OS boundary.
pub fn validate_path_lengths(
    l_tasks: &[SpecCopyTask],
    n_len_max: usize,
    sink: &dyn SinkSyncEvent,
) -> Vec<SpecPathWarning> {
    let mut l_warnings = Vec::new();
    for spec_task in l_tasks {
        for (path, side) in [
            (&spec_task.path_file_src, EnumPathSide::Source),
            (&spec_task.path_file_dst, EnumPathSide::Destination),
        ] {
            let n_chars = count_path_chars(path);
            if n_chars <= n_len_max {
                continue;
            }
            sink.emit(&EnumSyncEvent::PathTooLong {
                path: path.clone(),
                side,
                n_chars,
                n_limit: n_len_max,
            });
            l_warnings.push(SpecPathWarning {
                path: path.clone(),
                side,
                n_chars,
            });
        }
    }
    l_warnings
}

fn count_path_chars(path: &Path) -> usize {
    path.to_string_lossy().chars().count()
}
