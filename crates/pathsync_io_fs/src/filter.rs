//! Cutoff + exclusion filtering and destination path projection.

use std::path::Path;
use std::time::SystemTime;

use globset::{Glob, GlobMatcher};
use regex::Regex;

use crate::event::{EnumSyncEvent, SinkSyncEvent};
use crate::spec::{EnumPatternMode, SpecCopyTask, SpecFileEntry, SyncTreeError};
use crate::util::{absolutize_path, relative_to_root};

////////////////////////////////////////////////////////////////////////////////
// #region PatternMatching

#[derive(Debug, Clone)]
enum TypeExcludePatternSeq {
    Literal(Vec<String>),
    Glob(Vec<GlobMatcher>),
    Regex(Vec<Regex>),
}

/// Compiled exclusion patterns, matched against the full source path.
#[derive(Debug, Clone)]
pub struct SpecExcludePatterns {
    patterns: Option<TypeExcludePatternSeq>,
}

impl SpecExcludePatterns {
    /// Compile `patterns` once; an empty list excludes nothing.
    pub fn compile(patterns: &[String], rule_pattern: EnumPatternMode) -> Result<Self, SyncTreeError> {
        if patterns.is_empty() {
            return Ok(Self::none());
        }

        let patterns = match rule_pattern {
            EnumPatternMode::Literal => TypeExcludePatternSeq::Literal(patterns.to_vec()),
            EnumPatternMode::Glob => {
                let mut l_glob = Vec::with_capacity(patterns.len());
                for pattern in patterns {
                    let matcher = Glob::new(pattern)
                        .map_err(|e| {
                            SyncTreeError::InvalidPattern(format!(
                                "Invalid pattern in exclude: {e}"
                            ))
                        })?
                        .compile_matcher();
                    l_glob.push(matcher);
                }
                TypeExcludePatternSeq::Glob(l_glob)
            }
            EnumPatternMode::Regex => {
                let mut l_regex = Vec::with_capacity(patterns.len());
                for pattern in patterns {
                    let regex = Regex::new(pattern).map_err(|e| {
                        SyncTreeError::InvalidPattern(format!("Invalid pattern in exclude: {e}"))
                    })?;
                    l_regex.push(regex);
                }
                TypeExcludePatternSeq::Regex(l_regex)
            }
        };
        Ok(Self {
            patterns: Some(patterns),
        })
    }

    /// Single literal marker, the common case.
    pub fn literal(marker: &str) -> Self {
        Self {
            patterns: Some(TypeExcludePatternSeq::Literal(vec![marker.to_string()])),
        }
    }

    pub fn none() -> Self {
        Self { patterns: None }
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        let Some(patterns) = &self.patterns else {
            return false;
        };

        match patterns {
            TypeExcludePatternSeq::Literal(v) => {
                let c_path = path.to_string_lossy();
                v.iter().any(|p| c_path.contains(p.as_str()))
            }
            TypeExcludePatternSeq::Glob(v) => v.iter().any(|p| p.is_match(path)),
            TypeExcludePatternSeq::Regex(v) => {
                let c_path = path.to_string_lossy();
                v.iter().any(|p| p.is_match(&c_path))
            }
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Filter

/// Keep entries strictly newer than `time_cutoff` whose path is not
/// excluded, and pair each with `dir_destination / relative(source)`.
///
/// Entries exactly at the cutoff are dropped so re-running with the same
/// cutoff selects nothing new. An entry outside `dir_source` is a caller
/// bug and fails the whole call with [`SyncTreeError::PathOutsideRoot`].
pub fn filter_entries<P, Q>(
    l_entries: &[SpecFileEntry],
    dir_source: P,
    dir_destination: Q,
    time_cutoff: SystemTime,
    spec_exclude: &SpecExcludePatterns,
    sink: &dyn SinkSyncEvent,
) -> Result<Vec<SpecCopyTask>, SyncTreeError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_dir_src = absolutize_path(dir_source.as_ref());
    let path_dir_dst = absolutize_path(dir_destination.as_ref());

    let l_tasks = l_entries
        .iter()
        .filter(|e| e.time_modified > time_cutoff)
        .filter(|e| !spec_exclude.is_excluded(&e.path_file_src))
        .map(|e| {
            let path_rel = relative_to_root(&e.path_file_src, &path_dir_src).ok_or_else(|| {
                SyncTreeError::PathOutsideRoot {
                    path: e.path_file_src.clone(),
                    root: path_dir_src.clone(),
                }
            })?;
            Ok(SpecCopyTask {
                path_file_src: e.path_file_src.clone(),
                path_file_dst: path_dir_dst.join(path_rel),
            })
        })
        .collect::<Result<Vec<_>, SyncTreeError>>()?;

    sink.emit(&EnumSyncEvent::FilterFinished {
        n_total: l_entries.len(),
        n_kept: l_tasks.len(),
    });
    Ok(l_tasks)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::{SpecExcludePatterns, filter_entries};
    use crate::event::{EnumSyncEvent, SinkCollect, SinkNoop};
    use crate::spec::{EnumPatternMode, SpecFileEntry, SyncTreeError};
    use crate::util::testing::unix_time;

    fn entry(path: &str, n_unix_secs: u64) -> SpecFileEntry {
        SpecFileEntry {
            path_file_src: PathBuf::from(path),
            time_modified: unix_time(n_unix_secs),
        }
    }

    fn kept_sources(l_tasks: &[crate::spec::SpecCopyTask]) -> Vec<PathBuf> {
        let mut l_paths: Vec<PathBuf> = l_tasks.iter().map(|t| t.path_file_src.clone()).collect();
        l_paths.sort();
        l_paths
    }

    #[test]
    fn filter_scenario_time_and_marker() {
        let l_entries = vec![
            entry("/root/a.txt", 100),
            entry("/root/sub/b.txt", 200),
            entry("/root/_gsdata_/c.txt", 200),
        ];
        let l_tasks = filter_entries(
            &l_entries,
            "/root",
            "/backup",
            unix_time(150),
            &SpecExcludePatterns::literal("_gsdata_"),
            &SinkNoop,
        )
        .expect("filter");

        assert_eq!(l_tasks.len(), 1);
        assert_eq!(l_tasks[0].path_file_src, Path::new("/root/sub/b.txt"));
        assert_eq!(l_tasks[0].path_file_dst, Path::new("/backup/sub/b.txt"));
    }

    #[test]
    fn filter_drops_entries_exactly_at_cutoff() {
        let l_entries = vec![entry("/root/at.txt", 150), entry("/root/after.txt", 151)];
        let l_tasks = filter_entries(
            &l_entries,
            "/root",
            "/backup",
            unix_time(150),
            &SpecExcludePatterns::none(),
            &SinkNoop,
        )
        .expect("filter");
        assert_eq!(kept_sources(&l_tasks), vec![PathBuf::from("/root/after.txt")]);
    }

    #[test]
    fn filter_marker_wins_over_recent_mtime() {
        let l_entries = vec![
            entry("/root/x_gsdata_y.txt", 9_999),
            entry("/root/deep/_gsdata_/meta/z.bin", 9_999),
        ];
        let l_tasks = filter_entries(
            &l_entries,
            "/root",
            "/backup",
            unix_time(0),
            &SpecExcludePatterns::literal("_gsdata_"),
            &SinkNoop,
        )
        .expect("filter");
        assert!(l_tasks.is_empty());
    }

    #[test]
    fn filter_destination_mirrors_relative_source() {
        let l_entries = vec![
            entry("/root/a.txt", 200),
            entry("/root/x/y/z.txt", 200),
            entry("/root/x/w.txt", 200),
        ];
        let l_tasks = filter_entries(
            &l_entries,
            "/root",
            "/backup/today",
            unix_time(100),
            &SpecExcludePatterns::none(),
            &SinkNoop,
        )
        .expect("filter");

        assert_eq!(l_tasks.len(), 3);
        for spec_task in &l_tasks {
            let path_rel_dst = spec_task
                .path_file_dst
                .strip_prefix("/backup/today")
                .expect("destination under root");
            let path_rel_src = spec_task
                .path_file_src
                .strip_prefix("/root")
                .expect("source under root");
            assert!(!path_rel_dst.as_os_str().is_empty());
            assert_eq!(path_rel_dst, path_rel_src);
        }
    }

    #[test]
    fn filter_rejects_entry_outside_source_root() {
        let l_entries = vec![entry("/elsewhere/a.txt", 200)];
        let err = filter_entries(
            &l_entries,
            "/root",
            "/backup",
            unix_time(100),
            &SpecExcludePatterns::none(),
            &SinkNoop,
        )
        .expect_err("outside root must fail");
        assert!(matches!(err, SyncTreeError::PathOutsideRoot { .. }));
    }

    #[test]
    fn filter_ignores_outside_entry_already_filtered_by_time() {
        let l_entries = vec![entry("/elsewhere/a.txt", 50)];
        let l_tasks = filter_entries(
            &l_entries,
            "/root",
            "/backup",
            unix_time(100),
            &SpecExcludePatterns::none(),
            &SinkNoop,
        )
        .expect("filter");
        assert!(l_tasks.is_empty());
    }

    #[test]
    fn filter_empty_result_reports_counts() {
        let l_entries = vec![entry("/root/a.txt", 10), entry("/root/b.txt", 20)];
        let sink = SinkCollect::new();
        let l_tasks = filter_entries(
            &l_entries,
            "/root",
            "/backup",
            unix_time(1_000),
            &SpecExcludePatterns::none(),
            &sink,
        )
        .expect("filter");

        assert!(l_tasks.is_empty());
        assert_eq!(
            sink.events(),
            vec![EnumSyncEvent::FilterFinished {
                n_total: 2,
                n_kept: 0
            }]
        );
    }

    #[test]
    fn exclude_glob_and_regex_modes() {
        let spec_glob = SpecExcludePatterns::compile(
            &["**/*.tmp".to_string(), "**/cache/**".to_string()],
            EnumPatternMode::Glob,
        )
        .expect("compile glob");
        assert!(spec_glob.is_excluded(Path::new("/root/a/b.tmp")));
        assert!(spec_glob.is_excluded(Path::new("/root/cache/x.txt")));
        assert!(!spec_glob.is_excluded(Path::new("/root/a/b.txt")));

        let spec_regex =
            SpecExcludePatterns::compile(&[r"\.bak$".to_string()], EnumPatternMode::Regex)
                .expect("compile regex");
        assert!(spec_regex.is_excluded(Path::new("/root/notes.txt.bak")));
        assert!(!spec_regex.is_excluded(Path::new("/root/notes.bak.txt")));
    }

    #[test]
    fn exclude_invalid_patterns_rejected() {
        let err = SpecExcludePatterns::compile(&["(".to_string()], EnumPatternMode::Regex)
            .expect_err("invalid regex must fail");
        assert!(matches!(err, SyncTreeError::InvalidPattern(_)));

        let err = SpecExcludePatterns::compile(&["[".to_string()], EnumPatternMode::Glob)
            .expect_err("invalid glob must fail");
        assert!(matches!(err, SyncTreeError::InvalidPattern(_)));
    }

    #[test]
    fn exclude_empty_list_keeps_everything() {
        let spec_exclude =
            SpecExcludePatterns::compile(&[], EnumPatternMode::Literal).expect("compile");
        assert!(!spec_exclude.is_excluded(Path::new("/root/_gsdata_/c.txt")));
    }
}
