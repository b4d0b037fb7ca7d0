//! Single-file Deflate archive of a folder.

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{Datelike, Local, Timelike};
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::enumerate::enumerate_files;
use crate::event::{EnumSyncEvent, SinkSyncEvent};
use crate::spec::{ArchiveError, C_ARCHIVE_EXTENSION, SpecArchiveOptions, SpecFileEntry};
use crate::util::{absolutize_path, derive_entry_name, relative_to_root};

/// Write every regular file under `dir_source` into
/// `path_archive_base` with its extension replaced by `.zip`.
///
/// A preexisting archive at that path is deleted first, so the result never
/// merges two runs. Entries are stored relative to `dir_source` and keep the
/// file's local modification time and, on Unix, its permission bits. With
/// `if_require_extension` only files whose name contains a `.` are taken.
/// When nothing matches, [`ArchiveError::NoFilesFound`] is returned and no
/// archive is written; a failed write removes the partial file.
pub fn create_archive<P, Q>(
    dir_source: P,
    path_archive_base: Q,
    spec_archive_options: &SpecArchiveOptions,
    sink: &dyn SinkSyncEvent,
) -> Result<PathBuf, ArchiveError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_dir_src = absolutize_path(dir_source.as_ref());
    if !path_dir_src.is_dir() {
        return Err(ArchiveError::SourceNotDirectory(path_dir_src));
    }
    let path_archive = absolutize_path(path_archive_base.as_ref()).with_extension(C_ARCHIVE_EXTENSION);
    sink.emit(&EnumSyncEvent::ArchiveStarted {
        path_archive: path_archive.clone(),
    });

    match fs::remove_file(&path_archive) {
        Ok(()) => sink.emit(&EnumSyncEvent::ArchiveReplaced {
            path_archive: path_archive.clone(),
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(ArchiveError::Io {
                path: path_archive,
                error: e,
            });
        }
    }

    let l_entries: Vec<SpecFileEntry> =
        enumerate_files(&path_dir_src, spec_archive_options.rule_symlink, sink)?
            .into_iter()
            .filter(|e| !spec_archive_options.if_require_extension || has_extension(&e.path_file_src))
            .collect();
    if l_entries.is_empty() {
        return Err(ArchiveError::NoFilesFound(path_dir_src));
    }

    if let Err(e) = write_archive(&path_archive, &path_dir_src, &l_entries, sink) {
        let _ = fs::remove_file(&path_archive);
        return Err(e);
    }

    sink.emit(&EnumSyncEvent::ArchiveFinished {
        path_archive: path_archive.clone(),
        n_files: l_entries.len(),
    });
    Ok(path_archive)
}

/// Mirrors a `*.*` name match: a dot anywhere in the file name.
fn has_extension(path_file: &Path) -> bool {
    path_file
        .file_name()
        .is_some_and(|name| name.to_string_lossy().contains('.'))
}

fn write_archive(
    path_archive: &Path,
    path_dir_src: &Path,
    l_entries: &[SpecFileEntry],
    sink: &dyn SinkSyncEvent,
) -> Result<(), ArchiveError> {
    let map_io = |path: &Path| {
        let path = path.to_path_buf();
        move |e: io::Error| ArchiveError::Io { path, error: e }
    };
    let map_zip = |e: zip::result::ZipError| ArchiveError::Zip {
        path: path_archive.to_path_buf(),
        error: e,
    };

    let file_archive = File::create(path_archive).map_err(map_io(path_archive))?;
    let mut writer = ZipWriter::new(BufWriter::new(file_archive));
    for spec_entry in l_entries {
        let path_rel = relative_to_root(&spec_entry.path_file_src, path_dir_src).ok_or_else(|| {
            ArchiveError::Io {
                path: spec_entry.path_file_src.clone(),
                error: io::Error::new(io::ErrorKind::InvalidInput, "file is outside the archive root"),
            }
        })?;
        let name_entry = derive_entry_name(path_rel);
        sink.emit(&EnumSyncEvent::ArchiveEntry {
            path_file: spec_entry.path_file_src.clone(),
            name_entry: name_entry.clone(),
        });

        let mut file_src = File::open(&spec_entry.path_file_src).map_err(map_io(&spec_entry.path_file_src))?;
        let meta_src = file_src.metadata().map_err(map_io(&spec_entry.path_file_src))?;
        let zip_options = build_entry_options(spec_entry, &meta_src);
        writer.start_file(name_entry, zip_options).map_err(map_zip)?;
        io::copy(&mut file_src, &mut writer).map_err(map_io(&spec_entry.path_file_src))?;
    }

    let mut buf_writer = writer.finish().map_err(map_zip)?;
    io::Write::flush(&mut buf_writer).map_err(map_io(path_archive))?;
    Ok(())
}

fn build_entry_options(spec_entry: &SpecFileEntry, meta_src: &fs::Metadata) -> FileOptions {
    let mut zip_options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .large_file(is_large_entry(meta_src.len()));
    if let Some(dt_modified) = to_zip_datetime(spec_entry.time_modified) {
        zip_options = zip_options.last_modified_time(dt_modified);
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        zip_options = zip_options.unix_permissions(meta_src.permissions().mode());
    }
    zip_options
}

/// Entries at or above 4 GiB need ZIP64 headers.
fn is_large_entry(n_len: u64) -> bool {
    n_len >= u64::from(u32::MAX)
}

/// Local wall-clock time in DOS format; `None` outside 1980..=2107.
fn to_zip_datetime(time_modified: SystemTime) -> Option<DateTime> {
    let dt_local: chrono::DateTime<Local> = time_modified.into();
    DateTime::from_date_and_time(
        u16::try_from(dt_local.year()).ok()?,
        dt_local.month() as u8,
        dt_local.day() as u8,
        dt_local.hour() as u8,
        dt_local.minute() as u8,
        dt_local.second() as u8,
    )
    .ok()
}
