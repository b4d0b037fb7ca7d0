use std::fs;
use std::path::Path;

use assert_cmd::Command;
use filetime::{FileTime, set_file_mtime};
use predicates::prelude::*;
use tempfile::TempDir;

const N_T0: i64 = 1_600_000_000;
const N_T1: i64 = 1_700_000_000;
const C_CUTOFF_MID: &str = "@1650000000";

fn write_at(path: &Path, txt: &str, n_unix_secs: i64) {
    fs::create_dir_all(path.parent().expect("parent")).expect("create parent");
    fs::write(path, txt).expect("write");
    set_file_mtime(path, FileTime::from_unix_time(n_unix_secs, 0)).expect("set mtime");
}

fn seed_tree(root: &Path) {
    write_at(&root.join("a.txt"), "a", N_T0);
    write_at(&root.join("sub/b.txt"), "b", N_T1);
    write_at(&root.join("_gsdata_/c.txt"), "c", N_T1);
}

fn pathsync() -> Command {
    let mut cmd = Command::cargo_bin("pathsync").expect("binary");
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn sync_with_yes_copies_filtered_files() {
    let tmp = TempDir::new().expect("tmp");
    let src = tmp.path().join("src");
    let dst = tmp.path().join("dst");
    seed_tree(&src);

    pathsync()
        .args(["sync", "--yes", "--cutoff", C_CUTOFF_MID])
        .arg(&src)
        .arg(&dst)
        .assert()
        .success()
        .stdout(predicate::str::contains("status=completed"))
        .stdout(predicate::str::contains("copied=1"));

    assert_eq!(fs::read_to_string(dst.join("sub/b.txt")).expect("read"), "b");
    assert!(!dst.join("a.txt").exists());
    assert!(!dst.join("_gsdata_").exists());
}

#[test]
fn sync_declined_on_stdin_leaves_destination() {
    let tmp = TempDir::new().expect("tmp");
    let src = tmp.path().join("src");
    let dst = tmp.path().join("dst");
    seed_tree(&src);
    write_at(&dst.join("keep.txt"), "keep", N_T0);

    pathsync()
        .args(["sync", "--cutoff", C_CUTOFF_MID])
        .arg(&src)
        .arg(&dst)
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("status=declined"));

    assert!(dst.join("keep.txt").exists());
    assert!(!dst.join("sub/b.txt").exists());
}

#[test]
fn sync_future_cutoff_is_nothing_to_do() {
    let tmp = TempDir::new().expect("tmp");
    let src = tmp.path().join("src");
    let dst = tmp.path().join("dst");
    seed_tree(&src);
    write_at(&dst.join("keep.txt"), "keep", N_T0);

    pathsync()
        .args(["sync", "--yes", "--cutoff", "@4000000000"])
        .arg(&src)
        .arg(&dst)
        .assert()
        .success()
        .stdout(predicate::str::contains("status=nothing-to-do"));

    assert!(dst.join("keep.txt").exists());
}

#[test]
fn sync_dry_run_prints_plan_only() {
    let tmp = TempDir::new().expect("tmp");
    let src = tmp.path().join("src");
    let dst = tmp.path().join("dst");
    seed_tree(&src);

    pathsync()
        .args(["sync", "--dry-run", "--cutoff", C_CUTOFF_MID])
        .arg(&src)
        .arg(&dst)
        .assert()
        .success()
        .stdout(predicate::str::contains("b.txt"))
        .stdout(predicate::str::contains("[DRY-RUN] discovered=3 filtered=1"));

    assert!(!dst.exists());
}

#[test]
fn sync_then_archive_destination() {
    let tmp = TempDir::new().expect("tmp");
    let src = tmp.path().join("src");
    let dst = tmp.path().join("dst");
    seed_tree(&src);
    let path_base = tmp.path().join("snapshot");

    pathsync()
        .args(["sync", "--yes", "--cutoff", C_CUTOFF_MID])
        .arg(&src)
        .arg(&dst)
        .arg("--archive")
        .arg(&path_base)
        .assert()
        .success()
        .stdout(predicate::str::contains("snapshot.zip"));

    let file = fs::File::open(tmp.path().join("snapshot.zip")).expect("open zip");
    let mut archive = zip::ZipArchive::new(file).expect("decode zip");
    assert_eq!(archive.len(), 1);
    assert_eq!(archive.by_index(0).expect("entry").name(), "sub/b.txt");
}

#[test]
fn sync_rejects_bad_cutoff() {
    let tmp = TempDir::new().expect("tmp");
    let src = tmp.path().join("src");
    seed_tree(&src);

    pathsync()
        .args(["sync", "--yes", "--cutoff", "last tuesday"])
        .arg(&src)
        .arg(tmp.path().join("dst"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized cutoff"));
}

#[test]
fn list_prints_every_file() {
    let tmp = TempDir::new().expect("tmp");
    let src = tmp.path().join("src");
    seed_tree(&src);

    pathsync()
        .arg("list")
        .arg(&src)
        .assert()
        .success()
        .stdout(predicate::str::contains("a.txt"))
        .stdout(predicate::str::contains("b.txt"))
        .stdout(predicate::str::contains("c.txt"));
}

#[test]
fn archive_without_files_fails() {
    let tmp = TempDir::new().expect("tmp");
    let folder = tmp.path().join("folder");
    write_at(&folder.join("README"), "no dot", N_T0);

    pathsync()
        .arg("archive")
        .arg(&folder)
        .arg(tmp.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No files found to archive"));
    assert!(!tmp.path().join("out.zip").exists());

    pathsync()
        .arg("archive")
        .arg(&folder)
        .arg(tmp.path().join("out"))
        .arg("--include-extensionless")
        .assert()
        .success();
    assert!(tmp.path().join("out.zip").exists());
}
