use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use pathsync_io_fs::{
    EnumPatternMode, EnumSymlinkStrategy, N_PATH_LEN_MAX_DEFAULT, N_WORKERS_DEFAULT,
    SpecArchiveOptions, SpecSyncOptions,
};

#[derive(Debug, Parser)]
#[command(
    name = "pathsync",
    version,
    about = "Copy files changed since a cutoff into a fresh backup folder, optionally zipped"
)]
pub struct Cli {
    /// More log output (-v debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Only warnings and errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Copy files modified after the cutoff into a reset destination.
    Sync(SyncArgs),
    /// Print every regular file with its modification time.
    List(ListArgs),
    /// Zip a folder into a single archive.
    Archive(ArchiveArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PatternModeArg {
    Literal,
    Glob,
    Regex,
}

impl From<PatternModeArg> for EnumPatternMode {
    fn from(value: PatternModeArg) -> Self {
        match value {
            PatternModeArg::Literal => Self::Literal,
            PatternModeArg::Glob => Self::Glob,
            PatternModeArg::Regex => Self::Regex,
        }
    }
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Only files modified strictly after this time are copied.
    /// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD` or `@<unix-seconds>`.
    #[arg(long, short = 'c')]
    pub cutoff: String,
    /// Exclude paths matching this pattern (repeatable). Defaults to `_gsdata_`.
    #[arg(long = "exclude", short = 'e')]
    pub patterns_exclude: Vec<String>,
    /// How exclusion patterns are interpreted.
    #[arg(long, value_enum, default_value = "literal")]
    pub pattern_mode: PatternModeArg,
    /// Copy workers; 1 copies sequentially with per-file logging.
    #[arg(long, short = 'j', default_value_t = N_WORKERS_DEFAULT)]
    pub workers: usize,
    /// Warn about paths longer than this.
    #[arg(long, default_value_t = N_PATH_LEN_MAX_DEFAULT)]
    pub max_path_len: usize,
    /// Follow symlinks instead of skipping them.
    #[arg(long)]
    pub follow_symlinks: bool,
    /// Also copy permissions, timestamps and extended attributes.
    #[arg(long)]
    pub preserve_metadata: bool,
    /// Do not ask before deleting the destination.
    #[arg(long, short = 'y')]
    pub yes: bool,
    /// Print the planned copies and stop.
    #[arg(long)]
    pub dry_run: bool,
    /// Zip the destination to this base path after a successful copy.
    #[arg(long)]
    pub archive: Option<PathBuf>,
}

impl SyncArgs {
    pub fn to_options(&self) -> SpecSyncOptions {
        let mut spec_sync_options = SpecSyncOptions {
            rule_pattern: self.pattern_mode.into(),
            rule_symlink: symlink_rule(self.follow_symlinks),
            num_workers: self.workers,
            n_path_len_max: self.max_path_len,
            if_preserve_metadata: self.preserve_metadata,
            ..SpecSyncOptions::default()
        };
        if !self.patterns_exclude.is_empty() {
            spec_sync_options.patterns_exclude = self.patterns_exclude.clone();
        }
        spec_sync_options
    }
}

#[derive(Debug, Args)]
pub struct ListArgs {
    pub path: PathBuf,
    /// Follow symlinks instead of skipping them.
    #[arg(long)]
    pub follow_symlinks: bool,
}

#[derive(Debug, Args)]
pub struct ArchiveArgs {
    pub folder: PathBuf,
    /// Archive path; its extension is replaced by `.zip`.
    pub archive_base: PathBuf,
    /// Also archive files whose name has no `.`.
    #[arg(long)]
    pub include_extensionless: bool,
    /// Follow symlinks instead of skipping them.
    #[arg(long)]
    pub follow_symlinks: bool,
}

impl ArchiveArgs {
    pub fn to_options(&self) -> SpecArchiveOptions {
        SpecArchiveOptions {
            if_require_extension: !self.include_extensionless,
            rule_symlink: symlink_rule(self.follow_symlinks),
        }
    }
}

pub fn symlink_rule(if_follow: bool) -> EnumSymlinkStrategy {
    if if_follow {
        EnumSymlinkStrategy::Dereference
    } else {
        EnumSymlinkStrategy::SkipSymlinks
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};
    use pathsync_io_fs::{EnumPatternMode, EnumSymlinkStrategy};

    use super::{Cli, Command};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn sync_defaults_keep_marker_exclusion() {
        let cli = Cli::parse_from(["pathsync", "sync", "src", "dst", "--cutoff", "2024-01-01"]);
        let Command::Sync(sync_args) = cli.command else {
            panic!("expected sync");
        };
        let spec_sync_options = sync_args.to_options();
        assert_eq!(spec_sync_options.patterns_exclude, vec!["_gsdata_"]);
        assert_eq!(spec_sync_options.num_workers, 4);
        assert_eq!(spec_sync_options.rule_symlink, EnumSymlinkStrategy::SkipSymlinks);
    }

    #[test]
    fn sync_flags_map_onto_options() {
        let cli = Cli::parse_from([
            "pathsync",
            "-v",
            "sync",
            "src",
            "dst",
            "-c",
            "@0",
            "-e",
            "**/*.tmp",
            "-e",
            "**/cache/**",
            "--pattern-mode",
            "glob",
            "-j",
            "1",
            "--follow-symlinks",
        ]);
        assert_eq!(cli.verbose, 1);
        let Command::Sync(sync_args) = cli.command else {
            panic!("expected sync");
        };
        let spec_sync_options = sync_args.to_options();
        assert_eq!(spec_sync_options.patterns_exclude.len(), 2);
        assert_eq!(spec_sync_options.rule_pattern, EnumPatternMode::Glob);
        assert_eq!(spec_sync_options.num_workers, 1);
        assert_eq!(spec_sync_options.rule_symlink, EnumSymlinkStrategy::Dereference);
    }
}
