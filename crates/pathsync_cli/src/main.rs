mod cli;
mod confirm;
mod cutoff;
mod logging;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use pathsync_io_fs::{
    ConfirmAlways, Confirmer, EnumSyncStatus, SinkTracing, SpecArchiveOptions, SpecCancelToken,
    create_archive, enumerate_files, plan_sync, sync_filtered,
};

use crate::cli::{ArchiveArgs, Cli, Command, ListArgs, SyncArgs, symlink_rule};
use crate::confirm::ConfirmConsole;
use crate::cutoff::{format_time, parse_cutoff};

/// Exit code when the run finished but some files could not be copied.
const N_EXIT_PARTIAL: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Command::Sync(args) => run_sync(&args),
        Command::List(args) => run_list(&args),
        Command::Archive(args) => run_archive(&args),
    };
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run_sync(args: &SyncArgs) -> anyhow::Result<ExitCode> {
    let time_cutoff = parse_cutoff(&args.cutoff)?;
    let spec_sync_options = args.to_options();
    let sink = SinkTracing;

    if args.dry_run {
        let spec_plan = plan_sync(
            &args.source,
            &args.destination,
            time_cutoff,
            &spec_sync_options,
            &sink,
        )
        .context("planning sync")?;
        for spec_task in &spec_plan.l_tasks {
            println!(
                "{}\t{}",
                spec_task.path_file_src.display(),
                spec_task.path_file_dst.display()
            );
        }
        println!(
            "[DRY-RUN] discovered={} filtered={} warnings={}",
            spec_plan.cnt_discovered,
            spec_plan.l_tasks.len(),
            spec_plan.l_warnings.len()
        );
        return Ok(ExitCode::SUCCESS);
    }

    let confirmer: &dyn Confirmer = if args.yes {
        &ConfirmAlways
    } else {
        &ConfirmConsole
    };
    let report = sync_filtered(
        &args.source,
        &args.destination,
        time_cutoff,
        &spec_sync_options,
        confirmer,
        &SpecCancelToken::new(),
        &sink,
    )
    .context("sync failed")?;
    println!("{report}");

    if let Some(path_archive_base) = &args.archive
        && report.status == EnumSyncStatus::Completed
    {
        let path_archive = create_archive(
            &args.destination,
            path_archive_base,
            &SpecArchiveOptions::default(),
            &sink,
        )
        .context("archiving destination")?;
        println!("{}", path_archive.display());
    }

    if report.cnt_failed > 0 {
        return Ok(ExitCode::from(N_EXIT_PARTIAL));
    }
    Ok(ExitCode::SUCCESS)
}

fn run_list(args: &ListArgs) -> anyhow::Result<ExitCode> {
    let l_entries = enumerate_files(&args.path, symlink_rule(args.follow_symlinks), &SinkTracing)
        .with_context(|| format!("listing {}", args.path.display()))?;
    for spec_entry in &l_entries {
        println!(
            "{}\t{}",
            format_time(spec_entry.time_modified),
            spec_entry.path_file_src.display()
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn run_archive(args: &ArchiveArgs) -> anyhow::Result<ExitCode> {
    let path_archive = create_archive(
        &args.folder,
        &args.archive_base,
        &args.to_options(),
        &SinkTracing,
    )
    .with_context(|| format!("archiving {}", args.folder.display()))?;
    println!("{}", path_archive.display());
    Ok(ExitCode::SUCCESS)
}
