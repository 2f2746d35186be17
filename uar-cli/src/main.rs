use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use uar_lib::{progress, ErrorKind, ExtractOptions, ExtractionWorker, GroupKey, Pattern, ProgressEvent};

#[derive(Parser)]
#[command(name = "uar")]
#[command(author, version, about = "Extract pattern-filtered results from nested zip archives", long_about = None)]
struct Cli {
    /// Outer zip archive to extract
    archive: PathBuf,

    /// Regular expression selecting which member names to extract
    #[arg(short, long, default_value = r"_warped\.")]
    pattern: String,

    /// Decompress extracted .gz files in place
    #[arg(long)]
    degzip: bool,

    /// Move each extracted file into its own folder
    #[arg(long)]
    tofolder: bool,

    /// Group files by filename stem instead of the numeric token
    #[arg(long, requires = "tofolder")]
    by_stem: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            error!("Error: {}", e);
            let exit_code = e
                .downcast_ref::<uar_lib::Error>()
                .map(|err| exit_code_for(err.kind()))
                .unwrap_or(1);
            process::exit(exit_code);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    // Compile eagerly so a bad pattern aborts before anything is touched
    let pattern = Pattern::new(&cli.pattern)?;
    let options = ExtractOptions {
        decompress_gzip: cli.degzip,
        reorganize_into_folders: cli.tofolder,
        group_key: if cli.by_stem {
            GroupKey::FileStem
        } else {
            GroupKey::NumericToken
        },
    };

    info!("Extracting {:?}", cli.archive);

    let (tx, rx) = progress::channel();
    let mut worker = ExtractionWorker::new(tx);
    worker.start(cli.archive.clone(), pattern, options)?;

    let show_progress = !cli.quiet;
    let mut bar: Option<ProgressBar> = None;
    let mut failure: Option<(ErrorKind, String)> = None;

    // Drain the channel at our own pace; it ends when the run is over
    for event in rx.iter() {
        match event {
            ProgressEvent::Started => {
                if show_progress {
                    let spinner = ProgressBar::new_spinner();
                    spinner.set_message("Inspecting archive...");
                    spinner.enable_steady_tick(Duration::from_millis(100));
                    bar = Some(spinner);
                }
            }
            ProgressEvent::TotalUnits(total) => {
                if let Some(spinner) = bar.take() {
                    spinner.finish_and_clear();
                }
                if show_progress {
                    let pb = ProgressBar::new(total as u64);
                    pb.set_style(
                        ProgressStyle::default_bar()
                            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                            .unwrap()
                            .progress_chars("#>-"),
                    );
                    pb.set_message("extracting inner archives");
                    bar = Some(pb);
                }
            }
            ProgressEvent::UnitCompleted => {
                if let Some(pb) = &bar {
                    pb.inc(1);
                }
            }
            ProgressEvent::Finished => {
                if let Some(pb) = bar.take() {
                    pb.finish_with_message("done");
                }
            }
            ProgressEvent::Failed { kind, context } => {
                if let Some(pb) = bar.take() {
                    pb.abandon();
                }
                failure = Some((kind, context));
            }
        }
    }
    worker.join();

    match failure {
        Some((kind, context)) => {
            error!("Extraction failed: {}", context);
            Ok(exit_code_for(kind))
        }
        None => {
            info!("Done!");
            Ok(0)
        }
    }
}

/// Map error kinds to exit codes:
/// - 0: Success
/// - 1: General error
/// - 2: Archive or filesystem I/O error
/// - 3: Invalid arguments
/// - 4: Extraction or post-processing failure
fn exit_code_for(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::InvalidPattern => 3,
        ErrorKind::ArchiveOpen | ErrorKind::DirectoryPrepare | ErrorKind::OutputWrite => 2,
        ErrorKind::ArchiveCorrupt
        | ErrorKind::MemberRead
        | ErrorKind::Decompression
        | ErrorKind::Reorganization => 4,
        ErrorKind::AlreadyRunning => 1,
    }
}
