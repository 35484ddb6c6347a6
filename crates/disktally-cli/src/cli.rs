/// Command-line interface: argument parsing and command dispatch.
use crate::render::render_tree;
use crate::state::{compose_targets, AppPhase, AppState};
use anyhow::{bail, Context};
use clap::{ArgAction, Parser, Subcommand};
use disktally_core::model::size::format_count;
use disktally_core::platform::available_drives;
use disktally_core::scanner::ScanOptions;
use disktally_core::store::ResultStore;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How often the CLI polls the scan channel while waiting.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Parser)]
#[command(
    name = "disktally",
    version,
    about = "Tally disk usage per directory across drives and folders"
)]
pub struct Cli {
    /// Snapshot file holding the last completed scan.
    #[arg(long, global = true, default_value = ResultStore::DEFAULT_FILE_NAME)]
    pub snapshot: PathBuf,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan drives and/or folders, save the result, and print the tree.
    Scan {
        /// Folders to scan.
        paths: Vec<PathBuf>,

        /// Also scan every local drive (listed before the folders).
        #[arg(long)]
        all_drives: bool,

        /// Maximum tree depth to print.
        #[arg(long)]
        depth: Option<u16>,

        /// Worker threads (defaults to the number of CPUs).
        #[arg(long)]
        threads: Option<usize>,
    },
    /// Print the tree from the last saved scan without rescanning.
    Show {
        /// Maximum tree depth to print.
        #[arg(long)]
        depth: Option<u16>,
    },
    /// List the drives available for scanning.
    Drives,
}

/// Run the parsed command, writing results to stdout.
pub fn run(cli: &Cli) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_with_output(cli, &mut out)
}

/// Run the parsed command, writing results to `out`.
pub fn run_with_output(cli: &Cli, out: &mut impl Write) -> anyhow::Result<()> {
    let store = ResultStore::new(&cli.snapshot);
    match &cli.command {
        Command::Scan {
            paths,
            all_drives,
            depth,
            threads,
        } => {
            let drives: Vec<PathBuf> = if *all_drives {
                available_drives().into_iter().map(|d| d.path).collect()
            } else {
                Vec::new()
            };
            let folders = paths
                .iter()
                .map(|p| absolute(p))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let targets = compose_targets(&drives, &folders);

            let threads = threads.unwrap_or_else(|| ScanOptions::default().threads);
            let mut state = AppState::new(store, threads);
            if let Err(err) = state.start_scan(targets) {
                bail!("{err}");
            }
            state.wait_for_scan(POLL_INTERVAL);
            print_results(&state, *depth, out)?;

            writeln!(
                out,
                "{} directories in {} root(s), {:.2?}, {} unreadable entries",
                format_count(state.sizes.len() as u64),
                state.targets.len(),
                state.scan_duration.unwrap_or_default(),
                format_count(state.scan_error_count)
            )?;
            writeln!(out, "{}", state.status)?;
        }
        Command::Show { depth } => {
            let mut state = AppState::new(store, ScanOptions::default().threads);
            state.restore_last_results();
            if state.phase == AppPhase::Results {
                print_results(&state, *depth, out)?;
                if let Some(saved) = state.store.modified() {
                    let saved: chrono::DateTime<chrono::Local> = saved.into();
                    writeln!(out, "Saved {}", saved.format("%Y-%m-%d %H:%M:%S"))?;
                }
            }
            writeln!(out, "{}", state.status)?;
        }
        Command::Drives => {
            for drive in available_drives() {
                writeln!(
                    out,
                    "{}  {}",
                    drive.path.display(),
                    drive.drive_type.label()
                )?;
            }
        }
    }
    Ok(())
}

fn print_results(
    state: &AppState,
    depth: Option<u16>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    if let Some(tree) = state.current_tree() {
        write!(out, "{}", render_tree(tree, depth))?;
    }
    Ok(())
}

fn absolute(path: &Path) -> anyhow::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("cannot resolve the working directory")?;
    Ok(cwd.join(path))
}
