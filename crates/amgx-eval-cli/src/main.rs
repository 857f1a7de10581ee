//! amgx-eval command-line driver.
//!
//! Solves the system in `../data/AMGX_system.mtx` with the AMGX solver
//! configuration given on the command line and prints the iteration count.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use amgx_eval::{AmgxApi, AmgxLibrary, DriverOptions, Mode, run_solve};
use anyhow::{Context, Result};
use clap::{ArgAction, Parser};

mod logging;

#[derive(Parser, Debug)]
#[command(name = "amgx-eval")]
#[command(about = "Solve a Matrix Market linear system with the AMGX multigrid solver")]
#[command(version)]
struct Cli {
    /// AMGX solver configuration file (JSON)
    config_file: PathBuf,

    /// AMGX shared library to load instead of searching the default names
    #[arg(long, value_name = "PATH")]
    library: Option<PathBuf>,

    /// Precision/storage mode (hDDI, hDFI, hFFI, dDDI, dDFI, dFFI)
    #[arg(long, default_value = "dDDI")]
    mode: Mode,

    /// Also print the solve report as JSON
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version also arrive here and are not failures.
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    logging::init(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let library = match &cli.library {
        Some(path) => AmgxLibrary::open(path),
        None => AmgxLibrary::load(),
    }?;

    let options = DriverOptions::new(&cli.config_file).with_mode(cli.mode);
    log::debug!(
        "Solving {} with {} in mode {}",
        options.system_file.display(),
        options.config_file.display(),
        options.mode
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    solve_and_report(library, &options, cli.json, &mut out)
}

/// Run the solve and, if requested, append the report as JSON.
fn solve_and_report<A: AmgxApi>(
    library: A,
    options: &DriverOptions,
    json: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let report = run_solve(library, options, out)?;

    if json {
        let json = serde_json::to_string_pretty(&report).context("serializing solve report")?;
        writeln!(out, "{}", json)?;
    }
    Ok(())
}
