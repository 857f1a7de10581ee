//! The solve sequence.
//!
//! initialize → configure → resources → solver → matrix/vectors → read
//! system → setup → solve → report → teardown → finalize.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::api::AmgxApi;
use crate::error::{AmgxError, Result};
use crate::mode::Mode;
use crate::report::SolveReport;
use crate::session::Session;

/// System file read by the command-line driver. It is produced by the
/// formatting script next to it and holds both the matrix and the rhs.
pub const DEFAULT_SYSTEM_FILE: &str = "../data/AMGX_system.mtx";

/// Inputs of one solve.
#[derive(Debug, Clone)]
pub struct DriverOptions {
    /// JSON solver configuration.
    pub config_file: PathBuf,
    /// Matrix Market file with matrix and right-hand side.
    pub system_file: PathBuf,
    pub mode: Mode,
}

impl DriverOptions {
    /// Options for `config_file` with the fixed system file and `dDDI` mode.
    pub fn new(config_file: impl Into<PathBuf>) -> Self {
        Self {
            config_file: config_file.into(),
            system_file: PathBuf::from(DEFAULT_SYSTEM_FILE),
            mode: Mode::default(),
        }
    }

    pub fn with_system_file(mut self, system_file: impl Into<PathBuf>) -> Self {
        self.system_file = system_file.into();
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }
}

/// Run one solve against `api`, writing progress lines to `out`.
///
/// Every library call is checked; the first failure is returned after the
/// handles created so far have been destroyed and the library finalized.
pub fn run_solve<A: AmgxApi>(
    api: A,
    options: &DriverOptions,
    out: &mut dyn Write,
) -> Result<SolveReport> {
    check_system_file(&options.system_file)?;

    let session = Session::new(api)?;
    let report = solve_in_session(&session, options, out)?;
    drop(session);

    writeln!(out, "AMGX solve complete.")?;
    Ok(report)
}

fn check_system_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(AmgxError::SystemFileNotFound(path.to_path_buf()))
    }
}

fn solve_in_session<A: AmgxApi>(
    session: &Session<A>,
    options: &DriverOptions,
    out: &mut dyn Write,
) -> Result<SolveReport> {
    session.route_output_to_log()?;

    let api_version = session.api_version();
    match api_version {
        Some(version) => writeln!(out, "Using AMGX API version: {}", version)?,
        None => writeln!(out, "Using AMGX API version: unknown")?,
    }

    // Locals drop in reverse declaration order, which is the teardown order.
    let config = session.load_config(&options.config_file)?;
    let resources = session.create_resources(&config)?;
    let solver = session.create_solver(&resources, options.mode, &config)?;
    let matrix = session.create_matrix(&resources, options.mode)?;
    let solution = session.create_vector(&resources, options.mode)?;
    let rhs = session.create_vector(&resources, options.mode)?;

    session.read_system(&matrix, &rhs, &solution, &options.system_file)?;
    let system = matrix.size()?;
    log::info!(
        "System: {} block rows, block size {}x{}",
        system.rows,
        system.block_dimx,
        system.block_dimy
    );

    solver.setup(&matrix)?;
    solver.solve(&rhs, &solution)?;

    let iterations = solver.iterations()?;
    writeln!(out, "Number of iterations: {}", iterations)?;

    let status = solver.status()?;
    if !status.is_success() {
        log::warn!("Solver finished with status: {}", status);
    }
    let final_residual = solver.final_residual(iterations);
    if let Some(residual) = final_residual {
        log::info!("Final residual: {:e}", residual);
    }

    Ok(SolveReport {
        api_version,
        mode: options.mode,
        config_file: options.config_file.clone(),
        system_file: options.system_file.clone(),
        system,
        iterations,
        status,
        final_residual,
    })
}
