//! Drive a single AMGX solve: load a solver configuration and a Matrix
//! Market system, run setup and solve, and report the iteration count.
//!
//! The numerical work happens inside the AMGX library. This crate owns the
//! call sequence, the lifetime of every library handle, and the translation
//! of AMGX return codes into [`AmgxError`].
//!
//! ```no_run
//! use amgx_eval::{AmgxLibrary, DriverOptions, run_solve};
//!
//! let library = AmgxLibrary::load()?;
//! let options = DriverOptions::new("FGMRES_AGGREGATION.json");
//! let report = run_solve(library, &options, &mut std::io::stdout())?;
//! println!("{} iterations", report.iterations);
//! # Ok::<(), amgx_eval::AmgxError>(())
//! ```

pub mod api;
pub mod driver;
pub mod error;
pub mod ffi;
pub mod mode;
pub mod report;
pub mod session;

pub use api::{AmgxApi, ApiVersion, CallResult, MatrixSize, ReturnCode, SolveStatus};
pub use driver::{DEFAULT_SYSTEM_FILE, DriverOptions, run_solve};
pub use error::{AmgxError, Result};
pub use ffi::AmgxLibrary;
pub use mode::Mode;
pub use report::SolveReport;
pub use session::Session;
